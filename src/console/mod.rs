//! Interactive counter console.
//!
//! One blocking read-eval-print loop per role. Every numbered choice maps
//! to one handler; validation and not-found errors are printed and the loop
//! carries on, anything else surfaces at the outermost loop.

mod admin;
mod customer;

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use thiserror::Error;
use tracing::error;

use crate::catalog::{Catalog, CatalogError, CatalogStore, StoreError};
use crate::domain::access::{AccessError, Gate};
use crate::domain::aggregates::{Order, OrderError, ProductError};
use crate::{CafeteriaError, ErrorKind};

const WALK_IN_CUSTOMER: &str = "walk-in";
const RULE_WIDE: &str = "==================================================";
const RULE_THIN: &str = "--------------------------------------------------";

pub struct Console<R, W, S> {
    input: R,
    output: W,
    catalog: Catalog,
    store: S,
    gate: Gate,
    order: Order,
}

enum Flow {
    Continue,
    Exit,
}

impl<R: BufRead, W: Write, S: CatalogStore> Console<R, W, S> {
    pub fn new(input: R, output: W, catalog: Catalog, store: S, gate: Gate) -> Self {
        let order = Order::create(WALK_IN_CUSTOMER, catalog.currency());
        Self { input, output, catalog, store, gate, order }
    }

    pub fn catalog(&self) -> &Catalog { &self.catalog }
    pub fn store(&self) -> &S { &self.store }
    pub fn order(&self) -> &Order { &self.order }
    pub fn output(&self) -> &W { &self.output }

    /// Runs the main menu until the operator quits or input ends.
    pub fn run(&mut self) -> Result<(), ConsoleError> {
        loop {
            match self.main_menu() {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => {
                    writeln!(self.output, "\nThanks for using the cafeteria system! ☕")?;
                    return Ok(());
                }
                Err(ConsoleError::Closed) => {
                    writeln!(self.output, "\n\nGoodbye! ☕")?;
                    return Ok(());
                }
                Err(ConsoleError::Io(e)) => return Err(ConsoleError::Io(e)),
                Err(e) => {
                    error!(error = %e, "unexpected console error");
                    writeln!(self.output, "\n❌ Unexpected error: {e}")?;
                }
            }
        }
    }

    fn main_menu(&mut self) -> Result<Flow, ConsoleError> {
        writeln!(self.output, "\n{RULE_WIDE}")?;
        writeln!(self.output, "          ☕ CAFETERIA SYSTEM ☕")?;
        writeln!(self.output, "{RULE_WIDE}")?;
        writeln!(self.output, "1. Customer - Place an order")?;
        writeln!(self.output, "2. Administrator")?;
        writeln!(self.output, "3. View menu")?;
        writeln!(self.output, "0. Exit")?;

        match self.prompt("\nSelect an option: ")?.as_str() {
            "1" => self.customer_session()?,
            "2" => {
                let password = self.prompt("Administrator password: ")?;
                match self.gate.require_catalog_manager(&password) {
                    Ok(_) => self.admin_session()?,
                    Err(e) => writeln!(self.output, "❌ {e}")?,
                }
            }
            "3" => {
                self.show_menu()?;
                self.prompt("\nPress Enter to continue...")?;
            }
            "0" => return Ok(Flow::Exit),
            _ => writeln!(self.output, "❌ Invalid option")?,
        }
        Ok(Flow::Continue)
    }

    fn show_menu(&mut self) -> Result<(), ConsoleError> {
        writeln!(self.output, "\n{RULE_WIDE}")?;
        writeln!(self.output, "                 CAFETERIA MENU")?;
        writeln!(self.output, "{RULE_WIDE}")?;
        writeln!(self.output, "{:<3} {:<20} {:<10} AVAILABLE", "ID", "PRODUCT", "PRICE")?;
        writeln!(self.output, "{RULE_THIN}")?;
        for (i, product) in self.catalog.products().iter().enumerate() {
            let available = if product.is_available() { "Yes" } else { "No" };
            writeln!(self.output, "{:<3} {:<20} {:<10} {available}", i + 1, product.name(), product.price().to_string())?;
        }
        writeln!(self.output, "{RULE_WIDE}")?;
        Ok(())
    }

    fn prompt(&mut self, label: &str) -> Result<String, ConsoleError> {
        write!(self.output, "{label}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 { return Err(ConsoleError::Closed); }
        Ok(line.trim().to_string())
    }

    fn prompt_parse<T: FromStr>(&mut self, label: &str) -> Result<T, ConsoleError> {
        self.prompt(label)?.parse().map_err(|_| ConsoleError::InvalidNumber)
    }

    fn prompt_yes(&mut self, label: &str) -> Result<bool, ConsoleError> {
        Ok(matches!(self.prompt(label)?.to_lowercase().as_str(), "y" | "yes"))
    }

    /// Prints recoverable failures and swallows them; everything else propagates.
    fn report<T>(&mut self, result: Result<T, ConsoleError>) -> Result<Option<T>, ConsoleError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(ConsoleError::InvalidNumber) => {
                writeln!(self.output, "❌ {}", ConsoleError::InvalidNumber)?;
                Ok(None)
            }
            Err(ConsoleError::App(e)) if e.kind() != ErrorKind::Unexpected => {
                writeln!(self.output, "❌ {e}")?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("input closed")]
    Closed,
    #[error("Please enter valid numbers")]
    InvalidNumber,
    #[error(transparent)]
    App(#[from] CafeteriaError),
    #[error("console I/O error: {0}")]
    Io(#[from] io::Error),
}

macro_rules! app_error {
    ($($ty:ty),*) => {$(
        impl From<$ty> for ConsoleError {
            fn from(e: $ty) -> Self { Self::App(e.into()) }
        }
    )*};
}

app_error!(OrderError, ProductError, CatalogError, StoreError, AccessError);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryStore;
    use std::io::Cursor;

    pub(super) fn console(script: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>, MemoryStore> {
        let catalog = Catalog::with_defaults("COP");
        Console::new(Cursor::new(script.as_bytes().to_vec()), Vec::new(), catalog, MemoryStore::new("COP"), Gate::new("admin123", "staff123"))
    }

    pub(super) fn transcript<R, S>(console: &Console<R, Vec<u8>, S>) -> String {
        String::from_utf8_lossy(&console.output).into_owned()
    }

    #[test]
    fn test_quit_and_eof() {
        let mut c = console("0\n");
        c.run().unwrap();
        assert!(transcript(&c).contains("Thanks for using the cafeteria system"));

        let mut c = console("");
        c.run().unwrap();
        assert!(transcript(&c).contains("Goodbye"));
    }

    #[test]
    fn test_view_menu_and_bad_option() {
        let mut c = console("3\n\n9\n0\n");
        c.run().unwrap();
        let out = transcript(&c);
        assert!(out.contains("Espresso"));
        assert!(out.contains("$3,000"));
        assert!(out.contains("❌ Invalid option"));
    }

    #[test]
    fn test_wrong_admin_password() {
        let mut c = console("2\nletmein\n0\n");
        c.run().unwrap();
        assert!(transcript(&c).contains("❌ Incorrect password"));
        assert!(c.store().contents().is_none());
    }
}
