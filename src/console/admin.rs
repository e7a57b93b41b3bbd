use std::io::{BufRead, Write};

use rust_decimal::Decimal;
use tracing::info;

use super::{Console, ConsoleError, RULE_WIDE};
use crate::catalog::{CatalogError, CatalogStore};

impl<R: BufRead, W: Write, S: CatalogStore> Console<R, W, S> {
    /// Catalog management. Callers must have passed the gate first.
    pub(super) fn admin_session(&mut self) -> Result<(), ConsoleError> {
        loop {
            writeln!(self.output, "\n{RULE_WIDE}")?;
            writeln!(self.output, "              ADMINISTRATOR PANEL")?;
            writeln!(self.output, "{RULE_WIDE}")?;
            writeln!(self.output, "1. View current menu")?;
            writeln!(self.output, "2. Add new product")?;
            writeln!(self.output, "3. Remove product")?;
            writeln!(self.output, "4. Change price")?;
            writeln!(self.output, "5. Change available quantity")?;
            writeln!(self.output, "0. Back to main menu")?;

            let step = match self.prompt("\nSelect an option: ")?.as_str() {
                "1" => self.show_menu().and_then(|()| self.prompt("\nPress Enter to continue...").map(|_| ())),
                "2" => self.add_product(),
                "3" => self.remove_product(),
                "4" => self.change_price(),
                "5" => self.change_quantity(),
                "0" => return Ok(()),
                _ => {
                    writeln!(self.output, "❌ Invalid option")?;
                    continue;
                }
            };
            self.report(step)?;
        }
    }

    fn add_product(&mut self) -> Result<(), ConsoleError> {
        let name = self.prompt("\nName of the new product: ")?;
        if self.catalog.get(&name).is_some() { return Err(CatalogError::Duplicate(name).into()); }
        let price: Decimal = self.prompt_parse("Price: $")?;
        let quantity: i64 = self.prompt_parse("Initial quantity: ")?;

        let product = self.catalog.add_product(&name, price, quantity)?;
        let name = product.name().to_string();
        self.store.save(&self.catalog)?;
        info!(product = %name, %price, quantity, "product added");
        writeln!(self.output, "✅ Product '{name}' added")?;
        Ok(())
    }

    fn remove_product(&mut self) -> Result<(), ConsoleError> {
        self.show_menu()?;
        let position: usize = self.prompt_parse("\nEnter the ID of the product to remove: ")?;
        let name = self.catalog.by_position(position)?.name().to_string();
        if !self.prompt_yes(&format!("Remove '{name}'? (y/n): "))? {
            writeln!(self.output, "❌ Operation cancelled")?;
            return Ok(());
        }
        self.catalog.remove_product(position)?;
        self.store.save(&self.catalog)?;
        info!(product = %name, "product removed");
        writeln!(self.output, "✅ Product '{name}' removed")?;
        Ok(())
    }

    fn change_price(&mut self) -> Result<(), ConsoleError> {
        self.show_menu()?;
        let position: usize = self.prompt_parse("\nEnter the product ID: ")?;
        let product = self.catalog.by_position(position)?;
        writeln!(self.output, "Current price of '{}': {}", product.name(), product.price())?;

        let price: Decimal = self.prompt_parse("New price: $")?;
        let product = self.catalog.change_price(position, price)?;
        let (name, price) = (product.name().to_string(), product.price().clone());
        self.store.save(&self.catalog)?;
        info!(product = %name, price = %price.amount(), "price changed");
        writeln!(self.output, "✅ Price of '{name}' updated to {price}")?;
        Ok(())
    }

    fn change_quantity(&mut self) -> Result<(), ConsoleError> {
        self.show_menu()?;
        let position: usize = self.prompt_parse("\nEnter the product ID: ")?;
        let product = self.catalog.by_position(position)?;
        writeln!(self.output, "Current quantity of '{}': {}", product.name(), product.stock())?;

        let quantity: i64 = self.prompt_parse("New quantity: ")?;
        let product = self.catalog.change_quantity(position, quantity)?;
        let (name, stock) = (product.name().to_string(), product.stock());
        self.store.save(&self.catalog)?;
        info!(product = %name, stock, "quantity changed");
        writeln!(self.output, "✅ Quantity of '{name}' updated to {stock}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{console, transcript};
    use crate::catalog::from_json;
    use rust_decimal::Decimal;

    fn saved(c: &super::super::Console<std::io::Cursor<Vec<u8>>, Vec<u8>, crate::catalog::MemoryStore>) -> crate::catalog::Catalog {
        from_json(&c.store().contents().unwrap(), "COP").unwrap()
    }

    #[test]
    fn test_add_product_persists() {
        let mut c = console("2\nadmin123\n2\nScone\n2500\n12\n0\n0\n");
        c.run().unwrap();
        assert!(transcript(&c).contains("✅ Product 'Scone' added"));
        let catalog = saved(&c);
        assert_eq!(catalog.len(), 11);
        assert_eq!(catalog.get("Scone").unwrap().price().amount(), Decimal::from(2500));
    }

    #[test]
    fn test_add_product_validation() {
        let mut c = console("2\nadmin123\n2\nLatte\n2\nScone\n0\n5\n2\nScone\n10\n-1\n2\nScone\nten\n0\n0\n");
        c.run().unwrap();
        let out = transcript(&c);
        assert!(out.contains("❌ Product 'Latte' already exists on the menu"));
        assert!(out.contains("❌ Price must be greater than 0"));
        assert!(out.contains("❌ Quantity cannot be negative"));
        assert!(out.contains("❌ Please enter valid numbers"));
        assert_eq!(c.catalog().len(), 10);
        assert!(c.store().contents().is_none());
    }

    #[test]
    fn test_change_price_and_quantity() {
        let mut c = console("2\nadmin123\n4\n5\n3200\n5\n5\n0\n4\n5\n-10\n0\n0\n");
        c.run().unwrap();
        let catalog = saved(&c);
        let espresso = catalog.get("Espresso").unwrap();
        assert_eq!(espresso.price().amount(), Decimal::from(3200));
        assert_eq!(espresso.stock(), 0);
        assert!(!espresso.is_available());
        assert!(transcript(&c).contains("❌ Price must be greater than 0"));
    }

    #[test]
    fn test_remove_product_with_confirmation() {
        let mut c = console("2\nadmin123\n3\n10\nn\n3\n10\ny\n3\n42\n0\n0\n");
        c.run().unwrap();
        let out = transcript(&c);
        assert!(out.contains("❌ Operation cancelled"));
        assert!(out.contains("✅ Product 'Sandwich' removed"));
        assert!(out.contains("❌ No product with ID 42"));
        assert!(saved(&c).get("Sandwich").is_none());
    }
}
