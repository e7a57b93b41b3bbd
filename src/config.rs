use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

use crate::domain::access::Gate;
use crate::domain::value_objects::DEFAULT_CURRENCY;

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub nats_url: Option<String>,
    pub menu_file: String,
    pub currency: String,
    pub admin_password: String,
    pub staff_password: String,
    pub restock_on_cancel: bool,
    pub seed_demo: bool,
}

impl Config {
    pub fn load() -> Self {
        Self {
            database_url: try_load("DATABASE_URL", "sqlite://cafeteria.db?mode=rwc"),
            port: try_load("PORT", "8083"),
            nats_url: env::var("NATS_URL").ok().filter(|url| !url.trim().is_empty()),
            menu_file: try_load("CAFETERIA_MENU_FILE", "menu.json"),
            currency: try_load("CAFETERIA_CURRENCY", DEFAULT_CURRENCY),
            admin_password: try_load("CAFETERIA_ADMIN_PASSWORD", "admin123"),
            staff_password: try_load("CAFETERIA_STAFF_PASSWORD", "staff123"),
            restock_on_cancel: try_load("CAFETERIA_RESTOCK_ON_CANCEL", "false"),
            seed_demo: try_load("CAFETERIA_SEED_DEMO", "true"),
        }
    }

    pub fn gate(&self) -> Gate { Gate::new(&self.admin_password, &self.staff_password) }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            port: 8083,
            nats_url: None,
            menu_file: "menu.json".to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            admin_password: "admin123".to_string(),
            staff_password: "staff123".to_string(),
            restock_on_cancel: false,
            seed_demo: false,
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    match raw.parse() {
        Ok(value) => value,
        Err(e) => {
            warn!("Invalid {key} value '{raw}': {e}, using default: {default}");
            parse_default(key, default)
        }
    }
}

fn parse_default<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    match default.parse() {
        Ok(value) => value,
        // defaults above are literals of the right type
        Err(e) => unreachable!("default for {key} does not parse: {e}"),
    }
}
