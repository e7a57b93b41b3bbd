//! Counter console: menu management and walk-in orders over a JSON menu file.

use std::io;

use anyhow::Result;

use cafeteria::catalog::{load_or_seed, JsonFileStore};
use cafeteria::config::Config;
use cafeteria::console::Console;
use cafeteria::telemetry;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_stderr();
    let config = Config::load();

    let store = JsonFileStore::new(&config.menu_file, &config.currency);
    let catalog = load_or_seed(&store, &config.currency)?;
    let mut console = Console::new(io::stdin().lock(), io::stdout(), catalog, store, config.gate());
    console.run()?;
    Ok(())
}
