//! Catalog persistence.
//!
//! On disk the menu is one JSON object mapping product name to
//! `{"precio": number, "cantidad": integer}`, in menu order. The file is
//! rewritten wholesale on every save.

use rust_decimal::Decimal;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::ser::PrettyFormatter;
use serde_json::value::RawValue;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{info, warn};

use super::{Catalog, CatalogError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    #[serde(rename = "precio", serialize_with = "serialize_price", deserialize_with = "deserialize_price")]
    pub price: Decimal,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
}

/// Prices go to disk as their exact decimal text: `3000`, `4.5`.
fn serialize_price<S: Serializer>(price: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    use serde::ser::Error as _;
    let raw = RawValue::from_string(price.normalize().to_string()).map_err(S::Error::custom)?;
    raw.serialize(serializer)
}

fn deserialize_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    use serde::de::Error as _;
    let raw = <Box<RawValue>>::deserialize(deserializer)?;
    parse_price(raw.get()).ok_or_else(|| D::Error::custom(format!("invalid price {}", raw.get())))
}

fn parse_price(text: &str) -> Option<Decimal> {
    if !text.starts_with(|c: char| c == '-' || c.is_ascii_digit()) { return None; }
    Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text)).ok()
}

/// The whole menu file, kept in file order.
struct MenuFile(Vec<(String, MenuEntry)>);

impl Serialize for MenuFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(name, entry)| (name, entry)))
    }
}

impl<'de> Deserialize<'de> for MenuFile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MenuVisitor;

        impl<'de> Visitor<'de> for MenuVisitor {
            type Value = MenuFile;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping product names to {precio, cantidad}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<MenuFile, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, MenuEntry>()? {
                    entries.push(entry);
                }
                Ok(MenuFile(entries))
            }
        }

        deserializer.deserialize_map(MenuVisitor)
    }
}

pub fn to_json(catalog: &Catalog) -> Result<String, StoreError> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    MenuFile(catalog.entries()).serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| StoreError::Corrupt(e.to_string()))
}

pub fn from_json(text: &str, currency: &str) -> Result<Catalog, StoreError> {
    let MenuFile(entries) = serde_json::from_str(text)?;
    Ok(Catalog::from_entries(entries, currency)?)
}

/// Load/save boundary for the catalog; business operations never touch storage.
pub trait CatalogStore {
    fn load(&self) -> Result<Catalog, StoreError>;
    fn save(&self, catalog: &Catalog) -> Result<(), StoreError>;
}

pub struct JsonFileStore {
    path: PathBuf,
    currency: String,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, currency: &str) -> Self { Self { path: path.into(), currency: currency.to_string() } }
    pub fn path(&self) -> &Path { &self.path }
}

impl CatalogStore for JsonFileStore {
    fn load(&self) -> Result<Catalog, StoreError> {
        if !self.path.exists() { return Err(StoreError::Missing(self.path.clone())); }
        let text = fs::read_to_string(&self.path)?;
        from_json(&text, &self.currency)
    }

    fn save(&self, catalog: &Catalog) -> Result<(), StoreError> {
        fs::write(&self.path, to_json(catalog)?)?;
        info!(path = %self.path.display(), products = catalog.len(), "menu saved");
        Ok(())
    }
}

/// Keeps the encoded menu in memory; same codec as the file store.
#[derive(Default)]
pub struct MemoryStore {
    contents: Mutex<Option<String>>,
    currency: String,
}

impl MemoryStore {
    pub fn new(currency: &str) -> Self { Self { contents: Mutex::new(None), currency: currency.to_string() } }

    pub fn with_contents(text: impl Into<String>, currency: &str) -> Self {
        Self { contents: Mutex::new(Some(text.into())), currency: currency.to_string() }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|guard| guard.clone())
    }
}

impl CatalogStore for MemoryStore {
    fn load(&self) -> Result<Catalog, StoreError> {
        let text = self.contents().ok_or_else(|| StoreError::Missing(PathBuf::from(":memory:")))?;
        from_json(&text, &self.currency)
    }

    fn save(&self, catalog: &Catalog) -> Result<(), StoreError> {
        let text = to_json(catalog)?;
        let mut guard = self.contents.lock().map_err(|_| StoreError::Corrupt("store lock poisoned".into()))?;
        *guard = Some(text);
        Ok(())
    }
}

/// Loads the catalog, falling back to the default menu (persisted right away)
/// when nothing usable is stored.
pub fn load_or_seed(store: &dyn CatalogStore, currency: &str) -> Result<Catalog, StoreError> {
    match store.load() {
        Ok(catalog) => Ok(catalog),
        Err(e) => {
            match &e {
                StoreError::Missing(path) => info!(path = %path.display(), "no menu found, creating default menu"),
                other => warn!(error = %other, "menu could not be read, restoring default menu"),
            }
            let catalog = Catalog::with_defaults(currency);
            store.save(&catalog)?;
            Ok(catalog)
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Menu file not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("Menu I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Menu is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Menu contains an invalid product: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Menu store corrupt: {0}")]
    Corrupt(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_menu() -> PathBuf {
        std::env::temp_dir().join(format!("cafeteria-menu-{}.json", Uuid::new_v4()))
    }

    #[test]
    fn test_file_round_trip() {
        let path = temp_menu();
        let store = JsonFileStore::new(&path, "COP");
        let mut catalog = Catalog::with_defaults("COP");
        catalog.add_product("Scone", Decimal::new(275, 2), 7).unwrap();
        catalog.add_product("Caviar", Decimal::new(9_999_999_999, 2), 1).unwrap();
        store.save(&catalog).unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.entries(), catalog.entries());
        let names: Vec<_> = reloaded.products().iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names.first().map(String::as_str), Some("Americano"));
        assert_eq!(names.last().map(String::as_str), Some("Caviar"));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_wire_format() {
        let mut catalog = Catalog::new("COP");
        catalog.add_product("Espresso", Decimal::from(3000), 60).unwrap();
        catalog.add_product("Té Verde", Decimal::new(45, 1), 2).unwrap();
        let json = to_json(&catalog).unwrap();
        assert!(json.contains("\"Té Verde\""));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["Espresso"], serde_json::json!({"precio": 3000, "cantidad": 60}));
        assert_eq!(value["Té Verde"]["precio"], serde_json::json!(4.5));
    }

    #[test]
    fn test_prices_keep_exact_digits() {
        let entries = vec![
            ("Gold".to_string(), MenuEntry { price: Decimal::from_str("12345678901234567890").unwrap(), quantity: 1 }),
            ("Saffron".to_string(), MenuEntry { price: Decimal::from_str("0.1234567890123456789").unwrap(), quantity: 2 }),
            ("Scone".to_string(), MenuEntry { price: Decimal::new(275, 2), quantity: 7 }),
        ];
        let text = serde_json::to_string(&MenuFile(entries.clone())).unwrap();
        assert!(text.contains(r#""precio":12345678901234567890"#), "{text}");
        assert!(text.contains(r#""precio":0.1234567890123456789"#), "{text}");
        assert!(text.contains(r#""precio":2.75"#), "{text}");

        let MenuFile(reloaded) = serde_json::from_str(&text).unwrap();
        assert_eq!(reloaded, entries);
        let MenuFile(again) = serde_json::from_str(&serde_json::to_string(&MenuFile(reloaded)).unwrap()).unwrap();
        assert_eq!(again, entries);
    }

    #[test]
    fn test_price_text_forms() {
        assert_eq!(parse_price("1.5e3"), Some(Decimal::from(1500)));
        assert_eq!(parse_price("-2"), Some(Decimal::from(-2)));
        assert_eq!(parse_price("\"12\""), None);
        assert!(matches!(from_json(r#"{"Tea": {"precio": "3000", "cantidad": 1}}"#, "COP"), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_missing_file_seeds_defaults() {
        let path = temp_menu();
        let store = JsonFileStore::new(&path, "COP");
        let catalog = load_or_seed(&store, "COP").unwrap();
        assert_eq!(catalog.len(), 10);
        assert!(path.exists());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_unreadable_menu_falls_back_and_persists() {
        let store = MemoryStore::with_contents("{ not json", "COP");
        let catalog = load_or_seed(&store, "COP").unwrap();
        assert_eq!(catalog.get("Espresso").unwrap().stock(), 60);
        let saved = from_json(&store.contents().unwrap(), "COP").unwrap();
        assert_eq!(saved.entries(), catalog.entries());
    }

    #[test]
    fn test_invalid_entries_are_rejected() {
        assert!(matches!(from_json(r#"{"Free": {"precio": 0, "cantidad": 1}}"#, "COP"), Err(StoreError::Catalog(_))));
        assert!(matches!(from_json(r#"{"Ghost": {"precio": 10, "cantidad": -1}}"#, "COP"), Err(StoreError::Json(_))));
    }
}
