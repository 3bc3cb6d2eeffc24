// ─────────────────────────────────────────────────────────────────────
// Smart Trolley — Product Catalog
// ─────────────────────────────────────────────────────────────────────
//! Static product reference data: id → name, unit price, expected mass.
//!
//! Loaded once and injected into the ledger and verifier. Entries are
//! validated at load time; duplicate ids are an error, never a silent
//! overwrite.

use std::collections::HashMap;

use rust_decimal::Decimal;

use trolley_types::{CatalogEntry, TrolleyError, TrolleyResult};

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, CatalogEntry>,
}

impl Catalog {
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> TrolleyResult<Self> {
        let mut map = HashMap::new();
        for entry in entries {
            validate_entry(&entry)?;
            if map.contains_key(&entry.id) {
                return Err(TrolleyError::Catalog(format!(
                    "duplicate item id {}",
                    entry.id
                )));
            }
            map.insert(entry.id.clone(), entry);
        }
        Ok(Self { entries: map })
    }

    /// Load from a JSON array of entries.
    pub fn from_json(json: &str) -> TrolleyResult<Self> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)
            .map_err(|e| TrolleyError::Catalog(format!("JSON parse error: {e}")))?;
        Self::from_entries(entries)
    }

    /// Product table of the reference store deployment.
    pub fn default_store() -> Self {
        let entries = [
            ("8901030862243", "Vim Bar", 10, 60.0),
            ("8901248701129", "Zandu ultra power balm", 51, 18.0),
            ("8901719134852", "Parle-G", 10, 91.0),
            ("8901399005169", "Santoor 150gm", 67, 140.0),
            ("000022", "Tur dal 500gm", 65, 500.0),
            ("8901399007811", "Santoor 40gm", 10, 39.0),
        ];
        Self {
            entries: entries
                .into_iter()
                .map(|(id, name, price, mass)| {
                    (
                        id.to_string(),
                        CatalogEntry::new(id, name, Decimal::from(price), mass),
                    )
                })
                .collect(),
        }
    }

    pub fn lookup(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }
}

fn validate_entry(entry: &CatalogEntry) -> TrolleyResult<()> {
    if entry.id.trim().is_empty() {
        return Err(TrolleyError::Catalog("item id must not be empty".into()));
    }
    if !(entry.expected_mass.is_finite() && entry.expected_mass >= 0.0) {
        return Err(TrolleyError::Catalog(format!(
            "item {} has invalid expected mass {}",
            entry.id, entry.expected_mass
        )));
    }
    if entry.unit_price.is_sign_negative() {
        return Err(TrolleyError::Catalog(format!(
            "item {} has negative price {}",
            entry.id, entry.unit_price
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_default_store_lookup() {
        let catalog = Catalog::default_store();
        assert_eq!(catalog.len(), 6);
        let vim = catalog.lookup("8901030862243").unwrap();
        assert_eq!(vim.name, "Vim Bar");
        assert_eq!(vim.unit_price, dec!(10));
        assert_eq!(vim.expected_mass, 60.0);
    }

    #[test]
    fn test_unknown_id() {
        let catalog = Catalog::default_store();
        assert!(catalog.lookup("nope").is_none());
        assert!(!catalog.contains("nope"));
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = Catalog::from_entries([
            CatalogEntry::new("A", "First", dec!(1), 10.0),
            CatalogEntry::new("A", "Second", dec!(2), 20.0),
        ])
        .unwrap_err();
        assert!(matches!(err, TrolleyError::Catalog(_)));
        assert!(err.to_string().contains("duplicate item id A"));
    }

    #[test]
    fn test_negative_mass_rejected() {
        let err = Catalog::from_entries([CatalogEntry::new("A", "Odd", dec!(1), -5.0)]);
        assert!(err.is_err());
    }

    #[test]
    fn test_negative_price_rejected() {
        let err = Catalog::from_entries([CatalogEntry::new("A", "Odd", dec!(-1), 5.0)]);
        assert!(err.is_err());
    }

    #[test]
    fn test_from_json() {
        let catalog = Catalog::from_json(
            r#"[{"id": "A", "name": "Vim Bar", "unit_price": 10.5, "expected_mass": 60.0}]"#,
        )
        .unwrap();
        assert_eq!(catalog.lookup("A").unwrap().unit_price, dec!(10.5));
    }

    #[test]
    fn test_from_json_duplicate() {
        let json = r#"[
            {"id": "A", "name": "x", "unit_price": 1, "expected_mass": 1},
            {"id": "A", "name": "y", "unit_price": 1, "expected_mass": 1}
        ]"#;
        assert!(Catalog::from_json(json).is_err());
    }
}
