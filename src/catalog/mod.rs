use include_dir::{include_dir, Dir};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

static CATALOG_DIR: Dir = include_dir!("src/catalog/data");

/// Built-in catalogues shipped with the binary
#[derive(Debug, Copy, Clone, PartialEq, Eq, clap::ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SupportedCatalog {
    Japan,
    JapanJa,
}

impl SupportedCatalog {
    pub fn file_name(&self) -> String {
        format!("{self}.json")
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "japan" => Some(Self::Japan),
            "japan-ja" => Some(Self::JapanJa),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalogue file not found: {0}")]
    NotFound(String),

    #[error("failed to read catalogue {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalogue: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate unit id {0}")]
    DuplicateId(u32),

    #[error("duplicate unit name {0:?}")]
    DuplicateName(String),

    #[error("duplicate capital {0:?}")]
    DuplicateCapital(String),
}

/// One entry of the fact catalogue
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct GeographicUnit {
    pub id: u32,
    pub name: String,
    pub capital: String,
    pub region: String,
}

impl GeographicUnit {
    pub fn new(id: u32, name: &str, capital: &str, region: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            capital: capital.to_string(),
            region: region.to_string(),
        }
    }
}

/// Static set of units available for quizzing.
///
/// Ids are unique, and so are names and capitals, which lets distractors be
/// drawn from other units without ever repeating the correct answer.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(try_from = "RawCatalog")]
pub struct Catalog {
    name: String,
    unit_label: String,
    units: Vec<GeographicUnit>,
}

#[derive(Deserialize)]
struct RawCatalog {
    name: String,
    #[serde(default = "default_unit_label")]
    unit_label: String,
    units: Vec<GeographicUnit>,
}

fn default_unit_label() -> String {
    "region".to_string()
}

impl TryFrom<RawCatalog> for Catalog {
    type Error = CatalogError;

    fn try_from(raw: RawCatalog) -> Result<Self, Self::Error> {
        Catalog::new(raw.name, raw.unit_label, raw.units)
    }
}

impl Catalog {
    pub fn new(
        name: impl Into<String>,
        unit_label: impl Into<String>,
        units: Vec<GeographicUnit>,
    ) -> Result<Self, CatalogError> {
        if let Some(id) = units.iter().map(|u| u.id).duplicates().next() {
            return Err(CatalogError::DuplicateId(id));
        }
        if let Some(name) = units.iter().map(|u| u.name.as_str()).duplicates().next() {
            return Err(CatalogError::DuplicateName(name.to_string()));
        }
        if let Some(capital) = units.iter().map(|u| u.capital.as_str()).duplicates().next() {
            return Err(CatalogError::DuplicateCapital(capital.to_string()));
        }

        Ok(Self {
            name: name.into(),
            unit_label: unit_label.into(),
            units,
        })
    }

    pub fn builtin(catalog: SupportedCatalog) -> Result<Self, CatalogError> {
        read_catalog_from_dir(&catalog.file_name())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Noun used in prompts, e.g. "prefecture"
    pub fn unit_label(&self) -> &str {
        &self.unit_label
    }

    pub fn units(&self) -> &[GeographicUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Region labels in catalogue order, without repeats
    pub fn regions(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.region.as_str()).unique().collect()
    }
}

fn read_catalog_from_dir(file_name: &str) -> Result<Catalog, CatalogError> {
    let file = CATALOG_DIR
        .get_file(file_name)
        .ok_or_else(|| CatalogError::NotFound(file_name.to_string()))?;

    Ok(serde_json::from_slice(file.contents())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_builtin_japan() {
        let catalog = Catalog::builtin(SupportedCatalog::Japan).unwrap();

        assert_eq!(catalog.name(), "japan");
        assert_eq!(catalog.unit_label(), "prefecture");
        assert_eq!(catalog.len(), 47);
        assert!(catalog
            .units()
            .iter()
            .any(|u| u.name == "Iwate" && u.capital == "Morioka"));
    }

    #[test]
    fn test_builtin_japan_ja() {
        let catalog = Catalog::builtin(SupportedCatalog::JapanJa).unwrap();

        assert_eq!(catalog.name(), "japan-ja");
        assert_eq!(catalog.len(), 47);
        assert!(catalog
            .units()
            .iter()
            .any(|u| u.name == "愛知県" && u.capital == "名古屋市"));
    }

    #[test]
    fn test_regions_are_unique_and_ordered() {
        let catalog = Catalog::builtin(SupportedCatalog::Japan).unwrap();

        assert_eq!(
            catalog.regions(),
            vec!["Hokkaido", "Tohoku", "Kanto", "Chubu", "Kinki", "Chugoku", "Shikoku", "Kyushu"]
        );
    }

    #[test]
    fn test_supported_catalog_display() {
        assert_eq!(SupportedCatalog::Japan.to_string(), "japan");
        assert_eq!(SupportedCatalog::JapanJa.to_string(), "japan-ja");
        assert_eq!(SupportedCatalog::JapanJa.file_name(), "japan-ja.json");
        assert_eq!(
            SupportedCatalog::from_name("japan-ja"),
            Some(SupportedCatalog::JapanJa)
        );
        assert_eq!(SupportedCatalog::from_name("atlantis"), None);
    }

    #[test]
    fn test_catalog_deserialization() {
        let json_data = r#"
        {
            "name": "test",
            "unit_label": "state",
            "units": [
                { "id": 1, "name": "Bavaria", "capital": "Munich", "region": "South" },
                { "id": 2, "name": "Hesse", "capital": "Wiesbaden", "region": "West" }
            ]
        }
        "#;

        let catalog: Catalog = serde_json::from_str(json_data).unwrap();

        assert_eq!(catalog.name(), "test");
        assert_eq!(catalog.unit_label(), "state");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.units()[1].capital, "Wiesbaden");
    }

    #[test]
    fn test_missing_unit_label_defaults() {
        let json_data = r#"{ "name": "t", "units": [] }"#;
        let catalog: Catalog = serde_json::from_str(json_data).unwrap();

        assert_eq!(catalog.unit_label(), "region");
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let units = vec![
            GeographicUnit::new(1, "A", "a", "r"),
            GeographicUnit::new(2, "A", "b", "r"),
        ];

        let err = Catalog::new("t", "unit", units).unwrap_err();
        assert_matches!(err, CatalogError::DuplicateName(name) if name == "A");
    }

    #[test]
    fn test_duplicate_capital_rejected() {
        let units = vec![
            GeographicUnit::new(1, "A", "x", "r"),
            GeographicUnit::new(2, "B", "x", "r"),
        ];

        let err = Catalog::new("t", "unit", units).unwrap_err();
        assert_matches!(err, CatalogError::DuplicateCapital(capital) if capital == "x");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let units = vec![
            GeographicUnit::new(7, "A", "a", "r"),
            GeographicUnit::new(7, "B", "b", "r"),
        ];

        assert_matches!(
            Catalog::new("t", "unit", units),
            Err(CatalogError::DuplicateId(7))
        );
    }

    #[test]
    fn test_duplicates_rejected_when_deserializing() {
        let json_data = r#"
        { "name": "t", "units": [
            { "id": 1, "name": "A", "capital": "a", "region": "r" },
            { "id": 2, "name": "A", "capital": "b", "region": "r" }
        ] }
        "#;

        assert!(serde_json::from_str::<Catalog>(json_data).is_err());
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mini.json");
        std::fs::write(
            &path,
            r#"{ "name": "mini", "unit_label": "county", "units": [
                { "id": 1, "name": "Kent", "capital": "Maidstone", "region": "South East" }
            ] }"#,
        )
        .unwrap();

        let catalog = Catalog::from_path(&path).unwrap();
        assert_eq!(catalog.name(), "mini");
        assert_eq!(catalog.units()[0].capital, "Maidstone");
    }

    #[test]
    fn test_from_missing_path() {
        let err = Catalog::from_path("/definitely/not/here.json").unwrap_err();
        assert_matches!(err, CatalogError::Io { .. });
    }

    #[test]
    fn test_builtin_file_missing() {
        assert_matches!(
            read_catalog_from_dir("nonexistent.json"),
            Err(CatalogError::NotFound(_))
        );
    }
}
