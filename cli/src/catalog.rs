//! Loading and validating catalog files.

use anyhow::{Context, Result};
use larder_core::catalog::CatalogSnapshot;
use std::fs;
use std::path::Path;

/// Load and validate a catalog file, or the built-in catalog when `path` is None.
pub fn load(path: Option<&Path>) -> Result<CatalogSnapshot> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            CatalogSnapshot::from_json(&json)
                .with_context(|| format!("Invalid catalog {}", path.display()))
        }
        None => CatalogSnapshot::builtin().context("Built-in catalog is invalid"),
    }
}

pub fn validate(path: Option<&Path>) -> Result<()> {
    let snapshot = load(path)?;
    let source = path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in catalog".to_string());

    println!("{} is valid", source);
    println!("  ingredients: {}", snapshot.ingredients().len());
    println!("  cuisines:    {}", snapshot.cuisines().len());
    println!("  templates:   {}", snapshot.template_count());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use larder_core::catalog::BUILTIN_CATALOG_JSON;

    #[test]
    fn test_load_builtin() {
        let snapshot = load(None).unwrap();
        assert!(!snapshot.ingredients().is_empty());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, BUILTIN_CATALOG_JSON).unwrap();
        assert!(validate(Some(&path)).is_ok());
    }

    #[test]
    fn test_invalid_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, r#"{"ingredients": [], "cuisines": [{"id": "x"}]}"#).unwrap();

        let err = load(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }

    #[test]
    fn test_empty_catalog_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        fs::write(&path, r#"{"ingredients": [], "cuisines": []}"#).unwrap();

        let err = validate(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("Catalog has no ingredients"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("nope.json"))).is_err());
    }
}
