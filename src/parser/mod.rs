//! Catalog parser (verb module)
//!
//! Transforms YAML documents into a validated [`Catalog`].

use serde::Deserialize;
use std::path::Path;

use crate::catalog::{Catalog, TableCatalogEntry};
use crate::error::ParseError;

/// Top-level shape of a catalog document
#[derive(Debug, Deserialize)]
struct CatalogDocument {
    tables: Vec<TableCatalogEntry>,
}

/// Parse a catalog from a YAML file
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Catalog, ParseError> {
    let path_str = path.as_ref().display().to_string();
    let contents = std::fs::read_to_string(&path).map_err(|e| ParseError::Io {
        path: path_str,
        source: e,
    })?;
    parse_str(&contents)
}

/// Parse a catalog from a YAML string
pub fn parse_str(yaml: &str) -> Result<Catalog, ParseError> {
    let document: CatalogDocument = serde_yaml::from_str(yaml)?;
    Ok(Catalog::new(document.tables)?)
}
