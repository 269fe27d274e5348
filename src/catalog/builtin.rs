//! The catalog compiled into the binary

use std::sync::{Arc, OnceLock};

use super::schema::Catalog;
use crate::error::ParseError;
use crate::parser::parse_str;

/// YAML source of the built-in catalog
pub const BUILTIN_CATALOG_YAML: &str = include_str!("builtin.yaml");

static BUILTIN: OnceLock<Arc<Catalog>> = OnceLock::new();

/// Shared, validated built-in catalog
///
/// Parsed on first use. A parse failure is returned to every caller and
/// nothing is cached, so the error stays visible.
pub fn builtin() -> Result<Arc<Catalog>, ParseError> {
    if let Some(catalog) = BUILTIN.get() {
        return Ok(Arc::clone(catalog));
    }
    let parsed = Arc::new(parse_str(BUILTIN_CATALOG_YAML)?);
    Ok(Arc::clone(BUILTIN.get_or_init(|| parsed)))
}
