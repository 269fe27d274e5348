//! The catalog registry
//!
//! Holds every [`TableCatalogEntry`] plus an index from normalized names
//! (canonical id, separator variants, registered aliases) to entries. Built
//! once, validated on construction, immutable afterwards.

use std::collections::HashMap;
use std::iter;
use std::path::Path;

use tracing::debug;

use super::dimension::DimensionDefinition;
use super::filter::FilterDefinition;
use super::metric::MetricDefinition;
use super::table::{Module, TableCatalogEntry, TableName};
use super::types::{DimensionKind, FilterOperator};
use crate::error::{CatalogError, ParseError};
use crate::resolver::normalize_name;

#[derive(Debug, Clone)]
pub struct Catalog {
    tables: Vec<TableCatalogEntry>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build and validate a catalog from its entries
    pub fn new(tables: Vec<TableCatalogEntry>) -> Result<Self, CatalogError> {
        let index = build_index(&tables)?;
        let catalog = Catalog { tables, index };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        crate::parser::parse_file(path)
    }

    pub fn tables(&self) -> &[TableCatalogEntry] {
        &self.tables
    }

    pub fn get(&self, table: TableName) -> Option<&TableCatalogEntry> {
        self.tables.iter().find(|t| t.table == table)
    }

    /// Resolve a canonical id, separator variant or alias to its entry
    pub fn lookup(&self, name: &str) -> Result<&TableCatalogEntry, CatalogError> {
        let key = normalize_name(name);
        match self.index.get(&key) {
            Some(&i) => Ok(&self.tables[i]),
            None => {
                debug!(name, key = %key, "catalog lookup miss");
                Err(CatalogError::UnknownTable(name.trim().to_string()))
            }
        }
    }

    /// Canonical id for any accepted spelling
    pub fn canonical_name(&self, name: &str) -> Option<TableName> {
        self.lookup(name).ok().map(|t| t.table)
    }

    pub fn list_metrics(&self, name: &str) -> &[MetricDefinition] {
        self.lookup(name).map(|t| t.metrics.as_slice()).unwrap_or(&[])
    }

    pub fn list_dimensions(&self, name: &str) -> &[DimensionDefinition] {
        self.lookup(name).map(|t| t.dimensions.as_slice()).unwrap_or(&[])
    }

    pub fn list_filters(&self, name: &str) -> &[FilterDefinition] {
        self.lookup(name).map(|t| t.filters.as_slice()).unwrap_or(&[])
    }

    pub fn tables_in_module(&self, module: Module) -> Vec<&TableCatalogEntry> {
        self.tables.iter().filter(|t| t.module() == module).collect()
    }

    /// Check the structural invariants of every entry
    pub fn validate(&self) -> Result<(), CatalogError> {
        for entry in &self.tables {
            validate_entry(entry)?;
        }
        Ok(())
    }
}

fn build_index(tables: &[TableCatalogEntry]) -> Result<HashMap<String, usize>, CatalogError> {
    let mut index: HashMap<String, usize> = HashMap::new();

    for (i, entry) in tables.iter().enumerate() {
        if tables[..i].iter().any(|t| t.table == entry.table) {
            return Err(CatalogError::DuplicateTable(entry.table.to_string()));
        }

        let names = iter::once(entry.table.as_str()).chain(entry.aliases.iter().map(String::as_str));
        for name in names {
            let key = normalize_name(name);
            match index.get(&key) {
                Some(&j) if j != i => {
                    return Err(CatalogError::AliasConflict {
                        alias: name.to_string(),
                        first: tables[j].table.to_string(),
                        second: entry.table.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    index.insert(key, i);
                }
            }
        }
    }

    Ok(index)
}

fn validate_entry(entry: &TableCatalogEntry) -> Result<(), CatalogError> {
    let table = entry.table.to_string();

    if entry.metrics.is_empty() {
        return Err(CatalogError::NoMetrics(table));
    }

    for metric in &entry.metrics {
        if metric.expressions.iter().all(|e| e.trim().is_empty()) {
            return Err(CatalogError::EmptyMetric {
                table,
                metric: metric.id.clone(),
            });
        }
    }

    for dim in &entry.dimensions {
        match dim.kind {
            DimensionKind::Attribute => {
                let single = dim.expr.is_some() && dim.column.is_none() && dim.expr_by_grain.is_empty();
                if !single {
                    return Err(CatalogError::AttributeExpression {
                        table,
                        dimension: dim.id.clone(),
                    });
                }
            }
            DimensionKind::Time => {
                if let Some(&grain) = dim.missing_grains().first() {
                    return Err(CatalogError::MissingGrain {
                        table,
                        dimension: dim.id.clone(),
                        grain,
                    });
                }
            }
        }
    }

    for filter in &entry.filters {
        if filter.operators.is_empty() {
            return Err(CatalogError::NoOperators {
                table,
                field: filter.field.clone(),
            });
        }
        if filter.supports(FilterOperator::Between) && !filter.filter_type.is_ordered() {
            return Err(CatalogError::BetweenOnUnordered {
                table,
                field: filter.field.clone(),
                filter_type: filter.filter_type,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;

    const SMALL: &str = r#"
tables:
  - table: financeiro.contas_pagar
    aliases: [ap, financeiro.contas-a-pagar]
    source: { table: financeiro.contas_pagar, alias: cp }
    metrics:
      - { id: valor_total, label: Valor Total, expressions: ["SUM(cp.valor_liquido)"] }
    dimensions:
      - { id: status, label: Status, expr: "COALESCE(cp.status,'-')" }
    filters:
      - { field: status, label: Status, type: enum, operators: [eq, in], column: cp.status }
  - table: crm.leads
    source: { table: crm.leads, alias: l }
    metrics:
      - { id: leads, label: Leads, expressions: ["COUNT(DISTINCT l.id)"] }
"#;

    #[test]
    fn test_lookup_variants() {
        let catalog = parse_str(SMALL).unwrap();
        for name in [
            "financeiro.contas_pagar",
            "financeiro_contas_pagar",
            "financeiro-contas-pagar",
            "Financeiro/Contas_Pagar",
            " financeiro . contas_pagar ",
            "AP",
            "financeiro.contas-a-pagar",
        ] {
            let entry = catalog.lookup(name).unwrap_or_else(|e| panic!("{}: {}", name, e));
            assert_eq!(entry.table, TableName::FinanceiroContasPagar);
        }
    }

    #[test]
    fn test_lookup_unknown_is_typed() {
        let catalog = parse_str(SMALL).unwrap();
        let err = catalog.lookup("financeiro.caixa").unwrap_err();
        assert_eq!(err, CatalogError::UnknownTable("financeiro.caixa".into()));
        assert!(catalog.lookup("").is_err());
        assert!(catalog.list_metrics("nope").is_empty());
        assert!(catalog.list_filters("nope").is_empty());
    }

    #[test]
    fn test_lists_and_modules() {
        let catalog = parse_str(SMALL).unwrap();
        assert_eq!(catalog.list_metrics("ap").len(), 1);
        assert_eq!(catalog.list_dimensions("ap").len(), 1);
        assert_eq!(catalog.list_filters("ap").len(), 1);
        assert_eq!(catalog.tables_in_module(Module::Crm).len(), 1);
        assert!(catalog.tables_in_module(Module::Estoque).is_empty());
    }

    #[test]
    fn test_alias_conflict_rejected() {
        let yaml = r#"
tables:
  - table: crm.leads
    aliases: [leads]
    source: { table: crm.leads, alias: l }
    metrics: [{ id: leads, label: Leads, expressions: ["COUNT(*)"] }]
  - table: crm.oportunidades
    aliases: [LEADS]
    source: { table: crm.oportunidades, alias: o }
    metrics: [{ id: n, label: N, expressions: ["COUNT(*)"] }]
"#;
        let err = parse_str(yaml).unwrap_err();
        assert!(matches!(err, ParseError::Catalog(CatalogError::AliasConflict { .. })));
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let yaml = r#"
tables:
  - table: crm.leads
    source: { table: crm.leads, alias: l }
    metrics: [{ id: leads, label: Leads, expressions: ["COUNT(*)"] }]
  - table: crm.leads
    source: { table: crm.leads, alias: l }
    metrics: [{ id: leads, label: Leads, expressions: ["COUNT(*)"] }]
"#;
        let err = parse_str(yaml).unwrap_err();
        assert!(matches!(err, ParseError::Catalog(CatalogError::DuplicateTable(_))));
    }

    #[test]
    fn test_between_on_enum_rejected() {
        let yaml = r#"
tables:
  - table: crm.leads
    source: { table: crm.leads, alias: l }
    metrics: [{ id: leads, label: Leads, expressions: ["COUNT(*)"] }]
    filters:
      - { field: status, label: Status, type: enum, operators: [between], column: l.status }
"#;
        let err = parse_str(yaml).unwrap_err();
        assert!(matches!(err, ParseError::Catalog(CatalogError::BetweenOnUnordered { .. })));
    }

    #[test]
    fn test_attribute_with_two_expressions_rejected() {
        let yaml = r#"
tables:
  - table: crm.leads
    source: { table: crm.leads, alias: l }
    metrics: [{ id: leads, label: Leads, expressions: ["COUNT(*)"] }]
    dimensions:
      - { id: origem, label: Origem, expr: ol.nome, column: l.criado_em }
"#;
        let err = parse_str(yaml).unwrap_err();
        assert!(matches!(err, ParseError::Catalog(CatalogError::AttributeExpression { .. })));
    }

    #[test]
    fn test_metric_without_expression_rejected() {
        let yaml = r#"
tables:
  - table: crm.leads
    source: { table: crm.leads, alias: l }
    metrics: [{ id: leads, label: Leads, expressions: [] }]
"#;
        let err = parse_str(yaml).unwrap_err();
        assert!(matches!(err, ParseError::Catalog(CatalogError::EmptyMetric { .. })));
    }

    #[test]
    fn test_alias_resolution_is_idempotent() {
        let catalog = crate::catalog::builtin().unwrap();
        for entry in catalog.tables() {
            let spellings = entry
                .aliases
                .iter()
                .cloned()
                .chain([entry.table.to_string(), entry.table.legacy_model()]);
            for spelling in spellings {
                let canonical = catalog.canonical_name(&spelling).unwrap();
                assert_eq!(canonical, entry.table, "{}", spelling);
                assert_eq!(catalog.canonical_name(canonical.as_str()), Some(canonical));
            }
        }
    }
}
