//! Table catalog entries
//!
//! One entry per queryable model. Besides the metric/dimension/filter
//! vocabulary, an entry owns the fixed FROM/JOIN graph needed to reach every
//! column its expressions reference, the tenant column and the optional
//! default status predicate.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::dimension::DimensionDefinition;
use super::filter::FilterDefinition;
use super::metric::MetricDefinition;

// ============================================================================
// TableName / Module
// ============================================================================

/// Canonical id of every queryable table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableName {
    VendasPedidos,
    ComprasCompras,
    ComprasRecebimentos,
    FinanceiroContasPagar,
    FinanceiroContasReceber,
    FinanceiroPagamentosEfetuados,
    FinanceiroPagamentosRecebidos,
    ContabilidadeLancamentos,
    ContabilidadeLancamentosLinhas,
    CrmOportunidades,
    CrmLeads,
    DocumentosDocumentos,
    EstoqueEstoquesAtual,
    EstoqueMovimentacoes,
    MarketingMetricasPublicacoes,
}

impl TableName {
    pub const ALL: [TableName; 15] = [
        TableName::VendasPedidos,
        TableName::ComprasCompras,
        TableName::ComprasRecebimentos,
        TableName::FinanceiroContasPagar,
        TableName::FinanceiroContasReceber,
        TableName::FinanceiroPagamentosEfetuados,
        TableName::FinanceiroPagamentosRecebidos,
        TableName::ContabilidadeLancamentos,
        TableName::ContabilidadeLancamentosLinhas,
        TableName::CrmOportunidades,
        TableName::CrmLeads,
        TableName::DocumentosDocumentos,
        TableName::EstoqueEstoquesAtual,
        TableName::EstoqueMovimentacoes,
        TableName::MarketingMetricasPublicacoes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::VendasPedidos => "vendas.pedidos",
            TableName::ComprasCompras => "compras.compras",
            TableName::ComprasRecebimentos => "compras.recebimentos",
            TableName::FinanceiroContasPagar => "financeiro.contas_pagar",
            TableName::FinanceiroContasReceber => "financeiro.contas_receber",
            TableName::FinanceiroPagamentosEfetuados => "financeiro.pagamentos_efetuados",
            TableName::FinanceiroPagamentosRecebidos => "financeiro.pagamentos_recebidos",
            TableName::ContabilidadeLancamentos => "contabilidade.lancamentos_contabeis",
            TableName::ContabilidadeLancamentosLinhas => "contabilidade.lancamentos_contabeis_linhas",
            TableName::CrmOportunidades => "crm.oportunidades",
            TableName::CrmLeads => "crm.leads",
            TableName::DocumentosDocumentos => "documentos.documentos",
            TableName::EstoqueEstoquesAtual => "estoque.estoques_atual",
            TableName::EstoqueMovimentacoes => "estoque.movimentacoes",
            TableName::MarketingMetricasPublicacoes => "marketing.metricas_publicacoes",
        }
    }

    pub fn module(&self) -> Module {
        match self {
            TableName::VendasPedidos => Module::Vendas,
            TableName::ComprasCompras | TableName::ComprasRecebimentos => Module::Compras,
            TableName::FinanceiroContasPagar
            | TableName::FinanceiroContasReceber
            | TableName::FinanceiroPagamentosEfetuados
            | TableName::FinanceiroPagamentosRecebidos => Module::Financeiro,
            TableName::ContabilidadeLancamentos | TableName::ContabilidadeLancamentosLinhas => {
                Module::Contabilidade
            }
            TableName::CrmOportunidades | TableName::CrmLeads => Module::Crm,
            TableName::DocumentosDocumentos => Module::Documentos,
            TableName::EstoqueEstoquesAtual | TableName::EstoqueMovimentacoes => Module::Estoque,
            TableName::MarketingMetricasPublicacoes => Module::Marketing,
        }
    }

    /// Dash-slug form used by older dashboards (`financeiro.contas-pagar`)
    pub fn legacy_model(&self) -> String {
        self.as_str().replace('_', "-")
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ParseTableNameError {
    pub input: String,
}

impl fmt::Display for ParseTableNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown table '{}'", self.input)
    }
}

impl std::error::Error for ParseTableNameError {}

impl FromStr for TableName {
    type Err = ParseTableNameError;

    /// Exact canonical ids only; aliases go through the catalog index.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableName::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseTableNameError { input: s.to_string() })
    }
}

impl<'de> Deserialize<'de> for TableName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TableName::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for TableName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Business module a table belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    Vendas,
    Compras,
    Financeiro,
    Contabilidade,
    Crm,
    Documentos,
    Estoque,
    Marketing,
}

impl Module {
    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Vendas => "vendas",
            Module::Compras => "compras",
            Module::Financeiro => "financeiro",
            Module::Contabilidade => "contabilidade",
            Module::Crm => "crm",
            Module::Documentos => "documentos",
            Module::Estoque => "estoque",
            Module::Marketing => "marketing",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ParseModuleError {
    pub input: String,
}

impl fmt::Display for ParseModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown module '{}'", self.input)
    }
}

impl std::error::Error for ParseModuleError {}

impl FromStr for Module {
    type Err = ParseModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vendas" => Ok(Module::Vendas),
            "compras" => Ok(Module::Compras),
            "financeiro" => Ok(Module::Financeiro),
            "contabilidade" => Ok(Module::Contabilidade),
            "crm" => Ok(Module::Crm),
            "documentos" => Ok(Module::Documentos),
            "estoque" => Ok(Module::Estoque),
            "marketing" => Ok(Module::Marketing),
            _ => Err(ParseModuleError { input: s.to_string() }),
        }
    }
}

// ============================================================================
// Join graph
// ============================================================================

/// Physical base relation of a table entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTable {
    pub table: String,
    pub alias: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    Inner,
    #[default]
    Left,
}

/// One fixed edge of the join graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinSpec {
    #[serde(default)]
    pub kind: JoinKind,
    pub table: String,
    pub alias: String,
    pub on: String,
}

/// Implicit status predicate applied when no status rule is supplied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultStatus {
    pub column: String,
    pub values: Vec<String>,
}

// ============================================================================
// TableCatalogEntry
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCatalogEntry {
    pub table: TableName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub source: SourceTable,
    #[serde(default)]
    pub joins: Vec<JoinSpec>,
    #[serde(default, rename = "tenantColumn", skip_serializing_if = "Option::is_none")]
    pub tenant_column: Option<String>,
    #[serde(default, rename = "defaultTimeField", skip_serializing_if = "Option::is_none")]
    pub default_time_field: Option<String>,
    #[serde(default, rename = "defaultStatus", skip_serializing_if = "Option::is_none")]
    pub default_status: Option<DefaultStatus>,
    pub metrics: Vec<MetricDefinition>,
    #[serde(default)]
    pub dimensions: Vec<DimensionDefinition>,
    #[serde(default)]
    pub filters: Vec<FilterDefinition>,
}

impl TableCatalogEntry {
    pub fn module(&self) -> Module {
        self.table.module()
    }

    pub fn alias(&self) -> &str {
        &self.source.alias
    }

    /// Prefix a bare column with the source alias; qualified refs pass through
    pub fn qualify(&self, column: &str) -> String {
        if column.contains('.') {
            column.to_string()
        } else {
            format!("{}.{}", self.source.alias, column)
        }
    }

    pub fn get_metric(&self, id: &str) -> Option<&MetricDefinition> {
        let id = id.trim().to_lowercase();
        self.metrics.iter().find(|m| m.id == id)
    }

    /// First declared metric
    pub fn default_metric(&self) -> Option<&MetricDefinition> {
        self.metrics.first()
    }

    pub fn get_filter(&self, field: &str) -> Option<&FilterDefinition> {
        let field = field.trim().to_lowercase();
        self.filters.iter().find(|f| f.field == field)
    }

    /// Qualified default date column
    pub fn default_date_column(&self) -> Option<String> {
        self.default_time_field.as_deref().map(|c| self.qualify(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_ids_have_exactly_one_dot() {
        for table in TableName::ALL {
            assert_eq!(table.as_str().matches('.').count(), 1, "{}", table);
            assert_eq!(table.as_str().parse::<TableName>().unwrap(), table);
        }
    }

    #[test]
    fn test_module_follows_table_prefix() {
        for table in TableName::ALL {
            let prefix = table.as_str().split('.').next().unwrap();
            assert_eq!(table.module().as_str(), prefix);
        }
    }

    #[test]
    fn test_legacy_model() {
        assert_eq!(TableName::FinanceiroContasPagar.legacy_model(), "financeiro.contas-pagar");
        assert_eq!(TableName::CrmLeads.legacy_model(), "crm.leads");
    }

    #[test]
    fn test_unknown_table_name() {
        assert!("financeiro.contas".parse::<TableName>().is_err());
        assert!("financeiro-contas-pagar".parse::<TableName>().is_err());
    }

    #[test]
    fn test_qualify_and_default_date() {
        let entry: TableCatalogEntry = serde_yaml::from_str(
            r#"
table: financeiro.contas_pagar
source: { table: financeiro.contas_pagar, alias: cp }
defaultTimeField: data_vencimento
metrics:
  - { id: titulos, label: Titulos, expressions: ["COUNT(*)"] }
"#,
        )
        .unwrap();

        assert_eq!(entry.qualify("valor"), "cp.valor");
        assert_eq!(entry.qualify("f.nome"), "f.nome");
        assert_eq!(entry.default_date_column().as_deref(), Some("cp.data_vencimento"));
        assert_eq!(entry.module(), Module::Financeiro);
        assert!(entry.get_metric(" TITULOS ").is_some());
    }
}
