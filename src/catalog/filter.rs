//! Filter definitions

use serde::{Deserialize, Serialize};

use super::types::{FilterOperator, FilterType};

/// A filterable column
///
/// `column` is trusted SQL from the catalog; request values are only ever
/// bound against it as parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterDefinition {
    pub field: String,
    pub label: String,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    pub operators: Vec<FilterOperator>,
    pub column: String,
    /// Compare case-insensitively: `LOWER(column)` against lowercased values
    #[serde(default, rename = "foldCase", skip_serializing_if = "std::ops::Not::not")]
    pub fold_case: bool,
}

impl FilterDefinition {
    pub fn supports(&self, op: FilterOperator) -> bool {
        self.operators.contains(&op)
    }

    /// Operator used when a bare scalar value arrives for this field:
    /// `eq` when declared, otherwise the first declared scalar operator.
    pub fn scalar_operator(&self) -> Option<FilterOperator> {
        if self.supports(FilterOperator::Eq) {
            return Some(FilterOperator::Eq);
        }
        self.operators.iter().copied().find(|op| op.is_scalar())
    }

    /// Column expression as it appears in a predicate
    pub fn predicate_column(&self) -> String {
        if self.fold_case {
            format!("LOWER({})", self.column)
        } else {
            self.column.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(yaml: &str) -> FilterDefinition {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_scalar_operator_prefers_eq() {
        let f = filter("field: status\nlabel: Status\ntype: enum\noperators: [in, eq]\ncolumn: cp.status\n");
        assert_eq!(f.scalar_operator(), Some(FilterOperator::Eq));
    }

    #[test]
    fn test_scalar_operator_uses_single_declared() {
        let de = filter("field: de\nlabel: Data Inicial\ntype: date\noperators: [gte]\ncolumn: cp.data_vencimento\n");
        assert_eq!(de.scalar_operator(), Some(FilterOperator::Gte));

        let doc = filter("field: numero_documento\nlabel: Doc\ntype: string\noperators: [contains]\ncolumn: cp.numero_documento\n");
        assert_eq!(doc.scalar_operator(), Some(FilterOperator::Contains));

        let only_in = filter("field: x\nlabel: X\ntype: id\noperators: [in]\ncolumn: t.x\n");
        assert_eq!(only_in.scalar_operator(), None);
    }

    #[test]
    fn test_fold_case_wraps_column() {
        let f = filter("field: status\nlabel: Status\ntype: enum\noperators: [eq]\ncolumn: cp.status\nfoldCase: true\n");
        assert_eq!(f.predicate_column(), "LOWER(cp.status)");
    }
}
