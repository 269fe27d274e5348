//! Scalar vocabulary of the catalog: formats, kinds, filter types, operators, grains

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// How a metric's value is meant to be displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricFormat {
    Currency,
    #[default]
    Number,
    Percent,
}

/// Whether a dimension groups by a category or by a time bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionKind {
    #[default]
    Attribute,
    Time,
}

/// Value type of a filterable column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Id,
    String,
    Enum,
    Number,
    Date,
}

impl FilterType {
    /// Types that support range predicates (`between`)
    pub fn is_ordered(&self) -> bool {
        matches!(self, FilterType::Number | FilterType::Date)
    }
}

// ============================================================================
// FilterOperator
// ============================================================================

/// The closed set of filter operators a catalog can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    /// `col = $n`
    Eq,
    /// `col IN ($n, ...)`
    In,
    /// `col ILIKE $n`
    Contains,
    /// `col >= $n`
    Gte,
    /// `col <= $n`
    Lte,
    /// `col BETWEEN $n AND $m`
    Between,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::In => "in",
            FilterOperator::Contains => "contains",
            FilterOperator::Gte => "gte",
            FilterOperator::Lte => "lte",
            FilterOperator::Between => "between",
        }
    }

    /// Operators that take a single scalar value
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            FilterOperator::Eq | FilterOperator::Contains | FilterOperator::Gte | FilterOperator::Lte
        )
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an operator string
#[derive(Debug, Clone)]
pub struct ParseOperatorError {
    pub input: String,
}

impl fmt::Display for ParseOperatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown filter operator '{}'. Valid options: eq, in, contains, gte, lte, between",
            self.input
        )
    }
}

impl std::error::Error for ParseOperatorError {}

impl FromStr for FilterOperator {
    type Err = ParseOperatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "eq" | "=" | "==" => Ok(FilterOperator::Eq),
            "in" => Ok(FilterOperator::In),
            "contains" | "like" | "ilike" => Ok(FilterOperator::Contains),
            "gte" | ">=" => Ok(FilterOperator::Gte),
            "lte" | "<=" => Ok(FilterOperator::Lte),
            "between" => Ok(FilterOperator::Between),
            _ => Err(ParseOperatorError { input: s.to_string() }),
        }
    }
}

impl<'de> Deserialize<'de> for FilterOperator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FilterOperator::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for FilterOperator {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

// ============================================================================
// TimeGrain
// ============================================================================

/// Time bucketing granularity for time dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum TimeGrain {
    Day,
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl TimeGrain {
    pub const ALL: [TimeGrain; 5] = [
        TimeGrain::Day,
        TimeGrain::Week,
        TimeGrain::Month,
        TimeGrain::Quarter,
        TimeGrain::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeGrain::Day => "day",
            TimeGrain::Week => "week",
            TimeGrain::Month => "month",
            TimeGrain::Quarter => "quarter",
            TimeGrain::Year => "year",
        }
    }

    /// `TO_CHAR` pattern used for this grain's bucket label
    pub fn label_format(&self) -> &'static str {
        match self {
            TimeGrain::Day | TimeGrain::Week => "YYYY-MM-DD",
            TimeGrain::Month => "YYYY-MM",
            TimeGrain::Quarter => "YYYY-\"Q\"Q",
            TimeGrain::Year => "YYYY",
        }
    }

    /// Bucket expression over a trusted column reference
    pub fn expr(&self, column: &str) -> String {
        format!(
            "TO_CHAR(DATE_TRUNC('{}', {}), '{}')",
            self.as_str(),
            column,
            self.label_format()
        )
    }

    /// Lenient parse: anything unrecognised buckets by month
    pub fn parse_or_default(s: Option<&str>) -> TimeGrain {
        s.and_then(|g| g.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for TimeGrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ParseGrainError {
    pub input: String,
}

impl fmt::Display for ParseGrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown time grain '{}'. Valid options: day, week, month, quarter, year",
            self.input
        )
    }
}

impl std::error::Error for ParseGrainError {}

impl FromStr for TimeGrain {
    type Err = ParseGrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "daily" | "dia" => Ok(TimeGrain::Day),
            "week" | "weekly" | "semana" => Ok(TimeGrain::Week),
            "month" | "monthly" | "mes" => Ok(TimeGrain::Month),
            "quarter" | "quarterly" | "trimestre" => Ok(TimeGrain::Quarter),
            "year" | "yearly" | "ano" => Ok(TimeGrain::Year),
            _ => Err(ParseGrainError { input: s.to_string() }),
        }
    }
}

impl<'de> Deserialize<'de> for TimeGrain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TimeGrain::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for TimeGrain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operator_spellings() {
        assert_eq!("eq".parse::<FilterOperator>().unwrap(), FilterOperator::Eq);
        assert_eq!("=".parse::<FilterOperator>().unwrap(), FilterOperator::Eq);
        assert_eq!("IN".parse::<FilterOperator>().unwrap(), FilterOperator::In);
        assert_eq!("like".parse::<FilterOperator>().unwrap(), FilterOperator::Contains);
        assert_eq!("ILIKE".parse::<FilterOperator>().unwrap(), FilterOperator::Contains);
        assert_eq!(">=".parse::<FilterOperator>().unwrap(), FilterOperator::Gte);
        assert_eq!("<=".parse::<FilterOperator>().unwrap(), FilterOperator::Lte);
        assert_eq!("between".parse::<FilterOperator>().unwrap(), FilterOperator::Between);
    }

    #[test]
    fn test_parse_operator_unknown() {
        assert!("!=".parse::<FilterOperator>().is_err());
        assert!(">".parse::<FilterOperator>().is_err());
        assert!("regex".parse::<FilterOperator>().is_err());
    }

    #[test]
    fn test_grain_expr_templates() {
        assert_eq!(
            TimeGrain::Month.expr("cp.data_vencimento"),
            "TO_CHAR(DATE_TRUNC('month', cp.data_vencimento), 'YYYY-MM')"
        );
        assert_eq!(
            TimeGrain::Year.expr("p.data_pedido"),
            "TO_CHAR(DATE_TRUNC('year', p.data_pedido), 'YYYY')"
        );
        assert_eq!(
            TimeGrain::Quarter.expr("o.data_prevista"),
            "TO_CHAR(DATE_TRUNC('quarter', o.data_prevista), 'YYYY-\"Q\"Q')"
        );
    }

    #[test]
    fn test_unknown_grain_falls_back_to_month() {
        assert_eq!(TimeGrain::parse_or_default(Some("fortnight")), TimeGrain::Month);
        assert_eq!(TimeGrain::parse_or_default(None), TimeGrain::Month);
        assert_eq!(TimeGrain::parse_or_default(Some("Week")), TimeGrain::Week);
    }

    #[test]
    fn test_between_requires_ordered_type() {
        assert!(FilterType::Number.is_ordered());
        assert!(FilterType::Date.is_ordered());
        assert!(!FilterType::Enum.is_ordered());
        assert!(!FilterType::Id.is_ordered());
    }

    #[test]
    fn test_formats_deserialize_lowercase() {
        let f: MetricFormat = serde_json::from_str("\"currency\"").unwrap();
        assert_eq!(f, MetricFormat::Currency);
        let k: DimensionKind = serde_json::from_str("\"time\"").unwrap();
        assert_eq!(k, DimensionKind::Time);
    }
}
