//! Allow-patterns for caller-supplied SQL fragments
//!
//! Only two shapes of free-form SQL are accepted from a request: aggregate
//! measures over column arithmetic, and date-bucketed dimension expressions.
//! Accepted fragments are rebuilt from their captured parts rather than
//! passed through, so the emitted text is always one of these shapes.

use regex::Regex;
use std::sync::OnceLock;

use super::error::ResolveError;
use crate::catalog::TimeGrain;

const IDENT: &str = r"[A-Za-z_][A-Za-z0-9_]*";
const NUMBER: &str = r"[0-9]+(?:\.[0-9]+)?";

/// `TO_CHAR` formats a dimension expression may use
pub const ALLOWED_DATE_FORMATS: &[&str] = &[
    "YYYY-MM-DD",
    "YYYY-MM",
    "YYYY-\"Q\"Q",
    "YYYY",
    "IYYY-IW",
    "MM/YYYY",
    "DD/MM/YYYY",
];

static MEASURE: OnceLock<Regex> = OnceLock::new();
static TOKEN: OnceLock<Regex> = OnceLock::new();
static BARE_COLUMN: OnceLock<Regex> = OnceLock::new();
static DATE_TRUNC: OnceLock<Regex> = OnceLock::new();
static TO_CHAR: OnceLock<Regex> = OnceLock::new();
static COUNT_DISTINCT: OnceLock<Regex> = OnceLock::new();
static COUNT_EMPTY: OnceLock<Regex> = OnceLock::new();

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> Result<&'static Regex, ResolveError> {
    if let Some(re) = cell.get() {
        return Ok(re);
    }
    let re = Regex::new(pattern).map_err(|e| ResolveError::Pattern(e.to_string()))?;
    Ok(cell.get_or_init(|| re))
}

fn colref() -> String {
    format!("{IDENT}(?:\\.{IDENT})?")
}

fn grain_group() -> &'static str {
    "(day|week|month|quarter|year)"
}

// ----------------------------------------------------------------------------
// Measures
// ----------------------------------------------------------------------------

/// Rewrite legacy aggregate spellings: `COUNT_DISTINCT(x)` and `COUNT()`
pub fn rewrite_legacy_aggregates(expr: &str) -> Result<String, ResolveError> {
    let distinct = cached(&COUNT_DISTINCT, r"(?i)COUNT_DISTINCT\s*\(\s*([^()]*?)\s*\)")?;
    let empty = cached(&COUNT_EMPTY, r"(?i)COUNT\s*\(\s*\)")?;
    let rewritten = distinct.replace_all(expr, "COUNT(DISTINCT $1)");
    Ok(empty.replace_all(&rewritten, "COUNT(*)").into_owned())
}

/// Comparison key for measure expressions: legacy spellings rewritten,
/// whitespace removed, lower-cased
pub fn expression_key(expr: &str) -> Result<String, ResolveError> {
    let rewritten = rewrite_legacy_aggregates(expr)?;
    Ok(rewritten
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase())
}

/// Rebuild a free-form aggregate with bare columns qualified by `alias`
///
/// Accepts `FUNC([DISTINCT] operand [op operand]...)` with FUNC in
/// SUM/AVG/MIN/MAX/COUNT, plus `COUNT(*)`. A bare column reference is
/// accepted and summed. Returns `None` for anything else.
pub fn free_form_measure(expr: &str, alias: &str) -> Result<Option<String>, ResolveError> {
    let expr = rewrite_legacy_aggregates(expr)?;
    let operand = format!("(?:{}|{NUMBER})", colref());
    let measure = cached(
        &MEASURE,
        &format!(
            r"(?i)^\s*(SUM|AVG|MIN|MAX|COUNT)\s*\(\s*(DISTINCT\s+)?(\*|{operand}(?:\s*[-+*/]\s*{operand})*)\s*\)\s*$"
        ),
    )?;

    if let Some(caps) = measure.captures(&expr) {
        let func = caps[1].to_uppercase();
        let distinct = caps.get(2).is_some();
        let body = caps[3].trim();

        if body == "*" {
            if func != "COUNT" || distinct {
                return Ok(None);
            }
            return Ok(Some("COUNT(*)".to_string()));
        }

        let body = qualify_arithmetic(body, alias)?;
        let prefix = if distinct { "DISTINCT " } else { "" };
        return Ok(Some(format!("{func}({prefix}{body})")));
    }

    if let Some(column) = bare_column(&expr)? {
        return Ok(Some(format!("SUM({})", qualify(&column, alias))));
    }

    Ok(None)
}

fn qualify_arithmetic(body: &str, alias: &str) -> Result<String, ResolveError> {
    let token = cached(&TOKEN, &format!(r"{NUMBER}|{}|[-+*/]", colref()))?;
    let parts: Vec<String> = token
        .find_iter(body)
        .map(|m| {
            let t = m.as_str();
            if t.len() == 1 && "+-*/".contains(t) {
                t.to_string()
            } else if t.starts_with(|c: char| c.is_ascii_digit()) {
                t.to_string()
            } else {
                qualify(t, alias)
            }
        })
        .collect();
    Ok(parts.join(" "))
}

fn qualify(column: &str, alias: &str) -> String {
    if column.contains('.') {
        column.to_string()
    } else {
        format!("{alias}.{column}")
    }
}

/// True for `col` or `alias.col`
pub fn is_column_ref(expr: &str) -> Result<bool, ResolveError> {
    Ok(bare_column(expr)?.is_some())
}

fn bare_column(expr: &str) -> Result<Option<String>, ResolveError> {
    let re = cached(&BARE_COLUMN, &format!(r"^\s*({})\s*$", colref()))?;
    Ok(re.captures(expr).map(|c| c[1].to_string()))
}

// ----------------------------------------------------------------------------
// Dimension expressions
// ----------------------------------------------------------------------------

/// Rebuild an allowed raw dimension expression with its column qualified
///
/// Accepts a bare column, `DATE_TRUNC('<grain>', col)` and
/// `TO_CHAR(DATE_TRUNC('<grain>', col), '<format>')` where the format is one
/// of [`ALLOWED_DATE_FORMATS`].
pub fn free_form_dimension(expr: &str, alias: &str) -> Result<Option<(String, Option<TimeGrain>)>, ResolveError> {
    if let Some(column) = bare_column(expr)? {
        return Ok(Some((qualify(&column, alias), None)));
    }

    let grain = grain_group();
    let col = colref();

    let to_char = cached(
        &TO_CHAR,
        &format!(r"(?i)^\s*TO_CHAR\s*\(\s*DATE_TRUNC\s*\(\s*'{grain}'\s*,\s*({col})\s*\)\s*,\s*'([^']*)'\s*\)\s*$"),
    )?;
    if let Some(caps) = to_char.captures(expr) {
        let format = &caps[3];
        if !ALLOWED_DATE_FORMATS.contains(&format) {
            return Ok(None);
        }
        let g: TimeGrain = caps[1].parse().unwrap_or_default();
        let rebuilt = format!(
            "TO_CHAR(DATE_TRUNC('{}', {}), '{}')",
            g,
            qualify(&caps[2], alias),
            format
        );
        return Ok(Some((rebuilt, Some(g))));
    }

    let date_trunc = cached(
        &DATE_TRUNC,
        &format!(r"(?i)^\s*DATE_TRUNC\s*\(\s*'{grain}'\s*,\s*({col})\s*\)\s*$"),
    )?;
    if let Some(caps) = date_trunc.captures(expr) {
        let g: TimeGrain = caps[1].parse().unwrap_or_default();
        let rebuilt = format!("DATE_TRUNC('{}', {})", g, qualify(&caps[2], alias));
        return Ok(Some((rebuilt, Some(g))));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_key_equivalences() {
        assert_eq!(expression_key("COUNT()").unwrap(), expression_key("count(*)").unwrap());
        assert_eq!(
            expression_key("COUNT_DISTINCT( p.id )").unwrap(),
            expression_key("COUNT(DISTINCT p.id)").unwrap()
        );
        assert_eq!(
            expression_key("SUM( cp.valor_liquido )").unwrap(),
            expression_key("sum(cp.valor_liquido)").unwrap()
        );
    }

    #[test]
    fn test_free_form_measure_qualifies_bare_columns() {
        assert_eq!(
            free_form_measure("sum(valor_bruto - desconto)", "cp").unwrap().as_deref(),
            Some("SUM(cp.valor_bruto - cp.desconto)")
        );
        assert_eq!(
            free_form_measure("AVG(i.quantidade * 2)", "p").unwrap().as_deref(),
            Some("AVG(i.quantidade * 2)")
        );
        assert_eq!(
            free_form_measure("COUNT_DISTINCT(cliente_id)", "p").unwrap().as_deref(),
            Some("COUNT(DISTINCT p.cliente_id)")
        );
        assert_eq!(free_form_measure("count()", "p").unwrap().as_deref(), Some("COUNT(*)"));
    }

    #[test]
    fn test_free_form_bare_column_is_summed() {
        assert_eq!(
            free_form_measure("valor_liquido", "cp").unwrap().as_deref(),
            Some("SUM(cp.valor_liquido)")
        );
    }

    #[test]
    fn test_free_form_measure_rejects_injection() {
        for expr in [
            "SUM(cp.valor); DROP TABLE x",
            "SUM(cp.valor) FROM pg_user --",
            "pg_sleep(10)",
            "SUM(CASE WHEN 1=1 THEN 1 END)",
            "SUM(*)",
            "COUNT(DISTINCT *)",
            "SUM('a')",
            "1; SELECT 1",
        ] {
            assert_eq!(free_form_measure(expr, "cp").unwrap(), None, "{}", expr);
        }
    }

    #[test]
    fn test_free_form_dimension_shapes() {
        assert_eq!(
            free_form_dimension("status", "cp").unwrap(),
            Some(("cp.status".to_string(), None))
        );
        assert_eq!(
            free_form_dimension("to_char(date_trunc('Month', data_vencimento), 'YYYY-MM')", "cp").unwrap(),
            Some((
                "TO_CHAR(DATE_TRUNC('month', cp.data_vencimento), 'YYYY-MM')".to_string(),
                Some(TimeGrain::Month)
            ))
        );
        assert_eq!(
            free_form_dimension("DATE_TRUNC('year', p.data_pedido)", "p").unwrap(),
            Some(("DATE_TRUNC('year', p.data_pedido)".to_string(), Some(TimeGrain::Year)))
        );
    }

    #[test]
    fn test_free_form_dimension_rejects() {
        for expr in [
            "TO_CHAR(DATE_TRUNC('month', cp.data), 'YYYY''); DROP')",
            "TO_CHAR(DATE_TRUNC('century', cp.data), 'YYYY')",
            "TO_CHAR(DATE_TRUNC('month', cp.data), 'HH24')",
            "LOWER(cp.status)",
            "cp.status || 'x'",
        ] {
            assert_eq!(free_form_dimension(expr, "cp").unwrap(), None, "{}", expr);
        }
    }
}
