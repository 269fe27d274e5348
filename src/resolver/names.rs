//! Name normalization shared by table and dimension lookup

/// Normalize a table name or alias for index lookup
///
/// Lower-cases, strips every whitespace character and folds the separators
/// `/`, `-`, `_` and `.` onto `_`, so `Financeiro/Contas-Pagar` and
/// `financeiro.contas_pagar` share a key.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| match c {
            '/' | '-' | '.' => '_'.to_lowercase(),
            c => c.to_lowercase(),
        })
        .collect()
}

/// Normalize a dimension or metric id (`Centro-Custo` -> `centro_custo`)
pub fn normalize_id(id: &str) -> String {
    id.trim().to_lowercase().replace(['-', ' '], "_")
}
