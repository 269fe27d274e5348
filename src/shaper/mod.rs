//! Result shaper (verb module)
//!
//! Driver rows → `{key?, label, total}` rows or a single total.

mod number;
mod shape;

pub use number::{js_number, to_number};
pub use shape::{shape, Row, Shaped, ShapedRow, TOTAL_LABEL};
