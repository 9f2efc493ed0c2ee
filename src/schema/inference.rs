use super::types::{is_fixed_text, ColumnType};

/// Cell contents read as missing values, matching the usual CSV NA markers
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_na(cell: &str) -> bool {
    NA_VALUES.contains(&cell.trim())
}

/// Decide a column's type from all of its cells.
///
/// Fixed text columns are always `Text`. Otherwise a column is `Integer` when
/// every present value parses as an integer, `Real` when every present value
/// parses as a float, and `Text` otherwise. An all-missing column is `Text`.
/// Integer columns are narrowed to 32 bits when the cells are converted.
pub fn infer_column_type<'a, I>(name: &str, cells: I) -> ColumnType
where
    I: IntoIterator<Item = &'a str>,
{
    if is_fixed_text(name) {
        return ColumnType::Text;
    }

    let mut seen = false;
    let mut all_int = true;

    for cell in cells {
        if is_na(cell) {
            continue;
        }
        seen = true;
        let cell = cell.trim();
        if all_int && cell.parse::<i64>().is_ok() {
            continue;
        }
        all_int = false;
        if cell.parse::<f64>().is_err() {
            return ColumnType::Text;
        }
    }

    match (seen, all_int) {
        (false, _) => ColumnType::Text,
        (true, true) => ColumnType::Integer,
        (true, false) => ColumnType::Real,
    }
}
