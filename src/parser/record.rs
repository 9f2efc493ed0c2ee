use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::io::Read;

use crate::schema::{infer_column_type, is_na, layer_name, Column, ColumnType, XYIND_PREFIX};

/// A single typed cell value ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i32),
    Real(f64),
    Text(String),
}

impl SqlValue {
    pub fn bind_to(&self, idx: usize, stmt: &mut rusqlite::Statement) -> rusqlite::Result<()> {
        match self {
            SqlValue::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null)?,
            SqlValue::Integer(i) => stmt.raw_bind_parameter(idx, i)?,
            SqlValue::Real(f) => stmt.raw_bind_parameter(idx, f)?,
            SqlValue::Text(s) => stmt.raw_bind_parameter(idx, s.as_str())?,
        }
        Ok(())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Numeric view of the value, used for coordinates
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Integer(i) => Some(*i as f64),
            SqlValue::Real(f) => Some(*f),
            SqlValue::Text(s) => s.trim().parse().ok(),
            SqlValue::Null => None,
        }
    }
}

/// Parsed content of one CSV member
#[derive(Debug, Clone)]
pub struct Table {
    /// Layer name, the member's base name
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// A table gets geometries only when an `xyind*` column holds at least one value
    pub fn is_geometry_eligible(&self) -> bool {
        let xyind: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name.starts_with(XYIND_PREFIX))
            .map(|(i, _)| i)
            .collect();

        self.rows
            .iter()
            .any(|row| xyind.iter().any(|&i| !row[i].is_null()))
    }
}

/// Parse a CSV member into a typed table.
///
/// The whole member is read before column types are decided, so a column is
/// numeric only if every row agrees.
pub fn parse_table<R: Read>(reader: R, member_name: &str, delimiter: u8) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .with_context(|| format!("Failed to read CSV header of {}", member_name))?;
    let names = dedup_headers(headers.iter());

    let mut raw: Vec<csv::StringRecord> = Vec::new();
    for (line, record) in csv_reader.records().enumerate() {
        let record = record
            .with_context(|| format!("Failed to parse row {} of {}", line + 1, member_name))?;
        raw.push(record);
    }

    let columns: Vec<Column> = names
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let col_type = infer_column_type(&name, raw.iter().map(|r| r.get(idx).unwrap_or("")));
            log::debug!("{}: column {} as {:?}", member_name, name, col_type);
            Column::new(name, col_type)
        })
        .collect();

    let mut rows = Vec::with_capacity(raw.len());
    for (line, record) in raw.iter().enumerate() {
        let mut values = Vec::with_capacity(columns.len());
        for (idx, col) in columns.iter().enumerate() {
            let cell = record.get(idx).unwrap_or("");
            let value = convert_cell(cell, col).with_context(|| {
                format!("Invalid value in {} row {} column {}", member_name, line + 1, col.name)
            })?;
            values.push(value);
        }
        rows.push(values);
    }

    Ok(Table {
        name: layer_name(member_name),
        columns,
        rows,
    })
}

fn convert_cell(cell: &str, col: &Column) -> Result<SqlValue> {
    if is_na(cell) {
        return Ok(SqlValue::Null);
    }

    let value = match col.col_type {
        ColumnType::Integer => {
            let wide: i64 = cell.trim().parse()?;
            match i32::try_from(wide) {
                Ok(narrow) => SqlValue::Integer(narrow),
                Err(_) => bail!("{} does not fit a 32-bit integer", wide),
            }
        }
        ColumnType::Real => SqlValue::Real(cell.trim().parse()?),
        ColumnType::Text => SqlValue::Text(cell.to_string()),
    };

    Ok(value)
}

/// Give blank and repeated header names unique names (`Unnamed: 3`, `vuosi.1`).
/// Names differing only in ASCII case count as repeats, since SQLite column
/// names are case-insensitive.
fn dedup_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::new();

    for (idx, header) in headers.enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            header.to_string()
        };

        let mut name = base.clone();
        let mut n = 1;
        while seen.contains(&name.to_ascii_lowercase()) {
            name = format!("{}.{}", base, n);
            n += 1;
        }
        seen.insert(name.to_ascii_lowercase());
        names.push(name);
    }

    names
}
