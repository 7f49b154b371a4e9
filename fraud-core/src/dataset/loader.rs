//! CSV → labeled records
//!
//! Reads a headered transaction CSV, keeps the columns the schema needs and
//! parses each cell by field kind. Row numbers in errors are 1-based data
//! rows (the header is not counted).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use super::LabeledDataset;
use crate::error::{CoreError, CoreResult};
use crate::features::{FieldValue, RawRecord};
use crate::schema::{FieldKind, Schema};

/// Cells treated as missing values
const MISSING_MARKERS: &[&str] = &["", "na", "nan", "null", "none"];

/// Load a dataset file for `schema`
pub fn load_csv(path: &Path, schema: &Schema) -> CoreResult<LabeledDataset> {
    let file = File::open(path)?;
    let dataset = read_csv(file, schema)?;
    log::info!(
        "Loaded {} rows ({} positive) from {}",
        dataset.len(),
        dataset.positives(),
        path.display()
    );
    Ok(dataset)
}

/// Load a dataset from any reader (header row required)
pub fn read_csv<R: Read>(reader: R, schema: &Schema) -> CoreResult<LabeledDataset> {
    let mut csv = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let header = csv.headers()?.clone();

    let mut columns = Vec::new();
    for name in schema.required_columns() {
        let position = header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| CoreError::MissingColumn(name.to_string()))?;
        columns.push((name, position));
    }
    let label_position = columns
        .iter()
        .find(|(name, _)| *name == schema.label())
        .map(|(_, p)| *p)
        .ok_or_else(|| CoreError::MissingColumn(schema.label().to_string()))?;

    let mut records = Vec::new();
    let mut labels = Vec::new();
    let mut row = StringRecord::new();
    let mut number = 0;

    while csv.read_record(&mut row)? {
        number += 1;
        let mut record = RawRecord::new();

        for &(name, position) in &columns {
            if name == schema.label() {
                continue;
            }
            let cell = row.get(position).unwrap_or("");
            let kind = schema.field(name).map(|f| f.kind);
            let value = parse_cell(name, kind, cell).map_err(|e| e.at_row(number))?;
            record.insert(name, value);
        }

        let label = parse_label(schema.label(), row.get(label_position).unwrap_or(""))
            .map_err(|e| e.at_row(number))?;

        records.push(record);
        labels.push(label);
    }

    Ok(LabeledDataset::new(*schema, records, labels))
}

/// Parse one cell. `kind` is `None` for raw source columns (timestamps),
/// which keep their text unless it is a plain number.
fn parse_cell(column: &str, kind: Option<FieldKind>, cell: &str) -> CoreResult<FieldValue> {
    if is_missing(cell) {
        return Ok(FieldValue::Missing);
    }

    match kind {
        Some(FieldKind::Numeric) => parse_number(cell)
            .map(FieldValue::Number)
            .ok_or_else(|| CoreError::malformed(column, format!("'{}' is not numeric", cell))),
        Some(FieldKind::Categorical) | Some(FieldKind::Frequency) => {
            Ok(FieldValue::Text(cell.to_string()))
        }
        None => Ok(cell
            .parse::<f64>()
            .map(FieldValue::Number)
            .unwrap_or_else(|_| FieldValue::Text(cell.to_string()))),
    }
}

fn parse_number(cell: &str) -> Option<f64> {
    match cell.to_ascii_lowercase().as_str() {
        "true" => Some(1.0),
        "false" => Some(0.0),
        other => other.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

fn parse_label(column: &str, cell: &str) -> CoreResult<u8> {
    match parse_number(cell) {
        Some(v) if v == 0.0 => Ok(0),
        Some(v) if v == 1.0 => Ok(1),
        _ => Err(CoreError::malformed(
            column,
            format!("label must be 0 or 1, got '{}'", cell),
        )),
    }
}

fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell.to_ascii_lowercase().as_str())
}
