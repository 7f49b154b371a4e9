//! Column Transformer
//!
//! Fitted mapping from an `AlignedRow` to a dense numeric vector:
//! one-hot blocks for categorical fields, training-set counts for
//! identifier fields, then numeric fields (passed through or standardized).

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::frequency::FrequencyEncoder;
use super::onehot::OneHotEncoder;
use super::scaler::StandardScaler;
use crate::error::{CoreError, CoreResult};
use crate::features::{AlignedRow, FieldValue};
use crate::schema::{FieldKind, NumericScaling, Schema};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CategoricalColumn {
    index: usize,
    encoder: OneHotEncoder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FrequencyColumn {
    index: usize,
    encoder: FrequencyEncoder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnTransformer {
    input_width: usize,
    categorical: Vec<CategoricalColumn>,
    frequency: Vec<FrequencyColumn>,
    numeric: Vec<usize>,
    scaler: Option<StandardScaler>,
    feature_names: Vec<String>,
}

impl ColumnTransformer {
    pub fn fit(schema: &Schema, rows: &[AlignedRow]) -> CoreResult<Self> {
        if rows.is_empty() {
            return Err(CoreError::DegenerateLabels(
                "cannot fit a transformer on zero rows".to_string(),
            ));
        }
        check_widths(schema.len(), rows)?;

        let mut categorical = Vec::new();
        let mut frequency = Vec::new();
        let mut numeric = Vec::new();

        for (index, field) in schema.fields().iter().enumerate() {
            let column = rows.iter().map(|row| &row.values()[index]);
            match field.kind {
                FieldKind::Categorical => categorical.push(CategoricalColumn {
                    index,
                    encoder: OneHotEncoder::fit(column),
                }),
                FieldKind::Frequency => frequency.push(FrequencyColumn {
                    index,
                    encoder: FrequencyEncoder::fit(column),
                }),
                FieldKind::Numeric => numeric.push(index),
            }
        }

        for col in &frequency {
            log::debug!(
                "Frequency column {}: {} distinct values",
                schema.fields()[col.index].name,
                col.encoder.distinct()
            );
        }

        let scaler = match schema.scaling() {
            NumericScaling::Passthrough => None,
            NumericScaling::Standardize => {
                let columns: Vec<Vec<f64>> = numeric
                    .iter()
                    .map(|&index| rows.iter().map(|row| numeric_cell(row, index)).collect())
                    .collect();
                Some(StandardScaler::fit(&columns))
            }
        };

        let mut feature_names = Vec::new();
        for col in &categorical {
            let name = schema.fields()[col.index].name;
            for category in col.encoder.categories() {
                feature_names.push(format!("{}_{}", name, category));
            }
        }
        for col in &frequency {
            feature_names.push(format!("{}_freq", schema.fields()[col.index].name));
        }
        for &index in &numeric {
            feature_names.push(schema.fields()[index].name.to_string());
        }

        log::debug!(
            "Column transformer fitted: {} inputs → {} features ({} categorical, {} frequency, {} numeric)",
            schema.len(),
            feature_names.len(),
            categorical.len(),
            frequency.len(),
            numeric.len()
        );

        Ok(Self {
            input_width: schema.len(),
            categorical,
            frequency,
            numeric,
            scaler,
            feature_names,
        })
    }

    /// Number of output features
    pub fn width(&self) -> usize {
        self.feature_names.len()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn transform_row(&self, row: &AlignedRow) -> CoreResult<Vec<f64>> {
        if row.len() != self.input_width {
            return Err(CoreError::WidthMismatch {
                context: "transformer input",
                expected: self.input_width,
                actual: row.len(),
            });
        }

        let mut out = vec![0.0; self.width()];
        self.write_row(row, &mut out);
        Ok(out)
    }

    /// Transform many rows into a dense (rows × features) matrix
    pub fn transform(&self, rows: &[AlignedRow]) -> CoreResult<Array2<f64>> {
        check_widths(self.input_width, rows)?;

        let mut matrix = Array2::<f64>::zeros((rows.len(), self.width()));
        for (row, mut out) in rows.iter().zip(matrix.rows_mut()) {
            match out.as_slice_mut() {
                Some(slice) => self.write_row(row, slice),
                None => {
                    let dense = self.transform_row(row)?;
                    out.iter_mut().zip(dense).for_each(|(o, v)| *o = v);
                }
            }
        }
        Ok(matrix)
    }

    fn write_row(&self, row: &AlignedRow, out: &mut [f64]) {
        let values = row.values();
        let mut offset = 0;

        for col in &self.categorical {
            let width = col.encoder.width();
            col.encoder
                .encode_into(&values[col.index], &mut out[offset..offset + width]);
            offset += width;
        }

        for col in &self.frequency {
            out[offset] = col.encoder.encode(&values[col.index]);
            offset += 1;
        }

        for (j, &index) in self.numeric.iter().enumerate() {
            let raw = numeric_cell(row, index);
            out[offset] = match &self.scaler {
                Some(scaler) => scaler.transform(j, raw),
                None => raw,
            };
            offset += 1;
        }
    }
}

fn numeric_cell(row: &AlignedRow, index: usize) -> f64 {
    match &row.values()[index] {
        FieldValue::Number(n) => *n,
        _ => 0.0,
    }
}

fn check_widths(expected: usize, rows: &[AlignedRow]) -> CoreResult<()> {
    match rows.iter().find(|row| row.len() != expected) {
        Some(row) => Err(CoreError::WidthMismatch {
            context: "transformer input",
            expected,
            actual: row.len(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{derive, RawRecord};
    use crate::schema::DatasetVariant;

    fn paysim_row(kind: &str, amount: f64, old_org: f64) -> AlignedRow {
        let schema = Schema::for_variant(DatasetVariant::Paysim);
        let mut record = RawRecord::new()
            .with("type", kind)
            .with("amount", amount)
            .with("oldbalanceOrg", old_org);
        derive(&schema, &mut record).unwrap();
        AlignedRow::from_record(&schema, &record).unwrap()
    }

    #[test]
    fn test_paysim_passthrough_layout() {
        let schema = Schema::for_variant(DatasetVariant::Paysim);
        let rows = vec![paysim_row("PAYMENT", 10.0, 100.0), paysim_row("TRANSFER", 20.0, 0.0)];
        let transformer = ColumnTransformer::fit(&schema, &rows).unwrap();

        // 2 one-hot columns + 9 numeric
        assert_eq!(transformer.width(), 11);
        assert_eq!(transformer.feature_names()[0], "type_PAYMENT");
        assert_eq!(transformer.feature_names()[2], "amount");

        let out = transformer.transform_row(&rows[1]).unwrap();
        assert_eq!(&out[..3], &[0.0, 1.0, 20.0]);
    }

    #[test]
    fn test_unknown_category_row_is_all_zero_block() {
        let schema = Schema::for_variant(DatasetVariant::Paysim);
        let rows = vec![paysim_row("PAYMENT", 10.0, 100.0), paysim_row("TRANSFER", 20.0, 0.0)];
        let transformer = ColumnTransformer::fit(&schema, &rows).unwrap();

        let out = transformer.transform_row(&paysim_row("DEBIT", 5.0, 1.0)).unwrap();
        assert_eq!(&out[..2], &[0.0, 0.0]);
        assert_eq!(out[2], 5.0);
    }

    #[test]
    fn test_matrix_matches_row_transform() {
        let schema = Schema::for_variant(DatasetVariant::Paysim);
        let rows = vec![
            paysim_row("PAYMENT", 10.0, 100.0),
            paysim_row("TRANSFER", 20.0, 0.0),
            paysim_row("CASH_OUT", 30.0, 5.0),
        ];
        let transformer = ColumnTransformer::fit(&schema, &rows).unwrap();
        let matrix = transformer.transform(&rows).unwrap();

        assert_eq!(matrix.dim(), (3, transformer.width()));
        for (i, row) in rows.iter().enumerate() {
            let dense = transformer.transform_row(row).unwrap();
            assert_eq!(matrix.row(i).to_vec(), dense);
        }
    }

    #[test]
    fn test_synthetic_standardizes_and_counts() {
        let schema = Schema::for_variant(DatasetVariant::Synthetic);
        let make = |amount: f64, user: &str| {
            let mut record = RawRecord::new()
                .with("Timestamp", 1_700_000_000.0)
                .with("Amount", amount)
                .with("User_ID", user);
            derive(&schema, &mut record).unwrap();
            AlignedRow::from_record(&schema, &record).unwrap()
        };
        let rows = vec![make(10.0, "u1"), make(30.0, "u1"), make(20.0, "u2")];
        let transformer = ColumnTransformer::fit(&schema, &rows).unwrap();

        let names = transformer.feature_names();
        let user_idx = names.iter().position(|n| n == "User_ID_freq").unwrap();
        let amount_idx = names.iter().position(|n| n == "Amount").unwrap();

        let out = transformer.transform_row(&rows[2]).unwrap();
        assert_eq!(out[user_idx], 1.0);
        assert!(out[amount_idx].abs() < 1e-12, "mean amount should standardize to 0");

        let first = transformer.transform_row(&rows[0]).unwrap();
        assert_eq!(first[user_idx], 2.0);
    }

    #[test]
    fn test_rejects_wrong_width() {
        let paysim = Schema::for_variant(DatasetVariant::Paysim);
        let transformer =
            ColumnTransformer::fit(&paysim, &[paysim_row("PAYMENT", 1.0, 1.0)]).unwrap();

        let synthetic = Schema::for_variant(DatasetVariant::Synthetic);
        let row = AlignedRow::from_record(&synthetic, &RawRecord::new()).unwrap();
        let err = transformer.transform_row(&row).unwrap_err();
        assert!(matches!(
            err,
            CoreError::WidthMismatch { expected, actual, .. }
                if expected == paysim.len() && actual == synthetic.len()
        ));
        assert!(transformer.transform(&[row]).is_err());
    }
}
