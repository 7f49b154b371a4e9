//! Dataset Module - training data loading and partitioning
//!
//! Loads a labeled transaction CSV, fills missing values, runs the schema's
//! derivations and produces aligned rows ready for the column transformer.

pub mod loader;
pub mod split;
pub mod oversample;

#[cfg(test)]
mod tests;

pub use loader::{load_csv, read_csv};
pub use oversample::{random_oversample, OversampleStage};
pub use split::{stratified_kfold, stratified_split, Split};

use crate::error::CoreResult;
use crate::features::{derive, AlignedRow, MedianImputer, RawRecord};
use crate::schema::Schema;

/// Raw records and their 0/1 labels, in file order
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    schema: Schema,
    records: Vec<RawRecord>,
    labels: Vec<u8>,
}

/// Aligned rows ready for fitting, with the imputer that produced them
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub rows: Vec<AlignedRow>,
    pub labels: Vec<u8>,
    pub imputer: MedianImputer,
    pub imputed_cells: usize,
}

impl LabeledDataset {
    pub fn new(schema: Schema, records: Vec<RawRecord>, labels: Vec<u8>) -> Self {
        Self { schema, records, labels }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&l| l == 1).count()
    }

    /// Impute, derive and align every record.
    /// Medians are computed over the whole loaded dataset.
    pub fn prepare(self) -> CoreResult<PreparedDataset> {
        let schema = self.schema;
        let imputer = MedianImputer::fit(&schema, &self.records);

        let mut rows = Vec::with_capacity(self.records.len());
        let mut imputed_cells = 0;

        for (i, mut record) in self.records.into_iter().enumerate() {
            let number = i + 1;
            imputed_cells += imputer.apply(&schema, &mut record);
            derive(&schema, &mut record).map_err(|e| e.at_row(number))?;
            rows.push(AlignedRow::from_record(&schema, &record).map_err(|e| e.at_row(number))?);
        }

        if imputed_cells > 0 {
            log::info!("Imputed {} missing cells", imputed_cells);
        }

        Ok(PreparedDataset {
            rows,
            labels: self.labels,
            imputer,
            imputed_cells,
        })
    }
}

impl PreparedDataset {
    /// Rows and labels at `indices` (duplicates allowed)
    pub fn select(&self, indices: &[usize]) -> (Vec<AlignedRow>, Vec<u8>) {
        let rows = indices.iter().map(|&i| self.rows[i].clone()).collect();
        let labels = indices.iter().map(|&i| self.labels[i]).collect();
        (rows, labels)
    }
}
