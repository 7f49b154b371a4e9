//! Fitted Pipeline - column transformer + classifier, stamped with the
//! schema layout it was fitted on

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::booster::{BoosterParams, GradientBoostedClassifier};
use crate::error::{CoreError, CoreResult};
use crate::features::AlignedRow;
use crate::preprocess::ColumnTransformer;
use crate::schema::{LayoutInfo, Schema};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPipeline {
    layout: LayoutInfo,
    transformer: ColumnTransformer,
    classifier: GradientBoostedClassifier,
}

impl FittedPipeline {
    /// Assemble from separately fitted parts
    pub fn new(
        schema: &Schema,
        transformer: ColumnTransformer,
        classifier: GradientBoostedClassifier,
    ) -> CoreResult<Self> {
        if transformer.width() != classifier.n_features() {
            return Err(CoreError::WidthMismatch {
                context: "pipeline assembly",
                expected: classifier.n_features(),
                actual: transformer.width(),
            });
        }
        Ok(Self {
            layout: schema.info(),
            transformer,
            classifier,
        })
    }

    /// Fit transformer and classifier on the same rows
    pub fn fit(
        schema: &Schema,
        rows: &[AlignedRow],
        labels: &[u8],
        params: &BoosterParams,
    ) -> CoreResult<Self> {
        let transformer = ColumnTransformer::fit(schema, rows)?;
        let x = transformer.transform(rows)?;
        let classifier = GradientBoostedClassifier::fit(x.view(), labels, params)?;
        Self::new(schema, transformer, classifier)
    }

    pub fn layout(&self) -> &LayoutInfo {
        &self.layout
    }

    /// Compiled schema matching the stored layout stamp
    pub fn schema(&self) -> CoreResult<Schema> {
        self.layout.resolve()
    }

    pub fn transformer(&self) -> &ColumnTransformer {
        &self.transformer
    }

    pub fn classifier(&self) -> &GradientBoostedClassifier {
        &self.classifier
    }

    /// Fraud probability for one aligned row
    pub fn predict_proba(&self, row: &AlignedRow) -> CoreResult<f64> {
        let features = self.transformer.transform_row(row)?;
        self.classifier.predict_proba(&features)
    }

    pub fn predict_proba_batch(&self, rows: &[AlignedRow]) -> CoreResult<Vec<f64>> {
        let x: Array2<f64> = self.transformer.transform(rows)?;
        self.classifier.predict_proba_matrix(&x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{derive, RawRecord};
    use crate::schema::DatasetVariant;

    fn rows() -> (Vec<AlignedRow>, Vec<u8>) {
        let schema = Schema::for_variant(DatasetVariant::Paysim);
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..60 {
            let fraud = i % 5 == 0;
            let mut record = RawRecord::new()
                .with("type", if fraud { "TRANSFER" } else { "PAYMENT" })
                .with("amount", if fraud { 9000.0 + i as f64 } else { 100.0 + i as f64 })
                .with("oldbalanceOrg", if fraud { 9000.0 } else { 5000.0 })
                .with("newbalanceOrig", if fraud { 0.0 } else { 4900.0 });
            derive(&schema, &mut record).unwrap();
            rows.push(AlignedRow::from_record(&schema, &record).unwrap());
            labels.push(fraud as u8);
        }
        (rows, labels)
    }

    fn params() -> BoosterParams {
        BoosterParams {
            n_estimators: 20,
            max_depth: 3,
            learning_rate: 0.3,
            ..Default::default()
        }
    }

    #[test]
    fn test_fit_and_score() {
        let schema = Schema::for_variant(DatasetVariant::Paysim);
        let (rows, labels) = rows();
        let pipeline = FittedPipeline::fit(&schema, &rows, &labels, &params()).unwrap();

        assert_eq!(pipeline.schema().unwrap(), schema);
        assert!(pipeline.predict_proba(&rows[0]).unwrap() > 0.5);
        assert!(pipeline.predict_proba(&rows[1]).unwrap() < 0.5);
    }

    #[test]
    fn test_batch_matches_single_and_is_repeatable() {
        let schema = Schema::for_variant(DatasetVariant::Paysim);
        let (rows, labels) = rows();
        let pipeline = FittedPipeline::fit(&schema, &rows, &labels, &params()).unwrap();

        let batch = pipeline.predict_proba_batch(&rows).unwrap();
        for (row, p) in rows.iter().zip(&batch) {
            assert_eq!(pipeline.predict_proba(row).unwrap(), *p);
            assert_eq!(pipeline.predict_proba(row).unwrap(), *p);
        }
    }

    #[test]
    fn test_mismatched_parts_rejected() {
        let schema = Schema::for_variant(DatasetVariant::Paysim);
        let (rows, labels) = rows();
        let transformer = ColumnTransformer::fit(&schema, &rows).unwrap();
        let mut x = Array2::<f64>::zeros((labels.len(), 3));
        for (i, &l) in labels.iter().enumerate() {
            x[[i, 0]] = l as f64;
        }
        let classifier = GradientBoostedClassifier::fit(x.view(), &labels, &params()).unwrap();
        let width = transformer.width();
        assert!(matches!(
            FittedPipeline::new(&schema, transformer, classifier),
            Err(CoreError::WidthMismatch { expected: 3, actual, .. }) if actual == width
        ));
    }
}
