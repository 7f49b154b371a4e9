//! Training driver
//!
//! load → prepare → (oversample full) → stratified split → fit transformer →
//! (search) → (oversample train) → fit booster → evaluate → pick threshold →
//! persist both artifacts.

use ndarray::Axis;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use uuid::Uuid;

use crate::artifact::{save_pair, PipelineArtifact, ThresholdArtifact};
use crate::config::TrainConfig;
use crate::dataset::{load_csv, random_oversample, stratified_split, LabeledDataset, OversampleStage};
use crate::error::{CoreError, CoreResult};
use crate::model::{
    average_precision, select_threshold, BoosterParams, ClassificationReport, EvaluationSummary,
    FittedPipeline, GradientBoostedClassifier, RandomizedSearch, SearchOutcome, SearchSpace,
    ThresholdChoice,
};
use crate::preprocess::ColumnTransformer;
use crate::schema::DatasetVariant;

/// What a training run produced, for logging and the CLI summary
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub artifact_id: Uuid,
    pub variant: DatasetVariant,
    pub rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub params: BoosterParams,
    pub search: Option<SearchOutcome>,
    pub report: ClassificationReport,
    pub summary: EvaluationSummary,
    pub threshold: ThresholdChoice,
}

/// Fitted, evaluated, not yet written
#[derive(Debug, Clone)]
pub struct TrainedArtifacts {
    pub pipeline: PipelineArtifact,
    pub threshold: ThresholdArtifact,
    pub report: TrainingReport,
}

/// Full run: read the CSV, train, write both files to `output_dir`
pub fn run(config: &TrainConfig) -> CoreResult<TrainingReport> {
    let schema = crate::schema::Schema::for_variant(config.variant);
    let dataset = load_csv(&config.dataset_path, &schema)?;
    let trained = fit_and_evaluate(config, dataset)?;
    save_pair(&trained.pipeline, &trained.threshold, &config.output_dir)?;
    Ok(trained.report)
}

pub fn fit_and_evaluate(config: &TrainConfig, dataset: LabeledDataset) -> CoreResult<TrainedArtifacts> {
    config.validate()?;
    if dataset.is_empty() {
        return Err(CoreError::DegenerateLabels("dataset has no rows".into()));
    }

    let schema = *dataset.schema();
    let rows = dataset.len();
    let prepared = dataset.prepare()?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    // Row pool the split draws from
    let mut pool: Vec<usize> = (0..prepared.rows.len()).collect();
    if config.oversample == OversampleStage::Full {
        log::warn!("Oversampling before the split: duplicated rows can appear in the test partition");
        pool = random_oversample(&pool, &prepared.labels, config.oversample_ratio, &mut rng)?;
    }

    let pool_labels: Vec<u8> = pool.iter().map(|&i| prepared.labels[i]).collect();
    let split = stratified_split(&pool_labels, config.test_size, config.seed)?;
    let train_idx: Vec<usize> = split.train.iter().map(|&p| pool[p]).collect();
    let test_idx: Vec<usize> = split.test.iter().map(|&p| pool[p]).collect();
    log::info!(
        "Split {} rows: {} train / {} test",
        pool.len(),
        train_idx.len(),
        test_idx.len()
    );

    let (train_rows, train_labels) = prepared.select(&train_idx);
    let transformer = ColumnTransformer::fit(&schema, &train_rows)?;
    let x_train = transformer.transform(&train_rows)?;

    let fold_ratio = (config.oversample == OversampleStage::Train).then_some(config.oversample_ratio);

    let search = if config.search_iter > 0 {
        let outcome = RandomizedSearch {
            space: SearchSpace::default(),
            n_iter: config.search_iter,
            folds: config.cv_folds,
            seed: config.seed,
            oversample_ratio: fold_ratio,
        }
        .run(&x_train, &train_labels, &config.booster)?;
        log::info!("Best search score (mean F1): {:.4}", outcome.best_score);
        Some(outcome)
    } else {
        None
    };
    let params = search
        .as_ref()
        .map(|s| s.best.clone())
        .unwrap_or_else(|| config.booster.clone());

    let all_train: Vec<usize> = (0..train_labels.len()).collect();
    let fit_idx = match fold_ratio {
        Some(ratio) => random_oversample(&all_train, &train_labels, ratio, &mut rng)?,
        None => all_train,
    };
    let x_fit = x_train.select(Axis(0), &fit_idx);
    let y_fit: Vec<u8> = fit_idx.iter().map(|&i| train_labels[i]).collect();

    log::info!(
        "Fitting booster: {} rows × {} features, {} trees, depth {}",
        x_fit.nrows(),
        x_fit.ncols(),
        params.n_estimators,
        params.max_depth
    );
    let classifier = GradientBoostedClassifier::fit(x_fit.view(), &y_fit, &params)?;
    let pipeline = FittedPipeline::new(&schema, transformer, classifier)?;

    let (test_rows, test_labels) = prepared.select(&test_idx);
    let scores = pipeline.predict_proba_batch(&test_rows)?;

    let report = ClassificationReport::new(&test_labels, &scores, 0.5);
    log::info!("Held-out classification report:\n{}", report);

    let threshold = select_threshold(&test_labels, &scores)?;
    log::info!(
        "Best threshold: {:.6} (F1 {:.4}, precision {:.4}, recall {:.4})",
        threshold.threshold,
        threshold.f1,
        threshold.precision,
        threshold.recall
    );

    let summary = EvaluationSummary {
        test_rows: test_labels.len(),
        accuracy: report.accuracy,
        precision: report.positive().precision,
        recall: report.positive().recall,
        f1: report.positive().f1,
        average_precision: average_precision(&test_labels, &scores)?,
        confusion: report.confusion,
    };

    let pipeline_artifact = PipelineArtifact::new(pipeline, Some(summary.clone()))?;
    let threshold_artifact = ThresholdArtifact::for_pipeline(&pipeline_artifact, &threshold);

    let report = TrainingReport {
        artifact_id: pipeline_artifact.artifact_id,
        variant: schema.variant(),
        rows,
        train_rows: train_idx.len(),
        test_rows: test_idx.len(),
        params,
        search,
        report,
        summary,
        threshold,
    };

    Ok(TrainedArtifacts {
        pipeline: pipeline_artifact,
        threshold: threshold_artifact,
        report,
    })
}
