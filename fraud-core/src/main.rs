//! fraud-train - offline training entry point
//!
//! Configured through `FRAUD_*` environment variables (optionally from `.env`).

use anyhow::Context;

use fraud_core::config::TrainConfig;
use fraud_core::training;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = TrainConfig::from_env().context("invalid training configuration")?;

    log::info!(
        "Training {} model from {}",
        config.variant,
        config.dataset_path.display()
    );
    log::debug!("Config: {:?}", config);

    let report = training::run(&config)
        .with_context(|| format!("training on {} failed", config.dataset_path.display()))?;

    log::info!("📊 Model Performance (held-out, threshold 0.5):");
    log::info!("Accuracy : {:.4}", report.summary.accuracy);
    log::info!("Precision: {:.4}", report.summary.precision);
    log::info!("Recall   : {:.4}", report.summary.recall);
    log::info!("F1 Score : {:.4}", report.summary.f1);
    log::info!("Avg precision: {:.4}", report.summary.average_precision);
    log::info!(
        "Artifact {} written to {} (threshold {:.6})",
        report.artifact_id,
        config.output_dir.display(),
        report.threshold.threshold
    );

    Ok(())
}
