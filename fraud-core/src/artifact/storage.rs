use std::fs;
use std::path::Path;

use super::types::{
    pipeline_checksum, PipelineArtifact, ThresholdArtifact, FORMAT_VERSION, PIPELINE_FILE,
    THRESHOLD_FILE,
};
use crate::error::{CoreError, CoreResult};

fn write_json<T: serde::Serialize>(value: &T, path: &Path) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

fn check_format(version: u32) -> CoreResult<()> {
    if version != FORMAT_VERSION {
        return Err(CoreError::UnsupportedFormat(version));
    }
    Ok(())
}

pub fn save_pipeline(artifact: &PipelineArtifact, path: &Path) -> CoreResult<()> {
    write_json(artifact, path)
}

pub fn save_threshold(artifact: &ThresholdArtifact, path: &Path) -> CoreResult<()> {
    write_json(artifact, path)
}

/// Write both files into `dir` (created when needed)
pub fn save_pair(
    pipeline: &PipelineArtifact,
    threshold: &ThresholdArtifact,
    dir: &Path,
) -> CoreResult<()> {
    fs::create_dir_all(dir)?;
    save_pipeline(pipeline, &dir.join(PIPELINE_FILE))?;
    save_threshold(threshold, &dir.join(THRESHOLD_FILE))?;
    log::info!(
        "Saved artifact {} to {}",
        pipeline.artifact_id,
        dir.display()
    );
    Ok(())
}

/// Load a pipeline and verify format, checksum and schema layout
pub fn load_pipeline(path: &Path) -> CoreResult<PipelineArtifact> {
    let data = fs::read(path)?;
    let artifact: PipelineArtifact = serde_json::from_slice(&data)?;
    check_format(artifact.format_version)?;

    let actual = pipeline_checksum(&artifact.pipeline)?;
    if actual != artifact.checksum {
        return Err(CoreError::ChecksumMismatch {
            expected: artifact.checksum.clone(),
            actual,
        });
    }

    // envelope and embedded stamp must agree, and both must match the compiled schema
    let inner = artifact.pipeline.layout();
    if *inner != artifact.layout {
        return Err(CoreError::SchemaMismatch {
            expected_version: artifact.layout.version,
            expected_hash: artifact.layout.hash,
            actual_version: inner.version,
            actual_hash: inner.hash,
        });
    }
    artifact.layout.resolve()?;

    Ok(artifact)
}

pub fn load_threshold(path: &Path) -> CoreResult<ThresholdArtifact> {
    let data = fs::read(path)?;
    let artifact: ThresholdArtifact = serde_json::from_slice(&data)?;
    check_format(artifact.format_version)?;

    if !(0.0..=1.0).contains(&artifact.threshold) {
        return Err(CoreError::InvalidConfig(format!(
            "threshold {} outside [0, 1]",
            artifact.threshold
        )));
    }
    Ok(artifact)
}

/// Load both files and check that they were written by the same run
pub fn load_pair(
    pipeline_path: &Path,
    threshold_path: &Path,
) -> CoreResult<(PipelineArtifact, ThresholdArtifact)> {
    let pipeline = load_pipeline(pipeline_path)?;
    let threshold = load_threshold(threshold_path)?;

    if pipeline.artifact_id != threshold.artifact_id {
        return Err(CoreError::ArtifactPairMismatch {
            pipeline_artifact: pipeline.artifact_id,
            threshold_artifact: threshold.artifact_id,
        });
    }
    Ok((pipeline, threshold))
}
