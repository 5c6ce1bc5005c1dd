use {
    crate::config::{DF, PERSISTENCE},
    crate::models::{ArtifactFile, ModelArtifact},
    anyhow::{Context, Result, bail},
    std::fs::File,
    std::io::{BufReader, BufWriter},
    std::path::Path,
};

pub fn save_artifact(path: impl AsRef<Path>, artifact: &ArtifactFile) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating artifact directory {}", dir.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, artifact)?;
    Ok(())
}

pub fn read_artifact_file(path: impl AsRef<Path>) -> Result<ArtifactFile> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = BufReader::new(file);
    let artifact: ArtifactFile = serde_json::from_reader(reader)
        .with_context(|| format!("parsing {}", path.display()))?;

    if artifact.version > PERSISTENCE.version {
        bail!(
            "artifact version {} is newer than supported version {}",
            artifact.version,
            PERSISTENCE.version
        );
    }
    Ok(artifact)
}

/// Reads a model artifact from disk. Schema validation happens when the engine is built.
pub fn load_artifact(path: impl AsRef<Path>) -> Result<ModelArtifact> {
    let path = path.as_ref();
    let file = read_artifact_file(path)?;
    if DF.log_artifact {
        log::info!(
            "Loaded artifact {} (v{}, {} features)",
            path.display(),
            file.version,
            file.feature_schema.len()
        );
    }
    Ok(file.into_artifact())
}
