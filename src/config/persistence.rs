//! Model artifact persistence configuration

/// Where the trained model artifact lives
pub struct ArtifactPersistenceConfig {
    /// Directory holding model artifacts
    pub directory: &'static str,
    /// Artifact filename (JSON)
    pub filename: &'static str,
    /// Current version of the artifact format
    pub version: u32,
}

pub const PERSISTENCE: ArtifactPersistenceConfig = ArtifactPersistenceConfig {
    directory: "models",
    filename: "model.json",
    version: 1,
};

/// Default artifact path, e.g. "models/model.json"
pub fn default_artifact_path() -> String {
    format!("{}/{}", PERSISTENCE.directory, PERSISTENCE.filename)
}
