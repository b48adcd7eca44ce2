/// Errors from building or loading scenes.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("invalid scene config: {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("unknown preset: {0}")]
    UnknownPreset(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SceneError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
