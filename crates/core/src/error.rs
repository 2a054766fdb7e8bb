use thiserror::Error;

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Which remote script load a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStage {
    TagManager,
    Analytics,
}

impl std::fmt::Display for ScriptStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptStage::TagManager => write!(f, "tag-manager"),
            ScriptStage::Analytics => write!(f, "analytics"),
        }
    }
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not load {stage} script: {reason}")]
    ScriptLoad { stage: ScriptStage, reason: String },

    #[error("Script evaluation error: {0}")]
    Eval(#[source] anyhow::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
