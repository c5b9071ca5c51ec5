// THEORY:
// Errors in this crate never escape a pipeline for normal-path conditions. An
// `AssetError` describes why a single candidate could not be evaluated and is folded
// into a disqualification reason by the evaluator that produced it. `ConfigError` is
// the only error a caller sees, and only when a hand-built configuration is invalid.

use std::time::Duration;

pub type AssetResult<T> = Result<T, AssetError>;
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Candidate-local failure while fetching, decoding or re-encoding an asset.
#[derive(thiserror::Error, Debug)]
pub enum AssetError {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("upstream returned status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("response exceeded {limit} bytes")]
    TooLarge { limit: usize },

    #[error("unsupported image format: {0}")]
    Unsupported(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("analysis task failed: {0}")]
    Task(String),
}

impl AssetError {
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

impl From<reqwest::Error> for AssetError {
    fn from(err: reqwest::Error) -> Self {
        AssetError::Fetch(err.to_string())
    }
}

impl From<image::ImageError> for AssetError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Unsupported(inner) => AssetError::Unsupported(inner.to_string()),
            image::ImageError::Encoding(inner) => AssetError::Encode(inner.to_string()),
            other => AssetError::Decode(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for AssetError {
    fn from(err: tokio::task::JoinError) -> Self {
        AssetError::Task(err.to_string())
    }
}

/// Programmer error in a hand-built or loaded `EngineConfig`.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("weights for {pipeline} sum to {sum}, expected 1.0")]
    WeightSum { pipeline: &'static str, sum: f64 },

    #[error("invalid threshold {name}: {reason}")]
    Threshold { name: &'static str, reason: String },

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn threshold(name: &'static str, reason: impl Into<String>) -> Self {
        Self::Threshold {
            name,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(AssetError::fetch("x").to_string().contains("fetch failed:"));
        assert!(AssetError::decode("x").to_string().contains("decode failed:"));
        assert!(AssetError::encode("x").to_string().contains("encode failed:"));
        assert!(
            ConfigError::threshold("pass_threshold", "must be within 0..=100")
                .to_string()
                .contains("invalid threshold pass_threshold")
        );
    }

    #[test]
    fn timeout_mentions_duration() {
        let err = AssetError::Timeout(Duration::from_secs(4));
        assert_eq!(err.to_string(), "fetch timed out after 4s");
    }

    #[test]
    fn unsupported_image_errors_keep_their_class() {
        let bytes = b"definitely not an image";
        let err: AssetError = image::load_from_memory(bytes).unwrap_err().into();
        assert!(matches!(err, AssetError::Unsupported(_) | AssetError::Decode(_)));
    }
}
