use thiserror::Error;

/// Errors produced while fetching or decoding an external resource.
///
/// Network and decode failures are reported separately so they can be logged
/// with enough context, but the reconciler treats every variant the same way:
/// the object stays a placeholder.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("failed to fetch {url}: {reason}")]
    Network { url: String, reason: String },
    #[error("failed to decode {url}: {reason}")]
    Decode { url: String, reason: String },
    #[error("unsupported resource {url}")]
    Unsupported { url: String },
}

impl LoadError {
    pub fn url(&self) -> &str {
        match self {
            Self::Network { url, .. } | Self::Decode { url, .. } | Self::Unsupported { url } => url,
        }
    }
}

/// Errors reported by a media handle operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MediaError {
    #[error("playback rejected: {0}")]
    PlaybackRejected(String),
    #[error("media handle already released")]
    Released,
}

/// Errors that can occur while loading the editor configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid color {value:?} for {field}")]
    Color { field: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_keeps_url() {
        let err = LoadError::Decode {
            url: "https://example.com/a.png".to_owned(),
            reason: "bad header".to_owned(),
        };
        assert_eq!(err.url(), "https://example.com/a.png");
        assert_eq!(
            err.to_string(),
            "failed to decode https://example.com/a.png: bad header"
        );
    }
}
