use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Failures of the ranked layout pass. These only arise from graphs the
/// constraint builder should never produce.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("layout edge references unknown node index {0}")]
    UnknownNode(usize),

    #[error("rank assignment did not converge for {0} node(s)")]
    UnrankedNodes(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
