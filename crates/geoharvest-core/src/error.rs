//! Error taxonomy for single JSON document fetches

/// Error from fetching one JSON document.
///
/// The caller decides whether a failure is fatal: a feed page failure stops the
/// walk, an item failure only skips that item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection refused, DNS failure, timeout, broken body stream
    Transport(String),
    /// Server answered with a non-2xx status
    Remote { status: u16, message: String },
    /// Body was not a JSON object
    Parse(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Remote { status, message } => write!(f, "HTTP {status}: {message}"),
            Self::Parse(msg) => write!(f, "invalid JSON: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    /// Classify a reqwest error. Errors carrying a status become `Remote`.
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::Remote {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
            },
            None if e.is_timeout() => Self::Transport(format!("timed out: {e}")),
            None => Self::Transport(e.to_string()),
        }
    }

    /// HTTP status, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 404/410: the item is gone upstream rather than unreachable.
    pub fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(404 | 410))
    }
}
