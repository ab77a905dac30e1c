use std::path::PathBuf;

use lgl_core::CoreError;

use crate::api::RpcError;
use crate::supervisor::SupervisorError;

/// Everything a layout request or pool startup can fail with.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// The graph is missing, malformed, or references nodes that do not exist.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A worker never became ready; the pool was not started.
    #[error("Worker pool failed to start: {0}")]
    StartupFailure(#[from] SupervisorError),

    /// A scratch file could not be written, read, or removed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The worker call failed; carries the worker's own error body when it
    /// answered with a non-200 status.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// The worker's output could not be mapped back onto the graph.
    #[error("Merge error: {0}")]
    Merge(String),
}

impl LayoutError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<CoreError> for LayoutError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(msg) => Self::InvalidInput(msg),
            CoreError::Merge(msg) => Self::Merge(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn core_errors_keep_their_kind() {
        assert_matches!(
            LayoutError::from(CoreError::InvalidInput("no nodes".into())),
            LayoutError::InvalidInput(msg) if msg == "no nodes"
        );
        assert_matches!(
            LayoutError::from(CoreError::Merge("bad ref".into())),
            LayoutError::Merge(msg) if msg == "bad ref"
        );
    }

    #[test]
    fn rpc_status_error_displays_worker_body() {
        let err = LayoutError::from(RpcError::Status {
            status: 500,
            body: "layout engine crashed".into(),
        });
        assert_eq!(
            err.to_string(),
            "Worker returned HTTP 500: layout engine crashed"
        );
    }

    #[test]
    fn io_error_names_the_path() {
        let err = LayoutError::io(
            "/tmp/x.net",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "I/O error on /tmp/x.net: denied");
    }
}
