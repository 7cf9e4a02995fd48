use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by parsing and by the math primitives. An evaluator
/// rejecting a conformation against its energy bound is a control signal,
/// not an error, and never appears here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}:{}: {}", .path.display(), .line, .reason)]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("domain error: {0}")]
    Domain(String),
}

impl Error {
    pub fn parse(path: &std::path::Path, line: usize, reason: impl Into<String>) -> Self {
        Error::Parse {
            path: path.to_path_buf(),
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn parse_error_carries_path_and_line() {
        let e = Error::parse(Path::new("receptor.pdbqt"), 42, "unknown AutoDock type XX");
        let msg = e.to_string();
        assert!(msg.contains("receptor.pdbqt"));
        assert!(msg.contains("42"));
        assert!(msg.contains("XX"));
    }
}
