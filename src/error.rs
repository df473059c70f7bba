//! Error types surfaced before or after the coordination core runs.
//!
//! Broken invariants inside the core (loading past capacity, unloading an
//! empty vehicle, replacing an occupied slot) are panics, not variants here.

use std::io;
use std::path::PathBuf;

/// Invalid simulation parameters.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A parameter that must be at least one was zero.
    #[error("parameter `{name}` must be a positive integer")]
    NotPositive {
        /// Parameter name as shown on the command line.
        name: &'static str,
    },
}

/// Failures reading the block map.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// The input file does not exist.
    #[error("file {} does not exist", path.display())]
    NotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// Any other I/O failure while reading the map.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl InputError {
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            InputError::NotFound { path }
        } else {
            InputError::Io { path, source }
        }
    }
}

/// Top-level error returned by the runners.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Input(#[from] InputError),

    /// The event log could not be written after the run.
    #[error("failed to write event log {}: {source}", path.display())]
    LogFlush {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SimError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            SimError::Config(_) => 2,
            SimError::Input(_) | SimError::LogFlush { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinguished_from_other_io() {
        let missing = InputError::from_io("map.txt", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(missing, InputError::NotFound { .. }));
        assert_eq!(missing.to_string(), "file map.txt does not exist");

        let denied = InputError::from_io(
            "map.txt",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(denied, InputError::Io { .. }));
    }

    #[test]
    fn exit_codes_split_usage_from_io() {
        let config = SimError::from(ConfigError::NotPositive { name: "workers" });
        assert_eq!(config.exit_code(), 2);
        let input = SimError::from(InputError::NotFound {
            path: PathBuf::from("x"),
        });
        assert_eq!(input.exit_code(), 1);
    }
}
