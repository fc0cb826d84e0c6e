//! Top-level error type.
//!
//! Fatal errors exit the tool non-zero with a diagnostic on stderr and *no
//! bytes on stdout*, so a shell function sourcing our output sources
//! nothing. Tracker-internal recoveries (malformed snapshot, absent state)
//! never surface here; they degrade silently inside [`crate::track`].

use miette::Diagnostic;

use crate::profile::ProfileError;

/// Errors that abort an invocation.
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum Error {
    /// A profile failed to load or validate.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Profile(#[from] ProfileError),

    /// No profile file could be discovered.
    #[error("no profile found: expected .envlit/{name}.yaml or .envlit/{name}.yml")]
    #[diagnostic(
        code(envlit::no_profile),
        help("create a profile under .envlit/ or pass --config <path>")
    )]
    NoProfile {
        /// The profile base name that was looked for.
        name: String,
    },

    /// The working directory could not be resolved.
    #[error("failed to resolve the working directory")]
    #[diagnostic(
        code(envlit::working_dir),
        help("the current directory may have been removed")
    )]
    WorkingDir {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
