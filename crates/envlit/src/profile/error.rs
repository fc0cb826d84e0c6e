//! Profile error types with rich diagnostics.

use miette::{Diagnostic, NamedSource, SourceSpan};

/// Error type for profile loading and validation.
///
/// Parse and validation errors carry a [`NamedSource`] and [`SourceSpan`]
/// where a location in the profile file could be recovered, so [`miette`]
/// renders the offending snippet:
///
/// ```text
/// Error: invalid profile entry in .envlit/dev.yaml
///    ╭─[.envlit/dev.yaml:4:9]
///    │
///  4 │     op: frobnicate
///    │         ^^^^^^^^^^ unknown operation 'frobnicate'
///    ╰────
///   help: valid operations are: set, unset, prepend, append, remove
/// ```
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum ProfileError {
    /// Profile file not found
    #[error("profile not found: {path}")]
    #[diagnostic(
        code(envlit::profile::not_found),
        help("ensure the file exists at the specified path")
    )]
    NotFound {
        /// Path to the missing file
        path: String,
    },

    /// Failed to read the profile file
    #[error("failed to read profile: {path}")]
    #[diagnostic(
        code(envlit::profile::read_error),
        help("check file permissions and ensure it's readable")
    )]
    Read {
        /// Path to the file
        path: String,

        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error with source location
    #[error("YAML parse error in {path}")]
    #[diagnostic(code(envlit::profile::parse_error))]
    Parse {
        /// Path to the file
        path: String,

        /// The source file content for display
        #[source_code]
        src: NamedSource<String>,

        /// The location of the error
        #[label("{message}")]
        span: SourceSpan,

        /// Description of what went wrong
        message: String,

        /// Suggestion for how to fix
        #[help]
        help: String,
    },

    /// YAML parse error without source location (fallback)
    #[error("YAML parse error in {path}: {message}")]
    #[diagnostic(
        code(envlit::profile::parse_error),
        help("check indentation and ensure proper YAML syntax")
    )]
    ParseNoSpan {
        /// Path to the file
        path: String,

        /// Error message
        message: String,
    },

    /// The profile's top level is not a mapping
    #[error("profile root must be a mapping: {path}")]
    #[diagnostic(
        code(envlit::profile::not_a_mapping),
        help("a profile is a mapping with optional extends/env/flags/hooks keys")
    )]
    NotMapping {
        /// Path to the file
        path: String,
    },

    /// A semantic validation error with source location
    #[error("invalid profile entry in {path}")]
    #[diagnostic(code(envlit::profile::invalid))]
    Invalid {
        /// Path to the file
        path: String,

        /// The source file content for display
        #[source_code]
        src: NamedSource<String>,

        /// The location of the error
        #[label("{message}")]
        span: SourceSpan,

        /// Description of what went wrong
        message: String,

        /// Suggestion for how to fix
        #[help]
        help: String,
    },

    /// A semantic validation error without source location (fallback)
    #[error("invalid profile entry in {path}: {message}")]
    #[diagnostic(code(envlit::profile::invalid))]
    InvalidNoSpan {
        /// Path to the file
        path: String,

        /// Description of what went wrong
        message: String,

        /// Suggestion for how to fix
        #[help]
        help: String,
    },

    /// An `extends` chain revisits a profile
    #[error("profile inheritance cycle: {chain}")]
    #[diagnostic(
        code(envlit::profile::cycle),
        help("break the extends chain; a profile may not extend itself transitively")
    )]
    Cycle {
        /// The chain of profile paths, ending at the revisited one
        chain: String,
    },
}

impl ProfileError {
    /// The profile path an error refers to, when one is attached.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::NotFound { path }
            | Self::Read { path, .. }
            | Self::Parse { path, .. }
            | Self::ParseNoSpan { path, .. }
            | Self::NotMapping { path }
            | Self::Invalid { path, .. }
            | Self::InvalidNoSpan { path, .. } => Some(path),
            Self::Cycle { .. } => None,
        }
    }
}
