//! Profile file loading and inheritance resolution.
//!
//! A profile is parsed from YAML into a [`serde_json::Value`] tree (document
//! key order preserved) and then normalised into a typed [`Profile`]. When
//! the document carries an `extends` key, the parent is loaded recursively —
//! relative paths resolve against the *child's* directory — and merged
//! underneath the child. A visited set of canonicalised paths makes cyclic
//! `extends` chains fail fast instead of recursing forever.

use std::path::{Path, PathBuf};

use miette::{NamedSource, SourceSpan};
use serde_json::Value;

use super::error::ProfileError;
use super::{Profile, merge};

/// A profile file's identity and content, kept for error reporting.
pub(crate) struct Origin {
    pub path: String,
    pub content: String,
}

impl Origin {
    pub(crate) fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.path.clone(), self.content.clone())
    }

    /// Builds a validation error, attaching a span when the named key can be
    /// located in the document.
    pub(crate) fn invalid(
        &self,
        key: Option<&str>,
        message: impl Into<String>,
        help: impl Into<String>,
    ) -> ProfileError {
        let message = message.into();
        let help = help.into();

        match key.and_then(|k| key_value_span(&self.content, k)) {
            Some(span) => ProfileError::Invalid {
                path: self.path.clone(),
                src: self.named_source(),
                span,
                message,
                help,
            },
            None => ProfileError::InvalidNoSpan {
                path: self.path.clone(),
                message,
                help,
            },
        }
    }
}

/// Loads, normalises, and inheritance-resolves a profile.
pub fn load_profile(path: &Path) -> Result<Profile, ProfileError> {
    let mut visited = Vec::new();
    load_recursive(path, &mut visited)
}

fn load_recursive(path: &Path, visited: &mut Vec<PathBuf>) -> Result<Profile, ProfileError> {
    let display = path.display().to_string();

    if !path.is_file() {
        return Err(ProfileError::NotFound { path: display });
    }

    let canonical = path.canonicalize().map_err(|source| ProfileError::Read {
        path: display.clone(),
        source,
    })?;

    if visited.contains(&canonical) {
        let chain = visited
            .iter()
            .chain(std::iter::once(&canonical))
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        return Err(ProfileError::Cycle { chain });
    }
    visited.push(canonical);

    let content = std::fs::read_to_string(path).map_err(|source| ProfileError::Read {
        path: display.clone(),
        source,
    })?;

    let value = parse_yaml(&content, &display)?;
    let origin = Origin {
        path: display,
        content,
    };

    let (profile, extends) = Profile::from_value(value, &origin)?;

    let Some(parent_ref) = extends else {
        return Ok(profile);
    };

    tracing::debug!(child = %origin.path, parent = %parent_ref, "resolving profile inheritance");

    let parent_path = if Path::new(&parent_ref).is_absolute() {
        PathBuf::from(parent_ref)
    } else {
        path.parent().unwrap_or(Path::new(".")).join(parent_ref)
    };

    let parent = load_recursive(&parent_path, visited)?;
    Ok(merge(parent, profile))
}

/// Parses profile YAML; an empty (or comments-only) document is `Null`.
fn parse_yaml(content: &str, path: &str) -> Result<Value, ProfileError> {
    let blank = content.lines().all(|line| {
        let trimmed = line.trim();
        trimmed.is_empty() || trimmed.starts_with('#')
    });
    if blank {
        return Ok(Value::Null);
    }

    serde_saphyr::from_str(content).map_err(|e| yaml_error(&e, content, path))
}

fn yaml_error(e: &serde_saphyr::Error, content: &str, path: &str) -> ProfileError {
    let message = e.to_string();

    if let Some((line, col)) = extract_yaml_location(&message) {
        let offset = line_col_to_offset(content, line, col);

        ProfileError::Parse {
            path: path.to_string(),
            src: NamedSource::new(path.to_string(), content.to_string()),
            span: offset_to_span(offset, content),
            message,
            help: "check indentation and ensure proper YAML syntax".to_string(),
        }
    } else {
        ProfileError::ParseNoSpan {
            path: path.to_string(),
            message,
        }
    }
}

/// Try to extract line/column from a YAML error message.
fn extract_yaml_location(msg: &str) -> Option<(usize, usize)> {
    let line_idx = msg.find("line ")?;
    let after_line = &msg[(line_idx + 5)..];
    let line_end = after_line.find(|c: char| !c.is_ascii_digit())?;
    let line = after_line[..line_end].parse::<usize>().ok()?;

    let col_idx = after_line.find("column ")?;
    let after_col = &after_line[(col_idx) + 7..];
    let col_end = after_col
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(after_col.len());
    let col = after_col[..col_end].parse::<usize>().ok()?;

    Some((line, col))
}

/// Convert line/column (1-indexed) to byte offset.
fn line_col_to_offset(content: &str, line: usize, col: usize) -> usize {
    let mut offset = 0;

    for (i, l) in content.lines().enumerate() {
        if (i + 1) == line {
            return offset + col.saturating_sub(1);
        }

        offset += l.len() + 1;
    }

    offset
}

/// Converts a byte offset to a [`SourceSpan`] with a reasonable length.
fn offset_to_span(offset: usize, content: &str) -> SourceSpan {
    let remaining = &content[offset.min(content.len())..];
    let len = remaining
        .find(|c: char| c.is_whitespace() || (c == ',') || (c == '}') || (c == ']'))
        .unwrap_or(remaining.len().min(20))
        .max(1);

    SourceSpan::new(offset.into(), len)
}

/// Finds the span of the value following `key:` in the document, for
/// pointing validation errors at the offending entry.
fn key_value_span(content: &str, key: &str) -> Option<SourceSpan> {
    for pattern in [format!("{key}:"), format!("{key} :"), format!("\"{key}\":")] {
        if let Some(pos) = content.find(pattern.as_str()) {
            let after = pos + pattern.len();
            let remaining = &content[after..];

            if let Some(value_start) = remaining.find(|c: char| !c.is_whitespace()) {
                return Some(offset_to_span(after + value_start, content));
            }

            // Key with nothing after it: point at the key itself.
            return Some(offset_to_span(pos, content));
        }
    }

    None
}
