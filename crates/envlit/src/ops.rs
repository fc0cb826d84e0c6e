//! Atomic environment variable operations.
//!
//! An [`Operation`] maps a variable's current value to a new value; a
//! pipeline of operations threads the output of each step into the next.
//! Values are `Option<String>` throughout: `None` is the distinguished
//! "unset" state and is not the same thing as the empty string.
//!
//! Validation (unknown tags, missing `value` fields) happens in the profile
//! loader; by the time an `Operation` exists it is well-formed.

/// Default separator for `prepend`/`append`/`remove`, regardless of platform.
pub const DEFAULT_SEPARATOR: &str = ":";

/// A single atomic mutation of one variable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Operation {
    /// Replace the value outright. The prior value is ignored.
    Set {
        /// The replacement value.
        value: String,
    },

    /// Remove the variable. The prior value is ignored.
    Unset,

    /// Add a component in front of the current value.
    Prepend {
        /// The component to add.
        value: String,
        /// Separator between the component and the current value.
        separator: String,
    },

    /// Add a component after the current value.
    Append {
        /// The component to add.
        value: String,
        /// Separator between the current value and the component.
        separator: String,
    },

    /// Drop every component equal to `value` from the current value.
    Remove {
        /// The component to drop.
        value: String,
        /// Separator the current value is split on.
        separator: String,
    },
}

impl Operation {
    /// Whether this operation's result depends on the variable's prior value.
    #[must_use]
    pub const fn reads_current(&self) -> bool {
        matches!(
            self,
            Self::Prepend { .. } | Self::Append { .. } | Self::Remove { .. }
        )
    }
}

/// Applies a single operation to a current value.
///
/// `None` means the variable is unset, both on input and output.
#[must_use]
pub fn apply(current: Option<&str>, op: &Operation) -> Option<String> {
    match op {
        Operation::Set { value } => Some(value.clone()),

        Operation::Unset => None,

        Operation::Prepend { value, separator } => match current {
            None | Some("") => Some(value.clone()),
            Some(cur) => Some(format!("{value}{separator}{cur}")),
        },

        Operation::Append { value, separator } => match current {
            None | Some("") => Some(value.clone()),
            Some(cur) => Some(format!("{cur}{separator}{value}")),
        },

        Operation::Remove { value, separator } => {
            let cur = match current {
                None | Some("") => return None,
                Some(c) => c,
            };

            // Empty components (doubled separators) are discarded alongside
            // the removed value; all occurrences go, not just the first.
            let parts: Vec<&str> = cur
                .split(separator.as_str())
                .filter(|p| !p.is_empty() && *p != value.as_str())
                .collect();

            if parts.is_empty() {
                None
            } else {
                Some(parts.join(separator.as_str()))
            }
        }
    }
}

/// Applies a pipeline of operations sequentially.
#[must_use]
pub fn apply_all(initial: Option<&str>, ops: &[Operation]) -> Option<String> {
    let mut current = initial.map(str::to_owned);

    for op in ops {
        current = apply(current.as_deref(), op);
    }

    current
}
