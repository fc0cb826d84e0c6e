//! Overlay state tracking.
//!
//! All overlay state rides in environment variables of the calling shell;
//! nothing is persisted to disk. Two variables are involved:
//!
//! - [`SNAPSHOT_VAR`] holds a transient JSON image of the environment,
//!   written by `track begin` and read back by `track end`.
//! - The *state variable* holds the JSON state record mapping each tracked
//!   variable to its pristine `original` and its last overlay `current`.
//!   Its name carries a hash of the working directory, so overlays in two
//!   projects never collide.
//!
//! # The Compare-and-Swap rule
//!
//! [`StateStore::update`] decides, per variable, how a new overlay interacts
//! with whatever is in the environment right now:
//!
//! 1. **New variable** — first observation; the observed value *is* the
//!    user's pristine value.
//! 2. **Consecutive load** — the observed value matches the last overlay's
//!    `current`; the original baseline is kept.
//! 3. **Manual interference** — the user changed the variable since the last
//!    load; their value becomes the new baseline, because there is no signal
//!    separating "I changed it and want it kept" from "the previous load set
//!    it this way", and adopting the user's value is the less surprising
//!    policy.
//!
//! Equality is string equality with the null sentinel distinct from every
//! string: a variable that *was unset* and one that *was empty* restore
//! differently.

use std::path::Path;

use indexmap::IndexMap;
use indexmap::map::Entry;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Environment variable holding the transient begin-phase snapshot.
pub const SNAPSHOT_VAR: &str = "__ENVLIT_SNAPSHOT_A";

/// Prefix of the per-directory state variable.
pub const STATE_VAR_PREFIX: &str = "__ENVLIT_STATE_";

/// Returns the state variable name for a given working directory.
///
/// The suffix is the first eight hex characters of the MD5 digest of the
/// directory path, e.g. `__ENVLIT_STATE_a1b2c3d4`.
#[must_use]
pub fn state_var_name_for(dir: &Path) -> String {
    let digest = Md5::digest(dir.as_os_str().as_encoded_bytes());
    let hash = hex::encode(digest);
    format!("{STATE_VAR_PREFIX}{}", &hash[..8])
}

/// Returns the state variable name for the current working directory.
pub fn state_var_name() -> std::io::Result<String> {
    Ok(state_var_name_for(&std::env::current_dir()?))
}

/// One tracked variable's record: its pristine value and the value the last
/// overlay wrote. `None` is the "unset" sentinel on both sides.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Slot {
    /// The value to restore on unload.
    pub original: Option<String>,

    /// The value the last load left behind.
    pub current: Option<String>,
}

/// In-memory view over the JSON state record.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StateStore {
    entries: IndexMap<String, Slot>,
}

impl StateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a serialized state record.
    ///
    /// Malformed input yields an empty store: the tracker must never fail
    /// the shell over a corrupted state variable.
    #[must_use]
    pub fn parse(serialized: &str) -> Self {
        let entries = serde_json::from_str(serialized).unwrap_or_default();
        Self { entries }
    }

    /// Applies the Compare-and-Swap rule for one variable.
    ///
    /// `actual` is the value observed in the environment before this load's
    /// mutations (Snapshot A); `target` is the value this load wrote.
    pub fn update(&mut self, name: &str, actual: Option<&str>, target: Option<&str>) {
        let target = target.map(str::to_owned);

        match self.entries.entry(name.to_string()) {
            // Case 1: new variable. What we observed before mutating is the
            // user's pristine value, by definition.
            Entry::Vacant(entry) => {
                tracing::debug!(name, "tracking new variable");
                entry.insert(Slot {
                    original: actual.map(str::to_owned),
                    current: target,
                });
            }

            Entry::Occupied(mut entry) => {
                let slot = entry.get_mut();

                if slot.current.as_deref() == actual {
                    // Case 2: consecutive load. The environment is exactly
                    // where the previous load left it; keep the original
                    // baseline.
                    tracing::debug!(name, "consecutive load, keeping original");
                    slot.current = target;
                } else {
                    // Case 3: manual interference. The user touched the
                    // variable between loads; adopt their value as the new
                    // baseline rather than restoring over a deliberate
                    // change.
                    tracing::debug!(name, "manual change detected, adopting new baseline");
                    slot.original = actual.map(str::to_owned);
                    slot.current = target;
                }
            }
        }
    }

    /// Looks up a tracked variable's record.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.entries.get(name)
    }

    /// The `original` side of a tracked variable; outer `None` if untracked.
    #[must_use]
    pub fn original(&self, name: &str) -> Option<Option<&str>> {
        self.entries.get(name).map(|s| s.original.as_deref())
    }

    /// The `current` side of a tracked variable; outer `None` if untracked.
    #[must_use]
    pub fn current(&self, name: &str) -> Option<Option<&str>> {
        self.entries.get(name).map(|s| s.current.as_deref())
    }

    /// Names of all tracked variables, in record order.
    pub fn tracked_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates tracked variables with their records, in record order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Slot)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether the store tracks no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of tracked variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Serializes the record as a single JSON object.
    #[must_use]
    pub fn serialize(&self) -> String {
        serde_json::to_string(&self.entries).expect("a string-keyed state record serializes")
    }
}
