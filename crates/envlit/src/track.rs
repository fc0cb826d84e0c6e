//! The three-phase overlay protocol.
//!
//! Each phase is a separate process execution, invoked by the emitted shell
//! program as `envlit track <phase>`; every function here is pure over an
//! explicit environment image so the protocol can be tested without touching
//! the real process environment.
//!
//! - [`begin`] prints a JSON snapshot of the environment; the shell captures
//!   it into [`SNAPSHOT_VAR`].
//! - [`end`] diffs that snapshot against the now-current environment, runs
//!   every changed name through the state store's Compare-and-Swap rule, and
//!   prints one `export` of the state variable.
//! - [`restore`] prints `export`/`unset` lines returning every tracked
//!   variable to its original, then unsets the state variable.
//!
//! Recovery, not failure: a malformed snapshot is an empty snapshot, and a
//! missing state variable restores to a single comment line. The shell
//! evaluating our output must never break over tracker-internal problems.

use std::collections::{BTreeMap, BTreeSet};

use crate::script::quote::single_quoted;
use crate::state::{SNAPSHOT_VAR, StateStore, state_var_name};

/// A point-in-time image of the ambient environment.
pub type EnvMap = BTreeMap<String, String>;

/// Captures the real process environment.
///
/// Entries with non-unicode names or values are skipped: the tracker is
/// recoverable by contract and a lossy snapshot beats a failed load.
#[must_use]
pub fn process_env() -> EnvMap {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

/// Phase `begin`: encode the environment as JSON for the shell to capture.
#[must_use]
pub fn begin(env: &EnvMap) -> String {
    serde_json::to_string(env).expect("a string map serializes")
}

/// Phase `end`: diff Snapshot A against the current environment and print
/// the updated state record as a single `export` statement.
#[must_use]
pub fn end(env: &EnvMap, state_var: &str) -> String {
    // Snapshot A; absent or malformed degrades to empty.
    let snapshot_a: EnvMap = env
        .get(SNAPSHOT_VAR)
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_default();

    // Snapshot B is the ambient environment itself.
    let mut store = StateStore::parse(env.get(state_var).map_or("{}", String::as_str));

    let mut names: BTreeSet<&str> = snapshot_a.keys().map(String::as_str).collect();
    names.extend(env.keys().map(String::as_str));
    names.remove(SNAPSHOT_VAR);

    for name in names {
        let before = snapshot_a.get(name).map(String::as_str);
        let after = env.get(name).map(String::as_str);

        if before != after {
            store.update(name, before, after);
        }
    }

    format!("export {}={}", state_var, single_quoted(&store.serialize()))
}

/// Phase `restore`: print statements returning every tracked variable to its
/// original value, then drop the state variable.
#[must_use]
pub fn restore(env: &EnvMap, state_var: &str) -> String {
    let Some(raw) = env.get(state_var) else {
        return String::from("# No envlit state found to restore");
    };

    let store = StateStore::parse(raw);
    if store.is_empty() {
        return format!("unset {state_var}");
    }

    let mut lines = vec![String::from("# Restoring environment to original state")];

    for (name, slot) in store.iter() {
        match &slot.original {
            Some(value) => lines.push(format!("export {}={}", name, single_quoted(value))),
            None => lines.push(format!("unset {name}")),
        }
    }

    lines.push(format!("unset {state_var}"));
    lines.join("\n")
}

/// One of the three protocol entry points.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// Snapshot the environment.
    Begin,
    /// Diff against the snapshot and update the state record.
    End,
    /// Emit restoration statements.
    Restore,
}

impl Phase {
    /// Parses a phase name as it appears on the command line.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "begin" => Some(Self::Begin),
            "end" => Some(Self::End),
            "restore" => Some(Self::Restore),
            _ => None,
        }
    }
}

/// Runs one protocol phase against the real process environment.
pub fn run_phase(phase: Phase) -> std::io::Result<String> {
    let env = process_env();

    match phase {
        Phase::Begin => Ok(begin(&env)),
        Phase::End => Ok(end(&env, &state_var_name()?)),
        Phase::Restore => Ok(restore(&env, &state_var_name()?)),
    }
}
