//! envlit — reversible environment overlays for interactive shells.
//!
//! envlit applies a declarative YAML *profile* to a shell session and later
//! reverses those changes, surviving manual edits made in between. It never
//! mutates the live environment itself: every command emits shell source on
//! stdout for the calling shell to evaluate, plus a small state-tracking
//! sidecar (`envlit track`) invoked by the emitted program.
//!
//! # How a load works
//!
//! ```sh
//! eval "$(envlit load dev --cuda 1)"
//! ```
//!
//! The emitted program captures a snapshot of the environment (`track
//! begin`), runs pre-load hooks, applies the profile's variable directives
//! and flag bindings, runs post-load hooks, and finally diffs the
//! environment against the snapshot (`track end`), recording per-variable
//! `{original, current}` pairs in a state variable scoped to the working
//! directory. `envlit unload` replays those originals and drops the state.
//!
//! The interesting part is what happens when the user edits a tracked
//! variable *between* loads: the [`state`] module's Compare-and-Swap rule
//! detects the interference and adopts the user's value as the new baseline
//! instead of clobbering it on unload.
//!
//! # Module map
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`ops`] | atomic set/unset/prepend/append/remove pipeline engine |
//! | [`profile`] | YAML profile model, loading, inheritance |
//! | [`state`] | state record and the Compare-and-Swap rule |
//! | [`track`] | the begin/end/restore protocol |
//! | [`script`] | shell program emission and quoting |
//! | [`cli`] | two-pass dynamic-flag command line |

pub mod cli;
pub mod error;
pub mod ops;
pub mod profile;
pub mod script;
pub mod state;
pub mod track;

pub use error::{Error, Result};
pub use ops::Operation;
pub use profile::{Profile, ProfileError, find_profile, load_profile};
pub use state::{SNAPSHOT_VAR, StateStore, state_var_name_for};
