//! Shell script emission.
//!
//! The emitters translate a resolved [`Profile`] plus the user's flag
//! bindings into one shell program, returned as a single string. The tool
//! never runs these programs; the interactive shell evaluates them, which is
//! why every mutation is bracketed by `track` invocations that let the next
//! invocation see what actually happened.
//!
//! A load script has this shape:
//!
//! ```sh
//! # envlit: apply environment overlay
//! export __ENVLIT_SNAPSHOT_A="$(envlit track begin)"
//!
//! # hook: Check VPN
//! echo 'Checking VPN...'
//!
//! export CUDA_VISIBLE_DEVICES="0"
//!
//! export PROJECT_MODE="Debug"
//! export PATH="/opt/bin${PATH:+:${PATH}}"
//!
//! # hook: Notify
//! echo 'Environment loaded!'
//!
//! eval "$(envlit track end)"
//! ```
//!
//! Pipelines whose result depends on the shell's live value (prepend,
//! append, remove ahead of any `set`/`unset`) emit shell code that reads the
//! variable at evaluation time, so they compose with whatever the shell
//! holds — including values set by earlier lines of the same script.

pub mod quote;

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::ops::{self, Operation};
use crate::profile::{Hook, Profile};
use crate::state::SNAPSHOT_VAR;
use quote::{double_quoted, escape_double_quoted};

/// Name the emitted scripts invoke the tool by.
const TOOL: &str = "envlit";

/// Emits the load script for a profile and the user's flag bindings.
///
/// `flag_values` maps *flag names* (not targets) to the values supplied on
/// the command line; flags the user did not supply must be absent. A
/// supplied flag suppresses any `env` entry for the same target variable.
#[must_use]
pub fn load_script(profile: &Profile, flag_values: &IndexMap<String, String>) -> String {
    let mut segments: Vec<Vec<String>> = Vec::new();

    segments.push(vec![
        String::from("# envlit: apply environment overlay"),
        format!("export {SNAPSHOT_VAR}=\"$({TOOL} track begin)\""),
    ]);

    for hook in &profile.hooks.pre_load {
        segments.push(hook_segment(hook));
    }

    let mut bound: HashSet<&str> = HashSet::new();
    let mut flag_lines = Vec::new();

    for (name, spec) in &profile.flags {
        let Some(supplied) = flag_values.get(name) else {
            continue;
        };

        let value = spec
            .map
            .get(supplied)
            .cloned()
            .unwrap_or_else(|| supplied.clone());

        flag_lines.push(format!("export {}={}", spec.target, double_quoted(&value)));
        bound.insert(spec.target.as_str());
    }

    if !flag_lines.is_empty() {
        segments.push(flag_lines);
    }

    let mut env_lines = Vec::new();

    for (name, pipeline) in &profile.env {
        // Flag precedence: a supplied flag owns this variable for this load.
        if bound.contains(name.as_str()) {
            continue;
        }
        emit_env_entry(&mut env_lines, name, pipeline);
    }

    if !env_lines.is_empty() {
        segments.push(env_lines);
    }

    for hook in &profile.hooks.post_load {
        segments.push(hook_segment(hook));
    }

    segments.push(vec![format!("eval \"$({TOOL} track end)\"")]);

    join_segments(&segments)
}

/// Emits the unload script for a profile.
#[must_use]
pub fn unload_script(profile: &Profile) -> String {
    let mut segments: Vec<Vec<String>> =
        vec![vec![String::from("# envlit: remove environment overlay")]];

    for hook in &profile.hooks.pre_unload {
        segments.push(hook_segment(hook));
    }

    segments.push(vec![format!("eval \"$({TOOL} track restore)\"")]);

    for hook in &profile.hooks.post_unload {
        segments.push(hook_segment(hook));
    }

    join_segments(&segments)
}

fn join_segments(segments: &[Vec<String>]) -> String {
    segments
        .iter()
        .map(|lines| lines.join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn hook_segment(hook: &Hook) -> Vec<String> {
    vec![format!("# hook: {}", hook.name), hook.script.clone()]
}

/// Emits the statements for one `env` entry.
///
/// Ops at or after the pipeline's last `set`/`unset` never read the shell's
/// value, so that suffix folds to a single static statement; a pipeline with
/// no such anchor is emitted as dynamic shell code, one statement per op.
fn emit_env_entry(lines: &mut Vec<String>, name: &str, pipeline: &[Operation]) {
    if pipeline.is_empty() {
        return;
    }

    match pipeline.iter().rposition(|op| !op.reads_current()) {
        Some(anchor) => match ops::apply_all(None, &pipeline[anchor..]) {
            Some(value) => lines.push(format!("export {name}={}", double_quoted(&value))),
            None => lines.push(format!("unset {name}")),
        },

        None => {
            for op in pipeline {
                emit_dynamic(lines, name, op);
            }
        }
    }
}

/// Emits one operation as shell code over the variable's live value.
fn emit_dynamic(lines: &mut Vec<String>, name: &str, op: &Operation) {
    match op {
        Operation::Set { value } => {
            lines.push(format!("export {name}={}", double_quoted(value)));
        }

        Operation::Unset => lines.push(format!("unset {name}")),

        // ${VAR:+…} expands to nothing when VAR is unset or empty, which is
        // exactly the engine's edge case: no separator before nothing.
        Operation::Prepend { value, separator } => {
            let v = escape_double_quoted(value);
            let s = escape_double_quoted(separator);
            lines.push(format!("export {name}=\"{v}${{{name}:+{s}${{{name}}}}}\""));
        }

        Operation::Append { value, separator } => {
            let v = escape_double_quoted(value);
            let s = escape_double_quoted(separator);
            lines.push(format!("export {name}=\"${{{name}:+${{{name}}}{s}}}{v}\""));
        }

        // Splitting is spelled out with `case` so multi-character separators
        // work; empty components are dropped like the engine drops them, and
        // an empty result unsets the variable.
        Operation::Remove { value, separator } => {
            let v = escape_double_quoted(value);
            let s = escape_double_quoted(separator);

            lines.push(format!("__envlit_rest=\"${{{name}}}\""));
            lines.push(String::from("__envlit_acc=\"\""));
            lines.push(String::from("while [ -n \"${__envlit_rest}\" ]; do"));
            lines.push(String::from("  case \"${__envlit_rest}\" in"));
            lines.push(format!(
                "    *\"{s}\"*) __envlit_part=\"${{__envlit_rest%%\"{s}\"*}}\"; __envlit_rest=\"${{__envlit_rest#*\"{s}\"}}\" ;;"
            ));
            lines.push(String::from(
                "    *) __envlit_part=\"${__envlit_rest}\"; __envlit_rest=\"\" ;;",
            ));
            lines.push(String::from("  esac"));
            lines.push(format!(
                "  if [ -n \"${{__envlit_part}}\" ] && [ \"${{__envlit_part}}\" != \"{v}\" ]; then"
            ));
            lines.push(format!(
                "    __envlit_acc=\"${{__envlit_acc:+${{__envlit_acc}}{s}}}${{__envlit_part}}\""
            ));
            lines.push(String::from("  fi"));
            lines.push(String::from("done"));
            lines.push(String::from("if [ -n \"${__envlit_acc}\" ]; then"));
            lines.push(format!("  export {name}=\"${{__envlit_acc}}\""));
            lines.push(String::from("else"));
            lines.push(format!("  unset {name}"));
            lines.push(String::from("fi"));
            lines.push(String::from("unset __envlit_rest __envlit_acc __envlit_part"));
        }
    }
}
