//! Profile model and normalisation.
//!
//! A profile is a declarative description of an environment overlay, read
//! from a YAML document with four recognised top-level keys (all optional):
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `extends` | path to a single parent profile, resolved child-relative |
//! | `env` | variable name → directive (string, null, operation, pipeline) |
//! | `flags` | flag name → CLI flag descriptor |
//! | `hooks` | lifecycle phase → list of named shell snippets |
//!
//! Normalisation happens at load time: every `env` directive becomes a
//! pipeline of [`Operation`]s, flag descriptors get their spellings and
//! target filled in, and every constraint the emitter relies on (legal
//! variable names, known operation tags, required fields) is checked here so
//! the emitter itself cannot fail.

mod discover;
mod error;
mod loader;

pub use discover::{DEFAULT_PROFILE, PROFILE_DIR, find_profile};
pub use error::ProfileError;
pub use loader::load_profile;

use indexmap::IndexMap;
use serde_json::Value;

use crate::ops::{DEFAULT_SEPARATOR, Operation};
use loader::Origin;

/// A user-supplied shell snippet invoked at a lifecycle phase.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Hook {
    /// Human-readable label, emitted as a comment above the snippet.
    pub name: String,

    /// Shell source passed to the emitted script verbatim.
    pub script: String,
}

/// Hooks per lifecycle phase, in execution order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Hooks {
    pub pre_load: Vec<Hook>,
    pub post_load: Vec<Hook>,
    pub pre_unload: Vec<Hook>,
    pub post_unload: Vec<Hook>,
}

impl Hooks {
    /// Appends another set of hooks after this one, phase by phase.
    fn append(&mut self, other: Hooks) {
        self.pre_load.extend(other.pre_load);
        self.post_load.extend(other.post_load);
        self.pre_unload.extend(other.pre_unload);
        self.post_unload.extend(other.post_unload);
    }
}

/// A CLI flag declared by a profile.
///
/// The flag binds a user-supplied value to `target`, optionally translated
/// through `map`. `default` is surfaced in `--help` only; it is never
/// materialised into an emitted script.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlagSpec {
    /// Flag spellings, e.g. `["--cuda", "-g"]`. Never empty.
    pub spellings: Vec<String>,

    /// Default shown in help text.
    pub default: Option<String>,

    /// Environment variable the flag binds to.
    pub target: String,

    /// Translation table from user-supplied value to bound value.
    pub map: IndexMap<String, String>,
}

/// A fully normalised, inheritance-resolved profile.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Profile {
    /// Variable name → operation pipeline, in document order.
    pub env: IndexMap<String, Vec<Operation>>,

    /// Flag name → descriptor, in document order.
    pub flags: IndexMap<String, FlagSpec>,

    /// Lifecycle hooks.
    pub hooks: Hooks,

    /// Unrecognised top-level keys, carried through inheritance untouched.
    pub extra: IndexMap<String, Value>,
}

impl Profile {
    /// Normalises a parsed YAML document into a profile.
    ///
    /// Returns the profile together with the raw `extends` reference, which
    /// the loader resolves and consumes.
    pub(crate) fn from_value(
        value: Value,
        origin: &Origin,
    ) -> Result<(Self, Option<String>), ProfileError> {
        let map = match value {
            Value::Null => return Ok((Self::default(), None)),
            Value::Object(map) => map,
            _ => {
                return Err(ProfileError::NotMapping {
                    path: origin.path.clone(),
                });
            }
        };

        let mut profile = Self::default();
        let mut extends = None;

        for (key, entry) in map {
            match key.as_str() {
                "extends" => match entry {
                    Value::String(s) if !s.is_empty() => extends = Some(s),
                    _ => {
                        return Err(origin.invalid(
                            Some("extends"),
                            "extends must be a non-empty path string",
                            "point extends at a parent profile file",
                        ));
                    }
                },
                "env" => profile.env = parse_env(entry, origin)?,
                "flags" => profile.flags = parse_flags(entry, origin)?,
                "hooks" => profile.hooks = parse_hooks(entry, origin)?,
                _ => {
                    profile.extra.insert(key, entry);
                }
            }
        }

        Ok((profile, extends))
    }
}

/// Merges a parent profile under a child: `env`/`flags` are shallow overlays
/// where the child key wins, hooks concatenate parent-first per phase, and
/// any other top-level key from the child replaces the parent's.
pub(crate) fn merge(parent: Profile, child: Profile) -> Profile {
    let mut merged = parent;

    // IndexMap keeps the first occurrence's position on overwrite, matching
    // the overlay-in-place semantics of the original tool.
    merged.env.extend(child.env);
    merged.flags.extend(child.flags);
    merged.hooks.append(child.hooks);
    merged.extra.extend(child.extra);

    merged
}

// ─────────────────────────────────────────────────────────────────────────────
// Section parsers
// ─────────────────────────────────────────────────────────────────────────────

fn parse_env(
    value: Value,
    origin: &Origin,
) -> Result<IndexMap<String, Vec<Operation>>, ProfileError> {
    let map = match value {
        Value::Null => return Ok(IndexMap::new()),
        Value::Object(map) => map,
        _ => {
            return Err(origin.invalid(
                Some("env"),
                "env must be a mapping of variable names to directives",
                "write entries like `MY_VAR: value`",
            ));
        }
    };

    let mut env = IndexMap::with_capacity(map.len());

    for (name, directive) in map {
        validate_var_name(&name, origin)?;
        let pipeline = normalize_directive(&name, directive, origin)?;
        env.insert(name, pipeline);
    }

    Ok(env)
}

/// Normalises one `env` directive into a pipeline of operations.
///
/// A string is shorthand for `set`, null for `unset`, a mapping is a single
/// operation, and a sequence is a pipeline.
fn normalize_directive(
    name: &str,
    directive: Value,
    origin: &Origin,
) -> Result<Vec<Operation>, ProfileError> {
    match directive {
        Value::Null => Ok(vec![Operation::Unset]),

        Value::String(value) => Ok(vec![Operation::Set { value }]),

        Value::Object(map) => Ok(vec![parse_operation(name, &map, origin)?]),

        Value::Array(items) => {
            let mut ops = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Object(map) => ops.push(parse_operation(name, &map, origin)?),
                    _ => {
                        return Err(origin.invalid(
                            Some(name),
                            format!("pipeline for {name} may only contain operation mappings"),
                            "each pipeline step looks like `{op: prepend, value: /opt/bin}`",
                        ));
                    }
                }
            }
            Ok(ops)
        }

        other => Err(origin.invalid(
            Some(name),
            format!(
                "directive for {name} must be a string, null, an operation, or a list of operations (got {})",
                value_kind(&other)
            ),
            "see the env section reference for directive forms",
        )),
    }
}

/// Parses a single operation record, enforcing the tag/field invariants.
fn parse_operation(
    name: &str,
    map: &serde_json::Map<String, Value>,
    origin: &Origin,
) -> Result<Operation, ProfileError> {
    let tag = match map.get("op") {
        Some(Value::String(tag)) => tag.as_str(),
        Some(_) => {
            return Err(origin.invalid(
                Some(name),
                format!("operation tag for {name} must be a string"),
                "valid operations are: set, unset, prepend, append, remove",
            ));
        }
        None => {
            return Err(origin.invalid(
                Some(name),
                format!("operation for {name} is missing its 'op' field"),
                "valid operations are: set, unset, prepend, append, remove",
            ));
        }
    };

    let separator = match map.get("separator") {
        None | Some(Value::Null) => DEFAULT_SEPARATOR.to_string(),
        Some(v) => match scalar_to_string(v) {
            Some(s) if !s.is_empty() => s,
            Some(_) => {
                return Err(origin.invalid(
                    Some(name),
                    format!("separator for {name} must not be empty"),
                    "omit separator to use the default colon",
                ));
            }
            None => {
                return Err(origin.invalid(
                    Some(name),
                    format!("separator for {name} must be a scalar"),
                    "omit separator to use the default colon",
                ));
            }
        },
    };

    // Non-string scalars coerce to their canonical string form; an explicit
    // null does not count as a value.
    let value = match map.get("value") {
        None | Some(Value::Null) => None,
        Some(v) => match scalar_to_string(v) {
            Some(s) => Some(s),
            None => {
                return Err(origin.invalid(
                    Some(name),
                    format!("value for {name} must be a scalar"),
                    "operation values are strings (or numbers/booleans, coerced)",
                ));
            }
        },
    };

    let require_value = |value: Option<String>| {
        value.ok_or_else(|| {
            origin.invalid(
                Some(name),
                format!("operation '{tag}' for {name} requires a value"),
                "add a `value:` field to the operation",
            )
        })
    };

    match tag {
        "set" => Ok(Operation::Set {
            value: require_value(value)?,
        }),

        "unset" => {
            if map.contains_key("value") {
                return Err(origin.invalid(
                    Some(name),
                    format!("operation 'unset' for {name} must not carry a value"),
                    "remove the `value:` field",
                ));
            }
            Ok(Operation::Unset)
        }

        "prepend" => Ok(Operation::Prepend {
            value: require_value(value)?,
            separator,
        }),

        "append" => Ok(Operation::Append {
            value: require_value(value)?,
            separator,
        }),

        "remove" => Ok(Operation::Remove {
            value: require_value(value)?,
            separator,
        }),

        other => Err(origin.invalid(
            Some(name),
            format!("unknown operation '{other}' for {name}"),
            "valid operations are: set, unset, prepend, append, remove",
        )),
    }
}

fn parse_flags(
    value: Value,
    origin: &Origin,
) -> Result<IndexMap<String, FlagSpec>, ProfileError> {
    let map = match value {
        Value::Null => return Ok(IndexMap::new()),
        Value::Object(map) => map,
        _ => {
            return Err(origin.invalid(
                Some("flags"),
                "flags must be a mapping of flag names to descriptors",
                "write entries like `cuda: {flag: --cuda, target: CUDA_VISIBLE_DEVICES}`",
            ));
        }
    };

    let mut flags = IndexMap::with_capacity(map.len());

    for (name, descriptor) in map {
        let spec = parse_flag(&name, descriptor, origin)?;
        flags.insert(name, spec);
    }

    Ok(flags)
}

fn parse_flag(name: &str, descriptor: Value, origin: &Origin) -> Result<FlagSpec, ProfileError> {
    let Value::Object(map) = descriptor else {
        return Err(origin.invalid(
            Some(name),
            format!("flag descriptor for {name} must be a mapping"),
            "recognised fields: flag, default, target, map",
        ));
    };

    let spellings = match map.get("flag") {
        None => vec![format!("--{name}")],
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => {
            let mut spellings = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => spellings.push(s.clone()),
                    _ => {
                        return Err(origin.invalid(
                            Some(name),
                            format!("flag spellings for {name} must be strings"),
                            "write spellings like `[--cuda, -g]`",
                        ));
                    }
                }
            }
            spellings
        }
        Some(_) => {
            return Err(origin.invalid(
                Some(name),
                format!("flag field for {name} must be a spelling or list of spellings"),
                "write spellings like `--cuda` or `[--cuda, -g]`",
            ));
        }
    };

    if spellings.is_empty() {
        return Err(origin.invalid(
            Some(name),
            format!("flag {name} declares no spellings"),
            "provide at least one spelling, e.g. `--{name}`",
        ));
    }

    for spelling in &spellings {
        let valid = if let Some(long) = spelling.strip_prefix("--") {
            !long.is_empty()
        } else if let Some(short) = spelling.strip_prefix('-') {
            short.chars().count() == 1
        } else {
            false
        };

        if !valid {
            return Err(origin.invalid(
                Some(name),
                format!("invalid flag spelling '{spelling}' for {name}"),
                "spellings are `--long` or single-character `-s`",
            ));
        }
    }

    let default = match map.get("default") {
        None | Some(Value::Null) => None,
        Some(v) => match scalar_to_string(v) {
            Some(s) => Some(s),
            None => {
                return Err(origin.invalid(
                    Some(name),
                    format!("default for flag {name} must be a scalar or null"),
                    "defaults appear in --help only",
                ));
            }
        },
    };

    let target = match map.get("target") {
        None => name.to_uppercase(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            return Err(origin.invalid(
                Some(name),
                format!("target for flag {name} must be a variable name"),
                "omit target to bind the flag name upper-cased",
            ));
        }
    };
    validate_var_name(&target, origin)?;

    let value_map = match map.get("map") {
        None | Some(Value::Null) => IndexMap::new(),
        Some(Value::Object(entries)) => {
            let mut value_map = IndexMap::with_capacity(entries.len());
            for (from, to) in entries {
                let Some(to) = scalar_to_string(to) else {
                    return Err(origin.invalid(
                        Some(name),
                        format!("map values for flag {name} must be scalars"),
                        "map user-supplied values to bound values, e.g. `\"1\": \"0\"`",
                    ));
                };
                value_map.insert(from.clone(), to);
            }
            value_map
        }
        Some(_) => {
            return Err(origin.invalid(
                Some(name),
                format!("map for flag {name} must be a mapping"),
                "map user-supplied values to bound values, e.g. `\"1\": \"0\"`",
            ));
        }
    };

    Ok(FlagSpec {
        spellings,
        default,
        target,
        map: value_map,
    })
}

fn parse_hooks(value: Value, origin: &Origin) -> Result<Hooks, ProfileError> {
    let map = match value {
        Value::Null => return Ok(Hooks::default()),
        Value::Object(map) => map,
        _ => {
            return Err(origin.invalid(
                Some("hooks"),
                "hooks must be a mapping of lifecycle phases to hook lists",
                "recognised phases: pre_load, post_load, pre_unload, post_unload",
            ));
        }
    };

    let mut hooks = Hooks::default();

    for (phase, entries) in map {
        let parsed = parse_hook_list(&phase, entries, origin)?;

        match phase.as_str() {
            "pre_load" => hooks.pre_load = parsed,
            "post_load" => hooks.post_load = parsed,
            "pre_unload" => hooks.pre_unload = parsed,
            "post_unload" => hooks.post_unload = parsed,
            other => {
                return Err(origin.invalid(
                    Some(other),
                    format!("unrecognised hook phase '{other}'"),
                    "recognised phases: pre_load, post_load, pre_unload, post_unload",
                ));
            }
        }
    }

    Ok(hooks)
}

fn parse_hook_list(
    phase: &str,
    entries: Value,
    origin: &Origin,
) -> Result<Vec<Hook>, ProfileError> {
    let items = match entries {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        _ => {
            return Err(origin.invalid(
                Some(phase),
                format!("hooks for {phase} must be a list"),
                "each hook is `{name: ..., script: ...}`",
            ));
        }
    };

    let mut hooks = Vec::with_capacity(items.len());

    for item in items {
        let Value::Object(map) = item else {
            return Err(origin.invalid(
                Some(phase),
                format!("each {phase} hook must be a mapping"),
                "each hook is `{name: ..., script: ...}`",
            ));
        };

        let name = match map.get("name") {
            Some(Value::String(s)) if !s.contains('\n') => s.clone(),
            Some(Value::String(_)) => {
                return Err(origin.invalid(
                    Some(phase),
                    format!("hook names in {phase} must be single-line"),
                    "the name is emitted as a script comment",
                ));
            }
            _ => {
                return Err(origin.invalid(
                    Some(phase),
                    format!("each {phase} hook needs a string name"),
                    "each hook is `{name: ..., script: ...}`",
                ));
            }
        };

        let script = match map.get("script") {
            Some(Value::String(s)) => s.clone(),
            _ => {
                return Err(origin.invalid(
                    Some(phase),
                    format!("hook '{name}' in {phase} needs a string script"),
                    "the script is passed to the shell verbatim",
                ));
            }
        };

        hooks.push(Hook { name, script });
    }

    Ok(hooks)
}

// ─────────────────────────────────────────────────────────────────────────────
// Small helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Coerces a scalar to its canonical string form.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

/// Rejects variable names the shell cannot express.
fn validate_var_name(name: &str, origin: &Origin) -> Result<(), ProfileError> {
    if name.is_empty() || name.contains('=') || name.contains('\0') {
        return Err(origin.invalid(
            None,
            format!("illegal variable name {name:?}"),
            "variable names must be non-empty and free of '=' and NUL",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Origin {
        Origin {
            path: "test.yaml".to_string(),
            content: String::new(),
        }
    }

    fn profile_from_yaml(yaml: &str) -> Profile {
        let value: Value = serde_saphyr::from_str(yaml).unwrap();
        Profile::from_value(value, &origin()).unwrap().0
    }

    fn profile_error(yaml: &str) -> ProfileError {
        let value: Value = serde_saphyr::from_str(yaml).unwrap();
        Profile::from_value(value, &origin()).unwrap_err()
    }

    #[test]
    fn test_string_directive_is_set() {
        let profile = profile_from_yaml("env:\n  MODE: Debug\n");
        assert_eq!(
            profile.env["MODE"],
            vec![Operation::Set {
                value: "Debug".into()
            }]
        );
    }

    #[test]
    fn test_null_directive_is_unset() {
        let profile = profile_from_yaml("env:\n  UNSET_ME: null\n");
        assert_eq!(profile.env["UNSET_ME"], vec![Operation::Unset]);
    }

    #[test]
    fn test_single_operation_directive() {
        let profile = profile_from_yaml("env:\n  PATH: {op: prepend, value: /opt/bin}\n");
        assert_eq!(
            profile.env["PATH"],
            vec![Operation::Prepend {
                value: "/opt/bin".into(),
                separator: ":".into()
            }]
        );
    }

    #[test]
    fn test_pipeline_directive() {
        let profile = profile_from_yaml(
            "env:\n  PATH:\n    - {op: prepend, value: /opt/bin}\n    - {op: remove, value: /bad}\n",
        );
        assert_eq!(profile.env["PATH"].len(), 2);
    }

    #[test]
    fn test_custom_separator() {
        let profile =
            profile_from_yaml("env:\n  LIBS: {op: append, value: m, separator: \";\"}\n");
        assert_eq!(
            profile.env["LIBS"],
            vec![Operation::Append {
                value: "m".into(),
                separator: ";".into()
            }]
        );
    }

    #[test]
    fn test_numeric_value_coerced() {
        let profile = profile_from_yaml("env:\n  DEVICES: {op: set, value: 1}\n");
        assert_eq!(
            profile.env["DEVICES"],
            vec![Operation::Set { value: "1".into() }]
        );
    }

    #[test]
    fn test_env_order_preserved() {
        let profile = profile_from_yaml("env:\n  ZED: a\n  ALPHA: b\n  MIKE: c\n");
        let names: Vec<&String> = profile.env.keys().collect();
        assert_eq!(names, ["ZED", "ALPHA", "MIKE"]);
    }

    #[test]
    fn test_unknown_operation_rejected() {
        let err = profile_error("env:\n  X: {op: frobnicate, value: v}\n");
        assert!(err.to_string().contains("invalid profile entry"));
    }

    #[test]
    fn test_missing_value_rejected() {
        for op in ["set", "prepend", "append", "remove"] {
            let err = profile_error(&format!("env:\n  X: {{op: {op}}}\n"));
            assert!(matches!(
                err,
                ProfileError::Invalid { .. } | ProfileError::InvalidNoSpan { .. }
            ));
        }
    }

    #[test]
    fn test_unset_with_value_rejected() {
        let err = profile_error("env:\n  X: {op: unset, value: v}\n");
        assert!(matches!(
            err,
            ProfileError::Invalid { .. } | ProfileError::InvalidNoSpan { .. }
        ));
    }

    #[test]
    fn test_missing_op_rejected() {
        let err = profile_error("env:\n  X: {value: v}\n");
        assert!(matches!(
            err,
            ProfileError::Invalid { .. } | ProfileError::InvalidNoSpan { .. }
        ));
    }

    #[test]
    fn test_scalar_directive_rejected() {
        let err = profile_error("env:\n  X: 42\n");
        assert!(err.to_string().contains("invalid profile entry"));
    }

    #[test]
    fn test_empty_separator_rejected() {
        let err = profile_error("env:\n  X: {op: append, value: v, separator: \"\"}\n");
        assert!(matches!(
            err,
            ProfileError::Invalid { .. } | ProfileError::InvalidNoSpan { .. }
        ));
    }

    #[test]
    fn test_var_name_with_equals_rejected() {
        let err = profile_error("env:\n  \"BAD=NAME\": v\n");
        assert!(err.to_string().contains("invalid profile entry"));
    }

    #[test]
    fn test_flag_defaults_filled_in() {
        let profile = profile_from_yaml("flags:\n  cuda: {}\n");
        let spec = &profile.flags["cuda"];
        assert_eq!(spec.spellings, ["--cuda"]);
        assert_eq!(spec.target, "CUDA");
        assert_eq!(spec.default, None);
        assert!(spec.map.is_empty());
    }

    #[test]
    fn test_flag_full_descriptor() {
        let profile = profile_from_yaml(concat!(
            "flags:\n",
            "  cuda:\n",
            "    flag: [--cuda, -g]\n",
            "    default: 0\n",
            "    target: CUDA_VISIBLE_DEVICES\n",
            "    map:\n",
            "      \"0\": \"\"\n",
            "      \"1\": \"0\"\n",
        ));
        let spec = &profile.flags["cuda"];
        assert_eq!(spec.spellings, ["--cuda", "-g"]);
        assert_eq!(spec.default.as_deref(), Some("0"));
        assert_eq!(spec.target, "CUDA_VISIBLE_DEVICES");
        assert_eq!(spec.map["0"], "");
        assert_eq!(spec.map["1"], "0");
    }

    #[test]
    fn test_flag_bad_spelling_rejected() {
        for spelling in ["cuda", "-", "--", "-gg"] {
            let err = profile_error(&format!("flags:\n  cuda: {{flag: \"{spelling}\"}}\n"));
            assert!(matches!(
                err,
                ProfileError::Invalid { .. } | ProfileError::InvalidNoSpan { .. }
            ));
        }
    }

    #[test]
    fn test_hooks_parsed_per_phase() {
        let profile = profile_from_yaml(concat!(
            "hooks:\n",
            "  pre_load:\n",
            "    - {name: Check VPN, script: \"echo checking\"}\n",
            "  post_unload:\n",
            "    - {name: Done, script: \"echo done\"}\n",
        ));
        assert_eq!(profile.hooks.pre_load[0].name, "Check VPN");
        assert_eq!(profile.hooks.post_unload[0].script, "echo done");
        assert!(profile.hooks.post_load.is_empty());
    }

    #[test]
    fn test_unknown_hook_phase_rejected() {
        let err = profile_error("hooks:\n  mid_load:\n    - {name: X, script: x}\n");
        assert!(err.to_string().contains("invalid profile entry"));
    }

    #[test]
    fn test_extra_top_level_keys_carried() {
        let profile = profile_from_yaml("description: my profile\nenv:\n  A: b\n");
        assert_eq!(profile.extra["description"], Value::String("my profile".into()));
    }

    #[test]
    fn test_merge_env_child_wins() {
        let parent = profile_from_yaml("env:\n  A: parent\n  B: parent\n");
        let child = profile_from_yaml("env:\n  B: child\n  C: child\n");

        let merged = merge(parent, child);
        assert_eq!(
            merged.env["A"],
            vec![Operation::Set {
                value: "parent".into()
            }]
        );
        assert_eq!(
            merged.env["B"],
            vec![Operation::Set {
                value: "child".into()
            }]
        );
        assert_eq!(
            merged.env["C"],
            vec![Operation::Set {
                value: "child".into()
            }]
        );
    }

    #[test]
    fn test_merge_child_null_means_unset_not_removal() {
        let parent = profile_from_yaml("env:\n  A: parent\n");
        let child = profile_from_yaml("env:\n  A: null\n");

        let merged = merge(parent, child);
        assert_eq!(merged.env["A"], vec![Operation::Unset]);
    }

    #[test]
    fn test_merge_flags_replace_wholesale() {
        let parent = profile_from_yaml("flags:\n  cuda: {target: PARENT_TARGET, default: p}\n");
        let child = profile_from_yaml("flags:\n  cuda: {target: CHILD_TARGET}\n");

        let merged = merge(parent, child);
        let spec = &merged.flags["cuda"];
        assert_eq!(spec.target, "CHILD_TARGET");
        // Child descriptor replaces the parent's entirely; no field mixing.
        assert_eq!(spec.default, None);
    }

    #[test]
    fn test_merge_hooks_concatenate_parent_first() {
        let parent = profile_from_yaml("hooks:\n  pre_load:\n    - {name: B, script: echo B}\n");
        let child = profile_from_yaml("hooks:\n  pre_load:\n    - {name: C, script: echo C}\n");

        let merged = merge(parent, child);
        let names: Vec<&str> = merged
            .hooks
            .pre_load
            .iter()
            .map(|h| h.name.as_str())
            .collect();
        assert_eq!(names, ["B", "C"]);
    }

    #[test]
    fn test_merge_extra_child_replaces() {
        let parent = profile_from_yaml("description: old\n");
        let child = profile_from_yaml("description: new\n");

        let merged = merge(parent, child);
        assert_eq!(merged.extra["description"], Value::String("new".into()));
    }
}
