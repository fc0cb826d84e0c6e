//! Command-line interface.
//!
//! Profiles declare their own flags, so the `load` grammar cannot be fixed
//! up front. Parsing is two-pass: pass 1 scans the raw argument vector for
//! the positional profile name and `--config`, just enough to locate and
//! load the profile; pass 2 extends the `load` subcommand with one
//! value-taking option per declared flag and lets clap parse for real. No
//! runtime code generation — the grammar is plain data.

use std::path::PathBuf;

use clap::{Arg, ArgMatches, Command};
use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::profile::{DEFAULT_PROFILE, Profile, find_profile, load_profile};
use crate::script;
use crate::state::{SNAPSHOT_VAR, StateStore, state_var_name_for};
use crate::track::{self, Phase};

/// Parses the process arguments and runs the selected subcommand.
pub fn run() -> Result<()> {
    let argv: Vec<String> = std::env::args_os()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    run_from(argv)
}

/// Runs the CLI over an explicit argument vector.
pub fn run_from(argv: Vec<String>) -> Result<()> {
    let prepared = if argv.get(1).map(String::as_str) == Some("load") {
        prepare_load(&argv[2..])?
    } else {
        None
    };

    let load_cmd = match &prepared {
        Some(loaded) => extend_with_flags(load_command(), &loaded.profile),
        None => load_command(),
    };

    let matches = match build_command(load_cmd).try_get_matches_from(&argv) {
        Ok(matches) => matches,
        Err(e) => e.exit(),
    };

    match matches.subcommand() {
        Some(("load", sub)) => cmd_load(sub, prepared),
        Some(("unload", sub)) => cmd_unload(sub),
        Some(("track", sub)) => cmd_track(sub),
        Some(("init", sub)) => {
            print!("{}", init_script(sub));
            Ok(())
        }
        Some(("doctor", _)) => cmd_doctor(),
        _ => unreachable!("a subcommand is required"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Grammar
// ─────────────────────────────────────────────────────────────────────────────

fn build_command(load_cmd: Command) -> Command {
    Command::new("envlit")
        .about("Environment overlays for interactive shells")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(load_cmd)
        .subcommand(
            Command::new("unload")
                .about("Emit a script that removes the active overlay")
                .after_help("The output is meant to be evaluated: eval \"$(envlit unload)\"")
                .arg(
                    Arg::new("profile")
                        .long("profile")
                        .short('p')
                        .value_name("NAME")
                        .help("Profile name (e.g. dev, prod)"),
                )
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("track")
                .hide(true)
                .about("Internal state tracking, invoked by emitted scripts")
                .arg(
                    Arg::new("phase")
                        .required(true)
                        .value_parser(["begin", "end", "restore"]),
                ),
        )
        .subcommand(
            Command::new("init")
                .about("Print shell integration functions")
                .arg(
                    Arg::new("shell")
                        .long("shell")
                        .value_name("SHELL")
                        .value_parser(["auto", "bash", "zsh"])
                        .default_value("auto")
                        .help("Shell to generate for"),
                )
                .arg(
                    Arg::new("alias-load")
                        .long("alias-load")
                        .value_name("NAME")
                        .default_value("el")
                        .help("Name of the load function"),
                )
                .arg(
                    Arg::new("alias-unload")
                        .long("alias-unload")
                        .value_name("NAME")
                        .default_value("eul")
                        .help("Name of the unload function"),
                ),
        )
        .subcommand(Command::new("doctor").about("Diagnose overlay state for the current directory"))
}

fn load_command() -> Command {
    Command::new("load")
        .about("Emit a script that applies a profile to the current shell")
        .after_help("The output is meant to be evaluated: eval \"$(envlit load dev)\"")
        .arg(
            Arg::new("profile")
                .value_name("PROFILE")
                .help("Profile name under .envlit/"),
        )
        .arg(config_arg())
}

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .value_name("PATH")
        .help("Path to a profile file")
}

/// Adds one value-taking option per profile-declared flag.
fn extend_with_flags(mut cmd: Command, profile: &Profile) -> Command {
    for (name, spec) in &profile.flags {
        if name == "profile" || name == "config" {
            tracing::warn!(flag = %name, "profile flag shadows a built-in option, skipped");
            continue;
        }

        let mut arg = Arg::new(name.clone()).value_name("VALUE").num_args(1);
        let mut has_long = false;
        let mut has_short = false;

        for spelling in &spec.spellings {
            if let Some(long) = spelling.strip_prefix("--") {
                if has_long {
                    arg = arg.alias(long.to_string());
                } else {
                    arg = arg.long(long.to_string());
                    has_long = true;
                }
            } else if let Some(short) = spelling.strip_prefix('-') {
                if let Some(c) = short.chars().next() {
                    if has_short {
                        arg = arg.short_alias(c);
                    } else {
                        arg = arg.short(c);
                        has_short = true;
                    }
                }
            }
        }

        let help = match &spec.default {
            Some(default) => format!("Set {} (default: {default})", spec.target),
            None => format!("Set {}", spec.target),
        };

        cmd = cmd.arg(arg.help(help));
    }

    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Pass 1: locate and load the profile before clap sees the full grammar
// ─────────────────────────────────────────────────────────────────────────────

struct LoadedProfile {
    profile: Profile,
}

fn prepare_load(args: &[String]) -> Result<Option<LoadedProfile>> {
    let (profile_name, config) = scan_load_args(args);

    let path = match config {
        Some(config) => Some(PathBuf::from(config)),
        None => find_profile(profile_name.as_deref(), &current_dir()?),
    };

    match path {
        Some(path) => Ok(Some(LoadedProfile {
            profile: load_profile(&path)?,
        })),
        None => Ok(None),
    }
}

/// Scans `load`'s raw arguments for the positional profile name and
/// `--config`.
///
/// Every declared flag takes a value, so the token following an unrecognised
/// option is treated as that option's value; the profile positional must
/// therefore precede declared flags, which matches the documented usage
/// (`envlit load dev --cuda 1`).
fn scan_load_args(args: &[String]) -> (Option<String>, Option<String>) {
    let mut profile = None;
    let mut config = None;
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        if arg == "--config" || arg == "-c" {
            if let Some(value) = args.get(i + 1) {
                config = Some(value.clone());
                i += 2;
            } else {
                i += 1;
            }
        } else if let Some(value) = arg.strip_prefix("--config=") {
            config = Some(value.to_string());
            i += 1;
        } else if arg.starts_with('-') && arg.len() > 1 {
            let has_inline_value = arg.contains('=');
            let next_is_value = args.get(i + 1).is_some_and(|next| !next.starts_with('-'));
            i += if has_inline_value || !next_is_value { 1 } else { 2 };
        } else {
            if profile.is_none() {
                profile = Some(arg.clone());
            }
            i += 1;
        }
    }

    (profile, config)
}

// ─────────────────────────────────────────────────────────────────────────────
// Subcommands
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_load(matches: &ArgMatches, prepared: Option<LoadedProfile>) -> Result<()> {
    let Some(loaded) = prepared else {
        let name = matches
            .get_one::<String>("profile")
            .cloned()
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());
        return Err(Error::NoProfile { name });
    };

    let mut flag_values = IndexMap::new();

    for name in loaded.profile.flags.keys() {
        if let Ok(Some(value)) = matches.try_get_one::<String>(name) {
            flag_values.insert(name.clone(), value.clone());
        }
    }

    println!("{}", script::load_script(&loaded.profile, &flag_values));
    Ok(())
}

fn cmd_unload(matches: &ArgMatches) -> Result<()> {
    let path = match matches.get_one::<String>("config") {
        Some(config) => Some(PathBuf::from(config)),
        None => find_profile(
            matches.get_one::<String>("profile").map(String::as_str),
            &current_dir()?,
        ),
    };

    // Without a profile there are no hooks, but the overlay still restores.
    let profile = match path {
        Some(path) => load_profile(&path)?,
        None => Profile::default(),
    };

    println!("{}", script::unload_script(&profile));
    Ok(())
}

fn cmd_track(matches: &ArgMatches) -> Result<()> {
    let phase = matches
        .get_one::<String>("phase")
        .and_then(|p| Phase::parse(p))
        .expect("clap validates the phase");

    let output = track::run_phase(phase).map_err(|source| Error::WorkingDir { source })?;
    println!("{output}");
    Ok(())
}

fn cmd_doctor() -> Result<()> {
    let cwd = current_dir()?;
    let state_var = state_var_name_for(&cwd);
    let env = track::process_env();

    let state_status = match env.get(&state_var) {
        Some(raw) => {
            let store = StateStore::parse(raw);
            format!("present, {} tracked variable(s)", store.len())
        }
        None => String::from("absent"),
    };

    let snapshot_status = if env.contains_key(SNAPSHOT_VAR) {
        "present"
    } else {
        "absent"
    };

    let discovery = match find_profile(None, &cwd) {
        Some(path) => path.display().to_string(),
        None => String::from("none found"),
    };

    println!("envlit doctor");
    println!("  working directory: {}", cwd.display());
    println!("  state variable:    {state_var} ({state_status})");
    println!("  snapshot variable: {SNAPSHOT_VAR} ({snapshot_status})");
    println!("  default profile:   {discovery}");
    Ok(())
}

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(|source| Error::WorkingDir { source })
}

// ─────────────────────────────────────────────────────────────────────────────
// Shell integration
// ─────────────────────────────────────────────────────────────────────────────

fn init_script(matches: &ArgMatches) -> String {
    let shell = match matches.get_one::<String>("shell").map(String::as_str) {
        Some("auto") | None => detect_shell(),
        Some(other) => other.to_string(),
    };

    let alias_load = matches
        .get_one::<String>("alias-load")
        .cloned()
        .unwrap_or_else(|| String::from("el"));
    let alias_unload = matches
        .get_one::<String>("alias-unload")
        .cloned()
        .unwrap_or_else(|| String::from("eul"));

    render_init(&shell, &alias_load, &alias_unload)
}

fn detect_shell() -> String {
    let shell = std::env::var("SHELL").unwrap_or_default();
    let base = shell.rsplit('/').next().unwrap_or_default();

    if base.contains("zsh") {
        String::from("zsh")
    } else {
        String::from("bash")
    }
}

/// Renders the `el`/`eul` functions.
///
/// The output of `envlit load` is routed through a temp file rather than
/// `eval "$(…)"` so that a failed load (which prints nothing on stdout)
/// sources nothing.
fn render_init(shell: &str, alias_load: &str, alias_unload: &str) -> String {
    let mut out = String::new();
    out.push_str("# envlit shell integration\n");
    out.push_str(&format!("# Generated for {shell}\n"));

    for (alias, subcommand) in [(alias_load, "load"), (alias_unload, "unload")] {
        out.push('\n');
        out.push_str(&format!(
            "{alias}() {{\n    local tmp_script\n    tmp_script=\"$(mktemp)\"\n    if envlit {subcommand} \"$@\" > \"$tmp_script\"; then\n        source \"$tmp_script\"\n    fi\n    rm -f \"$tmp_script\"\n}}\n"
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scan_finds_positional_profile() {
        let (profile, config) = scan_load_args(&strings(&["dev"]));
        assert_eq!(profile.as_deref(), Some("dev"));
        assert_eq!(config, None);
    }

    #[test]
    fn test_scan_finds_config_value() {
        let (profile, config) = scan_load_args(&strings(&["--config", "path/to/p.yaml"]));
        assert_eq!(profile, None);
        assert_eq!(config.as_deref(), Some("path/to/p.yaml"));

        let (_, config) = scan_load_args(&strings(&["-c", "p.yaml", "dev"]));
        assert_eq!(config.as_deref(), Some("p.yaml"));

        let (_, config) = scan_load_args(&strings(&["--config=p.yaml"]));
        assert_eq!(config.as_deref(), Some("p.yaml"));
    }

    #[test]
    fn test_scan_skips_unknown_option_values() {
        // "1" is --cuda's value, not the profile.
        let (profile, _) = scan_load_args(&strings(&["--cuda", "1"]));
        assert_eq!(profile, None);

        let (profile, _) = scan_load_args(&strings(&["dev", "--cuda", "1"]));
        assert_eq!(profile.as_deref(), Some("dev"));
    }

    #[test]
    fn test_scan_profile_and_config_mixed() {
        let (profile, config) =
            scan_load_args(&strings(&["-c", "cfg.yaml", "dev", "--cuda", "1"]));
        assert_eq!(profile.as_deref(), Some("dev"));
        assert_eq!(config.as_deref(), Some("cfg.yaml"));
    }

    #[test]
    fn test_render_init_default_aliases() {
        let out = render_init("bash", "el", "eul");
        assert!(out.contains("# envlit shell integration"));
        assert!(out.contains("# Generated for bash"));
        assert!(out.contains("el() {"));
        assert!(out.contains("eul() {"));
        assert!(out.contains("local tmp_script"));
        assert!(out.contains("mktemp"));
        assert!(out.contains("envlit load \"$@\""));
        assert!(out.contains("envlit unload \"$@\""));
        assert!(out.contains("source \"$tmp_script\""));
        assert!(out.contains("rm -f \"$tmp_script\""));
    }

    #[test]
    fn test_render_init_custom_aliases() {
        let out = render_init("zsh", "envload", "envunload");
        assert!(out.contains("# Generated for zsh"));
        assert!(out.contains("envload() {"));
        assert!(out.contains("envunload() {"));
    }
}
