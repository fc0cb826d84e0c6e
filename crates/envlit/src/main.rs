use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Diagnostics and logs go to stderr; stdout is reserved for emitted
    // shell source.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("ENVLIT_LOG"))
        .with_writer(std::io::stderr)
        .init();

    match envlit::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            ExitCode::FAILURE
        }
    }
}
