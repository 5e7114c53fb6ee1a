//! strip-style: derive the installed style sheet from its commented
//! reference.
//!
//! ```bash
//! strip-style                                  # styles/base-ref.mplstyle -> styles/base.mplstyle
//! strip-style my-ref.mplstyle my.mplstyle
//! PLOTHELPER_LOG=debug strip-style
//! ```

use std::{path::PathBuf, process::ExitCode};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use plothelper::{stylesheet, SheetError};

/// Strip comments and blank lines from a Matplotlib style sheet
#[derive(Parser)]
#[command(name = "strip-style")]
#[command(version, about)]
struct Cli {
    /// Commented reference style sheet
    #[arg(default_value = "styles/base-ref.mplstyle")]
    input: PathBuf,

    /// Style sheet to write
    #[arg(default_value = "styles/base.mplstyle")]
    output: PathBuf,
}

/// Log to stderr, filtered by `PLOTHELPER_LOG` (default `info`).
fn init_logging() {
    let filter = EnvFilter::try_from_env("PLOTHELPER_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), SheetError> {
    let n = stylesheet::strip_file(&cli.input, &cli.output)?;
    tracing::info!("wrote {} lines to {}", n, cli.output.display());
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn default_paths() {
        let cli = Cli::try_parse_from(["strip-style"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("styles/base-ref.mplstyle"));
        assert_eq!(cli.output, PathBuf::from("styles/base.mplstyle"));
    }

    #[test]
    fn custom_paths() {
        let cli = Cli::try_parse_from(["strip-style", "a.mplstyle", "b.mplstyle"])
            .unwrap();
        assert_eq!(cli.input, PathBuf::from("a.mplstyle"));
        assert_eq!(cli.output, PathBuf::from("b.mplstyle"));
    }

    #[test]
    fn too_many_arguments() {
        assert!(Cli::try_parse_from(["strip-style", "a", "b", "c"]).is_err());
    }

    #[test]
    fn missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli { input: dir.path().join("absent.mplstyle"),
                        output: dir.path().join("out.mplstyle") };
        assert!(matches!(run(&cli), Err(SheetError::MissingInputFile(p))
                         if p == cli.input));
        assert!(!cli.output.exists());
    }

    #[test]
    fn strips_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli { input: dir.path().join("ref.mplstyle"),
                        output: dir.path().join("out.mplstyle") };
        std::fs::write(&cli.input, "a = 1 # comment\n# full comment\nb = 2\n")
            .unwrap();
        assert!(run(&cli).is_ok());
        assert_eq!(std::fs::read_to_string(&cli.output).unwrap(),
                   "a = 1\nb = 2\n");
    }
}
