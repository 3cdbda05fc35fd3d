#![forbid(unsafe_code)]

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use inlet_engine::project::{Workspace, MANIFEST_FILE};
use inlet_engine::{ClasspathAssembler, TracingReporter};
use tracing_subscriber::EnvFilter;

type CliResult = Result<(), Box<dyn Error>>;

const DEFAULT_SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };

#[derive(Debug, Parser)]
#[command(
    name = "inlet",
    about = "Assemble classpaths and run entry points in-process"
)]
#[command(version)]
struct Cli {
    /// Show debug output (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the classpath the entry point would run with
    Classpath {
        /// Separator placed between entries (defaults to the platform's)
        #[arg(long)]
        separator: Option<String>,
    },
    /// Validate inlet.toml and resolve every declared dependency
    Check,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Classpath { separator } => cmd_classpath(separator.as_deref()),
        Command::Check => cmd_check(),
    };

    if let Err(msg) = result {
        eprintln!("error: {msg}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Find the project root by looking for `inlet.toml` in the current directory.
fn project_root() -> Result<PathBuf, Box<dyn Error>> {
    let cwd = std::env::current_dir()?;
    if !cwd.join(MANIFEST_FILE).exists() {
        return Err(format!("no {MANIFEST_FILE} found in current directory").into());
    }
    Ok(cwd)
}

fn cmd_classpath(separator: Option<&str>) -> CliResult {
    let root = project_root()?;
    let classpath = assemble_classpath(&root, separator.unwrap_or(DEFAULT_SEPARATOR))?;
    println!("{classpath}");
    Ok(())
}

fn assemble_classpath(root: &Path, separator: &str) -> Result<String, Box<dyn Error>> {
    let workspace = Workspace::load(root)?;
    let request = workspace.request()?;
    let project = workspace.project()?;
    let own = if request.include_own_dependencies {
        workspace.own_dependencies()?
    } else {
        Vec::new()
    };

    let reporter = TracingReporter;
    let classpath = ClasspathAssembler::new(workspace.inputs(&project, &own), &reporter).assemble(
        request.include_project_dependencies,
        request.include_own_dependencies,
        request.executable.as_ref(),
    )?;
    Ok(classpath.join(separator))
}

fn cmd_check() -> CliResult {
    let root = project_root()?;
    let summary = Workspace::load(&root)?.check()?;
    eprintln!("    Entry point `{}`", summary.entry_point);
    eprintln!(
        "    Resolved {} project dependenc{} and {} tool dependenc{}",
        summary.project_dependencies,
        if summary.project_dependencies == 1 { "y" } else { "ies" },
        summary.own_dependencies,
        if summary.own_dependencies == 1 { "y" } else { "ies" },
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn parse_classpath_defaults() {
        let cli = Cli::try_parse_from(["inlet", "classpath"]).unwrap();
        assert!(!cli.verbose);
        match cli.command {
            Command::Classpath { separator } => assert!(separator.is_none()),
            other => panic!("expected Classpath, got {other:?}"),
        }
    }

    #[test]
    fn parse_classpath_separator_and_verbose() {
        let cli =
            Cli::try_parse_from(["inlet", "classpath", "--separator", ",", "-v"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Classpath { separator } => assert_eq!(separator.as_deref(), Some(",")),
            other => panic!("expected Classpath, got {other:?}"),
        }
    }

    #[test]
    fn parse_check() {
        let cli = Cli::try_parse_from(["inlet", "check"]).unwrap();
        assert!(matches!(cli.command, Command::Check));
    }

    #[test]
    fn unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["inlet", "frobnicate"]).is_err());
    }

    #[test]
    fn classpath_from_project_directory() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join(MANIFEST_FILE),
            r#"
[project]
name = "demo"
output_directory = "out"
test_output_directory = "out-test"

[[dependencies]]
group_id = "g"
artifact_id = "lib"
version = "1"

[exec]
main_class = "demo.Main"
"#,
        )
        .unwrap();
        fs::write(
            tmp.path().join("inlet.lock"),
            r#"
[[module]]
coordinate = "g:lib:1"
path = "libs/lib.jar"
"#,
        )
        .unwrap();

        let classpath = assemble_classpath(tmp.path(), "|").unwrap();
        let expected = [
            tmp.path().join("out"),
            tmp.path().join("out-test"),
            tmp.path().join("libs/lib.jar"),
        ]
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join("|");
        assert_eq!(classpath, expected);
    }
}
