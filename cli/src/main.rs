//! Portman CLI - inspect and manage processes bound to network ports.
//!
//! Shows which process owns a port, optionally terminates it, or lists
//! listening ports / open connections. One invocation, one answer; no
//! state survives the process.

mod commands;
mod confirm;

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use portman_core::PortQuery;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portman")]
#[command(about = "Inspect and manage processes bound to network ports")]
#[command(disable_version_flag = true)]
struct Cli {
    /// Port number to inspect (1-65535)
    port: Option<String>,

    /// Kill the process(es) owning the port, asking for confirmation
    #[arg(long, requires = "port")]
    kill: bool,

    /// Kill without asking for confirmation
    #[arg(short = 'k', long = "force", requires = "port")]
    force: bool,

    /// List listening ports
    #[arg(short = 'l', long = "list", conflicts_with = "port")]
    list: bool,

    /// Together with --list, show open connections in every state
    #[arg(short = 'a', long = "all", requires = "list")]
    all: bool,

    /// Print version information
    #[arg(short = 'v', long = "version", conflicts_with_all = ["port", "list"])]
    version: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // clap defaults to exit code 2; the contract here is 1 for
            // argument errors and 0 for help
            let code = match e.kind() {
                ErrorKind::DisplayHelp => 0,
                _ => 1,
            };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    ExitCode::from(run(cli).await)
}

/// Dispatch and return the exit code: 0 for success (including "nothing
/// found" and a declined kill), 1 for validation, tool, or kill failures.
async fn run(cli: Cli) -> u8 {
    if cli.version {
        println!("portman {}", version_string());
        return 0;
    }

    if cli.list {
        return report(commands::list::run(cli.all).await);
    }

    match cli.port.as_deref() {
        // `portman help` is accepted in the positional slot
        Some("help") => {
            let _ = Cli::command().print_help();
            0
        }
        Some(input) => {
            let port = match PortQuery::parse(input) {
                Ok(port) => port,
                Err(e) => {
                    eprintln!("Error: {e}");
                    return 1;
                }
            };
            if cli.kill || cli.force {
                report(commands::kill::run(port, cli.force).await)
            } else {
                report(commands::show::run(port).await)
            }
        }
        None => {
            let mut cmd = Cli::command();
            let _ = cmd.write_help(&mut std::io::stderr());
            eprintln!();
            1
        }
    }
}

fn report(result: anyhow::Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {err:#}");
            if let Some(portman_core::Error::ToolUnavailable { tool }) =
                err.downcast_ref::<portman_core::Error>()
            {
                print_install_hint(tool);
            }
            1
        }
    }
}

/// Displayed version, overridable via the environment.
fn version_string() -> String {
    std::env::var("PORTMAN_VERSION").unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string())
}

fn print_install_hint(tool: &str) {
    #[cfg(target_os = "macos")]
    eprintln!("Install it with: brew install {tool}");
    #[cfg(not(target_os = "macos"))]
    eprintln!("Install it with your package manager, e.g. apt install {tool} or dnf install {tool}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_version_is_crate_version() {
        // Only meaningful when the override is not set in the environment
        if std::env::var_os("PORTMAN_VERSION").is_none() {
            assert_eq!(version_string(), env!("CARGO_PKG_VERSION"));
        }
    }

    #[test]
    fn argument_conflicts_are_rejected() {
        // --list together with a port makes no sense
        assert!(Cli::try_parse_from(["portman", "3000", "--list"]).is_err());
        // --all requires --list
        assert!(Cli::try_parse_from(["portman", "--all"]).is_err());
        // --kill requires a port
        assert!(Cli::try_parse_from(["portman", "--kill"]).is_err());
        // one operation per invocation: -v takes no port and no --list
        assert!(Cli::try_parse_from(["portman", "3000", "-v"]).is_err());
        assert!(Cli::try_parse_from(["portman", "--list", "-v"]).is_err());
    }

    #[tokio::test]
    async fn invalid_port_input_exits_nonzero() {
        let cli = Cli::try_parse_from(["portman", "abc"]).unwrap();
        assert_eq!(run(cli).await, 1);
    }

    #[tokio::test]
    async fn version_and_help_exit_zero() {
        let cli = Cli::try_parse_from(["portman", "-v"]).unwrap();
        assert_eq!(run(cli).await, 0);

        let cli = Cli::try_parse_from(["portman", "help"]).unwrap();
        assert_eq!(run(cli).await, 0);
    }

    #[test]
    fn report_maps_results_to_exit_codes() {
        // Success includes the empty "no process found" paths
        assert_eq!(report(Ok(())), 0);
        assert_eq!(report(Err(anyhow::anyhow!("scan failed"))), 1);
    }

    #[test]
    fn accepted_invocations_parse() {
        let cli = Cli::try_parse_from(["portman", "3000"]).unwrap();
        assert_eq!(cli.port.as_deref(), Some("3000"));
        assert!(!cli.kill && !cli.force);

        let cli = Cli::try_parse_from(["portman", "3000", "--kill"]).unwrap();
        assert!(cli.kill && !cli.force);

        let cli = Cli::try_parse_from(["portman", "3000", "-k"]).unwrap();
        assert!(cli.force);

        let cli = Cli::try_parse_from(["portman", "--list", "--all"]).unwrap();
        assert!(cli.list && cli.all);

        let cli = Cli::try_parse_from(["portman", "-l"]).unwrap();
        assert!(cli.list && !cli.all);

        let cli = Cli::try_parse_from(["portman", "-v"]).unwrap();
        assert!(cli.version);
    }
}
