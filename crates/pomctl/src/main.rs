use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pomctl::cmd_call;
use pomctl::cmd_decode;

#[derive(Parser, Debug)]
#[command(name = "pomctl", version, about = "POM XML-RPC envelope tool")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Output JSON where applicable
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the call envelope for METHOD with TYPE VALUE argument pairs
    Call {
        method: String,
        /// Alternating type tags and values, e.g. `string eth0 int 3`
        #[arg(num_args = 0.., allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Decode a reply envelope read from FILE or stdin
    Decode {
        input: Option<PathBuf>,
        /// Action named in the fault notice
        #[arg(long)]
        action: Option<String>,
    },
}

fn main() -> Result<()> {
    let Cli { verbose, json, cmd } = Cli::parse();

    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| level.into()),
        ))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cmd {
        Cmd::Call { method, args } => cmd_call::run(method, args, json)?,
        Cmd::Decode { input, action } => cmd_decode::run(input, action, json)?,
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_call_pairs() {
        let cli = Cli::parse_from(["pomctl", "call", "main.getLogs", "int", "-1"]);
        match cli.cmd {
            Cmd::Call { method, args } => {
                assert_eq!(method, "main.getLogs");
                assert_eq!(args, vec!["int", "-1"]);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn parse_decode_args() {
        let cli = Cli::parse_from([
            "pomctl",
            "--json",
            "decode",
            "reply.xml",
            "--action",
            "Remove Rule",
        ]);
        assert!(cli.json);
        match cli.cmd {
            Cmd::Decode { input, action } => {
                assert_eq!(input, Some(PathBuf::from("reply.xml")));
                assert_eq!(action.as_deref(), Some("Remove Rule"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
