//! CLI module for the content gateway
//!
//! `serve` runs the HTTP API. Configuration comes from `config/*` files and
//! `APP__*` environment variables.

pub mod serve;

use clap::{Parser, Subcommand};

/// PMP Content Gateway - cached speech, summaries, vocabulary and images
#[derive(Parser)]
#[command(name = "pmp-content-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server (default)
    Serve(serve::ServeArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_is_default() {
        let cli = Cli::try_parse_from(["pmp-content-gateway"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_serve_port_override() {
        let cli = Cli::try_parse_from(["pmp-content-gateway", "serve", "--port", "9000"]).unwrap();

        match cli.command {
            Some(Command::Serve(args)) => assert_eq!(args.port, Some(9000)),
            None => panic!("expected serve command"),
        }
    }
}
