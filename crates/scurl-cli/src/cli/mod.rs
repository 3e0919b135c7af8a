//! CLI for the scurl libcurl wrappers.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use scurl_core::config;
use std::path::PathBuf;

use commands::{run_escape, run_fetch, run_get, run_head, run_unescape, run_version, FetchArgs, GetArgs};

/// Top-level CLI for scurl.
#[derive(Debug, Parser)]
#[command(name = "scurl")]
#[command(about = "scurl: small transfer client on safe libcurl handles", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download one URL to stdout or a file.
    Get {
        url: String,

        /// Write the body here instead of stdout.
        #[arg(short = 'o', long = "output", value_name = "FILE")]
        output: Option<PathBuf>,

        /// Extra request header, e.g. -H "Accept: text/plain". Repeatable.
        #[arg(short = 'H', long = "header", value_name = "HEADER")]
        headers: Vec<String>,

        /// Skip TLS peer and host verification.
        #[arg(short = 'k', long)]
        insecure: bool,

        /// User-Agent to send (overrides config).
        #[arg(long, value_name = "UA")]
        user_agent: Option<String>,

        /// Do not follow redirects.
        #[arg(long)]
        no_follow: bool,

        /// Print the SHA-256 of the received body.
        #[arg(long)]
        sha256: bool,
    },

    /// Send a HEAD request and print the response headers.
    Head {
        url: String,

        /// Print only this header's value.
        #[arg(long, value_name = "NAME")]
        name: Option<String>,

        /// Print headers as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Download several URLs concurrently into a directory.
    Fetch {
        #[arg(required = true)]
        urls: Vec<String>,

        /// Directory for the downloaded files.
        #[arg(long, value_name = "DIR")]
        dir: PathBuf,

        /// Maximum connections overall (overrides config).
        #[arg(long, value_name = "N")]
        max_total: Option<usize>,

        /// Maximum connections per host (overrides config).
        #[arg(long, value_name = "N")]
        max_host: Option<usize>,
    },

    /// Percent-encode a string.
    Escape { text: String },

    /// Decode %XX sequences in a string.
    Unescape { text: String },

    /// Show scurl and libcurl versions.
    Version,
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        cli.command.run()
    }

    fn run(self) -> Result<()> {
        match self {
            CliCommand::Escape { text } => return run_escape(&text),
            CliCommand::Unescape { text } => return run_unescape(&text),
            CliCommand::Version => return run_version(),
            _ => {}
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match self {
            CliCommand::Get {
                url,
                output,
                headers,
                insecure,
                user_agent,
                no_follow,
                sha256,
            } => run_get(
                &cfg,
                &GetArgs {
                    url,
                    output,
                    headers,
                    insecure,
                    user_agent,
                    no_follow,
                    sha256,
                },
            )?,
            CliCommand::Head { url, name, json } => run_head(&cfg, &url, name.as_deref(), json)?,
            CliCommand::Fetch {
                urls,
                dir,
                max_total,
                max_host,
            } => run_fetch(
                &cfg,
                &FetchArgs {
                    urls,
                    dir,
                    max_total,
                    max_host,
                },
            )?,
            CliCommand::Escape { .. } | CliCommand::Unescape { .. } | CliCommand::Version => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
