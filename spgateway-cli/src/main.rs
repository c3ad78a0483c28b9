//! `spgateway` - operator tool for the Spgateway / NewebPay codec.
//!
//! Computes and verifies check values, encrypts and decrypts payload blobs,
//! and decodes payment notifications. Output is one JSON document on stdout;
//! logs go to stderr.
//!
//! Merchant options come from `--config <file.toml>` and are overridden by
//! `SPGATEWAY_MODE`, `SPGATEWAY_MERCHANT_ID`, `SPGATEWAY_HASH_KEY` and
//! `SPGATEWAY_HASH_IV` (or the matching flags).

#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest"
)]

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

mod commands;
mod observability;

use commands::Cli;
use observability::{LogFormat, init_logging};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(LogFormat::from_env(), cli.log_level());

    match cli.run() {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
