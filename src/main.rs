//! Go OpenAPI Generator - Command-line tool for documenting Go Fiber services.
//!
//! Analyzes the controllers of a Go microservice project without compiling it and prints
//! either the raw endpoint inventory or a complete OpenAPI 3.0 document.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-go <endpoints|spec> [OPTIONS]
//! ```
//!
//! # Examples
//!
//! List endpoints of one service as a table:
//! ```bash
//! openapi-from-go endpoints -p ./backend --ms orders -f table
//! ```
//!
//! Generate the YAML document:
//! ```bash
//! openapi-from-go spec -p ./backend -o openapi.yaml
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! openapi-from-go spec -p ./backend -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_go::cli;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("Go OpenAPI Generator starting...");
    cli::run(args)?;
    info!("Done");

    Ok(())
}
