//! HSTP CLI binary
//!
//! Command-line interface for interacting with a running HSTP node.

use clap::Parser;

/// HSTP CLI - command-line interface for an HSTP node's management API.
#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {}

fn main() {
    Args::parse();
}
