//! Command-line arguments for the `hstpd` daemon (spec §6): `--config`/`-c`,
//! `--help`/`-h`, `--version`/`-v`.

use clap::Parser;
use std::path::PathBuf;

fn default_config_path() -> PathBuf {
    PathBuf::from("config/node.yml")
}

/// Arguments accepted by the `hstpd` binary.
#[derive(Debug, Parser)]
#[command(name = "hstpd", about = "HSTP node daemon", disable_version_flag = true)]
pub struct Cli {
    /// Path to the node configuration document.
    #[arg(short = 'c', long = "config", default_value = default_config_path().into_os_string())]
    pub config: PathBuf,

    /// Prints the version banner and exits.
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: (),
}
