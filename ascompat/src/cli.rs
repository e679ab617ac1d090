use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "ascompat",
    about = "Force a Visual Studio 2010 extension to be marked as compatible with Atmel Studio.",
    long_about = "Force a Visual Studio 2010 extension to be marked as compatible with Atmel Studio.

This does not ensure the resulting extension will work. Use it on extensions \
that only rely on the core Visual Studio infrastructure, or on known-good \
extensions whose manifests were never updated.",
    override_usage = "ascompat [OPTIONS] <INPUT>.vsix <VERSION>",
    after_help = "Example: ascompat generic_extension.vsix 6.1",
    version
)]
pub struct Cli {
    /// Extension archive to patch
    pub input: PathBuf,

    /// Atmel Studio version to report compatibility with, e.g. 6.1
    #[arg(value_name = "VERSION")]
    pub product_version: String,

    /// Replace a staging directory left over from an earlier run
    #[arg(short = 'f', long)]
    pub force: bool,

    /// Suppress output
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

pub fn print_usage() {
    println!("Usage:   ascompat {{Input}}.vsix {{Version}}");
    println!("Example: ascompat generic_extension.vsix 6.1");
}
