//! Shell completion generation.

use clap::CommandFactory;

use crate::cli::args::{Cli, CompletionsArgs};

/// Print a completion script for `args.shell` to stdout.
pub fn run(args: &CompletionsArgs) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(args.shell, &mut cmd, name, &mut std::io::stdout());
}
