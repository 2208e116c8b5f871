// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `completions`: shell completion scripts.
//!
//! ```bash
//! # Bash
//! eval "$(unbound-sync completions bash)"
//!
//! # Zsh (directory must be in fpath)
//! unbound-sync completions zsh > ~/.zsh/completions/_unbound-sync
//!
//! # Fish
//! unbound-sync completions fish > ~/.config/fish/completions/unbound-sync.fish
//! ```

use super::Cli;
use clap::{Args, CommandFactory, ValueEnum};
use clap_complete::{generate, Shell as ClapShell};
use std::io::{self, Write};

/// Supported shells
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash
    Bash,
    /// Zsh
    Zsh,
    /// Fish
    Fish,
}

impl Shell {
    fn to_clap_shell(self) -> ClapShell {
        match self {
            Shell::Bash => ClapShell::Bash,
            Shell::Zsh => ClapShell::Zsh,
            Shell::Fish => ClapShell::Fish,
        }
    }
}

/// Arguments for `completions`
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for `shell` to `out`.
pub fn write_completions(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell.to_clap_shell(), &mut cmd, bin_name, out);
}

/// Print the completion script to stdout.
pub fn execute(args: &CompletionsArgs) {
    write_completions(args.shell, &mut io::stdout());
}

#[cfg(test)]
#[path = "completions_tests.rs"]
mod completions_tests;
