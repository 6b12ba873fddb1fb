use std::io::{self, Write};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::error::CliError;

const BIN_NAME: &str = "haven";

pub fn run_completions(shell: Shell, output_path: Option<&Path>) -> Result<(), CliError> {
    let mut buffer = Vec::new();
    generate(shell, &mut Cli::command(), BIN_NAME, &mut buffer);

    match output_path {
        Some(path) => {
            std::fs::write(path, &buffer)?;
            println!("{}", path.display());
        }
        None => io::stdout().write_all(&buffer)?,
    }

    Ok(())
}
