mod ast;
mod error;
mod evaluator;
mod input;
mod lexer;
mod parser;
mod repl;
mod runner;
mod value;

use clap::{Arg, Command};
use input::StdinChannel;
use std::fs;
use std::path::Path;

fn main() {
    let matches = Command::new("knl")
        .about("ಕನ್ನಡ ಪ್ರೋಗ್ರಾಮಿಂಗ್ ಭಾಷೆ, a Kannada-script scripting language")
        .arg(
            Arg::new("file")
                .help("The .kn script file to execute")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Start in interactive mode")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    if let Some(file_path) = matches.get_one::<String>("file") {
        run_file(file_path);
    } else {
        repl::start();
    }
}

fn run_file(path: &str) {
    let path = Path::new(path);

    if !path.exists() {
        eprintln!("Error: File '{}' not found", path.display());
        std::process::exit(1);
    }

    match fs::read_to_string(path) {
        Ok(source) => {
            let mut input = StdinChannel;
            let outcome = runner::run(&source, &mut input);
            if let Some(error) = &outcome.error {
                error.report(&source, path.to_str());
            }
            println!("{}", outcome.text);
        }
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    }
}
