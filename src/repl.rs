use crate::input::StdinChannel;
use crate::lexer::{Lexer, TokenType};
use crate::runner;
use std::io::{self, Write};

/// Interactive driver. Lines accumulate until the end keyword closes the
/// translation unit, then the whole unit runs with fresh interpreter state.
/// Nothing carries over from one unit to the next.
pub fn start() {
    println!("ಕನ್ನಡ ಪ್ರೋಗ್ರಾಮಿಂಗ್ ಭಾಷೆ / Kannada programming language v0.1.0");
    println!("End a program with 'ಮುಗಿಯಿರಿ'; type 'exit' to quit");
    println!();

    let mut unit = String::new();

    loop {
        if unit.is_empty() {
            print!("> ");
        } else {
            print!(". ");
        }
        io::stdout().flush().unwrap();

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                if unit.is_empty() && (trimmed == "exit" || trimmed == "quit") {
                    println!("Goodbye!");
                    break;
                }
                if unit.is_empty() && trimmed.is_empty() {
                    continue;
                }

                unit.push_str(&line);
                if unit_is_complete(&unit) {
                    run_unit(&unit);
                    unit.clear();
                }
            }
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        }
    }
}

/// The end keyword also terminates block bodies, so a unit is only complete
/// once one more end keyword has arrived than there are ':'-opened blocks.
fn unit_is_complete(unit: &str) -> bool {
    let tokens = Lexer::new(unit).scan_tokens();
    let ends = tokens
        .iter()
        .filter(|t| t.token_type == TokenType::End)
        .count();
    let colons = tokens
        .iter()
        .filter(|t| t.token_type == TokenType::Colon)
        .count();
    ends > colons
}

fn run_unit(source: &str) {
    let mut input = StdinChannel;
    let outcome = runner::run(source, &mut input);
    if let Some(error) = &outcome.error {
        error.report(source, None);
    }
    println!("{}", outcome.text);
}
