use crate::error::KnlError;
use crate::evaluator::Evaluator;
use crate::input::InputChannel;
use crate::lexer::Lexer;
use crate::parser::Parser;

pub const ERROR_PREFIX: &str = "ದೋಷ/Error";
pub const SUCCESS_TRAILER: &str = "ಯಶಸ್ವಿಯಾಗಿ ಕಾರ್ಯಗತಗೊಂಡಿದೆ/Successfully executed";

/// What one pipeline run hands back to the host: always a single result
/// string, plus the structured diagnostic for hosts that can render one.
pub struct RunOutcome {
    pub text: String,
    pub error: Option<KnlError>,
}

impl RunOutcome {
    fn success(text: String) -> Self {
        Self { text, error: None }
    }

    fn failure(error: KnlError) -> Self {
        Self {
            text: format!("{}: {}", ERROR_PREFIX, error.message),
            error: Some(error),
        }
    }
}

/// Run one translation unit: lex, parse, evaluate, with fresh interpreter
/// state. Lexical diagnostics are non-fatal and surface as leading output
/// lines; a parse or runtime failure yields the error text alone.
pub fn run(source: &str, input: &mut dyn InputChannel) -> RunOutcome {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.scan_tokens();
    let mut lines: Vec<String> = lexer
        .take_diagnostics()
        .into_iter()
        .map(|diagnostic| diagnostic.message)
        .collect();

    let program = match Parser::new(tokens).parse() {
        Ok(program) => program,
        Err(error) => return RunOutcome::failure(error),
    };

    let mut evaluator = Evaluator::new(input);
    match evaluator.run(&program) {
        Ok(()) => {
            lines.extend(evaluator.take_output());
            let body = lines.join("\n");
            RunOutcome::success(format!("{}\n{}", body.trim(), SUCCESS_TRAILER))
        }
        Err(error) => RunOutcome::failure(error),
    }
}
