use std::collections::VecDeque;
use std::io::{self, Write};

/// One-line-at-a-time input capability the host lends to the evaluator.
/// The prompt travels with the request; how (and whether) it is displayed
/// is the channel's business.
pub trait InputChannel {
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;
}

/// Terminal-backed channel: prints the prompt and reads one line from stdin.
pub struct StdinChannel;

impl InputChannel for StdinChannel {
    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        print!("{}", prompt);
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }
}

/// Pre-seeded channel for hosts and tests that supply input up front.
#[derive(Debug, Default)]
pub struct QueuedInput {
    lines: VecDeque<String>,
}

impl QueuedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl InputChannel for QueuedInput {
    fn read_line(&mut self, _prompt: &str) -> io::Result<String> {
        self.lines.pop_front().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input requested but none supplied",
            )
        })
    }
}
