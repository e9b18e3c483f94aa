use crate::error::{KnlError, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    // Single-character tokens
    LeftParen,
    RightParen,
    Comma,
    Colon,
    Plus,
    Minus,
    Star,
    Slash,

    // One or two character tokens
    Assign,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Literals
    Number,
    Str,
    Identifier,
    True,
    False,

    // Keywords
    Start,
    End,
    Print,
    Input,
    If,
    Elif,
    Else,
    While,
    For,
    In,
    Range,
    Def,
    Return,
    Break,
    Continue,
    Pass,
    Try,
    Except,
    Finally,
    Class,
    Import,
    From,
    As,
    Global,
    Nonlocal,

    // Structural
    Newline,
    Eof,
}

/// Keyword spellings, tried in this order at every token start before the
/// identifier rule. A spelling whose prefix is another keyword must come
/// first (ಇಲ್ಲದಿದ್ದರೆನಂತರ before ಇಲ್ಲದಿದ್ದರೆ), or the shorter one would
/// always win.
const KEYWORDS: &[(&str, TokenType)] = &[
    ("ಪ್ರಾರಂಭಿಸಿ", TokenType::Start),
    ("ಮುಗಿಯಿರಿ", TokenType::End),
    ("ಮುದ್ರಿಸಿ", TokenType::Print),
    ("ಮುದ್ರಣ", TokenType::Print),
    ("ಇಲ್ಲದಿದ್ದರೆನಂತರ", TokenType::Elif),
    ("ಇಲ್ಲದಿದ್ದರೆ", TokenType::Else),
    ("ನಂತರ", TokenType::If),
    ("ಯಾವಾಗ", TokenType::While),
    ("ನಿಮಿತ್ತ", TokenType::For),
    ("ಒಳಗೆ", TokenType::In),
    ("ವ್ಯಾಪ್ತಿ", TokenType::Range),
    ("ನಿರ್ಧರಿಸು", TokenType::Def),
    ("ಕಾರ್ಯ", TokenType::Def),
    ("ಹಿಂತಿರುಗಿಸು", TokenType::Return),
    ("ಮುರಿದುಬಿಡು", TokenType::Break),
    ("ಮುಂದುವರಿಸು", TokenType::Continue),
    ("ಹೋದರೂ", TokenType::Pass),
    ("ಪ್ರಯತ್ನಿಸು", TokenType::Try),
    ("ಹೊರಹಾಕು", TokenType::Except),
    ("ಕೊನೆಗೂ", TokenType::Finally),
    ("ವರ್ಗ", TokenType::Class),
    ("ಆಮದು", TokenType::Import),
    ("ಇಂದ", TokenType::From),
    ("ಆಗು", TokenType::Input),
    ("ಆಗಿ", TokenType::As),
    ("ಜಾಗತಿಕ", TokenType::Global),
    ("ಸ್ಥಳೀಯವಲ್ಲದ", TokenType::Nonlocal),
    ("true", TokenType::True),
    ("false", TokenType::False),
];

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, span: Span) -> Self {
        Self {
            token_type,
            lexeme,
            span,
        }
    }

    /// Printable name for diagnostics, where the raw lexeme would be unreadable.
    pub fn describe(&self) -> String {
        match self.token_type {
            TokenType::Newline => "newline".to_string(),
            TokenType::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.lexeme),
        }
    }
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    diagnostics: Vec<KnlError>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            diagnostics: Vec::new(),
        }
    }

    /// Scan the whole source. Lexing never aborts: unrecognized input is
    /// reported as a diagnostic, one character is skipped, and scanning
    /// continues. The token stream always ends with an Eof token.
    pub fn scan_tokens(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.pos += 1;
                }
                '\n' => tokens.push(self.newline_run()),
                '(' => tokens.push(self.single(TokenType::LeftParen)),
                ')' => tokens.push(self.single(TokenType::RightParen)),
                ',' => tokens.push(self.single(TokenType::Comma)),
                ':' => tokens.push(self.single(TokenType::Colon)),
                '+' => tokens.push(self.single(TokenType::Plus)),
                '-' => tokens.push(self.single(TokenType::Minus)),
                '*' => tokens.push(self.single(TokenType::Star)),
                '/' => tokens.push(self.single(TokenType::Slash)),
                '=' => tokens.push(self.one_or_two('=', TokenType::Equal, TokenType::Assign)),
                '<' => tokens.push(self.one_or_two('=', TokenType::LessEqual, TokenType::Less)),
                '>' => {
                    tokens.push(self.one_or_two('=', TokenType::GreaterEqual, TokenType::Greater))
                }
                '!' => {
                    if self.peek_at(1) == Some('=') {
                        tokens.push(self.two_chars(TokenType::NotEqual));
                    } else {
                        self.illegal_character('!');
                    }
                }
                '"' | '\'' => {
                    if let Some(token) = self.string(c) {
                        tokens.push(token);
                    }
                }
                c if c.is_ascii_digit() => {
                    if let Some(token) = self.number() {
                        tokens.push(token);
                    }
                }
                _ => {
                    if let Some(token) = self.keyword() {
                        tokens.push(token);
                    } else if is_identifier_start(c) {
                        tokens.push(self.identifier());
                    } else {
                        self.illegal_character(c);
                    }
                }
            }
        }

        tokens.push(Token::new(
            TokenType::Eof,
            String::new(),
            Span::single(self.pos),
        ));
        tokens
    }

    /// Non-fatal diagnostics accumulated during the scan, in source order.
    pub fn take_diagnostics(&mut self) -> Vec<KnlError> {
        std::mem::take(&mut self.diagnostics)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn single(&mut self, token_type: TokenType) -> Token {
        let start = self.pos;
        let lexeme = self.chars[start].to_string();
        self.pos += 1;
        Token::new(token_type, lexeme, Span::single(start))
    }

    fn two_chars(&mut self, token_type: TokenType) -> Token {
        let start = self.pos;
        let lexeme: String = self.chars[start..start + 2].iter().collect();
        self.pos += 2;
        Token::new(token_type, lexeme, Span::new(start, start + 2))
    }

    fn one_or_two(&mut self, second: char, long: TokenType, short: TokenType) -> Token {
        if self.peek_at(1) == Some(second) {
            self.two_chars(long)
        } else {
            self.single(short)
        }
    }

    /// Consecutive newlines collapse into a single token. The line counter
    /// only feeds diagnostics.
    fn newline_run(&mut self) -> Token {
        let start = self.pos;
        while self.peek() == Some('\n') {
            self.pos += 1;
            self.line += 1;
        }
        Token::new(
            TokenType::Newline,
            "\n".to_string(),
            Span::new(start, self.pos),
        )
    }

    fn keyword(&mut self) -> Option<Token> {
        for (spelling, token_type) in KEYWORDS {
            if self.rest_starts_with(spelling) {
                let start = self.pos;
                let len = spelling.chars().count();
                self.pos += len;
                return Some(Token::new(
                    *token_type,
                    (*spelling).to_string(),
                    Span::new(start, start + len),
                ));
            }
        }
        None
    }

    fn rest_starts_with(&self, spelling: &str) -> bool {
        let mut pos = self.pos;
        for expected in spelling.chars() {
            if self.chars.get(pos) != Some(&expected) {
                return false;
            }
            pos += 1;
        }
        true
    }

    fn identifier(&mut self) -> Token {
        let start = self.pos;
        self.pos += 1;
        while self.peek().map_or(false, is_identifier_continue) {
            self.pos += 1;
        }
        let lexeme: String = self.chars[start..self.pos].iter().collect();
        Token::new(
            TokenType::Identifier,
            lexeme,
            Span::new(start, self.pos),
        )
    }

    fn number(&mut self) -> Option<Token> {
        let start = self.pos;
        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let lexeme: String = self.chars[start..self.pos].iter().collect();

        if lexeme.parse::<i64>().is_err() {
            self.diagnostics.push(KnlError::lex_error(
                Span::new(start, self.pos),
                format!("Number literal out of range: '{}'", lexeme),
            ));
            return None;
        }
        Some(Token::new(
            TokenType::Number,
            lexeme,
            Span::new(start, self.pos),
        ))
    }

    /// Non-greedy string scan: the first unescaped matching quote closes the
    /// literal. An unclosed quote is reported as an illegal character and
    /// exactly the quote is skipped, so the rest of the input still lexes.
    fn string(&mut self, quote: char) -> Option<Token> {
        let start = self.pos;
        let mut value = String::new();
        let mut pos = self.pos + 1;
        let mut lines_crossed = 0;

        while let Some(c) = self.chars.get(pos).copied() {
            if c == quote {
                self.pos = pos + 1;
                self.line += lines_crossed;
                return Some(Token::new(
                    TokenType::Str,
                    value,
                    Span::new(start, self.pos),
                ));
            }
            if c == '\\' {
                pos += 1;
                let escaped = self.chars.get(pos).copied();
                match escaped {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(other) => value.push(other),
                    None => break,
                }
            } else {
                if c == '\n' {
                    lines_crossed += 1;
                }
                value.push(c);
            }
            pos += 1;
        }

        self.illegal_character(quote);
        None
    }

    fn illegal_character(&mut self, c: char) {
        self.diagnostics.push(KnlError::lex_error(
            Span::single(self.pos),
            format!("ಅಮಾನ್ಯ ಅಕ್ಷರ/Illegal character '{}' (line {})", c, self.line),
        ));
        self.pos += 1;
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || is_kannada(c)
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || is_kannada(c)
}

/// The Kannada Unicode block, U+0C80 through U+0CFF.
fn is_kannada(c: char) -> bool {
    ('\u{0C80}'..='\u{0CFF}').contains(&c)
}
