mod cursor;
mod token;
mod token_kind;

use crate::block_string::dedent_block_string_value;
use crate::FileId;
use crate::LimitTracker;
use crate::SourceFile;
use crate::SourceSpan;
use crate::SyntaxError;
use cursor::Cursor;
use std::sync::Arc;

pub use token::Token;
pub use token_kind::TokenKind;

/// Turns source text into tokens.
///
/// The token list retains comment tokens for tooling; a final `Eof` token
/// marks the end of input. Lexical errors are fatal.
pub(crate) struct Lexer<'a> {
    cursor: Cursor<'a>,
    source: &'a Arc<SourceFile>,
    file_id: FileId,
    token_limit: Option<LimitTracker>,
}

/// Tokenize a standalone piece of GraphQL source text.
pub fn lex(
    source_text: impl Into<String>,
    path: impl Into<std::path::PathBuf>,
) -> Result<Vec<Token>, SyntaxError> {
    let source = Arc::new(SourceFile::new(path.into(), source_text.into()));
    Lexer::new(source.source_text(), &source, FileId::new(), None).lex()
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(
        text: &'a str,
        source: &'a Arc<SourceFile>,
        file_id: FileId,
        token_limit: Option<usize>,
    ) -> Self {
        Self {
            cursor: Cursor::new(text),
            source,
            file_id,
            token_limit: token_limit.map(LimitTracker::new),
        }
    }

    pub(crate) fn lex(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.advance()?;
            if let Some(limits) = &mut self.token_limit {
                if limits.check_and_increment() {
                    let limit = limits.limit;
                    return Err(self.error_at(
                        format!("token limit reached, aborting lexing at {} tokens", limit),
                        token.span.offset(),
                        token.span.end_offset(),
                    ));
                }
            }
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn span(&self, start: usize) -> SourceSpan {
        SourceSpan::new(self.file_id, start, self.cursor.offset())
    }

    fn error_at(&self, message: impl Into<String>, start: usize, end: usize) -> SyntaxError {
        SyntaxError::new(message, self.source, SourceSpan::new(self.file_id, start, end))
    }

    fn error(&self, message: impl Into<String>, start: usize) -> SyntaxError {
        self.error_at(message, start, self.cursor.offset())
    }

    /// Scan the next token, skipping ignored characters.
    fn advance(&mut self) -> Result<Token, SyntaxError> {
        loop {
            let start = self.cursor.offset();
            let Some(c) = self.cursor.bump() else {
                return Ok(Token::new(TokenKind::Eof, "", self.span(start)));
            };
            let kind = match c {
                // Ignored: BOM, whitespace, line terminators, commas
                '\u{FEFF}' | ' ' | '\t' | '\n' | '\r' | ',' => continue,
                '#' => return self.comment(start),
                '"' => return self.string_value(start),
                '.' => return self.spread_operator(start),
                '-' => return self.number(start, c),
                c if c.is_ascii_digit() => return self.number(start, c),
                c if is_name_start(c) => return self.name(start),
                '!' => TokenKind::Bang,
                '$' => TokenKind::Dollar,
                '&' => TokenKind::Amp,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                ':' => TokenKind::Colon,
                '=' => TokenKind::Eq,
                '@' => TokenKind::At,
                '[' => TokenKind::LBracket,
                ']' => TokenKind::RBracket,
                '{' => TokenKind::LCurly,
                '|' => TokenKind::Pipe,
                '}' => TokenKind::RCurly,
                c => return Err(self.error(format!("unexpected character {c:?}"), start)),
            };
            let span = self.span(start);
            return Ok(Token::new(kind, self.cursor.slice(start, span.end_offset()), span));
        }
    }

    fn comment(&mut self, start: usize) -> Result<Token, SyntaxError> {
        while let Some(c) = self.cursor.first() {
            if is_line_terminator(c) {
                break;
            }
            self.cursor.bump();
        }
        let text = self.cursor.slice(start + 1, self.cursor.offset());
        Ok(Token::new(TokenKind::Comment, text, self.span(start)))
    }

    fn spread_operator(&mut self, start: usize) -> Result<Token, SyntaxError> {
        if self.cursor.eat('.') && self.cursor.eat('.') {
            Ok(Token::new(TokenKind::Spread, "...", self.span(start)))
        } else {
            Err(self.error("unterminated spread operator, expected \"...\"", start))
        }
    }

    fn name(&mut self, start: usize) -> Result<Token, SyntaxError> {
        while let Some(c) = self.cursor.first() {
            if is_name_continue(c) {
                self.cursor.bump();
            } else {
                break;
            }
        }
        let text = self.cursor.slice(start, self.cursor.offset());
        Ok(Token::new(TokenKind::Name, text, self.span(start)))
    }

    fn number(&mut self, start: usize, first: char) -> Result<Token, SyntaxError> {
        let mut is_float = false;
        if first == '-' {
            match self.cursor.bump() {
                Some(c) if c.is_ascii_digit() => self.integer_part(start, c)?,
                c => {
                    return Err(self.error(
                        format!("unexpected character {} in number", describe(c)),
                        start,
                    ))
                }
            }
        } else {
            self.integer_part(start, first)?;
        }
        if self.cursor.first() == Some('.') && self.cursor.second().is_some_and(|c| c.is_ascii_digit())
        {
            is_float = true;
            self.cursor.bump();
            self.digits(start)?;
        }
        if matches!(self.cursor.first(), Some('e' | 'E')) {
            is_float = true;
            self.cursor.bump();
            if matches!(self.cursor.first(), Some('+' | '-')) {
                self.cursor.bump();
            }
            self.digits(start)?;
        }
        // An Int or Float must not be immediately followed by a name start,
        // a digit, or a dot: `0xF1`, `1.23.4` and `1.2e3.4` are errors.
        if let Some(c) = self.cursor.first() {
            if is_name_start(c) || c == '.' || c.is_ascii_digit() {
                return Err(self.error(
                    format!("unexpected character {c:?} after a number, expected a digit"),
                    start,
                ));
            }
        }
        let text = self.cursor.slice(start, self.cursor.offset());
        let kind = if is_float {
            TokenKind::Float
        } else {
            TokenKind::Int
        };
        Ok(Token::new(kind, text, self.span(start)))
    }

    fn integer_part(&mut self, start: usize, first_digit: char) -> Result<(), SyntaxError> {
        if first_digit == '0' {
            if let Some(c) = self.cursor.first() {
                if c.is_ascii_digit() {
                    return Err(
                        self.error(format!("unexpected digit {c:?} after a leading zero"), start)
                    );
                }
            }
            return Ok(());
        }
        while self.cursor.first().is_some_and(|c| c.is_ascii_digit()) {
            self.cursor.bump();
        }
        Ok(())
    }

    fn digits(&mut self, start: usize) -> Result<(), SyntaxError> {
        match self.cursor.first() {
            Some(c) if c.is_ascii_digit() => {
                while self.cursor.first().is_some_and(|c| c.is_ascii_digit()) {
                    self.cursor.bump();
                }
                Ok(())
            }
            c => Err(self.error(
                format!("expected a digit in number, found {}", describe(c)),
                start,
            )),
        }
    }

    fn string_value(&mut self, start: usize) -> Result<Token, SyntaxError> {
        if self.cursor.eat('"') {
            if self.cursor.eat('"') {
                return self.block_string(start);
            }
            // The empty string `""`
            return Ok(Token::new(TokenKind::StringValue, "", self.span(start)));
        }
        let mut value = String::new();
        loop {
            let char_start = self.cursor.offset();
            match self.cursor.bump() {
                None => return Err(self.error("unterminated string", start)),
                Some(c) if is_line_terminator(c) => {
                    return Err(self.error("unterminated string", start))
                }
                Some('"') => break,
                Some('\\') => value.push(self.escaped_character(char_start)?),
                Some(c) if (c as u32) < 0x20 && c != '\t' => {
                    return Err(
                        self.error_at(format!("invalid character {c:?} within a string"), char_start, self.cursor.offset())
                    )
                }
                Some(c) => value.push(c),
            }
        }
        Ok(Token::new(TokenKind::StringValue, value, self.span(start)))
    }

    fn escaped_character(&mut self, escape_start: usize) -> Result<char, SyntaxError> {
        let c = match self.cursor.bump() {
            Some('"') => '"',
            Some('\\') => '\\',
            Some('/') => '/',
            Some('b') => '\u{0008}',
            Some('f') => '\u{000C}',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('u') => return self.unicode_escape(escape_start),
            c => {
                return Err(self.error_at(
                    format!("invalid escape sequence \"\\{}\"", describe_plain(c)),
                    escape_start,
                    self.cursor.offset(),
                ))
            }
        };
        Ok(c)
    }

    fn unicode_escape(&mut self, escape_start: usize) -> Result<char, SyntaxError> {
        let first = self.hex_code_unit(escape_start)?;
        let code_point = if (0xD800..=0xDBFF).contains(&first) {
            // High surrogate: a `\uXXXX` low surrogate must follow,
            // and the pair combines into one code point.
            if !(self.cursor.eat('\\') && self.cursor.eat('u')) {
                return Err(self.error_at(
                    "invalid unicode escape sequence: unpaired surrogate",
                    escape_start,
                    self.cursor.offset(),
                ));
            }
            let second = self.hex_code_unit(escape_start)?;
            if !(0xDC00..=0xDFFF).contains(&second) {
                return Err(self.error_at(
                    "invalid unicode escape sequence: unpaired surrogate",
                    escape_start,
                    self.cursor.offset(),
                ));
            }
            0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00)
        } else {
            first
        };
        char::from_u32(code_point).ok_or_else(|| {
            self.error_at(
                "invalid unicode escape sequence",
                escape_start,
                self.cursor.offset(),
            )
        })
    }

    fn hex_code_unit(&mut self, escape_start: usize) -> Result<u32, SyntaxError> {
        let mut value = 0;
        for _ in 0..4 {
            match self.cursor.bump().and_then(|c| c.to_digit(16)) {
                Some(digit) => value = value * 16 + digit,
                None => {
                    return Err(self.error_at(
                        "invalid unicode escape sequence, expected 4 hexadecimal digits",
                        escape_start,
                        self.cursor.offset(),
                    ))
                }
            }
        }
        Ok(value)
    }

    fn block_string(&mut self, start: usize) -> Result<Token, SyntaxError> {
        let mut raw = String::new();
        loop {
            match self.cursor.bump() {
                None => return Err(self.error("unterminated block string", start)),
                Some('"') => {
                    if self.cursor.eat('"') {
                        if self.cursor.eat('"') {
                            break;
                        }
                        raw.push_str("\"\"");
                    } else {
                        raw.push('"');
                    }
                }
                Some('\\') => {
                    // The only escape in block strings is `\"""`
                    if self.cursor.first() == Some('"')
                        && self.cursor.second() == Some('"')
                        && {
                            let mut look = self.cursor.clone();
                            look.bump();
                            look.bump();
                            look.first() == Some('"')
                        }
                    {
                        self.cursor.bump();
                        self.cursor.bump();
                        self.cursor.bump();
                        raw.push_str("\"\"\"");
                    } else {
                        raw.push('\\');
                    }
                }
                Some(c) => raw.push(c),
            }
        }
        Ok(Token::new(
            TokenKind::BlockString,
            dedent_block_string_value(&raw),
            self.span(start),
        ))
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r')
}

fn describe(c: Option<char>) -> String {
    match c {
        Some(c) => format!("{c:?}"),
        None => "end of input".to_owned(),
    }
}

fn describe_plain(c: Option<char>) -> String {
    match c {
        Some(c) => c.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        lex(input, "test.graphql")
            .unwrap()
            .into_iter()
            .map(|token| token.kind())
            .collect()
    }

    fn single(input: &str) -> Token {
        let tokens = lex(input, "test.graphql").unwrap();
        assert_eq!(tokens.len(), 2, "{tokens:?}");
        assert_eq!(tokens[1].kind(), TokenKind::Eof);
        tokens.into_iter().next().unwrap()
    }

    fn error(input: &str) -> SyntaxError {
        lex(input, "test.graphql").unwrap_err()
    }

    #[test]
    fn punctuators() {
        use TokenKind::*;
        assert_eq!(
            kinds("! $ & ( ) ... : = @ [ ] { | }"),
            vec![
                Bang, Dollar, Amp, LParen, RParen, Spread, Colon, Eq, At, LBracket, RBracket,
                LCurly, Pipe, RCurly, Eof
            ]
        );
    }

    #[test]
    fn ignores_bom_whitespace_and_commas() {
        assert_eq!(
            kinds("\u{FEFF} , a\t,\r\n b ,"),
            vec![TokenKind::Name, TokenKind::Name, TokenKind::Eof]
        );
    }

    #[test]
    fn comments_are_retained() {
        let tokens = lex("a # a comment\nb", "test.graphql").unwrap();
        assert_eq!(tokens[1].kind(), TokenKind::Comment);
        assert_eq!(tokens[1].data(), " a comment");
        assert_eq!(tokens[2].data(), "b");
    }

    #[test]
    fn numbers() {
        assert_eq!(single("4").kind(), TokenKind::Int);
        assert_eq!(single("-4").kind(), TokenKind::Int);
        assert_eq!(single("0").kind(), TokenKind::Int);
        assert_eq!(single("4.123").kind(), TokenKind::Float);
        assert_eq!(single("-4.123e-2").kind(), TokenKind::Float);
        assert_eq!(single("4e2").kind(), TokenKind::Float);
        assert_eq!(single("123E4").kind(), TokenKind::Float);
    }

    #[test]
    fn number_errors() {
        assert!(error("01").message().contains("leading zero"));
        assert!(error("1.").message().contains("digit"));
        assert!(error("1.2e").message().contains("digit"));
        assert!(error("1.2.3").message().contains("after a number"));
        assert!(error("0xF1").message().contains("after a number"));
        assert!(error("-").message().contains("number"));
    }

    #[test]
    fn strings_decode_escapes() {
        assert_eq!(single(r#""simple""#).data(), "simple");
        assert_eq!(single(r#""""#).data(), "");
        assert_eq!(
            single(r#""escaped \n\r\b\t\f\/\\\"""#).data(),
            "escaped \n\r\u{0008}\t\u{000C}/\\\""
        );
        assert_eq!(single(r#""unicode \u00e9""#).data(), "unicode é");
        assert_eq!(single(r#""surrogate \uD83D\uDE00""#).data(), "surrogate 😀");
    }

    #[test]
    fn string_errors() {
        assert!(error("\"unterminated").message().contains("unterminated"));
        assert!(error("\"newline\nin string\"")
            .message()
            .contains("unterminated"));
        assert!(error(r#""bad \x escape""#).message().contains("escape"));
        assert!(error(r#""lone \uD83D surrogate""#)
            .message()
            .contains("surrogate"));
    }

    #[test]
    fn block_strings_dedent() {
        let token = single("\"\"\"\n    block\n      string\n\"\"\"");
        assert_eq!(token.kind(), TokenKind::BlockString);
        assert_eq!(token.data(), "block\n  string");
    }

    #[test]
    fn block_string_escape() {
        assert_eq!(single(r#""""esc \""" aped""""#).data(), "esc \"\"\" aped");
    }

    #[test]
    fn spans_track_offsets() {
        let tokens = lex("a bc", "test.graphql").unwrap();
        assert_eq!(
            (tokens[0].span().offset(), tokens[0].span().end_offset()),
            (0, 1)
        );
        assert_eq!(
            (tokens[1].span().offset(), tokens[1].span().end_offset()),
            (2, 4)
        );
    }

    #[test]
    fn block_string_round_trip() {
        for value in ["", "a", "multi\nline", "with \"quotes\"", "tab\tindent"] {
            let printed = crate::block_string::print_block_string(value);
            let token = single(&printed);
            assert_eq!(token.data(), value, "printed: {printed}");
        }
    }
}
