use std::io::Read;

use lazy_static::lazy_static;
use log::trace;
use regex::Regex;

use crate::{error::WireError, utils::lex_error};

lazy_static! {
    /// `# <line> "<file>" <flags>`, as written by cpp.
    static ref LINE_MARKER: Regex = Regex::new(r#"^#\s*(\d+)\s+"([^"]*)"((?:\s+\d+)*)\s*$"#).unwrap();
}

const FLAG_ENTER: u32 = 1;
const FLAG_RETURN: u32 = 2;
const FLAG_SYSTEM: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Word(String),
    DoubleQuoted(String),
    SingleQuoted(String),
    Integer(i64),
    Float(f64),
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    Equals,
    Colon,
    IncludeEnter(String),
    IncludeExit,
    Eof,
}

impl TokenKind {
    /// How the token kind reads in an "expected ..., got ..." diagnostic.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Word(_)         => "identifier",
            TokenKind::DoubleQuoted(_) => "double-quoted string",
            TokenKind::SingleQuoted(_) => "single-quoted string",
            TokenKind::Integer(_)      => "integer",
            TokenKind::Float(_)        => "float",
            TokenKind::OpenParen       => "'('",
            TokenKind::CloseParen      => "')'",
            TokenKind::OpenBrace       => "'{'",
            TokenKind::CloseBrace      => "'}'",
            TokenKind::Equals          => "'='",
            TokenKind::Colon           => "':'",
            TokenKind::IncludeEnter(_) => "start of include",
            TokenKind::IncludeExit     => "end of include",
            TokenKind::Eof             => "end of input",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind:   TokenKind,
    pub file:   String,
    pub line:   usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    Double,
    Single,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Space,
    Word,
    Quoted(Quote),
    Escape(Quote),
    Integer,
    Float,
    LineMarker,
}

/// Tokenize schema text. `filename` is recorded in every token until a line
/// marker says otherwise, and is what the marker preamble is matched against.
pub fn tokenize_str(text: &str, filename: &str) -> Result<Vec<Token>, WireError> {
    let tokens = Lexer::new(text, filename).run()?;
    trace!("{}: {} tokens", filename, tokens.len());
    Ok(tokens)
}

pub fn tokenize_reader<R: Read>(mut reader: R, filename: &str) -> Result<Vec<Token>, WireError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    tokenize_str(&text, filename)
}

struct Lexer<'a> {
    chars:         Vec<char>,
    pos:           usize,
    input_name:    &'a str,
    file:          String,
    line:          usize,
    column:        usize,
    state:         State,
    scratch:       String,
    start_line:    usize,
    start_column:  usize,
    past_preamble: bool,
    system_depth:  usize,
    tokens:        Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(text: &str, input_name: &'a str) -> Lexer<'a> {
        Lexer {
            chars:         text.chars().collect(),
            pos:           0,
            input_name,
            file:          input_name.to_owned(),
            line:          1,
            column:        0,
            state:         State::Space,
            scratch:       String::new(),
            start_line:    1,
            start_column:  0,
            past_preamble: false,
            system_depth:  0,
            tokens:        Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, WireError> {
        loop {
            let c = self.chars.get(self.pos).copied();
            self.pos += 1;

            if c == Some('\n') {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }

            self.step(c)?;

            if c.is_none() {
                break;
            }
        }

        self.tokens.push(Token {
            kind:   TokenKind::Eof,
            file:   self.file.clone(),
            line:   self.line,
            column: self.column,
        });
        Ok(self.tokens)
    }

    fn step(&mut self, c: Option<char>) -> Result<(), WireError> {
        match self.state {
            State::Space => match c {
                Some(c) if c.is_ascii_digit() => self.begin(c, State::Integer),
                Some('.') => self.begin('.', State::Float),
                Some(c) if c.is_ascii_alphabetic() => self.begin(c, State::Word),
                Some('"') => self.begin_quoted(Quote::Double),
                Some('\'') => self.begin_quoted(Quote::Single),
                Some('#') => self.begin('#', State::LineMarker),
                Some('(') => self.punctuation(TokenKind::OpenParen),
                Some(')') => self.punctuation(TokenKind::CloseParen),
                Some('{') => self.punctuation(TokenKind::OpenBrace),
                Some('}') => self.punctuation(TokenKind::CloseBrace),
                Some('=') => self.punctuation(TokenKind::Equals),
                Some(':') => self.punctuation(TokenKind::Colon),
                Some(c) if !c.is_whitespace() => {
                    return Err(lex_error(
                        &format!("unexpected character '{}' (ascii {})", c, c as u32),
                        self.line,
                        self.column,
                    ));
                }
                _ => {}
            },

            State::Word => match c {
                Some(c) if c.is_ascii_alphanumeric() || c == '_' => self.scratch.push(c),
                _ => {
                    let word = std::mem::take(&mut self.scratch);
                    self.finish(TokenKind::Word(word));
                    self.unread(c);
                }
            },

            State::Quoted(quote) => match c {
                None => return Err(self.error_at_start("unterminated string")),
                Some('\\') => self.state = State::Escape(quote),
                Some('"') if quote == Quote::Double => {
                    let text = std::mem::take(&mut self.scratch);
                    self.finish(TokenKind::DoubleQuoted(text));
                }
                Some('\'') if quote == Quote::Single => {
                    let text = std::mem::take(&mut self.scratch);
                    self.finish(TokenKind::SingleQuoted(text));
                }
                Some(c) => self.scratch.push(c),
            },

            State::Escape(quote) => match c {
                None => return Err(self.error_at_start("unterminated string")),
                Some(c) => {
                    self.scratch.push(match c {
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        other => other,
                    });
                    self.state = State::Quoted(quote);
                }
            },

            State::Integer => match c {
                Some(c) if c == '.' || (matches!(c, 'e' | 'E') && !self.is_hex()) => {
                    self.scratch.push(c);
                    self.state = State::Float;
                }
                Some(c) if c.is_ascii_hexdigit() || c == 'x' || c == 'X' => self.scratch.push(c),
                Some(c) if c.is_ascii_alphabetic() => {
                    return Err(self.error_at_start("badly formatted number"));
                }
                _ => {
                    let value = parse_integer(&self.scratch)
                        .ok_or_else(|| self.error_at_start("badly formatted number"))?;
                    self.scratch.clear();
                    self.finish(TokenKind::Integer(value));
                    self.unread(c);
                }
            },

            State::Float => match c {
                Some(c) if c.is_ascii_digit() || c == 'e' || c == 'E' => self.scratch.push(c),
                Some(c) if (c == '+' || c == '-') && self.scratch.ends_with(['e', 'E']) => {
                    self.scratch.push(c)
                }
                Some(c) if c.is_ascii_alphabetic() || c == '.' => {
                    return Err(self.error_at_start("badly formatted number"));
                }
                _ => {
                    let value = self
                        .scratch
                        .parse::<f64>()
                        .map_err(|_| self.error_at_start("badly formatted number"))?;
                    self.scratch.clear();
                    self.finish(TokenKind::Float(value));
                    self.unread(c);
                }
            },

            State::LineMarker => match c {
                None | Some('\n') => {
                    self.line_marker()?;
                    self.scratch.clear();
                    self.state = State::Space;
                }
                Some(c) => self.scratch.push(c),
            },
        }
        Ok(())
    }

    fn begin(&mut self, c: char, state: State) {
        self.scratch.clear();
        self.scratch.push(c);
        self.start_line = self.line;
        self.start_column = self.column;
        self.state = state;
    }

    fn begin_quoted(&mut self, quote: Quote) {
        self.scratch.clear();
        self.start_line = self.line;
        self.start_column = self.column;
        self.state = State::Quoted(quote);
    }

    fn punctuation(&mut self, kind: TokenKind) {
        self.tokens.push(Token {
            kind,
            file:   self.file.clone(),
            line:   self.line,
            column: self.column,
        });
    }

    /// Emit a token positioned at the start of the current lexeme.
    fn finish(&mut self, kind: TokenKind) {
        self.tokens.push(Token {
            kind,
            file:   self.file.clone(),
            line:   self.start_line,
            column: self.start_column,
        });
        self.state = State::Space;
    }

    /// Push back the character that ended a lexeme, unless it is whitespace
    /// (already accounted for) or end of input.
    fn unread(&mut self, c: Option<char>) {
        if let Some(c) = c {
            if !c.is_whitespace() {
                self.pos -= 1;
                self.column -= 1;
            }
        }
    }

    fn is_hex(&self) -> bool {
        self.scratch.starts_with("0x") || self.scratch.starts_with("0X")
    }

    fn error_at_start(&self, msg: &str) -> WireError {
        lex_error(msg, self.start_line, self.start_column)
    }

    fn line_marker(&mut self) -> Result<(), WireError> {
        let caps = LINE_MARKER
            .captures(&self.scratch)
            .ok_or_else(|| self.error_at_start("malformed line marker"))?;
        let line: usize = caps[1]
            .parse()
            .map_err(|_| self.error_at_start("malformed line marker"))?;
        let file = caps[2].to_owned();
        let flags: Vec<u32> = caps[3]
            .split_whitespace()
            .filter_map(|flag| flag.parse().ok())
            .collect();

        if !self.past_preamble {
            self.past_preamble = line == 1 && file == self.input_name;
        } else if flags.contains(&FLAG_ENTER) {
            if flags.contains(&FLAG_SYSTEM) {
                self.system_depth += 1;
            } else {
                let kind = TokenKind::IncludeEnter(file.clone());
                self.finish(kind);
            }
        } else if flags.contains(&FLAG_RETURN) {
            if self.system_depth > 0 {
                self.system_depth -= 1;
            } else {
                self.finish(TokenKind::IncludeExit);
            }
        }

        self.file = file;
        // The marker describes the line after it.
        self.line = line;
        self.column = 0;
        Ok(())
    }
}

/// Integer conversion with base detection: `0x`/`0X` is hexadecimal, a
/// leading `0` octal, anything else decimal. The whole text must convert.
fn parse_integer(text: &str) -> Option<i64> {
    let (digits, radix) = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        (hex, 16)
    } else if text.len() > 1 && text.starts_with('0') {
        (&text[1..], 8)
    } else {
        (text, 10)
    };
    i64::from_str_radix(digits, radix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize_str(text, "<string>")
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    fn positions(text: &str) -> Vec<(usize, usize)> {
        tokenize_str(text, "<string>")
            .unwrap()
            .into_iter()
            .map(|token| (token.line, token.column))
            .collect()
    }

    fn error(text: &str) -> String {
        tokenize_str(text, "<string>").unwrap_err().to_string()
    }

    #[test]
    fn single_word() {
        let tokens = tokenize_str("Test1a", "<string>").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token { kind: TokenKind::Word("Test1a".into()), file: "<string>".into(), line: 1, column: 1 },
                Token { kind: TokenKind::Eof,                   file: "<string>".into(), line: 1, column: 7 },
            ]
        );
        assert_eq!(kinds("ABC_123\n"), vec![TokenKind::Word("ABC_123".into()), TokenKind::Eof]);
    }

    #[test]
    fn mixed_literals() {
        let text = "Test3a \"Test3b\" 'Goodbye' 123 0.5 1e2 0x10 0777";
        assert_eq!(
            kinds(text),
            vec![
                TokenKind::Word("Test3a".into()),
                TokenKind::DoubleQuoted("Test3b".into()),
                TokenKind::SingleQuoted("Goodbye".into()),
                TokenKind::Integer(123),
                TokenKind::Float(0.5),
                TokenKind::Float(100.0),
                TokenKind::Integer(16),
                TokenKind::Integer(511),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            positions(text),
            vec![(1, 1), (1, 8), (1, 17), (1, 27), (1, 31), (1, 35), (1, 39), (1, 44), (1, 48)]
        );
    }

    #[test]
    fn punctuation_splits_words() {
        assert_eq!(
            kinds("Test4a(Test4b{})"),
            vec![
                TokenKind::Word("Test4a".into()),
                TokenKind::OpenParen,
                TokenKind::Word("Test4b".into()),
                TokenKind::OpenBrace,
                TokenKind::CloseBrace,
                TokenKind::CloseParen,
                TokenKind::Eof,
            ]
        );
        assert_eq!(positions("Test4a(Test4b{})")[..6], [(1, 1), (1, 7), (1, 8), (1, 14), (1, 15), (1, 16)]);

        assert_eq!(
            kinds("Take note: Pi = 3.14"),
            vec![
                TokenKind::Word("Take".into()),
                TokenKind::Word("note".into()),
                TokenKind::Colon,
                TokenKind::Word("Pi".into()),
                TokenKind::Equals,
                TokenKind::Float(3.14),
                TokenKind::Eof,
            ]
        );
        assert_eq!(positions("Take note: Pi = 3.14")[..6], [(1, 1), (1, 6), (1, 10), (1, 12), (1, 15), (1, 17)]);
    }

    #[test]
    fn quotes_end_words() {
        assert_eq!(
            kinds("'A'B\"C\""),
            vec![
                TokenKind::SingleQuoted("A".into()),
                TokenKind::Word("B".into()),
                TokenKind::DoubleQuoted("C".into()),
                TokenKind::Eof,
            ]
        );
        assert_eq!(positions("'A'B\"C\"")[..3], [(1, 1), (1, 4), (1, 5)]);
    }

    #[test]
    fn escapes() {
        assert_eq!(
            kinds("'\\t\\r\\n\\\\'"),
            vec![TokenKind::SingleQuoted("\t\r\n\\".into()), TokenKind::Eof]
        );
        assert_eq!(kinds(r#""a\"b\q""#), vec![TokenKind::DoubleQuoted("a\"bq".into()), TokenKind::Eof]);
    }

    #[test]
    fn numbers() {
        assert_eq!(kinds("0x1e5"), vec![TokenKind::Integer(0x1e5), TokenKind::Eof]);
        assert_eq!(kinds(".25"), vec![TokenKind::Float(0.25), TokenKind::Eof]);
        assert_eq!(kinds("1e-2"), vec![TokenKind::Float(0.01), TokenKind::Eof]);
        assert_eq!(kinds("0"), vec![TokenKind::Integer(0), TokenKind::Eof]);
    }

    #[test]
    fn lexical_errors() {
        assert_eq!(error("123XYZ"), "1:1: badly formatted number.");
        assert_eq!(error("0123456789"), "1:1: badly formatted number.");
        assert_eq!(error("0x123456789ABCDEFG"), "1:1: badly formatted number.");
        assert_eq!(error("1.5.2"), "1:1: badly formatted number.");
        assert_eq!(error("\\t"), "1:1: unexpected character '\\' (ascii 92).");
        assert_eq!(error("xyz'abc"), "1:4: unterminated string.");
        assert_eq!(error("xyz\"abc"), "1:4: unterminated string.");
        assert_eq!(error("a\n  \"abc\ndef"), "2:3: unterminated string.");
    }

    #[test]
    fn lines_and_columns() {
        assert_eq!(positions("a\n  b\n\nc  "), vec![(1, 1), (2, 3), (4, 1), (4, 4)]);
    }

    #[test]
    fn line_markers() {
        let text = "\
# 1 \"main.wire\"
# 1 \"<built-in>\"
# 1 \"/usr/include/stdc-predef.h\" 1 3 4
# 2 \"<command-line>\" 2
# 1 \"main.wire\"
# 1 \"common.wire\" 1
Id = uint32
# 2 \"main.wire\" 2
Point = struct { Id id }
";
        let tokens = tokenize_str(text, "main.wire").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|token| token.kind.clone()).collect();
        assert_eq!(
            kinds[..5],
            [
                TokenKind::IncludeEnter("common.wire".into()),
                TokenKind::Word("Id".into()),
                TokenKind::Equals,
                TokenKind::Word("uint32".into()),
                TokenKind::IncludeExit,
            ]
        );
        assert_eq!((tokens[1].file.as_str(), tokens[1].line, tokens[1].column), ("common.wire", 1, 1));
        assert_eq!((tokens[5].file.as_str(), tokens[5].line, tokens[5].column), ("main.wire", 2, 1));
        assert_eq!(tokens.last().map(|token| &token.kind), Some(&TokenKind::Eof));
    }

    #[test]
    fn malformed_line_marker() {
        assert_eq!(error("x\n#pragma once\n"), "2:1: malformed line marker.");
    }

    #[test]
    fn reader_input() {
        let tokens = tokenize_reader("a = b".as_bytes(), "<stream>").unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].file, "<stream>");
    }
}
