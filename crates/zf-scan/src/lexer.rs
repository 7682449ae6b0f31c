//! The token reader.
//!
//! `lex` walks the tape: each call classifies the byte under the cursor via
//! the `CLASS` table and either returns a token or absorbs structure
//! (grouping parentheses, newlines inside groups) and loops. Refills are
//! driven from here: hitting the sentinel with input remaining re-windows,
//! re-indexes and continues.

use tracing::debug;

use crate::classify::{is_blank, Class, CLASS, FORWARD};
use crate::scanner::Scanner;
use crate::simd::Isa;
use crate::tape::Tape;
use crate::window::{Input, Window};
use crate::LexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A run of unquoted, unseparated bytes (escapes included, undecoded).
    Contiguous,
    /// The contents of a quoted string, quotes stripped, escapes undecoded.
    Quoted,
    /// An ungrouped newline: the record ends here.
    Delimiter,
    /// End of the (outermost) input.
    Eof,
}

/// A token, addressing bytes in the lexer's window. Offsets are valid until
/// the next call to [`Lexer::lex`].
#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub len: usize,
}

impl Token {
    pub fn is_content(&self) -> bool {
        matches!(self.kind, TokenKind::Contiguous | TokenKind::Quoted)
    }

    pub fn is_end(&self) -> bool {
        matches!(self.kind, TokenKind::Delimiter | TokenKind::Eof)
    }
}

#[derive(Debug)]
pub struct Lexer<'a> {
    window: Window<'a>,
    scanner: Scanner,
    tape: Tape,
    grouped: bool,
    line: u32,
    start_of_line: bool,
    refills: u64,
}

impl<'a> Lexer<'a> {
    /// `window_size` is rounded up to a multiple of 64; anything at or below
    /// 64 effectively exercises a refill per block, which the tests use.
    pub fn new(input: Input<'a>, window_size: usize) -> Result<Self, LexError> {
        let mut lexer = Lexer {
            window: Window::new(input, window_size),
            scanner: Scanner::new(Isa::detect()),
            tape: Tape::default(),
            grouped: false,
            line: 1,
            start_of_line: true,
            refills: 0,
        };
        lexer.window.fill()?;
        // a first line opening with a blank means the first record continues
        // the (nonexistent) previous owner; only a newline entry updates the
        // flag later, so seed it from the raw first byte
        if lexer.window.len() > 0 && is_blank(lexer.window.data()[0]) {
            lexer.start_of_line = false;
        }
        lexer.index();
        Ok(lexer)
    }

    /// Bytes of the current window including the pad. Token offsets index
    /// into this slice, and at least 64 bytes are readable past any token.
    pub fn data(&self) -> &[u8] {
        self.window.data()
    }

    pub fn token_bytes(&self, token: &Token) -> &[u8] {
        &self.window.data()[token.start..token.start + token.len]
    }

    /// 1-based line number of the cursor.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Whether the token most recently returned opened its line.
    pub fn start_of_line(&self) -> bool {
        self.start_of_line
    }

    pub fn grouped(&self) -> bool {
        self.grouped
    }

    /// 1-based column of an offset, relative to the last newline still in
    /// the window. A token carried across a refill restarts at column 1.
    pub fn column_of(&self, offset: usize) -> u32 {
        let upto = offset.min(self.window.len());
        let line_start = self.window.data()[..upto]
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|p| p + 1)
            .unwrap_or(0);
        (offset - line_start + 1) as u32
    }

    pub fn lex(&mut self) -> Result<Token, LexError> {
        loop {
            let entry = self.tape.entries[self.tape.head];
            let next = self.tape.entries[self.tape.head + 1];
            let start = entry.offset as usize;
            let end = next.offset as usize;

            match CLASS[self.window.data()[start] as usize] {
                Class::Contiguous => {
                    let skip = FORWARD[self.window.data()[end] as usize] as usize;
                    self.tape.head += skip;
                    return Ok(Token { kind: TokenKind::Contiguous, start, len: end - start });
                }
                Class::Quote => {
                    if self.tape.open_string && end >= self.window.len() {
                        return Err(LexError::UnterminatedString);
                    }
                    self.tape.head += 2;
                    return Ok(Token {
                        kind: TokenKind::Quoted,
                        start: start + 1,
                        len: end - start - 1,
                    });
                }
                Class::Newline => {
                    // when the successor is the sentinel, the real extent is
                    // bounded by a withheld trailing token, if any
                    let bound = match self.tape.carry_start {
                        Some(carry) if end >= self.window.len() => carry,
                        _ => end,
                    };
                    if bound == start {
                        // this newline is itself withheld: the next byte
                        // decides start-of-line and is still unread
                        self.refill()?;
                        continue;
                    }
                    self.line += entry.newlines + 1;
                    self.tape.head += 1;
                    if self.grouped {
                        continue;
                    }
                    self.start_of_line = bound - start == 1;
                    return Ok(Token { kind: TokenKind::Delimiter, start, len: 1 });
                }
                Class::Eof => {
                    if start < self.window.len() {
                        return Err(LexError::StrayNul);
                    }
                    if self.window.eof() {
                        if self.grouped {
                            return Err(LexError::OpenGroupAtEof);
                        }
                        return Ok(Token { kind: TokenKind::Eof, start, len: 0 });
                    }
                    self.refill()?;
                }
                Class::GroupOpen => {
                    if self.grouped {
                        return Err(LexError::NestedGroup);
                    }
                    self.grouped = true;
                    self.tape.head += 1;
                }
                Class::GroupClose => {
                    if !self.grouped {
                        return Err(LexError::UnmatchedGroup);
                    }
                    self.grouped = false;
                    self.tape.head += 1;
                }
            }
        }
    }

    /// Re-window and re-index. The tape told us whether an unterminated
    /// token needs its bytes preserved; everything before it has been fully
    /// consumed by the time the cursor reaches the sentinel.
    fn refill(&mut self) -> Result<(), LexError> {
        match self.tape.carry_start.take() {
            Some(start) => {
                if start == 0 && self.window.len() == self.window.capacity() {
                    // a single token filled the whole window
                    self.window.grow();
                } else {
                    self.window.carry(start);
                }
                // the carried bytes start a token; rescanning them from a
                // clean state reproduces the withheld structure
                self.scanner.reset();
            }
            None => {
                self.window.consume_all();
                // comment/blank tails carry no bytes, only scanner state
            }
        }
        self.window.fill()?;
        self.refills += 1;
        debug!(refills = self.refills, len = self.window.len(), "window refill");
        self.index();
        Ok(())
    }

    fn index(&mut self) {
        let len = self.window.len();
        let eof = self.window.eof();
        let data = self.window.data();
        self.tape.index(&mut self.scanner, data, len, eof);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexer(input: &[u8]) -> Lexer<'_> {
        Lexer::new(Input::Slice(input), 64 * 1024).unwrap()
    }

    fn collect(input: &[u8], window: usize) -> Vec<(TokenKind, Vec<u8>)> {
        let mut lexer = Lexer::new(Input::Slice(input), window).unwrap();
        let mut tokens = Vec::new();
        loop {
            let token = lexer.lex().unwrap();
            if token.kind == TokenKind::Eof {
                break;
            }
            tokens.push((token.kind, lexer.token_bytes(&token).to_vec()));
        }
        tokens
    }

    #[test]
    fn tokens_of_a_simple_record() {
        let tokens = collect(b"foo. 1s IN A 192.0.2.1\n", 64 * 1024);
        let expected: Vec<(TokenKind, &[u8])> = vec![
            (TokenKind::Contiguous, b"foo."),
            (TokenKind::Contiguous, b"1s"),
            (TokenKind::Contiguous, b"IN"),
            (TokenKind::Contiguous, b"A"),
            (TokenKind::Contiguous, b"192.0.2.1"),
            (TokenKind::Delimiter, b"\n"),
        ];
        assert_eq!(tokens.len(), expected.len());
        for ((kind, bytes), (ekind, ebytes)) in tokens.iter().zip(expected) {
            assert_eq!(*kind, ekind);
            assert_eq!(bytes, ebytes);
        }
    }

    #[test]
    fn quoted_token_strips_quotes() {
        let tokens = collect(b"\"hello world\" x\n", 64 * 1024);
        assert_eq!(tokens[0], (TokenKind::Quoted, b"hello world".to_vec()));
        assert_eq!(tokens[1], (TokenKind::Contiguous, b"x".to_vec()));
    }

    #[test]
    fn empty_quoted_token() {
        let tokens = collect(b"\"\"\n", 64 * 1024);
        assert_eq!(tokens[0], (TokenKind::Quoted, Vec::new()));
    }

    #[test]
    fn grouping_suspends_newlines() {
        let tokens = collect(b"a (\nb\nc )\nd\n", 64 * 1024);
        let kinds: Vec<TokenKind> = tokens.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Contiguous, // a
                TokenKind::Contiguous, // b
                TokenKind::Contiguous, // c
                TokenKind::Delimiter,
                TokenKind::Contiguous, // d
                TokenKind::Delimiter,
            ]
        );
    }

    #[test]
    fn group_errors() {
        let mut lexer = lexer(b"( (\n");
        assert!(matches!(lexer.lex(), Err(LexError::NestedGroup)));

        let mut lexer = Lexer::new(Input::Slice(b")\n"), 64 * 1024).unwrap();
        assert!(matches!(lexer.lex(), Err(LexError::UnmatchedGroup)));

        let mut lexer = Lexer::new(Input::Slice(b"( a"), 64 * 1024).unwrap();
        lexer.lex().unwrap(); // a
        assert!(matches!(lexer.lex(), Err(LexError::OpenGroupAtEof)));
    }

    #[test]
    fn comments_are_invisible() {
        let tokens = collect(b"a ; ignore me\nb\n", 64 * 1024);
        let kinds: Vec<TokenKind> = tokens.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Contiguous,
                TokenKind::Delimiter,
                TokenKind::Contiguous,
                TokenKind::Delimiter,
            ]
        );
    }

    #[test]
    fn line_numbers_follow_newlines() {
        let mut lexer = lexer(b"a\nb\n\nc\n");
        lexer.lex().unwrap(); // a
        assert_eq!(lexer.line(), 1);
        lexer.lex().unwrap(); // delimiter
        lexer.lex().unwrap(); // b
        assert_eq!(lexer.line(), 2);
        lexer.lex().unwrap(); // delimiter
        lexer.lex().unwrap(); // delimiter (blank line)
        lexer.lex().unwrap(); // c
        assert_eq!(lexer.line(), 4);
    }

    #[test]
    fn multiline_string_counts_lines() {
        let mut lexer = lexer(b"\"a\nb\" x\n y\n");
        lexer.lex().unwrap(); // quoted
        lexer.lex().unwrap(); // x
        lexer.lex().unwrap(); // delimiter: 1 structural + 1 swallowed newline
        assert_eq!(lexer.line(), 3);
    }

    #[test]
    fn start_of_line_distinguishes_blank_owners() {
        let mut lexer = lexer(b"a\n  b\nc\n");
        lexer.lex().unwrap(); // a
        assert!(lexer.start_of_line());
        lexer.lex().unwrap(); // delimiter
        lexer.lex().unwrap(); // b
        assert!(!lexer.start_of_line());
        lexer.lex().unwrap(); // delimiter
        lexer.lex().unwrap(); // c
        assert!(lexer.start_of_line());
    }

    #[test]
    fn leading_blank_on_first_line() {
        let lexer = lexer(b"  a\n");
        assert!(!lexer.start_of_line());
    }

    #[test]
    fn tokens_identical_across_window_sizes() {
        let input = b"owner 300 IN TXT \"some text here\" trailing ( grouped\ntokens )\nnext record\n";
        let reference = collect(input, 1 << 20);
        for window in [64usize, 128, 256] {
            assert_eq!(collect(input, window), reference, "window {window}");
        }
    }

    #[test]
    fn start_of_line_survives_window_boundary() {
        // the newline is the last byte of the first window; whether line two
        // opens with a blank is only known after the refill
        let mut input = vec![b'x'; 62];
        input.extend_from_slice(b"\n b\n");
        let mut lexer = Lexer::new(Input::Slice(&input), 64).unwrap();
        lexer.lex().unwrap(); // x-run
        lexer.lex().unwrap(); // delimiter
        let token = lexer.lex().unwrap();
        assert_eq!(token.kind, TokenKind::Contiguous);
        assert!(!lexer.start_of_line());
    }

    #[test]
    fn token_larger_than_window_grows_it() {
        let mut input = vec![b'a'; 300];
        input.push(b'\n');
        let tokens = collect(&input, 64);
        assert_eq!(tokens[0].0, TokenKind::Contiguous);
        assert_eq!(tokens[0].1.len(), 300);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut lexer = lexer(b"\"never closed");
        assert!(matches!(lexer.lex(), Err(LexError::UnterminatedString)));
    }

    #[test]
    fn stray_nul_is_an_error() {
        let mut lexer = lexer(b"a \0 b\n");
        lexer.lex().unwrap(); // a
        assert!(matches!(lexer.lex(), Err(LexError::StrayNul)));
    }

    #[test]
    fn column_of_reports_positions() {
        let lexer = lexer(b"abc def\nghi\n");
        assert_eq!(lexer.column_of(4), 5);
        assert_eq!(lexer.column_of(8), 1);
        assert_eq!(lexer.column_of(9), 2);
    }
}
