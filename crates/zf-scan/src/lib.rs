//! Structural scanner and token reader for DNS master files (RFC 1035 §5).
//!
//! The crate turns raw zone-file bytes into a stream of typed tokens in two
//! stages. A SIMD block scanner classifies 64-byte blocks into bitmasks of
//! structurally interesting positions (token starts, quotes, comment starts,
//! newlines, parentheses), an indexer converts those masks into an ordered
//! "tape" of byte offsets, and [`Lexer::lex`] walks the tape to yield
//! [`Token`]s. Escape sequences, quoted strings spanning lines, comments and
//! `( … )` grouping are all resolved at scan time, so the token reader itself
//! is a handful of table-driven branches.
//!
//! Input is consumed through a fixed-size window with a 64-byte zeroed pad,
//! letting the scanner read whole blocks without bounds checks. An
//! unterminated token at the window tail is carried over on refill, so token
//! bytes are always contiguous in memory.

mod classify;
mod lexer;
mod scanner;
mod simd;
mod tape;
mod window;

pub use classify::{Class, CLASS, FORWARD};
pub use lexer::{Lexer, Token, TokenKind};
pub use window::Input;

use thiserror::Error;

/// Lexical failures. Everything else a zone file can do wrong is a matter of
/// record semantics and is reported by the parser layer.
#[derive(Debug, Error)]
pub enum LexError {
    #[error("i/o error reading input: {0}")]
    Read(#[from] std::io::Error),

    #[error("nested opening brace")]
    NestedGroup,

    #[error("closing brace without opening brace")]
    UnmatchedGroup,

    #[error("missing closing brace at end of input")]
    OpenGroupAtEof,

    #[error("unterminated quoted string")]
    UnterminatedString,

    #[error("stray NUL byte in input")]
    StrayNul,
}
