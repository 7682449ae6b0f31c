//! Categorical parse errors with source locations.

use thiserror::Error;

/// What went wrong. Categories, not prose: callers branch on these.
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("semantic error: {0}")]
    Semantic(String),

    #[error("not a file: {0}")]
    NotAFile(String),

    #[error("read error: {0}")]
    Read(#[source] std::io::Error),

    #[error("record data exceeds maximum size")]
    OutOfMemory,

    #[error("$INCLUDE is not permitted")]
    NotPermitted,

    #[error("unknown record type: {0}")]
    UnsupportedType(String),

    #[error("nested opening brace")]
    NestedOpenBrace,

    #[error("closing brace without opening brace")]
    UnmatchedCloseBrace,
}

/// A parse failure, located. The parser aborts on the first error; it never
/// resynchronises to the next line.
#[derive(Debug, Error)]
#[error("{file}:{line}:{column}: {kind}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub file: String,
    pub line: u32,
    pub column: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_with_location() {
        let err = ParseError {
            kind: ErrorKind::Syntax("missing address in A record".into()),
            file: "zones/example.zone".into(),
            line: 12,
            column: 30,
        };
        assert_eq!(
            err.to_string(),
            "zones/example.zone:12:30: syntax error: missing address in A record"
        );
    }
}
