//! Structural classification of 64-byte blocks.
//!
//! The scanner owns the carries that make block-at-a-time scanning exact:
//! whether the next block starts escaped, inside a quoted string, inside a
//! comment, or directly after contiguous token content. Out of the raw
//! position masks it derives the set of positions that get a tape entry, and
//! the set of newlines swallowed by strings or escapes (those only count for
//! line numbers).

use crate::simd::{Block, Isa};

const EVEN_BITS: u64 = 0x5555_5555_5555_5555;

#[derive(Debug)]
pub(crate) struct Scanner {
    isa: Isa,
    /// Set iff the first byte of the next block is escaped.
    is_escaped: u64,
    /// All ones iff the next block starts inside a quoted string.
    in_quoted: u64,
    /// All ones iff the next block starts inside a comment.
    in_comment: u64,
    /// Bit 0 set iff the last byte of the previous block was token content.
    follows_contiguous: u64,
}

/// Structural decision for one block.
pub(crate) struct Scan {
    /// Positions that get a tape entry.
    pub bits: u64,
    /// Newlines hidden inside strings or behind escapes; they are counted
    /// into the next structural newline's entry.
    pub swallowed: u64,
}

impl Scanner {
    pub(crate) fn new(isa: Isa) -> Self {
        Scanner { isa, is_escaped: 0, in_quoted: 0, in_comment: 0, follows_contiguous: 0 }
    }

    /// Forget everything; used when a refill rescans from a token start.
    pub(crate) fn reset(&mut self) {
        self.is_escaped = 0;
        self.in_quoted = 0;
        self.in_comment = 0;
        self.follows_contiguous = 0;
    }

    pub(crate) fn in_quoted(&self) -> bool {
        self.in_quoted != 0
    }

    pub(crate) fn follows_contiguous(&self) -> bool {
        self.follows_contiguous & 1 != 0
    }

    pub(crate) fn scan(&mut self, block: &[u8]) -> Scan {
        let b: Block = self.isa.scan_block(block);

        let escaped = self.find_escaped(b.backslash);
        let quote = b.quote & !escaped;
        let semicolon = b.semicolon & !escaped;
        let newline = b.newline & !escaped;

        let (in_quoted, in_comment, comment_starts) =
            self.resolve_regions(quote, semicolon, newline);

        let quote_bits = quote & !in_comment;
        let newline_bits = newline & !in_quoted;
        let paren_bits = (b.open | b.close) & !escaped & !in_quoted & !in_comment;
        let blank = b.blank & !escaped & !in_quoted & !in_comment;

        // everything that is neither structural nor region-hidden is token
        // content; escaped specials fall through to here on purpose
        let content =
            !(blank | quote_bits | newline_bits | paren_bits | in_quoted | in_comment);
        let follows = (content << 1) | self.follows_contiguous;
        self.follows_contiguous = content >> 63;

        let token_starts = content & !follows;
        let terminators = (blank | comment_starts) & follows;

        Scan {
            bits: token_starts | terminators | quote_bits | newline_bits | paren_bits,
            swallowed: b.newline & (escaped | in_quoted),
        }
    }

    /// simdjson-style escape resolution: a byte is escaped iff it is preceded
    /// by an odd-length run of backslashes. The carry handles runs crossing
    /// the block boundary.
    fn find_escaped(&mut self, backslash: u64) -> u64 {
        if backslash == 0 {
            let escaped = self.is_escaped;
            self.is_escaped = 0;
            return escaped;
        }
        let backslash = backslash & !self.is_escaped;
        let follows_escape = (backslash << 1) | self.is_escaped;
        let odd_starts = backslash & !EVEN_BITS & !follows_escape;
        let (even_carries, overflow) = odd_starts.overflowing_add(backslash);
        self.is_escaped = overflow as u64;
        (EVEN_BITS ^ (even_carries << 1)) & follows_escape
    }

    /// Resolve string and comment regions. A quote inside a comment and a
    /// semicolon inside a string carry no meaning, so blocks holding both
    /// kinds are walked in order; the common cases stay bit-parallel.
    ///
    /// `in_quoted` covers the opening quote up to (excluding) the closing
    /// quote; `in_comment` covers the semicolon up to (excluding) the
    /// terminating newline.
    fn resolve_regions(&mut self, quote: u64, semicolon: u64, newline: u64) -> (u64, u64, u64) {
        if semicolon == 0 && self.in_comment == 0 {
            let in_quoted = self.isa.prefix_xor(quote) ^ self.in_quoted;
            self.in_quoted = ((in_quoted as i64) >> 63) as u64;
            return (in_quoted, 0, 0);
        }
        if quote == 0 && self.in_quoted == 0 {
            let (in_comment, starts) = self.fill_comments(semicolon, newline);
            return (0, in_comment, starts);
        }
        self.resolve_serial(quote, semicolon, newline)
    }

    fn fill_comments(&mut self, semicolon: u64, newline: u64) -> (u64, u64) {
        let mut in_comment = 0u64;
        let mut starts = 0u64;
        let mut open = self.in_comment != 0;
        let mut cursor = 0u32;
        while cursor < 64 {
            if open {
                let ends = newline & bits_from(cursor);
                if ends == 0 {
                    in_comment |= bits_from(cursor);
                    cursor = 64;
                } else {
                    let end = ends.trailing_zeros();
                    in_comment |= span(cursor, end);
                    open = false;
                    cursor = end;
                }
            } else {
                let next = semicolon & bits_from(cursor);
                if next == 0 {
                    break;
                }
                let start = next.trailing_zeros();
                starts |= 1u64 << start;
                open = true;
                cursor = start;
            }
        }
        self.in_comment = if open { !0 } else { 0 };
        (in_comment, starts)
    }

    fn resolve_serial(&mut self, quote: u64, semicolon: u64, newline: u64) -> (u64, u64, u64) {
        let mut in_q = self.in_quoted != 0;
        let mut in_c = self.in_comment != 0;
        let mut in_quoted = 0u64;
        let mut in_comment = 0u64;
        let mut starts = 0u64;
        let mut last = 0u32;
        let mut events = quote | semicolon | newline;
        while events != 0 {
            let i = events.trailing_zeros();
            let bit = 1u64 << i;
            if in_q {
                in_quoted |= span(last, i);
            }
            if in_c {
                in_comment |= span(last, i);
            }
            if in_c {
                if newline & bit != 0 {
                    in_c = false; // the newline itself stays structural
                } else {
                    in_comment |= bit;
                }
            } else if in_q {
                if quote & bit != 0 {
                    in_q = false; // closing quote is excluded from the region
                } else {
                    in_quoted |= bit;
                }
            } else if quote & bit != 0 {
                in_q = true;
                in_quoted |= bit;
            } else if semicolon & bit != 0 {
                in_c = true;
                in_comment |= bit;
                starts |= bit;
            }
            last = i + 1;
            events &= events - 1;
        }
        if in_q {
            in_quoted |= bits_from(last);
        }
        if in_c {
            in_comment |= bits_from(last);
        }
        self.in_quoted = if in_q { !0 } else { 0 };
        self.in_comment = if in_c { !0 } else { 0 };
        (in_quoted, in_comment, starts)
    }
}

/// Bits `[from, 64)`.
#[inline]
fn bits_from(from: u32) -> u64 {
    if from >= 64 { 0 } else { !0u64 << from }
}

/// Bits `[from, to)`.
#[inline]
fn span(from: u32, to: u32) -> u64 {
    debug_assert!(from <= to);
    bits_from(from) & !bits_from(to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::Isa;

    fn scan_all(input: &[u8]) -> (Vec<usize>, Vec<usize>) {
        let mut padded = input.to_vec();
        padded.resize(input.len().div_ceil(64).max(1) * 64, 0);
        let mut scanner = Scanner::new(Isa::Fallback);
        let mut bits = Vec::new();
        let mut swallowed = Vec::new();
        for (block_index, block) in padded.chunks(64).enumerate() {
            let scan = scanner.scan(block);
            for i in 0..64 {
                let pos = block_index * 64 + i;
                if pos >= input.len() {
                    break;
                }
                if scan.bits & (1 << i) != 0 {
                    bits.push(pos);
                }
                if scan.swallowed & (1 << i) != 0 {
                    swallowed.push(pos);
                }
            }
        }
        (bits, swallowed)
    }

    #[test]
    fn token_starts_and_terminators() {
        // offsets:      0123456789
        let (bits, _) = scan_all(b"foo bar\nx");
        // start of foo, blank after foo, start of bar, newline, start of x
        assert_eq!(bits, vec![0, 3, 4, 7, 8]);
    }

    #[test]
    fn comments_hide_everything_but_their_newline() {
        let (bits, _) = scan_all(b"a ;x \"q\" (\nb");
        // a, blank; the comment (quotes and paren included) vanishes up to
        // its newline; then b. The semicolon follows a blank, so no entry.
        assert_eq!(bits, vec![0, 1, 10, 11]);
    }

    #[test]
    fn comment_start_after_token_terminates_it() {
        let (bits, _) = scan_all(b"a;x\nb");
        // a, the semicolon terminating it, newline, b
        assert_eq!(bits, vec![0, 1, 3, 4]);
    }

    #[test]
    fn strings_hide_comments_and_count_newlines() {
        let input = b"\"a;b\nc\" d";
        let (bits, swallowed) = scan_all(input);
        // opening quote, closing quote, d; the newline inside is swallowed
        assert_eq!(bits, vec![0, 6, 8]);
        assert_eq!(swallowed, vec![4]);
    }

    #[test]
    fn escaped_quote_does_not_close_string() {
        let (bits, _) = scan_all(b"\"a\\\"b\" c");
        assert_eq!(bits, vec![0, 5, 7]);
    }

    #[test]
    fn escaped_backslash_pair_is_inert() {
        // "a\\" followed by a quote: the quote is structural
        let (bits, _) = scan_all(b"\"a\\\\\" c");
        assert_eq!(bits, vec![0, 4, 6]);
    }

    #[test]
    fn escape_run_crosses_block_boundary() {
        let mut input = vec![b'x'; 63];
        input.push(b'\\');
        input.push(b'\n'); // escaped newline in the next block
        input.push(b'y');
        let (bits, swallowed) = scan_all(&input);
        assert_eq!(bits, vec![0]); // one long contiguous token
        assert_eq!(swallowed, vec![64]);
    }

    #[test]
    fn parens_are_structural_outside_strings() {
        let (bits, _) = scan_all(b"( a )\n");
        assert_eq!(bits, vec![0, 2, 3, 4, 5]);
    }
}
