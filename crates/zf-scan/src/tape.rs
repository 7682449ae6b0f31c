//! The structural index ("tape") over the current window.
//!
//! One entry per structural position, in input order. Two consecutive
//! entries straddle a token: `entries[head].offset` is its first byte and
//! `entries[head + 1].offset` the first byte past it. The tape is doubly
//! terminated — the final two entries both address the NUL sentinel — so the
//! token reader may always look one entry ahead.

use crate::scanner::Scanner;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Entry {
    pub offset: u32,
    /// Newlines swallowed by preceding quoted strings or escapes, attributed
    /// to this entry when it is a structural newline.
    pub newlines: u32,
}

#[derive(Debug, Default)]
pub(crate) struct Tape {
    pub entries: Vec<Entry>,
    pub head: usize,
    /// Swallowed newlines not yet attributed to a structural newline entry.
    pub pending_newlines: u32,
    /// Offset of an unterminated trailing token withheld from the tape; its
    /// bytes must be carried into the next window.
    pub carry_start: Option<usize>,
    /// Set when the input ended inside a quoted string; the final quoted
    /// token on the tape is then unterminated.
    pub open_string: bool,
}

impl Tape {
    /// Rebuild the tape for `data[..len]`, scanning 64 bytes at a time.
    /// `data` must extend at least 64 bytes past `len` (the window pad).
    /// With `eof` false, an unterminated trailing token is withheld and
    /// reported through `carry_start`.
    pub(crate) fn index(&mut self, scanner: &mut Scanner, data: &[u8], len: usize, eof: bool) {
        // a partial final block puts the scanner's contiguous carry into the
        // pad; that is only reachable at end of input, where no further scan
        // consults it
        debug_assert!(eof || len % 64 == 0);

        self.entries.clear();
        self.head = 0;
        self.carry_start = None;
        self.open_string = false;
        self.entries.reserve(len / 4 + 4);

        let mut base = 0usize;
        while base < len {
            let scan = scanner.scan(&data[base..base + 64]);
            let valid = len - base;
            let mask = if valid >= 64 { !0u64 } else { (1u64 << valid) - 1 };
            let mut pending = scan.swallowed & mask;
            let mut bits = scan.bits & mask;
            // walk structural and swallowed positions together so swallowed
            // newlines land on the right entry
            let mut union = bits | pending;
            while union != 0 {
                let i = union.trailing_zeros();
                let bit = 1u64 << i;
                if pending & bit != 0 {
                    self.pending_newlines += 1;
                    pending &= pending - 1;
                } else {
                    let offset = (base + i as usize) as u32;
                    let newlines = if data[offset as usize] == b'\n' {
                        std::mem::take(&mut self.pending_newlines)
                    } else {
                        0
                    };
                    self.entries.push(Entry { offset, newlines });
                    bits &= bits - 1;
                }
                union &= union - 1;
            }
            base += 64;
        }

        if !eof {
            if scanner.in_quoted() || scanner.follows_contiguous() {
                // the last entry is the start of the unterminated token (the
                // opening quote, or the first byte of the contiguous run)
                let start = self
                    .entries
                    .pop()
                    .map(|e| e.offset as usize)
                    .unwrap_or(0);
                self.carry_start = Some(start);
                // its swallowed newlines will be recounted on rescan
                let recounted =
                    data[start..len].iter().filter(|&&b| b == b'\n').count() as u32;
                self.pending_newlines -= recounted;
            } else if let Some(&last) = self.entries.last() {
                // a trailing newline entry has an unresolved extent: whether
                // the next line opens with a blank decides the blank-owner
                // rule, and that byte is still unread. The entry stays on the
                // tape so the preceding token's extent remains valid, but the
                // lexer refills instead of consuming it, and the rescan of
                // the carried bytes re-emits it resolved.
                if data[last.offset as usize] == b'\n' {
                    self.carry_start = Some(last.offset as usize);
                    self.pending_newlines += last.newlines;
                }
            }
        } else {
            self.open_string = scanner.in_quoted();
        }

        let sentinel = Entry { offset: len as u32, newlines: 0 };
        self.entries.push(sentinel);
        self.entries.push(sentinel);
    }
}
