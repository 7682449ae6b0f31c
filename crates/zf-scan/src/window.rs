//! Buffered input window with a SIMD-safe pad.
//!
//! The window holds `capacity` data bytes plus a 64-byte zeroed pad, so the
//! scanner can always load whole 64-byte blocks and the NUL sentinel at
//! `data[len]` reads as end-of-file. The data capacity is a multiple of 64:
//! while the source still has bytes, every indexed block is full, which the
//! tape's carry logic relies on.

use std::io::Read;

/// Where the bytes come from. In-memory input is wrapped in a reader by the
/// caller; the window copies into itself either way.
pub enum Input<'a> {
    Slice(&'a [u8]),
    Reader(Box<dyn Read + 'a>),
}

impl<'a> std::fmt::Debug for Input<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Input::Slice(s) => f.debug_tuple("Slice").field(&s.len()).finish(),
            Input::Reader(_) => f.debug_tuple("Reader").finish(),
        }
    }
}

pub(crate) const PAD: usize = 64;

#[derive(Debug)]
pub(crate) struct Window<'a> {
    buf: Vec<u8>,
    len: usize,
    eof: bool,
    input: Input<'a>,
}

impl<'a> Window<'a> {
    pub(crate) fn new(input: Input<'a>, capacity: usize) -> Self {
        let capacity = capacity.max(64).next_multiple_of(64);
        Window { buf: vec![0; capacity + PAD], len: 0, eof: false, input }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn eof(&self) -> bool {
        self.eof
    }

    /// Data plus pad; always at least 64 readable bytes past any offset
    /// below `len()`.
    pub(crate) fn data(&self) -> &[u8] {
        &self.buf
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buf.len() - PAD
    }

    /// Keep the tail starting at `carry_start`, dropping everything before
    /// it. The caller rescans from the window head afterwards.
    pub(crate) fn carry(&mut self, carry_start: usize) {
        debug_assert!(carry_start <= self.len);
        self.buf.copy_within(carry_start..self.len, 0);
        self.len -= carry_start;
    }

    /// Discard all consumed data.
    pub(crate) fn consume_all(&mut self) {
        self.len = 0;
    }

    /// Double the data capacity; needed when a single token outgrows the
    /// window.
    pub(crate) fn grow(&mut self) {
        let capacity = (self.buf.len() - PAD) * 2;
        self.buf.resize(capacity + PAD, 0);
    }

    /// Read until the data region is full or the source is exhausted, then
    /// re-establish the sentinel and pad.
    pub(crate) fn fill(&mut self) -> std::io::Result<()> {
        let capacity = self.buf.len() - PAD;
        while self.len < capacity && !self.eof {
            let n = match &mut self.input {
                Input::Slice(slice) => {
                    let n = slice.len().min(capacity - self.len);
                    self.buf[self.len..self.len + n].copy_from_slice(&slice[..n]);
                    *slice = &slice[n..];
                    n
                }
                Input::Reader(reader) => match reader.read(&mut self.buf[self.len..capacity]) {
                    Ok(n) => n,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                },
            };
            if n == 0 {
                self.eof = true;
            } else {
                self.len += n;
            }
        }
        let len = self.len;
        self.buf[len..len + PAD].fill(0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_reads_to_capacity_and_pads() {
        let data = vec![b'a'; 200];
        let mut window = Window::new(Input::Slice(&data), 128);
        window.fill().unwrap();
        assert_eq!(window.len(), 128);
        assert!(!window.eof());
        assert_eq!(&window.data()[128..128 + PAD], &[0u8; PAD]);

        window.consume_all();
        window.fill().unwrap();
        assert_eq!(window.len(), 72);
        assert!(window.eof());
    }

    #[test]
    fn carry_moves_tail_to_head() {
        let data = b"0123456789".to_vec();
        let mut window = Window::new(Input::Slice(&data), 64);
        window.fill().unwrap();
        window.carry(7);
        assert_eq!(&window.data()[..3], b"789");
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn grow_doubles_data_capacity() {
        let data = vec![b'a'; 300];
        let mut window = Window::new(Input::Slice(&data), 64);
        window.fill().unwrap();
        assert_eq!(window.capacity(), 64);
        window.grow();
        assert_eq!(window.capacity(), 128);
        window.fill().unwrap();
        assert_eq!(window.len(), 128);
    }
}
