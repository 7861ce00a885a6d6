//! Token scanner: splits raw keyboard bytes into atomic input tokens.
//!
//! A token is one of:
//! - a single UTF-8 scalar (1-4 bytes; an invalid byte is its own token)
//! - a single C0 control or DEL byte
//! - a CSI sequence `ESC [ P* I* F` or an SS3 sequence `ESC O X`
//! - a quoted-insert escape `^Vx HH`, `^Vu HHHH`, or `^VU HHHHHHHH`
//!
//! [`scan_token`] is pure and restartable: it inspects the currently
//! buffered bytes and either produces a token or asks for more input.

use std::io::{self, Read};

use zeroize::{Zeroize, Zeroizing};

use crate::utf8::{first_scalar, First};

/// Scan the next token from `data`.
///
/// Returns `Some((advance, token))` when a token is complete, or `None` when
/// more bytes are needed (`at_eof` false) or the feed is exhausted (`at_eof`
/// true and `data` empty). With `at_eof` set this is total: every non-empty
/// `data` yields a token.
pub(crate) fn scan_token(data: &[u8], at_eof: bool) -> Option<(usize, &[u8])> {
    if data.is_empty() {
        return None;
    }

    match data[0] {
        0x16 => scan_quoted_insert(data, at_eof),
        0x1b => scan_escape(data, at_eof),
        _ => match first_scalar(data) {
            First::Complete(n) => Some((n, &data[..n])),
            First::NeedMore if !at_eof => None,
            // Invalid bytes and truncated-at-EOF prefixes: one-byte token.
            First::NeedMore | First::Invalid => Some((1, &data[..1])),
        },
    }
}

/// `^V x HH` / `^V u HHHH` / `^V U HHHHHHHH`; anything else is a bare `^V`.
fn scan_quoted_insert(data: &[u8], at_eof: bool) -> Option<(usize, &[u8])> {
    if data.len() == 1 {
        return if at_eof { Some((1, &data[..1])) } else { None };
    }
    let max_len = match data[1] {
        b'x' => 4,
        b'u' => 6,
        b'U' => 10,
        _ => return Some((1, &data[..1])),
    };
    let mut i = 2;
    while i < data.len() && i < max_len && data[i].is_ascii_hexdigit() {
        i += 1;
    }
    if i == data.len() && i < max_len && !at_eof {
        return None;
    }
    if i == 2 {
        // `^Vx` with no hex digit behind it degrades to a bare `^V`.
        return Some((1, &data[..1]));
    }
    Some((i, &data[..i]))
}

/// CSI (`ESC [ P* I* F`) and SS3 (`ESC O X`) sequences; a lone ESC otherwise.
fn scan_escape(data: &[u8], at_eof: bool) -> Option<(usize, &[u8])> {
    if data.len() == 1 {
        return if at_eof { Some((1, &data[..1])) } else { None };
    }
    match data[1] {
        b'[' => {
            let mut i = 2;
            while i < data.len() && (0x30..=0x3f).contains(&data[i]) {
                i += 1;
            }
            while i < data.len() && (0x20..=0x2f).contains(&data[i]) {
                i += 1;
            }
            if i < data.len() {
                if (0x40..=0x7e).contains(&data[i]) {
                    return Some((i + 1, &data[..i + 1]));
                }
                // Malformed sequence: the ESC stands alone and the rest rescans.
                return Some((1, &data[..1]));
            }
            if at_eof {
                Some((1, &data[..1]))
            } else {
                None
            }
        }
        b'O' => {
            if data.len() < 3 {
                return if at_eof { Some((1, &data[..1])) } else { None };
            }
            if (0x20..=0x7f).contains(&data[2]) {
                Some((3, &data[..3]))
            } else {
                Some((1, &data[..1]))
            }
        }
        _ => Some((1, &data[..1])),
    }
}

/// Pull-based adapter feeding [`scan_token`] from a byte reader.
///
/// The internal buffer holds typed secret bytes, so it is wiped on drop.
pub(crate) struct Scanner<R> {
    reader: R,
    buf: Zeroizing<Vec<u8>>,
    start: usize,
    at_eof: bool,
}

impl<R: Read> Scanner<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Zeroizing::new(Vec::with_capacity(64)),
            start: 0,
            at_eof: false,
        }
    }

    /// The next token, `Ok(None)` at end of input.
    ///
    /// Read errors are returned as-is; the terminal layer has already
    /// retried transient `EINTR`s, so an error here is either real or the
    /// cancellation marker.
    pub(crate) fn next_token(&mut self) -> io::Result<Option<Vec<u8>>> {
        loop {
            if let Some((advance, token)) = scan_token(&self.buf[self.start..], self.at_eof) {
                let token = token.to_vec();
                self.start += advance;
                return Ok(Some(token));
            }
            if self.at_eof {
                return Ok(None);
            }

            if self.start > 0 {
                self.buf.drain(..self.start);
                self.start = 0;
            }
            let mut chunk = [0u8; 256];
            let n = self.reader.read(&mut chunk)?;
            if n == 0 {
                self.at_eof = true;
            } else {
                self.buf.extend_from_slice(&chunk[..n]);
            }
            chunk.zeroize();
        }
    }
}
