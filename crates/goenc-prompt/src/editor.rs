//! The line editor: an editable byte buffer with a caret, driven by scanned
//! tokens, redrawing through the session's display policy.
//!
//! The caret is a byte offset that lands on scalar boundaries for navigation
//! and deletion; quoted-insert can place arbitrary octets in the buffer and
//! navigation recovers one byte at a time across them.

use std::io::{self, Read, Write};

use zeroize::Zeroizing;

use crate::action::{map_token, Action};
use crate::display::Display;
use crate::error::{is_cancelled, Error};
use crate::scan::Scanner;
use crate::utf8::{decode_first, decode_last};

pub(crate) const SIGINT: i32 = 2;
pub(crate) const SIGQUIT: i32 = 3;

const CLR_EOS: &[u8] = b"\x1b[J";
const SAVE_CURSOR: &[u8] = b"\x1b[s";
const RESTORE_CURSOR: &[u8] = b"\x1b[u";
const ENABLE_BRACKETED_PASTE: &[u8] = b"\x1b[?2004h";
const DISABLE_BRACKETED_PASTE: &[u8] = b"\x1b[?2004l";

/// Run one line-edit over `reader`/`writer`.
///
/// Returns the buffer on accept (`^D`/`^J`/`^M`/keypad Enter, or end of
/// input). The finalization sequence (echoing the tail past the caret, then
/// `CRLF` and paste-mode off) is written on every path, error paths
/// included.
pub(crate) fn edit<R: Read, W: Write>(
    reader: R,
    writer: W,
    prompt: &str,
    display: Display,
) -> Result<Zeroizing<Vec<u8>>, Error> {
    let mut scanner = Scanner::new(reader);
    let mut editor = Editor {
        writer,
        prompt,
        display,
        buf: Zeroizing::new(Vec::with_capacity(256)),
        caret: 0,
        in_paste: false,
    };

    let outcome = editor
        .preamble()
        .and_then(|()| editor.run(&mut scanner));
    let finalization = editor.finalize();

    match (outcome, finalization) {
        (Ok(()), Ok(())) => Ok(std::mem::replace(
            &mut editor.buf,
            Zeroizing::new(Vec::new()),
        )),
        (Ok(()), Err(fin)) => Err(Error::Io(fin)),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(fin)) => Err(join_finalization_error(err, fin)),
    }
}

/// Keep the primary error but do not lose the finalization failure: fold it
/// into an I/O error's message, or log it when the primary error carries
/// exit-code semantics (signals, cancellation).
fn join_finalization_error(primary: Error, fin: io::Error) -> Error {
    match primary {
        Error::Io(io_err) => Error::Io(io::Error::new(
            io_err.kind(),
            format!("{io_err}; finalization also failed: {fin}"),
        )),
        other => {
            tracing::debug!(error = %fin, "finalization write failed after prompt error");
            other
        }
    }
}

fn io_err(err: io::Error) -> Error {
    if is_cancelled(&err) {
        Error::Cancelled
    } else {
        Error::Io(err)
    }
}

struct Editor<'a, W: Write> {
    writer: W,
    prompt: &'a str,
    display: Display,
    buf: Zeroizing<Vec<u8>>,
    caret: usize,
    in_paste: bool,
}

impl<W: Write> Editor<'_, W> {
    fn emit(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.writer.write_all(bytes).map_err(Error::Io)
    }

    fn preamble(&mut self) -> Result<(), Error> {
        let mut out = Vec::with_capacity(self.prompt.len() + 16);
        out.push(b'\r');
        out.extend_from_slice(CLR_EOS);
        out.extend_from_slice(self.prompt.as_bytes());
        out.extend_from_slice(ENABLE_BRACKETED_PASTE);
        self.emit(&out)
    }

    fn finalize(&mut self) -> io::Result<()> {
        let mut out = Vec::new();
        if self.caret < self.buf.len() {
            out.extend(self.display.render(&self.buf[self.caret..]).0);
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(DISABLE_BRACKETED_PASTE);
        self.writer.write_all(&out)?;
        self.writer.flush()
    }

    fn run<R: Read>(&mut self, scanner: &mut Scanner<R>) -> Result<(), Error> {
        loop {
            let token = match scanner.next_token().map_err(io_err)? {
                Some(token) => token,
                // End of input accepts whatever has been typed.
                None => return Ok(()),
            };
            match map_token(&token, self.in_paste) {
                Action::Accept => return Ok(()),
                Action::Sigint => return Err(Error::Signal(SIGINT)),
                Action::Sigquit => return Err(Error::Signal(SIGQUIT)),
                Action::Ignore => {}
                Action::PasteStart => self.in_paste = true,
                Action::PasteEnd => self.in_paste = false,
                Action::BeginningOfLine => self.beginning_of_line()?,
                Action::EndOfLine => self.end_of_line()?,
                Action::BackwardChar => self.backward_char()?,
                Action::ForwardChar => self.forward_char()?,
                Action::DeleteBackwardChar => self.delete_backward_char()?,
                Action::DeleteForwardChar => self.delete_forward_char()?,
                Action::KillLine => self.kill_line()?,
                Action::KillWholeLine => self.kill_whole_line()?,
                Action::Refresh => self.refresh()?,
                Action::QuotedInsert => {
                    let bytes = self.decode_quoted(&token, scanner)?;
                    self.insert(&bytes)?;
                }
                Action::InsertChar => self.insert(&token)?,
            }
        }
    }

    /// `^Vx`/`^Vu`/`^VU` decode their hex payload; a bare `^V` takes the next
    /// token verbatim, or stands for itself when the input ends on it.
    fn decode_quoted<R: Read>(
        &mut self,
        token: &[u8],
        scanner: &mut Scanner<R>,
    ) -> Result<Vec<u8>, Error> {
        if token.len() > 2 {
            let codepoint = std::str::from_utf8(&token[2..])
                .ok()
                .and_then(|hex| u32::from_str_radix(hex, 16).ok());
            return Ok(match codepoint {
                Some(cp) if token[1] == b'x' => vec![cp as u8],
                Some(cp) => {
                    let c = char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER);
                    let mut utf8 = [0u8; 4];
                    c.encode_utf8(&mut utf8).as_bytes().to_vec()
                }
                // The scanner only passes hex digits here; insert raw if not.
                None => token[1..].to_vec(),
            });
        }
        match scanner.next_token().map_err(io_err)? {
            Some(next) => Ok(next),
            None => Ok(token.to_vec()),
        }
    }

    fn insert(&mut self, token: &[u8]) -> Result<(), Error> {
        if token.is_empty() {
            return Ok(());
        }
        let at = self.caret;
        self.buf.splice(at..at, token.iter().copied());
        self.caret += token.len();

        let (mut out, _) = self.display.render(token);
        if self.caret < self.buf.len() {
            out.extend_from_slice(CLR_EOS);
            out.extend_from_slice(SAVE_CURSOR);
            out.extend(self.display.render(&self.buf[self.caret..]).0);
            out.extend_from_slice(RESTORE_CURSOR);
        }
        self.emit(&out)
    }

    fn beginning_of_line(&mut self) -> Result<(), Error> {
        if self.caret > 0 {
            let cells = self.display.width(&self.buf[..self.caret]);
            self.caret = 0;
            self.emit(&backspaces(cells))?;
        }
        Ok(())
    }

    fn end_of_line(&mut self) -> Result<(), Error> {
        if self.caret < self.buf.len() {
            let (out, _) = self.display.render(&self.buf[self.caret..]);
            self.caret = self.buf.len();
            self.emit(&out)?;
        }
        Ok(())
    }

    fn backward_char(&mut self) -> Result<(), Error> {
        if self.caret > 0 {
            let (_, n) = decode_last(&self.buf[..self.caret]);
            let cells = self.display.width(&self.buf[self.caret - n..self.caret]);
            self.caret -= n;
            self.emit(&backspaces(cells))?;
        }
        Ok(())
    }

    fn forward_char(&mut self) -> Result<(), Error> {
        if self.caret < self.buf.len() {
            let (_, n) = decode_first(&self.buf[self.caret..]);
            let (out, _) = self.display.render(&self.buf[self.caret..self.caret + n]);
            self.caret += n;
            self.emit(&out)?;
        }
        Ok(())
    }

    fn delete_backward_char(&mut self) -> Result<(), Error> {
        if self.caret == 0 {
            return Ok(());
        }
        let (_, n) = decode_last(&self.buf[..self.caret]);
        let cells = self.display.width(&self.buf[self.caret - n..self.caret]);
        self.buf.drain(self.caret - n..self.caret);
        self.caret -= n;

        let mut out = backspaces(cells);
        out.extend_from_slice(CLR_EOS);
        if self.caret < self.buf.len() {
            out.extend_from_slice(SAVE_CURSOR);
            out.extend(self.display.render(&self.buf[self.caret..]).0);
            out.extend_from_slice(RESTORE_CURSOR);
        }
        self.emit(&out)
    }

    fn delete_forward_char(&mut self) -> Result<(), Error> {
        if self.caret == self.buf.len() {
            return Ok(());
        }
        let (_, n) = decode_first(&self.buf[self.caret..]);
        self.buf.drain(self.caret..self.caret + n);

        let mut out = CLR_EOS.to_vec();
        out.extend_from_slice(SAVE_CURSOR);
        out.extend(self.display.render(&self.buf[self.caret..]).0);
        out.extend_from_slice(RESTORE_CURSOR);
        self.emit(&out)
    }

    fn kill_line(&mut self) -> Result<(), Error> {
        self.buf.truncate(self.caret);
        self.emit(CLR_EOS)
    }

    fn kill_whole_line(&mut self) -> Result<(), Error> {
        let cells = self.display.width(&self.buf[..self.caret]);
        self.buf.clear();
        self.caret = 0;

        let mut out = backspaces(cells);
        out.push(b'\r');
        out.extend_from_slice(CLR_EOS);
        out.extend_from_slice(self.prompt.as_bytes());
        self.emit(&out)
    }

    fn refresh(&mut self) -> Result<(), Error> {
        let mut out = vec![b'\r'];
        out.extend_from_slice(CLR_EOS);
        out.extend_from_slice(self.prompt.as_bytes());
        out.extend(self.display.render(&self.buf).0);
        out.extend(backspaces(self.display.width(&self.buf[self.caret..])));
        self.emit(&out)
    }
}

fn backspaces(n: usize) -> Vec<u8> {
    vec![b'\x08'; n]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_editor(feed: &[u8], display: Display) -> (Result<Vec<u8>, Error>, Vec<u8>) {
        let mut written = Vec::new();
        let result = edit(feed, &mut written, "PW: ", display);
        (result.map(|buf| buf.to_vec()), written)
    }

    fn accept(feed: &[u8], display: Display) -> (Vec<u8>, Vec<u8>) {
        let (result, written) = run_editor(feed, display);
        (result.expect("editor should accept"), written)
    }

    #[test]
    fn simple_input_accepts_on_newline() {
        let (buf, _) = accept(b"hello\n", Display::Masked);
        assert_eq!(buf, b"hello");
    }

    #[test]
    fn end_of_input_accepts_buffer() {
        let (buf, _) = accept(b"partial", Display::Masked);
        assert_eq!(buf, b"partial");
    }

    #[test]
    fn masked_backspace_scenario() {
        // Hi ^H ^H Hi: two inserted, two deleted, two retyped.
        let (buf, written) = accept(b"Hi\x08\x08Hi\n", Display::Masked);
        assert_eq!(buf, b"Hi");
        let stars = written.iter().filter(|&&b| b == b'*').count();
        assert_eq!(stars, 4);
    }

    #[test]
    fn exact_redraw_protocol_for_mid_line_delete() {
        // Type "ab", step left, delete the "a", accept.
        let (buf, written) = accept(b"ab\x02\x08\n", Display::Masked);
        assert_eq!(buf, b"b");

        let mut expected = Vec::new();
        expected.extend_from_slice(b"\r\x1b[JPW: \x1b[?2004h");
        // insert 'a', insert 'b', backward over 'b', delete 'a' with redraw,
        // then finalization echoes the tail past the caret.
        expected.extend_from_slice(b"**\x08");
        expected.extend_from_slice(b"\x08\x1b[J\x1b[s*\x1b[u");
        expected.extend_from_slice(b"*\r\n\x1b[?2004l");
        assert_eq!(written, expected);
    }

    #[test]
    fn bracketed_paste_inserts_everything() {
        let (buf, _) = accept(b"\x1b[200~ab\x1b[201~\n", Display::Masked);
        assert_eq!(buf, b"ab");

        // Control bytes inside a paste insert literally instead of acting.
        let (buf, _) = accept(b"\x1b[200~a\x03b\x1b[201~\n", Display::Masked);
        assert_eq!(buf, b"a\x03b");
    }

    #[test]
    fn ctrl_c_outside_paste_is_a_signal() {
        let (result, written) = run_editor(b"ab\x03", Display::Masked);
        assert!(matches!(result, Err(Error::Signal(SIGINT))));
        // Finalization still ran.
        assert!(written.ends_with(b"\r\n\x1b[?2004l"));
    }

    #[cfg(not(windows))]
    #[test]
    fn ctrl_backslash_is_sigquit() {
        let (result, _) = run_editor(b"\x1c", Display::Masked);
        assert!(matches!(result, Err(Error::Signal(SIGQUIT))));
    }

    #[test]
    fn navigation_edits_in_the_middle() {
        // "ac", go back one, type "b": caret splices into the middle.
        let (buf, _) = accept(b"ac\x02b\n", Display::Masked);
        assert_eq!(buf, b"abc");

        // Home, delete-forward removes the first scalar.
        let (buf, _) = accept(b"ab\x01\x1b[3~\n", Display::Masked);
        assert_eq!(buf, b"b");

        // Home then End returns the caret to the end: inserts append again.
        let (buf, _) = accept(b"ab\x01\x05c\n", Display::Masked);
        assert_eq!(buf, b"abc");
    }

    #[test]
    fn multibyte_navigation_moves_whole_scalars() {
        let mut feed = Vec::new();
        feed.extend_from_slice("aあ".as_bytes());
        feed.extend_from_slice(b"\x02"); // back over あ (3 bytes)
        feed.extend_from_slice(b"x");
        feed.push(b'\n');
        let (buf, _) = accept(&feed, Display::CaretNotation);
        assert_eq!(buf, "axあ".as_bytes());
    }

    #[test]
    fn backward_then_forward_restores_caret() {
        // k steps back and k steps forward leave appends at the end.
        let (buf, _) = accept(b"abc\x02\x02\x06\x06d\n", Display::Masked);
        assert_eq!(buf, b"abcd");
    }

    #[test]
    fn kill_line_truncates_at_caret() {
        let (buf, _) = accept(b"abcd\x02\x02\x0b\n", Display::Masked);
        assert_eq!(buf, b"ab");
    }

    #[test]
    fn kill_whole_line_clears_and_redraws_prompt() {
        let (buf, written) = accept(b"abcd\x15xy\n", Display::Masked);
        assert_eq!(buf, b"xy");
        let redraw: &[u8] = b"\x08\x08\x08\x08\r\x1b[JPW: ";
        assert!(written
            .windows(redraw.len())
            .any(|window| window == redraw));
    }

    #[test]
    fn refresh_repaints_prompt_and_masked_contents() {
        let (buf, written) = accept(b"ab\x0c\n", Display::Masked);
        assert_eq!(buf, b"ab");
        let repaint: &[u8] = b"\r\x1b[JPW: **";
        assert!(written
            .windows(repaint.len())
            .any(|window| window == repaint));
    }

    #[test]
    fn quoted_insert_hex_byte() {
        let (buf, _) = accept(b"a\x16xffb\n", Display::Masked);
        assert_eq!(buf, &[b'a', 0xff, b'b']);
    }

    #[test]
    fn quoted_insert_unicode_scalar() {
        let (buf, _) = accept(b"\x16u00e9\n", Display::CaretNotation);
        assert_eq!(buf, "é".as_bytes());

        let (buf, _) = accept(b"\x16U0001f980\n", Display::CaretNotation);
        assert_eq!(buf, "🦀".as_bytes());
    }

    #[test]
    fn bare_quoted_insert_takes_next_token_verbatim() {
        // ^V then ^C inserts the control byte instead of signalling.
        let (buf, _) = accept(b"\x16\x03\n", Display::Masked);
        assert_eq!(buf, b"\x03");

        // ^V at end of input stands for itself.
        let (buf, _) = accept(b"\x16", Display::Masked);
        assert_eq!(buf, b"\x16");
    }

    #[test]
    fn blanked_display_emits_no_echo_for_input() {
        let (buf, written) = accept(b"secret\n", Display::Blanked);
        assert_eq!(buf, b"secret");
        let after_preamble = &written[b"\r\x1b[JPW: \x1b[?2004h".len()..];
        assert_eq!(after_preamble, b"\r\n\x1b[?2004l");
    }

    #[test]
    fn unknown_escapes_are_ignored() {
        let (buf, _) = accept(b"a\x1b[5~b\n", Display::Masked);
        assert_eq!(buf, b"ab");
    }
}
