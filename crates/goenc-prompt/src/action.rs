//! Pure mapping from an input token to a line-editor action.

/// What the editor should do with one scanned token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    InsertChar,
    QuotedInsert,
    Ignore,
    Accept,
    Sigint,
    Sigquit,
    BeginningOfLine,
    EndOfLine,
    BackwardChar,
    ForwardChar,
    DeleteBackwardChar,
    DeleteForwardChar,
    KillLine,
    KillWholeLine,
    Refresh,
    PasteStart,
    PasteEnd,
}

/// Map `token` to an action. `token` must be non-empty.
///
/// While a bracketed paste is open, only the paste-end sequence gets out;
/// every other token, control bytes included, is inserted literally.
pub(crate) fn map_token(token: &[u8], in_paste: bool) -> Action {
    if in_paste {
        return if token == b"\x1b[201~" {
            Action::PasteEnd
        } else {
            Action::InsertChar
        };
    }

    if token[0] >= 0x20 && token[0] != 0x7f {
        return Action::InsertChar;
    }

    match token[0] {
        0x01 => Action::BeginningOfLine,    // ^A
        0x02 => Action::BackwardChar,       // ^B
        0x03 => Action::Sigint,             // ^C
        0x04 => Action::Accept,             // ^D
        0x05 => Action::EndOfLine,          // ^E
        0x06 => Action::ForwardChar,        // ^F
        0x08 => Action::DeleteBackwardChar, // ^H
        0x09 => Action::InsertChar,         // Tab
        0x0a => Action::Accept,             // ^J
        0x0b => Action::KillLine,           // ^K
        0x0c => Action::Refresh,            // ^L
        0x0d => Action::Accept,             // ^M
        0x15 => Action::KillWholeLine,      // ^U
        0x16 => Action::QuotedInsert,       // ^V
        0x1b => map_escape(token),
        0x1c => {
            // SIGQUIT does not exist on Windows; swallow ^\ there.
            if cfg!(windows) {
                Action::Ignore
            } else {
                Action::Sigquit
            }
        }
        0x7f => Action::DeleteBackwardChar, // DEL
        _ => Action::Ignore,
    }
}

fn map_escape(token: &[u8]) -> Action {
    match token {
        [0x1b, b'[', b'C'] | [0x1b, b'O', b'C'] => Action::ForwardChar,
        [0x1b, b'[', b'D'] | [0x1b, b'O', b'D'] => Action::BackwardChar,
        [0x1b, b'[', b'1', b'~']
        | [0x1b, b'[', b'7', b'~']
        | [0x1b, b'[', b'H']
        | [0x1b, b'O', b'H'] => Action::BeginningOfLine,
        [0x1b, b'[', b'4', b'~']
        | [0x1b, b'[', b'8', b'~']
        | [0x1b, b'[', b'F']
        | [0x1b, b'O', b'F'] => Action::EndOfLine,
        [0x1b, b'[', b'3', b'~'] => Action::DeleteForwardChar,
        [0x1b, b'[', b'2', b'0', b'0', b'~'] => Action::PasteStart,
        [0x1b, b'O', b'M'] => Action::Accept, // keypad Enter
        _ => Action::Ignore,
    }
}
