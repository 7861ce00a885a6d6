//! goenc-prompt: interactive secret input on the controlling terminal
//!
//! A raw-mode line editor that reads from the terminal device directly
//! (not stdin, which may carry data), supports Emacs-style editing keys,
//! arrow/Home/End escape sequences, bracketed paste, and quoted-insert hex
//! escapes, and echoes through a pluggable display policy: caret-notation
//! echo for plain lines, `*` masking for passwords, or nothing at all.
//!
//! Reads are cancellable two ways: a caller-supplied
//! [`tokio_util::sync::CancellationToken`], and HUP/INT/QUIT/TERM signals
//! observed by a watcher task. Either unblocks the pending terminal read;
//! signals surface as [`Error::Signal`] so callers can exit `128+n`.
//!
//! ```no_run
//! # async fn demo() -> Result<(), goenc_prompt::Error> {
//! use tokio_util::sync::CancellationToken;
//!
//! let mut prompt = goenc_prompt::Prompt::open()?;
//! let cancel = CancellationToken::new();
//! let password = prompt.read_password("Password: ", &cancel).await?;
//! # Ok(()) }
//! ```

mod action;
mod display;
mod editor;
mod error;
mod scan;
mod session;
mod term;
mod utf8;

pub use display::Display;
pub use error::Error;
pub use session::Prompt;
pub use term::{RawModeGuard, Terminal};
