use std::io;

use thiserror::Error;

/// Errors produced while prompting on the terminal.
#[derive(Debug, Error)]
pub enum Error {
    /// No controlling terminal could be opened.
    #[error("failed to open the terminal")]
    NoTerminal,

    /// A read, write, or mode change against the terminal failed.
    #[error("terminal I/O: {0}")]
    Io(#[from] io::Error),

    /// The prompt was interrupted by a signal (in-band ^C/^\ or delivered).
    #[error("interrupted by signal {0}")]
    Signal(i32),

    /// The caller's cancellation token fired.
    #[error("prompt cancelled")]
    Cancelled,
}

/// Marker payload inside an `io::ErrorKind::Interrupted` error that tells the
/// editor the read was torn down by the cancellation pipe rather than by a
/// stray EINTR (the terminal layer already retries those).
#[derive(Debug)]
pub(crate) struct ReadCancelled;

impl std::fmt::Display for ReadCancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("read cancelled")
    }
}

impl std::error::Error for ReadCancelled {}

pub(crate) fn cancelled_io_error() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, ReadCancelled)
}

pub(crate) fn is_cancelled(err: &io::Error) -> bool {
    err.get_ref().is_some_and(|inner| inner.is::<ReadCancelled>())
}
