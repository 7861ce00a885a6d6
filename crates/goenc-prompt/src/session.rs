//! Prompt session: wires the signal watcher, the cancellation pipe, raw
//! mode, and the line editor together.
//!
//! One session per read. A watcher task selects over delivered signals and
//! the caller's cancellation token; whichever fires first records the cause
//! and tears down the blocked terminal read. The editor then surfaces a
//! generic cancelled error, which the session replaces with the recorded
//! cause before returning.

use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use zeroize::Zeroizing;

use crate::display::Display;
use crate::editor;
use crate::error::Error;
use crate::term::{Interrupter, Terminal};

/// An open prompt over the controlling terminal.
#[derive(Debug)]
pub struct Prompt {
    term: Terminal,
}

impl Prompt {
    /// Open the controlling terminal for prompting.
    pub fn open() -> Result<Self, Error> {
        Ok(Self {
            term: Terminal::open()?,
        })
    }

    /// Read a line echoed in caret notation.
    pub async fn read_line(
        &mut self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<Zeroizing<Vec<u8>>, Error> {
        self.read_raw(prompt, Display::CaretNotation, cancel).await
    }

    /// Read a line echoed as `*` per character.
    pub async fn read_password(
        &mut self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<Zeroizing<Vec<u8>>, Error> {
        self.read_raw(prompt, Display::Masked, cancel).await
    }

    /// Read a line with no echo at all.
    pub async fn read_no_echo(
        &mut self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<Zeroizing<Vec<u8>>, Error> {
        self.read_raw(prompt, Display::Blanked, cancel).await
    }

    /// Read a line through an explicit display policy.
    ///
    /// Takes `&mut self`: only one session may drive the terminal at a time.
    pub async fn read_raw(
        &mut self,
        prompt: &str,
        display: Display,
        cancel: &CancellationToken,
    ) -> Result<Zeroizing<Vec<u8>>, Error> {
        let cause: Arc<Mutex<Option<Error>>> = Arc::new(Mutex::new(None));

        #[cfg(unix)]
        let (pipe_rd, interrupter) = crate::term::pipe()?;
        #[cfg(windows)]
        let interrupter = self.term.interrupter();

        let watcher = tokio::spawn(watch_for_interrupt(
            interrupter,
            cancel.clone(),
            Arc::clone(&cause),
        ));

        #[cfg(unix)]
        let reader = self.term.cancel_reader(&pipe_rd);
        #[cfg(windows)]
        let reader = self.term.cancel_reader();

        let display_policy = display;
        tracing::debug!(?display_policy, "prompt session started");
        let guard = match self.term.raw_mode() {
            Ok(guard) => guard,
            Err(err) => {
                watcher.abort();
                return Err(Error::Io(err));
            }
        };
        let result = editor::edit(reader, &self.term, prompt, display);
        drop(guard);

        watcher.abort();
        let _ = watcher.await;

        let result = match result {
            Err(Error::Cancelled) => {
                let recorded = cause.lock().ok().and_then(|mut slot| slot.take());
                Err(recorded.unwrap_or(Error::Cancelled))
            }
            other => other,
        };
        match &result {
            Ok(_) => tracing::debug!("prompt session accepted"),
            Err(err) => tracing::debug!(error = %err, "prompt session ended"),
        }
        result
    }
}

async fn watch_for_interrupt(
    interrupter: Interrupter,
    cancel: CancellationToken,
    cause: Arc<Mutex<Option<Error>>>,
) {
    let why = interrupt_cause(&cancel).await;
    tracing::debug!(cause = %why, "interrupting terminal read");
    if let Ok(mut slot) = cause.lock() {
        *slot = Some(why);
    }
    interrupter.fire();
}

#[cfg(unix)]
async fn interrupt_cause(cancel: &CancellationToken) -> Error {
    use tokio::signal::unix::{signal, SignalKind};

    let streams = (|| -> std::io::Result<_> {
        Ok((
            signal(SignalKind::hangup())?,
            signal(SignalKind::interrupt())?,
            signal(SignalKind::quit())?,
            signal(SignalKind::terminate())?,
        ))
    })();

    match streams {
        Ok((mut hangup, mut interrupt, mut quit, mut terminate)) => {
            tokio::select! {
                _ = cancel.cancelled() => Error::Cancelled,
                _ = hangup.recv() => Error::Signal(libc::SIGHUP),
                _ = interrupt.recv() => Error::Signal(libc::SIGINT),
                _ = quit.recv() => Error::Signal(libc::SIGQUIT),
                _ = terminate.recv() => Error::Signal(libc::SIGTERM),
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "signal handler installation failed");
            cancel.cancelled().await;
            Error::Cancelled
        }
    }
}

#[cfg(windows)]
async fn interrupt_cause(cancel: &CancellationToken) -> Error {
    use tokio::signal::windows::{ctrl_break, ctrl_c};

    let streams = (|| -> std::io::Result<_> { Ok((ctrl_c()?, ctrl_break()?)) })();

    match streams {
        Ok((mut interrupt, mut brk)) => {
            tokio::select! {
                _ = cancel.cancelled() => Error::Cancelled,
                _ = interrupt.recv() => Error::Signal(editor::SIGINT),
                _ = brk.recv() => Error::Signal(editor::SIGINT),
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "console handler installation failed");
            cancel.cancelled().await;
            Error::Cancelled
        }
    }
}
