//! Platform terminal device: open the controlling terminal, raw mode with
//! scoped restore, EINTR-safe I/O, and cancellable reads.

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::{RawModeGuard, Terminal};
#[cfg(unix)]
pub(crate) use unix::{pipe, Interrupter};

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::{RawModeGuard, Terminal};
#[cfg(windows)]
pub(crate) use windows::Interrupter;
