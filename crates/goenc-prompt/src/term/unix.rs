//! POSIX terminal device.
//!
//! The terminal is opened by its own file descriptor rather than assuming
//! stdin/stdout, since either may be redirected to carry data. Candidate
//! device paths are probed in order and the first one that is actually a
//! terminal wins.

use std::ffi::CStr;
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use crate::error::{cancelled_io_error, Error};

const DEVICES: &[&CStr] = &[
    c"/proc/self/fd/0",
    c"/proc/self/fd/1",
    c"/proc/self/fd/2",
    c"/dev/fd/0",
    c"/dev/fd/1",
    c"/dev/fd/2",
    c"/dev/stdin",
    c"/dev/stdout",
    c"/dev/stderr",
    c"/dev/tty",
    c"/dev/console",
];

/// The controlling terminal. The descriptor is owned and closed on drop.
#[derive(Debug)]
pub struct Terminal {
    fd: OwnedFd,
}

impl Terminal {
    /// Open the controlling terminal, or fail with [`Error::NoTerminal`].
    pub fn open() -> Result<Self, Error> {
        for device in DEVICES {
            let fd = unsafe { libc::open(device.as_ptr(), libc::O_RDWR | libc::O_NOCTTY) };
            if fd < 0 {
                continue;
            }
            if unsafe { libc::isatty(fd) } == 1 {
                return Ok(Self {
                    fd: unsafe { OwnedFd::from_raw_fd(fd) },
                });
            }
            unsafe { libc::close(fd) };
        }
        Err(Error::NoTerminal)
    }

    /// Read up to `buf.len()` bytes, retrying on `EINTR`.
    pub fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let n = unsafe {
                libc::read(
                    self.fd.as_raw_fd(),
                    buf.as_mut_ptr() as *mut libc::c_void,
                    buf.len(),
                )
            };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    /// Write all of `buf`, retrying on `EINTR` and short writes.
    pub fn write_all(&self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            let n = unsafe {
                libc::write(
                    self.fd.as_raw_fd(),
                    buf.as_ptr() as *const libc::c_void,
                    buf.len(),
                )
            };
            if n >= 0 {
                buf = &buf[n as usize..];
                continue;
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
        Ok(())
    }

    /// Enter raw mode. The returned guard restores the previous mode when
    /// dropped, on every exit path including panics.
    pub fn raw_mode(&self) -> io::Result<RawModeGuard> {
        let fd = self.fd.as_raw_fd();
        let mut termios = std::mem::MaybeUninit::<libc::termios>::uninit();
        if unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        let saved = unsafe { termios.assume_init() };

        let mut raw = saved;
        unsafe { libc::cfmakeraw(&mut raw) };
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &raw) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(RawModeGuard { fd, saved })
    }

    /// Terminal size as `(columns, rows)`.
    pub fn size(&self) -> io::Result<(u16, u16)> {
        let mut ws = libc::winsize {
            ws_row: 0,
            ws_col: 0,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        if unsafe { libc::ioctl(self.fd.as_raw_fd(), libc::TIOCGWINSZ, &mut ws as *mut libc::winsize) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok((ws.ws_col, ws.ws_row))
    }

    /// A reader whose blocking read is torn down when the paired
    /// [`Interrupter`] fires.
    pub(crate) fn cancel_reader<'a>(&'a self, cancel: &'a OwnedFd) -> CancelReader<'a> {
        CancelReader {
            term: self,
            cancel_fd: cancel.as_raw_fd(),
        }
    }
}

impl Read for &Terminal {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Terminal::read(*self, buf)
    }
}

impl Write for &Terminal {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Terminal::write_all(*self, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Restores the saved terminal mode on drop.
pub struct RawModeGuard {
    fd: RawFd,
    saved: libc::termios,
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // Nothing useful can be done if restore fails during teardown.
        unsafe { libc::tcsetattr(self.fd, libc::TCSANOW, &self.saved) };
    }
}

/// Reader that polls the terminal alongside the cancellation pipe.
///
/// When the pipe's write end closes before the terminal has data, the read
/// fails with the internal cancellation marker instead of blocking forever.
pub(crate) struct CancelReader<'a> {
    term: &'a Terminal,
    cancel_fd: RawFd,
}

impl Read for CancelReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut fds = [
            libc::pollfd {
                fd: self.term.fd.as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            },
            libc::pollfd {
                fd: self.cancel_fd,
                events: libc::POLLIN,
                revents: 0,
            },
        ];
        loop {
            let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, -1) };
            if rc >= 0 {
                break;
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
        if fds[0].revents != 0 {
            return self.term.read(buf);
        }
        Err(cancelled_io_error())
    }
}

/// Close-on-fire end of the cancellation pipe, held by the watcher task.
#[derive(Debug)]
pub(crate) struct Interrupter {
    _write_end: OwnedFd,
}

impl Interrupter {
    /// Unblock the paired [`CancelReader`] by closing the pipe's write end.
    pub(crate) fn fire(self) {}
}

/// A close-on-exec pipe: `(read_end, interrupter)`.
pub(crate) fn pipe() -> io::Result<(OwnedFd, Interrupter)> {
    let mut fds = [0 as RawFd; 2];
    if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
        return Err(io::Error::last_os_error());
    }
    let read_end = unsafe { OwnedFd::from_raw_fd(fds[0]) };
    let write_end = unsafe { OwnedFd::from_raw_fd(fds[1]) };
    for fd in [&read_end, &write_end] {
        unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_SETFD, libc::FD_CLOEXEC) };
    }
    Ok((
        read_end,
        Interrupter {
            _write_end: write_end,
        },
    ))
}
