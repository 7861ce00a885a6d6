//! Windows console device.
//!
//! Opens `CONIN$`/`CONOUT$` directly so redirected standard handles still
//! reach the console. Raw mode is the virtual-terminal configuration: VT
//! input sequences on the input side, VT processing without auto-newline on
//! the output side. Cancellation tears down a blocked `ReadFile` with
//! `CancelIoEx`.

use std::io::{self, Read, Write};
use std::os::windows::io::{AsRawHandle, FromRawHandle, OwnedHandle, RawHandle};
use std::ptr;

use windows_sys::Win32::Foundation::{
    GENERIC_READ, GENERIC_WRITE, HANDLE, INVALID_HANDLE_VALUE,
};
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileW, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
};
use windows_sys::Win32::System::Console::{
    GetConsoleMode, SetConsoleMode, DISABLE_NEWLINE_AUTO_RETURN, ENABLE_PROCESSED_OUTPUT,
    ENABLE_VIRTUAL_TERMINAL_INPUT, ENABLE_VIRTUAL_TERMINAL_PROCESSING,
    ENABLE_WRAP_AT_EOL_OUTPUT, GetConsoleScreenBufferInfo, CONSOLE_SCREEN_BUFFER_INFO,
};
use windows_sys::Win32::System::IO::CancelIoEx;
use windows_sys::Win32::Storage::FileSystem::{ReadFile, WriteFile};

use crate::error::{cancelled_io_error, Error};

fn open_console(name: &str) -> io::Result<OwnedHandle> {
    let wide: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
    let handle = unsafe {
        CreateFileW(
            wide.as_ptr(),
            GENERIC_READ | GENERIC_WRITE,
            FILE_SHARE_READ | FILE_SHARE_WRITE,
            ptr::null(),
            OPEN_EXISTING,
            0,
            ptr::null_mut(),
        )
    };
    if handle == INVALID_HANDLE_VALUE {
        return Err(io::Error::last_os_error());
    }
    Ok(unsafe { OwnedHandle::from_raw_handle(handle as RawHandle) })
}

/// The console, both directions. Handles are owned and closed on drop.
#[derive(Debug)]
pub struct Terminal {
    conin: OwnedHandle,
    conout: OwnedHandle,
}

impl Terminal {
    /// Open `CONIN$` and `CONOUT$`, or fail with [`Error::NoTerminal`].
    pub fn open() -> Result<Self, Error> {
        let conin = open_console("CONIN$").map_err(|_| Error::NoTerminal)?;
        let conout = open_console("CONOUT$").map_err(|_| Error::NoTerminal)?;
        Ok(Self { conin, conout })
    }

    pub fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut n = 0u32;
        let ok = unsafe {
            ReadFile(
                self.conin.as_raw_handle() as HANDLE,
                buf.as_mut_ptr().cast(),
                buf.len() as u32,
                &mut n,
                ptr::null_mut(),
            )
        };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }

    pub fn write_all(&self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            let mut n = 0u32;
            let ok = unsafe {
                WriteFile(
                    self.conout.as_raw_handle() as HANDLE,
                    buf.as_ptr().cast(),
                    buf.len() as u32,
                    &mut n,
                    ptr::null_mut(),
                )
            };
            if ok == 0 {
                return Err(io::Error::last_os_error());
            }
            buf = &buf[n as usize..];
        }
        Ok(())
    }

    /// Enter the virtual-terminal console configuration. The returned guard
    /// restores both saved modes on drop.
    pub fn raw_mode(&self) -> io::Result<RawModeGuard> {
        let conin = self.conin.as_raw_handle() as HANDLE;
        let conout = self.conout.as_raw_handle() as HANDLE;

        let mut in_mode = 0u32;
        let mut out_mode = 0u32;
        if unsafe { GetConsoleMode(conin, &mut in_mode) } == 0 {
            return Err(io::Error::last_os_error());
        }
        if unsafe { GetConsoleMode(conout, &mut out_mode) } == 0 {
            return Err(io::Error::last_os_error());
        }

        if unsafe { SetConsoleMode(conin, ENABLE_VIRTUAL_TERMINAL_INPUT) } == 0 {
            return Err(io::Error::last_os_error());
        }
        let raw_out = ENABLE_PROCESSED_OUTPUT
            | ENABLE_WRAP_AT_EOL_OUTPUT
            | ENABLE_VIRTUAL_TERMINAL_PROCESSING
            | DISABLE_NEWLINE_AUTO_RETURN;
        if unsafe { SetConsoleMode(conout, raw_out) } == 0 {
            let err = io::Error::last_os_error();
            unsafe { SetConsoleMode(conin, in_mode) };
            return Err(err);
        }
        Ok(RawModeGuard {
            conin,
            conout,
            in_mode,
            out_mode,
        })
    }

    /// Console size as `(columns, rows)`.
    pub fn size(&self) -> io::Result<(u16, u16)> {
        let mut info: CONSOLE_SCREEN_BUFFER_INFO = unsafe { std::mem::zeroed() };
        let conout = self.conout.as_raw_handle() as HANDLE;
        if unsafe { GetConsoleScreenBufferInfo(conout, &mut info) } == 0 {
            return Err(io::Error::last_os_error());
        }
        let cols = (info.srWindow.Right - info.srWindow.Left + 1) as u16;
        let rows = (info.srWindow.Bottom - info.srWindow.Top + 1) as u16;
        Ok((cols, rows))
    }

    pub(crate) fn cancel_reader(&self) -> CancelReader<'_> {
        CancelReader { term: self }
    }

    pub(crate) fn interrupter(&self) -> Interrupter {
        Interrupter {
            conin: self.conin.as_raw_handle() as isize,
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

/// Restores the saved console modes on drop.
#[derive(Debug)]
pub struct RawModeGuard {
    conin: HANDLE,
    conout: HANDLE,
    in_mode: u32,
    out_mode: u32,
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        unsafe {
            SetConsoleMode(self.conin, self.in_mode);
            SetConsoleMode(self.conout, self.out_mode);
        }
    }
}

/// Reader whose blocked `ReadFile` is aborted by the paired [`Interrupter`].
pub(crate) struct CancelReader<'a> {
    term: &'a Terminal,
}

impl Read for CancelReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.term.read(buf) {
            // ERROR_OPERATION_ABORTED: the watcher cancelled the read.
            Err(err) if err.raw_os_error() == Some(995) => Err(cancelled_io_error()),
            other => other,
        }
    }
}

/// Aborts the console read in flight when fired.
#[derive(Debug)]
pub(crate) struct Interrupter {
    conin: isize,
}

// The handle is only passed to CancelIoEx, which is thread-safe.
unsafe impl Send for Interrupter {}

impl Interrupter {
    pub(crate) fn fire(self) {
        unsafe { CancelIoEx(self.conin as HANDLE, ptr::null()) };
    }
}
