//! Serial-port modem control lines, pulsed so an oscilloscope can see
//! triggers and new max-ever events.

use crate::models::module_config::PulseSignal;
use crate::utils::error::Result;

#[cfg(target_os = "linux")]
pub use self::linux::TtyControl;

#[cfg(not(target_os = "linux"))]
pub use self::unsupported::TtyControl;

#[cfg(target_os = "linux")]
mod linux {
    use std::fs::{File, OpenOptions};
    use std::os::unix::fs::OpenOptionsExt;
    use std::os::unix::io::AsRawFd;
    use std::sync::{Mutex, PoisonError};
    use tracing::debug;

    use super::{PulseSignal, Result};
    use crate::utils::error::RkjmError;

    /// Open serial port with a cached modem status word
    #[derive(Debug)]
    pub struct TtyControl {
        file: File,
        status: Mutex<libc::c_int>,
    }

    impl TtyControl {
        pub fn open(port: &str) -> Result<Self> {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .custom_flags(libc::O_NOCTTY | libc::O_NDELAY)
                .open(port)
                .map_err(|e| RkjmError::ConfigError(format!("Cannot open tty '{port}': {e}")))?;

            let mut status: libc::c_int = 0;
            #[allow(unsafe_code)]
            // SAFETY: the descriptor is open for the lifetime of `file` and
            // TIOCMGET writes a single c_int into `status`.
            let ret = unsafe { libc::ioctl(file.as_raw_fd(), libc::TIOCMGET, &mut status as *mut libc::c_int) };
            if ret == -1 {
                return Err(RkjmError::ConfigError(format!(
                    "ioctl TIOCMGET on '{port}' failed: {}",
                    std::io::Error::last_os_error()
                )));
            }

            debug!(port, status, "opened tty control port");
            Ok(Self {
                file,
                status: Mutex::new(status),
            })
        }

        fn set_line(&self, line: libc::c_int, value: bool) {
            let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
            if value {
                *status |= line;
            } else {
                *status &= !line;
            }

            #[allow(unsafe_code)]
            // SAFETY: TIOCMSET reads a single c_int from the pointer.
            let ret = unsafe { libc::ioctl(self.file.as_raw_fd(), libc::TIOCMSET, &*status as *const libc::c_int) };
            if ret == -1 {
                debug!(error = %std::io::Error::last_os_error(), "ioctl TIOCMSET failed");
            }
        }

        pub fn pulse(&self, signal: PulseSignal) {
            let (line, first) = match signal {
                PulseSignal::Rts => (libc::TIOCM_RTS, true),
                PulseSignal::RtsNeg => (libc::TIOCM_RTS, false),
                PulseSignal::Dtr => (libc::TIOCM_DTR, true),
                PulseSignal::DtrNeg => (libc::TIOCM_DTR, false),
            };
            self.set_line(line, first);
            self.set_line(line, !first);
        }
    }
}

#[cfg(not(target_os = "linux"))]
mod unsupported {
    use super::{PulseSignal, Result};
    use crate::utils::error::RkjmError;

    #[derive(Debug)]
    pub struct TtyControl;

    impl TtyControl {
        pub fn open(_port: &str) -> Result<Self> {
            Err(RkjmError::ConfigError(
                "tty_control_signals not supported on this architecture".to_string(),
            ))
        }

        pub fn pulse(&self, _signal: PulseSignal) {}
    }
}

/// Pulse `signal` on `tty` when both are present
pub fn pulse(tty: Option<&TtyControl>, signal: Option<PulseSignal>) {
    if let (Some(tty), Some(signal)) = (tty, signal) {
        tty.pulse(signal);
    }
}
