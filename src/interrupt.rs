//! OS interrupts as quit requests.
//!
//! In raw mode Ctrl+C arrives as a key, but `kill`, a closed terminal, or a
//! SIGINT from another process still arrive as signals. The handlers only
//! set a flag; the UI loop polls it and quits through the normal teardown.
//! A second signal while the first is pending exits immediately.

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::{flag, SigId};
use std::ffi::c_int;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(unix)]
const SIGNALS: [c_int; 3] = [SIGINT, SIGTERM, signal_hook::consts::SIGHUP];
#[cfg(not(unix))]
const SIGNALS: [c_int; 2] = [SIGINT, SIGTERM];

/// Exit status when a second signal forces the process down.
const FORCED_EXIT: c_int = 1;

/// A quit request raised by a signal. Handlers are removed on drop.
#[derive(Debug)]
pub struct Interrupt {
    raised: Arc<AtomicBool>,
    hooks: Vec<SigId>,
}

impl Interrupt {
    /// A flag with no signals attached. Only [`raise`](Self::raise) sets it.
    pub fn detached() -> Self {
        Self {
            raised: Arc::new(AtomicBool::new(false)),
            hooks: Vec::new(),
        }
    }

    /// Attach SIGINT, SIGTERM and (on Unix) SIGHUP.
    ///
    /// # Errors
    ///
    /// Returns an error if a handler cannot be registered.
    pub fn install() -> io::Result<Self> {
        let mut interrupt = Self::detached();
        for signal in SIGNALS {
            // registered first, so it sees the flag as it was before this signal
            interrupt.hooks.push(flag::register_conditional_shutdown(
                signal,
                FORCED_EXIT,
                Arc::clone(&interrupt.raised),
            )?);
            interrupt
                .hooks
                .push(flag::register(signal, Arc::clone(&interrupt.raised))?);
        }
        tracing::debug!(signals = ?SIGNALS, "interrupt handlers installed");
        Ok(interrupt)
    }

    /// Whether a quit was requested.
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Request a quit without a signal.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }
}

impl Drop for Interrupt {
    fn drop(&mut self) {
        for id in self.hooks.drain(..) {
            signal_hook::low_level::unregister(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_starts_clear() {
        let interrupt = Interrupt::detached();
        assert!(!interrupt.is_raised());
        interrupt.raise();
        assert!(interrupt.is_raised());
    }

    #[test]
    fn test_install_registers_two_hooks_per_signal() {
        let interrupt = Interrupt::install().unwrap();
        assert_eq!(interrupt.hooks.len(), 2 * SIGNALS.len());
        assert!(!interrupt.is_raised());
    }
}
