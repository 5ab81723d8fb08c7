use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// What the foreground supervisor should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// Re-read the configuration and hand it to the running engine.
    Reload,
    /// Stop the engine and exit.
    Shutdown {
        /// Signal number that requested the shutdown.
        signal: i32,
    },
}

/// Abstraction over the notifications that drive the supervisor.
pub trait ShutdownSignal {
    /// Blocks until the next event arrives.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the listener can no longer deliver
    /// events.
    fn wait(&mut self) -> Result<SupervisorEvent, ShutdownError>;
}

/// Errors reported by signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The listener was closed before a shutdown signal arrived.
    #[error("signal listener closed unexpectedly")]
    Closed,
}

/// Listener for `SIGINT`, `SIGTERM`, and `SIGHUP`.
///
/// Handlers are installed on construction, so signals arriving between
/// installation and the first [`ShutdownSignal::wait`] are queued rather
/// than killing the process.
pub struct SystemShutdownSignal {
    signals: Signals,
}

impl SystemShutdownSignal {
    /// Installs the handlers.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError::Install`] when registration fails.
    pub fn install() -> Result<Self, ShutdownError> {
        let signals = Signals::new([SIGINT, SIGTERM, SIGHUP])
            .map_err(|source| ShutdownError::Install { source })?;
        Ok(Self { signals })
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&mut self) -> Result<SupervisorEvent, ShutdownError> {
        let signal = self.signals.forever().next().ok_or(ShutdownError::Closed)?;
        info!(target: PROCESS_TARGET, signal, "signal received");
        Ok(classify(signal))
    }
}

fn classify(signal: i32) -> SupervisorEvent {
    if signal == SIGHUP {
        SupervisorEvent::Reload
    } else {
        SupervisorEvent::Shutdown { signal }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SIGINT)]
    #[case(SIGTERM)]
    fn termination_signals_shut_down(#[case] signal: i32) {
        assert_eq!(classify(signal), SupervisorEvent::Shutdown { signal });
    }

    #[test]
    fn hangup_reloads() {
        assert_eq!(classify(SIGHUP), SupervisorEvent::Reload);
    }
}
