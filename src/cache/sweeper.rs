//! Background staleness sweep for the adaptive cache.
//!
//! The sweeper is a named OS thread parked on a stop channel with
//! `recv_timeout(cleanup_interval)`. It only holds a `Weak` reference to the
//! cache state, so a forgotten cache still gets freed; the thread exits on the
//! next tick once the state is gone. A panic inside a sweep is caught and
//! logged, and the thread keeps running.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};

use tracing::{debug, error};

use super::adaptive::Shared;

/// Thread name, visible in debuggers and panic messages
pub(crate) const SWEEPER_THREAD_NAME: &str = "route-cache-sweeper";

/// Handle to a running sweeper thread
pub(crate) struct Sweeper {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Spawn the sweeper for `shared`.
    ///
    /// Spawn failure is logged and leaves the cache without a sweeper; capacity
    /// eviction keeps working.
    pub(crate) fn start<V>(shared: &Arc<Shared<V>>) -> Option<Self>
    where
        V: Send + Sync + 'static,
    {
        Self::start_with(shared, |shared| {
            shared.sweep();
        })
    }

    /// Spawn a sweeper that runs `sweep` on every tick
    pub(crate) fn start_with<V, F>(shared: &Arc<Shared<V>>, sweep: F) -> Option<Self>
    where
        V: Send + Sync + 'static,
        F: Fn(&Shared<V>) + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let weak: Weak<Shared<V>> = Arc::downgrade(shared);
        let interval = shared.config.cleanup_interval;

        let spawned = thread::Builder::new()
            .name(SWEEPER_THREAD_NAME.to_string())
            .spawn(move || {
                debug!(interval_ms = interval.as_millis(), "Route cache sweeper started");
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let Some(shared) = weak.upgrade() else {
                                break;
                            };
                            let swept = catch_unwind(AssertUnwindSafe(|| sweep(shared.as_ref())));
                            if let Err(panic) = swept {
                                error!(
                                    panic = ?panic_message(panic.as_ref()),
                                    "Route cache sweep panicked"
                                );
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("Route cache sweeper stopped");
            });

        match spawned {
            Ok(handle) => Some(Self { stop_tx, handle }),
            Err(e) => {
                error!(error = %e, "Failed to spawn route cache sweeper");
                None
            }
        }
    }

    /// Signal the thread and wait for it to exit.
    ///
    /// An in-progress sweep finishes first.
    pub(crate) fn stop(self) {
        // A send error means the thread already exited.
        if self.stop_tx.send(()).is_err() {
            debug!("Route cache sweeper already stopped");
        }
        if let Err(panic) = self.handle.join() {
            error!(
                panic = ?panic_message(panic.as_ref()),
                "Route cache sweeper thread panicked"
            );
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_payloads() {
        let caught = catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "boom");
        let caught = catch_unwind(|| panic!("{} {}", "formatted", 1)).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "formatted 1");
        let caught = catch_unwind(|| std::panic::panic_any(7_u8)).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "<non-string panic payload>");
    }
}
