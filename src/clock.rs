// Free-running session timer on its own thread.
//
// The loop sleeps one tick, checks the running flag, then bumps the tick
// counter under its lock. `stop` clears the flag and joins, so once it
// returns the counter is frozen. A loop that errors or panics records the
// reason in `fault`; the owner sees it through `status` until `stop` (or a
// restart) hands it back as an error.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error};

use crate::error::EarError;

pub const DEFAULT_TICK: Duration = Duration::from_nanos(1_000_000_000 / 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockStatus {
    Stopped,
    Running,
    Faulted(String),
}

type TickHook = Box<dyn FnMut(u64) -> Result<(), EarError> + Send>;

pub struct SessionClock {
    tick: Duration,
    ticks: Arc<Mutex<u64>>,
    running: Arc<AtomicBool>,
    fault: Arc<Mutex<Option<String>>>,
    thread: Option<JoinHandle<()>>,
}

impl SessionClock {
    pub fn new(tick: Duration) -> Self {
        SessionClock {
            tick,
            ticks: Arc::new(Mutex::new(0)),
            running: Arc::new(AtomicBool::new(false)),
            fault: Arc::new(Mutex::new(None)),
            thread: None,
        }
    }

    pub fn start(&mut self) -> Result<(), EarError> {
        self.start_with_hook(|_| Ok(()))
    }

    /// Start the loop, calling `hook` with the new tick count after every
    /// increment. An `Err` from the hook faults the clock.
    pub fn start_with_hook<F>(&mut self, hook: F) -> Result<(), EarError>
    where
        F: FnMut(u64) -> Result<(), EarError> + Send + 'static,
    {
        if self.thread.is_some() {
            if self.running.load(Ordering::SeqCst) {
                return Ok(());
            }
            // previous loop died on its own; reap it before restarting
            self.join()?;
        }

        *self.fault.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.running.store(true, Ordering::SeqCst);

        let tick = self.tick;
        let ticks = Arc::clone(&self.ticks);
        let running = Arc::clone(&self.running);
        let fault = Arc::clone(&self.fault);
        let hook: TickHook = Box::new(hook);

        let thread = thread::Builder::new()
            .name("session-clock".to_string())
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| run_loop(tick, &ticks, &running, hook)));
                let reason = match outcome {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => Some(e.to_string()),
                    Err(payload) => Some(panic_message(payload.as_ref())),
                };
                if let Some(reason) = reason {
                    error!("Session clock stopped: {}", reason);
                    *fault.lock().unwrap_or_else(PoisonError::into_inner) = Some(reason);
                }
                running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| EarError::ClockFault(e.to_string()))?;

        self.thread = Some(thread);
        debug!(tick_ms = self.tick.as_secs_f64() * 1000.0, "session clock started");
        Ok(())
    }

    /// Signal the loop to exit and wait until it has. Reports a fault the
    /// loop hit while running.
    pub fn stop(&mut self) -> Result<(), EarError> {
        self.running.store(false, Ordering::SeqCst);
        self.join()
    }

    fn join(&mut self) -> Result<(), EarError> {
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                return Err(EarError::ClockFault("clock thread panicked".to_string()));
            }
        }
        // a fault is reported once, then the clock counts as stopped
        match self.fault.lock().unwrap_or_else(PoisonError::into_inner).take() {
            Some(reason) => Err(EarError::ClockFault(reason)),
            None => Ok(()),
        }
    }

    pub fn status(&self) -> ClockStatus {
        if let Some(reason) = self.fault.lock().unwrap_or_else(PoisonError::into_inner).clone() {
            return ClockStatus::Faulted(reason);
        }
        if self.running.load(Ordering::SeqCst) {
            ClockStatus::Running
        } else {
            ClockStatus::Stopped
        }
    }

    pub fn ticks(&self) -> u64 {
        *self.ticks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_secs_f64(self.elapsed_secs())
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.tick.as_secs_f64() * self.ticks() as f64
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        SessionClock::new(DEFAULT_TICK)
    }
}

impl Drop for SessionClock {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn run_loop(tick: Duration, ticks: &Mutex<u64>, running: &AtomicBool, mut hook: TickHook) -> Result<(), EarError> {
    loop {
        thread::sleep(tick);
        if !running.load(Ordering::SeqCst) {
            return Ok(());
        }
        let count = {
            let mut t = ticks
                .lock()
                .map_err(|_| EarError::ClockFault("elapsed counter poisoned".to_string()))?;
            *t += 1;
            *t
        };
        hook(count)?;
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "clock loop panicked".to_string()
    }
}
