//! Background jobs polled from the GUI thread.
//!
//! Each job runs on its own thread with a current-thread tokio runtime and
//! reports a single result back over a std channel.

use anyhow::{anyhow, Result};
use std::future::Future;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};
use tokio::runtime::Builder;

pub struct AsyncJob<T> {
    receiver: Option<Receiver<Result<T>>>,
    started: Instant,
}

impl<T: Send + 'static> AsyncJob<T> {
    /// Run the future produced by `builder` on a worker thread.
    ///
    /// The future itself does not need to be `Send`; only the builder crosses
    /// the thread boundary.
    pub fn spawn<FutBuilder, Fut>(builder: FutBuilder) -> Self
    where
        FutBuilder: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime.block_on(builder()),
                Err(e) => Err(anyhow!("Failed to create async runtime: {}", e)),
            };
            let _ = tx.send(result);
        });
        Self::new(rx)
    }
}

impl<T> AsyncJob<T> {
    pub fn new(receiver: Receiver<Result<T>>) -> Self {
        Self {
            receiver: Some(receiver),
            started: Instant::now(),
        }
    }

    /// Returns `Some(result)` once the job has finished, `None` while running.
    /// A worker that dies without reporting yields an error.
    pub fn poll(&mut self) -> Option<Result<T>> {
        let rx = self.receiver.as_ref()?;
        match rx.try_recv() {
            Ok(res) => {
                self.receiver = None;
                Some(res)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.receiver = None;
                Some(Err(anyhow!("Worker task disconnected")))
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.receiver.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
