// optiga-rs/src/device/handle.rs

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use crate::bus::TwoWireBus;
use crate::config::Config;
use crate::datalink::DataLink;
use crate::device::descriptor::{completion_pair, ApduRequest, Completion, Outcome, Request};
use crate::device::worker::{reset_stack, Worker};
use crate::nettran::Nettran;
use crate::phy::Phy;
use crate::Result;

/// One driver instance bound to one element on one bus.
///
/// Construction initialises the stack and performs the first reset on the
/// caller's thread; after that a dedicated worker owns the stack and all
/// exchanges go through [`Handle::submit`].
pub struct Optiga {
    handle: Handle,
    worker: Option<thread::JoinHandle<()>>,
}

/// Cheap cloneable submitter for one [`Optiga`] instance.
#[derive(Clone)]
pub struct Handle {
    queue: mpsc::Sender<Request>,
    dead: Arc<AtomicBool>,
    resets: Arc<AtomicU32>,
}

impl Optiga {
    /// Bind the bus, reset the element and start the worker.
    pub fn open(bus: Box<dyn TwoWireBus>, config: Config) -> Result<Self> {
        let phy = Phy::new(bus, &config);
        let mut stack = Nettran::new(DataLink::new(phy));
        reset_stack(&mut stack)?;

        let (queue, requests) = mpsc::channel();
        let dead = Arc::new(AtomicBool::new(false));
        let resets = Arc::new(AtomicU32::new(0));

        let worker = {
            let dead = Arc::clone(&dead);
            let resets = Arc::clone(&resets);
            thread::Builder::new()
                .name("optiga-worker".into())
                .spawn(move || Worker::new(stack, requests, dead, resets).run())
                .map_err(|e| crate::Error::Bus(format!("failed to spawn worker: {}", e)))?
        };

        Ok(Self {
            handle: Handle {
                queue,
                dead,
                resets,
            },
            worker: Some(worker),
        })
    }

    /// Submitter that can be cloned across caller threads.
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    /// Submit on the instance itself; convenience for single-threaded use.
    pub fn submit(&self, request: ApduRequest) -> Completion {
        self.handle.submit(request)
    }

    /// False once the reset budget is exhausted; every subsequent
    /// submission completes immediately with a transport failure.
    pub fn is_alive(&self) -> bool {
        self.handle.is_alive()
    }

    /// Number of stack resets performed since `open` (the initial reset
    /// not included).
    pub fn resets(&self) -> u32 {
        self.handle.resets.load(Ordering::Relaxed)
    }

    /// Stop the worker and wait for it to finish. Outstanding [`Handle`]
    /// clones keep working only until the shutdown request reaches the
    /// front of the queue; their submissions then complete with transport
    /// failures.
    pub fn shutdown(mut self) {
        let _ = self.handle.queue.send(Request::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Handle {
    /// Enqueue one descriptor. Never blocks beyond the queue lock; the
    /// returned completion fires exactly once. Requests against a dead or
    /// closed core complete immediately with a transport failure.
    pub fn submit(&self, request: ApduRequest) -> Completion {
        let (queued, completion) = completion_pair(request);

        if self.dead.load(Ordering::Acquire) {
            queued.complete(Outcome::Transport);
            return completion;
        }

        if let Err(mpsc::SendError(Request::Apdu(rejected))) =
            self.queue.send(Request::Apdu(queued))
        {
            rejected.complete(Outcome::Transport);
        }
        completion
    }

    pub fn is_alive(&self) -> bool {
        !self.dead.load(Ordering::Acquire)
    }
}
