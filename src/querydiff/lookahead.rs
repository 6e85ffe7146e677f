//! Lookahead queue
//!
//! Adds peek-without-consume to a forward-only [`RowIterator`] and moves row
//! production onto a background worker, so fetch latency on one side does not
//! stall comparison on the other.
//!
//! The worker hands items over a bounded channel tagged as row, failure or
//! end of stream. "Done" is therefore read off the channel itself: an empty
//! buffer while the worker is still fetching blocks instead of looking
//! exhausted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, warn};

use super::config::DiffConfig;
use super::merge::Side;
use crate::executor::{ExecutorError, ExecutorResult, Fetch, RowIterator};
use crate::value::Row;

/// Write-once error slot shared by both sides of a session; first error wins
pub(crate) type SharedError = Arc<OnceLock<ExecutorError>>;

/// Records `err` unless an earlier error is already held
pub(crate) fn record(errors: &SharedError, err: ExecutorError) {
    if errors.set(err).is_err() {
        debug!("later query diff error dropped; first error wins");
    }
}

/// Returns the recorded error, if any
pub(crate) fn recorded(errors: &SharedError) -> ExecutorResult<()> {
    match errors.get() {
        Some(err) => Err(err.clone()),
        None => Ok(()),
    }
}

enum Prefetched {
    Row(Row),
    Failed(ExecutorError),
    End,
}

/// Buffers one side's rows ahead of the merge
pub struct LookaheadQueue {
    side: Side,
    worker_name: String,
    capacity: usize,
    /// Held until the worker starts
    source: Option<Box<dyn RowIterator>>,
    receiver: Option<Receiver<Prefetched>>,
    worker: Option<JoinHandle<ExecutorResult<()>>>,
    stop: Arc<AtomicBool>,
    head: Option<Row>,
    exhausted: bool,
    closed: bool,
    errors: SharedError,
}

impl LookaheadQueue {
    pub(crate) fn new(
        side: Side,
        source: Box<dyn RowIterator>,
        config: &DiffConfig,
        errors: SharedError,
    ) -> Self {
        Self {
            side,
            worker_name: config.worker_name(side),
            capacity: config.prefetch_capacity.max(1),
            source: Some(source),
            receiver: None,
            worker: None,
            stop: Arc::new(AtomicBool::new(false)),
            head: None,
            exhausted: false,
            closed: false,
            errors,
        }
    }

    /// Starts the background fetch on first call; later calls do nothing
    pub fn maybe_start(&mut self) -> ExecutorResult<()> {
        if self.closed {
            return Err(ExecutorError::execution_failed(format!(
                "{} lookahead queue is closed",
                self.side
            )));
        }
        let Some(source) = self.source.take() else {
            return Ok(());
        };

        let (sender, receiver) = channel::bounded(self.capacity);
        let stop = Arc::clone(&self.stop);
        let errors = Arc::clone(&self.errors);
        let side = self.side;

        let worker = std::thread::Builder::new()
            .name(self.worker_name.clone())
            .spawn(move || Self::worker_loop(side, source, sender, stop, errors))
            .map_err(|err| {
                ExecutorError::worker_failed(format!(
                    "failed to spawn {} prefetch worker: {}",
                    side, err
                ))
            })?;

        debug!(side = %self.side, worker = %self.worker_name, "prefetch worker started");
        self.receiver = Some(receiver);
        self.worker = Some(worker);
        Ok(())
    }

    fn worker_loop(
        side: Side,
        mut source: Box<dyn RowIterator>,
        sender: Sender<Prefetched>,
        stop: Arc<AtomicBool>,
        errors: SharedError,
    ) -> ExecutorResult<()> {
        let mut fetched = 0usize;
        while !stop.load(Ordering::Acquire) {
            let item = match source.next() {
                Ok(Fetch::Row(row)) => Prefetched::Row(row),
                Ok(Fetch::Retry) => continue,
                Ok(Fetch::End) => Prefetched::End,
                Err(err) => {
                    warn!(side = %side, error = %err, "prefetch failed");
                    record(&errors, err.clone());
                    Prefetched::Failed(err)
                }
            };
            let last = !matches!(item, Prefetched::Row(_));
            if !last {
                fetched += 1;
            }
            // A dropped receiver means the queue was closed
            if sender.send(item).is_err() || last {
                break;
            }
        }
        debug!(side = %side, rows = fetched, "prefetch worker stopping");

        let closed = source.close();
        if let Err(err) = &closed {
            record(&errors, err.clone());
        }
        closed
    }

    /// Pulls the next item into `head` unless one is buffered or the stream
    /// is over. Blocks while the worker is still fetching.
    fn fill(&mut self) -> ExecutorResult<()> {
        recorded(&self.errors)?;
        if self.head.is_some() || self.exhausted {
            return Ok(());
        }
        self.maybe_start()?;

        let received = match self.receiver.as_mut() {
            Some(receiver) => receiver.recv().ok(),
            None => None,
        };
        match received {
            Some(Prefetched::Row(row)) => self.head = Some(row),
            Some(Prefetched::Failed(err)) => {
                self.exhausted = true;
                return Err(err);
            }
            Some(Prefetched::End) => self.exhausted = true,
            None => {
                self.exhausted = true;
                recorded(&self.errors)?;
                return Err(ExecutorError::worker_failed(format!(
                    "{} prefetch worker stopped before end of stream",
                    self.side
                )));
            }
        }

        // The other side may have failed while this one was waiting
        recorded(&self.errors)
    }

    /// Returns the next unconsumed row without removing it
    pub fn peek(&mut self) -> ExecutorResult<Option<&Row>> {
        self.fill()?;
        Ok(self.head.as_ref())
    }

    /// Removes and returns the next unconsumed row
    pub fn pop(&mut self) -> ExecutorResult<Option<Row>> {
        self.fill()?;
        Ok(self.head.take())
    }

    /// True once every row was consumed and the source reported its end
    pub fn is_done(&mut self) -> ExecutorResult<bool> {
        self.fill()?;
        Ok(self.head.is_none())
    }

    /// Stops fetching, closes the source and returns the session's first
    /// error. Calling it again returns `Ok(())`.
    pub fn close(&mut self) -> ExecutorResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stop.store(true, Ordering::Release);
        // Unblocks a worker waiting on a full channel
        self.receiver = None;
        self.head = None;

        let closed = match (self.worker.take(), self.source.take()) {
            (Some(worker), _) => worker.join().unwrap_or_else(|_| {
                Err(ExecutorError::worker_failed(format!(
                    "{} prefetch worker panicked",
                    self.side
                )))
            }),
            (None, Some(mut source)) => source.close(),
            (None, None) => Ok(()),
        };
        debug!(side = %self.side, "lookahead queue closed");

        recorded(&self.errors)?;
        closed
    }
}

impl Drop for LookaheadQueue {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            debug!(side = %self.side, error = %err, "error closing dropped lookahead queue");
        }
    }
}
