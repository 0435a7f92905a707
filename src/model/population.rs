//! Background population: parse a report and build its index on a worker thread.

use std::any::Any;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError, bounded};

use crate::reader::{ReportParser, ReportSource};
use crate::{PopulateOptions, Result, TieBreak, TimelineError, TimelineIndex};

/// Terminal result of one population.
#[derive(Debug)]
pub enum PopulationOutcome {
    Completed(TimelineIndex),
    Failed(TimelineError),
}

/// Handle to a running population. Its worker sends exactly one outcome.
#[derive(Debug)]
pub struct PopulationTask {
    generation: u64,
    receiver: Receiver<PopulationOutcome>,
    worker: Option<JoinHandle<()>>,
}

impl PopulationTask {
    /// Spawn a worker that parses `source` and builds a [`TimelineIndex`].
    pub fn start(
        generation: u64,
        source: ReportSource,
        parser: Arc<dyn ReportParser>,
        options: &PopulateOptions,
    ) -> Result<Self> {
        let name = format!("{}-{generation}", options.thread_name_prefix);
        if name.contains('\0') {
            return Err(TimelineError::Spawn {
                reason: format!("thread name {name:?} contains a NUL byte").into(),
            });
        }

        let (sender, receiver) = bounded(1);
        let tie_break = options.tie_break;
        let worker = thread::Builder::new()
            .name(name)
            .spawn(move || {
                let started = Instant::now();
                let description = source.describe();
                let outcome = match run(source, parser.as_ref(), tie_break) {
                    Ok(index) => {
                        tracing::info!(
                            target: "dvtimeline::populate",
                            generation,
                            parser = parser.name(),
                            source = %description,
                            frames = index.len(),
                            elapsed_ms =
                                u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                            "population completed"
                        );
                        PopulationOutcome::Completed(index)
                    }
                    Err(err) => {
                        tracing::warn!(
                            target: "dvtimeline::populate",
                            generation,
                            parser = parser.name(),
                            source = %description,
                            error = %err,
                            "population failed"
                        );
                        PopulationOutcome::Failed(err)
                    }
                };
                if sender.send(outcome).is_err() {
                    tracing::debug!(
                        target: "dvtimeline::populate",
                        generation,
                        "population superseded; result discarded"
                    );
                }
            })
            .map_err(|err| TimelineError::Spawn {
                reason: err.to_string().into(),
            })?;

        Ok(Self {
            generation,
            receiver,
            worker: Some(worker),
        })
    }

    /// A task whose only outcome is the failure `error`.
    ///
    /// Used when the worker could not be started, so the failure is still
    /// collected through the same poll/wait path as any other outcome.
    #[must_use]
    pub fn failed(generation: u64, error: TimelineError) -> Self {
        let (sender, receiver) = bounded(1);
        // Fresh channel with room for one message.
        let _ = sender.send(PopulationOutcome::Failed(error));
        Self {
            generation,
            receiver,
            worker: None,
        }
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Non-blocking check for the outcome.
    pub fn try_outcome(&mut self) -> Option<PopulationOutcome> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(self.finish(outcome)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.lost()),
        }
    }

    /// Block until the worker delivers its outcome.
    pub fn wait_outcome(&mut self) -> PopulationOutcome {
        match self.receiver.recv() {
            Ok(outcome) => self.finish(outcome),
            Err(_) => self.lost(),
        }
    }

    /// Block for at most `timeout`.
    pub fn wait_outcome_timeout(&mut self, timeout: Duration) -> Option<PopulationOutcome> {
        match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => Some(self.finish(outcome)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(self.lost()),
        }
    }

    fn finish(&mut self, outcome: PopulationOutcome) -> PopulationOutcome {
        // The worker has sent its only message, so joining cannot block for long.
        if let Some(Err(payload)) = self.worker.take().map(JoinHandle::join) {
            tracing::warn!(
                target: "dvtimeline::populate",
                generation = self.generation,
                panic = panic_message(&*payload),
                "population worker panicked after reporting"
            );
        }
        outcome
    }

    fn lost(&mut self) -> PopulationOutcome {
        let reason = match self.worker.take().map(JoinHandle::join) {
            Some(Err(payload)) => format!("worker panicked: {}", panic_message(&*payload)),
            _ => "population worker exited without reporting a result".to_string(),
        };
        PopulationOutcome::Failed(TimelineError::parse(reason))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

fn run(
    source: ReportSource,
    parser: &dyn ReportParser,
    tie_break: TieBreak,
) -> Result<TimelineIndex> {
    let mut reader = source.open()?;
    let records = parser.parse(&mut reader)?;
    TimelineIndex::build_with(records, tie_break)
}
