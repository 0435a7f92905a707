//! `DataModel` facade: owns the current timeline and mediates population.

pub mod population;

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};

pub use population::{PopulationOutcome, PopulationTask};

use crate::reader::{DvRescueXmlParser, ReportParser, ReportSource};
use crate::{FieldChannel, PopulateOptions, Result, TimelineError, TimelineIndex, VideoInfo};

/// Status of the most recent population attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    Empty,
    Populating,
    Ready,
    Failed,
}

/// Notification emitted once per finished population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    /// The new index is installed and queries will see it.
    Populated { generation: u64 },
    /// Population failed; the model holds no data.
    Error { generation: u64, reason: String },
}

/// The index lives inside `Ready`, so status and data always change together.
#[derive(Debug)]
enum ModelState {
    Empty,
    Populating,
    Ready(Arc<TimelineIndex>),
    Failed(Box<str>),
}

/// Facade over report population and frame queries.
///
/// Completion is handled on the caller's thread through [`DataModel::poll`],
/// [`DataModel::wait`] or [`DataModel::wait_timeout`]. Queries are only meaningful after
/// observing [`ModelEvent::Populated`] for the latest [`DataModel::populate`] call.
pub struct DataModel {
    state: ModelState,
    generation: u64,
    pending: Option<PopulationTask>,
    parser: Arc<dyn ReportParser>,
    options: PopulateOptions,
    subscribers: Vec<Sender<ModelEvent>>,
}

impl Default for DataModel {
    fn default() -> Self {
        Self::new()
    }
}

impl DataModel {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(PopulateOptions::default())
    }

    #[must_use]
    pub fn with_options(options: PopulateOptions) -> Self {
        let parser = Arc::new(DvRescueXmlParser::new(options.parse.clone()));
        Self::with_parser(parser, options)
    }

    #[must_use]
    pub fn with_parser(parser: Arc<dyn ReportParser>, options: PopulateOptions) -> Self {
        Self {
            state: ModelState::Empty,
            generation: 0,
            pending: None,
            parser,
            options,
            subscribers: Vec::new(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &PopulateOptions {
        &self.options
    }

    #[must_use]
    pub fn status(&self) -> ModelStatus {
        match self.state {
            ModelState::Empty => ModelStatus::Empty,
            ModelState::Populating => ModelStatus::Populating,
            ModelState::Ready(_) => ModelStatus::Ready,
            ModelState::Failed(_) => ModelStatus::Failed,
        }
    }

    /// Generation of the most recent `populate` call (0 before the first).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_populating(&self) -> bool {
        self.pending.is_some()
    }

    /// Reason of the last failure while the model is `Failed`.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        match &self.state {
            ModelState::Failed(reason) => Some(&**reason),
            _ => None,
        }
    }

    /// Shared snapshot of the current index while the model is `Ready`.
    #[must_use]
    pub fn index(&self) -> Option<Arc<TimelineIndex>> {
        match &self.state {
            ModelState::Ready(index) => Some(Arc::clone(index)),
            _ => None,
        }
    }

    /// Register for `Populated` / `Error` notifications.
    pub fn subscribe(&mut self) -> Receiver<ModelEvent> {
        let (sender, receiver) = unbounded();
        self.subscribers.push(sender);
        receiver
    }

    /// Start populating from `source` and return immediately.
    ///
    /// Any previous index is dropped and any in-flight population is superseded: its
    /// result will never be applied. A worker that cannot be started is reported like
    /// any other failure, through the next `poll` or `wait`.
    pub fn populate(&mut self, source: impl Into<ReportSource>) {
        let source = source.into();
        self.generation += 1;
        let generation = self.generation;

        if let Some(previous) = self.pending.take() {
            tracing::debug!(
                target: "dvtimeline::populate",
                superseded = previous.generation(),
                generation,
                "superseding in-flight population"
            );
        }

        tracing::info!(
            target: "dvtimeline::populate",
            generation,
            source = %source.describe(),
            "population started"
        );
        self.state = ModelState::Populating;

        let parser = Arc::clone(&self.parser);
        let task = PopulationTask::start(generation, source, parser, &self.options)
            .unwrap_or_else(|err| PopulationTask::failed(generation, err));
        self.pending = Some(task);
    }

    /// Apply the current population's outcome if it has arrived.
    pub fn poll(&mut self) -> Option<ModelEvent> {
        let task = self.pending.as_mut()?;
        let outcome = task.try_outcome()?;
        Some(self.complete(outcome))
    }

    /// Block until the current population finishes and apply its outcome.
    ///
    /// Returns `None` when nothing is in flight.
    pub fn wait(&mut self) -> Option<ModelEvent> {
        let task = self.pending.as_mut()?;
        let outcome = task.wait_outcome();
        Some(self.complete(outcome))
    }

    /// Like [`DataModel::wait`] but gives up after `timeout`.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<ModelEvent> {
        let task = self.pending.as_mut()?;
        let outcome = task.wait_outcome_timeout(timeout)?;
        Some(self.complete(outcome))
    }

    /// Resolve `timestamp` to the nearest frame and return both of its field values.
    pub fn get_video_info(&self, timestamp: i64, channel: i32) -> Result<VideoInfo> {
        let ModelState::Ready(index) = &self.state else {
            return Err(TimelineError::NotPopulated);
        };
        FieldChannel::try_from(channel)?;
        Ok(VideoInfo::from(index.nearest_frame(timestamp)))
    }

    fn complete(&mut self, outcome: PopulationOutcome) -> ModelEvent {
        let generation = self
            .pending
            .take()
            .map_or(self.generation, |task| task.generation());
        let event = self.apply(generation, outcome);
        self.notify(&event);
        event
    }

    fn apply(&mut self, generation: u64, outcome: PopulationOutcome) -> ModelEvent {
        match outcome {
            PopulationOutcome::Completed(index) => {
                self.state = ModelState::Ready(Arc::new(index));
                ModelEvent::Populated { generation }
            }
            PopulationOutcome::Failed(err) => {
                let reason = err.to_string();
                self.state = ModelState::Failed(reason.clone().into_boxed_str());
                ModelEvent::Error { generation, reason }
            }
        }
    }

    fn notify(&mut self, event: &ModelEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_FRAMES: &str = r#"<dvrescue><frames>
        <frame n="1"/>
        <frame n="2"><sta n="4" n_even="1"/></frame>
    </frames></dvrescue>"#;

    #[test]
    fn starts_empty_and_rejects_queries() {
        let model = DataModel::new();
        assert_eq!(model.status(), ModelStatus::Empty);
        assert_eq!(model.generation(), 0);
        assert!(matches!(
            model.get_video_info(0, 0),
            Err(TimelineError::NotPopulated)
        ));
    }

    #[test]
    fn wait_without_population_returns_none() {
        let mut model = DataModel::new();
        assert!(model.wait().is_none());
        assert!(model.poll().is_none());
    }

    #[test]
    fn populate_then_query() {
        let mut model = DataModel::new();
        model.populate(TWO_FRAMES.to_string());
        assert_eq!(model.status(), ModelStatus::Populating);
        assert!(matches!(
            model.get_video_info(2, 0),
            Err(TimelineError::NotPopulated)
        ));

        assert_eq!(model.wait(), Some(ModelEvent::Populated { generation: 1 }));
        assert_eq!(model.status(), ModelStatus::Ready);
        assert!(!model.is_populating());

        let info = model.get_video_info(2, 1).unwrap();
        assert_eq!(info.frame_number, 2);
        assert_eq!(info.odd_value, 3.0);
        assert_eq!(info.even_value, 1.0);
    }

    #[test]
    fn invalid_channel_is_rejected_once_ready() {
        let mut model = DataModel::new();
        model.populate(TWO_FRAMES.to_string());
        model.wait();
        assert!(matches!(
            model.get_video_info(1, 5),
            Err(TimelineError::InvalidChannel { channel: 5 })
        ));
    }

    #[test]
    fn failure_discards_previous_index() {
        let mut model = DataModel::new();
        model.populate(TWO_FRAMES.to_string());
        model.wait();
        assert!(model.index().is_some());

        model.populate("<dvrescue><frames>".to_string());
        match model.wait() {
            Some(ModelEvent::Error { generation, .. }) => assert_eq!(generation, 2),
            other => panic!("expected error event, got {other:?}"),
        }
        assert_eq!(model.status(), ModelStatus::Failed);
        assert!(model.last_error().is_some());
        assert!(model.index().is_none());
        assert!(matches!(
            model.get_video_info(1, 0),
            Err(TimelineError::NotPopulated)
        ));
    }

    #[test]
    fn subscribers_receive_each_event() {
        let mut model = DataModel::new();
        let events = model.subscribe();
        model.populate(TWO_FRAMES.to_string());
        model.wait();
        model.populate(Vec::<u8>::new());
        model.wait();

        assert_eq!(
            events.try_recv(),
            Ok(ModelEvent::Populated { generation: 1 })
        );
        assert!(matches!(
            events.try_recv(),
            Ok(ModelEvent::Error { generation: 2, .. })
        ));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn unstartable_worker_is_reported_through_wait() {
        let options = PopulateOptions {
            thread_name_prefix: "scrub\0x".to_string(),
            ..PopulateOptions::default()
        };
        let mut model = DataModel::with_options(options);
        let events = model.subscribe();
        model.populate(TWO_FRAMES.to_string());
        assert_eq!(model.options().thread_name_prefix, "scrub\0x");
        assert!(model.is_populating());

        let event = model.wait();
        assert!(
            matches!(event, Some(ModelEvent::Error { generation: 1, .. })),
            "{event:?}"
        );
        assert_eq!(events.try_recv().ok(), event);
        assert_eq!(model.status(), ModelStatus::Failed);
        assert!(model.last_error().unwrap().contains("NUL"));
        assert!(model.wait().is_none());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut model = DataModel::new();
        drop(model.subscribe());
        model.populate(TWO_FRAMES.to_string());
        model.wait();
        assert!(model.subscribers.is_empty());
    }
}
