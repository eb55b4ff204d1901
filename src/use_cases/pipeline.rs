// Action pipeline: independent stages merged over the single bus.
//
// Every stage sees every action exactly once, in arrival order, and filters for the
// types it cares about. Stages read state only through an injected `StateAccessor`;
// network sends happen only in `RequestToNetwork` stages.

use crate::domain::{Action, ActionSink, GameState};
use crate::use_cases::types::{Authority, PipelineSettings};
use crate::use_cases::{bombs, keymap::KeyDownToIntent, players, shots};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{trace, warn};

const LOG_THROTTLE: Duration = Duration::from_secs(2);

/// Rate limit for a repeated warning. Counts the occurrences it swallows.
pub(crate) struct LogThrottle {
    every: Duration,
    last: Option<Instant>,
    suppressed: u64,
}

impl LogThrottle {
    pub(crate) fn new(every: Duration) -> Self {
        Self {
            every,
            last: None,
            suppressed: 0,
        }
    }

    /// `Some(suppressed since the last emitted warning)` when a warning may be logged now.
    pub(crate) fn ready(&mut self) -> Option<u64> {
        let now = Instant::now();
        match self.last {
            Some(last) if now.duration_since(last) < self.every => {
                self.suppressed += 1;
                None
            }
            _ => {
                self.last = Some(now);
                Some(std::mem::take(&mut self.suppressed))
            }
        }
    }
}

impl Default for LogThrottle {
    fn default() -> Self {
        Self::new(LOG_THROTTLE)
    }
}

/// One reactive stage: looks at an action and returns zero or more follow-ups.
pub trait Epic: Send {
    fn name(&self) -> &'static str;
    fn on_action(&mut self, action: &Action) -> Vec<Action>;
}

/// Read access to the latest published `GameState`.
///
/// Stages receive their own accessor at construction instead of reaching for
/// shared session globals.
#[derive(Clone)]
pub struct StateAccessor {
    rx: watch::Receiver<GameState>,
}

impl StateAccessor {
    pub fn new(rx: watch::Receiver<GameState>) -> Self {
        Self { rx }
    }

    pub fn get(&self) -> GameState {
        // Clone as soon as we borrow so the watch lock is not held.
        self.rx.borrow().clone()
    }
}

/// Forwards matching client requests to the network adapter; emits nothing.
pub struct RequestToNetwork {
    name: &'static str,
    sink: Arc<dyn ActionSink>,
    accepts: fn(&Action) -> bool,
    dropped: u64,
    drop_log: LogThrottle,
}

impl RequestToNetwork {
    pub fn new(name: &'static str, sink: Arc<dyn ActionSink>, accepts: fn(&Action) -> bool) -> Self {
        Self {
            name,
            sink,
            accepts,
            dropped: 0,
            drop_log: LogThrottle::default(),
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Epic for RequestToNetwork {
    fn name(&self) -> &'static str {
        self.name
    }

    fn on_action(&mut self, action: &Action) -> Vec<Action> {
        if !(self.accepts)(action) {
            return Vec::new();
        }

        match self.sink.send(action) {
            Ok(()) => trace!(stage = self.name, kind = action.kind(), "request sent"),
            Err(e) => {
                // Delivery is never assumed; the authoritative answer simply won't come.
                self.dropped += 1;
                if let Some(suppressed) = self.drop_log.ready() {
                    warn!(
                        stage = self.name,
                        kind = action.kind(),
                        dropped = self.dropped,
                        suppressed,
                        error = %e,
                        "failed to send request; dropping"
                    );
                }
            }
        }
        Vec::new()
    }
}

/// The merged set of stages, run in registration order.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Epic>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage(mut self, stage: impl Epic + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn push(&mut self, stage: Box<dyn Epic>) {
        self.stages.push(stage);
    }

    /// Hands `action` to every stage and concatenates their outputs.
    ///
    /// Outputs of one stage keep the order that stage produced them in.
    pub fn run(&mut self, action: &Action) -> Vec<Action> {
        let mut out = Vec::new();
        for stage in &mut self.stages {
            let emitted = stage.on_action(action);
            if !emitted.is_empty() {
                trace!(
                    stage = stage.name(),
                    trigger = action.kind(),
                    emitted = emitted.len(),
                    "stage emitted"
                );
            }
            out.extend(emitted);
        }
        out
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Wires every stage for bombs, players and shots.
///
/// Authoritative stages are only registered for `Authority::Local`; with a remote
/// authority the facts arrive from the server instead.
pub fn build_pipeline(
    settings: &PipelineSettings,
    state: StateAccessor,
    sink: Arc<dyn ActionSink>,
) -> Pipeline {
    let mut pipeline = Pipeline::new()
        .with_stage(KeyDownToIntent::new(state.clone(), settings.keymap.clone()))
        // Bombs
        .with_stage(bombs::SetKeyToRequest::new(state.clone()))
        .with_stage(bombs::DetonateKeyToRequest::new(
            state.clone(),
            settings.bomb_policy,
        ))
        .with_stage(bombs::request_to_network(sink.clone()))
        // Players
        .with_stage(players::MoveKeyToRequest::new(state.clone()))
        .with_stage(players::request_to_network(sink.clone()))
        // Shots
        .with_stage(shots::FireKeyToRequest::new(state.clone()))
        .with_stage(shots::request_to_network(sink));

    if settings.authority == Authority::Local {
        pipeline = pipeline
            .with_stage(
                bombs::SetRequestToAuthoritative::new(state.clone(), settings.bomb_policy)
                    .with_reload_time(settings.reload_time),
            )
            .with_stage(bombs::DetonateRequestToAuthoritative)
            .with_stage(players::MoveRequestToAuthoritative::new(
                state.clone(),
                settings.move_step,
            ))
            .with_stage(shots::FireRequestToAuthoritative::new(state));
    }

    pipeline
}
