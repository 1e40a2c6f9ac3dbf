// ============================================================================
// ENGINE
// ============================================================================

use std::sync::mpsc::{Receiver, TryRecvError};

use tracing::info;

use crate::config::InstrumentConfig;
use crate::error::ConfigError;
use crate::field::FieldSet;
use crate::render::FrameRequest;
use crate::state::{DisplayState, Motion, ResolvePolicy, TargetState};
use crate::validity::Assessment;

/// Target and display state plus the rules that move one toward the other.
///
/// Owned by the render loop; input arrives as whole `FieldSet`s so a line
/// is never observed half-applied.
#[derive(Debug, Clone)]
pub struct Engine {
    config: InstrumentConfig,
    policy: ResolvePolicy,
    motion: Motion,
    target: TargetState,
    display: DisplayState,
    input_closed: bool,
}

impl Engine {
    pub fn new(config: InstrumentConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let policy = ResolvePolicy::from_config(&config);
        let motion = Motion::from_config(&config);
        Ok(Self {
            target: TargetState::initial(&policy),
            display: DisplayState::new(),
            config,
            policy,
            motion,
            input_closed: false,
        })
    }

    pub fn config(&self) -> &InstrumentConfig {
        &self.config
    }

    pub fn target(&self) -> &TargetState {
        &self.target
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn input_closed(&self) -> bool {
        self.input_closed
    }

    /// Resolve one parsed line into a fresh target.
    pub fn apply(&mut self, line: &FieldSet) {
        self.target = self.target.resolve(line, &self.policy);
    }

    /// Apply every update waiting in `receiver` without blocking.
    pub fn drain(&mut self, receiver: &Receiver<FieldSet>) -> usize {
        let mut applied = 0;
        loop {
            match receiver.try_recv() {
                Ok(line) => {
                    self.apply(&line);
                    applied += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.input_closed {
                        info!("update channel closed; holding last target");
                        self.input_closed = true;
                    }
                    break;
                }
            }
        }
        applied
    }

    /// Advance the display one render tick.
    pub fn tick(&mut self) {
        self.display.tick(&self.target, &self.motion);
    }

    /// Drain pending input, then tick.
    pub fn step(&mut self, receiver: Option<&Receiver<FieldSet>>) {
        if let Some(receiver) = receiver {
            self.drain(receiver);
        }
        self.tick();
    }

    pub fn assess(&self) -> Assessment {
        Assessment::evaluate(&self.display, &self.config.range)
    }

    pub fn frame(&self) -> FrameRequest {
        FrameRequest::compose(&self.display, &self.assess(), &self.config)
    }
}
