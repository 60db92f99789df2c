//! The shake effect controller.
//!
//! A controller is either idle or running exactly one effect session. A
//! session captures the position of every item in the active scene, jitters
//! the items with a linearly decaying random offset on each tick, and puts
//! every item back at its captured position when it ends.
//!
//! Timing is driven entirely by the caller: `now` is a timestamp in seconds
//! on whatever monotonic clock the host uses.

use crate::config::{ShakeConfig, DEFAULT_DURATION};
use crate::host::{Position, SceneHost};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

/// Lower bound applied to the session length.
const MIN_DURATION: f64 = 1e-6;

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShakeState {
    Idle,
    Shaking,
}

/// Result of [`ShakeController::trigger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A session started with this many captured items.
    Started { items: usize },
    /// A session was already running; nothing changed.
    AlreadyShaking,
    /// No active scene, or no item whose position could be read.
    EmptyScene,
}

/// Result of [`ShakeController::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No session was running.
    Idle,
    /// Items were moved; the session continues.
    Shaking,
    /// The session expired on this tick and every item was restored.
    Finished,
}

struct Captured<I> {
    item: I,
    origin: Position,
}

struct Session<I> {
    items: Vec<Captured<I>>,
    started_at: f64,
    duration: f64,
    ends_at: f64,
}

impl<I> Session<I> {
    /// Offset weight at `now`: 1 at the start, falling linearly to 0 at the end.
    fn decay_weight(&self, now: f64) -> f64 {
        let elapsed = ((now - self.started_at) / self.duration).clamp(0.0, 1.0);
        1.0 - elapsed
    }
}

/// Drives one shake effect at a time against a [`SceneHost`].
pub struct ShakeController<H: SceneHost, R = StdRng> {
    host: H,
    config: ShakeConfig,
    rng: R,
    session: Option<Session<H::Item>>,
}

impl<H: SceneHost> ShakeController<H, StdRng> {
    /// Create an idle controller with the default config.
    pub fn new(host: H) -> Self {
        Self::with_rng(host, StdRng::from_entropy())
    }
}

impl<H: SceneHost, R: Rng> ShakeController<H, R> {
    /// Create an idle controller using the given random source.
    pub fn with_rng(host: H, rng: R) -> Self {
        Self {
            host,
            config: ShakeConfig::default(),
            rng,
            session: None,
        }
    }

    /// Set the initial configuration.
    pub fn with_config(mut self, config: ShakeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ShakeConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ShakeConfig {
        &mut self.config
    }

    /// Replace the configuration.
    ///
    /// A running session keeps its end time; the new magnitude applies from
    /// the next tick.
    pub fn set_config(&mut self, config: ShakeConfig) {
        self.config = config;
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn state(&self) -> ShakeState {
        if self.session.is_some() {
            ShakeState::Shaking
        } else {
            ShakeState::Idle
        }
    }

    pub fn is_shaking(&self) -> bool {
        self.session.is_some()
    }

    /// Number of items captured by the running session (0 when idle).
    pub fn captured_len(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.items.len())
    }

    /// Start and end timestamps of the running session.
    pub fn session_window(&self) -> Option<(f64, f64)> {
        self.session.as_ref().map(|s| (s.started_at, s.ends_at))
    }

    /// Start a session at `now`.
    ///
    /// Captures the position of every item in the active scene. Items whose
    /// position cannot be read are released and left out of the session.
    pub fn trigger(&mut self, now: f64) -> TriggerOutcome {
        if self.session.is_some() {
            return TriggerOutcome::AlreadyShaking;
        }

        let handles = self.host.active_scene_items();
        if handles.is_empty() {
            debug!("shake trigger ignored: active scene has no items");
            return TriggerOutcome::EmptyScene;
        }

        let mut items = Vec::with_capacity(handles.len());
        for item in handles {
            match self.host.item_position(&item) {
                Ok(origin) => items.push(Captured { item, origin }),
                Err(e) => {
                    warn!(error = %e, "skipping scene item: could not read its position");
                    release(&mut self.host, item);
                }
            }
        }

        if items.is_empty() {
            debug!("shake trigger ignored: no item position could be captured");
            return TriggerOutcome::EmptyScene;
        }

        let duration = session_duration(self.config.duration);
        let count = items.len();
        self.session = Some(Session {
            items,
            started_at: now,
            duration,
            ends_at: now + duration,
        });
        debug!(items = count, duration, "shake started");

        TriggerOutcome::Started { items: count }
    }

    /// Advance the running session to `now`.
    pub fn tick(&mut self, now: f64) -> TickOutcome {
        let Self {
            host,
            config,
            rng,
            session,
        } = self;

        let Some(active) = session.as_ref() else {
            return TickOutcome::Idle;
        };

        if now >= active.ends_at {
            if let Some(ended) = session.take() {
                restore(host, ended);
            }
            debug!("shake finished");
            return TickOutcome::Finished;
        }

        let amplitude = tick_magnitude(config.magnitude) * active.decay_weight(now);
        for captured in &active.items {
            let dx = rng.gen_range(-1.0_f64..=1.0) * amplitude;
            let dy = rng.gen_range(-1.0_f64..=1.0) * amplitude;
            if let Err(e) = host.set_item_position(&captured.item, captured.origin.offset(dx, dy)) {
                warn!(error = %e, "skipping scene item: could not move it");
            }
        }

        TickOutcome::Shaking
    }

    /// End the running session immediately, restoring every item.
    ///
    /// Returns `false` when there was nothing to cancel.
    pub fn cancel(&mut self) -> bool {
        match self.session.take() {
            Some(session) => {
                restore(&mut self.host, session);
                debug!("shake cancelled");
                true
            }
            None => false,
        }
    }
}

/// Session length for a configured duration. Non-finite values fall back to
/// the default.
fn session_duration(duration: f64) -> f64 {
    if duration.is_finite() {
        duration.max(MIN_DURATION)
    } else {
        DEFAULT_DURATION
    }
}

/// Peak offset for a configured magnitude. Non-finite values disable the jitter.
fn tick_magnitude(magnitude: f64) -> f64 {
    if magnitude.is_finite() {
        magnitude.max(0.0)
    } else {
        0.0
    }
}

fn restore<H: SceneHost>(host: &mut H, session: Session<H::Item>) {
    for Captured { item, origin } in session.items {
        if let Err(e) = host.set_item_position(&item, origin) {
            warn!(error = %e, "could not restore scene item position");
        }
        release(host, item);
    }
}

fn release<H: SceneHost>(host: &mut H, item: H::Item) {
    if let Err(e) = host.release_item(item) {
        debug!(error = %e, "ignoring failed item release");
    }
}
