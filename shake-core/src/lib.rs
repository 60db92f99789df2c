//! Scene shake effect for live video-composition hosts.
//!
//! This crate provides:
//! - A host-driven controller that jitters every item of the active scene
//!   with a linearly decaying random offset, then restores it exactly
//! - A host integration layer (settings UI, hotkey, tick and unload hooks)
//! - In-memory host doubles for tests and simulations
//!
//! # Quick Start
//!
//! ```ignore
//! use shake_core::{ShakeScript, SceneHost};
//!
//! let mut script = ShakeScript::new(my_host);
//! script.update(&serde_json::json!({ "magnitude": 80.0 }));
//!
//! script.on_hotkey(true);
//! // once per rendered frame:
//! script.tick(frame_seconds);
//! ```

pub mod config;
pub mod controller;
pub mod host;
pub mod script;
pub mod testing;

// Primary public API
pub use config::ShakeConfig;
pub use controller::{ShakeController, ShakeState, TickOutcome, TriggerOutcome};
pub use host::{HostError, Position, SceneHost};
pub use script::{Clock, HotkeyHost, HotkeyId, Property, SettingsSource, ShakeScript, SystemClock};
pub use testing::{ItemId, ManualClock, MockHotkeys, MockScene};
