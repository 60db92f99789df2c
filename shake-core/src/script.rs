//! Host integration for the shake effect.
//!
//! [`ShakeScript`] is the object a host plugin runtime instantiates once. It
//! owns the controller and a clock, and exposes one method per host callback:
//! settings UI description and live updates, the "Shake Now" button, the
//! frontend hotkey, the per-frame tick, and load/save/unload.

use crate::config::{
    ShakeConfig, DEFAULT_DURATION, DEFAULT_FREQUENCY, DEFAULT_MAGNITUDE, DURATION_RANGE,
    FREQUENCY_RANGE, MAGNITUDE_RANGE,
};
use crate::controller::{ShakeController, TickOutcome, TriggerOutcome};
use crate::host::SceneHost;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

/// Text shown by the host's script manager.
pub const DESCRIPTION: &str =
    "Briefly shakes every item in the active scene by modifying their transform (position).";

/// Name the trigger hotkey is registered under.
pub const HOTKEY_NAME: &str = "shake_everything.trigger";
/// Human readable hotkey label.
pub const HOTKEY_DESCRIPTION: &str = "Shake Everything";
/// Settings key holding the saved hotkey binding.
pub const HOTKEY_SETTINGS_KEY: &str = "shake_hotkey";

/// Settings key of the "Shake Now" button.
pub const SHAKE_BUTTON: &str = "shake_button";

/// A monotonic time source, in seconds.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Seconds elapsed since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

/// Read access to the host's persisted settings object.
pub trait SettingsSource {
    fn get_double(&self, key: &str) -> Option<f64>;
}

impl SettingsSource for Value {
    fn get_double(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }
}

impl SettingsSource for HashMap<String, f64> {
    fn get_double(&self, key: &str) -> Option<f64> {
        self.get(key).copied()
    }
}

/// Identifier the host assigns to a registered hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HotkeyId(pub u64);

/// The host's hotkey registry.
///
/// Bindings are opaque JSON values persisted by the host in the script's
/// settings.
pub trait HotkeyHost {
    fn register(&mut self, name: &str, description: &str) -> HotkeyId;
    fn load_binding(&mut self, id: HotkeyId, binding: &Value);
    fn save_binding(&self, id: HotkeyId) -> Value;
    fn unregister(&mut self, id: HotkeyId);
}

/// A control in the host's settings UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Property {
    Float {
        name: &'static str,
        label: &'static str,
        min: f64,
        max: f64,
        step: f64,
    },
    Button {
        name: &'static str,
        label: &'static str,
    },
}

impl Property {
    pub fn name(&self) -> &'static str {
        match self {
            Property::Float { name, .. } | Property::Button { name, .. } => *name,
        }
    }
}

/// Settings UI controls, in display order.
pub fn properties() -> Vec<Property> {
    vec![
        Property::Float {
            name: "duration",
            label: "Duration (s)",
            min: *DURATION_RANGE.start(),
            max: *DURATION_RANGE.end(),
            step: 0.05,
        },
        Property::Float {
            name: "magnitude",
            label: "Magnitude (px)",
            min: *MAGNITUDE_RANGE.start(),
            max: *MAGNITUDE_RANGE.end(),
            step: 1.0,
        },
        Property::Float {
            name: "frequency",
            label: "Frequency (updates/sec)",
            min: *FREQUENCY_RANGE.start(),
            max: *FREQUENCY_RANGE.end(),
            step: 1.0,
        },
        Property::Button {
            name: SHAKE_BUTTON,
            label: "Shake Now",
        },
    ]
}

/// Default values for the settings UI fields.
pub fn defaults() -> Value {
    json!({
        "duration": DEFAULT_DURATION,
        "magnitude": DEFAULT_MAGNITUDE,
        "frequency": DEFAULT_FREQUENCY,
    })
}

/// The shake effect as a host plugin.
pub struct ShakeScript<H: SceneHost, C = SystemClock, R = StdRng> {
    controller: ShakeController<H, R>,
    clock: C,
    hotkey: Option<HotkeyId>,
}

impl<H: SceneHost> ShakeScript<H, SystemClock, StdRng> {
    /// Create a script driven by the system clock.
    pub fn new(host: H) -> Self {
        Self::with_parts(ShakeController::new(host), SystemClock::new())
    }
}

impl<H: SceneHost, C: Clock, R: Rng> ShakeScript<H, C, R> {
    /// Assemble a script from an existing controller and clock.
    pub fn with_parts(controller: ShakeController<H, R>, clock: C) -> Self {
        Self {
            controller,
            clock,
            hotkey: None,
        }
    }

    pub fn controller(&self) -> &ShakeController<H, R> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ShakeController<H, R> {
        &mut self.controller
    }

    pub fn hotkey(&self) -> Option<HotkeyId> {
        self.hotkey
    }

    /// Live settings update from the host UI.
    ///
    /// Missing keys keep their current value. A running session is not reset.
    pub fn update(&mut self, settings: &impl SettingsSource) {
        let current = *self.controller.config();
        let config = ShakeConfig {
            duration: settings.get_double("duration").unwrap_or(current.duration),
            magnitude: settings.get_double("magnitude").unwrap_or(current.magnitude),
            frequency: settings.get_double("frequency").unwrap_or(current.frequency),
        }
        .clamped();
        debug!(?config, "shake settings updated");
        self.controller.set_config(config);
    }

    /// Start a shake now.
    pub fn trigger(&mut self) -> TriggerOutcome {
        let now = self.clock.now();
        self.controller.trigger(now)
    }

    /// "Shake Now" button callback. Always asks the host to refresh the UI.
    pub fn on_button(&mut self) -> bool {
        self.trigger();
        true
    }

    /// Hotkey callback. Only key presses trigger.
    pub fn on_hotkey(&mut self, pressed: bool) -> Option<TriggerOutcome> {
        pressed.then(|| self.trigger())
    }

    /// Per-frame callback. `_frame_seconds` is the host's frame delta; the
    /// effect is timed from the clock instead.
    pub fn tick(&mut self, _frame_seconds: f64) -> TickOutcome {
        let now = self.clock.now();
        self.controller.tick(now)
    }

    /// Script load: register the trigger hotkey and restore its binding.
    pub fn load(&mut self, hotkeys: &mut impl HotkeyHost, settings: &Value) {
        let id = hotkeys.register(HOTKEY_NAME, HOTKEY_DESCRIPTION);
        let binding = settings
            .get(HOTKEY_SETTINGS_KEY)
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        hotkeys.load_binding(id, &binding);
        self.hotkey = Some(id);
    }

    /// Settings save: persist the hotkey binding.
    pub fn save(&self, hotkeys: &impl HotkeyHost, settings: &mut Value) {
        let Some(id) = self.hotkey else {
            return;
        };
        if let Some(map) = settings.as_object_mut() {
            map.insert(HOTKEY_SETTINGS_KEY.to_string(), hotkeys.save_binding(id));
        }
    }

    /// Script unload: put every item back and drop the hotkey.
    pub fn unload(&mut self, hotkeys: &mut impl HotkeyHost) {
        self.controller.cancel();
        if let Some(id) = self.hotkey.take() {
            hotkeys.unregister(id);
        }
    }
}
