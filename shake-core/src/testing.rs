//! Testing utilities for the shake effect.
//!
//! This module provides in-memory stand-ins for the host application:
//! - `MockScene` implements [`SceneHost`] with per-item failure injection and
//!   reference accounting
//! - `ManualClock` is a [`Clock`] the test advances by hand
//! - `MockHotkeys` records hotkey registration and saved bindings

use crate::host::{HostError, Position, SceneHost};
use crate::script::{Clock, HotkeyHost, HotkeyId};
use serde_json::Value;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

/// Handle to an item of a [`MockScene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(pub usize);

#[derive(Debug, Clone)]
struct MockItem {
    name: String,
    position: Position,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

/// An in-memory scene.
#[derive(Debug, Clone, Default)]
pub struct MockScene {
    items: Vec<MockItem>,
    no_active_scene: bool,
    fail_releases: bool,
    acquired: usize,
    released: usize,
}

impl MockScene {
    /// Create an active, empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item (builder form).
    pub fn with_item(mut self, name: impl Into<String>, position: Position) -> Self {
        self.add_item(name, position);
        self
    }

    /// Simulate the host having no active scene at all.
    pub fn without_active_scene(mut self) -> Self {
        self.no_active_scene = true;
        self
    }

    /// Make every `release_item` call fail.
    pub fn failing_releases(mut self) -> Self {
        self.fail_releases = true;
        self
    }

    /// Add an item and return its handle.
    pub fn add_item(&mut self, name: impl Into<String>, position: Position) -> ItemId {
        self.items.push(MockItem {
            name: name.into(),
            position,
            fail_reads: false,
            fail_writes: false,
            writes: 0,
        });
        ItemId(self.items.len() - 1)
    }

    /// Make reads of this item's position fail.
    pub fn fail_reads(&mut self, id: ItemId) {
        self.items[id.0].fail_reads = true;
    }

    /// Make writes to this item's position fail.
    pub fn fail_writes(&mut self, id: ItemId) {
        self.items[id.0].fail_writes = true;
    }

    /// Current position of an item.
    pub fn position(&self, id: ItemId) -> Position {
        self.items[id.0].position
    }

    pub fn name(&self, id: ItemId) -> &str {
        &self.items[id.0].name
    }

    pub fn item_ids(&self) -> impl Iterator<Item = ItemId> {
        (0..self.items.len()).map(ItemId)
    }

    /// Successful position writes to one item.
    pub fn writes_to(&self, id: ItemId) -> usize {
        self.items[id.0].writes
    }

    /// Successful position writes across all items.
    pub fn write_count(&self) -> usize {
        self.items.iter().map(|i| i.writes).sum()
    }

    /// Handles handed out by `active_scene_items`.
    pub fn acquired_count(&self) -> usize {
        self.acquired
    }

    /// Handles handed back through `release_item` (including failed releases).
    pub fn release_count(&self) -> usize {
        self.released
    }

    /// Handles acquired but not yet released.
    pub fn outstanding_refs(&self) -> usize {
        self.acquired - self.released
    }

    fn item(&self, id: ItemId) -> Result<&MockItem, HostError> {
        self.items
            .get(id.0)
            .ok_or_else(|| HostError::StaleItem(format!("item #{}", id.0)))
    }
}

impl SceneHost for MockScene {
    type Item = ItemId;

    fn active_scene_items(&mut self) -> Vec<ItemId> {
        if self.no_active_scene {
            return Vec::new();
        }
        self.acquired += self.items.len();
        (0..self.items.len()).map(ItemId).collect()
    }

    fn item_position(&mut self, item: &ItemId) -> Result<Position, HostError> {
        let entry = self.item(*item)?;
        if entry.fail_reads {
            return Err(HostError::Read(entry.name.clone()));
        }
        Ok(entry.position)
    }

    fn set_item_position(&mut self, item: &ItemId, position: Position) -> Result<(), HostError> {
        let entry = self
            .items
            .get_mut(item.0)
            .ok_or_else(|| HostError::StaleItem(format!("item #{}", item.0)))?;
        if entry.fail_writes {
            return Err(HostError::Write(entry.name.clone()));
        }
        entry.position = position;
        entry.writes += 1;
        Ok(())
    }

    fn release_item(&mut self, item: ItemId) -> Result<(), HostError> {
        self.released += 1;
        if self.fail_releases {
            return Err(HostError::Release(format!("item #{}", item.0)));
        }
        Ok(())
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give the
/// other to a [`ShakeScript`](crate::script::ShakeScript).
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, now: f64) {
        self.now.set(now);
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

/// Records hotkey registrations and bindings.
#[derive(Debug, Default)]
pub struct MockHotkeys {
    next_id: u64,
    /// Registered hotkeys by id: (name, description).
    pub registered: HashMap<HotkeyId, (String, String)>,
    /// Bindings currently loaded for each hotkey.
    pub bindings: HashMap<HotkeyId, Value>,
    /// Ids passed to `unregister`, in call order.
    pub unregistered: Vec<HotkeyId>,
}

impl MockHotkeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the hotkey registered under `name`, if any is still registered.
    pub fn id_of(&self, name: &str) -> Option<HotkeyId> {
        self.registered
            .iter()
            .find(|(_, (n, _))| n == name)
            .map(|(id, _)| *id)
    }
}

impl HotkeyHost for MockHotkeys {
    fn register(&mut self, name: &str, description: &str) -> HotkeyId {
        self.next_id += 1;
        let id = HotkeyId(self.next_id);
        self.registered
            .insert(id, (name.to_string(), description.to_string()));
        id
    }

    fn load_binding(&mut self, id: HotkeyId, binding: &Value) {
        self.bindings.insert(id, binding.clone());
    }

    fn save_binding(&self, id: HotkeyId) -> Value {
        self.bindings
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()))
    }

    fn unregister(&mut self, id: HotkeyId) {
        self.registered.remove(&id);
        self.unregistered.push(id);
    }
}
