//! Pure activation state tracking for the push-to-talk hotkey.
//!
//! The tracker consumes a stream of (edge, key code) events and produces
//! edge-triggered activation signals. It holds the set of currently
//! pressed keys and nothing else, so it can be driven directly in tests
//! without an OS hook.

use crate::settings::ActivationConfig;
use std::collections::BTreeSet;

/// Edge-triggered activation signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationEdge {
    /// The configured key/combo just became fully pressed.
    Started,
    /// The configured key/combo is no longer fully pressed.
    Stopped,
}

/// Tracks physically held keys and evaluates the activation predicate.
#[derive(Debug, Default)]
pub struct KeyTracker {
    pressed: BTreeSet<u32>,
    active: bool,
}

impl KeyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a key-down event.
    ///
    /// Key-down for a code that is already held is OS auto-repeat and is
    /// ignored entirely; it must not re-fire activation.
    pub fn key_down(&mut self, code: u32, config: &ActivationConfig) -> Option<ActivationEdge> {
        if !self.pressed.insert(code) {
            return None;
        }

        if !self.active && self.predicate_holds(config) {
            self.active = true;
            return Some(ActivationEdge::Started);
        }

        None
    }

    /// Process a key-up event.
    ///
    /// Releasing any single key of a combo deactivates, even while the
    /// other combo keys remain held.
    pub fn key_up(&mut self, code: u32, config: &ActivationConfig) -> Option<ActivationEdge> {
        self.pressed.remove(&code);

        if self.active && !self.predicate_holds(config) {
            self.active = false;
            return Some(ActivationEdge::Stopped);
        }

        None
    }

    /// Whether the activation predicate currently holds.
    fn predicate_holds(&self, config: &ActivationConfig) -> bool {
        if config.use_combo {
            !config.combo_keys.is_empty()
                && config.combo_keys.iter().all(|k| self.pressed.contains(k))
        } else {
            self.pressed.contains(&config.primary_key)
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Drop all held-key state, e.g. when the hook is restarted.
    pub fn reset(&mut self) -> Option<ActivationEdge> {
        self.pressed.clear();
        if self.active {
            self.active = false;
            Some(ActivationEdge::Stopped)
        } else {
            None
        }
    }

    #[cfg(test)]
    pub fn pressed(&self) -> &BTreeSet<u32> {
        &self.pressed
    }
}
