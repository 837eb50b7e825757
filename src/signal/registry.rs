//! Signal registry
//!
//! Ordered, append-only collection of named bindings. A signal's index is
//! its registration order and doubles as its wire identifier, so signals
//! can only be removed all at once.

use crate::error::{BlaeckError, Result};

use super::kind::{SignalKind, WireValue};
use super::variable::{Binding, Scalar, Variable};

/// Most signals a registry can hold; the wire index is 16 bits
pub const MAX_SIGNALS: usize = u16::MAX as usize + 1;

/// A registered signal
#[derive(Debug, Clone)]
pub struct Signal {
    name: String,
    binding: Binding,
    dirty: bool,
}

impl Signal {
    /// Signal name as sent in symbol tables
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind fixed at registration
    pub fn kind(&self) -> SignalKind {
        self.binding.kind()
    }

    /// Current value of the bound storage
    pub fn value(&self) -> WireValue {
        self.binding.load()
    }

    /// Whether the signal was marked updated since the last updated-only send
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Fixed-capacity registry of signals
#[derive(Debug)]
pub struct SignalRegistry {
    signals: Vec<Signal>,
    capacity: usize,
}

impl SignalRegistry {
    /// Create an empty registry that holds at most `capacity` signals
    ///
    /// `capacity` is clamped to [`MAX_SIGNALS`].
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_SIGNALS);
        Self {
            signals: Vec::with_capacity(capacity),
            capacity,
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Append a signal bound to `variable`; returns its index
    pub fn register<T: Scalar>(&mut self, name: impl Into<String>, variable: &Variable<T>) -> Result<usize> {
        if self.signals.len() >= self.capacity {
            return Err(BlaeckError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        let index = self.signals.len();
        self.signals.push(Signal {
            name: name.into(),
            binding: T::bind(variable),
            dirty: false,
        });
        Ok(index)
    }

    /// Remove every signal
    pub fn clear(&mut self) {
        self.signals.clear();
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, index: usize) -> Option<&Signal> {
        self.signals.get(index)
    }

    /// Index of the first signal called `name`
    pub fn find(&self, name: &str) -> Option<usize> {
        self.signals.iter().position(|s| s.name == name)
    }

    pub fn by_name(&self, name: &str) -> Option<&Signal> {
        self.find(name).and_then(|i| self.get(i))
    }

    /// Signals in index order
    pub fn iter(&self) -> std::slice::Iter<'_, Signal> {
        self.signals.iter()
    }

    // =========================================================================
    // Value Access
    // =========================================================================

    /// Write `value` into the storage of signal `index`
    ///
    /// Returns `false` without touching anything when the index is out of
    /// range or the value's kind differs from the registered kind.
    pub fn set_value(&self, index: usize, value: WireValue) -> bool {
        match self.signals.get(index) {
            Some(signal) => signal.binding.store(value),
            None => false,
        }
    }

    /// Typed convenience wrapper around [`set_value`](Self::set_value)
    pub fn set<T: Scalar>(&self, index: usize, value: T) -> bool {
        self.set_value(index, value.into_wire())
    }

    /// Set the value and mark the signal dirty if the write was accepted
    pub fn update(&mut self, index: usize, value: WireValue) -> bool {
        let applied = self.set_value(index, value);
        if applied {
            self.signals[index].dirty = true;
        }
        applied
    }

    // =========================================================================
    // Dirty Flags
    // =========================================================================

    pub fn mark_dirty(&mut self, index: usize) -> bool {
        match self.signals.get_mut(index) {
            Some(signal) => {
                signal.dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_dirty_by_name(&mut self, name: &str) -> bool {
        match self.find(name) {
            Some(index) => self.mark_dirty(index),
            None => false,
        }
    }

    pub fn mark_all_dirty(&mut self) {
        self.signals.iter_mut().for_each(|s| s.dirty = true);
    }

    pub fn clear_dirty(&mut self) {
        self.signals.iter_mut().for_each(|s| s.dirty = false);
    }

    /// Clear the flag of every signal in `start..=end`
    pub(crate) fn clear_dirty_range(&mut self, start: usize, end: usize) {
        let end = end.min(self.signals.len().saturating_sub(1));
        for signal in self.signals.iter_mut().take(end + 1).skip(start) {
            signal.dirty = false;
        }
    }

    pub fn any_dirty(&self) -> bool {
        self.signals.iter().any(|s| s.dirty)
    }
}
