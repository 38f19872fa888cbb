//! Resource Slot
//!
//! A single-writer, multi-reader cell holding an optional live reference to a
//! resource created elsewhere at an unknown time. Readers never wait on the
//! slot itself; they poll it through the backoff resolver.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::SlotError;

struct SlotState<T: ?Sized> {
    value: Option<Arc<T>>,
    generation: u64,
}

/// Cell holding zero or one live `Arc<T>`.
///
/// ## Invariants
///
/// - At most one live value; absence is the initial and post-teardown state.
/// - `generation` increases on every successful `publish` and on every
///   `clear` that removed a value, so a reader can tell whether the handle it
///   holds is still the current one.
/// - `publish` on an occupied slot is rejected (strict single writer).
pub struct ResourceSlot<T: ?Sized> {
    name: &'static str,
    state: RwLock<SlotState<T>>,
}

impl<T: ?Sized> ResourceSlot<T> {
    /// Create an empty slot.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: RwLock::new(SlotState {
                value: None,
                generation: 0,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Publish a value into an empty slot.
    ///
    /// Returns the generation of the published value.
    pub fn publish(&self, value: Arc<T>) -> Result<u64, SlotError> {
        let mut state = self.state.write();
        if state.value.is_some() {
            return Err(SlotError::AlreadyPublished {
                slot: self.name,
                generation: state.generation,
            });
        }
        state.generation += 1;
        state.value = Some(value);
        debug!(slot = self.name, generation = state.generation, "Resource published");
        Ok(state.generation)
    }

    /// Remove the current value. Idempotent.
    ///
    /// Returns `true` if a value was removed.
    pub fn clear(&self) -> bool {
        let mut state = self.state.write();
        if state.value.take().is_none() {
            return false;
        }
        state.generation += 1;
        debug!(slot = self.name, generation = state.generation, "Resource cleared");
        true
    }

    /// Non-blocking read of the current value.
    pub fn try_get(&self) -> Option<Arc<T>> {
        self.state.read().value.clone()
    }

    /// Current value together with the generation it was published at.
    pub fn try_get_versioned(&self) -> Option<(u64, Arc<T>)> {
        let state = self.state.read();
        state.value.clone().map(|v| (state.generation, v))
    }

    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    /// Whether a handle obtained at `generation` is still the live one.
    pub fn is_current(&self, generation: u64) -> bool {
        let state = self.state.read();
        state.value.is_some() && state.generation == generation
    }

    pub fn is_published(&self) -> bool {
        self.state.read().value.is_some()
    }
}

impl<T: ?Sized> fmt::Debug for ResourceSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("ResourceSlot")
            .field("name", &self.name)
            .field("published", &state.value.is_some())
            .field("generation", &state.generation)
            .finish()
    }
}
