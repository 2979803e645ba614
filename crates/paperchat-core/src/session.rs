//! Tracks which targets have a generation in flight.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::PaperError;

/// In-progress markers keyed by target document.
///
/// A second generation for a target that is already streaming fails fast
/// instead of queueing or cancelling the first one.
#[derive(Debug, Clone, Default)]
pub struct GenerationRegistry {
    active: Arc<Mutex<HashSet<String>>>,
}

impl GenerationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mark `target` as generating. The marker is cleared when the guard drops.
    pub fn try_begin(&self, target: &str) -> Result<GenerationGuard, PaperError> {
        if !self.lock().insert(target.to_string()) {
            return Err(PaperError::GenerationInProgress(target.to_string()));
        }
        tracing::debug!("Generation started for {}", target);
        Ok(GenerationGuard {
            registry: self.clone(),
            target: target.to_string(),
        })
    }

    pub fn is_active(&self, target: &str) -> bool {
        self.lock().contains(target)
    }

    pub fn active_count(&self) -> usize {
        self.lock().len()
    }
}

/// Releases the in-progress marker for its target when dropped.
#[derive(Debug)]
pub struct GenerationGuard {
    registry: GenerationRegistry,
    target: String,
}

impl GenerationGuard {
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.target);
        tracing::debug!("Generation finished for {}", self.target);
    }
}
