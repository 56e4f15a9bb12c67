//! Id-uniqueness registries.
//!
//! Duplicate-id enforcement records accepted ids in an injectable store so
//! callers choose the lifetime: fresh per call, shared per session, or the
//! process-wide registry the default entry point uses.

use std::collections::HashSet;
use std::sync::{LazyLock, Mutex, PoisonError};

/// Store of reserved id values.
pub trait IdRegistry {
    /// Reserve `id`, returning `false` when it was already taken.
    fn try_reserve(&mut self, id: &str) -> bool;
}

/// Fresh registry scoped to a single sanitization call.
#[derive(Debug, Default)]
pub struct CallRegistry {
    seen: HashSet<String>,
}

impl IdRegistry for CallRegistry {
    fn try_reserve(&mut self, id: &str) -> bool {
        self.seen.insert(id.to_string())
    }
}

/// Process-wide id set, grows monotonically across calls until reset.
static GLOBAL_IDS: LazyLock<Mutex<HashSet<String>>> =
    LazyLock::new(|| Mutex::new(HashSet::new()));

/// Handle onto the process-wide registry. Concurrent calls serialize on an
/// internal mutex.
#[derive(Debug, Default)]
pub struct SharedRegistry;

impl IdRegistry for SharedRegistry {
    fn try_reserve(&mut self, id: &str) -> bool {
        GLOBAL_IDS
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string())
    }
}

/// Clear the process-wide registry. Callers sanitizing independent documents
/// use this between documents when cross-document uniqueness is undesired.
pub fn reset_global_ids() {
    GLOBAL_IDS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_registry_rejects_duplicates() {
        let mut registry = CallRegistry::default();
        assert!(registry.try_reserve("intro"));
        assert!(!registry.try_reserve("intro"));
        assert!(registry.try_reserve("intro-2"));
    }

    #[test]
    fn call_registries_are_independent() {
        let mut first = CallRegistry::default();
        let mut second = CallRegistry::default();
        assert!(first.try_reserve("x"));
        assert!(second.try_reserve("x"));
    }
}
