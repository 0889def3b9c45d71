// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Explicit replacement for the original backend's `post_save`/`post_delete`
//! signal handlers on `MemoryGroup` (see spec.md §9): whenever a memory
//! group mutates, dependent records mirror a small set of fields. Instead of
//! a reflective hook fired by an ORM, callers that mutate a `MemoryGroup`
//! invoke [`on_memory_group_changed`] on every registered observer at the
//! point of mutation.

use crate::decode::memory_group::MemoryGroup;

#[derive(Debug, Clone)]
pub enum MemoryGroupEvent<'a> {
    Created(&'a MemoryGroup),
    Updated { old: &'a MemoryGroup, new: &'a MemoryGroup },
    Deleted(&'a MemoryGroup),
}

/// Implemented by anything that mirrors a subset of `MemoryGroup` fields
/// (e.g. a device-instance registry) and needs to stay in sync.
pub trait MemoryGroupObserver: Send + Sync {
    fn on_memory_group_changed(&self, event: MemoryGroupEvent<'_>);
}

/// A simple fan-out registry of observers, invoked at the single call site
/// that mutates a `MemoryGroup` (config load/reload). Kept process-local;
/// this crate has no ORM layer to piggyback a signal on.
#[derive(Default)]
pub struct MemoryGroupObservers {
    observers: Vec<Box<dyn MemoryGroupObserver>>,
}

impl MemoryGroupObservers {
    pub fn new() -> Self {
        Self { observers: Vec::new() }
    }

    pub fn register(&mut self, observer: Box<dyn MemoryGroupObserver>) {
        self.observers.push(observer);
    }

    pub fn notify(&self, event: MemoryGroupEvent<'_>) {
        for o in &self.observers {
            o.on_memory_group_changed(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    struct RecordingObserver {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl MemoryGroupObserver for RecordingObserver {
        fn on_memory_group_changed(&self, event: MemoryGroupEvent<'_>) {
            let label = match event {
                MemoryGroupEvent::Created(g) => format!("created:{}", g.name),
                MemoryGroupEvent::Updated { new, .. } => format!("updated:{}", new.name),
                MemoryGroupEvent::Deleted(g) => format!("deleted:{}", g.name),
            };
            self.seen.lock().expect("lock").push(label);
        }
    }

    fn group(name: &str) -> MemoryGroup {
        MemoryGroup {
            name: name.to_string(),
            description: String::new(),
            size_byte: 2,
            start_address: 0.0,
            variables: Vec::new(),
        }
    }

    #[test]
    fn notifies_every_registered_observer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = MemoryGroupObservers::new();
        registry.register(Box::new(RecordingObserver { seen: seen.clone() }));

        let g = group("zone-a");
        registry.notify(MemoryGroupEvent::Created(&g));
        assert_eq!(*seen.lock().expect("lock"), vec!["created:zone-a".to_string()]);
    }
}
