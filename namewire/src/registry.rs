//! Name-keyed entry storage for a single injector.

use crate::function::{InjectFn, Value};
use derivative::Derivative;
use fxhash::{FxHashMap, FxHashSet};

/// A stored dependency: an already-resolved value, or a lazy factory whose
/// result replaces the entry on first resolution.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub(crate) enum Entry {
    Value(#[derivative(Debug = "ignore")] Value),
    Factory(InjectFn),
}

/// Entry map plus the set of names visible to importing injectors. Keys
/// are already normalized by the caller; the registry itself is
/// name-agnostic storage.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    entries: FxHashMap<String, Entry>,
    public: FxHashSet<String>,
}

impl Registry {
    pub(crate) fn insert(&mut self, key: String, entry: Entry) {
        self.entries.insert(key, entry);
    }

    pub(crate) fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Memoizes a factory result: the value permanently replaces whatever
    /// was stored under `key`.
    pub(crate) fn replace_with_value(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), Entry::Value(value));
    }

    pub(crate) fn mark_public(&mut self, key: &str) {
        self.public.insert(key.to_string());
    }

    pub(crate) fn is_public(&self, key: &str) -> bool {
        self.public.contains(key)
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries
            .keys()
            .map(|key| (key.as_str(), self.public.contains(key.as_str())))
    }
}
