use bytes::Bytes;
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard};

/// The Store is responsible for managing key-value pairs. It is designed to be
/// thread-safe, allowing it to be shared and cloned cheaply using reference
/// counting; all access goes through the guard returned by `lock`, so
/// concurrent readers and writers serialize on the inner mutex and no caller
/// ever observes a half-applied write.
#[derive(Clone)]
pub struct Store {
    inner: Arc<InnerStore>,
}

impl Store {
    pub fn new() -> Store {
        let state = State {
            keys: HashMap::new(),
        };

        let inner = Arc::new(InnerStore {
            state: Mutex::new(state),
        });

        Self { inner }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

pub struct InnerStore {
    state: Mutex<State>,
}

pub struct InnerStoreLocked<'a> {
    state: MutexGuard<'a, State>,
}

impl<'a> InnerStoreLocked<'a> {
    /// Overwrites any existing value for `key`; the last writer wins.
    pub fn set(&mut self, key: Key, data: Bytes) {
        self.state.keys.insert(key, data);
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.state.keys.get(key).cloned()
    }

    pub fn exists(&self, key: &str) -> bool {
        self.state.keys.contains_key(key)
    }

    pub fn size(&self) -> usize {
        self.state.keys.len()
    }
}

impl Deref for Store {
    type Target = InnerStore;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl InnerStore {
    pub fn lock(&self) -> InnerStoreLocked<'_> {
        let state = self.state.lock().unwrap();
        InnerStoreLocked { state }
    }
}

type Key = String;

struct State {
    keys: HashMap<Key, Bytes>,
}
