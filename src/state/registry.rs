//! Thread-safe registry over a trie.
//!
//! One global mutex guards the whole index. Callers never see the
//! guard: every operation takes a closure that runs while the lock is
//! held, which keeps the lock span exactly as wide as the closure and
//! makes it impossible to park a reference past the unlock. Closures
//! must not re-enter the same registry and must not block.

use parking_lot::Mutex;

use cinder_proto::trie::{Alphabet, InvalidKey, Trie};

/// Result of [`Registry::insert_if_absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Exists,
    Invalid,
}

/// Result of [`Registry::find_or_insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<R> {
    Found(R),
    Created(R),
}

impl<R> Resolved<R> {
    pub fn into_inner(self) -> R {
        match self {
            Resolved::Found(r) | Resolved::Created(r) => r,
        }
    }
}

pub struct Registry<A: Alphabet, V> {
    inner: Mutex<Trie<A, V>>,
}

impl<A: Alphabet, V> Default for Registry<A, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Alphabet, V> Registry<A, V> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Trie::new()),
        }
    }

    /// Run `f` on the entry under `key`, if present.
    pub fn find_and_act<R>(&self, key: &[u8], f: impl FnOnce(&mut V) -> R) -> Option<R> {
        let mut trie = self.inner.lock();
        trie.get_mut(key).map(f)
    }

    /// Atomically resolve `key`: run `on_found` against an existing
    /// entry, or insert the value produced by `on_missing`. Both
    /// callbacks execute under the global lock.
    pub fn find_or_insert<R>(
        &self,
        key: &[u8],
        on_found: impl FnOnce(&mut V) -> R,
        on_missing: impl FnOnce() -> (V, R),
    ) -> Result<Resolved<R>, InvalidKey> {
        let mut trie = self.inner.lock();
        if let Some(value) = trie.get_mut(key) {
            return Ok(Resolved::Found(on_found(value)));
        }
        let (value, result) = on_missing();
        trie.insert(key, value)?;
        Ok(Resolved::Created(result))
    }

    /// Insert `value` under `key` unless the key is already bound.
    pub fn insert_if_absent(&self, key: &[u8], value: V) -> InsertOutcome {
        let mut trie = self.inner.lock();
        if trie.contains(key) {
            return InsertOutcome::Exists;
        }
        match trie.insert(key, value) {
            Ok(_) => InsertOutcome::Inserted,
            Err(InvalidKey) => InsertOutcome::Invalid,
        }
    }

    /// Run `f` on the entry under `key`; when `f`'s second return is
    /// true, remove the entry before unlocking. One lock hold for the
    /// whole compound, so `f` must never call back into this registry.
    pub fn find_act_remove<R>(&self, key: &[u8], f: impl FnOnce(&mut V) -> (R, bool)) -> Option<R> {
        let mut trie = self.inner.lock();
        let (result, remove) = f(trie.get_mut(key)?);
        if remove {
            trie.remove(key);
        }
        Some(result)
    }

    pub fn remove(&self, key: &[u8]) -> Option<V> {
        self.inner.lock().remove(key)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.inner.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visit every entry in alphabet order under one lock hold.
    pub fn for_each(&self, f: impl FnMut(&[u8], &V)) {
        self.inner.lock().for_each(f);
    }
}
