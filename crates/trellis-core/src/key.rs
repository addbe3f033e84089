use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use crate::hash::hash_seq;

/// One step of a node's identity path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyToken {
    Position(u32),
    Key(Rc<str>),
    Id(Rc<str>),
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyToken::Position(index) => write!(f, "{index}"),
            KeyToken::Key(key) => write!(f, "'{key}'"),
            KeyToken::Id(id) => write!(f, "#{id}"),
        }
    }
}

/// Identity of a node across generations: a hash plus the token path it
/// was computed from.
///
/// The hash only rejects fast. Equality always compares the full token
/// path, so two colliding paths never match.
#[derive(Clone, Debug, Default)]
pub struct StableKey {
    hash: u64,
    tokens: Vec<KeyToken>,
}

impl StableKey {
    pub fn from_tokens(tokens: Vec<KeyToken>) -> Self {
        if tokens.is_empty() {
            return Self::default();
        }
        Self {
            hash: hash_seq(tokens.iter()),
            tokens,
        }
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn tokens(&self) -> &[KeyToken] {
        &self.tokens
    }

    /// Text nodes and the per-generation root carry an empty key.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.hash = 0;
        self.tokens.clear();
    }
}

impl PartialEq for StableKey {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.tokens == other.tokens
    }
}

impl Eq for StableKey {}

impl Hash for StableKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Display for StableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tokens.is_empty() {
            return f.write_str("<empty>");
        }
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

/// Identity hints available for a node at construction time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity {
    pub id: Option<Rc<str>>,
    pub key: Option<Rc<str>>,
    pub position: Option<u32>,
}

impl Identity {
    /// Picks the token in priority order: id, explicit key, position.
    pub fn token(&self) -> KeyToken {
        if let Some(id) = &self.id {
            return KeyToken::Id(id.clone());
        }
        if let Some(key) = &self.key {
            return KeyToken::Key(key.clone());
        }
        match self.position {
            Some(position) => KeyToken::Position(position),
            None => {
                log::error!("node has no stable identity (no id, key or position); using position 0");
                KeyToken::Position(0)
            }
        }
    }
}

/// Scoped token stack that composes node keys from the ancestor path.
///
/// An id token anchors the path: keys built below it start at the id and
/// ignore everything above.
#[derive(Debug, Default)]
pub struct KeyBuilder {
    tokens: Vec<KeyToken>,
    anchors: Vec<usize>,
}

impl KeyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: KeyToken) {
        if matches!(token, KeyToken::Id(_)) {
            self.anchors.push(self.tokens.len());
        }
        self.tokens.push(token);
    }

    pub fn pop(&mut self) -> Option<KeyToken> {
        let token = self.tokens.pop();
        match &token {
            Some(KeyToken::Id(_)) => {
                self.anchors.pop();
            }
            Some(_) => {}
            None => {
                debug_assert!(false, "KeyBuilder::pop without a matching push");
                log::error!("key builder popped with an empty stack");
            }
        }
        token
    }

    /// Pushes `token` and returns a guard that pops back to the current
    /// depth when dropped.
    pub fn scope(&mut self, token: KeyToken) -> KeyScope<'_> {
        let depth = self.tokens.len();
        self.push(token);
        KeyScope {
            builder: self,
            depth,
        }
    }

    pub fn depth(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_balanced(&self) -> bool {
        self.tokens.is_empty()
    }

    pub(crate) fn truncate(&mut self, depth: usize) {
        while self.tokens.len() > depth {
            self.pop();
        }
    }

    /// Drops whatever an unbalanced build left behind. Returns the number of
    /// stray tokens.
    pub(crate) fn reset(&mut self) -> usize {
        let stray = self.tokens.len();
        self.tokens.clear();
        self.anchors.clear();
        stray
    }

    /// Key of the current path.
    pub fn build(&self) -> StableKey {
        StableKey::from_tokens(self.anchored().to_vec())
    }

    /// Key of the current path extended by `token`, without pushing it.
    pub fn build_with(&self, token: &KeyToken) -> StableKey {
        if matches!(token, KeyToken::Id(_)) {
            return StableKey::from_tokens(vec![token.clone()]);
        }
        let prefix = self.anchored();
        let mut tokens = Vec::with_capacity(prefix.len() + 1);
        tokens.extend(prefix.iter().chain(iter::once(token)).cloned());
        StableKey::from_tokens(tokens)
    }

    fn anchored(&self) -> &[KeyToken] {
        let start = self.anchors.last().copied().unwrap_or(0);
        &self.tokens[start..]
    }
}

/// Guard returned by [`KeyBuilder::scope`].
pub struct KeyScope<'a> {
    builder: &'a mut KeyBuilder,
    depth: usize,
}

impl Deref for KeyScope<'_> {
    type Target = KeyBuilder;

    fn deref(&self) -> &KeyBuilder {
        self.builder
    }
}

impl DerefMut for KeyScope<'_> {
    fn deref_mut(&mut self) -> &mut KeyBuilder {
        self.builder
    }
}

impl Drop for KeyScope<'_> {
    fn drop(&mut self) {
        self.builder.truncate(self.depth);
    }
}

#[cfg(test)]
#[path = "tests/key_tests.rs"]
mod tests;
