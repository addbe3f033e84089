//! Map and set aliases shared by the engine and the in-memory document.

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::{HashMap, HashSet};
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use hashbrown::{HashMap, HashSet};
}

use crate::host::HostHandle;
use crate::props::EventKind;
use crate::Callback;

pub(crate) type HandlerMap = map::HashMap<EventKind, Callback>;
pub(crate) type HandleSet = map::HashSet<HostHandle>;
