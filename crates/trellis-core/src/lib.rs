#![doc = r"Keyed reconciliation of retained trees against an external document."]

mod build;
pub mod collections;
mod document;
mod engine;
mod events;
mod focus;
pub mod hash;
mod host;
mod index;
mod key;
mod mount;
mod node;
pub mod platform;
mod props;
mod reconcile;
pub mod runtime;

pub use build::{ElementSpec, RenderContext};
pub use document::{MemoryDocument, MutationCounts};
pub use engine::{Engine, EngineConfig};
pub use events::Event;
pub use focus::FocusSet;
pub use host::{Host, HostError, HostHandle};
pub use index::{DuplicateKeys, KeyIndex};
pub use key::{Identity, KeyBuilder, KeyScope, KeyToken, StableKey};
pub use mount::{App, Mount};
pub use node::{Hook, Hooks, Node, NodeError, NodeId, NodeList, NodePool};
pub use platform::RuntimeScheduler;
pub use props::{AttrId, Callback, EventKind, Prop, PropName, PropValue, Tag};
pub use reconcile::PatchStats;
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle};
