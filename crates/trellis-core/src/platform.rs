//! Platform abstraction for render scheduling.
//!
//! The engine never decides when a pass runs. A host supplies a scheduler
//! that turns a render request into a one-shot "next frame" callback and
//! later drives [`crate::Mount::on_frame`].

/// Schedules render passes on behalf of a mount.
///
/// Implementations must be safe to share across threads, since hosts often
/// wake their event loop from another thread.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host run a frame soon.
    fn schedule_frame(&self);
}
