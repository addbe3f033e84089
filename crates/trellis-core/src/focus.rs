use crate::collections::HandleSet;
use crate::host::HostHandle;

/// External nodes the host currently reports as focused.
///
/// The embedding layer fills it from focus events. The reconciler only
/// reads it, once per cursor decision.
#[derive(Debug, Default, Clone)]
pub struct FocusSet {
    focused: HandleSet,
}

impl FocusSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, handle: HostHandle) {
        self.focused.insert(handle);
    }

    pub fn remove(&mut self, handle: HostHandle) -> bool {
        self.focused.remove(&handle)
    }

    pub fn clear(&mut self) {
        self.focused.clear();
    }

    pub fn is_focused(&self, handle: HostHandle) -> bool {
        self.focused.contains(&handle)
    }

    pub fn len(&self) -> usize {
        self.focused.len()
    }

    pub fn is_empty(&self) -> bool {
        self.focused.is_empty()
    }
}
