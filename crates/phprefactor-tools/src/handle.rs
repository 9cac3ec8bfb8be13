//! Shared, replaceable access to the current [`ToolManager`].

use crate::{Settings, ToolError, ToolManager};
use std::sync::{Arc, RwLock};
use tracing::info;

/// Holds the active manager.
///
/// Callers take a snapshot with [`current`](Self::current) and keep using it
/// for the whole operation; a refresh installs a new manager without touching
/// snapshots already handed out.
pub struct ManagerHandle {
    current: RwLock<Arc<ToolManager>>,
}

impl ManagerHandle {
    pub fn new(manager: ToolManager) -> Self {
        Self {
            current: RwLock::new(Arc::new(manager)),
        }
    }

    /// Snapshot of the active manager.
    pub fn current(&self) -> Arc<ToolManager> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Replace the active manager with one built from `settings`.
    ///
    /// On error the previous manager stays active.
    pub fn refresh(&self, settings: Settings) -> Result<Arc<ToolManager>, ToolError> {
        let fresh = Arc::new(self.current().rebuild(settings)?);
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Arc::clone(&fresh);
        info!(root = %fresh.root().display(), "tool manager refreshed");
        Ok(fresh)
    }

    /// Re-read settings from disk and refresh.
    pub fn reload(&self) -> Result<Arc<ToolManager>, ToolError> {
        let settings = Settings::load(self.current().root())?;
        self.refresh(settings)
    }
}
