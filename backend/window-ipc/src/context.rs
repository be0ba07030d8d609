use crate::transport::WindowHandle;

use common::WindowId;

use std::fmt;
use std::sync::Arc;

/// What a handler knows about the window that invoked it.
#[derive(Clone)]
pub struct WindowContext {
    window_id: WindowId,
    window_type: Arc<str>,
    window: Arc<dyn WindowHandle>,
}

impl WindowContext {
    pub fn new(window_id: WindowId, window_type: Arc<str>, window: Arc<dyn WindowHandle>) -> Self {
        Self {
            window_id,
            window_type,
            window,
        }
    }

    pub fn window_id(&self) -> &WindowId {
        &self.window_id
    }

    pub fn window_type(&self) -> &str {
        &self.window_type
    }

    pub fn window(&self) -> &Arc<dyn WindowHandle> {
        &self.window
    }
}

impl fmt::Debug for WindowContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowContext")
            .field("window_id", &self.window_id)
            .field("window_type", &self.window_type)
            .finish_non_exhaustive()
    }
}
