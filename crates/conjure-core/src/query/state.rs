// ── Query state ──

use std::fmt;
use std::sync::Arc;

use crate::error::CoreError;

/// What a subscriber sees for one query.
///
/// Data from an earlier success survives later failures; `error` holds
/// the most recent failure and is cleared by the next success.
pub struct QueryState<T> {
    pub data: Option<Arc<T>>,
    pub error: Option<CoreError>,
    /// A fetch for this key is in flight.
    pub is_validating: bool,
}

impl<T> QueryState<T> {
    /// Nothing has resolved yet, successfully or otherwise.
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.error.is_none()
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_deref()
    }
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_validating: false,
        }
    }
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            is_validating: self.is_validating,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for QueryState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryState")
            .field("data", &self.data)
            .field("error", &self.error)
            .field("is_validating", &self.is_validating)
            .finish()
    }
}
