//! Named results of request steps.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::transport::ChainResponse;

/// Live, shared map from step name to response.
///
/// Entries appear as steps complete, so a reader holding a clone sees results
/// mid-chain. Reusing a name overwrites the earlier entry. Nothing is cleared
/// between runs.
#[derive(Debug, Clone, Default)]
pub struct Responses {
    inner: Arc<RwLock<HashMap<String, ChainResponse>>>,
}

impl Responses {
    pub(crate) fn insert(&self, name: String, response: ChainResponse) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.insert(name, response);
    }

    /// Returns a copy of the response stored under `name`.
    pub fn get(&self, name: &str) -> Option<ChainResponse> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.get(name).cloned()
    }

    /// Returns `true` if a response is stored under `name`.
    pub fn contains(&self, name: &str) -> bool {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.contains_key(name)
    }

    /// Number of stored responses.
    pub fn len(&self) -> usize {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.len()
    }

    /// Returns `true` if no named step has completed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names currently stored, in no particular order.
    pub fn names(&self) -> Vec<String> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.keys().cloned().collect()
    }

    /// Copies the whole map.
    pub fn snapshot(&self) -> HashMap<String, ChainResponse> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.clone()
    }
}
