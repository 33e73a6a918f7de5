use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::BuildScreenState;

use super::{events::ScreenEvent, reducer::reduce};

#[derive(Clone)]
pub struct ScreenStore {
    inner: Arc<Mutex<BuildScreenState>>,
}

impl ScreenStore {
    pub fn new(state: BuildScreenState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn state(&self) -> BuildScreenState {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn apply(&self, ev: ScreenEvent) {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let next = reduce(guard.clone(), ev);
        *guard = next;
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&BuildScreenState) -> R) -> R {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }
}
