//! Selected project and time range, shared by every view.
//!
//! Writes go through `AppContextStore` (merge + persist) and the merged
//! result is published to a signal.

use dioxus::prelude::*;
use std::rc::Rc;

use super::context::Services;
use crate::state::{AppContextPatch, AppContextStore, AppContextValues, TimeRange};

#[derive(Clone, Copy, PartialEq)]
pub struct AppState {
    values: Signal<AppContextValues>,
    store: CopyValue<Rc<AppContextStore>>,
}

impl AppState {
    pub fn values(&self) -> AppContextValues {
        (self.values)()
    }

    pub fn time_range(&self) -> TimeRange {
        self.values.read().time_range
    }

    pub fn project_id(&self) -> Option<String> {
        self.values.read().project_id.clone()
    }

    pub fn update(&self, patch: AppContextPatch) {
        let merged = self.store.read().update(patch);
        let mut values = self.values;
        if *values.peek() != merged {
            values.set(merged);
        }
    }

    pub fn set_time_range(&self, time_range: TimeRange) {
        self.update(AppContextPatch::time_range(time_range));
    }

    pub fn set_project_id(&self, project_id: Option<String>) {
        self.update(AppContextPatch {
            project_id: Some(project_id),
            time_range: None,
        });
    }
}

/// Initialize app state provider - call once at app root
pub fn use_app_state_provider(services: &Services) -> AppState {
    let store = services.app_state.clone();
    let values = use_signal(|| store.values());
    let store = use_hook(|| CopyValue::new(store));
    use_context_provider(|| AppState { values, store })
}

/// Get app state - use in any component
pub fn use_app_state() -> AppState {
    use_context::<AppState>()
}
