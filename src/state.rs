//! App-level persisted state: selected project and time range.
//!
//! One slot, mirrored to durable storage under `appContext` on every write.
//! Writers touch only their own field, so a route updating the project and a
//! selector updating the range never clobber each other.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use crate::storage::KeyValueStore;

pub const APP_CONTEXT_KEY: &str = "appContext";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "yesterday")]
    Yesterday,
    #[default]
    #[serde(rename = "last_7_days")]
    Last7Days,
    #[serde(rename = "last_30_days")]
    Last30Days,
    #[serde(rename = "last_90_days")]
    Last90Days,
    #[serde(rename = "this_month")]
    ThisMonth,
    #[serde(rename = "last_month")]
    LastMonth,
    #[serde(rename = "this_year")]
    ThisYear,
    #[serde(rename = "all_time")]
    AllTime,
}

impl TimeRange {
    pub const ALL: [TimeRange; 9] = [
        TimeRange::Today,
        TimeRange::Yesterday,
        TimeRange::Last7Days,
        TimeRange::Last30Days,
        TimeRange::Last90Days,
        TimeRange::ThisMonth,
        TimeRange::LastMonth,
        TimeRange::ThisYear,
        TimeRange::AllTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Today => "today",
            TimeRange::Yesterday => "yesterday",
            TimeRange::Last7Days => "last_7_days",
            TimeRange::Last30Days => "last_30_days",
            TimeRange::Last90Days => "last_90_days",
            TimeRange::ThisMonth => "this_month",
            TimeRange::LastMonth => "last_month",
            TimeRange::ThisYear => "this_year",
            TimeRange::AllTime => "all_time",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        TimeRange::ALL.into_iter().find(|r| r.as_str() == s)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::Today => "Today",
            TimeRange::Yesterday => "Yesterday",
            TimeRange::Last7Days => "Last 7 days",
            TimeRange::Last30Days => "Last 30 days",
            TimeRange::Last90Days => "Last 90 days",
            TimeRange::ThisMonth => "This month",
            TimeRange::LastMonth => "Last month",
            TimeRange::ThisYear => "This year",
            TimeRange::AllTime => "All time",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppContextValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub time_range: TimeRange,
}

/// Field-scoped change; `None` leaves the field alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppContextPatch {
    pub project_id: Option<Option<String>>,
    pub time_range: Option<TimeRange>,
}

impl AppContextPatch {
    pub fn project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: Some(Some(project_id.into())),
            ..Self::default()
        }
    }

    pub fn time_range(time_range: TimeRange) -> Self {
        Self {
            time_range: Some(time_range),
            ..Self::default()
        }
    }

    fn apply(self, values: &mut AppContextValues) {
        if let Some(project_id) = self.project_id {
            values.project_id = project_id;
        }
        if let Some(time_range) = self.time_range {
            values.time_range = time_range;
        }
    }
}

pub struct AppContextStore {
    store: Rc<dyn KeyValueStore>,
    values: RefCell<AppContextValues>,
}

impl AppContextStore {
    /// Seed from `explicit`, else from storage, else the default.
    pub fn new(explicit: Option<AppContextValues>, store: Rc<dyn KeyValueStore>) -> Self {
        let values = explicit.unwrap_or_else(|| Self::load(store.as_ref()));
        let this = Self {
            store,
            values: RefCell::new(values),
        };
        this.persist();
        this
    }

    /// Read the stored value; unreadable data falls back to the default.
    pub fn load(store: &dyn KeyValueStore) -> AppContextValues {
        match store.get(APP_CONTEXT_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!("Stored app context is corrupt, using defaults: {}", e);
                    AppContextValues::default()
                }
            },
            Ok(None) => AppContextValues::default(),
            Err(e) => {
                tracing::warn!("Could not read app context from storage: {}", e);
                AppContextValues::default()
            }
        }
    }

    pub fn values(&self) -> AppContextValues {
        self.values.borrow().clone()
    }

    pub fn project_id(&self) -> Option<String> {
        self.values.borrow().project_id.clone()
    }

    pub fn time_range(&self) -> TimeRange {
        self.values.borrow().time_range
    }

    /// Merge `patch` into the current value and persist. Returns the result.
    pub fn update(&self, patch: AppContextPatch) -> AppContextValues {
        let values = {
            let mut values = self.values.borrow_mut();
            patch.apply(&mut values);
            values.clone()
        };
        self.persist();
        values
    }

    pub fn set_project_id(&self, project_id: Option<String>) -> AppContextValues {
        self.update(AppContextPatch {
            project_id: Some(project_id),
            time_range: None,
        })
    }

    pub fn set_time_range(&self, time_range: TimeRange) -> AppContextValues {
        self.update(AppContextPatch::time_range(time_range))
    }

    fn persist(&self) {
        let raw = match serde_json::to_string(&*self.values.borrow()) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Failed to serialize app context: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(APP_CONTEXT_KEY, &raw) {
            tracing::warn!("Failed to persist app context: {}", e);
        }
    }
}
