//! Data hooks over the query cache.

use dioxus::prelude::*;
use std::future::Future;

use super::context::{use_dashboard, use_services, DashboardContext, Services};
use crate::auth::Session;
use crate::client::ApiError;
use crate::query::{QueryResult, Resources};

pub fn use_session() -> Signal<Session> {
    use_dashboard().session
}

/// Project in view, provided by the project layout.
#[derive(Clone, Copy)]
pub struct ProjectScope {
    pub id: Signal<String>,
}

pub fn use_project_id() -> Signal<String> {
    use_context::<ProjectScope>().id
}

/// Handle for event handlers that write through the API.
#[derive(Clone, Copy)]
pub struct Api {
    services: CopyValue<Services>,
    ctx: DashboardContext,
}

impl Api {
    /// Resources bound to the client current at call time.
    pub fn resources(&self) -> Resources {
        self.ctx.resources(&self.services.read())
    }

    pub fn services(&self) -> Services {
        self.services.read().clone()
    }
}

pub fn use_api() -> Api {
    let services = use_services();
    let ctx = use_dashboard();
    let services = use_hook(|| CopyValue::new(services));
    Api { services, ctx }
}

/// A cached read bound to the view's lifetime.
pub struct Query<T: 'static> {
    resource: Resource<Result<T, ApiError>>,
}

impl<T: 'static> Clone for Query<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> Copy for Query<T> {}

impl<T: Clone + 'static> Query<T> {
    pub fn result(&self) -> QueryResult<T> {
        match &*self.resource.read() {
            Some(result) => QueryResult::from_result(result.clone()),
            None => QueryResult::loading(),
        }
    }

    pub fn refetch(&mut self) {
        self.resource.restart();
    }
}

/// Run `read` against the current `Resources`. Signals read inside `read`
/// (before it returns its future) become dependencies: the query reruns when
/// they, the API client, or the cache contents change. A 401/403 drops the
/// session so the guards send the user back to login.
pub fn use_query<T, F, Fut>(mut read: F) -> Query<T>
where
    T: Clone + 'static,
    F: FnMut(Resources) -> Fut + 'static,
    Fut: Future<Output = Result<T, ApiError>> + 'static,
{
    let services = use_services();
    let ctx = use_dashboard();

    let resource = use_resource(move || {
        let _ = (ctx.cache_epoch)();
        let pending = read(ctx.resources(&services));
        let session = services.session.clone();
        async move {
            let result = pending.await;
            if let Err(e) = &result {
                if e.is_auth_failure() {
                    session.invalidate().await;
                }
            }
            result
        }
    });

    Query { resource }
}

/// Run a write, reporting failures into `error`. Returns the value on success.
pub async fn run_mutation<T>(
    operation: impl Future<Output = Result<T, ApiError>>,
    mut error: Signal<Option<String>>,
) -> Option<T> {
    match operation.await {
        Ok(value) => {
            error.set(None);
            Some(value)
        }
        Err(e) => {
            tracing::warn!("Mutation failed: {}", e);
            error.set(Some(e.user_message()));
            None
        }
    }
}
