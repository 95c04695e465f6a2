//! Typed reads and writes over the query cache.
//!
//! A read is disabled (never reaches the network) until there is a client and
//! every id it needs is non-empty. A successful write invalidates the
//! resource prefixes it affects.

use std::future::Future;
use std::rc::Rc;

use super::{keys, QueryCache, QueryKey};
use crate::client::*;
use crate::state::TimeRange;

#[derive(Clone)]
pub struct Resources {
    cache: QueryCache,
    client: Option<Rc<ApiClient>>,
}

impl PartialEq for Resources {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cache.inner, &other.cache.inner) && self.client == other.client
    }
}

impl Resources {
    pub fn new(cache: QueryCache, client: Option<Rc<ApiClient>>) -> Self {
        Self { cache, client }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn read<T, F, Fut>(&self, key: QueryKey, enabled: bool, call: F) -> Result<T, ApiError>
    where
        T: Clone + 'static,
        F: Fn(Rc<ApiClient>) -> Fut + 'static,
        Fut: Future<Output = Result<T, ApiError>> + 'static,
    {
        let options = self.cache.options().enabled(enabled && self.client.is_some());
        let client = self.client.clone();
        self.cache
            .fetch_with(key, &options, move || {
                let pending = client.clone().map(&call);
                async move {
                    match pending {
                        Some(fut) => fut.await,
                        None => Err(ApiError::Disabled),
                    }
                }
            })
            .await
    }

    fn writer(&self) -> Result<Rc<ApiClient>, ApiError> {
        self.client.clone().ok_or(ApiError::Disabled)
    }

    // ---- projects ----

    pub async fn projects(&self) -> Result<Vec<Project>, ApiError> {
        self.read(keys::projects(), true, |c| async move {
            c.list_projects().await
        })
        .await
    }

    pub async fn project(&self, project_id: &str) -> Result<Project, ApiError> {
        let id = project_id.to_string();
        self.read(keys::project(project_id), !id.is_empty(), move |c| {
            let id = id.clone();
            async move { c.get_project(&id).await }
        })
        .await
    }

    pub async fn create_project(&self, project: &NewProject) -> Result<Project, ApiError> {
        let client = self.writer()?;
        self.cache
            .mutate(client.create_project(project), &[keys::projects()])
            .await
    }

    pub async fn update_project(
        &self,
        project_id: &str,
        update: &ProjectUpdate,
    ) -> Result<Project, ApiError> {
        let client = self.writer()?;
        let project = self
            .cache
            .mutate(
                client.update_project(project_id, update),
                &[keys::projects()],
            )
            .await?;
        self.cache.set_data(keys::project(project_id), project.clone());
        Ok(project)
    }

    /// Deletes the project and drops everything cached for it.
    pub async fn delete_project(&self, project_id: &str) -> Result<(), ApiError> {
        let client = self.writer()?;
        self.cache
            .mutate(client.delete_project(project_id), &[keys::projects()])
            .await?;
        for prefix in [
            keys::project(project_id),
            keys::payment_providers(project_id),
            keys::llm_providers(project_id),
            keys::analytics(project_id),
            keys::revenue(project_id),
            keys::llm_traces(project_id),
            QueryKey::new(["events", project_id]),
            keys::goals(project_id),
        ] {
            self.cache.remove(&prefix);
        }
        Ok(())
    }

    // ---- payment providers ----

    pub async fn payment_providers(&self, project_id: &str) -> Result<Vec<PaymentProvider>, ApiError> {
        let id = project_id.to_string();
        self.read(keys::payment_providers(project_id), !id.is_empty(), move |c| {
            let id = id.clone();
            async move { c.list_payment_providers(&id).await }
        })
        .await
    }

    pub async fn create_payment_provider(
        &self,
        project_id: &str,
        provider: &NewPaymentProvider,
    ) -> Result<PaymentProvider, ApiError> {
        let client = self.writer()?;
        self.cache
            .mutate(
                client.create_payment_provider(project_id, provider),
                &[keys::payment_providers(project_id)],
            )
            .await
    }

    pub async fn update_payment_provider(
        &self,
        project_id: &str,
        provider_id: &str,
        update: &PaymentProviderUpdate,
    ) -> Result<PaymentProvider, ApiError> {
        let client = self.writer()?;
        self.cache
            .mutate(
                client.update_payment_provider(project_id, provider_id, update),
                &[keys::payment_providers(project_id)],
            )
            .await
    }

    /// A sync changes revenue figures as well as the provider's status.
    pub async fn sync_payment_provider(
        &self,
        project_id: &str,
        provider_id: &str,
    ) -> Result<PaymentProvider, ApiError> {
        let client = self.writer()?;
        self.cache
            .mutate(
                client.sync_payment_provider(project_id, provider_id),
                &[keys::payment_providers(project_id), keys::revenue(project_id)],
            )
            .await
    }

    pub async fn delete_payment_provider(
        &self,
        project_id: &str,
        provider_id: &str,
    ) -> Result<(), ApiError> {
        let client = self.writer()?;
        self.cache
            .mutate(
                client.delete_payment_provider(project_id, provider_id),
                &[keys::payment_providers(project_id), keys::revenue(project_id)],
            )
            .await
    }

    // ---- LLM providers ----

    pub async fn llm_providers(&self, project_id: &str) -> Result<Vec<LlmProvider>, ApiError> {
        let id = project_id.to_string();
        self.read(keys::llm_providers(project_id), !id.is_empty(), move |c| {
            let id = id.clone();
            async move { c.list_llm_providers(&id).await }
        })
        .await
    }

    pub async fn create_llm_provider(
        &self,
        project_id: &str,
        provider: &NewLlmProvider,
    ) -> Result<LlmProvider, ApiError> {
        let client = self.writer()?;
        self.cache
            .mutate(
                client.create_llm_provider(project_id, provider),
                &[keys::llm_providers(project_id)],
            )
            .await
    }

    pub async fn delete_llm_provider(
        &self,
        project_id: &str,
        provider_id: &str,
    ) -> Result<(), ApiError> {
        let client = self.writer()?;
        self.cache
            .mutate(
                client.delete_llm_provider(project_id, provider_id),
                &[keys::llm_providers(project_id), keys::llm_traces(project_id)],
            )
            .await
    }

    // ---- analytics ----

    pub async fn analytics_overview(
        &self,
        project_id: &str,
        query: &AnalyticsQuery,
    ) -> Result<AnalyticsOverview, ApiError> {
        let id = project_id.to_string();
        let q = query.clone();
        self.read(
            keys::analytics_tile(project_id, "overview", query),
            !id.is_empty(),
            move |c| {
                let (id, q) = (id.clone(), q.clone());
                async move { c.analytics_overview(&id, &q).await }
            },
        )
        .await
    }

    pub async fn analytics_timeseries(
        &self,
        project_id: &str,
        query: &AnalyticsQuery,
    ) -> Result<Vec<TimeseriesPoint>, ApiError> {
        let id = project_id.to_string();
        let q = query.clone();
        self.read(
            keys::analytics_tile(project_id, "timeseries", query),
            !id.is_empty(),
            move |c| {
                let (id, q) = (id.clone(), q.clone());
                async move { c.analytics_timeseries(&id, &q).await }
            },
        )
        .await
    }

    pub async fn analytics_breakdown(
        &self,
        project_id: &str,
        kind: BreakdownKind,
        query: &AnalyticsQuery,
    ) -> Result<Breakdown, ApiError> {
        let id = project_id.to_string();
        let q = query.clone();
        self.read(
            keys::analytics_breakdown(project_id, kind, query),
            !id.is_empty(),
            move |c| {
                let (id, q) = (id.clone(), q.clone());
                async move { c.analytics_breakdown(&id, kind, &q).await }
            },
        )
        .await
    }

    // ---- revenue, traces, events, goals ----

    pub async fn revenue(&self, project_id: &str, range: TimeRange) -> Result<Revenue, ApiError> {
        let id = project_id.to_string();
        self.read(keys::revenue_for(project_id, range), !id.is_empty(), move |c| {
            let id = id.clone();
            async move { c.revenue(&id, range).await }
        })
        .await
    }

    pub async fn llm_trace_summary(
        &self,
        project_id: &str,
        range: TimeRange,
    ) -> Result<LlmTraceSummary, ApiError> {
        let id = project_id.to_string();
        self.read(
            keys::llm_trace_summary(project_id, range),
            !id.is_empty(),
            move |c| {
                let id = id.clone();
                async move { c.llm_trace_summary(&id, range).await }
            },
        )
        .await
    }

    pub async fn llm_traces(
        &self,
        project_id: &str,
        range: TimeRange,
        limit: u32,
    ) -> Result<Vec<LlmTrace>, ApiError> {
        let id = project_id.to_string();
        self.read(
            keys::llm_trace_list(project_id, range, limit),
            !id.is_empty(),
            move |c| {
                let id = id.clone();
                async move { c.llm_traces(&id, range, limit).await }
            },
        )
        .await
    }

    pub async fn events(
        &self,
        project_id: &str,
        range: TimeRange,
    ) -> Result<Vec<EventSummary>, ApiError> {
        let id = project_id.to_string();
        self.read(keys::events(project_id, range), !id.is_empty(), move |c| {
            let id = id.clone();
            async move { c.events(&id, range).await }
        })
        .await
    }

    pub async fn goals(&self, project_id: &str, range: TimeRange) -> Result<Vec<Goal>, ApiError> {
        let id = project_id.to_string();
        self.read(keys::goals_for(project_id, range), !id.is_empty(), move |c| {
            let id = id.clone();
            async move { c.goals(&id, range).await }
        })
        .await
    }

    pub async fn create_goal(&self, project_id: &str, goal: &NewGoal) -> Result<Goal, ApiError> {
        let client = self.writer()?;
        self.cache
            .mutate(client.create_goal(project_id, goal), &[keys::goals(project_id)])
            .await
    }

    pub async fn delete_goal(&self, project_id: &str, goal_id: &str) -> Result<(), ApiError> {
        let client = self.writer()?;
        self.cache
            .mutate(
                client.delete_goal(project_id, goal_id),
                &[keys::goals(project_id)],
            )
            .await
    }
}
