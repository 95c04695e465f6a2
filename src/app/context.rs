//! App-wide services and reactive context.
//!
//! `Services` is built once at the root from configuration and handed down
//! through Dioxus context. `DashboardContext` mirrors the parts views react to
//! (session, current API client, cache changes) as signals.

use dioxus::prelude::*;
use std::rc::Rc;
use std::time::Duration;

use crate::auth::{AuthBackend, Session, SessionManager};
use crate::client::{ApiClient, ClientFactory};
use crate::config::{ConfigError, DashboardConfig};
use crate::live::Transport;
use crate::query::{QueryCache, QueryOptions, Resources};
use crate::state::AppContextStore;
use crate::storage::KeyValueStore;

/// Long-lived collaborators, constructed once per app instance.
#[derive(Clone)]
pub struct Services {
    pub config: Rc<DashboardConfig>,
    pub store: Rc<dyn KeyValueStore>,
    pub auth: Rc<AuthBackend>,
    pub session: SessionManager,
    pub clients: Rc<ClientFactory>,
    pub cache: QueryCache,
    pub app_state: Rc<AppContextStore>,
    pub transport: Rc<dyn Transport>,
}

impl Services {
    pub fn from_config(
        config: DashboardConfig,
        store: Rc<dyn KeyValueStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let auth = Rc::new(AuthBackend::from_config(&config, store.clone())?);
        let session = SessionManager::new(auth.clone());
        let clients = Rc::new(ClientFactory::new(config.api_base()));
        let cache = QueryCache::new(QueryOptions::from_settings(&config.query));
        let app_state = Rc::new(AppContextStore::new(None, store.clone()));

        tracing::info!(
            "Dashboard services ready (auth mode: {})",
            auth.mode().as_str()
        );

        Ok(Self {
            config: Rc::new(config),
            store,
            auth,
            session,
            clients,
            cache,
            app_state,
            transport: platform_transport(),
        })
    }

    /// Services for the current platform: baked-in or file/env configuration
    /// plus the platform's durable store.
    pub fn init() -> Result<Self, ConfigError> {
        let config = crate::config::platform_config()?;
        Self::from_config(config, crate::storage::platform_store())
    }
}

fn platform_transport() -> Rc<dyn Transport> {
    #[cfg(target_arch = "wasm32")]
    {
        Rc::new(crate::live::WebSocketTransport)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Rc::new(crate::live::TungsteniteTransport)
    }
}

/// Reactive mirror of the services, shared via context.
#[derive(Clone, Copy)]
pub struct DashboardContext {
    pub session: Signal<Session>,
    /// `None` until a real credential exists
    pub client: Signal<Option<Rc<ApiClient>>>,
    /// Bumped whenever the query cache is invalidated or written
    pub cache_epoch: Signal<u64>,
}

impl DashboardContext {
    pub fn resources(&self, services: &Services) -> Resources {
        Resources::new(services.cache.clone(), (self.client)())
    }
}

const GC_INTERVAL: Duration = Duration::from_secs(60);

/// Initialize the dashboard context - call once at app root
pub fn use_dashboard_provider(services: Services) -> DashboardContext {
    let session = use_signal(|| services.session.session());
    let client = use_signal(|| None::<Rc<ApiClient>>);
    let cache_epoch = use_signal(|| 0u64);

    let ctx = DashboardContext {
        session,
        client,
        cache_epoch,
    };
    use_context_provider(|| services.clone());
    use_context_provider(|| ctx);

    // Bridge session and cache notifications into signals, then settle the session
    let bridge = services.clone();
    use_hook(move || {
        bridge.session.subscribe(move |snapshot| {
            let mut session = session;
            session.set(snapshot.clone());
        });
        bridge.cache.subscribe(move || {
            let mut epoch = cache_epoch;
            epoch += 1;
        });

        let manager = bridge.session.clone();
        spawn(async move {
            manager.resolve().await;
        });

        let cache = bridge.cache.clone();
        spawn(async move {
            loop {
                crate::time::sleep(GC_INTERVAL).await;
                cache.collect_garbage();
            }
        });
    });

    // Rebuild the API client whenever the session changes
    let factory = services.clone();
    use_effect(move || {
        let _ = session.read();
        let services = factory.clone();
        spawn(async move {
            let next = services.clients.resolve(&services.session).await;
            let mut client = client;
            let changed = match (client.peek().as_ref(), next.as_ref()) {
                (Some(a), Some(b)) => !Rc::ptr_eq(a, b),
                (None, None) => false,
                _ => true,
            };
            if changed {
                client.set(next);
            }
        });
    });

    ctx
}

pub fn use_services() -> Services {
    use_context::<Services>()
}

pub fn use_dashboard() -> DashboardContext {
    use_context::<DashboardContext>()
}
