use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::clients::{HttpOrderApi, OrderApi};
use crate::config::Config;
use crate::error::{AuthError, ClientError};
use crate::session::{
    AuthService, IdentityToolkit, Route, RouteGuard, SessionProvider, SessionStore,
};
use crate::view::{OrderListClient, OrderListService};

const VIEW_BUFFER: usize = 32;

/// The application: one session, one order API and the views mounted over them.
///
/// Responsible for wiring the components from configuration, gating the order
/// pages behind the session, and handling shutdown.
pub struct OrderDesk {
    pub session: SessionProvider,
    pub auth: AuthService,
    pub guard: RouteGuard,
    api: Arc<dyn OrderApi>,
    auth_required: bool,
    handles: Vec<JoinHandle<()>>,
}

impl OrderDesk {
    pub fn new(
        session: SessionProvider,
        auth: AuthService,
        api: Arc<dyn OrderApi>,
        auth_required: bool,
    ) -> Self {
        Self {
            guard: RouteGuard::new(session.clone()),
            session,
            auth,
            api,
            auth_required,
            handles: Vec::new(),
        }
    }

    /// Builds every component from `config` and restores the stored session.
    pub async fn start(config: &Config) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_seconds))
            .build()?;

        let identity = IdentityToolkit::new(http.clone(), config.auth.api_key.clone())
            .with_endpoints(config.auth.identity_url.clone(), config.auth.token_url.clone());
        let store = SessionStore::new(config.session.file.clone());
        let session = SessionProvider::new(Arc::new(identity), Some(store));
        session.restore().await;

        // unauthenticated deployments send no bearer token
        let api_session = config.auth.required.then(|| session.clone());
        let api = Arc::new(HttpOrderApi::new(config.api.clone(), api_session)?);
        let auth = AuthService::new(
            http,
            config.auth.login_url.clone(),
            config.auth.register_url.clone(),
            session.clone(),
        );

        info!(auth_required = config.auth.required, "Order desk started");
        Ok(Self::new(session, auth, api, config.auth.required))
    }

    /// Mounts the order list if the route guard lets the user through.
    pub async fn open_orders(&mut self) -> Result<OrderListClient, AuthError> {
        if self.auth_required && self.guard.resolve().await == Route::Login {
            return Err(AuthError::NotSignedIn);
        }
        Ok(self.mount_order_list())
    }

    pub fn mount_order_list(&mut self) -> OrderListClient {
        let (service, client) = OrderListService::new(VIEW_BUFFER, Arc::clone(&self.api));
        self.handles.push(tokio::spawn(service.run()));
        client
    }

    /// Waits for every mounted view to stop. Views stop once all of their clients
    /// have been dropped.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down order desk...");
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("View task failed: {:?}", e);
                return Err(format!("View task failed: {:?}", e));
            }
        }
        info!("Order desk shutdown complete.");
        Ok(())
    }
}
