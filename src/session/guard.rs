use tracing::debug;

use super::provider::{AuthState, SessionProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Orders,
    Login,
}

/// Gate in front of the order pages: only answers once the session has resolved,
/// so a signed-in user is never bounced to the login page during startup.
#[derive(Clone)]
pub struct RouteGuard {
    session: SessionProvider,
}

impl RouteGuard {
    pub fn new(session: SessionProvider) -> Self {
        Self { session }
    }

    pub async fn resolve(&self) -> Route {
        let mut changes = self.session.changes();
        let route = match changes.wait_for(AuthState::is_resolved).await {
            Ok(state) if state.user().is_some() => Route::Orders,
            _ => Route::Login,
        };
        debug!(?route, "Route resolved");
        route
    }
}
