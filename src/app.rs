//! Application wiring.
//!
//! DESIGN
//! ======
//! [`Console`] owns one instance of each service and shares them by `Arc`.
//! Building it is the only place the object graph is assembled; dropping
//! it tears everything down. Nothing in the crate relies on globals.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::net::api::AdminApi;
use crate::net::http::{ApiClient, HttpError};
use crate::notify::Notifier;
use crate::router::Router;
use crate::router::guard::NavigationGuard;
use crate::router::history::History;
use crate::router::route::RouteTable;
use crate::state::auth::AuthState;
use crate::state::permission::PermissionStore;
use crate::state::session::SessionStore;
use crate::storage::SessionRepository;

pub struct Console {
    pub auth: Arc<AuthState>,
    pub history: Arc<History>,
    pub client: ApiClient,
    pub session: SessionStore,
    pub permissions: PermissionStore,
    pub router: Router,
    pub api: AdminApi,
}

impl Console {
    /// Wire the console with the default admin route table.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: &ClientConfig,
        repo: Arc<dyn SessionRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, HttpError> {
        Self::with_routes(config, repo, notifier, RouteTable::admin_default())
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_routes(
        config: &ClientConfig,
        repo: Arc<dyn SessionRepository>,
        notifier: Arc<dyn Notifier>,
        routes: RouteTable,
    ) -> Result<Self, HttpError> {
        let auth = Arc::new(AuthState::new(repo));
        let history = Arc::new(History::new());
        let client = ApiClient::new(config, auth.clone(), history.clone(), notifier.clone())?;

        let session = SessionStore::new(client.clone(), auth.clone(), notifier.clone());
        let permissions = PermissionStore::new(client.clone(), auth.clone());
        let guard = NavigationGuard::new(auth.clone(), session.clone(), permissions.clone(), notifier);
        let router = Router::new(routes, guard, history.clone());
        let api = AdminApi::new(client.clone());

        tracing::debug!(base_url = %config.base_url, logged_in = session.is_logged_in(), "console ready");
        Ok(Self { auth, history, client, session, permissions, router, api })
    }
}
