//! Top-level coordinator for the console.
//!
//! `Console` owns the session, the API client, the current route and the
//! current view. It is the only place that navigates: the route guard is
//! consulted on every `navigate`, and an unauthorized result from any view
//! request sends the user back to the login view.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::{Identity, SessionStore};
use crate::models::ResourceKind;
use crate::router::{GuardDecision, Route, RouteGuard};
use crate::storage::Storage;
use crate::views::{Field, LoadedData, View, ViewEvent, ViewScope};

/// Buffer size for the view result channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// A view result tagged with the generation of the view that asked for it.
struct Delivery {
    generation: u64,
    event: ViewEvent,
}

pub struct Console {
    session: SessionStore,
    api: ApiClient,
    route: Route,
    view: View,
    scope: ViewScope,
    result_tx: mpsc::Sender<Delivery>,
    result_rx: mpsc::Receiver<Delivery>,
    login_redirects: u64,
}

impl Console {
    /// Build a console over `storage` and restore any persisted session.
    /// Starts on the login view; call `navigate` to open the first screen.
    pub fn new(base_url: &str, storage: Arc<dyn Storage>) -> Result<Self> {
        let api = ApiClient::new(base_url, Arc::clone(&storage))?;
        let mut session = SessionStore::new(storage);
        let restored = session.initialize();
        debug!(restored, base_url, "Console created");

        let (result_tx, result_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Ok(Self {
            session,
            api,
            route: Route::Login,
            view: View::Login { return_to: None },
            scope: ViewScope::new(0),
            result_tx,
            result_rx,
            login_redirects: 0,
        })
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// How many times an unauthorized response forced the login view
    pub fn login_redirects(&self) -> u64 {
        self.login_redirects
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn navigate(&mut self, path: &str) {
        self.navigate_to(Route::parse(path));
    }

    pub fn navigate_to(&mut self, route: Route) {
        match RouteGuard::evaluate(&self.session.state(), route) {
            GuardDecision::Render(route) => self.enter(route, None),
            GuardDecision::RedirectToLogin { return_to } => {
                info!(requested = %return_to, "Not signed in, redirecting to login");
                self.enter(Route::Login, Some(return_to));
            }
        }
    }

    /// Leave the current view and open `route` in a fresh scope.
    fn enter(&mut self, route: Route, return_to: Option<Route>) {
        self.scope.cancel();
        self.scope = ViewScope::new(self.scope.generation() + 1);
        self.view = View::for_route(&route, return_to);
        self.route = route;
        debug!(route = %self.route, generation = self.scope.generation(), "Entered view");
        self.start_load();
    }

    /// Hard redirect to login: drop the session and every bit of view state.
    /// The session is not reloaded from storage afterwards, so a token that
    /// could not be removed from disk is still never used again here.
    pub fn force_login(&mut self) {
        warn!(from = %self.route, "Unauthorized response, returning to login");
        self.login_redirects += 1;
        self.session.logout();
        self.enter(Route::Login, None);
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Sign in, then continue to the remembered route or the dashboard.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<Identity> {
        let user = self.session.login(&self.api, username, password).await?;
        let target = self.view.return_to().cloned().unwrap_or(Route::Dashboard);
        self.navigate_to(target);
        Ok(user)
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.navigate_to(Route::Login);
    }

    // =========================================================================
    // View requests
    // =========================================================================

    /// Run `request` as part of the current view. The task stops as soon as
    /// the view is left, and a result from an old view is never applied.
    fn spawn_request<F>(&self, action: &'static str, request: F)
    where
        F: Future<Output = Result<ViewEvent, ApiError>> + Send + 'static,
    {
        let tx = self.result_tx.clone();
        let token = self.scope.token();
        let generation = self.scope.generation();

        tokio::spawn(async move {
            let event = tokio::select! {
                _ = token.cancelled() => {
                    debug!(action, generation, "View closed, abandoning request");
                    return;
                }
                result = request => match result {
                    Ok(event) => event,
                    Err(error) => ViewEvent::Failed { action, error },
                },
            };
            if tx.send(Delivery { generation, event }).await.is_err() {
                debug!(action, "Console gone before result was delivered");
            }
        });
    }

    fn start_load(&self) {
        let api = self.api.clone();
        match self.route.clone() {
            Route::Login | Route::Dashboard => {}
            Route::List(ResourceKind::Users) => self.spawn_request("load users", async move {
                Ok::<_, ApiError>(ViewEvent::Loaded(LoadedData::Users(api.list_users().await?)))
            }),
            Route::List(ResourceKind::Groups) => self.spawn_request("load groups", async move {
                Ok::<_, ApiError>(ViewEvent::Loaded(LoadedData::Groups(api.list_groups().await?)))
            }),
            Route::List(ResourceKind::Policies) => self.spawn_request("load policies", async move {
                Ok::<_, ApiError>(ViewEvent::Loaded(LoadedData::Policies(api.list_policies().await?)))
            }),
            Route::Detail(ResourceKind::Users, id) => self.spawn_request("load user", async move {
                Ok::<_, ApiError>(ViewEvent::Loaded(LoadedData::User(api.get_user(&id).await?)))
            }),
            Route::Detail(ResourceKind::Groups, id) => self.spawn_request("load group", async move {
                Ok::<_, ApiError>(ViewEvent::Loaded(LoadedData::Group(api.get_group(&id).await?)))
            }),
            Route::Detail(ResourceKind::Policies, id) => self.spawn_request("load policy", async move {
                Ok::<_, ApiError>(ViewEvent::Loaded(LoadedData::Policy(api.get_policy(&id).await?)))
            }),
        }
    }

    /// Delete a row of the current list view. The row disappears once the
    /// server confirms; the list is not fetched again.
    pub fn delete_item(&self, id: &str) -> bool {
        let Some(kind) = self.view.list_kind() else {
            return false;
        };
        let api = self.api.clone();
        let id = id.to_string();
        self.spawn_request("delete", async move {
            api.delete(kind, &id).await?;
            Ok::<_, ApiError>(ViewEvent::Deleted { kind, id })
        });
        true
    }

    /// Edit a field of the record in the current detail view
    pub fn set_field(&mut self, field: Field, value: String) -> bool {
        self.view.set_field(field, value)
    }

    /// Send the current detail record back to the server. Any earlier
    /// success notice is cleared while the save is in flight.
    pub fn save_detail(&mut self) -> bool {
        let api = self.api.clone();
        let started = match &self.view {
            View::User(detail) => match detail.record().cloned() {
                Some(user) => {
                    let id = detail.id().to_string();
                    self.spawn_request("update user", async move {
                        api.update_user(&id, &user).await?;
                        Ok::<_, ApiError>(ViewEvent::Updated { kind: ResourceKind::Users, id })
                    });
                    true
                }
                None => false,
            },
            View::Group(detail) => match detail.record().cloned() {
                Some(group) => {
                    let id = detail.id().to_string();
                    self.spawn_request("update group", async move {
                        api.update_group(&id, &group).await?;
                        Ok::<_, ApiError>(ViewEvent::Updated { kind: ResourceKind::Groups, id })
                    });
                    true
                }
                None => false,
            },
            View::Policy(detail) => match detail.record().cloned() {
                Some(policy) => {
                    let id = detail.id().to_string();
                    self.spawn_request("update policy", async move {
                        api.update_policy(&id, &policy).await?;
                        Ok::<_, ApiError>(ViewEvent::Updated { kind: ResourceKind::Policies, id })
                    });
                    true
                }
                None => false,
            },
            _ => false,
        };
        if started {
            self.view.clear_notice();
        }
        started
    }

    // =========================================================================
    // Results
    // =========================================================================

    /// Apply every result that has arrived so far. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(delivery) = self.result_rx.try_recv() {
            if self.deliver(delivery) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next result and apply it. Returns false if it was stale.
    pub async fn wait(&mut self) -> bool {
        match self.result_rx.recv().await {
            Some(delivery) => self.deliver(delivery),
            None => false,
        }
    }

    fn deliver(&mut self, delivery: Delivery) -> bool {
        if delivery.generation != self.scope.generation() {
            debug!(
                generation = delivery.generation,
                current = self.scope.generation(),
                "Dropping result from a closed view"
            );
            return false;
        }
        self.apply(delivery.event);
        true
    }

    fn apply(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::Loaded(data) => {
                if !self.view.apply_loaded(data) {
                    warn!(route = %self.route, "Loaded data does not match the current view");
                }
            }
            ViewEvent::Deleted { kind, id } => {
                if self.view.remove_item(kind, &id) {
                    info!(kind = kind.segment(), id = %id, "Deleted");
                }
            }
            ViewEvent::Updated { kind, id } => {
                self.view.mark_updated(kind, &id);
                info!(kind = kind.segment(), id = %id, "Updated");
            }
            ViewEvent::Failed { error: ApiError::Unauthorized, action } => {
                debug!(action, "Request rejected as unauthorized");
                self.force_login();
            }
            ViewEvent::Failed { action, error } => {
                error!(action, route = %self.route, error = %error, "Request failed");
            }
        }
    }
}
