//! The owning context of a directory session.
//!
//! [`Session`] holds every piece of mutable state. Page loads, avatar fetches and position
//! refreshes run as tasks on its [`StateRuntime`] and report back as [`SessionUpdate`]s,
//! which only [`Session::sync`] applies. Submission is awaited directly because it needs
//! the token manager mutably.
//!
//! ```ignore
//! let mut session = Session::new(BusinessConfig::from_env()?)?;
//! session.load_initial_users();
//! session.refresh_positions();
//! session.settle().await;
//! for user in session.users() { /* ... */ }
//! ```

use std::sync::Arc;

use log::{debug, error, info};
use roster_states::StateRuntime;

use crate::BusinessConfig;
use crate::api::{ApiClient, Position};
use crate::connectivity::{ConnectivityMonitor, ReachabilityProbe, ReachabilitySender};
use crate::http::{HttpError, HttpGateway, ReqwestGateway};
use crate::image_cache::ImageCache;
use crate::imaging::Avatar;
use crate::positions::{PositionCatalog, PositionsLoad, PositionsResult};
use crate::registration::{
    RegistrationDraft, RegistrationForm, RegistrationSubmitter, SubmitOutcome, SubmitStatus,
    ValidationErrors,
};
use crate::token::TokenManager;
use crate::users::{AvatarRequest, PageCursor, PageLoad, PageResult, UserPager, UserRecord};

/// Messages from background tasks to the session.
#[derive(Debug)]
pub enum SessionUpdate {
    UsersPage(PageResult),
    Avatar {
        epoch: u64,
        index: usize,
        avatar: Avatar,
    },
    Positions(PositionsResult),
}

#[derive(Debug)]
pub struct Session {
    config: BusinessConfig,
    api: ApiClient,
    tokens: TokenManager,
    images: Arc<ImageCache>,
    users: UserPager,
    positions: PositionCatalog,
    submitter: RegistrationSubmitter,
    connectivity: ConnectivityMonitor,
    submit_status: SubmitStatus,
    runtime: StateRuntime<SessionUpdate>,
}

impl Session {
    /// Session over reqwest. Transport failures feed the connectivity monitor.
    pub fn new(config: BusinessConfig) -> Result<Self, HttpError> {
        let connectivity = ConnectivityMonitor::new();
        let gateway = ReachabilityProbe::new(
            ReqwestGateway::new(config.request_timeout)?,
            connectivity.sender(),
        );
        Ok(Self::with_parts(config, Arc::new(gateway), connectivity))
    }

    /// Session over a caller-supplied transport. Connectivity changes only through
    /// [`Session::reachability_sender`].
    pub fn with_gateway(config: BusinessConfig, gateway: Arc<dyn HttpGateway>) -> Self {
        Self::with_parts(config, gateway, ConnectivityMonitor::new())
    }

    fn with_parts(
        config: BusinessConfig,
        gateway: Arc<dyn HttpGateway>,
        connectivity: ConnectivityMonitor,
    ) -> Self {
        let api = ApiClient::new(gateway, &config);
        info!(
            "Session: api={} page_size={} token_ttl={:?}",
            config.api_base_url, config.page_size, config.token_ttl
        );
        Self {
            tokens: TokenManager::new(api.clone(), config.token_ttl),
            images: Arc::new(ImageCache::new(api.clone(), config.image_cache_capacity)),
            users: UserPager::new(api.users_page_url(1)),
            positions: PositionCatalog::default(),
            submitter: RegistrationSubmitter::new(api.clone()),
            connectivity,
            submit_status: SubmitStatus::Idle,
            runtime: StateRuntime::new(),
            api,
            config,
        }
    }

    /// Clear the list and fetch page 1. Returns immediately.
    pub fn load_initial_users(&mut self) {
        let load = self.users.load_initial();
        self.spawn_page(load);
    }

    /// Fetch the next page if `index` is the last record. Returns immediately.
    pub fn load_more_users_if_at_end(&mut self, index: usize) {
        if let Some(load) = self.users.load_more_if_at_end(index) {
            self.spawn_page(load);
        }
    }

    /// Reload the position catalog unless a refresh is already running.
    pub fn refresh_positions(&mut self) {
        if let Some(load) = self.positions.refresh() {
            self.spawn_positions(load);
        }
    }

    /// Validate `draft` against the current catalog, then submit it.
    ///
    /// Validation failures are returned without touching the network.
    pub async fn submit(
        &mut self,
        draft: &RegistrationDraft,
    ) -> Result<SubmitOutcome, ValidationErrors> {
        let form = draft.validate(&self.positions)?;
        Ok(self.submit_form(&form).await)
    }

    /// Submit an already validated form. A success reloads the user list in the background.
    pub async fn submit_form(&mut self, form: &RegistrationForm) -> SubmitOutcome {
        self.submit_status = SubmitStatus::Submitting;
        let outcome = self.submitter.submit(&mut self.tokens, form).await;
        if outcome.is_success() {
            self.load_initial_users();
        }
        self.submit_status = SubmitStatus::Done(outcome.clone());
        outcome
    }

    /// Apply every queued update. Returns true if anything changed.
    ///
    /// Finished tasks are joined here as well, so an owner that only ever calls `sync`
    /// does not accumulate them.
    pub fn sync(&mut self) -> bool {
        for err in self.runtime.reap() {
            error!("Session: {err}");
        }
        let mut changed = self.connectivity.sync();
        for update in self.runtime.drain() {
            changed = true;
            match update {
                SessionUpdate::UsersPage(result) => {
                    let requests = self.users.apply_page(result);
                    for request in requests {
                        self.resolve_avatar(request);
                    }
                }
                SessionUpdate::Avatar {
                    epoch,
                    index,
                    avatar,
                } => {
                    self.users.set_avatar(epoch, index, avatar);
                }
                SessionUpdate::Positions(result) => self.positions.apply(result),
            }
        }
        changed
    }

    /// Wait for every in-flight task, syncing after each one.
    pub async fn settle(&mut self) {
        self.sync();
        while let Some(joined) = self.runtime.join_next().await {
            if let Err(err) = joined {
                error!("Session: {err}");
            }
            self.sync();
        }
    }

    /// Abort all background work.
    pub async fn shutdown(&mut self) {
        self.users.cancel();
        self.positions.cancel();
        self.runtime.shutdown().await;
        debug!("Session: shut down");
    }

    fn spawn_page(&mut self, load: PageLoad) {
        let api = self.api.clone();
        let updater = self.runtime.updater();
        self.runtime.spawn(async move {
            if let Some(result) = load.run(&api).await {
                updater.set(SessionUpdate::UsersPage(result));
            }
        });
    }

    fn spawn_positions(&mut self, load: PositionsLoad) {
        let api = self.api.clone();
        let updater = self.runtime.updater();
        self.runtime.spawn(async move {
            if let Some(result) = load.run(&api).await {
                updater.set(SessionUpdate::Positions(result));
            }
        });
    }

    fn resolve_avatar(&mut self, request: AvatarRequest) {
        let AvatarRequest { epoch, index, url } = request;
        if let Some(avatar) = self.images.cached(&url) {
            self.users.set_avatar(epoch, index, avatar);
            return;
        }
        let images = Arc::clone(&self.images);
        let updater = self.runtime.updater();
        self.runtime.spawn(async move {
            if let Some(avatar) = images.fetch(&url).await {
                updater.set(SessionUpdate::Avatar {
                    epoch,
                    index,
                    avatar,
                });
            }
        });
    }

    pub fn config(&self) -> &BusinessConfig {
        &self.config
    }

    /// Users loaded so far, in server order.
    pub fn users(&self) -> &[UserRecord] {
        self.users.records()
    }

    pub fn users_cursor(&self) -> &PageCursor {
        self.users.cursor()
    }

    pub fn is_loading_users(&self) -> bool {
        self.users.is_loading()
    }

    pub fn users_has_more(&self) -> bool {
        self.users.has_more()
    }

    pub fn users_error(&self) -> Option<&str> {
        self.users.error()
    }

    pub fn positions(&self) -> &[Position] {
        self.positions.positions()
    }

    pub fn positions_error(&self) -> Option<&str> {
        self.positions.error()
    }

    /// Where the last submit got to. See [`SubmitStatus`].
    pub fn submit_status(&self) -> &SubmitStatus {
        &self.submit_status
    }

    /// Whether the backend looked reachable at the last `sync`.
    pub fn is_connected(&self) -> bool {
        self.connectivity.is_connected()
    }

    /// Feed reachability events from outside (e.g. an OS network monitor).
    pub fn reachability_sender(&self) -> ReachabilitySender {
        self.connectivity.sender()
    }

    pub fn image_cache(&self) -> &Arc<ImageCache> {
        &self.images
    }

    /// Number of background tasks not yet joined.
    pub fn pending_tasks(&self) -> usize {
        self.runtime.task_count()
    }
}
