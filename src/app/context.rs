use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};

use crate::api::{ApiClient, Feedly, HttpApiClient, Outcome};
use crate::app::error::{NotifierError, Result};
use crate::cache::FeedCache;
use crate::config::{Options, OptionsStore, TomlOptionsStore};
use crate::counter::{Badge, CounterEngine};
use crate::notifications::NotificationDispatcher;
use crate::presenter::{LogPresenter, Presenter, Status};
use crate::scheduler::{SchedulePlan, Scheduler, Tick};
use crate::store::{SqliteStore, Store};

/// Application state shared by the daemon and the one-shot commands.
pub struct AppContext {
    pub(crate) options: RwLock<Options>,
    pub(crate) options_store: Arc<dyn OptionsStore>,
    pub(crate) feedly: Feedly,
    pub(crate) presenter: Arc<dyn Presenter>,
    pub(crate) cache: FeedCache,
    pub(crate) counter: CounterEngine,
    scheduler: Mutex<Scheduler>,
    logged_in: AtomicBool,
}

impl AppContext {
    /// Wire the collaborators together and load the current options.
    pub fn new(
        options_store: Arc<dyn OptionsStore>,
        api: Arc<dyn ApiClient>,
        store: Arc<dyn Store>,
        presenter: Arc<dyn Presenter>,
        ticks: mpsc::UnboundedSender<Tick>,
    ) -> Result<Self> {
        let options = options_store.read()?;
        let feedly = Feedly::new(api);
        let dispatcher = NotificationDispatcher::new(presenter.clone());

        Ok(Self {
            options: RwLock::new(options),
            options_store,
            cache: FeedCache::new(feedly.clone(), store, dispatcher),
            counter: CounterEngine::new(feedly.clone(), presenter.clone()),
            feedly,
            presenter,
            scheduler: Mutex::new(Scheduler::new(ticks)),
            logged_in: AtomicBool::new(false),
        })
    }

    /// Context backed by the config file, the state database and the
    /// Feedly API, with default paths where none are given.
    pub fn from_paths(
        config_path: Option<PathBuf>,
        state_path: Option<PathBuf>,
        ticks: mpsc::UnboundedSender<Tick>,
    ) -> Result<Self> {
        let options_store = match config_path {
            Some(path) => TomlOptionsStore::new(path),
            None => TomlOptionsStore::at_default_path()?,
        };
        let state_path = match state_path {
            Some(path) => path,
            None => Self::default_state_path()?,
        };

        Self::new(
            Arc::new(options_store),
            Arc::new(HttpApiClient::new()?),
            Arc::new(SqliteStore::new(&state_path)?),
            Arc::new(LogPresenter::new()),
            ticks,
        )
    }

    fn default_state_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| NotifierError::Other("Could not find data directory".into()))?;
        Ok(data_dir.join("feedly-notifier").join("state.db"))
    }

    /// Snapshot of the options in effect.
    pub async fn options(&self) -> Options {
        self.options.read().await.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    pub fn badge(&self) -> &Badge {
        self.counter.badge()
    }

    fn scheduler(&self) -> MutexGuard<'_, Scheduler> {
        self.scheduler.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Hand the session options to the API client.
    pub async fn configure_client(&self) {
        let options = self.options.read().await;
        self.feedly
            .configure(&options.access_token, options.use_secure_connection);
    }

    /// Configure the client and (re)start the scheduler.
    pub async fn initialize(&self) {
        self.configure_client().await;
        let plan = SchedulePlan::from_options(&*self.options.read().await);
        self.scheduler().start(plan);
    }

    pub fn stop_scheduler(&self) {
        self.scheduler().stop();
    }

    /// Adopt new options, restarting the scheduler when a critical one changed.
    ///
    /// Returns whether the scheduler was restarted.
    pub async fn apply_options(&self, options: Options) -> Result<bool> {
        options.validate()?;

        let changed = {
            let mut current = self.options.write().await;
            let changed = current.changed_critical_options(&options);
            *current = options;
            changed
        };

        if changed.is_empty() {
            return Ok(false);
        }

        info!(?changed, "Critical options changed, reinitializing");
        self.initialize().await;
        Ok(true)
    }

    /// Re-read the options store.
    pub async fn reload_options(&self) -> Result<bool> {
        let options = self.options_store.read()?;
        self.apply_options(options).await
    }

    pub(crate) fn set_active_status(&self) {
        if !self.logged_in.swap(true, Ordering::SeqCst) {
            self.presenter.set_status(Status::Active);
        }
    }

    /// Logged out: blank badge, empty caches, no polling.
    pub(crate) async fn set_inactive_status(&self) {
        self.presenter.set_status(Status::Inactive);
        self.counter.badge().clear();
        self.cache.clear().await;
        self.logged_in.store(false, Ordering::SeqCst);
        self.options.write().await.feedly_user_id.clear();
        self.stop_scheduler();
    }

    pub(crate) async fn handle_auth_required(&self) {
        self.set_inactive_status().await;
        if let Err(e) = self.refresh_access_token().await {
            warn!(error = %e, "Failed to refresh access token");
        }
    }

    /// Trade the refresh token for a new access token and persist it.
    ///
    /// Returns whether a new token was stored.
    pub async fn refresh_access_token(&self) -> Result<bool> {
        let options = self.options().await;
        if options.refresh_token.is_empty() {
            return Ok(false);
        }

        let token = match self
            .feedly
            .refresh_token(
                &options.refresh_token,
                &options.client_id,
                &options.client_secret,
            )
            .await?
        {
            Outcome::Success(token) => token,
            Outcome::AuthRequired => {
                warn!("Refresh token was rejected, login required");
                return Ok(false);
            }
        };

        let mut stored = self.options_store.read()?;
        stored.access_token = token.access_token;
        if let Some(refresh_token) = token.refresh_token {
            stored.refresh_token = refresh_token;
        }
        if let Some(plan) = token.plan {
            stored.feedly_user_plan = plan;
        }
        self.options_store.write(&stored)?;

        info!("Access token refreshed");
        self.apply_options(stored).await?;
        Ok(true)
    }
}
