#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::sync::mpsc;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use feedly_notifier::api::HttpApiClient;
use feedly_notifier::app::{AppContext, Result};
use feedly_notifier::config::{MemoryOptionsStore, Options};
use feedly_notifier::presenter::{Notification, NotificationHandle, Presenter, Status};
use feedly_notifier::scheduler::Tick;
use feedly_notifier::store::SqliteStore;

/// Crawl time used as the base of test entries (2024-01-01T00:00:00Z).
pub const T0: i64 = 1_704_067_200_000;

pub fn minutes(n: i64) -> i64 {
    T0 + n * 60_000
}

/// Presenter keeping everything it was asked to do.
#[derive(Default)]
pub struct RecordingPresenter {
    next_handle: AtomicU64,
    pub shown: Mutex<Vec<Notification>>,
    pub dismissed: Mutex<Vec<NotificationHandle>>,
    pub badges: Mutex<Vec<String>>,
    pub statuses: Mutex<Vec<Status>>,
    pub opened: Mutex<Vec<String>>,
}

impl RecordingPresenter {
    pub fn shown(&self) -> Vec<Notification> {
        self.shown.lock().unwrap().clone()
    }

    pub fn last_badge(&self) -> Option<String> {
        self.badges.lock().unwrap().last().cloned()
    }

    pub fn statuses(&self) -> Vec<Status> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn dismissed(&self) -> Vec<NotificationHandle> {
        self.dismissed.lock().unwrap().clone()
    }
}

impl Presenter for RecordingPresenter {
    fn show(&self, notification: &Notification) -> Result<NotificationHandle> {
        let handle = NotificationHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.shown.lock().unwrap().push(notification.clone());
        Ok(handle)
    }

    fn dismiss(&self, handle: NotificationHandle) {
        self.dismissed.lock().unwrap().push(handle);
    }

    fn set_badge_text(&self, text: &str) {
        self.badges.lock().unwrap().push(text.to_string());
    }

    fn set_status(&self, status: Status) {
        self.statuses.lock().unwrap().push(status);
    }

    fn open_url(&self, url: &str) -> Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

pub fn test_options() -> Options {
    Options {
        access_token: "token".into(),
        feedly_user_id: "u1".into(),
        hide_notification_delay: 0,
        ..Options::default()
    }
}

pub struct Harness {
    pub server: MockServer,
    pub ctx: Arc<AppContext>,
    pub presenter: Arc<RecordingPresenter>,
    pub options_store: Arc<MemoryOptionsStore>,
    pub store: Arc<SqliteStore>,
    pub ticks: mpsc::UnboundedReceiver<Tick>,
}

impl Harness {
    pub async fn start(options: Options) -> Self {
        let server = MockServer::start().await;
        let api = HttpApiClient::with_base_url(&format!("{}/v3", server.uri())).unwrap();
        let presenter = Arc::new(RecordingPresenter::default());
        let options_store = Arc::new(MemoryOptionsStore::new(options));
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let (ticks_tx, ticks) = mpsc::unbounded_channel();

        let ctx = AppContext::new(
            options_store.clone(),
            Arc::new(api),
            store.clone(),
            presenter.clone(),
            ticks_tx,
        )
        .unwrap();
        ctx.configure_client().await;

        Self {
            server,
            ctx: Arc::new(ctx),
            presenter,
            options_store,
            store,
            ticks,
        }
    }

    pub fn drain_ticks(&mut self) -> Vec<Tick> {
        let mut ticks = Vec::new();
        while let Ok(tick) = self.ticks.try_recv() {
            ticks.push(tick);
        }
        ticks
    }
}

pub fn entry(id: &str, crawled: i64) -> Value {
    json!({
        "id": id,
        "title": format!("Title {}", id),
        "crawled": crawled,
        "alternate": [{ "href": format!("https://example.com/{}", id), "type": "text/html" }],
        "origin": { "title": "Blog", "htmlUrl": "https://blog.example.com/posts/1" },
        "summary": { "content": "summary", "direction": "ltr" }
    })
}

pub fn stream(items: Vec<Value>) -> Value {
    json!({ "id": "stream", "items": items })
}

/// Serve `body` for every stream whose encoded id ends with `suffix`.
pub async fn mount_stream(server: &MockServer, suffix: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path_regex(format!(r"^/v3/streams/.*{}/contents$", suffix)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_global_stream(server: &MockServer, items: Vec<Value>) {
    mount_stream(server, r"global\.all", stream(items)).await;
}

pub async fn mount_counts(server: &MockServer, counts: Value) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/v3/markers/counts$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unreadcounts": counts })))
        .mount(server)
        .await;
}

pub fn ids(items: &[feedly_notifier::domain::FeedItem]) -> Vec<&str> {
    items.iter().map(|item| item.id.as_str()).collect()
}
