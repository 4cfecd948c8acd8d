#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(test)]
fn global_env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

#[cfg(test)]
pub(crate) fn lock_env() -> std::sync::MutexGuard<'static, ()> {
    global_env_lock()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
pub(crate) struct ScopedEnvVar {
    key: &'static str,
    original: Option<String>,
}

#[cfg(test)]
impl ScopedEnvVar {
    pub(crate) fn set(key: &'static str, value: &str) -> Self {
        let original = std::env::var(key).ok();
        std::env::set_var(key, value);
        Self { key, original }
    }

    pub(crate) fn unset(key: &'static str) -> Self {
        let original = std::env::var(key).ok();
        std::env::remove_var(key);
        Self { key, original }
    }
}

#[cfg(test)]
impl Drop for ScopedEnvVar {
    fn drop(&mut self) {
        if let Some(value) = self.original.as_deref() {
            std::env::set_var(self.key, value);
        } else {
            std::env::remove_var(self.key);
        }
    }
}

#[cfg(test)]
pub(crate) fn temp_data_dir(label: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!(
        ".meshpulse-test-{}-{}",
        label,
        uuid::Uuid::new_v4()
    ));
    std::fs::create_dir_all(&dir).expect("create temp data dir");
    dir
}

#[cfg(test)]
pub(crate) use mock_api::{MockRewardsApi, ReportReply};

/// In-process stand-in for the rewards API. Requests sent through an HTTP
/// proxy pointing at it arrive in absolute form and are routed by path, so
/// the same server also plays the egress proxy for proxied identities.
#[cfg(test)]
mod mock_api {
    use axum::{
        extract::{Query, State},
        http::{header, HeaderMap, StatusCode},
        response::{AppendHeaders, IntoResponse, Response},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::{HashMap, VecDeque};
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) enum ReportReply {
        Status(u16),
        BadGateway,
    }

    struct Inner {
        login_ok: AtomicBool,
        dashboard_ok: AtomicBool,
        login_delay_ms: AtomicU64,
        report_delay_ms: AtomicU64,
        login_calls: AtomicUsize,
        report_calls: AtomicUsize,
        dashboard_calls: AtomicUsize,
        report_plan: Mutex<VecDeque<ReportReply>>,
        default_report: Mutex<ReportReply>,
        last_login_body: Mutex<Option<Value>>,
        last_report_query: Mutex<Option<HashMap<String, String>>>,
        last_report_cookie: Mutex<Option<String>>,
        last_dashboard_cookie: Mutex<Option<String>>,
    }

    #[derive(Clone)]
    pub(crate) struct MockState {
        inner: Arc<Inner>,
    }

    fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
        m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    impl MockState {
        fn new() -> Self {
            Self {
                inner: Arc::new(Inner {
                    login_ok: AtomicBool::new(true),
                    dashboard_ok: AtomicBool::new(true),
                    login_delay_ms: AtomicU64::new(0),
                    report_delay_ms: AtomicU64::new(0),
                    login_calls: AtomicUsize::new(0),
                    report_calls: AtomicUsize::new(0),
                    dashboard_calls: AtomicUsize::new(0),
                    report_plan: Mutex::new(VecDeque::new()),
                    default_report: Mutex::new(ReportReply::Status(200)),
                    last_login_body: Mutex::new(None),
                    last_report_query: Mutex::new(None),
                    last_report_cookie: Mutex::new(None),
                    last_dashboard_cookie: Mutex::new(None),
                }),
            }
        }

        pub(crate) fn set_login_ok(&self, ok: bool) {
            self.inner.login_ok.store(ok, Ordering::SeqCst);
        }

        pub(crate) fn set_login_delay(&self, delay: Duration) {
            self.inner
                .login_delay_ms
                .store(delay.as_millis() as u64, Ordering::SeqCst);
        }

        pub(crate) fn set_report_delay(&self, delay: Duration) {
            self.inner
                .report_delay_ms
                .store(delay.as_millis() as u64, Ordering::SeqCst);
        }

        pub(crate) fn set_dashboard_ok(&self, ok: bool) {
            self.inner.dashboard_ok.store(ok, Ordering::SeqCst);
        }

        pub(crate) fn set_default_report(&self, reply: ReportReply) {
            *lock(&self.inner.default_report) = reply;
        }

        /// Queues replies served before falling back to the default.
        pub(crate) fn push_reports(&self, replies: impl IntoIterator<Item = ReportReply>) {
            lock(&self.inner.report_plan).extend(replies);
        }

        pub(crate) fn login_calls(&self) -> usize {
            self.inner.login_calls.load(Ordering::SeqCst)
        }

        pub(crate) fn report_calls(&self) -> usize {
            self.inner.report_calls.load(Ordering::SeqCst)
        }

        pub(crate) fn dashboard_calls(&self) -> usize {
            self.inner.dashboard_calls.load(Ordering::SeqCst)
        }

        pub(crate) fn last_login_body(&self) -> Option<Value> {
            lock(&self.inner.last_login_body).clone()
        }

        pub(crate) fn last_report_query(&self) -> Option<HashMap<String, String>> {
            lock(&self.inner.last_report_query).clone()
        }

        pub(crate) fn last_report_cookie(&self) -> Option<String> {
            lock(&self.inner.last_report_cookie).clone()
        }

        pub(crate) fn last_dashboard_cookie(&self) -> Option<String> {
            lock(&self.inner.last_dashboard_cookie).clone()
        }

        fn next_report(&self) -> ReportReply {
            lock(&self.inner.report_plan)
                .pop_front()
                .unwrap_or_else(|| *lock(&self.inner.default_report))
        }
    }

    fn cookie_header(headers: &HeaderMap) -> Option<String> {
        headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    async fn get_token(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
        let n = state.inner.login_calls.fetch_add(1, Ordering::SeqCst) + 1;
        *lock(&state.inner.last_login_body) = Some(body.clone());

        let delay = state.inner.login_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let password_ok = body["password"] == MockRewardsApi::PASSWORD;
        if state.inner.login_ok.load(Ordering::SeqCst) && password_ok {
            (
                AppendHeaders([
                    (header::SET_COOKIE, "session=abc; Path=/; HttpOnly"),
                    (header::SET_COOKIE, "theme=dark; Path=/"),
                ]),
                Json(json!({ "api_token": format!("token-{}", n) })),
            )
                .into_response()
        } else {
            Json(json!({ "error": "invalid credentials" })).into_response()
        }
    }

    async fn report_uptime(
        State(state): State<MockState>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> Response {
        state.inner.report_calls.fetch_add(1, Ordering::SeqCst);
        *lock(&state.inner.last_report_query) = Some(query);
        *lock(&state.inner.last_report_cookie) = cookie_header(&headers);

        let delay = state.inner.report_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        match state.next_report() {
            ReportReply::Status(code) => Json(json!({ "status_code": code })).into_response(),
            ReportReply::BadGateway => (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response(),
        }
    }

    async fn dashboard(State(state): State<MockState>, headers: HeaderMap) -> Response {
        state.inner.dashboard_calls.fetch_add(1, Ordering::SeqCst);
        *lock(&state.inner.last_dashboard_cookie) = cookie_header(&headers);

        if !state.inner.dashboard_ok.load(Ordering::SeqCst) {
            return (StatusCode::UNAUTHORIZED, "session expired").into_response();
        }
        Json(json!({
            "uptime": 99.5,
            "points": 1234.5678,
            "latency": 42.0,
            "download": 95.25,
            "upload": 20.5,
            "daily_stats": [{ "day": "2024-11-20", "uptime": 100.0, "points": 12.5 }],
            "connected": true,
            "verified_email": true
        }))
        .into_response()
    }

    pub(crate) struct MockRewardsApi {
        pub(crate) base_url: String,
        pub(crate) addr: SocketAddr,
        pub(crate) state: MockState,
        server: JoinHandle<()>,
    }

    impl MockRewardsApi {
        pub(crate) const PASSWORD: &'static str = "correct-horse";

        pub(crate) async fn spawn() -> Self {
            let state = MockState::new();
            let app = Router::new()
                .route("/api/get_token", post(get_token))
                .route("/api/report_uptime", post(report_uptime))
                .route("/dashboard", post(dashboard))
                .with_state(state.clone());
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind mock rewards api");
            let addr = listener.local_addr().expect("mock rewards api addr");
            let server = tokio::spawn(async move {
                axum::serve(listener, app)
                    .await
                    .expect("serve mock rewards api");
            });

            Self {
                base_url: format!("http://{}", addr),
                addr,
                state,
                server,
            }
        }
    }

    impl Drop for MockRewardsApi {
        fn drop(&mut self) {
            self.server.abort();
        }
    }
}

/// Polls `condition` until it holds or `timeout` elapses.
#[cfg(test)]
pub(crate) async fn wait_until<F>(timeout: std::time::Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}
