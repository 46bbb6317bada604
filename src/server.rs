//! Delivery server
//!
//! A single-purpose HTTP responder that streams the most recently rendered
//! image back to the display client, counts successful serves, and is torn
//! down by the orchestrator once the configured serve count or wall-clock
//! budget is reached. Serve state is an explicitly owned, thread-safe
//! counter shared between the request handlers and the wait loop.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tower_http::trace::TraceLayer;

use crate::config::ServePolicy;

/// Interval of the orchestrator's shutdown poll loop
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Fixed delay between the wait loop ending and the socket closing, so an
/// in-flight transfer can complete
pub const GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Shared serve-state counter gating server shutdown
#[derive(Debug)]
pub struct ServeState {
    served: AtomicU32,
    policy: ServePolicy,
    client_user_agent: String,
}

impl ServeState {
    #[must_use]
    pub fn new(policy: ServePolicy, client_user_agent: String) -> Arc<Self> {
        Arc::new(Self {
            served: AtomicU32::new(0),
            policy,
            client_user_agent,
        })
    }

    /// Record a successful image response. Returns true when the request
    /// counted as a serve under the configured policy.
    pub fn record(&self, user_agent: Option<&str>) -> bool {
        let counts = match self.policy {
            ServePolicy::Any => true,
            ServePolicy::UserAgent => {
                user_agent.is_some_and(|ua| ua.contains(&self.client_user_agent))
            }
        };
        if counts {
            self.served.fetch_add(1, Ordering::Relaxed);
        }
        counts
    }

    /// Number of requests counted as served so far
    #[must_use]
    pub fn served_count(&self) -> u32 {
        self.served.load(Ordering::Relaxed)
    }
}

/// Image flavor exposed on the HTTP surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageKind {
    Png,
    Bmp,
}

impl ImageKind {
    fn content_type(self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Bmp => "image/bmp",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Bmp => "bmp",
        }
    }
}

#[derive(Clone)]
struct AppState {
    serve: Arc<ServeState>,
    page_name: String,
    output_dir: PathBuf,
}

/// Build the single-route router serving the rendered image.
///
/// `GET /<name>.png` and `GET /<name>.bmp` stream the corresponding file as
/// an attachment download; a missing backing file yields 404, never a crash.
pub fn router(serve: Arc<ServeState>, page_name: &str, output_dir: PathBuf) -> Router {
    let state = AppState {
        serve,
        page_name: page_name.to_string(),
        output_dir,
    };

    Router::new()
        .route(
            &format!("/{page_name}.png"),
            get(|State(state): State<AppState>, headers: HeaderMap| async move {
                serve_image(&state, &headers, ImageKind::Png).await
            }),
        )
        .route(
            &format!("/{page_name}.bmp"),
            get(|State(state): State<AppState>, headers: HeaderMap| async move {
                serve_image(&state, &headers, ImageKind::Bmp).await
            }),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn serve_image(state: &AppState, headers: &HeaderMap, kind: ImageKind) -> Response {
    let filename = format!("{}.{}", state.page_name, kind.extension());
    let path = state.output_dir.join(&filename);

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %path.display(), "Image not available: {e}");
            return (StatusCode::NOT_FOUND, "image not rendered").into_response();
        }
    };

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok());
    let counted = state.serve.record(user_agent);
    tracing::info!(
        %filename,
        bytes = bytes.len(),
        counted,
        user_agent = user_agent.unwrap_or("-"),
        "Image request"
    );

    (
        [
            (header::CONTENT_TYPE, kind.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// A running delivery server with its graceful-shutdown handle
pub struct DeliveryServer {
    handle: JoinHandle<()>,
    shutdown_tx: oneshot::Sender<()>,
    local_addr: SocketAddr,
}

impl DeliveryServer {
    /// Bind the listener and start serving in a background task
    pub async fn start(port: u16, app: Router) -> Result<Self> {
        let addr = format!("0.0.0.0:{port}");
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind delivery server on {addr}"))?;
        let local_addr = listener
            .local_addr()
            .context("Failed to read listener address")?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            tracing::info!(%local_addr, "Delivery server listening");
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!("Delivery server error: {e}");
            }
        });

        Ok(Self {
            handle,
            shutdown_tx,
            local_addr,
        })
    }

    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Close the listening socket and wait for the serve task to finish
    pub async fn shutdown(self) {
        tracing::info!("Stopping delivery server");
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.handle.await {
            tracing::error!("Delivery server task panicked: {e}");
        }
    }
}

/// Poll the serve state once per second until the serve-count cap is
/// reached or the wall-clock budget elapses.
///
/// Returns true when at least one request was counted as served — the
/// process exit code hinges on exactly that.
pub async fn await_delivery(state: &ServeState, alive: Duration, max_serves: u32) -> bool {
    let deadline = Instant::now() + alive;
    loop {
        if state.served_count() >= max_serves {
            tracing::info!(serves = state.served_count(), "Serve count reached");
            return true;
        }
        if Instant::now() >= deadline {
            let served = state.served_count();
            if served == 0 {
                tracing::error!("Delivery window expired with no successful serve");
            } else {
                tracing::info!(serves = served, "Delivery window expired");
            }
            return served > 0;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_any_policy_counts_everything() {
        let state = ServeState::new(ServePolicy::Any, "esp32".to_string());
        assert!(state.record(None));
        assert!(state.record(Some("curl/8.0")));
        assert_eq!(state.served_count(), 2);
    }

    #[test]
    fn test_record_user_agent_policy_filters() {
        let state = ServeState::new(ServePolicy::UserAgent, "esp32".to_string());
        assert!(!state.record(None));
        assert!(!state.record(Some("curl/8.0")));
        assert_eq!(state.served_count(), 0);

        assert!(state.record(Some("esp32-homepage/1.2")));
        assert_eq!(state.served_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_delivery_satisfied_by_serve() {
        let state = ServeState::new(ServePolicy::Any, String::new());
        state.record(None);
        // already served: returns immediately even with a zero budget
        assert!(await_delivery(&state, Duration::from_secs(0), 1).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_delivery_times_out_without_serve() {
        let state = ServeState::new(ServePolicy::Any, String::new());
        assert!(!await_delivery(&state, Duration::from_secs(5), 1).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_delivery_partial_serves_still_succeed() {
        let state = ServeState::new(ServePolicy::Any, String::new());
        state.record(None);
        // cap of 3 never reached, but the window did not end empty
        assert!(await_delivery(&state, Duration::from_secs(3), 3).await);
    }
}
