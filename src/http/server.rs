//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (trace, request ID, admission, timeout, panics, body limit)
//! - Render timeouts and panics as the usual JSON error body
//! - Run the physics loop alongside the server
//! - Apply configuration reloads to the admission policy
//! - Serve until the shutdown signal fires

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::{timeout::error::Elapsed, timeout::TimeoutLayer, BoxError, ServiceBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::SimConfig;
use crate::error::ApiError;
use crate::http::handlers::{get_status, not_found, set_pitch, set_prop, set_yaw};
use crate::http::request::MakeRequestUuidV4;
use crate::security::{admission_middleware, Dispatcher};
use crate::sim::{SharedVehicle, SimEngine};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub vehicle: SharedVehicle,
}

/// HTTP server for the simulator API.
pub struct HttpServer {
    router: Router,
    config: SimConfig,
    state: AppState,
}

impl HttpServer {
    /// Fails only if a configured denylist pattern does not compile.
    pub fn new(config: SimConfig) -> Result<Self, regex::Error> {
        let state = AppState {
            dispatcher: Arc::new(Dispatcher::new(&config)?),
            vehicle: SharedVehicle::new(),
        };

        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            config,
            state,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &SimConfig, state: AppState) -> Router {
        let dispatcher = Arc::clone(&state.dispatcher);
        let routes = Router::new()
            .route("/status", get(get_status))
            .route("/pitch", post(set_pitch))
            .route("/yaw", post(set_yaw))
            .route("/prop", post(set_prop))
            .fallback(not_found)
            .with_state(state);
        Self::layered(routes, config, dispatcher)
    }

    /// Wrap `routes` in the middleware stack. Inner to outer: body limit,
    /// panic catcher, timeout, admission, request ID, trace.
    fn layered(routes: Router, config: &SimConfig, dispatcher: Arc<Dispatcher>) -> Router {
        routes
            .layer(DefaultBodyLimit::max(config.filter.max_content_length as usize))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(handle_layer_error))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
            .layer(middleware::from_fn_with_state(dispatcher, admission_middleware))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<SimConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let engine = SimEngine::new(self.state.vehicle.clone(), &self.config.simulation);
        tokio::spawn(engine.run(shutdown.resubscribe()));

        let dispatcher = Arc::clone(&self.state.dispatcher);
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                if let Err(e) = dispatcher.reload(&new_config) {
                    tracing::error!(error = %e, "Rejected config update, keeping current policy");
                }
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                // A dropped sender counts as shutdown too.
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// A clone of the fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Errors surfacing from the timeout layer become a generic 500.
async fn handle_layer_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::Internal("request timed out".to_string())
    } else {
        ApiError::Internal(format!("middleware error: {err}"))
    }
}

/// Turns a handler panic into a generic 500.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "handler panicked".to_string()
    };
    ApiError::Internal(detail).into_response()
}
