//! Admission pipeline wrapped around the route handlers.
//!
//! # Decision Order (first rejection wins)
//! ```text
//! 1. client blocked?              → 429
//! 2. window quota spent?          → 429 (starts a block)
//! 3. user agent denylisted?       → 403
//! 4. forbidden header present?    → 403
//! 5. declared length too large?   → 413
//! 6. run handler (failure         → 500, cause logged only)
//! 7. hardening headers on whatever response came out
//! ```

use std::borrow::Cow;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::SimConfig;
use crate::error::{ApiError, ForbiddenReason};
use crate::observability::metrics;
use crate::security::filter::RequestFilter;
use crate::security::headers::apply_hardening_headers;
use crate::security::rate_limit::RateLimiter;
use crate::security::validation::InputValidator;

/// Identifier used for rate limiting and logs. Inserted into request
/// extensions for the handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl ClientId {
    pub const UNKNOWN: &'static str = "unknown";

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Read-only view of an inbound request.
#[derive(Debug)]
pub struct RequestDescriptor<'a> {
    pub client: ClientId,
    pub method: &'a Method,
    pub path: &'a str,
    pub headers: &'a HeaderMap,
    pub content_length: Option<&'a str>,
    pub user_agent: Option<Cow<'a, str>>,
}

impl<'a> RequestDescriptor<'a> {
    pub fn from_request(request: &'a Request<Body>) -> Self {
        let client = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| ClientId::UNKNOWN.to_string());

        let headers = request.headers();
        Self {
            client: ClientId(client),
            method: request.method(),
            path: request.uri().path(),
            headers,
            // Non-UTF-8 lengths become unparsable and are refused.
            content_length: headers
                .get(header::CONTENT_LENGTH)
                .map(|v| v.to_str().unwrap_or("")),
            user_agent: headers
                .get(header::USER_AGENT)
                .map(|v| String::from_utf8_lossy(v.as_bytes())),
        }
    }
}

/// Filter and validator, swapped together on config reload.
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    pub filter: RequestFilter,
    pub validator: InputValidator,
}

impl AdmissionPolicy {
    pub fn from_config(config: &SimConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            filter: RequestFilter::new(&config.filter),
            validator: InputValidator::from_config(&config.validation)?,
        })
    }
}

/// Owns the rate limiter state and the current policy.
pub struct Dispatcher {
    limiter: RateLimiter,
    policy: ArcSwap<AdmissionPolicy>,
}

impl Dispatcher {
    pub fn new(config: &SimConfig) -> Result<Self, regex::Error> {
        Ok(Self::from_parts(
            RateLimiter::new(&config.rate_limit),
            AdmissionPolicy::from_config(config)?,
        ))
    }

    pub fn from_parts(limiter: RateLimiter, policy: AdmissionPolicy) -> Self {
        Self {
            limiter,
            policy: ArcSwap::from_pointee(policy),
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn policy(&self) -> Arc<AdmissionPolicy> {
        self.policy.load_full()
    }

    /// Apply a new configuration. Client records survive.
    pub fn reload(&self, config: &SimConfig) -> Result<(), regex::Error> {
        let policy = AdmissionPolicy::from_config(config)?;
        // Two separate swaps: a request landing between them sees the new
        // thresholds with the old filter. Both halves are valid on their own.
        self.limiter.reconfigure(&config.rate_limit);
        self.policy.store(Arc::new(policy));
        tracing::info!(
            requests_per_window = config.rate_limit.requests_per_window,
            window_secs = config.rate_limit.window_secs,
            "Admission policy reloaded"
        );
        Ok(())
    }

    pub fn evaluate(&self, request: &RequestDescriptor<'_>) -> Result<(), ApiError> {
        self.evaluate_at(request, Instant::now())
    }

    /// Run steps 1-5 of the pipeline.
    pub fn evaluate_at(&self, request: &RequestDescriptor<'_>, now: Instant) -> Result<(), ApiError> {
        let client = request.client.as_str();

        self.limiter
            .check_at(client, now)
            .map_err(ApiError::RateLimited)?;
        tracing::debug!(client, decision = "allow", reason = "within_quota", "Rate limit check");

        let policy = self.policy.load();

        if !policy.filter.check_user_agent(request.user_agent.as_deref()) {
            return Err(ApiError::Forbidden(ForbiddenReason::SuspiciousAgent));
        }
        if !policy.filter.check_headers(request.headers) {
            return Err(ApiError::Forbidden(ForbiddenReason::ForbiddenHeader));
        }
        if !policy.filter.check_declared_size(request.content_length) {
            return Err(ApiError::PayloadTooLarge);
        }
        tracing::debug!(client, decision = "allow", reason = "filter_passed", "Request filter check");

        Ok(())
    }
}

/// Middleware running every request through the [`Dispatcher`].
pub async fn admission_middleware(
    State(dispatcher): State<Arc<Dispatcher>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();

    let (client, verdict) = {
        let descriptor = RequestDescriptor::from_request(&request);
        let verdict = dispatcher.evaluate(&descriptor);
        (descriptor.client, verdict)
    };

    let mut response = match verdict {
        Err(rejection) => {
            tracing::warn!(
                client = %client.as_str(),
                method = %method,
                path = %request.uri().path(),
                decision = "reject",
                reason = %rejection,
                "Request rejected"
            );
            metrics::record_admission(rejection.decision());
            rejection.into_response()
        }
        Ok(()) => {
            metrics::record_admission("accepted");
            request.extensions_mut().insert(client.clone());
            let response = next.run(request).await;
            if response.status().is_server_error() {
                tracing::error!(
                    client = %client.as_str(),
                    status = %response.status(),
                    decision = "internal_failure",
                    "Handler failed"
                );
            }
            response
        }
    };

    apply_hardening_headers(response.headers_mut());
    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}
