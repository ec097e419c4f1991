//! Route handlers for the vehicle API.
//!
//! Control updates go through two stages: a wide acceptance range that
//! rejects grossly invalid input, then a narrower clamp applied silently
//! before the value is stored.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::Response,
    Extension, Json,
};
use serde_json::{Map, Value};

use crate::error::{error_response, ApiError, ValidationFailure};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::validation::{coerce_numeric, validate_numeric_range};
use crate::security::ClientId;
use crate::sim::physics::clamp;
use crate::sim::{Control, StatusReport};

/// Accepted input range and stored range for one control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlLimits {
    pub accept: (i64, i64),
    pub clamp: (i64, i64),
}

impl ControlLimits {
    pub const FIN: ControlLimits = ControlLimits {
        accept: (-50, 50),
        clamp: (-30, 30),
    };

    pub const PROP: ControlLimits = ControlLimits {
        accept: (-50, 150),
        clamp: (-30, 100),
    };

    pub fn for_control(control: Control) -> Self {
        match control {
            Control::PitchFin | Control::YawFin => Self::FIN,
            Control::Prop => Self::PROP,
        }
    }
}

pub async fn get_status(State(state): State<AppState>) -> Json<StatusReport> {
    Json(state.vehicle.snapshot())
}

pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found.")
}

pub async fn set_pitch(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, ApiError> {
    update_control(&state, &client, body, Control::PitchFin)
}

pub async fn set_yaw(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, ApiError> {
    update_control(&state, &client, body, Control::YawFin)
}

pub async fn set_prop(
    State(state): State<AppState>,
    Extension(client): Extension<ClientId>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, ApiError> {
    update_control(&state, &client, body, Control::Prop)
}

fn update_control(
    state: &AppState,
    client: &ClientId,
    body: Result<Bytes, BytesRejection>,
    control: Control,
) -> Result<Json<Value>, ApiError> {
    match apply_control(state, body, control) {
        Ok(value) => {
            tracing::info!(client = %client.as_str(), control = control.key(), value, "Control updated");
            metrics::record_control_update(control.key());

            let mut reply = Map::new();
            reply.insert(control.key().to_string(), Value::from(value));
            Ok(Json(Value::Object(reply)))
        }
        Err(e) => {
            tracing::warn!(
                client = %client.as_str(),
                control = control.key(),
                decision = "reject",
                reason = %e,
                "Control update rejected"
            );
            Err(e)
        }
    }
}

/// Decode, validate, clamp and store. Returns the stored value.
fn apply_control(
    state: &AppState,
    body: Result<Bytes, BytesRejection>,
    control: Control,
) -> Result<i64, ApiError> {
    let bytes = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::from(ValidationFailure::MalformedStructure)
        }
    })?;
    let body: Value =
        serde_json::from_slice(&bytes).map_err(|_| ValidationFailure::MalformedStructure)?;

    let policy = state.dispatcher.policy();
    policy
        .validator
        .validate_structured(&body, policy.validator.max_payload_bytes())
        .into_result()?;

    let raw = body.get("value").ok_or(ValidationFailure::MissingField)?;
    let limits = ControlLimits::for_control(control);
    validate_numeric_range(raw, limits.accept.0, limits.accept.1).into_result()?;
    let number = coerce_numeric(raw).ok_or(ValidationFailure::InvalidNumeric)?;
    let value = clamp(number.truncated(), limits.clamp.0, limits.clamp.1);

    state.vehicle.set_control(control, value);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::security::Dispatcher;
    use crate::sim::SharedVehicle;
    use std::sync::Arc;

    fn state() -> AppState {
        AppState {
            dispatcher: Arc::new(Dispatcher::new(&SimConfig::default()).unwrap()),
            vehicle: SharedVehicle::new(),
        }
    }

    fn apply(state: &AppState, body: &str, control: Control) -> Result<i64, ApiError> {
        apply_control(state, Ok(Bytes::from(body.to_string())), control)
    }

    #[test]
    fn test_limits() {
        assert_eq!(ControlLimits::for_control(Control::YawFin), ControlLimits::FIN);
        assert_eq!(ControlLimits::for_control(Control::Prop).clamp, (-30, 100));
    }

    #[test]
    fn test_value_stored_and_clamped() {
        let state = state();
        assert_eq!(apply(&state, r#"{"value": 15}"#, Control::PitchFin).unwrap(), 15);
        assert_eq!(apply(&state, r#"{"value": 50}"#, Control::PitchFin).unwrap(), 30);
        assert_eq!(apply(&state, r#"{"value": -50}"#, Control::YawFin).unwrap(), -30);
        assert_eq!(apply(&state, r#"{"value": 150}"#, Control::Prop).unwrap(), 100);
        assert_eq!(apply(&state, r#"{"value": "75"}"#, Control::Prop).unwrap(), 75);
        assert_eq!(apply(&state, r#"{"value": 12.9}"#, Control::Prop).unwrap(), 12);

        let controls = state.vehicle.controls();
        assert_eq!(controls.pitch_fin, 30);
        assert_eq!(controls.yaw_fin, -30);
        assert_eq!(controls.prop, 12);
    }

    #[test]
    fn test_rejections_leave_state_untouched() {
        let state = state();
        let cases = [
            ("not json", ValidationFailure::MalformedStructure),
            ("[1]", ValidationFailure::MalformedStructure),
            (r#"{"other": 1}"#, ValidationFailure::MissingField),
            (r#"{"value": "abc"}"#, ValidationFailure::InvalidNumeric),
            (r#"{"value": 200}"#, ValidationFailure::OutOfRange),
            (r#"{"value": 1, "note": "union select"}"#, ValidationFailure::PatternMatch),
        ];
        for (body, expected) in cases {
            match apply(&state, body, Control::PitchFin) {
                Err(ApiError::ValidationFailed(failure)) => assert_eq!(failure, expected, "{body}"),
                other => panic!("unexpected result for {body}: {other:?}"),
            }
        }
        assert_eq!(state.vehicle.controls().pitch_fin, 0);
    }

    #[test]
    fn test_prop_accepts_wider_range_than_fins() {
        let state = state();
        assert!(apply(&state, r#"{"value": 120}"#, Control::Prop).is_ok());
        assert!(apply(&state, r#"{"value": 120}"#, Control::YawFin).is_err());
    }
}
