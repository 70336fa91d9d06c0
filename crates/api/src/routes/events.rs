//! Event ingress route.

use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;

use herald_common::error::{AppError, RejectionReason};
use herald_common::types::EventPayload;

use crate::routes::MAX_BODY_BYTES;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(receive_event))
}

/// POST / — Validate an event and launch its deliveries.
///
/// Responds 204 as soon as deliveries are launched; their outcomes are only
/// logged. Any validation failure responds 400 with `error_message`; a body
/// over [`MAX_BODY_BYTES`] responds 413 with the same shape.
async fn receive_event(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<StatusCode, AppError> {
    let body = body.map_err(body_error)?;
    let event = EventPayload::from_slice(&body)
        .and_then(|payload| state.validator.validate(&payload))
        .inspect_err(|reason| tracing::info!(reason = %reason, "Event rejected"))?;

    let handle = state.dispatcher.dispatch(event);
    tracing::debug!(
        dispatch_id = %handle.dispatch_id,
        launched = handle.launched(),
        skipped = handle.skipped,
        "Event accepted"
    );

    Ok(StatusCode::NO_CONTENT)
}

fn body_error(rejection: BytesRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::info!(limit = MAX_BODY_BYTES, "Event rejected: body too large");
        AppError::PayloadTooLarge {
            limit: MAX_BODY_BYTES,
        }
    } else {
        RejectionReason::MalformedBody(rejection.body_text()).into()
    }
}
