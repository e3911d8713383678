//! Event intake handler.
//!
//! # Endpoints
//!
//! - `POST /events` – queue a signed `NotificationRequest` for the
//!   notification center

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;
use workx_core::events::NotificationEvent;
use workx_sdk::objects::NotificationRequest;

use crate::api::extractors::SignedBody;
use crate::state::AppState;

/// Build the intake router.
pub fn router() -> Router<AppState> {
    Router::new().route("/events", post(submit_event))
}

#[derive(Debug, Serialize)]
struct EventAccepted {
    kind: &'static str,
}

/// `POST /events`: queue an event.
///
/// Answers `202 Accepted` once the event is queued; delivery happens later
/// and its outcome is only logged.
async fn submit_event(
    State(state): State<AppState>,
    SignedBody(request): SignedBody<NotificationRequest>,
) -> Result<impl IntoResponse, IntakeApiError> {
    let event = NotificationEvent::from(request);
    let kind = event.kind();
    state
        .events
        .send(event)
        .await
        .map_err(|_| IntakeApiError::QueueClosed)?;
    tracing::debug!(kind, "Queued notification event");

    Ok((StatusCode::ACCEPTED, Json(EventAccepted { kind })))
}

/// Errors that can occur in intake handlers.
#[derive(Debug)]
enum IntakeApiError {
    /// The notification center is no longer receiving.
    QueueClosed,
}

impl IntoResponse for IntakeApiError {
    fn into_response(self) -> Response {
        match self {
            IntakeApiError::QueueClosed => {
                tracing::warn!("Notification queue closed, rejecting event");
                (StatusCode::SERVICE_UNAVAILABLE, "shutting down").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::runtime::IntakeConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use workx_core::entities::{JobId, ProposalRef};
    use workx_core::events::{NotificationEventReceiver, notification_event_channel};
    use workx_sdk::signature::{SIGNATURE_HEADER, SignedObject};

    const SECRET: &[u8] = b"intake-secret";

    fn app() -> (Router, NotificationEventReceiver) {
        let (tx, rx) = notification_event_channel();
        let state = AppState::new(IntakeConfig::new(SECRET.to_vec()), tx);
        let router = Router::new()
            .nest("/api/v1", crate::api::router())
            .with_state(state);
        (router, rx)
    }

    fn signed_request(signed: &SignedObject<NotificationRequest>) -> Request<Body> {
        Request::post("/api/v1/events")
            .header("content-type", "application/json")
            .header(SIGNATURE_HEADER, signed.to_header())
            .body(Body::from(signed.json.clone()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_signed_event_is_queued() {
        let (router, mut rx) = app();
        let signed = SignedObject::new(NotificationRequest::JobApproved { job_id: 4 }, SECRET).unwrap();

        let response = router.oneshot(signed_request(&signed)).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(
            rx.try_recv().unwrap(),
            NotificationEvent::JobApproved { job_id: JobId(4) }
        );
    }

    #[tokio::test]
    async fn test_proposal_origin_survives_intake() {
        let (router, mut rx) = app();
        let signed = SignedObject::new(
            NotificationRequest::EmployerProposalAccepted { proposal_id: 9 },
            SECRET,
        )
        .unwrap();

        router.oneshot(signed_request(&signed)).await.unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            NotificationEvent::ProposalAccepted {
                proposal: ProposalRef::employer(9)
            }
        );
    }

    #[tokio::test]
    async fn test_wrong_key_is_unauthorized() {
        let (router, mut rx) = app();
        let signed =
            SignedObject::new(NotificationRequest::WorkerApproved { worker_id: 1 }, b"other").unwrap();

        let response = router.oneshot(signed_request(&signed)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stale_signature_is_unauthorized() {
        let (router, _rx) = app();
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let signed = SignedObject::new_at(
            NotificationRequest::WorkerApproved { worker_id: 1 },
            SECRET,
            now - 600,
        )
        .unwrap();

        let response = router.oneshot(signed_request(&signed)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let (router, _rx) = app();
        let request = Request::post("/api/v1/events")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"kind":"job_approved","job_id":1}"#))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_closed_queue_is_unavailable() {
        let (router, rx) = app();
        drop(rx);
        let signed = SignedObject::new(NotificationRequest::JobApproved { job_id: 1 }, SECRET).unwrap();

        let response = router.oneshot(signed_request(&signed)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
