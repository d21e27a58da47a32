use axum::http::StatusCode;
use axum::Extension;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::identity::models::ActorKind;
use crate::inbound::http::middleware::AuthenticatedActor;

/// Echo the identity carried by the caller's bearer token.
pub async fn current_session(
    Extension(actor): Extension<AuthenticatedActor>,
) -> Result<ApiSuccess<CurrentSessionResponseData>, ApiError> {
    let session = actor.0;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        CurrentSessionResponseData {
            subject_id: session.subject_id.to_string(),
            actor_kind: session.actor_kind,
            issued_at: session.issued_at,
            expires_at: session.expires_at,
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentSessionResponseData {
    pub subject_id: String,
    pub actor_kind: ActorKind,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
