use axum::extract::rejection::JsonRejection;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::identity::models::ActorId;
use crate::domain::identity::models::ActorKind;
use crate::domain::identity::models::RawSecret;
use crate::domain::identity::ports::IdentityServicePort;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    payload: Result<Json<LoginRequestBody>, JsonRejection>,
) -> Result<ApiSuccess<LoginResponseData>, ApiError> {
    let kind: ActorKind = kind.parse()?;
    let Json(body) = payload?;
    let id = ActorId::submitted(body.id);

    let issued = state
        .identity_service
        .authenticate(kind, &id, RawSecret::submitted(body.password))
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        LoginResponseData {
            message: "Login successful".to_string(),
            token: issued.token,
            expires_at: issued.session.expires_at,
        },
    ))
}

/// Login body. `id` also accepts the per-kind field names older clients send.
#[derive(Deserialize)]
pub struct LoginRequestBody {
    #[serde(default, alias = "healthId", alias = "hospitalId", alias = "doctorId")]
    id: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponseData {
    pub message: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
