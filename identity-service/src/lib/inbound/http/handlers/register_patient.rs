use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::identity::errors::ValidationError;
use crate::domain::identity::models::PatientProfile;
use crate::domain::identity::models::RegisterPatientCommand;
use crate::domain::identity::ports::IdentityServicePort;
use crate::inbound::http::router::AppState;

pub async fn register_patient(
    State(state): State<AppState>,
    payload: Result<Json<RegisterPatientRequest>, JsonRejection>,
) -> Result<ApiSuccess<RegisterPatientResponseData>, ApiError> {
    let Json(body) = payload?;
    let command = body.try_into_command()?;
    let name = command.display_name.to_string();

    state
        .identity_service
        .register_patient(command)
        .await
        .map_err(ApiError::from)
        .map(|id| {
            ApiSuccess::new(
                StatusCode::CREATED,
                RegisterPatientResponseData {
                    id: id.to_string(),
                    name,
                },
            )
        })
}

/// HTTP request body for patient registration (raw JSON)
///
/// Required fields default to empty so that a missing field is reported as a
/// validation error rather than a deserialization failure.
#[derive(Deserialize)]
pub struct RegisterPatientRequest {
    #[serde(default, alias = "healthId")]
    id: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    name: String,
    gender: Option<String>,
    age: Option<u16>,
    phone: Option<String>,
    address: Option<String>,
}

impl RegisterPatientRequest {
    fn try_into_command(self) -> Result<RegisterPatientCommand, ValidationError> {
        let profile = PatientProfile::new(self.gender, self.age, self.phone, self.address)?;
        RegisterPatientCommand::new(self.id, self.password, self.name, profile)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterPatientResponseData {
    pub id: String,
    pub name: String,
}
