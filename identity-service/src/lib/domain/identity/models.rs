use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::identity::errors::SessionError;
use crate::domain::identity::errors::UnknownActorKind;
use crate::domain::identity::errors::ValidationError;

/// The three kinds of actor known to the system.
///
/// Identifier uniqueness is scoped to a kind: a patient and a hospital may
/// share an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Patient,
    Hospital,
    Doctor,
}

impl ActorKind {
    pub const ALL: [ActorKind; 3] = [ActorKind::Patient, ActorKind::Hospital, ActorKind::Doctor];

    /// Lowercase wire name, as used in routes and token claims.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorKind::Patient => "patient",
            ActorKind::Hospital => "hospital",
            ActorKind::Doctor => "doctor",
        }
    }

    /// Capitalized name for human-readable messages.
    pub fn label(&self) -> &'static str {
        match self {
            ActorKind::Patient => "Patient",
            ActorKind::Hospital => "Hospital",
            ActorKind::Doctor => "Doctor",
        }
    }
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorKind {
    type Err = UnknownActorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActorKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownActorKind(s.to_string()))
    }
}

/// Actor identifier value type
///
/// Opaque to the system (e.g. `HV123456789`, `HOSP12345`). Trimmed, 1-64
/// characters, no whitespace or control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorId(String);

impl ActorId {
    const MAX_LENGTH: usize = 64;

    /// Create a validated actor id.
    ///
    /// # Errors
    /// * `Required` - Empty after trimming
    /// * `TooLong` - Longer than 64 characters
    /// * `InvalidCharacters` - Contains whitespace or control characters
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into().trim().to_string();
        let length = id.chars().count();

        if length == 0 {
            return Err(ValidationError::Required { field: "id" });
        }
        if length > Self::MAX_LENGTH {
            return Err(ValidationError::TooLong {
                field: "id",
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }
        if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValidationError::InvalidCharacters { field: "id" });
        }

        Ok(Self(id))
    }

    /// Id submitted at login, trimmed but otherwise unchecked.
    ///
    /// Only used for lookups: an id that `new` would reject can never have
    /// been stored, so it simply resolves to no actor.
    pub fn submitted(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Display name value type (trimmed, 1-128 characters)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    const MAX_LENGTH: usize = 128;

    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        let length = name.chars().count();

        if length == 0 {
            Err(ValidationError::Required { field: "name" })
        } else if length > Self::MAX_LENGTH {
            Err(ValidationError::TooLong {
                field: "name",
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext secret as submitted by a client.
///
/// Never persisted and never printed: `Debug` is redacted and there is no
/// `Display`.
#[derive(Clone)]
pub struct RawSecret(String);

impl RawSecret {
    /// Secret chosen at registration. Must be non-empty.
    pub fn new(secret: impl Into<String>) -> Result<Self, ValidationError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ValidationError::Required { field: "password" });
        }
        Ok(Self(secret))
    }

    /// Secret submitted at login. Not validated: whatever the client sent is
    /// checked against the stored hash.
    pub fn submitted(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RawSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawSecret(***)")
    }
}

/// One-way hash of a secret in PHC string format. `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretHash(String);

impl SecretHash {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretHash(***)")
    }
}

/// Patient-specific profile fields. All optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientProfile {
    pub gender: Option<String>,
    pub age: Option<u16>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl PatientProfile {
    const MAX_AGE: u16 = 150;

    /// Build a profile, turning blank strings into `None`.
    ///
    /// # Errors
    /// * `AgeOutOfRange` - Age above 150
    pub fn new(
        gender: Option<String>,
        age: Option<u16>,
        phone: Option<String>,
        address: Option<String>,
    ) -> Result<Self, ValidationError> {
        if let Some(actual) = age.filter(|age| *age > Self::MAX_AGE) {
            return Err(ValidationError::AgeOutOfRange {
                max: Self::MAX_AGE,
                actual,
            });
        }

        Ok(Self {
            gender: non_blank(gender),
            age,
            phone: non_blank(phone),
            address: non_blank(address),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HospitalProfile {
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctorProfile {
    pub speciality: Option<String>,
    /// Id of the hospital the doctor is affiliated with
    pub hospital_id: Option<String>,
}

/// Kind-specific profile. Its variant decides the actor's kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActorProfile {
    Patient(PatientProfile),
    Hospital(HospitalProfile),
    Doctor(DoctorProfile),
}

impl ActorProfile {
    pub fn kind(&self) -> ActorKind {
        match self {
            ActorProfile::Patient(_) => ActorKind::Patient,
            ActorProfile::Hospital(_) => ActorKind::Hospital,
            ActorProfile::Doctor(_) => ActorKind::Doctor,
        }
    }
}

/// Actor aggregate entity.
///
/// A patient, hospital or doctor together with its hashed secret.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: ActorId,
    pub display_name: DisplayName,
    pub secret_hash: SecretHash,
    pub profile: ActorProfile,
    pub created_at: DateTime<Utc>,
}

impl Actor {
    pub fn kind(&self) -> ActorKind {
        self.profile.kind()
    }
}

/// Command to register a new patient with domain types
#[derive(Debug)]
pub struct RegisterPatientCommand {
    pub id: ActorId,
    pub display_name: DisplayName,
    pub secret: RawSecret,
    pub profile: PatientProfile,
}

impl RegisterPatientCommand {
    /// Validate raw registration input.
    ///
    /// # Errors
    /// * `ValidationError` - Missing id, password or name, or an invalid field
    pub fn new(
        id: String,
        secret: String,
        name: String,
        profile: PatientProfile,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id: ActorId::new(id)?,
            display_name: DisplayName::new(name)?,
            secret: RawSecret::new(secret)?,
            profile,
        })
    }
}

/// Identity asserted by a valid session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub subject_id: ActorId,
    pub actor_kind: ActorKind,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TryFrom<auth::SessionClaims> for Session {
    type Error = SessionError;

    fn try_from(claims: auth::SessionClaims) -> Result<Self, Self::Error> {
        let invalid = |what: &str| SessionError::Invalid(format!("bad {} claim", what));

        Ok(Self {
            subject_id: ActorId::new(claims.sub.as_str()).map_err(|_| invalid("sub"))?,
            actor_kind: claims.kind.parse().map_err(|_| invalid("kind"))?,
            issued_at: claims.issued_at().ok_or_else(|| invalid("iat"))?,
            expires_at: claims.expires_at().ok_or_else(|| invalid("exp"))?,
        })
    }
}

/// Session token issued on successful login: the bearer string plus the
/// session it encodes.
#[derive(Clone)]
pub struct SessionToken {
    pub token: String,
    pub session: Session,
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("token", &"***")
            .field("session", &self.session)
            .finish()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
