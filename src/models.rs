use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Access level stored on a user document. Everyone registers as a member;
/// only an existing admin can elevate another account.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Admin,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    /// Profile attributes the platform does not interpret (display name,
    /// photo URL, ...). Persisted as-is.
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

/// Decoded payload of a verified bearer token. Tokens are signed over
/// whatever object the client submitted at issuance, so every field except
/// `exp` is optional here; a token without an email never passes the
/// role or ownership checks.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Claims {
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PetCategory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A pet listing. The ownership and sort keys the platform filters on are
/// typed; descriptive fields (age, location, photos, long description, ...)
/// stay in the open map.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Pet {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lister_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet_category: Option<PetCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listed_time: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Adoption {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lister: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Campaign {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}
