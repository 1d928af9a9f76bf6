use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::Value;

use crate::models::Claims;

/// Lifetime of an issued token. Validity is fully determined by signature
/// and expiry at verification time; nothing is persisted server-side.
const TOKEN_LIFETIME_HOURS: i64 = 2;

/// Sign an identity claim into a compact bearer token.
///
/// The claim is whatever JSON object the client submitted (minimally an
/// email); `iat` and `exp` are stamped on top of it before signing.
pub fn issue_token(claim: &Value, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let mut payload = claim.as_object().cloned().unwrap_or_default();
    payload.insert("iat".to_string(), Value::from(now.timestamp()));
    payload.insert(
        "exp".to_string(),
        Value::from((now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp()),
    );

    encode(
        &Header::default(),
        &Value::Object(payload),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify signature and expiry, returning the decoded claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}
