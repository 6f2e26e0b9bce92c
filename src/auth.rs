use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use uuid::Uuid;

/// Authenticated user id, asserted by the upstream gateway.
///
/// Authentication lives outside this service; the gateway replaces any
/// client-supplied `X-User-Id` with the verified one before forwarding.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing X-User-Id header".to_string(),
            ))?;

        let user_id = raw.parse::<Uuid>().map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                "Invalid X-User-Id header".to_string(),
            )
        })?;

        Ok(AuthUser(user_id))
    }
}
