//! Caller identity extraction.
//!
//! Authentication happens upstream. The proxy in front of this service
//! forwards the verified identity in `x-user-id` and `x-user-role`, plus
//! optional `x-user-name` and `x-user-email` for dashboard display.

use super::error::ApiError;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use shared_types::{Caller, Role, UserId};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct AuthenticatedCaller(pub Caller);

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl AuthenticatedCaller {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let user_id = header(headers, USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("missing caller identity"))?;
        let role: Role = header(headers, USER_ROLE_HEADER)
            .ok_or_else(|| ApiError::unauthorized("missing caller role"))?
            .parse()
            .map_err(ApiError::unauthorized)?;

        Ok(Self(Caller {
            user_id: UserId::new(user_id),
            role,
            name: header(headers, USER_NAME_HEADER).unwrap_or_default().to_string(),
            email: header(headers, USER_EMAIL_HEADER).unwrap_or_default().to_string(),
        }))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedCaller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
    }
}
