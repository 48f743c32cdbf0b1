use axum::{extract::Request, middleware::Next, response::Response};

use crate::error::ApiError;

/// Header set by the upstream auth layer once the user is authenticated.
pub const OWNER_HEADER: &str = "x-user-id";

const MAX_OWNER_CHARS: usize = 128;

/// The authenticated user every chat and task operation is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

impl Owner {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_header(value: Option<&str>) -> Result<Self, ApiError> {
        let owner = value.map(str::trim).unwrap_or_default();
        if owner.is_empty() {
            return Err(ApiError::Unauthorized("Missing user identity".to_string()));
        }
        if owner.chars().count() > MAX_OWNER_CHARS {
            return Err(ApiError::BadRequest("User identity is too long".to_string()));
        }
        Ok(Owner(owner.to_string()))
    }
}

/// Middleware to require an owner on every chat route
pub async fn require_owner(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(OWNER_HEADER)
        .and_then(|h| h.to_str().ok());

    let owner = Owner::from_header(header)?;
    req.extensions_mut().insert(owner);
    Ok(next.run(req).await)
}
