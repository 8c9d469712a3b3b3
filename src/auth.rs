/// Authentication extractors
use crate::{
    account::PublicUser,
    api::middleware::extract_access_token,
    context::AppContext,
    error::ApiError,
    ids::ObjectId,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Authenticated user, resolved from the access token
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: PublicUser,
}

impl AuthContext {
    pub fn user_id(&self) -> &ObjectId {
        &self.user.id
    }
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_access_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized request".to_string()))?;

        authenticate(state, &token).await
    }
}

/// Optional authenticated context - does not fail if no auth provided
#[derive(Debug, Clone)]
pub struct OptionalAuthContext {
    pub auth: Option<AuthContext>,
}

impl OptionalAuthContext {
    pub fn user_id(&self) -> Option<&ObjectId> {
        self.auth.as_ref().map(AuthContext::user_id)
    }
}

#[async_trait]
impl FromRequestParts<AppContext> for OptionalAuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let auth = match extract_access_token(&parts.headers) {
            Some(token) => match authenticate(state, &token).await {
                Ok(auth) => Some(auth),
                Err(e) => {
                    tracing::debug!("Ignoring unusable access token: {}", e);
                    None
                }
            },
            None => None,
        };

        Ok(OptionalAuthContext { auth })
    }
}

async fn authenticate(state: &AppContext, token: &str) -> Result<AuthContext, ApiError> {
    let claims = state.tokens.verify_access_token(token)?;
    let user_id = ObjectId::parse(&claims.sub, "user")
        .map_err(|_| ApiError::Unauthorized("Invalid access token".to_string()))?;

    let user = state
        .accounts
        .find_user(&user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid access token".to_string()))?;

    Ok(AuthContext { user })
}
