//! Token resolution middleware
//!
//! Resolves `Authorization: Token <key>` to a user and stashes an
//! `AuthContext` in request extensions. Requests without the header pass
//! through anonymous; a header with an unknown token is rejected outright.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use foodgram_common::{
    auth::{hash_token, AuthContext},
    db::Repository,
    errors::{AppError, Result},
};

/// Scheme used by the token endpoints
const TOKEN_SCHEME: &str = "Token";

pub async fn resolve_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let ctx = match header.and_then(parse_token_header) {
        None => AuthContext::default(),
        Some(token) => {
            let token_hash = hash_token(token);
            let repo = Repository::new(state.db.clone());

            match repo.find_user_by_token_hash(&token_hash).await? {
                Some(user) => AuthContext {
                    user: Some(user),
                    token_hash: Some(token_hash),
                },
                None => return Err(AppError::InvalidToken),
            }
        }
    };

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

/// Extract the opaque token from an `Authorization` header value
fn parse_token_header(value: &str) -> Option<&str> {
    let rest = value.strip_prefix(TOKEN_SCHEME)?;
    let token = rest.strip_prefix(' ')?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_header() {
        assert_eq!(parse_token_header("Token abc123"), Some("abc123"));
        assert_eq!(parse_token_header("Token  abc123 "), Some("abc123"));
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        assert_eq!(parse_token_header("Bearer abc123"), None);
        assert_eq!(parse_token_header("Token"), None);
        assert_eq!(parse_token_header("Token "), None);
        assert_eq!(parse_token_header(""), None);
    }
}
