use crate::{
    AppState,
    auth::session::{self, AuthUser},
    errors::{Error, Result},
};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use tracing::{debug, instrument, trace};

/// Extract the session token from an `Authorization: Bearer` header.
/// Returns:
/// - None: No Authorization header or not a Bearer token
/// - Some(Ok(user)): Valid token found and verified
/// - Some(Err(error)): Bearer token present but invalid
#[instrument(skip(headers, config))]
fn try_bearer_auth(headers: &HeaderMap, config: &crate::config::Config) -> Option<Result<AuthUser>> {
    let auth_header = headers.get(axum::http::header::AUTHORIZATION)?;

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }));
        }
    };

    // Check for Bearer token format
    let token = auth_str.strip_prefix("Bearer ")?;

    Some(session::verify_session_token(token, config))
}

/// Extract the session token from the configured session cookie.
/// Returns:
/// - None: No matching cookie present (or only invalid/expired ones)
/// - Some(Ok(user)): Valid token found and verified
#[instrument(skip(headers, config))]
fn try_cookie_auth(headers: &HeaderMap, config: &crate::config::Config) -> Option<Result<AuthUser>> {
    let cookie_header = headers.get(axum::http::header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }));
        }
    };
    let cookie_name = &config.auth.native.session.cookie_name;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name == cookie_name {
                match session::verify_session_token(value, config) {
                    Ok(user) => return Some(Ok(user)),
                    Err(_) => {
                        // Invalid/expired token, continue checking other cookies
                        // We don't propagate verification errors as they're expected for expired tokens
                        continue;
                    }
                }
            }
        }
    }
    None
}

/// Authenticate a request from its headers alone.
///
/// Used by the extractor below and by the one endpoint that accepts either a
/// session credential or the service key.
pub fn authenticate_headers(headers: &HeaderMap, config: &crate::config::Config) -> Result<AuthUser> {
    // Each method returns Option<Result<AuthUser>>:
    // - None means the credential is not present
    // - Some(Ok(user)) means successful authentication
    // - Some(Err(error)) means a credential was present but invalid
    //
    // The Authorization header takes precedence over the session cookie
    // when both are present.

    let mut auth_errors = Vec::new();

    match try_bearer_auth(headers, config) {
        Some(Ok(user)) => {
            debug!("Found bearer-authenticated user: {}", user.id);
            return Ok(user);
        }
        Some(Err(e)) => {
            trace!("Bearer authentication failed: {:?}", e);
            auth_errors.push(("Bearer token", e));
        }
        None => {
            trace!("No bearer authentication attempted");
        }
    }

    match try_cookie_auth(headers, config) {
        Some(Ok(user)) => {
            debug!("Found cookie-authenticated user: {}", user.id);
            return Ok(user);
        }
        Some(Err(e)) => {
            trace!("Cookie authentication failed: {:?}", e);
            auth_errors.push(("Session cookie", e));
        }
        None => {
            trace!("No cookie authentication attempted");
        }
    }

    if auth_errors.is_empty() {
        trace!("No authentication credentials found in request");
    } else {
        trace!("All authentication attempts failed ({}): {:?}", auth_errors.len(), auth_errors);
    }
    Err(Error::Unauthenticated { message: None })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        authenticate_headers(&parts.headers, &state.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::create_session_token;
    use crate::test_utils::create_test_config;
    use axum::extract::FromRequestParts as _;
    use uuid::Uuid;

    fn state_with_test_config(pool: sqlx::PgPool) -> AppState {
        AppState::builder().db(pool).config(create_test_config()).build()
    }

    fn parts_with_header(header_name: &str, header_value: &str) -> Parts {
        let request = axum::http::Request::builder()
            .uri("http://localhost/test")
            .header(header_name, header_value)
            .body(())
            .unwrap();

        let (parts, _body) = request.into_parts();
        parts
    }

    #[sqlx::test]
    async fn test_bearer_token_extraction(pool: sqlx::PgPool) {
        let state = state_with_test_config(pool);
        let user_id = Uuid::new_v4();
        let token = create_session_token(user_id, "bearer@example.com", &state.config).unwrap();

        let mut parts = parts_with_header("authorization", &format!("Bearer {token}"));
        let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();

        assert_eq!(user.id, user_id);
        assert_eq!(user.email, "bearer@example.com");
    }

    #[sqlx::test]
    async fn test_cookie_extraction(pool: sqlx::PgPool) {
        let state = state_with_test_config(pool);
        let user_id = Uuid::new_v4();
        let token = create_session_token(user_id, "cookie@example.com", &state.config).unwrap();

        let cookie_name = &state.config.auth.native.session.cookie_name;
        let mut parts = parts_with_header("cookie", &format!("other=1; {cookie_name}={token}"));
        let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();

        assert_eq!(user.id, user_id);
    }

    #[sqlx::test]
    async fn test_header_takes_precedence_over_cookie(pool: sqlx::PgPool) {
        let state = state_with_test_config(pool);
        let header_user = Uuid::new_v4();
        let cookie_user = Uuid::new_v4();
        let header_token = create_session_token(header_user, "header@example.com", &state.config).unwrap();
        let cookie_token = create_session_token(cookie_user, "cookie@example.com", &state.config).unwrap();

        let cookie_name = &state.config.auth.native.session.cookie_name;
        let request = axum::http::Request::builder()
            .uri("http://localhost/test")
            .header("authorization", format!("Bearer {header_token}"))
            .header("cookie", format!("{cookie_name}={cookie_token}"))
            .body(())
            .unwrap();
        let (mut parts, _body) = request.into_parts();

        let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.id, header_user);
    }

    #[sqlx::test]
    async fn test_missing_credentials_returns_unauthorized(pool: sqlx::PgPool) {
        let state = state_with_test_config(pool);

        let request = axum::http::Request::builder().uri("http://localhost/test").body(()).unwrap();
        let (mut parts, _body) = request.into_parts();

        let result = AuthUser::from_request_parts(&mut parts, &state).await;
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_invalid_bearer_token_rejected(pool: sqlx::PgPool) {
        let state = state_with_test_config(pool);

        let mut parts = parts_with_header("authorization", "Bearer not.a.token");
        let result = AuthUser::from_request_parts(&mut parts, &state).await;
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
