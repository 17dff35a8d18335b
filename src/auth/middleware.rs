//! Authentication middleware that validates cookies, extends sessions, and handles redirects.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::{Duration, UtcOffset};

use crate::{
    AppState,
    auth::{
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::{build_log_in_redirect_url, build_log_in_redirect_url_from_target},
    },
    endpoints,
    timezone::get_local_offset,
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// The minimum time left on a session after an authenticated request.
const SESSION_REFRESH_WINDOW: Duration = Duration::minutes(5);

/// How an unauthenticated request is sent to the log-in page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogInRedirect {
    /// A plain `303 See Other` for page loads.
    Page,
    /// An `HX-Redirect` header for htmx requests, which would otherwise swap
    /// the log-in page into the current page.
    Htmx,
}

impl LogInRedirect {
    fn respond(self, log_in_url: &str) -> Response {
        match self {
            LogInRedirect::Page => Redirect::to(log_in_url).into_response(),
            LogInRedirect::Htmx => {
                (HxRedirect(log_in_url.to_owned()), StatusCode::OK).into_response()
            }
        }
    }
}

/// The log-in URL that returns the user to the page they asked for.
fn log_in_url_for(request: &Request) -> String {
    build_log_in_redirect_url(request).unwrap_or_else(|| {
        if request.uri().path().starts_with("/api") {
            tracing::warn!(
                "Missing or invalid HTMX headers for /api request. Falling back to dashboard."
            );
        } else {
            tracing::warn!("Invalid redirect URL from request URI. Falling back to dashboard.");
        }

        build_log_in_redirect_url_from_target(endpoints::DASHBOARD_VIEW)
            .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
    })
}

/// Copy the `Set-Cookie` headers of a refreshed session onto `response`.
///
/// The session is kept alive for at least [SESSION_REFRESH_WINDOW] after each
/// authenticated request. If the cookie cannot be refreshed the response is
/// sent without it and the session expires as before.
fn with_refreshed_session(
    response: Response,
    jar: PrivateCookieJar,
    local_offset: UtcOffset,
) -> Response {
    let jar = match extend_auth_cookie_duration_if_needed(
        jar.clone(),
        SESSION_REFRESH_WINDOW,
        local_offset,
    ) {
        Ok(updated_jar) => updated_jar,
        Err(error) => {
            tracing::error!("Error extending cookie duration: {error:?}. Rolling back cookie jar.");
            jar
        }
    };

    let (mut parts, body) = response.into_parts();
    for value in jar.into_response().headers().get_all(SET_COOKIE) {
        parts.headers.append(SET_COOKIE, value.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Checks for a valid auth cookie and places the owner's [UserID](crate::auth::UserID)
/// into the request extensions, otherwise sends the client to the log-in page.
async fn guard(
    state: AuthState,
    request: Request,
    next: Next,
    log_in_redirect: LogInRedirect,
) -> Response {
    let log_in_url = log_in_url_for(&request);

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Error getting local timezone. Redirecting to log in page.");
        return log_in_redirect.respond(&log_in_url);
    };

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Error getting cookie jar: {error:?}. Redirecting to log in page.");
            return log_in_redirect.respond(&log_in_url);
        }
    };

    match get_token_from_cookies(&jar) {
        Ok(token) => {
            parts.extensions.insert(token.user_id);
        }
        Err(error) => {
            tracing::debug!("Rejecting request without a valid token: {error}");
            return log_in_redirect.respond(&log_in_url);
        }
    }

    let response = next.run(Request::from_parts(parts, body)).await;

    with_refreshed_session(response, jar, local_offset)
}

/// Middleware for pages. Unauthenticated requests are redirected to the log-in page.
///
/// **Note**: Route handlers can take a [UserID](crate::auth::UserID) argument to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard(state, request, next, LogInRedirect::Page).await
}

/// Middleware for routes requested by htmx. Unauthenticated requests get an
/// `HX-Redirect` to the log-in page.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    guard(state, request, next, LogInRedirect::Htmx).await
}
