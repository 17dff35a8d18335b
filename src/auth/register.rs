//! The registration page for creating a new account.
use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    app_state::create_cookie_key,
    auth::{
        DEFAULT_COOKIE_DURATION, PasswordHash, ValidatedPassword, create_user, set_auth_cookie,
        user::parse_email,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, email_input,
        form_error, loading_spinner, log_in_register, password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    timezone::get_local_offset,
};

/// The minimum number of characters the password should have to be considered valid on the client side (server-side validation is done on top of this validation).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length);

            (form_error(error_message))
        }
    }
}

/// Error messages for each field of the registration form.
#[derive(Default)]
struct RegistrationErrors<'a> {
    email: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn registration_form(email: &str, password: &str, errors: RegistrationErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#email, #password, #confirm-password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (email_input(email, errors.email))
            (password_input(password, PASSWORD_INPUT_MIN_LENGTH, errors.password))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, errors.confirm_password))

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", "", RegistrationErrors::default());
    let content = log_in_register("Create an account", &registration_form);
    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
    /// The bcrypt cost used when hashing new passwords.
    pub hash_cost: u32,
}

impl RegistrationState {
    /// Create the cookie key from a string and set the default cookie duration.
    pub fn new(
        cookie_secret: &str,
        local_timezone: &str,
        db_connection: Arc<Mutex<Connection>>,
    ) -> Self {
        Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection,
            hash_cost: PasswordHash::DEFAULT_COST,
        }
    }
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
            hash_cost: PasswordHash::DEFAULT_COST,
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

fn render_error(user_data: &RegisterForm, errors: RegistrationErrors) -> Response {
    registration_form(&user_data.email, &user_data.password, errors).into_response()
}

/// Create a new user and log them in.
///
/// Validation problems are shown under the offending field and no user is created.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let email = match parse_email(&user_data.email) {
        Ok(email) => email,
        Err(error) => {
            return render_error(&user_data, RegistrationErrors {
                email: Some(&error.to_string()),
                ..Default::default()
            });
        }
    };

    let validated_password =
        match ValidatedPassword::new_with_user_inputs(&user_data.password, &[email.as_str()]) {
            Ok(password) => password,
            Err(error) => {
                return render_error(&user_data, RegistrationErrors {
                    password: Some(&error.to_string()),
                    ..Default::default()
                });
            }
        };

    if user_data.password != user_data.confirm_password {
        return render_error(&user_data, RegistrationErrors {
            confirm_password: Some("Passwords do not match"),
            ..Default::default()
        });
    }

    let password_hash = match PasswordHash::new(validated_password, state.hash_cost) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let local_timezone = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_response(),
    };

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return get_internal_server_error_redirect();
            }
        };

        match create_user(email, password_hash, &connection) {
            Ok(user) => user,
            Err(Error::DuplicateEmail) => {
                return render_error(&user_data, RegistrationErrors {
                    email: Some(&Error::DuplicateEmail.to_string()),
                    ..Default::default()
                });
            }
            Err(error) => {
                tracing::error!("An unhandled error occurred while inserting a new user: {error}");
                return get_internal_server_error_redirect();
            }
        }
    };

    match set_auth_cookie(jar, user.id, state.cookie_duration, local_timezone) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");
            get_internal_server_error_redirect()
        }
    }
}


#[cfg(test)]
mod register_user_tests {
    use axum::{
        Router,
        body::Body,
        extract::State,
        http::{Response, StatusCode},
        routing::post,
    };
    use axum_extra::extract::{Form, PrivateCookieJar};
    use axum_test::TestServer;

    use crate::{
        auth::{COOKIE_TOKEN, get_user_by_email, user::parse_email},
        endpoints,
        test_utils::{
            assert_hx_redirect, element_texts, get_test_connection, insert_test_user,
            parse_html_fragment, shared,
        },
    };

    use super::{RegisterForm, RegistrationState, register_user};

    const STRONG_PASSWORD: &str = "iamtestingwhethericancreateanewuser";

    fn get_test_state() -> RegistrationState {
        RegistrationState {
            hash_cost: 4,
            ..RegistrationState::new("42", "Etc/UTC", shared(get_test_connection()))
        }
    }

    fn register_form(email: &str, password: &str, confirm_password: &str) -> RegisterForm {
        RegisterForm {
            email: email.to_owned(),
            password: password.to_owned(),
            confirm_password: confirm_password.to_owned(),
        }
    }

    async fn register(state: RegistrationState, form: RegisterForm) -> Response<Body> {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        register_user(State(state), jar, Form(form)).await
    }

    async fn error_messages(response: Response<Body>) -> Vec<String> {
        let fragment = parse_html_fragment(response).await;
        element_texts(&fragment, "p.text-red-500")
    }

    #[tokio::test]
    async fn create_user_succeeds() {
        let state = get_test_state();

        let response = register(
            state.clone(),
            register_form("New.User@Example.com", STRONG_PASSWORD, STRONG_PASSWORD),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::DASHBOARD_VIEW);

        let connection = state.db_connection.lock().unwrap();
        let email = parse_email("new.user@example.com").unwrap();
        let user = get_user_by_email(&email, &connection).expect("user was not created");
        assert!(user.password_hash.verify(STRONG_PASSWORD).unwrap());
    }

    #[tokio::test]
    async fn create_user_sets_auth_cookie() {
        let app = Router::new()
            .route(endpoints::USERS, post(register_user))
            .with_state(get_test_state());
        let server = TestServer::new(app);

        let response = server
            .post(endpoints::USERS)
            .form(&register_form(
                "test@example.com",
                STRONG_PASSWORD,
                STRONG_PASSWORD,
            ))
            .await;

        response.assert_status_see_other();
        let _ = response.cookie(COOKIE_TOKEN);
    }

    #[tokio::test]
    async fn create_user_fails_with_existing_email() {
        let state = get_test_state();
        insert_test_user("taken@example.com", &state.db_connection.lock().unwrap());

        let response = register(
            state,
            register_form("taken@example.com", STRONG_PASSWORD, STRONG_PASSWORD),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            error_messages(response).await,
            ["An account with this email already exists"]
        );
    }

    #[tokio::test]
    async fn create_user_fails_with_invalid_email() {
        let response = register(
            get_test_state(),
            register_form("not an email", STRONG_PASSWORD, STRONG_PASSWORD),
        )
        .await;

        assert_eq!(
            error_messages(response).await,
            ["Please enter a valid email address"]
        );
    }

    #[tokio::test]
    async fn create_user_fails_when_password_is_weak() {
        let response = register(
            get_test_state(),
            register_form("test@example.com", "foo", "foo"),
        )
        .await;

        let messages = error_messages(response).await;
        assert_eq!(messages.len(), 1, "want 1 error, got {messages:?}");
        assert!(
            messages[0].to_lowercase().contains("password is too weak"),
            "'{}' does not contain the text 'password is too weak'",
            messages[0]
        );
    }

    #[tokio::test]
    async fn create_user_fails_when_passwords_do_not_match() {
        let response = register(
            get_test_state(),
            register_form(
                "test@example.com",
                STRONG_PASSWORD,
                "thisisadifferentpassword",
            ),
        )
        .await;

        assert_eq!(error_messages(response).await, ["Passwords do not match"]);
    }
}
