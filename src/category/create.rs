//! Category creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID,
    category::{
        CategoryName, ThumbnailUrl, create_category,
        domain::CategoryFormData,
        form::{CategoryFormAction, category_form},
    },
    endpoints,
    form::FieldErrors,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
};

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the category creation page.
pub async fn get_new_category_page() -> Response {
    new_category_view().into_response()
}

/// Handle category creation form submission.
pub async fn create_category_endpoint(
    user_id: UserID,
    State(state): State<CreateCategoryEndpointState>,
    Form(form): Form<CategoryFormData>,
) -> Response {
    let mut errors = FieldErrors::default();
    let name = errors.check("name", CategoryName::new(&form.name));
    let thumbnail_url = errors.check(
        "thumbnail_url",
        ThumbnailUrl::parse_optional(&form.thumbnail_url),
    );

    let (Some(name), Some(thumbnail_url)) = (name, thumbnail_url) else {
        return category_form(
            CategoryFormAction::Create,
            &form.name,
            &form.thumbnail_url,
            &errors,
        )
        .into_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_category(user_id, name, thumbnail_url, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");

            error.into_alert_response()
        }
    }
}

fn new_category_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_CATEGORY_VIEW).into_html();
    let form = category_form(CategoryFormAction::Create, "", "", &FieldErrors::default());

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "New Category" }
            (form)
        }
    };

    base("Create Category", &[], &content)
}
