//! Category editing page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
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
        Category, CategoryId, CategoryName, ThumbnailUrl,
        domain::CategoryFormData,
        form::{CategoryFormAction, category_form},
        get_category, update_category,
    },
    endpoints,
    form::FieldErrors,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
};

/// The state needed for the edit category page and endpoint.
#[derive(Debug, Clone)]
pub struct EditCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the category editing page.
///
/// Responds with 404 if the category does not exist or belongs to another user.
pub async fn get_edit_category_page(
    user_id: UserID,
    Path(category_id): Path<CategoryId>,
    State(state): State<EditCategoryState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = get_category(user_id, category_id, &connection).inspect_err(|error| {
        if *error != Error::NotFound {
            tracing::error!("Failed to retrieve category {category_id}: {error}");
        }
    })?;

    Ok(edit_category_view(&category).into_response())
}

/// Handle category update form submission.
pub async fn update_category_endpoint(
    user_id: UserID,
    Path(category_id): Path<CategoryId>,
    State(state): State<EditCategoryState>,
    Form(form): Form<CategoryFormData>,
) -> Response {
    let update_endpoint = endpoints::format_endpoint(endpoints::CATEGORY, category_id);

    let mut errors = FieldErrors::default();
    let name = errors.check("name", CategoryName::new(&form.name));
    let thumbnail_url = errors.check(
        "thumbnail_url",
        ThumbnailUrl::parse_optional(&form.thumbnail_url),
    );

    let (Some(name), Some(thumbnail_url)) = (name, thumbnail_url) else {
        return category_form(
            CategoryFormAction::Update {
                endpoint: &update_endpoint,
            },
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

    match update_category(user_id, category_id, name, thumbnail_url, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::UpdateMissingCategory) => Error::UpdateMissingCategory.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_category_view(category: &Category) -> Markup {
    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id);
    let update_endpoint = endpoints::format_endpoint(endpoints::CATEGORY, category.id);
    let nav_bar = NavBar::new(&edit_endpoint).into_html();
    let thumbnail_url = category
        .thumbnail_url
        .as_ref()
        .map(ThumbnailUrl::as_str)
        .unwrap_or_default();
    let form = category_form(
        CategoryFormAction::Update {
            endpoint: &update_endpoint,
        },
        category.name.as_ref(),
        thumbnail_url,
        &FieldErrors::default(),
    );

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit Category" }
            (form)
        }
    };

    base("Edit Category", &[], &content)
}


#[cfg(test)]
mod update_category_endpoint_tests {
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use axum_extra::extract::Form;

    use crate::{
        category::{
            CategoryName, create_category, domain::CategoryFormData, edit::EditCategoryState,
            get_category, update_category_endpoint,
        },
        endpoints,
        test_utils::{
            assert_form_error_message, assert_hx_redirect, get_test_connection,
            insert_test_user, must_get_form, parse_html_fragment, shared,
        },
    };

    #[tokio::test]
    async fn can_update_category() {
        let connection = get_test_connection();
        let user_id = insert_test_user("test@example.com", &connection);
        let category =
            create_category(user_id, CategoryName::new_unchecked("Coffee"), None, &connection)
                .unwrap();
        let state = EditCategoryState {
            db_connection: shared(connection),
        };
        let form = CategoryFormData {
            name: "Tea".to_owned(),
            thumbnail_url: "".to_owned(),
        };

        let response =
            update_category_endpoint(user_id, Path(category.id), State(state.clone()), Form(form))
                .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::CATEGORIES_VIEW);
        let updated = get_category(user_id, category.id, &state.db_connection.lock().unwrap())
            .unwrap();
        assert_eq!(updated.name, CategoryName::new_unchecked("Tea"));
    }

    #[tokio::test]
    async fn update_shows_validation_error() {
        let connection = get_test_connection();
        let user_id = insert_test_user("test@example.com", &connection);
        let state = EditCategoryState {
            db_connection: shared(connection),
        };
        let form = CategoryFormData {
            name: " ".to_owned(),
            thumbnail_url: "".to_owned(),
        };

        let response = update_category_endpoint(user_id, Path(1), State(state), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_form_error_message(&must_get_form(&html), "Category name is required");
    }

    #[tokio::test]
    async fn update_missing_category_returns_not_found() {
        let connection = get_test_connection();
        let user_id = insert_test_user("test@example.com", &connection);
        let state = EditCategoryState {
            db_connection: shared(connection),
        };
        let form = CategoryFormData {
            name: "Tea".to_owned(),
            thumbnail_url: "".to_owned(),
        };

        let response = update_category_endpoint(user_id, Path(42), State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
