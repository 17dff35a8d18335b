//! The endpoint for uploading a category thumbnail.

use std::sync::Arc;

use axum::{
    extract::{FromRef, Multipart, State, multipart::Field},
    response::{IntoResponse, Response},
};

use crate::{
    AppState, Error, UserID,
    blob::{BlobStore, image_extension},
    category::form::thumbnail_field,
};

/// The name of the multipart field holding the image.
const THUMBNAIL_FIELD_NAME: &str = "thumbnail";

/// The state needed for uploading a thumbnail.
#[derive(Debug, Clone)]
pub struct ThumbnailUploadState {
    pub blob_store: Arc<dyn BlobStore>,
}

impl FromRef<AppState> for ThumbnailUploadState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            blob_store: state.blob_store.clone(),
        }
    }
}

/// Store an uploaded image and respond with the thumbnail field showing it.
pub async fn upload_thumbnail_endpoint(
    user_id: UserID,
    State(state): State<ThumbnailUploadState>,
    mut multipart: Multipart,
) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(error) => {
                tracing::error!("Could not read multipart form: {error}");
                return Error::MultipartError(error.body_text()).into_alert_response();
            }
        };

        if field.name() != Some(THUMBNAIL_FIELD_NAME) {
            continue;
        }

        let (content_type, bytes) = match read_image(field).await {
            Ok(image) => image,
            Err(error) => return error.into_alert_response(),
        };

        return match state.blob_store.put(user_id, &content_type, &bytes) {
            Ok(url) => thumbnail_field(&url, None).into_response(),
            Err(error) => {
                tracing::error!("Could not store thumbnail: {error}");
                error.into_alert_response()
            }
        };
    }

    Error::NotAnImage.into_alert_response()
}

async fn read_image(field: Field<'_>) -> Result<(String, Vec<u8>), Error> {
    let content_type = match field.content_type() {
        Some(content_type) if image_extension(content_type).is_some() => content_type.to_owned(),
        _ => return Err(Error::NotAnImage),
    };

    let bytes = field.bytes().await.map_err(|error| {
        tracing::error!("Could not read data from multipart form field: {error}");
        Error::MultipartError("Could not read data from multipart form field.".to_owned())
    })?;

    if bytes.is_empty() {
        return Err(Error::NotAnImage);
    }

    tracing::debug!("Received {content_type} thumbnail that is {} bytes", bytes.len());

    Ok((content_type, bytes.to_vec()))
}

#[cfg(test)]
mod upload_thumbnail_endpoint_tests {
    use std::sync::Arc;

    use axum::{
        extract::{FromRequest, Multipart, State},
        http::{Request, StatusCode},
    };
    use scraper::Selector;

    use crate::{
        UserID,
        blob::LocalBlobStore,
        endpoints,
        test_utils::{assert_valid_html, element_texts, parse_html_fragment},
    };

    use super::{ThumbnailUploadState, upload_thumbnail_endpoint};

    fn get_state(name: &str) -> ThumbnailUploadState {
        let root = std::env::temp_dir().join(format!(
            "spendwise-thumbnail-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&root);

        ThumbnailUploadState {
            blob_store: Arc::new(LocalBlobStore::new(root)),
        }
    }

    async fn must_make_multipart(content_type: &str, data: &str) -> Multipart {
        let boundary = "MY_BOUNDARY123456789";
        let body = [
            format!("--{boundary}"),
            "Content-Disposition: form-data; name=\"name\"".to_owned(),
            "".to_owned(),
            "Coffee".to_owned(),
            format!("--{boundary}"),
            "Content-Disposition: form-data; name=\"thumbnail\"; filename=\"coffee.png\"".to_owned(),
            format!("Content-Type: {content_type}"),
            "".to_owned(),
            data.to_owned(),
            format!("--{boundary}--"),
        ]
        .join("\r\n");

        let request = Request::builder()
            .method("POST")
            .uri(endpoints::CATEGORY_THUMBNAIL)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(body.into())
            .unwrap();

        Multipart::from_request(request, &{}).await.unwrap()
    }

    #[tokio::test]
    async fn stores_image_and_returns_preview() {
        let state = get_state("store");
        let user_id = UserID::new(3);

        let response = upload_thumbnail_endpoint(
            user_id,
            State(state),
            must_make_multipart("image/png", "fake png data").await,
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let input = html
            .select(&Selector::parse("input[name=thumbnail_url]").unwrap())
            .next()
            .expect("No thumbnail input");
        assert_eq!(input.value().attr("type"), Some("hidden"));
        let url = input.value().attr("value").unwrap_or_default();
        assert!(url.starts_with("/uploads/3/"), "got {url}");
        assert!(url.ends_with(".png"), "got {url}");
        let preview = html
            .select(&Selector::parse("img").unwrap())
            .next()
            .expect("No preview");
        assert_eq!(preview.value().attr("src"), Some(url));
        assert_eq!(element_texts(&html, "button"), ["Remove"]);
    }

    #[tokio::test]
    async fn rejects_files_that_are_not_images() {
        let state = get_state("reject");

        let response = upload_thumbnail_endpoint(
            UserID::new(3),
            State(state),
            must_make_multipart("text/plain", "hello").await,
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        assert_eq!(element_texts(&html, "p"), ["Please upload an image file"]);
    }

    #[tokio::test]
    async fn rejects_svg_images() {
        let state = get_state("svg");
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" onload="alert(1)"></svg>"#;

        let response = upload_thumbnail_endpoint(
            UserID::new(3),
            State(state),
            must_make_multipart("image/svg+xml", svg).await,
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        assert_eq!(element_texts(&html, "p"), ["Please upload an image file"]);
        assert!(html.select(&Selector::parse("img").unwrap()).next().is_none());
        let root = std::env::temp_dir().join(format!(
            "spendwise-thumbnail-svg-{}",
            std::process::id()
        ));
        assert!(!root.exists(), "SVG should not be written to disk");
    }
}
