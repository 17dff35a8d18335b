//! The form fields shared by the new and edit category pages.

use maud::{Markup, html};

use crate::{
    endpoints,
    form::FieldErrors,
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, form_error},
};

/// The element ID of the thumbnail field, swapped after an upload.
pub const THUMBNAIL_FIELD_ID: &str = "thumbnail-field";

const REMOVE_THUMBNAIL_SCRIPT: &str = "const field = this.closest('#thumbnail-field'); \
    const input = field.querySelector('input[name=thumbnail_url]'); \
    input.type = 'text'; \
    input.value = ''; \
    field.querySelector('img')?.remove(); \
    this.remove();";

/// Which request the category form sends.
pub enum CategoryFormAction<'a> {
    Create,
    Update { endpoint: &'a str },
}

/// A category form pre-filled with `name` and `thumbnail_url`.
pub fn category_form(
    action: CategoryFormAction<'_>,
    name: &str,
    thumbnail_url: &str,
    errors: &FieldErrors,
) -> Markup {
    let (submit_text, create_endpoint, update_endpoint) = match action {
        CategoryFormAction::Create => ("Create Category", Some(endpoints::CATEGORIES_API), None),
        CategoryFormAction::Update { endpoint } => ("Save Changes", None, Some(endpoint)),
    };

    html! {
        form
            hx-post=[create_endpoint]
            hx-put=[update_endpoint]
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label
                    for="name"
                    class=(FORM_LABEL_STYLE)
                {
                    "Name"
                }

                input
                    id="name"
                    type="text"
                    name="name"
                    value=(name)
                    placeholder="Category Name"
                    maxlength="100"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);

                (form_error(errors.get("name")))
            }

            (thumbnail_field(thumbnail_url, errors.get("thumbnail_url")))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}

/// The thumbnail input with an upload button and, when set, a preview.
///
/// An uploaded or existing thumbnail is kept in a hidden input until the
/// user removes it, otherwise the user may paste the URL of an image.
pub fn thumbnail_field(thumbnail_url: &str, error_message: Option<&str>) -> Markup {
    let has_thumbnail = !thumbnail_url.is_empty() && error_message.is_none();

    html! {
        div id=(THUMBNAIL_FIELD_ID)
        {
            label
                for="thumbnail_url"
                class=(FORM_LABEL_STYLE)
            {
                "Thumbnail"
            }

            @if has_thumbnail {
                div class="flex items-center gap-4 mb-2"
                {
                    img
                        src=(thumbnail_url)
                        alt="Category thumbnail"
                        class="h-16 w-16 rounded object-cover";

                    button
                        type="button"
                        onclick=(REMOVE_THUMBNAIL_SCRIPT)
                        class="text-sm text-red-600 dark:text-red-500 underline"
                    {
                        "Remove"
                    }
                }
            }

            input
                id="thumbnail_url"
                type=(if has_thumbnail { "hidden" } else { "text" })
                name="thumbnail_url"
                value=(thumbnail_url)
                placeholder="https://example.com/image.png"
                class=(FORM_TEXT_INPUT_STYLE);

            input
                type="file"
                name="thumbnail"
                accept="image/png,image/jpeg,image/gif,image/webp,image/avif"
                aria-label="Upload thumbnail"
                hx-post=(endpoints::CATEGORY_THUMBNAIL)
                hx-encoding="multipart/form-data"
                hx-trigger="change"
                hx-include="this"
                hx-target=(format!("#{THUMBNAIL_FIELD_ID}"))
                hx-swap="outerHTML"
                hx-target-error="#alert-container"
                class="mt-2 block w-full text-sm";

            (form_error(error_message))
        }
    }
}
