#![allow(missing_docs)]

pub(crate) mod db;
pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;

pub(crate) use db::{get_test_connection, insert_test_user, shared};
pub(crate) use form::{
    assert_form_error_message, assert_form_input, assert_form_input_with_value,
    assert_form_submit_button_with_text, assert_hx_endpoint,
    assert_select_has_selected_option, must_get_form,
};
pub(crate) use html::{
    assert_valid_html, element_texts, parse_html_document, parse_html_fragment,
};
pub(crate) use http::{
    assert_content_type, assert_hx_redirect, assert_status_ok, get_body_text, get_header,
};
