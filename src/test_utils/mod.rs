#![allow(missing_docs)]

pub(crate) mod form;
pub(crate) mod html;

pub(crate) use form::assert_hx_endpoint;
pub(crate) use html::assert_valid_html;
