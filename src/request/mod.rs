//! Request specification and execution results.

pub mod response;
pub mod spec;

pub use response::ResponseResult;
pub use spec::{
    FORM_CONTENT_TYPE, JSON_CONTENT_TYPE, MARKDOWN_CONTENT_TYPE, RequestBody, RequestSpec,
    RequestSpecBuilder, encode_form,
};
