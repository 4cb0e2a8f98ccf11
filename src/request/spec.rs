//! Immutable request descriptions and their fluent builder.

use std::collections::HashMap;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use url::Url;
use url::form_urlencoded;

use crate::modules::codec::DecompressionMode;
use crate::requests::{RequestsError, RequestsResult};
use crate::transport::WireRequest;

pub const MARKDOWN_CONTENT_TYPE: &str = "text/x-markdown; charset=utf-8";
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Body attached to a request. POST specs always carry a non-empty variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    Raw { content_type: String, bytes: Bytes },
    Form(HashMap<String, String>),
    Json(Bytes),
}

impl RequestBody {
    pub fn content_type(&self) -> Option<&str> {
        match self {
            RequestBody::Empty => None,
            RequestBody::Raw { content_type, .. } => Some(content_type),
            RequestBody::Form(_) => Some(FORM_CONTENT_TYPE),
            RequestBody::Json(_) => Some(JSON_CONTENT_TYPE),
        }
    }

    /// Encoded payload, or `None` for [`RequestBody::Empty`].
    pub fn encode(&self) -> Option<Bytes> {
        match self {
            RequestBody::Empty => None,
            RequestBody::Raw { bytes, .. } | RequestBody::Json(bytes) => Some(bytes.clone()),
            RequestBody::Form(fields) => Some(Bytes::from(encode_form(fields))),
        }
    }
}

/// `application/x-www-form-urlencoded` encoding of every field, each key once.
pub fn encode_form(fields: &HashMap<String, String>) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields.iter())
        .finish()
}

/// Validated, single-use description of one HTTP call.
///
/// Not `Clone`: a spec is consumed by exactly one execution.
#[derive(Debug)]
pub struct RequestSpec {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: RequestBody,
    decompression: DecompressionMode,
}

impl RequestSpec {
    pub fn builder() -> RequestSpecBuilder {
        RequestSpecBuilder::new()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn decompression(&self) -> DecompressionMode {
        self.decompression
    }

    /// Assembles the wire request: method and body first, then the caller's
    /// headers, which replace the body's default `Content-Type`.
    pub fn into_wire(self) -> (WireRequest, DecompressionMode) {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = self
            .body
            .content_type()
            .and_then(|value| HeaderValue::from_str(value).ok())
        {
            headers.insert(CONTENT_TYPE, content_type);
        }
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }

        let request = WireRequest::new(self.method, self.url)
            .with_headers(headers)
            .with_body(self.body.encode());
        (request, self.decompression)
    }
}

/// Fluent builder for [`RequestSpec`]. Defaults to a GET without headers;
/// any body method switches the request to POST.
#[derive(Debug, Clone, Default)]
pub struct RequestSpecBuilder {
    url: Option<String>,
    headers: Vec<(String, String)>,
    body: Option<RequestBody>,
    decompression: DecompressionMode,
}

impl RequestSpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Switches back to GET, dropping any body set so far.
    pub fn get(mut self) -> Self {
        self.body = None;
        self
    }

    /// POST a plain string sent as `text/x-markdown`.
    pub fn post(self, data: impl Into<String>) -> Self {
        let content_type = MARKDOWN_CONTENT_TYPE.to_string();
        self.raw(content_type, data.into())
    }

    /// POST arbitrary bytes with an explicit content type.
    pub fn raw(mut self, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.body = Some(RequestBody::Raw {
            content_type: content_type.into(),
            bytes: data.into(),
        });
        self
    }

    /// POST an already serialised JSON document.
    pub fn json(mut self, data: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Json(Bytes::from(data.into())));
        self
    }

    /// POST a value serialised with `serde_json`.
    pub fn json_value<T: Serialize + ?Sized>(self, value: &T) -> RequestsResult<Self> {
        let data = serde_json::to_string(value)?;
        Ok(self.json(data))
    }

    /// POST URL-form-encoded fields.
    pub fn form<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.body = Some(RequestBody::Form(
            fields
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        ));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Inflate the response as zlib. Replaces a previous `gzip()` call.
    pub fn zlib(mut self) -> Self {
        self.decompression = DecompressionMode::Zlib;
        self
    }

    /// Inflate the response as gzip. Replaces a previous `zlib()` call.
    pub fn gzip(mut self) -> Self {
        self.decompression = DecompressionMode::Gzip;
        self
    }

    pub fn build(self) -> RequestsResult<RequestSpec> {
        let raw_url = self.url.ok_or(RequestsError::MissingUrl)?;
        let url = Url::parse(&raw_url)?;

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| RequestsError::InvalidHeader(name.clone()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| RequestsError::InvalidHeader(name.clone()))?;
            headers.insert(header_name, header_value);
        }

        let (method, body) = match self.body {
            Some(body) => (Method::POST, body),
            None => (Method::GET, RequestBody::Empty),
        };

        Ok(RequestSpec {
            method,
            url,
            headers,
            body,
            decompression: self.decompression,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_form(body: &[u8]) -> HashMap<String, String> {
        form_urlencoded::parse(body).into_owned().collect()
    }

    #[test]
    fn defaults_to_get_without_body() {
        let spec = RequestSpec::builder().url("https://example.com/a").build().unwrap();
        assert_eq!(spec.method(), Method::GET);
        assert_eq!(spec.body(), &RequestBody::Empty);
        assert_eq!(spec.decompression(), DecompressionMode::None);

        let (wire, _) = spec.into_wire();
        assert!(wire.body.is_none());
        assert!(wire.headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn missing_url_is_rejected() {
        let err = RequestSpec::builder().get().build().unwrap_err();
        assert!(matches!(err, RequestsError::MissingUrl));
    }

    #[test]
    fn invalid_url_and_headers_are_rejected() {
        let err = RequestSpec::builder().url("not a url").build().unwrap_err();
        assert!(matches!(err, RequestsError::InvalidUrl(_)));

        let err = RequestSpec::builder()
            .url("https://example.com")
            .header("bad\nname", "x")
            .build()
            .unwrap_err();
        assert!(matches!(err, RequestsError::InvalidHeader(name) if name == "bad\nname"));
    }

    #[test]
    fn string_post_uses_markdown_content_type() {
        let (wire, _) = RequestSpec::builder()
            .url("https://example.com/api")
            .post("hello")
            .build()
            .unwrap()
            .into_wire();
        assert_eq!(wire.method, Method::POST);
        assert_eq!(wire.headers[CONTENT_TYPE], MARKDOWN_CONTENT_TYPE);
        assert_eq!(wire.body.as_deref(), Some(&b"hello"[..]));
    }

    #[test]
    fn json_post_uses_json_content_type() {
        #[derive(Serialize)]
        struct Login<'a> {
            user: &'a str,
        }

        let (wire, _) = RequestSpec::builder()
            .url("https://example.com/api")
            .json_value(&Login { user: "admiral" })
            .unwrap()
            .build()
            .unwrap()
            .into_wire();
        assert_eq!(wire.headers[CONTENT_TYPE], JSON_CONTENT_TYPE);
        assert_eq!(wire.body.as_deref(), Some(&br#"{"user":"admiral"}"#[..]));
    }

    #[test]
    fn form_post_encodes_every_field_once() {
        let (wire, _) = RequestSpec::builder()
            .url("https://example.com/api")
            .form([("a", "1"), ("b", "2"), ("name", "第一 & co")])
            .build()
            .unwrap()
            .into_wire();
        assert_eq!(wire.headers[CONTENT_TYPE], FORM_CONTENT_TYPE);

        let body = wire.body.unwrap();
        let fields = parse_form(&body);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["a"], "1");
        assert_eq!(fields["b"], "2");
        assert_eq!(fields["name"], "第一 & co");
        assert_eq!(body.iter().filter(|b| **b == b'&').count(), 2);
    }

    #[test]
    fn caller_content_type_replaces_body_default() {
        let (wire, _) = RequestSpec::builder()
            .url("https://example.com/api")
            .json("{}")
            .header("Content-Type", "application/vnd.custom+json")
            .build()
            .unwrap()
            .into_wire();
        let values: Vec<_> = wire.headers.get_all(CONTENT_TYPE).iter().collect();
        assert_eq!(values, vec!["application/vnd.custom+json"]);
    }

    #[test]
    fn repeated_header_keys_keep_the_last_value() {
        let spec = RequestSpec::builder()
            .url("https://example.com")
            .header("X-Token", "old")
            .headers([("X-Token", "new"), ("X-Other", "1")])
            .build()
            .unwrap();
        assert_eq!(spec.headers()["x-token"], "new");
        assert_eq!(spec.headers().len(), 2);
    }

    #[test]
    fn last_decompression_call_wins() {
        let spec = RequestSpec::builder()
            .url("https://example.com")
            .zlib()
            .gzip()
            .build()
            .unwrap();
        assert_eq!(spec.decompression(), DecompressionMode::Gzip);

        let spec = RequestSpec::builder()
            .url("https://example.com")
            .gzip()
            .zlib()
            .build()
            .unwrap();
        assert_eq!(spec.decompression(), DecompressionMode::Zlib);
    }

    #[test]
    fn get_after_post_drops_the_body() {
        let spec = RequestSpec::builder()
            .url("https://example.com")
            .post("payload")
            .get()
            .build()
            .unwrap();
        assert_eq!(spec.method(), Method::GET);
        assert_eq!(spec.body(), &RequestBody::Empty);
    }
}
