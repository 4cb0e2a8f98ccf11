//! Outcome of executing a [`crate::RequestSpec`].

use bytes::Bytes;
use http::HeaderMap;
use serde::de::DeserializeOwned;
use url::Url;

use crate::modules::codec::{DecompressionMode, decode_text};
use crate::requests::{RequestsError, RequestsResult};
use crate::transport::WireResponse;

/// Result handed back by every execution, success or not.
///
/// `status` is `None` when no response was received at all. On transport
/// failures `text` carries the error message; on decode failures the status
/// and raw bytes are kept and `text` is `None`.
#[derive(Debug)]
pub struct ResponseResult {
    status: Option<u16>,
    url: Option<Url>,
    headers: HeaderMap,
    content: Bytes,
    text: Option<String>,
    error: Option<RequestsError>,
}

impl ResponseResult {
    pub(crate) fn from_response(response: WireResponse, mode: DecompressionMode) -> Self {
        let (text, error) = match decode_text(&response.body, mode) {
            Ok(text) => (Some(text), None),
            Err(err) => {
                log::error!("failed to decode body from {}: {}", response.url, err);
                (None, Some(RequestsError::Decode(err)))
            }
        };

        Self {
            status: Some(response.status),
            url: Some(response.url),
            headers: response.headers,
            content: response.body,
            text,
            error,
        }
    }

    pub(crate) fn from_error(error: RequestsError) -> Self {
        let text = match &error {
            RequestsError::Transport(err) => Some(err.to_string()),
            _ => None,
        };

        Self {
            status: None,
            url: None,
            headers: HeaderMap::new(),
            content: Bytes::new(),
            text,
            error: Some(error),
        }
    }

    /// HTTP status, or `None` when the call never got a response.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Raw, undecoded body bytes.
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Final URL after redirects.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn error(&self) -> Option<&RequestsError> {
        self.error.as_ref()
    }

    /// `true` when a response was received and decoded. Says nothing about
    /// the HTTP status: a 404 is still `is_ok()`.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_success_status(&self) -> bool {
        self.status.is_some_and(|status| (200..300).contains(&status))
    }

    /// Deserialises the decoded text as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> RequestsResult<T> {
        if let Some(error) = &self.error {
            return Err(RequestsError::Failed(error.to_string()));
        }
        let text = self.text.as_deref().unwrap_or_default();
        Ok(serde_json::from_str(text)?)
    }

    /// Converts a failed result into its error.
    pub fn into_result(mut self) -> RequestsResult<Self> {
        match self.error.take() {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::codec::DecodeError;
    use crate::transport::TransportError;

    fn wire(status: u16, body: &'static [u8]) -> WireResponse {
        WireResponse {
            status,
            headers: HeaderMap::new(),
            body: Bytes::from_static(body),
            url: Url::parse("https://example.com/data").unwrap(),
        }
    }

    #[test]
    fn plain_body_becomes_text() {
        let result = ResponseResult::from_response(wire(404, b"not here"), DecompressionMode::None);
        assert!(result.is_ok());
        assert!(!result.is_success_status());
        assert_eq!(result.status(), Some(404));
        assert_eq!(result.text(), Some("not here"));
        assert_eq!(result.content().as_ref(), b"not here");
    }

    #[test]
    fn decode_failure_keeps_status_and_bytes() {
        let result = ResponseResult::from_response(wire(200, b"plain"), DecompressionMode::Zlib);
        assert!(!result.is_ok());
        assert_eq!(result.status(), Some(200));
        assert_eq!(result.text(), None);
        assert_eq!(result.content().as_ref(), b"plain");
        assert!(matches!(
            result.error(),
            Some(RequestsError::Decode(DecodeError::Zlib(_)))
        ));
    }

    #[test]
    fn transport_failure_records_message_as_text() {
        let error = TransportError::Connect("connection refused".into());
        let result = ResponseResult::from_error(error.clone().into());
        assert_eq!(result.status(), None);
        assert_eq!(result.text(), Some(error.to_string().as_str()));
        assert!(result.into_result().is_err());
    }

    #[test]
    fn json_reads_decoded_text() {
        #[derive(serde::Deserialize)]
        struct Payload {
            ok: bool,
        }

        let result =
            ResponseResult::from_response(wire(200, br#"{"ok":true}"#), DecompressionMode::None);
        assert!(result.json::<Payload>().unwrap().ok);

        let failed = ResponseResult::from_error(RequestsError::MissingUrl);
        assert!(matches!(failed.json::<Payload>(), Err(RequestsError::Failed(_))));
    }
}
