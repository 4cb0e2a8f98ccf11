//! Default header injection.

use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue};

use super::{Interceptor, Next};
use crate::transport::{TransportError, WireRequest, WireResponse};

/// Adds a fixed set of headers to every request.
///
/// Headers the caller already set win: a default is only inserted when the
/// request carries no header of that name.
#[derive(Debug, Clone, Default)]
pub struct HeaderInjection {
    defaults: HeaderMap,
}

impl HeaderInjection {
    pub fn new(defaults: HeaderMap) -> Self {
        Self { defaults }
    }

    /// Builds the injector from name/value pairs, rejecting invalid headers.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut defaults = HeaderMap::new();
        for (name, value) in pairs {
            let name = name.as_ref();
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|_| name.to_string())?;
            let header_value =
                HeaderValue::from_str(value.as_ref()).map_err(|_| name.to_string())?;
            defaults.insert(header_name, header_value);
        }
        Ok(Self { defaults })
    }

    pub fn defaults(&self) -> &HeaderMap {
        &self.defaults
    }

    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.defaults {
            if !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }
    }
}

#[async_trait]
impl Interceptor for HeaderInjection {
    async fn intercept(
        &self,
        mut request: WireRequest,
        next: Next<'_>,
    ) -> Result<WireResponse, TransportError> {
        self.apply(&mut request.headers);
        next.run(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::InterceptorChain;
    use super::super::test_support::*;
    use super::*;
    use std::sync::Arc;

    fn injector() -> HeaderInjection {
        HeaderInjection::from_pairs([("User-Agent", "requests-rs/test"), ("Accept", "*/*")]).unwrap()
    }

    #[tokio::test]
    async fn adds_defaults_to_every_request() {
        let chain = InterceptorChain::new().with(Arc::new(injector()));
        let transport = ScriptedTransport::new(vec![Ok(200), Ok(200)]);

        chain.execute(&transport, request("https://a.example.com/")).await.unwrap();
        chain.execute(&transport, request("https://b.example.com/")).await.unwrap();

        for seen in transport.seen.lock().unwrap().iter() {
            assert_eq!(seen.headers["user-agent"], "requests-rs/test");
            assert_eq!(seen.headers["accept"], "*/*");
        }
    }

    #[tokio::test]
    async fn caller_headers_take_precedence() {
        let chain = InterceptorChain::new().with(Arc::new(injector()));
        let transport = ScriptedTransport::new(vec![Ok(200)]);
        let mut req = request("https://example.com/");
        req.headers
            .insert("user-agent", HeaderValue::from_static("custom-agent"));

        chain.execute(&transport, req).await.unwrap();

        let seen = transport.seen.lock().unwrap();
        let agents: Vec<_> = seen[0].headers.get_all("user-agent").iter().collect();
        assert_eq!(agents, vec!["custom-agent"]);
        assert_eq!(seen[0].headers["accept"], "*/*");
    }

    #[test]
    fn rejects_invalid_header_names() {
        let err = HeaderInjection::from_pairs([("bad header", "x")]).unwrap_err();
        assert_eq!(err, "bad header");
    }
}
