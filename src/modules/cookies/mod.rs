//! Host-scoped cookie storage.
//!
//! Cookies are captured only from hosts that look like login endpoints and
//! are replayed to every other host. Login and passport hosts never receive
//! stored cookies, so a fresh login always starts from a clean session.

use std::sync::{Arc, RwLock};

use http::HeaderValue;
use reqwest::cookie::CookieStore;
use url::Url;

const LOGIN_MARKER: &str = "login";
const PASSPORT_MARKER: &str = "passport";

/// Name/value pair captured from a `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
}

impl StoredCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parses the leading `name=value` pair of a `Set-Cookie` header,
    /// discarding attributes such as `Path` or `Expires`.
    pub fn parse(header: &str) -> Option<Self> {
        let pair = header.split(';').next()?.trim();
        let (name, value) = pair.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self::new(name, value.trim().trim_matches('"')))
    }
}

/// Cookie jar applying the login/passport scoping rules.
///
/// The stored set is an immutable snapshot swapped under a lock: concurrent
/// writers follow last-write-wins and readers never see a partial update.
#[derive(Debug, Default)]
pub struct ScopedCookieJar {
    cookies: RwLock<Arc<Vec<StoredCookie>>>,
}

impl ScopedCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored set when `host` is a login host; otherwise no-op.
    pub fn on_response(&self, host: &str, cookies: Vec<StoredCookie>) {
        if !host.contains(LOGIN_MARKER) {
            return;
        }
        log::debug!("capturing {} cookie(s) from {}", cookies.len(), host);
        *self.cookies.write().expect("cookie jar lock poisoned") = Arc::new(cookies);
    }

    /// Cookies to attach to a request for `host`.
    pub fn for_request(&self, host: &str) -> Vec<StoredCookie> {
        if host.contains(PASSPORT_MARKER) || host.contains(LOGIN_MARKER) {
            return Vec::new();
        }
        self.snapshot().as_ref().clone()
    }

    pub fn clear(&self) {
        *self.cookies.write().expect("cookie jar lock poisoned") = Arc::new(Vec::new());
    }

    /// Current stored set, regardless of host scoping.
    pub fn snapshot(&self) -> Arc<Vec<StoredCookie>> {
        self.cookies.read().expect("cookie jar lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

impl CookieStore for ScopedCookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let cookies: Vec<StoredCookie> = cookie_headers
            .filter_map(|value| value.to_str().ok())
            .filter_map(StoredCookie::parse)
            .collect();
        if cookies.is_empty() {
            return;
        }
        self.on_response(url.host_str().unwrap_or_default(), cookies);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let cookies = self.for_request(url.host_str().unwrap_or_default());
        if cookies.is_empty() {
            return None;
        }
        let header = cookies
            .iter()
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&header).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(value: &str) -> Vec<StoredCookie> {
        vec![StoredCookie::new("hf_skey", value), StoredCookie::new("uid", "42")]
    }

    #[test]
    fn non_login_hosts_leave_state_unchanged() {
        let jar = ScopedCookieJar::new();
        jar.on_response("login.example.com", session("first"));
        for host in ["api.example.com", "passport.example.com", "127.0.0.1", ""] {
            jar.on_response(host, vec![StoredCookie::new("other", "x")]);
        }
        assert_eq!(jar.snapshot().as_ref(), &session("first"));
    }

    #[test]
    fn login_hosts_replace_instead_of_merge() {
        let jar = ScopedCookieJar::new();
        jar.on_response("login.example.com", session("first"));
        jar.on_response("mylogin.host", vec![StoredCookie::new("token", "t2")]);
        assert_eq!(jar.snapshot().as_ref(), &vec![StoredCookie::new("token", "t2")]);
    }

    #[test]
    fn passport_and_login_hosts_never_receive_cookies() {
        let jar = ScopedCookieJar::new();
        jar.on_response("login.example.com", session("first"));
        for host in ["passport.example.com", "login.example.com", "api-login.io"] {
            assert!(jar.for_request(host).is_empty(), "{host} received cookies");
        }
        assert_eq!(jar.for_request("game.example.com"), session("first"));
    }

    #[test]
    fn clear_empties_every_host() {
        let jar = ScopedCookieJar::new();
        jar.on_response("login.example.com", session("first"));
        jar.clear();
        assert!(jar.is_empty());
        for host in ["game.example.com", "login.example.com", "passport.example.com"] {
            assert!(jar.for_request(host).is_empty());
        }
    }

    #[test]
    fn parses_set_cookie_headers() {
        assert_eq!(
            StoredCookie::parse("sid=abc123; Path=/; HttpOnly"),
            Some(StoredCookie::new("sid", "abc123"))
        );
        assert_eq!(StoredCookie::parse("empty="), Some(StoredCookie::new("empty", "")));
        assert_eq!(StoredCookie::parse("=orphan"), None);
        assert_eq!(StoredCookie::parse("novalue"), None);
    }

    #[test]
    fn cookie_store_applies_scoping() {
        let jar = ScopedCookieJar::new();
        let login = Url::parse("https://login.example.com/auth").unwrap();
        let game = Url::parse("https://game.example.com/api").unwrap();
        let headers = [
            HeaderValue::from_static("sid=abc; Path=/"),
            HeaderValue::from_static("uid=7"),
        ];

        jar.set_cookies(&mut headers.iter(), &game);
        assert!(jar.is_empty());

        jar.set_cookies(&mut headers.iter(), &login);
        assert_eq!(jar.len(), 2);
        assert!(jar.cookies(&login).is_none());
        assert_eq!(
            jar.cookies(&game).unwrap().to_str().unwrap(),
            "sid=abc; uid=7"
        );
    }

    #[test]
    fn concurrent_writers_keep_a_whole_snapshot() {
        let jar = Arc::new(ScopedCookieJar::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let jar = jar.clone();
                std::thread::spawn(move || {
                    jar.on_response("login.example.com", session(&i.to_string()));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let snapshot = jar.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[1], StoredCookie::new("uid", "42"));
    }
}
