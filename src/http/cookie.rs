use std::fmt::Write;
use std::time::{Duration, SystemTime};

/// An HTTP cookie.
///
/// Parsed from a request `Cookie` header, or built by the application and
/// rendered into a response `Set-Cookie` header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
    path: Option<String>,
    domain: Option<String>,
    max_age: Option<Duration>,
    http_only: bool,
}

impl Cookie {
    /// Create a new cookie with the given name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Cookie {
        Cookie {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            max_age: None,
            http_only: false,
        }
    }

    /// Returns the cookie name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the cookie value.
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Set the `Path` attribute.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = Some(path.into());
    }

    /// Set the `Domain` attribute.
    pub fn set_domain(&mut self, domain: impl Into<String>) {
        self.domain = Some(domain.into());
    }

    /// Set the cookie lifetime, rendered as an `Expires` attribute.
    pub fn set_max_age(&mut self, max_age: Duration) {
        self.max_age = Some(max_age);
    }

    /// Set the `HttpOnly` attribute.
    pub fn set_http_only(&mut self, http_only: bool) {
        self.http_only = http_only;
    }

    /// Parse a request `Cookie` header value into cookies.
    ///
    /// Malformed pairs without `=` are skipped.
    pub fn parse_header(header: &str) -> Vec<Cookie> {
        let mut cookies = Vec::new();
        for pair in header.split(';') {
            let pair = pair.trim();
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            cookies.push(Cookie::new(name, value.trim_matches('"')));
        }
        cookies
    }

    /// Render the cookie as a `Set-Cookie` header value.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.name.len() + self.value.len() + 16);
        out.push_str(&self.name);
        out.push('=');
        out.push_str(&self.value);
        if let Some(path) = &self.path {
            out.push_str("; path=");
            out.push_str(path);
        }
        if let Some(domain) = &self.domain {
            out.push_str("; domain=");
            out.push_str(domain);
        }
        if let Some(max_age) = self.max_age {
            let expires = SystemTime::now() + max_age;
            let _ = write!(out, "; expires={}", httpdate::fmt_http_date(expires));
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        out
    }
}
