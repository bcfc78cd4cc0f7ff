use std::num::NonZeroU16;

/// HTTP Status Code.
///
/// [RFC9110]: <https://www.rfc-editor.org/rfc/rfc9110.html#name-status-codes>
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(NonZeroU16);

macro_rules! status {
    ($($(#[$doc:meta])* ($name:ident, $code:literal, $reason:literal),)*) => {
        impl StatusCode {
            $(
                $(#[$doc])*
                pub const $name: StatusCode = StatusCode(NonZeroU16::new($code).unwrap());
            )*

            /// Returns the reason phrase, e.g: `Not Found`.
            ///
            /// Unregistered codes yield `"Unknown Status"`.
            pub const fn reason(&self) -> &'static str {
                match self.0.get() {
                    $($code => $reason,)*
                    _ => "Unknown Status",
                }
            }
        }
    };
}

status! {
    /// `100 Continue`
    (CONTINUE, 100, "Continue"),
    /// `200 OK`
    (OK, 200, "OK"),
    /// `201 Created`
    (CREATED, 201, "Created"),
    /// `204 No Content`
    (NO_CONTENT, 204, "No Content"),
    /// `302 Found`
    (FOUND, 302, "Found"),
    /// `304 Not Modified`
    (NOT_MODIFIED, 304, "Not Modified"),
    /// `400 Bad Request`
    (BAD_REQUEST, 400, "Bad Request"),
    /// `403 Forbidden`
    (FORBIDDEN, 403, "Forbidden"),
    /// `404 Not Found`
    (NOT_FOUND, 404, "Not Found"),
    /// `405 Method Not Allowed`
    (METHOD_NOT_ALLOWED, 405, "Method Not Allowed"),
    /// `408 Request Timeout`
    (REQUEST_TIMEOUT, 408, "Request Timeout"),
    /// `411 Length Required`
    (LENGTH_REQUIRED, 411, "Length Required"),
    /// `413 Content Too Large`
    (PAYLOAD_TOO_LARGE, 413, "Content Too Large"),
    /// `431 Request Header Fields Too Large`
    (HEADER_FIELDS_TOO_LARGE, 431, "Request Header Fields Too Large"),
    /// `500 Internal Server Error`
    (INTERNAL_SERVER_ERROR, 500, "Internal Server Error"),
    /// `501 Not Implemented`
    (NOT_IMPLEMENTED, 501, "Not Implemented"),
    /// `503 Service Unavailable`
    (SERVICE_UNAVAILABLE, 503, "Service Unavailable"),
}

impl StatusCode {
    /// Create [`StatusCode`] from [`u16`].
    ///
    /// Returns `None` if the code is outside of `100..=999`.
    pub const fn from_u16(code: u16) -> Option<StatusCode> {
        if code < 100 || code > 999 {
            return None;
        }
        match NonZeroU16::new(code) {
            Some(ok) => Some(StatusCode(ok)),
            None => None,
        }
    }

    /// Returns the status code as [`u16`].
    #[inline]
    pub const fn status(&self) -> u16 {
        self.0.get()
    }

    /// Returns `true` for an informational `1xx` code.
    #[inline]
    pub const fn is_informational(&self) -> bool {
        self.0.get() / 100 == 1
    }

    /// Returns `true` for a redirection `3xx` code.
    #[inline]
    pub const fn is_redirection(&self) -> bool {
        self.0.get() / 100 == 3
    }

    /// Returns `true` if a response with this status carries a body.
    ///
    /// `1xx`, `204` and `304` responses never carry one.
    pub const fn body_allowed(&self) -> bool {
        !self.is_informational() && self.0.get() != 204 && self.0.get() != 304
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        Self::OK
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {}", self.0.get(), self.reason())
    }
}

impl std::fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}
