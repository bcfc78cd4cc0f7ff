/// HTTP header field name.
///
/// Stored lowercase, compared case-insensitively against lookups.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HeaderName {
    repr: Repr,
}

#[derive(Clone, PartialEq, Eq, Hash)]
enum Repr {
    Static(&'static str),
    Owned(Box<str>),
}

macro_rules! known {
    ($($(#[$doc:meta])* ($name:ident, $header:literal),)*) => {
        impl HeaderName {
            $(
                $(#[$doc])*
                pub const $name: HeaderName = HeaderName {
                    repr: Repr::Static($header),
                };
            )*
        }
    };
}

known! {
    /// `connection`
    (CONNECTION, "connection"),
    /// `content-length`
    (CONTENT_LENGTH, "content-length"),
    /// `content-type`
    (CONTENT_TYPE, "content-type"),
    /// `cookie`
    (COOKIE, "cookie"),
    /// `date`
    (DATE, "date"),
    /// `expect`
    (EXPECT, "expect"),
    /// `host`
    (HOST, "host"),
    /// `location`
    (LOCATION, "location"),
    /// `server`
    (SERVER, "server"),
    /// `set-cookie`
    (SET_COOKIE, "set-cookie"),
    /// `transfer-encoding`
    (TRANSFER_ENCODING, "transfer-encoding"),
}

impl HeaderName {
    /// Create [`HeaderName`] from a static string.
    ///
    /// # Panics
    ///
    /// Panics if the string contains uppercase characters.
    pub const fn from_static(name: &'static str) -> HeaderName {
        let bytes = name.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            assert!(!bytes[i].is_ascii_uppercase(), "header name must be lowercase");
            i += 1;
        }
        HeaderName { repr: Repr::Static(name) }
    }

    /// Create [`HeaderName`] from a string, lowercasing as needed.
    pub fn from_string(name: impl AsRef<str>) -> HeaderName {
        let name = name.as_ref();
        HeaderName {
            repr: Repr::Owned(name.to_ascii_lowercase().into()),
        }
    }

    /// Returns the header name as string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        match &self.repr {
            Repr::Static(name) => name,
            Repr::Owned(name) => name,
        }
    }
}

impl PartialEq<str> for HeaderName {
    fn eq(&self, other: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(other)
    }
}

impl PartialEq<&str> for HeaderName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str().eq_ignore_ascii_case(other)
    }
}

impl From<&'static str> for HeaderName {
    fn from(name: &'static str) -> Self {
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            Self::from_string(name)
        } else {
            HeaderName { repr: Repr::Static(name) }
        }
    }
}

impl From<String> for HeaderName {
    fn from(name: String) -> Self {
        Self::from_string(name)
    }
}

impl std::fmt::Display for HeaderName {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Debug for HeaderName {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}
