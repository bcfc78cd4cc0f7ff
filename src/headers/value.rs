use bytes::Bytes;

/// HTTP header field value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HeaderValue {
    value: Bytes,
}

impl HeaderValue {
    /// Create [`HeaderValue`] from a static string.
    #[inline]
    pub const fn from_static(value: &'static str) -> HeaderValue {
        HeaderValue { value: Bytes::from_static(value.as_bytes()) }
    }

    /// Create [`HeaderValue`] from [`String`].
    #[inline]
    pub fn from_string(value: String) -> HeaderValue {
        HeaderValue { value: Bytes::from(value.into_bytes()) }
    }

    /// Create [`HeaderValue`] by copying a byte slice.
    #[inline]
    pub fn copy_from_slice(value: &[u8]) -> HeaderValue {
        HeaderValue { value: Bytes::copy_from_slice(value) }
    }

    /// Returns the value as bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.value
    }

    /// Try to convert the value into a string slice.
    ///
    /// Returns `None` if the value is not valid UTF-8.
    #[inline]
    pub fn try_as_str(&self) -> Option<&str> {
        str::from_utf8(&self.value).ok()
    }
}

impl PartialEq<str> for HeaderValue {
    fn eq(&self, other: &str) -> bool {
        self.value == other.as_bytes()
    }
}

impl PartialEq<&str> for HeaderValue {
    fn eq(&self, other: &&str) -> bool {
        self.value == other.as_bytes()
    }
}

impl From<&'static str> for HeaderValue {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        Self::from_string(value)
    }
}

impl std::fmt::Debug for HeaderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.try_as_str() {
            Some(value) => write!(f, "{value:?}"),
            None => write!(f, "{:?}", self.value),
        }
    }
}
