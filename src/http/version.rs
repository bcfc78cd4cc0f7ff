/// HTTP Version.
///
/// Only HTTP/1.0 and HTTP/1.1 are supported.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Version(Inner);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
enum Inner {
    Http10,
    #[default]
    Http11,
}

impl Version {
    /// `HTTP/1.0`
    pub const HTTP_10: Version = Version(Inner::Http10);
    /// `HTTP/1.1`
    pub const HTTP_11: Version = Version(Inner::Http11);

    /// Returns string representation of the version, e.g: `HTTP/1.1`.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self.0 {
            Inner::Http10 => "HTTP/1.0",
            Inner::Http11 => "HTTP/1.1",
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Debug for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}
