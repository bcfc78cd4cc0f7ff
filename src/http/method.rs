/// HTTP Method.
///
/// Follows [RFC9110] plus the PATCH method from [RFC5789]. Arbitrary methods
/// are not supported.
///
/// [RFC5789]: https://www.rfc-editor.org/rfc/rfc5789
/// [RFC9110]: <https://www.rfc-editor.org/rfc/rfc9110.html#name-methods>
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Method(Inner);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
enum Inner {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

impl Method {
    /// `GET`
    pub const GET: Method = Method(Inner::Get);
    /// `HEAD`
    pub const HEAD: Method = Method(Inner::Head);
    /// `POST`
    pub const POST: Method = Method(Inner::Post);
    /// `PUT`
    pub const PUT: Method = Method(Inner::Put);
    /// `DELETE`
    pub const DELETE: Method = Method(Inner::Delete);
    /// `CONNECT`
    pub const CONNECT: Method = Method(Inner::Connect);
    /// `OPTIONS`
    pub const OPTIONS: Method = Method(Inner::Options);
    /// `TRACE`
    pub const TRACE: Method = Method(Inner::Trace);
    /// `PATCH`
    pub const PATCH: Method = Method(Inner::Patch);

    /// Parse method from bytes.
    pub const fn from_bytes(bytes: &[u8]) -> Option<Method> {
        match bytes {
            b"GET" => Some(Self::GET),
            b"HEAD" => Some(Self::HEAD),
            b"POST" => Some(Self::POST),
            b"PUT" => Some(Self::PUT),
            b"DELETE" => Some(Self::DELETE),
            b"CONNECT" => Some(Self::CONNECT),
            b"OPTIONS" => Some(Self::OPTIONS),
            b"TRACE" => Some(Self::TRACE),
            b"PATCH" => Some(Self::PATCH),
            _ => None,
        }
    }

    /// Returns string representation of the method, e.g: `GET`.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self.0 {
            Inner::Get => "GET",
            Inner::Head => "HEAD",
            Inner::Post => "POST",
            Inner::Put => "PUT",
            Inner::Delete => "DELETE",
            Inner::Connect => "CONNECT",
            Inner::Options => "OPTIONS",
            Inner::Trace => "TRACE",
            Inner::Patch => "PATCH",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
