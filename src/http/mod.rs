//! HTTP protocol scalars.
mod method;
mod status;
mod version;
mod cookie;

pub use method::Method;
pub use status::StatusCode;
pub use version::Version;
pub use cookie::Cookie;
