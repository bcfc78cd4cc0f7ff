//! HTTP header map and its components.
mod name;
mod value;
mod map;

pub use name::HeaderName;
pub use value::HeaderValue;
pub use map::{GetAll, HeaderMap, Iter};

#[cfg(test)]
mod test;
