//! Log shims over the optional `log` feature.
//!
//! Call sites keep their format strings either way; with the feature off
//! the macros expand to an empty block. Only the levels the engine
//! actually emits are provided.
#![allow(unused, reason = "logger")]

macro_rules! info {
    ($($tt:tt)*) => {{
        #[cfg(feature = "log")]
        ::log::info!($($tt)*);
    }};
}

macro_rules! debug {
    ($($tt:tt)*) => {{
        #[cfg(feature = "log")]
        ::log::debug!($($tt)*);
    }};
}

macro_rules! warning {
    ($($tt:tt)*) => {{
        #[cfg(feature = "log")]
        ::log::warn!($($tt)*);
    }};
}

pub(crate) use {debug, info, warning};
