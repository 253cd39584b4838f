//! Logging shims.
//!
//! The crate logs through `defmt` or `log` depending on the enabled feature.
//! With neither feature, the macros evaluate their arguments and discard them,
//! so log call sites never produce unused-variable warnings.

#![allow(unused_macros)]

macro_rules! trace {
    ($($x:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::trace!($($x)*);
        #[cfg(all(feature = "log", not(feature = "defmt")))]
        ::log::trace!($($x)*);
        #[cfg(not(any(feature = "defmt", feature = "log")))]
        let _ = ($($x)*);
    }};
}

macro_rules! debug {
    ($($x:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($x)*);
        #[cfg(all(feature = "log", not(feature = "defmt")))]
        ::log::debug!($($x)*);
        #[cfg(not(any(feature = "defmt", feature = "log")))]
        let _ = ($($x)*);
    }};
}

macro_rules! info {
    ($($x:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($($x)*);
        #[cfg(all(feature = "log", not(feature = "defmt")))]
        ::log::info!($($x)*);
        #[cfg(not(any(feature = "defmt", feature = "log")))]
        let _ = ($($x)*);
    }};
}

macro_rules! warn {
    ($($x:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($x)*);
        #[cfg(all(feature = "log", not(feature = "defmt")))]
        ::log::warn!($($x)*);
        #[cfg(not(any(feature = "defmt", feature = "log")))]
        let _ = ($($x)*);
    }};
}

macro_rules! error {
    ($($x:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::error!($($x)*);
        #[cfg(all(feature = "log", not(feature = "defmt")))]
        ::log::error!($($x)*);
        #[cfg(not(any(feature = "defmt", feature = "log")))]
        let _ = ($($x)*);
    }};
}
