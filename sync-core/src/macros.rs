//! Logging shims: forward to `defmt` when the feature is enabled, vanish otherwise

#[cfg(feature = "defmt")]
macro_rules! sync_info {
    ($($arg:tt)*) => { defmt::info!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
macro_rules! sync_info {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "defmt")]
macro_rules! sync_debug {
    ($($arg:tt)*) => { defmt::debug!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
macro_rules! sync_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "defmt")]
macro_rules! sync_trace {
    ($($arg:tt)*) => { defmt::trace!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
macro_rules! sync_trace {
    ($($arg:tt)*) => {};
}
