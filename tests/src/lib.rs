//! Host-based scenarios and tests for the DIN Sync converter


#[cfg(test)]
mod adapter_tests;
#[cfg(test)]
mod internal_clock_tests;
#[cfg(test)]
mod property_tests;
#[cfg(test)]
mod switch_tests;
