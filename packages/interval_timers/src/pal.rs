//! Platform abstraction layer for the timestamp clock.
//!
//! The real implementation reads the operating system wall clock. Tests swap in a fake clock
//! whose readings they control, so expected timestamps and deltas can be asserted exactly.

mod abstractions;
mod facade;
#[cfg(test)]
mod fake;
mod real;

pub(crate) use abstractions::Platform;
pub(crate) use facade::PlatformFacade;
#[cfg(test)]
pub(crate) use fake::FakePlatform;
