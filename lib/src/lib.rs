#![no_std]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod klog;
pub mod string;
pub mod testing;

#[doc(hidden)]
pub use paste;

pub use klog::{KlogBackend, KlogLevel, klog_get_level, klog_init, klog_register_backend, klog_set_level};
pub use string::{bytes_as_str, nul_terminated};
