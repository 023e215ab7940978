//! bindarb ABI constants
//!
//! Single source of truth for every number that crosses the socket syscall
//! boundary: socket types, option levels and names, interface name sizes and
//! the errno values the stack hands back. Values match Linux exactly so that
//! callers written against the Linux headers see identical behaviour.

#![no_std]
#![forbid(unsafe_code)]

pub mod errno;
pub mod net;

pub use errno::*;
pub use net::*;
