//! Socket port-binding core: `SO_BINDTODEVICE` storage, `SO_REUSEPORT`
//! sharing and the per-port bind conflict table.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod bind_table;
pub mod config;
pub mod devname;
pub mod ephemeral;
pub mod netdev;
pub mod socket;
pub mod syscall;
pub mod types;

pub mod devname_tests;

pub use bind_table::{BindConflictArbiter, BoundEntry, DeviceScope};
pub use config::{NetConfig, config_from_cmdline};
pub use devname::DeviceNameStore;
pub use netdev::{InterfaceTable, NetInterfaces};
pub use socket::{SocketFlags, SocketLayer};
pub use types::{DevIndex, IfName, NetError, Port, Protocol, SocketId};
