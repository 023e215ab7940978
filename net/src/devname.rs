//! Per-socket `SO_BINDTODEVICE` storage.
//!
//! Reproduces the Linux value contract exactly:
//!
//! - **set**: the caller's `optlen` is clamped to `IFNAMSIZ - 1`, the name ends
//!   at the first NUL inside that window, and it must match a live interface
//!   name byte for byte. An empty name unbinds. A failed set changes nothing.
//! - **get**: with no device bound, every buffer (even a zero-length one)
//!   receives length 0. With a device bound, buffers shorter than `IFNAMSIZ`
//!   are rejected with `EINVAL` regardless of the actual name length.

use bindarb_abi::net::IFNAMSIZ;
use bindarb_lib::{klog_debug, nul_terminated};

use super::netdev::NetInterfaces;
use super::types::{DevIndex, IFNAME_MAX_LEN, IfName, NetError};

/// A resolved device binding: the stable index plus the name it was
/// resolved from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundDevice {
    pub index: DevIndex,
    pub name: IfName,
}

/// Device name buffer attached to one socket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceNameStore {
    bound: Option<BoundDevice>,
}

impl DeviceNameStore {
    pub const fn new() -> Self {
        Self { bound: None }
    }

    /// Currently bound device, if any.
    #[inline]
    pub fn bound(&self) -> Option<BoundDevice> {
        self.bound
    }

    /// Stable index of the bound device, if any.
    #[inline]
    pub fn index(&self) -> Option<DevIndex> {
        self.bound.map(|dev| dev.index)
    }

    /// `setsockopt(SO_BINDTODEVICE)`. `optval.len()` is the caller's `optlen`.
    ///
    /// Resolution goes through `ifaces` on every call.
    pub fn set(&mut self, optval: &[u8], ifaces: &dyn NetInterfaces) -> Result<(), NetError> {
        let window = &optval[..optval.len().min(IFNAME_MAX_LEN)];
        let name = nul_terminated(window);

        if name.is_empty() {
            if let Some(prev) = self.bound.take() {
                klog_debug!("devname: unbound from {}", prev.name);
            }
            return Ok(());
        }

        let index = ifaces.resolve(name).ok_or(NetError::NoSuchDevice)?;
        let name = IfName::new(name).ok_or(NetError::NoSuchDevice)?;
        klog_debug!("devname: bound to {} (index {})", name, index);
        self.bound = Some(BoundDevice { index, name });
        Ok(())
    }

    /// `getsockopt(SO_BINDTODEVICE)` into `buf`, whose length is the caller's
    /// capacity. Returns the length to report back to the caller.
    ///
    /// On error the caller's length must be left as it was; this function
    /// never writes to `buf` in that case.
    pub fn get(&self, buf: &mut [u8]) -> Result<usize, NetError> {
        let Some(dev) = self.bound else {
            return Ok(0);
        };
        if buf.len() < IFNAMSIZ {
            return Err(NetError::InvalidArgument);
        }
        let name = dev.name.as_bytes_with_nul();
        buf[..name.len()].copy_from_slice(name);
        Ok(name.len())
    }

    /// Drop any binding. Used when the owning socket is released.
    pub fn clear(&mut self) {
        self.bound = None;
    }
}
