//! Type-safe primitives for the binding core.
//!
//! Newtype wrappers keep ports, interface indices and socket ids from being
//! mixed up, and [`IfName`] carries the `IFNAMSIZ` length rule in its
//! constructor so no other module has to re-check it.

use core::fmt;

use bindarb_abi::errno::{
    EADDRINUSE, EBADF, EEXIST, EINVAL, ENOBUFS, ENODEV, ENOPROTOOPT, EPROTONOSUPPORT,
};
use bindarb_abi::net::IFNAMSIZ;
use bindarb_lib::string::bytes_as_str;

// =============================================================================
// Newtype wrappers
// =============================================================================

/// Port number in **host byte order**.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Port(pub u16);

impl Port {
    /// Port 0: "pick an ephemeral port for me".
    pub const ANY: Self = Self(0);

    /// `true` if this is the ephemeral-request port `0`.
    #[inline]
    pub const fn is_any(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Port({})", self.0)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Interface index, as handed out by the interface table.
///
/// Linux numbers interfaces from 1; index 0 means "no device" and is never
/// assigned. The index stays stable across renames, which is why bindings
/// are keyed on it rather than on the name.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DevIndex(pub u32);

impl fmt::Debug for DevIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DevIndex({})", self.0)
    }
}

impl fmt::Display for DevIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Socket identifier. Assigned in increasing order and never reused by the
/// same socket layer.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketId(pub u32);

impl fmt::Debug for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SocketId({})", self.0)
    }
}

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transport protocol. TCP and UDP have independent port spaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "TCP"),
            Self::Udp => write!(f, "UDP"),
        }
    }
}

// =============================================================================
// Interface names
// =============================================================================

/// Maximum interface name length, excluding the NUL terminator.
pub const IFNAME_MAX_LEN: usize = IFNAMSIZ - 1;

/// A valid interface name: 1 to `IFNAMSIZ - 1` bytes, no NUL.
///
/// Stored NUL-padded in an `IFNAMSIZ` buffer so it can be copied out to a
/// caller as a C string without reformatting.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IfName {
    bytes: [u8; IFNAMSIZ],
    len: u8,
}

impl IfName {
    /// Validate and copy a name. Returns `None` for empty names, names with
    /// an embedded NUL, and names longer than [`IFNAME_MAX_LEN`].
    pub fn new(name: &[u8]) -> Option<Self> {
        if name.is_empty() || name.len() > IFNAME_MAX_LEN || name.contains(&0) {
            return None;
        }
        let mut bytes = [0u8; IFNAMSIZ];
        bytes[..name.len()].copy_from_slice(name);
        Some(Self {
            bytes,
            len: name.len() as u8,
        })
    }

    /// Name bytes without the terminator.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Name bytes followed by one NUL byte.
    #[inline]
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.bytes[..self.len as usize + 1]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// `true` only for a zero-length name. [`IfName::new`] never builds one.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for IfName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IfName({:?})", bytes_as_str(&self.bytes))
    }
}

impl fmt::Display for IfName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bytes_as_str(&self.bytes))
    }
}

// =============================================================================
// NetError
// =============================================================================

/// Error type for every operation in this crate.
///
/// Internal code uses `NetError` exclusively. Conversion to POSIX errno
/// happens at the syscall boundary via [`to_errno`](Self::to_errno).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetError {
    /// Address already in use (EADDRINUSE).
    AddressInUse,
    /// No interface with the given name or index (ENODEV).
    NoSuchDevice,
    /// Invalid argument (EINVAL).
    InvalidArgument,
    /// Socket id does not name an open socket (EBADF).
    BadDescriptor,
    /// Unknown option level or name (ENOPROTOOPT).
    OptionNotSupported,
    /// Socket type not supported (EPROTONOSUPPORT).
    ProtocolNotSupported,
    /// Socket table is full (ENOBUFS).
    NoBufferSpace,
    /// An interface with that name already exists (EEXIST).
    AlreadyExists,
}

impl NetError {
    /// Convert to a POSIX errno value (negative) for the syscall boundary.
    pub const fn to_errno(&self) -> i32 {
        match self {
            Self::AddressInUse => -EADDRINUSE,
            Self::NoSuchDevice => -ENODEV,
            Self::InvalidArgument => -EINVAL,
            Self::BadDescriptor => -EBADF,
            Self::OptionNotSupported => -ENOPROTOOPT,
            Self::ProtocolNotSupported => -EPROTONOSUPPORT,
            Self::NoBufferSpace => -ENOBUFS,
            Self::AlreadyExists => -EEXIST,
        }
    }
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddressInUse => write!(f, "address already in use"),
            Self::NoSuchDevice => write!(f, "no such device"),
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::BadDescriptor => write!(f, "bad socket descriptor"),
            Self::OptionNotSupported => write!(f, "protocol option not available"),
            Self::ProtocolNotSupported => write!(f, "protocol not supported"),
            Self::NoBufferSpace => write!(f, "no buffer space available"),
            Self::AlreadyExists => write!(f, "already exists"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ifname_rejects_invalid_names() {
        assert!(IfName::new(b"").is_none());
        assert!(IfName::new(b"eth\0").is_none());
        assert!(IfName::new(b"sixteen-chars-xx").is_none());
        assert!(IfName::new(b"fifteen-chars-x").is_some());
    }

    #[test]
    fn test_ifname_built_names_are_never_empty() {
        let short = IfName::new(b"a").unwrap();
        assert!(!short.is_empty());
        assert_eq!(short.len(), 1);
        let full = IfName::new(b"fifteen-chars-x").unwrap();
        assert!(!full.is_empty());
        assert_eq!(full.len(), IFNAME_MAX_LEN);
    }

    #[test]
    fn test_ifname_with_nul_is_one_longer() {
        let name = IfName::new(b"tun0").unwrap();
        assert_eq!(name.as_bytes(), b"tun0");
        assert_eq!(name.as_bytes_with_nul(), b"tun0\0");
        assert_eq!(name.len(), 4);
        assert_eq!(std::format!("{name}"), "tun0");
    }

    #[test]
    fn test_errno_mapping_matches_linux() {
        assert_eq!(NetError::AddressInUse.to_errno(), -98);
        assert_eq!(NetError::NoSuchDevice.to_errno(), -19);
        assert_eq!(NetError::InvalidArgument.to_errno(), -22);
        assert_eq!(NetError::BadDescriptor.to_errno(), -9);
        assert_eq!(NetError::OptionNotSupported.to_errno(), -92);
    }

    #[test]
    fn test_port_any() {
        assert!(Port::ANY.is_any());
        assert!(!Port(80).is_any());
    }
}
