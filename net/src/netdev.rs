//! Network interface lookup: the [`NetInterfaces`] trait and an
//! in-memory [`InterfaceTable`].
//!
//! The binding core never owns interfaces. It asks an interface source to
//! resolve a name to a stable [`DevIndex`] each time a socket stores a
//! device, and keys every later decision on that index.
//!
//! # Concurrency model
//!
//! The table is read-mostly: `SO_BINDTODEVICE` resolves names under a read
//! lock, while registration, renaming and removal take the write lock. Nothing
//! outside the table caches index-to-name mappings, so interfaces may change
//! between any two calls.

extern crate alloc;

use alloc::vec::Vec;

use bindarb_lib::{klog_debug, klog_info};
use spin::RwLock;

use super::types::{DevIndex, IfName, NetError};

// =============================================================================
// NetInterfaces trait
// =============================================================================

/// Source of live interface names (the `if_nameindex` collaborator).
pub trait NetInterfaces: Send + Sync {
    /// Resolve an exact interface name to its index.
    fn resolve(&self, name: &[u8]) -> Option<DevIndex>;
}

// =============================================================================
// InterfaceTable
// =============================================================================

/// Control-plane storage for interface names.
///
/// # Invariants
///
/// - Names are unique among live interfaces.
/// - Indices start at 1, increase monotonically, and are never reused, even
///   after an interface is removed.
pub struct InterfaceTable {
    inner: RwLock<TableInner>,
}

struct TableInner {
    entries: Vec<(DevIndex, IfName)>,
    next_index: u32,
}

impl InterfaceTable {
    /// Create an empty table. No heap allocation occurs until the first
    /// [`register`](Self::register) call.
    pub const fn new() -> Self {
        Self {
            inner: RwLock::new(TableInner {
                entries: Vec::new(),
                next_index: 1,
            }),
        }
    }

    /// Add an interface and return its newly assigned index.
    pub fn register(&self, name: &[u8]) -> Result<DevIndex, NetError> {
        let name = IfName::new(name).ok_or(NetError::InvalidArgument)?;
        let mut inner = self.inner.write();
        if inner.entries.iter().any(|(_, n)| *n == name) {
            return Err(NetError::AlreadyExists);
        }
        let index = DevIndex(inner.next_index);
        inner.next_index = inner
            .next_index
            .checked_add(1)
            .ok_or(NetError::NoBufferSpace)?;
        inner.entries.push((index, name));
        klog_info!("netdev: registered {} as index {}", name, index);
        Ok(index)
    }

    /// Give an existing interface a new name. The index is unchanged.
    pub fn rename(&self, index: DevIndex, new_name: &[u8]) -> Result<(), NetError> {
        let new_name = IfName::new(new_name).ok_or(NetError::InvalidArgument)?;
        let mut inner = self.inner.write();
        if inner
            .entries
            .iter()
            .any(|(i, n)| *n == new_name && *i != index)
        {
            return Err(NetError::AlreadyExists);
        }
        let slot = inner
            .entries
            .iter_mut()
            .find(|(i, _)| *i == index)
            .ok_or(NetError::NoSuchDevice)?;
        klog_debug!("netdev: index {} renamed {} -> {}", index, slot.1, new_name);
        slot.1 = new_name;
        Ok(())
    }

    /// Remove an interface. Returns `true` if it existed.
    pub fn unregister(&self, index: DevIndex) -> bool {
        let mut inner = self.inner.write();
        let before = inner.entries.len();
        inner.entries.retain(|(i, _)| *i != index);
        let removed = inner.entries.len() != before;
        if removed {
            klog_info!("netdev: index {} unregistered", index);
        }
        removed
    }

    /// Number of live interfaces.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InterfaceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl NetInterfaces for InterfaceTable {
    fn resolve(&self, name: &[u8]) -> Option<DevIndex> {
        let inner = self.inner.read();
        inner
            .entries
            .iter()
            .find(|(_, n)| n.as_bytes() == name)
            .map(|(i, _)| *i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_assigns_increasing_indices_from_one() {
        let table = InterfaceTable::new();
        assert_eq!(table.register(b"lo"), Ok(DevIndex(1)));
        assert_eq!(table.register(b"eth1"), Ok(DevIndex(2)));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_register_rejects_duplicates_and_bad_names() {
        let table = InterfaceTable::new();
        table.register(b"eth1").unwrap();
        assert_eq!(table.register(b"eth1"), Err(NetError::AlreadyExists));
        assert_eq!(table.register(b""), Err(NetError::InvalidArgument));
        assert_eq!(
            table.register(b"a-name-that-is-too-long"),
            Err(NetError::InvalidArgument)
        );
    }

    #[test]
    fn test_resolve_is_exact() {
        let table = InterfaceTable::new();
        let idx = table.register(b"eth10").unwrap();
        assert_eq!(table.resolve(b"eth10"), Some(idx));
        assert_eq!(table.resolve(b"eth1"), None);
        assert_eq!(table.resolve(b"eth100"), None);
    }

    #[test]
    fn test_indices_are_not_reused_after_unregister() {
        let table = InterfaceTable::new();
        let first = table.register(b"tun0").unwrap();
        assert!(table.unregister(first));
        assert!(!table.unregister(first));
        let second = table.register(b"tun0").unwrap();
        assert_ne!(first, second);
        assert!(!table.is_empty());
    }

    #[test]
    fn test_rename_keeps_index() {
        let table = InterfaceTable::new();
        let idx = table.register(b"eth1").unwrap();
        let other = table.register(b"eth2").unwrap();
        table.rename(idx, b"wan0").unwrap();
        assert_eq!(table.resolve(b"wan0"), Some(idx));
        assert_eq!(table.resolve(b"eth1"), None);
        assert_eq!(table.rename(idx, b"eth2"), Err(NetError::AlreadyExists));
        assert_eq!(table.rename(DevIndex(99), b"x"), Err(NetError::NoSuchDevice));
        assert_eq!(table.resolve(b"eth2"), Some(other), "failed rename leaves eth2 alone");
    }
}
