//! Port binding table: admission control for `bind()`.
//!
//! Every bound socket owns one [`BoundEntry`] in the list of its port. A new
//! bind is checked against each entry already on that port:
//!
//! - Two scopes **overlap** unless both are named devices and the devices
//!   differ. A wildcard overlaps everything, including every named device.
//! - Overlapping entries may share the port only if **both** set
//!   `SO_REUSEPORT`.
//!
//! The check is a pure predicate over the whole list, evaluated before the
//! list is touched, so a rejected bind leaves no trace.
//!
//! # Concurrency model
//!
//! Ports are spread over [`PORT_SHARDS`] spin locks by `port % PORT_SHARDS`.
//! The check and the insert for one port happen under that port's shard lock,
//! which linearizes concurrent binds on the same port. Binds on ports in
//! different shards never contend.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use bindarb_lib::{klog_debug, klog_warn};
use spin::Mutex;

use super::ephemeral::EphemeralPortAllocator;
use super::types::{DevIndex, NetError, Port, SocketId};

/// Number of independently locked port shards.
pub const PORT_SHARDS: usize = 64;

// =============================================================================
// Entries
// =============================================================================

/// Which devices a binding covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceScope {
    /// Every device (no `SO_BINDTODEVICE`).
    Wildcard,
    /// One device, by stable index.
    Named(DevIndex),
}

impl DeviceScope {
    /// `true` if traffic could match both scopes.
    #[inline]
    pub fn overlaps(self, other: DeviceScope) -> bool {
        match (self, other) {
            (DeviceScope::Named(a), DeviceScope::Named(b)) => a == b,
            _ => true,
        }
    }
}

impl fmt::Display for DeviceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceScope::Wildcard => write!(f, "*"),
            DeviceScope::Named(idx) => write!(f, "dev#{}", idx),
        }
    }
}

/// One admitted binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundEntry {
    pub owner: SocketId,
    pub scope: DeviceScope,
    pub reuse: bool,
}

impl BoundEntry {
    /// `true` if a new binding with `scope`/`reuse` may not coexist with
    /// this entry.
    #[inline]
    pub fn conflicts_with(&self, scope: DeviceScope, reuse: bool) -> bool {
        self.scope.overlaps(scope) && !(self.reuse && reuse)
    }
}

/// The earliest entry in `existing` that a binding with `scope`/`reuse`
/// conflicts with, if any.
pub fn first_blocker(
    existing: &[BoundEntry],
    scope: DeviceScope,
    reuse: bool,
) -> Option<&BoundEntry> {
    existing.iter().find(|e| e.conflicts_with(scope, reuse))
}

/// `true` if a binding with `scope`/`reuse` may join `existing`.
pub fn admissible(existing: &[BoundEntry], scope: DeviceScope, reuse: bool) -> bool {
    first_blocker(existing, scope, reuse).is_none()
}

// =============================================================================
// Shards
// =============================================================================

struct PortShard {
    ports: BTreeMap<Port, Vec<BoundEntry>>,
}

impl PortShard {
    const fn new() -> Self {
        Self {
            ports: BTreeMap::new(),
        }
    }

    fn is_free(&self, port: Port) -> bool {
        self.ports.get(&port).is_none_or(|entries| entries.is_empty())
    }

    fn try_insert(&mut self, port: Port, entry: BoundEntry) -> Result<(), NetError> {
        let existing = self.ports.get(&port).map(Vec::as_slice).unwrap_or(&[]);
        if let Some(blocker) = first_blocker(existing, entry.scope, entry.reuse) {
            klog_debug!(
                "bind: reject {} port {} scope {} reuse {}: held by {} scope {} reuse {}",
                entry.owner,
                port,
                entry.scope,
                entry.reuse,
                blocker.owner,
                blocker.scope,
                blocker.reuse
            );
            return Err(NetError::AddressInUse);
        }
        self.ports.entry(port).or_default().push(entry);
        klog_debug!(
            "bind: admit {} port {} scope {} reuse {}",
            entry.owner,
            port,
            entry.scope,
            entry.reuse
        );
        Ok(())
    }

    /// Remove `owner`'s entries. Returns `true` if anything was removed.
    fn remove_owner(&mut self, owner: SocketId) -> bool {
        let mut removed = false;
        self.ports.retain(|port, entries| {
            let before = entries.len();
            entries.retain(|e| e.owner != owner);
            if entries.len() != before {
                removed = true;
                klog_debug!("bind: release {} port {}", owner, port);
            }
            !entries.is_empty()
        });
        removed
    }
}

// =============================================================================
// BindConflictArbiter
// =============================================================================

/// Per-port registry of bound entries for one transport protocol.
pub struct BindConflictArbiter {
    shards: [Mutex<PortShard>; PORT_SHARDS],
    ephemeral: EphemeralPortAllocator,
}

impl BindConflictArbiter {
    /// Empty table with the IANA ephemeral range.
    pub const fn new() -> Self {
        Self {
            shards: [const { Mutex::new(PortShard::new()) }; PORT_SHARDS],
            ephemeral: EphemeralPortAllocator::new(),
        }
    }

    /// Empty table with a caller-chosen ephemeral allocator.
    pub fn with_ephemeral(ephemeral: EphemeralPortAllocator) -> Self {
        Self {
            shards: [const { Mutex::new(PortShard::new()) }; PORT_SHARDS],
            ephemeral,
        }
    }

    #[inline]
    fn shard(&self, port: Port) -> &Mutex<PortShard> {
        &self.shards[port.0 as usize % PORT_SHARDS]
    }

    /// Admit `owner` on `port` or reject with [`NetError::AddressInUse`].
    ///
    /// `Port::ANY` picks a port with no entries from the ephemeral range.
    /// Returns the port actually bound.
    ///
    /// The caller guarantees `owner` holds no other entry.
    pub fn try_bind(
        &self,
        owner: SocketId,
        port: Port,
        scope: DeviceScope,
        reuse: bool,
    ) -> Result<Port, NetError> {
        let entry = BoundEntry {
            owner,
            scope,
            reuse,
        };
        if port.is_any() {
            return self.bind_ephemeral(entry);
        }
        self.shard(port).lock().try_insert(port, entry)?;
        Ok(port)
    }

    fn bind_ephemeral(&self, entry: BoundEntry) -> Result<Port, NetError> {
        for port in self.ephemeral.candidates() {
            let mut shard = self.shard(port).lock();
            if !shard.is_free(port) {
                continue;
            }
            shard.try_insert(port, entry)?;
            return Ok(port);
        }
        let (first, last) = self.ephemeral.range();
        klog_warn!(
            "bind: ephemeral range {}-{} exhausted for {}",
            first,
            last,
            entry.owner
        );
        Err(NetError::AddressInUse)
    }

    /// Remove `owner`'s entry. Releasing an unbound owner is a no-op.
    ///
    /// Returns `true` if an entry was removed.
    pub fn release(&self, owner: SocketId) -> bool {
        let mut removed = false;
        for shard in &self.shards {
            removed |= shard.lock().remove_owner(owner);
        }
        removed
    }

    /// Remove `owner`'s entry when its port is known. Only one shard is locked.
    pub fn release_on(&self, owner: SocketId, port: Port) -> bool {
        self.shard(port).lock().remove_owner(owner)
    }

    /// Entries on `port`, in admission order.
    pub fn entries(&self, port: Port) -> Vec<BoundEntry> {
        self.shard(port)
            .lock()
            .ports
            .get(&port)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of ports with at least one entry.
    pub fn bound_port_count(&self) -> usize {
        self.shards.iter().map(|s| s.lock().ports.len()).sum()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        for shard in &self.shards {
            shard.lock().ports.clear();
        }
    }
}

impl Default for BindConflictArbiter {
    fn default() -> Self {
        Self::new()
    }
}
