//! Socket table and the option/bind/close operations that drive the
//! binding core.
//!
//! A [`SocketLayer`] owns one [`BindConflictArbiter`] per transport protocol
//! and the per-socket state the arbiter needs at bind time: the
//! `SO_REUSEPORT` flag and the `SO_BINDTODEVICE` store.
//!
//! # Lock order
//!
//! Socket table, then arbiter shard. `bind` drops the table lock before it
//! asks the arbiter, so binds on different ports only contend on shard
//! locks. `close`, `reset` and a bind that finds its socket closed release
//! arbiter entries with the table lock held or just dropped; no path takes a
//! shard lock and then the table lock.

extern crate alloc;

use alloc::collections::BTreeMap;

use bindarb_abi::net::{SO_BINDTODEVICE, SO_REUSEPORT, SOCK_DGRAM, SOCK_STREAM, SOL_SOCKET};
use bindarb_lib::{klog_debug, klog_info};
use bitflags::bitflags;
use spin::Mutex;

use super::bind_table::{BindConflictArbiter, DeviceScope};
use super::config::NetConfig;
use super::devname::DeviceNameStore;
use super::ephemeral::EphemeralPortAllocator;
use super::netdev::{InterfaceTable, NetInterfaces};
use super::types::{NetError, Port, Protocol, SocketId};

const INT_OPT_LEN: usize = core::mem::size_of::<i32>();

/// Largest id handed out; ids are returned as non-negative `i32`s.
const MAX_SOCKET_ID: u32 = i32::MAX as u32;

bitflags! {
    /// Boolean `SOL_SOCKET` options stored on a socket.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct SocketFlags: u32 {
        /// `SO_REUSEPORT`: may share a port with other reuse sockets.
        const REUSE_PORT = 1 << 0;
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SocketState {
    Unbound,
    /// A bind is in flight; the arbiter has not answered yet.
    Binding,
    Bound(Port),
}

#[derive(Clone, Copy, Debug)]
pub struct KernelSocket {
    pub protocol: Protocol,
    pub state: SocketState,
    pub flags: SocketFlags,
    pub device: DeviceNameStore,
}

impl KernelSocket {
    const fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            state: SocketState::Unbound,
            flags: SocketFlags::empty(),
            device: DeviceNameStore::new(),
        }
    }
}

struct SocketTable {
    sockets: BTreeMap<SocketId, KernelSocket>,
    next_id: u32,
    max_sockets: usize,
}

impl SocketTable {
    const fn new(max_sockets: usize) -> Self {
        Self {
            sockets: BTreeMap::new(),
            next_id: 0,
            max_sockets,
        }
    }

    fn alloc(&mut self, protocol: Protocol) -> Result<SocketId, NetError> {
        if self.sockets.len() >= self.max_sockets {
            return Err(NetError::NoBufferSpace);
        }
        if self.next_id > MAX_SOCKET_ID {
            return Err(NetError::NoBufferSpace);
        }
        let id = SocketId(self.next_id);
        self.next_id += 1;
        self.sockets.insert(id, KernelSocket::new(protocol));
        Ok(id)
    }

    fn get(&self, id: SocketId) -> Result<&KernelSocket, NetError> {
        self.sockets.get(&id).ok_or(NetError::BadDescriptor)
    }

    fn get_mut(&mut self, id: SocketId) -> Result<&mut KernelSocket, NetError> {
        self.sockets.get_mut(&id).ok_or(NetError::BadDescriptor)
    }
}

/// The socket-facing half of the stack.
pub struct SocketLayer<I: NetInterfaces = InterfaceTable> {
    ifaces: I,
    table: Mutex<SocketTable>,
    tcp: BindConflictArbiter,
    udp: BindConflictArbiter,
}

impl<I: NetInterfaces> SocketLayer<I> {
    /// Socket layer with the default configuration.
    pub fn new(ifaces: I) -> Self {
        Self {
            ifaces,
            table: Mutex::new(SocketTable::new(bindarb_abi::net::MAX_SOCKETS)),
            tcp: BindConflictArbiter::new(),
            udp: BindConflictArbiter::new(),
        }
    }

    /// Socket layer sized and ranged by `config`.
    pub fn with_config(ifaces: I, config: &NetConfig) -> Result<Self, NetError> {
        let (start, end) = config.ephemeral_range;
        Ok(Self {
            ifaces,
            table: Mutex::new(SocketTable::new(config.max_sockets)),
            tcp: BindConflictArbiter::with_ephemeral(EphemeralPortAllocator::with_range(
                start, end,
            )?),
            udp: BindConflictArbiter::with_ephemeral(EphemeralPortAllocator::with_range(
                start, end,
            )?),
        })
    }

    /// The interface source device names are resolved against.
    #[inline]
    pub fn interfaces(&self) -> &I {
        &self.ifaces
    }

    /// Bind table for `protocol`.
    #[inline]
    pub fn arbiter(&self, protocol: Protocol) -> &BindConflictArbiter {
        match protocol {
            Protocol::Tcp => &self.tcp,
            Protocol::Udp => &self.udp,
        }
    }

    pub fn create(&self, sock_type: u16) -> Result<SocketId, NetError> {
        let protocol = match sock_type {
            SOCK_STREAM => Protocol::Tcp,
            SOCK_DGRAM => Protocol::Udp,
            _ => return Err(NetError::ProtocolNotSupported),
        };
        let id = self.table.lock().alloc(protocol)?;
        klog_debug!("socket: created {} ({})", id, protocol);
        Ok(id)
    }

    /// `setsockopt`. `optval.len()` is the caller's `optlen`.
    pub fn setsockopt(
        &self,
        id: SocketId,
        level: u16,
        optname: u16,
        optval: &[u8],
    ) -> Result<(), NetError> {
        if level != SOL_SOCKET {
            return Err(NetError::OptionNotSupported);
        }
        let mut table = self.table.lock();
        let sock = table.get_mut(id)?;
        match optname {
            SO_REUSEPORT => {
                let raw: [u8; INT_OPT_LEN] = optval
                    .get(..INT_OPT_LEN)
                    .and_then(|b| b.try_into().ok())
                    .ok_or(NetError::InvalidArgument)?;
                sock.flags
                    .set(SocketFlags::REUSE_PORT, i32::from_ne_bytes(raw) != 0);
                Ok(())
            }
            SO_BINDTODEVICE => sock.device.set(optval, &self.ifaces),
            _ => Err(NetError::OptionNotSupported),
        }
    }

    /// `getsockopt` into `optval`, whose length is the caller's capacity.
    /// Returns the length to report back.
    pub fn getsockopt(
        &self,
        id: SocketId,
        level: u16,
        optname: u16,
        optval: &mut [u8],
    ) -> Result<usize, NetError> {
        if level != SOL_SOCKET {
            return Err(NetError::OptionNotSupported);
        }
        let table = self.table.lock();
        let sock = table.get(id)?;
        match optname {
            SO_REUSEPORT => {
                let raw = i32::from(sock.flags.contains(SocketFlags::REUSE_PORT)).to_ne_bytes();
                let len = optval.len().min(INT_OPT_LEN);
                optval[..len].copy_from_slice(&raw[..len]);
                Ok(len)
            }
            SO_BINDTODEVICE => sock.device.get(optval),
            _ => Err(NetError::OptionNotSupported),
        }
    }

    /// Bind `id` to `port` (`Port::ANY` for an ephemeral port) on the device
    /// it stored with `SO_BINDTODEVICE`, if any. Returns the bound port.
    pub fn bind(&self, id: SocketId, port: Port) -> Result<Port, NetError> {
        let (protocol, scope, reuse) = {
            let mut table = self.table.lock();
            let sock = table.get_mut(id)?;
            if sock.state != SocketState::Unbound {
                return Err(NetError::InvalidArgument);
            }
            sock.state = SocketState::Binding;
            let scope = sock
                .device
                .index()
                .map_or(DeviceScope::Wildcard, DeviceScope::Named);
            (
                sock.protocol,
                scope,
                sock.flags.contains(SocketFlags::REUSE_PORT),
            )
        };

        let result = self.arbiter(protocol).try_bind(id, port, scope, reuse);
        self.finish_bind(id, protocol, result)
    }

    /// Record the arbiter's answer on the socket. If the socket was closed
    /// while the arbiter was deciding, the new entry is released again.
    fn finish_bind(
        &self,
        id: SocketId,
        protocol: Protocol,
        result: Result<Port, NetError>,
    ) -> Result<Port, NetError> {
        let mut table = self.table.lock();
        let Ok(sock) = table.get_mut(id) else {
            if let Ok(bound) = result {
                self.arbiter(protocol).release_on(id, bound);
                klog_debug!("socket: {} closed during bind, released port {}", id, bound);
            }
            return Err(NetError::BadDescriptor);
        };
        match result {
            Ok(bound) => {
                sock.state = SocketState::Bound(bound);
                Ok(bound)
            }
            Err(err) => {
                sock.state = SocketState::Unbound;
                Err(err)
            }
        }
    }

    /// `getsockname` port: the bound port, or `Port::ANY` if unbound.
    pub fn local_port(&self, id: SocketId) -> Result<Port, NetError> {
        let table = self.table.lock();
        match table.get(id)?.state {
            SocketState::Bound(port) => Ok(port),
            SocketState::Unbound | SocketState::Binding => Ok(Port::ANY),
        }
    }

    /// Copy of the socket's state.
    pub fn snapshot(&self, id: SocketId) -> Result<KernelSocket, NetError> {
        self.table.lock().get(id).copied()
    }

    /// Release the socket: its binding, its device name and its slot.
    pub fn close(&self, id: SocketId) -> Result<(), NetError> {
        let sock = self
            .table
            .lock()
            .sockets
            .remove(&id)
            .ok_or(NetError::BadDescriptor)?;
        if let SocketState::Bound(port) = sock.state {
            self.arbiter(sock.protocol).release_on(id, port);
        }
        klog_debug!("socket: closed {}", id);
        Ok(())
    }

    pub fn count_active(&self) -> usize {
        self.table.lock().sockets.len()
    }

    /// Close every socket and empty both bind tables.
    pub fn reset(&self) {
        let mut table = self.table.lock();
        let closed = table.sockets.len();
        table.sockets.clear();
        self.tcp.clear();
        self.udp.clear();
        klog_info!("socket: reset, {} sockets closed", closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_ids_stop_at_i32_max() {
        let mut table = SocketTable::new(4);
        table.next_id = MAX_SOCKET_ID;
        assert_eq!(table.alloc(Protocol::Udp), Ok(SocketId(i32::MAX as u32)));
        assert_eq!(table.alloc(Protocol::Udp), Err(NetError::NoBufferSpace));
        assert_eq!(table.sockets.len(), 1);
    }

    #[test]
    fn test_close_racing_bind_leaves_no_entry() {
        const ROUNDS: u16 = 200;
        let layer = Arc::new(SocketLayer::new(InterfaceTable::new()));

        for round in 0..ROUNDS {
            let id = layer.create(bindarb_abi::net::SOCK_DGRAM).unwrap();
            let port = if round % 2 == 0 {
                Port::ANY
            } else {
                Port(20000 + round)
            };
            let barrier = Arc::new(Barrier::new(2));

            let binder = {
                let layer = Arc::clone(&layer);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    layer.bind(id, port)
                })
            };
            barrier.wait();
            assert_eq!(layer.close(id), Ok(()));

            match binder.join().unwrap() {
                Ok(_) | Err(NetError::BadDescriptor) => {}
                Err(other) => panic!("round {round}: unexpected bind error {other:?}"),
            }
            assert_eq!(
                layer.arbiter(Protocol::Udp).bound_port_count(),
                0,
                "round {round}"
            );
        }
        assert_eq!(layer.count_active(), 0);
    }

    #[test]
    fn test_bind_after_close_mid_flight_reports_bad_descriptor() {
        let layer = SocketLayer::new(InterfaceTable::new());
        let id = layer.create(bindarb_abi::net::SOCK_STREAM).unwrap();
        // Mark the bind as started, then close before the arbiter answers.
        layer.table.lock().get_mut(id).unwrap().state = SocketState::Binding;
        let arbiter = layer.arbiter(Protocol::Tcp);
        let bound = arbiter
            .try_bind(id, Port(7100), DeviceScope::Wildcard, false)
            .unwrap();
        assert_eq!(layer.close(id), Ok(()));
        assert_eq!(arbiter.entries(bound).len(), 1, "close leaves in-flight entry");

        assert_eq!(
            layer.finish_bind(id, Protocol::Tcp, Ok(bound)),
            Err(NetError::BadDescriptor)
        );
        assert_eq!(arbiter.bound_port_count(), 0);
    }
}
