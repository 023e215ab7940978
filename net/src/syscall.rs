//! errno-returning entry points over a [`SocketLayer`].
//!
//! These take raw integers the way a syscall dispatcher hands them over and
//! return `0`, a non-negative value, or a negative errno. `NetError` never
//! crosses this line.

use super::netdev::NetInterfaces;
use super::socket::SocketLayer;
use super::types::{NetError, Port, SocketId};

fn id_from_raw(sock_idx: u32) -> SocketId {
    SocketId(sock_idx)
}

pub fn socket_create<I: NetInterfaces>(layer: &SocketLayer<I>, sock_type: u16) -> i32 {
    let fd = layer
        .create(sock_type)
        .and_then(|id| i32::try_from(id.0).map_err(|_| NetError::NoBufferSpace));
    match fd {
        Ok(fd) => fd,
        Err(e) => e.to_errno(),
    }
}

pub fn socket_setsockopt<I: NetInterfaces>(
    layer: &SocketLayer<I>,
    sock_idx: u32,
    level: u16,
    optname: u16,
    optval: &[u8],
) -> i32 {
    match layer.setsockopt(id_from_raw(sock_idx), level, optname, optval) {
        Ok(()) => 0,
        Err(e) => e.to_errno(),
    }
}

/// `getsockopt` with an in/out length.
///
/// The usable capacity is `min(*optlen, optval.len())`. On success `*optlen`
/// is replaced by the reported length; on failure it is left untouched.
pub fn socket_getsockopt<I: NetInterfaces>(
    layer: &SocketLayer<I>,
    sock_idx: u32,
    level: u16,
    optname: u16,
    optval: &mut [u8],
    optlen: &mut u32,
) -> i32 {
    let cap = (*optlen as usize).min(optval.len());
    match layer.getsockopt(id_from_raw(sock_idx), level, optname, &mut optval[..cap]) {
        Ok(len) => {
            *optlen = len as u32;
            0
        }
        Err(e) => e.to_errno(),
    }
}

/// Returns the bound port on success.
pub fn socket_bind<I: NetInterfaces>(layer: &SocketLayer<I>, sock_idx: u32, port: u16) -> i32 {
    match layer.bind(id_from_raw(sock_idx), Port(port)) {
        Ok(bound) => i32::from(bound.as_u16()),
        Err(e) => e.to_errno(),
    }
}

pub fn socket_close<I: NetInterfaces>(layer: &SocketLayer<I>, sock_idx: u32) -> i32 {
    match layer.close(id_from_raw(sock_idx)) {
        Ok(()) => 0,
        Err(e) => e.to_errno(),
    }
}
