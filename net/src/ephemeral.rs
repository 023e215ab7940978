//! Ephemeral port selection for `bind()` to port 0.
//!
//! The allocator only proposes candidates. Whether a candidate is free is
//! decided by the bind table under the candidate's shard lock, so two racing
//! autobinds can never both claim the same port.

use core::sync::atomic::{AtomicU32, Ordering};

use bindarb_abi::net::{EPHEMERAL_PORT_END, EPHEMERAL_PORT_START};

use super::types::{NetError, Port};

/// Round-robin cursor over an inclusive port range.
pub struct EphemeralPortAllocator {
    start: u16,
    count: u32,
    cursor: AtomicU32,
}

impl EphemeralPortAllocator {
    /// IANA dynamic range, 49152–65535.
    pub const fn new() -> Self {
        Self {
            start: EPHEMERAL_PORT_START,
            count: (EPHEMERAL_PORT_END - EPHEMERAL_PORT_START) as u32 + 1,
            cursor: AtomicU32::new(0),
        }
    }

    /// Allocator over `start..=end`. Port 0 can never be handed out.
    pub fn with_range(start: u16, end: u16) -> Result<Self, NetError> {
        if start == 0 || end < start {
            return Err(NetError::InvalidArgument);
        }
        Ok(Self {
            start,
            count: (end - start) as u32 + 1,
            cursor: AtomicU32::new(0),
        })
    }

    /// Number of ports in the range.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// First and last port of the range.
    pub fn range(&self) -> (Port, Port) {
        (
            Port(self.start),
            Port((self.start as u32 + self.count - 1) as u16),
        )
    }

    /// Every port in the range exactly once, starting after the previous
    /// call's starting point.
    pub fn candidates(&self) -> impl Iterator<Item = Port> + '_ {
        let first = self.cursor.fetch_add(1, Ordering::Relaxed) % self.count;
        (0..self.count).map(move |step| {
            let offset = (first + step) % self.count;
            Port((self.start as u32 + offset) as u16)
        })
    }
}

impl Default for EphemeralPortAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate alloc;
    use alloc::vec::Vec;

    #[test]
    fn test_default_range_is_iana() {
        let alloc = EphemeralPortAllocator::new();
        assert_eq!(alloc.range(), (Port(49152), Port(65535)));
        assert_eq!(alloc.count(), 16384);
    }

    #[test]
    fn test_candidates_cover_range_once() {
        let alloc = EphemeralPortAllocator::with_range(1000, 1003).unwrap();
        let mut ports: Vec<u16> = alloc.candidates().map(|p| p.0).collect();
        ports.sort_unstable();
        assert_eq!(ports, [1000, 1001, 1002, 1003]);
    }

    #[test]
    fn test_candidates_rotate_between_calls() {
        let alloc = EphemeralPortAllocator::with_range(1000, 1003).unwrap();
        let first = alloc.candidates().next();
        let second = alloc.candidates().next();
        assert_eq!(first, Some(Port(1000)));
        assert_eq!(second, Some(Port(1001)));
    }

    #[test]
    fn test_with_range_validation() {
        assert!(EphemeralPortAllocator::with_range(0, 10).is_err());
        assert!(EphemeralPortAllocator::with_range(20, 10).is_err());
        let single = EphemeralPortAllocator::with_range(65535, 65535).unwrap();
        assert_eq!(single.candidates().collect::<Vec<_>>(), [Port(65535)]);
    }
}
