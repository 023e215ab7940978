// =============================================================================
// Socket ABI types
// =============================================================================

/// Socket type: byte-stream (TCP).
pub const SOCK_STREAM: u16 = 1;
/// Socket type: datagram (UDP).
pub const SOCK_DGRAM: u16 = 2;

/// Default number of sockets a socket layer can hold at once.
pub const MAX_SOCKETS: usize = 64;

// =============================================================================
// Interfaces
// =============================================================================

/// Size of an interface name buffer, terminator included (`<net/if.h>`).
pub const IFNAMSIZ: usize = 16;

// =============================================================================
// Socket options
// =============================================================================

/// Option level for socket-layer options.
pub const SOL_SOCKET: u16 = 1;

/// Allow several sockets to bind the same address if all of them set it.
pub const SO_REUSEPORT: u16 = 15;
/// Restrict the socket to one network interface, given by name.
pub const SO_BINDTODEVICE: u16 = 25;

// =============================================================================
// Ephemeral ports
// =============================================================================

/// First port of the IANA dynamic range.
pub const EPHEMERAL_PORT_START: u16 = 49152;
/// Last port of the IANA dynamic range (inclusive).
pub const EPHEMERAL_PORT_END: u16 = 65535;
