//! POSIX errno values used by the socket layer.
//!
//! Positive, as in `<errno.h>`. The syscall boundary negates them.

pub const EBADF: i32 = 9;
pub const EEXIST: i32 = 17;
pub const ENODEV: i32 = 19;
pub const EINVAL: i32 = 22;
pub const ENOPROTOOPT: i32 = 92;
pub const EPROTONOSUPPORT: i32 = 93;
pub const EADDRINUSE: i32 = 98;
pub const ENOBUFS: i32 = 105;
