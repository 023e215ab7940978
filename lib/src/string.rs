/// Extract a NUL-padded byte array as a `&str`.
///
/// Scans for the first NUL byte (or end of slice) and interprets the
/// prefix as UTF-8. Returns `"<invalid>"` if the bytes are not valid
/// UTF-8, or `""` if the buffer starts with NUL / is empty.
#[inline]
pub fn bytes_as_str(buf: &[u8]) -> &str {
    core::str::from_utf8(nul_terminated(buf)).unwrap_or("<invalid>")
}

/// The prefix of `buf` before its first NUL byte, or all of `buf` if it has
/// none. This is how the kernel reads C strings out of fixed-size buffers.
#[inline]
pub fn nul_terminated(buf: &[u8]) -> &[u8] {
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    &buf[..len]
}
