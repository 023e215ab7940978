use bindarb_abi::net::IFNAMSIZ;
use bindarb_lib::testing::TestResult;
use bindarb_lib::{assert_eq_test, assert_err, assert_ok, assert_test, fail, pass};

use super::devname::DeviceNameStore;
use super::netdev::InterfaceTable;
use super::types::{DevIndex, NetError};

const IFACE: &[u8] = b"eth1";
const BUF_LEN: usize = IFNAMSIZ * 2;

fn table_with_iface() -> (InterfaceTable, DevIndex) {
    let table = InterfaceTable::new();
    let _ = table.register(b"lo");
    match table.register(IFACE) {
        Ok(idx) => (table, idx),
        Err(_) => (table, DevIndex(0)),
    }
}

/// `IFACE` followed by `'a'` filler. With `keep_nul` the byte after the name
/// is a terminator.
fn name_buffer(keep_nul: bool) -> [u8; BUF_LEN] {
    let mut buf = [b'a'; BUF_LEN];
    buf[..IFACE.len()].copy_from_slice(IFACE);
    if keep_nul {
        buf[IFACE.len()] = 0;
    }
    buf
}

pub fn test_devname_get_default_any_capacity() -> TestResult {
    let store = DeviceNameStore::new();
    for cap in 0..=BUF_LEN {
        let mut buf = [b'a'; BUF_LEN];
        let len = assert_ok!(store.get(&mut buf[..cap]));
        assert_eq_test!(len, 0, "unbound get reports zero length");
    }
    pass!()
}

pub fn test_devname_set_unknown_name() -> TestResult {
    let (table, _) = table_with_iface();
    let mut store = DeviceNameStore::new();
    assert_err!(store.set(b"aaaaa", &table), NetError::NoSuchDevice);
    assert_test!(store.bound().is_none());
    pass!()
}

pub fn test_devname_set_without_nul_needs_exact_length() -> TestResult {
    let (table, idx) = table_with_iface();
    let buf = name_buffer(false);
    for optlen in 1..=BUF_LEN {
        let mut store = DeviceNameStore::new();
        let got = store.set(&buf[..optlen], &table);
        if optlen == IFACE.len() {
            assert_ok!(got, "exact length accepted");
            assert_eq_test!(store.index(), Some(idx));
        } else if got != Err(NetError::NoSuchDevice) {
            return fail!("optlen {}: expected NoSuchDevice, got {:?}", optlen, got);
        }
    }
    pass!()
}

pub fn test_devname_set_with_nul_needs_name_length() -> TestResult {
    let (table, idx) = table_with_iface();
    let buf = name_buffer(true);
    for optlen in 1..=BUF_LEN {
        let mut store = DeviceNameStore::new();
        let got = store.set(&buf[..optlen], &table);
        if optlen >= IFACE.len() {
            if got.is_err() {
                return fail!("optlen {}: expected success, got {:?}", optlen, got);
            }
            assert_eq_test!(store.index(), Some(idx));
        } else if got != Err(NetError::NoSuchDevice) {
            return fail!("optlen {}: short prefix must not match", optlen);
        }
    }
    pass!()
}

pub fn test_devname_failed_set_keeps_previous() -> TestResult {
    let (table, idx) = table_with_iface();
    let mut store = DeviceNameStore::new();
    assert_ok!(store.set(&name_buffer(true), &table));

    let mut out = [b'a'; BUF_LEN];
    let len = assert_ok!(store.get(&mut out));
    assert_eq_test!(len, IFACE.len() + 1);
    assert_eq_test!(&out[..len], b"eth1\0");

    assert_err!(store.set(&[b'a'; BUF_LEN], &table), NetError::NoSuchDevice);
    assert_err!(
        store.set(&IFACE[..IFACE.len() - 1], &table),
        NetError::NoSuchDevice,
        "short set rejected"
    );

    let mut out = [b'a'; BUF_LEN];
    let len = assert_ok!(store.get(&mut out));
    assert_eq_test!(len, IFACE.len() + 1, "name unchanged after failed set");
    assert_eq_test!(&out[..len], b"eth1\0");
    assert_eq_test!(store.index(), Some(idx));
    pass!()
}

pub fn test_devname_get_capacity_floor() -> TestResult {
    let (table, _) = table_with_iface();
    let mut store = DeviceNameStore::new();
    assert_ok!(store.set(&name_buffer(true), &table));

    for cap in 0..=BUF_LEN {
        let mut buf = [b'a'; BUF_LEN];
        let got = store.get(&mut buf[..cap]);
        if cap >= IFNAMSIZ {
            assert_eq_test!(got, Ok(IFACE.len() + 1));
            assert_eq_test!(&buf[..IFACE.len() + 1], b"eth1\0");
        } else {
            assert_eq_test!(got, Err(NetError::InvalidArgument), "below IFNAMSIZ");
            assert_test!(buf.iter().all(|&b| b == b'a'), "buffer untouched");
        }
    }
    pass!()
}

pub fn test_devname_empty_name_unbinds() -> TestResult {
    let (table, _) = table_with_iface();
    let mut store = DeviceNameStore::new();
    assert_ok!(store.set(IFACE, &table));
    assert_ok!(store.set(b"\0garbage", &table), "leading NUL clears");
    assert_test!(store.bound().is_none());

    assert_ok!(store.set(IFACE, &table));
    assert_ok!(store.set(&[], &table), "zero length clears");
    assert_test!(store.index().is_none());

    let mut buf = [0u8; 4];
    assert_eq_test!(store.get(&mut buf), Ok(0));
    pass!()
}

pub fn test_devname_full_length_name() -> TestResult {
    let table = InterfaceTable::new();
    let long = b"fifteen-chars-x";
    let idx = assert_ok!(table.register(long));
    let mut store = DeviceNameStore::new();

    // The window stops at IFNAMSIZ - 1 bytes, so trailing bytes are ignored.
    let mut optval = [b'z'; BUF_LEN];
    optval[..long.len()].copy_from_slice(long);
    assert_ok!(store.set(&optval, &table));
    assert_eq_test!(store.index(), Some(idx));

    let mut out = [0u8; IFNAMSIZ];
    assert_eq_test!(store.get(&mut out), Ok(IFNAMSIZ));
    assert_eq_test!(out[IFNAMSIZ - 1], 0);
    pass!()
}

pub fn test_devname_resolves_against_live_table() -> TestResult {
    let (table, idx) = table_with_iface();
    let mut store = DeviceNameStore::new();
    assert_ok!(store.set(IFACE, &table));

    // A rename keeps the stored index valid, and the old name stops resolving.
    assert_ok!(table.rename(idx, b"wan0"));
    assert_eq_test!(store.index(), Some(idx));
    let mut other = DeviceNameStore::new();
    assert_err!(other.set(IFACE, &table), NetError::NoSuchDevice);
    assert_ok!(other.set(b"wan0", &table));
    assert_eq_test!(other.index(), Some(idx), "same device, new name");

    assert_test!(table.unregister(idx));
    assert_err!(other.set(b"wan0", &table), NetError::NoSuchDevice);
    assert_eq_test!(other.index(), Some(idx), "failed set keeps binding");

    other.clear();
    assert_test!(other.bound().is_none());
    pass!()
}

bindarb_lib::define_test_suite!(
    devname,
    [
        test_devname_get_default_any_capacity,
        test_devname_set_unknown_name,
        test_devname_set_without_nul_needs_exact_length,
        test_devname_set_with_nul_needs_name_length,
        test_devname_failed_set_keeps_previous,
        test_devname_get_capacity_floor,
        test_devname_empty_name_unbinds,
        test_devname_full_length_name,
        test_devname_resolves_against_live_table,
    ]
);
