//! Hex text forms of fixed-size binary records handed to the host.

use uuid::Uuid;

/// Size of a packed Bluetooth device address (`MABtAddr`).
pub const BT_ADDR_LEN: usize = 6;
/// Size of a packed 128-bit UUID (`MAUUID`).
pub const UUID_LEN: usize = 16;

/// `001A2B3C4D5E` style: 12 uppercase hex digits, first byte first.
pub fn hardware_address_to_hex(addr: &[u8; BT_ADDR_LEN]) -> String {
    hex::encode_upper(addr)
}

/// 32 uppercase hex digits with the first three fields stored little-endian.
///
/// Bytes `00 11 22 33 44 55 66 77 88 99 AA BB CC DD EE FF` render as
/// `33221100554477668899AABBCCDDEEFF`: the 4-, 2- and 2-byte groups are
/// reversed, the trailing 8 bytes are emitted as they are.
pub fn uuid_to_hex(uuid: &[u8; UUID_LEN]) -> String {
    let mut buf = Uuid::encode_buffer();
    Uuid::from_bytes_le(*uuid)
        .simple()
        .encode_upper(&mut buf)
        .to_owned()
}
