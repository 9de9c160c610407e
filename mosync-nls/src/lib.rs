//! mosync-nls
//!
//! Text and binary-record encodings used when values cross from the MoSync
//! runtime into the host platform:
//! - [`wide`]: runtime wide strings (16-bit `wchar`) narrowed to bytes
//! - [`record`]: fixed-size records (Bluetooth address, UUID) rendered as hex text
//! - [`Decoder`]: runtime byte strings decoded into host text

use anyhow::{bail, Result};
use encoding_rs::{Encoding as RsEncoding, GB18030, SHIFT_JIS, UTF_8, WINDOWS_1252};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::str::FromStr;

pub mod record;
pub mod wide;

pub use record::{hardware_address_to_hex, uuid_to_hex, BT_ADDR_LEN, UUID_LEN};
pub use wide::{narrow_wide, wide_len, wide_to_bytes, NlsError, WChar};

/// Turns runtime byte strings into host text.
pub trait TextDecoder {
    fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str>;

    /// Like [`TextDecoder::decode`], for a buffer that may hold a NUL before
    /// its end. Only the bytes in front of the NUL are decoded.
    fn decode_cstr<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        match bytes.iter().position(|&b| b == 0) {
            Some(nul) => self.decode(&bytes[..nul]),
            None => self.decode(bytes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Utf8,
    /// ISO-8859-1: byte `b` is `U+00bb`. The exact inverse of wide-string
    /// narrowing for U+0000..U+00FF.
    Latin1,
    ShiftJis,
    /// Treat GBK as GB18030 (superset).
    Gbk,
    Gb18030,
}

impl Encoding {
    #[inline]
    pub fn as_encoding_rs(self) -> &'static RsEncoding {
        match self {
            Encoding::Utf8 => UTF_8,
            // Nearest label; `Decoder` maps Latin-1 bytes itself.
            Encoding::Latin1 => WINDOWS_1252,
            Encoding::ShiftJis => SHIFT_JIS,
            Encoding::Gbk => GB18030,
            Encoding::Gb18030 => GB18030,
        }
    }
}

impl FromStr for Encoding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" | "windows-1252" => Ok(Encoding::Latin1),
            "shiftjis" | "sjis" | "shift_jis" => Ok(Encoding::ShiftJis),
            "gbk" | "gb2312" => Ok(Encoding::Gbk),
            "gb18030" => Ok(Encoding::Gb18030),
            other => bail!("unknown encoding: {other}"),
        }
    }
}

/// Byte-string codec for one [`Encoding`]. Defaults to UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    enc: Encoding,
}

impl Decoder {
    #[inline]
    pub fn new(enc: Encoding) -> Self {
        Self { enc }
    }

    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.enc
    }

    /// Runtime bytes for `s`. Characters the encoding lacks become `?`.
    pub fn encode<'a>(&self, s: &'a str) -> Cow<'a, [u8]> {
        match self.enc {
            Encoding::Utf8 => Cow::Borrowed(s.as_bytes()),
            Encoding::Latin1 if s.is_ascii() => Cow::Borrowed(s.as_bytes()),
            Encoding::Latin1 => Cow::Owned(
                s.chars()
                    .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                    .collect(),
            ),
            enc => enc.as_encoding_rs().encode(s).0,
        }
    }

    /// Narrow a runtime wide string and decode the resulting bytes.
    ///
    /// The narrowing step is the lossy one; see [`wide::wide_to_bytes`].
    pub fn decode_wide(&self, units: &[WChar]) -> Result<String, NlsError> {
        let bytes = narrow_wide(units)?;
        Ok(self.decode(&bytes).into_owned())
    }
}

impl TextDecoder for Decoder {
    fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        match self.enc {
            Encoding::Utf8 => String::from_utf8_lossy(bytes),
            Encoding::Latin1 if bytes.is_ascii() => String::from_utf8_lossy(bytes),
            Encoding::Latin1 => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
            enc => enc.as_encoding_rs().decode_without_bom_handling(bytes).0,
        }
    }
}
