//! Runtime wide strings.
//!
//! The runtime stores text as zero-terminated arrays of 16-bit code units.
//! The host side wants bytes, so every unit is narrowed to its low byte. This
//! is lossy for anything outside U+0000..U+00FF and is kept that way so hosts
//! see exactly the bytes they always saw.

/// One runtime `wchar` code unit.
pub type WChar = u16;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NlsError {
    #[error("failed to allocate {bytes} bytes for a narrowed string")]
    Allocation { bytes: usize },
}

/// Number of code units before the zero terminator.
///
/// `None` stands for a null string and has length 0. A slice without a
/// terminator is measured up to its end.
pub fn wide_len(s: Option<&[WChar]>) -> usize {
    match s {
        None => 0,
        Some(s) => s.iter().position(|&c| c == 0).unwrap_or(s.len()),
    }
}

/// Narrow up to `n` code units of `src` into `dst`.
///
/// With `dst == None` nothing is written and the number of bytes a real
/// conversion would produce is returned, so callers can size a buffer first.
///
/// Otherwise units are copied (low byte only) until `n` units were consumed,
/// a zero unit was met or `dst` is full. A terminating NUL is written if there
/// is room for it. The return value never counts the terminator.
pub fn wide_to_bytes(dst: Option<&mut [u8]>, src: &[WChar], n: usize) -> usize {
    let Some(dst) = dst else {
        return src.iter().take(n).take_while(|&&c| c != 0).count();
    };

    let mut count = 0;
    for (&unit, slot) in src.iter().take(n).zip(dst.iter_mut()) {
        if unit == 0 {
            break;
        }
        // Truncating cast: the host only ever received the low byte.
        *slot = unit as u8;
        count += 1;
    }
    if let Some(slot) = dst.get_mut(count) {
        *slot = 0;
    }
    count
}

/// Two-pass conversion of a wide string into an owned byte buffer.
///
/// The buffer is reserved fallibly; an allocation failure aborts the
/// conversion instead of writing through a missing buffer.
pub fn narrow_wide(src: &[WChar]) -> Result<Vec<u8>, NlsError> {
    let len = wide_len(Some(src));
    let size = wide_to_bytes(None, src, len);

    let mut buf = Vec::new();
    buf.try_reserve_exact(size + 1)
        .map_err(|_| NlsError::Allocation { bytes: size + 1 })?;
    buf.resize(size + 1, 0);

    let written = wide_to_bytes(Some(&mut buf), src, len);
    buf.truncate(written);
    Ok(buf)
}
