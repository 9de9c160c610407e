//! The runtime's linear memory as seen from the shim.
//!
//! Pointers arrive as absolute runtime addresses. The host never sees those;
//! it only receives offsets from the start of the window.

use byteorder::{ByteOrder, LittleEndian};
use mosync_nls::WChar;

use crate::error::ShimError;

/// Rebase a linear address onto the window start.
///
/// Plain arithmetic with no range check; [`MemoryWindow::offset_of`] is the
/// checked form.
#[inline]
pub fn to_offset(address: u32, base: u32) -> u32 {
    address.wrapping_sub(base)
}

/// Bounds-checked view of the runtime memory region starting at `base`.
pub struct MemoryWindow<'m> {
    base: u32,
    mem: &'m mut [u8],
}

impl<'m> MemoryWindow<'m> {
    pub fn new(base: u32, mem: &'m mut [u8]) -> Self {
        Self { base, mem }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.mem.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mem.is_empty()
    }

    /// One past the last addressable byte.
    pub fn end(&self) -> u64 {
        self.base as u64 + self.mem.len() as u64
    }

    fn out_of_range(&self, address: u32) -> ShimError {
        ShimError::OutOfRange { address, base: self.base, end: self.end() }
    }

    /// Offset of `address` inside the window.
    ///
    /// The end address itself is accepted so a zero-sized buffer may sit right
    /// after the last byte.
    pub fn offset_of(&self, address: u32) -> Result<u32, ShimError> {
        if address < self.base || address as u64 > self.end() {
            return Err(self.out_of_range(address));
        }
        Ok(to_offset(address, self.base))
    }

    /// Offset in the form host methods take (`int` on the host side).
    pub fn host_offset(&self, address: u32) -> Result<i32, ShimError> {
        let off = self.offset_of(address)?;
        i32::try_from(off).map_err(|_| self.out_of_range(address))
    }

    fn range(&self, address: u32, len: usize) -> Result<std::ops::Range<usize>, ShimError> {
        let start = self.offset_of(address)? as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.mem.len() => Ok(start..end),
            _ => Err(self.out_of_range(address)),
        }
    }

    pub fn slice(&self, address: u32, len: usize) -> Result<&[u8], ShimError> {
        let r = self.range(address, len)?;
        Ok(&self.mem[r])
    }

    pub fn slice_mut(&mut self, address: u32, len: usize) -> Result<&mut [u8], ShimError> {
        let r = self.range(address, len)?;
        Ok(&mut self.mem[r])
    }

    /// Copy a packed record of `N` bytes out of the window.
    pub fn read_array<const N: usize>(&self, address: u32) -> Result<[u8; N], ShimError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(address, N)?);
        Ok(out)
    }

    /// Bytes of the NUL-terminated string at `address`, terminator excluded.
    pub fn read_cstr(&self, address: u32) -> Result<&[u8], ShimError> {
        let start = self.offset_of(address)? as usize;
        let tail = &self.mem[start..];
        let len = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or(ShimError::Unterminated { address })?;
        Ok(&tail[..len])
    }

    /// Code units of the zero-terminated wide string at `address`, terminator
    /// excluded. Units are little-endian and need not be aligned.
    pub fn read_wide(&self, address: u32) -> Result<Vec<WChar>, ShimError> {
        let start = self.offset_of(address)? as usize;
        let mut units = Vec::new();
        for chunk in self.mem[start..].chunks_exact(2) {
            let unit = LittleEndian::read_u16(chunk);
            if unit == 0 {
                return Ok(units);
            }
            units.push(unit);
        }
        Err(ShimError::Unterminated { address })
    }

    /// Store `values` as consecutive little-endian `i32`s.
    pub fn write_i32s(&mut self, address: u32, values: &[i32]) -> Result<(), ShimError> {
        let dst = self.slice_mut(address, values.len() * 4)?;
        LittleEndian::write_i32_into(values, dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_plain_difference() {
        assert_eq!(to_offset(0x1234, 0x1000), 0x234);
        assert_eq!(to_offset(0x8000_1234, 0x8000_1000), 0x234);
        assert_eq!(to_offset(7, 7), 0);
    }

    #[test]
    fn checked_offsets() {
        let mut mem = [0u8; 16];
        let w = MemoryWindow::new(0x100, &mut mem);
        assert_eq!(w.offset_of(0x100).unwrap(), 0);
        assert_eq!(w.offset_of(0x10F).unwrap(), 15);
        assert_eq!(w.offset_of(0x110).unwrap(), 16);
        assert!(matches!(
            w.offset_of(0x111),
            Err(ShimError::OutOfRange { address: 0x111, base: 0x100, end: 0x110 })
        ));
        assert!(w.offset_of(0xFF).is_err());
    }

    #[test]
    fn slices_must_fit() {
        let mut mem = [0u8; 8];
        let w = MemoryWindow::new(0, &mut mem);
        assert_eq!(w.slice(4, 4).unwrap().len(), 4);
        assert!(w.slice(5, 4).is_err());
        assert!(w.slice(0, usize::MAX).is_err());
        assert!(w.slice(8, 0).unwrap().is_empty());
    }

    #[test]
    fn cstr_needs_terminator() {
        let mut mem = *b"key\0abc";
        let w = MemoryWindow::new(0x40, &mut mem);
        assert_eq!(w.read_cstr(0x40).unwrap(), b"key");
        assert!(matches!(w.read_cstr(0x44), Err(ShimError::Unterminated { address: 0x44 })));
    }

    #[test]
    fn wide_strings_unaligned() {
        let mut mem = [0xEE, b'h', 0, b'i', 0, 0, 0];
        let w = MemoryWindow::new(0, &mut mem);
        assert_eq!(w.read_wide(1).unwrap(), vec![b'h' as u16, b'i' as u16]);

        let mut open = [b'a', 0, b'b', 0, 0];
        let w = MemoryWindow::new(0, &mut open);
        assert!(matches!(w.read_wide(0), Err(ShimError::Unterminated { address: 0 })));
    }

    #[test]
    fn write_little_endian_words() {
        let mut mem = [0u8; 8];
        let mut w = MemoryWindow::new(0x10, &mut mem);
        w.write_i32s(0x10, &[1, -1]).unwrap();
        assert!(w.write_i32s(0x14, &[0, 0]).is_err());
        assert_eq!(mem, [1, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF]);
    }
}
