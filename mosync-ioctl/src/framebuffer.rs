//! `maFrameBufferGetInfo`: answered locally, no host round trip.

use crate::error::ShimError;
use crate::memory::MemoryWindow;
use crate::trace;

/// Size of `MAFrameBufferInfo` in runtime memory: 16 `int` fields.
pub const FRAME_BUFFER_INFO_SIZE: usize = 16 * 4;

/// Layout of the 32-bit RGBX frame buffer the Android host exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameBufferInfo {
    pub size_in_bytes: i32,
    pub bytes_per_pixel: i32,
    pub bits_per_pixel: i32,
    pub red_mask: u32,
    pub red_shift: u32,
    pub red_bits: u32,
    pub green_mask: u32,
    pub green_shift: u32,
    pub green_bits: u32,
    pub blue_mask: u32,
    pub blue_shift: u32,
    pub blue_bits: u32,
    pub width: i32,
    pub height: i32,
    pub pitch: i32,
    pub supports_gfx_syscalls: i32,
}

impl FrameBufferInfo {
    /// `extent` packs the screen size as `width << 16 | height`.
    ///
    /// Sizes are runtime `int`s and wrap like them for extents past 2 GiB.
    pub fn for_extent(extent: i32) -> Self {
        let width = ((extent as u32 & 0xffff_0000) >> 16) as i32;
        let height = (extent as u32 & 0x0000_ffff) as i32;
        let pitch = width.wrapping_mul(4);

        Self {
            size_in_bytes: pitch.wrapping_mul(height),
            bytes_per_pixel: 4,
            bits_per_pixel: 32,
            red_mask: 0x0000_00ff,
            red_shift: 0,
            red_bits: 8,
            green_mask: 0x0000_ff00,
            green_shift: 8,
            green_bits: 8,
            blue_mask: 0x00ff_0000,
            blue_shift: 16,
            blue_bits: 8,
            width,
            height,
            pitch,
            supports_gfx_syscalls: 0,
        }
    }

    /// Field values in `MAFrameBufferInfo` order.
    pub fn to_words(&self) -> [i32; 16] {
        [
            self.size_in_bytes,
            self.bytes_per_pixel,
            self.bits_per_pixel,
            self.red_mask as i32,
            self.red_shift as i32,
            self.red_bits as i32,
            self.green_mask as i32,
            self.green_shift as i32,
            self.green_bits as i32,
            self.blue_mask as i32,
            self.blue_shift as i32,
            self.blue_bits as i32,
            self.width,
            self.height,
            self.pitch,
            self.supports_gfx_syscalls,
        ]
    }
}

/// Fill the `MAFrameBufferInfo` at `info_ptr` for a screen of size `extent`.
/// Returns 1.
pub fn frame_buffer_get_info(
    mem: &mut MemoryWindow<'_>,
    info_ptr: u32,
    extent: i32,
) -> Result<i32, ShimError> {
    let info = FrameBufferInfo::for_extent(extent);
    mem.write_i32s(info_ptr, &info.to_words())?;
    trace::memory(format_args!(
        "frame buffer info at 0x{info_ptr:X}: {}x{} pitch={}",
        info.width, info.height, info.pitch
    ));
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{ByteOrder, LittleEndian};
    use pretty_assertions::assert_eq;

    #[test]
    fn layout_for_480x800() {
        let mut mem = vec![0u8; 0x100];
        let mut w = MemoryWindow::new(0x1000, &mut mem);
        assert_eq!(frame_buffer_get_info(&mut w, 0x1010, (480 << 16) | 800).unwrap(), 1);

        let mut words = [0i32; 16];
        LittleEndian::read_i32_into(&mem[0x10..0x10 + FRAME_BUFFER_INFO_SIZE], &mut words);
        assert_eq!(
            words,
            [
                480 * 4 * 800,
                4,
                32,
                0xff,
                0,
                8,
                0xff00,
                8,
                8,
                0xff0000,
                16,
                8,
                480,
                800,
                480 * 4,
                0
            ]
        );
    }

    #[test]
    fn huge_extent_wraps_like_int() {
        let mut mem = vec![0u8; FRAME_BUFFER_INFO_SIZE];
        let mut w = MemoryWindow::new(0, &mut mem);
        assert_eq!(frame_buffer_get_info(&mut w, 0, (0x8000 << 16) | 0x4000).unwrap(), 1);

        let info = FrameBufferInfo::for_extent((0x8000 << 16) | 0x4000);
        assert_eq!(info.pitch, 0x2_0000);
        // 0x8000 * 4 * 0x4000 == 2^31
        assert_eq!(info.size_in_bytes, i32::MIN);
        assert_eq!(LittleEndian::read_i32(&mem[..4]), i32::MIN);

        let widest = FrameBufferInfo::for_extent(-1);
        assert_eq!((widest.width, widest.height), (0xffff, 0xffff));
        assert_eq!(widest.size_in_bytes, (0xffff * 4i32).wrapping_mul(0xffff));
    }

    #[test]
    fn info_must_fit_in_window() {
        let mut mem = vec![0u8; FRAME_BUFFER_INFO_SIZE - 1];
        let mut w = MemoryWindow::new(0, &mut mem);
        assert!(matches!(
            frame_buffer_get_info(&mut w, 0, 0x0001_0001),
            Err(ShimError::OutOfRange { .. })
        ));
    }
}
