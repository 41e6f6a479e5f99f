//! Integer alpha compositing for packed ARGB pixels

/// Alpha bits forced onto every stored pixel
pub const OPAQUE: u32 = 0xFF00_0000;

/// Blend a 24-bit source color with weight `alpha` over `dst`.
///
/// Each channel is `(src * a + dst * (255 - a)) >> 8`. Shifting by 8 divides
/// by 256 instead of 255, so results can land one step low. The bias is
/// known and kept bit-exact so existing clients see the same colors.
#[inline]
pub fn blend(src: u32, alpha: u8, dst: u32) -> u32 {
    let a = u32::from(alpha);
    let na = 255 - a;

    let mix = |shift: u32| -> u32 {
        let s = (src >> shift) & 0xFF;
        let d = (dst >> shift) & 0xFF;
        ((s * a + d * na) >> 8) << shift
    };

    OPAQUE | mix(16) | mix(8) | mix(0)
}

/// Split a packed pixel into its RGB channels
#[inline]
pub fn channels(pixel: u32) -> (u8, u8, u8) {
    ((pixel >> 16) as u8, (pixel >> 8) as u8, pixel as u8)
}
