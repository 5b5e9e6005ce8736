//! Colour values carried on the wire

/// 24-bit colour
///
/// On the wire a colour is the little-endian encoding of `0xRRGGBB`, so
/// the blue byte comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a colour from `0xRRGGBB`; anything above bit 23 is dropped
    pub const fn from_u32(value: u32) -> Self {
        Self {
            r: (value >> 16) as u8,
            g: (value >> 8) as u8,
            b: value as u8,
        }
    }

    /// Pack as `0xRRGGBB`
    pub const fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Parse the 3-byte wire form (B, G, R)
    pub const fn from_wire(bytes: [u8; 3]) -> Self {
        Self::new(bytes[2], bytes[1], bytes[0])
    }

    /// Encode to the 3-byte wire form (B, G, R)
    pub const fn to_wire(self) -> [u8; 3] {
        [self.b, self.g, self.r]
    }
}

/// Background of a monochrome bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Background {
    /// Clear bits are drawn in this colour
    Color(Rgb),
    /// Clear bits keep whatever was on screen before the bitmap was drawn
    Transparent,
}

/// Wire value selecting [`Background::Transparent`]
pub const TRANSPARENT: i32 = -1;

impl Background {
    /// Decode the signed 32-bit wire value
    pub const fn from_wire(value: i32) -> Self {
        if value == TRANSPARENT {
            Background::Transparent
        } else {
            Background::Color(Rgb::from_u32(value as u32))
        }
    }

    /// Encode to the signed 32-bit wire value
    pub const fn to_wire(self) -> i32 {
        match self {
            Background::Color(color) => color.to_u32() as i32,
            Background::Transparent => TRANSPARENT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_u32_masks_high_byte() {
        let color = Rgb::from_u32(0xFF12_3456);
        assert_eq!(color, Rgb::new(0x12, 0x34, 0x56));
        assert_eq!(color.to_u32(), 0x12_3456);
    }

    #[test]
    fn test_wire_order_is_blue_first() {
        let color = Rgb::new(0x10, 0x20, 0x30);
        assert_eq!(color.to_wire(), [0x30, 0x20, 0x10]);
        assert_eq!(Rgb::from_wire([0x30, 0x20, 0x10]), color);
    }

    #[test]
    fn test_background_sentinel() {
        assert_eq!(Background::from_wire(-1), Background::Transparent);
        assert_eq!(Background::Transparent.to_wire(), -1);
    }

    #[test]
    fn test_background_other_negative_values_are_colors() {
        // -2 is 0xFFFFFFFE; only the low 24 bits survive
        assert_eq!(
            Background::from_wire(-2),
            Background::Color(Rgb::new(0xFF, 0xFF, 0xFE))
        );
    }
}
