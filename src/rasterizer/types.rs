//! Core types for the rasterizer: RGB555 colors, clamping, packed attribute words

use bit_field::BitField;
use serde::{Deserialize, Serialize};

/// 15-bit color, 5 bits per channel (red in the low bits), top bit unused
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(u8, u8, u8)", into = "(u8, u8, u8)")]
pub struct Rgb15(pub u16);

impl Rgb15 {
    pub const BLACK: Rgb15 = Rgb15(0x0000);
    pub const WHITE: Rgb15 = Rgb15(0x7FFF);
    pub const RED: Rgb15 = Rgb15(0x001F);
    pub const GREEN: Rgb15 = Rgb15(0x03E0);
    pub const BLUE: Rgb15 = Rgb15(0x7C00);

    /// Pack three 5-bit channels, see [`pack_rgb15`]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb15(pack_rgb15(r, g, b))
    }

    /// Unpack into (r, g, b), each 0-31
    pub const fn channels(self) -> (u8, u8, u8) {
        (
            (self.0 & 0x1F) as u8,
            ((self.0 >> 5) & 0x1F) as u8,
            ((self.0 >> 10) & 0x1F) as u8,
        )
    }

    /// Expand to 8-bit RGBA for host-side display
    pub fn to_rgba8(self) -> [u8; 4] {
        let (r, g, b) = self.channels();
        let expand = |c: u8| (c << 3) | (c >> 2);
        [expand(r), expand(g), expand(b), 255]
    }
}

impl From<(u8, u8, u8)> for Rgb15 {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Rgb15::new(r, g, b)
    }
}

impl From<Rgb15> for (u8, u8, u8) {
    fn from(color: Rgb15) -> Self {
        color.channels()
    }
}

/// `r | (g << 5) | (b << 10)`.
///
/// Channels are expected in `0..=31`. Nothing is masked: an out-of-range
/// channel spills into its neighbour's bits (red 32 reads back as green 1).
pub const fn pack_rgb15(r: u8, g: u8, b: u8) -> u16 {
    (r as u16) | ((g as u16) << 5) | ((b as u16) << 10)
}

/// Clamp `value` into `[min, max]`. Expects `min <= max`.
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

pub const OBJECT_ATTR0_Y_MASK: u16 = 0x00FF;
pub const OBJECT_ATTR1_X_MASK: u16 = 0x01FF;
pub const OBJECT_ATTR2_TILE_MASK: u16 = 0x03FF;

/// Sprite attribute words as the object hardware reads them.
///
/// Only the coordinate and tile fields have accessors; the remaining mode,
/// shape and size bits are kept as written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjAttr {
    pub attr0: u16,
    pub attr1: u16,
    pub attr2: u16,
}

impl ObjAttr {
    pub fn y(&self) -> u16 {
        self.attr0 & OBJECT_ATTR0_Y_MASK
    }

    /// Negative coordinates wrap the way the hardware does (modulo 256)
    pub fn set_y(&mut self, y: i32) {
        self.attr0 = (self.attr0 & !OBJECT_ATTR0_Y_MASK) | (y as u16 & OBJECT_ATTR0_Y_MASK);
    }

    pub fn x(&self) -> u16 {
        self.attr1 & OBJECT_ATTR1_X_MASK
    }

    /// Negative coordinates wrap the way the hardware does (modulo 512)
    pub fn set_x(&mut self, x: i32) {
        self.attr1 = (self.attr1 & !OBJECT_ATTR1_X_MASK) | (x as u16 & OBJECT_ATTR1_X_MASK);
    }

    pub fn tile_index(&self) -> u16 {
        self.attr2 & OBJECT_ATTR2_TILE_MASK
    }

    pub fn set_tile_index(&mut self, tile: u16) {
        self.attr2 = (self.attr2 & !OBJECT_ATTR2_TILE_MASK) | (tile & OBJECT_ATTR2_TILE_MASK);
    }
}

/// Gameplay flags packed into one 32-bit word.
///
/// | Bits   | Field             |
/// |--------|-------------------|
/// | 0      | `is_enemy`        |
/// | 1      | `is_destructible` |
/// | 2..12  | `health` (0-1023) |
/// | 12..32 | reserved          |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TraitFields", into = "TraitFields")]
pub struct ObjectTraits(u32);

impl ObjectTraits {
    const ENEMY_BIT: usize = 0;
    const DESTRUCTIBLE_BIT: usize = 1;
    const HEALTH_BITS: std::ops::Range<usize> = 2..12;
    const RESERVED_BITS: std::ops::Range<usize> = 12..32;
    pub const MAX_HEALTH: u16 = 0x3FF;

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub fn is_enemy(self) -> bool {
        self.0.get_bit(Self::ENEMY_BIT)
    }

    pub fn set_enemy(&mut self, enemy: bool) {
        self.0.set_bit(Self::ENEMY_BIT, enemy);
    }

    pub fn is_destructible(self) -> bool {
        self.0.get_bit(Self::DESTRUCTIBLE_BIT)
    }

    pub fn set_destructible(&mut self, destructible: bool) {
        self.0.set_bit(Self::DESTRUCTIBLE_BIT, destructible);
    }

    pub fn health(self) -> u16 {
        self.0.get_bits(Self::HEALTH_BITS) as u16
    }

    /// Saturates at [`Self::MAX_HEALTH`]
    pub fn set_health(&mut self, health: u16) {
        let health = health.min(Self::MAX_HEALTH) as u32;
        self.0.set_bits(Self::HEALTH_BITS, health);
    }

    pub fn reserved(self) -> u32 {
        self.0.get_bits(Self::RESERVED_BITS)
    }
}

/// Field-wise form of [`ObjectTraits`] used in scene files
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct TraitFields {
    #[serde(default)]
    enemy: bool,
    #[serde(default)]
    destructible: bool,
    #[serde(default)]
    health: u16,
}

impl From<TraitFields> for ObjectTraits {
    fn from(fields: TraitFields) -> Self {
        let mut traits = ObjectTraits::default();
        traits.set_enemy(fields.enemy);
        traits.set_destructible(fields.destructible);
        traits.set_health(fields.health);
        traits
    }
}

impl From<ObjectTraits> for TraitFields {
    fn from(traits: ObjectTraits) -> Self {
        Self {
            enemy: traits.is_enemy(),
            destructible: traits.is_destructible(),
            health: traits.health(),
        }
    }
}

/// Rasterizer settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterSettings {
    /// Distance between the eye and the projection plane
    pub focal_length: f32,
    /// Color the off-screen buffer is cleared to every frame
    pub clear_color: Rgb15,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            focal_length: 160.0,
            clear_color: Rgb15::BLACK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_rgb15() {
        assert_eq!(pack_rgb15(31, 0, 0), 0x001F);
        assert_eq!(pack_rgb15(0, 31, 0), 0x03E0);
        assert_eq!(pack_rgb15(0, 0, 31), 0x7C00);
        assert_eq!(Rgb15::new(31, 31, 31), Rgb15::WHITE);
        assert_eq!(Rgb15::new(12, 7, 30).channels(), (12, 7, 30));
    }

    #[test]
    fn test_pack_rgb15_overflow_spills() {
        // red 32 is bit 5, which is green's lowest bit
        assert_eq!(pack_rgb15(32, 0, 0), pack_rgb15(0, 1, 0));
    }

    #[test]
    fn test_to_rgba8_full_range() {
        assert_eq!(Rgb15::WHITE.to_rgba8(), [255, 255, 255, 255]);
        assert_eq!(Rgb15::BLACK.to_rgba8(), [0, 0, 0, 255]);
        assert_eq!(Rgb15::RED.to_rgba8(), [255, 0, 0, 255]);
    }

    #[test]
    fn test_clamp_stays_in_range() {
        for (min, max) in [(-100, 100), (0, 0), (-5, 3)] {
            for value in -300..300 {
                let c = clamp(value, min, max);
                assert!(c >= min && c <= max);
                if value >= min && value <= max {
                    assert_eq!(c, value);
                }
            }
        }
        assert_eq!(clamp(-101.5_f32, -100.0, 100.0), -100.0);
        assert_eq!(clamp(42.25_f32, -100.0, 100.0), 42.25);
    }

    #[test]
    fn test_obj_attr_masks() {
        let mut attr = ObjAttr { attr0: 0xFF00, attr1: 0xFE00, attr2: 0xFC00 };
        attr.set_y(80);
        attr.set_x(120);
        attr.set_tile_index(0x7FF);
        assert_eq!(attr.y(), 80);
        assert_eq!(attr.x(), 120);
        assert_eq!(attr.tile_index(), 0x3FF);
        // high bits untouched
        assert_eq!(attr.attr0 & 0xFF00, 0xFF00);
        assert_eq!(attr.attr1 & 0xFE00, 0xFE00);
        assert_eq!(attr.attr2 & 0xFC00, 0xFC00);
    }

    #[test]
    fn test_obj_attr_negative_wraps() {
        let mut attr = ObjAttr::default();
        attr.set_x(-1);
        attr.set_y(-1);
        assert_eq!(attr.x(), 0x1FF);
        assert_eq!(attr.y(), 0xFF);
    }

    #[test]
    fn test_object_traits_fields() {
        let mut traits = ObjectTraits::default();
        traits.set_enemy(true);
        traits.set_health(700);
        assert!(traits.is_enemy());
        assert!(!traits.is_destructible());
        assert_eq!(traits.health(), 700);
        assert_eq!(traits.bits(), 1 | (700 << 2));

        traits.set_health(5000);
        assert_eq!(traits.health(), ObjectTraits::MAX_HEALTH);
        assert_eq!(traits.reserved(), 0);
    }

    #[test]
    fn test_object_traits_setters_keep_reserved_bits() {
        let mut traits = ObjectTraits::from_bits(0xABCD_E000 | 0b10);
        assert!(traits.is_destructible());
        assert_eq!(traits.reserved(), 0xABCDE);

        traits.set_health(3);
        traits.set_enemy(true);
        assert_eq!(traits.reserved(), 0xABCDE);
        assert_eq!(traits.bits(), 0xABCD_E000 | (3 << 2) | 0b11);
    }
}
