use std::ops::{Add, Mul};

/// 8-bit RGB color. Blend math stays closed over 0..=255: addition
/// saturates and the masking multiply divides back down by 255.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

fn mask_channel(a: u8, b: u8) -> u8 {
    ((u16::from(a) * u16::from(b)) / 255) as u8
}

impl Rgb8 {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Unpacks `0xRRGGBB`; the top byte is ignored.
    pub const fn from_rgb_u32(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as u8,
            g: ((rgb >> 8) & 0xff) as u8,
            b: (rgb & 0xff) as u8,
        }
    }

    /// Channel-wise saturating addition.
    pub fn saturating_add(self, other: Self) -> Self {
        Self {
            r: self.r.saturating_add(other.r),
            g: self.g.saturating_add(other.g),
            b: self.b.saturating_add(other.b),
        }
    }

    /// Channel-wise masking multiply, `(a*b)/255` with integer floor.
    /// The mask channel acts as a 0..=255 coefficient.
    pub fn mask(self, mask: Self) -> Self {
        Self {
            r: mask_channel(self.r, mask.r),
            g: mask_channel(self.g, mask.g),
            b: mask_channel(self.b, mask.b),
        }
    }

    /// Scales every channel by `num/den`, clamped to 0..=255. The multiply
    /// runs in u64 so arbitrary u32 factors cannot overflow.
    pub fn scale(self, num: u32, den: u32) -> Self {
        fn scale_channel(c: u8, num: u32, den: u32) -> u8 {
            if den == 0 {
                return 0;
            }
            ((u64::from(c) * u64::from(num) / u64::from(den)).min(255)) as u8
        }
        Self {
            r: scale_channel(self.r, num, den),
            g: scale_channel(self.g, num, den),
            b: scale_channel(self.b, num, den),
        }
    }

    /// HSV to RGB. `h` in degrees (any value, wrapped), `s` and `v` in 0..=1.
    pub fn from_hsv(h: f64, s: f64, v: f64) -> Self {
        let s = s.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);
        let h = h.rem_euclid(360.0);

        let c = v * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = v - c;

        let (r1, g1, b1) = match (h / 60.0) as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        fn to_u8(v: f64) -> u8 {
            (v * 255.0).round().clamp(0.0, 255.0) as u8
        }
        Self {
            r: to_u8(r1 + m),
            g: to_u8(g1 + m),
            b: to_u8(b1 + m),
        }
    }
}

impl Add for Rgb8 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl Mul for Rgb8 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.mask(rhs)
    }
}
