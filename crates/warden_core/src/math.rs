//! Fixed-point math utilities for deterministic simulation.
//!
//! Positions, velocities, rotations and health all use fixed-point
//! arithmetic so that an authority and its mirrors agree bit-for-bit.
//! Angles are expressed in degrees in the range `[0, 360)`.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Simulation scalar: 32 integer bits, 32 fractional bits.
pub type Fixed = I32F32;

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// `#[serde(with)]` adapter writing a [`Fixed`] as its raw `i64` bits.
///
/// RON content files carry the same raw bits, so `1` is written as
/// `4294967296`.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        i64::deserialize(deserializer).map(Fixed::from_bits)
    }
}

/// Raw-bits adapter for `Option<Fixed>`.
pub mod option_fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<Fixed>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.map(Fixed::to_bits).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Fixed>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<i64>::deserialize(deserializer)?.map(Fixed::from_bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Squared distance to `other`; compare against a squared range.
    ///
    /// Saturates at `Fixed::MAX` for points more than about 46 000 units
    /// apart.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        (self - other).dot(self - other)
    }

    /// Length of the vector, saturating like [`Self::distance_squared`].
    #[must_use]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.dot(self))
    }

    /// Multiply both components by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Shrink the vector so its length does not exceed `max`.
    #[must_use]
    pub fn clamp_length(self, max: Fixed) -> Self {
        let len = self.length();
        if len <= max || len == Fixed::ZERO {
            self
        } else {
            self.scale(max / len)
        }
    }

    /// Angle of this vector in degrees, measured counter-clockwise from +X.
    #[must_use]
    pub fn angle(self) -> Fixed {
        atan2_degrees(self.y, self.x)
    }

    /// Angle from `self` towards `other`, in degrees.
    #[must_use]
    pub fn angle_to(self, other: Self) -> Fixed {
        (other - self).angle()
    }

    /// Dot product of two vectors, saturating on overflow.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.y.saturating_mul(other.y))
    }

    /// Linearly interpolate between two vectors.
    #[must_use]
    pub fn lerp(self, other: Self, t: Fixed) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == Fixed::ZERO {
            Self::ZERO
        } else {
            Self::new(self.x / len, self.y / len)
        }
    }
}

/// Square root by bisection.
fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }
    let mut low = Fixed::ZERO;
    let mut high = value.max(Fixed::ONE);
    for _ in 0..32 {
        let mid = low + (high - low) / 2;
        if mid.saturating_mul(mid) <= value {
            low = mid;
        } else {
            high = mid;
        }
    }
    low
}

/// Degrees in a full turn.
fn full_turn() -> Fixed {
    Fixed::from_num(360)
}

/// Wrap an angle into `[0, 360)`.
#[must_use]
pub fn wrap_degrees(angle: Fixed) -> Fixed {
    let mut wrapped = angle % full_turn();
    if wrapped < Fixed::ZERO {
        wrapped += full_turn();
    }
    wrapped
}

/// Signed shortest rotation from `from` to `to`, in `(-180, 180]`.
#[must_use]
pub fn angle_delta(from: Fixed, to: Fixed) -> Fixed {
    let delta = wrap_degrees(to - from);
    if delta > Fixed::from_num(180) {
        delta - full_turn()
    } else {
        delta
    }
}

/// Interpolate between two angles along the shortest arc.
#[must_use]
pub fn lerp_angle(from: Fixed, to: Fixed, t: Fixed) -> Fixed {
    wrap_degrees(from + angle_delta(from, to) * t)
}

/// Fixed-point `atan2` in degrees, result in `[0, 360)`.
///
/// Uses a rational approximation of `atan` on `[0, 1]` (max error well
/// under a tenth of a degree), mirrored into the remaining octants.
#[must_use]
pub fn atan2_degrees(y: Fixed, x: Fixed) -> Fixed {
    if x == Fixed::ZERO && y == Fixed::ZERO {
        return Fixed::ZERO;
    }

    let ax = x.abs();
    let ay = y.abs();
    let (z, steep) = if ax >= ay { (ay / ax, false) } else { (ax / ay, true) };

    let one = Fixed::from_num(1);
    let c1 = Fixed::from_num(1402) / Fixed::from_num(100);
    let c2 = Fixed::from_num(380) / Fixed::from_num(100);
    let mut angle = Fixed::from_num(45) * z + z * (one - z) * (c1 + c2 * z);

    if steep {
        angle = Fixed::from_num(90) - angle;
    }
    if x < Fixed::ZERO {
        angle = Fixed::from_num(180) - angle;
    }
    if y < Fixed::ZERO {
        angle = full_turn() - angle;
    }

    wrap_degrees(angle)
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_sub(rhs.x),
            y: self.y.saturating_sub(rhs.y),
        }
    }
}
