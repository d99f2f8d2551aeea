//! Motion smoothing for mirrored units.
//!
//! A mirror receives authoritative positions in discrete snapshots. Instead
//! of snapping to each one, the unit keeps both endpoints here and eases
//! from the old pose to the new one over the observed snapshot spacing.

use serde::{Deserialize, Serialize};

use crate::math::{lerp_angle, Fixed, Vec2Fixed};

/// Ticks assumed between snapshots before two have been observed.
pub const DEFAULT_SNAPSHOT_SPACING: u32 = 4;

/// Old/new pose pair for one mirrored unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpolator {
    last_position: Vec2Fixed,
    target_position: Vec2Fixed,
    #[serde(with = "crate::math::fixed_serde")]
    last_rotation: Fixed,
    #[serde(with = "crate::math::fixed_serde")]
    target_rotation: Fixed,
    ticks_since_read: u32,
    spacing: u32,
    primed: bool,
}

impl Default for Interpolator {
    fn default() -> Self {
        Self {
            last_position: Vec2Fixed::ZERO,
            target_position: Vec2Fixed::ZERO,
            last_rotation: Fixed::ZERO,
            target_rotation: Fixed::ZERO,
            ticks_since_read: 0,
            spacing: DEFAULT_SNAPSHOT_SPACING,
            primed: false,
        }
    }
}

impl Interpolator {
    /// Feed a new authoritative pose, keeping the current pose as origin.
    pub fn read(
        &mut self,
        old_position: Vec2Fixed,
        old_rotation: Fixed,
        new_position: Vec2Fixed,
        new_rotation: Fixed,
    ) {
        if self.primed {
            self.spacing = self.ticks_since_read.max(1);
        }
        self.ticks_since_read = 0;
        self.last_position = old_position;
        self.last_rotation = old_rotation;
        self.target_position = new_position;
        self.target_rotation = new_rotation;
        self.primed = true;
    }

    /// Jump straight to a pose with nothing left to ease.
    pub fn snap(&mut self, position: Vec2Fixed, rotation: Fixed) {
        self.last_position = position;
        self.target_position = position;
        self.last_rotation = rotation;
        self.target_rotation = rotation;
        self.ticks_since_read = 0;
    }

    /// Advance one tick and return the eased pose.
    pub fn update(&mut self) -> (Vec2Fixed, Fixed) {
        self.ticks_since_read = self.ticks_since_read.saturating_add(1);
        let alpha = self.alpha();
        (
            self.last_position.lerp(self.target_position, alpha),
            lerp_angle(self.last_rotation, self.target_rotation, alpha),
        )
    }

    fn alpha(&self) -> Fixed {
        let spacing = Fixed::from_num(self.spacing.max(1));
        (Fixed::from_num(self.ticks_since_read) / spacing).min(Fixed::from_num(1))
    }

    /// The pose the buffer is easing away from.
    #[must_use]
    pub fn origin(&self) -> (Vec2Fixed, Fixed) {
        (self.last_position, self.last_rotation)
    }

    /// The authoritative pose the buffer is easing towards.
    #[must_use]
    pub fn destination(&self) -> (Vec2Fixed, Fixed) {
        (self.target_position, self.target_rotation)
    }

    /// Ticks expected between snapshots.
    #[must_use]
    pub fn spacing(&self) -> u32 {
        self.spacing
    }

    /// Whether no snapshot has been read yet.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        !self.primed
    }
}
