//! Deterministic fixed-point math for positions, speeds and path costs.
//!
//! World positions live on the ground plane: `FixedVec2::x` is world X and
//! `FixedVec2::y` is world Z. Height is never simulated.

use bevy::prelude::*;
use fixed::types::I48F16;
use serde::{Deserialize, Serialize};

/// Fixed-point number type used throughout the navigation core.
///
/// I48F16: 48 integer bits, 16 fractional bits (precision ~0.000015).
pub type FixedNum = I48F16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixedVec2 {
    pub x: FixedNum,
    pub y: FixedNum,
}

impl FixedVec2 {
    pub const ZERO: Self = Self { x: FixedNum::ZERO, y: FixedNum::ZERO };

    pub fn new(x: FixedNum, y: FixedNum) -> Self {
        Self { x, y }
    }

    pub fn from_f32(x: f32, y: f32) -> Self {
        Self {
            x: FixedNum::from_num(x),
            y: FixedNum::from_num(y),
        }
    }

    /// `None` when either coordinate is NaN, infinite or out of fixed-point range.
    pub fn checked_from_f32(x: f32, y: f32) -> Option<Self> {
        Some(Self {
            x: FixedNum::checked_from_num(x)?,
            y: FixedNum::checked_from_num(y)?,
        })
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x.to_num(), self.y.to_num())
    }

    /// Ground-plane point from a 3D world position (drops the height axis).
    pub fn from_world(world: Vec3) -> Self {
        Self::from_f32(world.x, world.z)
    }

    pub fn checked_from_world(world: Vec3) -> Option<Self> {
        Self::checked_from_f32(world.x, world.z)
    }

    /// 3D world position at ground level: `(x, 0, y)`.
    pub fn to_world(self) -> Vec3 {
        Vec3::new(self.x.to_num(), 0.0, self.y.to_num())
    }

    pub fn length(self) -> FixedNum {
        let len_sq = self.length_squared();
        if len_sq == FixedNum::ZERO {
            return FixedNum::ZERO;
        }
        len_sq.sqrt()
    }

    pub fn length_squared(self) -> FixedNum {
        self.x * self.x + self.y * self.y
    }

    pub fn distance(self, other: Self) -> FixedNum {
        (other - self).length()
    }

    /// True when `other` is no further than `epsilon` away.
    pub fn within(self, other: Self, epsilon: FixedNum) -> bool {
        (other - self).length_squared() <= epsilon * epsilon
    }

    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == FixedNum::ZERO {
            Self::ZERO
        } else {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        }
    }

    /// Step towards `target` by at most `max_step`, landing exactly on it when close
    /// enough.
    pub fn move_towards(self, target: Self, max_step: FixedNum) -> Self {
        let delta = target - self;
        let dist = delta.length();
        if dist <= max_step || dist == FixedNum::ZERO {
            return target;
        }
        self + delta * (max_step / dist)
    }
}

impl std::ops::Add for FixedVec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Sub for FixedVec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl std::ops::Mul<FixedNum> for FixedVec2 {
    type Output = Self;
    fn mul(self, rhs: FixedNum) -> Self::Output {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}

impl std::ops::Div<FixedNum> for FixedVec2 {
    type Output = Self;
    fn div(self, rhs: FixedNum) -> Self::Output {
        Self { x: self.x / rhs, y: self.y / rhs }
    }
}

impl std::ops::Neg for FixedVec2 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self { x: -self.x, y: -self.y }
    }
}
