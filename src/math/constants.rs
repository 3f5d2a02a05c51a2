/* Copyright 2020 @Yuchen Wong */

pub type Float = f32;

pub type Vector2f = crate::na::Vector2<Float>;
pub type Vector3f = crate::na::Vector3<Float>;

pub const EPSILON: Float = 1e-4;
pub const PI: Float = 3.14159265359;
pub const INV_PI: Float = 0.31830988618;

pub const FLOAT_MIN: Float = Float::MIN;
pub const FLOAT_MAX: Float = Float::MAX;
