//! Flipper control
//!
//! Each flipper is a dynamic bar hinged at its pivot. Every step it gets a
//! velocity command toward its active or rest angle; the joint solver does
//! the swinging. The angle is then held inside its range by hard-setting it.

use glam::Vec2;

use crate::consts::*;
use crate::physics::{BodyDesc, BodyHandle, BodyTag, FlipperSide, Layer, Material, PhysicsWorld, Shape};

/// Geometry and travel of one flipper
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlipperSpec {
    pub side: FlipperSide,
    /// Body center at angle 0
    pub center: Vec2,
    pub pivot: Vec2,
    pub min_angle: f32,
    pub max_angle: f32,
}

impl FlipperSpec {
    pub fn left() -> Self {
        Self {
            side: FlipperSide::Left,
            center: Vec2::new(LEFT_FLIPPER_X, FLIPPER_Y),
            pivot: Vec2::new(LEFT_PIVOT_X, FLIPPER_Y),
            min_angle: LEFT_FLIPPER_MIN_ANGLE,
            max_angle: LEFT_FLIPPER_MAX_ANGLE,
        }
    }

    pub fn right() -> Self {
        Self {
            side: FlipperSide::Right,
            center: Vec2::new(RIGHT_FLIPPER_X, FLIPPER_Y),
            pivot: Vec2::new(RIGHT_PIVOT_X, FLIPPER_Y),
            min_angle: RIGHT_FLIPPER_MIN_ANGLE,
            max_angle: RIGHT_FLIPPER_MAX_ANGLE,
        }
    }

    /// Angle while the button is held (tip raised)
    pub fn active_angle(&self) -> f32 {
        match self.side {
            FlipperSide::Left => self.min_angle,
            FlipperSide::Right => self.max_angle,
        }
    }

    /// Angle the flipper falls back to when released
    pub fn rest_angle(&self) -> f32 {
        match self.side {
            FlipperSide::Left => self.max_angle,
            FlipperSide::Right => self.min_angle,
        }
    }

    /// Body center when rotated to `angle` about the pivot
    pub fn center_at(&self, angle: f32) -> Vec2 {
        self.pivot + Vec2::from_angle(angle).rotate(self.center - self.pivot)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Flipper {
    pub spec: FlipperSpec,
    pub handle: BodyHandle,
}

impl Flipper {
    /// Create the bar and hinge it to its pivot
    pub fn spawn(world: &mut PhysicsWorld, spec: FlipperSpec) -> Self {
        let desc = BodyDesc::dynamic(
            BodyTag::Flipper(spec.side),
            Shape::rect(FLIPPER_LENGTH, FLIPPER_THICKNESS),
            spec.center,
        )
        .with_layer(Layer::Flipper)
        .with_gravity_scale(0.0)
        .with_material(Material {
            restitution: 0.0,
            friction: 0.1,
            density: 5.0,
        });
        let handle = world.add_body(&desc);
        if world.pin(handle, spec.pivot).is_none() {
            log::warn!("Could not hinge {:?} flipper", spec.side);
        }
        Self { spec, handle }
    }

    pub fn angle(&self, world: &PhysicsWorld) -> Option<f32> {
        world.angle(self.handle)
    }

    /// Command angular velocity toward the active or rest angle, then clamp.
    pub fn drive(&self, world: &mut PhysicsWorld, held: bool) {
        let Some(angle) = self.angle(world) else {
            return;
        };
        let target = if held {
            self.spec.active_angle()
        } else {
            self.spec.rest_angle()
        };
        let angvel = if (target - angle).abs() < 1e-3 {
            0.0
        } else {
            FLIPPER_SPEED * (target - angle).signum()
        };
        world.set_angular_velocity(self.handle, angvel);
        self.clamp(world);
    }

    /// Pull the angle back into `[min, max]` if it drifted out.
    /// Returns true if it had to.
    pub fn clamp(&self, world: &mut PhysicsWorld) -> bool {
        let Some(angle) = self.angle(world) else {
            return false;
        };
        let clamped = angle.clamp(self.spec.min_angle, self.spec.max_angle);
        if clamped == angle {
            return false;
        }
        // Rotate about the pivot, not the body center
        world.set_angle(self.handle, clamped);
        world.set_position(self.handle, self.spec.center_at(clamped));
        world.set_angular_velocity(self.handle, 0.0);
        true
    }
}
