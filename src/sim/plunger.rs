//! Plunger charge and launch

use glam::Vec2;

use crate::consts::*;
use crate::inside_box;
use crate::physics::{BodyDesc, BodyHandle, BodyTag, PhysicsWorld, Shape};

/// True while the ball sits on the shelf inside the launch lane
pub fn ball_in_lane(pos: Vec2) -> bool {
    inside_box(
        pos,
        Vec2::new(LANE_MIN_X, LANE_MIN_Y),
        Vec2::new(LANE_MAX_X, LANE_MAX_Y),
    )
}

/// Upward launch speed for a charge ratio
pub fn launch_speed(ratio: f32) -> f32 {
    PLUNGER_MAX_LAUNCH_SPEED * ratio
}

/// Visual rod in the lane. It never touches the ball; launches set the
/// ball's velocity directly.
#[derive(Debug, Clone, Copy)]
pub struct Plunger {
    pub handle: BodyHandle,
    pull_y: f32,
}

impl Plunger {
    pub fn spawn(world: &mut PhysicsWorld) -> Self {
        let handle = world.add_body(&BodyDesc::kinematic(
            BodyTag::Plunger,
            Shape::rect(30.0, 15.0),
            Vec2::new(PLUNGER_X, PLUNGER_REST_Y),
        ));
        Self {
            handle,
            pull_y: PLUNGER_REST_Y,
        }
    }

    pub fn pull_y(&self) -> f32 {
        self.pull_y
    }

    /// Draw the rod down while charging, stopping at the max pull
    pub fn pull(&mut self, world: &mut PhysicsWorld, dt: f32) {
        if self.pull_y >= PLUNGER_MAX_PULL_Y {
            return;
        }
        self.pull_y = (self.pull_y + PLUNGER_PULL_SPEED * dt).min(PLUNGER_MAX_PULL_Y);
        world.set_position(self.handle, Vec2::new(PLUNGER_X, self.pull_y));
    }

    /// Release the charge. Fires the ball if it is in the lane and returns
    /// the launch speed; the rod always snaps back to rest.
    pub fn release(
        &mut self,
        world: &mut PhysicsWorld,
        ball: Option<BodyHandle>,
        ratio: f32,
    ) -> Option<f32> {
        let fired = ball.and_then(|ball| {
            let pos = world.position(ball)?;
            if !ball_in_lane(pos) {
                log::debug!("Plunger released with ball out of lane at {pos}");
                return None;
            }
            let speed = launch_speed(ratio);
            world.set_velocity(ball, Vec2::new(0.0, -speed));
            Some(speed)
        });
        self.reset(world);
        fired
    }

    /// Snap back to rest
    pub fn reset(&mut self, world: &mut PhysicsWorld) {
        self.pull_y = PLUNGER_REST_Y;
        world.set_position(self.handle, Vec2::new(PLUNGER_X, PLUNGER_REST_Y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::charge_ratio;
    use crate::physics::Layer;

    fn setup() -> (PhysicsWorld, Plunger, BodyHandle) {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, GRAVITY));
        let plunger = Plunger::spawn(&mut world);
        let ball = world.add_body(
            &BodyDesc::dynamic(
                BodyTag::Ball,
                Shape::Ball { radius: BALL_RADIUS },
                Vec2::new(BALL_SPAWN_X, BALL_SPAWN_Y),
            )
            .with_layer(Layer::Ball),
        );
        (world, plunger, ball)
    }

    #[test]
    fn test_lane_box() {
        assert!(ball_in_lane(Vec2::new(BALL_SPAWN_X, BALL_SPAWN_Y)));
        assert!(!ball_in_lane(Vec2::new(350.0, 500.0)));
        // Edges are outside
        assert!(!ball_in_lane(Vec2::new(LANE_MIN_X, 995.0)));
        assert!(!ball_in_lane(Vec2::new(662.0, SHELF_Y)));
    }

    #[test]
    fn test_pull_stops_at_max() {
        let (mut world, mut plunger, _) = setup();
        plunger.pull(&mut world, SIM_DT);
        assert!((plunger.pull_y() - (PLUNGER_REST_Y + 0.8)).abs() < 1e-3);

        for _ in 0..200 {
            plunger.pull(&mut world, SIM_DT);
        }
        assert_eq!(plunger.pull_y(), PLUNGER_MAX_PULL_Y);
        assert_eq!(
            world.position(plunger.handle),
            Some(Vec2::new(PLUNGER_X, PLUNGER_MAX_PULL_Y))
        );
    }

    #[test]
    fn test_full_hold_launches_at_max_speed() {
        let (mut world, mut plunger, ball) = setup();
        let speed = plunger.release(&mut world, Some(ball), charge_ratio(2000.0));
        assert_eq!(speed, Some(PLUNGER_MAX_LAUNCH_SPEED));
        assert_eq!(world.velocity(ball), Some(Vec2::new(0.0, -PLUNGER_MAX_LAUNCH_SPEED)));
    }

    #[test]
    fn test_tap_launches_at_floor_speed() {
        let (mut world, mut plunger, ball) = setup();
        let speed = plunger.release(&mut world, Some(ball), charge_ratio(0.0));
        let expected = 0.1 * PLUNGER_MAX_LAUNCH_SPEED;
        assert!((speed.unwrap() - expected).abs() < 1e-3);
        assert!((world.velocity(ball).unwrap().y + expected).abs() < 1e-3);
    }

    #[test]
    fn test_release_out_of_lane_keeps_velocity() {
        let (mut world, mut plunger, ball) = setup();
        world.set_position(ball, Vec2::new(350.0, 500.0));
        world.set_velocity(ball, Vec2::new(120.0, 40.0));
        for _ in 0..30 {
            plunger.pull(&mut world, SIM_DT);
        }

        assert_eq!(plunger.release(&mut world, Some(ball), 1.0), None);
        assert_eq!(world.velocity(ball), Some(Vec2::new(120.0, 40.0)));
        // Rod goes back to rest either way
        assert_eq!(plunger.pull_y(), PLUNGER_REST_Y);
    }

    #[test]
    fn test_release_without_ball() {
        let (mut world, mut plunger, ball) = setup();
        world.remove_body(ball);
        assert_eq!(plunger.release(&mut world, Some(ball), 1.0), None);
        assert_eq!(plunger.release(&mut world, None, 1.0), None);
    }
}
