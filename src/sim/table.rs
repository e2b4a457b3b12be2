//! The physical table: fixed geometry, ball, flippers, plunger and the
//! bodies of the loaded stage.

use glam::Vec2;

use super::flipper::{Flipper, FlipperSpec};
use super::plunger::Plunger;
use crate::consts::*;
use crate::deg;
use crate::physics::{BodyDesc, BodyHandle, BodyTag, Layer, Material, PhysicsWorld, Shape};
use crate::stage::StageBodies;

/// Walls, funnel slopes, lane guide, shelf and the death-zone sensor
pub fn fixed_geometry() -> Vec<BodyDesc> {
    let wall = |x: f32, y: f32, w: f32, h: f32| {
        BodyDesc::fixed(BodyTag::Wall, Shape::rect(w, h), Vec2::new(x, y))
    };

    vec![
        // Outer walls and ceiling
        wall(20.0, 550.0, 40.0, FIELD_HEIGHT),
        wall(FIELD_WIDTH, 550.0, 40.0, FIELD_HEIGHT),
        wall(FIELD_WIDTH / 2.0, 20.0, FIELD_WIDTH, 40.0),
        // Separates the plunger lane from the field
        wall(630.0, 700.0, 30.0, 850.0),
        // Funnel slopes feeding the flippers
        wall(105.0, 915.0, 260.0, 20.0).with_rotation(deg(35.0)),
        wall(540.0, 925.0, 220.0, 20.0).with_rotation(deg(-35.0)),
        // Deflects launched balls out of the lane
        wall(660.0, 150.0, 60.0, 10.0).with_rotation(deg(40.0)),
        BodyDesc::fixed(
            BodyTag::PlungerShelf,
            Shape::rect(80.0, 10.0),
            Vec2::new(PLUNGER_X, SHELF_Y),
        ),
        BodyDesc::fixed(
            BodyTag::DeathZone,
            Shape::rect(FIELD_WIDTH, 30.0),
            Vec2::new(FIELD_WIDTH / 2.0, 1195.0),
        )
        .as_sensor(),
    ]
}

fn ball_desc() -> BodyDesc {
    BodyDesc::dynamic(
        BodyTag::Ball,
        Shape::Ball {
            radius: BALL_RADIUS,
        },
        spawn_point(),
    )
    .with_layer(Layer::Ball)
    .with_material(Material {
        restitution: BALL_RESTITUTION,
        friction: 0.0,
        density: 1.0,
    })
    .with_ccd(true)
}

/// Where the ball appears: resting on the lane shelf
pub fn spawn_point() -> Vec2 {
    Vec2::new(BALL_SPAWN_X, BALL_SPAWN_Y)
}

pub struct Table {
    pub world: PhysicsWorld,
    ball: Option<BodyHandle>,
    pub left: Flipper,
    pub right: Flipper,
    pub plunger: Plunger,
    pub stage_bodies: StageBodies,
    fixed: Vec<BodyHandle>,
}

impl Table {
    /// Build the table with `stage` loaded and the ball on the shelf
    pub fn new(stage: u32) -> Self {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, GRAVITY));
        world.set_dt(SIM_DT);

        let fixed = world.add_bodies(&fixed_geometry());
        let left = Flipper::spawn(&mut world, FlipperSpec::left());
        let right = Flipper::spawn(&mut world, FlipperSpec::right());
        let plunger = Plunger::spawn(&mut world);
        let ball = world.add_body(&ball_desc());

        let mut stage_bodies = StageBodies::new();
        stage_bodies.load(&mut world, stage);

        Self {
            world,
            ball: Some(ball),
            left,
            right,
            plunger,
            stage_bodies,
            fixed,
        }
    }

    /// The ball, if it is in play
    pub fn ball(&self) -> Option<BodyHandle> {
        self.ball
    }

    pub fn ball_position(&self) -> Option<Vec2> {
        self.ball.and_then(|ball| self.world.position(ball))
    }

    pub fn ball_velocity(&self) -> Option<Vec2> {
        self.ball.and_then(|ball| self.world.velocity(ball))
    }

    /// Handles of the fixed geometry
    pub fn fixed_bodies(&self) -> &[BodyHandle] {
        &self.fixed
    }

    /// Put the ball back on the shelf, motionless. Adds it if it was removed.
    pub fn respawn_ball(&mut self) {
        let Some(ball) = self.ball else {
            self.ball = Some(self.world.add_body(&ball_desc()));
            return;
        };
        self.world.set_position(ball, spawn_point());
        self.world.set_velocity(ball, Vec2::ZERO);
        self.world.set_angular_velocity(ball, 0.0);
    }

    /// Take the ball out of the world. Returns false if it was already out.
    pub fn remove_ball(&mut self) -> bool {
        match self.ball.take() {
            Some(ball) => self.world.remove_body(ball),
            None => false,
        }
    }

    /// Swap in another stage's bodies
    pub fn load_stage(&mut self, stage: u32) -> bool {
        self.stage_bodies.load(&mut self.world, stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::FlipperSide;
    use crate::sim::plunger::ball_in_lane;

    #[test]
    fn test_new_table_has_everything() {
        let table = Table::new(1);
        let world = &table.world;
        assert_eq!(world.count_tagged(BodyTag::Ball), 1);
        assert_eq!(world.count_tagged(BodyTag::DeathZone), 1);
        assert_eq!(world.count_tagged(BodyTag::PlungerShelf), 1);
        assert_eq!(world.count_tagged(BodyTag::Plunger), 1);
        assert_eq!(world.count_tagged(BodyTag::Flipper(FlipperSide::Left)), 1);
        assert_eq!(world.count_tagged(BodyTag::Flipper(FlipperSide::Right)), 1);
        assert_eq!(world.count_tagged(BodyTag::Bumper), 3);
        assert_eq!(table.fixed_bodies().len(), fixed_geometry().len());
        assert_eq!(table.stage_bodies.stage(), Some(1));
    }

    #[test]
    fn test_ball_starts_in_lane() {
        let table = Table::new(1);
        assert!(ball_in_lane(table.ball_position().unwrap()));
    }

    #[test]
    fn test_ball_rests_on_shelf() {
        let mut table = Table::new(1);
        for _ in 0..60 {
            table.world.step();
        }
        let pos = table.ball_position().unwrap();
        assert!(ball_in_lane(pos), "ball left the lane: {pos}");
    }

    #[test]
    fn test_remove_and_respawn_ball() {
        let mut table = Table::new(1);
        assert!(table.remove_ball());
        assert!(table.ball().is_none());
        assert!(!table.remove_ball());
        assert_eq!(table.world.count_tagged(BodyTag::Ball), 0);

        table.respawn_ball();
        assert_eq!(table.world.count_tagged(BodyTag::Ball), 1);
        assert_eq!(table.ball_position(), Some(spawn_point()));
    }

    #[test]
    fn test_respawn_stops_ball() {
        let mut table = Table::new(1);
        let ball = table.ball().unwrap();
        table.world.set_position(ball, Vec2::new(300.0, 600.0));
        table.world.set_velocity(ball, Vec2::new(200.0, 900.0));
        table.world.set_angular_velocity(ball, 4.0);

        table.respawn_ball();
        assert_eq!(table.ball(), Some(ball));
        assert_eq!(table.ball_position(), Some(spawn_point()));
        assert_eq!(table.ball_velocity(), Some(Vec2::ZERO));
        assert_eq!(table.world.angular_velocity(ball), Some(0.0));
    }
}
