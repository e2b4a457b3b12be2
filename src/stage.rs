//! Stage layouts
//!
//! Each stage is static data: where its obstacles, bumpers and targets sit,
//! and the score that moves play on to the next stage. [`StageBodies`] owns
//! the physics bodies of whichever stage is loaded.

use glam::Vec2;

use crate::consts::*;
use crate::physics::{BodyDesc, BodyHandle, BodyTag, PhysicsWorld, Shape};

/// A static circle on the playfield
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleSpec {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl CircleSpec {
    pub const fn new(x: f32, y: f32, radius: f32) -> Self {
        Self { x, y, radius }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageDefinition {
    pub name: &'static str,
    /// Score that advances to the next stage; `None` on the final stage
    pub target_score: Option<u64>,
    pub obstacles: &'static [CircleSpec],
    pub bumpers: &'static [CircleSpec],
    pub targets: &'static [CircleSpec],
}

static STAGES: [StageDefinition; 2] = [
    StageDefinition {
        name: "Stage 1",
        target_score: Some(1000),
        obstacles: &[CircleSpec::new(300.0, 300.0, 30.0), CircleSpec::new(500.0, 300.0, 30.0)],
        bumpers: &[
            CircleSpec::new(250.0, 350.0, BUMPER_RADIUS),
            CircleSpec::new(400.0, 280.0, BUMPER_RADIUS),
            CircleSpec::new(550.0, 350.0, BUMPER_RADIUS),
        ],
        targets: &[CircleSpec::new(500.0, 590.0, 40.0)],
    },
    StageDefinition {
        name: "Stage 2",
        target_score: None,
        obstacles: &[
            CircleSpec::new(200.0, 250.0, 25.0),
            CircleSpec::new(400.0, 200.0, 25.0),
            CircleSpec::new(500.0, 400.0, 25.0),
        ],
        bumpers: &[
            CircleSpec::new(300.0, 500.0, BUMPER_RADIUS),
            CircleSpec::new(500.0, 700.0, BUMPER_RADIUS),
        ],
        targets: &[CircleSpec::new(350.0, 350.0, 35.0), CircleSpec::new(200.0, 600.0, 35.0)],
    },
];

/// Look up a stage by its 1-based number
pub fn stage_config(stage: u32) -> Option<&'static StageDefinition> {
    let index = usize::try_from(stage).ok()?.checked_sub(1)?;
    STAGES.get(index)
}

impl StageDefinition {
    /// Body descriptions for every circle in this stage
    pub fn body_descs(&self) -> Vec<BodyDesc> {
        let circle = |tag: BodyTag, spec: &CircleSpec| {
            BodyDesc::fixed(tag, Shape::Ball { radius: spec.radius }, spec.center())
        };

        let obstacles = self.obstacles.iter().map(|s| circle(BodyTag::Obstacle, s));
        let bumpers = self
            .bumpers
            .iter()
            .map(|s| circle(BodyTag::Bumper, s).with_restitution(BUMPER_RESTITUTION));
        let targets = self
            .targets
            .iter()
            .map(|s| circle(BodyTag::Target, s).with_restitution(TARGET_RESTITUTION));

        obstacles.chain(bumpers).chain(targets).collect()
    }
}

/// Bodies belonging to the currently loaded stage
#[derive(Debug, Default)]
pub struct StageBodies {
    stage: Option<u32>,
    handles: Vec<BodyHandle>,
}

impl StageBodies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the loaded stage with `stage`.
    ///
    /// Old bodies are removed before the new ones are added. An unknown stage
    /// number leaves the world untouched and returns false.
    pub fn load(&mut self, world: &mut PhysicsWorld, stage: u32) -> bool {
        let Some(def) = stage_config(stage) else {
            log::warn!("No stage {stage}, keeping current layout");
            return false;
        };

        self.clear(world);
        self.handles = world.add_bodies(&def.body_descs());
        self.stage = Some(stage);
        log::info!("Loaded {} ({} bodies)", def.name, self.handles.len());
        true
    }

    /// Remove every body of the loaded stage
    pub fn clear(&mut self, world: &mut PhysicsWorld) {
        world.remove_bodies(&self.handles);
        self.handles.clear();
        self.stage = None;
    }

    pub fn stage(&self) -> Option<u32> {
        self.stage
    }

    pub fn handles(&self) -> &[BodyHandle] {
        &self.handles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(Vec2::new(0.0, GRAVITY))
    }

    #[test]
    fn test_stage_lookup() {
        assert_eq!(stage_config(1).map(|s| s.name), Some("Stage 1"));
        assert_eq!(stage_config(2).map(|s| s.name), Some("Stage 2"));
        assert!(stage_config(0).is_none());
        assert!(stage_config(3).is_none());
    }

    #[test]
    fn test_only_last_stage_is_final() {
        let last = STAGES.len() as u32;
        for n in 1..last {
            assert!(stage_config(n).unwrap().target_score.is_some());
        }
        assert_eq!(stage_config(last).unwrap().target_score, None);
    }

    #[test]
    fn test_stage_one_layout() {
        let def = stage_config(1).unwrap();
        assert_eq!(def.target_score, Some(1000));
        assert_eq!(def.obstacles.len(), 2);
        assert_eq!(def.bumpers.len(), 3);
        assert_eq!(def.targets, &[CircleSpec::new(500.0, 590.0, 40.0)]);
    }

    #[test]
    fn test_body_descs_carry_tags_and_bounce() {
        let descs = stage_config(2).unwrap().body_descs();
        assert_eq!(descs.len(), 7);
        for desc in &descs {
            match desc.tag {
                BodyTag::Obstacle => assert_eq!(desc.material.restitution, 0.0),
                BodyTag::Bumper | BodyTag::Target => assert_eq!(desc.material.restitution, 1.5),
                other => panic!("unexpected tag {other:?}"),
            }
        }
    }

    #[test]
    fn test_load_replaces_previous_stage() {
        let mut world = world();
        let mut bodies = StageBodies::new();

        assert!(bodies.load(&mut world, 1));
        let first = bodies.handles().to_vec();
        assert_eq!(world.body_count(), 6);
        assert_eq!(world.count_tagged(BodyTag::Bumper), 3);

        assert!(bodies.load(&mut world, 2));
        assert_eq!(bodies.stage(), Some(2));
        assert_eq!(world.body_count(), 7);
        assert_eq!(world.count_tagged(BodyTag::Bumper), 2);
        assert_eq!(world.count_tagged(BodyTag::Target), 2);
        assert!(first.iter().all(|h| !world.contains(*h)));
    }

    #[test]
    fn test_reloading_same_stage_does_not_duplicate() {
        let mut world = world();
        let mut bodies = StageBodies::new();
        bodies.load(&mut world, 1);
        bodies.load(&mut world, 1);
        assert_eq!(world.body_count(), 6);
    }

    #[test]
    fn test_load_unknown_stage_is_noop() {
        let mut world = world();
        let mut bodies = StageBodies::new();
        bodies.load(&mut world, 1);

        assert!(!bodies.load(&mut world, 9));
        assert_eq!(bodies.stage(), Some(1));
        assert_eq!(world.body_count(), 6);
    }
}
