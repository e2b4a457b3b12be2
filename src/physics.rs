//! Rigid-body world for the table
//!
//! Wraps the rapier2d boilerplate behind glam types. Every collider carries a
//! [`BodyTag`] so contact pairs can be classified without a type hierarchy,
//! and contact-begin events are queued during a step and drained afterwards.

use std::collections::HashMap;
use std::sync::Mutex;

use glam::Vec2;
use rapier2d::prelude::*;

fn to_na(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn from_na(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// Which flipper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlipperSide {
    Left,
    Right,
}

/// Role of a body on the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyTag {
    Ball,
    /// Walls, funnel slopes, lane guide
    Wall,
    Flipper(FlipperSide),
    Plunger,
    PlungerShelf,
    /// Sensor under the funnel opening
    DeathZone,
    /// Decorative stage collider, no scoring
    Obstacle,
    Bumper,
    Target,
}

/// The kind of rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    Fixed,
    /// Moved by teleporting, never pushed by contacts
    Kinematic,
}

impl BodyType {
    fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Fixed => RigidBodyType::Fixed,
            BodyType::Kinematic => RigidBodyType::KinematicPositionBased,
        }
    }
}

/// Collider shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Ball { radius: f32 },
    Cuboid { half_width: f32, half_height: f32 },
}

impl Shape {
    /// Box from full width and height
    pub fn rect(width: f32, height: f32) -> Self {
        Shape::Cuboid {
            half_width: width / 2.0,
            half_height: height / 2.0,
        }
    }

    fn builder(&self) -> ColliderBuilder {
        match *self {
            Shape::Ball { radius } => ColliderBuilder::ball(radius),
            Shape::Cuboid {
                half_width,
                half_height,
            } => ColliderBuilder::cuboid(half_width, half_height),
        }
    }
}

/// Collision layer. The ball meets everything; nothing else meets anything
/// but the ball.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Ball,
    Table,
    Flipper,
    /// Visual-only body
    Ghost,
}

impl Layer {
    fn groups(self) -> InteractionGroups {
        match self {
            Layer::Ball => InteractionGroups::new(Group::GROUP_1, Group::ALL),
            Layer::Table => InteractionGroups::new(Group::GROUP_2, Group::GROUP_1),
            Layer::Flipper => InteractionGroups::new(Group::GROUP_3, Group::GROUP_1),
            Layer::Ghost => InteractionGroups::new(Group::GROUP_4, Group::NONE),
        }
    }
}

/// Physical material properties for a collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.0,
            friction: 0.1,
            density: 1.0,
        }
    }
}

/// Description of a body before creation.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub tag: BodyTag,
    pub shape: Shape,
    pub position: Vec2,
    pub rotation: f32,
    pub material: Material,
    pub layer: Layer,
    pub sensor: bool,
    pub gravity_scale: f32,
    pub ccd: bool,
}

impl BodyDesc {
    /// Static table collider
    pub fn fixed(tag: BodyTag, shape: Shape, position: Vec2) -> Self {
        Self {
            body_type: BodyType::Fixed,
            tag,
            shape,
            position,
            rotation: 0.0,
            material: Material::default(),
            layer: Layer::Table,
            sensor: false,
            gravity_scale: 0.0,
            ccd: false,
        }
    }

    pub fn dynamic(tag: BodyTag, shape: Shape, position: Vec2) -> Self {
        Self {
            body_type: BodyType::Dynamic,
            gravity_scale: 1.0,
            ..Self::fixed(tag, shape, position)
        }
    }

    pub fn kinematic(tag: BodyTag, shape: Shape, position: Vec2) -> Self {
        Self {
            body_type: BodyType::Kinematic,
            layer: Layer::Ghost,
            ..Self::fixed(tag, shape, position)
        }
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.material.restitution = restitution;
        self
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    /// Detect overlaps without producing contact forces
    pub fn as_sensor(mut self) -> Self {
        self.sensor = true;
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn with_ccd(mut self, enabled: bool) -> Self {
        self.ccd = enabled;
        self
    }
}

/// Handle pair referencing rapier internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
}

/// Two colliders that started touching during the last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactBegin {
    pub a: ColliderHandle,
    pub b: ColliderHandle,
}

impl ContactBegin {
    /// The other collider if `handle` takes part in this pair
    pub fn other(&self, handle: ColliderHandle) -> Option<ColliderHandle> {
        if self.a == handle {
            Some(self.b)
        } else if self.b == handle {
            Some(self.a)
        } else {
            None
        }
    }
}

// WASM-safe event collector (no crossbeam)
struct ContactCollector {
    started: Mutex<Vec<ContactBegin>>,
}

impl ContactCollector {
    fn new() -> Self {
        Self {
            started: Mutex::new(Vec::new()),
        }
    }

    fn drain(&self) -> Vec<ContactBegin> {
        self.started
            .lock()
            .map(|mut pairs| std::mem::take(&mut *pairs))
            .unwrap_or_default()
    }
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let CollisionEvent::Started(a, b, _) = event {
            if let Ok(mut pairs) = self.started.lock() {
                pairs.push(ContactBegin { a, b });
            }
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// The live simulation world.
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    collector: ContactCollector,
    tags: HashMap<ColliderHandle, BodyTag>,
}

impl PhysicsWorld {
    /// Create a world with the given gravity (positive Y is down).
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity: to_na(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            collector: ContactCollector::new(),
            tags: HashMap::new(),
        }
    }

    /// Set the integration timestep.
    pub fn set_dt(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
    }

    /// Create a rigid body with one collider.
    pub fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let rb = RigidBodyBuilder::new(desc.body_type.to_rapier())
            .translation(to_na(desc.position))
            .rotation(desc.rotation)
            .gravity_scale(desc.gravity_scale)
            .ccd_enabled(desc.ccd)
            .can_sleep(desc.body_type != BodyType::Dynamic)
            .build();
        let body = self.bodies.insert(rb);

        let collider = desc
            .shape
            .builder()
            .restitution(desc.material.restitution)
            .restitution_combine_rule(CoefficientCombineRule::Max)
            .friction(desc.material.friction)
            .friction_combine_rule(CoefficientCombineRule::Min)
            .density(desc.material.density)
            .sensor(desc.sensor)
            .collision_groups(desc.layer.groups())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);

        self.tags.insert(collider, desc.tag);
        BodyHandle { body, collider }
    }

    pub fn add_bodies(&mut self, descs: &[BodyDesc]) -> Vec<BodyHandle> {
        descs.iter().map(|desc| self.add_body(desc)).collect()
    }

    /// Remove a body and its collider. Returns false if it was already gone.
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        self.tags.remove(&handle.collider);
        self.bodies
            .remove(
                handle.body,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    pub fn remove_bodies(&mut self, handles: &[BodyHandle]) {
        for handle in handles {
            self.remove_body(*handle);
        }
    }

    /// Pin a dynamic body to a fixed world point with a zero-length hinge.
    /// The body keeps rotating freely around the pivot.
    pub fn pin(&mut self, handle: BodyHandle, pivot: Vec2) -> Option<ImpulseJointHandle> {
        let center = self.position(handle)?;
        let local = pivot - center;
        let anchor = self
            .bodies
            .insert(RigidBodyBuilder::fixed().translation(to_na(pivot)).build());
        let joint = RevoluteJointBuilder::new()
            .local_anchor1(point![0.0, 0.0])
            .local_anchor2(point![local.x, local.y])
            .build();
        Some(
            self.impulse_joints
                .insert(anchor, handle.body, joint, true),
        )
    }

    /// Advance one timestep and return the contact pairs that began during it.
    pub fn step(&mut self) -> Vec<ContactBegin> {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.collector,
        );
        self.collector.drain()
    }

    /// Role of a live collider. `None` once its body has been removed.
    pub fn tag(&self, collider: ColliderHandle) -> Option<BodyTag> {
        self.tags.get(&collider).copied()
    }

    /// Whether the body is currently part of the world
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle.body)
    }

    pub fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies
            .get(handle.body)
            .map(|rb| from_na(rb.translation()))
    }

    /// World position of a collider
    pub fn collider_position(&self, collider: ColliderHandle) -> Option<Vec2> {
        self.colliders
            .get(collider)
            .map(|c| from_na(c.translation()))
    }

    /// Teleport a body, keeping its velocity
    pub fn set_position(&mut self, handle: BodyHandle, pos: Vec2) {
        if let Some(rb) = self.bodies.get_mut(handle.body) {
            rb.set_translation(to_na(pos), true);
        }
    }

    /// Current rotation (radians, positive is clockwise on screen)
    pub fn angle(&self, handle: BodyHandle) -> Option<f32> {
        self.bodies
            .get(handle.body)
            .map(|rb| rb.rotation().angle())
    }

    pub fn set_angle(&mut self, handle: BodyHandle, angle: f32) {
        if let Some(rb) = self.bodies.get_mut(handle.body) {
            rb.set_rotation(Rotation::new(angle), true);
        }
    }

    pub fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(handle.body).map(|rb| from_na(rb.linvel()))
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, vel: Vec2) {
        if let Some(rb) = self.bodies.get_mut(handle.body) {
            rb.set_linvel(to_na(vel), true);
        }
    }

    pub fn angular_velocity(&self, handle: BodyHandle) -> Option<f32> {
        self.bodies.get(handle.body).map(|rb| rb.angvel())
    }

    pub fn set_angular_velocity(&mut self, handle: BodyHandle, angvel: f32) {
        if let Some(rb) = self.bodies.get_mut(handle.body) {
            rb.set_angvel(angvel, true);
        }
    }

    /// Number of rigid bodies, pivot anchors included.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of live colliders carrying `tag`
    pub fn count_tagged(&self, tag: BodyTag) -> usize {
        self.tags.values().filter(|t| **t == tag).count()
    }
}
