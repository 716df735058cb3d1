//! Player vehicle: input snapshot, pure step function, collision feedback.
//!
//! Keyboard and touch input are sampled once per frame into a
//! [`ControlInput`] resource. Each simulation tick advances the
//! [`VehicleState`] with [`step`] and resolves the result against the static
//! and traffic colliders with [`collide`].

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::touch_controls::{self, TouchControlsConfig, TouchControlsPlugin};
use crate::simulation::{SimulationSet, SimulationTick};
use crate::world::colliders::{Contact, KinematicColliders, StaticColliders};

pub struct PlayerVehiclePlugin;

impl Plugin for PlayerVehiclePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<VehicleConfig>()
            .init_resource::<ControlInput>()
            .add_event::<VehicleCrash>()
            .add_plugins(TouchControlsPlugin)
            .add_systems(Startup, spawn_player_vehicle)
            .add_systems(
                Update,
                (
                    capture_control_input,
                    drive_player_vehicle,
                    sync_player_transform,
                    announce_crashes,
                    spawn_crash_sparks,
                    fade_sparks,
                )
                    .chain()
                    .in_set(SimulationSet::Player),
            );
    }
}

/// Boolean control state for one tick.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControlInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub boost: bool,
}

impl ControlInput {
    pub fn from_keys(keys: &ButtonInput<KeyCode>) -> Self {
        let any = |codes: &[KeyCode]| codes.iter().any(|code| keys.pressed(*code));
        Self {
            forward: any(&[KeyCode::KeyW, KeyCode::ArrowUp, KeyCode::PageUp]),
            backward: any(&[KeyCode::KeyS, KeyCode::ArrowDown, KeyCode::PageDown]),
            left: any(&[KeyCode::KeyA, KeyCode::ArrowLeft]),
            right: any(&[KeyCode::KeyD, KeyCode::ArrowRight]),
            boost: any(&[KeyCode::ShiftLeft, KeyCode::ShiftRight]),
        }
    }

    /// A control is held if either source holds it.
    pub fn merge(self, other: Self) -> Self {
        Self {
            forward: self.forward || other.forward,
            backward: self.backward || other.backward,
            left: self.left || other.left,
            right: self.right || other.right,
            boost: self.boost || other.boost,
        }
    }
}

/// Driving parameters.
#[derive(Resource, Clone, Debug)]
pub struct VehicleConfig {
    pub cruise_speed: f32,
    pub boost_speed: f32,
    /// Yaw rate while steering (radians per second).
    pub turn_rate: f32,
    /// Fraction of the gap to the target velocity closed each tick.
    pub acceleration_blend: f32,
    /// Velocity multiplier per tick with no throttle.
    pub coast_decay: f32,
    /// Radius of the car's footprint for collision.
    pub body_radius: f32,
    pub spawn_position: Vec3,
    pub body_size: Vec3,
    pub color: Color,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            cruise_speed: 30.0,
            boost_speed: 50.0,
            turn_rate: 3.0,
            acceleration_blend: 0.2,
            coast_decay: 0.92,
            body_radius: 1.6,
            spawn_position: Vec3::new(0.0, 0.6, 0.0),
            body_size: Vec3::new(1.8, 1.2, 4.0),
            color: Color::srgb(0.8, 0.1, 0.1),
        }
    }
}

/// Kinematic state of the player's car.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VehicleState {
    pub position: Vec3,
    /// Rotation about +Y; zero faces +Z.
    pub yaw: f32,
    pub velocity: Vec3,
}

impl VehicleState {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..default()
        }
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// Advance the vehicle by one tick of `dt` seconds.
pub fn step(state: VehicleState, input: ControlInput, dt: f32, config: &VehicleConfig) -> VehicleState {
    let mut next = state;

    let steer = f32::from(u8::from(input.left)) - f32::from(u8::from(input.right));
    next.yaw = state.yaw + steer * config.turn_rate * dt;

    let throttle = f32::from(u8::from(input.forward)) - f32::from(u8::from(input.backward));
    if throttle != 0.0 {
        let speed = if input.boost {
            config.boost_speed
        } else {
            config.cruise_speed
        };
        let target = state.forward() * throttle * speed;
        next.velocity = state.velocity.lerp(target, config.acceleration_blend);
    } else {
        next.velocity = state.velocity * config.coast_decay;
    }

    next.position = state.position + next.velocity * dt;
    next
}

/// Push a stepped state out of every static and traffic box it overlaps,
/// dropping the velocity component that drives into each contact.
pub fn collide(
    state: VehicleState,
    radius: f32,
    statics: &StaticColliders,
    traffic: &KinematicColliders,
) -> (VehicleState, Vec<Contact>) {
    let ground = Vec2::new(state.position.x, state.position.z);
    let (ground, mut contacts) = statics.resolve(ground, radius);
    let (ground, moving) = traffic.resolve(ground, radius);
    contacts.extend(moving);

    let mut next = state;
    if contacts.is_empty() {
        return (next, contacts);
    }
    next.position.x = ground.x;
    next.position.z = ground.y;
    for contact in &contacts {
        let normal = contact.correction.normalize_or_zero();
        let normal = Vec3::new(normal.x, 0.0, normal.y);
        let into = next.velocity.dot(normal);
        if into < 0.0 {
            next.velocity -= normal * into;
        }
    }
    (next, contacts)
}

/// The car the player drives.
#[derive(Component)]
pub struct PlayerVehicle {
    pub state: VehicleState,
    /// Whether the car touched any collider on the previous tick.
    pub in_contact: bool,
}

/// Sent when the player's car first hits a structure, tree or traffic vehicle.
#[derive(Event, Clone, Copy, Debug)]
pub struct VehicleCrash {
    pub position: Vec3,
    pub speed: f32,
}

#[derive(Component)]
pub struct CrashSpark {
    pub age: f32,
}

const SPARK_LIFETIME: f32 = 0.3;

fn spawn_player_vehicle(
    mut commands: Commands,
    config: Res<VehicleConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let state = VehicleState::at(config.spawn_position);
    let body = meshes.add(Cuboid::from_size(config.body_size));
    let cabin = meshes.add(Cuboid::new(
        config.body_size.x * 0.85,
        config.body_size.y * 0.6,
        config.body_size.z * 0.45,
    ));
    let paint = materials.add(StandardMaterial {
        base_color: config.color,
        perceptual_roughness: 0.4,
        metallic: 0.5,
        ..default()
    });
    let glass = materials.add(StandardMaterial {
        base_color: Color::srgba(0.1, 0.12, 0.18, 0.85),
        perceptual_roughness: 0.1,
        alpha_mode: AlphaMode::Blend,
        ..default()
    });

    commands
        .spawn((
            Mesh3d(body),
            MeshMaterial3d(paint),
            Transform::from_translation(state.position),
            PlayerVehicle {
                state,
                in_contact: false,
            },
        ))
        .with_children(|parent| {
            parent.spawn((
                Mesh3d(cabin),
                MeshMaterial3d(glass),
                Transform::from_xyz(0.0, config.body_size.y * 0.75, -config.body_size.z * 0.05),
            ));
        });

    info!("Player vehicle spawned at {}", state.position);
}

fn capture_control_input(
    keys: Res<ButtonInput<KeyCode>>,
    touches: Res<Touches>,
    touch_config: Res<TouchControlsConfig>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut input: ResMut<ControlInput>,
) {
    let mut snapshot = ControlInput::from_keys(&keys);
    if let Ok(window) = windows.get_single() {
        let positions = touches.iter().map(|touch| touch.position());
        let held = touch_controls::control_from_touches(positions, window.size(), &touch_config);
        snapshot = snapshot.merge(held);
    }
    if *input != snapshot {
        *input = snapshot;
    }
}

fn drive_player_vehicle(
    mut ticks: EventReader<SimulationTick>,
    input: Res<ControlInput>,
    config: Res<VehicleConfig>,
    statics: Res<StaticColliders>,
    traffic: Res<KinematicColliders>,
    mut crashes: EventWriter<VehicleCrash>,
    mut query: Query<&mut PlayerVehicle>,
) {
    for tick in ticks.read() {
        for mut vehicle in &mut query {
            let stepped = step(vehicle.state, *input, tick.delta, &config);
            let (next, contacts) = collide(stepped, config.body_radius, &statics, &traffic);

            if contacts.is_empty() {
                vehicle.in_contact = false;
            } else {
                if !vehicle.in_contact {
                    crashes.send(VehicleCrash {
                        position: next.position,
                        speed: vehicle.state.speed(),
                    });
                }
                vehicle.in_contact = true;
            }

            vehicle.state = next;
        }
    }
}

fn sync_player_transform(mut query: Query<(&PlayerVehicle, &mut Transform)>) {
    for (vehicle, mut transform) in &mut query {
        transform.translation = vehicle.state.position;
        transform.rotation = Quat::from_rotation_y(vehicle.state.yaw);
    }
}

fn announce_crashes(mut crashes: EventReader<VehicleCrash>) {
    for crash in crashes.read() {
        info!("Crash at {} ({:.1} u/s)", crash.position, crash.speed);
    }
}

fn spawn_crash_sparks(
    mut commands: Commands,
    mut crashes: EventReader<VehicleCrash>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for crash in crashes.read() {
        commands.spawn((
            Mesh3d(meshes.add(Sphere::new(0.1))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(1.0, 1.0, 0.0),
                emissive: LinearRgba::rgb(5.0, 2.5, 0.0),
                ..default()
            })),
            Transform::from_translation(crash.position + Vec3::Y * 0.5),
            CrashSpark { age: 0.0 },
        ));
    }
}

fn fade_sparks(
    mut commands: Commands,
    time: Res<Time>,
    mut sparks: Query<(Entity, &mut CrashSpark, &mut Transform)>,
) {
    for (entity, mut spark, mut transform) in &mut sparks {
        spark.age += time.delta_secs();
        if spark.age > SPARK_LIFETIME {
            commands.entity(entity).despawn();
            continue;
        }
        transform.scale *= 1.05;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::colliders::{BoxCollider, ColliderBody};

    const DT: f32 = 1.0 / 60.0;

    fn drive(input: ControlInput, ticks: usize) -> VehicleState {
        let config = VehicleConfig::default();
        (0..ticks).fold(VehicleState::default(), |state, _| step(state, input, DT, &config))
    }

    #[test]
    fn keyboard_and_touch_combine() {
        let keys = ControlInput {
            forward: true,
            boost: true,
            ..default()
        };
        let touch = ControlInput {
            left: true,
            ..default()
        };
        let both = keys.merge(touch);
        assert!(both.forward && both.boost && both.left);
        assert!(!both.backward && !both.right);
        assert_eq!(ControlInput::default().merge(touch), touch);
    }

    #[test]
    fn idle_vehicle_stays_put() {
        let state = drive(ControlInput::default(), 30);
        assert_eq!(state, VehicleState::default());
    }

    #[test]
    fn throttle_converges_to_cruise_speed_along_heading() {
        let input = ControlInput {
            forward: true,
            ..default()
        };
        let state = drive(input, 120);
        assert!((state.speed() - 30.0).abs() < 0.01);
        assert!(state.position.z > 0.0);
        assert!(state.position.x.abs() < 1e-4);
    }

    #[test]
    fn boost_raises_the_target_speed() {
        let input = ControlInput {
            forward: true,
            boost: true,
            ..default()
        };
        assert!((drive(input, 120).speed() - 50.0).abs() < 0.01);
    }

    #[test]
    fn reverse_moves_backwards() {
        let input = ControlInput {
            backward: true,
            ..default()
        };
        assert!(drive(input, 60).position.z < 0.0);
    }

    #[test]
    fn releasing_throttle_coasts_down() {
        let config = VehicleConfig::default();
        let moving = VehicleState {
            velocity: Vec3::new(0.0, 0.0, 30.0),
            ..default()
        };
        let next = step(moving, ControlInput::default(), DT, &config);
        assert!((next.velocity.z - 30.0 * 0.92).abs() < 1e-4);
    }

    #[test]
    fn steering_turns_at_the_configured_rate() {
        let config = VehicleConfig::default();
        let left = ControlInput {
            left: true,
            ..default()
        };
        let turned = step(VehicleState::default(), left, 0.5, &config);
        assert!((turned.yaw - 1.5).abs() < 1e-6);

        let both = ControlInput {
            left: true,
            right: true,
            ..default()
        };
        assert_eq!(step(VehicleState::default(), both, 0.5, &config).yaw, 0.0);
    }

    #[test]
    fn step_does_not_depend_on_previous_calls() {
        let config = VehicleConfig::default();
        let input = ControlInput {
            forward: true,
            right: true,
            ..default()
        };
        let state = VehicleState::at(Vec3::new(4.0, 0.6, -10.0));
        assert_eq!(step(state, input, DT, &config), step(state, input, DT, &config));
    }

    #[test]
    fn driving_into_a_bus_stops_at_its_side() {
        let config = VehicleConfig::default();
        let bus = Entity::from_raw(9);
        let mut traffic = KinematicColliders::default();
        traffic.push(BoxCollider::rotated(
            ColliderBody::Traffic(bus),
            Vec3::new(0.0, 1.6, 10.0),
            Vec3::new(2.6, 3.2, 11.0),
            std::f32::consts::FRAC_PI_2,
        ));
        let statics = StaticColliders::default();
        let input = ControlInput {
            forward: true,
            ..default()
        };

        let mut state = VehicleState::at(Vec3::new(0.0, 0.6, 0.0));
        let mut hit = false;
        for _ in 0..120 {
            let (next, contacts) = collide(step(state, input, DT, &config), config.body_radius, &statics, &traffic);
            hit |= contacts.iter().any(|c| c.body == ColliderBody::Traffic(bus));
            state = next;
        }

        assert!(hit);
        // The bus's flank is at z = 8.7; the car's circle stays outside it.
        assert!(state.position.z <= 8.7 - config.body_radius + 1e-3);
        assert!(state.velocity.z <= 1e-3);
    }

    #[test]
    fn open_road_leaves_the_step_untouched() {
        let config = VehicleConfig::default();
        let moving = VehicleState {
            velocity: Vec3::new(0.0, 0.0, 30.0),
            ..default()
        };
        let stepped = step(moving, ControlInput::default(), DT, &config);
        let (next, contacts) = collide(
            stepped,
            config.body_radius,
            &StaticColliders::default(),
            &KinematicColliders::default(),
        );
        assert!(contacts.is_empty());
        assert_eq!(next, stepped);
    }
}
