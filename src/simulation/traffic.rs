//! Scripted traffic.
//!
//! A handful of kinematic vehicles loop over fixed waypoint routes at a
//! constant distance per tick. They do not react to the player or to each
//! other, but publish their boxes so the player's car collides with them.

use bevy::prelude::*;

use crate::simulation::{SimulationSet, SimulationTick};
use crate::world::colliders::{BoxCollider, ColliderBody, KinematicColliders};

pub struct TrafficPlugin;

impl Plugin for TrafficPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TrafficConfig>()
            .init_resource::<TrafficSpawned>()
            .add_systems(
                Update,
                (
                    spawn_traffic.run_if(should_spawn_traffic),
                    advance_traffic,
                    publish_traffic_colliders,
                )
                    .chain()
                    .in_set(SimulationSet::Traffic),
            );
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrafficKind {
    Convertible,
    PoliceCar,
    Bus,
    Motorcycle,
}

impl TrafficKind {
    /// Box dimensions (width, height, length) used to draw and collide.
    pub fn body_size(self) -> Vec3 {
        match self {
            TrafficKind::Convertible => Vec3::new(1.8, 1.0, 4.0),
            TrafficKind::PoliceCar => Vec3::new(2.0, 1.4, 4.6),
            TrafficKind::Bus => Vec3::new(2.6, 3.2, 11.0),
            TrafficKind::Motorcycle => Vec3::new(0.6, 1.2, 2.0),
        }
    }

    pub fn color(self) -> Color {
        match self {
            TrafficKind::Convertible => Color::srgb(0.15, 0.35, 0.75),
            TrafficKind::PoliceCar => Color::srgb(0.95, 0.95, 0.95),
            TrafficKind::Bus => Color::srgb(0.95, 0.7, 0.1),
            TrafficKind::Motorcycle => Color::srgb(0.1, 0.1, 0.1),
        }
    }
}

/// One looping route.
#[derive(Clone, Debug)]
pub struct TrafficRoute {
    pub kind: TrafficKind,
    pub waypoints: Vec<Vec2>,
    /// Distance covered per simulation tick.
    pub speed: f32,
}

#[derive(Resource, Clone, Debug)]
pub struct TrafficConfig {
    pub routes: Vec<TrafficRoute>,
    /// Distance at which a waypoint counts as reached.
    pub arrive_radius: f32,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        let route = |kind, points: &[(f32, f32)], speed| TrafficRoute {
            kind,
            waypoints: points.iter().map(|&(x, z)| Vec2::new(x, z)).collect(),
            speed,
        };
        Self {
            routes: vec![
                route(
                    TrafficKind::Convertible,
                    &[(0.0, 100.0), (0.0, 100.0), (100.0, 100.0), (100.0, 0.0)],
                    0.5,
                ),
                route(
                    TrafficKind::PoliceCar,
                    &[(-100.0, 0.0), (-100.0, 200.0), (100.0, 200.0), (100.0, 0.0)],
                    0.55,
                ),
                route(
                    TrafficKind::Bus,
                    &[(-200.0, 50.0), (-200.0, -200.0), (200.0, -200.0), (200.0, 50.0)],
                    0.42,
                ),
                route(
                    TrafficKind::Motorcycle,
                    &[(150.0, -150.0), (150.0, 150.0), (-150.0, 150.0), (-150.0, -150.0)],
                    0.65,
                ),
            ],
            arrive_radius: 1.0,
        }
    }
}

#[derive(Resource, Default)]
pub struct TrafficSpawned(pub bool);

/// Progress of one vehicle along its route.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RouteProgress {
    pub position: Vec2,
    /// Index of the waypoint the current leg starts from.
    pub index: usize,
    /// Unit direction of the current leg, zero on degenerate legs.
    pub heading: Vec2,
}

impl RouteProgress {
    pub fn start(waypoints: &[Vec2]) -> Self {
        Self {
            position: waypoints.first().copied().unwrap_or(Vec2::ZERO),
            index: 0,
            heading: Vec2::ZERO,
        }
    }

    /// Yaw about +Y for the current heading, zero facing +Z.
    pub fn yaw(&self) -> f32 {
        self.heading.x.atan2(self.heading.y)
    }
}

/// Move `speed` units along the leg from waypoint `index` to the next one,
/// switching legs once within `arrive_radius` of the leg's end.
pub fn advance(progress: RouteProgress, waypoints: &[Vec2], speed: f32, arrive_radius: f32) -> RouteProgress {
    if waypoints.is_empty() {
        return progress;
    }
    let index = progress.index % waypoints.len();
    let current = waypoints[index];
    let next = waypoints[(index + 1) % waypoints.len()];

    let heading = (next - current).normalize_or_zero();
    let position = progress.position + heading * speed;
    let index = if position.distance(next) < arrive_radius {
        (index + 1) % waypoints.len()
    } else {
        index
    };

    RouteProgress {
        position,
        index,
        heading,
    }
}

#[derive(Component)]
pub struct TrafficVehicle {
    pub route: usize,
    pub progress: RouteProgress,
}

fn should_spawn_traffic(spawned: Res<TrafficSpawned>) -> bool {
    !spawned.0
}

fn spawn_traffic(
    mut commands: Commands,
    config: Res<TrafficConfig>,
    mut spawned: ResMut<TrafficSpawned>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (route_index, route) in config.routes.iter().enumerate() {
        let size = route.kind.body_size();
        let progress = RouteProgress::start(&route.waypoints);
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::from_size(size))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: route.kind.color(),
                perceptual_roughness: 0.5,
                metallic: 0.4,
                ..default()
            })),
            Transform::from_xyz(progress.position.x, size.y / 2.0, progress.position.y),
            TrafficVehicle {
                route: route_index,
                progress,
            },
        ));
    }

    spawned.0 = true;
    info!("Spawned {} traffic vehicles", config.routes.len());
}

fn advance_traffic(
    mut ticks: EventReader<SimulationTick>,
    config: Res<TrafficConfig>,
    mut query: Query<(&mut TrafficVehicle, &mut Transform)>,
) {
    let tick_count = ticks.read().count();
    if tick_count == 0 {
        return;
    }

    for (mut vehicle, mut transform) in &mut query {
        let Some(route) = config.routes.get(vehicle.route) else {
            continue;
        };
        for _ in 0..tick_count {
            vehicle.progress = advance(vehicle.progress, &route.waypoints, route.speed, config.arrive_radius);
        }
        transform.translation.x = vehicle.progress.position.x;
        transform.translation.z = vehicle.progress.position.y;
        transform.rotation = Quat::from_rotation_y(vehicle.progress.yaw());
    }
}

/// Collision box of a traffic vehicle at its current transform.
pub fn traffic_collider(entity: Entity, kind: TrafficKind, transform: &Transform) -> BoxCollider {
    let (yaw, _, _) = transform.rotation.to_euler(EulerRot::YXZ);
    BoxCollider::rotated(
        ColliderBody::Traffic(entity),
        transform.translation,
        kind.body_size(),
        yaw,
    )
}

fn publish_traffic_colliders(
    config: Res<TrafficConfig>,
    query: Query<(Entity, &TrafficVehicle, &Transform)>,
    mut colliders: ResMut<KinematicColliders>,
) {
    colliders.clear();
    for (entity, vehicle, transform) in &query {
        if let Some(route) = config.routes.get(vehicle.route) {
            colliders.push(traffic_collider(entity, route.kind, transform));
        }
    }
}
