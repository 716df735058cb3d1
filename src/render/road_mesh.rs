//! Road mesh generation from the road network.
//!
//! Converts road segments into flat surfaces, lane markings and curbs laid
//! on top of the ground plane.

use bevy::prelude::*;

use crate::procgen::roads::{RoadNetwork, RoadSegment};
use crate::world::WorldConfig;

pub struct RoadMeshPlugin;

impl Plugin for RoadMeshPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RoadMeshConfig>()
            .add_systems(Startup, spawn_ground)
            .add_systems(Update, generate_road_meshes.run_if(should_generate_meshes));
    }
}

fn should_generate_meshes(query: Query<&RoadMeshGenerated>) -> bool {
    query.is_empty()
}

/// Marker that road meshes have been generated.
#[derive(Component)]
pub struct RoadMeshGenerated;

/// Marker for road surface entities.
#[derive(Component)]
pub struct RoadMesh;

#[derive(Component)]
pub struct Ground;

/// Configuration for road mesh generation.
#[derive(Resource)]
pub struct RoadMeshConfig {
    pub road_height: f32,
    pub roundabout_height: f32,
    pub marking_height: f32,
    pub curb_height: f32,
    pub marking_width: f32,
    /// Lateral offset of the two solid lines on the main street.
    pub center_line_offset: f32,
    pub dash_length: f32,
    pub dash_gap: f32,
    pub curb_width: f32,
    /// Gap between the road edge and the curb strip's centre.
    pub curb_offset: f32,
    pub road_color: Color,
    pub marking_color: Color,
    pub curb_color: Color,
    pub ground_color: Color,
}

impl Default for RoadMeshConfig {
    fn default() -> Self {
        Self {
            road_height: 0.02,
            roundabout_height: 0.03,
            marking_height: 0.035,
            curb_height: 0.01,
            marking_width: 0.25,
            center_line_offset: 0.3,
            dash_length: 5.0,
            dash_gap: 3.0,
            curb_width: 1.0,
            curb_offset: 1.0,
            road_color: Color::srgb_u8(0x2c, 0x2c, 0x2c),
            marking_color: Color::srgb_u8(0xf2, 0xf2, 0xed),
            curb_color: Color::srgb_u8(0x7a, 0x7a, 0x7a),
            ground_color: Color::srgb(0.3, 0.45, 0.25),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkingKind {
    CenterLine,
    Dash,
    Curb,
}

/// One flat rectangle painted on or beside a road.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Marking {
    pub kind: MarkingKind,
    pub center: Vec2,
    /// (x extent, z extent)
    pub size: Vec2,
}

/// Lane markings and curbs for a set of road segments.
///
/// The strip running along z through the main street's axis gets solid
/// centre lines; strips running along x get dashed centre lines. Every
/// long strip gets a curb on both sides. Roundabouts and their short
/// connector arms get neither.
pub fn lane_markings(
    network: &RoadNetwork,
    segments: &[RoadSegment],
    config: &RoadMeshConfig,
) -> Vec<Marking> {
    let main_x = network.spec.main_street.center_x;
    let arm_length = network.spec.connector_length;
    let mut marks = Vec::new();

    for segment in segments {
        let RoadSegment::Strip { center, size } = *segment else {
            continue;
        };
        let along_z = size.y > size.x;
        let length = size.x.max(size.y);
        let width = size.x.min(size.y);
        if length <= arm_length {
            continue;
        }

        if along_z && (center.x - main_x).abs() < f32::EPSILON {
            for side in [-1.0, 1.0] {
                marks.push(Marking {
                    kind: MarkingKind::CenterLine,
                    center: Vec2::new(center.x + side * config.center_line_offset, center.y),
                    size: Vec2::new(config.marking_width, length),
                });
            }
        } else if !along_z {
            let period = config.dash_length + config.dash_gap;
            let count = (length / period).floor() as u32;
            for i in 0..count {
                let offset = -length / 2.0 + i as f32 * period + config.dash_length / 2.0;
                marks.push(Marking {
                    kind: MarkingKind::Dash,
                    center: Vec2::new(center.x + offset, center.y),
                    size: Vec2::new(config.dash_length, config.marking_width),
                });
            }
        }

        let curb_distance = width / 2.0 + config.curb_offset;
        for side in [-1.0, 1.0] {
            let (curb_center, curb_size) = if along_z {
                (
                    Vec2::new(center.x + side * curb_distance, center.y),
                    Vec2::new(config.curb_width, length),
                )
            } else {
                (
                    Vec2::new(center.x, center.y + side * curb_distance),
                    Vec2::new(length, config.curb_width),
                )
            };
            marks.push(Marking {
                kind: MarkingKind::Curb,
                center: curb_center,
                size: curb_size,
            });
        }
    }

    marks
}

fn spawn_ground(
    mut commands: Commands,
    world: Res<WorldConfig>,
    config: Res<RoadMeshConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(world.ground_size.x, world.ground_size.y))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: config.ground_color,
            perceptual_roughness: 1.0,
            ..default()
        })),
        Transform::IDENTITY,
        Ground,
    ));
}

fn generate_road_meshes(
    mut commands: Commands,
    network: Res<RoadNetwork>,
    world: Res<WorldConfig>,
    config: Res<RoadMeshConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let segments = network.segments(world.road_extent);
    let marks = lane_markings(&network, &segments, &config);

    let road_material = materials.add(StandardMaterial {
        base_color: config.road_color,
        perceptual_roughness: 1.0,
        ..default()
    });
    let marking_material = materials.add(StandardMaterial {
        base_color: config.marking_color,
        emissive: config.marking_color.to_linear() * 0.3,
        ..default()
    });
    let curb_material = materials.add(StandardMaterial {
        base_color: config.curb_color,
        perceptual_roughness: 0.9,
        ..default()
    });
    let unit_plane = meshes.add(Plane3d::default().mesh().size(1.0, 1.0));

    for segment in &segments {
        match *segment {
            RoadSegment::Strip { center, size } => {
                commands.spawn((
                    Mesh3d(unit_plane.clone()),
                    MeshMaterial3d(road_material.clone()),
                    Transform::from_xyz(center.x, config.road_height, center.y)
                        .with_scale(Vec3::new(size.x, 1.0, size.y)),
                    RoadMesh,
                ));
            }
            RoadSegment::Disc { center, radius } => {
                commands.spawn((
                    Mesh3d(meshes.add(Circle::new(radius))),
                    MeshMaterial3d(road_material.clone()),
                    Transform::from_xyz(center.x, config.roundabout_height, center.y)
                        .with_rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)),
                    RoadMesh,
                ));
            }
        }
    }

    for mark in &marks {
        let (material, height) = match mark.kind {
            MarkingKind::CenterLine | MarkingKind::Dash => {
                (marking_material.clone(), config.marking_height)
            }
            MarkingKind::Curb => (curb_material.clone(), config.curb_height),
        };
        commands.spawn((
            Mesh3d(unit_plane.clone()),
            MeshMaterial3d(material),
            Transform::from_xyz(mark.center.x, height, mark.center.y)
                .with_scale(Vec3::new(mark.size.x, 1.0, mark.size.y)),
        ));
    }

    commands.spawn(RoadMeshGenerated);
    info!(
        "Road meshes generated: {} segments, {} markings",
        segments.len(),
        marks.len()
    );
}
