//! Star field on a shell around the camera.
//!
//! Stars are scattered through a shell `radius..radius + depth` thick and
//! batched into one mesh of small octahedra. The shell follows the camera so
//! the stars read as sky rather than scenery.

use bevy::pbr::NotShadowCaster;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;
use rand::{rngs::StdRng, Rng, SeedableRng};

pub struct SkyPlugin;

impl Plugin for SkyPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StarFieldConfig>()
            .add_systems(Startup, spawn_star_field)
            .add_systems(Update, follow_camera);
    }
}

#[derive(Resource, Clone, Debug)]
pub struct StarFieldConfig {
    pub count: usize,
    /// Inner radius of the shell.
    pub radius: f32,
    /// Thickness of the shell.
    pub depth: f32,
    pub size_min: f32,
    pub size_max: f32,
    pub seed: u64,
}

impl Default for StarFieldConfig {
    fn default() -> Self {
        Self {
            count: 1500,
            radius: 400.0,
            depth: 50.0,
            size_min: 0.4,
            size_max: 1.6,
            seed: 42,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StarPoint {
    pub position: Vec3,
    pub size: f32,
}

#[derive(Component)]
pub struct StarField;

/// Star positions above the horizon, relative to the shell's centre.
pub fn star_points(config: &StarFieldConfig) -> Vec<StarPoint> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    (0..config.count)
        .map(|_| {
            let azimuth = rng.gen::<f32>() * std::f32::consts::TAU;
            let elevation = rng.gen::<f32>().asin();
            let direction = Vec3::new(
                elevation.cos() * azimuth.cos(),
                elevation.sin(),
                elevation.cos() * azimuth.sin(),
            );
            let distance = config.radius + rng.gen::<f32>() * config.depth;
            let size = config.size_min + rng.gen::<f32>() * (config.size_max - config.size_min);
            StarPoint {
                position: direction * distance,
                size,
            }
        })
        .collect()
}

const OCTAHEDRON: [Vec3; 6] = [
    Vec3::Y,
    Vec3::X,
    Vec3::Z,
    Vec3::NEG_X,
    Vec3::NEG_Z,
    Vec3::NEG_Y,
];

const OCTAHEDRON_FACES: [[u32; 3]; 8] = [
    [0, 1, 2],
    [0, 2, 3],
    [0, 3, 4],
    [0, 4, 1],
    [5, 2, 1],
    [5, 3, 2],
    [5, 4, 3],
    [5, 1, 4],
];

/// One mesh holding an octahedron per star.
pub fn star_field_mesh(stars: &[StarPoint]) -> Mesh {
    let mut positions = Vec::with_capacity(stars.len() * OCTAHEDRON.len());
    let mut normals = Vec::with_capacity(stars.len() * OCTAHEDRON.len());
    let mut indices = Vec::with_capacity(stars.len() * OCTAHEDRON_FACES.len() * 3);

    for star in stars {
        let base = positions.len() as u32;
        for corner in OCTAHEDRON {
            positions.push((star.position + corner * star.size).to_array());
            normals.push(corner.to_array());
        }
        for face in OCTAHEDRON_FACES {
            indices.extend(face.iter().map(|i| base + i));
        }
    }

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::RENDER_WORLD)
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_indices(Indices::U32(indices))
}

fn spawn_star_field(
    mut commands: Commands,
    config: Res<StarFieldConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let stars = star_points(&config);
    commands.spawn((
        Mesh3d(meshes.add(star_field_mesh(&stars))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::WHITE,
            emissive: LinearRgba::rgb(3.0, 3.0, 3.0),
            unlit: true,
            fog_enabled: false,
            ..default()
        })),
        Transform::IDENTITY,
        NotShadowCaster,
        StarField,
    ));
    info!("Star field: {} stars", stars.len());
}

fn follow_camera(
    cameras: Query<&Transform, (With<Camera3d>, Without<StarField>)>,
    mut fields: Query<&mut Transform, With<StarField>>,
) {
    let Ok(camera) = cameras.get_single() else {
        return;
    };
    for mut field in &mut fields {
        field.translation = camera.translation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stars_fill_the_upper_shell() {
        let config = StarFieldConfig::default();
        let stars = star_points(&config);
        assert_eq!(stars.len(), config.count);
        for star in &stars {
            let distance = star.position.length();
            assert!(distance >= config.radius - 1e-2);
            assert!(distance <= config.radius + config.depth + 1e-2);
            assert!(star.position.y >= 0.0);
            assert!(star.size >= config.size_min && star.size <= config.size_max);
        }
        assert_eq!(stars, star_points(&config));
    }

    #[test]
    fn mesh_has_one_octahedron_per_star() {
        let stars = [
            StarPoint {
                position: Vec3::new(0.0, 400.0, 0.0),
                size: 1.0,
            },
            StarPoint {
                position: Vec3::new(300.0, 300.0, 0.0),
                size: 0.5,
            },
        ];
        let mesh = star_field_mesh(&stars);
        assert_eq!(mesh.count_vertices(), 12);
        let Some(Indices::U32(indices)) = mesh.indices() else {
            panic!("expected u32 indices");
        };
        assert_eq!(indices.len(), 2 * 8 * 3);
        assert!(indices[24..].iter().all(|&i| (6..12).contains(&i)));
    }
}
