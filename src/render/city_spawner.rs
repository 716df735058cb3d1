//! Spawns meshes for everything in the generated city layout.
//!
//! Structures share one unit cube scaled per record and one material per
//! structure kind. Decorations, sidewalks, parks and trees follow.

use std::collections::HashMap;
use std::f32::consts::FRAC_PI_4;

use bevy::prelude::*;

use crate::procgen::catalog::{DecorationSpec, Primitive, StructureCatalog, StructureKind};
use crate::procgen::layout::{CityLayout, PlacementId, PlacementRecord};

pub struct CitySpawnerPlugin;

impl Plugin for CitySpawnerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CitySpawnConfig>()
            .init_resource::<CitySpawned>()
            .add_systems(Update, spawn_city.run_if(should_spawn_city));
    }
}

fn should_spawn_city(layout: Res<CityLayout>, spawned: Res<CitySpawned>) -> bool {
    layout.generated && !spawned.0
}

#[derive(Resource, Default)]
pub struct CitySpawned(pub bool);

#[derive(Component)]
pub struct Structure {
    pub placement: PlacementId,
    pub kind: StructureKind,
}

#[derive(Component)]
pub struct Sidewalk;

#[derive(Component)]
pub struct ParkLawn {
    pub name: &'static str,
}

#[derive(Component)]
pub struct Tree;

#[derive(Resource)]
pub struct CitySpawnConfig {
    pub sidewalk_height: f32,
    pub sidewalk_color: Color,
    pub lawn_height: f32,
    pub lawn_color: Color,
    pub trunk_radius: f32,
    pub trunk_height: f32,
    pub crown_radius: f32,
    pub trunk_color: Color,
    pub crown_color: Color,
}

impl Default for CitySpawnConfig {
    fn default() -> Self {
        Self {
            sidewalk_height: 0.15,
            sidewalk_color: Color::srgb_u8(0x9a, 0x9a, 0x96),
            lawn_height: 0.05,
            lawn_color: Color::srgb(0.3, 0.55, 0.25),
            trunk_radius: 0.3,
            trunk_height: 3.0,
            crown_radius: 1.6,
            trunk_color: Color::srgb(0.4, 0.28, 0.18),
            crown_color: Color::srgb(0.2, 0.45, 0.15),
        }
    }
}

/// Mesh for a decoration primitive.
pub fn primitive_mesh(primitive: Primitive) -> Mesh {
    match primitive {
        Primitive::Cuboid { size } => Cuboid::from_size(size).into(),
        Primitive::Cylinder { radius, height } => Cylinder::new(radius, height).into(),
        Primitive::Cone {
            radius,
            height,
            sides,
        } => Cone::new(radius, height).mesh().resolution(sides).into(),
    }
}

/// World transform of a decoration on a placed structure.
pub fn decoration_transform(record: &PlacementRecord, decoration: &DecorationSpec) -> Transform {
    let ground = record.ground_center();
    let mut transform = Transform::from_xyz(
        ground.x + decoration.offset.x,
        decoration.offset.y,
        ground.y + decoration.offset.z,
    );
    // Four-sided roofs are turned so their edges follow the walls.
    if let Primitive::Cone { sides: 4, .. } = decoration.primitive {
        transform.rotate_y(FRAC_PI_4);
    }
    transform
}

fn decoration_material(decoration: &DecorationSpec) -> StandardMaterial {
    let translucent = decoration.opacity < 1.0;
    StandardMaterial {
        base_color: decoration.color.with_alpha(decoration.opacity),
        emissive: decoration
            .emissive
            .map(|c| c.to_linear() * 2.0)
            .unwrap_or(LinearRgba::BLACK),
        alpha_mode: if translucent {
            AlphaMode::Blend
        } else {
            AlphaMode::Opaque
        },
        perceptual_roughness: if translucent { 0.1 } else { 0.8 },
        ..default()
    }
}

fn spawn_city(
    mut commands: Commands,
    layout: Res<CityLayout>,
    catalog: Res<StructureCatalog>,
    config: Res<CitySpawnConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut spawned: ResMut<CitySpawned>,
) {
    info!("Spawning {} structures...", layout.structures.len());

    let unit_cube = meshes.add(Cuboid::new(1.0, 1.0, 1.0));
    let kind_materials: HashMap<StructureKind, Handle<StandardMaterial>> = catalog
        .iter()
        .map(|ty| {
            let material = materials.add(StandardMaterial {
                base_color: ty.color,
                perceptual_roughness: ty.roughness(),
                metallic: ty.metallic(),
                ..default()
            });
            (ty.kind, material)
        })
        .collect();

    let mut decoration_count = 0;
    for record in &layout.structures {
        let Some(material) = kind_materials.get(&record.kind) else {
            continue;
        };
        commands.spawn((
            Mesh3d(unit_cube.clone()),
            MeshMaterial3d(material.clone()),
            Transform::from_translation(record.position)
                .with_scale(Vec3::new(record.footprint.x, record.height, record.footprint.y)),
            Structure {
                placement: record.id,
                kind: record.kind,
            },
        ));

        for decoration in &record.decorations {
            commands.spawn((
                Mesh3d(meshes.add(primitive_mesh(decoration.primitive))),
                MeshMaterial3d(materials.add(decoration_material(decoration))),
                decoration_transform(record, decoration),
            ));
            decoration_count += 1;
        }
    }

    let sidewalk_material = materials.add(StandardMaterial {
        base_color: config.sidewalk_color,
        perceptual_roughness: 0.9,
        ..default()
    });
    for strip in &layout.sidewalks {
        commands.spawn((
            Mesh3d(unit_cube.clone()),
            MeshMaterial3d(sidewalk_material.clone()),
            Transform::from_xyz(strip.center.x, config.sidewalk_height / 2.0, strip.center.y)
                .with_scale(Vec3::new(strip.size.x, config.sidewalk_height, strip.size.y)),
            Sidewalk,
        ));
    }

    let lawn_material = materials.add(StandardMaterial {
        base_color: config.lawn_color,
        perceptual_roughness: 0.95,
        ..default()
    });
    let trunk_mesh = meshes.add(Cylinder::new(config.trunk_radius, config.trunk_height));
    let crown_mesh = meshes.add(Sphere::new(config.crown_radius));
    let trunk_material = materials.add(StandardMaterial {
        base_color: config.trunk_color,
        perceptual_roughness: 0.9,
        ..default()
    });
    let crown_material = materials.add(StandardMaterial {
        base_color: config.crown_color,
        perceptual_roughness: 0.85,
        ..default()
    });

    let mut tree_count = 0;
    for park in &layout.parks {
        commands.spawn((
            Mesh3d(unit_cube.clone()),
            MeshMaterial3d(lawn_material.clone()),
            Transform::from_xyz(park.center.x, config.lawn_height / 2.0, park.center.y)
                .with_scale(Vec3::new(park.size, config.lawn_height, park.size)),
            ParkLawn { name: park.name },
        ));

        for tree in &park.trees {
            commands
                .spawn((
                    Transform::from_xyz(tree.position.x, 0.0, tree.position.y),
                    Visibility::default(),
                    Tree,
                ))
                .with_children(|parent| {
                    parent.spawn((
                        Mesh3d(trunk_mesh.clone()),
                        MeshMaterial3d(trunk_material.clone()),
                        Transform::from_xyz(0.0, config.trunk_height / 2.0, 0.0),
                    ));
                    parent.spawn((
                        Mesh3d(crown_mesh.clone()),
                        MeshMaterial3d(crown_material.clone()),
                        Transform::from_xyz(0.0, config.trunk_height + config.crown_radius * 0.6, 0.0),
                    ));
                });
            tree_count += 1;
        }
    }

    spawned.0 = true;
    info!(
        "City spawned: {} structures, {} decorations, {} sidewalks, {} parks, {} trees",
        layout.structures.len(),
        decoration_count,
        layout.sidewalks.len(),
        layout.parks.len(),
        tree_count
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procgen::catalog::{self, DecorationKind};
    use crate::procgen::layout::PlacementPass;

    fn house_record() -> PlacementRecord {
        let types = StructureCatalog::default();
        let ty = types.get(StructureKind::House);
        let position = Vec2::new(150.0, 42.0);
        PlacementRecord {
            id: PlacementId(3),
            pass: PlacementPass::CityGrid,
            kind: ty.kind,
            position: Vec3::new(position.x, 4.0, position.y),
            footprint: ty.footprint(),
            height: 8.0,
            light_key: position,
            decorations: catalog::decorations(ty, 8.0, position),
            windows: catalog::windows(ty, 8.0, position),
        }
    }

    #[test]
    fn decorations_are_placed_relative_to_the_ground_centre() {
        let record = house_record();
        let roof = record
            .decorations
            .iter()
            .find(|d| d.kind == DecorationKind::PitchedRoof)
            .expect("houses carry a roof");
        let transform = decoration_transform(&record, roof);
        assert_eq!(transform.translation.x, 150.0 + roof.offset.x);
        assert_eq!(transform.translation.z, 42.0 + roof.offset.z);
        assert!(transform.translation.y > record.height);
        assert_ne!(transform.rotation, Quat::IDENTITY);
    }

    #[test]
    fn translucent_decorations_blend() {
        let record = house_record();
        let solid = decoration_material(&record.decorations[0]);
        assert!(matches!(solid.alpha_mode, AlphaMode::Opaque));

        let mut glass = record.decorations[0].clone();
        glass.opacity = 0.4;
        assert!(matches!(decoration_material(&glass).alpha_mode, AlphaMode::Blend));
    }
}
