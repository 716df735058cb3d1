//! World management: extent, colliders, spatial partitioning.

use bevy::prelude::*;

pub mod colliders;
pub mod grid;

use crate::procgen::layout::CityLayout;
use colliders::{KinematicColliders, StaticColliders};

pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WorldConfig>()
            .init_resource::<StaticColliders>()
            .init_resource::<KinematicColliders>()
            .add_systems(Update, register_colliders.run_if(should_register_colliders));
    }
}

/// Global world configuration.
#[derive(Resource)]
pub struct WorldConfig {
    /// Ground plane size in world units.
    pub ground_size: Vec2,
    /// Half-length of drawn roads.
    pub road_extent: f32,
    /// Cell size of the collider spatial index.
    pub collider_cell_size: f32,
    /// Collision box of a park tree (width, height, depth).
    pub tree_collider_size: Vec3,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            ground_size: Vec2::new(2000.0, 2000.0),
            road_extent: 260.0,
            collider_cell_size: 24.0,
            tree_collider_size: Vec3::new(0.8, 4.0, 0.8),
        }
    }
}

fn should_register_colliders(layout: Res<CityLayout>, colliders: Res<StaticColliders>) -> bool {
    layout.generated && !colliders.registered
}

fn register_colliders(
    layout: Res<CityLayout>,
    config: Res<WorldConfig>,
    mut colliders: ResMut<StaticColliders>,
) {
    *colliders = StaticColliders::from_layout(
        &layout,
        config.collider_cell_size,
        config.tree_collider_size,
    );
    info!("Registered {} static colliders", colliders.len());
}
