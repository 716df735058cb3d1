//! Rendering systems: lighting, sky, road surfaces, city meshes and window lights.

use bevy::prelude::*;

pub mod city_spawner;
pub mod lighting;
pub mod road_mesh;
pub mod sky;
pub mod window_lights;

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(lighting::LightingPlugin)
            .add_plugins(sky::SkyPlugin)
            .add_plugins(road_mesh::RoadMeshPlugin)
            .add_plugins(city_spawner::CitySpawnerPlugin)
            .add_plugins(window_lights::WindowLightsPlugin);
    }
}
