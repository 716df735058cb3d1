//! City Drive - drivable 3D city with a procedural road and building layout
//!
//! A Bevy-based driving demo: a static road network, a seeded layout
//! generator that keeps every structure off the roads, and a player car
//! with scripted traffic driving through the result.

use bevy::prelude::*;

pub mod camera;
pub mod procgen;
pub mod render;
pub mod simulation;
pub mod world;

/// Every plugin the game needs on top of `DefaultPlugins`.
pub struct CityDrivePlugin;

impl Plugin for CityDrivePlugin {
    fn build(&self, app: &mut App) {
        app
            // Procedural generation
            .add_plugins(procgen::ProcgenPlugin)
            // World management
            .add_plugins(world::WorldPlugin)
            // Simulation
            .add_plugins(simulation::SimulationPlugin)
            // Core plugins
            .add_plugins(camera::CameraPlugin)
            .add_plugins(render::RenderPlugin);
    }
}
