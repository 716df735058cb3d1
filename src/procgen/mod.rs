//! Procedural generation of the city.
//!
//! - Static road network and road classification
//! - Structure catalog with decoration and window rules
//! - Distance-based districts
//! - Layout passes placing structures, sidewalks and parks

use bevy::prelude::*;

pub mod catalog;
pub mod districts;
pub mod layout;
pub mod roads;

pub struct ProcgenPlugin;

impl Plugin for ProcgenPlugin {
    fn build(&self, app: &mut App) {
        // Road network and catalog must exist before the layout runs
        app.add_plugins(roads::RoadsPlugin)
            .add_plugins(catalog::CatalogPlugin)
            .add_plugins(layout::LayoutPlugin);
    }
}
