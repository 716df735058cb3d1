//! Flickering window lights on the east face of every structure.
//!
//! Brightness comes from the catalog's `window_light` function and is
//! quantised into a few levels so windows can share materials. A window
//! only swaps its material handle when its level changes.

use bevy::prelude::*;

use crate::procgen::catalog::{self, WINDOW_PALETTE};
use crate::procgen::layout::CityLayout;
use crate::render::city_spawner::CitySpawned;

pub struct WindowLightsPlugin;

impl Plugin for WindowLightsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WindowLightConfig>()
            .add_systems(Update, spawn_window_lights.run_if(should_spawn_windows))
            .add_systems(Update, update_window_brightness);
    }
}

fn should_spawn_windows(
    spawned: Res<CitySpawned>,
    materials: Option<Res<WindowMaterials>>,
) -> bool {
    spawned.0 && materials.is_none()
}

#[derive(Resource)]
pub struct WindowLightConfig {
    /// Number of distinct brightness steps.
    pub levels: usize,
    /// Brightness mapped to the top level.
    pub max_light: f32,
    /// Emissive multiplier applied to the glow colour.
    pub emissive_strength: f32,
    pub tinted_alpha: f32,
}

impl Default for WindowLightConfig {
    fn default() -> Self {
        Self {
            levels: 8,
            max_light: 0.6,
            emissive_strength: 4.0,
            tinted_alpha: 0.7,
        }
    }
}

#[derive(Component)]
pub struct WindowLight {
    pub key: Vec2,
    pub row: u32,
    pub col: u32,
    pub palette: usize,
    pub tinted: bool,
    pub level: usize,
}

/// Shared window materials indexed by tint, palette colour and level.
#[derive(Resource)]
pub struct WindowMaterials {
    levels: usize,
    handles: Vec<Handle<StandardMaterial>>,
}

impl WindowMaterials {
    fn index(&self, tinted: bool, palette: usize, level: usize) -> usize {
        (usize::from(tinted) * WINDOW_PALETTE.len() + palette) * self.levels + level
    }

    pub fn get(&self, tinted: bool, palette: usize, level: usize) -> Option<&Handle<StandardMaterial>> {
        self.handles.get(self.index(tinted, palette, level))
    }
}

/// Brightness level for a light value, `0..levels`.
pub fn light_level(light: f32, max_light: f32, levels: usize) -> usize {
    if levels < 2 || max_light <= 0.0 {
        return 0;
    }
    let top = (levels - 1) as f32;
    ((light / max_light).clamp(0.0, 1.0) * top).round() as usize
}

fn level_brightness(level: usize, config: &WindowLightConfig) -> f32 {
    if config.levels < 2 {
        return config.max_light;
    }
    config.max_light * level as f32 / (config.levels - 1) as f32
}

fn build_window_materials(
    config: &WindowLightConfig,
    materials: &mut Assets<StandardMaterial>,
) -> WindowMaterials {
    let levels = config.levels.max(1);
    let mut handles = Vec::with_capacity(2 * WINDOW_PALETTE.len() * levels);
    for tinted in [false, true] {
        for &(r, g, b) in &WINDOW_PALETTE {
            let glow = Color::srgb_u8(r, g, b);
            for level in 0..levels {
                let brightness = level_brightness(level, config);
                let base_color = if tinted {
                    Color::srgba(0.25, 0.35, 0.45, config.tinted_alpha)
                } else {
                    Color::srgb(0.1, 0.1, 0.12)
                };
                handles.push(materials.add(StandardMaterial {
                    base_color,
                    emissive: glow.to_linear() * brightness * config.emissive_strength,
                    alpha_mode: if tinted {
                        AlphaMode::Blend
                    } else {
                        AlphaMode::Opaque
                    },
                    perceptual_roughness: 0.2,
                    ..default()
                }));
            }
        }
    }
    WindowMaterials { levels, handles }
}

fn spawn_window_lights(
    mut commands: Commands,
    config: Res<WindowLightConfig>,
    layout: Res<CityLayout>,
    time: Res<Time>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    info!("Spawning window lights...");

    let window_materials = build_window_materials(&config, &mut materials);
    let unit_cube = meshes.add(Cuboid::new(1.0, 1.0, 1.0));
    let now = time.elapsed_secs();

    let mut window_count = 0;
    for record in &layout.structures {
        let ground = record.ground_center();
        let key = record.light_key;
        for window in &record.windows {
            let palette = catalog::window_palette_index(key.x, key.y, window.row, window.col);
            let light = catalog::window_light(key.x, key.y, window.row, window.col, now);
            let level = light_level(light, config.max_light, window_materials.levels);
            let Some(material) = window_materials.get(window.tinted, palette, level) else {
                continue;
            };

            commands.spawn((
                Mesh3d(unit_cube.clone()),
                MeshMaterial3d(material.clone()),
                Transform::from_xyz(
                    ground.x + window.offset.x,
                    window.offset.y,
                    ground.y + window.offset.z,
                )
                .with_scale(window.size),
                WindowLight {
                    key,
                    row: window.row,
                    col: window.col,
                    palette,
                    tinted: window.tinted,
                    level,
                },
            ));
            window_count += 1;
        }
    }

    commands.insert_resource(window_materials);
    info!("Spawned {} window lights", window_count);
}

fn update_window_brightness(
    time: Res<Time>,
    config: Res<WindowLightConfig>,
    window_materials: Option<Res<WindowMaterials>>,
    mut window_query: Query<(&mut WindowLight, &mut MeshMaterial3d<StandardMaterial>)>,
) {
    let Some(window_materials) = window_materials else {
        return;
    };
    let now = time.elapsed_secs();

    for (mut window, mut material) in &mut window_query {
        let light = catalog::window_light(window.key.x, window.key.y, window.row, window.col, now);
        let level = light_level(light, config.max_light, window_materials.levels);
        if level == window.level {
            continue;
        }
        if let Some(handle) = window_materials.get(window.tinted, window.palette, level) {
            material.0 = handle.clone();
            window.level = level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dark_and_bright_windows_map_to_the_ends() {
        assert_eq!(light_level(0.02, 0.6, 8), 0);
        assert_eq!(light_level(0.6, 0.6, 8), 7);
        assert_eq!(light_level(5.0, 0.6, 8), 7);
        assert_eq!(light_level(0.3, 0.6, 8), 4);
        assert_eq!(light_level(0.3, 0.6, 1), 0);
    }

    #[test]
    fn lit_windows_never_fall_to_the_dark_level() {
        let config = WindowLightConfig::default();
        for step in 0..200 {
            let light = catalog::window_light(12.0, -40.0, 3, 1, step as f32 * 0.1);
            let level = light_level(light, config.max_light, config.levels);
            if light > 0.1 {
                assert!(level >= 2, "light {light} mapped to {level}");
            } else {
                assert_eq!(level, 0);
            }
        }
    }

    #[test]
    fn material_table_covers_every_combination() {
        let config = WindowLightConfig::default();
        let mut materials = Assets::<StandardMaterial>::default();
        let table = build_window_materials(&config, &mut materials);
        assert_eq!(table.handles.len(), 2 * WINDOW_PALETTE.len() * config.levels);
        assert!(table.get(true, WINDOW_PALETTE.len() - 1, config.levels - 1).is_some());
        assert_ne!(table.get(false, 0, 0), table.get(true, 0, 0));
    }
}
