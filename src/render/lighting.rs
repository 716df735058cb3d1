//! Scene lighting: sky colour, ambient fill and a shadow-casting sun.

use bevy::pbr::CascadeShadowConfigBuilder;
use bevy::prelude::*;

pub struct LightingPlugin;

impl Plugin for LightingPlugin {
    fn build(&self, app: &mut App) {
        let config = LightingConfig::default();
        app.insert_resource(ClearColor(config.sky_color))
            .insert_resource(config)
            .add_systems(Startup, setup_lighting);
    }
}

#[derive(Resource, Clone, Debug)]
pub struct LightingConfig {
    pub sky_color: Color,
    pub ambient_brightness: f32,
    pub sun_illuminance: f32,
    /// Direction the sun shines from, relative to the origin.
    pub sun_position: Vec3,
    pub shadow_distance: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            sky_color: Color::srgb_u8(0x87, 0xce, 0xeb),
            ambient_brightness: 300.0,
            sun_illuminance: 12_000.0,
            sun_position: Vec3::new(10.0, 20.0, 10.0),
            shadow_distance: 300.0,
        }
    }
}

fn setup_lighting(mut commands: Commands, config: Res<LightingConfig>) {
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: config.ambient_brightness,
    });

    commands.spawn((
        DirectionalLight {
            illuminance: config.sun_illuminance,
            shadows_enabled: true,
            shadow_depth_bias: 0.3,
            shadow_normal_bias: 1.8,
            ..default()
        },
        Transform::from_translation(config.sun_position).looking_at(Vec3::ZERO, Vec3::Y),
        CascadeShadowConfigBuilder {
            num_cascades: 3,
            minimum_distance: 0.1,
            maximum_distance: config.shadow_distance,
            first_cascade_far_bound: 40.0,
            overlap_proportion: 0.3,
        }
        .build(),
    ));
}
