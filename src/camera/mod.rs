//! Perspective follow camera orbiting the player vehicle.
//!
//! Dragging with the left mouse button orbits around the car; the camera
//! eases toward its orbit point every frame and always looks at the car.

use bevy::{
    core_pipeline::{
        bloom::{Bloom, BloomPrefilter},
        tonemapping::Tonemapping,
    },
    input::mouse::MouseMotion,
    pbr::{DistanceFog, FogFalloff},
    prelude::*,
};

use crate::simulation::vehicle::PlayerVehicle;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FollowCameraConfig>()
            .init_resource::<BloomConfig>()
            .add_systems(Startup, setup_camera)
            .add_systems(Update, (orbit_controls, follow_player).chain());
    }
}

/// Orbit parameters for the follow camera.
#[derive(Resource, Clone, Debug)]
pub struct FollowCameraConfig {
    /// Distance from the look-at point.
    pub radius: f32,
    /// Height of the look-at point above the car.
    pub height: f32,
    /// Radians of orbit per pixel of mouse drag.
    pub sensitivity: f32,
    pub pitch_limit: f32,
    /// Fraction of the gap to the orbit point closed each frame.
    pub follow_blend: f32,
    pub initial_yaw: f32,
    pub fov_degrees: f32,
}

impl Default for FollowCameraConfig {
    fn default() -> Self {
        Self {
            radius: 8.0,
            height: 2.0,
            sensitivity: 0.003,
            pitch_limit: std::f32::consts::FRAC_PI_3,
            follow_blend: 0.15,
            initial_yaw: std::f32::consts::PI,
            fov_degrees: 65.0,
        }
    }
}

/// Configuration for bloom on emissive windows and sparks.
#[derive(Resource)]
pub struct BloomConfig {
    pub enabled: bool,
    pub intensity: f32,
    /// Bloom threshold (luminance above this glows).
    pub threshold: f32,
    pub threshold_softness: f32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: 0.2,
            threshold: 0.8,
            threshold_softness: 0.3,
        }
    }
}

/// Orbit state of the follow camera.
#[derive(Component, Clone, Copy, Debug)]
pub struct FollowCamera {
    pub yaw: f32,
    pub pitch: f32,
}

impl FollowCamera {
    /// Apply a mouse drag in pixels.
    pub fn drag(&mut self, delta: Vec2, config: &FollowCameraConfig) {
        self.yaw -= delta.x * config.sensitivity;
        self.pitch = (self.pitch - delta.y * config.sensitivity)
            .clamp(-config.pitch_limit, config.pitch_limit);
    }
}

/// Point the camera orbits toward: `radius` away from a look-at point
/// `height` above `target`, in the direction given by yaw and pitch.
pub fn follow_camera_eye(target: Vec3, yaw: f32, pitch: f32, radius: f32, height: f32) -> Vec3 {
    let look_at = target + Vec3::Y * height;
    let offset = Vec3::new(
        yaw.sin() * pitch.cos(),
        pitch.sin(),
        yaw.cos() * pitch.cos(),
    ) * radius;
    look_at + offset
}

fn setup_camera(
    mut commands: Commands,
    config: Res<FollowCameraConfig>,
    bloom_config: Res<BloomConfig>,
) {
    let orbit = FollowCamera {
        yaw: config.initial_yaw,
        pitch: 0.0,
    };
    let eye = follow_camera_eye(Vec3::ZERO, orbit.yaw, orbit.pitch, config.radius, config.height);

    let camera_entity = commands
        .spawn((
            Camera3d::default(),
            Camera {
                hdr: true, // Required for bloom
                ..default()
            },
            Projection::Perspective(PerspectiveProjection {
                fov: config.fov_degrees.to_radians(),
                far: 3000.0,
                ..default()
            }),
            Transform::from_translation(eye).looking_at(Vec3::Y * config.height, Vec3::Y),
            DistanceFog {
                color: Color::srgba(0.55, 0.7, 0.85, 1.0),
                falloff: FogFalloff::Linear {
                    start: 250.0,
                    end: 900.0,
                },
                ..default()
            },
            Tonemapping::TonyMcMapface,
            orbit,
        ))
        .id();

    if bloom_config.enabled {
        commands.entity(camera_entity).insert(Bloom {
            intensity: bloom_config.intensity,
            prefilter: BloomPrefilter {
                threshold: bloom_config.threshold,
                threshold_softness: bloom_config.threshold_softness,
            },
            ..default()
        });
    }

    info!("Follow camera spawned");
}

fn orbit_controls(
    config: Res<FollowCameraConfig>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut query: Query<&mut FollowCamera>,
) {
    if !mouse_buttons.pressed(MouseButton::Left) {
        // Clear any pending mouse motion events when not dragging
        mouse_motion.clear();
        return;
    }

    let delta: Vec2 = mouse_motion.read().map(|e| e.delta).sum();
    if delta == Vec2::ZERO {
        return;
    }

    for mut orbit in &mut query {
        orbit.drag(delta, &config);
    }
}

fn follow_player(
    config: Res<FollowCameraConfig>,
    player: Query<&PlayerVehicle>,
    mut cameras: Query<(&FollowCamera, &mut Transform)>,
) {
    let Ok(vehicle) = player.get_single() else {
        return;
    };
    let target = vehicle.state.position;
    let look_at = target + Vec3::Y * config.height;

    for (orbit, mut transform) in &mut cameras {
        let eye = follow_camera_eye(target, orbit.yaw, orbit.pitch, config.radius, config.height);
        transform.translation = transform.translation.lerp(eye, config.follow_blend);
        transform.look_at(look_at, Vec3::Y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn eye_sits_radius_from_the_look_at_point() {
        let target = Vec3::new(10.0, 0.5, -4.0);
        for (yaw, pitch) in [(0.0, 0.0), (1.0, 0.4), (-2.5, -0.9)] {
            let eye = follow_camera_eye(target, yaw, pitch, 8.0, 2.0);
            let look_at = target + Vec3::Y * 2.0;
            assert!((eye.distance(look_at) - 8.0).abs() < 1e-4);
        }
    }

    #[test]
    fn yaw_zero_looks_from_positive_z() {
        let eye = follow_camera_eye(Vec3::ZERO, 0.0, 0.0, 8.0, 2.0);
        assert!((eye - Vec3::new(0.0, 2.0, 8.0)).length() < 1e-5);

        let side = follow_camera_eye(Vec3::ZERO, FRAC_PI_2, 0.0, 8.0, 2.0);
        assert!((side - Vec3::new(8.0, 2.0, 0.0)).length() < 1e-5);

        let behind = follow_camera_eye(Vec3::ZERO, PI, 0.0, 8.0, 2.0);
        assert!(behind.z < -7.99);
    }

    #[test]
    fn drag_clamps_pitch() {
        let config = FollowCameraConfig::default();
        let mut orbit = FollowCamera { yaw: 0.0, pitch: 0.0 };
        orbit.drag(Vec2::new(100.0, -10_000.0), &config);
        assert!((orbit.yaw + 0.3).abs() < 1e-6);
        assert_eq!(orbit.pitch, config.pitch_limit);

        orbit.drag(Vec2::new(0.0, 10_000.0), &config);
        assert_eq!(orbit.pitch, -config.pitch_limit);
    }
}
