//! Simulation systems for the player vehicle and scripted traffic.
//!
//! The simulation runs on a fixed timestep (default 60 Hz) decoupled from rendering.
//! Systems listen for `SimulationTick` events for synchronized updates.

use bevy::prelude::*;

pub mod touch_controls;
pub mod traffic;
pub mod vehicle;

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimulationConfig>()
            .init_resource::<SimulationStats>()
            .add_event::<SimulationTick>()
            .configure_sets(
                Update,
                (SimulationSet::Clock, SimulationSet::Traffic, SimulationSet::Player).chain(),
            )
            .add_systems(
                Update,
                (simulation_controls, simulation_tick_system)
                    .chain()
                    .in_set(SimulationSet::Clock),
            )
            .add_plugins(vehicle::PlayerVehiclePlugin)
            .add_plugins(traffic::TrafficPlugin);
    }
}

/// Per-frame ordering of the simulation systems. Traffic moves before the
/// player so the car collides with this tick's traffic boxes.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Input toggles and tick emission.
    Clock,
    Traffic,
    Player,
}

/// Configuration for the simulation.
#[derive(Resource)]
pub struct SimulationConfig {
    /// Ticks per second for simulation updates.
    pub tick_rate: f32,
    /// Current simulation speed multiplier (0.25x to 4x).
    pub speed: f32,
    /// Whether simulation is paused.
    pub paused: bool,
    /// Upper bound on ticks emitted in one frame after a stall.
    pub max_ticks_per_frame: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            speed: 1.0,
            paused: false,
            max_ticks_per_frame: 8,
        }
    }
}

/// Event sent each simulation tick (at tick_rate Hz).
#[derive(Event, Clone, Copy, Debug)]
pub struct SimulationTick {
    /// The tick number since simulation start.
    pub tick: u64,
    /// Delta time for this tick (1.0 / tick_rate).
    pub delta: f32,
}

/// Statistics about the simulation.
#[derive(Resource, Default)]
pub struct SimulationStats {
    /// Total ticks since simulation start.
    pub total_ticks: u64,
    /// Accumulated time for fixed timestep.
    pub accumulator: f32,
}

impl SimulationStats {
    /// Consume `elapsed` seconds of accumulated time and return the ticks due.
    pub fn accumulate(&mut self, elapsed: f32, config: &SimulationConfig) -> Vec<SimulationTick> {
        let mut ticks = Vec::new();
        if config.paused || config.tick_rate <= 0.0 {
            return ticks;
        }

        self.accumulator += elapsed * config.speed;
        let tick_duration = 1.0 / config.tick_rate;

        while self.accumulator >= tick_duration {
            self.accumulator -= tick_duration;
            if ticks.len() as u32 >= config.max_ticks_per_frame {
                continue;
            }
            self.total_ticks += 1;
            ticks.push(SimulationTick {
                tick: self.total_ticks,
                delta: tick_duration,
            });
        }

        ticks
    }
}

/// System that generates simulation ticks at fixed intervals.
fn simulation_tick_system(
    config: Res<SimulationConfig>,
    mut stats: ResMut<SimulationStats>,
    time: Res<Time>,
    mut tick_events: EventWriter<SimulationTick>,
) {
    let ticks = stats.accumulate(time.delta_secs(), &config);
    if ticks.len() as u32 == config.max_ticks_per_frame {
        debug!("Simulation tick budget hit, dropping backlog");
    }
    tick_events.send_batch(ticks);
}

/// Keyboard controls for simulation speed and pause.
fn simulation_controls(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut config: ResMut<SimulationConfig>,
) {
    if keyboard.just_pressed(KeyCode::KeyP) {
        config.paused = !config.paused;
        if config.paused {
            info!("Simulation PAUSED");
        } else {
            info!("Simulation RESUMED ({}x speed)", config.speed);
        }
    }

    if keyboard.just_pressed(KeyCode::BracketRight) {
        config.speed = (config.speed * 2.0).min(4.0);
        info!("Simulation speed: {}x", config.speed);
    }
    if keyboard.just_pressed(KeyCode::BracketLeft) {
        config.speed = (config.speed * 0.5).max(0.25);
        info!("Simulation speed: {}x", config.speed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_second_yields_tick_rate_ticks() {
        let config = SimulationConfig::default();
        let mut stats = SimulationStats::default();
        let mut total = 0;
        for _ in 0..60 {
            total += stats.accumulate(1.0 / 60.0 + 1e-6, &config).len();
        }
        assert_eq!(total, 60);
        assert_eq!(stats.total_ticks, 60);
    }

    #[test]
    fn paused_simulation_emits_nothing() {
        let config = SimulationConfig {
            paused: true,
            ..default()
        };
        let mut stats = SimulationStats::default();
        assert!(stats.accumulate(1.0, &config).is_empty());
        assert_eq!(stats.accumulator, 0.0);
    }

    #[test]
    fn long_stall_is_capped() {
        let config = SimulationConfig::default();
        let mut stats = SimulationStats::default();
        let ticks = stats.accumulate(5.0, &config);
        assert_eq!(ticks.len() as u32, config.max_ticks_per_frame);
        assert!(stats.accumulator < 1.0 / config.tick_rate);
        assert_eq!(ticks.last().map(|t| t.tick), Some(stats.total_ticks));
    }

    #[test]
    fn speed_multiplier_scales_tick_count() {
        let config = SimulationConfig {
            speed: 2.0,
            ..default()
        };
        let mut stats = SimulationStats::default();
        let ticks = stats.accumulate(0.05 + 1e-6, &config);
        assert_eq!(ticks.len(), 6);
    }
}
