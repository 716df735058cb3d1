//! Static road network and road-membership classification.
//!
//! The network is a fixed grid: one north-south arterial, evenly spaced
//! east-west cross streets that extend into side roads, and roundabouts with
//! four cardinal connector arms. Everything that must stay off the asphalt
//! (buildings, sidewalks, park trees) is validated through [`RoadNetwork`].

use bevy::prelude::*;

pub struct RoadsPlugin;

impl Plugin for RoadsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RoadNetwork>();
    }
}

/// The north-south arterial.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MainStreet {
    pub center_x: f32,
    pub width: f32,
}

/// A side road expressed as a centre line and a width along x.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SideRoad {
    pub x: f32,
    pub width: f32,
}

impl SideRoad {
    /// The edge of the side road farthest from the main street.
    pub fn outer_edge(&self) -> f32 {
        if self.x < 0.0 {
            self.x - self.width / 2.0
        } else {
            self.x + self.width / 2.0
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SideRoads {
    pub left: SideRoad,
    pub right: SideRoad,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Roundabout {
    pub x: f32,
    pub z: f32,
    pub radius: f32,
}

/// Declarative description of the road grid.
#[derive(Clone, Debug, PartialEq)]
pub struct RoadSpec {
    pub main_street: MainStreet,
    /// Z coordinates of the east-west cross streets.
    pub cross_streets: Vec<f32>,
    pub cross_street_width: f32,
    pub side_roads: SideRoads,
    pub roundabouts: Vec<Roundabout>,
    /// How far each connector arm reaches beyond the roundabout's edge.
    pub connector_length: f32,
    pub connector_width: f32,
}

impl Default for RoadSpec {
    fn default() -> Self {
        Self {
            main_street: MainStreet {
                center_x: 0.0,
                width: 12.0,
            },
            cross_streets: vec![-150.0, -90.0, -30.0, 30.0, 90.0, 150.0],
            cross_street_width: 10.0,
            side_roads: SideRoads {
                left: SideRoad {
                    x: -50.0,
                    width: 88.0,
                },
                right: SideRoad {
                    x: 50.0,
                    width: 88.0,
                },
            },
            roundabouts: vec![
                Roundabout {
                    x: -80.0,
                    z: -60.0,
                    radius: 25.0,
                },
                Roundabout {
                    x: 80.0,
                    z: 60.0,
                    radius: 25.0,
                },
                Roundabout {
                    x: -80.0,
                    z: 120.0,
                    radius: 25.0,
                },
            ],
            connector_length: 35.0,
            connector_width: 10.0,
        }
    }
}

/// How a footprint is validated against the road network.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FootprintCheck {
    /// Only the footprint centre is tested.
    CenterOnly,
    /// Corners, centre and an interior lattice are tested.
    #[default]
    Footprint,
}

/// Drawable road geometry handed to the mesh builder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RoadSegment {
    /// Axis-aligned strip, `size` is (x extent, z extent).
    Strip { center: Vec2, size: Vec2 },
    Disc { center: Vec2, radius: f32 },
}

/// Road network resource with the classification queries.
#[derive(Resource, Clone, Debug, Default)]
pub struct RoadNetwork {
    pub spec: RoadSpec,
}

impl RoadNetwork {
    pub fn new(spec: RoadSpec) -> Self {
        Self { spec }
    }

    /// Whether the world point `(x, z)` lies on any road surface.
    ///
    /// All comparisons are inclusive, so a point exactly on a road edge is
    /// on the road. Roundabout connectors only run along the axes; diagonal
    /// approaches between two arms are not road.
    pub fn is_on_road(&self, x: f32, z: f32) -> bool {
        let spec = &self.spec;
        let main = spec.main_street;

        if (x - main.center_x).abs() <= main.width / 2.0 {
            return true;
        }

        if self.is_on_cross_street(z) {
            return true;
        }

        // Side roads from the main street out to the west/east boundaries.
        for &street_z in &spec.cross_streets {
            if (z - street_z).abs() <= spec.cross_street_width / 2.0 {
                let west_edge = spec.side_roads.left.outer_edge();
                let east_edge = spec.side_roads.right.outer_edge();
                if x >= west_edge && x <= main.center_x - main.width / 2.0 {
                    return true;
                }
                if x <= east_edge && x >= main.center_x + main.width / 2.0 {
                    return true;
                }
            }
        }

        spec.roundabouts
            .iter()
            .any(|roundabout| self.is_on_roundabout(roundabout, x, z))
    }

    /// Whether `z` falls inside the band of any cross street.
    pub fn is_on_cross_street(&self, z: f32) -> bool {
        let half = self.spec.cross_street_width / 2.0;
        self.spec
            .cross_streets
            .iter()
            .any(|&street_z| (z - street_z).abs() <= half)
    }

    fn is_on_roundabout(&self, r: &Roundabout, x: f32, z: f32) -> bool {
        let dx = x - r.x;
        let dz = z - r.z;
        if (dx * dx + dz * dz).sqrt() <= r.radius {
            return true;
        }

        let half = self.spec.connector_width / 2.0;
        let reach = r.radius + self.spec.connector_length;

        // North and south arms.
        if dx.abs() <= half && dz.abs() >= r.radius && dz.abs() <= reach {
            return true;
        }
        // East and west arms.
        dz.abs() <= half && dx.abs() >= r.radius && dx.abs() <= reach
    }

    /// Checks that an axis-aligned footprint centred on `center` with extent
    /// `size` (x, z) stays off every road.
    pub fn footprint_clear(
        &self,
        center: Vec2,
        size: Vec2,
        check: FootprintCheck,
        sample_spacing: f32,
    ) -> bool {
        if self.is_on_road(center.x, center.y) {
            return false;
        }
        if check == FootprintCheck::CenterOnly {
            return true;
        }

        let half = size / 2.0;
        let spacing = sample_spacing.max(0.1);
        let steps_x = (size.x / spacing).ceil().max(1.0) as u32;
        let steps_z = (size.y / spacing).ceil().max(1.0) as u32;

        // The lattice includes both edges, so corners are always sampled.
        for ix in 0..=steps_x {
            let x = center.x - half.x + size.x * ix as f32 / steps_x as f32;
            for iz in 0..=steps_z {
                let z = center.y - half.y + size.y * iz as f32 / steps_z as f32;
                if self.is_on_road(x, z) {
                    return false;
                }
            }
        }
        true
    }

    /// Road surfaces as drawable strips and discs.
    ///
    /// `extent` is the half-length of the main street and cross streets.
    pub fn segments(&self, extent: f32) -> Vec<RoadSegment> {
        let spec = &self.spec;
        let main = spec.main_street;
        let mut segments = Vec::new();

        segments.push(RoadSegment::Strip {
            center: Vec2::new(main.center_x, 0.0),
            size: Vec2::new(main.width, extent * 2.0),
        });

        // Cross streets classify as road at every x, so they span the extent.
        for &street_z in &spec.cross_streets {
            segments.push(RoadSegment::Strip {
                center: Vec2::new(main.center_x, street_z),
                size: Vec2::new(extent * 2.0, spec.cross_street_width),
            });
        }

        for r in &spec.roundabouts {
            segments.push(RoadSegment::Disc {
                center: Vec2::new(r.x, r.z),
                radius: r.radius,
            });
            let arm_offset = r.radius + spec.connector_length / 2.0;
            for (dir, along_x) in [
                (Vec2::Y, false),
                (Vec2::NEG_Y, false),
                (Vec2::X, true),
                (Vec2::NEG_X, true),
            ] {
                let size = if along_x {
                    Vec2::new(spec.connector_length, spec.connector_width)
                } else {
                    Vec2::new(spec.connector_width, spec.connector_length)
                };
                segments.push(RoadSegment::Strip {
                    center: Vec2::new(r.x, r.z) + dir * arm_offset,
                    size,
                });
            }
        }

        segments
    }
}
