//! Colliders for everything the player car can hit.
//!
//! Placed structures and park trees become axis-aligned boxes that never
//! move. Traffic vehicles are kinematic: their boxes are rebuilt from the
//! vehicles' transforms every tick. Dynamic bodies (the player car) are
//! resolved against both sets as circles in the ground plane.

use bevy::prelude::*;

use super::grid::SpatialGrid;
use crate::procgen::layout::{CityLayout, PlacementId, PlacementRecord};

/// What a collider belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColliderBody {
    Structure(PlacementId),
    Tree { park: usize, tree: usize },
    Traffic(Entity),
}

/// Axis-aligned box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxCollider {
    pub body: ColliderBody,
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl BoxCollider {
    pub fn from_placement(record: &PlacementRecord) -> Self {
        Self {
            body: ColliderBody::Structure(record.id),
            center: record.position,
            half_extents: record.half_extents(),
        }
    }

    /// Box standing on the ground at `position`, `size` = (width, height, depth).
    pub fn standing(body: ColliderBody, position: Vec2, size: Vec3) -> Self {
        Self {
            body,
            center: Vec3::new(position.x, size.y / 2.0, position.y),
            half_extents: size / 2.0,
        }
    }

    /// Ground-plane bounds of a box of `size` rotated by `yaw` about +Y.
    pub fn rotated(body: ColliderBody, center: Vec3, size: Vec3, yaw: f32) -> Self {
        let (sin, cos) = (yaw.sin().abs(), yaw.cos().abs());
        let half = size / 2.0;
        Self {
            body,
            center,
            half_extents: Vec3::new(cos * half.x + sin * half.z, half.y, sin * half.x + cos * half.z),
        }
    }

    fn ground_min(&self) -> Vec2 {
        Vec2::new(self.center.x - self.half_extents.x, self.center.z - self.half_extents.z)
    }

    fn ground_max(&self) -> Vec2 {
        Vec2::new(self.center.x + self.half_extents.x, self.center.z + self.half_extents.z)
    }

    /// Vector that moves a circle out of this box, if they overlap.
    pub fn push_out(&self, position: Vec2, radius: f32) -> Option<Vec2> {
        let min = self.ground_min();
        let max = self.ground_max();
        let closest = position.clamp(min, max);
        let delta = position - closest;
        let distance = delta.length();

        if distance > 0.0 {
            if distance >= radius {
                return None;
            }
            return Some(delta / distance * (radius - distance));
        }

        // Centre inside the box: leave through the nearest face.
        let exits = [
            (position.x - min.x + radius, Vec2::NEG_X),
            (max.x - position.x + radius, Vec2::X),
            (position.y - min.y + radius, Vec2::NEG_Y),
            (max.y - position.y + radius, Vec2::Y),
        ];
        exits
            .into_iter()
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(depth, dir)| dir * depth)
    }
}

/// Result of resolving a moving circle against a collider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    pub body: ColliderBody,
    pub correction: Vec2,
}

fn push_through<'a>(
    colliders: impl IntoIterator<Item = &'a BoxCollider>,
    position: Vec2,
    radius: f32,
    contacts: &mut Vec<Contact>,
) -> Vec2 {
    let mut resolved = position;
    for collider in colliders {
        if let Some(correction) = collider.push_out(resolved, radius) {
            resolved += correction;
            contacts.push(Contact {
                body: collider.body,
                correction,
            });
        }
    }
    resolved
}

/// Structure and tree boxes with a spatial index.
#[derive(Resource, Clone, Debug, Default)]
pub struct StaticColliders {
    pub colliders: Vec<BoxCollider>,
    grid: SpatialGrid,
    pub registered: bool,
}

impl StaticColliders {
    /// Registers one box per structure and one `tree_size` box per tree.
    pub fn from_layout(layout: &CityLayout, cell_size: f32, tree_size: Vec3) -> Self {
        let structures = layout.structures.iter().map(BoxCollider::from_placement);
        let trees = layout.parks.iter().enumerate().flat_map(|(park_index, park)| {
            park.trees.iter().enumerate().map(move |(tree_index, tree)| {
                BoxCollider::standing(
                    ColliderBody::Tree {
                        park: park_index,
                        tree: tree_index,
                    },
                    tree.position,
                    tree_size,
                )
            })
        });
        let colliders: Vec<BoxCollider> = structures.chain(trees).collect();

        let mut grid = SpatialGrid::new(cell_size);
        for (index, collider) in colliders.iter().enumerate() {
            grid.insert_rect(index, collider.ground_min(), collider.ground_max());
        }
        Self {
            colliders,
            grid,
            registered: true,
        }
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Pushes a circle out of every box it overlaps. Returns the corrected
    /// position and the contacts that produced corrections.
    pub fn resolve(&self, position: Vec2, radius: f32) -> (Vec2, Vec<Contact>) {
        let mut contacts = Vec::new();
        let nearby = self.grid.query_radius(position, radius);
        let resolved = push_through(
            nearby.into_iter().filter_map(|index| self.colliders.get(index)),
            position,
            radius,
            &mut contacts,
        );
        (resolved, contacts)
    }
}

/// Boxes of moving bodies, replaced wholesale each tick.
#[derive(Resource, Clone, Debug, Default)]
pub struct KinematicColliders {
    pub colliders: Vec<BoxCollider>,
}

impl KinematicColliders {
    pub fn clear(&mut self) {
        self.colliders.clear();
    }

    pub fn push(&mut self, collider: BoxCollider) {
        self.colliders.push(collider);
    }

    /// Same as [`StaticColliders::resolve`], scanning every box.
    pub fn resolve(&self, position: Vec2, radius: f32) -> (Vec2, Vec<Contact>) {
        let mut contacts = Vec::new();
        let resolved = push_through(&self.colliders, position, radius, &mut contacts);
        (resolved, contacts)
    }
}
