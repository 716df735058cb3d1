//! Distance-based zoning.
//!
//! Districts form concentric rings around the world origin. Each ring
//! restricts which structure kinds may appear, how densely cells are filled
//! and how tall buildings grow.

use bevy::prelude::*;

use super::catalog::StructureKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum District {
    Downtown,
    Midtown,
    Urban,
    Suburban,
}

/// Placement rules for one district.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistrictRules {
    pub allowed: &'static [StructureKind],
    /// Probability that a free grid cell receives a building.
    pub density: f32,
    pub height_scale: f32,
}

const DOWNTOWN_KINDS: &[StructureKind] = &[
    StructureKind::Modern,
    StructureKind::ArtDeco,
    StructureKind::Luxury,
];
const MIDTOWN_KINDS: &[StructureKind] = &[
    StructureKind::Prewar,
    StructureKind::Commercial,
    StructureKind::Office,
];
const URBAN_KINDS: &[StructureKind] = &[
    StructureKind::Brownstone,
    StructureKind::Prewar,
    StructureKind::Industrial,
    StructureKind::Commercial,
];
const SUBURBAN_KINDS: &[StructureKind] = &[StructureKind::Brownstone, StructureKind::House];

impl District {
    /// Ring for a distance from the origin. Ring edges belong to the outer
    /// ring: exactly 40 is midtown.
    pub fn from_distance(distance: f32) -> Self {
        if distance < 40.0 {
            District::Downtown
        } else if distance < 80.0 {
            District::Midtown
        } else if distance < 120.0 {
            District::Urban
        } else {
            District::Suburban
        }
    }

    pub fn at(position: Vec2) -> Self {
        Self::from_distance(position.length())
    }

    pub fn rules(self) -> DistrictRules {
        match self {
            District::Downtown => DistrictRules {
                allowed: DOWNTOWN_KINDS,
                density: 0.95,
                height_scale: 1.2,
            },
            District::Midtown => DistrictRules {
                allowed: MIDTOWN_KINDS,
                density: 0.85,
                height_scale: 1.0,
            },
            District::Urban => DistrictRules {
                allowed: URBAN_KINDS,
                density: 0.75,
                height_scale: 1.0,
            },
            District::Suburban => DistrictRules {
                allowed: SUBURBAN_KINDS,
                density: 0.6,
                height_scale: 0.7,
            },
        }
    }
}
