//! Structure catalog: per-type geometry, materials, decorations and windows.
//!
//! Every function here is pure. Randomness that the layout needs per
//! structure (rooftop equipment) comes from a position hash so the same
//! placement always decorates the same way.

use bevy::prelude::*;
use smallvec::SmallVec;

pub struct CatalogPlugin;

impl Plugin for CatalogPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StructureCatalog>();
    }
}

/// Building style tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StructureKind {
    Brownstone,
    Modern,
    Prewar,
    ArtDeco,
    Industrial,
    Luxury,
    Commercial,
    House,
    Office,
}

impl StructureKind {
    /// Catalog order. Hash-based type selection indexes into this.
    pub const ALL: [StructureKind; 9] = [
        StructureKind::Brownstone,
        StructureKind::Modern,
        StructureKind::Prewar,
        StructureKind::ArtDeco,
        StructureKind::Industrial,
        StructureKind::Luxury,
        StructureKind::Commercial,
        StructureKind::House,
        StructureKind::Office,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StructureKind::Brownstone => "brownstone",
            StructureKind::Modern => "modern",
            StructureKind::Prewar => "prewar",
            StructureKind::ArtDeco => "artdeco",
            StructureKind::Industrial => "industrial",
            StructureKind::Luxury => "luxury",
            StructureKind::Commercial => "commercial",
            StructureKind::House => "house",
            StructureKind::Office => "office",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowGrid {
    pub rows: u32,
    pub cols: u32,
}

/// Immutable catalog entry.
#[derive(Clone, Debug, PartialEq)]
pub struct StructureType {
    pub kind: StructureKind,
    pub width: f32,
    pub depth: f32,
    pub base_height: f32,
    pub color: Color,
    pub window_grid: WindowGrid,
}

impl StructureType {
    /// Footprint extent as (x, z).
    pub fn footprint(&self) -> Vec2 {
        Vec2::new(self.width, self.depth)
    }

    pub fn roughness(&self) -> f32 {
        if self.kind == StructureKind::Modern {
            0.1
        } else {
            0.8
        }
    }

    pub fn metallic(&self) -> f32 {
        if self.kind == StructureKind::Modern {
            0.3
        } else {
            0.1
        }
    }
}

/// Table of every structure type, in [`StructureKind::ALL`] order.
#[derive(Resource, Clone, Debug)]
pub struct StructureCatalog {
    types: Vec<StructureType>,
}

impl Default for StructureCatalog {
    fn default() -> Self {
        let entry = |kind, width, base_height, depth, color, rows, cols| StructureType {
            kind,
            width,
            depth,
            base_height,
            color,
            window_grid: WindowGrid { rows, cols },
        };

        Self {
            types: vec![
                entry(StructureKind::Brownstone, 6.0, 12.0, 15.0, Color::srgb_u8(0x8b, 0x45, 0x13), 4, 3),
                entry(StructureKind::Modern, 12.0, 35.0, 12.0, Color::srgb_u8(0x4a, 0x55, 0x68), 20, 6),
                entry(StructureKind::Prewar, 10.0, 20.0, 12.0, Color::srgb_u8(0x8b, 0x7d, 0x6b), 8, 4),
                entry(StructureKind::ArtDeco, 8.0, 28.0, 10.0, Color::srgb_u8(0x9c, 0x8f, 0x7e), 12, 3),
                entry(StructureKind::Industrial, 14.0, 15.0, 18.0, Color::srgb_u8(0x69, 0x69, 0x69), 6, 8),
                entry(StructureKind::Luxury, 9.0, 42.0, 9.0, Color::srgb_u8(0x70, 0x80, 0x90), 25, 3),
                entry(StructureKind::Commercial, 11.0, 18.0, 14.0, Color::srgb_u8(0xa0, 0x94, 0x8a), 9, 5),
                entry(StructureKind::House, 7.0, 8.0, 10.0, Color::srgb_u8(0xda, 0xa5, 0x20), 2, 2),
                entry(StructureKind::Office, 16.0, 25.0, 20.0, Color::srgb_u8(0x2f, 0x4f, 0x4f), 15, 8),
            ],
        }
    }
}

impl StructureCatalog {
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Entry at `index`, wrapping around the table.
    pub fn by_index(&self, index: usize) -> &StructureType {
        &self.types[index % self.types.len()]
    }

    pub fn get(&self, kind: StructureKind) -> &StructureType {
        self.types
            .iter()
            .find(|ty| ty.kind == kind)
            .unwrap_or(&self.types[0])
    }

    pub fn iter(&self) -> impl Iterator<Item = &StructureType> {
        self.types.iter()
    }
}

/// Mesh primitive for a decoration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Primitive {
    Cuboid { size: Vec3 },
    Cylinder { radius: f32, height: f32 },
    Cone { radius: f32, height: f32, sides: u32 },
}

impl Primitive {
    /// Vertical extent of the primitive.
    pub fn height(&self) -> f32 {
        match *self {
            Primitive::Cuboid { size } => size.y,
            Primitive::Cylinder { height, .. } | Primitive::Cone { height, .. } => height,
        }
    }

    /// Extent along (x, z) of the primitive's bounding box.
    pub fn ground_size(&self) -> Vec2 {
        match *self {
            Primitive::Cuboid { size } => Vec2::new(size.x, size.z),
            Primitive::Cylinder { radius, .. } | Primitive::Cone { radius, .. } => {
                Vec2::splat(radius * 2.0)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecorationKind {
    CrownTier,
    Stoop,
    Cornice,
    Balcony,
    Antenna,
    PitchedRoof,
    RooftopUnit,
}

/// One decorative primitive attached to a structure.
#[derive(Clone, Debug, PartialEq)]
pub struct DecorationSpec {
    pub kind: DecorationKind,
    pub primitive: Primitive,
    /// Centre of the primitive relative to the structure's ground centre.
    pub offset: Vec3,
    pub color: Color,
    pub emissive: Option<Color>,
    /// Opacity below 1.0 renders as alpha-blended.
    pub opacity: f32,
}

impl DecorationSpec {
    fn solid(kind: DecorationKind, primitive: Primitive, offset: Vec3, color: Color) -> Self {
        Self {
            kind,
            primitive,
            offset,
            color,
            emissive: None,
            opacity: 1.0,
        }
    }
}

pub type Decorations = SmallVec<[DecorationSpec; 4]>;

/// Chance that a non-house structure carries rooftop equipment.
const ROOFTOP_UNIT_CHANCE: f32 = 0.3;

/// Decorations for a structure of type `ty`, `height` tall, at `position`.
pub fn decorations(ty: &StructureType, height: f32, position: Vec2) -> Decorations {
    let mut details = Decorations::new();
    let (w, d) = (ty.width, ty.depth);

    match ty.kind {
        StructureKind::ArtDeco => {
            details.push(DecorationSpec::solid(
                DecorationKind::CrownTier,
                Primitive::Cuboid {
                    size: Vec3::new(w - 1.0, 2.0, d - 1.0),
                },
                Vec3::new(0.0, height + 1.0, 0.0),
                Color::srgb_u8(0x7a, 0x6f, 0x64),
            ));
            details.push(DecorationSpec::solid(
                DecorationKind::CrownTier,
                Primitive::Cuboid {
                    size: Vec3::new(w - 2.0, 1.0, d - 2.0),
                },
                Vec3::new(0.0, height + 2.5, 0.0),
                Color::srgb_u8(0x6b, 0x62, 0x58),
            ));
        }
        StructureKind::Brownstone => {
            details.push(DecorationSpec::solid(
                DecorationKind::Stoop,
                Primitive::Cuboid {
                    size: Vec3::new(2.0, 3.0, 4.0),
                },
                Vec3::new(w / 2.0 + 1.0, 1.5, 0.0),
                Color::srgb_u8(0xa0, 0x52, 0x2d),
            ));
            details.push(DecorationSpec::solid(
                DecorationKind::Cornice,
                Primitive::Cuboid {
                    size: Vec3::new(w + 0.5, 1.0, d + 0.5),
                },
                Vec3::new(0.0, height + 0.5, 0.0),
                Color::srgb_u8(0x65, 0x43, 0x21),
            ));
        }
        StructureKind::Luxury => {
            for i in 0..balcony_count(height) {
                details.push(DecorationSpec {
                    opacity: 0.6,
                    ..DecorationSpec::solid(
                        DecorationKind::Balcony,
                        Primitive::Cuboid {
                            size: Vec3::new(0.3, 0.5, 4.0),
                        },
                        Vec3::new(w / 2.0 + 0.3, 8.0 + i as f32 * 8.0, 0.0),
                        Color::srgb_u8(0x87, 0xce, 0xeb),
                    )
                });
            }
        }
        StructureKind::Modern => {
            details.push(DecorationSpec {
                emissive: Some(Color::srgb(0.3, 0.0, 0.0)),
                ..DecorationSpec::solid(
                    DecorationKind::Antenna,
                    Primitive::Cylinder {
                        radius: 0.1,
                        height: 6.0,
                    },
                    Vec3::new(0.0, height + 3.0, 0.0),
                    Color::srgb(1.0, 0.0, 0.0),
                )
            });
        }
        StructureKind::House => {
            details.push(DecorationSpec::solid(
                DecorationKind::PitchedRoof,
                Primitive::Cone {
                    radius: w * 0.8,
                    height: 3.0,
                    sides: 4,
                },
                Vec3::new(0.0, height + 1.5, 0.0),
                Color::srgb_u8(0x8b, 0x45, 0x13),
            ));
        }
        StructureKind::Prewar
        | StructureKind::Industrial
        | StructureKind::Commercial
        | StructureKind::Office => {}
    }

    if ty.kind != StructureKind::House && hash01(position, 0) < ROOFTOP_UNIT_CHANCE {
        let dx = (hash01(position, 1) - 0.5) * 4.0;
        let dz = (hash01(position, 2) - 0.5) * 4.0;
        details.push(DecorationSpec::solid(
            DecorationKind::RooftopUnit,
            Primitive::Cuboid {
                size: Vec3::new(2.0, 3.0, 2.0),
            },
            Vec3::new(dx, height + 1.5, dz),
            Color::srgb_u8(0x55, 0x55, 0x55),
        ));
    }

    details
}

/// Decorations whose underside is lower than this stand in the street.
pub const STREET_CLEARANCE: f32 = 5.0;

/// Ground-plane rectangles, relative to the structure's ground centre, of
/// decorations that reach below [`STREET_CLEARANCE`].
///
/// Only stoops qualify in the current catalog. They do not depend on the
/// structure's height or position.
pub fn street_level_footprints(ty: &StructureType) -> SmallVec<[Rect; 2]> {
    decorations(ty, ty.base_height, Vec2::ZERO)
        .iter()
        .filter(|d| d.offset.y - d.primitive.height() / 2.0 < STREET_CLEARANCE)
        .map(|d| Rect::from_center_size(Vec2::new(d.offset.x, d.offset.z), d.primitive.ground_size()))
        .collect()
}

/// One balcony every 8 units of height, at most four.
pub fn balcony_count(height: f32) -> u32 {
    ((height / 8.0).floor().max(0.0) as u32).min(4)
}

/// A single window on the structure's east (+x) face.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowSpec {
    pub row: u32,
    pub col: u32,
    /// Centre relative to the structure's ground centre.
    pub offset: Vec3,
    pub size: Vec3,
    pub glow: Color,
    /// Tinted, translucent glazing.
    pub tinted: bool,
}

/// Window grid for a structure. `light_key` seeds the glow colour and is
/// the same key the flicker animation uses.
pub fn windows(ty: &StructureType, height: f32, light_key: Vec2) -> Vec<WindowSpec> {
    let rows = ty.window_grid.rows.min((height / 2.0).floor().max(0.0) as u32);
    let cols = ty.window_grid.cols;
    if rows == 0 {
        return Vec::new();
    }

    let size = if ty.kind == StructureKind::Industrial {
        Vec3::new(0.1, 2.0, 1.5)
    } else {
        Vec3::new(0.1, 1.5, 1.0)
    };
    let usable = height - 4.0;
    let col_spacing = ty.depth / (cols + 1) as f32;

    let mut result = Vec::with_capacity((rows * cols) as usize);
    for row in 0..rows {
        let y = 2.0 + usable * (row as f32 / rows as f32) + usable / (rows as f32 * 2.0);
        for col in 0..cols {
            let z = -ty.depth / 2.0 + col_spacing * (col + 1) as f32;
            result.push(WindowSpec {
                row,
                col,
                offset: Vec3::new(ty.width / 2.0 + 0.05, y, z),
                size,
                glow: window_color(light_key.x, light_key.y, row, col),
                tinted: ty.kind == StructureKind::Modern,
            });
        }
    }
    result
}

/// Emissive intensity of a window at `time` seconds.
///
/// Lit windows land in `0.2..=0.6`; dark ones return 0.02.
pub fn window_light(x: f32, z: f32, row: u32, col: u32, time: f32) -> f32 {
    let seed = (x * 0.1 + z * 0.1 + row as f32 * 0.3 + col as f32 * 0.7 + time * 0.5).sin();
    if seed > 0.1 {
        0.2 + seed.abs() * 0.4
    } else {
        0.02
    }
}

pub const WINDOW_PALETTE: [(u8, u8, u8); 7] = [
    (0xff, 0xd7, 0x00),
    (0x87, 0xce, 0xeb),
    (0xff, 0x6b, 0x6b),
    (0x4e, 0xcd, 0xc4),
    (0xff, 0xe6, 0x6d),
    (0xff, 0x99, 0x99),
    (0x99, 0xff, 0x99),
];

/// Glow colour of a window. Constant over time.
pub fn window_color(x: f32, z: f32, row: u32, col: u32) -> Color {
    let (r, g, b) = WINDOW_PALETTE[window_palette_index(x, z, row, col)];
    Color::srgb_u8(r, g, b)
}

pub fn window_palette_index(x: f32, z: f32, row: u32, col: u32) -> usize {
    let seed = (x * 0.2 + z * 0.2 + row as f32 * 0.5 + col as f32 * 0.9).sin();
    let index = ((seed + 1.0) * 0.5 * WINDOW_PALETTE.len() as f32).floor() as usize;
    index.min(WINDOW_PALETTE.len() - 1)
}

/// Deterministic value in `[0, 1)` for a world position and salt.
pub fn hash01(position: Vec2, salt: u32) -> f32 {
    // Quantise to centimetres so nearly-equal floats hash alike.
    let qx = (position.x * 100.0).round() as i64 as u64;
    let qz = (position.y * 100.0).round() as i64 as u64;
    let mut h = qx
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ qz.wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
        ^ (salt as u64).wrapping_mul(0x1656_67B1_9E37_79F9);
    // splitmix64 finaliser
    h ^= h >> 30;
    h = h.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h ^= h >> 27;
    h = h.wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^= h >> 31;
    (h >> 40) as f32 / (1u64 << 24) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_follows_kind_order() {
        let catalog = StructureCatalog::default();
        assert_eq!(catalog.len(), StructureKind::ALL.len());
        for (index, kind) in StructureKind::ALL.iter().enumerate() {
            assert_eq!(catalog.by_index(index).kind, *kind);
            assert_eq!(catalog.get(*kind).kind, *kind);
        }
        assert_eq!(catalog.by_index(9).kind, StructureKind::Brownstone);
        assert_eq!(catalog.get(StructureKind::Luxury).base_height, 42.0);
    }

    #[test]
    fn decoration_rules_match_kinds() {
        let catalog = StructureCatalog::default();
        // A position whose hash skips rooftop equipment keeps counts exact.
        let position = (0..200)
            .map(|i| Vec2::new(i as f32 * 3.0, 7.0))
            .find(|p| hash01(*p, 0) >= ROOFTOP_UNIT_CHANCE)
            .expect("some position skips rooftop equipment");

        let kinds_of = |kind: StructureKind, height: f32| -> Vec<DecorationKind> {
            decorations(catalog.get(kind), height, position)
                .iter()
                .map(|d| d.kind)
                .collect()
        };

        assert_eq!(
            kinds_of(StructureKind::ArtDeco, 28.0),
            vec![DecorationKind::CrownTier, DecorationKind::CrownTier]
        );
        assert_eq!(
            kinds_of(StructureKind::Brownstone, 12.0),
            vec![DecorationKind::Stoop, DecorationKind::Cornice]
        );
        assert_eq!(kinds_of(StructureKind::Modern, 35.0), vec![DecorationKind::Antenna]);
        assert_eq!(kinds_of(StructureKind::House, 8.0), vec![DecorationKind::PitchedRoof]);
        assert!(kinds_of(StructureKind::Office, 25.0).is_empty());
        assert_eq!(kinds_of(StructureKind::Luxury, 42.0).len(), 4);
        assert_eq!(kinds_of(StructureKind::Luxury, 20.0).len(), 2);
    }

    #[test]
    fn houses_never_get_rooftop_units() {
        let catalog = StructureCatalog::default();
        let house = catalog.get(StructureKind::House);
        for i in 0..100 {
            let position = Vec2::new(i as f32 * 1.7, -(i as f32) * 2.3);
            assert!(decorations(house, 8.0, position)
                .iter()
                .all(|d| d.kind != DecorationKind::RooftopUnit));
        }
    }

    #[test]
    fn only_the_stoop_reaches_street_level() {
        let catalog = StructureCatalog::default();
        for ty in catalog.iter() {
            let low = street_level_footprints(ty);
            if ty.kind == StructureKind::Brownstone {
                assert_eq!(low.len(), 1);
                assert_eq!(low[0].min, Vec2::new(3.0, -2.0));
                assert_eq!(low[0].max, Vec2::new(5.0, 2.0));
            } else {
                assert!(low.is_empty(), "{:?} has street-level decorations", ty.kind);
            }
        }
    }

    #[test]
    fn balconies_scale_with_height() {
        assert_eq!(balcony_count(7.9), 0);
        assert_eq!(balcony_count(8.0), 1);
        assert_eq!(balcony_count(31.0), 3);
        assert_eq!(balcony_count(50.4), 4);
    }

    #[test]
    fn window_rows_are_capped_by_height() {
        let catalog = StructureCatalog::default();
        let modern = catalog.get(StructureKind::Modern);

        let tall = windows(modern, 60.0, Vec2::ZERO);
        assert_eq!(tall.len(), 20 * 6);

        let short = windows(modern, 9.0, Vec2::ZERO);
        assert_eq!(short.len(), 4 * 6);
        assert!(short.iter().all(|w| w.tinted));
        assert!(short.iter().all(|w| w.offset.y > 0.0 && w.offset.y < 9.0));
        assert!(short
            .iter()
            .all(|w| w.offset.z.abs() < modern.depth / 2.0));
    }

    #[test]
    fn window_light_stays_in_range_and_varies_with_time() {
        let mut seen = Vec::new();
        for step in 0..50 {
            let light = window_light(12.0, -40.0, 3, 1, step as f32 * 0.7);
            assert!(light == 0.02 || (0.2..=0.6).contains(&light));
            seen.push(light);
        }
        assert!(seen.iter().any(|l| *l != seen[0]));
        assert_eq!(
            window_light(12.0, -40.0, 3, 1, 5.0),
            window_light(12.0, -40.0, 3, 1, 5.0)
        );
    }

    #[test]
    fn window_color_comes_from_palette() {
        for row in 0..10 {
            for col in 0..10 {
                let index = window_palette_index(17.0, -3.0, row, col);
                assert!(index < WINDOW_PALETTE.len());
            }
        }
    }

    #[test]
    fn position_hash_is_deterministic_and_bounded() {
        for i in 0..500 {
            let p = Vec2::new(i as f32 * 0.37 - 90.0, i as f32 * -1.13);
            let h = hash01(p, 3);
            assert!((0.0..1.0).contains(&h));
            assert_eq!(h, hash01(p, 3));
        }
        assert_ne!(hash01(Vec2::new(10.0, 10.0), 0), hash01(Vec2::new(10.0, 10.0), 1));
    }
}
