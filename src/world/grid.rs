//! Spatial hash grid for collider lookups.

use bevy::prelude::*;
use std::collections::HashMap;

/// Spatial hash mapping grid cells to collider indices.
#[derive(Clone, Debug, Default)]
pub struct SpatialGrid {
    pub cell_size: f32,
    pub cells: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    /// Convert world position to cell coordinates.
    pub fn to_cell(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Insert an index into every cell the rectangle `[min, max]` touches.
    pub fn insert_rect(&mut self, index: usize, min: Vec2, max: Vec2) {
        let (min_x, min_y) = self.to_cell(min);
        let (max_x, max_y) = self.to_cell(max);
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                self.cells.entry((cx, cy)).or_default().push(index);
            }
        }
    }

    /// Indices stored in cells overlapping a circle's bounding square,
    /// sorted, each listed once even when its entry spans several cells.
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<usize> {
        if self.cells.is_empty() || self.cell_size <= 0.0 {
            return Vec::new();
        }
        let min_cell = self.to_cell(center - Vec2::splat(radius));
        let max_cell = self.to_cell(center + Vec2::splat(radius));

        let mut result = Vec::new();

        for cx in min_cell.0..=max_cell.0 {
            for cy in min_cell.1..=max_cell.1 {
                if let Some(indices) = self.cells.get(&(cx, cy)) {
                    result.extend(indices);
                }
            }
        }

        result.sort_unstable();
        result.dedup();
        result
    }
}
