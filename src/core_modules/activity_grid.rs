// THEORY:
// The `ActivityGrid` partitions a raster into a fixed grid of `Chunk`s and records how
// "busy" each cell is. It is the spatial counterpart to the single-number statistics:
// a photograph activates most of the grid, while a logo or a slide of text concentrates
// its activity in a few cells and leaves the rest flat.
//
// Two summaries are derived from the grid:
// 1.  **Spread**: the fraction of cells whose mean absolute deviation exceeds a fixed
//     threshold.
// 2.  **Border vs. center**: mean deviation of the outer ring of cells divided by the
//     mean deviation of the inner cells. Text-heavy banners keep their borders quiet.
//
// Cell boundaries are computed with integer division of the raster size, so rasters
// whose sides are not multiples of the grid size still cover every pixel.

use crate::core_modules::chunk::Chunk;
use crate::core_modules::raster::Raster;

/// Cells per side of the activity grid.
pub const GRID_SIZE: u32 = 5;
/// A cell is active when its mean absolute deviation exceeds this (0..255 scale).
pub const ACTIVE_CELL_DEVIATION: f64 = 12.0;

/// Per-cell activity of a raster partitioned into a `columns x rows` grid.
#[derive(Debug, Clone)]
pub struct ActivityGrid {
    /// The width of the grid in cells.
    columns: u32,
    /// The height of the grid in cells.
    rows: u32,
    /// Row-major mean absolute deviation of every non-empty cell.
    deviations: Vec<Option<f64>>,
}

impl ActivityGrid {
    pub fn new(raster: &Raster, columns: u32, rows: u32) -> Self {
        let columns = columns.max(1);
        let rows = rows.max(1);
        let mut deviations = Vec::with_capacity((columns * rows) as usize);

        for cell_index in 0..(columns * rows) {
            let cell_y = cell_index / columns;
            let cell_x = cell_index % columns;
            let x0 = cell_x * raster.width / columns;
            let x1 = (cell_x + 1) * raster.width / columns;
            let y0 = cell_y * raster.height / rows;
            let y1 = (cell_y + 1) * raster.height / rows;

            let chunk = Chunk::new(x1 - x0, y1 - y0, raster.region(x0, y0, x1, y1));
            deviations.push((!chunk.is_empty()).then(|| chunk.mean_absolute_deviation()));
        }

        Self {
            columns,
            rows,
            deviations,
        }
    }

    /// The default 5x5 grid.
    pub fn standard(raster: &Raster) -> Self {
        Self::new(raster, GRID_SIZE, GRID_SIZE)
    }

    /// Fraction of non-empty cells whose deviation exceeds `threshold`.
    pub fn spread(&self, threshold: f64) -> f64 {
        let cells: Vec<f64> = self.deviations.iter().flatten().copied().collect();
        if cells.is_empty() {
            return 0.0;
        }
        let active = cells.iter().filter(|d| **d > threshold).count();
        active as f64 / cells.len() as f64
    }

    pub fn active_spread(&self) -> f64 {
        self.spread(ACTIVE_CELL_DEVIATION)
    }

    /// Mean border-cell deviation over mean inner-cell deviation.
    ///
    /// Returns 1.0 when the grid has no inner cells or both rings are flat, and a large
    /// finite value when only the border is active.
    pub fn border_center_ratio(&self) -> f64 {
        let mut border = (0.0, 0usize);
        let mut center = (0.0, 0usize);
        for (index, deviation) in self.deviations.iter().enumerate() {
            let Some(deviation) = deviation else { continue };
            let x = index as u32 % self.columns;
            let y = index as u32 / self.columns;
            let on_border = x == 0 || y == 0 || x + 1 == self.columns || y + 1 == self.rows;
            let slot = if on_border { &mut border } else { &mut center };
            slot.0 += deviation;
            slot.1 += 1;
        }
        if center.1 == 0 || border.1 == 0 {
            return 1.0;
        }
        let border_mean = border.0 / border.1 as f64;
        let center_mean = center.0 / center.1 as f64;
        if center_mean < 1e-6 {
            return if border_mean < 1e-6 { 1.0 } else { 10.0 };
        }
        border_mean / center_mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::Pixel;

    fn raster_from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> Pixel) -> Raster {
        let mut pixels = Vec::new();
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Raster::new(width, height, pixels)
    }

    #[test]
    fn flat_raster_has_no_spread() {
        let raster = raster_from_fn(50, 50, |_, _| Pixel::opaque(200, 10, 10));
        let grid = ActivityGrid::standard(&raster);
        assert_eq!(grid.active_spread(), 0.0);
        assert_eq!(grid.border_center_ratio(), 1.0);
    }

    #[test]
    fn checkerboard_activates_every_cell() {
        let raster = raster_from_fn(50, 50, |x, y| {
            if (x + y) % 2 == 0 { Pixel::WHITE } else { Pixel::opaque(0, 0, 0) }
        });
        assert_eq!(ActivityGrid::standard(&raster).active_spread(), 1.0);
    }

    #[test]
    fn centered_detail_keeps_the_border_quiet() {
        let raster = raster_from_fn(50, 50, |x, y| {
            let inside = (10..40).contains(&x) && (10..40).contains(&y);
            if inside && (x + y) % 2 == 0 { Pixel::opaque(0, 0, 0) } else { Pixel::WHITE }
        });
        let grid = ActivityGrid::standard(&raster);
        assert!((grid.active_spread() - 9.0 / 25.0).abs() < 1e-9);
        assert!(grid.border_center_ratio() < 0.1);
    }

    #[test]
    fn uneven_sizes_cover_every_pixel() {
        let raster = raster_from_fn(7, 3, |_, _| Pixel::WHITE);
        let grid = ActivityGrid::standard(&raster);
        // 3 rows over 5 grid rows leaves some cells empty; they are ignored.
        assert_eq!(grid.spread(0.0), 0.0);
    }
}
