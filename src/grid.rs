use std::num::NonZeroU32;

/// Side length of the square canvas in device pixels.
pub const FIELD_SIZE: u32 = 512;

// ============================================================================
// GRID MAPPING
// ============================================================================

/// Snap a continuous coordinate down to the origin of the cell containing it.
///
/// The result is a multiple of `scale`, never greater than `coordinate`, and
/// less than one `scale` away from it. `scale` must be positive.
#[inline]
pub fn cell_origin(coordinate: f32, scale: f32) -> f32 {
    (coordinate / scale).floor() * scale
}

/// Integer cell coordinates (column, row) in grid space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in canvas (device) space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Number of cells along one side of the grid. Never zero, never more cells
/// than the canvas has pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelsPerSide(NonZeroU32);

impl PixelsPerSide {
    pub const DEFAULT: Self = match NonZeroU32::new(4) {
        Some(n) => Self(n),
        None => unreachable!(),
    };

    /// Resolutions offered in the toolbar.
    pub const OPTIONS: [u32; 6] = [4, 8, 16, 32, 64, 128];

    pub fn new(count: u32) -> Option<Self> {
        if count > FIELD_SIZE {
            return None;
        }
        NonZeroU32::new(count).map(Self)
    }

    /// Decode a persisted value. Anything that is not a plain positive
    /// integer within the canvas size is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<u32>().ok().and_then(Self::new)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for PixelsPerSide {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Partition of the square canvas into equal square cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    pub pixels_per_side: PixelsPerSide,
    pub field_size: u32,
}

impl Grid {
    pub fn new(pixels_per_side: PixelsPerSide) -> Self {
        Self {
            pixels_per_side,
            field_size: FIELD_SIZE,
        }
    }

    /// Side length of one cell in device pixels.
    #[inline]
    pub fn scale(&self) -> f32 {
        self.field_size as f32 / self.pixels_per_side.get() as f32
    }

    /// Cell containing a canvas-space position.
    pub fn cell_of(&self, x: f32, y: f32) -> GridPoint {
        let scale = self.scale();
        GridPoint::new((x / scale).floor() as i32, (y / scale).floor() as i32)
    }

    /// Canvas-space origin of the cell containing a position.
    pub fn origin_of(&self, x: f32, y: f32) -> (f32, f32) {
        let scale = self.scale();
        (cell_origin(x, scale), cell_origin(y, scale))
    }

    /// Device-space rectangle covered by a cell.
    pub fn cell_rect(&self, cell: GridPoint) -> CellRect {
        let scale = self.scale();
        CellRect {
            x: cell.x as f32 * scale,
            y: cell.y as f32 * scale,
            w: scale,
            h: scale,
        }
    }

    /// The whole visible grid area: `pixels_per_side` cells in each direction.
    pub fn visible_area(&self) -> CellRect {
        let side = self.pixels_per_side.get() as f32 * self.scale();
        CellRect {
            x: 0.0,
            y: 0.0,
            w: side,
            h: side,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cell_origin_is_idempotent() {
        for scale in [1.0_f32, 4.0, 16.0, 128.0] {
            for c in [0.0_f32, 0.5, 3.0, 127.9, 128.0, 130.0, 511.0, -1.0, -129.5] {
                let once = cell_origin(c, scale);
                assert_eq!(cell_origin(once, scale), once);
            }
        }
    }

    #[test]
    fn cell_origin_stays_within_one_cell() {
        let scale = 32.0;
        for c in [0.0_f32, 1.0, 31.99, 32.0, 95.5, 500.0] {
            let origin = cell_origin(c, scale);
            assert!(origin <= c);
            assert!(c - origin < scale);
            assert_eq!((origin / scale).fract(), 0.0);
        }
    }

    #[test]
    fn four_cells_on_default_canvas_scale_to_128() {
        let grid = Grid::new(PixelsPerSide::new(4).unwrap());
        assert_eq!(grid.scale(), 128.0);
        assert_eq!(grid.origin_of(130.0, 5.0), (128.0, 0.0));
        assert_eq!(grid.cell_of(130.0, 5.0), GridPoint::new(1, 0));
        assert_eq!(
            grid.cell_rect(GridPoint::new(1, 0)),
            CellRect { x: 128.0, y: 0.0, w: 128.0, h: 128.0 }
        );
    }

    #[test]
    fn visible_area_covers_canvas() {
        let grid = Grid::new(PixelsPerSide::new(32).unwrap());
        assert_eq!(
            grid.visible_area(),
            CellRect { x: 0.0, y: 0.0, w: 512.0, h: 512.0 }
        );
    }

    #[test]
    fn pixels_per_side_rejects_garbage() {
        assert_eq!(PixelsPerSide::parse("16").map(PixelsPerSide::get), Some(16));
        assert_eq!(PixelsPerSide::parse(" 64 ").map(PixelsPerSide::get), Some(64));
        assert_eq!(PixelsPerSide::parse("0"), None);
        assert_eq!(PixelsPerSide::parse("-4"), None);
        assert_eq!(PixelsPerSide::parse("abc"), None);
        assert_eq!(PixelsPerSide::parse("4.5"), None);
        assert_eq!(PixelsPerSide::parse("100000"), None);
    }
}
