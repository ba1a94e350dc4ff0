//! Near-square grid layout for collage cells.
//!
//! For a requested image count `k`, the grid is the `rows x cols` shape
//! with `rows * cols >= k` and minimal `|rows - cols|`; when two shapes
//! tie, the one with fewer rows wins (k=5 -> 2 rows x 3 cols). Trailing
//! cells beyond `k` stay empty.

/// Cell rectangle in monitor-local pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Returns `(rows, cols)` for `k` images.
pub fn grid_shape(k: usize) -> (usize, usize) {
    debug_assert!(k >= 1);

    let mut best = (1usize, k);
    for rows in 1..=k {
        let cols = k.div_ceil(rows);
        if rows.abs_diff(cols) < best.0.abs_diff(best.1) {
            best = (rows, cols);
        }
    }
    best
}

/// Partitions a `width x height` rectangle into `rows x cols` cells in
/// row-major order. Remainder pixels go one each to the first
/// `width % cols` columns and first `height % rows` rows, so the cells
/// tile the rectangle exactly.
pub fn partition(width: u32, height: u32, rows: usize, cols: usize) -> Vec<CellRect> {
    let rows = rows as u32;
    let cols = cols as u32;
    let base_w = width / cols;
    let extra_w = width % cols;
    let base_h = height / rows;
    let extra_h = height % rows;

    let mut cells = Vec::with_capacity((rows * cols) as usize);
    let mut y = 0;
    for r in 0..rows {
        let cell_h = base_h + u32::from(r < extra_h);
        let mut x = 0;
        for c in 0..cols {
            let cell_w = base_w + u32::from(c < extra_w);
            cells.push(CellRect {
                x,
                y,
                width: cell_w,
                height: cell_h,
            });
            x += cell_w;
        }
        y += cell_h;
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_shape_known_counts() {
        assert_eq!(grid_shape(1), (1, 1));
        assert_eq!(grid_shape(2), (1, 2));
        assert_eq!(grid_shape(3), (2, 2));
        assert_eq!(grid_shape(4), (2, 2));
        assert_eq!(grid_shape(5), (2, 3));
        assert_eq!(grid_shape(6), (2, 3));
        assert_eq!(grid_shape(7), (3, 3));
        assert_eq!(grid_shape(8), (3, 3));
    }

    #[test]
    fn test_grid_shape_is_optimal() {
        // Among the candidate shapes (cols = ceil(k / rows), no wasted
        // full row), no candidate has a smaller |rows - cols| than the
        // one we pick, and ties go to fewer rows
        for k in 1..=8 {
            let (rows, cols) = grid_shape(k);
            assert!(rows * cols >= k);

            for r in 1..=k {
                let c = k.div_ceil(r);
                assert!(
                    r.abs_diff(c) >= rows.abs_diff(cols),
                    "k={}: {}x{} beats chosen {}x{}",
                    k,
                    r,
                    c,
                    rows,
                    cols
                );
                if r.abs_diff(c) == rows.abs_diff(cols) {
                    assert!(rows <= r, "k={}: tie must keep fewer rows", k);
                }
            }
        }
    }

    #[test]
    fn test_partition_tiles_exactly() {
        // 7x5 into 2x3: widths get the remainder pixel first
        let cells = partition(7, 5, 2, 3);
        assert_eq!(cells.len(), 6);

        let widths: Vec<u32> = cells[..3].iter().map(|c| c.width).collect();
        assert_eq!(widths, vec![3, 2, 2]);
        let heights: Vec<u32> = vec![cells[0].height, cells[3].height];
        assert_eq!(heights, vec![3, 2]);

        let area: u32 = cells.iter().map(|c| c.width * c.height).sum();
        assert_eq!(area, 7 * 5);
    }

    #[test]
    fn test_partition_no_gaps_no_overlaps() {
        let (width, height) = (37, 23);
        let cells = partition(width, height, 3, 4);

        // Every pixel covered exactly once
        let mut covered = vec![0u8; (width * height) as usize];
        for cell in &cells {
            for yy in cell.y..cell.y + cell.height {
                for xx in cell.x..cell.x + cell.width {
                    covered[(yy * width + xx) as usize] += 1;
                }
            }
        }
        assert!(covered.iter().all(|&count| count == 1));
    }

    #[test]
    fn test_partition_even_split() {
        let cells = partition(1920, 1080, 2, 2);
        assert!(cells.iter().all(|c| c.width == 960 && c.height == 540));
        assert_eq!(cells[3], CellRect { x: 960, y: 540, width: 960, height: 540 });
    }
}
