//! Column estimate for placeholder grids.
//!
//! Skeleton tiles are laid out before any real tile exists, so the column
//! count is guessed from the viewport width alone. Getting it close to what
//! the real grid ends up with keeps the page from jumping when items land.

/// Width in pixels above which every extra step adds one column.
const WIDE_THRESHOLD_PX: f64 = 1920.0;

/// Extra width per additional column past [`WIDE_THRESHOLD_PX`].
const WIDE_STEP_PX: f64 = 320.0;

/// Estimated number of tiles per row for a viewport `width` in pixels.
pub fn estimate_items_per_row(width: f64) -> usize {
    if !width.is_finite() || width < 500.0 {
        return 3;
    }
    if width < 768.0 {
        4
    } else if width < 1024.0 {
        5
    } else if width < 1440.0 {
        6
    } else if width <= WIDE_THRESHOLD_PX {
        7
    } else {
        7 + ((width - WIDE_THRESHOLD_PX) / WIDE_STEP_PX) as usize
    }
}

/// Rows needed to show `count` skeletons at `per_row` columns.
pub fn skeleton_rows(count: usize, per_row: usize) -> usize {
    let per_row = per_row.max(1);
    count.div_ceil(per_row)
}
