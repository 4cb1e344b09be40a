//! ASCII plotting for terminal output.
//!
//! Fixed-size grid, deterministic output. The y axis always spans `[0, 1]` so
//! curves from different countries are visually comparable.
//!
//! Plot elements:
//! - one glyph per curve (`*`, `+`, `x`, `o`, `#`, `@`, then repeating)
//! - the 50% threshold as a dotted row

use crate::domain::{CorrectedCurve, FIRST_YEAR, LAST_YEAR};
use crate::metrics::HALF_THRESHOLD;

const GLYPHS: [char; 6] = ['*', '+', 'x', 'o', '#', '@'];

/// Render one or more corrected curves on a shared grid.
pub fn render_curves(curves: &[&CorrectedCurve], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let mut grid = vec![vec![' '; width]; height];

    for (idx, curve) in curves.iter().enumerate() {
        let glyph = GLYPHS[idx % GLYPHS.len()];
        let points: Vec<(f64, f64)> = curve.points().map(|(y, v)| (y as f64, v)).collect();
        draw_curve(&mut grid, &points, glyph);
    }

    // Threshold row goes under the curves.
    let half_row = map_y(HALF_THRESHOLD, height);
    for cell in grid[half_row].iter_mut().filter(|c| **c == ' ') {
        *cell = '.';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: years=[{FIRST_YEAR}, {LAST_YEAR}] | p=[0.00, 1.00] | '.' = {:.0}%\n",
        HALF_THRESHOLD * 100.0
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    for (idx, curve) in curves.iter().enumerate() {
        out.push_str(&format!(
            "  {} {} ({})\n",
            GLYPHS[idx % GLYPHS.len()],
            curve.country_id(),
            curve.occupation_code()
        ));
    }

    out
}

fn map_x(year: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((year - FIRST_YEAR as f64) / (LAST_YEAR - FIRST_YEAR) as f64).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(p: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = p.clamp(0.0, 1.0);
    // p=1 -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], ch: char) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(year, p) in curve {
        let x = map_x(year, width);
        let y = map_y(p, height);
        match prev {
            Some((x0, y0)) if (x0, y0) != (x, y) => draw_line(grid, x0, y0, x, y, ch),
            Some(_) => {}
            None => grid[y][x] = ch,
        }
        prev = Some((x, y));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0 && (y0 as usize) < grid.len() && x0 >= 0 && (x0 as usize) < grid[0].len() {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
