//! Chart rendering.
//!
//! [`PngChartRenderer`] draws directly into an RGB buffer and encodes it as
//! PNG. There are no axis labels or legends; the chart is meant to be
//! glanced at inline in a chat reply.

use crate::chart::{ChartKind, Table, as_number, value_counts};
use crate::error::RenderError;
use image::{ImageFormat, Rgb, RgbImage};
use std::f64::consts::TAU;
use std::io::Cursor;

/// Default canvas width in pixels.
pub const CANVAS_WIDTH: u32 = 1000;
/// Default canvas height in pixels.
pub const CANVAS_HEIGHT: u32 = 600;

const MARGIN: u32 = 60;
const GRID_DIVISIONS: u32 = 10;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const GRID: Rgb<u8> = Rgb([228, 228, 228]);
const AXIS: Rgb<u8> = Rgb([64, 64, 64]);

/// Series colours, cycled.
pub const PALETTE: [Rgb<u8>; 10] = [
    Rgb([31, 119, 180]),
    Rgb([255, 127, 14]),
    Rgb([44, 160, 44]),
    Rgb([214, 39, 40]),
    Rgb([148, 103, 189]),
    Rgb([140, 86, 75]),
    Rgb([227, 119, 194]),
    Rgb([127, 127, 127]),
    Rgb([188, 189, 34]),
    Rgb([23, 190, 207]),
];

/// Turns a table into encoded image bytes.
pub trait ChartRenderer: Send + Sync {
    /// Draws `table` as a chart of the given kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the table holds nothing the chart can show or
    /// encoding fails.
    fn render(&self, table: &Table, kind: ChartKind) -> Result<Vec<u8>, RenderError>;

    /// MIME type of the bytes [`ChartRenderer::render`] produces.
    fn mime_type(&self) -> &'static str {
        "image/png"
    }
}

/// Renders charts to PNG.
#[derive(Debug, Clone, Copy)]
pub struct PngChartRenderer {
    width: u32,
    height: u32,
}

impl PngChartRenderer {
    /// Creates a renderer with the given canvas size.
    ///
    /// Sizes too small to hold a plot area are raised to the minimum.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let min = 2 * MARGIN + GRID_DIVISIONS;
        Self {
            width: width.max(min),
            height: height.max(min),
        }
    }
}

impl Default for PngChartRenderer {
    fn default() -> Self {
        Self::new(CANVAS_WIDTH, CANVAS_HEIGHT)
    }
}

impl ChartRenderer for PngChartRenderer {
    fn render(&self, table: &Table, kind: ChartKind) -> Result<Vec<u8>, RenderError> {
        let first_column = table.columns().first().cloned().unwrap_or_default();
        let mut canvas = Canvas::new(self.width, self.height);
        canvas.draw_grid();

        match kind {
            ChartKind::Bar | ChartKind::Pie => {
                let counts = value_counts(table.column(0));
                if counts.is_empty() {
                    return Err(RenderError::NothingToPlot {
                        column: first_column,
                    });
                }
                if kind == ChartKind::Bar {
                    canvas.draw_bars(&counts);
                } else {
                    canvas.draw_pie(&counts);
                }
            }
            ChartKind::Line => {
                let (column, points) = line_points(table);
                if points.is_empty() {
                    return Err(RenderError::NothingToPlot { column });
                }
                canvas.draw_line(&points);
            }
        }

        canvas.encode()
    }
}

/// Picks the series for a line chart.
///
/// With two or more columns, column 1 is plotted against column 0; column 0
/// is used as x only when every value in it is numeric, otherwise rows are
/// placed by index. With one column, it is plotted against row index.
/// Returns the y column's name and the plottable points in row order.
fn line_points(table: &Table) -> (String, Vec<(f64, f64)>) {
    let columns = table.columns();
    if columns.len() < 2 {
        let points = table
            .column(0)
            .enumerate()
            .filter_map(|(i, v)| Some((i as f64, as_number(v)?)))
            .collect();
        return (columns.first().cloned().unwrap_or_default(), points);
    }

    let xs: Vec<Option<f64>> = table.column(0).map(as_number).collect();
    let numeric_x = xs.iter().all(Option::is_some);
    let points = table
        .column(1)
        .enumerate()
        .filter_map(|(i, v)| {
            let y = as_number(v)?;
            let x = if numeric_x { xs[i]? } else { i as f64 };
            Some((x, y))
        })
        .collect();
    (columns[1].clone(), points)
}

/// A canvas with a fixed plot area inside the margins.
struct Canvas {
    image: RgbImage,
    left: u32,
    right: u32,
    top: u32,
    bottom: u32,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, BACKGROUND),
            left: MARGIN,
            right: width - MARGIN,
            top: MARGIN,
            bottom: height - MARGIN,
        }
    }

    fn plot_width(&self) -> f64 {
        f64::from(self.right - self.left)
    }

    fn plot_height(&self) -> f64 {
        f64::from(self.bottom - self.top)
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return;
        };
        if x < self.image.width() && y < self.image.height() {
            self.image.put_pixel(x, y, color);
        }
    }

    fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
        for y in y0..y1 {
            for x in x0..x1 {
                self.put(i64::from(x), i64::from(y), color);
            }
        }
    }

    fn draw_grid(&mut self) {
        for i in 0..=GRID_DIVISIONS {
            let x = self.left + (self.right - self.left) * i / GRID_DIVISIONS;
            let y = self.top + (self.bottom - self.top) * i / GRID_DIVISIONS;
            self.fill_rect(x, self.top, x + 1, self.bottom, GRID);
            self.fill_rect(self.left, y, self.right, y + 1, GRID);
        }
        self.fill_rect(self.left, self.top, self.left + 2, self.bottom, AXIS);
        self.fill_rect(self.left, self.bottom - 2, self.right, self.bottom, AXIS);
    }

    fn draw_bars(&mut self, counts: &[(String, usize)]) {
        let max = counts.iter().map(|(_, n)| *n).max().unwrap_or(1).max(1) as f64;
        let slot = self.plot_width() / counts.len() as f64;
        let bar_width = (slot * 0.8).max(1.0);

        for (i, (_, n)) in counts.iter().enumerate() {
            let center = f64::from(self.left) + slot * (i as f64 + 0.5);
            let height = self.plot_height() * (*n as f64 / max);
            let x0 = (center - bar_width / 2.0).round() as u32;
            let x1 = (center + bar_width / 2.0).round() as u32;
            let y0 = (f64::from(self.bottom) - height).round() as u32;
            self.fill_rect(x0, y0, x1.max(x0 + 1), self.bottom - 2, PALETTE[0]);
        }
    }

    /// Slices start at three o'clock and run counter-clockwise.
    fn draw_pie(&mut self, counts: &[(String, usize)]) {
        let total = counts.iter().map(|(_, n)| *n).sum::<usize>() as f64;
        let mut bounds = Vec::with_capacity(counts.len());
        let mut acc = 0.0;
        for (_, n) in counts {
            acc += *n as f64 / total;
            bounds.push(acc);
        }

        let cx = f64::from(self.left) + self.plot_width() / 2.0;
        let cy = f64::from(self.top) + self.plot_height() / 2.0;
        let radius = self.plot_width().min(self.plot_height()) / 2.0 - 4.0;
        let r = radius.ceil() as i64;

        for dy in -r..=r {
            for dx in -r..=r {
                let (fx, fy) = (dx as f64, dy as f64);
                if fx * fx + fy * fy > radius * radius {
                    continue;
                }
                let angle = (-fy).atan2(fx).rem_euclid(TAU) / TAU;
                let slice = bounds
                    .iter()
                    .position(|b| angle < *b)
                    .unwrap_or(bounds.len() - 1);
                self.put(
                    cx as i64 + dx,
                    cy as i64 + dy,
                    PALETTE[slice % PALETTE.len()],
                );
            }
        }
    }

    fn draw_line(&mut self, points: &[(f64, f64)]) {
        let (mut x_min, mut x_max) = min_max(points.iter().map(|p| p.0));
        let (mut y_min, mut y_max) = min_max(points.iter().map(|p| p.1));
        if x_max - x_min < f64::EPSILON {
            x_min -= 1.0;
            x_max += 1.0;
        }
        if y_max - y_min < f64::EPSILON {
            y_min -= 1.0;
            y_max += 1.0;
        }

        let inset = 10.0;
        let left = f64::from(self.left) + inset;
        let width = self.plot_width() - 2.0 * inset;
        let bottom = f64::from(self.bottom) - inset;
        let height = self.plot_height() - 2.0 * inset;
        let to_pixel = |(x, y): (f64, f64)| {
            (
                (left + (x - x_min) / (x_max - x_min) * width).round() as i64,
                (bottom - (y - y_min) / (y_max - y_min) * height).round() as i64,
            )
        };

        let pixels: Vec<(i64, i64)> = points.iter().copied().map(to_pixel).collect();
        for pair in pixels.windows(2) {
            self.draw_segment(pair[0], pair[1], PALETTE[0]);
        }
        for &(x, y) in &pixels {
            for oy in -2..=2 {
                for ox in -2..=2 {
                    self.put(x + ox, y + oy, PALETTE[0]);
                }
            }
        }
    }

    /// Bresenham, two pixels thick.
    fn draw_segment(&mut self, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put(x, y, color);
            self.put(x + 1, y, color);
            self.put(x, y + 1, color);
            if (x, y) == to {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn encode(self) -> Result<Vec<u8>, RenderError> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| RenderError::EncodeFailed {
                reason: e.to_string(),
            })?;
        Ok(bytes)
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}
