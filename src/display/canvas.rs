//! Immediate-mode 2D drawing surface
//!
//! `Surface` is the canvas-style API the heart renderer draws through.
//! `Canvas` implements it in software on top of a `PixelBuffer`: paths are
//! flattened in device space, filled with the non-zero winding rule using
//! four sub-scanlines per pixel, and shaded per pixel in the local space
//! that was current when `fill`/`stroke` was called.

use super::PixelBuffer;
use crate::math2d::{Transform2D, Vec2};
use std::f32::consts::TAU;

/// Sub-scanlines per pixel row for vertical anti-aliasing
const SUBSAMPLES: usize = 4;

/// Target device-space length of one flattened curve segment
const FLATTEN_TOLERANCE: f32 = 1.5;
const MAX_CURVE_SEGMENTS: usize = 64;

// ============================================================================
// Paint
// ============================================================================

/// RGB color with fractional alpha
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_rgb(rgb: (u8, u8, u8), a: f32) -> Self {
        Self::rgba(rgb.0, rgb.1, rgb.2, a)
    }

    fn lerp(self, other: Self, t: f32) -> Self {
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }
}

/// Concentric radial gradient in local coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub center: Vec2,
    pub inner_radius: f32,
    pub outer_radius: f32,
    stops: Vec<(f32, Color)>,
}

impl RadialGradient {
    pub fn new(center: Vec2, inner_radius: f32, outer_radius: f32) -> Self {
        Self {
            center,
            inner_radius,
            outer_radius,
            stops: Vec::with_capacity(3),
        }
    }

    /// Add a stop at `offset` in [0, 1]; stops are kept sorted
    pub fn add_color_stop(&mut self, offset: f32, color: Color) {
        let offset = offset.clamp(0.0, 1.0);
        let at = self.stops.partition_point(|(o, _)| *o <= offset);
        self.stops.insert(at, (offset, color));
    }

    pub fn with_stop(mut self, offset: f32, color: Color) -> Self {
        self.add_color_stop(offset, color);
        self
    }

    #[cfg(test)]
    pub fn stops(&self) -> &[(f32, Color)] {
        &self.stops
    }

    /// Color at a local point; padded beyond the first and last stop
    pub fn color_at(&self, p: Vec2) -> Color {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return Color::rgba(0, 0, 0, 0.0);
        };
        let span = self.outer_radius - self.inner_radius;
        let dist = (p - self.center).length();
        let t = if span.abs() < f32::EPSILON {
            if dist < self.inner_radius {
                0.0
            } else {
                1.0
            }
        } else {
            ((dist - self.inner_radius) / span).clamp(0.0, 1.0)
        };

        if t <= first.0 {
            return first.1;
        }
        for pair in self.stops.windows(2) {
            let (o0, c0) = pair[0];
            let (o1, c1) = pair[1];
            if t <= o1 {
                let w = if o1 > o0 { (t - o0) / (o1 - o0) } else { 1.0 };
                return c0.lerp(c1, w);
            }
        }
        last.1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    Radial(RadialGradient),
}

impl Paint {
    fn color_at(&self, local: Vec2) -> Color {
        match self {
            Self::Solid(c) => *c,
            Self::Radial(g) => g.color_at(local),
        }
    }
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Self::Solid(color)
    }
}

impl From<RadialGradient> for Paint {
    fn from(gradient: RadialGradient) -> Self {
        Self::Radial(gradient)
    }
}

// ============================================================================
// Surface
// ============================================================================

/// Canvas-style immediate-mode drawing context.
///
/// Coordinates passed to path methods are in the current local space;
/// `save`/`restore` push and pop transform, alpha, styles and line width.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Wipe the whole surface to its background
    fn clear(&mut self);

    fn save(&mut self);
    fn restore(&mut self);
    /// Number of `save` calls not yet matched by `restore`
    fn save_depth(&self) -> usize;

    fn translate(&mut self, x: f32, y: f32);
    /// Rotate by `angle` radians
    fn rotate(&mut self, angle: f32);
    fn scale(&mut self, sx: f32, sy: f32);

    fn set_global_alpha(&mut self, alpha: f32);
    fn set_fill_style(&mut self, paint: Paint);
    fn set_stroke_style(&mut self, paint: Paint);
    fn set_line_width(&mut self, width: f32);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn bezier_curve_to(&mut self, cp1x: f32, cp1y: f32, cp2x: f32, cp2y: f32, x: f32, y: f32);
    /// Elliptical arc from `start` to `end` radians, clockwise
    fn ellipse(
        &mut self,
        x: f32,
        y: f32,
        radius_x: f32,
        radius_y: f32,
        rotation: f32,
        start: f32,
        end: f32,
    );
    fn close_path(&mut self);

    fn fill(&mut self);
    fn stroke(&mut self);
}

// ============================================================================
// Canvas
// ============================================================================

#[derive(Debug, Clone)]
struct CanvasState {
    transform: Transform2D,
    global_alpha: f32,
    fill: Paint,
    stroke: Paint,
    line_width: f32,
}

impl Default for CanvasState {
    fn default() -> Self {
        let black = Paint::Solid(Color::rgba(0, 0, 0, 1.0));
        Self {
            transform: Transform2D::IDENTITY,
            global_alpha: 1.0,
            fill: black.clone(),
            stroke: black,
            line_width: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct SubPath {
    points: Vec<Vec2>,
    closed: bool,
}

/// Software `Surface` backed by a `PixelBuffer`
pub struct Canvas {
    buffer: PixelBuffer,
    background: (u8, u8, u8),
    state: CanvasState,
    stack: Vec<CanvasState>,
    /// Current path, device space
    path: Vec<SubPath>,
    /// Reused between fills
    coverage: Coverage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_background(width, height, (0, 0, 0))
    }

    pub fn with_background(width: u32, height: u32, background: (u8, u8, u8)) -> Self {
        let mut buffer = PixelBuffer::with_size(width, height);
        buffer.clear(background.0, background.1, background.2);
        Self {
            buffer,
            background,
            state: CanvasState::default(),
            stack: Vec::new(),
            path: Vec::new(),
            coverage: Coverage::default(),
        }
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    #[cfg(test)]
    pub fn transform(&self) -> Transform2D {
        self.state.transform
    }

    #[cfg(test)]
    pub fn global_alpha(&self) -> f32 {
        self.state.global_alpha
    }

    fn current_point(&self) -> Option<Vec2> {
        self.path.last().and_then(|sp| sp.points.last().copied())
    }

    fn push_point(&mut self, device: Vec2) {
        match self.path.last_mut() {
            Some(sp) if !sp.closed => sp.points.push(device),
            _ => self.path.push(SubPath {
                points: vec![device],
                closed: false,
            }),
        }
    }

    /// Rasterise `polygons` and shade the covered pixels with `paint`
    fn paint_coverage(&mut self, polygons: &[Vec<Vec2>], paint: &Paint) {
        let Some(inverse) = self.state.transform.inverse() else {
            return;
        };
        let alpha = self.state.global_alpha;
        if alpha <= 0.0 {
            return;
        }

        self.coverage
            .rasterize(polygons, self.buffer.width(), self.buffer.height());
        let cov = &self.coverage;
        for row in 0..cov.h {
            let y = cov.y0 + row as i32;
            for col in 0..cov.w {
                let c = cov.values[row * cov.w + col];
                if c <= 0.0 {
                    continue;
                }
                let x = cov.x0 + col as i32;
                let local = inverse.apply(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
                let color = paint.color_at(local);
                self.buffer
                    .blend_pixel_f(x, y, color.r, color.g, color.b, color.a * alpha * c.min(1.0));
            }
        }
    }
}

impl Surface for Canvas {
    fn width(&self) -> u32 {
        self.buffer.width()
    }

    fn height(&self) -> u32 {
        self.buffer.height()
    }

    fn clear(&mut self) {
        let (r, g, b) = self.background;
        self.buffer.clear(r, g, b);
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        // Unbalanced restore is ignored, matching HTML canvas
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn save_depth(&self) -> usize {
        self.stack.len()
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.state.transform.translate(x, y);
    }

    fn rotate(&mut self, angle: f32) {
        self.state.transform.rotate(angle);
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.state.transform.scale(sx, sy);
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        if alpha.is_finite() {
            self.state.global_alpha = alpha.clamp(0.0, 1.0);
        }
    }

    fn set_fill_style(&mut self, paint: Paint) {
        self.state.fill = paint;
    }

    fn set_stroke_style(&mut self, paint: Paint) {
        self.state.stroke = paint;
    }

    fn set_line_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.state.transform.apply(Vec2::new(x, y));
        self.path.push(SubPath {
            points: vec![p],
            closed: false,
        });
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.state.transform.apply(Vec2::new(x, y));
        self.push_point(p);
    }

    fn bezier_curve_to(&mut self, cp1x: f32, cp1y: f32, cp2x: f32, cp2y: f32, x: f32, y: f32) {
        let t = self.state.transform;
        let p1 = t.apply(Vec2::new(cp1x, cp1y));
        let p2 = t.apply(Vec2::new(cp2x, cp2y));
        let p3 = t.apply(Vec2::new(x, y));
        let Some(p0) = self.current_point() else {
            // Canvas treats a curve with no current point as a move to cp1
            self.push_point(p1);
            self.push_point(p3);
            return;
        };

        // Control polygon length bounds the curve length
        let hull = (p1 - p0).length() + (p2 - p1).length() + (p3 - p2).length();
        let segments = ((hull / FLATTEN_TOLERANCE).ceil() as usize).clamp(1, MAX_CURVE_SEGMENTS);
        for i in 1..=segments {
            let s = i as f32 / segments as f32;
            let u = 1.0 - s;
            let point = p0 * (u * u * u)
                + p1 * (3.0 * u * u * s)
                + p2 * (3.0 * u * s * s)
                + p3 * (s * s * s);
            self.push_point(point);
        }
    }

    fn ellipse(
        &mut self,
        x: f32,
        y: f32,
        radius_x: f32,
        radius_y: f32,
        rotation: f32,
        start: f32,
        end: f32,
    ) {
        if radius_x < 0.0 || radius_y < 0.0 {
            return;
        }
        let sweep = (end - start).clamp(-TAU, TAU);
        let device_radius = radius_x.max(radius_y) * self.state.transform.max_scale();
        let arc_len = device_radius * sweep.abs();
        let segments =
            ((arc_len / FLATTEN_TOLERANCE).ceil() as usize).clamp(8, MAX_CURVE_SEGMENTS);

        let (sin_r, cos_r) = rotation.sin_cos();
        let t = self.state.transform;
        for i in 0..=segments {
            let angle = start + sweep * i as f32 / segments as f32;
            let (sin_a, cos_a) = angle.sin_cos();
            let ex = radius_x * cos_a;
            let ey = radius_y * sin_a;
            let local = Vec2::new(x + ex * cos_r - ey * sin_r, y + ex * sin_r + ey * cos_r);
            self.push_point(t.apply(local));
        }
    }

    fn close_path(&mut self) {
        if let Some(sp) = self.path.last_mut() {
            if !sp.closed && !sp.points.is_empty() {
                sp.closed = true;
                let start = sp.points[0];
                // Following segments start a new subpath at the same point
                self.path.push(SubPath {
                    points: vec![start],
                    closed: false,
                });
            }
        }
    }

    fn fill(&mut self) {
        // Fill implicitly closes every subpath
        let polygons: Vec<Vec<Vec2>> = self
            .path
            .iter()
            .filter(|sp| sp.points.len() >= 3)
            .map(|sp| sp.points.clone())
            .collect();
        if polygons.is_empty() {
            return;
        }
        let paint = self.state.fill.clone();
        self.paint_coverage(&polygons, &paint);
    }

    fn stroke(&mut self) {
        // Line width is in local units
        let half = self.state.line_width * self.state.transform.max_scale() * 0.5;
        let mut quads = Vec::new();
        for sp in &self.path {
            let mut segments: Vec<(Vec2, Vec2)> =
                sp.points.windows(2).map(|w| (w[0], w[1])).collect();
            if sp.closed && sp.points.len() > 2 {
                segments.push((sp.points[sp.points.len() - 1], sp.points[0]));
            }
            for (a, b) in segments {
                let dir = (b - a).normalize();
                if dir.length() < 0.5 {
                    continue;
                }
                // Same winding for every quad so overlaps union under non-zero
                let n = dir.perp() * half;
                quads.push(vec![a + n, b + n, b - n, a - n]);
            }
        }
        if quads.is_empty() {
            return;
        }
        let paint = self.state.stroke.clone();
        self.paint_coverage(&quads, &paint);
    }
}

// ============================================================================
// Coverage Rasteriser
// ============================================================================

/// Per-pixel coverage over a clipped bounding box
#[derive(Debug, Default)]
struct Coverage {
    x0: i32,
    y0: i32,
    w: usize,
    h: usize,
    values: Vec<f32>,
    /// Scratch: (x, winding direction) per scanline
    crossings: Vec<(f32, i32)>,
}

impl Coverage {
    fn rasterize(&mut self, polygons: &[Vec<Vec2>], width: u32, height: u32) {
        self.w = 0;
        self.h = 0;
        self.values.clear();

        let mut min = Vec2::new(f32::MAX, f32::MAX);
        let mut max = Vec2::new(f32::MIN, f32::MIN);
        for p in polygons.iter().flatten() {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
            return;
        }

        let x0 = (min.x.floor() as i32).max(0);
        let y0 = (min.y.floor() as i32).max(0);
        let x1 = (max.x.ceil() as i32).min(width as i32);
        let y1 = (max.y.ceil() as i32).min(height as i32);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        self.x0 = x0;
        self.y0 = y0;
        self.w = (x1 - x0) as usize;
        self.h = (y1 - y0) as usize;
        self.values.resize(self.w * self.h, 0.0);

        let weight = 1.0 / SUBSAMPLES as f32;
        for row in 0..self.h {
            let y = (y0 + row as i32) as f32;
            for sub in 0..SUBSAMPLES {
                let sy = y + (sub as f32 + 0.5) * weight;

                self.crossings.clear();
                for poly in polygons {
                    let n = poly.len();
                    for i in 0..n {
                        let a = poly[i];
                        let b = poly[(i + 1) % n];
                        if (a.y <= sy && b.y > sy) || (b.y <= sy && a.y > sy) {
                            let x = a.x + (sy - a.y) / (b.y - a.y) * (b.x - a.x);
                            let dir = if b.y > a.y { 1 } else { -1 };
                            self.crossings.push((x, dir));
                        }
                    }
                }
                self.crossings.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

                // Emit spans where the winding number is non-zero
                let mut winding = 0;
                let mut span_start = 0.0;
                for i in 0..self.crossings.len() {
                    let (x, dir) = self.crossings[i];
                    let was_inside = winding != 0;
                    winding += dir;
                    if !was_inside && winding != 0 {
                        span_start = x;
                    } else if was_inside && winding == 0 {
                        self.add_span(row, span_start, x, weight);
                    }
                }
            }
        }
    }

    /// Accumulate horizontal coverage of [xa, xb) into one row
    fn add_span(&mut self, row: usize, xa: f32, xb: f32, weight: f32) {
        let left = self.x0 as f32;
        let right = (self.x0 + self.w as i32) as f32;
        let xa = xa.max(left);
        let xb = xb.min(right);
        if xb <= xa {
            return;
        }

        let first = xa.floor() as i32;
        let last = (xb.ceil() as i32 - 1).max(first);
        let base = row * self.w;
        for px in first..=last {
            let col = (px - self.x0) as usize;
            if col >= self.w {
                break;
            }
            let overlap = (xb.min(px as f32 + 1.0) - xa.max(px as f32)).max(0.0);
            self.values[base + col] += overlap * weight;
        }
    }
}
