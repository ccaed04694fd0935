//! Heart glyph renderer
//!
//! Draws a single heart through any `Surface`. The glyph is a fixed vector
//! path in a 24x24 box, scaled by the heart's size and shaded with a pink
//! radial gradient, a faint white outline and a small highlight.

use crate::config::{
    GRADIENT_INNER, GRADIENT_MIDDLE, GRADIENT_OUTER, HEART_PATH_SIZE, HIGHLIGHT_COLOR,
    STROKE_COLOR,
};
use crate::display::{Color, Paint, RadialGradient, Surface};
use crate::math2d::Vec2;
use crate::particles::Heart;
use std::f32::consts::TAU;

/// One step of the heart outline, in path-box units
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    /// cp1x, cp1y, cp2x, cp2y, x, y
    CubicTo(f32, f32, f32, f32, f32, f32),
}

pub const HEART_PATH: [PathCommand; 10] = [
    PathCommand::MoveTo(2.0, 9.5),
    PathCommand::CubicTo(2.0, 6.46, 4.46, 4.0, 7.5, 4.0),
    PathCommand::CubicTo(9.24, 4.0, 10.91, 4.81, 12.0, 6.09),
    PathCommand::CubicTo(13.09, 4.81, 14.76, 4.0, 16.5, 4.0),
    PathCommand::CubicTo(19.54, 4.0, 22.0, 6.46, 22.0, 9.5),
    PathCommand::CubicTo(22.0, 11.79, 20.5, 13.5, 19.0, 15.0),
    PathCommand::LineTo(13.508, 20.313),
    PathCommand::CubicTo(12.94, 20.88, 12.06, 20.88, 11.492, 20.313),
    PathCommand::LineTo(5.0, 15.0),
    PathCommand::CubicTo(3.5, 13.5, 2.0, 11.8, 2.0, 9.5),
];

const GRADIENT_MIDDLE_STOP: f32 = 0.6;
const MIDDLE_ALPHA: f32 = 0.8;
const OUTER_ALPHA: f32 = 0.6;
const STROKE_ALPHA: f32 = 0.3;
const HIGHLIGHT_ALPHA: f32 = 0.4;

/// Highlight ellipse: centre and radii in path-box units
const HIGHLIGHT_CENTER: (f32, f32) = (8.0, 8.0);
const HIGHLIGHT_RADII: (f32, f32) = (2.0, 1.5);

/// Stateless heart painter
#[derive(Debug, Default, Clone, Copy)]
pub struct HeartRenderer;

impl HeartRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Draw `heart` with its current position, rotation, size and opacity.
    /// Leaves the surface's save stack exactly as it found it.
    pub fn draw(&self, surface: &mut dyn Surface, heart: &Heart) {
        surface.save();
        surface.translate(heart.pos.x, heart.pos.y);
        surface.rotate(heart.rotation.to_radians());
        surface.set_global_alpha(heart.opacity);

        let scale = heart.size / HEART_PATH_SIZE;
        let offset = -(HEART_PATH_SIZE / 2.0) * scale;
        surface.scale(scale, scale);
        // Applied after scale, so the shape lands offset by -12*scale^2 screen px
        surface.translate(offset, offset);

        surface.set_fill_style(Self::gradient(heart.opacity).into());
        surface.set_stroke_style(Color::from_rgb(STROKE_COLOR, heart.opacity * STROKE_ALPHA).into());
        surface.set_line_width(1.0);

        Self::trace_heart(surface);
        surface.fill();
        surface.stroke();

        Self::draw_highlight(surface, heart.opacity);

        surface.restore();
    }

    fn gradient(opacity: f32) -> Paint {
        RadialGradient::new(Vec2::ZERO, 0.0, HEART_PATH_SIZE)
            .with_stop(0.0, Color::from_rgb(GRADIENT_INNER, opacity))
            .with_stop(
                GRADIENT_MIDDLE_STOP,
                Color::from_rgb(GRADIENT_MIDDLE, opacity * MIDDLE_ALPHA),
            )
            .with_stop(1.0, Color::from_rgb(GRADIENT_OUTER, opacity * OUTER_ALPHA))
            .into()
    }

    fn trace_heart(surface: &mut dyn Surface) {
        surface.begin_path();
        for command in HEART_PATH {
            match command {
                PathCommand::MoveTo(x, y) => surface.move_to(x, y),
                PathCommand::LineTo(x, y) => surface.line_to(x, y),
                PathCommand::CubicTo(c1x, c1y, c2x, c2y, x, y) => {
                    surface.bezier_curve_to(c1x, c1y, c2x, c2y, x, y);
                },
            }
        }
    }

    fn draw_highlight(surface: &mut dyn Surface, opacity: f32) {
        surface.set_fill_style(Color::from_rgb(HIGHLIGHT_COLOR, opacity * HIGHLIGHT_ALPHA).into());
        surface.begin_path();
        surface.ellipse(
            HIGHLIGHT_CENTER.0,
            HIGHLIGHT_CENTER.1,
            HIGHLIGHT_RADII.0,
            HIGHLIGHT_RADII.1,
            0.0,
            0.0,
            TAU,
        );
        surface.fill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Canvas;
    use crate::math2d::Transform2D;

    fn heart_at(x: f32, y: f32) -> Heart {
        Heart {
            id: 7,
            pos: Vec2::new(x, y),
            vel: Vec2::ZERO,
            size: 40.0,
            opacity: 1.0,
            rotation: 30.0,
            rotation_speed: 0.0,
            life: 1.0,
        }
    }

    /// Records surface calls for ordering checks
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        depth: usize,
        fills: Vec<Paint>,
    }

    impl Surface for Recorder {
        fn width(&self) -> u32 {
            100
        }
        fn height(&self) -> u32 {
            100
        }
        fn clear(&mut self) {
            self.calls.push("clear".into());
        }
        fn save(&mut self) {
            self.depth += 1;
            self.calls.push("save".into());
        }
        fn restore(&mut self) {
            self.depth = self.depth.saturating_sub(1);
            self.calls.push("restore".into());
        }
        fn save_depth(&self) -> usize {
            self.depth
        }
        fn translate(&mut self, x: f32, y: f32) {
            self.calls.push(format!("translate {} {}", x, y));
        }
        fn rotate(&mut self, angle: f32) {
            self.calls.push(format!("rotate {:.4}", angle));
        }
        fn scale(&mut self, sx: f32, sy: f32) {
            self.calls.push(format!("scale {} {}", sx, sy));
        }
        fn set_global_alpha(&mut self, alpha: f32) {
            self.calls.push(format!("alpha {}", alpha));
        }
        fn set_fill_style(&mut self, paint: Paint) {
            self.fills.push(paint);
            self.calls.push("fill_style".into());
        }
        fn set_stroke_style(&mut self, _paint: Paint) {
            self.calls.push("stroke_style".into());
        }
        fn set_line_width(&mut self, width: f32) {
            self.calls.push(format!("line_width {}", width));
        }
        fn begin_path(&mut self) {
            self.calls.push("begin_path".into());
        }
        fn move_to(&mut self, _x: f32, _y: f32) {
            self.calls.push("move_to".into());
        }
        fn line_to(&mut self, _x: f32, _y: f32) {
            self.calls.push("line_to".into());
        }
        fn bezier_curve_to(&mut self, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32) {
            self.calls.push("bezier".into());
        }
        fn ellipse(&mut self, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32, _: f32) {
            self.calls.push("ellipse".into());
        }
        fn close_path(&mut self) {
            self.calls.push("close_path".into());
        }
        fn fill(&mut self) {
            self.calls.push("fill".into());
        }
        fn stroke(&mut self) {
            self.calls.push("stroke".into());
        }
    }

    #[test]
    fn test_heart_path_shape() {
        let moves = HEART_PATH
            .iter()
            .filter(|c| matches!(c, PathCommand::MoveTo(..)))
            .count();
        let lines = HEART_PATH
            .iter()
            .filter(|c| matches!(c, PathCommand::LineTo(..)))
            .count();
        assert_eq!(moves, 1);
        assert_eq!(lines, 2);
        // Outline ends where it started
        let PathCommand::MoveTo(sx, sy) = HEART_PATH[0] else {
            panic!("path must start with a move");
        };
        let PathCommand::CubicTo(.., ex, ey) = HEART_PATH[HEART_PATH.len() - 1] else {
            panic!("path must end with a curve");
        };
        assert_eq!((sx, sy), (ex, ey));
    }

    #[test]
    fn test_draw_call_order() {
        let mut rec = Recorder::default();
        HeartRenderer::new().draw(&mut rec, &heart_at(10.0, 20.0));

        let calls = &rec.calls;
        assert_eq!(calls.first().map(String::as_str), Some("save"));
        assert_eq!(calls.last().map(String::as_str), Some("restore"));
        assert_eq!(calls[1], "translate 10 20");
        assert_eq!(calls[2], format!("rotate {:.4}", 30f32.to_radians()));
        assert_eq!(calls[3], "alpha 1");
        let scale = 40.0 / HEART_PATH_SIZE;
        let offset = -(HEART_PATH_SIZE / 2.0) * scale;
        assert_eq!(calls[4], format!("scale {} {}", scale, scale));
        assert_eq!(calls[5], format!("translate {} {}", offset, offset));

        let fill = calls.iter().position(|c| c == "fill").unwrap();
        let stroke = calls.iter().position(|c| c == "stroke").unwrap();
        let ellipse = calls.iter().position(|c| c == "ellipse").unwrap();
        assert!(fill < stroke && stroke < ellipse);
        assert_eq!(calls.iter().filter(|c| *c == "bezier").count(), 7);
    }

    #[test]
    fn test_gradient_alpha_follows_opacity() {
        let mut rec = Recorder::default();
        let mut heart = heart_at(0.0, 0.0);
        heart.opacity = 0.5;
        HeartRenderer::new().draw(&mut rec, &heart);

        let Paint::Radial(gradient) = &rec.fills[0] else {
            panic!("heart body should use a radial gradient");
        };
        let alphas: Vec<f32> = gradient.stops().iter().map(|(_, c)| c.a).collect();
        assert_eq!(alphas, vec![0.5, 0.4, 0.3]);
        assert_eq!(gradient.outer_radius, HEART_PATH_SIZE);

        let Paint::Solid(highlight) = &rec.fills[1] else {
            panic!("highlight should be a solid fill");
        };
        assert!((highlight.a - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_draw_leaves_canvas_state_balanced() {
        let mut canvas = Canvas::new(200, 200);
        let renderer = HeartRenderer::new();
        let heart = heart_at(100.0, 100.0);

        renderer.draw(&mut canvas, &heart);
        renderer.draw(&mut canvas, &heart);

        assert_eq!(canvas.save_depth(), 0);
        assert!(canvas.transform().approx_eq(&Transform2D::IDENTITY, 1e-6));
        assert_eq!(canvas.global_alpha(), 1.0);
    }

    #[test]
    fn test_draw_paints_pink_near_position() {
        let mut canvas = Canvas::new(200, 200);
        let mut heart = heart_at(100.0, 100.0);
        heart.rotation = 0.0;
        heart.size = 24.0;
        HeartRenderer::new().draw(&mut canvas, &heart);

        // scale 1: path box spans 88..112, body centre near (100, 100)
        let (r, g, b) = canvas.buffer().get_pixel(100, 100).unwrap();
        assert!(r > 150, "expected pink, got {:?}", (r, g, b));
        assert!(r > g && r > b);
        // Far corner stays untouched
        assert_eq!(canvas.buffer().get_pixel(5, 5), Some((0, 0, 0)));
    }
}
