//! Replays draw commands on a `CanvasRenderingContext2d`

use std::f64::consts::TAU;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlVideoElement};

use super::command::{DrawCmd, Rgba, TextMeasure};

/// 2D canvas painter
pub struct CanvasPainter {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasPainter {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn size(&self) -> (f64, f64) {
        (self.canvas.width() as f64, self.canvas.height() as f64)
    }

    /// Draw a frame. `video` backs `DrawCmd::CameraFrame`.
    pub fn paint(&self, cmds: &[DrawCmd], video: &HtmlVideoElement) -> Result<(), JsValue> {
        for cmd in cmds {
            self.ctx.save();
            let result = self.draw(cmd, video);
            self.ctx.restore();
            result?;
        }
        Ok(())
    }

    fn draw(&self, cmd: &DrawCmd, video: &HtmlVideoElement) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        match cmd {
            DrawCmd::Clear => {
                let (w, h) = self.size();
                ctx.clear_rect(0.0, 0.0, w, h);
            }
            DrawCmd::CameraFrame => {
                let (w, h) = self.size();
                ctx.scale(-1.0, 1.0)?;
                ctx.draw_image_with_html_video_element_and_dw_and_dh(video, -w, 0.0, w, h)?;
            }
            DrawCmd::FillCircle {
                center,
                radius,
                color,
            } => {
                ctx.begin_path();
                ctx.arc(center.x as f64, center.y as f64, radius.max(0.0) as f64, 0.0, TAU)?;
                ctx.set_fill_style_str(&color.css());
                ctx.fill();
            }
            DrawCmd::StrokeCircle {
                center,
                radius,
                line_width,
                color,
            } => {
                ctx.begin_path();
                ctx.arc(center.x as f64, center.y as f64, radius.max(0.0) as f64, 0.0, TAU)?;
                ctx.set_line_width(*line_width as f64);
                ctx.set_stroke_style_str(&color.css());
                ctx.stroke();
            }
            DrawCmd::GradientCircle {
                center,
                radius,
                stops,
            } => {
                let (x, y, r) = (center.x as f64, center.y as f64, *radius as f64);
                let gradient = ctx.create_radial_gradient(x, y, 0.0, x, y, r)?;
                add_stops(&gradient, stops)?;
                ctx.begin_path();
                ctx.arc(x, y, r, 0.0, TAU)?;
                ctx.set_fill_style_canvas_gradient(&gradient);
                ctx.fill();
            }
            DrawCmd::GradientEllipse {
                center,
                radii,
                focus,
                focus_radius,
                stops,
            } => {
                let (fx, fy) = (focus.x as f64, focus.y as f64);
                let gradient =
                    ctx.create_radial_gradient(fx, fy, 0.0, fx, fy, *focus_radius as f64)?;
                add_stops(&gradient, stops)?;
                ctx.begin_path();
                ctx.ellipse(
                    center.x as f64,
                    center.y as f64,
                    radii.x as f64,
                    radii.y as f64,
                    0.0,
                    0.0,
                    TAU,
                )?;
                ctx.set_fill_style_canvas_gradient(&gradient);
                ctx.fill();
            }
            DrawCmd::Polyline {
                points,
                line_width,
                color,
            } => {
                let Some((first, rest)) = points.split_first() else {
                    return Ok(());
                };
                ctx.begin_path();
                ctx.move_to(first.x as f64, first.y as f64);
                for p in rest {
                    ctx.line_to(p.x as f64, p.y as f64);
                }
                ctx.set_line_width(*line_width as f64);
                ctx.set_stroke_style_str(&color.css());
                ctx.stroke();
            }
            DrawCmd::RoundRect {
                origin,
                size,
                corner,
                fill,
                stroke,
                line_width,
            } => {
                ctx.begin_path();
                ctx.round_rect_with_f64(
                    origin.x as f64,
                    origin.y as f64,
                    size.x as f64,
                    size.y as f64,
                    *corner as f64,
                )?;
                ctx.set_fill_style_str(&fill.css());
                ctx.fill();
                ctx.set_line_width(*line_width as f64);
                ctx.set_stroke_style_str(&stroke.css());
                ctx.stroke();
            }
            DrawCmd::Text {
                text,
                pos,
                font,
                align,
                color,
            } => {
                ctx.set_font(font);
                ctx.set_text_align(align.as_str());
                ctx.set_text_baseline("top");
                ctx.set_fill_style_str(&color.css());
                ctx.fill_text(text, pos.x as f64, pos.y as f64)?;
            }
        }
        Ok(())
    }
}

fn add_stops(gradient: &web_sys::CanvasGradient, stops: &[(f32, Rgba)]) -> Result<(), JsValue> {
    for (offset, color) in stops {
        gradient.add_color_stop(*offset, &color.css())?;
    }
    Ok(())
}

impl TextMeasure for CanvasPainter {
    fn text_width(&self, text: &str, font: &str) -> f32 {
        self.ctx.save();
        self.ctx.set_font(font);
        let width = self
            .ctx
            .measure_text(text)
            .map(|m| m.width() as f32)
            .unwrap_or(0.0);
        self.ctx.restore();
        width
    }
}
