// ============================================================================
// RASTER SURFACE
// ============================================================================
//
// Software rasterizer behind the pixels frame buffer: RGBA8, straight alpha
// blending, antialiased lines, arcs and rusttype text.

use std::f64::consts::{FRAC_PI_2, TAU};
use std::path::{Path, PathBuf};

use rusttype::{point, Font, PositionedGlyph, Scale};
use tracing::{debug, warn};

use super::{DialFace, HighlightArc, NeedleIntent, Surface, TextIntent, TextSlot};
use crate::config::{Color, InstrumentConfig};
use crate::error::InstrumentError;
use crate::field::Field;

const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/liberation-mono/LiberationMono-Regular.ttf",
    "/System/Library/Fonts/Menlo.ttc",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
];

pub fn load_font(path: &Path) -> Result<Font<'static>, InstrumentError> {
    let bytes = std::fs::read(path).map_err(|source| InstrumentError::FontRead {
        path: path.to_path_buf(),
        source,
    })?;
    Font::try_from_vec(bytes).ok_or_else(|| InstrumentError::FontParse(path.to_path_buf()))
}

/// Load the configured font, falling back to well-known system fonts.
/// Without any usable font the instrument still runs, minus its text.
pub fn resolve_font(explicit: Option<&Path>) -> Option<Font<'static>> {
    if let Some(path) = explicit {
        match load_font(path) {
            Ok(font) => return Some(font),
            Err(err) => warn!(error = %err, "configured font unusable, trying system fonts"),
        }
    }
    for candidate in SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from) {
        if !candidate.is_file() {
            continue;
        }
        match load_font(&candidate) {
            Ok(font) => {
                debug!(path = %candidate.display(), "using system font");
                return Some(font);
            }
            Err(err) => debug!(error = %err, "skipping system font"),
        }
    }
    warn!("no usable font found; readout and labels will not be drawn (pass --font)");
    None
}

/// Pixel geometry of the dial for a given frame size.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DialGeometry {
    cx: i32,
    cy: i32,
    r: i32,
}

impl DialGeometry {
    fn fit(width: usize, height: usize, margin: i32) -> Self {
        Self {
            cx: width as i32 / 2,
            cy: height as i32 / 2,
            r: ((width.min(height) as i32) / 2 - margin).max(1),
        }
    }

    fn point_at(&self, angle: f64, radius: f64) -> (f64, f64) {
        (
            self.cx as f64 + angle.cos() * radius,
            self.cy as f64 + angle.sin() * radius,
        )
    }
}

/// An RGBA8 frame buffer that implements the render contract.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: usize,
    height: usize,
    font: Option<&'a Font<'static>>,
    config: &'a InstrumentConfig,
    dial: DialGeometry,
}

impl<'a> Canvas<'a> {
    pub fn new(
        frame: &'a mut [u8],
        width: usize,
        height: usize,
        font: Option<&'a Font<'static>>,
        config: &'a InstrumentConfig,
    ) -> Self {
        Self {
            frame,
            width,
            height,
            font,
            config,
            dial: DialGeometry::fit(width, height, config.dial_margin),
        }
    }

    /// RGBA of one pixel, for inspection.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 4;
        let px = self.frame.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    fn blend(&mut self, x: i32, y: i32, color: Color, alpha: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 4;
        let Some(dst) = self.frame.get_mut(idx..idx + 4) else {
            return;
        };
        let a = alpha.clamp(0.0, 1.0);
        let mix = |src: u8, dst: u8| (src as f32 * a + dst as f32 * (1.0 - a)).round() as u8;
        dst[0] = mix(color.r, dst[0]);
        dst[1] = mix(color.g, dst[1]);
        dst[2] = mix(color.b, dst[2]);
        dst[3] = 0xff;
    }

    /// Antialiased thick segment; `taper` narrows it toward `(x1, y1)`.
    fn line(
        &mut self,
        from: (i32, i32),
        to: (i32, i32),
        thickness: f32,
        taper: bool,
        color: Color,
    ) {
        let ((x0, y0), (x1, y1)) = (from, to);
        let pad = thickness.ceil() as i32 + 1;
        let dx = (x1 - x0) as f32;
        let dy = (y1 - y0) as f32;
        let len_sq = (dx * dx + dy * dy).max(f32::EPSILON);
        for y in y0.min(y1) - pad..=y0.max(y1) + pad {
            for x in x0.min(x1) - pad..=x0.max(x1) + pad {
                let (px, py) = ((x - x0) as f32, (y - y0) as f32);
                let t = ((px * dx + py * dy) / len_sq).clamp(0.0, 1.0);
                let dist = ((x0 as f32 + t * dx - x as f32).powi(2)
                    + (y0 as f32 + t * dy - y as f32).powi(2))
                .sqrt();
                let width = if taper {
                    thickness * (1.0 - t * 0.95)
                } else {
                    thickness
                };
                let aa = 1.0 - (dist - width / 2.0).clamp(0.0, 1.0);
                if aa > 0.01 {
                    self.blend(x, y, color, aa);
                }
            }
        }
    }

    fn disc(&mut self, cx: i32, cy: i32, radius: i32, color: Color) {
        for y in -radius - 1..=radius + 1 {
            for x in -radius - 1..=radius + 1 {
                let dist = ((x * x + y * y) as f64).sqrt();
                let aa = 1.0 - (dist - radius as f64).clamp(0.0, 1.0);
                if aa > 0.0 {
                    self.blend(cx + x, cy + y, color, aa as f32);
                }
            }
        }
    }

    /// Ring segment of width `thickness` just inside radius `r`.
    fn ring(&mut self, r: i32, thickness: i32, start: f64, span: f64, color: Color) {
        let (cx, cy) = (self.dial.cx, self.dial.cy);
        let (outer, inner) = (r as f64, (r - thickness) as f64);
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let (dx, dy) = ((x - cx) as f64, (y - cy) as f64);
                let dist = (dx * dx + dy * dy).sqrt();
                if dist < inner - 1.0 || dist > outer + 1.0 {
                    continue;
                }
                if (dy.atan2(dx) - start).rem_euclid(TAU) > span {
                    continue;
                }
                let aa = if dist > outer {
                    1.0 - (dist - outer)
                } else if dist < inner {
                    1.0 - (inner - dist)
                } else {
                    1.0
                };
                if aa > 0.0 {
                    self.blend(x, y, color, aa as f32);
                }
            }
        }
    }

    /// Soft-edged band between two angles, used for the highlight arc.
    fn band(&mut self, start: f64, end: f64, color: Color) {
        let (cx, cy) = (self.dial.cx, self.dial.cy);
        let outer = self.dial.r as f64;
        let inner = (outer - self.config.highlight_band_width as f64).max(0.0);
        let span = (end - start).max(0.0);
        let softness = self.config.highlight_band_edge_softness.max(f64::EPSILON);
        let opacity = self.config.highlight_band_alpha;

        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let (dx, dy) = ((x - cx) as f64, (y - cy) as f64);
                let dist = (dx * dx + dy * dy).sqrt();
                let radial = if dist < inner - 1.0 || dist > outer + 1.0 {
                    continue;
                } else if dist < inner + 1.0 {
                    (dist - (inner - 1.0)) / 2.0
                } else if dist <= outer - 1.0 {
                    1.0
                } else {
                    1.0 - (dist - (outer - 1.0)) / 2.0
                };

                let offset = (dy.atan2(dx) - start).rem_euclid(TAU);
                let angular = if offset <= span {
                    1.0
                } else {
                    let outside = (offset - span).min(TAU - offset);
                    1.0 - outside.min(softness) / softness
                };

                let alpha = (radial.clamp(0.0, 1.0) * angular * opacity).clamp(0.0, 1.0);
                if alpha > 0.01 {
                    self.blend(x, y, color, alpha as f32);
                }
            }
        }
    }

    fn text_width(font: &Font<'static>, text: &str, size: f32) -> i32 {
        let glyphs: Vec<PositionedGlyph> = font
            .layout(text, Scale::uniform(size), point(0.0, 0.0))
            .collect();
        let (min_x, max_x) = glyphs
            .iter()
            .filter_map(|g| g.pixel_bounding_box())
            .fold((i32::MAX, i32::MIN), |(lo, hi), bb| {
                (lo.min(bb.min.x), hi.max(bb.max.x))
            });
        if min_x < max_x {
            max_x - min_x
        } else {
            0
        }
    }

    /// Text centered on `(x, y)`.
    fn text(&mut self, x: i32, y: i32, text: &str, size: f32, color: Color) {
        let Some(font) = self.font else {
            return;
        };
        let scale = Scale::uniform(size);
        let ascent = font.v_metrics(scale).ascent;
        let glyphs: Vec<PositionedGlyph> = font.layout(text, scale, point(0.0, ascent)).collect();
        let (min_x, max_x, min_y, max_y) = glyphs.iter().filter_map(|g| g.pixel_bounding_box()).fold(
            (i32::MAX, i32::MIN, i32::MAX, i32::MIN),
            |(min_x, max_x, min_y, max_y), bb| {
                (
                    min_x.min(bb.min.x),
                    max_x.max(bb.max.x),
                    min_y.min(bb.min.y),
                    max_y.max(bb.max.y),
                )
            },
        );
        if min_x >= max_x || min_y >= max_y {
            return;
        }
        let offset_x = x - (max_x - min_x) / 2;
        let offset_y = y - (max_y - min_y) / 2;
        for glyph in &glyphs {
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, v| {
                    let px = offset_x + gx as i32 + bb.min.x - min_x;
                    let py = offset_y + gy as i32 + bb.min.y - min_y;
                    self.blend(px, py, color, v);
                });
            }
        }
    }

    /// Text laid along a circle around the dial center, centered on `center_angle`.
    fn curved_text(
        &mut self,
        radius: f64,
        text: &str,
        size: f32,
        max_span: f64,
        center_angle: f64,
        color: Color,
    ) {
        let Some(font) = self.font else {
            return;
        };
        let scale = Scale::uniform(size);
        let ascent = font.v_metrics(scale).ascent;
        let glyphs: Vec<PositionedGlyph> = font.layout(text, scale, point(0.0, ascent)).collect();
        let (Some(first), Some(last)) = (glyphs.first(), glyphs.last()) else {
            return;
        };
        let origin = first.position().x as f64;
        let total_width =
            last.position().x as f64 - origin + last.unpositioned().h_metrics().advance_width as f64;
        if total_width <= 0.0 || radius <= 0.0 {
            return;
        }
        let start_angle = center_angle - (total_width / radius).min(max_span) / 2.0;

        for glyph in &glyphs {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            let advance = glyph.unpositioned().h_metrics().advance_width as f64;
            let along = glyph.position().x as f64 - origin + advance / 2.0;
            let angle = start_angle + along / radius;
            let (center_x, center_y) = self.dial.point_at(angle, radius);
            let (sin_r, cos_r) = (angle + FRAC_PI_2).sin_cos();
            let glyph_cx = (bb.min.x + bb.max.x) as f64 / 2.0;
            let glyph_cy = (bb.min.y + bb.max.y) as f64 / 2.0;

            glyph.draw(|gx, gy, v| {
                if v <= 0.001 {
                    return;
                }
                let lx = gx as f64 + bb.min.x as f64 - glyph_cx;
                let ly = gy as f64 + bb.min.y as f64 - glyph_cy;
                self.splat(
                    center_x + lx * cos_r - ly * sin_r,
                    center_y + lx * sin_r + ly * cos_r,
                    color,
                    v,
                );
            });
        }
    }

    /// Sub-pixel dot spread bilinearly over its four neighbours.
    fn splat(&mut self, x: f64, y: f64, color: Color, alpha: f32) {
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (x0, y0) = (x0 as i32, y0 as i32);
        for (px, py, weight) in [
            (x0, y0, (1.0 - fx) * (1.0 - fy)),
            (x0 + 1, y0, fx * (1.0 - fy)),
            (x0, y0 + 1, (1.0 - fx) * fy),
            (x0 + 1, y0 + 1, fx * fy),
        ] {
            let a = alpha * weight as f32;
            if a > 0.001 {
                self.blend(px, py, color, a);
            }
        }
    }

    fn readout(&mut self, text: &str, color: Color) {
        let Some(font) = self.font else {
            return;
        };
        let config = self.config;
        let (whole, frac) = text.split_once('.').unwrap_or((text, ""));
        let label_x = (self.width as f64 * config.readout_x_factor) as i32;
        let label_y = (self.height as f64 * config.readout_y_factor) as i32;
        self.text(label_x, label_y, whole, config.readout_big_font_size, color);

        let whole_width = Self::text_width(font, whole, config.readout_big_font_size);
        let (frac_x, frac_y) = (label_x + whole_width / 2 + 28, label_y + 2);
        self.text(frac_x, frac_y, frac, config.readout_small_font_size, color);

        let pad = config.readout_box_padding;
        let char_width = (config.readout_big_font_size / 11.0) as i32;
        let left = label_x - pad - char_width * whole.len() as i32;
        let (top, right, bottom) = (label_y - pad, frac_x + pad + 5, frac_y + pad);
        let thickness = config.readout_box_thickness;
        for (from, to) in [
            ((left, top), (right, top)),
            ((left, bottom), (right, bottom)),
            ((left, top), (left, bottom)),
            ((right, top), (right, bottom)),
        ] {
            self.line(from, to, thickness, false, color);
        }
    }
}

impl Surface for Canvas<'_> {
    fn clear(&mut self, color: Color) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[color.r, color.g, color.b, 0xff]);
        }
    }

    fn draw_dial(&mut self, face: &DialFace) {
        let config = self.config;
        let dial = self.dial;
        self.ring(dial.r, config.dial_thickness, face.start_angle, face.arc_span, face.color);

        for tick in &face.ticks {
            let (length, thickness) = if tick.major {
                (config.major_tick_length, config.major_tick_thickness)
            } else {
                (config.minor_tick_length, config.minor_tick_thickness)
            };
            let (ox, oy) = dial.point_at(tick.angle, dial.r as f64 - 1.0);
            let (ix, iy) = dial.point_at(tick.angle, (dial.r - length) as f64);
            self.line(
                (ix.round() as i32, iy.round() as i32),
                (ox.round() as i32, oy.round() as i32),
                thickness,
                false,
                face.color,
            );
            if let Some(label) = &tick.label {
                let radius = (dial.r - config.major_tick_length) as f64
                    - config.dial_ticks_to_numbers_distance;
                let (lx, ly) = dial.point_at(tick.angle, radius);
                self.text(lx as i32, ly as i32, label, config.dial_numbers_font_size, face.color);
            }
        }

        if let Some(caption) = &face.caption {
            self.curved_text(
                dial.r as f64 + config.caption_radius_offset,
                caption,
                config.caption_font_size,
                config.caption_arc_span,
                config.caption_angle,
                face.color,
            );
        }
    }

    fn draw_arc(&mut self, arc: &HighlightArc) {
        self.band(arc.start_angle, arc.end_angle, arc.color);
    }

    fn draw_needle(&mut self, needle: &NeedleIntent) {
        let config = self.config;
        let dial = self.dial;
        let center = (dial.cx, dial.cy);
        let (tx, ty) = dial.point_at(needle.angle, dial.r as f64 * config.needle_length_factor);
        let (bx, by) = dial.point_at(needle.angle, -config.needle_back_length);
        self.line(center, (tx as i32, ty as i32), config.needle_width, true, needle.color);
        self.line(center, (bx as i32, by as i32), config.needle_width, false, needle.color);
        self.disc(dial.cx, dial.cy, config.dot_radius, needle.color);
    }

    fn draw_text(&mut self, text: &TextIntent) {
        match text.slot {
            TextSlot::Readout => self.readout(&text.text, text.color),
            TextSlot::NeedleLabel(field) => {
                let row = match field {
                    Field::Needle2 => 1.0,
                    _ => 0.0,
                };
                let size = self.config.label_font_size;
                let x = self.dial.cx;
                let y = self.dial.cy + self.dial.r / 3 + (row * size as f64 * 1.2) as i32;
                self.text(x, y, &text.text, size, text.color);
            }
        }
    }

    fn draw_warning(&mut self, color: Color) {
        let (x, y) = (self.dial.cx, self.dial.cy - self.dial.r / 4);
        let size = self.config.exclamation_mark_size;
        if self.font.is_some() {
            self.text(x, y, "!", size, color);
            return;
        }
        // no font: stroke plus dot, same footprint as the glyph
        let half = (size / 2.0) as i32;
        let stroke = (size / 8.0).max(2.0);
        self.line((x, y - half), (x, y + half / 3), stroke, false, color);
        self.disc(x, y + half - stroke as i32 / 2, (stroke / 2.0).ceil() as i32, color);
    }
}
