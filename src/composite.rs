// Flattens a host and its effect layer into a window-ready frame buffer.
// Visual: what the page would show: the host's background with the canvas
// (or the overlay nodes) painted on top.

use image::Rgb;

use crate::color::{pack, parse_color};
use crate::fireworks::Fireworks;
use crate::gamma::GammaLut;
use crate::host::HostSurface;
use crate::renderer::LayerView;
use crate::renderer::canvas::Canvas;
use crate::renderer::dom::Overlay;
use crate::styles::{ParticleRule, STYLE_ID};
use crate::types::FrameBuffer;

pub fn composite(
    host: &HostSurface,
    fx: &Fireworks,
    background: u32,
    lut: &GammaLut,
    fb: &mut FrameBuffer,
) {
    fb.fill(background);
    if !host.is_attached() {
        return;
    }
    match fx.layer() {
        Some(LayerView::Canvas(canvas)) => composite_canvas(canvas, lut, fb),
        Some(LayerView::Overlay(overlay)) => {
            let sheet = host.document().style_sheet(STYLE_ID);
            let (w, h) = host.bounding_box();
            // An unstyled overlay is not clipped to its host.
            let clip = match &sheet {
                Some(s) if s.overlay.clip_to_host => (w as usize, h as usize),
                _ => (usize::MAX, usize::MAX),
            };
            let rules = sheet.map(|s| s.particle);
            composite_overlay(overlay, fx.now(), rules.as_ref(), clip, lut, fb);
        }
        None => {}
    }
}

/// Nearest-sample the physical backing store down to logical pixels.
fn composite_canvas(canvas: &Canvas, lut: &GammaLut, fb: &mut FrameBuffer) {
    let (css_w, css_h) = canvas.css_size();
    if css_w <= 0.0 || css_h <= 0.0 {
        return;
    }
    let pixels = canvas.pixels();
    let (pw, ph) = pixels.dimensions();
    let sx = pw as f32 / css_w;
    let sy = ph as f32 / css_h;
    let w = (css_w as usize).min(fb.width);
    let h = (css_h as usize).min(fb.height);

    for y in 0..h {
        let py = (((y as f32 + 0.5) * sy) as u32).min(ph - 1);
        for x in 0..w {
            let px = (((x as f32 + 0.5) * sx) as u32).min(pw - 1);
            let src = pixels.get_pixel(px, py);
            if src[3] == 0 {
                continue;
            }
            let idx = y * fb.width + x;
            let rgb = pack(Rgb([src[0], src[1], src[2]]));
            fb.pixels[idx] = lut.blend(fb.pixels[idx], rgb, src[3] as f32 / 255.0);
        }
    }
}

fn composite_overlay(
    overlay: &Overlay,
    now: f64,
    rules: Option<&ParticleRule>,
    clip: (usize, usize),
    lut: &GammaLut,
    fb: &mut FrameBuffer,
) {
    let max_x = clip.0.min(fb.width);
    let max_y = clip.1.min(fb.height);
    for node in overlay.nodes() {
        let Some(rgb) = parse_color(&node.color) else { continue };
        let v = node.visual_at(now, rules);
        if v.opacity <= 0.0 || v.radius <= 0.0 {
            continue;
        }
        let color = pack(rgb);
        let x0 = (v.cx - v.radius).floor().max(0.0) as usize;
        let y0 = (v.cy - v.radius).floor().max(0.0) as usize;
        let x1 = ((v.cx + v.radius).ceil().max(0.0) as usize).min(max_x);
        let y1 = ((v.cy + v.radius).ceil().max(0.0) as usize).min(max_y);
        let r2 = v.radius * v.radius;
        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - v.cx;
                let dy = y as f32 + 0.5 - v.cy;
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                let idx = y * fb.width + x;
                fb.pixels[idx] = lut.blend(fb.pixels[idx], color, v.opacity);
            }
        }
    }
}
