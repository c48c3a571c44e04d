// Immediate-mode renderer: one persistent particle population, advanced and
// redrawn into a shared RGBA surface every display frame.
// Visual: round sparks fly outward from each burst origin, shrinking to 20%
// of their size and fading to transparent over their lifetime.

use std::rc::Rc;

use image::{Rgb, Rgba, RgbaImage};
use log::debug;
use rand::Rng;

use crate::burst;
use crate::color::parse_color;
use crate::config::Config;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::fireworks::Task;
use crate::host::{Element, HostSurface, NodeId};
use crate::particle::Particle;
use crate::scheduler::{FrameId, Scheduler};

/// Largest step a single frame may take (ms).
pub const MAX_FRAME_DELTA_MS: f64 = 64.0;

pub const CANVAS_CLASS: &str = "fw-canvas";

// ----------------------------- drawing surface ------------------------------

/// Drawing state of a 2D context.
#[derive(Debug, Clone)]
struct Context2d {
    scale: f32,
    global_alpha: f32,
    fill: Rgb<u8>,
}

/// Backing store sized in physical pixels, plus the logical (CSS) size it is
/// displayed at.
#[derive(Debug)]
pub struct Canvas {
    pixels: RgbaImage,
    css_width: f32,
    css_height: f32,
    ctx: Option<Context2d>,
}

impl Canvas {
    /// A context is only handed out when the document can provide one.
    pub fn new(document: &Document) -> Self {
        let ctx = document.supports_canvas().then(|| Context2d {
            scale: 1.0,
            global_alpha: 1.0,
            fill: Rgb([0, 0, 0]),
        });
        Self { pixels: RgbaImage::new(1, 1), css_width: 0.0, css_height: 0.0, ctx }
    }

    pub fn has_context(&self) -> bool {
        self.ctx.is_some()
    }

    pub fn release_context(&mut self) {
        self.ctx = None;
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn css_size(&self) -> (f32, f32) {
        (self.css_width, self.css_height)
    }

    /// Reallocates (and clears) the backing store, like assigning
    /// `width`/`height` on a real canvas.
    pub fn set_size(&mut self, physical_w: u32, physical_h: u32, css_w: f32, css_h: f32) {
        self.pixels = RgbaImage::new(physical_w.max(1), physical_h.max(1));
        self.css_width = css_w;
        self.css_height = css_h;
    }

    pub fn set_transform(&mut self, scale: f32) {
        if let Some(ctx) = &mut self.ctx {
            ctx.scale = scale;
        }
    }

    pub fn set_global_alpha(&mut self, alpha: f32) {
        if let Some(ctx) = &mut self.ctx {
            if alpha.is_finite() {
                ctx.global_alpha = alpha.clamp(0.0, 1.0);
            }
        }
    }

    /// Unparseable tokens leave the previous fill in place.
    pub fn set_fill_style(&mut self, token: &str) {
        if let (Some(ctx), Some(rgb)) = (&mut self.ctx, parse_color(token)) {
            ctx.fill = rgb;
        }
    }

    /// Clear a logical-pixel rectangle to transparent.
    pub fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let Some(ctx) = &self.ctx else { return };
        let s = ctx.scale;
        let (pw, ph) = self.pixels.dimensions();
        let x0 = ((x * s).floor().max(0.0) as u32).min(pw);
        let y0 = ((y * s).floor().max(0.0) as u32).min(ph);
        let x1 = (((x + w) * s).ceil().max(0.0) as u32).min(pw);
        let y1 = (((y + h) * s).ceil().max(0.0) as u32).min(ph);
        for py in y0..y1 {
            for px in x0..x1 {
                self.pixels.put_pixel(px, py, Rgba([0, 0, 0, 0]));
            }
        }
    }

    /// Fill a circle centred at logical `(cx, cy)` with the current fill and
    /// global alpha, blended source-over.
    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32) {
        let Some(ctx) = &self.ctx else { return };
        if radius <= 0.0 || ctx.global_alpha <= 0.0 {
            return;
        }
        let (cx, cy, r) = (cx * ctx.scale, cy * ctx.scale, radius * ctx.scale);
        let (pw, ph) = self.pixels.dimensions();
        let x0 = (cx - r).floor().max(0.0) as u32;
        let y0 = (cy - r).floor().max(0.0) as u32;
        let x1 = ((cx + r).ceil().max(0.0) as u32).min(pw);
        let y1 = ((cy + r).ceil().max(0.0) as u32).min(ph);
        let r2 = r * r;
        let (fill, alpha) = (ctx.fill, ctx.global_alpha);

        for py in y0..y1 {
            for px in x0..x1 {
                // Sample at the pixel centre
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                let dst = self.pixels.get_pixel_mut(px, py);
                *dst = blend_over(*dst, fill, alpha);
            }
        }
    }
}

/// Straight-alpha source-over.
#[inline]
fn blend_over(dst: Rgba<u8>, src: Rgb<u8>, src_a: f32) -> Rgba<u8> {
    let da = dst[3] as f32 / 255.0;
    let out_a = src_a + da * (1.0 - src_a);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mix = |s: u8, d: u8| {
        let v = (s as f32 * src_a + d as f32 * da * (1.0 - src_a)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

// ------------------------------- renderer -----------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum LoopState {
    Idle,
    Running { frame: FrameId, last_frame_time: f64 },
}

pub struct CanvasRenderer {
    document: Rc<Document>,
    canvas: Canvas,
    particles: Vec<Particle>,
    state: LoopState,
    node: Option<NodeId>,
    z_index: i32,
    width: f32,
    height: f32,
}

impl CanvasRenderer {
    /// Fails when no 2D context can be obtained; the caller falls back.
    pub fn new(config: &Config, document: Rc<Document>) -> Result<Self> {
        let canvas = Canvas::new(&document);
        if !canvas.has_context() {
            return Err(Error::CanvasUnavailable);
        }
        Ok(Self {
            document,
            canvas,
            particles: Vec::new(),
            state: LoopState::Idle,
            node: None,
            z_index: config.z_index,
            width: 0.0,
            height: 0.0,
        })
    }

    pub fn attach(&mut self, host: &mut HostSurface) {
        self.node = Some(host.insert_first(Element::new(CANVAS_CLASS).with_z_index(self.z_index)));
    }

    pub fn update_config(&mut self, config: &Config, host: &mut HostSurface) {
        self.z_index = config.z_index;
        if let Some(node) = self.node {
            host.set_child_z_index(node, config.z_index);
        }
    }

    /// Physical backing size = logical size × device pixel ratio; the
    /// transform is rescaled so drawing stays in logical pixels.
    pub fn resize(&mut self, width: f32, height: f32) {
        if !self.canvas.has_context() {
            return;
        }
        self.width = width;
        self.height = height;
        let dpr = self.document.device_pixel_ratio();
        let physical_w = ((width * dpr).floor() as u32).max(1);
        let physical_h = ((height * dpr).floor() as u32).max(1);
        self.canvas.set_size(physical_w, physical_h, width, height);
        self.canvas.set_transform(dpr);
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, LoopState::Running { .. })
    }

    pub fn start(&mut self, scheduler: &mut Scheduler<Task>) {
        if self.is_running() {
            return;
        }
        let frame = scheduler.request_frame(Task::Frame);
        self.state = LoopState::Running { frame, last_frame_time: scheduler.now() };
        debug!("canvas loop started");
    }

    pub fn stop(&mut self, scheduler: &mut Scheduler<Task>) {
        if let LoopState::Running { frame, .. } = self.state {
            scheduler.cancel_frame(frame);
            self.state = LoopState::Idle;
            debug!("canvas loop stopped");
        }
    }

    /// One display frame. Hidden documents keep time moving but skip the
    /// physics and drawing.
    pub fn on_frame(&mut self, time: f64, scheduler: &mut Scheduler<Task>) {
        let LoopState::Running { last_frame_time, .. } = self.state else {
            return;
        };
        let delta = (time - last_frame_time).clamp(0.0, MAX_FRAME_DELTA_MS);
        if !self.document.is_hidden() {
            self.update(delta as f32);
        }
        let frame = scheduler.request_frame(Task::Frame);
        self.state = LoopState::Running { frame, last_frame_time: time };
    }

    /// Advance every particle by `delta_ms` and redraw the scene. Expired
    /// particles are dropped without being drawn. A zero-sized surface still
    /// ages particles, it just draws nothing.
    pub fn update(&mut self, delta_ms: f32) {
        let drawable = self.canvas.has_context() && self.width > 0.0 && self.height > 0.0;
        let canvas = &mut self.canvas;
        if drawable {
            canvas.clear_rect(0.0, 0.0, self.width, self.height);
        }

        self.particles.retain_mut(|p| {
            if !p.step(delta_ms) {
                return false;
            }
            if drawable {
                canvas.set_global_alpha(p.opacity());
                canvas.set_fill_style(&p.color);
                canvas.fill_circle(p.x, p.y, p.radius());
            }
            true
        });

        // Don't leak the last particle's alpha into later drawing.
        canvas.set_global_alpha(1.0);
    }

    pub fn burst<R: Rng>(&mut self, origin_x: f32, origin_y: f32, config: &Config, rng: &mut R) {
        let sparks = burst::sample(rng, config);
        self.particles.reserve(sparks.len());
        for spark in sparks {
            let (vx, vy) = spark.velocity();
            self.particles.push(Particle {
                x: origin_x,
                y: origin_y,
                vx,
                vy,
                size: spark.size as f32,
                color: spark.color,
                age: 0.0,
                life: spark.duration_ms as f32,
            });
        }
    }

    pub fn destroy(&mut self, host: &mut HostSurface, scheduler: &mut Scheduler<Task>) {
        self.stop(scheduler);
        self.particles.clear();
        if let Some(node) = self.node.take() {
            host.remove(node);
        }
        self.canvas.release_context();
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PartialConfig, PartialSpan};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn five_white() -> Config {
        Config::merged(&PartialConfig {
            particle_count: Some(PartialSpan { min: Some(5), max: Some(5) }),
            colors: Some(vec!["#fff".into()]),
            ..Default::default()
        })
    }

    fn renderer(doc: &Rc<Document>, config: &Config) -> CanvasRenderer {
        let mut r = CanvasRenderer::new(config, doc.clone()).unwrap();
        r.resize(100.0, 100.0);
        r
    }

    fn spark_at(x: f32, y: f32, age: f32, life: f32) -> Particle {
        Particle { x, y, vx: 0.0, vy: 0.0, size: 10.0, color: "#fff".into(), age, life }
    }

    #[test]
    fn unsupported_document_refuses() {
        let doc = Document::new();
        doc.set_canvas_supported(false);
        assert!(matches!(
            CanvasRenderer::new(&Config::default(), doc),
            Err(Error::CanvasUnavailable)
        ));
    }

    #[test]
    fn burst_of_five_white_at_origin() {
        let doc = Document::new();
        let cfg = five_white();
        let mut r = renderer(&doc, &cfg);
        let mut rng = StdRng::seed_from_u64(11);
        r.burst(10.0, 10.0, &cfg, &mut rng);

        assert_eq!(r.particles().len(), 5);
        for p in r.particles() {
            assert_eq!(p.color, "#fff");
            assert_eq!((p.x, p.y), (10.0, 10.0));
            assert!(p.life >= 150.0);
            assert_eq!(p.age, 0.0);
        }
    }

    #[test]
    fn update_draws_live_particles() {
        let doc = Document::new();
        let mut r = renderer(&doc, &Config::default());
        r.particles.push(spark_at(50.0, 50.0, 0.0, 1000.0));
        r.update(16.0);
        assert_eq!(r.particles().len(), 1);
        let px = r.canvas().pixels().get_pixel(50, 50);
        assert_eq!(px[0], 255);
        assert!(px[3] > 200);
    }

    #[test]
    fn particle_alpha_does_not_leak_past_the_batch() {
        let doc = Document::new();
        let mut r = renderer(&doc, &Config::default());
        // Halfway through life: drawn at 50% opacity.
        r.particles.push(spark_at(20.0, 20.0, 484.0, 1000.0));
        r.update(16.0);
        let faded = r.canvas().pixels().get_pixel(20, 20)[3];
        assert!(faded > 0 && faded < 255);

        r.canvas.set_fill_style("#fff");
        r.canvas.fill_circle(60.0, 60.0, 5.0);
        assert_eq!(r.canvas().pixels().get_pixel(60, 60)[3], 255);
    }

    #[test]
    fn expired_particles_are_dropped_and_not_drawn() {
        let doc = Document::new();
        let mut r = renderer(&doc, &Config::default());
        // Lands exactly on life, and overshoots it.
        r.particles.push(spark_at(20.0, 20.0, 84.0, 100.0));
        r.particles.push(spark_at(70.0, 70.0, 90.0, 100.0));
        r.update(16.0);
        assert!(r.particles().is_empty());
        assert_eq!(r.canvas().pixels().get_pixel(20, 20)[3], 0);
        assert_eq!(r.canvas().pixels().get_pixel(70, 70)[3], 0);
    }

    #[test]
    fn resize_scales_backing_store_by_pixel_ratio() {
        let doc = Document::new();
        doc.set_device_pixel_ratio(2.0);
        let mut r = renderer(&doc, &Config::default());
        r.resize(30.5, 20.0);
        assert_eq!(r.canvas().pixels().dimensions(), (61, 40));
        assert_eq!(r.canvas().css_size(), (30.5, 20.0));

        // Logical (10, 10) lands on physical (20, 20).
        r.particles.push(spark_at(10.0, 10.0, 0.0, 1000.0));
        r.update(1.0);
        assert!(r.canvas().pixels().get_pixel(20, 20)[3] > 0);
    }

    #[test]
    fn resize_keeps_particle_positions() {
        let doc = Document::new();
        let mut r = renderer(&doc, &Config::default());
        r.particles.push(spark_at(12.0, 34.0, 0.0, 1000.0));
        r.resize(10.0, 10.0);
        assert_eq!((r.particles()[0].x, r.particles()[0].y), (12.0, 34.0));
    }

    #[test]
    fn frame_loop_clamps_and_respects_visibility() {
        let doc = Document::new();
        let mut r = renderer(&doc, &Config::default());
        let mut sched = Scheduler::new(0.0);
        r.particles.push(spark_at(50.0, 50.0, 0.0, 10_000.0));

        r.start(&mut sched);
        r.start(&mut sched);
        assert_eq!(sched.pending_frames(), 1);

        // A 5 s gap advances by at most 64 ms.
        sched.take_frames(5000.0);
        r.on_frame(5000.0, &mut sched);
        assert_eq!(r.particles()[0].age, 64.0);

        doc.set_hidden(true);
        sched.take_frames(5016.0);
        r.on_frame(5016.0, &mut sched);
        assert_eq!(r.particles()[0].age, 64.0);

        doc.set_hidden(false);
        sched.take_frames(5032.0);
        r.on_frame(5032.0, &mut sched);
        assert_eq!(r.particles()[0].age, 80.0);

        r.stop(&mut sched);
        assert_eq!(sched.pending_frames(), 0);
        r.on_frame(6000.0, &mut sched);
        assert_eq!(r.particles()[0].age, 80.0);
    }

    #[test]
    fn destroy_releases_everything() {
        let doc = Document::new();
        let mut host = HostSurface::new(doc.clone(), 100.0, 100.0);
        let cfg = five_white();
        let mut r = renderer(&doc, &cfg);
        let mut sched = Scheduler::new(0.0);
        r.attach(&mut host);
        r.burst(1.0, 1.0, &cfg, &mut StdRng::seed_from_u64(1));
        r.start(&mut sched);

        r.destroy(&mut host, &mut sched);
        assert!(r.particles().is_empty());
        assert_eq!(host.child_count(), 0);
        assert!(!r.canvas().has_context());
        assert_eq!(sched.pending_frames(), 0);
    }

    #[test]
    fn invalid_fill_keeps_previous() {
        let doc = Document::new();
        let mut canvas = Canvas::new(&doc);
        canvas.set_size(4, 4, 4.0, 4.0);
        canvas.set_fill_style("#00ff00");
        canvas.set_fill_style("not-a-color");
        canvas.fill_circle(2.0, 2.0, 2.0);
        assert_eq!(canvas.pixels().get_pixel(2, 2), &Rgba([0, 255, 0, 255]));
    }
}
