//! The two rendering strategies behind one contract. Chosen once when the
//! effect is built and never swapped afterwards.

pub mod canvas;
pub mod dom;

use rand::Rng;

use crate::config::Config;
use crate::fireworks::Task;
use crate::host::{HostSurface, NodeId};
use crate::scheduler::Scheduler;

pub use canvas::{Canvas, CanvasRenderer};
pub use dom::{DomRenderer, Overlay, ParticleId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    Canvas,
    Dom,
}

pub enum Renderer {
    Canvas(CanvasRenderer),
    Dom(DomRenderer),
}

/// Read-only view of the renderer's visual layer, for compositing.
pub enum LayerView<'a> {
    Canvas(&'a Canvas),
    Overlay(&'a Overlay),
}

impl Renderer {
    pub fn kind(&self) -> RendererKind {
        match self {
            Renderer::Canvas(_) => RendererKind::Canvas,
            Renderer::Dom(_) => RendererKind::Dom,
        }
    }

    /// Insert the renderer's root element as the host's first child.
    pub fn attach(&mut self, host: &mut HostSurface) {
        match self {
            Renderer::Canvas(r) => r.attach(host),
            Renderer::Dom(r) => r.attach(host),
        }
    }

    pub fn node(&self) -> Option<NodeId> {
        match self {
            Renderer::Canvas(r) => r.node(),
            Renderer::Dom(r) => r.node(),
        }
    }

    pub fn update_config(&mut self, config: &Config, host: &mut HostSurface) {
        match self {
            Renderer::Canvas(r) => r.update_config(config, host),
            Renderer::Dom(r) => r.update_config(config, host),
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        if let Renderer::Canvas(r) = self {
            r.resize(width, height);
        }
    }

    /// Whether the effect must drive a frame loop for this renderer.
    pub fn needs_frames(&self) -> bool {
        matches!(self, Renderer::Canvas(_))
    }

    pub fn start(&mut self, scheduler: &mut Scheduler<Task>) {
        if let Renderer::Canvas(r) = self {
            r.start(scheduler);
        }
    }

    pub fn stop(&mut self, scheduler: &mut Scheduler<Task>) {
        if let Renderer::Canvas(r) = self {
            r.stop(scheduler);
        }
    }

    pub fn burst<R: Rng>(
        &mut self,
        origin_x: f32,
        origin_y: f32,
        config: &Config,
        rng: &mut R,
        scheduler: &mut Scheduler<Task>,
    ) {
        match self {
            Renderer::Canvas(r) => r.burst(origin_x, origin_y, config, rng),
            Renderer::Dom(r) => r.burst(origin_x, origin_y, config, rng, scheduler),
        }
    }

    /// One display frame for the canvas loop.
    pub fn on_frame(&mut self, time: f64, scheduler: &mut Scheduler<Task>) {
        if let Renderer::Canvas(r) = self {
            r.on_frame(time, scheduler);
        }
    }

    pub fn kickoff(&mut self, id: ParticleId, now: f64) {
        if let Renderer::Dom(r) = self {
            r.kickoff(id, now);
        }
    }

    pub fn expire(&mut self, id: ParticleId) {
        if let Renderer::Dom(r) = self {
            r.expire(id);
        }
    }

    pub fn finish_transitions(&mut self, now: f64) -> usize {
        match self {
            Renderer::Dom(r) => r.finish_transitions(now),
            Renderer::Canvas(_) => 0,
        }
    }

    pub fn destroy(&mut self, host: &mut HostSurface, scheduler: &mut Scheduler<Task>) {
        match self {
            Renderer::Canvas(r) => r.destroy(host, scheduler),
            Renderer::Dom(r) => r.destroy(host),
        }
    }

    /// Live particles (canvas) or live nodes (dom).
    pub fn particle_count(&self) -> usize {
        match self {
            Renderer::Canvas(r) => r.particles().len(),
            Renderer::Dom(r) => r.overlay().len(),
        }
    }

    pub fn layer(&self) -> LayerView<'_> {
        match self {
            Renderer::Canvas(r) => LayerView::Canvas(r.canvas()),
            Renderer::Dom(r) => LayerView::Overlay(r.overlay()),
        }
    }
}
