//! Effect controller: owns the host attachment, picks a renderer once, and
//! drives the burst timer, the size-poll timer and (for the canvas path) the
//! frame loop.
//!
//! Everything runs on one thread. Every callback checks `destroyed` first,
//! since a cancelled timer may already have been popped for dispatch, and
//! `destroy` may be reached from inside any callback.

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{Config, PartialConfig};
use crate::document::Document;
use crate::host::{HostHandle, Position, ZIndex};
use crate::renderer::{CanvasRenderer, DomRenderer, LayerView, ParticleId, Renderer, RendererKind};
use crate::scheduler::{Scheduler, TimerId};
use crate::styles::ensure_styles;

/// Everything that can come due on the effect's scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    SizePoll,
    Burst,
    /// Canvas render loop.
    Frame,
    /// Commit a dom particle's end state.
    Kickoff(ParticleId),
    /// Safety-net removal of a dom particle.
    Expire(ParticleId),
}

static DOM_FALLBACK_WARNED: AtomicBool = AtomicBool::new(false);

/// Emits the fallback advisory once per process. Returns whether it did.
fn warn_dom_fallback() -> bool {
    if DOM_FALLBACK_WARNED.swap(true, Ordering::Relaxed) {
        return false;
    }
    warn!(
        "[fireworks] Canvas not available or disabled. Using DOM particles which may impact performance on heavy pages."
    );
    true
}

/// Canvas when asked for and possible, otherwise per-element nodes.
fn select_renderer(config: &Config, document: &Rc<Document>) -> Renderer {
    if config.use_canvas && document.supports_canvas() {
        match CanvasRenderer::new(config, document.clone()) {
            Ok(r) => return Renderer::Canvas(r),
            Err(e) => debug!("canvas renderer failed: {e}"),
        }
    }
    warn_dom_fallback();
    Renderer::Dom(DomRenderer::new(config))
}

pub struct Fireworks {
    host: HostHandle,
    document: Rc<Document>,
    config: Config,
    renderer: Option<Renderer>,
    scheduler: Scheduler<Task>,
    rng: StdRng,
    burst_timer: Option<TimerId>,
    size_timer: Option<TimerId>,
    width: f32,
    height: f32,
    // Outer `Some` = we took over the property; inner = the inline value
    // it had before.
    prior_position: Option<Option<Position>>,
    prior_z_index: Option<Option<ZIndex>>,
    destroyed: bool,
}

impl Fireworks {
    pub fn new(host: HostHandle, config: &PartialConfig) -> Self {
        Self::with_rng(host, config, StdRng::from_os_rng())
    }

    /// Deterministic bursts, for tests and reproducible demos.
    pub fn with_seed(host: HostHandle, config: &PartialConfig, seed: u64) -> Self {
        Self::with_rng(host, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(host: HostHandle, partial: &PartialConfig, rng: StdRng) -> Self {
        let config = Config::merged(partial);
        let document = host.borrow().document().clone();
        ensure_styles(&document);

        let mut fx = Self {
            host,
            document,
            config,
            renderer: None,
            scheduler: Scheduler::new(0.0),
            rng,
            burst_timer: None,
            size_timer: None,
            width: 0.0,
            height: 0.0,
            prior_position: None,
            prior_z_index: None,
            destroyed: false,
        };
        fx.claim_host_style();

        let mut renderer = select_renderer(&fx.config, &fx.document);
        renderer.attach(&mut fx.host.borrow_mut());
        debug!("fireworks created with {:?} renderer", renderer.kind());
        fx.renderer = Some(renderer);

        fx.update_size();
        fx.start();
        fx
    }

    /// Take over `position` / `z-index` only when they are at their initial
    /// values, remembering the inline values for `destroy`.
    fn claim_host_style(&mut self) {
        let mut host = self.host.borrow_mut();
        if host.computed_position() == Position::Static {
            self.prior_position = Some(host.inline.position);
            host.inline.position = Some(Position::Relative);
        }
        if host.computed_z_index() == ZIndex::Auto {
            self.prior_z_index = Some(host.inline.z_index);
            host.inline.z_index = Some(ZIndex::Value(0));
        }
    }

    fn host_attached(&self) -> bool {
        self.host.borrow().is_attached()
    }

    pub fn start(&mut self) {
        if self.destroyed || self.burst_timer.is_some() || self.size_timer.is_some() {
            return;
        }
        if !self.host_attached() {
            info!("host detached before start, destroying");
            self.destroy();
            return;
        }

        self.size_timer = Some(
            self.scheduler
                .set_interval(self.config.size_check_interval_ms as f64, Task::SizePoll),
        );
        self.burst_timer =
            Some(self.scheduler.set_interval(self.config.burst_interval_ms as f64, Task::Burst));

        if let Some(renderer) = &mut self.renderer {
            if renderer.needs_frames() {
                renderer.start(&mut self.scheduler);
            }
        }
        debug!("fireworks started");
    }

    pub fn stop(&mut self) {
        if self.destroyed {
            return;
        }
        if let Some(id) = self.burst_timer.take() {
            self.scheduler.clear(id);
        }
        if let Some(id) = self.size_timer.take() {
            self.scheduler.clear(id);
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.stop(&mut self.scheduler);
        }
    }

    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.stop();

        let mut host = self.host.borrow_mut();
        if let Some(mut renderer) = self.renderer.take() {
            renderer.destroy(&mut host, &mut self.scheduler);
        }
        if let Some(prior) = self.prior_position.take() {
            host.inline.position = prior;
        }
        if let Some(prior) = self.prior_z_index.take() {
            host.inline.z_index = prior;
        }
        drop(host);

        // Pending dom particle timeouts would be no-ops anyway.
        self.scheduler.clear_all();
        self.destroyed = true;
        debug!("fireworks destroyed");
    }

    /// Replace the configuration. The renderer strategy is kept; running
    /// timers are re-armed when an interval changed.
    pub fn update_config(&mut self, partial: &PartialConfig) {
        if self.destroyed {
            return;
        }
        let next = Config::merged(partial);
        let intervals_changed = next.burst_interval_ms != self.config.burst_interval_ms
            || next.size_check_interval_ms != self.config.size_check_interval_ms;
        self.config = next;

        if let Some(renderer) = &mut self.renderer {
            renderer.update_config(&self.config, &mut self.host.borrow_mut());
        }

        if intervals_changed && self.is_running() {
            self.stop();
            self.start();
        }
    }

    /// Size-poll tick: re-measure the host and pass the size on.
    pub fn update_size(&mut self) {
        if self.destroyed {
            return;
        }
        if !self.host_attached() {
            info!("host detached, destroying");
            self.destroy();
            return;
        }
        let (width, height) = self.host.borrow().bounding_box();
        self.width = width;
        self.height = height;
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(width, height);
        }
    }

    /// Burst tick: fire one burst at a random point inside the host.
    pub fn burst(&mut self) {
        if self.destroyed || self.width == 0.0 || self.height == 0.0 {
            return;
        }
        if !self.host_attached() {
            info!("host detached, destroying");
            self.destroy();
            return;
        }
        if self.document.is_hidden() {
            return;
        }

        let origin_x = self.rng.random::<f32>() * self.width;
        let origin_y = self.rng.random::<f32>() * self.height;
        trace!("burst at ({origin_x:.1}, {origin_y:.1})");
        if let Some(renderer) = &mut self.renderer {
            renderer.burst(origin_x, origin_y, &self.config, &mut self.rng, &mut self.scheduler);
        }
    }

    fn dispatch(&mut self, task: Task) {
        if self.destroyed {
            return;
        }
        let now = self.scheduler.now();
        match task {
            Task::SizePoll => self.update_size(),
            Task::Burst => self.burst(),
            Task::Frame => {
                if !self.host_attached() {
                    info!("host detached, destroying");
                    self.destroy();
                    return;
                }
                if let Some(renderer) = &mut self.renderer {
                    renderer.on_frame(now, &mut self.scheduler);
                }
            }
            Task::Kickoff(id) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.kickoff(id, now);
                }
            }
            Task::Expire(id) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.expire(id);
                }
            }
        }
    }

    /// Fire every timer due up to `time_ms`, in order.
    pub fn advance_to(&mut self, time_ms: f64) {
        while !self.destroyed {
            let Some(task) = self.scheduler.next_due(time_ms) else {
                break;
            };
            self.dispatch(task);
        }
        self.scheduler.advance_clock(time_ms);
    }

    /// One display refresh at `time_ms`: due timers, finished transitions,
    /// then the frame callbacks requested before this frame.
    pub fn animation_frame(&mut self, time_ms: f64) {
        self.advance_to(time_ms);
        if self.destroyed {
            return;
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.finish_transitions(time_ms);
        }
        for task in self.scheduler.take_frames(time_ms) {
            self.dispatch(task);
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn is_running(&self) -> bool {
        self.burst_timer.is_some() || self.size_timer.is_some()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    pub fn host(&self) -> &HostHandle {
        &self.host
    }

    pub fn renderer_kind(&self) -> Option<RendererKind> {
        self.renderer.as_ref().map(Renderer::kind)
    }

    pub fn particle_count(&self) -> usize {
        self.renderer.as_ref().map_or(0, Renderer::particle_count)
    }

    pub fn layer(&self) -> Option<LayerView<'_>> {
        self.renderer.as_ref().map(Renderer::layer)
    }

    pub fn layer_node(&self) -> Option<crate::host::NodeId> {
        self.renderer.as_ref().and_then(Renderer::node)
    }
}

impl Drop for Fireworks {
    fn drop(&mut self) {
        self.destroy();
    }
}
