// Per-element renderer: every spark is its own overlay node that animates
// towards a precomputed end state and then removes itself. No particle
// population, no render loop.
// Visual: same burst shape as the canvas path, driven by style transitions.

use log::trace;
use rand::Rng;

use crate::burst;
use crate::config::Config;
use crate::fireworks::Task;
use crate::host::{Element, HostSurface, NodeId};
use crate::particle::END_SHRINK;
use crate::scheduler::Scheduler;
use crate::styles::ParticleRule;

/// Slack added to the safety-net removal timeout.
pub const REMOVAL_SLACK_MS: u32 = 20;

pub const OVERLAY_CLASS: &str = "fw-overlay";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticleId(u64);

/// One animated spark node.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleNode {
    pub id: ParticleId,
    /// Top-left corner, at the burst origin.
    pub left: f32,
    pub top: f32,
    pub size: f32,
    pub color: String,
    pub duration_ms: u32,
    /// Translation reached at the end of the transition.
    pub offset: (f32, f32),
    /// When the end state was committed; `None` until kick-off.
    pub transition_start: Option<f64>,
}

/// Where a node is at some instant: centre, radius, opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeVisual {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
    pub opacity: f32,
}

impl ParticleNode {
    pub fn transition_done(&self, now: f64) -> bool {
        self.transition_start.is_some_and(|start| now >= start + self.duration_ms as f64)
    }

    /// Visual state at `now`. Without style rules there is no transition, so
    /// nodes sit at their start state.
    pub fn visual_at(&self, now: f64, rules: Option<&ParticleRule>) -> NodeVisual {
        let (moved, faded) = match (self.transition_start, rules) {
            (Some(start), Some(rule)) => {
                let t = if self.duration_ms == 0 {
                    1.0
                } else {
                    ((now - start) / self.duration_ms as f64).clamp(0.0, 1.0) as f32
                };
                (rule.transform_easing.eval(t), rule.opacity_easing.eval(t))
            }
            _ => (0.0, 0.0),
        };
        let half = self.size / 2.0;
        NodeVisual {
            cx: self.left + half + self.offset.0 * moved,
            cy: self.top + half + self.offset.1 * moved,
            radius: half * (1.0 - END_SHRINK * moved),
            opacity: 1.0 - faded,
        }
    }
}

/// Overlay element holding live particle nodes in insertion order.
#[derive(Debug, Default)]
pub struct Overlay {
    nodes: Vec<ParticleNode>,
    next_id: u64,
}

impl Overlay {
    fn push(&mut self, mut node: ParticleNode) -> ParticleId {
        self.next_id += 1;
        node.id = ParticleId(self.next_id);
        let id = node.id;
        self.nodes.push(node);
        id
    }

    /// Removing a node that is already gone is fine.
    pub fn remove(&mut self, id: ParticleId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        before != self.nodes.len()
    }

    pub fn nodes(&self) -> &[ParticleNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub struct DomRenderer {
    overlay: Overlay,
    node: Option<NodeId>,
    z_index: i32,
}

impl DomRenderer {
    pub fn new(config: &Config) -> Self {
        Self { overlay: Overlay::default(), node: None, z_index: config.z_index }
    }

    pub fn attach(&mut self, host: &mut HostSurface) {
        self.node = Some(host.insert_first(Element::new(OVERLAY_CLASS).with_z_index(self.z_index)));
    }

    pub fn update_config(&mut self, config: &Config, host: &mut HostSurface) {
        self.z_index = config.z_index;
        if let Some(node) = self.node {
            host.set_child_z_index(node, config.z_index);
        }
    }

    /// Create one node per spark at the origin. The end state is committed
    /// on the next animation frame so the start state renders first; removal
    /// happens on transition end or after `duration + 20` ms, whichever is
    /// observed first.
    pub fn burst<R: Rng>(
        &mut self,
        origin_x: f32,
        origin_y: f32,
        config: &Config,
        rng: &mut R,
        scheduler: &mut Scheduler<Task>,
    ) {
        let sparks = burst::sample(rng, config);
        trace!("dom burst: {} nodes at ({origin_x:.1}, {origin_y:.1})", sparks.len());
        for spark in sparks {
            let offset = spark.displacement();
            let id = self.overlay.push(ParticleNode {
                id: ParticleId(0),
                left: origin_x,
                top: origin_y,
                size: spark.size as f32,
                color: spark.color,
                duration_ms: spark.duration_ms,
                offset,
                transition_start: None,
            });
            scheduler.request_frame(Task::Kickoff(id));
            scheduler.set_timeout(
                spark.duration_ms as f64 + REMOVAL_SLACK_MS as f64,
                Task::Expire(id),
            );
        }
    }

    /// Commit a node's end state, starting its transition.
    pub fn kickoff(&mut self, id: ParticleId, now: f64) {
        if let Some(node) = self.overlay.nodes.iter_mut().find(|n| n.id == id) {
            node.transition_start.get_or_insert(now);
        }
    }

    /// Safety-net removal.
    pub fn expire(&mut self, id: ParticleId) {
        self.overlay.remove(id);
    }

    /// Remove nodes whose fade has completed by `now` (the transition-end
    /// observation). Returns how many went.
    pub fn finish_transitions(&mut self, now: f64) -> usize {
        let before = self.overlay.len();
        self.overlay.nodes.retain(|n| !n.transition_done(now));
        before - self.overlay.len()
    }

    /// Dropping the overlay takes any still-animating nodes with it.
    pub fn destroy(&mut self, host: &mut HostSurface) {
        if let Some(node) = self.node.take() {
            host.remove(node);
        }
        self.overlay.nodes.clear();
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PartialConfig, PartialSpan};
    use crate::document::Document;
    use crate::styles::StyleSheet;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config(count: u32, duration: u32) -> Config {
        Config::merged(&PartialConfig {
            particle_count: Some(PartialSpan { min: Some(count), max: Some(count) }),
            duration_ms: Some(PartialSpan { min: Some(duration), max: Some(duration) }),
            colors: Some(vec!["#fff".into(), "#000".into()]),
            ..Default::default()
        })
    }

    fn drain(s: &mut Scheduler<Task>, until: f64) -> Vec<Task> {
        let mut out = Vec::new();
        while let Some(t) = s.next_due(until) {
            out.push(t);
        }
        out
    }

    #[test]
    fn burst_creates_nodes_and_schedules_both_removals() {
        let cfg = config(4, 1000);
        let mut r = DomRenderer::new(&cfg);
        let mut sched = Scheduler::new(0.0);
        r.burst(30.0, 40.0, &cfg, &mut StdRng::seed_from_u64(5), &mut sched);

        assert_eq!(r.overlay().len(), 4);
        assert_eq!(sched.pending_frames(), 4);
        assert_eq!(sched.pending_timers(), 4);
        for (i, n) in r.overlay().nodes().iter().enumerate() {
            assert_eq!((n.left, n.top), (30.0, 40.0));
            assert_eq!(n.color, cfg.colors[i % 2]);
            assert!(n.transition_start.is_none());
        }
    }

    #[test]
    fn kickoff_then_transition_end_removes() {
        let cfg = config(3, 1000);
        let mut r = DomRenderer::new(&cfg);
        let mut sched = Scheduler::new(0.0);
        r.burst(0.0, 0.0, &cfg, &mut StdRng::seed_from_u64(6), &mut sched);

        for task in sched.take_frames(16.0) {
            if let Task::Kickoff(id) = task {
                r.kickoff(id, 16.0);
            }
        }
        let longest = r.overlay().nodes().iter().map(|n| n.duration_ms).max().unwrap();
        assert_eq!(r.finish_transitions(16.0), 0);
        assert_eq!(r.finish_transitions(16.0 + longest as f64), 3);
        assert!(r.overlay().is_empty());

        // The safety-net timeouts still fire; they must be harmless now.
        for task in drain(&mut sched, 10_000.0) {
            if let Task::Expire(id) = task {
                r.expire(id);
            }
        }
        assert!(r.overlay().is_empty());
    }

    #[test]
    fn timeout_removes_nodes_that_never_started() {
        let cfg = config(2, 500);
        let mut r = DomRenderer::new(&cfg);
        let mut sched = Scheduler::new(0.0);
        r.burst(0.0, 0.0, &cfg, &mut StdRng::seed_from_u64(7), &mut sched);

        let shortest = r.overlay().nodes().iter().map(|n| n.duration_ms).min().unwrap();
        assert!(drain(&mut sched, (shortest + REMOVAL_SLACK_MS) as f64 - 1.0).is_empty());
        for task in drain(&mut sched, 10_000.0) {
            if let Task::Expire(id) = task {
                r.expire(id);
            }
        }
        assert!(r.overlay().is_empty());
    }

    #[test]
    fn visual_moves_shrinks_and_fades() {
        let rules = StyleSheet::fireworks().particle;
        let node = ParticleNode {
            id: ParticleId(1),
            left: 10.0,
            top: 10.0,
            size: 10.0,
            color: "#fff".into(),
            duration_ms: 1000,
            offset: (100.0, 0.0),
            transition_start: Some(0.0),
        };
        let start = node.visual_at(0.0, Some(&rules));
        assert_eq!((start.cx, start.cy, start.radius, start.opacity), (15.0, 15.0, 5.0, 1.0));

        let end = node.visual_at(1000.0, Some(&rules));
        assert!((end.cx - 115.0).abs() < 1e-3);
        assert!((end.radius - 1.0).abs() < 1e-4);
        assert_eq!(end.opacity, 0.0);

        let unstyled = node.visual_at(1000.0, None);
        assert_eq!(unstyled.opacity, 1.0);
    }

    #[test]
    fn longest_durations_schedule_without_overflow() {
        let cfg = config(2, u32::MAX);
        let mut r = DomRenderer::new(&cfg);
        let mut sched = Scheduler::new(0.0);
        r.burst(0.0, 0.0, &cfg, &mut StdRng::seed_from_u64(9), &mut sched);

        assert_eq!(r.overlay().len(), 2);
        assert_eq!(sched.pending_timers(), 2);
        assert!(drain(&mut sched, 1.0e9).is_empty());
    }

    #[test]
    fn destroy_detaches_overlay() {
        let cfg = config(3, 1000);
        let mut host = HostSurface::new(Document::new(), 10.0, 10.0);
        let mut r = DomRenderer::new(&cfg);
        let mut sched = Scheduler::new(0.0);
        r.attach(&mut host);
        assert_eq!(host.child(r.node().unwrap()).unwrap().z_index, Some(1));
        r.burst(0.0, 0.0, &cfg, &mut StdRng::seed_from_u64(8), &mut sched);

        r.destroy(&mut host);
        assert_eq!(host.child_count(), 0);
        assert!(r.overlay().is_empty());
    }
}
