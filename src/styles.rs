// Shared style sheet the per-element renderer depends on.
// Visual: overlay covers the host without catching input; particle nodes are
// round and animate transform (eased) + opacity (linear).

use crate::document::Document;

pub const STYLE_ID: &str = "fw-styles";

/// `cubic-bezier(x1, y1, x2, y2)` timing function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl CubicBezier {
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    fn axis(p1: f32, p2: f32, t: f32) -> f32 {
        let u = 1.0 - t;
        3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t
    }

    /// Eased output for input progress `x` in `[0, 1]`.
    pub fn eval(&self, x: f32) -> f32 {
        let x = x.clamp(0.0, 1.0);
        if x == 0.0 || x == 1.0 {
            return x;
        }
        // x(t) is monotonic for x1, x2 in [0, 1]; bisection is enough.
        let (mut lo, mut hi) = (0.0f32, 1.0f32);
        let mut t = x;
        for _ in 0..32 {
            let cx = Self::axis(self.x1, self.x2, t);
            if (cx - x).abs() < 1e-5 {
                break;
            }
            if cx < x { lo = t } else { hi = t }
            t = (lo + hi) / 2.0;
        }
        Self::axis(self.y1, self.y2, t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    Bezier(CubicBezier),
}

impl Easing {
    pub fn eval(&self, x: f32) -> f32 {
        match self {
            Easing::Linear => x.clamp(0.0, 1.0),
            Easing::Bezier(b) => b.eval(x),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRule {
    pub class_name: &'static str,
    pub clip_to_host: bool,
    pub pointer_events: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticleRule {
    pub class_name: &'static str,
    pub round: bool,
    pub transform_easing: Easing,
    pub opacity_easing: Easing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleSheet {
    pub id: &'static str,
    pub overlay: OverlayRule,
    pub particle: ParticleRule,
}

impl StyleSheet {
    pub fn fireworks() -> Self {
        Self {
            id: STYLE_ID,
            overlay: OverlayRule { class_name: "fw-overlay", clip_to_host: true, pointer_events: false },
            particle: ParticleRule {
                class_name: "fw-particle",
                round: true,
                transform_easing: Easing::Bezier(CubicBezier::new(0.1, 0.8, 0.3, 1.0)),
                opacity_easing: Easing::Linear,
            },
        }
    }
}

/// Register the shared sheet once per document; later calls are no-ops.
pub fn ensure_styles(document: &Document) {
    if document.style_sheet(STYLE_ID).is_some() {
        return;
    }
    document.insert_style_sheet(StyleSheet::fireworks());
}
