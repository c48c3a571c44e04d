//! Immediate-mode particle state and its per-frame update rule.

/// Shrink applied at the end of a particle's life (scale goes 1.0 -> 0.2).
pub const END_SHRINK: f32 = 0.8;

/// One spark. Visual: a filled dot that drifts outward, shrinks and fades.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    /// Velocity in px/sec, constant for the particle's lifetime.
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
    pub color: String,
    /// Milliseconds since creation.
    pub age: f32,
    /// Total milliseconds this particle may live.
    pub life: f32,
}

impl Particle {
    /// `age / life` clamped into `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.life <= 0.0 {
            return 1.0;
        }
        (self.age / self.life).clamp(0.0, 1.0)
    }

    pub fn radius(&self) -> f32 {
        (self.size / 2.0) * (1.0 - END_SHRINK * self.progress())
    }

    pub fn opacity(&self) -> f32 {
        1.0 - self.progress()
    }

    pub fn expired(&self) -> bool {
        self.age >= self.life
    }

    /// Age and move by `delta_ms`. Returns false once the particle has
    /// reached its life; such a particle must not be drawn.
    pub fn step(&mut self, delta_ms: f32) -> bool {
        self.age += delta_ms;
        if self.expired() {
            return false;
        }
        let dt = delta_ms / 1000.0;
        self.x += self.vx * dt;
        self.y += self.vy * dt;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spark(life: f32) -> Particle {
        Particle {
            x: 0.0,
            y: 0.0,
            vx: 100.0,
            vy: -50.0,
            size: 10.0,
            color: "#fff".into(),
            age: 0.0,
            life,
        }
    }

    #[test]
    fn step_integrates_velocity() {
        let mut p = spark(1000.0);
        assert!(p.step(500.0));
        assert!((p.x - 50.0).abs() < 1e-4);
        assert!((p.y + 25.0).abs() < 1e-4);
        assert!((p.progress() - 0.5).abs() < 1e-6);
        assert!((p.opacity() - 0.5).abs() < 1e-6);
        assert!((p.radius() - 5.0 * 0.6).abs() < 1e-5);
    }

    #[test]
    fn reaching_life_exactly_expires() {
        let mut p = spark(100.0);
        assert!(!p.step(100.0));
        assert!(p.expired());
    }

    #[test]
    fn overshooting_life_expires() {
        let mut p = spark(100.0);
        assert!(p.step(60.0));
        assert!(!p.step(60.0));
    }
}
