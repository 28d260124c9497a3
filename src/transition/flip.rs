//! FLIP primitives: snapshot bounds, invert to a transform, play it forward.
//!
//! Nothing here touches the document. A [`FlipPlan`] pairs source and target
//! bounds, and each [`Tween`] can be sampled at any instant, so the
//! choreography and the renderer share one interpolation.

use std::time::Duration;

use tokio::time::Instant;

use super::TransitionError;

/// Element geometry in screen units (terminal cells for the TUI).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Translation plus non-uniform scale, with a top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub dx: f32,
    pub dy: f32,
    pub sx: f32,
    pub sy: f32,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        dx: 0.0,
        dy: 0.0,
        sx: 1.0,
        sy: 1.0,
    };

    /// The transform that maps `from` onto `to`.
    pub fn between(from: &Bounds, to: &Bounds) -> Self {
        Self {
            dx: to.left - from.left,
            dy: to.top - from.top,
            sx: to.width / from.width.max(f32::EPSILON),
            sy: to.height / from.height.max(f32::EPSILON),
        }
    }

    /// Apply a fraction `t` of this transform to `from`.
    pub fn apply(&self, from: &Bounds, t: f32) -> Bounds {
        Bounds {
            left: from.left + self.dx * t,
            top: from.top + self.dy * t,
            width: from.width * (1.0 + (self.sx - 1.0) * t),
            height: from.height * (1.0 + (self.sy - 1.0) * t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    /// CSS `cubic-bezier(x1, y1, x2, y2)`.
    CubicBezier(f32, f32, f32, f32),
}

/// `cubic-bezier(.2,.9,.25,1)`: fast start, long settle.
pub const FLIP_EASING: Easing = Easing::CubicBezier(0.2, 0.9, 0.25, 1.0);

impl Easing {
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Easing::Linear => t,
            Easing::CubicBezier(x1, y1, x2, y2) => {
                if t == 0.0 || t == 1.0 {
                    return t;
                }
                let s = solve_bezier_x(t, x1, x2);
                bezier(s, y1, y2)
            }
        }
    }
}

fn bezier(s: f32, p1: f32, p2: f32) -> f32 {
    let inv = 1.0 - s;
    3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
}

fn bezier_slope(s: f32, p1: f32, p2: f32) -> f32 {
    let inv = 1.0 - s;
    3.0 * inv * inv * p1 + 6.0 * inv * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

/// Parameter `s` whose curve x equals `x`.
fn solve_bezier_x(x: f32, x1: f32, x2: f32) -> f32 {
    const EPS: f32 = 1e-5;

    let mut s = x;
    for _ in 0..8 {
        let err = bezier(s, x1, x2) - x;
        if err.abs() < EPS {
            return s;
        }
        let slope = bezier_slope(s, x1, x2);
        if slope.abs() < 1e-6 {
            break;
        }
        s -= err / slope;
    }

    // Newton stalled; bisect.
    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    s = x;
    for _ in 0..32 {
        let value = bezier(s, x1, x2);
        if (value - x).abs() < EPS {
            break;
        }
        if value < x {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    s
}

/// Explicit source-to-target pairing. Only positional pairing exists; the
/// point is that a count mismatch is rejected before anything moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    len: usize,
}

impl Pairing {
    pub fn by_position(sources: usize, targets: usize) -> Result<Self, TransitionError> {
        if sources != targets {
            return Err(TransitionError::PairingMismatch { sources, targets });
        }
        Ok(Self { len: sources })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> {
        (0..self.len).map(|i| (i, i))
    }
}

/// One clone's motion from its source bounds to its target bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: Bounds,
    pub to: Bounds,
    pub transform: Transform,
    pub start: Instant,
    pub duration: Duration,
    pub easing: Easing,
    /// Corner radius at start and end.
    pub radius: (f32, f32),
}

impl Tween {
    /// Linear progress in `[0, 1]`.
    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    pub fn bounds_at(&self, now: Instant) -> Bounds {
        let t = self.easing.apply(self.progress(now));
        self.transform.apply(&self.from, t)
    }

    pub fn radius_at(&self, now: Instant) -> f32 {
        let t = self.easing.apply(self.progress(now));
        self.radius.0 + (self.radius.1 - self.radius.0) * t
    }
}

#[derive(Debug, Clone)]
pub struct FlipPlan {
    flips: Vec<(Bounds, Bounds)>,
    duration: Duration,
    easing: Easing,
}

impl FlipPlan {
    pub fn new(
        sources: &[Bounds],
        targets: &[Bounds],
        duration: Duration,
        easing: Easing,
    ) -> Result<Self, TransitionError> {
        let pairing = Pairing::by_position(sources.len(), targets.len())?;
        let flips = pairing
            .pairs()
            .map(|(s, t)| (sources[s], targets[t]))
            .collect();
        Ok(Self {
            flips,
            duration,
            easing,
        })
    }

    pub fn len(&self) -> usize {
        self.flips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flips.is_empty()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn tweens(&self, start: Instant, radius: (f32, f32)) -> Vec<Tween> {
        self.flips
            .iter()
            .map(|(from, to)| Tween {
                from: *from,
                to: *to,
                transform: Transform::between(from, to),
                start,
                duration: self.duration,
                easing: self.easing,
                radius,
            })
            .collect()
    }
}
