/// A CSS-style cubic Bezier easing curve through (0, 0) and (1, 1).
///
/// `x1` and `x2` must lie in `[0, 1]` so the curve is a function of x;
/// `y1` and `y2` are unrestricted, which lets the output leave `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

/// Curve used to skew meters toward the first spots of the list.
pub const SPOT_EASING: CubicBezier = CubicBezier::new(0.01, 0.57, 1.0, -0.21);

const MAX_ITERATIONS: usize = 64;
const EPSILON: f64 = 1e-9;

impl CubicBezier {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Map `x` in `[0, 1]` to the eased value. Inputs outside that range are clamped.
    pub fn ease(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }
        let t = self.solve_t(x);
        bezier(t, self.y1, self.y2)
    }

    // x(t) is monotonic on [0, 1] for x1, x2 in [0, 1], so bisection converges.
    fn solve_t(&self, x: f64) -> f64 {
        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        let mut t = x;
        for _ in 0..MAX_ITERATIONS {
            let current = bezier(t, self.x1, self.x2);
            if (current - x).abs() < EPSILON {
                break;
            }
            if current < x {
                lo = t;
            } else {
                hi = t;
            }
            t = (lo + hi) / 2.0;
        }
        t
    }
}

/// One coordinate of the curve at parameter `t`, given both control points' coordinate.
fn bezier(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * t + b) * t + c) * t
}
