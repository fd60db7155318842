//! Mover motion and overlap tests

/// Physics system for moving circles around a rectangular world
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Advance one coordinate by its velocity over `dt` seconds, then keep the
    /// circle of `radius` fully inside `[0, bound]`.
    pub fn step_axis(position: f64, velocity: f64, dt: f64, radius: f64, bound: f64) -> f64 {
        Self::clamp_axis(position + velocity * dt, radius, bound)
    }

    /// Clamp a coordinate to `[radius, bound - radius]`.
    ///
    /// A bound narrower than the circle pins it to the centre of the axis.
    pub fn clamp_axis(position: f64, radius: f64, bound: f64) -> f64 {
        let min = radius;
        let max = bound - radius;
        if max < min {
            return bound / 2.0;
        }
        position.clamp(min, max)
    }

    /// Strict circle overlap: touching circles do not collide
    pub fn circles_overlap(x1: f64, y1: f64, r1: f64, x2: f64, y2: f64, r2: f64) -> bool {
        let dx = x2 - x1;
        let dy = y2 - y1;
        (dx * dx + dy * dy).sqrt() < r1 + r2
    }
}
