//! Per-frame particle mutation.
//!
//! Affectors run once per [`ParticleSystem::update`](crate::ParticleSystem::update),
//! in registration order, after expired particles have been reaped and the
//! survivors aged. Each affector sees every live particle, oldest first.
//!
//! Affectors receive a slice, so they can move particles, rewrite their
//! attributes or shorten their lifetimes, but can never add or remove
//! particles. Growing and shrinking the collection belongs to the system.
//!
//! # Built-in Affectors
//!
//! | Type | Effect |
//! |------|--------|
//! | [`Drift`] | Constant velocity for every particle |
//! | [`Swirl`] | Rotation around a fixed center |
//! | [`FollowPath`] | Places particles along a polyline by age |
//!
//! # Closures
//!
//! Any `FnMut(&mut [Particle<A>], Duration)` is an affector:
//!
//! ```ignore
//! system.add_affector(|particles: &mut [Particle], _dt: Duration| {
//!     for p in particles {
//!         p.position += Vec2::ONE;
//!     }
//! });
//! ```

use std::time::Duration;

use glam::Vec2;

use crate::Particle;

/// A mutation applied to the whole live collection once per update tick.
pub trait Affector<A> {
    fn affect(&mut self, particles: &mut [Particle<A>], dt: Duration);
}

impl<A, F> Affector<A> for F
where
    F: FnMut(&mut [Particle<A>], Duration),
{
    fn affect(&mut self, particles: &mut [Particle<A>], dt: Duration) {
        self(particles, dt)
    }
}

/// Moves every particle at a constant velocity (world units per second).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drift {
    pub velocity: Vec2,
}

impl Drift {
    pub fn new(velocity: Vec2) -> Self {
        Self { velocity }
    }
}

impl<A> Affector<A> for Drift {
    fn affect(&mut self, particles: &mut [Particle<A>], dt: Duration) {
        let step = self.velocity * dt.as_secs_f32();
        for p in particles {
            p.position += step;
        }
    }
}

/// Rotates every particle around `center` at `angular_velocity` radians per
/// second. Positive values turn counter-clockwise in a y-up frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swirl {
    pub center: Vec2,
    pub angular_velocity: f32,
}

impl Swirl {
    pub fn new(center: Vec2, angular_velocity: f32) -> Self {
        Self {
            center,
            angular_velocity,
        }
    }
}

impl<A> Affector<A> for Swirl {
    fn affect(&mut self, particles: &mut [Particle<A>], dt: Duration) {
        let rotation = Vec2::from_angle(self.angular_velocity * dt.as_secs_f32());
        for p in particles {
            p.position = self.center + rotation.rotate(p.position - self.center);
        }
    }
}

/// Places each particle on a polyline according to its age.
///
/// A particle's age is `reference_lifetime - lifetime`; it advances one path
/// point every `1 / points_per_second` seconds and wraps at the end of the
/// path, so particles of different ages trace the path as a moving trail.
/// `offset` is added to the path point, which lets several systems share one
/// path side by side.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowPath {
    points: Vec<Vec2>,
    points_per_second: f32,
    reference_lifetime: f32,
    pub offset: Vec2,
}

impl FollowPath {
    /// Follow `points`, usually with `reference_lifetime` set to the owning
    /// system's default lifetime.
    ///
    /// An empty path leaves particles untouched.
    pub fn new(points: Vec<Vec2>, points_per_second: f32, reference_lifetime: Duration) -> Self {
        Self {
            points,
            points_per_second: points_per_second.max(0.0),
            reference_lifetime: reference_lifetime.as_secs_f32(),
            offset: Vec2::ZERO,
        }
    }

    /// Like [`FollowPath::new`], densifying the path first with
    /// [`interpolate`].
    pub fn interpolated(
        points: &[Vec2],
        subdivisions: usize,
        points_per_second: f32,
        reference_lifetime: Duration,
    ) -> Self {
        Self::new(interpolate(points, subdivisions), points_per_second, reference_lifetime)
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Path index for a particle with `lifetime` seconds left.
    fn index_for(&self, lifetime: f32) -> usize {
        let age = (self.reference_lifetime - lifetime).max(0.0);
        (age * self.points_per_second) as usize % self.points.len()
    }
}

impl<A> Affector<A> for FollowPath {
    fn affect(&mut self, particles: &mut [Particle<A>], _dt: Duration) {
        if self.points.is_empty() {
            return;
        }
        for p in particles {
            p.position = self.points[self.index_for(p.lifetime)] + self.offset;
        }
    }
}

/// Insert `subdivisions` evenly spaced points between each consecutive pair.
///
/// `interpolate(&[a, b], 1)` yields `[a, (a + b) / 2, b]`.
pub fn interpolate(points: &[Vec2], subdivisions: usize) -> Vec<Vec2> {
    let Some(first) = points.first() else {
        return Vec::new();
    };

    let mut dense = Vec::with_capacity(points.len() + (points.len() - 1) * subdivisions);
    dense.push(*first);
    for pair in points.windows(2) {
        let (left, right) = (pair[0], pair[1]);
        let step = (right - left) / (subdivisions + 1) as f32;
        for i in 1..=subdivisions {
            dense.push(left + step * i as f32);
        }
        dense.push(right);
    }
    dense
}
