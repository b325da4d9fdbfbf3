//! Rate-controlled particle emission.
//!
//! An [`Emitter`] turns elapsed time into new particles at a fixed rate,
//! independent of frame timing: a long frame emits several particles to
//! catch up, a short frame may emit none. Each new particle starts as a copy
//! of the emitter's default particle placed at the emitter position, then
//! passes through the emitter's modifiers in registration order.
//!
//! Modifiers see the emitter's own [`EmitterState`] and may move it, which
//! is how orbiting or sweeping emission points are built.
//!
//! # Built-in Modifiers
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Orbit`] | Moves the emitter around a center by a fixed angle per particle |
//! | [`Scatter`] | Random offset within a radius |
//! | [`Band`] | Spreads successive particles along a line segment |
//!
//! # Example
//!
//! ```ignore
//! let system = Rc::new(RefCell::new(ParticleSystem::new(texture, Duration::from_secs(2), Color::ORANGE, ())?));
//!
//! let mut emitter = Emitter::new(Particle::new(Vec2::ZERO, 2.0, ()))?;
//! emitter.set_emission_rate(500.0)?;
//! emitter.state_mut().position = Vec2::new(400.0, 300.0);
//! emitter.add_modifier(Orbit::new(Vec2::new(400.0, 300.0), 0.05));
//! emitter.add_modifier(Scatter::new(4.0));
//! emitter.set_particle_system(Some(system.clone()));
//!
//! // Once per frame, after the system's update:
//! emitter.update(dt);
//! ```

use std::cell::RefCell;
use std::f32::consts::TAU;
use std::rc::Rc;
use std::time::Duration;

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::ConfigError;
use crate::{Attributes, Particle, ParticleSystem};

/// Default emission rate in particles per second.
pub const DEFAULT_RATE: f32 = 300.0;

/// Default seed for the emitter's random source.
pub const DEFAULT_SEED: u64 = 0x6d6f_7465;

/// A particle system shared between its host and an emitter.
pub type SharedSystem<A> = Rc<RefCell<ParticleSystem<A>>>;

/// A construction hook run once for every particle an emitter creates.
pub trait ParticleModifier<A> {
    fn modify(&mut self, particle: &mut Particle<A>, emitter: &mut EmitterState);
}

impl<A, F> ParticleModifier<A> for F
where
    F: FnMut(&mut Particle<A>, &mut EmitterState),
{
    fn modify(&mut self, particle: &mut Particle<A>, emitter: &mut EmitterState) {
        self(particle, emitter)
    }
}

/// The part of an emitter that modifiers may read and change.
///
/// Holds the emitter transform, a running count of emitted particles and the
/// emitter's random source. The random source is seeded explicitly, so two
/// emitters built with the same seed and fed the same `dt` sequence produce
/// identical particles.
#[derive(Debug, Clone)]
pub struct EmitterState {
    /// Emission point in world space.
    pub position: Vec2,
    /// Emitter orientation in radians, for modifiers that aim particles.
    pub rotation: f32,
    emitted: u64,
    rng: SmallRng,
}

impl EmitterState {
    fn new(seed: u64) -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            emitted: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Particles emitted so far, not counting the one being modified.
    #[inline]
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    // ========== Random primitives ==========

    /// Random f32 between 0.0 and 1.0.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in `min..max`. Returns `min` for an empty range.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        if min < max {
            self.rng.gen_range(min..max)
        } else {
            min
        }
    }

    /// Random i32 in `min..=max`.
    #[inline]
    pub fn random_int(&mut self, min: i32, max: i32) -> i32 {
        self.rng.gen_range(min..=max.max(min))
    }

    // ========== Position helpers ==========

    /// Random point inside a circle of given radius, centered at origin.
    ///
    /// Distribution is uniform over the area.
    pub fn random_in_circle(&mut self, radius: f32) -> Vec2 {
        let theta = self.rng.gen_range(0.0..TAU);
        // Square root for uniform area distribution
        let r = radius * self.rng.gen::<f32>().sqrt();
        Vec2::from_angle(theta) * r
    }

    /// Random point on a circle of given radius, centered at origin.
    pub fn random_on_circle(&mut self, radius: f32) -> Vec2 {
        let theta = self.rng.gen_range(0.0..TAU);
        Vec2::from_angle(theta) * radius
    }
}

/// Fixed-rate generator of particles for a [`ParticleSystem`].
pub struct Emitter<A: Attributes = ()> {
    default_particle: Particle<A>,
    rate: f32,
    /// Time since the current rate took effect.
    elapsed: Duration,
    /// Particles emitted since the current rate took effect.
    emitted_at_rate: u64,
    modifiers: Vec<Box<dyn ParticleModifier<A>>>,
    state: EmitterState,
    target: Option<SharedSystem<A>>,
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Number of emissions due after `elapsed` at `rate`, `floor(elapsed * rate)`.
///
/// Integral rates are computed exactly in integer nanoseconds.
fn due(elapsed: Duration, rate: f32) -> u64 {
    let nanos = elapsed.as_nanos();
    let exact = (rate.fract() == 0.0)
        .then(|| nanos.checked_mul(rate as u128))
        .flatten();
    match exact {
        Some(product) => u64::try_from(product / NANOS_PER_SEC).unwrap_or(u64::MAX),
        None => (nanos as f64 * rate as f64 / 1e9).floor() as u64,
    }
}

/// Earliest time at which `count` emissions are due at `rate`.
fn time_of(count: u64, rate: f32) -> Duration {
    let exact = (rate.fract() == 0.0 && rate >= 1.0)
        .then(|| (count as u128).checked_mul(NANOS_PER_SEC))
        .flatten();
    let nanos = match exact {
        Some(product) => product.div_ceil(rate as u128),
        None => (count as f64 * 1e9 / rate as f64).ceil() as u128,
    };
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

fn check_template<A>(particle: &Particle<A>) -> Result<(), ConfigError> {
    if particle.lifetime > 0.0 && particle.lifetime.is_finite() {
        Ok(())
    } else {
        log::warn!("Ignoring default particle with lifetime {}s", particle.lifetime);
        Err(ConfigError::NonPositiveLifetime(particle.lifetime))
    }
}

impl<A: Attributes> Emitter<A> {
    /// Create an unbound emitter at the origin emitting [`DEFAULT_RATE`]
    /// particles per second.
    ///
    /// Fails if the default particle's lifetime is not positive and finite.
    pub fn new(default_particle: Particle<A>) -> Result<Self, ConfigError> {
        check_template(&default_particle)?;
        Ok(Self {
            default_particle,
            rate: DEFAULT_RATE,
            elapsed: Duration::ZERO,
            emitted_at_rate: 0,
            modifiers: Vec::new(),
            state: EmitterState::new(DEFAULT_SEED),
            target: None,
        })
    }

    /// Reseed the random source handed to modifiers.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.state.rng = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn emission_rate(&self) -> f32 {
        self.rate
    }

    /// Set the emission rate in particles per second.
    ///
    /// Rejects zero, negative and non-finite rates, leaving the current rate
    /// in place. Time accumulated since the last emission carries over to
    /// the new rate.
    pub fn set_emission_rate(&mut self, rate: f32) -> Result<(), ConfigError> {
        if !(rate > 0.0 && rate.is_finite()) {
            log::warn!("Ignoring emission rate {} particles/s", rate);
            return Err(ConfigError::NonPositiveRate(rate));
        }
        self.elapsed = self.accumulated();
        self.emitted_at_rate = 0;
        self.rate = rate;
        Ok(())
    }

    pub fn default_particle(&self) -> &Particle<A> {
        &self.default_particle
    }

    /// Replace the template particle, rejecting lifetimes that are not
    /// positive and finite.
    pub fn set_default_particle(&mut self, particle: Particle<A>) -> Result<(), ConfigError> {
        check_template(&particle)?;
        self.default_particle = particle;
        Ok(())
    }

    /// Register a modifier. Modifiers run in registration order.
    pub fn add_modifier(&mut self, modifier: impl ParticleModifier<A> + 'static) {
        self.modifiers.push(Box::new(modifier));
    }

    /// Bind the emitter to a system, or unbind it with `None`.
    pub fn set_particle_system(&mut self, system: Option<SharedSystem<A>>) {
        self.target = system;
    }

    pub fn particle_system(&self) -> Option<&SharedSystem<A>> {
        self.target.as_ref()
    }

    pub fn state(&self) -> &EmitterState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut EmitterState {
        &mut self.state
    }

    /// Time carried over towards the next emission.
    pub fn accumulated(&self) -> Duration {
        self.elapsed.saturating_sub(time_of(self.emitted_at_rate, self.rate))
    }

    /// Emit into the bound system. Does nothing while unbound.
    ///
    /// # Panics
    ///
    /// Panics if the bound system is already mutably borrowed, for example
    /// when called from inside one of that system's affectors.
    pub fn update(&mut self, dt: Duration) -> usize {
        let Some(target) = self.target.clone() else {
            return 0;
        };
        let mut system = target.borrow_mut();
        self.emit_into(dt, &mut system)
    }

    /// Advance by `dt` and append every particle now due to `system`.
    ///
    /// Emissions are counted from the time the current rate took effect,
    /// so rounding never builds up across frames: `T` seconds at `R`
    /// particles/s emit `floor(T * R)` particles however `T` is split.
    ///
    /// Returns the number of particles emitted.
    pub fn emit_into(&mut self, dt: Duration, system: &mut ParticleSystem<A>) -> usize {
        self.elapsed += dt;
        let pending = due(self.elapsed, self.rate).saturating_sub(self.emitted_at_rate);

        let mut count = 0;
        for _ in 0..pending {
            let mut particle = self.default_particle.at(self.state.position + self.default_particle.position);
            for modifier in &mut self.modifiers {
                modifier.modify(&mut particle, &mut self.state);
            }
            system.add_particle(particle);

            self.state.emitted += 1;
            count += 1;
        }
        self.emitted_at_rate += pending;

        if count > 0 {
            log::trace!("Emitted {} particles ({} total)", count, self.state.emitted);
        }
        count
    }
}

/// Moves the emitter around `center` by `step` radians per emitted particle,
/// keeping its current distance from the center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    pub center: Vec2,
    pub step: f32,
}

impl Orbit {
    pub fn new(center: Vec2, step: f32) -> Self {
        Self { center, step }
    }
}

impl<A> ParticleModifier<A> for Orbit {
    fn modify(&mut self, particle: &mut Particle<A>, emitter: &mut EmitterState) {
        let arm = emitter.position - self.center;
        let moved = self.center + Vec2::from_angle(self.step).rotate(arm);
        particle.position += moved - emitter.position;
        emitter.position = moved;
        emitter.rotation += self.step;
    }
}

/// Offsets each particle by a random point inside `radius`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scatter {
    pub radius: f32,
}

impl Scatter {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }
}

impl<A> ParticleModifier<A> for Scatter {
    fn modify(&mut self, particle: &mut Particle<A>, emitter: &mut EmitterState) {
        particle.position += emitter.random_in_circle(self.radius);
    }
}

/// Spreads successive particles evenly along a segment of `length`,
/// centered on the emitter and aligned with its rotation, wrapping after
/// `slots` particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub length: f32,
    pub slots: u32,
    next: u32,
}

impl Band {
    pub fn new(length: f32, slots: u32) -> Self {
        Self {
            length,
            slots: slots.max(1),
            next: 0,
        }
    }
}

impl<A> ParticleModifier<A> for Band {
    fn modify(&mut self, particle: &mut Particle<A>, emitter: &mut EmitterState) {
        let t = if self.slots > 1 {
            self.next as f32 / (self.slots - 1) as f32 - 0.5
        } else {
            0.0
        };
        particle.position += Vec2::from_angle(emitter.rotation) * (t * self.length);
        self.next = (self.next + 1) % self.slots;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Texture};

    fn system() -> ParticleSystem {
        ParticleSystem::new(Texture::solid(1, 1, [255; 4]), Duration::from_secs(10), Color::WHITE, ()).unwrap()
    }

    fn emitter(rate: f32) -> Emitter {
        let mut emitter = Emitter::new(Particle::new(Vec2::ZERO, 10.0, ())).unwrap();
        emitter.set_emission_rate(rate).unwrap();
        emitter
    }

    #[test]
    fn test_unbound_update_is_noop() {
        let mut e = emitter(10.0);
        assert_eq!(e.update(Duration::from_secs(5)), 0);
        assert_eq!(e.accumulated(), Duration::ZERO);
    }

    #[test]
    fn test_catch_up_keeps_remainder() {
        let mut sys = system();
        let mut e = emitter(10.0);

        assert_eq!(e.emit_into(Duration::from_millis(350), &mut sys), 3);
        assert_eq!(sys.len(), 3);
        assert_eq!(e.accumulated(), Duration::from_millis(50));

        assert_eq!(e.emit_into(Duration::from_millis(40), &mut sys), 0);
        assert_eq!(e.emit_into(Duration::from_millis(10), &mut sys), 1);
        assert_eq!(e.accumulated(), Duration::ZERO);
    }

    #[test]
    fn test_rate_fidelity_across_chunking() {
        let chunkings: [&[u64]; 3] = [&[1000], &[100; 10], &[1, 333, 16, 16, 16, 300, 318]];
        for chunks in chunkings {
            let mut sys = system();
            let mut e = emitter(20.0);
            let total: usize = chunks
                .iter()
                .map(|ms| e.emit_into(Duration::from_millis(*ms), &mut sys))
                .sum();
            assert_eq!(total, 20, "chunks {:?}", chunks);
        }
    }

    #[test]
    fn test_rates_that_do_not_divide_a_second() {
        for (rate, secs) in [(30_000.0, 60), (70_000.0, 1), (3.0, 7), (7.0, 3)] {
            let mut sys = system();
            let mut e = emitter(rate);
            let total: usize = (0..secs).map(|_| e.emit_into(Duration::from_secs(1), &mut sys)).sum();
            assert_eq!(total as f32, rate * secs as f32, "rate {}", rate);
        }
    }

    #[test]
    fn test_fractional_rate_never_drifts() {
        let mut sys = system();
        let mut e = emitter(2.5);
        let total: usize = (0..1000).map(|_| e.emit_into(Duration::from_millis(100), &mut sys)).sum();
        assert_eq!(total, 250);
        assert_eq!(e.accumulated(), Duration::ZERO);
    }

    #[test]
    fn test_very_high_rate_emits_exactly_that_many() {
        let mut sys = system();
        let mut e = emitter(6e8);
        assert_eq!(e.emit_into(Duration::from_nanos(100), &mut sys), 60);
        assert_eq!(e.emit_into(Duration::from_nanos(1), &mut sys), 0);
        assert_eq!(e.emit_into(Duration::from_nanos(1), &mut sys), 1);
    }

    #[test]
    fn test_rate_change_keeps_leftover_time() {
        let mut sys = system();
        let mut e = emitter(10.0);
        assert_eq!(e.emit_into(Duration::from_millis(130), &mut sys), 1);

        e.set_emission_rate(20.0).unwrap();
        assert_eq!(e.accumulated(), Duration::from_millis(30));
        assert_eq!(e.emit_into(Duration::from_millis(19), &mut sys), 0);
        assert_eq!(e.emit_into(Duration::from_millis(1), &mut sys), 1);
        assert_eq!(e.emit_into(Duration::from_millis(100), &mut sys), 2);
    }

    #[test]
    fn test_rejects_bad_default_particle() {
        for bad in [0.0, -3.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                Emitter::new(Particle::new(Vec2::ZERO, bad, ())),
                Err(ConfigError::NonPositiveLifetime(_))
            ));
        }

        let mut e = emitter(10.0);
        assert!(e.set_default_particle(Particle::new(Vec2::ZERO, -3.0, ())).is_err());
        assert_eq!(e.default_particle().lifetime, 10.0);
        e.set_default_particle(Particle::new(Vec2::ONE, 2.0, ())).unwrap();
        assert_eq!(e.default_particle().lifetime, 2.0);
    }

    #[test]
    fn test_rejects_bad_rates() {
        let mut e = emitter(10.0);
        for bad in [0.0, -5.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(e.set_emission_rate(bad), Err(ConfigError::NonPositiveRate(_))));
        }
        assert_eq!(e.emission_rate(), 10.0);
    }

    #[test]
    fn test_bound_update_pushes_into_shared_system() {
        let shared: SharedSystem<()> = Rc::new(RefCell::new(system()));
        let mut e = emitter(4.0);
        e.set_particle_system(Some(shared.clone()));

        assert_eq!(e.update(Duration::from_secs(1)), 4);
        assert_eq!(shared.borrow().len(), 4);

        e.set_particle_system(None);
        assert_eq!(e.update(Duration::from_secs(1)), 0);
        assert_eq!(shared.borrow().len(), 4);
    }

    #[test]
    fn test_particles_start_at_emitter_and_modifiers_run_in_order() {
        let mut sys = system();
        let mut e = emitter(1.0);
        e.state_mut().position = Vec2::new(100.0, 50.0);
        e.add_modifier(|p: &mut Particle, _: &mut EmitterState| p.position.x += 1.0);
        e.add_modifier(|p: &mut Particle, s: &mut EmitterState| {
            p.position.x *= 2.0;
            p.lifetime = s.emitted() as f32 + 1.0;
        });

        e.emit_into(Duration::from_secs(2), &mut sys);

        let ps: Vec<&Particle> = sys.particles().collect();
        assert_eq!(ps[0].position, Vec2::new(202.0, 50.0));
        assert_eq!(ps[0].lifetime, 1.0);
        assert_eq!(ps[1].lifetime, 2.0);
    }

    #[test]
    fn test_each_particle_starts_fresh() {
        let mut sys = system();
        let mut e = emitter(1.0);
        e.add_modifier(|p: &mut Particle, _: &mut EmitterState| p.position.y += 5.0);
        e.emit_into(Duration::from_secs(3), &mut sys);
        assert!(sys.particles().all(|p| p.position.y == 5.0));
    }

    #[test]
    fn test_orbit_moves_emitter() {
        let mut sys = system();
        let mut e = emitter(1.0);
        e.state_mut().position = Vec2::new(1.0, 0.0);
        e.add_modifier(Orbit::new(Vec2::ZERO, std::f32::consts::FRAC_PI_2));

        e.emit_into(Duration::from_secs(2), &mut sys);

        let ps: Vec<Vec2> = sys.particles().map(|p| p.position).collect();
        assert!((ps[0] - Vec2::new(0.0, 1.0)).length() < 1e-5);
        assert!((ps[1] - Vec2::new(-1.0, 0.0)).length() < 1e-5);
        assert!((e.state().position - Vec2::new(-1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_scatter_is_bounded_and_seeded() {
        let run = |seed: u64| {
            let mut sys = system();
            let mut e = emitter(100.0).with_seed(seed);
            e.add_modifier(Scatter::new(3.0));
            e.emit_into(Duration::from_secs(1), &mut sys);
            sys.particles().map(|p| p.position).collect::<Vec<_>>()
        };

        let a = run(7);
        assert_eq!(a.len(), 100);
        assert!(a.iter().all(|p| p.length() <= 3.0 + 1e-4));
        assert_eq!(a, run(7));
        assert_ne!(a, run(8));
    }

    #[test]
    fn test_band_spreads_and_wraps() {
        let mut sys = system();
        let mut e = emitter(1.0);
        e.add_modifier(Band::new(10.0, 3));
        e.emit_into(Duration::from_secs(4), &mut sys);

        let xs: Vec<f32> = sys.particles().map(|p| p.position.x).collect();
        assert_eq!(xs, vec![-5.0, 0.0, 5.0, -5.0]);
    }

    #[test]
    fn test_random_helpers_stay_in_range() {
        let mut state = EmitterState::new(3);
        for _ in 0..200 {
            let r = state.random();
            assert!((0.0..1.0).contains(&r));

            let r = state.random_range(-2.0, 5.0);
            assert!((-2.0..5.0).contains(&r));

            let i = state.random_int(-3, 3);
            assert!((-3..=3).contains(&i));

            let v = state.random_on_circle(4.0);
            assert!((v.length() - 4.0).abs() < 1e-4);

            assert!(state.random_in_circle(4.0).length() <= 4.0 + 1e-4);
        }
    }

    #[test]
    fn test_random_helpers_with_empty_ranges() {
        let mut state = EmitterState::new(3);
        assert_eq!(state.random_range(2.0, 2.0), 2.0);
        assert_eq!(state.random_range(5.0, 1.0), 5.0);
        assert_eq!(state.random_int(4, 4), 4);
        assert_eq!(state.random_int(4, 1), 4);
        assert_eq!(state.random_on_circle(0.0), Vec2::ZERO);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = EmitterState::new(42);
        let mut b = EmitterState::new(42);
        let xs: Vec<f32> = (0..8).map(|_| a.random()).collect();
        let ys: Vec<f32> = (0..8).map(|_| b.random()).collect();
        assert_eq!(xs, ys);
    }
}
