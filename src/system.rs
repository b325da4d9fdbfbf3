//! The particle system: live collection, update pipeline and vertex batch.

use std::collections::VecDeque;
use std::time::Duration;

use glam::Vec2;

use crate::affector::Affector;
use crate::error::ConfigError;
use crate::finalizer::{Finalizer, FrameInfo};
use crate::surface::RenderSurface;
use crate::vertex::{push_quad, VERTICES_PER_QUAD};
use crate::{Attributes, Color, Particle, Texture, Vertex};

/// How quad colors are chosen, fixed when the system is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Each particle's attribute bundle supplies its color.
    Attribute,
    /// The default color, alpha scaled by remaining lifetime.
    Fade,
}

/// Owner of a population of live particles.
///
/// Particles are kept oldest first in a ring buffer: new particles are
/// appended at the tail, expired particles are popped from the head. Every
/// frame the host calls [`update`](Self::update) and then
/// [`render`](Self::render); the vertex batch is only rebuilt when
/// something changed since the last render.
///
/// # Example
///
/// ```ignore
/// let mut system = ParticleSystem::new(Texture::soft_dot(16), Duration::from_secs(2), Color::RED, ())?;
/// system.add_affector(Drift::new(Vec2::new(0.0, -30.0)));
/// system.add_finalizer(BeatHighlight::new(8, Duration::from_millis(120), Color::WHITE));
///
/// system.add_at(Vec2::new(400.0, 300.0));
/// system.update(Duration::from_millis(16));
/// system.render(&mut surface)?;
/// ```
pub struct ParticleSystem<A: Attributes = ()> {
    texture: Texture,
    particles: VecDeque<Particle<A>>,
    default_particle: Particle<A>,
    default_color: Color,
    color_mode: ColorMode,
    affectors: Vec<Box<dyn Affector<A>>>,
    finalizers: Vec<Box<dyn Finalizer>>,
    batch: Vec<Vertex>,
    needs_update: bool,
    elapsed: Duration,
    logged_count: usize,
}

fn check_lifetime(lifetime: Duration) -> Result<f32, ConfigError> {
    let secs = lifetime.as_secs_f32();
    if secs > 0.0 && secs.is_finite() {
        Ok(secs)
    } else {
        Err(ConfigError::NonPositiveLifetime(secs))
    }
}

impl<A: Attributes> ParticleSystem<A> {
    /// Create an empty system.
    ///
    /// `default_lifetime` seeds new particles and is the reference the fade
    /// ratio divides by, so it must be non-zero. `default_attributes` fills
    /// the template particle used by [`add_default`](Self::add_default).
    pub fn new(
        texture: Texture,
        default_lifetime: Duration,
        default_color: Color,
        default_attributes: A,
    ) -> Result<Self, ConfigError> {
        let lifetime = check_lifetime(default_lifetime)?;
        let color_mode = if A::HAS_COLOR {
            ColorMode::Attribute
        } else {
            ColorMode::Fade
        };

        log::debug!(
            "Particle system: {}x{} texture, {:.2}s lifetime, {:?} color mode, attributes {:?}",
            texture.width(),
            texture.height(),
            lifetime,
            color_mode,
            default_attributes.describe()
        );

        Ok(Self {
            texture,
            particles: VecDeque::new(),
            default_particle: Particle::new(Vec2::ZERO, lifetime, default_attributes),
            default_color,
            color_mode,
            affectors: Vec::new(),
            finalizers: Vec::new(),
            batch: Vec::new(),
            needs_update: true,
            elapsed: Duration::ZERO,
            logged_count: 0,
        })
    }

    // =========================================================================
    // PARTICLES
    // =========================================================================

    /// Append a particle at the tail.
    pub fn add_particle(&mut self, particle: Particle<A>) {
        self.particles.push_back(particle);
        self.needs_update = true;
    }

    /// Append a copy of the template particle.
    pub fn add_default(&mut self) {
        self.add_particle(self.default_particle.clone());
    }

    /// Append a copy of the template particle at `position`.
    pub fn add_at(&mut self, position: Vec2) {
        self.add_particle(self.default_particle.at(position));
    }

    /// Live particles, oldest first.
    pub fn particles(&self) -> impl ExactSizeIterator<Item = &Particle<A>> + '_ {
        self.particles.iter()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    // =========================================================================
    // CONFIGURATION
    // =========================================================================

    /// Register an affector. Affectors run in registration order.
    pub fn add_affector(&mut self, affector: impl Affector<A> + 'static) {
        self.affectors.push(Box::new(affector));
    }

    /// Register a finalizer. Finalizers run in registration order.
    pub fn add_finalizer(&mut self, finalizer: impl Finalizer + 'static) {
        self.finalizers.push(Box::new(finalizer));
        self.needs_update = true;
    }

    pub fn default_particle(&self) -> &Particle<A> {
        &self.default_particle
    }

    /// Replace the template's position and attributes.
    ///
    /// The template keeps the system's default lifetime; use
    /// [`set_lifetime`](Self::set_lifetime) to change it.
    pub fn set_default_particle(&mut self, position: Vec2, attributes: A) {
        self.default_particle.position = position;
        self.default_particle.attributes = attributes;
    }

    /// Default lifetime in seconds.
    pub fn lifetime(&self) -> f32 {
        self.default_particle.lifetime
    }

    /// Change the default lifetime for new particles and the fade reference.
    pub fn set_lifetime(&mut self, lifetime: Duration) -> Result<(), ConfigError> {
        self.default_particle.lifetime = check_lifetime(lifetime)?;
        self.needs_update = true;
        Ok(())
    }

    pub fn default_color(&self) -> Color {
        self.default_color
    }

    pub fn set_default_color(&mut self, color: Color) {
        self.default_color = color;
        self.needs_update = true;
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    /// Swap the texture. Quads are resized on the next rebuild.
    pub fn set_texture(&mut self, texture: Texture) {
        self.texture = texture;
        self.needs_update = true;
    }

    /// Sum of every `dt` passed to [`update`](Self::update).
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Whether the next render will rebuild the vertex batch.
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    // =========================================================================
    // UPDATE
    // =========================================================================

    /// Advance the simulation by `dt`.
    ///
    /// 1. Pop particles that were already expired (added expired, or expired
    ///    by an affector last tick).
    /// 2. Age every particle by `dt`.
    /// 3. Pop particles that expired while aging.
    /// 4. Run affectors in registration order.
    ///
    /// When this returns, every remaining particle has a positive lifetime
    /// as of the reap; only affectors can shorten it further.
    pub fn update(&mut self, dt: Duration) {
        self.reap_front();

        let step = dt.as_secs_f32();
        let mut expired = 0;
        for particle in self.particles.iter_mut() {
            particle.lifetime -= step;
            if particle.is_expired() {
                expired += 1;
            }
        }

        if expired > 0 {
            let popped = self.reap_front();
            // Particles added with a shorter lifetime can expire behind the head
            if popped < expired {
                self.particles.retain(|p| !p.is_expired());
            }
        }

        self.elapsed += dt;
        self.needs_update = true;

        if !self.affectors.is_empty() {
            let live = self.particles.make_contiguous();
            for affector in &mut self.affectors {
                affector.affect(live, dt);
            }
        }
    }

    /// Pop the expired prefix, returning how many particles were removed.
    fn reap_front(&mut self) -> usize {
        let mut popped = 0;
        while self.particles.front().is_some_and(Particle::is_expired) {
            self.particles.pop_front();
            popped += 1;
        }
        popped
    }

    // =========================================================================
    // RENDER
    // =========================================================================

    /// The current vertex batch, rebuilt first if anything changed.
    pub fn batch(&mut self) -> &[Vertex] {
        if self.needs_update {
            self.rebuild();
        }
        &self.batch
    }

    /// Hand the batch and texture to `surface`, rebuilding first if needed.
    pub fn render<S: RenderSurface>(&mut self, surface: &mut S) -> Result<(), S::Error> {
        if self.needs_update {
            self.rebuild();
        }
        surface.draw(&self.batch, &self.texture)
    }

    fn rebuild(&mut self) {
        let size = self.texture.size();
        let reference = self.default_particle.lifetime;

        self.batch.clear();
        self.batch.reserve(self.particles.len() * VERTICES_PER_QUAD);

        for particle in &self.particles {
            let color = match self.color_mode {
                ColorMode::Attribute => particle
                    .attributes
                    .color()
                    .unwrap_or_else(|| fade(self.default_color, particle.lifetime, reference)),
                ColorMode::Fade => fade(self.default_color, particle.lifetime, reference),
            };
            push_quad(&mut self.batch, particle.position, size, color);
        }

        let frame = FrameInfo {
            elapsed: self.elapsed,
            quads: self.particles.len(),
        };
        for finalizer in &mut self.finalizers {
            finalizer.finalize(&mut self.batch, &frame);
        }

        if frame.quads != self.logged_count {
            log::trace!("Live particles: {}", frame.quads);
            self.logged_count = frame.quads;
        }

        self.needs_update = false;
    }
}

/// `color` with alpha scaled by `lifetime / reference`, clamped to `0..=1`.
#[inline]
fn fade(color: Color, lifetime: f32, reference: f32) -> Color {
    color.with_alpha_factor(lifetime / reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::Tint;
    use crate::surface::CaptureSurface;

    fn system(lifetime_secs: u64) -> ParticleSystem {
        let texture = Texture::solid(4, 2, [255; 4]);
        ParticleSystem::new(texture, Duration::from_secs(lifetime_secs), Color::RED, ()).unwrap()
    }

    #[test]
    fn test_rejects_zero_lifetime() {
        let texture = Texture::solid(1, 1, [255; 4]);
        assert!(matches!(
            ParticleSystem::new(texture, Duration::ZERO, Color::RED, ()),
            Err(ConfigError::NonPositiveLifetime(_))
        ));

        let mut sys = system(1);
        assert!(sys.set_lifetime(Duration::ZERO).is_err());
        assert_eq!(sys.lifetime(), 1.0);
    }

    #[test]
    fn test_add_uses_template() {
        let mut sys = system(3);
        sys.add_default();
        sys.add_at(Vec2::new(5.0, 6.0));
        sys.add_particle(Particle::new(Vec2::ONE, 0.5, ()));

        let lifetimes: Vec<f32> = sys.particles().map(|p| p.lifetime).collect();
        assert_eq!(lifetimes, vec![3.0, 3.0, 0.5]);
        assert_eq!(sys.particles().nth(1).unwrap().position, Vec2::new(5.0, 6.0));
    }

    #[test]
    fn test_survive_then_expire() {
        let mut sys = system(2);
        sys.add_default();

        sys.update(Duration::from_secs(1));
        assert_eq!(sys.len(), 1);
        assert_eq!(sys.particles().next().unwrap().lifetime, 1.0);
        let alpha = sys.batch()[0].color[3];
        assert_eq!(alpha, 128);

        sys.update(Duration::from_millis(1500));
        assert!(sys.is_empty());
        assert!(sys.batch().is_empty());
    }

    #[test]
    fn test_expired_behind_head_is_removed_in_order() {
        let mut sys = system(5);
        sys.add_default();
        sys.add_particle(Particle::new(Vec2::ONE, 0.5, ()));
        sys.add_at(Vec2::new(2.0, 2.0));

        sys.update(Duration::from_secs(1));

        let positions: Vec<Vec2> = sys.particles().map(|p| p.position).collect();
        assert_eq!(positions, vec![Vec2::ZERO, Vec2::new(2.0, 2.0)]);
    }

    #[test]
    fn test_particle_added_expired_is_culled() {
        let mut sys = system(1);
        sys.add_particle(Particle::new(Vec2::ZERO, 0.0, ()));
        sys.update(Duration::ZERO);
        assert!(sys.is_empty());
    }

    #[test]
    fn test_affectors_run_in_order_after_aging() {
        let mut sys = system(2);
        sys.add_default();

        sys.add_affector(|ps: &mut [Particle], _dt: Duration| {
            for p in ps {
                assert_eq!(p.lifetime, 1.5);
                p.position.x += 1.0;
            }
        });
        sys.add_affector(|ps: &mut [Particle], _dt: Duration| {
            for p in ps {
                p.position.x *= 10.0;
            }
        });

        sys.update(Duration::from_millis(500));
        assert_eq!(sys.particles().next().unwrap().position.x, 10.0);
    }

    #[test]
    fn test_batch_is_lazy_and_idempotent() {
        let mut sys = system(2);
        sys.add_at(Vec2::new(10.0, 10.0));
        sys.add_at(Vec2::new(20.0, 10.0));
        sys.update(Duration::from_millis(100));

        let first = sys.batch().to_vec();
        assert!(!sys.needs_update());
        let second = sys.batch().to_vec();

        assert_eq!(first.len(), 8);
        assert_eq!(first, second);
    }

    #[test]
    fn test_quads_sized_to_texture() {
        let mut sys = system(1);
        sys.add_at(Vec2::new(10.0, 10.0));
        let batch = sys.batch();
        assert_eq!(batch[0].position, [8.0, 9.0]);
        assert_eq!(batch[2].position, [12.0, 11.0]);
        assert_eq!(batch[0].tex_coords, [0.0, 0.0]);
        assert_eq!(batch[2].tex_coords, [1.0, 1.0]);
    }

    #[test]
    fn test_attribute_color_used_verbatim() {
        let texture = Texture::solid(1, 1, [255; 4]);
        let mut sys =
            ParticleSystem::new(texture, Duration::from_secs(4), Color::RED, Tint::new(Color::GREEN)).unwrap();
        assert_eq!(sys.color_mode(), ColorMode::Attribute);

        sys.add_default();
        sys.update(Duration::from_secs(3));
        assert!(sys.batch().iter().all(|v| v.color() == Color::GREEN));
    }

    #[test]
    fn test_negative_ratio_is_transparent() {
        let mut sys = system(2);
        sys.add_default();
        sys.update(Duration::ZERO);
        sys.add_affector(|ps: &mut [Particle], _dt: Duration| {
            for p in ps {
                p.lifetime = -1.0;
            }
        });
        sys.update(Duration::ZERO);
        assert_eq!(sys.batch()[0].color[3], 0);
    }

    #[test]
    fn test_finalizers_see_frame_and_render_hands_off() {
        let mut sys = system(2);
        sys.add_default();
        sys.add_finalizer(|vs: &mut [Vertex], frame: &FrameInfo| {
            assert_eq!(frame.quads * VERTICES_PER_QUAD, vs.len());
            assert_eq!(frame.elapsed, Duration::from_millis(250));
            for v in vs {
                v.set_color(Color::BLUE);
            }
        });
        sys.update(Duration::from_millis(250));

        let mut surface = CaptureSurface::new();
        sys.render(&mut surface).unwrap();
        sys.render(&mut surface).unwrap();

        assert_eq!(surface.draws(), 2);
        assert_eq!(surface.texture_size(), Vec2::new(4.0, 2.0));
        assert!(surface.vertices().iter().all(|v| v.color() == Color::BLUE));
    }

    #[test]
    fn test_color_change_marks_dirty() {
        let mut sys = system(1);
        sys.add_default();
        let _ = sys.batch();
        sys.set_default_color(Color::YELLOW);
        assert!(sys.needs_update());
        assert_eq!(sys.batch()[0].color(), Color::YELLOW);
    }
}
