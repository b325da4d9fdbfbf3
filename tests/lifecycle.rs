//! End-to-end lifecycle tests: aging, culling, emission and rendering
//! driven the way a host frame loop drives them.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use motes::{
    BeatHighlight, CaptureSurface, Color, Drift, Emitter, FrameClock, Particle, ParticleSystem, SharedSystem, Texture,
    Vec2,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn red_system(lifetime: Duration) -> ParticleSystem {
    ParticleSystem::new(Texture::solid(8, 8, [255; 4]), lifetime, Color::RED, ()).unwrap()
}

fn quads(surface: &CaptureSurface) -> usize {
    surface.vertices().len() / 4
}

#[test]
fn test_single_particle_fades_then_expires() {
    let mut system = red_system(Duration::from_secs(2));
    let mut surface = CaptureSurface::new();

    system.add_default();
    system.update(Duration::from_secs(1));
    system.render(&mut surface).unwrap();

    assert_eq!(system.particles().next().map(|p| p.lifetime), Some(1.0));
    assert_eq!(quads(&surface), 1);
    assert!(surface.vertices().iter().all(|v| v.color == [255, 0, 0, 128]));

    system.update(Duration::from_millis(1500));
    system.render(&mut surface).unwrap();

    assert!(system.is_empty());
    assert_eq!(quads(&surface), 0);
    assert_eq!(surface.draws(), 2);
}

#[test]
fn test_lifetimes_never_increase_and_expired_never_survive() {
    let mut rng = SmallRng::seed_from_u64(11);
    let mut system = red_system(Duration::from_secs(1));

    for _ in 0..200 {
        for _ in 0..rng.gen_range(0..4) {
            let lifetime = rng.gen_range(-0.5..1.5);
            system.add_particle(Particle::new(Vec2::ZERO, lifetime, ()));
        }

        let before: Vec<f32> = system.particles().map(|p| p.lifetime).collect();
        let dt = Duration::from_millis(rng.gen_range(0..120));
        system.update(dt);

        assert!(system.particles().all(|p| p.lifetime > 0.0));
        let after: Vec<f32> = system.particles().map(|p| p.lifetime).collect();
        assert!(after.len() <= before.len());
        // Survivors keep their relative order, each aged by dt.
        let survivors: Vec<f32> = before
            .iter()
            .map(|l| l - dt.as_secs_f32())
            .filter(|l| *l > 0.0)
            .collect();
        assert_eq!(after.len(), survivors.len());
        for (a, s) in after.iter().zip(&survivors) {
            assert!((a - s).abs() < 1e-5);
        }
    }
}

#[test]
fn test_default_lifetime_particles_expire_fifo() {
    let mut system = red_system(Duration::from_millis(110));
    for i in 0..10 {
        system.add_at(Vec2::new(i as f32, 0.0));
        system.update(Duration::from_millis(20));
    }

    let xs: Vec<f32> = system.particles().map(|p| p.position.x).collect();
    assert_eq!(xs, vec![5.0, 6.0, 7.0, 8.0, 9.0]);

    let lifetimes: Vec<f32> = system.particles().map(|p| p.lifetime).collect();
    assert!(lifetimes.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_render_twice_is_identical() {
    let mut system = red_system(Duration::from_secs(3));
    system.add_affector(Drift::new(Vec2::new(10.0, 0.0)));
    system.add_finalizer(BeatHighlight::new(2, Duration::from_millis(50), Color::WHITE));
    for i in 0..5 {
        system.add_at(Vec2::new(0.0, i as f32 * 10.0));
    }
    system.update(Duration::from_millis(250));

    let mut surface = CaptureSurface::new();
    system.render(&mut surface).unwrap();
    let first = surface.vertices().to_vec();
    system.render(&mut surface).unwrap();

    assert_eq!(surface.vertices(), &first[..]);
    assert_eq!(first.len(), 20);
}

#[test]
fn test_emitter_scenario_three_particles() {
    let system: SharedSystem<()> = Rc::new(RefCell::new(red_system(Duration::from_secs(5))));
    let mut emitter = Emitter::new(Particle::new(Vec2::ZERO, 5.0, ())).unwrap();
    emitter.set_emission_rate(10.0).unwrap();
    emitter.set_particle_system(Some(system.clone()));

    assert_eq!(emitter.update(Duration::from_millis(350)), 3);
    assert_eq!(system.borrow().len(), 3);
    assert_eq!(emitter.accumulated(), Duration::from_millis(50));
}

#[test]
fn test_emission_rate_is_frame_rate_independent() {
    let mut rng = SmallRng::seed_from_u64(3);

    for rate in [1.0, 25.0, 300.0, 1000.0, 30_000.0, 70_000.0] {
        let mut system = red_system(Duration::from_secs(60));
        let mut emitter = Emitter::new(Particle::new(Vec2::ZERO, 60.0, ())).unwrap();
        emitter.set_emission_rate(rate).unwrap();

        // Two seconds, cut into random whole-millisecond frames.
        let mut remaining = 2000u64;
        let mut emitted = 0;
        while remaining > 0 {
            let frame = rng.gen_range(1..=40).min(remaining);
            remaining -= frame;
            emitted += emitter.emit_into(Duration::from_millis(frame), &mut system);
        }

        assert_eq!(emitted, (2.0 * rate) as usize, "rate {}", rate);
        assert_eq!(system.len(), emitted);
    }
}

#[test]
fn test_emitter_long_run_at_uneven_rate() {
    let mut system = red_system(Duration::from_secs(1));
    let mut emitter = Emitter::new(Particle::new(Vec2::ZERO, 0.5, ())).unwrap();
    emitter.set_emission_rate(30_000.0).unwrap();

    let mut emitted = 0;
    for _ in 0..60 {
        emitted += emitter.emit_into(Duration::from_secs(1), &mut system);
    }
    assert_eq!(emitted, 1_800_000);
    assert_eq!(system.len(), emitted);
}

#[test]
fn test_nan_lifetimes_are_rejected_or_culled() {
    assert!(Emitter::new(Particle::new(Vec2::ZERO, f32::NAN, ())).is_err());

    let mut system = red_system(Duration::from_secs(1));
    system.add_particle(Particle::new(Vec2::ZERO, f32::NAN, ()));
    system.add_default();
    system.update(Duration::from_millis(10));
    assert_eq!(system.len(), 1);
    assert!(system.particles().all(|p| p.lifetime > 0.0));
}

#[test]
fn test_host_frame_loop() {
    let system: SharedSystem<()> = Rc::new(RefCell::new(red_system(Duration::from_secs(1))));
    system.borrow_mut().add_affector(Drift::new(Vec2::new(60.0, 0.0)));

    let mut emitter = Emitter::new(Particle::new(Vec2::ZERO, 1.0, ())).unwrap();
    emitter.set_emission_rate(60.0).unwrap();
    emitter.set_particle_system(Some(system.clone()));

    let mut clock = FrameClock::with_step(Duration::from_millis(10));
    let mut surface = CaptureSurface::new();

    // Three seconds of uneven frames.
    for frame in 0..200 {
        let raw = Duration::from_millis(if frame % 2 == 0 { 10 } else { 20 });
        for _ in 0..clock.advance(raw) {
            system.borrow_mut().update(clock.step());
            emitter.update(clock.step());
        }
        system.borrow_mut().render(&mut surface).unwrap();
    }

    assert_eq!(clock.elapsed(), Duration::from_secs(3));
    let system = system.borrow();
    // Steady state: one second of particles at 60/s.
    assert!((59..=61).contains(&system.len()), "live {}", system.len());
    assert_eq!(quads(&surface), system.len());
    assert!(system.particles().all(|p| p.position.x <= 60.0 + 1e-3));
}
