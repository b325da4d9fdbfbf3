use glam::Vec2;
use motes::window;
use motes::{EffectConfig, RunError};

fn main() -> Result<(), RunError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Optional argument: a preset name or a path to a JSON effect config.
    let config = match std::env::args().nth(1) {
        Some(arg) => match EffectConfig::named(&arg, Vec2::ZERO) {
            Some(preset) => preset,
            None => EffectConfig::load(&arg)?,
        },
        None => EffectConfig::motes(Vec2::ZERO),
    };

    window::run(&config)
}
