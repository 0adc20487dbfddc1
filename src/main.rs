use bitclock::{clock_face::ClockFace, BitClock, ClockConfig};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ClockConfig::default();
    let shader_paths = config.shader_paths.clone();
    if let Err(e) = BitClock::run(config, |_| Box::new(ClockFace::new(shader_paths))) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
