use std::time::{Duration, Instant};

use intersection_sim::{FileSource, SimResult, Simulation, SimulationConfig};

const FRAME_RATE: u32 = 60;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: intersection-sim <arrivals-file> [seconds] [config.json]");
        std::process::exit(2);
    };
    let seconds = args
        .next()
        .and_then(|arg| arg.parse::<f64>().ok())
        .unwrap_or(60.0);
    let config_path = args.next();

    if let Err(e) = run(&path, seconds, config_path.as_deref()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(path: &str, seconds: f64, config_path: Option<&str>) -> SimResult<()> {
    let config = load_config(config_path)?;
    let mut sim = Simulation::new(config)?;
    let mut source = FileSource::new(path);
    let frame = Duration::from_secs(1) / FRAME_RATE;
    let dt = frame.as_secs_f64();

    log::info!("reading arrivals from {}", path);
    while sim.time() < seconds {
        let start = Instant::now();
        sim.tick(dt, &mut source);
        sim.take_events();

        if sim.frame() % FRAME_RATE as usize == 0 {
            let state = sim.controller().state();
            log::info!(
                "t={:.0}s vehicles={} green={:?} override={} queues={:?}",
                sim.time(),
                sim.iter_vehicles().count(),
                state.active_approach,
                state.override_active,
                intersection_sim::Approach::ALL.map(|a| sim.queue(a).len()),
            );
        }
        if let Some(rest) = frame.checked_sub(start.elapsed()) {
            std::thread::sleep(rest);
        }
    }
    Ok(())
}

#[cfg(feature = "serde")]
fn load_config(path: Option<&str>) -> SimResult<SimulationConfig> {
    match path {
        Some(path) => SimulationConfig::from_json(&std::fs::read_to_string(path)?),
        None => Ok(SimulationConfig::default()),
    }
}

#[cfg(not(feature = "serde"))]
fn load_config(path: Option<&str>) -> SimResult<SimulationConfig> {
    if path.is_some() {
        log::warn!("built without the serde feature, ignoring the config file");
    }
    Ok(SimulationConfig::default())
}
