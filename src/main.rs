use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use strata::{NullSink, StreamingTrigger, Vec3, WorldConfig, WorldCoordinator, WorldEvent};
use strata_world::load_config_from_path;

#[derive(Parser, Debug)]
#[command(name = "strata", about = "Headless voxel world driver")]
struct Args {
    /// World config (TOML). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured seed.
    #[arg(long)]
    seed: Option<i32>,
    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 600)]
    ticks: u32,
    /// Observer displacement per tick as `dx,dz` in blocks.
    #[arg(long, value_parser = parse_walk, default_value = "0,0.5", allow_hyphen_values = true)]
    walk: (f32, f32),
    /// Write a save file here after the run.
    #[arg(long)]
    save: Option<PathBuf>,
    /// Start from a save file instead of a fresh world.
    #[arg(long)]
    load: Option<PathBuf>,
    /// Fixed tick length in milliseconds.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
}

fn parse_walk(s: &str) -> Result<(f32, f32), String> {
    let (dx, dz) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `dx,dz`, got `{s}`"))?;
    let dx = dx.trim().parse::<f32>().map_err(|e| e.to_string())?;
    let dz = dz.trim().parse::<f32>().map_err(|e| e.to_string())?;
    Ok((dx, dz))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => load_config_from_path(path)?,
        None => WorldConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;

    let mut observer = Vec3::new(8.0, 64.0, 8.0);
    let mut from_save = false;
    let mut world = match &args.load {
        Some(path) => match strata_io::load_from_path(path)
            .map_err(strata::LoadError::from)
            .and_then(|save| {
                let [x, y, z] = save.player_position;
                observer = Vec3::new(x, y, z);
                WorldCoordinator::from_save(config.clone(), &save, NullSink)
            }) {
            Ok(world) => {
                from_save = true;
                world
            }
            Err(e) => {
                log::warn!("could not load {}: {e}; starting a fresh world", path.display());
                WorldCoordinator::new(config.clone(), NullSink)?
            }
        },
        None => WorldCoordinator::new(config.clone(), NullSink)?,
    };

    world.subscribe(|e| match e {
        WorldEvent::WorldCreated => log::info!(target: "stream", "world created"),
        WorldEvent::NewChunksGenerated {
            cycle,
            data_created,
            render_created,
        } => log::info!(
            target: "stream",
            "[cycle {}] +{} chunks, +{} render objects",
            cycle,
            data_created,
            render_created
        ),
        _ => {}
    });

    if from_save {
        world.regenerate_from_save(observer);
    } else {
        world.generate(observer);
    }

    let mut trigger = StreamingTrigger::new(
        config.dims(),
        Duration::from_millis(config.streaming.detection_interval_ms),
    );
    trigger.reset(observer, Instant::now());
    let tick = Duration::from_millis(args.tick_ms);
    let (dx, dz) = args.walk;
    let mut requests = 0u32;
    for n in 0..args.ticks {
        let start = Instant::now();
        observer.x += dx;
        observer.z += dz;
        if let Some(req) = trigger.poll(observer, start) {
            requests += 1;
            world.generate(req.observer);
        }
        world.update();
        if n % 60 == 0 {
            let (tq, ti, mq, mi) = world.queue_debug_counts();
            log::debug!(
                target: "stream",
                "[tick {}] phase {:?}; queues terrain {}/{} mesh {}/{}; {} applies pending",
                n,
                world.phase(),
                tq,
                ti,
                mq,
                mi,
                world.pending_applies()
            );
        }
        if let Some(rest) = tick.checked_sub(start.elapsed()) {
            thread::sleep(rest);
        }
    }
    let settled = world.run_until_ready(Duration::from_secs(30));
    log::info!(
        "finished {} ticks at ({:.1},{:.1},{:.1}): {} reloads, {} chunks, {} render objects, settled={}",
        args.ticks,
        observer.x,
        observer.y,
        observer.z,
        requests,
        world.chunks().len(),
        world.render_count(),
        settled
    );

    if let Some(path) = &args.save {
        strata_io::save_to_path(&world.save_data(observer), path)?;
    }
    world.dispose();
    Ok(())
}
