//! Void Runner headless driver
//!
//! Runs a scripted sprint through a seeded world against the in-memory host
//! and logs what happened. Usage: `void-runner [seed] [seconds] [settings.json] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use glam::Vec3;
    use void_runner::consts::*;
    use void_runner::host::{HeadlessHost, Runner};
    use void_runner::sim::{DamageOutcome, DamageTarget, TickInput, World};
    use void_runner::{Settings, WorldTuning};

    env_logger::init();
    log::info!("Void Runner (headless) starting...");

    let args: Vec<String> = std::env::args().collect();
    let seed = args
        .get(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });
    let seconds = args
        .get(2)
        .and_then(|s| s.parse::<f32>().ok())
        .unwrap_or(30.0);
    let settings = args.get(3).map(Settings::load).unwrap_or_default();
    let tuning = match args.get(4).map(std::fs::read_to_string) {
        Some(Ok(json)) => WorldTuning::from_json(&json).unwrap_or_else(|e| {
            log::warn!("Using default tuning: {}", e);
            WorldTuning::default()
        }),
        Some(Err(e)) => {
            log::warn!("Using default tuning: {}", e);
            WorldTuning::default()
        }
        None => WorldTuning::default(),
    };

    log::info!(
        "Seed {}, {}s run, quality {}",
        seed,
        seconds,
        settings.quality.as_str()
    );

    let mut world = World::new(seed, tuning, settings);
    world.initialize();
    let mut runner = Runner::new(world);
    let mut host = HeadlessHost::default();

    // Run forward at a steady pace, weaving, swinging at whatever is close
    let run_speed = 6.0;
    let frames = (seconds / SIM_DT) as u32;
    let mut player = Vec3::new(0.0, 3.0, 0.0);
    let mut walls_broken = 0;
    let mut platforms_broken = 0;
    let mut hostiles_broken = 0;
    let mut contacts = 0;

    for frame in 0..frames {
        let t = frame as f32 * SIM_DT;
        player.z -= run_speed * SIM_DT;
        player.x = (t * 0.7).sin() * 3.0;
        runner.update(SIM_DT, &TickInput::at(player));

        if frame % 15 == 0 {
            let world = &runner.world;
            let near = |pos: Vec3| pos.distance(player) < 6.0;
            let wall = world
                .platforms()
                .iter()
                .find_map(|p| p.wall.as_ref().filter(|w| near(p.pos + w.offset)).map(|w| w.id));
            let hostile = world.hostiles().iter().find(|h| near(h.pos)).map(|h| h.id);
            let platform = world.platforms().iter().find(|p| near(p.pos)).map(|p| p.id);

            let target = wall
                .map(DamageTarget::Wall)
                .or(hostile.map(DamageTarget::Hostile))
                .or(platform.map(DamageTarget::Platform));
            if let Some(target) = target
                && runner.world.hit(target) == DamageOutcome::Destroyed
            {
                match target {
                    DamageTarget::Wall(_) => walls_broken += 1,
                    DamageTarget::Hostile(_) => hostiles_broken += 1,
                    DamageTarget::Platform(_) => platforms_broken += 1,
                }
            }
        }

        runner.world.check_collectible_proximity(player);
        if runner.world.check_hostile_contact(player) {
            contacts += 1;
        }
        host.apply(runner.world.drain_commands());
    }

    let world = &runner.world;
    log::info!(
        "Run finished at depth {:.1}: score {}, frontier {}, {} platforms live",
        -player.z,
        world.score(),
        world.frontier(),
        world.platforms().len()
    );
    log::info!(
        "Broke {} walls, {} platforms, {} hostiles; {} hostile contacts",
        walls_broken,
        platforms_broken,
        hostiles_broken,
        contacts
    );
    log::info!(
        "Host holds {} nodes, {} bodies ({} dangling commands)",
        host.nodes.len(),
        host.bodies.len(),
        host.dangling
    );
    println!("Score: {}", world.score());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No browser front end; the library is embedded by the host application
}
