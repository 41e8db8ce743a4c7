use glam::Vec2;
use pixbonk::*;

const LEVEL: &str = include_str!("platformer_level.json");

const HERO: &str = r#"{
    "name": "hero",
    "collider": { "offset": [0.0, 0.0], "half_extents": [3.0, 5.0] },
    "speed_cap": 90.0
}"#;

fn main() -> Result<(), LoadError> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let level = Level::from_json(LEVEL)?;
    let hero = EntityPrototype::from_json(HERO)?;
    let mut world = PhysicsWorld::new(
        WorldConfig {
            enable_timing: true,
            ..Default::default()
        },
        level,
    );
    let id = world.spawn(hero, Vec2::new(80.0, 40.0));
    let mut contacts = ColliderContacts::new(world.level().colliders().len());

    // Fake frame clock: 144 Hz with a hitch halfway through
    for frame in 0..360 {
        let elapsed = if frame == 180 { 0.25 } else { 1.0 / 144.0 };
        contacts.reset(world.level().colliders().len());

        match frame {
            60 => world.set_forces(id, Vec2::new(600.0, 0.0)),
            120 | 240 => {
                let jumped = world.jump(id);
                println!("frame {frame}: jump -> {jumped}");
            }
            300 => world.set_forces(id, Vec2::ZERO),
            _ => {}
        }

        let steps = world.advance(elapsed, &mut contacts);
        if frame % 30 == 0 {
            if let Some(s) = world.state(id) {
                let hits: Vec<usize> = contacts.hits().collect();
                println!(
                    "frame {frame:3} steps={steps} pos=({:.2},{:.2}) vel=({:.1},{:.1}) {:?} contacts={hits:?}",
                    s.position.x, s.position.y, s.velocity.x, s.velocity.y, s.motion
                );
            }
        }
        for ev in world.drain_events() {
            let name = world.level().zones().iter().find(|z| z.id == ev.zone).map(|z| z.name.as_str());
            println!("frame {frame}: body {:?} in zone {:?}", ev.body, name);
        }
    }

    if let Some((target, hit)) = world.raycast(Vec2::new(100.0, 50.0), Vec2::new(0.0, -1.0), 100.0) {
        println!("ray down from (100,50) hit {target:?} at t={:.2}", hit.t);
    }
    println!("stats: {:?}", world.debug_stats());
    if let Some(t) = world.timing() {
        println!("last step: {:.3} ms ({:.3} resolve)", t.step_ms, t.resolve_ms);
    }
    Ok(())
}
