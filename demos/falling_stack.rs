use arcade_physics::*;
use tracing::info;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut world: PhysicsWorld = PhysicsWorld::new(WorldConfig {
        enable_timing: true,
        ..Default::default()
    });

    let floor = world.create_static_box(Vec2::new(0.0, 300.0), Vec2::new(400.0, 20.0));
    let mut stack = Vec::new();
    for i in 0..8 {
        let y = 260.0 - i as f32 * 42.0;
        let half = Vec2::splat(20.0);
        stack.push(world.create_box_body(Vec2::new(0.0, y), half, Material::WOOD));
    }
    let ball = world.add_body(
        BodyDesc::new(Collider::circle(12.0))
            .with_position(Vec2::new(-300.0, 100.0))
            .with_velocity(Vec2::new(600.0, -200.0))
            .with_material(Material::RUBBER)
            .with_tag("ball"),
    );
    let sensor = world.add_body(
        BodyDesc::new(Collider::rect(30.0, 200.0))
            .with_position(Vec2::new(200.0, 100.0))
            .static_body()
            .sensor(),
    );
    info!(?floor, ?ball, ?sensor, boxes = stack.len(), "scene built");

    world.on_collision_start(move |w, ev| {
        if ev.body_a == ball || ev.body_b == ball {
            let speed = w.body(ball).map(|b| b.velocity.length()).unwrap_or(0.0);
            info!(a = ?ev.body_a, b = ?ev.body_b, depth = ev.manifold.depth, speed, "ball contact");
        }
    });
    world.on_sensor_trigger(|w, ev| {
        let tag = [ev.body_a, ev.body_b]
            .into_iter()
            .find_map(|h| w.body(h).and_then(|b| b.tag.clone()))
            .unwrap_or_else(|| "untagged".to_string());
        info!(%tag, "sensor entered");
    });

    for frame in 0..240 {
        world.step(1.0 / 60.0);
        if frame % 60 == 0 {
            let s = world.debug_stats();
            info!(
                frame,
                awake = s.awake_bodies,
                pairs = s.unique_pairs,
                manifolds = s.manifolds,
                "stats"
            );
            if let Some(t) = world.timing() {
                info!(
                    "timing: step={:.3}ms (broad={:.3}ms narrow={:.3}ms solve={:.3}ms)",
                    t.step_ms, t.broad_phase_ms, t.narrow_phase_ms, t.solve_ms
                );
            }
        }
    }

    let down = Vec2::new(0.0, 1.0);
    if let Some(hit) = world.raycast(Vec2::new(0.0, -500.0), down, 2000.0, None) {
        info!(body = ?hit.body, distance = hit.distance, "top of stack");
    }
    for (i, h) in stack.iter().enumerate() {
        if let Some(b) = world.body(*h) {
            info!(i, x = b.position.x, y = b.position.y, angle = b.angle, "box");
        }
    }
    let sleeping = stack
        .iter()
        .filter(|h| world.body(**h).is_some_and(|b| b.sleeping()))
        .count();
    info!(sleeping, total = stack.len(), "done");
}
