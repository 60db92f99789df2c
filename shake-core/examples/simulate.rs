//! Run a shake against an in-memory scene and print every frame.
//!
//! ```bash
//! RUST_LOG=debug cargo run -p shake-core --example simulate
//! ```

use serde_json::json;
use shake_core::{ItemId, MockScene, Position, ShakeScript, TickOutcome};
use std::thread;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let scene = MockScene::new()
        .with_item("Webcam", Position::new(1280.0, 720.0))
        .with_item("Chat", Position::new(40.0, 600.0))
        .with_item("Alert", Position::new(960.0, 120.0));

    let mut script = ShakeScript::new(scene);
    script.update(&json!({ "duration": 0.75, "magnitude": 60.0, "frequency": 20.0 }));

    let interval = script.controller().config().update_interval();
    println!("Triggering: {:?}", script.trigger());

    let mut frame = 0;
    loop {
        thread::sleep(interval);
        let outcome = script.tick(interval.as_secs_f64());
        frame += 1;

        let scene = script.controller().host();
        let positions: Vec<String> = scene
            .item_ids()
            .map(|id: ItemId| format!("{}={}", scene.name(id), scene.position(id)))
            .collect();
        println!("frame {frame:>3} {outcome:?}: {}", positions.join(" "));

        if outcome != TickOutcome::Shaking {
            break;
        }
    }
}
