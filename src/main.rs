mod pendulum;
mod time;

use std::{sync::Arc, time::Duration};

use env_logger::Env;
use pendulum::Pendulum;
use scene_common::scene::PoseSnapshot;
use scene_server::{build_scene, create_backend, BackendKind, ServerConfig};
use time::StepClock;

const CONFIG_VAR: &str = "SCENE_STREAM_CONFIG";
const BACKEND_VAR: &str = "SCENE_STREAM_BACKEND";

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match std::env::var(CONFIG_VAR) {
        Ok(path) => ServerConfig::load(path)?,
        Err(_) => ServerConfig::default(),
    };
    let kind = match std::env::var(BACKEND_VAR) {
        Ok(name) => name.parse::<BackendKind>()?,
        Err(_) => BackendKind::default(),
    };

    let scene = Arc::new(build_scene(&pendulum::model())?);
    let mut backend = create_backend(kind, &config)?;
    backend.init_scene(scene.clone())?;
    if kind == BackendKind::Web {
        log::info!(
            "Viewer assets on http://{}:{}, control channel on ws://{}:{}",
            config.host,
            config.http_port,
            config.host,
            config.ws_port
        );
    }

    let mut pendulum = Pendulum::new(1.0);
    let mut clock = StepClock::new(Duration::from_millis(2));
    while backend.is_running() {
        let steps = clock.update();
        if steps > 0 {
            for _ in 0..steps {
                pendulum.step(clock.step_seconds());
            }
            let world = pendulum.world_poses(&scene.graph);
            let poses = PoseSnapshot::from_world_poses(&scene.graph, &world)?;
            backend.update_scene(&poses)?;
        }
        std::thread::sleep(Duration::from_millis(1));
    }

    backend.close();
    Ok(())
}
