//! The web backend: an HTTP listener for assets and an optional viewer
//! directory, a WebSocket listener for the control channel, and a flush loop
//! that batches pose updates at a fixed cadence.

mod asset_endpoint;
mod control_channel;
mod dirty;
mod publication;
mod sync;

use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};

use axum::Router;
use scene_common::{coordinates::AxisConvention, scene::CompiledScene, transform::Transform};
use tokio::{
    net::TcpListener,
    runtime::Runtime,
    task::JoinHandle,
    time::MissedTickBehavior,
};

pub use asset_endpoint::{asset_router, get_asset, get_scene_id};
pub use control_channel::{control_router, handle_control};
pub use dirty::DirtySet;
pub use publication::{visuals_node_name, Publication, VISUALS_SUFFIX};
pub use sync::{ClientSession, SyncState};

use crate::{backend::RenderBackend, config::ServerConfig, ServerError};

pub struct WebBackend {
    state: Arc<SyncState>,
    runtime: Option<Runtime>,
    tasks: Vec<JoinHandle<()>>,
    http_addr: SocketAddr,
    ws_addr: SocketAddr,
}

impl WebBackend {
    /// Binds both listeners and starts serving on a runtime owned by the
    /// backend, so the driver can stay synchronous. Must not be called from
    /// inside an async context.
    pub fn start(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("scene-sync")
            .build()
            .map_err(ServerError::Runtime)?;

        let state = Arc::new(SyncState::new(
            AxisConvention::Y_UP,
            config.hidden_groups.clone(),
        ));

        let (http_listener, ws_listener) = runtime.block_on(async {
            let http = bind(&config.host, config.http_port).await?;
            let ws = bind(&config.host, config.ws_port).await?;
            Ok::<_, ServerError>((http, ws))
        })?;
        let http_addr = http_listener.local_addr().map_err(ServerError::Runtime)?;
        let ws_addr = ws_listener.local_addr().map_err(ServerError::Runtime)?;

        let static_dir = config.static_dir.as_deref().map(Path::new);
        let tasks = vec![
            runtime.spawn(serve(
                "asset",
                http_listener,
                asset_router(state.clone(), static_dir),
            )),
            runtime.spawn(serve("control", ws_listener, control_router(state.clone()))),
            runtime.spawn(flush_loop(state.clone(), config.flush_interval())),
        ];
        log::info!("Serving assets on http://{http_addr}, control channel on ws://{ws_addr}");

        Ok(Self {
            state,
            runtime: Some(runtime),
            tasks,
            http_addr,
            ws_addr,
        })
    }

    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    pub fn ws_addr(&self) -> SocketAddr {
        self.ws_addr
    }

    pub fn state(&self) -> &Arc<SyncState> {
        &self.state
    }
}

impl RenderBackend for WebBackend {
    fn name(&self) -> &'static str {
        "web"
    }

    fn init_scene(&mut self, scene: Arc<CompiledScene>) -> Result<(), ServerError> {
        self.state.publish(scene)
    }

    fn update_transform(&mut self, name: &str, transform: Transform) -> Result<(), ServerError> {
        self.state.update_transform(name, transform)
    }

    /// False once closed or once a listener died.
    fn is_running(&self) -> bool {
        self.runtime.is_some() && self.tasks.iter().all(|task| !task.is_finished())
    }

    fn close(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
            log::info!("Web backend closed");
        }
    }
}

impl Drop for WebBackend {
    fn drop(&mut self) {
        self.close();
    }
}

async fn bind(host: &str, port: u16) -> Result<TcpListener, ServerError> {
    TcpListener::bind((host, port))
        .await
        .map_err(|source| ServerError::Bind {
            addr: format!("{host}:{port}"),
            source,
        })
}

async fn serve(label: &'static str, listener: TcpListener, router: Router) {
    if let Err(e) = axum::serve(listener, router).await {
        log::error!("The {label} listener stopped: {e}");
    }
}

async fn flush_loop(state: Arc<SyncState>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        if let Err(e) = state.flush() {
            log::error!("Flush failed: {e}");
        }
    }
}
