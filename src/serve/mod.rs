//! Development server with live update support.
//!
//! Startup order: allocate ports, create the build context, attach the file
//! watcher, write the embedded runtime assets, run the initial build, bind
//! the HTTP listener, then hand the build context to the actor system and
//! enter the request loop. The watcher goes up before the initial build so
//! edits made while it runs are buffered rather than missed.

mod inject;
mod path;
pub mod port;
mod response;

use crate::actor::{Coordinator, WatchHandles};
use crate::config::DevConfig;
use crate::pipeline::{AssetPipeline, BuildResult, SyntaxCheckCompiler, render_diagnostics};
use crate::{debug, embed, log};
use anyhow::Result;
use crossbeam::channel::{self, Receiver};
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tiny_http::{Method, Request, Server};

/// Run the development server until shutdown.
pub fn run(config: DevConfig) -> Result<()> {
    let config = Arc::new(config);

    // The update channel port goes into the served pages, so it has to be
    // settled before the first document leaves the gateway
    let ws_port = config
        .serve
        .watch
        .then(|| port::allocate(config.serve.interface, config.serve.ws_port))
        .transpose()?;

    let mut pipeline = AssetPipeline::new(&config, Box::new(SyntaxCheckCompiler))?;

    // Watch before building: edits made during the initial build buffer in
    // the actor channel instead of falling into a blind window
    let watch = ws_port
        .map(|_| WatchHandles::new(&config.source_dir()))
        .transpose()?;

    if let Some(ws_port) = ws_port {
        embed::write_runtime_assets(&config.output_dir(), ws_port)?;
        debug!("hotreload"; "ws://localhost:{}", ws_port);
    }

    let pending_error = run_initial_build(&mut pipeline);

    let http_port = port::allocate(config.serve.interface, config.serve.port)?;
    let addr = SocketAddr::new(config.serve.interface, http_port);
    let server =
        Server::http(addr).map_err(|e| anyhow::anyhow!("failed to bind {}: {}", addr, e))?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    crate::core::register_server(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}", addr);

    let actor_handle = spawn_actors(
        Arc::clone(&config),
        ws_port.zip(watch),
        pipeline,
        pending_error,
        shutdown_rx,
    );

    run_request_loop(&server, &config, ws_port.is_some());
    wait_for_shutdown(actor_handle);
    Ok(())
}

/// Initial full build. A failure does not abort startup: the gateway serves
/// whatever is on disk and the error is replayed to clients as they connect.
fn run_initial_build(pipeline: &mut AssetPipeline) -> Option<String> {
    match pipeline.build_all() {
        BuildResult::Success { changed, .. } => {
            log!("build"; "{} modules built", changed.len());
            None
        }
        BuildResult::Failure { diagnostics } => {
            let text = render_diagnostics(&diagnostics);
            log!("error"; "build failed:\n{}", text);
            Some(text)
        }
    }
}

/// Spawn the actor system for file watching and live updates.
fn spawn_actors(
    config: Arc<DevConfig>,
    watch: Option<(u16, WatchHandles)>,
    pipeline: AssetPipeline,
    pending_error: Option<String>,
    shutdown_rx: Receiver<()>,
) -> Option<JoinHandle<()>> {
    let (ws_port, watch) = watch?;

    Some(thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("failed to create tokio runtime");

        rt.block_on(async {
            let mut coordinator = Coordinator::new(config, pipeline, ws_port, watch)
                .with_shutdown_signal(shutdown_rx);
            if let Some(error) = pending_error {
                coordinator = coordinator.with_pending_error(error);
            }
            if let Err(e) = coordinator.run().await {
                log!("actor"; "error: {}", e);
            }
        });
    }))
}

fn run_request_loop(server: &Server, config: &Arc<DevConfig>, inject: bool) {
    // Use a thread pool to handle requests concurrently
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .expect("failed to create thread pool");

    for request in server.incoming_requests() {
        let config = Arc::clone(config);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &config, inject) {
                log!("serve"; "request error: {e}");
            }
        });
    }
}

/// Handle a single HTTP request.
fn handle_request(request: Request, config: &DevConfig, inject: bool) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    if request.method() == &Method::Options {
        return response::respond_options(request);
    }

    let prefix = inject.then(|| config.output_url_prefix());
    if let Some(path) = path::resolve_path(request.url(), &config.public_dir()) {
        return response::respond_file(request, &path, prefix.as_deref());
    }

    response::respond_not_found(request)
}

/// Wait for the actor system to shut down gracefully (max 2 seconds).
fn wait_for_shutdown(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(std::time::Duration::from_millis(50));
    }
}
