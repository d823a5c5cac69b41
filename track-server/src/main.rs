use clap::Parser;
use env_logger::Env;
use log::{error, info};
use std::sync::Arc;

use track_server::net::{resolve, start_server};
use track_server::state::run_tick_loop;
use track_server::{CourseLayout, ServerArgs, ServerResult, ServerState, Simulation, SimulationConfig};

#[tokio::main]
async fn main() -> ServerResult<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = ServerArgs::parse();
    info!("Starting track server...");

    let sim = Simulation::new(SimulationConfig::with_tick_rate(args.tick_rate), CourseLayout::default());
    let state = ServerState::shared(sim);

    let addr = resolve(&args.bind_addr()).await?;
    let (bound, server) = start_server(addr, args.static_dir.clone(), Arc::clone(&state))?;
    if args.static_dir.is_some() {
        info!("Open http://localhost:{} in your browser", bound.port());
    }

    let net_handle = tokio::spawn(server);
    let loop_handle = tokio::spawn(run_tick_loop(Arc::clone(&state), args.tick_rate));

    tokio::select! {
        result = net_handle => {
            if let Err(e) = result {
                error!("Network task panicked: {}", e);
            }
        }
        result = loop_handle => {
            if let Err(e) = result {
                error!("Simulation loop panicked: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    Ok(())
}
