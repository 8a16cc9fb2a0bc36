mod config;
mod lock;
mod monitor;
mod replication;
mod service;
mod storage;
mod tree;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use rmi::protocol::naming::{RegistrationHandler, ServiceHandler};
use rmi::Skeleton;

use config::{load_config, Config};
use monitor::Monitor;
use service::{NamingRegistration, NamingService};

#[derive(Parser, Debug)]
#[command(name = "naming-server", about = "Naming server for the distributed filesystem")]
struct Args {
    /// Port the client-facing Service interface listens on.
    #[arg(long)]
    service_port: Option<u16>,

    /// Port the Registration interface listens on.
    #[arg(long)]
    registration_port: Option<u16>,

    /// Replication factor alpha used by the replication controller.
    #[arg(long)]
    replication_factor: Option<f64>,

    /// Path to a TOML config file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let mut config: Config = load_config(&args.config);
    if let Some(port) = args.service_port {
        config.service_port = port;
    }
    if let Some(port) = args.registration_port {
        config.registration_port = port;
    }
    if let Some(alpha) = args.replication_factor {
        config.replication_factor = alpha;
    }

    let monitor = Arc::new(Monitor::with_replication_alpha(config.replication_factor));

    let service_addr: SocketAddr = ([0, 0, 0, 0], config.service_port).into();
    let service_skeleton = Skeleton::new(Some(service_addr), ServiceHandler(NamingService(monitor.clone())));
    if let Err(e) = service_skeleton.start() {
        tracing::error!(error = %e, "failed to start the Service listener");
        std::process::exit(1);
    }
    tracing::info!(addr = %service_addr, "Service listening");

    let registration_addr: SocketAddr = ([0, 0, 0, 0], config.registration_port).into();
    let registration_skeleton =
        Skeleton::new(Some(registration_addr), RegistrationHandler(NamingRegistration(monitor.clone())));
    if let Err(e) = registration_skeleton.start() {
        tracing::error!(error = %e, "failed to start the Registration listener");
        std::process::exit(1);
    }
    tracing::info!(addr = %registration_addr, "Registration listening");

    // Both skeletons run their own acceptor + worker threads; block here so
    // the process stays alive for their lifetime.
    loop {
        std::thread::park();
    }
}
