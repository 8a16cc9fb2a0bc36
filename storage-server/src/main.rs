mod config;
mod disk;

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use clap::Parser;
use rmi::protocol::naming::{RegistrationStub, REGISTRATION_INTERFACE};
use rmi::protocol::storage::{CommandHandler, StorageHandler};
use rmi::{Path, Skeleton};

use config::{load_config, Config};
use disk::{DiskCommand, DiskStorage};

#[derive(Parser, Debug)]
#[command(name = "storage-server", about = "Storage server for the distributed filesystem")]
struct Args {
    /// Directory this server serves files out of.
    #[arg(long)]
    root: PathBuf,

    /// Naming server host to register with.
    #[arg(long)]
    naming_host: Option<String>,

    /// Naming server's Registration port.
    #[arg(long)]
    naming_registration_port: Option<u16>,

    /// Port the Storage interface listens on. 0 picks an ephemeral port.
    #[arg(long)]
    service_port: Option<u16>,

    /// Port the Command interface listens on. 0 picks an ephemeral port.
    #[arg(long)]
    command_port: Option<u16>,

    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let mut config: Config = load_config(&args.config);
    if let Some(host) = args.naming_host {
        config.naming_host = host;
    }
    if let Some(port) = args.naming_registration_port {
        config.naming_registration_port = port;
    }
    if let Some(port) = args.service_port {
        config.service_port = port;
    }
    if let Some(port) = args.command_port {
        config.command_port = port;
    }

    if let Err(e) = std::fs::create_dir_all(&args.root) {
        tracing::error!(root = %args.root.display(), error = %e, "could not create storage root");
        std::process::exit(1);
    }

    let storage_addr: SocketAddr = ([0, 0, 0, 0], config.service_port).into();
    let storage_skeleton = Skeleton::new(Some(storage_addr), StorageHandler(DiskStorage::new(args.root.clone())));
    if let Err(e) = storage_skeleton.start() {
        tracing::error!(error = %e, "failed to start the Storage listener");
        std::process::exit(1);
    }

    let command_addr: SocketAddr = ([0, 0, 0, 0], config.command_port).into();
    let command_skeleton = Skeleton::new(Some(command_addr), CommandHandler(DiskCommand::new(args.root.clone())));
    if let Err(e) = command_skeleton.start() {
        tracing::error!(error = %e, "failed to start the Command listener");
        std::process::exit(1);
    }

    let storage_local = storage_skeleton.local_addr().expect("just started");
    let command_local = command_skeleton.local_addr().expect("just started");
    tracing::info!(storage = %storage_local, command = %command_local, "listening");

    let paths = match Path::list(&args.root) {
        Ok(paths) => paths,
        Err(e) => {
            tracing::error!(error = %e, "failed to enumerate files under storage root");
            std::process::exit(1);
        }
    };

    let registration_addr: SocketAddr =
        match (config.naming_host.as_str(), config.naming_registration_port).to_socket_addrs() {
            Ok(mut addrs) => match addrs.next() {
                Some(addr) => addr,
                None => {
                    tracing::error!(host = %config.naming_host, "could not resolve naming server host");
                    std::process::exit(1);
                }
            },
            Err(e) => {
                tracing::error!(host = %config.naming_host, error = %e, "could not resolve naming server host");
                std::process::exit(1);
            }
        };
    let registration = RegistrationStub::at(registration_addr, REGISTRATION_INTERFACE);
    match registration.register(storage_local, command_local, paths) {
        Ok(duplicates) if duplicates.is_empty() => {
            tracing::info!("registered with the naming server");
        }
        Ok(duplicates) => {
            tracing::warn!(count = duplicates.len(), "naming server reported duplicate files already registered elsewhere");
        }
        Err(e) => {
            tracing::error!(error = %e, "registration with the naming server failed");
            std::process::exit(1);
        }
    }

    loop {
        std::thread::park();
    }
}
