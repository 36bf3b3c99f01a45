//! CLI for chatrelay
//!
//! Subcommands:
//! - `server`: run the relay server until interrupted
//! - `client`: connect to a server and chat from the console

use std::io;
use std::process;

use chatrelay::client::ChatClient;
use chatrelay::config::{Settings, load_config};
use chatrelay::transport::Server;
use chatrelay::utils::logging;
use clap::{Args, Parser};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "chatrelay", version)]
enum Command {
    /// Start the relay server
    Server(EndpointArgs),
    /// Connect to a relay server and chat from the console
    Client(EndpointArgs),
}

#[derive(Args, Debug, Clone)]
struct EndpointArgs {
    /// Host to bind to (server) or connect to (client)
    #[arg(long)]
    host: Option<String>,
    /// TCP port
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,
    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl EndpointArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(host) = &self.host {
            settings.server.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        settings.server.debug |= self.debug;
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cmd = Command::parse();

    let mut settings = match load_config() {
        Ok(settings) => settings,
        Err(e) => {
            logging::init("info");
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };
    let args = match &cmd {
        Command::Server(args) | Command::Client(args) => args,
    };
    args.apply(&mut settings);
    logging::init(logging::level_for(settings.server.debug));

    let outcome = match cmd {
        Command::Server(_) => run_server(settings).await,
        Command::Client(_) => run_client(settings).await,
    };

    // Shutdown never drains what is still buffered; leftover client threads
    // die with the process.
    match outcome {
        Ok(()) => process::exit(0),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}

async fn run_server(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let server = Server::bind(&settings)?;
    let shutdown = server.shutdown_handle()?;
    let mut serving = tokio::task::spawn_blocking(move || server.serve());

    tokio::select! {
        result = &mut serving => {
            error!("Server exited unexpectedly.");
            result??;
            return Ok(());
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Disconnecting server because of keyboard interruption.");
        }
    }

    shutdown.shutdown();
    serving.await??;
    Ok(())
}

async fn run_client(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    settings.server.validate()?;
    let client = ChatClient::connect(&settings.server.host, settings.server.port)?;
    println!("Listening for messages from the server...");
    tokio::task::spawn_blocking(move || client.run(io::stdin().lock(), io::stdout())).await??;
    Ok(())
}
