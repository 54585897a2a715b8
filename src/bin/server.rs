use clap::Parser;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;

use framekv::codec::DEFAULT_MAX_FRAME_SIZE;
use framekv::server;
use framekv::Error;

const PORT: u16 = 7878;

#[derive(Parser, Debug)]
struct Args {
    /// The address to bind
    #[arg(short, long, env = "FRAMEKV_ADDRESS", default_value = "127.0.0.1")]
    address: String,

    /// The port to listen on
    #[arg(short, long, env = "FRAMEKV_PORT", default_value_t = PORT)]
    port: u16,

    /// Seconds a connection may go without a complete frame before it is closed
    #[arg(long, env = "FRAMEKV_IDLE_TIMEOUT", default_value_t = 60)]
    idle_timeout: u64,

    /// Maximum frame payload size in bytes
    #[arg(long, env = "FRAMEKV_MAX_FRAME_SIZE", default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    max_frame_size: usize,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    tracing_subscriber::fmt::init();

    // A bind failure (address in use, permission denied) is the one
    // process-fatal error; everything past this point is contained per
    // connection.
    let listener = match TcpListener::bind((args.address.as_str(), args.port)).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("failed to bind {}:{}: {}", args.address, args.port, e);
            std::process::exit(1);
        }
    };

    let config = server::Config {
        idle_timeout: Duration::from_secs(args.idle_timeout),
        max_frame_size: args.max_frame_size,
    };

    server::run(listener, config, signal::ctrl_c()).await
}
