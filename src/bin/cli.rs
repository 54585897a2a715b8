use clap::{Parser, Subcommand};

use framekv::client::Client;
use framekv::Error;

#[derive(Parser, Debug)]
struct Args {
    /// Address of the server, host:port
    #[arg(short, long, env = "FRAMEKV_SERVER", default_value = "127.0.0.1:7878")]
    address: String,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Fetch the value stored under a key
    Get { key: String },
    /// Store a value under a key
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    let mut client = Client::connect(args.address.as_str()).await?;

    match args.command {
        Cmd::Get { key } => match client.get(&key).await? {
            Some(value) => println!("{}", String::from_utf8_lossy(&value)),
            None => println!("(not found)"),
        },
        Cmd::Set { key, value } => {
            client.set(&key, value).await?;
            println!("OK");
        }
    }

    Ok(())
}
