use clap::error::ErrorKind;
use clap::Parser;
use client::network::{Client, Ending};
use client::rendering;
use log::{error, info};
use shared::DEFAULT_PORT;
use std::process;
use tokio::io::BufReader;

#[derive(Parser, Debug)]
#[command(author, version, about = "Interactive Nim client", long_about = None)]
struct Args {
    /// Server host name or address
    #[arg(default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            process::exit(code);
        }
    };

    // Exit explicitly: the runtime would otherwise wait on the blocking stdin read
    process::exit(play(args).await);
}

async fn play(args: Args) -> i32 {
    let mut client = match Client::connect(&args.host, args.port).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error connecting to server: {}", e);
            return e.exit_code();
        }
    };

    let input = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    match client.run(input, &mut stdout).await {
        Ok(Ending::Rejected) => 1,
        Ok(Ending::Disconnected) => {
            println!("{}", rendering::DISCONNECTED);
            0
        }
        Ok(ending) => {
            info!("Session ended: {:?}", ending);
            0
        }
        Err(e) => {
            error!("Connection failed: {}", e);
            println!("{}", rendering::DISCONNECTED);
            0
        }
    }
}
