use clap::error::ErrorKind;
use clap::Parser;
use log::error;
use server::config::{Args, ServerConfig};
use server::error::ServerError;
use server::network::Server;
use std::process;

/// Main-method of the server.
/// Parses command-line arguments, binds the listening socket and serves one game.
fn main() {
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

    if let Err(e) = run(&args) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn run(args: &Args) -> Result<(), ServerError> {
    let config = ServerConfig::from_args(args)?;
    let server = Server::bind(&config)?;
    server.run()
}
