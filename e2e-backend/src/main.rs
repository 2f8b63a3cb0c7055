use clap::Parser as _;
use e2e_backend::{config::Config, logging};
use http_common::BoxError;

#[derive(Debug, clap::Parser)]
struct Args {
    /// The port to listen on. Overrides E2E_BACKEND_PORT.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    match main_inner().await {
        Ok(()) => {}
        Err(e) => {
            // Manually print the error so we can control the format.
            eprintln!("Exiting with error: {e}");
            std::process::exit(1);
        }
    }
}

async fn main_inner() -> Result<(), BoxError> {
    logging::init();

    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }

    let (_app, server) = e2e_backend::serve(config).await?;
    server.await
}
