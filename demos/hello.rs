use anyhow::Error;
use clap::Parser;
use olympus_http::{DefaultHandler, Server, ServerOptions};

/// Greets every request with the default page.
#[derive(Debug, Parser)]
#[command(name = "hello")]
struct Args {
    /// Preferred port, the next free one is used if it's taken
    #[arg(short, long, default_value = "8000", env = "OLYMPUS_PORT")]
    port: u16,

    /// Log filter, used when RUST_LOG isn't set
    #[arg(long, default_value = "debug", env = "OLYMPUS_LOG")]
    log: String,
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    devutils::init_logging(&args.log);

    let options = ServerOptions {
        port: args.port,
        ..ServerOptions::default()
    };
    let mut server = Server::bind(options, DefaultHandler)?;

    server.run()?;

    Ok(())
}
