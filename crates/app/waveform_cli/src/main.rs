// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use clap::Parser;
use cli::{Cli, Commands};

mod cli;
mod commands;
mod logging;

fn main() -> Result<()> {
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<()> {
    logging::init()?;

    let args = Cli::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match args.command {
        Commands::Feed {
            breaking,
            category,
            limit,
            pages,
            offline,
            json,
            server,
        } => {
            let options = commands::FeedOptions {
                breaking,
                category,
                limit,
                pages: pages.max(1),
                offline,
                json,
            };
            runtime.block_on(commands::feed(options, &server))?;
        }
        Commands::Article { id, server } => runtime.block_on(commands::article(&id, &server))?,
        Commands::Event { id, server } => runtime.block_on(commands::event(&id, &server))?,
        Commands::Preview {
            url,
            context,
            server,
        } => runtime.block_on(commands::preview(&url, context.as_deref(), &server))?,
        Commands::Channels => commands::channels_list()?,
        Commands::Version => {
            println!(
                "{} {} (waveform_core {})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                waveform_core::version()
            );
        }
    }

    Ok(())
}
