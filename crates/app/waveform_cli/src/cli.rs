use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "waveform", version, about = "Read the Waveform news feed from a terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Base URL of a running Waveform server.
    #[arg(long, env = "WAVEFORM_SERVER", default_value = "http://127.0.0.1:8788")]
    pub server: String,

    /// Outbound request timeout in seconds.
    #[arg(long, default_value_t = 20)]
    pub timeout: u64,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Page through top stories or breaking news.
    Feed {
        /// Read breaking news instead of top stories.
        #[arg(long)]
        breaking: bool,

        /// Restrict to one category slug (see `channels`).
        #[arg(long)]
        category: Option<String>,

        /// Events per page.
        #[arg(long)]
        limit: Option<u32>,

        /// Maximum number of pages to load.
        #[arg(long, default_value_t = 1)]
        pages: u32,

        /// Serve the bundled sample events instead of calling a server.
        #[arg(long)]
        offline: bool,

        /// Print events as JSON lines.
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        server: ServerArgs,
    },
    /// Fetch one article by id.
    Article {
        id: String,

        #[command(flatten)]
        server: ServerArgs,
    },
    /// Fetch one event by id.
    Event {
        id: String,

        #[command(flatten)]
        server: ServerArgs,
    },
    /// Show the link preview for a URL.
    Preview {
        url: String,

        /// Rendering context; `card` omits the image.
        #[arg(long)]
        context: Option<String>,

        #[command(flatten)]
        server: ServerArgs,
    },
    /// List feed categories.
    Channels,
    /// Print version information.
    Version,
}
