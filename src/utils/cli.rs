use clap::Parser;

/// Command line arguments of a chord-ring node.
#[derive(Parser, Debug)]
#[command(name = "chord-ring", about = "Chord DHT node")]
pub struct Cli {
    /// Numeric id of this node in the port table
    #[arg(long)]
    pub id: u32,

    /// Id of a node already in the ring to join through
    #[arg(long)]
    pub peer: Option<u32>,

    /// Path to the ini file mapping node ids to ports
    #[arg(long, default_value = "config.ini")]
    pub config: String,

    /// Optional bind address for the web interface, e.g. 127.0.0.1:9000
    #[arg(long)]
    pub web: Option<String>,

    /// Number of synthetic files seeded on a bootstrap node
    #[arg(long, default_value_t = 16)]
    pub files: usize,
}
