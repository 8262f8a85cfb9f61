use clap::{Parser, ValueEnum};
use tracing::Level;

#[derive(Parser)]
#[command(name = "dcfind")]
#[command(about = "Discover Active Directory sites and domain controllers.")]
pub struct CommandLine {
    /// Name of the AD/DNS domain to query
    #[arg(short = 'D', long)]
    pub domain: Option<String>,

    /// Name of a DC to contact directly instead of racing the domain
    #[arg(short = 'S', long)]
    pub server: Option<String>,

    /// Name of the site to query
    #[arg(short = 's', long)]
    pub site: Option<String>,

    /// Send a NETBIOS client name to aid the DC in determining the
    /// site; without a value the local hostname is sent
    #[arg(short = 'C', long, num_args = 0..=1, value_name = "NAME")]
    pub client: Option<Option<String>>,

    /// Send the client FQDN; without a value the local hostname is
    /// used, qualified with the domain when it has no dots of its own
    #[arg(short = 'F', long = "client-fqdn", num_args = 0..=1, value_name = "FQDN")]
    pub client_fqdn: Option<Option<String>>,

    /// Discover only the site name; prints just the site and takes
    /// precedence over `--format` and `--wrapper`
    #[arg(long)]
    pub discover_site: bool,

    /// Stop as soon as a single result is available
    #[arg(long)]
    pub eager: bool,

    /// Output format for the discovered DCs
    #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
    pub format: OutputFormat,

    /// Wrap the block output in a named outer element (implies
    /// `--format block`)
    #[arg(long, value_name = "NAME")]
    pub wrapper: Option<String>,

    /// Log info messages
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Log debug messages
    #[arg(short = 'd', long)]
    pub debug: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One hostname per discovered site DC
    Plain,
    /// Nested structured-text block
    Block,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn log_level(&self) -> Level {
        if self.debug {
            Level::DEBUG
        } else if self.verbose {
            Level::INFO
        } else {
            Level::WARN
        }
    }
}
