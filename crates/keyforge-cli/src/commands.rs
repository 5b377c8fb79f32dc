//! CLI command definitions.

use clap::{Args, Subcommand, ValueEnum};

#[derive(Subcommand)]
pub enum Commands {
    /// Apply database migrations
    Migrate,

    /// Manage the catalog mirror
    Product {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// Issue a license key
    Generate(GenerateArgs),

    /// Validate a license key for a device
    Validate {
        /// License key
        key: String,

        /// Device fingerprint
        #[arg(short, long)]
        device: String,
    },

    /// Record a download against a license key
    Download {
        /// License key
        key: String,
    },

    /// Show a license
    Show {
        /// License key
        key: String,
    },

    /// List piracy alerts raised for a license
    Alerts {
        /// License key
        key: String,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ProductCommands {
    /// Add or update a product
    Add(ProductArgs),
    /// List products
    List,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Print the configuration file path
    Path,
}

#[derive(Args)]
pub struct ProductArgs {
    /// Product ID (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Display name
    #[arg(long)]
    pub name: String,

    /// Downloads allowed per license
    #[arg(long, default_value_t = 5)]
    pub download_limit: u32,

    /// License type
    #[arg(long, value_enum, default_value_t = LicenseTypeArg::Single)]
    pub license_type: LicenseTypeArg,

    /// Access window in days (perpetual when omitted)
    #[arg(long)]
    pub duration_days: Option<u32>,

    /// Do not bind licenses to devices
    #[arg(long)]
    pub no_activation: bool,

    /// Key prefix for this product
    #[arg(long)]
    pub prefix: Option<String>,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Product ID
    #[arg(short, long)]
    pub product: String,

    /// Customer email
    #[arg(short, long)]
    pub email: String,

    /// Order ID from the commerce platform
    #[arg(short, long)]
    pub order: String,

    /// Override the activation quota
    #[arg(long)]
    pub max_activations: Option<u32>,

    /// Override the download quota
    #[arg(long)]
    pub max_downloads: Option<u32>,

    /// Override the access window in days
    #[arg(long)]
    pub duration_days: Option<u32>,

    /// Override the key prefix
    #[arg(long)]
    pub prefix: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LicenseTypeArg {
    Single,
    Multi,
    Unlimited,
}
