//! Command handlers.

use crate::commands::{GenerateArgs, LicenseTypeArg, ProductArgs};
use crate::config::CliConfig;
use crate::output;
use keyforge_core::ids::ProductId;
use keyforge_core::license::LicenseKey;
use keyforge_core::ports::LicenseRepository;
use keyforge_core::product::{DigitalProduct, LicenseType};
use keyforge_core::validation::InvalidReason;
use keyforge_db::Database;
use keyforge_licensing::{CustomSettings, LicenseService};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

type HandlerResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid product id: {0}")]
    InvalidProductId(String),

    #[error("No license with that key")]
    LicenseNotFound,

    #[error("License rejected: {0:?}")]
    Rejected(InvalidReason),
}

async fn connect(config: &CliConfig) -> Result<Database, Box<dyn std::error::Error>> {
    Ok(Database::connect(&config.database_url).await?)
}

async fn service(config: &CliConfig) -> Result<LicenseService, Box<dyn std::error::Error>> {
    let db = connect(config).await?;
    Ok(LicenseService::new(
        Arc::new(db.licenses()),
        Arc::new(db.products()),
        Arc::new(db.alerts()),
        config.licensing.clone(),
    ))
}

fn parse_product_id(raw: &str) -> Result<ProductId, CliError> {
    raw.parse()
        .map_err(|_| CliError::InvalidProductId(raw.to_string()))
}

async fn require_license(service: &LicenseService, key: &str) -> Result<LicenseKey, Box<dyn std::error::Error>> {
    Ok(service.lookup(key).await?.ok_or(CliError::LicenseNotFound)?)
}

pub async fn migrate(config: &CliConfig) -> HandlerResult {
    let db = connect(config).await?;
    db.migrate().await?;
    info!("Migrations applied");
    Ok(())
}

pub async fn add_product(config: &CliConfig, args: ProductArgs) -> HandlerResult {
    let id = match args.id.as_deref() {
        Some(raw) => parse_product_id(raw)?,
        None => ProductId::new(),
    };
    let product = DigitalProduct {
        id,
        name: args.name,
        download_limit: args.download_limit,
        license_type: match args.license_type {
            LicenseTypeArg::Single => LicenseType::Single,
            LicenseTypeArg::Multi => LicenseType::Multi,
            LicenseTypeArg::Unlimited => LicenseType::Unlimited,
        },
        access_duration_days: args.duration_days,
        requires_activation: !args.no_activation,
        key_prefix: args.prefix,
    };

    let db = connect(config).await?;
    db.products().upsert(&product).await?;
    info!(product_id = %product.id, "Product saved");
    output::products(config.output_format, std::slice::from_ref(&product))?;
    Ok(())
}

pub async fn list_products(config: &CliConfig) -> HandlerResult {
    let db = connect(config).await?;
    let products = db.products().list().await?;
    output::products(config.output_format, &products)?;
    Ok(())
}

pub async fn generate(config: &CliConfig, args: GenerateArgs) -> HandlerResult {
    let product_id = parse_product_id(&args.product)?;
    let settings = CustomSettings {
        max_activations: args.max_activations,
        max_downloads: args.max_downloads,
        access_duration_days: args.duration_days,
        key_prefix: args.prefix,
    };

    let service = service(config).await?;
    let license = service
        .generate(product_id, &args.email, &args.order, Some(settings))
        .await?;
    output::license(config.output_format, &license)?;
    Ok(())
}

pub async fn validate(config: &CliConfig, key: &str, device: &str) -> HandlerResult {
    let service = service(config).await?;
    let result = service.validate(key, device).await;
    output::validation(config.output_format, &result)?;
    match result.reason {
        Some(reason) => Err(CliError::Rejected(reason).into()),
        None => Ok(()),
    }
}

pub async fn download(config: &CliConfig, key: &str) -> HandlerResult {
    let service = service(config).await?;
    let result = service.record_download(key).await;
    output::download(config.output_format, &result)?;
    match result.reason {
        Some(reason) => Err(CliError::Rejected(reason).into()),
        None => Ok(()),
    }
}

pub async fn show(config: &CliConfig, key: &str) -> HandlerResult {
    let service = service(config).await?;
    let license = require_license(&service, key).await?;
    output::license(config.output_format, &license)?;
    Ok(())
}

pub async fn alerts(config: &CliConfig, key: &str) -> HandlerResult {
    let db = connect(config).await?;
    let license = db
        .licenses()
        .get_by_key(key)
        .await?
        .ok_or(CliError::LicenseNotFound)?;
    let alerts = db.alerts().list_for_license(license.id).await?;
    output::alerts(config.output_format, &alerts)?;
    Ok(())
}

pub fn show_config(config: &CliConfig) -> HandlerResult {
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}

pub fn show_config_path() -> HandlerResult {
    println!("{}", CliConfig::config_path()?.display());
    Ok(())
}
