//! Rendering of command results.

use crate::config::OutputFormat;
use keyforge_core::alert::PiracyAlert;
use keyforge_core::license::LicenseKey;
use keyforge_core::product::DigitalProduct;
use keyforge_core::validation::{DownloadResult, ValidationResult};
use serde::Serialize;

fn json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn license(format: OutputFormat, license: &LicenseKey) -> Result<(), serde_json::Error> {
    if format == OutputFormat::Json {
        return json(license);
    }
    println!("ID:           {}", license.id);
    println!("Key:          {}", license.key_string);
    println!("Product:      {}", license.product_id);
    println!("Customer:     {} (order {})", license.customer_email, license.customer_order_id);
    println!("Status:       {:?}", license.status);
    println!("Downloads:    {}/{}", license.download_count, license.max_downloads);
    println!(
        "Activations:  {}/{}",
        license.activation_count(),
        license.max_activations()
    );
    for device in license.activations.devices() {
        println!("  - {}", device);
    }
    println!("Expires:      {}", or_dash(license.expires_at));
    println!("Last access:  {}", or_dash(license.last_accessed_at));
    println!("Created:      {}", license.created_at);
    Ok(())
}

pub fn validation(format: OutputFormat, result: &ValidationResult) -> Result<(), serde_json::Error> {
    if format == OutputFormat::Json {
        return json(result);
    }
    if result.valid {
        println!("VALID");
        println!("Product:               {}", or_dash(result.product_name.as_deref()));
        println!("Expires:               {}", or_dash(result.expires_at));
        println!("Downloads remaining:   {}", or_dash(result.downloads_remaining));
        println!("Activations remaining: {}", or_dash(result.activations_remaining));
    } else {
        println!("INVALID ({})", or_dash(result.reason.map(|r| format!("{:?}", r))));
    }
    Ok(())
}

pub fn download(format: OutputFormat, result: &DownloadResult) -> Result<(), serde_json::Error> {
    if format == OutputFormat::Json {
        return json(result);
    }
    if result.allowed {
        println!("ALLOWED ({} remaining)", or_dash(result.downloads_remaining));
    } else {
        println!("DENIED ({})", or_dash(result.reason.map(|r| format!("{:?}", r))));
    }
    Ok(())
}

pub fn products(format: OutputFormat, products: &[DigitalProduct]) -> Result<(), serde_json::Error> {
    if format == OutputFormat::Json {
        return json(&products);
    }
    println!("{:<42} {:<24} {:<10} {:>9} {:>6}", "ID", "NAME", "TYPE", "DOWNLOADS", "DAYS");
    for product in products {
        println!(
            "{:<42} {:<24} {:<10} {:>9} {:>6}",
            product.id.to_string(),
            product.name,
            format!("{:?}", product.license_type).to_lowercase(),
            product.download_limit,
            or_dash(product.access_duration_days)
        );
    }
    Ok(())
}

pub fn alerts(format: OutputFormat, alerts: &[PiracyAlert]) -> Result<(), serde_json::Error> {
    if format == OutputFormat::Json {
        return json(&alerts);
    }
    if alerts.is_empty() {
        println!("No alerts.");
        return Ok(());
    }
    for alert in alerts {
        println!(
            "{}  {:?}/{:?}  {}",
            alert.created_at, alert.alert_type, alert.severity, alert.details
        );
    }
    Ok(())
}
