use getmeds_core::{AppConfig, RetailerConfig};

pub(crate) fn format_retailer(retailer: &RetailerConfig) -> String {
    let strategy = retailer.strategy.to_string();
    format!(
        "{:<14}{:<18}{:<10}{}",
        retailer.name,
        strategy,
        if retailer.enabled { "yes" } else { "no" },
        retailer.endpoint.as_deref().unwrap_or("-")
    )
}

/// Prints the retailer registry.
///
/// # Errors
///
/// Returns an error if the registry file cannot be read or is invalid.
pub(crate) fn run_list_retailers(config: &AppConfig) -> anyhow::Result<()> {
    let registry = getmeds_core::load_retailers(&config.retailers_path)?;

    if registry.retailers.is_empty() {
        println!(
            "no retailers configured in {}; searches will serve demo data",
            config.retailers_path.display()
        );
        return Ok(());
    }

    println!("{:<14}{:<18}{:<10}ENDPOINT", "NAME", "STRATEGY", "ENABLED");
    for retailer in &registry.retailers {
        println!("{}", format_retailer(retailer));
    }
    if !config.use_relay {
        tracing::warn!("relay disabled; stateful_session retailers will fail");
    }

    Ok(())
}
