//! Carrier coverage and quote commands.

use clap::Args;

use autonorte_client::api::Destination;
use autonorte_client::{StoreError, StorefrontSession};

/// Arguments for `shipping quote`.
#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// Carrier region id (e.g. R13)
    #[arg(long)]
    pub region: String,
    /// Carrier county code (e.g. 13101)
    #[arg(long)]
    pub comuna: String,
    /// Street address
    #[arg(long)]
    pub address: String,
    /// Select this option index after quoting (default: first)
    #[arg(long)]
    pub select: Option<usize>,
}

/// List carrier coverage regions.
#[allow(clippy::print_stdout)]
pub async fn regions(session: &StorefrontSession) -> Result<(), StoreError> {
    for region in session.shipping_regions().await? {
        println!("{:<6} {}", region.region_id, region.region_name);
    }
    Ok(())
}

/// List carrier coverage counties for a region.
#[allow(clippy::print_stdout)]
pub async fn counties(session: &StorefrontSession, region_id: &str) -> Result<(), StoreError> {
    for county in session.shipping_counties(region_id).await? {
        println!("{:<8} {}", county.county_code, county.coverage_name);
    }
    Ok(())
}

/// Quote the current cart to a destination, optionally switching the
/// selected option.
#[allow(clippy::print_stdout)]
pub async fn quote(session: &StorefrontSession, args: QuoteArgs) -> Result<(), StoreError> {
    let destination = Destination {
        region: args.region,
        comuna: args.comuna,
        address: args.address,
    };

    let quotes = session.request_shipping_quotes(destination).await?;
    for (index, option) in quotes.iter().enumerate() {
        println!(
            "[{index}] {:<28} {:>10}  {}",
            option.name,
            option.cost.to_string(),
            option.eta
        );
    }

    if let Some(index) = args.select {
        let (option, totals) = session.select_shipping_option(index)?;
        println!("selected: {} ({})", option.name, option.cost);
        println!("grand total with shipping: {}", totals.grand_total);
    }
    Ok(())
}
