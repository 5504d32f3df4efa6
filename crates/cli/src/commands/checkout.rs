//! Checkout command.

use clap::{Args, ValueEnum};

use autonorte_client::checkout::CheckoutForm;
use autonorte_client::{StoreError, StorefrontSession};
use autonorte_core::{DeliveryType, PaymentMethod};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PaymentArg {
    Card,
    Transfer,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DeliveryArg {
    Pickup,
    Ship,
}

/// Arguments for `checkout`.
#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Payment method
    #[arg(long, value_enum)]
    pub payment: PaymentArg,
    /// Delivery type
    #[arg(long, value_enum)]
    pub delivery: DeliveryArg,
    /// Street address (ship only)
    #[arg(long, default_value = "")]
    pub street: String,
    /// Carrier county code (ship only)
    #[arg(long, default_value = "")]
    pub comuna: String,
    /// Carrier region id (ship only)
    #[arg(long, default_value = "")]
    pub region: String,
}

/// Validate and submit the order, printing the payment hand-off URL.
#[allow(clippy::print_stdout)]
pub async fn submit(session: &StorefrontSession, args: CheckoutArgs) -> Result<(), StoreError> {
    let delivery = match args.delivery {
        DeliveryArg::Pickup => DeliveryType::Pickup,
        DeliveryArg::Ship => DeliveryType::Ship,
    };
    session.set_delivery_type(delivery);

    let form = CheckoutForm {
        payment_method: Some(match args.payment {
            PaymentArg::Card => PaymentMethod::Card,
            PaymentArg::Transfer => PaymentMethod::Transfer,
        }),
        delivery_type: Some(delivery),
        street: args.street,
        comuna: args.comuna,
        region: args.region,
    };

    let outcome = session.checkout(&form).await?;
    println!("order {} created", outcome.order_id);
    println!("complete payment at: {}", outcome.payment_url);
    Ok(())
}
