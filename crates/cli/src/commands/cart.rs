//! Cart commands over the hybrid cart.

use autonorte_client::cart::CartKind;
use autonorte_client::{StoreError, StorefrontSession};
use autonorte_core::ProductId;

/// Print the cart lines and totals.
#[allow(clippy::print_stdout)]
pub async fn list(session: &StorefrontSession) -> Result<(), StoreError> {
    let view = session.cart_view().await?;

    if view.lines.is_empty() {
        println!("cart is empty");
        return Ok(());
    }

    for line in &view.lines {
        // Pesos has a custom Display, so pad the rendered string.
        println!(
            "{:>3} x {:<32} {:>10}  ({} c/u)",
            line.quantity,
            line.name,
            line.line_subtotal.to_string(),
            line.unit_price
        );
    }
    println!("  net:      {}", view.totals.net);
    println!("  IVA:      {}", view.totals.iva);
    if view.totals.shipping.is_positive() {
        println!("  shipping: {}", view.totals.shipping);
    }
    println!("  total:    {}", view.totals.grand_total);
    Ok(())
}

/// Add a product to whichever cart applies.
#[allow(clippy::print_stdout)]
pub async fn add(
    session: &StorefrontSession,
    id: ProductId,
    quantity: u32,
) -> Result<(), StoreError> {
    let kind = session.add_to_cart(id, quantity).await?;
    match kind {
        CartKind::Server => println!("added to your account cart"),
        CartKind::Guest => println!("added to the guest cart (log in to keep it)"),
    }
    Ok(())
}

/// Remove a product from whichever cart applies.
#[allow(clippy::print_stdout)]
pub async fn remove(session: &StorefrontSession, id: ProductId) -> Result<(), StoreError> {
    if session.is_authenticated().await {
        session.cart().server().remove_item(id).await?;
    } else {
        session.cart().guest().remove(id)?;
    }
    println!("removed product {id}");
    Ok(())
}

/// Print the badge count.
#[allow(clippy::print_stdout)]
pub async fn count(session: &StorefrontSession) -> Result<(), StoreError> {
    let count = session.cart_badge_count().await?;
    println!("{count}");
    Ok(())
}
