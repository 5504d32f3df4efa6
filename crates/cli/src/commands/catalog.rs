//! Catalog lookup command.

use autonorte_client::{StoreError, StorefrontSession};
use autonorte_core::ProductId;

/// Print one product from the public catalog.
#[allow(clippy::print_stdout)]
pub async fn show_product(session: &StorefrontSession, id: ProductId) -> Result<(), StoreError> {
    let product = session.catalog().product(id).await?;

    println!("{} - {}", product.id, product.name);
    println!("  price: {} (IVA incluido)", product.price);
    if let Some(stock) = product.stock {
        println!("  stock: {stock}");
    }
    if let Some(weight) = product.weight_kg {
        println!("  weight: {weight} kg");
    }
    Ok(())
}
