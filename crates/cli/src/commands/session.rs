//! Account session commands.

use autonorte_client::{StoreError, StorefrontSession};

/// Print the logged-in account's profile.
#[allow(clippy::print_stdout)]
pub async fn show_profile(session: &StorefrontSession) -> Result<(), StoreError> {
    let profile = session.profile().await?;
    println!("user:  {}", profile.username);
    println!("email: {}", profile.email);
    Ok(())
}
