//! Navigation shell inspection.
//!
//! Mounts the same shell the UI embeds (one category fetch, one cart fetch
//! when signed in) and prints the resulting view. Fetch failures degrade to
//! whatever the stores already hold, exactly as an embedded shell would.

use tamarind_storefront::state::AppState;

/// Mount the navigation shell and print its view.
pub async fn show(state: &AppState) {
    let shell = state.navigation_shell();
    shell.mount().await;
    let view = shell.view();

    match &view.account {
        Some(account) => {
            tracing::info!("Account: {} ({})", account.user_name, account.profile_image);
        }
        None => tracing::info!("Account: signed out"),
    }
    if view.show_admin_menu {
        tracing::info!("Admin menu: visible");
    }

    tracing::info!("Categories ({}):", view.categories.len());
    for item in &view.categories {
        tracing::info!("  [{}] {}  ({})", item.id, item.name, item.image);
    }

    if !view.authenticated {
        tracing::info!("Cart: hidden (signed out)");
        return;
    }
    tracing::info!("Cart ({} items, subtotal {}):", view.cart.item_count, view.cart.subtotal);
    for item in &view.cart.items {
        match &item.variant {
            Some(variant) => tracing::info!(
                "  {} ({variant}) x{} @ {} = {}",
                item.name,
                item.quantity,
                item.unit_price,
                item.line_total
            ),
            None => tracing::info!(
                "  {} x{} @ {} = {}",
                item.name,
                item.quantity,
                item.unit_price,
                item.line_total
            ),
        }
    }
}
