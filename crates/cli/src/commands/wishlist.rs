//! Wishlist commands.

use clap::Subcommand;
use sstashed_core::ProductId;
use sstashed_storefront::Storefront;
use sstashed_storefront::sync::SortOrder;

use super::{CliError, ensure_success, json, line};

#[derive(Subcommand)]
pub enum WishlistAction {
    /// Show the wishlist, newest first
    Show {
        /// Oldest entries first
        #[arg(long)]
        oldest_first: bool,
    },
    /// Add a product
    Add { product: String },
    /// Remove a product
    Remove { product: String },
    /// Add the product if missing, remove it otherwise
    Toggle { product: String },
    /// Add the product to the cart and drop it from the wishlist
    MoveToCart { product: String },
    /// Check whether a product is on the wishlist
    Contains { product: String },
    /// Remove everything
    Clear,
}

pub async fn run(
    storefront: &Storefront,
    action: WishlistAction,
    as_json: bool,
) -> Result<(), CliError> {
    let wishlist = storefront.wishlist();
    let mut order = SortOrder::NewestFirst;
    match action {
        WishlistAction::Show { oldest_first } => {
            if oldest_first {
                order = SortOrder::OldestFirst;
            }
        }
        WishlistAction::Add { product } => {
            ensure_success(wishlist.add(&ProductId::from(product)).await)?;
        }
        WishlistAction::Remove { product } => {
            ensure_success(wishlist.remove(&ProductId::from(product)).await)?;
        }
        WishlistAction::Toggle { product } => {
            ensure_success(wishlist.toggle(&ProductId::from(product)).await)?;
        }
        WishlistAction::MoveToCart { product } => {
            ensure_success(storefront.move_to_cart(&ProductId::from(product)).await)?;
        }
        WishlistAction::Contains { product } => {
            let member = wishlist.is_member(product.as_str());
            return line(if member { "yes" } else { "no" });
        }
        WishlistAction::Clear => ensure_success(wishlist.clear().await)?,
    }

    let entries = wishlist.sorted_by_added(order);
    if as_json {
        return json(&entries);
    }
    if entries.is_empty() {
        return line("Your wishlist is empty");
    }
    for entry in &entries {
        let id = entry
            .product
            .id
            .as_ref()
            .map_or_else(|| "-".to_string(), ToString::to_string);
        let added = entry
            .added_at
            .map_or_else(String::new, |at| format!("  added {}", at.format("%Y-%m-%d")));
        let availability = if entry.product.in_stock() {
            ""
        } else {
            "  (out of stock)"
        };
        line(format!(
            "{id:>6}  {:<40} Rs {:>10}{availability}{added}",
            entry.product.name, entry.product.price
        ))?;
    }
    line(format!("{} items", wishlist.count()))
}
