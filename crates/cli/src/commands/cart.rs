//! Cart commands.

use clap::Subcommand;
use sstashed_core::{CartLineId, ProductId};
use sstashed_storefront::Storefront;
use sstashed_storefront::gateway::types::CartView;
use sstashed_storefront::sync::{clamp_quantity, line_subtotal};

use super::{CliError, ensure_success, json, line};

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart
    Show,
    /// Add a product to the cart
    Add {
        /// Product id
        product: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Change the quantity of a cart line (clamped to available stock)
    Update {
        /// Cart line id
        line: String,
        quantity: u32,
    },
    /// Remove a cart line
    Remove {
        /// Cart line id
        line: String,
    },
    /// Remove everything from the cart
    Clear,
}

pub async fn run(storefront: &Storefront, action: CartAction, as_json: bool) -> Result<(), CliError> {
    let cart = storefront.cart();
    match action {
        CartAction::Show => {}
        CartAction::Add { product, quantity } => {
            ensure_success(cart.add_item(&ProductId::from(product), quantity.max(1)).await)?;
        }
        CartAction::Update {
            line: line_id,
            quantity,
        } => {
            let line_id = CartLineId::from(line_id);
            let current = cart.view();
            let stock = current
                .line(&line_id)
                .map(|l| l.product_snapshot.stock_quantity)
                .ok_or_else(|| CliError::InvalidArgument(format!("no cart line {line_id}")))?;
            let clamped = clamp_quantity(quantity, stock);
            if clamped != quantity {
                tracing::warn!(requested = quantity, clamped, "Quantity clamped to available stock");
            }
            ensure_success(cart.update_quantity(&line_id, clamped).await)?;
        }
        CartAction::Remove { line: line_id } => {
            ensure_success(cart.remove_item(&CartLineId::from(line_id)).await)?;
        }
        CartAction::Clear => ensure_success(cart.clear().await)?,
    }

    let view = cart.view();
    if as_json {
        return json(&view);
    }
    print_cart(&view)
}

fn print_cart(cart: &CartView) -> Result<(), CliError> {
    if cart.is_empty() {
        return line("Your cart is empty");
    }
    for item in &cart.items {
        line(format!(
            "{:>6}  {:<40} {:>3} x Rs {:>10} = Rs {:>10}",
            item.id,
            item.product_snapshot.name,
            item.quantity,
            item.price,
            line_subtotal(item)
        ))?;
    }
    line(format!("{} items, total Rs {}", cart.item_count, cart.total))
}
