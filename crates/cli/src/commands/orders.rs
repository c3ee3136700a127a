//! Order commands.

use clap::Subcommand;
use sstashed_core::{AddressId, OrderId, PaymentMethod};
use sstashed_storefront::Storefront;
use sstashed_storefront::gateway::types::{Address, CreateOrderRequest, Order, PageRequest};

use super::{CliError, json, line};

#[derive(Subcommand)]
pub enum OrderAction {
    /// List orders, newest first
    List {
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        size: u32,
    },
    /// Show one order with its items
    Get { id: String },
    /// Place an order for the current cart
    Place {
        /// Delivery address id (default address when omitted)
        #[arg(long)]
        address: Option<String>,
        /// cod, card, upi or net-banking
        #[arg(long, default_value = "cod")]
        payment: String,
    },
    /// Cancel a pending or confirmed order
    Cancel { id: String },
}

pub async fn run(
    storefront: &Storefront,
    action: OrderAction,
    as_json: bool,
) -> Result<(), CliError> {
    let client = storefront.client();
    match action {
        OrderAction::List { page, size } => {
            let orders = client.list_orders(PageRequest::new(page, size)).await?;
            if as_json {
                return json(&orders);
            }
            if orders.content.is_empty() {
                return line("No orders yet");
            }
            for order in &orders.content {
                print_order(order)?;
            }
            Ok(())
        }
        OrderAction::Get { id } => {
            let order_id = OrderId::from(id);
            let mut order = client.get_order(&order_id).await?;
            if order.items.is_empty() {
                order.items = client.order_items(&order_id).await?;
            }
            if as_json {
                return json(&order);
            }
            print_order(&order)?;
            for item in &order.items {
                line(format!(
                    "        {:<40} {:>3} x Rs {:>10} = Rs {:>10}",
                    item.product_name, item.quantity, item.price, item.subtotal
                ))?;
            }
            Ok(())
        }
        OrderAction::Place { address, payment } => {
            let payment_method: PaymentMethod =
                payment.parse().map_err(CliError::InvalidArgument)?;
            let address_id = match address {
                Some(id) => AddressId::from(id),
                None => {
                    let addresses = client.list_addresses().await?;
                    Address::preferred(&addresses)
                        .map(|a| a.id.clone())
                        .ok_or_else(|| {
                            CliError::InvalidArgument(
                                "no saved address; add one with `addresses add`".to_string(),
                            )
                        })?
                }
            };

            let order = storefront
                .place_order(&CreateOrderRequest {
                    address_id,
                    payment_method,
                })
                .await?;
            if as_json {
                return json(&order);
            }
            line(format!(
                "Order {} placed: Rs {} via {}",
                order.display_number(),
                order.total_amount,
                payment_method.display_name()
            ))
        }
        OrderAction::Cancel { id } => {
            let order_id = OrderId::from(id);
            let order = client.get_order(&order_id).await?;
            if !order.status.is_cancellable() {
                return Err(CliError::InvalidArgument(format!(
                    "order {} is {} and can no longer be cancelled",
                    order.display_number(),
                    order.status
                )));
            }
            client.cancel_order(&order_id).await?;
            line(format!("Order {} cancelled", order.display_number()))
        }
    }
}

fn print_order(order: &Order) -> Result<(), CliError> {
    let date = order
        .order_date
        .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string());
    line(format!(
        "{:<16} {date}  {:<10} Rs {:>10}  {}",
        order.display_number(),
        order.status,
        order.total_amount,
        order.payment_method.display_name()
    ))
}
