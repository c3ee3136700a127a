//! Catalog browsing commands.

use clap::Subcommand;
use sstashed_core::{CategoryId, ProductId};
use sstashed_storefront::Storefront;
use sstashed_storefront::gateway::types::{Page, PageRequest, Product};

use super::{CliError, json, line};

#[derive(Subcommand)]
pub enum ProductAction {
    /// List products, one page at a time
    List {
        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: u32,
        /// Products per page
        #[arg(long, default_value_t = PageRequest::DEFAULT_SIZE)]
        size: u32,
    },
    /// Show one product
    Get {
        /// Product id
        id: String,
    },
    /// Search products by keyword
    Search {
        keyword: String,
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = PageRequest::DEFAULT_SIZE)]
        size: u32,
    },
    /// List products in a category
    Category {
        /// Category id
        id: String,
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = PageRequest::DEFAULT_SIZE)]
        size: u32,
    },
    /// Show current stock for a product
    Stock {
        /// Product id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum CategoryAction {
    /// List all categories
    List,
    /// Show one category
    Get {
        /// Category id
        id: String,
    },
}

pub async fn products(
    storefront: &Storefront,
    action: ProductAction,
    as_json: bool,
) -> Result<(), CliError> {
    let client = storefront.client();
    let page = match action {
        ProductAction::List { page, size } => {
            client.list_products(PageRequest::new(page, size)).await?
        }
        ProductAction::Search {
            keyword,
            page,
            size,
        } => {
            client
                .search_products(&keyword, PageRequest::new(page, size))
                .await?
        }
        ProductAction::Category { id, page, size } => {
            client
                .products_by_category(&CategoryId::from(id), PageRequest::new(page, size))
                .await?
        }
        ProductAction::Get { id } => {
            let product = client.get_product(&ProductId::from(id)).await?;
            return if as_json {
                json(&product)
            } else {
                print_product(&product, true)
            };
        }
        ProductAction::Stock { id } => {
            let stock = client.product_stock(&ProductId::from(id.as_str())).await?;
            return line(format!("{id}: {stock} in stock"));
        }
    };

    if as_json {
        return json(&page);
    }
    print_page(&page)
}

pub async fn categories(
    storefront: &Storefront,
    action: CategoryAction,
    as_json: bool,
) -> Result<(), CliError> {
    let client = storefront.client();
    let categories = match action {
        CategoryAction::List => client.list_categories().await?,
        CategoryAction::Get { id } => vec![client.get_category(&CategoryId::from(id)).await?],
    };

    if as_json {
        return json(&categories);
    }
    for category in &categories {
        match &category.description {
            Some(description) => line(format!("{:>6}  {} - {description}", category.id, category.name))?,
            None => line(format!("{:>6}  {}", category.id, category.name))?,
        }
    }
    Ok(())
}

fn print_page(page: &Page<Product>) -> Result<(), CliError> {
    for product in &page.content {
        print_product(product, false)?;
    }
    line(format!(
        "-- page {} of {} ({} products)",
        page.number + 1,
        page.total_pages.max(1),
        page.total_elements
    ))
}

fn print_product(product: &Product, detailed: bool) -> Result<(), CliError> {
    let stock = if product.stock_quantity == 0 {
        "out of stock".to_string()
    } else {
        format!("{} in stock", product.stock_quantity)
    };
    line(format!(
        "{:>6}  {:<40} Rs {:>10}  {stock}",
        product.id, product.name, product.price
    ))?;

    if detailed {
        if let Some(category) = &product.category_name {
            line(format!("        category: {category}"))?;
        }
        if let Some(artisan) = &product.artisan_name {
            line(format!("        by: {artisan}"))?;
        }
        if let Some(description) = &product.description {
            line(format!("        {description}"))?;
        }
    }
    Ok(())
}
