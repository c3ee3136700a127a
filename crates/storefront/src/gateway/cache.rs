//! Cache types for catalog reads.

use sstashed_core::{CategoryId, ProductId};

use super::types::{Category, Page, PageRequest, Product};

/// Cache key for catalog reads. Cart, wishlist, profile and orders are
/// per-user mutable state and are never cached.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products(PageRequest),
    CategoryProducts(CategoryId, PageRequest),
    Category(CategoryId),
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Page<Product>),
    Category(Box<Category>),
    Categories(Vec<Category>),
}
