//! Wire types exchanged with the gateway.
//!
//! Read-only payloads are decoded leniently: missing or `null` fields default,
//! ids accept numbers or strings, unknown enum values fall into `Unknown`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sstashed_core::{
    AddressId, AddressType, CartLineId, CategoryId, Email, OrderId, OrderItemId, OrderStatus,
    PaymentMethod, PaymentStatus, Price, ProductId, UserId, UserRole, WishlistEntryId,
};

// =============================================================================
// Products
// =============================================================================

/// Read-only product fields embedded in cart lines and wishlist entries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductSnapshot {
    /// Absent on some legacy wishlist payloads; membership checks then fall
    /// back to the entry id.
    pub id: Option<ProductId>,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub price: Price,
    #[serde(deserialize_with = "null_as_default")]
    pub stock_quantity: u32,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub category_name: Option<String>,
}

impl ProductSnapshot {
    /// Whether at least one unit can be ordered.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }
}

/// Catalog product as returned by the product endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub stock_quantity: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub artisan_name: Option<String>,
}

impl Product {
    /// The fields a cart line or wishlist entry would embed.
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: Some(self.id.clone()),
            name: self.name.clone(),
            price: self.price,
            stock_quantity: self.stock_quantity,
            image_url: self.image_url.clone(),
            description: self.description.clone(),
            category_name: self.category_name.clone(),
        }
    }
}

/// Product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_pages: u32,
    pub total_elements: u64,
    /// Zero-based page number.
    pub number: u32,
    pub size: u32,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            content: Vec::new(),
            total_pages: 0,
            total_elements: 0,
            number: 0,
            size: 0,
        }
    }
}

impl<T> Page<T> {
    /// Whether another page follows this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number + 1 < self.total_pages
    }
}

/// Paging parameters for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    /// Zero-based page number.
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    /// The storefront's grid size.
    pub const DEFAULT_SIZE: u32 = 12;

    #[must_use]
    pub const fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// Query string fragment, e.g. `page=0&size=12`.
    #[must_use]
    pub fn query(&self) -> String {
        format!("page={}&size={}", self.page, self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: CartLineId,
    pub product_id: ProductId,
    #[serde(rename = "product", default, deserialize_with = "null_as_default")]
    pub product_snapshot: ProductSnapshot,
    /// Unit price at the time the line was added.
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: Price,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quantity: u32,
}

impl CartLine {
    /// Locally derived `price * quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.price.line_total(self.quantity)
    }
}

/// The authenticated user's cart as computed by the gateway.
///
/// `total` and `item_count` are authoritative; the client never recomputes
/// them from the lines.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CartView {
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<CartLine>,
    #[serde(deserialize_with = "null_as_default")]
    pub total: Price,
    #[serde(deserialize_with = "null_as_default")]
    pub item_count: u32,
}

impl CartView {
    /// `{items: [], total: 0, itemCount: 0}`.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find a line by id.
    #[must_use]
    pub fn line(&self, line_id: &CartLineId) -> Option<&CartLine> {
        self.items.iter().find(|line| &line.id == line_id)
    }
}

/// Body of `POST /cart/items`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddCartItemRequest<'a> {
    pub product_id: &'a ProductId,
    pub quantity: u32,
}

/// Body of `PUT /cart/items/{id}`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct UpdateCartItemRequest {
    pub quantity: u32,
}

// =============================================================================
// Wishlist
// =============================================================================

/// Wishlist entry as sent by the gateway, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawWishlistEntry {
    pub id: Option<WishlistEntryId>,
    pub product: Option<ProductSnapshot>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub added_at: Option<DateTime<Utc>>,
}

/// A valid wishlist entry: one that references a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    pub id: Option<WishlistEntryId>,
    pub product: ProductSnapshot,
    pub added_at: Option<DateTime<Utc>>,
}

impl WishlistEntry {
    /// Drop entries whose product is missing.
    #[must_use]
    pub fn from_raw(raw: RawWishlistEntry) -> Option<Self> {
        Some(Self {
            product: raw.product?,
            id: raw.id,
            added_at: raw.added_at,
        })
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Body of `POST /orders`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub address_id: AddressId,
    pub payment_method: PaymentMethod,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub total_amount: Price,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub order_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub shipping_city: Option<String>,
    #[serde(default)]
    pub shipping_state: Option<String>,
    #[serde(default)]
    pub shipping_postal_code: Option<String>,
    #[serde(default)]
    pub shipping_country: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Number shown to the customer; the gateway omits it on some endpoints.
    #[must_use]
    pub fn display_number(&self) -> String {
        self.order_number
            .clone()
            .unwrap_or_else(|| format!("#{}", self.id))
    }
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub subtotal: Price,
}

// =============================================================================
// Profile & Addresses
// =============================================================================

/// The authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: Email,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: UserRole,
}

impl UserProfile {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Body of `PUT /profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

/// A saved delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    #[serde(default)]
    pub street_address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub address_type: AddressType,
    #[serde(default)]
    pub is_default: bool,
}

impl Address {
    /// The address checkout pre-selects: the default one, else the first.
    #[must_use]
    pub fn preferred(addresses: &[Self]) -> Option<&Self> {
        addresses
            .iter()
            .find(|a| a.is_default)
            .or_else(|| addresses.first())
    }
}

/// Body of `POST /profile/addresses` and `PUT /profile/addresses/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub address_type: AddressType,
    pub is_default: bool,
}

// =============================================================================
// Auth
// =============================================================================

/// Body of `POST /auth/register`.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub password: secrecy::SecretString,
    pub phone: Option<String>,
}

/// Login/register response. Accepts `{token, user: {...}}` as well as the
/// flat `{token, id, firstName, ...}` form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum AuthPayload {
    Nested {
        #[serde(alias = "accessToken")]
        token: String,
        user: UserProfile,
    },
    Flat {
        #[serde(alias = "accessToken")]
        token: String,
        #[serde(flatten)]
        user: UserProfile,
    },
}

impl AuthPayload {
    pub(crate) fn into_parts(self) -> (String, UserProfile) {
        match self {
            Self::Nested { token, user } | Self::Flat { token, user } => (token, user),
        }
    }
}

// =============================================================================
// Lenient decoding
// =============================================================================

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts RFC 3339 timestamps and zone-less `LocalDateTime` strings (read as
/// UTC). Anything else decodes as `None` rather than failing the payload.
fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_timestamp))
}

fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            }),
        serde_json::Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}
