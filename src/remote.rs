//! REST-backed cart repository.
//!
//! Talks to the marketplace cart API, scoped to the authenticated caller:
//!
//! | Operation | Request                          |
//! |-----------|----------------------------------|
//! | load      | `GET    {base}{path}`            |
//! | insert    | `POST   {base}{path}`            |
//! | update    | `PATCH  {base}{path}{record}/`   |
//! | remove    | `DELETE {base}{path}{record}/`   |
//! | clear     | `DELETE` for every row           |
//!
//! Every request carries `Authorization: Bearer <token>`. The server is
//! authoritative: the rows it returns, including the `id` it assigns, are
//! what ends up in memory.

use crate::auth::Credentials;
use crate::error::{Error, Result};
use crate::item::{id_from_string_or_number, CartLineItem, ItemType};
use crate::repository::CartRepository;
use reqwest::{Method, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_CART_PATH: &str = "/api/cart/";

/// Configuration for the cart API.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Collection path, with leading and trailing slash.
    pub cart_path: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            cart_path: DEFAULT_CART_PATH.to_string(),
        }
    }
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        RemoteConfig {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_cart_path(mut self, path: impl Into<String>) -> Self {
        self.cart_path = path.into();
        self
    }

    /// URL of the cart collection.
    pub fn collection_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.cart_path)
    }

    /// URL of one stored row.
    pub fn record_url(&self, record_id: u64) -> String {
        format!("{}{}/", self.collection_url(), record_id)
    }
}

/// A cart row as the API returns it.
#[derive(Debug, Deserialize)]
struct CartRecord {
    id: u64,
    #[serde(deserialize_with = "id_from_string_or_number")]
    item_id: String,
    item_type: ItemType,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    location: Option<String>,
    unit_price: Decimal,
    quantity: u32,
}

impl From<CartRecord> for CartLineItem {
    fn from(record: CartRecord) -> Self {
        CartLineItem {
            item_id: record.item_id,
            item_type: record.item_type,
            title: record.title,
            description: record.description,
            image_url: record.image_url,
            category: record.category,
            location: record.location,
            unit_price: record.unit_price,
            quantity: record.quantity,
            record_id: Some(record.id),
        }
    }
}

/// List endpoints may or may not be paginated.
///
/// Rows stay raw so one bad row cannot sink the whole listing.
#[derive(Deserialize)]
#[serde(untagged)]
enum CartListing {
    Plain(Vec<Value>),
    Paginated { results: Vec<Value> },
}

impl CartListing {
    fn into_rows(self) -> Vec<Value> {
        match self {
            CartListing::Plain(rows) => rows,
            CartListing::Paginated { results } => results,
        }
    }
}

#[derive(Serialize)]
struct QuantityPatch {
    quantity: u32,
}

/// Cart repository backed by the marketplace REST API.
///
/// # Example
///
/// ```no_run
/// use cart_kit::auth::Session;
/// use cart_kit::remote::{RemoteCartRepository, RemoteConfig};
/// use std::sync::Arc;
///
/// let session = Session::with_token("access-token");
/// let repo = RemoteCartRepository::new(
///     RemoteConfig::new("https://marketplace.example"),
///     Arc::new(session),
/// );
/// ```
#[derive(Clone)]
pub struct RemoteCartRepository {
    http: reqwest::Client,
    config: RemoteConfig,
    credentials: Arc<dyn Credentials>,
}

impl RemoteCartRepository {
    pub fn new(config: RemoteConfig, credentials: Arc<dyn Credentials>) -> Self {
        Self::with_client(reqwest::Client::new(), config, credentials)
    }

    /// Use a preconfigured HTTP client (proxies, TLS roots, timeouts).
    pub fn with_client(
        http: reqwest::Client,
        config: RemoteConfig,
        credentials: Arc<dyn Credentials>,
    ) -> Self {
        RemoteCartRepository {
            http,
            config,
            credentials,
        }
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    fn token(&self) -> Result<String> {
        self.credentials
            .bearer_token()
            .ok_or(Error::AuthenticationRequired)
    }

    fn record_id(item: &CartLineItem) -> Result<u64> {
        item.record_id.ok_or_else(|| {
            Error::PersistenceWrite(format!("cart row {} has no server id", item.key()))
        })
    }

    /// Send a request and map the status into our error taxonomy.
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response> {
        let token = self.token()?;
        let is_read = method == Method::GET;

        debug!("» Cart API {} {}", method, url);

        let mut request = self
            .http
            .request(method.clone(), url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            let msg = format!("{} {} failed: {}", method, url, e);
            if is_read {
                Error::PersistenceRead(msg)
            } else {
                Error::PersistenceWrite(msg)
            }
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!("✗ Cart API rejected credentials ({})", status);
            return Err(Error::AuthenticationRequired);
        }

        if !status.is_success() && !(method == Method::DELETE && status == StatusCode::NOT_FOUND)
        {
            let body = response.text().await.unwrap_or_default();
            let msg = format!("{} {} returned {}: {}", method, url, status.as_u16(), body);
            return Err(if is_read {
                Error::PersistenceRead(msg)
            } else {
                Error::PersistenceWrite(msg)
            });
        }

        debug!("✓ Cart API {} {} -> {}", method, url, status.as_u16());
        Ok(response)
    }

    /// Delete server rows that repeat a key already loaded.
    ///
    /// Best effort: a failure only means the next load prunes again.
    async fn prune_duplicates(&self, duplicates: &[CartLineItem]) {
        for item in duplicates {
            let Some(record_id) = item.record_id else {
                continue;
            };
            let url = self.config.record_url(record_id);
            if let Err(e) = self.send(Method::DELETE, &url, None).await {
                warn!("✗ Could not delete duplicate cart row {}: {}", record_id, e);
            }
        }
    }

    async fn read_record(response: reqwest::Response) -> Result<CartLineItem> {
        response
            .json::<CartRecord>()
            .await
            .map(CartLineItem::from)
            .map_err(|e| Error::PersistenceWrite(format!("unreadable cart row: {}", e)))
    }
}

impl CartRepository for RemoteCartRepository {
    async fn load(&self) -> Result<Vec<CartLineItem>> {
        let url = self.config.collection_url();
        let response = self.send(Method::GET, &url, None).await?;

        let listing = response
            .json::<CartListing>()
            .await
            .map_err(|e| Error::PersistenceRead(format!("unreadable cart listing: {}", e)))?;

        let mut items: Vec<CartLineItem> = Vec::new();
        let mut duplicates: Vec<CartLineItem> = Vec::new();

        for (index, row) in listing.into_rows().into_iter().enumerate() {
            let record = match serde_json::from_value::<CartRecord>(row) {
                Ok(record) => record,
                Err(e) => {
                    warn!("✗ Skipping malformed cart row {} from API: {}", index, e);
                    continue;
                }
            };
            let Some(item) = CartLineItem::from(record).normalized() else {
                warn!("✗ Skipping invalid cart row {} from API", index);
                continue;
            };

            if items.iter().any(|existing| existing.matches(&item.key())) {
                warn!(
                    "✗ Duplicate cart row {} (record {:?}) from API, keeping the first",
                    item.key(),
                    item.record_id
                );
                duplicates.push(item);
            } else {
                items.push(item);
            }
        }

        self.prune_duplicates(&duplicates).await;

        debug!("✓ Loaded {} cart rows from API", items.len());
        Ok(items)
    }

    async fn insert(&self, item: &CartLineItem, _next: &[CartLineItem]) -> Result<CartLineItem> {
        let url = self.config.collection_url();
        let body = serde_json::to_value(item)
            .map_err(|e| Error::PersistenceWrite(format!("unencodable cart row: {}", e)))?;

        let response = self.send(Method::POST, &url, Some(body)).await?;
        Self::read_record(response).await
    }

    async fn update(&self, item: &CartLineItem, _next: &[CartLineItem]) -> Result<CartLineItem> {
        let url = self.config.record_url(Self::record_id(item)?);
        let body = serde_json::to_value(QuantityPatch {
            quantity: item.quantity,
        })
        .map_err(|e| Error::PersistenceWrite(format!("unencodable patch: {}", e)))?;

        let response = self.send(Method::PATCH, &url, Some(body)).await?;
        Self::read_record(response).await
    }

    async fn remove(&self, item: &CartLineItem, _next: &[CartLineItem]) -> Result<()> {
        let url = self.config.record_url(Self::record_id(item)?);
        self.send(Method::DELETE, &url, None).await?;
        Ok(())
    }

    async fn clear(&self, removed: &[CartLineItem]) -> Result<()> {
        // Check once up front so a signed-out clear issues no requests at all.
        self.token()?;

        for item in removed {
            let url = self.config.record_url(Self::record_id(item)?);
            self.send(Method::DELETE, &url, None).await?;
        }
        Ok(())
    }
}
