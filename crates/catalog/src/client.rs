//! Product fetches against the catalog API.
//!
//! A fetch never fails towards its caller: transport, status and decoding
//! problems are logged here and surface as [`Lookup::Failed`], a missing
//! product as [`Lookup::NotFound`]. One bad code must not stop a batch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::InvalidHeaderValue;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use partsync_core::{Lookup, ProductId, SyncConfig};
use partsync_products::{Product, decode_envelope};

use crate::signing::RequestSigner;

const PRODUCT_RESOURCE: &str = "product";
const LANGUAGE: &str = "pl";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Catalog fetch error (internal to the client; callers see a [`Lookup`]).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid catalog endpoint: {0}")]
    Endpoint(String),

    #[error("invalid header value: {0}")]
    Header(#[from] InvalidHeaderValue),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("catalog server error ({0})")]
    Server(u16),

    #[error("catalog rejected request ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("malformed catalog response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Source of product records, keyed by internal identifier.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetch one product. The returned product already carries the supplier.
    async fn fetch_product(&self, id: ProductId) -> Lookup<Product>;
}

#[async_trait]
impl<C> ProductCatalog for Arc<C>
where
    C: ProductCatalog + ?Sized,
{
    async fn fetch_product(&self, id: ProductId) -> Lookup<Product> {
        (**self).fetch_product(id).await
    }
}

/// HTTP client for the catalog's `product` resource.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    endpoint: Url,
    signer: RequestSigner,
    supplier: String,
}

impl CatalogClient {
    pub fn new(config: &SyncConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: product_endpoint(&config.api.base_url)?,
            signer: RequestSigner::new(&config.api),
            supplier: config.supplier.clone(),
        })
    }

    /// Fetch and decode one product, surfacing every failure as an error.
    pub async fn try_fetch(&self, id: ProductId) -> Result<Option<Product>, FetchError> {
        let headers = self.signer.headers().to_header_map()?;
        let id_param = id.to_string();

        info!(
            action = PRODUCT_RESOURCE,
            product_id = %id,
            lng = LANGUAGE,
            "sending catalog request"
        );
        let response = self
            .http
            .get(self.endpoint.clone())
            .headers(headers)
            .query(&[("lng", LANGUAGE), ("id", id_param.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() {
            return Err(FetchError::Server(status.as_u16()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        Ok(decode_envelope(&body)?)
    }
}

#[async_trait]
impl ProductCatalog for CatalogClient {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn fetch_product(&self, id: ProductId) -> Lookup<Product> {
        match self.try_fetch(id).await {
            Ok(Some(product)) => {
                info!("fetched product data");
                Lookup::Found(product.with_supplier(self.supplier.clone()))
            }
            Ok(None) => {
                warn!("catalog response did not contain product data");
                Lookup::NotFound
            }
            Err(err @ FetchError::Server(_)) => {
                warn!(error = %err, "catalog request failed on the server side (likely throttled)");
                Lookup::failed(err.to_string())
            }
            Err(err @ FetchError::Status { .. }) => {
                warn!(error = %err, "catalog request failed");
                Lookup::failed(err.to_string())
            }
            Err(err) => {
                error!(error = %err, "error while fetching product data");
                Lookup::failed(err.to_string())
            }
        }
    }
}

/// `{base}/product`, keeping any path prefix of the base URL.
fn product_endpoint(base: &Url) -> Result<Url, FetchError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(PRODUCT_RESOURCE)
        .map_err(|e| FetchError::Endpoint(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let base = Url::parse("https://catalog.example.com/api/v1").unwrap();
        assert_eq!(
            product_endpoint(&base).unwrap().as_str(),
            "https://catalog.example.com/api/v1/product"
        );

        let base = Url::parse("https://catalog.example.com/api/").unwrap();
        assert_eq!(
            product_endpoint(&base).unwrap().as_str(),
            "https://catalog.example.com/api/product"
        );

        let base = Url::parse("https://catalog.example.com").unwrap();
        assert_eq!(
            product_endpoint(&base).unwrap().as_str(),
            "https://catalog.example.com/product"
        );
    }
}
