//! External code -> internal product identifier.

use tracing::{error, instrument, warn};

use partsync_core::{Lookup, ProductId};

use crate::store::ProductStore;

/// Maps codes from input files to store identifiers.
#[derive(Debug, Clone)]
pub struct IdentifierResolver<S> {
    store: S,
}

impl<S: ProductStore> IdentifierResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Look up the identifier for `code`.
    ///
    /// Store failures are logged and reported as [`Lookup::Failed`], never
    /// propagated.
    #[instrument(skip(self))]
    pub async fn resolve_id(&self, code: &str) -> Lookup<ProductId> {
        let code = code.trim();
        if code.is_empty() {
            warn!("blank product code");
            return Lookup::NotFound;
        }

        match self.store.find_product_id(code).await {
            Ok(Some(id)) => Lookup::Found(id),
            Ok(None) => Lookup::NotFound,
            Err(err) => {
                error!(error = %err, "error while retrieving id for product code");
                Lookup::failed(err.to_string())
            }
        }
    }
}
