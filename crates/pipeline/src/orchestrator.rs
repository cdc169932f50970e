//! Sequential, paced processing of input files.
//!
//! Codes are handled strictly one after another in file order, with a fixed
//! delay between two codes. The delay is the only rate limit applied to the
//! catalog.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use partsync_catalog::ProductCatalog;
use partsync_core::{Lookup, ProductId};
use partsync_export::{ExportError, XmlExporter};
use partsync_infra::{IdentifierResolver, ProductStore, UpsertEngine};
use partsync_products::Product;

use crate::input::{InputError, archive, read_codes, scan_input_dir};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// What happened to one code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeOutcome {
    /// No identifier for the code (unknown, blank, or the lookup failed).
    Unresolved,
    /// Identifier found, but the catalog returned no product.
    NotFetched { product_id: ProductId },
    /// Product fetched; `persisted` is the all-six-upserts verdict.
    Fetched {
        product_id: ProductId,
        product: Product,
        persisted: bool,
    },
}

/// Per-file counters, logged when the file is done.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub codes: usize,
    pub resolved: usize,
    pub fetched: usize,
    pub persisted: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &CodeOutcome) {
        self.codes += 1;
        match outcome {
            CodeOutcome::Unresolved => {}
            CodeOutcome::NotFetched { .. } => self.resolved += 1,
            CodeOutcome::Fetched { persisted, .. } => {
                self.resolved += 1;
                self.fetched += 1;
                if *persisted {
                    self.persisted += 1;
                }
            }
        }
    }
}

/// Products fetched for one batch, in fetch order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub products: Vec<Product>,
    pub summary: BatchSummary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub input: PathBuf,
    pub summary: BatchSummary,
    pub export: Option<PathBuf>,
    pub archived: Option<PathBuf>,
}

pub struct Pipeline<C, S> {
    catalog: C,
    resolver: IdentifierResolver<S>,
    upserts: UpsertEngine<S>,
    exporter: XmlExporter,
    fetch_interval: Duration,
    archive_dir: PathBuf,
}

impl<C, S> Pipeline<C, S>
where
    C: ProductCatalog,
    S: ProductStore + Clone,
{
    pub fn new(
        catalog: C,
        store: S,
        exporter: XmlExporter,
        fetch_interval: Duration,
        archive_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog,
            resolver: IdentifierResolver::new(store.clone()),
            upserts: UpsertEngine::new(store),
            exporter,
            fetch_interval,
            archive_dir: archive_dir.into(),
        }
    }

    /// Process every input file in `input_dir`, in name order.
    ///
    /// A failing file is logged and skipped; only a failure to list the
    /// directory itself is returned.
    pub async fn run_dir(&self, input_dir: &Path) -> Result<Vec<FileReport>, PipelineError> {
        let files = scan_input_dir(input_dir)?;
        if files.is_empty() {
            warn!(dir = %input_dir.display(), "no input files found");
            return Ok(Vec::new());
        }

        let mut reports = Vec::with_capacity(files.len());
        for file in files {
            match self.run_file(&file).await {
                Ok(report) => reports.push(report),
                Err(err) => error!(
                    file = %file.display(),
                    error = %err,
                    "failed to process input file"
                ),
            }
        }
        Ok(reports)
    }

    /// Read codes from `path`, process them, export the fetched products and
    /// archive the input once an export file exists.
    #[instrument(skip(self), fields(file = %path.display()))]
    pub async fn run_file(&self, path: &Path) -> Result<FileReport, PipelineError> {
        info!("processing file");
        let codes = read_codes(path)?;
        let batch = self.run_batch(&codes).await;

        let at = Local::now().naive_local();
        let export = self.exporter.export(path, &batch.products, at)?;

        let archived = match export {
            Some(_) => match archive(path, &self.archive_dir, at) {
                Ok(target) => Some(target),
                Err(err) => {
                    error!(error = %err, "failed to archive input file");
                    None
                }
            },
            None => None,
        };

        let summary = batch.summary;
        info!(
            codes = summary.codes,
            resolved = summary.resolved,
            fetched = summary.fetched,
            persisted = summary.persisted,
            "file done"
        );

        Ok(FileReport {
            input: path.to_path_buf(),
            summary,
            export,
            archived,
        })
    }

    /// Process `codes` in order, waiting `fetch_interval` between two codes.
    pub async fn run_batch(&self, codes: &[String]) -> BatchOutcome {
        let mut batch = BatchOutcome::default();

        for (i, code) in codes.iter().enumerate() {
            let outcome = self.process_code(code).await;
            batch.summary.record(&outcome);
            if let CodeOutcome::Fetched { product, .. } = outcome {
                batch.products.push(product);
            }

            if i + 1 < codes.len() {
                info!(seconds = self.fetch_interval.as_secs(), "waiting before next fetch");
                tokio::time::sleep(self.fetch_interval).await;
            }
        }

        batch
    }

    /// Resolve, fetch and persist one code. Never fails: every problem is
    /// logged and reflected in the outcome.
    #[instrument(skip(self))]
    pub async fn process_code(&self, code: &str) -> CodeOutcome {
        info!("processing code");

        let product_id = match self.resolver.resolve_id(code).await {
            Lookup::Found(id) => id,
            Lookup::NotFound => {
                error!("id not found for code");
                return CodeOutcome::Unresolved;
            }
            Lookup::Failed(reason) => {
                error!(%reason, "id lookup failed");
                return CodeOutcome::Unresolved;
            }
        };

        let product = match self.catalog.fetch_product(product_id).await {
            Lookup::Found(product) => product,
            Lookup::NotFound | Lookup::Failed(_) => {
                return CodeOutcome::NotFetched { product_id };
            }
        };

        let persisted = self
            .upserts
            .insert_or_update_product_details(product_id, &product)
            .await;
        if persisted {
            info!(product_id = %product_id, "updated store for product");
        } else {
            warn!(product_id = %product_id, "partial update failure");
        }

        CodeOutcome::Fetched {
            product_id,
            product,
            persisted,
        }
    }
}
