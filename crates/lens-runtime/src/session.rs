//! The session: owner of the loaded dataset, its catalog and the filter.
//!
//! A load fetches raw text from the configured sources, parses it and swaps
//! the whole dataset at once. A failed load leaves the previous dataset,
//! catalog and filter untouched and is reported through [`Session::last_error`].

use chrono::{DateTime, Utc};
use lens_core::error::{LensError, Result};
use lens_core::models::DEFAULT_AMOUNT_COLUMN;
use lens_data::catalog::Catalog;
use lens_data::dashboard::{build_dashboard, DashboardView, Dataset, ViewKind};
use lens_data::filter::{Facet, FilterState};
use reqwest::Client;

use crate::source::{create_client, Source};

/// Where a session reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub data: Source,
    /// Optional single-value series for the trend view.
    pub individual: Option<Source>,
    pub amount_column: String,
}

impl SessionConfig {
    pub fn new(data: Source) -> Self {
        Self {
            data,
            individual: None,
            amount_column: DEFAULT_AMOUNT_COLUMN.to_string(),
        }
    }

    pub fn with_individual(mut self, individual: Source) -> Self {
        self.individual = Some(individual);
        self
    }

    pub fn with_amount_column(mut self, column: impl Into<String>) -> Self {
        self.amount_column = column.into();
        self
    }
}

pub struct Session {
    config: SessionConfig,
    client: Client,
    dataset: Dataset,
    catalog: Catalog,
    filter: FilterState,
    loaded_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Result<Self> {
        Ok(Self {
            config,
            client: create_client()?,
            dataset: Dataset::default(),
            catalog: Catalog::default(),
            filter: FilterState::default(),
            loaded_at: None,
            last_error: None,
        })
    }

    // ── Loading ───────────────────────────────────────────────────────────

    /// Fetch every source and replace the dataset.
    ///
    /// With an individual series configured both documents are fetched
    /// concurrently; either failing aborts the load. A load replacing an
    /// empty catalog applies the default selection, later ones reconcile the
    /// current selection against the new catalog.
    pub async fn load(&mut self) -> Result<()> {
        let fetched = match &self.config.individual {
            Some(individual) => tokio::try_join!(
                self.config.data.fetch(&self.client),
                individual.fetch(&self.client)
            )
            .map(|(expenses, individual)| (expenses, Some(individual))),
            None => self
                .config
                .data
                .fetch(&self.client)
                .await
                .map(|expenses| (expenses, None)),
        };

        match fetched {
            Ok((expenses, individual)) => {
                let dataset = Dataset::from_text(
                    &expenses,
                    individual.as_deref(),
                    &self.config.amount_column,
                );
                self.install(dataset);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, data = %self.config.data, "load failed; keeping previous data");
                let message = e.to_string();
                self.last_error = Some(message.clone());
                Err(LensError::LoadFailed(message))
            }
        }
    }

    fn install(&mut self, dataset: Dataset) {
        let catalog = Catalog::build(&dataset.records);
        if self.catalog.is_empty() {
            self.filter = FilterState::with_defaults(&catalog);
        } else {
            self.filter.reconcile(&catalog);
        }

        tracing::info!(
            records = dataset.records.len(),
            months = catalog.months.len(),
            categories = catalog.categories.len(),
            warnings = dataset.warnings.len() + dataset.individual_warnings.len(),
            "dataset loaded"
        );

        self.dataset = dataset;
        self.catalog = catalog;
        self.loaded_at = Some(Utc::now());
        self.last_error = None;
    }

    // ── Filter mutations ──────────────────────────────────────────────────

    pub fn toggle_all(&mut self, facet: Facet, checked: bool) {
        self.filter.toggle_all(facet, checked);
    }

    pub fn toggle_value(&mut self, facet: Facet, value: &str, checked: bool) -> Result<()> {
        self.filter.toggle_value(facet, value, checked)
    }

    pub fn select_only(&mut self, facet: Facet, values: &[String]) -> Result<()> {
        self.filter.select_only(facet, values)
    }

    pub fn select_month_range(&mut self, from: &str, to: &str) -> Result<()> {
        self.filter.select_month_range(from, to)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Aggregate the current dataset under the current filter.
    pub fn dashboard(&self, view: ViewKind) -> DashboardView {
        build_dashboard(&self.dataset, &self.catalog, &self.filter, view)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Parse warnings of the current dataset.
    pub fn warnings(&self) -> Vec<String> {
        self.dataset.warning_messages()
    }

    /// Message of the most recent failed load, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// When the current dataset was installed; `None` before the first load.
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
