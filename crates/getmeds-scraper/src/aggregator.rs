//! Fan-out search across every enabled retailer.

use futures::future::join_all;

use getmeds_core::{AppConfig, CanonicalResult, RetailersFile};

use crate::demo;
use crate::error::{RetailerFailure, SearchError};
use crate::retailers::Adapter;
use crate::session::SearchSession;
use crate::transport::Transport;

/// Result of one retailer's branch of a search.
#[derive(Debug)]
pub struct RetailerOutcome {
    pub retailer: String,
    pub result: Result<Vec<CanonicalResult>, SearchError>,
}

pub struct Aggregator {
    transport: Transport,
    adapters: Vec<Adapter>,
    min_query_length: usize,
}

impl Aggregator {
    /// `adapters` run in the given order, which is also the order their
    /// records appear in the combined list. An empty list selects demo data.
    #[must_use]
    pub fn new(transport: Transport, adapters: Vec<Adapter>, min_query_length: usize) -> Self {
        Self {
            transport,
            adapters,
            min_query_length,
        }
    }

    /// Builds an aggregator over the enabled retailers in `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Configuration`] if the transport cannot be built
    /// or a retailer entry cannot be turned into an adapter.
    pub fn from_config(config: &AppConfig, registry: &RetailersFile) -> Result<Self, SearchError> {
        let transport = Transport::from_config(config)
            .map_err(|e| SearchError::Configuration(format!("transport: {e}")))?;
        let adapters = registry
            .enabled()
            .map(|r| Adapter::from_config(r, Some(config)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(transport, adapters, config.min_query_length))
    }

    #[must_use]
    pub fn adapters(&self) -> &[Adapter] {
        &self.adapters
    }

    #[must_use]
    pub fn min_query_length(&self) -> usize {
        self.min_query_length
    }

    fn validate<'q>(&self, query: &'q str) -> Result<&'q str, SearchError> {
        let trimmed = query.trim();
        let actual = trimmed.chars().count();
        if actual < self.min_query_length {
            return Err(SearchError::Validation {
                min_length: self.min_query_length,
                actual,
            });
        }
        Ok(trimmed)
    }

    /// Runs every adapter concurrently and returns each branch's outcome in
    /// adapter order. With no adapters, returns a single demo outcome.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Validation`] for a too-short query; no request
    /// is made in that case.
    pub async fn search_outcomes(&self, query: &str) -> Result<Vec<RetailerOutcome>, SearchError> {
        let query = self.validate(query)?;

        if self.adapters.is_empty() {
            tracing::info!(query, "no retailers enabled; serving demo data");
            return Ok(vec![RetailerOutcome {
                retailer: demo::DEMO_RETAILER.to_string(),
                result: Ok(demo::generate(query)),
            }]);
        }

        let branches = self.adapters.iter().map(|adapter| async move {
            RetailerOutcome {
                retailer: adapter.name().to_string(),
                result: adapter.search(&self.transport, query).await,
            }
        });
        Ok(join_all(branches).await)
    }

    /// Searches every enabled retailer and concatenates the successful
    /// lists in adapter order. Failed retailers are logged and skipped.
    ///
    /// # Errors
    ///
    /// - [`SearchError::Validation`] for a too-short query.
    /// - [`SearchError::AllRetailersFailed`] when no retailer succeeded.
    pub async fn search(&self, query: &str) -> Result<Vec<CanonicalResult>, SearchError> {
        let outcomes = self.search_outcomes(query).await?;

        let mut results = Vec::new();
        let mut failures = Vec::new();
        let mut succeeded = 0usize;

        for outcome in outcomes {
            match outcome.result {
                Ok(records) => {
                    tracing::debug!(
                        retailer = %outcome.retailer,
                        records = records.len(),
                        "retailer search succeeded"
                    );
                    succeeded += 1;
                    results.extend(records);
                }
                Err(e) => {
                    tracing::warn!(
                        retailer = %outcome.retailer,
                        error = %e,
                        "retailer search failed; skipping"
                    );
                    failures.push(RetailerFailure {
                        retailer: outcome.retailer,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if succeeded == 0 {
            return Err(SearchError::AllRetailersFailed { failures });
        }
        if !failures.is_empty() {
            tracing::warn!(
                failed = failures.len(),
                succeeded,
                "some retailers failed during search"
            );
        }

        Ok(results)
    }

    /// Runs [`Aggregator::search`] and, on success, replaces the session
    /// buffer. On error the session is left untouched.
    ///
    /// # Errors
    ///
    /// Same as [`Aggregator::search`].
    pub async fn search_into(
        &self,
        session: &mut SearchSession,
        query: &str,
    ) -> Result<usize, SearchError> {
        let results = self.search(query).await?;
        let count = results.len();
        session.replace(query.trim(), results);
        Ok(count)
    }
}
