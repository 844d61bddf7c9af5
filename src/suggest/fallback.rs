// src/suggest/fallback.rs

use crate::gateway::{Candidate, CandidateSource};
use std::sync::Arc;
use tracing::warn;

/// Last-resort suggestion source: the upstream popularity chart.
///
/// Fails soft in every direction. A chart error or an empty chart yields
/// `None` and the caller surfaces its own empty outcome.
pub struct PopularityFallback {
    source: Arc<dyn CandidateSource>,
    category_hint: String,
    limit: u32,
}

impl PopularityFallback {
    pub fn new(source: Arc<dyn CandidateSource>, category_hint: String, limit: u32) -> Self {
        Self {
            source,
            category_hint,
            limit,
        }
    }

    /// The single highest-view-count entry from the chart, if any.
    pub async fn pick(&self) -> Option<Candidate> {
        let chart = match self
            .source
            .popular_chart(&self.category_hint, self.limit)
            .await
        {
            Ok(chart) => chart,
            Err(e) => {
                warn!(error = %e, "popularity chart unavailable");
                return None;
            }
        };
        chart.into_iter().max_by_key(|c| c.view_count)
    }
}
