//! Aggregates schedule entries into the figures the dashboards chart.
//!
//! Totals come from the vacancy calculator per entry; insights and
//! highlights work on the raw per-day `vagas` instead.

pub mod filters;
mod insights;
pub mod specialty;
mod summary;
pub mod views;

pub use filters::{DashboardFilter, FilterError, MonthFilter, UnitFilter};
pub use specialty::extract_specialty;
pub use views::{
    DashboardSummary, InsightsView, KpiView, LargestOffer, MonthlyPoint, OfferHighlights,
    RankedValue, Recommendation, VisitSplit,
};

use crate::escalas::ScheduleEntry;
use crate::sync::distinct_units;
use tracing::debug;

/// Owns one dataset for the lifetime of a request or command.
#[derive(Debug, Clone, Default)]
pub struct DashboardView {
    entries: Vec<ScheduleEntry>,
}

impl DashboardView {
    pub fn new(entries: Vec<ScheduleEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    /// Units present in the whole dataset, for the unit selector.
    pub fn units(&self) -> Vec<String> {
        distinct_units(&self.entries)
    }

    pub fn filtered(&self, filter: &DashboardFilter) -> Vec<ScheduleEntry> {
        self.entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect()
    }

    pub fn summarize(&self, filter: &DashboardFilter) -> DashboardSummary {
        let entries = self.filtered(filter);
        debug!(
            total = self.entries.len(),
            selected = entries.len(),
            month = %filter.month,
            unit = %filter.unit,
            "building dashboard"
        );

        let visit_split = summary::visit_split(&entries);
        DashboardSummary {
            filters: filter.view(),
            entries: entries.len(),
            units: self.units(),
            kpis: summary::kpis(&entries, visit_split),
            visit_split,
            monthly: summary::monthly(&entries),
            specialties: summary::specialties(&entries),
            ranking: summary::ranking(&entries),
            highlights: summary::highlights(&entries),
            insights: insights::generate_insights(&entries),
        }
    }
}
