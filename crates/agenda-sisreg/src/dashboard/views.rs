use super::filters::FilterView;
use crate::escalas::Weekday;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiView {
    pub total_slots: u64,
    pub total_slots_label: String,
    pub professionals: usize,
    pub procedures: usize,
    pub return_pct: u8,
    /// Gauge value: share of slots that are first visits.
    pub first_visit_pct: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VisitSplit {
    pub first_visit: u64,
    pub returns: u64,
}

impl VisitSplit {
    pub fn total(&self) -> u64 {
        self.first_visit + self.returns
    }

    pub fn add(&mut self, slots: u64, is_return: bool) {
        if is_return {
            self.returns += slots;
        } else {
            self.first_visit += slots;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyPoint {
    pub label: String,
    pub first_visit: u64,
    pub returns: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedValue {
    pub name: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LargestOffer {
    pub procedure: String,
    pub slots: u32,
}

/// Raw per-day figures shown on a single unit's dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfferHighlights {
    pub raw_slots: u64,
    pub largest_offer: Option<LargestOffer>,
    pub average_per_entry: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Healthy,
    HighConcentration,
    HighReturn,
}

impl Recommendation {
    pub const fn message(self) -> &'static str {
        match self {
            Recommendation::Healthy => "Distribuição saudável.",
            Recommendation::HighConcentration => {
                "⚠️ Alta concentração: redistribua oferta entre profissionais/dias."
            }
            Recommendation::HighReturn => {
                "⚠️ Retorno alto: avalie reservar janelas específicas para 1ª vez."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsightsView {
    pub top_day: Weekday,
    pub top_day_label: &'static str,
    pub top_day_pct: u8,
    pub peak_hour: u32,
    pub top3_pct: u8,
    pub hhi: u32,
    pub return_pct: u8,
    pub leading_procedure: String,
    pub recommendation: Recommendation,
    pub recommendation_text: &'static str,
}

impl InsightsView {
    /// Bullet lines as the dashboard lists them.
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!(
                "📌 {} concentra {}% das vagas ofertadas.",
                self.top_day.token(),
                self.top_day_pct
            ),
            format!("🕒 Pico de oferta em {:02}:00.", self.peak_hour),
            format!(
                "👥 Top 3 profissionais respondem por {}% das vagas (HHI≈{}).",
                self.top3_pct, self.hhi
            ),
            format!("🔁 Retornos representam {}% das vagas.", self.return_pct),
            format!("🏆 Procedimento líder: {}.", self.leading_procedure),
            format!("🧭 Recomendações: {}", self.recommendation_text),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub filters: FilterView,
    pub entries: usize,
    pub units: Vec<String>,
    pub kpis: KpiView,
    pub visit_split: VisitSplit,
    pub monthly: Vec<MonthlyPoint>,
    pub specialties: Vec<RankedValue>,
    pub ranking: Vec<RankedValue>,
    pub highlights: OfferHighlights,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<InsightsView>,
}
