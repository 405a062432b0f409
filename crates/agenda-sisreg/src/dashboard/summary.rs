use super::specialty::extract_specialty;
use super::views::{
    KpiView, LargestOffer, MonthlyPoint, OfferHighlights, RankedValue, VisitSplit,
};
use crate::escalas::format::{format_number, truncate_label};
use crate::escalas::ScheduleEntry;
use chrono::Datelike;
use std::collections::{BTreeMap, HashMap, HashSet};

const SPECIALTY_LIMIT: usize = 14;
const RANKING_LIMIT: usize = 10;
const MONTH_LABELS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

/// Sums keyed values while remembering first-seen order, so equal totals
/// rank in the order they first appeared.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    order: Vec<String>,
    totals: HashMap<String, u64>,
}

impl Tally {
    pub(crate) fn add(&mut self, key: &str, value: u64) {
        match self.totals.get_mut(key) {
            Some(total) => *total += value,
            None => {
                self.order.push(key.to_string());
                self.totals.insert(key.to_string(), value);
            }
        }
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = u64> + '_ {
        self.totals.values().copied()
    }

    /// Entries sorted by descending total; ties keep insertion order.
    pub(crate) fn ranked(&self) -> Vec<(String, u64)> {
        let mut ranked: Vec<(String, u64)> = self
            .order
            .iter()
            .map(|key| (key.clone(), self.totals.get(key).copied().unwrap_or(0)))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

pub(crate) fn percent(part: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round().clamp(0.0, 100.0) as u8
}

pub(crate) fn visit_split(entries: &[ScheduleEntry]) -> VisitSplit {
    let mut split = VisitSplit::default();
    for entry in entries {
        split.add(entry.total_slots(), entry.is_return());
    }
    split
}

pub(crate) fn kpis(entries: &[ScheduleEntry], split: VisitSplit) -> KpiView {
    let professionals: HashSet<&str> = entries
        .iter()
        .map(|entry| entry.professional_id.as_str())
        .filter(|cpf| !cpf.is_empty())
        .collect();
    let procedures: HashSet<&str> = entries
        .iter()
        .map(|entry| entry.procedure_name.trim())
        .filter(|name| !name.is_empty())
        .collect();

    let total = split.total();
    KpiView {
        total_slots: total,
        total_slots_label: format_number(total),
        professionals: professionals.len(),
        procedures: procedures.len(),
        return_pct: percent(split.returns, total),
        first_visit_pct: percent(split.first_visit, total),
    }
}

/// First-visit/return totals per `Mmm/YYYY` of the start date, oldest first.
pub(crate) fn monthly(entries: &[ScheduleEntry]) -> Vec<MonthlyPoint> {
    let mut months: BTreeMap<(i32, u32), VisitSplit> = BTreeMap::new();
    for entry in entries {
        let Some(start) = entry.valid_from else {
            continue;
        };
        months
            .entry((start.year(), start.month0()))
            .or_default()
            .add(entry.total_slots(), entry.is_return());
    }

    months
        .into_iter()
        .map(|((year, month0), split)| MonthlyPoint {
            label: format!("{}/{}", MONTH_LABELS[month0 as usize], year),
            first_visit: split.first_visit,
            returns: split.returns,
        })
        .collect()
}

pub(crate) fn specialties(entries: &[ScheduleEntry]) -> Vec<RankedValue> {
    let mut tally = Tally::default();
    for entry in entries {
        let procedure = if entry.procedure_name.is_empty() {
            "OUTROS"
        } else {
            entry.procedure_name.as_str()
        };
        tally.add(&extract_specialty(procedure), entry.total_slots());
    }
    top_labels(tally, SPECIALTY_LIMIT)
}

pub(crate) fn ranking(entries: &[ScheduleEntry]) -> Vec<RankedValue> {
    let mut tally = Tally::default();
    for entry in entries {
        let name = if entry.professional_name.is_empty() {
            "Sem nome"
        } else {
            entry.professional_name.trim()
        };
        if name.is_empty() {
            continue;
        }
        tally.add(name, entry.total_slots());
    }
    top_labels(tally, RANKING_LIMIT)
}

fn top_labels(tally: Tally, limit: usize) -> Vec<RankedValue> {
    tally
        .ranked()
        .into_iter()
        .take(limit)
        .map(|(name, value)| RankedValue {
            name: truncate_label(&name),
            value,
        })
        .collect()
}

/// Figures on the per-day `vagas` value, without the calendar expansion.
pub(crate) fn highlights(entries: &[ScheduleEntry]) -> OfferHighlights {
    let raw_slots: u64 = entries
        .iter()
        .map(|entry| u64::from(entry.slots_per_day))
        .sum();

    // Later entries win ties.
    let largest_offer = entries
        .iter()
        .reduce(|best, entry| {
            if best.slots_per_day > entry.slots_per_day {
                best
            } else {
                entry
            }
        })
        .map(|entry| LargestOffer {
            procedure: entry.procedure_name.clone(),
            slots: entry.slots_per_day,
        });

    let average = if entries.is_empty() {
        0.0
    } else {
        raw_slots as f64 / entries.len() as f64
    };

    OfferHighlights {
        raw_slots,
        largest_offer,
        average_per_entry: format!("{average:.1}"),
    }
}
