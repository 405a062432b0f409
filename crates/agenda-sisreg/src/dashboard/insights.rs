use super::summary::{percent, Tally};
use super::views::{InsightsView, Recommendation};
use crate::escalas::{ScheduleEntry, Weekday};
use std::collections::BTreeMap;

const FIRST_HOUR: u32 = 7;
const LAST_HOUR: u32 = 18;
const TOP3_THRESHOLD: u8 = 60;
const HHI_THRESHOLD: u32 = 180;
const RETURN_THRESHOLD: u8 = 55;

/// Concentration insights on the raw per-day `vagas`. `None` for an empty
/// dataset.
pub(crate) fn generate_insights(entries: &[ScheduleEntry]) -> Option<InsightsView> {
    if entries.is_empty() {
        return None;
    }

    let total: u64 = entries
        .iter()
        .map(|entry| u64::from(entry.slots_per_day))
        .sum();

    let mut by_day: BTreeMap<Weekday, u64> =
        Weekday::ordered().into_iter().map(|day| (day, 0)).collect();
    let mut by_hour: BTreeMap<u32, u64> = (FIRST_HOUR..=LAST_HOUR).map(|h| (h, 0)).collect();
    let mut by_professional = Tally::default();
    let mut by_procedure = Tally::default();
    let mut return_slots = 0u64;

    for entry in entries {
        let slots = u64::from(entry.slots_per_day);

        if entry.weekdays.is_empty() {
            *by_day.entry(Weekday::Seg).or_default() += slots;
        } else {
            for day in entry.weekdays.iter() {
                *by_day.entry(day).or_default() += slots;
            }
        }

        if let Some(bucket) = start_hour(&entry.start_time).and_then(|h| by_hour.get_mut(&h)) {
            *bucket += slots;
        }

        let professional = if entry.professional_name.is_empty() {
            "(Sem nome)"
        } else {
            entry.professional_name.as_str()
        };
        by_professional.add(professional, slots);

        let procedure = if entry.procedure_name.is_empty() {
            "OUTROS"
        } else {
            entry.procedure_name.trim()
        };
        by_procedure.add(procedure, slots);

        if entry.is_return() {
            return_slots += slots;
        }
    }

    let top_day = first_max(Weekday::ordered().into_iter().map(|day| (day, by_day[&day])))
        .unwrap_or(Weekday::Dom);
    let peak_hour = first_max(by_hour.iter().map(|(hour, slots)| (*hour, *slots)))
        .unwrap_or(FIRST_HOUR);

    let hhi = if total > 0 {
        let sum: f64 = by_professional
            .values()
            .map(|value| (value as f64 / total as f64).powi(2))
            .sum();
        (sum * 1000.0).round() as u32
    } else {
        0
    };

    let top3: u64 = by_professional
        .ranked()
        .iter()
        .take(3)
        .map(|(_, value)| value)
        .sum();
    let top3_pct = percent(top3, total);
    let return_pct = percent(return_slots, total);

    let leading_procedure = by_procedure
        .ranked()
        .into_iter()
        .next()
        .map(|(name, _)| name)
        .unwrap_or_else(|| "-".to_string());

    let recommendation = if return_pct >= RETURN_THRESHOLD {
        Recommendation::HighReturn
    } else if top3_pct >= TOP3_THRESHOLD || hhi >= HHI_THRESHOLD {
        Recommendation::HighConcentration
    } else {
        Recommendation::Healthy
    };

    Some(InsightsView {
        top_day,
        top_day_label: top_day.label(),
        top_day_pct: percent(by_day[&top_day], total),
        peak_hour,
        top3_pct,
        hhi,
        return_pct,
        leading_procedure,
        recommendation,
        recommendation_text: recommendation.message(),
    })
}

/// Key of the first strictly greatest value.
fn first_max<K: Copy>(values: impl Iterator<Item = (K, u64)>) -> Option<K> {
    let mut best: Option<(K, u64)> = None;
    for (key, value) in values {
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((key, value)),
        }
    }
    best.map(|(key, _)| key)
}

/// Leading hour digits of `HH:MM` (or an ISO datetime).
fn start_hour(time: &str) -> Option<u32> {
    let formatted = crate::escalas::format::format_hour(time);
    let digits: String = formatted
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalas::WeekdaySet;

    fn entry(name: &str, procedure: &str, days: &str, start: &str, slots: u32) -> ScheduleEntry {
        ScheduleEntry {
            professional_name: name.to_string(),
            procedure_name: procedure.to_string(),
            weekdays: WeekdaySet::parse(days),
            start_time: start.to_string(),
            slots_per_day: slots,
            ..ScheduleEntry::default()
        }
    }

    #[test]
    fn empty_dataset_has_no_insights() {
        assert!(generate_insights(&[]).is_none());
    }

    #[test]
    fn single_professional_is_concentrated() {
        let insights = generate_insights(&[
            entry("Ana", "CONSULTA EM CARDIOLOGIA", "TER", "08:00", 10),
            entry("Ana", "CONSULTA EM PNEUMOLOGIA", "", "19:00", 10),
        ])
        .expect("insights");

        // TER and the weekday-less entry counted on SEG tie; SEG comes first.
        assert_eq!(insights.top_day, Weekday::Seg);
        assert_eq!(insights.top_day_pct, 50);
        assert_eq!(insights.peak_hour, 8);
        assert_eq!(insights.hhi, 1000);
        assert_eq!(insights.top3_pct, 100);
        assert_eq!(insights.leading_procedure, "CONSULTA EM CARDIOLOGIA");
        assert_eq!(insights.recommendation, Recommendation::HighConcentration);
    }

    #[test]
    fn high_return_share_takes_precedence() {
        let insights = generate_insights(&[
            entry("Ana", "RETORNO EM ORTOPEDIA", "SEG", "07:00", 6),
            entry("Bia", "CONSULTA", "QUA", "07:00", 4),
        ])
        .expect("insights");
        assert_eq!(insights.return_pct, 60);
        assert_eq!(insights.recommendation, Recommendation::HighReturn);
        assert_eq!(insights.lines().len(), 6);
    }

    #[test]
    fn spread_offer_is_healthy() {
        let entries: Vec<ScheduleEntry> = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"]
            .into_iter()
            .map(|name| entry(name, "CONSULTA EM CLINICA", "SEG SEX", "09:00", 5))
            .collect();
        let insights = generate_insights(&entries).expect("insights");
        assert_eq!(insights.top3_pct, 30);
        assert_eq!(insights.hhi, 100);
        assert_eq!(insights.recommendation, Recommendation::Healthy);
        assert_eq!(insights.recommendation_text, "Distribuição saudável.");
    }

    #[test]
    fn start_hour_reads_leading_digits() {
        assert_eq!(start_hour("07:30"), Some(7));
        assert_eq!(start_hour("1899-12-30T13:00:00.000Z"), Some(13));
        assert_eq!(start_hour(""), None);
    }
}
