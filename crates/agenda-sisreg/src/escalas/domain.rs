use super::format::ProcedureKind;
use super::vagas;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Canonical Portuguese weekday tokens, Sunday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Weekday {
    Dom,
    Seg,
    Ter,
    Qua,
    Qui,
    Sex,
    Sab,
}

impl Weekday {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Dom,
            Self::Seg,
            Self::Ter,
            Self::Qua,
            Self::Qui,
            Self::Sex,
            Self::Sab,
        ]
    }

    pub const fn token(self) -> &'static str {
        match self {
            Self::Dom => "DOM",
            Self::Seg => "SEG",
            Self::Ter => "TER",
            Self::Qua => "QUA",
            Self::Qui => "QUI",
            Self::Sex => "SEX",
            Self::Sab => "SAB",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Dom => "Domingo",
            Self::Seg => "Segunda-feira",
            Self::Ter => "Terça-feira",
            Self::Qua => "Quarta-feira",
            Self::Qui => "Quinta-feira",
            Self::Sex => "Sexta-feira",
            Self::Sab => "Sábado",
        }
    }

    /// 0 = Sunday ... 6 = Saturday.
    pub const fn index(self) -> u8 {
        match self {
            Self::Dom => 0,
            Self::Seg => 1,
            Self::Ter => 2,
            Self::Qua => 3,
            Self::Qui => 4,
            Self::Sex => 5,
            Self::Sab => 6,
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|day| day.token() == token)
    }

    pub fn from_chrono(day: chrono::Weekday) -> Self {
        Self::ordered()[day.num_days_from_sunday() as usize]
    }
}

/// Set of weekdays a schedule recurs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Parses free-form text such as `"SEG SEX"` or `"seg,qua;sex"`.
    /// Unknown tokens are dropped.
    pub fn parse(text: &str) -> Self {
        text.to_uppercase()
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '/'))
            .filter(|token| !token.is_empty())
            .filter_map(Weekday::from_token)
            .collect()
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.index();
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.index()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        Weekday::ordered()
            .into_iter()
            .filter(move |day| self.contains(*day))
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = Self::empty();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<&str> = self.iter().map(Weekday::token).collect();
        f.write_str(&tokens.join(" "))
    }
}

impl Serialize for WeekdaySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekdaySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|text| Self::parse(&text)).unwrap_or_default())
    }
}

/// One recurring weekly schedule for a professional/procedure pair.
///
/// Serialized with the legacy spreadsheet column keys so cached lists and
/// submitted payloads stay readable by the Apps Script backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    #[serde(rename = "cpf", default)]
    pub professional_id: String,
    #[serde(rename = "profissional", default)]
    pub professional_name: String,
    #[serde(rename = "cod_procedimento", default)]
    pub procedure_code: String,
    #[serde(rename = "procedimento", default)]
    pub procedure_name: String,
    #[serde(rename = "exames", default)]
    pub exam_names: String,
    #[serde(rename = "dias_semana", default)]
    pub weekdays: WeekdaySet,
    #[serde(rename = "hora_inicio", default)]
    pub start_time: String,
    #[serde(rename = "hora_fim", default)]
    pub end_time: String,
    #[serde(rename = "vagas", default)]
    pub slots_per_day: u32,
    #[serde(rename = "vigencia_inicio", default, with = "date_field")]
    pub valid_from: Option<NaiveDate>,
    #[serde(rename = "vigencia_fim", default, with = "date_field")]
    pub valid_to: Option<NaiveDate>,
    #[serde(rename = "unidade", default)]
    pub unit: String,
}

impl ScheduleEntry {
    /// Bookable slots over the whole validity window.
    pub fn total_slots(&self) -> u64 {
        match (self.valid_from, self.valid_to) {
            (Some(start), Some(end)) => {
                vagas::total_slots(self.slots_per_day, self.weekdays, start, end)
            }
            _ => 0,
        }
    }

    /// Return visits are flagged by RETORNO in the procedure or exam text.
    pub fn is_return(&self) -> bool {
        self.procedure_name.to_uppercase().contains("RETORNO")
            || self.exam_names.to_uppercase().contains("RETORNO")
    }

    pub fn procedure_kind(&self) -> ProcedureKind {
        ProcedureKind::classify(&self.procedure_name)
    }

    /// `"<code> - <name>"`, as shown in the drafts table.
    pub fn procedure_label(&self) -> String {
        match (self.procedure_code.is_empty(), self.procedure_name.is_empty()) {
            (true, _) => self.procedure_name.clone(),
            (false, true) => self.procedure_code.clone(),
            (false, false) => format!("{} - {}", self.procedure_code, self.procedure_name),
        }
    }
}

pub(crate) mod date_field {
    use super::super::vagas::parse_schedule_date;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.collect_str(&date.format("%Y-%m-%d")),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse_schedule_date))
    }
}
