use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Keeps `HH:MM` out of an ISO datetime; other values pass through.
pub fn format_hour(value: &str) -> String {
    match value.split_once('T') {
        Some((_, time)) => time.chars().take(5).collect(),
        None => value.trim().to_string(),
    }
}

pub fn format_date_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// pt-BR integer formatting: `1234567` -> `1.234.567`.
pub fn format_number(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Format check only; check digits are not verified.
pub fn is_valid_cpf(cpf: &str) -> bool {
    cpf.chars().filter(char::is_ascii_digit).count() == 11
}

pub fn clean_text(text: &str) -> String {
    text.replace('"', "").trim().to_string()
}

/// Accent-free uppercase form used for grouping free text.
pub fn normalize_text(text: &str) -> String {
    unidecode::unidecode(text).to_uppercase().trim().to_string()
}

/// Chart labels longer than 20 characters are cut to 17 plus an ellipsis.
pub fn truncate_label(name: &str) -> String {
    if name.chars().count() > 20 {
        let head: String = name.chars().take(17).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProcedureKind {
    Retorno,
    Grupo,
    Exame,
    Consulta,
    Outros,
}

impl ProcedureKind {
    pub fn classify(text: &str) -> Self {
        let upper = text.to_uppercase();
        if upper.contains("RETORNO") {
            Self::Retorno
        } else if upper.contains("GRUPO") {
            Self::Grupo
        } else if upper.contains("EXAME") {
            Self::Exame
        } else if upper.contains("CONSULTA") {
            Self::Consulta
        } else {
            Self::Outros
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Retorno => "RETORNO",
            Self::Grupo => "GRUPO",
            Self::Exame => "EXAME",
            Self::Consulta => "CONSULTA",
            Self::Outros => "OUTROS",
        }
    }
}
