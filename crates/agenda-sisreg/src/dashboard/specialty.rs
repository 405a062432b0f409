use crate::escalas::format::normalize_text;

const FALLBACK: &str = "OUTROS";

/// Words that qualify a specialty rather than name it.
const QUALIFIERS: [&str; 18] = [
    "GERAL",
    "CIRURGICA",
    "CIRURGICO",
    "RETORNO",
    "1A",
    "1ª",
    "PRIMEIRA",
    "AVALIACAO",
    "REAVALIACAO",
    "INFANTIL",
    "PEDIATRICA",
    "PEDIATRICO",
    "URGENTE",
    "URGENCIA",
    "ELETIVA",
    "CONSULTA",
    "EXAME",
    "PROCEDIMENTO",
];

/// Collapses procedure names onto a specialty:
/// `CONSULTA EM CARDIOLOGIA CIRURGICA` and `CONSULTA EM CARDIOLOGIA RETORNO`
/// both become `CARDIOLOGIA`.
pub fn extract_specialty(procedure: &str) -> String {
    let text = normalize_text(procedure);
    if text.is_empty() {
        return FALLBACK.to_string();
    }

    let mut base = match text.find(" EM ") {
        Some(idx) => &text[idx + " EM ".len()..],
        None => text.as_str(),
    };
    for article in ["DE", "DA", "DO"] {
        base = strip_leading_word(base, article);
    }
    let mut base = base.trim().to_string();

    for qualifier in QUALIFIERS {
        if let Some(pos) = base.find(&format!(" {qualifier}")) {
            if pos > 0 {
                base = base[..pos].trim().to_string();
            }
        }
    }

    let base = base
        .split(['-', ',', '/'])
        .next()
        .unwrap_or_default()
        .trim();

    let mut words = base.split_whitespace();
    let Some(first) = words.next() else {
        return FALLBACK.to_string();
    };
    match words.next() {
        Some(second) if first.chars().count() <= 3 => format!("{first} {second}"),
        _ => first.to_string(),
    }
}

/// Drops `word` plus the whitespace after it when `text` starts with it.
fn strip_leading_word<'a>(text: &'a str, word: &str) -> &'a str {
    match text.strip_prefix(word) {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => text,
    }
}
