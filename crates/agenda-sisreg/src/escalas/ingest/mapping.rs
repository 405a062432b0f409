use super::normalizer::normalize_key;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Canonical schedule fields a legacy column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum EntryField {
    Cpf,
    Professional,
    ProcedureCode,
    Procedure,
    Exams,
    Weekdays,
    StartTime,
    EndTime,
    Slots,
    ValidFrom,
    ValidTo,
    Unit,
}

/// Field and precedence of a column name. Lower rank wins when a row
/// carries several variants of the same field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldMatch {
    pub(crate) field: EntryField,
    pub(crate) rank: u8,
}

static LEGACY_KEY_MAP: OnceLock<HashMap<String, FieldMatch>> = OnceLock::new();

pub(crate) fn field_for_normalized(normalized_key: &str) -> Option<FieldMatch> {
    legacy_key_map().get(normalized_key).copied()
}

fn legacy_key_map() -> &'static HashMap<String, FieldMatch> {
    LEGACY_KEY_MAP.get_or_init(|| {
        const KEY_TO_FIELD: &[(EntryField, &[&str])] = &[
            (
                EntryField::Cpf,
                &["cpf", "cpf do profissional", "cpf_profissional"],
            ),
            (
                EntryField::Professional,
                &["profissional", "nome do profissional", "nome_profissional"],
            ),
            (
                EntryField::ProcedureCode,
                &["cod_procedimento", "cod. procedimento", "cod procedimento"],
            ),
            (
                EntryField::Procedure,
                &[
                    "procedimento",
                    "descricao do procedimento",
                    "descrição do procedimento",
                ],
            ),
            (EntryField::Exams, &["exames"]),
            (
                EntryField::Weekdays,
                &["dias_semana", "dias", "dias da semana"],
            ),
            (
                EntryField::StartTime,
                &["hora_inicio", "hora entrada", "hora de entrada"],
            ),
            (
                EntryField::EndTime,
                &["hora_fim", "hora saida", "hora de saída"],
            ),
            (EntryField::Slots, &["vagas"]),
            (
                EntryField::ValidFrom,
                &["vigencia_inicio", "vigência inicial", "vigencia inicial"],
            ),
            (
                EntryField::ValidTo,
                &["vigencia_fim", "vigência final", "vigencia final"],
            ),
            (EntryField::Unit, &["unidade"]),
        ];

        let mut map = HashMap::new();
        for (field, aliases) in KEY_TO_FIELD {
            for (rank, alias) in aliases.iter().enumerate() {
                map.insert(
                    normalize_key(alias),
                    FieldMatch {
                        field: *field,
                        rank: rank as u8,
                    },
                );
            }
        }
        map
    })
}

#[cfg(test)]
pub(crate) fn lookup_for_tests(key: &str) -> Option<FieldMatch> {
    field_for_normalized(&normalize_key(key))
}
