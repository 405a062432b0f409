use agenda_sisreg::dashboard::{DashboardFilter, DashboardView, Recommendation};
use agenda_sisreg::escalas::ingest::normalize_list;
use serde_json::json;

fn dataset() -> DashboardView {
    let rows = json!([
        {
            "cpf": "111", "profissional": "Ana Lima",
            "procedimento": "CONSULTA EM CARDIOLOGIA GERAL",
            "dias_semana": "SEG", "hora_inicio": "07:00", "vagas": 5,
            "vigencia_inicio": "2024-01-01", "vigencia_fim": "2024-01-31",
            "unidade": "UBS SUL"
        },
        {
            "cpf": "111", "profissional": "Ana Lima",
            "procedimento": "RETORNO EM CARDIOLOGIA",
            "dias_semana": "QUA", "hora_inicio": "08:00", "vagas": "4",
            "vigencia_inicio": "01/01/2024", "vigencia_fim": "31/01/2024",
            "unidade": "UBS SUL"
        },
        {
            "CPF": "222", "Nome do Profissional": "Bruno Reis",
            "Descricao do Procedimento": "CONSULTA EM ORTOPEDIA",
            "Dias da Semana": "TER,QUI", "Hora Entrada": "1899-12-30T13:00:00.000Z",
            "VAGAS": 2,
            "Vigencia Inicial": "2024-02-01T03:00:00.000Z", "Vigencia Final": "2024-02-29",
            "Unidade": "UBS NORTE"
        }
    ]);
    DashboardView::new(normalize_list(&rows, "AGENDA TESTE"))
}

#[test]
fn consolidated_dashboard_matches_known_totals() {
    let view = dataset();
    let summary = view.summarize(&DashboardFilter::default());

    assert_eq!(summary.entries, 3);
    assert_eq!(summary.units, vec!["UBS NORTE", "UBS SUL"]);

    // 5 Mondays x 5, 5 Wednesdays x 4, 9 Tuesdays/Thursdays x 2.
    assert_eq!(summary.kpis.total_slots, 63);
    assert_eq!(summary.kpis.total_slots_label, "63");
    assert_eq!(summary.kpis.professionals, 2);
    assert_eq!(summary.kpis.procedures, 3);
    assert_eq!(summary.kpis.return_pct, 32);
    assert_eq!(summary.kpis.first_visit_pct, 68);
    assert_eq!(summary.visit_split.returns, 20);

    let months: Vec<(&str, u64, u64)> = summary
        .monthly
        .iter()
        .map(|point| (point.label.as_str(), point.first_visit, point.returns))
        .collect();
    assert_eq!(months, vec![("Jan/2024", 25, 20), ("Fev/2024", 18, 0)]);

    assert_eq!(summary.specialties[0].name, "CARDIOLOGIA");
    assert_eq!(summary.specialties[0].value, 45);
    assert_eq!(summary.specialties[1].name, "ORTOPEDIA");
    assert_eq!(summary.ranking[0].name, "Ana Lima");
    assert_eq!(summary.ranking[1].value, 18);

    assert_eq!(summary.highlights.raw_slots, 11);
    assert_eq!(
        summary
            .highlights
            .largest_offer
            .as_ref()
            .map(|offer| offer.procedure.as_str()),
        Some("CONSULTA EM CARDIOLOGIA GERAL")
    );
    assert_eq!(summary.highlights.average_per_entry, "3.7");
}

#[test]
fn insights_use_raw_daily_slots() {
    let summary = dataset().summarize(&DashboardFilter::default());
    let insights = summary.insights.expect("dataset is not empty");

    assert_eq!(insights.top_day.token(), "SEG");
    assert_eq!(insights.top_day_pct, 45);
    assert_eq!(insights.peak_hour, 7);
    assert_eq!(insights.hhi, 702);
    assert_eq!(insights.top3_pct, 100);
    assert_eq!(insights.return_pct, 36);
    assert_eq!(insights.leading_procedure, "CONSULTA EM CARDIOLOGIA GERAL");
    assert_eq!(insights.recommendation, Recommendation::HighConcentration);
}

#[test]
fn filters_narrow_the_dataset() {
    let view = dataset();

    let february = DashboardFilter::parse("02", "ALL").expect("valid filter");
    let summary = view.summarize(&february);
    assert_eq!(summary.entries, 1);
    assert_eq!(summary.kpis.total_slots, 18);
    assert_eq!(summary.units.len(), 2);

    let south = DashboardFilter::parse("todos", "UBS SUL").expect("valid filter");
    assert_eq!(view.summarize(&south).kpis.total_slots, 45);

    let december = DashboardFilter::parse("12", "ALL").expect("valid filter");
    let empty = view.summarize(&december);
    assert_eq!(empty.kpis.total_slots, 0);
    assert_eq!(empty.kpis.return_pct, 0);
    assert!(empty.insights.is_none());
    assert!(empty.monthly.is_empty());
}
