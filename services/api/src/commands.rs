use crate::infra::{dashboard_source, CommandContext};
use agenda_sisreg::auth::Authenticator;
use agenda_sisreg::catalog::Catalog;
use agenda_sisreg::dashboard::{DashboardFilter, DashboardSummary, DashboardView};
use agenda_sisreg::error::AppError;
use agenda_sisreg::escalas::format::{format_date_br, format_number};
use agenda_sisreg::escalas::{
    calculate_total_slots, export_file_name, DraftBook, ScheduleEntry, WeekdaySet,
};
use agenda_sisreg::sync::{SheetsClient, SyncOutcome, SyncService};
use chrono::{Local, NaiveDate, Utc};
use clap::{Args, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct VagasArgs {
    /// Slots offered on each scheduled day
    #[arg(long)]
    pub(crate) vagas: u32,
    /// Weekday tokens, e.g. "SEG QUA SEX"
    #[arg(long)]
    pub(crate) dias: String,
    /// First day of the validity window (YYYY-MM-DD or DD/MM/YYYY)
    #[arg(long)]
    pub(crate) inicio: String,
    /// Last day of the validity window (YYYY-MM-DD or DD/MM/YYYY)
    #[arg(long)]
    pub(crate) fim: String,
}

#[derive(Args, Debug)]
pub(crate) struct LoginArgs {
    /// Unit name exactly as listed in the reference data
    #[arg(long)]
    pub(crate) unidade: String,
    /// The unit's CNES code
    #[arg(long)]
    pub(crate) senha: String,
}

#[derive(Subcommand, Debug)]
pub(crate) enum EscalasCommand {
    /// Save a new schedule draft
    Add(AddArgs),
    /// Show saved drafts
    List,
    /// Delete the draft at the given position (0-based)
    Remove { index: usize },
    /// Delete every draft
    Clear,
    /// Write the drafts CSV and submit every draft to the spreadsheet
    Export(ExportArgs),
}

#[derive(Args, Debug)]
pub(crate) struct AddArgs {
    #[arg(long)]
    pub(crate) cpf: String,
    /// Defaults to the catalog name for the CPF at the active unit
    #[arg(long)]
    pub(crate) profissional: Option<String>,
    #[arg(long, default_value = "")]
    pub(crate) cod_procedimento: String,
    /// Defaults to the catalog name for the procedure code
    #[arg(long)]
    pub(crate) procedimento: Option<String>,
    /// Exam list; only accepted for GRUPO procedures
    #[arg(long, default_value = "")]
    pub(crate) exames: String,
    #[arg(long)]
    pub(crate) dias: String,
    #[arg(long, default_value = "")]
    pub(crate) hora_inicio: String,
    #[arg(long, default_value = "")]
    pub(crate) hora_fim: String,
    #[arg(long)]
    pub(crate) vagas: u32,
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) vigencia_inicio: NaiveDate,
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) vigencia_fim: NaiveDate,
    /// Defaults to the active unit
    #[arg(long)]
    pub(crate) unidade: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Directory the CSV is written to
    #[arg(long, default_value = ".")]
    pub(crate) dir: PathBuf,
    /// Only write the CSV; keep drafts and skip submission
    #[arg(long)]
    pub(crate) offline: bool,
    /// Date used in the file name (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct SyncArgs {
    /// Refresh the consolidated cache of every unit (MASTER sessions only)
    #[arg(long)]
    pub(crate) all: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DashboardArgs {
    /// Month filter: "todos" or 01-12
    #[arg(long, default_value = "todos")]
    pub(crate) mes: String,
    /// Unit filter: "ALL" or a unit name
    #[arg(long, default_value = "ALL")]
    pub(crate) unidade: String,
    /// Print the full summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CatalogCommand {
    /// Autocomplete lookup over the reference data
    Search {
        target: CatalogTarget,
        term: String,
        /// Unit whose professionals are searched (defaults to the active unit)
        #[arg(long)]
        unidade: Option<String>,
    },
    /// Reference data totals
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum CatalogTarget {
    Units,
    Professionals,
    Procedures,
}

pub(crate) fn run_vagas(args: VagasArgs) -> Result<(), AppError> {
    let total = calculate_total_slots(args.vagas, &args.dias, &args.inicio, &args.fim);
    println!("Total de vagas: {}", format_number(total));
    Ok(())
}

pub(crate) fn run_login(args: LoginArgs) -> Result<(), AppError> {
    let context = CommandContext::load()?;
    let catalog = context.catalog()?;
    let authenticator = Authenticator::new(&catalog, context.config.session.ttl);
    let session = authenticator.login(&args.unidade, &args.senha, Utc::now())?;
    context.sessions().save(&session)?;

    info!(unit = %session.unit, profile = ?session.profile, "logged in");
    println!(
        "Sessão iniciada para {} ({:?}), válida até {}.",
        session.unit,
        session.profile,
        session.expires_at.format("%d/%m/%Y %H:%M")
    );
    println!("Próxima tela: {}", session.profile.landing());
    Ok(())
}

pub(crate) fn run_logout() -> Result<(), AppError> {
    let context = CommandContext::load()?;
    context.sessions().logout()?;
    println!("Sessão encerrada.");
    Ok(())
}

pub(crate) async fn run_escalas(command: EscalasCommand) -> Result<(), AppError> {
    let context = CommandContext::load()?;
    let unit = context.sessions().active_unit()?;
    let book = DraftBook::new(&context.store, unit.clone());

    match command {
        EscalasCommand::Add(args) => {
            let catalog = context.catalog()?;
            let entry = draft_from_args(args, &catalog, &unit);
            let total = book.add(entry)?;
            println!("Escala salva. {total} escala(s) pendente(s).");
        }
        EscalasCommand::List => print_drafts(&book.list()?),
        EscalasCommand::Remove { index } => {
            let removed = book.remove(index)?;
            println!(
                "Removida: {} | {}",
                removed.professional_name,
                removed.procedure_label()
            );
        }
        EscalasCommand::Clear => {
            book.clear()?;
            println!("Escalas locais removidas.");
        }
        EscalasCommand::Export(args) => {
            let today = args.today.unwrap_or_else(|| Local::now().date_naive());
            if args.offline {
                let csv = book.export()?;
                if csv.is_empty() {
                    println!("Nenhuma escala para exportar.");
                    return Ok(());
                }
                let file = args.dir.join(export_file_name(&unit, today));
                fs::write(&file, csv)?;
                println!("CSV salvo em {}", file.display());
                return Ok(());
            }

            let client = SheetsClient::from_config(&context.config.sheets)?;
            let report = book.finalize(&client, &args.dir, today).await?;
            println!("{}", report.message());
            println!("Arquivo: {}", report.file.display());
        }
    }

    Ok(())
}

fn draft_from_args(args: AddArgs, catalog: &Catalog, active_unit: &str) -> ScheduleEntry {
    let unit = args
        .unidade
        .filter(|unit| !unit.trim().is_empty())
        .unwrap_or_else(|| active_unit.to_string());
    let professional_name = args.profissional.unwrap_or_else(|| {
        catalog
            .professional(&unit, &args.cpf)
            .map(|professional| professional.name.clone())
            .unwrap_or_default()
    });
    let procedure_name = args.procedimento.unwrap_or_else(|| {
        catalog
            .procedure(&args.cod_procedimento)
            .map(|procedure| procedure.name.clone())
            .unwrap_or_default()
    });

    ScheduleEntry {
        professional_id: args.cpf.trim().to_string(),
        professional_name,
        procedure_code: args.cod_procedimento.trim().to_string(),
        procedure_name,
        exam_names: args.exames.trim().to_string(),
        weekdays: WeekdaySet::parse(&args.dias),
        start_time: args.hora_inicio.trim().to_string(),
        end_time: args.hora_fim.trim().to_string(),
        slots_per_day: args.vagas,
        valid_from: Some(args.vigencia_inicio),
        valid_to: Some(args.vigencia_fim),
        unit,
    }
}

fn print_drafts(drafts: &[ScheduleEntry]) {
    if drafts.is_empty() {
        println!("Nenhuma escala pendente.");
        return;
    }

    println!("{} escala(s) pendente(s):", drafts.len());
    for (index, entry) in drafts.iter().enumerate() {
        let period = match (entry.valid_from, entry.valid_to) {
            (Some(start), Some(end)) => {
                format!("{} a {}", format_date_br(start), format_date_br(end))
            }
            _ => "sem vigência".to_string(),
        };
        println!(
            "  [{index}] {} ({}) | {} | {} {}-{} | {} vaga(s)/dia | {} | total {}",
            entry.professional_name,
            entry.professional_id,
            entry.procedure_label(),
            entry.weekdays,
            entry.start_time,
            entry.end_time,
            entry.slots_per_day,
            period,
            format_number(entry.total_slots())
        );
    }
}

pub(crate) async fn run_sync(args: SyncArgs) -> Result<(), AppError> {
    let context = CommandContext::load()?;
    let sessions = context.sessions();
    let client = SheetsClient::from_config(&context.config.sheets)?;
    let service = SyncService::new(&client, &context.store);

    let outcome = if args.all {
        let master = sessions
            .current(Utc::now())?
            .is_some_and(|session| session.is_master());
        if !master {
            return Err(AppError::Validation(
                "A sincronização consolidada exige uma sessão MASTER.".to_string(),
            ));
        }
        service.sync_all().await?
    } else {
        let unit = sessions.active_unit()?;
        service.sync_unit(&unit).await?
    };

    match outcome {
        SyncOutcome::Updated { entries, units } => {
            println!(
                "Cache atualizado: {} escala(s) em {} unidade(s).",
                entries.len(),
                units.len()
            );
        }
        SyncOutcome::NoData { status } => {
            println!("⚠️ Sheets respondeu, mas sem dados para esta unidade. (status {status})");
        }
    }
    Ok(())
}

pub(crate) fn run_dashboard(args: DashboardArgs) -> Result<(), AppError> {
    let context = CommandContext::load()?;
    let entries = dashboard_source(&context.store, &context.sessions())?;
    let filter = DashboardFilter::parse(&args.mes, &args.unidade)?;
    let summary = DashboardView::new(entries).summarize(&filter);

    if args.json {
        let rendered =
            serde_json::to_string_pretty(&summary).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        render_dashboard(&summary);
    }
    Ok(())
}

fn render_dashboard(summary: &DashboardSummary) {
    println!(
        "Dashboard (mês {}, unidade {}): {} escala(s)",
        summary.filters.month, summary.filters.unit, summary.entries
    );
    let kpis = &summary.kpis;
    println!(
        "- Total de vagas: {} | Profissionais: {} | Procedimentos: {}",
        kpis.total_slots_label, kpis.professionals, kpis.procedures
    );
    println!(
        "- 1ª vez: {}% | Retorno: {}%",
        kpis.first_visit_pct, kpis.return_pct
    );

    let highlights = &summary.highlights;
    match &highlights.largest_offer {
        Some(offer) => println!(
            "- Maior oferta: {} ({} vagas) | Média por escala: {}",
            offer.procedure, offer.slots, highlights.average_per_entry
        ),
        None => println!("- Sem ofertas registradas"),
    }

    if !summary.monthly.is_empty() {
        println!("Evolução mensal:");
        for point in &summary.monthly {
            println!(
                "  - {}: {} 1ª vez / {} retorno",
                point.label, point.first_visit, point.returns
            );
        }
    }
    if !summary.specialties.is_empty() {
        println!("Oferta por especialidade:");
        for item in &summary.specialties {
            println!("  - {}: {}", item.name, format_number(item.value));
        }
    }
    if !summary.ranking.is_empty() {
        println!("Ranking de profissionais:");
        for (position, item) in summary.ranking.iter().enumerate() {
            println!(
                "  {}. {}: {}",
                position + 1,
                item.name,
                format_number(item.value)
            );
        }
    }
    if let Some(insights) = &summary.insights {
        println!("Insights:");
        for line in insights.lines() {
            println!("  {line}");
        }
    }
}

pub(crate) fn run_catalog(command: CatalogCommand) -> Result<(), AppError> {
    let context = CommandContext::load()?;
    let catalog = context.catalog()?;

    match command {
        CatalogCommand::Search {
            target,
            term,
            unidade,
        } => match target {
            CatalogTarget::Units => {
                for unit in catalog.search_units(&term) {
                    println!("{} | CNES {} | {}", unit.name, unit.cnes, unit.kind);
                }
            }
            CatalogTarget::Professionals => {
                let unit = match unidade {
                    Some(unit) => unit,
                    None => context.sessions().active_unit()?,
                };
                for professional in catalog.search_professionals(&unit, &term) {
                    println!("{} | CPF {}", professional.name, professional.cpf);
                }
            }
            CatalogTarget::Procedures => {
                for procedure in catalog.search_procedures(&term) {
                    let exams = if procedure.accepts_exams() {
                        " | aceita exames"
                    } else {
                        ""
                    };
                    println!("{}{}", procedure.label(), exams);
                }
            }
        },
        CatalogCommand::Stats => {
            let stats = catalog.statistics();
            println!(
                "Unidades: {} | Profissionais: {} | Procedimentos: {}",
                stats.total_units, stats.total_professionals, stats.total_procedures
            );
            for (kind, count) in &stats.units_by_kind {
                println!("  - unidades {kind}: {count}");
            }
            for (kind, count) in &stats.procedures_by_kind {
                println!("  - procedimentos {kind}: {count}");
            }
            println!(
                "Regulados: {} | Não regulados: {}",
                stats.regulated, stats.not_regulated
            );
        }
    }
    Ok(())
}
