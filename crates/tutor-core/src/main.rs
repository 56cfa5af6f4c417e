use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tutor_ai::{init_tracing, ProxyCapability};
use tutor_core::{
    read_attachment, AnswerOutcome, EnrichmentReport, EnsureOutcome, StudySession, TutorConfig,
    TutorError,
};
use tutor_model::{CardId, CourseSection, QuestionId, Workspace, WorkspaceId};
use tutor_store::{JsonFileStorage, WorkspaceStore};

fn cli() -> Command {
    Command::new("tutor")
        .version(tutor_core::VERSION)
        .about("Turn a document into a study workspace and work through it")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("ingest")
                .about("Upload a document, build its curriculum and enrich the first unit")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(Command::new("list").about("List workspaces"))
        .subcommand(
            Command::new("show")
                .about("Show the active workspace or one of its units")
                .arg(
                    Arg::new("section")
                        .long("section")
                        .value_parser(value_parser!(usize))
                        .help("Unit index to show in full"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("study")
                .about("Select a unit and enrich it if it has no content yet")
                .arg(
                    Arg::new("section")
                        .required(true)
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("refresh")
                        .long("refresh")
                        .action(ArgAction::SetTrue)
                        .help("Regenerate every stage even if content exists"),
                ),
        )
        .subcommand(Command::new("next").about("Move to the next unit"))
        .subcommand(
            Command::new("answer")
                .about("Answer a practice question")
                .arg(
                    Arg::new("section")
                        .required(true)
                        .value_parser(value_parser!(usize)),
                )
                .arg(Arg::new("question").required(true).help("Question id"))
                .arg(
                    Arg::new("choice")
                        .required(true)
                        .value_parser(value_parser!(usize))
                        .help("Zero-based option index"),
                ),
        )
        .subcommand(
            Command::new("review")
                .about("List missed questions, or record a flashcard review")
                .arg(
                    Arg::new("section")
                        .required(true)
                        .value_parser(value_parser!(usize)),
                )
                .arg(Arg::new("card").long("card").help("Flashcard id"))
                .arg(
                    Arg::new("recalled")
                        .long("recalled")
                        .requires("card")
                        .action(ArgAction::SetTrue)
                        .help("The card was recalled"),
                ),
        )
        .subcommand(
            Command::new("use")
                .about("Make a workspace active")
                .arg(Arg::new("workspace").required(true)),
        )
        .subcommand(Command::new("new").about("Clear the selection before a new upload"))
        .subcommand(Command::new("purge").about("Delete every workspace"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json-logs"));

    let config = TutorConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))
        .map_err(present)?;
    let capability = ProxyCapability::new(config.proxy_client())
        .context("failed to build the proxy client")?;
    let storage = Arc::new(JsonFileStorage::new(config.state_path.clone()));
    let session = StudySession::new(
        Arc::new(WorkspaceStore::hydrate(storage)),
        Arc::new(capability),
    );

    run(&session, &config, &matches).await.map_err(present)
}

async fn run(
    session: &StudySession,
    config: &TutorConfig,
    matches: &ArgMatches,
) -> Result<(), TutorError> {
    match matches.subcommand() {
        Some(("ingest", args)) => {
            let path = required::<PathBuf>(args, "file")?;
            let attachment = read_attachment(&path, config.max_upload_bytes).await?;
            let report = session.ingest(attachment).await?;
            println!("Created workspace {} with {} units", report.workspace, report.sections);
            print_report(&report.enrichment);
        }
        Some(("list", _)) => {
            let active = session.store().active_workspace_id();
            let workspaces = session.store().workspaces();
            if workspaces.is_empty() {
                println!("No workspaces.");
            }
            for ws in workspaces {
                let marker = if Some(ws.id()) == active { "*" } else { " " };
                let stats = ws.coverage_stats;
                println!(
                    "{} {}  {:<32} {:>3} units  ingested {:>3}%  retained {:>3}%  validated {:>3}%",
                    marker,
                    ws.id(),
                    ws.subject,
                    ws.sections.len(),
                    stats.ingested,
                    stats.retained,
                    stats.validated
                );
            }
        }
        Some(("show", args)) => {
            let ws = session.active()?;
            let json = args.get_flag("json");
            match args.get_one::<usize>("section").copied() {
                Some(index) => {
                    let section = ws.section(index).ok_or(TutorError::SectionOutOfRange {
                        index,
                        len: ws.sections.len(),
                    })?;
                    if json {
                        print_json(section);
                    } else {
                        print_section(index, section);
                    }
                }
                None if json => print_json(&ws),
                None => print_workspace(&ws),
            }
        }
        Some(("study", args)) => {
            let index = required::<usize>(args, "section")?;
            if args.get_flag("refresh") {
                print_report(&session.refresh_section(index).await?);
            } else {
                print_outcome(&session.select_section(index).await?);
            }
        }
        Some(("next", _)) => match session.next_section().await? {
            Some(outcome) => print_outcome(&outcome),
            None => println!("Already at the last unit."),
        },
        Some(("answer", args)) => {
            let section = required::<usize>(args, "section")?;
            let question: QuestionId = parse_id(args, "question")?;
            let choice = required::<usize>(args, "choice")?;
            match session.answer_question(section, question, choice).await? {
                AnswerOutcome::Answered(q) => {
                    let insight = q.deep_insight.unwrap_or_default();
                    println!("{}", insight.verdict);
                    if !insight.why_user_choice_is_correct_or_wrong.is_empty() {
                        println!("\n{}", insight.why_user_choice_is_correct_or_wrong);
                    }
                    if !insight.correct_answer_explanation.is_empty() {
                        println!("\n{}", insight.correct_answer_explanation);
                    }
                    if !insight.misconception_detected.is_empty() {
                        println!("\nMisconception: {}", insight.misconception_detected);
                    }
                    if !insight.concepts_to_review.is_empty() {
                        println!("Review: {}", insight.concepts_to_review.join(", "));
                    }
                    if !insight.exam_tip.is_empty() {
                        println!("Exam tip: {}", insight.exam_tip);
                    }
                }
                AnswerOutcome::AlreadyAnswered => println!("Question already answered."),
            }
        }
        Some(("review", args)) => {
            let section = required::<usize>(args, "section")?;
            if args.contains_id("card") {
                let card: CardId = parse_id(args, "card")?;
                let card = session.review_flashcard(section, card, args.get_flag("recalled"))?;
                println!(
                    "{}: {:?} (missed {} times)",
                    card.question, card.mastery_status, card.failure_count
                );
            } else {
                let queue = session.review_queue(section)?;
                if queue.is_empty() {
                    println!("Nothing to review.");
                }
                for q in queue {
                    println!("{}  {}", q.id, q.question);
                    if let Some(answer) = q.options.get(q.correct_index) {
                        println!("    answer: {answer}");
                    }
                }
            }
        }
        Some(("use", args)) => {
            let id: WorkspaceId = parse_id(args, "workspace")?;
            session.select_workspace(id)?;
            println!("Active workspace: {id}");
        }
        Some(("new", _)) => {
            session.new_file();
            println!("Ready for a new upload.");
        }
        Some(("purge", _)) => {
            session.purge();
            println!("All workspaces deleted.");
        }
        _ => {}
    }
    Ok(())
}

fn present(err: TutorError) -> anyhow::Error {
    tracing::debug!("command failed: {:?}", err);
    anyhow::anyhow!(err.user_message())
}

fn required<T: Clone + Send + Sync + 'static>(args: &ArgMatches, id: &str) -> Result<T, TutorError> {
    args.get_one::<T>(id)
        .cloned()
        .ok_or_else(|| TutorError::Config(format!("missing argument: {id}")))
}

fn parse_id<T: std::str::FromStr>(args: &ArgMatches, id: &str) -> Result<T, TutorError> {
    let raw = required::<String>(args, id)?;
    raw.parse()
        .map_err(|_| TutorError::Config(format!("invalid {id} id: {raw}")))
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(err) => tracing::error!("failed to encode output: {}", err),
    }
}

fn print_outcome(outcome: &EnsureOutcome) {
    match outcome {
        EnsureOutcome::Started(report) => print_report(report),
        EnsureOutcome::AlreadyEnriched => println!("Unit already prepared."),
        EnsureOutcome::AlreadyLoading => println!("Unit is being prepared."),
    }
}

fn print_report(report: &EnrichmentReport) {
    let stages: Vec<_> = report.completed_stages.iter().map(|s| s.as_str()).collect();
    println!(
        "Unit {}: {:?} [{}]",
        report.section_index,
        report.phase,
        stages.join(", ")
    );
    if let Some(err) = &report.error {
        tracing::debug!("stage failure detail: {}", err);
        println!("{}", tutor_ai::user_message(&err.source));
    }
}

fn print_workspace(ws: &Workspace) {
    println!("{} ({})", ws.subject, ws.file_info.kind);
    println!(
        "Ingested {}%  Retained {}%  Validated {}%",
        ws.coverage_stats.ingested, ws.coverage_stats.retained, ws.coverage_stats.validated
    );
    for (i, s) in ws.sections.iter().enumerate() {
        let marker = if i == ws.active_section_index { ">" } else { " " };
        let ready = if s.has_content() { "ready" } else { "" };
        println!("{marker} {i:>2}. {:<40} {:<12} {ready}", s.title, s.status.as_str());
    }
}

fn print_section(index: usize, s: &CourseSection) {
    println!("{index}. {}", s.title);
    if !s.source_reference.is_empty() {
        println!("Source: {}", s.source_reference);
    }
    if !s.summary.is_empty() {
        println!("\n{}", s.summary);
    }
    if !s.content.is_empty() {
        println!("\n{}", s.content);
    }
    if !s.key_terms.is_empty() {
        println!("\nKey terms:");
        for t in &s.key_terms {
            println!("  {}: {}", t.term, t.definition);
        }
    }
    if !s.formulas.is_empty() {
        println!("\nFormulas:");
        for f in &s.formulas {
            println!("  {}  ({})", f.expression, f.label);
        }
    }
    if !s.mindmap.is_empty() {
        println!("\n{}", s.mindmap);
    }
    if !s.flashcards.is_empty() {
        println!("\nFlashcards:");
        for c in &s.flashcards {
            println!("  {}  [{:?}] {}", c.id, c.mastery_status, c.question);
        }
    }
    if !s.practice_questions.is_empty() {
        println!("\nPractice questions:");
        for q in &s.practice_questions {
            let state = match q.was_correct {
                Some(true) => "correct",
                Some(false) => "missed",
                None => "open",
            };
            println!("  {}  [{state}] {}", q.id, q.question);
            for (i, option) in q.options.iter().enumerate() {
                println!("      {i}. {option}");
            }
        }
    }
    if !s.resources.is_empty() {
        println!("\nResources:");
        for r in &s.resources {
            println!("  {} <{}>", r.title, r.url);
        }
    }
}
