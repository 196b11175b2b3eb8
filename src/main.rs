mod curriculum;
mod db;
mod error;
mod models;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use db::Database;
use models::{
    CourseTarget, JsonOutput, MistakeDraft, Period, Recommendation, ResourceKind, ReviewOutcome,
    Subject,
};

const DEFAULT_DB_NAME: &str = "studymaster.db";

#[derive(Parser)]
#[command(name = "studymaster")]
#[command(about = "A study-tracking CLI: course completion, mistake logging, and weighted review")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database and seed the curriculum
    Init,

    /// Track course completion
    #[command(subcommand)]
    Course(CourseCommands),

    /// Manage logged mistakes
    #[command(subcommand)]
    Mistake(MistakeCommands),

    /// Pick the next mistake to review (probability-weighted)
    Next,

    /// Record a review outcome for a mistake
    Review {
        /// Mistake ID
        id: i64,

        /// Review outcome: mastered/needs-review
        #[arg(long, short)]
        outcome: String,
    },

    /// Study analytics
    #[command(subcommand)]
    Analytics(AnalyticsCommands),
}

#[derive(Subcommand)]
enum CourseCommands {
    /// List the full curriculum with completion state
    List,

    /// List a subject's chapters in curriculum order
    Chapters {
        /// Subject: physchem/electrical
        subject: String,
    },

    /// Toggle completion of a chapter resource
    Toggle {
        /// Subject: physchem/electrical
        subject: String,

        /// Chapter name
        #[arg(long, short)]
        chapter: Option<String>,

        /// Resource kind: slides/homework
        #[arg(long, short)]
        resource: Option<String>,
    },
}

#[derive(Subcommand)]
enum MistakeCommands {
    /// Log a new mistake
    Add {
        /// Subject: physchem/electrical
        subject: String,

        /// Chapter name
        chapter: String,

        /// Question text
        #[arg(long, short)]
        question: Option<String>,

        /// Error category: concept/calculation/misreading/method or free text
        #[arg(long, short)]
        category: String,

        /// Free-form tags
        #[arg(long, short)]
        tags: Option<String>,

        /// Attach a question image from a file
        #[arg(long, short)]
        image: Option<PathBuf>,
    },

    /// List mistakes, most recently reviewed first
    List,

    /// Show a mistake in full
    Show {
        /// Mistake ID
        id: i64,

        /// Write the attached image to a file
        #[arg(long)]
        image_out: Option<PathBuf>,
    },

    /// Delete a mistake permanently
    Delete {
        /// Mistake ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum AnalyticsCommands {
    /// Mistake counts by error category
    Distribution {
        /// Analysis window: week/month/all
        #[arg(long, short, default_value = "week")]
        period: String,
    },

    /// Completion percentage per subject
    Completion,

    /// Suggested next study actions
    Recommend {
        /// Analysis window: week/month/all
        #[arg(long, short, default_value = "week")]
        period: String,
    },
}

fn get_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("STUDYMASTER_DB") {
        return PathBuf::from(path);
    }

    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("studymaster");

    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join(DEFAULT_DB_NAME)
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn parse_subject(s: &str) -> Result<Subject, String> {
    Subject::from_str(s)
        .ok_or_else(|| format!("Invalid subject '{}'. Use: physchem or electrical", s))
}

fn parse_period(s: &str) -> Result<Period, String> {
    Period::from_str(s).ok_or_else(|| format!("Invalid period '{}'. Use: week, month, or all", s))
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = get_db_path();
    let db = Database::open(&db_path)?;

    // Both are idempotent; running them on every start keeps the schema and
    // the fixed curriculum present without an explicit setup step.
    db.init()?;
    db.seed_curriculum()?;

    match cli.command {
        Commands::Init => {
            let total = db.list_courses()?.len();
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "path": db_path.display().to_string(),
                        "course_items": total
                    })))?
                );
            } else {
                println!("Database initialized at: {}", db_path.display());
                println!("Curriculum seeded: {} course items", total);
            }
        }

        Commands::Course(course_cmd) => match course_cmd {
            CourseCommands::List => {
                let items = db.list_courses()?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&items))?);
                } else {
                    let mut current_subject = None;
                    let mut current_chapter = None;
                    for item in &items {
                        if current_subject != Some(item.subject) {
                            println!("{}", item.subject.label());
                            current_subject = Some(item.subject);
                            current_chapter = None;
                        }
                        if current_chapter.as_deref() != Some(item.chapter.as_str()) {
                            println!("  {}", item.chapter);
                            current_chapter = Some(item.chapter.clone());
                        }
                        let mark = if item.completed { "[x]" } else { "[ ]" };
                        let updated = item.last_updated.as_deref().unwrap_or("-");
                        println!("    {} {:<10} {}", mark, item.resource.label(), updated);
                    }
                }
            }

            CourseCommands::Chapters { subject } => {
                let subject = parse_subject(&subject)?;
                let chapters = db.list_chapters(subject)?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&chapters))?);
                } else {
                    for (i, chapter) in chapters.iter().enumerate() {
                        println!("{:>2}. {}", i + 1, chapter);
                    }
                }
            }

            CourseCommands::Toggle {
                subject,
                chapter,
                resource,
            } => {
                let subject = parse_subject(&subject)?;
                let resource = match resource {
                    Some(r) => Some(ResourceKind::from_str(&r).ok_or_else(|| {
                        format!("Invalid resource '{}'. Use: slides or homework", r)
                    })?),
                    None => None,
                };
                let target = CourseTarget {
                    subject,
                    chapter,
                    resource,
                };

                let item = db.toggle_completion(&target)?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&item))?);
                } else {
                    let state = if item.completed { "completed" } else { "not started" };
                    println!(
                        "{} / {} / {} is now {}.",
                        item.subject.label(),
                        item.chapter,
                        item.resource.label(),
                        state
                    );
                }
            }
        },

        Commands::Mistake(mistake_cmd) => match mistake_cmd {
            MistakeCommands::Add {
                subject,
                chapter,
                question,
                category,
                tags,
                image,
            } => {
                let subject = parse_subject(&subject)?;
                let image = match image {
                    Some(path) => Some(std::fs::read(&path)?),
                    None => None,
                };
                let draft = MistakeDraft {
                    chapter,
                    question: question.unwrap_or_default(),
                    category,
                    tags: tags.unwrap_or_default(),
                    image,
                };

                let id = db.submit_mistake(subject, &draft)?;
                if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::ok(serde_json::json!({ "id": id })))?
                    );
                } else {
                    println!("Mistake recorded with ID: {}", id);
                }
            }

            MistakeCommands::List => {
                let mistakes = db.list_mistakes()?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&mistakes))?);
                } else if mistakes.is_empty() {
                    println!("No mistakes logged.");
                } else {
                    println!(
                        "{:<5} {:<22} {:<30} {:<14} {:<13} REVIEWED",
                        "ID", "SUBJECT", "CHAPTER", "CATEGORY", "MASTERY"
                    );
                    println!("{}", "-".repeat(100));
                    for m in mistakes {
                        let reviewed = m.last_reviewed.as_deref().unwrap_or("-");
                        println!(
                            "{:<5} {:<22} {:<30} {:<14} {:<13} {}",
                            m.id,
                            m.subject.label(),
                            truncate(&m.chapter, 28),
                            truncate(&m.error_category, 12),
                            m.mastery_level.label(),
                            reviewed
                        );
                    }
                }
            }

            MistakeCommands::Show { id, image_out } => {
                let record = db.get_mistake(id)?;

                if let Some(path) = &image_out {
                    match &record.image {
                        Some(bytes) => std::fs::write(path, bytes)?,
                        None => return Err(format!("Mistake {} has no image attached", id).into()),
                    }
                }

                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&record))?);
                } else {
                    println!("Mistake {}", record.id);
                    println!("Subject: {}", record.subject.label());
                    println!("Chapter: {}", record.chapter);
                    println!("Category: {}", record.error_category);
                    if !record.tags.is_empty() {
                        println!("Tags: {}", record.tags);
                    }
                    println!("Mastery: {}", record.mastery_level.label());
                    println!("Recall weight: {:.2}", record.probability);
                    println!("Created: {}", record.created_at);
                    if let Some(reviewed) = &record.last_reviewed {
                        println!("Last reviewed: {}", reviewed);
                    }
                    println!(
                        "Image: {}",
                        if record.has_image() { "attached" } else { "none" }
                    );
                    if !record.question.is_empty() {
                        println!();
                        println!("{}", record.question);
                    }
                    if let Some(path) = &image_out {
                        println!();
                        println!("Image written to: {}", path.display());
                    }
                }
            }

            MistakeCommands::Delete { id } => {
                db.delete_mistake(id)?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
                } else {
                    println!("Mistake {} deleted.", id);
                }
            }
        },

        Commands::Next => {
            if let Some(record) = db.select_for_review()? {
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&record))?);
                } else {
                    println!("=== Next Mistake to Review ===");
                    println!();
                    println!("ID: {}", record.id);
                    println!("Subject: {} / {}", record.subject.label(), record.chapter);
                    println!("Category: {}", record.error_category);
                    println!(
                        "Mastery: {} (recall weight {:.2})",
                        record.mastery_level.label(),
                        record.probability
                    );
                    if record.has_image() {
                        println!("Image: attached (use 'mistake show {} --image-out <path>')", record.id);
                    }
                    if !record.question.is_empty() {
                        println!();
                        println!("{}", record.question);
                    }
                    println!();
                    println!("After reviewing, record the outcome with:");
                    println!(
                        "  studymaster review {} --outcome <mastered|needs-review>",
                        record.id
                    );
                }
            } else if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("No mistakes to review. Log some mistakes first!");
            }
        }

        Commands::Review { id, outcome } => {
            let outcome = ReviewOutcome::from_str(&outcome).ok_or_else(|| {
                format!(
                    "Invalid outcome '{}'. Use: mastered or needs-review",
                    outcome
                )
            })?;

            let record = db.record_review_outcome(id, outcome)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&record))?);
            } else {
                println!("Recorded '{}' for mistake {}.", outcome.as_str(), id);
                println!(
                    "Mastery: {}, recall weight: {:.2}",
                    record.mastery_level.label(),
                    record.probability
                );
            }
        }

        Commands::Analytics(analytics_cmd) => match analytics_cmd {
            AnalyticsCommands::Distribution { period } => {
                let period = parse_period(&period)?;
                let counts = db.error_type_distribution(period)?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&counts))?);
                } else if counts.is_empty() {
                    println!("No data for this period.");
                } else {
                    println!("=== Error Distribution ({}) ===", period.as_str());
                    println!("{:<20} COUNT", "CATEGORY");
                    println!("{}", "-".repeat(30));
                    for c in counts {
                        println!("{:<20} {}", c.category, c.count);
                    }
                }
            }

            AnalyticsCommands::Completion => {
                let stats = db.completion_by_course()?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&stats))?);
                } else {
                    for s in stats {
                        println!(
                            "{:<25} {:>5.1}%  ({}/{} items)",
                            s.subject.label(),
                            s.percent,
                            s.completed,
                            s.total
                        );
                    }
                }
            }

            AnalyticsCommands::Recommend { period } => {
                let period = parse_period(&period)?;
                let recs = db.recommendations(period)?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&recs))?);
                } else if recs.is_empty() {
                    println!("Nothing to recommend. All caught up!");
                } else {
                    for rec in recs {
                        match rec {
                            Recommendation::Course {
                                subject,
                                chapter,
                                resource,
                            } => {
                                println!(
                                    "{:<12} {} - {} ({})",
                                    "INCOMPLETE",
                                    subject.label(),
                                    chapter,
                                    resource.label()
                                );
                            }
                            Recommendation::MistakeHotspot {
                                subject,
                                chapter,
                                count,
                            } => {
                                println!(
                                    "{:<12} {} - {} ({} mistakes)",
                                    "HOTSPOT",
                                    subject.label(),
                                    chapter,
                                    count
                                );
                            }
                        }
                    }
                }
            }
        },
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}
