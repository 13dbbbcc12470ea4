//! studypath CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "studypath", version, about = "E-learning pathway client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a lecture's learning pathway with node statuses
    Pathway {
        /// Lecture identifier
        #[arg(long)]
        lecture: i64,

        /// User identifier (overrides the configured one)
        #[arg(long)]
        user: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate pathway definition TOML files
    Validate {
        /// Path to a pathway file or directory
        #[arg(long)]
        pathway: PathBuf,
    },

    /// Generate study content for a lecture
    Generate {
        /// What to generate: quiz, flashcards
        #[arg(long)]
        kind: String,

        /// Lecture identifier
        #[arg(long)]
        lecture: i64,

        /// Number of questions or cards
        #[arg(long, default_value = "10")]
        count: u32,

        /// Quiz time limit in minutes
        #[arg(long, default_value = "15")]
        time_limit: u32,

        /// Enable hints for the generated quiz
        #[arg(long)]
        hints: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Upload a lecture document and wait for its segments
    Upload {
        /// Course identifier
        #[arg(long)]
        course: i64,

        /// Lecture title
        #[arg(long)]
        title: String,

        /// Path to the document to upload
        #[arg(long)]
        file: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Delete a lecture and all its content
    DeleteLecture {
        /// Lecture identifier
        #[arg(long)]
        id: i64,

        /// Skip the confirmation requirement
        #[arg(long)]
        yes: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Delete a course, its lectures, and all their content
    DeleteCourse {
        /// Course identifier
        #[arg(long)]
        id: i64,

        /// Skip the confirmation requirement
        #[arg(long)]
        yes: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and an example pathway
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("studypath=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Pathway {
            lecture,
            user,
            config,
        } => commands::pathway::execute(lecture, user, config).await,
        Commands::Validate { pathway } => commands::validate::execute(pathway),
        Commands::Generate {
            kind,
            lecture,
            count,
            time_limit,
            hints,
            config,
        } => commands::generate::execute(kind, lecture, count, time_limit, hints, config).await,
        Commands::Upload {
            course,
            title,
            file,
            config,
        } => commands::upload::execute(course, title, file, config).await,
        Commands::DeleteLecture { id, yes, config } => {
            commands::delete::execute_lecture(id, yes, config).await
        }
        Commands::DeleteCourse { id, yes, config } => {
            commands::delete::execute_course(id, yes, config).await
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
