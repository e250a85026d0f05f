use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use storyloom::export;
use storyloom::fixture;
use storyloom::outline::Outline;
use storyloom::story_elements::StoryElementKind;
use storyloom::tree::NodeId;
use storyloom::workspace::Workspace;

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an outline fixture: arc soft errors plus the nesting report
    Validate {
        /// Outline fixture file (YAML)
        file: PathBuf,
    },
    /// Print the impact rating of every story node
    Impact {
        /// Outline fixture file (YAML)
        file: PathBuf,
    },
    /// Dump the story tree (and optionally the arc trees) as JSON
    Dump {
        /// Outline fixture file (YAML)
        file: PathBuf,
        /// Include the arc element trees
        #[clap(long)]
        arcs: bool,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    match args.command {
        Commands::Validate { file } => {
            let (workspace, outline_id) = fixture::load_outline(&file)?;
            validate(&workspace, outline_id)?;
        }
        Commands::Impact { file } => {
            let (workspace, outline_id) = fixture::load_outline(&file)?;
            let outline = workspace.outline(outline_id)?;
            print_impact(outline);
        }
        Commands::Dump { file, arcs } => {
            let (workspace, outline_id) = fixture::load_outline(&file)?;
            let outline = workspace.outline(outline_id)?;
            let story = export::dump_story(outline);
            if arcs {
                let arc_dumps: Vec<_> = outline.arcs().map(export::dump_arc).collect();
                let combined = serde_json::json!({ "story": story, "arcs": arc_dumps });
                println!("{}", serde_json::to_string_pretty(&combined)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&story)?);
            }
        }
    }
    Ok(())
}

fn validate(workspace: &Workspace, outline_id: storyloom::OutlineId) -> Result<()> {
    let outline = workspace.outline(outline_id)?;
    let mut clean = true;

    for arc in outline.arcs() {
        let findings = arc.fetch_errors();
        if findings.is_empty() {
            println!("{} arc '{}'", "ok".green(), arc.name);
            continue;
        }
        clean = false;
        println!("{} arc '{}'", "warn".yellow(), arc.name);
        for finding in findings {
            println!("    [{}] {}", finding.kind.label().yellow(), finding.message);
        }
    }

    let nesting = outline.validate_nesting();
    if nesting.is_empty() {
        println!("{} arc nesting", "ok".green());
    } else {
        clean = false;
        for (kind, finding) in &nesting {
            println!("{} [{}] {}", "warn".yellow(), kind.label().yellow(), finding.message);
            let names: Vec<String> = finding
                .arcs
                .iter()
                .filter_map(|arc_id| outline.arc(*arc_id))
                .map(|arc| arc.name.clone())
                .collect();
            if !names.is_empty() {
                println!("    arcs: {}", names.join(", "));
            }
        }
    }

    if clean {
        println!("{}", "outline is structurally sound".green());
    }
    Ok(())
}

fn print_impact(outline: &Outline) {
    let root = outline.story.root();
    for node in outline.story.descendants(root) {
        let depth = outline.story.depth(node.id);
        let rating = outline.impact_rating(node.id);
        let label = describe_story_node(outline, node.id);
        let indent = "  ".repeat(depth.saturating_sub(2));
        println!("{indent}{label}  {}", format!("{rating:.4}").cyan());
    }
}

fn describe_story_node(outline: &Outline, node: NodeId) -> String {
    match outline.story.get(node) {
        Some(record) => {
            let kind = record.payload.kind;
            match &record.payload.name {
                Some(name) => format!("{} '{}'", kind.label(), name),
                None if kind == StoryElementKind::Root => kind.label().to_string(),
                None => format!("{} {}", kind.label(), record.path),
            }
        }
        None => node.to_string(),
    }
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level.as_deref().unwrap_or("info") {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level.to_string()))
        .without_time()
        .init();
}
