use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::path::PathBuf;
use todostore::{FilterMode, Session, TodoId, TodoItem};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "todostore")]
#[command(about = "TodoStore CLI - Ordered todo list with filters, search and reordering")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the store directory (default: current directory)
    #[arg(short, long, default_value = ".")]
    store_path: PathBuf,

    /// Use the per-user data directory instead of --store-path
    #[arg(short, long)]
    global: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a todo to the end of the list
    Add { text: String },

    /// List todos
    List {
        /// all, completed, incomplete (or checked/unchecked)
        #[arg(short, long, default_value = "all")]
        filter: FilterMode,

        /// Only show todos containing this text (case-sensitive)
        #[arg(long, conflicts_with = "filter")]
        search: Option<String>,
    },

    /// Toggle a todo between done and not done
    Check { id: TodoId },

    /// Delete a todo
    Delete { id: TodoId },

    /// Replace the text of a todo
    Edit { id: TodoId, text: String },

    /// Move the todo at list position FROM to position TO
    Move {
        from: usize,
        to: usize,

        /// Positions refer to the list shown with this filter
        #[arg(short, long, default_value = "all")]
        filter: FilterMode,
    },

    /// Delete all completed todos
    ClearCompleted,
}

fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let root = if cli.global {
        dirs::data_dir()
            .map(|d| d.join("todostore"))
            .ok_or_else(|| eyre!("Could not determine the user data directory"))?
    } else {
        cli.store_path
    };

    let mut session = Session::open(&root)?;

    match cli.command {
        Commands::Add { text } => match session.add(&text) {
            Some(id) => println!("Added {}", id),
            None => println!("{}", "Nothing to add: text is blank".yellow()),
        },
        Commands::List { filter, search } => {
            match search {
                Some(term) => session.search(&term),
                None => session.set_filter(filter),
            }
            print_view(&session);
        }
        Commands::Check { id } => {
            if session.check(id) {
                let done = session.store().get(id).is_some_and(|t| t.completed);
                println!("{} {}", id, if done { "done" } else { "not done" });
            } else {
                println!("{}", format!("No todo with id {}", id).yellow());
            }
        }
        Commands::Delete { id } => {
            if session.delete(id) {
                println!("Deleted {}", id);
            } else {
                println!("{}", format!("No todo with id {}", id).yellow());
            }
        }
        Commands::Edit { id, text } => {
            if session.store().get(id).is_none() {
                println!("{}", format!("No todo with id {}", id).yellow());
            } else if session.begin_edit(id).is_some() && session.commit_edit(&text) {
                println!("Edited {}", id);
            } else {
                println!("{}", "Nothing changed".yellow());
            }
        }
        Commands::Move { from, to, filter } => {
            session.set_filter(filter);
            if !session.drag_start(from) {
                return Err(eyre!("No todo at position {}", from));
            }
            let moved = session.drag_over(to);
            session.end_drag();
            if moved {
                print_view(&session);
            } else {
                println!("{}", "Nothing moved".yellow());
            }
        }
        Commands::ClearCompleted => {
            let removed = session.clear_completed();
            println!("Removed {} completed todo(s)", removed);
        }
    }

    Ok(())
}

fn print_view(session: &Session) {
    let view = session.view();
    if view.is_empty() {
        println!("{}", "No results".dimmed());
        return;
    }

    for (index, item) in view.iter().enumerate() {
        println!("{}", format_item(index, item));
    }
}

fn format_item(index: usize, item: &TodoItem) -> String {
    let marker = if item.completed {
        "[x]".green().to_string()
    } else {
        "[ ]".normal().to_string()
    };
    let text = if item.completed {
        item.text.strikethrough().dimmed().to_string()
    } else {
        item.text.clone()
    };
    let created = item
        .created_at()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();

    format!(
        "{:>3} {} {}  {}",
        index,
        marker,
        text,
        format!("({} {})", item.id, created).dimmed()
    )
}
