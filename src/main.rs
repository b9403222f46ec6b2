//! Todo Sync CLI Entry Point

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use todo_sync::domain::{SortDirection, SortField};
use todo_sync::pagination::{total_pages, ViewControls, DEFAULT_PAGE_SIZE};
use todo_sync::repository::{AirtableRepository, RemoteConfig};
use todo_sync::{CompletionPolicy, ControllerOptions, Todo, TodoController, TodoEdit, TodoId, ViewOptions};

#[derive(Parser)]
#[command(name = "todo-sync", about = "Todo list backed by an Airtable table")]
struct Cli {
    /// JSON config file; AIRTABLE_* environment variables are used otherwise
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the rolling log files
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show one page of todos
    List {
        /// Only titles containing this text
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, value_enum, default_value_t = SortArg::CreatedTime)]
        sort: SortArg,
        #[arg(long, value_enum, default_value_t = DirectionArg::Desc)]
        direction: DirectionArg,
        #[arg(long)]
        page: Option<String>,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,
        /// Include completed todos
        #[arg(long)]
        all: bool,
    },
    /// Create a todo
    Add { title: String },
    /// Rename a todo
    Edit { id: String, title: String },
    /// Mark a todo done
    Complete {
        id: String,
        /// Flip the completion state instead
        #[arg(long)]
        toggle: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Title,
    #[value(name = "createdTime")]
    CreatedTime,
}

impl From<SortArg> for SortField {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Title => SortField::Title,
            SortArg::CreatedTime => SortField::CreatedTime,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
    Asc,
    Desc,
}

impl From<DirectionArg> for SortDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Asc => SortDirection::Asc,
            DirectionArg::Desc => SortDirection::Desc,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        let _ = rolling_logger::error(&e);
        eprintln!("Error: {}", e);

        let recent = rolling_logger::recent_lines();
        let tail = &recent[recent.len().saturating_sub(5)..];
        if !tail.is_empty() {
            eprintln!("Recent log:");
            for line in tail {
                eprintln!("  {}", line);
            }
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let log_dir = cli
        .log_dir
        .unwrap_or_else(|| std::env::temp_dir().join("todo-sync"));
    if let Err(e) = rolling_logger::init_logger(log_dir, "todo-sync") {
        eprintln!("Logging disabled: {}", e);
    }

    let config = match &cli.config {
        Some(path) => RemoteConfig::load_from_file(path),
        None => RemoteConfig::from_env(),
    }
    .map_err(|e| e.to_string())?;
    log::info!("Using table {} in base {}", config.table_name, config.base_id);

    let completion = match &cli.command {
        Command::Complete { toggle: true, .. } => CompletionPolicy::Toggle,
        _ => CompletionPolicy::MarkDone,
    };
    let repo = AirtableRepository::new(config).map_err(|e| e.to_string())?;
    let controller = TodoController::with_options(Arc::new(repo), ControllerOptions { completion });

    match cli.command {
        Command::List {
            search,
            sort,
            direction,
            page,
            page_size,
            all,
        } => {
            let mut controls = ViewControls::new(page_size);
            controls.set_sort_field(sort.into());
            controls.set_sort_direction(direction.into());
            controls.set_query(search);

            controller.load(controls.view()).await.map_err(|e| e.to_string())?;
            let state = controller.snapshot().await;
            let visible: Vec<&Todo> = if all {
                state.todo_list.iter().collect()
            } else {
                state.pending_todos()
            };

            let requested = ViewControls::page_from_param(page.as_deref());
            controls.go_to(requested, total_pages(visible.len(), controls.page_size()));
            let page = controls.page(&visible);

            if page.items.is_empty() {
                println!("No todos yet. Add one with `todo-sync add <title>`.");
            }
            for todo in page.items {
                print_todo(todo);
            }
            println!("Page {} of {}", page.current_page, page.total_pages);
        }
        Command::Add { title } => {
            let todo = controller.add(&title).await.map_err(|e| e.to_string())?;
            print_todo(&todo);
        }
        Command::Edit { id, title } => {
            controller.load(&ViewOptions::default()).await.map_err(|e| e.to_string())?;
            controller
                .update(TodoEdit::new(id.as_str()).with_title(title))
                .await
                .map_err(|e| e.to_string())?;
            println!("Updated {}", id);
        }
        Command::Complete { id, .. } => {
            let id = TodoId::new(id);
            controller.load(&ViewOptions::default()).await.map_err(|e| e.to_string())?;
            controller.complete(&id).await.map_err(|e| e.to_string())?;
            if let Some(todo) = controller.snapshot().await.find(&id) {
                print_todo(todo);
            }
        }
    }

    Ok(())
}

fn print_todo(todo: &Todo) {
    let mark = if todo.is_completed { "x" } else { " " };
    println!("[{}] {}  {}", mark, todo.id, todo.title);
}
