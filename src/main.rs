use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use flowgrid_config::{EditorSettings, WorkflowDef};
use flowgrid_editor::{EditAction, EditOutcome, EditSession, MenuEntry};
use flowgrid_layout::GridView;
use flowgrid_model::{ActionCode, NodeId, Position, TransitionId, Workflow, WorkflowId};
use flowgrid_store::{SqliteStore, import_workflow};

/// Flowgrid - edit workflow graphs laid out on a grid
#[derive(Parser)]
#[command(name = "flowgrid")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.flowgrid)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Log debug output (overridden by RUST_LOG)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Import a workflow definition (JSON)
  Import { workflow_file: PathBuf },

  /// List the workflows the configured client can open
  List,

  /// Open a workflow and print its grid
  Show {
    workflow: i64,

    /// Print the grid as JSON
    #[arg(long)]
    json: bool,
  },

  /// Lay a workflow out and save the new positions
  Layout { workflow: i64 },

  /// Set the number of grid columns of a workflow (values below 1 reset it)
  Columns { workflow: i64, columns: i64 },

  /// Edit nodes
  Node {
    #[command(subcommand)]
    command: NodeCommand,
  },

  /// Edit transitions
  Line {
    #[command(subcommand)]
    command: LineCommand,
  },

  /// Print the context menu of a node
  Menu { workflow: i64, node: i64 },
}

#[derive(Subcommand)]
enum NodeCommand {
  /// Create a node at the unplaced position
  Add { workflow: i64, name: String },

  /// Copy a node next to itself
  Clone { workflow: i64, node: i64 },

  /// Move a node to another cell
  Move {
    workflow: i64,
    node: i64,
    column: u32,
    row: u32,
  },

  /// Rename a node or change its description
  Edit {
    workflow: i64,
    node: i64,
    #[arg(long)]
    name: String,
    #[arg(long)]
    description: Option<String>,
  },

  /// Delete a node and its transitions
  Delete { workflow: i64, node: i64 },

  /// Drop an action on a cell: inserts after the node there, or creates a
  /// node in the empty cell
  Drop {
    workflow: i64,
    /// Action code (e.g. `W`) or name (e.g. `user_window`)
    #[arg(value_parser = parse_action)]
    action: ActionCode,
    column: u32,
    row: u32,
  },
}

#[derive(Subcommand)]
enum LineCommand {
  /// Add a transition between two nodes
  Add { workflow: i64, from: i64, to: i64 },

  /// Delete a transition
  Delete { workflow: i64, transition: i64 },

  /// Insert a new node in the middle of a transition
  Split {
    workflow: i64,
    transition: i64,
    name: String,
  },
}

fn parse_action(value: &str) -> Result<ActionCode, String> {
  ActionCode::from_code(value)
    .or_else(|| serde_json::from_value(serde_json::Value::String(value.to_string())).ok())
    .ok_or_else(|| {
      let known: Vec<_> = ActionCode::ALL
        .iter()
        .map(|a| format!("{} ({})", a.code(), a.label()))
        .collect();
      format!("unknown action '{value}', expected one of: {}", known.join(", "))
    })
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::registry()
    .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
    .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
    .init();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".flowgrid"),
  };

  let Some(command) = cli.command else {
    println!("flowgrid - use --help to see available commands");
    return Ok(());
  };

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run(command, data_dir).await })
}

async fn run(command: Commands, data_dir: PathBuf) -> Result<()> {
  tokio::fs::create_dir_all(&data_dir)
    .await
    .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

  let settings = load_settings(&data_dir).await?;
  let store = Arc::new(
    SqliteStore::open(data_dir.join("flowgrid.db"))
      .await
      .context("failed to open workflow store")?,
  );

  match command {
    Commands::Import { workflow_file } => {
      let content = tokio::fs::read_to_string(&workflow_file)
        .await
        .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;
      let def = WorkflowDef::from_json_str(&content)
        .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))?;

      let workflow_id = import_workflow(store.as_ref(), &def, &settings.tenant())
        .await
        .context("failed to import workflow")?;
      eprintln!("Imported workflow: {}", def.name);
      println!("{workflow_id}");
    }

    Commands::List => {
      let session = EditSession::new(store, settings);
      for summary in session.list_workflows().await? {
        let columns = summary
          .grid_columns
          .map(|c| c.to_string())
          .unwrap_or_else(|| "-".to_string());
        println!(
          "{}\t{}\tcolumns={}\tclient={}\tcreated={}",
          summary.workflow_id,
          summary.name,
          columns,
          summary.owner.client_id,
          summary.created_at.format("%Y-%m-%d %H:%M")
        );
      }
    }

    Commands::Show { workflow, json } => {
      // Opening a workflow is the one command that honors first-load layout.
      let mut session = EditSession::new(store, settings);
      let workflow = session.select_workflow(WorkflowId(workflow)).await?;
      let grid = GridView::build(workflow);
      if json {
        println!("{}", serde_json::to_string_pretty(&grid)?);
      } else {
        print_grid(workflow, &grid);
      }
    }

    Commands::Layout { workflow } => {
      let mut session = open(store, settings, workflow).await?;
      let outcome = session.auto_layout().await?;
      report(&outcome)?;
    }

    Commands::Columns { workflow, columns } => {
      let mut session = open(store, settings, workflow).await?;
      let workflow = session.set_grid_columns(columns).await?;
      eprintln!("Grid columns: {}", workflow.grid_columns());
    }

    Commands::Node { command } => {
      let (workflow, action) = match command {
        NodeCommand::Add { workflow, name } => (workflow, EditAction::CreateNode { name }),
        NodeCommand::Clone { workflow, node } => (
          workflow,
          EditAction::CloneNode {
            node_id: NodeId(node),
          },
        ),
        NodeCommand::Move {
          workflow,
          node,
          column,
          row,
        } => (
          workflow,
          EditAction::MoveNode {
            node_id: NodeId(node),
            position: Position::new(column, row),
          },
        ),
        NodeCommand::Edit {
          workflow,
          node,
          name,
          description,
        } => (
          workflow,
          EditAction::EditNode {
            node_id: NodeId(node),
            name,
            description,
          },
        ),
        NodeCommand::Delete { workflow, node } => (
          workflow,
          EditAction::DeleteNode {
            node_id: NodeId(node),
          },
        ),
        NodeCommand::Drop {
          workflow,
          action,
          column,
          row,
        } => (
          workflow,
          EditAction::DropAction {
            action,
            position: Position::new(column, row),
          },
        ),
      };
      dispatch(store, settings, workflow, action).await?;
    }

    Commands::Line { command } => {
      let (workflow, action) = match command {
        LineCommand::Add { workflow, from, to } => (
          workflow,
          EditAction::AddTransition {
            from: NodeId(from),
            to: NodeId(to),
          },
        ),
        LineCommand::Delete {
          workflow,
          transition,
        } => (
          workflow,
          EditAction::DeleteTransition {
            transition_id: TransitionId(transition),
          },
        ),
        LineCommand::Split {
          workflow,
          transition,
          name,
        } => (
          workflow,
          EditAction::SplitTransition {
            transition_id: TransitionId(transition),
            name,
          },
        ),
      };
      dispatch(store, settings, workflow, action).await?;
    }

    Commands::Menu { workflow, node } => {
      let session = open(store, settings, workflow).await?;
      let Some(menu) = session.menu(NodeId(node)) else {
        bail!("node {node} is not part of workflow {workflow}");
      };
      for item in &menu.items {
        match &item.entry {
          MenuEntry::Properties { .. } | MenuEntry::InsertOnLine { .. } => {
            println!("  {}", item.label)
          }
          entry => println!("* {}", item_line(&item.label, entry)),
        }
      }
    }
  }

  Ok(())
}

fn item_line(label: &str, entry: &MenuEntry) -> String {
  match entry.action() {
    Some(action) => match serde_json::to_string(&action) {
      Ok(json) => format!("{label}\t{json}"),
      Err(_) => label.to_string(),
    },
    None => label.to_string(),
  }
}

async fn load_settings(data_dir: &Path) -> Result<EditorSettings> {
  let path = data_dir.join("settings.json");
  match tokio::fs::read_to_string(&path).await {
    Ok(content) => EditorSettings::from_json_str(&content)
      .with_context(|| format!("failed to parse settings: {}", path.display())),
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      debug!(path = %path.display(), "no settings file, using defaults");
      Ok(EditorSettings::default())
    }
    Err(e) => {
      Err(e).with_context(|| format!("failed to read settings: {}", path.display()))
    }
  }
}

/// Open a workflow for an edit without laying it out first.
async fn open(
  store: Arc<SqliteStore>,
  settings: EditorSettings,
  workflow: i64,
) -> Result<EditSession<SqliteStore>> {
  let settings = EditorSettings {
    layout_on_first_load: false,
    ..settings
  };
  let mut session = EditSession::new(store, settings);
  session
    .select_workflow(WorkflowId(workflow))
    .await
    .with_context(|| format!("failed to open workflow {workflow}"))?;
  Ok(session)
}

async fn dispatch(
  store: Arc<SqliteStore>,
  settings: EditorSettings,
  workflow: i64,
  action: EditAction,
) -> Result<()> {
  let mut session = open(store, settings, workflow).await?;
  let outcome = session
    .dispatch(&action)
    .await
    .with_context(|| format!("{} failed", action.name()))?;
  report(&outcome)
}

fn report(outcome: &EditOutcome) -> Result<()> {
  match outcome {
    EditOutcome::Applied(report) => {
      eprintln!("Applied {} change(s)", report.completed);
      if let Some(node) = &report.created_node {
        println!("{}", node.node_id);
      }
      Ok(())
    }
    EditOutcome::Skipped { reason } => {
      eprintln!("Nothing changed: {reason}");
      Ok(())
    }
    EditOutcome::Refused { reason, .. } => bail!("refused: {reason}"),
  }
}

fn print_grid(workflow: &Workflow, grid: &GridView) {
  const WIDTH: usize = 16;

  println!(
    "{} (id {}, {} columns)",
    workflow.name,
    workflow.workflow_id,
    grid.columns
  );
  if workflow.is_empty() {
    println!("(no nodes, drop an action to start)");
  }
  for row in 1..=grid.rows {
    let line: Vec<String> = grid
      .row(row)
      .iter()
      .map(|cell| {
        let text = match cell.node.and_then(|id| workflow.node(id)) {
          Some(node) => format!("{}:{}", node.node_id, node.name),
          None => ".".to_string(),
        };
        let text: String = text.chars().take(WIDTH).collect();
        format!("{text:<width$}", width = WIDTH)
      })
      .collect();
    println!("{}", line.join(" ").trim_end());
  }

  if !grid.hidden.is_empty() {
    println!();
    println!("Outside the grid:");
    for node in grid.hidden.iter().filter_map(|id| workflow.node(*id)) {
      println!("  {}:{} at {}", node.node_id, node.name, node.position);
    }
  }

  println!();
  println!("Transitions:");
  for transition in workflow.transitions() {
    let marker = if Some(transition.from) == workflow.start_node() {
      "*"
    } else {
      " "
    };
    println!(
      " {marker}{}\t{} -> {}",
      transition.transition_id, transition.from, transition.to
    );
  }
}
