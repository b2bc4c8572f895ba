//! memgit - versioned memory for autonomous agents
//!
//! The `memgit` command drives a memory root from the shell.
//!
//! ## Commands
//!
//! - `init`: Create the roadmap and main branch
//! - `commit`: Checkpoint progress and clear the trace log
//! - `branch`: Create or list branches
//! - `switch` / `merge`: Move between and combine branches
//! - `context`: Read roadmap, branch, commits, commit, log or metadata views
//! - `remember` / `recall` / `update` / `forget` / `list`: Flat record index
//! - `tool`: Run a tool call with JSON arguments, as a host runtime would

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, Level};

use memgit_core::{
    catalog, dispatch, CommitRequest, ContextLevel, ContextRequest, LegacyRecord, LogEntry,
    MemgitConfig, RecordType, Session, UpdateRequest,
};

#[derive(Parser)]
#[command(name = "memgit")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Versioned branch/commit memory for AI agents", long_about = None)]
struct Cli {
    /// Memory root (overrides config and MEMGIT_ROOT)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Config file (default: ./memgit.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the memory root
    Init {
        /// Project goal recorded in the roadmap
        #[arg(short, long)]
        goal: Option<String>,
    },

    /// Commit progress on the active branch
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,

        /// What this commit contributed
        #[arg(short, long, default_value = "")]
        contribution: String,

        /// Also record a roadmap milestone
        #[arg(long)]
        roadmap: bool,
    },

    /// Manage branches
    Branch {
        #[command(subcommand)]
        action: BranchAction,
    },

    /// Switch the active branch
    Switch {
        /// Branch name
        name: String,
    },

    /// Merge a branch into the active branch
    Merge {
        /// Source branch to merge from
        source: String,

        /// Merge summary
        #[arg(short, long, default_value = "")]
        summary: String,
    },

    /// Show a context view
    Context {
        /// roadmap | branch | commits | commit | log | metadata
        #[arg(default_value = "branch")]
        level: String,

        /// Branch to inspect (default: active branch)
        #[arg(short, long)]
        branch: Option<String>,

        /// Lines to show at the log level
        #[arg(short = 'n', long)]
        lines: Option<usize>,

        /// Lines to skip from the end at the log level
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Commit id or unique prefix at the commit level
        #[arg(long)]
        hash: Option<String>,
    },

    /// Append an entry to the active branch's trace log
    Log {
        #[arg(long)]
        observation: Option<String>,

        #[arg(long)]
        thought: Option<String>,

        #[arg(long)]
        action: Option<String>,

        /// Freeform text (takes precedence over the structured parts)
        text: Option<String>,
    },

    /// Store a typed memory record
    Remember {
        /// decision | learning | preference | blocker | context | pattern
        #[arg(short = 't', long = "type")]
        record_type: String,

        #[arg(short, long)]
        scope: String,

        content: String,

        #[arg(long)]
        issue: Option<String>,

        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// Search memory records
    Recall {
        /// Search terms
        query: Option<String>,

        #[arg(short, long)]
        scope: Option<String>,

        #[arg(short = 't', long = "type")]
        record_type: Option<String>,

        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Replace the content of one memory record
    Update {
        #[arg(short = 't', long = "type")]
        record_type: String,

        #[arg(short, long)]
        scope: String,

        content: String,

        /// Picks among several matches
        #[arg(short, long)]
        query: Option<String>,

        #[arg(long)]
        issue: Option<String>,

        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },

    /// Delete memory records by scope and type
    Forget {
        #[arg(short = 't', long = "type")]
        record_type: String,

        #[arg(short, long)]
        scope: String,

        #[arg(short, long)]
        reason: String,
    },

    /// Summarize stored memory records
    List,

    /// Run a tool call by name
    Tool {
        name: String,

        /// JSON object of named arguments
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// List available tools
    Tools,
}

#[derive(Subcommand)]
enum BranchAction {
    /// List all branches
    List,

    /// Create a branch and switch to it
    Create {
        /// Branch name
        name: String,

        /// What the branch explores
        #[arg(short, long, default_value = "")]
        purpose: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    memgit_core::telemetry::init_tracing(cli.json, level);

    let mut config = MemgitConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(root) = cli.root {
        config = config.with_root(root);
    }
    debug!(root = %config.root.display(), "opening memory");

    if matches!(cli.command, Commands::Tools) {
        return cmd_tools();
    }

    let mut session = Session::open(config).context("Failed to open memory root")?;

    match cli.command {
        Commands::Init { goal } => print(session.init(goal.as_deref())?),
        Commands::Commit {
            message,
            contribution,
            roadmap,
        } => {
            let req = CommitRequest {
                message,
                contribution,
                update_roadmap: roadmap,
            };
            print(session.commit(&req)?)
        }
        Commands::Branch { action } => match action {
            BranchAction::List => cmd_branch_list(&session),
            BranchAction::Create { name, purpose } => {
                print(session.create_branch(&name, &purpose)?)
            }
        },
        Commands::Switch { name } => {
            session
                .switch_branch(&name)
                .with_context(|| format!("Failed to switch to '{name}'"))?;
            print(format!("Switched to branch '{name}'."))
        }
        Commands::Merge { source, summary } => print(session.merge(&source, &summary)?),
        Commands::Context {
            level,
            branch,
            lines,
            offset,
            hash,
        } => {
            let req = ContextRequest {
                level: level.parse::<ContextLevel>()?,
                branch,
                line_count: lines,
                offset,
                hash,
            };
            print(session.context(&req)?)
        }
        Commands::Log {
            observation,
            thought,
            action,
            text,
        } => {
            let entry = LogEntry::from_parts(observation, thought, action, text)?;
            let lines = session.log(&entry)?;
            print(format!(
                "Logged {lines} line(s) to branch '{}'.",
                session.active_branch()
            ))
        }
        Commands::Remember {
            record_type,
            scope,
            content,
            issue,
            tags,
        } => {
            let record = LegacyRecord::new(record_type.parse()?, &scope, &content)
                .with_issue(issue)
                .with_tags(tags);
            print(format!("Remembered: {}", session.remember(record)?))
        }
        Commands::Recall {
            query,
            scope,
            record_type,
            limit,
        } => {
            let mut q = session.recall_query();
            q.query = query;
            q.scope = scope;
            q.record_type = record_type
                .map(|t| t.parse::<RecordType>())
                .transpose()?;
            if let Some(limit) = limit {
                q.limit = limit;
            }
            print(session.recall(&q)?)
        }
        Commands::Update {
            record_type,
            scope,
            content,
            query,
            issue,
            tags,
        } => {
            let req = UpdateRequest {
                scope,
                record_type: record_type.parse()?,
                content,
                query,
                issue,
                tags,
            };
            print(session.update_memory(&req)?)
        }
        Commands::Forget {
            record_type,
            scope,
            reason,
        } => {
            let record_type: RecordType = record_type.parse()?;
            let removed = session.forget(&scope, record_type, &reason)?;
            print(format!(
                "Forgot {removed} {record_type} memory(ies) in scope '{scope}'."
            ))
        }
        Commands::List => print(session.list_memories()?),
        Commands::Tool { name, args } => {
            let args: Value = serde_json::from_str(&args)
                .with_context(|| format!("Invalid JSON for --args: {args}"))?;
            print(dispatch(&mut session, &name, args))
        }
        Commands::Tools => cmd_tools(),
    }
}

fn print(output: impl std::fmt::Display) -> Result<()> {
    println!("{output}");
    Ok(())
}

fn cmd_branch_list(session: &Session) -> Result<()> {
    let branches = session.branches()?;

    if branches.is_empty() {
        println!("No branches found. Run 'memgit init' first.");
        return Ok(());
    }

    for branch in branches {
        let prefix = if branch.active { "* " } else { "  " };
        println!("{}{}", prefix, branch.name);
    }

    Ok(())
}

fn cmd_tools() -> Result<()> {
    for tool in catalog() {
        println!("{:<22} {}", tool.name, tool.description);
        if !tool.required.is_empty() {
            println!("{:<22} required: {}", "", tool.required.join(", "));
        }
    }
    Ok(())
}
