//! Tool-call boundary for a host agent runtime.
//!
//! Each tool takes a JSON object of named arguments and returns one text
//! block. Failures never escape as errors: they come back as text starting
//! with `Error: `.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::commit::CommitRequest;
use crate::context::{ContextLevel, ContextRequest};
use crate::domain::{MemgitError, RecordType, Result};
use crate::legacy::{LegacyRecord, UpdateRequest};
use crate::session::Session;
use crate::trace_log::LogEntry;

/// Catalog entry for one tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub required: &'static [&'static str],
}

const CATALOG: &[ToolSpec] = &[
    ToolSpec {
        name: "memory_init",
        description: "Create the roadmap and main branch; optional goal",
        required: &[],
    },
    ToolSpec {
        name: "memory_commit",
        description: "Checkpoint progress on the active branch and clear its trace log",
        required: &["message"],
    },
    ToolSpec {
        name: "memory_branch",
        description: "Create a branch with a purpose and switch to it",
        required: &["name"],
    },
    ToolSpec {
        name: "memory_switch",
        description: "Make an existing branch active",
        required: &["name"],
    },
    ToolSpec {
        name: "memory_merge",
        description: "Merge a branch's history and trace into the active branch",
        required: &["source"],
    },
    ToolSpec {
        name: "memory_context",
        description: "Read roadmap, branch, commits, commit, log or metadata views",
        required: &["level"],
    },
    ToolSpec {
        name: "memory_log",
        description: "Append an observation/thought/action or freeform entry to the trace log",
        required: &[],
    },
    ToolSpec {
        name: "memory_metadata_set",
        description: "Set a key on the active branch's metadata",
        required: &["key", "value"],
    },
    ToolSpec {
        name: "remember",
        description: "Store a typed, scoped memory record",
        required: &["type", "scope", "content"],
    },
    ToolSpec {
        name: "recall",
        description: "Search memory records by scope, type and query",
        required: &[],
    },
    ToolSpec {
        name: "update_memory",
        description: "Replace the content of one memory record",
        required: &["scope", "type", "content"],
    },
    ToolSpec {
        name: "forget",
        description: "Delete all memory records with a scope and type",
        required: &["scope", "type", "reason"],
    },
    ToolSpec {
        name: "list_memories",
        description: "Summarize stored scopes and types",
        required: &[],
    },
];

pub fn catalog() -> &'static [ToolSpec] {
    CATALOG
}

/// Tags as either a list or a comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Tags {
    List(Vec<String>),
    Csv(String),
}

impl Tags {
    fn into_vec(self) -> Vec<String> {
        match self {
            Tags::List(v) => v,
            Tags::Csv(s) => s.split(',').map(str::to_string).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct InitArgs {
    #[serde(default)]
    goal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitArgs {
    message: String,
    #[serde(default, alias = "summary")]
    contribution: String,
    #[serde(default)]
    update_roadmap: bool,
}

#[derive(Debug, Deserialize)]
struct BranchArgs {
    name: String,
    #[serde(default)]
    purpose: String,
}

#[derive(Debug, Deserialize)]
struct SwitchArgs {
    name: String,
}

#[derive(Debug, Deserialize)]
struct MergeArgs {
    #[serde(alias = "branch")]
    source: String,
    #[serde(default)]
    summary: String,
}

#[derive(Debug, Deserialize)]
struct ContextArgs {
    level: String,
    #[serde(default)]
    branch: Option<String>,
    #[serde(default)]
    line_count: Option<usize>,
    #[serde(default)]
    offset: Option<usize>,
    #[serde(default, alias = "commit")]
    hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LogArgs {
    #[serde(default)]
    observation: Option<String>,
    #[serde(default)]
    thought: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    freeform: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetadataSetArgs {
    key: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct RememberArgs {
    #[serde(rename = "type")]
    record_type: String,
    scope: String,
    content: String,
    #[serde(default)]
    issue: Option<String>,
    #[serde(default)]
    tags: Option<Tags>,
}

#[derive(Debug, Deserialize)]
struct RecallArgs {
    #[serde(default)]
    scope: Option<String>,
    #[serde(default, rename = "type")]
    record_type: Option<String>,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct UpdateArgs {
    scope: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    issue: Option<String>,
    #[serde(default)]
    tags: Option<Tags>,
}

#[derive(Debug, Deserialize)]
struct ForgetArgs {
    scope: String,
    #[serde(rename = "type")]
    record_type: String,
    reason: String,
}

fn parse<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args)
        .map_err(|e| MemgitError::InvalidArgument(format!("bad arguments for {tool}: {e}")))
}

/// Run tool `name` and return its text result.
pub fn dispatch(session: &mut Session, name: &str, args: Value) -> String {
    match run(session, name, args) {
        Ok(text) => text,
        Err(e) => format!("Error: {e}"),
    }
}

fn run(session: &mut Session, name: &str, args: Value) -> Result<String> {
    match name {
        "memory_init" => {
            let a: InitArgs = parse(name, args)?;
            session.init(a.goal.as_deref())
        }
        "memory_commit" => {
            let a: CommitArgs = parse(name, args)?;
            let req = CommitRequest {
                message: a.message,
                contribution: a.contribution,
                update_roadmap: a.update_roadmap,
            };
            Ok(session.commit(&req)?.to_string())
        }
        "memory_branch" => {
            let a: BranchArgs = parse(name, args)?;
            Ok(session.create_branch(&a.name, &a.purpose)?.to_string())
        }
        "memory_switch" => {
            let a: SwitchArgs = parse(name, args)?;
            session.switch_branch(&a.name)?;
            Ok(format!("Switched to branch '{}'.", session.active_branch()))
        }
        "memory_merge" => {
            let a: MergeArgs = parse(name, args)?;
            Ok(session.merge(&a.source, &a.summary)?.to_string())
        }
        "memory_context" => {
            let a: ContextArgs = parse(name, args)?;
            let req = ContextRequest {
                level: a.level.parse::<ContextLevel>()?,
                branch: a.branch.filter(|b| !b.trim().is_empty()),
                line_count: a.line_count,
                offset: a.offset.unwrap_or(0),
                hash: a.hash,
            };
            session.context(&req)
        }
        "memory_log" => {
            let a: LogArgs = parse(name, args)?;
            let entry = LogEntry::from_parts(a.observation, a.thought, a.action, a.freeform)?;
            let lines = session.log(&entry)?;
            Ok(format!(
                "Logged {lines} line(s) to branch '{}'.",
                session.active_branch()
            ))
        }
        "memory_metadata_set" => {
            let a: MetadataSetArgs = parse(name, args)?;
            session.set_metadata(&a.key, &a.value)?;
            Ok(format!(
                "Set metadata {} = {} on branch '{}'.",
                a.key.trim(),
                a.value,
                session.active_branch()
            ))
        }
        "remember" => {
            let a: RememberArgs = parse(name, args)?;
            let record = LegacyRecord::new(a.record_type.parse()?, &a.scope, &a.content)
                .with_issue(a.issue)
                .with_tags(a.tags.map(Tags::into_vec).unwrap_or_default());
            let record = session.remember(record)?;
            Ok(format!("Remembered: {record}"))
        }
        "recall" => {
            let a: RecallArgs = parse(name, args)?;
            let mut q = session.recall_query();
            if let Some(limit) = a.limit {
                q.limit = limit;
            }
            q.scope = a.scope;
            q.query = a.query;
            q.record_type = a
                .record_type
                .filter(|t| !t.trim().is_empty())
                .map(|t| t.parse::<RecordType>())
                .transpose()?;
            Ok(session.recall(&q)?.to_string())
        }
        "update_memory" => {
            let a: UpdateArgs = parse(name, args)?;
            let req = UpdateRequest {
                scope: a.scope,
                record_type: a.record_type.parse()?,
                content: a.content,
                query: a.query,
                issue: a.issue,
                tags: a.tags.map(Tags::into_vec),
            };
            Ok(session.update_memory(&req)?.to_string())
        }
        "forget" => {
            let a: ForgetArgs = parse(name, args)?;
            let record_type: RecordType = a.record_type.parse()?;
            let removed = session.forget(&a.scope, record_type, &a.reason)?;
            Ok(if removed == 0 {
                format!(
                    "No {record_type} memories found for scope '{}'.",
                    a.scope.trim()
                )
            } else {
                format!(
                    "Forgot {removed} {record_type} memory(ies) in scope '{}'.",
                    a.scope.trim()
                )
            })
        }
        "list_memories" => Ok(session.list_memories()?.to_string()),
        other => {
            let names: Vec<&str> = CATALOG.iter().map(|t| t.name).collect();
            Err(MemgitError::InvalidArgument(format!(
                "unknown tool {other:?}; available: {}",
                names.join(", ")
            )))
        }
    }
}
