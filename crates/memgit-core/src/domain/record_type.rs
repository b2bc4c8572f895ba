use serde::{Deserialize, Serialize};

use super::error::MemgitError;

/// Category of a flat index record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Decision,
    Learning,
    Preference,
    Blocker,
    Context,
    Pattern,
}

impl RecordType {
    pub const ALL: [RecordType; 6] = [
        RecordType::Decision,
        RecordType::Learning,
        RecordType::Preference,
        RecordType::Blocker,
        RecordType::Context,
        RecordType::Pattern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decision => "decision",
            Self::Learning => "learning",
            Self::Preference => "preference",
            Self::Blocker => "blocker",
            Self::Context => "context",
            Self::Pattern => "pattern",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordType {
    type Err = MemgitError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| {
                MemgitError::InvalidArgument(format!(
                    "unknown memory type {s:?} (expected one of: decision, learning, preference, blocker, context, pattern)"
                ))
            })
    }
}
