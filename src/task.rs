use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Workflow stage a task occupies. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Backlog,
    InProgress,
    InReview,
    Done,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Backlog,
        Status::InProgress,
        Status::InReview,
        Status::Done,
    ];

    /// Wire value, as stored in tasks.json.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Backlog => "backlog",
            Status::InProgress => "in-progress",
            Status::InReview => "in-review",
            Status::Done => "done",
        }
    }

    /// Column heading shown in the UI.
    pub fn label(self) -> &'static str {
        match self {
            Status::Backlog => "Backlog",
            Status::InProgress => "In Progress",
            Status::InReview => "In Review",
            Status::Done => "Done",
        }
    }

    pub fn parse(s: &str) -> Option<Status> {
        match s {
            "backlog" => Some(Status::Backlog),
            "in-progress" => Some(Status::InProgress),
            "in-review" => Some(Status::InReview),
            "done" => Some(Status::Done),
            _ => None,
        }
    }

    /// Position of this status on the board, left to right.
    pub fn index(self) -> usize {
        Status::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Due strictly before `reference` and not finished.
    pub fn is_overdue(&self, reference: NaiveDate) -> bool {
        match self.due_date {
            Some(due) => due < reference && self.status != Status::Done,
            None => false,
        }
    }

    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        self.due_date == Some(date)
    }
}
