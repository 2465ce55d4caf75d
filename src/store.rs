//! The task store: the in-memory collection, its mutations, and persistence.
//!
//! Every mutation writes the whole collection back to disk before returning,
//! so the file and memory never diverge. There is exactly one writer.

use std::fs;
use std::path::PathBuf;

use chrono::{Duration, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::task::{Priority, Status, Task};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),
    #[error("no task with id {0}")]
    NotFound(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Fields supplied when creating a task.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    /// Defaults to backlog when unset.
    pub status: Option<Status>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
}

/// Partial edit. A `None` field is left untouched.
///
/// `due_date` is doubly optional so an edit can clear a date:
/// `Some(None)` clears, `None` leaves it alone.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
}

/// One-pass counts over the collection, recomputed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoardSummary {
    pub backlog: usize,
    pub in_progress: usize,
    pub in_review: usize,
    pub done: usize,
    pub high_priority: usize,
    pub due_today: usize,
    pub overdue: usize,
    pub total: usize,
}

impl BoardSummary {
    pub fn count(&self, status: Status) -> usize {
        match status {
            Status::Backlog => self.backlog,
            Status::InProgress => self.in_progress,
            Status::InReview => self.in_review,
            Status::Done => self.done,
        }
    }
}

#[derive(Debug)]
pub struct TaskStore {
    tasks: Vec<Task>,
    path: PathBuf,
}

impl TaskStore {
    /// Load the collection from `path`. A missing file is an empty board.
    pub fn open(path: PathBuf) -> Result<Self> {
        let tasks = if path.exists() {
            let data = fs::read_to_string(&path)?;
            serde_json::from_str(&data)?
        } else {
            Vec::new()
        };
        Ok(Self { tasks, path })
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Full ordered sequence, insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn by_status(&self, status: Status) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.status == status).collect()
    }

    /// Validate, assign a fresh id and creation time, append, persist.
    pub fn create(&mut self, draft: TaskDraft) -> Result<Task> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(StoreError::Validation("task title is required".into()));
        }
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: draft.description.trim().to_string(),
            status: draft.status.unwrap_or(Status::Backlog),
            priority: draft.priority,
            due_date: draft.due_date,
            created_at: Utc::now(),
        };
        self.tasks.push(task.clone());
        self.persist()?;
        Ok(task)
    }

    /// Merge `patch` into the task with `id`. Id and creation time survive.
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<Task> {
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(StoreError::Validation("task title is required".into()));
            }
        }
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if let Some(title) = patch.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = patch.description {
            task.description = description.trim().to_string();
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        let updated = task.clone();
        self.persist()?;
        Ok(updated)
    }

    /// Move a task into the column named by `status`.
    ///
    /// The raw string is parsed here so an unrecognized value fails before
    /// anything is touched. Returns the status moved into, for the
    /// confirmation notice.
    pub fn move_to(&mut self, id: &str, status: &str) -> Result<Status> {
        let status = Status::parse(status)
            .ok_or_else(|| StoreError::Validation(format!("unrecognized status: {status}")))?;
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        task.status = status;
        self.persist()?;
        Ok(status)
    }

    /// Remove the task if present. Absent id is a no-op, not an error.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        self.tasks.retain(|t| t.id != id);
        self.persist()
    }

    /// Per-status, high-priority, due-today, and overdue counts in one pass.
    pub fn summary(&self, reference: NaiveDate) -> BoardSummary {
        let mut summary = BoardSummary::default();
        for task in &self.tasks {
            match task.status {
                Status::Backlog => summary.backlog += 1,
                Status::InProgress => summary.in_progress += 1,
                Status::InReview => summary.in_review += 1,
                Status::Done => summary.done += 1,
            }
            if task.priority == Priority::High {
                summary.high_priority += 1;
            }
            if task.is_due_on(reference) {
                summary.due_today += 1;
            }
            if task.is_overdue(reference) {
                summary.overdue += 1;
            }
        }
        summary.total = self.tasks.len();
        summary
    }

    /// First-run fixture so a fresh board is not a wall of empty columns.
    pub fn seed_samples(&mut self, today: NaiveDate) -> Result<()> {
        let samples = [
            (
                "Design new logo",
                "Three concepts for the rebrand, ready to present.",
                Status::Backlog,
                Priority::High,
                Some(today + Duration::days(7)),
            ),
            (
                "Implement user authentication",
                "Login and registration, including the social providers.",
                Status::InProgress,
                Priority::Medium,
                Some(today + Duration::days(3)),
            ),
            (
                "Write API documentation",
                "All endpoints with examples and error codes.",
                Status::InReview,
                Priority::Low,
                Some(today + Duration::days(2)),
            ),
            (
                "Set up CI pipeline",
                "Automated tests and deployment on every merge.",
                Status::Done,
                Priority::High,
                Some(today - Duration::days(1)),
            ),
            (
                "Mobile responsive testing",
                "Walk every page on small screens and file what breaks.",
                Status::InProgress,
                Priority::Medium,
                Some(today + Duration::days(5)),
            ),
        ];
        for (title, description, status, priority, due_date) in samples {
            let task = Task {
                id: Uuid::new_v4().to_string(),
                title: title.to_string(),
                description: description.to_string(),
                status,
                priority,
                due_date,
                created_at: Utc::now(),
            };
            self.tasks.push(task);
        }
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        fs::write(&self.path, serde_json::to_string_pretty(&self.tasks)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scratch_store() -> (TempDir, TaskStore) {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.json")).unwrap();
        (dir, store)
    }

    fn draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            ..TaskDraft::default()
        }
    }

    #[test]
    fn create_assigns_distinct_ids_and_grows_by_one() {
        let (_dir, mut store) = scratch_store();
        let a = store.create(draft("first")).unwrap();
        assert_eq!(store.tasks().len(), 1);
        let b = store.create(draft("second")).unwrap();
        assert_eq!(store.tasks().len(), 2);
        assert_ne!(a.id, b.id);
        assert_eq!(a.status, Status::Backlog);
    }

    #[test]
    fn create_rejects_whitespace_title() {
        let (_dir, mut store) = scratch_store();
        let err = store.create(draft("   ")).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn create_honors_requested_status() {
        let (_dir, mut store) = scratch_store();
        let task = store
            .create(TaskDraft {
                title: "review me".into(),
                status: Some(Status::InReview),
                ..TaskDraft::default()
            })
            .unwrap();
        assert_eq!(task.status, Status::InReview);
    }

    #[test]
    fn update_changes_only_patched_fields() {
        let (_dir, mut store) = scratch_store();
        let created = store
            .create(TaskDraft {
                title: "original".into(),
                description: "desc".into(),
                priority: Priority::High,
                ..TaskDraft::default()
            })
            .unwrap();
        let updated = store
            .update(
                &created.id,
                TaskPatch {
                    title: Some("renamed".into()),
                    ..TaskPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.description, "desc");
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let (_dir, mut store) = scratch_store();
        let err = store.update("missing", TaskPatch::default()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn update_can_clear_due_date() {
        let (_dir, mut store) = scratch_store();
        let due = NaiveDate::from_ymd_opt(2026, 4, 1);
        let created = store
            .create(TaskDraft {
                title: "dated".into(),
                due_date: due,
                ..TaskDraft::default()
            })
            .unwrap();
        assert_eq!(created.due_date, due);
        let updated = store
            .update(
                &created.id,
                TaskPatch {
                    due_date: Some(None),
                    ..TaskPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.due_date, None);
    }

    #[test]
    fn move_rejects_unknown_status_without_touching_the_task() {
        let (_dir, mut store) = scratch_store();
        let created = store.create(draft("movable")).unwrap();
        let err = store.move_to(&created.id, "archived").unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.get(&created.id).unwrap().status, Status::Backlog);
    }

    #[test]
    fn move_sets_status_and_reports_it() {
        let (_dir, mut store) = scratch_store();
        let created = store.create(draft("movable")).unwrap();
        let moved_to = store.move_to(&created.id, "in-progress").unwrap();
        assert_eq!(moved_to, Status::InProgress);
        assert_eq!(store.get(&created.id).unwrap().status, Status::InProgress);
    }

    #[test]
    fn move_unknown_id_is_not_found() {
        let (_dir, mut store) = scratch_store();
        let err = store.move_to("missing", "done").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn delete_twice_is_idempotent() {
        let (_dir, mut store) = scratch_store();
        let created = store.create(draft("doomed")).unwrap();
        store.delete(&created.id).unwrap();
        assert!(store.tasks().is_empty());
        store.delete(&created.id).unwrap();
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn summary_counts_are_exact() {
        let (_dir, mut store) = scratch_store();
        for status in [
            Status::Backlog,
            Status::InProgress,
            Status::InProgress,
            Status::Done,
        ] {
            store
                .create(TaskDraft {
                    title: "t".into(),
                    status: Some(status),
                    ..TaskDraft::default()
                })
                .unwrap();
        }
        let summary = store.summary(NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
        assert_eq!(summary.backlog, 1);
        assert_eq!(summary.in_progress, 2);
        assert_eq!(summary.in_review, 0);
        assert_eq!(summary.done, 1);
        assert_eq!(summary.total, 4);
    }

    #[test]
    fn moving_an_overdue_task_to_done_clears_the_overdue_bucket() {
        let (_dir, mut store) = scratch_store();
        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let yesterday = today.pred_opt().unwrap();
        let created = store
            .create(TaskDraft {
                title: "late".into(),
                due_date: Some(yesterday),
                ..TaskDraft::default()
            })
            .unwrap();
        assert_eq!(store.summary(today).overdue, 1);
        store.move_to(&created.id, "done").unwrap();
        assert_eq!(store.summary(today).overdue, 0);
    }

    #[test]
    fn summary_counts_high_priority_and_due_today() {
        let (_dir, mut store) = scratch_store();
        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        store
            .create(TaskDraft {
                title: "urgent".into(),
                priority: Priority::High,
                due_date: Some(today),
                ..TaskDraft::default()
            })
            .unwrap();
        store.create(draft("relaxed")).unwrap();
        let summary = store.summary(today);
        assert_eq!(summary.high_priority, 1);
        assert_eq!(summary.due_today, 1);
        assert_eq!(summary.overdue, 0);
    }

    #[test]
    fn mutations_are_written_through() {
        let (dir, mut store) = scratch_store();
        store.create(draft("persisted")).unwrap();
        let on_disk: Vec<Task> = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("tasks.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(on_disk, store.tasks());
    }

    #[test]
    fn reopening_the_store_reproduces_the_collection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        let mut store = TaskStore::open(path.clone()).unwrap();
        store
            .create(TaskDraft {
                title: "first".into(),
                description: "with description".into(),
                priority: Priority::High,
                due_date: NaiveDate::from_ymd_opt(2026, 3, 20),
                ..TaskDraft::default()
            })
            .unwrap();
        store
            .create(TaskDraft {
                title: "second".into(),
                status: Some(Status::InReview),
                ..TaskDraft::default()
            })
            .unwrap();
        let before: Vec<Task> = store.tasks().to_vec();
        drop(store);

        let reopened = TaskStore::open(path).unwrap();
        assert_eq!(reopened.tasks(), before.as_slice());
    }

    #[test]
    fn missing_file_opens_as_an_empty_board() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::open(dir.path().join("absent.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn seeding_fills_all_four_columns() {
        let (_dir, mut store) = scratch_store();
        store
            .seed_samples(NaiveDate::from_ymd_opt(2026, 3, 15).unwrap())
            .unwrap();
        for status in Status::ALL {
            assert!(!store.by_status(status).is_empty(), "{status} empty");
        }
    }
}
