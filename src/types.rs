//! Domain types for the scheduling engine.
//!
//! Field names serialize as camelCase so the JSON shape matches the project
//! files read and written by the browser front end.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::dates::{add_days, today};

/// Which endpoint of the predecessor constrains which endpoint of the
/// successor.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DependencyType {
    /// Finish-to-start (the default link type).
    #[default]
    FS,
    /// Start-to-start.
    SS,
    /// Finish-to-finish.
    FF,
    /// Start-to-finish.
    SF,
}

impl DependencyType {
    /// Case-insensitive parse of a two-letter link type code.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "FS" => Some(Self::FS),
            "SS" => Some(Self::SS),
            "FF" => Some(Self::FF),
            "SF" => Some(Self::SF),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FS => "FS",
            Self::SS => "SS",
            Self::FF => "FF",
            Self::SF => "SF",
        }
    }
}

/// Dependency link from a task to one of its predecessors.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDependency {
    /// Predecessor task ID.
    pub task_id: String,

    #[serde(rename = "type", default)]
    pub link_type: DependencyType,

    /// Lag in calendar days; negative = lead.
    #[serde(default)]
    pub lag: i32,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Done,
    Cancelled,
    OnHold,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Task entity - the atomic unit of scheduling.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    // === Identity & Hierarchy ===
    pub id: String,

    /// Hierarchical position code, e.g. "1.2.3". Derived from parent links
    /// and list order; rebuilt after every structural change.
    #[serde(default)]
    pub wbs: String,

    pub title: String,

    #[serde(default)]
    pub assignee: String,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: Priority,

    /// Owning summary task, or `None` for a root task. The parent links
    /// always form a forest over the flat task list.
    #[serde(default)]
    pub parent_id: Option<String>,

    // === Schedule ===
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// Inclusive calendar days: `end_date - start_date + 1`. Milestone tasks
    /// carry 0; everything else is at least 1.
    pub duration: i32,

    /// 0-100.
    #[serde(default)]
    pub progress: i32,

    #[serde(default)]
    pub predecessors: Vec<TaskDependency>,

    #[serde(default)]
    pub is_milestone: bool,

    // === Display-only ===
    #[serde(default)]
    pub collapsed: bool,

    #[serde(default)]
    pub color: Option<String>,

    #[serde(default)]
    pub notes: String,
}

impl Task {
    /// A leaf task spanning `duration` inclusive days from `start`.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: NaiveDate,
        duration: i32,
    ) -> Self {
        let duration = duration.max(1);
        Self {
            id: id.into(),
            wbs: String::new(),
            title: title.into(),
            assignee: String::new(),
            status: TaskStatus::NotStarted,
            priority: Priority::Medium,
            parent_id: None,
            start_date: start,
            end_date: add_days(start, duration - 1),
            duration,
            progress: 0,
            predecessors: Vec::new(),
            is_milestone: false,
            collapsed: false,
            color: None,
            notes: String::new(),
        }
    }

    /// A zero-duration milestone task on `date`.
    pub fn milestone(id: impl Into<String>, title: impl Into<String>, date: NaiveDate) -> Self {
        let mut task = Self::new(id, title, date, 1);
        task.is_milestone = true;
        task.duration = 0;
        task.end_date = date;
        task
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_predecessor(
        mut self,
        task_id: impl Into<String>,
        link_type: DependencyType,
        lag: i32,
    ) -> Self {
        self.predecessors.push(TaskDependency {
            task_id: task_id.into(),
            link_type,
            lag,
        });
        self
    }
}

/// Labeled date marker on the project timeline. Decoupled from the task
/// graph; not part of CPM.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub task_ids: Vec<String>,
}

/// Working-day mask and holiday list. Stored with the project and reserved
/// for future calendar-aware scheduling; the base solver does not consume it.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    /// Per-weekday flags, Sunday first.
    pub working_days: [bool; 7],
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
    #[serde(default = "default_zoom")]
    pub default_zoom: String,
}

fn default_zoom() -> String {
    "month".to_string()
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            working_days: [false, true, true, true, true, true, false],
            holidays: Vec::new(),
            default_zoom: default_zoom(),
        }
    }
}

/// Whole-project document: metadata plus the owned task and milestone
/// collections.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProjectData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub settings: ProjectSettings,
}

impl ProjectData {
    /// Empty project starting today with a one-year span.
    pub fn default_project(id: &str) -> Self {
        let start = today();
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            start_date: start,
            end_date: add_days(start, 364),
            created_at: now.clone(),
            updated_at: now,
            tasks: Vec::new(),
            milestones: Vec::new(),
            settings: ProjectSettings::default(),
        }
    }
}

/// Per-task CPM output, all values in integer day-offsets from project start.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskSchedule {
    pub early_start: i32,
    pub early_finish: i32,
    pub late_start: i32,
    pub late_finish: i32,
    pub total_float: i32,
    pub is_critical: bool,
}

/// Full CPM result: one entry per input task, plus the computed project-end
/// offset. Derived and disposable; never persisted.
#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub entries: HashMap<String, TaskSchedule>,
    pub project_end: i32,
}

impl Schedule {
    pub fn get(&self, task_id: &str) -> Option<&TaskSchedule> {
        self.entries.get(task_id)
    }

    pub fn is_critical(&self, task_id: &str) -> bool {
        self.entries.get(task_id).is_some_and(|e| e.is_critical)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Change notification emitted after each store mutation, so a rendering
/// layer can redraw incrementally and a sync layer can schedule a save.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum StoreEvent {
    TaskAdded(String),
    TaskUpdated(String),
    TaskDeleted(String),
    Reordered,
    ProjectUpdated,
    Loaded,
}
