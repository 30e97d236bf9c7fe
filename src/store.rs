//! Canonical owner of the project's task list, milestones, and metadata.
//!
//! Every mutation leaves the list with fresh WBS codes, rolled-up summary
//! spans, and a recomputed schedule before it returns, then notifies the
//! registered listeners. Operations that reference an unknown task id are
//! no-ops: stale ids arrive routinely from UI state and must not fault the
//! engine.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde_json::Value;
use uuid::Uuid;

use crate::cpm;
use crate::dates::{add_days, inclusive_span_days, parse_date, today};
use crate::predecessor::{parse_predecessors, serialize_predecessors};
use crate::types::{
    Milestone, ProjectData, Schedule, StoreEvent, Task, TaskStatus,
};
use crate::wbs::rebuild_wbs;

type Listener = Box<dyn Fn(&StoreEvent)>;

pub struct ProjectStore {
    data: ProjectData,
    schedule: Schedule,
    listeners: Vec<Listener>,
}

impl ProjectStore {
    /// Take ownership of a project document. Stored WBS codes and schedule
    /// fields are treated as stale and recomputed immediately; parent links
    /// and milestone spans are repaired first.
    pub fn new(data: ProjectData) -> Self {
        let mut store = Self {
            data,
            schedule: Schedule::default(),
            listeners: Vec::new(),
        };
        store.sanitize_tasks();
        store.rebuild(true);
        store
    }

    /// Register a change listener. Listeners fire synchronously after each
    /// mutation has fully committed.
    pub fn on_change(&mut self, listener: impl Fn(&StoreEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&self, event: StoreEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }

    fn touch(&mut self) {
        self.data.updated_at = chrono::Utc::now().to_rfc3339();
    }

    /// Rebuild the derived state. WBS is always rebuilt; the schedule only
    /// when the mutation could have changed it.
    fn rebuild(&mut self, recompute_schedule: bool) {
        rebuild_wbs(&mut self.data.tasks);
        if recompute_schedule {
            self.schedule = cpm::compute(&self.data.tasks);
        }
    }

    /// Repair constraints an external document may violate. Parent links
    /// must form a forest over the task list; milestone tasks collapse to a
    /// single day. Mutations preserve both, so this only runs when a whole
    /// document is taken in.
    fn sanitize_tasks(&mut self) {
        let ids: HashSet<String> = self.data.tasks.iter().map(|t| t.id.clone()).collect();
        for task in &mut self.data.tasks {
            if task.parent_id.as_ref().is_some_and(|pid| !ids.contains(pid)) {
                task.parent_id = None;
            }
            if task.is_milestone {
                task.duration = 0;
                task.end_date = task.start_date;
            }
        }

        // Break parent cycles: walk up from every task and drop the link
        // that closes a loop.
        for i in 0..self.data.tasks.len() {
            let mut visited = HashSet::from([self.data.tasks[i].id.clone()]);
            let mut prev = self.data.tasks[i].id.clone();
            let mut current = self.data.tasks[i].parent_id.clone();
            while let Some(pid) = current {
                if visited.contains(&pid) {
                    if let Some(j) = self.position(&prev) {
                        self.data.tasks[j].parent_id = None;
                    }
                    break;
                }
                visited.insert(pid.clone());
                current = self.task(&pid).and_then(|t| t.parent_id.clone());
                prev = pid;
            }
        }
    }

    // === Reads ===

    pub fn project(&self) -> &ProjectData {
        &self.data
    }

    pub fn tasks(&self) -> &[Task] {
        &self.data.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.data.tasks.iter().find(|t| t.id == id)
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.data.milestones
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn is_critical(&self, id: &str) -> bool {
        self.schedule.is_critical(id)
    }

    /// A task with at least one child is a summary task. Derived, never
    /// stored.
    pub fn is_summary(&self, id: &str) -> bool {
        self.data.tasks.iter().any(|t| t.parent_id.as_deref() == Some(id))
    }

    /// All transitive children, in list order within each level.
    pub fn descendants(&self, id: &str) -> Vec<&Task> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([id.to_string()]);
        self.push_descendants(id, &mut seen, &mut out);
        out
    }

    // The seen set keeps the walk finite even if the parent links are not a
    // forest (a loaded document is sanitized, but this must not be the code
    // that finds out otherwise).
    fn push_descendants<'a>(
        &'a self,
        id: &str,
        seen: &mut HashSet<String>,
        out: &mut Vec<&'a Task>,
    ) {
        for t in self.data.tasks.iter().filter(|t| t.parent_id.as_deref() == Some(id)) {
            if !seen.insert(t.id.clone()) {
                continue;
            }
            out.push(t);
            self.push_descendants(&t.id, seen, out);
        }
    }

    /// Hops to the root of the task's tree. 0 for roots and unknown ids.
    pub fn depth(&self, id: &str) -> usize {
        let mut depth = 0;
        let mut current = self.task(id).and_then(|t| t.parent_id.as_deref());
        while let Some(pid) = current {
            depth += 1;
            if depth > self.data.tasks.len() {
                break;
            }
            current = self.task(pid).and_then(|t| t.parent_id.as_deref());
        }
        depth
    }

    /// Task list with the subtrees of collapsed summary tasks filtered out.
    /// Collapse state never affects scheduling.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        let mut hidden: HashSet<&str> = HashSet::new();
        for t in &self.data.tasks {
            if t.collapsed {
                for d in self.descendants(&t.id) {
                    hidden.insert(d.id.as_str());
                }
            }
        }
        self.data
            .tasks
            .iter()
            .filter(|t| !hidden.contains(t.id.as_str()))
            .collect()
    }

    /// Display form of a task's predecessor list, e.g. `2FS+1,3`.
    pub fn predecessor_text(&self, id: &str) -> String {
        match self.task(id) {
            Some(task) => serialize_predecessors(&task.predecessors, &self.data.tasks),
            None => String::new(),
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.data.tasks.iter().position(|t| t.id == id)
    }

    // === Task mutations ===

    /// Insert a new 5-day task starting today. Placed after `after_id` when
    /// given (appended otherwise), under `parent_id` when given. Returns the
    /// new task's id.
    pub fn add_task(&mut self, after_id: Option<&str>, parent_id: Option<&str>) -> String {
        let mut task = Task::new(Uuid::new_v4().to_string(), "New Task", today(), 5);
        task.parent_id = parent_id
            .filter(|pid| self.position(pid).is_some())
            .map(str::to_string);
        let id = task.id.clone();

        match after_id.and_then(|a| self.position(a)) {
            Some(idx) => self.data.tasks.insert(idx + 1, task),
            None => self.data.tasks.push(task),
        }

        self.rebuild(true);
        self.touch();
        self.emit(StoreEvent::TaskAdded(id.clone()));
        id
    }

    /// Apply a field patch. Unknown ids and unknown fields are ignored.
    ///
    /// Date handling: an endDate change recomputes duration from the span;
    /// a startDate- or duration-only change keeps the duration and moves the
    /// end date. Inverted ranges repair to a one-day task.
    pub fn update_task(&mut self, id: &str, patch: &Value) {
        let Some(idx) = self.position(id) else {
            return;
        };
        let Some(fields) = patch.as_object() else {
            return;
        };

        let end_patched = fields.contains_key("endDate");
        let mut parent_patch: Option<Option<String>> = None;

        {
            let task = &mut self.data.tasks[idx];
            for (key, value) in fields {
                match key.as_str() {
                    "title" => {
                        if let Some(v) = value.as_str() {
                            task.title = v.to_string();
                        }
                    }
                    "assignee" => {
                        if let Some(v) = value.as_str() {
                            task.assignee = v.to_string();
                        }
                    }
                    "notes" => {
                        if let Some(v) = value.as_str() {
                            task.notes = v.to_string();
                        }
                    }
                    "status" => {
                        if let Ok(v) = serde_json::from_value::<TaskStatus>(value.clone()) {
                            task.status = v;
                        }
                    }
                    "priority" => {
                        if let Ok(v) = serde_json::from_value(value.clone()) {
                            task.priority = v;
                        }
                    }
                    "startDate" => {
                        if let Some(d) = value.as_str().and_then(|v| parse_date(v).ok()) {
                            task.start_date = d;
                        }
                    }
                    "endDate" => {
                        if let Some(d) = value.as_str().and_then(|v| parse_date(v).ok()) {
                            task.end_date = d;
                        }
                    }
                    "duration" => {
                        if let Some(v) = value.as_i64() {
                            task.duration = v as i32;
                        }
                    }
                    "progress" => {
                        if let Some(v) = value.as_i64() {
                            task.progress = (v as i32).clamp(0, 100);
                        }
                    }
                    "parentId" => {
                        parent_patch = Some(value.as_str().map(str::to_string));
                    }
                    "collapsed" => {
                        if let Some(v) = value.as_bool() {
                            task.collapsed = v;
                        }
                    }
                    "isMilestone" => {
                        if let Some(v) = value.as_bool() {
                            task.is_milestone = v;
                        }
                    }
                    "color" => {
                        task.color = value.as_str().map(str::to_string);
                    }
                    "predecessors" => {
                        if let Ok(v) = serde_json::from_value(value.clone()) {
                            task.predecessors = v;
                        }
                    }
                    // Unknown fields ignored for forward compatibility.
                    _ => {}
                }
            }
            // Self-references cannot survive a predecessors patch.
            let own_id = task.id.clone();
            task.predecessors.retain(|p| p.task_id != own_id);

            // Restore the duration/date equality.
            if task.is_milestone {
                task.duration = 0;
                task.end_date = task.start_date;
            } else if end_patched {
                if task.end_date < task.start_date {
                    task.end_date = task.start_date;
                }
                task.duration = inclusive_span_days(task.start_date, task.end_date);
            } else {
                task.duration = task.duration.max(1);
                task.end_date = add_days(task.start_date, task.duration - 1);
            }
        }

        // A parentId patch must resolve and must not point into the task's
        // own subtree. It is checked against the still-intact hierarchy and
        // applied only when it keeps the forest a forest.
        if let Some(new_parent) = parent_patch {
            let parent_ok = match new_parent.as_deref() {
                Some(pid) => self.position(pid).is_some() && !self.in_subtree(pid, id),
                None => true,
            };
            if parent_ok {
                self.data.tasks[idx].parent_id = new_parent;
            }
        }

        let parent = self.data.tasks[idx].parent_id.clone();
        self.roll_up_from(parent.as_deref());
        self.rebuild(true);
        self.touch();
        self.emit(StoreEvent::TaskUpdated(id.to_string()));
    }

    /// Delete a task and all of its descendants, stripping every dangling
    /// predecessor reference from the survivors.
    pub fn delete_task(&mut self, id: &str) {
        if self.position(id).is_none() {
            return;
        }
        let mut doomed: HashSet<String> = HashSet::new();
        doomed.insert(id.to_string());
        for d in self.descendants(id) {
            doomed.insert(d.id.clone());
        }

        for task in &mut self.data.tasks {
            task.predecessors.retain(|p| !doomed.contains(&p.task_id));
        }
        self.data.tasks.retain(|t| !doomed.contains(&t.id));

        self.rebuild(true);
        self.touch();
        self.emit(StoreEvent::TaskDeleted(id.to_string()));
    }

    /// Reparent under the nearest preceding task that shares the current
    /// parent. No-op when the task is first among its siblings. Cannot
    /// create a hierarchy cycle: the new parent is a sibling, never a
    /// descendant.
    pub fn indent_task(&mut self, id: &str) {
        let Some(idx) = self.position(id) else {
            return;
        };
        if idx == 0 {
            return;
        }
        let parent = self.data.tasks[idx].parent_id.clone();
        let Some(new_parent) = self.data.tasks[..idx]
            .iter()
            .rev()
            .find(|t| t.parent_id == parent)
            .map(|t| t.id.clone())
        else {
            return;
        };
        self.data.tasks[idx].parent_id = Some(new_parent);

        // Summary spans shift with the subtree, so the schedule is rebuilt
        // along with the WBS codes.
        self.rebuild(true);
        self.touch();
        self.emit(StoreEvent::Reordered);
    }

    /// Reparent under the grandparent. No-op for root tasks.
    pub fn outdent_task(&mut self, id: &str) {
        let Some(idx) = self.position(id) else {
            return;
        };
        let Some(parent_id) = self.data.tasks[idx].parent_id.clone() else {
            return;
        };
        let grandparent = self
            .task(&parent_id)
            .and_then(|p| p.parent_id.clone());
        self.data.tasks[idx].parent_id = grandparent;

        self.rebuild(true);
        self.touch();
        self.emit(StoreEvent::Reordered);
    }

    /// Splice the task to a new position in the flat list: after `after_id`,
    /// or to the front when `None`. Pure reordering never changes the
    /// schedule, so only the WBS codes are rebuilt.
    pub fn move_task(&mut self, id: &str, after_id: Option<&str>) {
        let Some(from) = self.position(id) else {
            return;
        };
        if let Some(after) = after_id {
            if self.position(after).is_none() || after == id {
                return;
            }
        }
        let task = self.data.tasks.remove(from);
        match after_id.and_then(|a| self.position(a)) {
            Some(idx) => self.data.tasks.insert(idx + 1, task),
            None => self.data.tasks.insert(0, task),
        }

        self.rebuild(false);
        self.touch();
        self.emit(StoreEvent::Reordered);
    }

    /// Flip collapse state. View-only: no WBS or schedule rebuild.
    pub fn toggle_collapse(&mut self, id: &str) {
        let Some(idx) = self.position(id) else {
            return;
        };
        self.data.tasks[idx].collapsed = !self.data.tasks[idx].collapsed;
        self.touch();
        self.emit(StoreEvent::TaskUpdated(id.to_string()));
    }

    /// Replace a task's predecessor list from raw token text (see the
    /// `predecessor` module for the grammar). Bad tokens are dropped, the
    /// rest apply.
    pub fn set_predecessors_from_text(&mut self, id: &str, raw: &str) {
        let Some(idx) = self.position(id) else {
            return;
        };
        let deps = parse_predecessors(raw, &self.data.tasks, id);
        self.data.tasks[idx].predecessors = deps;

        // Hierarchy is untouched; only the schedule needs recomputing.
        self.schedule = cpm::compute(&self.data.tasks);
        self.touch();
        self.emit(StoreEvent::TaskUpdated(id.to_string()));
    }

    // === Summary roll-up ===

    /// Recompute a summary task's span and progress from its children,
    /// propagating upward until a root is reached. A parent with no
    /// children is left untouched. The hop cap bounds the climb the same
    /// way `depth` bounds its walk.
    fn roll_up_from(&mut self, parent_id: Option<&str>) {
        let mut current = parent_id.map(str::to_string);
        let mut hops = 0;
        while let Some(pid) = current {
            hops += 1;
            if hops > self.data.tasks.len() {
                break;
            }
            let Some(idx) = self.position(&pid) else {
                break;
            };
            let children: Vec<(NaiveDate, NaiveDate, i32)> = self
                .data
                .tasks
                .iter()
                .filter(|t| t.parent_id.as_deref() == Some(pid.as_str()))
                .map(|t| (t.start_date, t.end_date, t.progress))
                .collect();
            if children.is_empty() {
                break;
            }

            let start = children.iter().map(|c| c.0).min().unwrap_or_default();
            let end = children.iter().map(|c| c.1).max().unwrap_or_default();
            let progress = (children.iter().map(|c| c.2).sum::<i32>() as f64
                / children.len() as f64)
                .round() as i32;

            let parent = &mut self.data.tasks[idx];
            parent.start_date = start;
            parent.end_date = end;
            parent.duration = inclusive_span_days(start, end);
            parent.progress = progress;

            current = parent.parent_id.clone();
        }
    }

    fn in_subtree(&self, candidate: &str, root: &str) -> bool {
        candidate == root || self.descendants(root).iter().any(|t| t.id == candidate)
    }

    // === Milestone markers ===

    pub fn add_milestone(&mut self, title: &str, date: NaiveDate) -> String {
        let milestone = Milestone {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            date,
            color: "#F39C12".to_string(),
            task_ids: Vec::new(),
        };
        let id = milestone.id.clone();
        self.data.milestones.push(milestone);
        self.touch();
        self.emit(StoreEvent::ProjectUpdated);
        id
    }

    pub fn delete_milestone(&mut self, id: &str) {
        let before = self.data.milestones.len();
        self.data.milestones.retain(|m| m.id != id);
        if self.data.milestones.len() != before {
            self.touch();
            self.emit(StoreEvent::ProjectUpdated);
        }
    }

    // === Project metadata ===

    /// Patch project metadata (name, description, date bounds, settings).
    pub fn update_project(&mut self, patch: &Value) {
        let Some(fields) = patch.as_object() else {
            return;
        };
        for (key, value) in fields {
            match key.as_str() {
                "name" => {
                    if let Some(v) = value.as_str() {
                        self.data.name = v.to_string();
                    }
                }
                "description" => {
                    if let Some(v) = value.as_str() {
                        self.data.description = v.to_string();
                    }
                }
                "startDate" => {
                    if let Some(d) = value.as_str().and_then(|v| parse_date(v).ok()) {
                        self.data.start_date = d;
                    }
                }
                "endDate" => {
                    if let Some(d) = value.as_str().and_then(|v| parse_date(v).ok()) {
                        self.data.end_date = d;
                    }
                }
                "settings" => {
                    if let Ok(v) = serde_json::from_value(value.clone()) {
                        self.data.settings = v;
                    }
                }
                _ => {}
            }
        }
        self.touch();
        self.emit(StoreEvent::ProjectUpdated);
    }

    // === Whole-project (de)serialization ===

    /// Replace the project wholesale from JSON, recomputing all derived
    /// state. Stored WBS codes and schedule fields in the payload are never
    /// trusted.
    pub fn load_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        let data: ProjectData = serde_json::from_str(json)?;
        self.data = data;
        self.sanitize_tasks();
        self.rebuild(true);
        self.emit(StoreEvent::Loaded);
        Ok(())
    }

    pub fn export_json(&self) -> String {
        serde_json::to_string_pretty(&self.data).unwrap_or_else(|_| "{}".to_string())
    }
}
