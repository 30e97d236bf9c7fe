//! CPM (Critical Path Method) solver.
//!
//! Forward and backward passes run as bounded fixed-point iterations over
//! the task list (at most N passes for N tasks) instead of a topological
//! sort. The forward pass only ever raises early starts and the backward
//! pass only ever lowers late finishes, so acyclic input converges exactly
//! and cyclic input still terminates with a deterministic result.
//!
//! All outputs are integer day-offsets from project start. A task with no
//! predecessors starts at offset 0.

use std::collections::HashMap;

use crate::console_log;
use crate::types::{DependencyType, Schedule, Task, TaskSchedule};

/// CPM duration for a task: milestones collapse to a point.
fn effective_duration(task: &Task) -> i32 {
    if task.is_milestone {
        0
    } else {
        task.duration.max(1)
    }
}

/// EF = ES + offset. Zero-duration milestones finish the day they start.
fn duration_offset(duration: i32) -> i32 {
    if duration <= 0 {
        0
    } else {
        duration - 1
    }
}

/// Compute the full schedule for `tasks`. Pure function: no hidden state,
/// no mutation of the input. Every input task has an entry in the result.
pub fn compute(tasks: &[Task]) -> Schedule {
    if tasks.is_empty() {
        return Schedule::default();
    }

    let n = tasks.len();
    let index: HashMap<&str, usize> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.as_str(), i))
        .collect();
    let dur: Vec<i32> = tasks.iter().map(effective_duration).collect();

    // Forward pass: early starts only rise.
    let mut early_start = vec![0i32; n];
    let mut early_finish: Vec<i32> = (0..n).map(|i| duration_offset(dur[i])).collect();

    let mut passes = 0;
    let mut changed = true;
    while changed && passes < n {
        changed = false;
        passes += 1;

        for (i, task) in tasks.iter().enumerate() {
            let mut es = early_start[i];
            for dep in &task.predecessors {
                // Dangling references never reach the solver, but tolerate
                // them the same way unknown WBS tokens are tolerated.
                let Some(&p) = index.get(dep.task_id.as_str()) else {
                    continue;
                };
                let constraint = match dep.link_type {
                    DependencyType::FS => early_finish[p] + dep.lag,
                    DependencyType::SS => early_start[p] + dep.lag,
                    DependencyType::FF => early_finish[p] + dep.lag - duration_offset(dur[i]),
                    DependencyType::SF => early_start[p] + dep.lag - duration_offset(dur[i]),
                };
                es = es.max(constraint);
            }
            if es > early_start[i] {
                early_start[i] = es;
                early_finish[i] = es + duration_offset(dur[i]);
                changed = true;
            }
        }
    }
    if changed {
        console_log!("[cpm] forward pass hit the {n}-pass cap; dependency graph likely cyclic");
    }

    // Successor adjacency, inverted from the predecessor lists.
    let mut successors: Vec<Vec<(usize, DependencyType, i32)>> = vec![Vec::new(); n];
    for (i, task) in tasks.iter().enumerate() {
        for dep in &task.predecessors {
            if let Some(&p) = index.get(dep.task_id.as_str()) {
                successors[p].push((i, dep.link_type, dep.lag));
            }
        }
    }

    // Backward pass: start every task at project end, lower late finishes.
    let project_end = early_finish.iter().copied().max().unwrap_or(0);
    let mut late_finish = vec![project_end; n];
    let mut late_start: Vec<i32> = (0..n).map(|i| project_end - duration_offset(dur[i])).collect();

    let mut passes = 0;
    let mut changed = true;
    while changed && passes < n {
        changed = false;
        passes += 1;

        for i in (0..n).rev() {
            let mut lf = late_finish[i];
            for &(s, link_type, lag) in &successors[i] {
                let bound = match link_type {
                    DependencyType::FS => late_start[s] - lag,
                    DependencyType::SS => late_start[s] - lag + duration_offset(dur[i]),
                    DependencyType::FF => late_finish[s] - lag,
                    DependencyType::SF => late_finish[s] - lag + duration_offset(dur[i]),
                };
                lf = lf.min(bound);
            }
            if lf < late_finish[i] {
                late_finish[i] = lf;
                late_start[i] = lf - duration_offset(dur[i]);
                changed = true;
            }
        }
    }
    if changed {
        console_log!("[cpm] backward pass hit the {n}-pass cap; dependency graph likely cyclic");
    }

    let mut entries = HashMap::with_capacity(n);
    for (i, task) in tasks.iter().enumerate() {
        let total_float = late_start[i] - early_start[i];
        entries.insert(
            task.id.clone(),
            TaskSchedule {
                early_start: early_start[i],
                early_finish: early_finish[i],
                late_start: late_start[i],
                late_finish: late_finish[i],
                total_float,
                is_critical: total_float <= 0,
            },
        );
    }

    Schedule {
        entries,
        project_end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date;
    use chrono::NaiveDate;

    fn start() -> NaiveDate {
        parse_date("2026-01-05").unwrap()
    }

    fn leaf(id: &str, duration: i32) -> Task {
        Task::new(id, id, start(), duration)
    }

    #[test]
    fn empty_input_yields_empty_result() {
        let schedule = compute(&[]);
        assert!(schedule.is_empty());
        assert_eq!(schedule.project_end, 0);
    }

    #[test]
    fn task_without_predecessors_starts_at_zero() {
        let schedule = compute(&[leaf("a", 5)]);
        let a = schedule.get("a").unwrap();
        assert_eq!(a.early_start, 0);
        assert_eq!(a.early_finish, 4);
        assert_eq!(a.total_float, 0);
        assert!(a.is_critical);
    }

    #[test]
    fn finish_to_start_chain_is_fully_critical() {
        let tasks = vec![
            leaf("a", 5),
            leaf("b", 3).with_predecessor("a", DependencyType::FS, 0),
            leaf("c", 2).with_predecessor("b", DependencyType::FS, 0),
        ];
        let schedule = compute(&tasks);

        let a = schedule.get("a").unwrap();
        let b = schedule.get("b").unwrap();
        let c = schedule.get("c").unwrap();
        assert_eq!((a.early_start, a.early_finish), (0, 4));
        assert_eq!((b.early_start, b.early_finish), (4, 6));
        assert_eq!((c.early_start, c.early_finish), (6, 7));
        assert_eq!(schedule.project_end, 7);
        for e in [a, b, c] {
            assert_eq!(e.total_float, 0);
            assert!(e.is_critical);
        }
    }

    #[test]
    fn declaration_order_does_not_matter() {
        let forward = vec![
            leaf("a", 5),
            leaf("b", 3).with_predecessor("a", DependencyType::FS, 0),
        ];
        let backward = vec![
            leaf("b", 3).with_predecessor("a", DependencyType::FS, 0),
            leaf("a", 5),
        ];
        let s1 = compute(&forward);
        let s2 = compute(&backward);
        assert_eq!(s1.get("b"), s2.get("b"));
        assert_eq!(s1.project_end, s2.project_end);
    }

    #[test]
    fn dangling_side_branch_has_positive_float() {
        let tasks = vec![
            leaf("a", 5),
            leaf("b", 3).with_predecessor("a", DependencyType::FS, 0),
            leaf("d", 1).with_predecessor("a", DependencyType::FS, 0),
        ];
        let schedule = compute(&tasks);

        let b = schedule.get("b").unwrap();
        let d = schedule.get("d").unwrap();
        assert!(b.is_critical);
        assert!(schedule.is_critical("a"));
        // d has no successors, so its late finish stays at project end.
        assert_eq!(d.late_finish, schedule.project_end);
        assert_eq!(d.total_float, schedule.project_end - d.early_finish);
        assert!(d.total_float > 0);
        assert!(!d.is_critical);
    }

    #[test]
    fn positive_lag_delays_successor() {
        let tasks = vec![
            leaf("a", 5),
            leaf("b", 3).with_predecessor("a", DependencyType::FS, 2),
        ];
        let schedule = compute(&tasks);
        assert_eq!(schedule.get("b").unwrap().early_start, 6);
    }

    #[test]
    fn negative_lag_overlaps_but_never_before_project_start() {
        let tasks = vec![
            leaf("a", 5),
            leaf("b", 3).with_predecessor("a", DependencyType::FS, -2),
            leaf("c", 3).with_predecessor("a", DependencyType::FS, -99),
        ];
        let schedule = compute(&tasks);
        assert_eq!(schedule.get("b").unwrap().early_start, 2);
        assert_eq!(schedule.get("c").unwrap().early_start, 0);
    }

    #[test]
    fn start_to_start_ignores_predecessor_duration() {
        let tasks = vec![
            leaf("a", 5),
            leaf("b", 3).with_predecessor("a", DependencyType::SS, 0),
        ];
        let schedule = compute(&tasks);
        assert_eq!(schedule.get("b").unwrap().early_start, 0);
    }

    #[test]
    fn finish_to_finish_aligns_finishes() {
        let tasks = vec![
            leaf("a", 5),
            leaf("b", 2).with_predecessor("a", DependencyType::FF, 0),
        ];
        let schedule = compute(&tasks);
        let b = schedule.get("b").unwrap();
        assert_eq!(b.early_finish, 4);
        assert_eq!(b.early_start, 3);
    }

    #[test]
    fn start_to_finish_constrains_successor_finish() {
        let tasks = vec![
            leaf("a", 5),
            leaf("b", 3).with_predecessor("a", DependencyType::SF, 4),
        ];
        let schedule = compute(&tasks);
        let b = schedule.get("b").unwrap();
        // Successor must finish at the predecessor start plus lag.
        assert_eq!(b.early_finish, 4);
        assert_eq!(b.early_start, 2);
    }

    #[test]
    fn milestone_finishes_the_day_it_starts() {
        let tasks = vec![
            leaf("a", 5),
            Task::milestone("m", "handover", start())
                .with_predecessor("a", DependencyType::FS, 0),
        ];
        let schedule = compute(&tasks);
        let m = schedule.get("m").unwrap();
        assert_eq!(m.early_start, m.early_finish);
        assert_eq!(m.early_start, 4);
    }

    #[test]
    fn cyclic_graph_terminates_with_an_entry_per_task() {
        // Positive-lag two-cycle: the fixed point keeps rising, so only the
        // pass cap stops it. The result must still cover every task.
        let tasks = vec![
            leaf("a", 2).with_predecessor("b", DependencyType::FS, 1),
            leaf("b", 2).with_predecessor("a", DependencyType::FS, 1),
        ];
        let schedule = compute(&tasks);
        assert_eq!(schedule.len(), 2);
        let again = compute(&tasks);
        assert_eq!(schedule.get("a"), again.get("a"));
        assert_eq!(schedule.get("b"), again.get("b"));
    }

    #[test]
    fn early_never_exceeds_late_on_acyclic_input() {
        let tasks = vec![
            leaf("a", 4),
            leaf("b", 2).with_predecessor("a", DependencyType::SS, 1),
            leaf("c", 6).with_predecessor("a", DependencyType::FS, 0),
            leaf("d", 1)
                .with_predecessor("b", DependencyType::FS, 0)
                .with_predecessor("c", DependencyType::FF, 2),
        ];
        let schedule = compute(&tasks);
        for t in &tasks {
            let e = schedule.get(&t.id).unwrap();
            assert!(e.early_start <= e.late_start, "{}", t.id);
            assert!(e.early_finish <= e.late_finish, "{}", t.id);
            assert_eq!(e.total_float, e.late_start - e.early_start);
            assert_eq!(e.is_critical, e.total_float <= 0);
        }
    }
}
