//! Work-breakdown-structure numbering.

use crate::types::Task;

/// Rebuild every task's `wbs` code in place from parent links and list
/// order. Children of the same parent get consecutive integers starting at
/// 1, in list order; a child's code is `<parent code>.<own index>`.
/// Deterministic and idempotent for an unchanged list.
pub fn rebuild_wbs(tasks: &mut [Task]) {
    assign(tasks, None, "");
}

fn assign(tasks: &mut [Task], parent_id: Option<&str>, prefix: &str) {
    let children: Vec<usize> = tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| t.parent_id.as_deref() == parent_id)
        .map(|(i, _)| i)
        .collect();

    for (n, idx) in children.into_iter().enumerate() {
        let code = if prefix.is_empty() {
            (n + 1).to_string()
        } else {
            format!("{prefix}.{}", n + 1)
        };
        tasks[idx].wbs = code.clone();
        let id = tasks[idx].id.clone();
        assign(tasks, Some(&id), &code);
    }
}

/// Look a task up by its current WBS code.
pub fn find_by_wbs<'a>(tasks: &'a [Task], wbs: &str) -> Option<&'a Task> {
    tasks.iter().find(|t| t.wbs == wbs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date;

    fn task(id: &str, parent: Option<&str>) -> Task {
        let mut t = Task::new(id, id, parse_date("2026-01-05").unwrap(), 1);
        t.parent_id = parent.map(str::to_string);
        t
    }

    #[test]
    fn numbers_roots_and_children_in_list_order() {
        let mut tasks = vec![
            task("a", None),
            task("a1", Some("a")),
            task("a2", Some("a")),
            task("a2x", Some("a2")),
            task("b", None),
        ];
        rebuild_wbs(&mut tasks);

        let codes: Vec<&str> = tasks.iter().map(|t| t.wbs.as_str()).collect();
        assert_eq!(codes, vec!["1", "1.1", "1.2", "1.2.1", "2"]);
    }

    #[test]
    fn interleaved_list_order_still_numbers_by_parent() {
        // Sibling order comes from the flat list, not from grouping.
        let mut tasks = vec![
            task("a", None),
            task("b", None),
            task("a1", Some("a")),
            task("b1", Some("b")),
            task("a2", Some("a")),
        ];
        rebuild_wbs(&mut tasks);

        assert_eq!(find_by_wbs(&tasks, "1.1").unwrap().id, "a1");
        assert_eq!(find_by_wbs(&tasks, "1.2").unwrap().id, "a2");
        assert_eq!(find_by_wbs(&tasks, "2.1").unwrap().id, "b1");
    }

    #[test]
    fn rebuild_is_idempotent() {
        let mut tasks = vec![
            task("a", None),
            task("a1", Some("a")),
            task("b", None),
        ];
        rebuild_wbs(&mut tasks);
        let first: Vec<String> = tasks.iter().map(|t| t.wbs.clone()).collect();
        rebuild_wbs(&mut tasks);
        let second: Vec<String> = tasks.iter().map(|t| t.wbs.clone()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_list_is_a_no_op() {
        let mut tasks: Vec<Task> = Vec::new();
        rebuild_wbs(&mut tasks);
        assert!(tasks.is_empty());
    }
}
