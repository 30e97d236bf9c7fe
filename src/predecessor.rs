//! Predecessor token grammar.
//!
//! One token is `<wbs>[<type>][<sign><lag>]` - e.g. `3`, `2FS+1`, `1SS-2`,
//! `4ff`. Tokens are comma-separated. The parser is per-token tolerant: a
//! malformed token is dropped and its siblings still parse, because this
//! text comes straight from an edit field.

use crate::types::{DependencyType, Task, TaskDependency};
use crate::wbs::find_by_wbs;

/// One parsed token, before WBS resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredecessorToken {
    pub wbs: String,
    pub link_type: DependencyType,
    pub lag: i32,
}

/// Parse a single token. Returns `None` on malformed input.
pub fn parse_token(token: &str) -> Option<PredecessorToken> {
    let token = token.trim();

    let wbs_end = token
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(token.len());
    if wbs_end == 0 {
        return None;
    }
    let wbs = &token[..wbs_end];
    let mut rest = &token[wbs_end..];

    let mut link_type = DependencyType::FS;
    if let Some(code) = rest.get(..2) {
        if let Some(t) = DependencyType::parse(code) {
            link_type = t;
            rest = &rest[2..];
        }
    }

    let lag = if rest.is_empty() {
        0
    } else {
        let mut chars = rest.chars();
        let sign = chars.next()?;
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let magnitude: i32 = digits.parse().ok()?;
        match sign {
            '+' => magnitude,
            '-' => -magnitude,
            _ => return None,
        }
    };

    Some(PredecessorToken {
        wbs: wbs.to_string(),
        link_type,
        lag,
    })
}

/// Parse a comma-separated predecessor string and resolve each token's WBS
/// against the current task list. Tokens that fail to parse, fail to
/// resolve, or resolve to `own_id` are discarded silently.
pub fn parse_predecessors(raw: &str, tasks: &[Task], own_id: &str) -> Vec<TaskDependency> {
    let mut deps = Vec::new();
    for token in raw.split(',') {
        let Some(parsed) = parse_token(token) else {
            continue;
        };
        let Some(target) = find_by_wbs(tasks, &parsed.wbs) else {
            continue;
        };
        if target.id == own_id {
            continue;
        }
        deps.push(TaskDependency {
            task_id: target.id.clone(),
            link_type: parsed.link_type,
            lag: parsed.lag,
        });
    }
    deps
}

/// Render a predecessor list back to its display form, e.g. `2FS+1,3`.
/// The FS type and a zero lag are omitted; positive lag carries an explicit
/// `+`. Dependencies on unknown tasks are skipped.
pub fn serialize_predecessors(preds: &[TaskDependency], tasks: &[Task]) -> String {
    let mut parts = Vec::new();
    for p in preds {
        let Some(target) = tasks.iter().find(|t| t.id == p.task_id) else {
            continue;
        };
        let mut s = target.wbs.clone();
        if p.link_type != DependencyType::FS {
            s.push_str(p.link_type.as_str());
        }
        if p.lag > 0 {
            s.push_str(&format!("+{}", p.lag));
        } else if p.lag < 0 {
            s.push_str(&p.lag.to_string());
        }
        parts.push(s);
    }
    parts.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date;
    use crate::wbs::rebuild_wbs;

    fn tok(s: &str) -> PredecessorToken {
        parse_token(s).unwrap()
    }

    #[test]
    fn bare_wbs_defaults_to_fs_zero_lag() {
        assert_eq!(
            tok("3"),
            PredecessorToken {
                wbs: "3".into(),
                link_type: DependencyType::FS,
                lag: 0
            }
        );
    }

    #[test]
    fn full_token_with_type_and_lag() {
        assert_eq!(
            tok("2FS+1"),
            PredecessorToken {
                wbs: "2".into(),
                link_type: DependencyType::FS,
                lag: 1
            }
        );
        assert_eq!(
            tok("1.2SS-2"),
            PredecessorToken {
                wbs: "1.2".into(),
                link_type: DependencyType::SS,
                lag: -2
            }
        );
    }

    #[test]
    fn type_is_case_insensitive_and_whitespace_trimmed() {
        assert_eq!(tok(" 4ff ").link_type, DependencyType::FF);
        assert_eq!(tok("5sf").link_type, DependencyType::SF);
    }

    #[test]
    fn lag_without_type() {
        assert_eq!(tok("7+3").lag, 3);
        assert_eq!(tok("7-3").lag, -3);
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert!(parse_token("").is_none());
        assert!(parse_token("FS").is_none());
        assert!(parse_token("2XX+1").is_none());
        assert!(parse_token("2FS+").is_none());
        assert!(parse_token("2FS1").is_none());
        assert!(parse_token("2FS+1x").is_none());
    }

    fn fixture() -> Vec<Task> {
        let start = parse_date("2026-01-05").unwrap();
        let mut tasks = vec![
            Task::new("a", "A", start, 5),
            Task::new("b", "B", start, 3),
            Task::new("c", "C", start, 2),
        ];
        rebuild_wbs(&mut tasks);
        tasks
    }

    #[test]
    fn bad_token_does_not_abort_siblings() {
        let tasks = fixture();
        let deps = parse_predecessors("1, garbage ,2SS+4", &tasks, "c");
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].task_id, "a");
        assert_eq!(deps[1].task_id, "b");
        assert_eq!(deps[1].link_type, DependencyType::SS);
        assert_eq!(deps[1].lag, 4);
    }

    #[test]
    fn unknown_wbs_and_self_reference_are_dropped() {
        let tasks = fixture();
        // "3" resolves to task c itself, "9" resolves to nothing.
        let deps = parse_predecessors("3,9,1", &tasks, "c");
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].task_id, "a");
    }

    #[test]
    fn serialize_round_trip() {
        let tasks = fixture();
        let deps = parse_predecessors("1FS+2,2SS-1,1FF", &tasks, "c");
        let text = serialize_predecessors(&deps, &tasks);
        assert_eq!(text, "1+2,2SS-1,1FF");
        let reparsed = parse_predecessors(&text, &tasks, "c");
        assert_eq!(reparsed, deps);
        assert_eq!(serialize_predecessors(&reparsed, &tasks), text);
    }

    #[test]
    fn serialize_omits_fs_and_zero_lag() {
        let tasks = fixture();
        let deps = parse_predecessors("1FS+0", &tasks, "c");
        assert_eq!(serialize_predecessors(&deps, &tasks), "1");
    }
}
