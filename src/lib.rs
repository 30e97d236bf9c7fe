//! Scheduling engine for a browser-based Gantt project planner.
//!
//! The engine owns the task list (a forest ordered by the flat list),
//! keeps WBS codes and summary roll-ups consistent through every mutation,
//! and recomputes a Critical Path Method schedule after each change.
//! Rendering, persistence, and remote sync live outside this crate and
//! drive it through [`store::ProjectStore`] natively, or through the
//! exported `GanttEngine` class from JavaScript.
//!
//! ## Usage from JavaScript
//!
//! ```javascript
//! import init, { GanttEngine } from 'gantt_engine';
//!
//! await init();
//! const engine = new GanttEngine('my-project');
//! engine.load(projectJson);
//! const id = engine.add_task(null, null);
//! engine.set_predecessors(id, '1FS+2');
//! const schedule = engine.schedule();
//! ```

pub mod cpm;
pub mod dates;
pub mod log;
pub mod predecessor;
pub mod store;
pub mod types;
pub mod wbs;

#[cfg(target_arch = "wasm32")]
mod bindings;

#[cfg(target_arch = "wasm32")]
pub use bindings::GanttEngine;

pub use store::ProjectStore;
pub use types::{ProjectData, Schedule, StoreEvent, Task};
