//! JavaScript-facing engine wrapper.
//!
//! Exposes the store to the browser UI as a `GanttEngine` class. Values
//! cross the boundary via `serde-wasm-bindgen`; change events are forwarded
//! to a JS callback so the rendering and sync layers can react.

use wasm_bindgen::prelude::*;

use crate::dates::parse_date;
use crate::store::ProjectStore;
use crate::types::ProjectData;

fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn js_err(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{context}: {err}"))
}

#[wasm_bindgen]
pub struct GanttEngine {
    store: ProjectStore,
}

#[wasm_bindgen]
impl GanttEngine {
    /// Create an engine holding an empty default project.
    #[wasm_bindgen(constructor)]
    pub fn new(project_id: String) -> GanttEngine {
        set_panic_hook();
        crate::console_log!("[engine] created for project {project_id}");
        GanttEngine {
            store: ProjectStore::new(ProjectData::default_project(&project_id)),
        }
    }

    /// Replace the project wholesale from a JSON document.
    pub fn load(&mut self, json: String) -> Result<(), JsValue> {
        self.store
            .load_json(&json)
            .map_err(|e| js_err("failed to parse project", e))
    }

    pub fn export(&self) -> String {
        self.store.export_json()
    }

    /// Register the change callback. Receives `{ type, id? }` objects.
    pub fn set_on_change(&mut self, callback: js_sys::Function) {
        self.store.on_change(move |event| {
            let payload = serde_wasm_bindgen::to_value(event).unwrap_or(JsValue::NULL);
            let _ = callback.call1(&JsValue::NULL, &payload);
        });
    }

    // === Task mutations ===

    pub fn add_task(&mut self, after_id: Option<String>, parent_id: Option<String>) -> String {
        self.store.add_task(after_id.as_deref(), parent_id.as_deref())
    }

    pub fn update_task(&mut self, id: String, patch: JsValue) -> Result<(), JsValue> {
        let patch: serde_json::Value = serde_wasm_bindgen::from_value(patch)
            .map_err(|e| js_err("failed to parse patch", e))?;
        self.store.update_task(&id, &patch);
        Ok(())
    }

    pub fn delete_task(&mut self, id: String) {
        self.store.delete_task(&id);
    }

    pub fn indent_task(&mut self, id: String) {
        self.store.indent_task(&id);
    }

    pub fn outdent_task(&mut self, id: String) {
        self.store.outdent_task(&id);
    }

    pub fn move_task(&mut self, id: String, after_id: Option<String>) {
        self.store.move_task(&id, after_id.as_deref());
    }

    pub fn toggle_collapse(&mut self, id: String) {
        self.store.toggle_collapse(&id);
    }

    pub fn set_predecessors(&mut self, id: String, raw: String) {
        self.store.set_predecessors_from_text(&id, &raw);
    }

    pub fn predecessor_text(&self, id: String) -> String {
        self.store.predecessor_text(&id)
    }

    // === Reads ===

    pub fn tasks(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.store.tasks()).map_err(|e| js_err("serialize tasks", e))
    }

    pub fn visible_tasks(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.store.visible_tasks())
            .map_err(|e| js_err("serialize tasks", e))
    }

    pub fn schedule(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.store.schedule())
            .map_err(|e| js_err("serialize schedule", e))
    }

    pub fn is_critical(&self, id: String) -> bool {
        self.store.is_critical(&id)
    }

    pub fn is_summary(&self, id: String) -> bool {
        self.store.is_summary(&id)
    }

    pub fn task_count(&self) -> usize {
        self.store.tasks().len()
    }

    // === Milestone markers ===

    pub fn add_milestone(&mut self, title: String, date: String) -> Result<String, JsValue> {
        let date = parse_date(&date).map_err(|e| js_err("bad milestone date", e))?;
        Ok(self.store.add_milestone(&title, date))
    }

    pub fn delete_milestone(&mut self, id: String) {
        self.store.delete_milestone(&id);
    }

    // === Project metadata ===

    pub fn update_project(&mut self, patch: JsValue) -> Result<(), JsValue> {
        let patch: serde_json::Value = serde_wasm_bindgen::from_value(patch)
            .map_err(|e| js_err("failed to parse patch", e))?;
        self.store.update_project(&patch);
        Ok(())
    }
}
