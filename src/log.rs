//! Console logging that works in the browser and natively.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    pub fn log(s: &str);
}

#[cfg(not(target_arch = "wasm32"))]
pub fn log(s: &str) {
    eprintln!("{s}");
}

/// Log macro for console output
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => ($crate::log::log(&format_args!($($t)*).to_string()))
}
