use std::fmt::Display;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

/// Resolves after `ms` milliseconds via `setTimeout`.
pub(crate) async fn sleep(ms: i32) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let mut scheduled = Ok(0);
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        scheduled = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
    });
    scheduled?;
    JsFuture::from(promise).await.map(|_| ())
}

/// Best-effort text of a thrown JS value.
pub(crate) fn describe(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    js_sys::Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}

pub(crate) fn to_js(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}
