//! Browser smoke tests for the JavaScript facade.

#![cfg(target_arch = "wasm32")]

use js_sys::{Function, Object, Reflect};
use linlog_layout_wasm::LinLogLayoutWasm;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn square() -> LinLogLayoutWasm {
    let mut layout = LinLogLayoutWasm::new();
    layout.add_vertex("a".into(), 0.0, 0.0, 0.0);
    layout.add_vertex("b".into(), 1.0, 0.0, 0.0);
    layout.add_vertex("c".into(), 1.0, 1.0, 0.0);
    layout.add_vertex("d".into(), 0.0, 1.0, 0.0);
    layout.add_edges_from_pairs(&[0, 1, 1, 2, 2, 3, 3, 0]);
    layout
}

fn field(stats: &JsValue, name: &str) -> JsValue {
    Reflect::get(stats, &JsValue::from_str(name)).unwrap()
}

#[wasm_bindgen_test]
fn test_minimize_with_defaults() {
    let mut layout = square();

    let stats = layout.minimize(JsValue::UNDEFINED, None).map_err(JsValue::from).unwrap();

    assert_eq!(field(&stats, "iterationsRun").as_f64(), Some(100.0));
    assert_eq!(field(&stats, "termination").as_string().as_deref(), Some("completed"));
    assert_eq!(layout.get_positions_x_view().length(), 4);
    assert_eq!(layout.get_vertex_z(2), Some(0.0));
}

#[wasm_bindgen_test]
fn test_minimize_with_partial_config() {
    let mut layout = square();
    let config = Object::new();
    Reflect::set(&config, &"iterations".into(), &JsValue::from(5)).unwrap();
    Reflect::set(&config, &"gravitationFactor".into(), &JsValue::from(0.0)).unwrap();

    let stats = layout.minimize(config.into(), None).map_err(JsValue::from).unwrap();

    assert_eq!(field(&stats, "iterationsRun").as_f64(), Some(5.0));
}

#[wasm_bindgen_test]
fn test_throwing_observer_stops_run() {
    let mut layout = square();
    let observer = Function::new_no_args("throw 'closed';");

    let stats = layout.minimize(JsValue::UNDEFINED, Some(observer)).map_err(JsValue::from).unwrap();

    assert_eq!(field(&stats, "iterationsRun").as_f64(), Some(0.0));
    assert_eq!(field(&stats, "termination").as_string().as_deref(), Some("observerClosed"));
}

#[wasm_bindgen_test]
fn test_invalid_config_is_an_error() {
    let mut layout = square();
    let config = Object::new();
    Reflect::set(&config, &"repuExponent".into(), &JsValue::from(1.0)).unwrap();

    assert!(layout.minimize(config.into(), None).is_err());
}
