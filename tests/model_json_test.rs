use montoro::application::services::extract_model_json;
use serde_json::json;

#[test]
fn given_strict_json_when_parsing_then_returns_object() {
    let raw = r#"{"questions": [{"id": "q1", "text": "¿Cuándo?"}]}"#;

    let value = extract_model_json(raw).expect("strict JSON must parse");
    assert_eq!(value["questions"][0]["id"], json!("q1"));
}

#[test]
fn given_leading_and_trailing_prose_when_parsing_then_extracts_object() {
    let raw = "Claro, aquí está el resultado:\n{\"questions\": []}\nEspero que sirva.";

    let value = extract_model_json(raw).expect("wrapped JSON must parse");
    assert!(value["questions"].as_array().unwrap().is_empty());
}

#[test]
fn given_fenced_code_block_when_parsing_then_extracts_object() {
    let raw = "```json\n{\"chunk_id\": 3, \"answers\": [{\"id\": \"q2\", \"answer\": \"Sí\"}]}\n```";

    let value = extract_model_json(raw).expect("fenced JSON must parse");
    assert_eq!(value["chunk_id"], json!(3));
}

#[test]
fn given_braces_inside_strings_when_parsing_then_depth_tracking_ignores_them() {
    let raw = r#"prefijo {"answer": "usa {llaves} y \"comillas\" internas", "ok": true} sufijo"#;

    let value = extract_model_json(raw).expect("braces in strings must not break scanning");
    assert_eq!(value["ok"], json!(true));
}

#[test]
fn given_escaped_quote_before_brace_when_parsing_then_string_boundary_respected() {
    let raw = r#"{"text": "termina con \\" , "n": 1}"#;

    let value = extract_model_json(raw).expect("escape handling");
    assert_eq!(value["n"], json!(1));
}

#[test]
fn given_non_json_input_when_parsing_then_returns_none() {
    assert!(extract_model_json("no hay JSON por ningún lado").is_none());
    assert!(extract_model_json("").is_none());
    assert!(extract_model_json("{rota sin cerrar").is_none());
}

#[test]
fn given_top_level_array_when_parsing_then_returns_none() {
    assert!(extract_model_json("[1, 2, 3]").is_none());
}
