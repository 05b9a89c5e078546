use montoro::application::services::prompts;
use montoro::domain::{PartialAnswer, Question};
use montoro::presentation::config::parse_base_prompt_ids;
use serde_json::{Map, json};

#[test]
fn given_all_sections_when_building_prompt_then_layout_is_ordered() {
    let mut params = Map::new();
    params.insert("visa_type".to_string(), json!("t-visa"));

    let prompt = prompts::build_prompt("Sistema.", "Base.", "Entrada.", &params);

    let system = prompt.find("[SYSTEM]").unwrap();
    let base = prompt.find("[PROMPT_BASE]").unwrap();
    let input = prompt.find("[INPUT]").unwrap();
    let params_at = prompt.find("[PARAMS]").unwrap();
    assert!(system < base && base < input && input < params_at);
    assert!(prompt.contains("visa_type"));
}

#[test]
fn given_blank_sections_when_building_prompt_then_they_are_omitted() {
    let prompt = prompts::build_prompt("  ", "Base.", "", &Map::new());

    assert!(!prompt.contains("[SYSTEM]"));
    assert!(!prompt.contains("[INPUT]"));
    assert!(!prompt.contains("[PARAMS]"));
    assert!(prompt.contains("[PROMPT_BASE]"));
}

#[test]
fn given_attachment_prompt_when_building_then_source_constraint_is_present() {
    let prompt = prompts::build_attachment_prompt("Sistema.", "Base.", &Map::new());

    assert!(prompt.ends_with("Usa únicamente el/los PDF(s) adjunto(s) como fuente. No inventes."));
}

#[test]
fn given_map_prompt_when_building_then_chunk_header_and_contract_are_present() {
    let questions = [
        Question::new("q1", "¿Primera?"),
        Question::new("q2", "¿Segunda?"),
    ];

    let prompt = prompts::map_prompt("s", "b", 1, 4, "texto del fragmento", &questions);

    assert!(prompt.contains("[INPUT_CHUNK 2/4]"));
    assert!(prompt.contains("- q1: ¿Primera?"));
    assert!(prompt.contains(r#""chunk_id": 1"#));
}

#[test]
fn given_reduce_prompt_when_building_then_partials_are_labeled_by_chunk() {
    let partials = [
        PartialAnswer {
            question_id: "q1".to_string(),
            chunk_index: 0,
            text: "primer hallazgo".to_string(),
        },
        PartialAnswer {
            question_id: "q1".to_string(),
            chunk_index: 3,
            text: "segundo hallazgo".to_string(),
        },
    ];

    let prompt = prompts::reduce_prompt("s", "b", "¿Pregunta?", &partials);

    assert!(prompt.contains("### CHUNK 1\nprimer hallazgo"));
    assert!(prompt.contains("### CHUNK 4\nsegundo hallazgo"));
    assert!(prompt.contains("[PREGUNTA]\n¿Pregunta?"));
}

#[test]
fn given_valid_mapping_json_when_parsing_then_keys_are_lowercased() {
    let map = parse_base_prompt_ids(Some(r#"{"T-VISA": "doc-1", "default": "doc-2"}"#));

    assert_eq!(map.get("t-visa"), Some(&"doc-1".to_string()));
    assert_eq!(map.get("default"), Some(&"doc-2".to_string()));
}

#[test]
fn given_invalid_mapping_json_when_parsing_then_empty_map() {
    assert!(parse_base_prompt_ids(Some("{rota")).is_empty());
    assert!(parse_base_prompt_ids(None).is_empty());
}
