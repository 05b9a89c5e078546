use serde_json::{Map, Value};

use crate::domain::{PartialAnswer, Question};

/// Prompt assembly. Section layout is shared by every call the pipeline
/// makes: `[SYSTEM]`, `[PROMPT_BASE]`, then the call-specific sections.

fn render_params(params: &Map<String, Value>) -> String {
    serde_json::to_string(params).unwrap_or_else(|_| "{}".to_string())
}

fn push_common(parts: &mut Vec<String>, system_text: &str, base_prompt: &str) {
    if !system_text.trim().is_empty() {
        parts.push(format!("[SYSTEM]\n{}\n", system_text.trim()));
    }
    if !base_prompt.trim().is_empty() {
        parts.push(format!("[PROMPT_BASE]\n{}\n", base_prompt.trim()));
    }
}

/// Whole-document prompt with the input text inlined.
pub fn build_prompt(
    system_text: &str,
    base_prompt: &str,
    input_text: &str,
    params: &Map<String, Value>,
) -> String {
    let mut parts = Vec::new();
    push_common(&mut parts, system_text, base_prompt);
    if !input_text.trim().is_empty() {
        parts.push(format!("[INPUT]\n{}\n", input_text.trim()));
    }
    if !params.is_empty() {
        parts.push(format!("[PARAMS]\n{}\n", render_params(params)));
    }
    parts.join("\n").trim().to_string()
}

/// Whole-document prompt when the PDF rides along as an attachment.
pub fn build_attachment_prompt(
    system_text: &str,
    base_prompt: &str,
    params: &Map<String, Value>,
) -> String {
    let mut parts = Vec::new();
    push_common(&mut parts, system_text, base_prompt);
    if !params.is_empty() {
        parts.push(format!("[PARAMS]\n{}\n", render_params(params)));
    }
    parts.push("Usa únicamente el/los PDF(s) adjunto(s) como fuente. No inventes.".to_string());
    parts.join("\n").trim().to_string()
}

/// Detection instruction for the sampled pages. Asks for strict JSON capped
/// at `max_questions` entries.
pub fn detection_prompt(max_questions: usize) -> String {
    format!(
        r#"Eres un extractor de 'Preguntas de regreso' en documentos legales.
Busca secciones y encabezados que indiquen preguntas para el cliente, seguimiento o back questions.
Sin inventar, devuelve JSON estricto:

{{
  "questions": [
    {{"id": "q1", "text": "<pregunta exactamente como aparece>", "page_hint": <int|null>, "section_heading": "<encabezado_o_null>"}}
  ]
}}

Reglas:
- Incluye solo preguntas (frases terminadas en '?', bullets con intención interrogativa, o marcadas bajo encabezados relevantes).
- Acepta variantes: "Preguntas de regreso", "Preguntas de seguimiento", "Preguntas para el cliente", "Seguimiento", "Back questions", "Follow-up", etc.
- 'page_hint' si el texto sugiere la página; si no, null.
- Máximo {max_questions} preguntas."#
    )
}

/// Map-step instruction: answer only the routed questions, only with
/// evidence found in this chunk, as strict JSON.
pub fn map_prompt(
    system_text: &str,
    base_prompt: &str,
    chunk_index: usize,
    chunk_total: usize,
    chunk_text: &str,
    questions: &[Question],
) -> String {
    let question_lines: Vec<String> = questions
        .iter()
        .map(|q| format!("- {}: {}", q.id, q.text.trim()))
        .collect();

    let mut parts = Vec::new();
    push_common(&mut parts, system_text, base_prompt);
    parts.push(format!(
        "[INPUT_CHUNK {}/{}]\n{}\n",
        chunk_index + 1,
        chunk_total,
        chunk_text.trim()
    ));
    parts.push(format!("[PREGUNTAS]\n{}\n", question_lines.join("\n")));
    parts.push(format!(
        r#"Responde ÚNICAMENTE las preguntas listadas que tengan evidencia en este fragmento.
Omite las preguntas sin evidencia; su ausencia es válida. No inventes.
Devuelve JSON estricto:

{{"chunk_id": {chunk_index}, "answers": [{{"id": "<id>", "answer": "<respuesta>"}}]}}"#
    ));
    parts.join("\n").trim().to_string()
}

/// Reduce-step instruction: synthesize one answer strictly from the supplied
/// chunk-level candidates.
pub fn reduce_prompt(
    system_text: &str,
    base_prompt: &str,
    question_text: &str,
    partials: &[PartialAnswer],
) -> String {
    let candidates: Vec<String> = partials
        .iter()
        .map(|p| format!("### CHUNK {}\n{}", p.chunk_index + 1, p.text.trim()))
        .collect();

    let mut parts = Vec::new();
    push_common(&mut parts, system_text, base_prompt);
    parts.push(format!("[PREGUNTA]\n{}\n", question_text.trim()));
    parts.push(format!("[PARTIALS]\n{}\n", candidates.join("\n\n")));
    parts.push(
        "Instrucción: Fusiona los candidatos anteriores en una sola respuesta final, \
         usando únicamente su contenido. No introduzcas información sin fuente."
            .to_string(),
    );
    parts.join("\n").trim().to_string()
}
