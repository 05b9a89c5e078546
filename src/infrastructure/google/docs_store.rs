use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::application::ports::{DocumentStore, DocumentStoreError};
use crate::domain::{Block, QuestionAnswer, parse_blocks};
use crate::infrastructure::transport::{RefreshingClient, send_with_retries};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Insert chunk size for plain writes; large inserts destabilize the API.
const MAX_INSERT_CHARS: usize = 50_000;
/// Flush threshold for accumulated batchUpdate operations.
const MAX_BATCH_OPS: usize = 450;
const INSERT_PAUSE: Duration = Duration::from_millis(150);

/// Google Docs adapter: plain-text reads, chunked writes and native-styled
/// Q/A rendering over the `documents` REST surface.
pub struct GoogleDocsStore {
    client: RefreshingClient,
    endpoint: String,
    access_token: String,
}

impl GoogleDocsStore {
    pub fn new(access_token: String) -> Self {
        Self::with_endpoint("https://docs.googleapis.com".to_string(), access_token)
    }

    pub fn with_endpoint(endpoint: String, access_token: String) -> Self {
        Self {
            client: RefreshingClient::new(REQUEST_TIMEOUT),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    async fn fetch_document(&self, doc_id: &str) -> Result<Value, DocumentStoreError> {
        let url = format!("{}/v1/documents/{}", self.endpoint, doc_id);
        let response = send_with_retries(|attempt| {
            self.client
                .get(attempt)
                .get(&url)
                .bearer_auth(&self.access_token)
                .send()
        })
        .await
        .map_err(|e| DocumentStoreError::Transient(e.to_string()))?;

        if !response.status().is_success() {
            return Err(map_error(doc_id, response).await);
        }

        response
            .json()
            .await
            .map_err(|e| DocumentStoreError::InvalidResponse(e.to_string()))
    }

    async fn batch_update(&self, doc_id: &str, requests: &[Value]) -> Result<(), DocumentStoreError> {
        let url = format!("{}/v1/documents/{}:batchUpdate", self.endpoint, doc_id);
        let body = json!({ "requests": requests });

        let response = send_with_retries(|attempt| {
            self.client
                .get(attempt)
                .post(&url)
                .bearer_auth(&self.access_token)
                .json(&body)
                .send()
        })
        .await
        .map_err(|e| DocumentStoreError::Transient(e.to_string()))?;

        if !response.status().is_success() {
            return Err(map_error(doc_id, response).await);
        }
        Ok(())
    }

    /// Clear the body without touching the root newline.
    fn clear_request(end_index: usize) -> Option<Value> {
        let delete_end = end_index.saturating_sub(1).max(1);
        (delete_end > 1).then(|| {
            json!({
                "deleteContentRange": {
                    "range": { "startIndex": 1, "endIndex": delete_end }
                }
            })
        })
    }
}

async fn map_error(doc_id: &str, response: reqwest::Response) -> DocumentStoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    match status {
        401 | 403 => DocumentStoreError::AccessDenied(doc_id.to_string()),
        404 => DocumentStoreError::NotFound(doc_id.to_string()),
        _ => DocumentStoreError::Transient(format!("HTTP {status}: {body}")),
    }
}

fn collect_text(doc: &Value) -> String {
    let mut out = String::new();
    let Some(content) = doc
        .get("body")
        .and_then(|b| b.get("content"))
        .and_then(Value::as_array)
    else {
        return out;
    };

    for element in content {
        let Some(paragraph_elements) = element
            .get("paragraph")
            .and_then(|p| p.get("elements"))
            .and_then(Value::as_array)
        else {
            continue;
        };
        for pe in paragraph_elements {
            if let Some(text) = pe
                .get("textRun")
                .and_then(|tr| tr.get("content"))
                .and_then(Value::as_str)
            {
                out.push_str(text);
            }
        }
    }
    out
}

fn end_index(doc: &Value) -> usize {
    doc.get("body")
        .and_then(|b| b.get("content"))
        .and_then(Value::as_array)
        .and_then(|content| content.last())
        .and_then(|last| last.get("endIndex"))
        .and_then(Value::as_u64)
        .unwrap_or(1) as usize
}

// Docs indices count UTF-16 code units.
fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Accumulates batchUpdate operations with a running insertion cursor,
/// flushing in bounded batches.
struct DocsBatch<'a> {
    store: &'a GoogleDocsStore,
    doc_id: &'a str,
    requests: Vec<Value>,
    cursor: usize,
}

impl<'a> DocsBatch<'a> {
    fn new(store: &'a GoogleDocsStore, doc_id: &'a str) -> Self {
        Self {
            store,
            doc_id,
            requests: Vec::new(),
            cursor: 1,
        }
    }

    fn insert_text(&mut self, text: &str) -> (usize, usize) {
        let with_newline = format!("{text}\n");
        self.requests.push(json!({
            "insertText": {
                "location": { "index": self.cursor },
                "text": with_newline
            }
        }));
        let start = self.cursor;
        self.cursor += utf16_len(&with_newline);
        (start, self.cursor)
    }

    fn paragraph(&mut self, text: &str, style: Option<&str>) {
        let (start, end) = self.insert_text(text);
        if let Some(style) = style {
            self.requests.push(json!({
                "updateParagraphStyle": {
                    "range": { "startIndex": start, "endIndex": end },
                    "paragraphStyle": { "namedStyleType": style },
                    "fields": "namedStyleType"
                }
            }));
        }
    }

    fn list(&mut self, items: &[String], preset: &str) {
        if items.is_empty() {
            return;
        }
        let start = self.cursor;
        for item in items {
            self.insert_text(item);
        }
        let end = self.cursor;
        self.requests.push(json!({
            "createParagraphBullets": {
                "range": { "startIndex": start, "endIndex": end },
                "bulletPreset": preset
            }
        }));
    }

    /// Internal `##`..`######` headings map to HEADING_3..HEADING_6; the
    /// document-level 1 and 2 are reserved for the title and questions.
    fn heading(&mut self, level: usize, text: &str) {
        let mapped = (level + 1).clamp(3, 6);
        self.paragraph(text, Some(&format!("HEADING_{mapped}")));
    }

    async fn flush(&mut self) -> Result<(), DocumentStoreError> {
        if self.requests.is_empty() {
            return Ok(());
        }
        let requests = std::mem::take(&mut self.requests);
        tracing::debug!(ops = requests.len(), "flushing docs batch");
        self.store.batch_update(self.doc_id, &requests).await
    }

    async fn flush_if_full(&mut self) -> Result<(), DocumentStoreError> {
        if self.requests.len() >= MAX_BATCH_OPS {
            self.flush().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for GoogleDocsStore {
    async fn check_access(&self, doc_id: &str) -> Result<(), DocumentStoreError> {
        let url = format!("{}/v1/documents/{}?fields=documentId", self.endpoint, doc_id);
        let response = send_with_retries(|attempt| {
            self.client
                .get(attempt)
                .get(&url)
                .bearer_auth(&self.access_token)
                .send()
        })
        .await
        .map_err(|e| DocumentStoreError::Transient(e.to_string()))?;

        if !response.status().is_success() {
            return Err(map_error(doc_id, response).await);
        }
        Ok(())
    }

    async fn get_text(&self, doc_id: &str) -> Result<String, DocumentStoreError> {
        let doc = self.fetch_document(doc_id).await?;
        Ok(collect_text(&doc))
    }

    #[tracing::instrument(skip(self, text), fields(chars = text.len()))]
    async fn write(&self, doc_id: &str, text: &str) -> Result<(), DocumentStoreError> {
        let doc = self.fetch_document(doc_id).await?;

        if let Some(clear) = GoogleDocsStore::clear_request(end_index(&doc)) {
            self.batch_update(doc_id, &[clear]).await?;
        }

        let chars: Vec<char> = text.chars().collect();
        let mut cursor = 1usize;
        for (part, window) in chars.chunks(MAX_INSERT_CHARS).enumerate() {
            let chunk: String = window.iter().collect();
            let insert = json!({
                "insertText": { "location": { "index": cursor }, "text": chunk }
            });
            cursor += utf16_len(&chunk);
            self.batch_update(doc_id, &[insert]).await?;
            if chars.len() > MAX_INSERT_CHARS {
                tracing::debug!(part = part + 1, "inserted write chunk");
                tokio::time::sleep(INSERT_PAUSE).await;
            }
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, qas), fields(count = qas.len()))]
    async fn write_answers(
        &self,
        doc_id: &str,
        title: &str,
        qas: &[QuestionAnswer],
    ) -> Result<(), DocumentStoreError> {
        let doc = self.fetch_document(doc_id).await?;

        let mut batch = DocsBatch::new(self, doc_id);
        if let Some(clear) = GoogleDocsStore::clear_request(end_index(&doc)) {
            batch.requests.push(clear);
        }

        batch.paragraph(title, Some("HEADING_1"));

        for (i, qa) in qas.iter().enumerate() {
            batch.paragraph(
                &format!("{}. {}", i + 1, qa.question.trim()),
                Some("HEADING_2"),
            );

            for block in parse_blocks(qa.answer.trim()) {
                match block {
                    Block::Paragraph(text) => batch.paragraph(&text, None),
                    Block::Bullets(items) => batch.list(&items, "BULLET_DISC_CIRCLE_SQUARE"),
                    Block::Numbered(items) => batch.list(&items, "NUMBERED_DECIMAL_ALPHA_ROMAN"),
                    Block::Heading { level, text } => batch.heading(level, &text),
                }
            }

            batch.flush_if_full().await?;
        }

        batch.flush().await
    }

    fn output_link(&self, doc_id: &str) -> String {
        format!("https://docs.google.com/document/d/{doc_id}/edit")
    }
}
