//! Oracle prompts and response parsing.
//!
//! All four provider adapters speak plain text completions; the prompt
//! builders and parsers here give them identical behavior, so providers
//! stay interchangeable.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{OracleError, OracleResult};
use crate::traits::oracle::CandidateRecord;
use crate::types::{page::RawPageRecord, schema::Schema};

/// Characters of page text included in a schema-inference sample.
const SAMPLE_TEXT_CHARS: usize = 500;

/// Characters of page text included in an extraction prompt.
const EXTRACT_TEXT_CHARS: usize = 8000;

/// Headings per page included in a schema-inference sample.
const SAMPLE_HEADINGS: usize = 5;

/// Build the one-shot schema inference prompt from a bounded sample.
pub fn format_schema_prompt(sample: &[RawPageRecord], total_pages: usize) -> String {
    let mut prompt = format!(
        "Analyze the following website data and determine the optimal JSON schema \
         for storing it in a database.\n\n\
         The data comes from {total_pages} pages. Here are {} sample pages:\n",
        sample.len()
    );

    for (i, page) in sample.iter().enumerate() {
        prompt.push_str(&format!("\n--- Page {} ---\n", i + 1));
        prompt.push_str(&format!("URL: {}\n", page.source_url));
        prompt.push_str(&format!("Title: {}\n", page.title));
        let headings: Vec<&String> = page.headings.iter().take(SAMPLE_HEADINGS).collect();
        prompt.push_str(&format!(
            "Headings: {}\n",
            serde_json::to_string(&headings).unwrap_or_default()
        ));
        if !page.tables.is_empty() {
            prompt.push_str(&format!("Has {} table(s)\n", page.tables.len()));
        }
        prompt.push_str(&format!(
            "Content sample (first {SAMPLE_TEXT_CHARS} chars): {}...\n",
            truncate_chars(&page.main_text, SAMPLE_TEXT_CHARS)
        ));
    }

    prompt.push_str(
        "\n\nBased on this data, provide:\n\
         1. A description of the content type and structure\n\
         2. Key entities found in the content\n\
         3. A flat mapping of field names to type tags (string, number, boolean, array, object)\n\
         4. Suggested database indexes for searchability\n\n\
         Format your response as a JSON object with these keys:\n\
         - content_type: string describing the type of content\n\
         - entities: array of entity types found\n\
         - schema: object mapping field names to type tags\n\
         - indexes: array of suggested index fields\n\
         - notes: additional observations\n\n\
         Return ONLY the JSON object, no other text.\n",
    );

    prompt
}

/// Build the per-page extraction prompt against a fixed schema.
pub fn format_extraction_prompt(page: &RawPageRecord, schema: &Schema) -> String {
    let mut prompt = format!(
        "Convert the following webpage content into structured JSON data according \
         to the provided schema.\n\n\
         TARGET SCHEMA:\n{}\n\n\
         WEBPAGE DATA:\nURL: {}\nTitle: {}\n\nHeadings:\n{}\n",
        serde_json::to_string_pretty(&schema.fields).unwrap_or_default(),
        page.source_url,
        page.title,
        serde_json::to_string_pretty(&page.headings).unwrap_or_default(),
    );

    if !page.tables.is_empty() {
        prompt.push_str(&format!(
            "\nTables:\n{}\n",
            serde_json::to_string_pretty(&page.tables).unwrap_or_default()
        ));
    }

    prompt.push_str(&format!(
        "\nText Content:\n{}\n\n\
         Extract and structure the data according to the schema. Return ONLY a valid \
         JSON object that follows the schema, no other text.\n\
         Use only the field names declared in the schema. If certain fields cannot \
         be extracted, use null or appropriate empty values.\n",
        truncate_chars(&page.main_text, EXTRACT_TEXT_CHARS)
    ));

    prompt
}

/// Parse a schema-inference completion into a [`Schema`].
pub fn parse_schema_response(response: &str) -> OracleResult<Schema> {
    #[derive(Deserialize)]
    struct SchemaAnalysisResponse {
        #[serde(default)]
        content_type: String,
        #[serde(default)]
        entities: Vec<String>,
        #[serde(default)]
        schema: IndexMap<String, Value>,
        #[serde(default)]
        indexes: Vec<String>,
        #[serde(default)]
        notes: String,
    }

    let body = strip_code_fences(response);
    if body.is_empty() {
        return Err(OracleError::EmptyResponse);
    }

    let parsed: SchemaAnalysisResponse =
        serde_json::from_str(body).map_err(|e| OracleError::MalformedResponse {
            reason: format!("schema analysis is not valid JSON: {e}"),
        })?;

    // Models sometimes return {"type": "...", ...} objects instead of
    // plain type tags; keep just the tag either way.
    let fields = parsed
        .schema
        .into_iter()
        .map(|(name, tag)| (name, type_tag(&tag)))
        .collect();

    Ok(Schema {
        content_type: parsed.content_type,
        entities: parsed.entities,
        fields,
        recommended_indexes: parsed.indexes,
        notes: parsed.notes,
    })
}

/// Parse an extraction completion into a candidate record.
pub fn parse_extraction_response(response: &str) -> OracleResult<CandidateRecord> {
    let body = strip_code_fences(response);
    if body.is_empty() {
        return Err(OracleError::EmptyResponse);
    }

    let value: Value = serde_json::from_str(body).map_err(|e| OracleError::MalformedResponse {
        reason: format!("extraction is not valid JSON: {e}"),
    })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(OracleError::MalformedResponse {
            reason: format!("expected a JSON object, got {}", json_kind(&other)),
        }),
    }
}

/// Strip a surrounding markdown code fence, if any.
pub fn strip_code_fences(response: &str) -> &str {
    let mut body = response.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    } else if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

fn type_tag(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("object")
            .to_string(),
        other => json_kind(other).to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Truncate on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
