//! Prompts for transcribing image-only pages with a vision model.
//!
//! Only pages without a text layer reach the model, so the prompt is a
//! transcription prompt, not a layout-rewrite prompt. Pictures and formulas
//! are marked with the same HTML-comment placeholders the text-layer path
//! emits, so image splicing and formula counting treat both paths alike.

/// Rules shared by every page-transcription request.
const BASE_RULES: &str = r#"You transcribe a scanned page of a research paper into Markdown.

1. TEXT
   - Transcribe ALL legible text in reading order
   - Keep section headings as # / ## / ### according to their visual level
   - Do not paraphrase, summarise or translate

2. PICTURES
   - Replace every figure, chart or photo with the line <!-- image -->
   - Keep the figure caption as plain text below the placeholder

3. FORMULAS
   - Replace every display equation with the line <!-- formula -->
   - Inline math may stay as plain text

4. IGNORE
   - Page numbers, running headers and footers

5. OUTPUT
   - Output ONLY the Markdown content, without ``` fences or commentary"#;

const TABLE_RULES: &str = r#"

6. TABLES
   - Convert tables to GFM pipe format with a | --- | separator row
   - One table row per line; merge wrapped cell text"#;

const NO_TABLE_RULES: &str = r#"

6. TABLES
   - Transcribe table cells as plain text lines in row order"#;

/// Build the system prompt for one page.
pub fn page_transcription_prompt(table_structure: bool) -> String {
    let tables = if table_structure { TABLE_RULES } else { NO_TABLE_RULES };
    format!("{BASE_RULES}{tables}")
}
