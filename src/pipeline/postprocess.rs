//! Post-processing: deterministic cleanup of converter output.
//!
//! Both conversion paths feed through [`clean_markdown`]: the pdfium text
//! layer arrives with `\r\n` line breaks and ragged trailing spaces, and
//! vision-model transcriptions sometimes arrive wrapped in a ```` ```markdown ````
//! fence or with table rows missing their separator.
//!
//! Rule order matters: line endings are normalised before per-line trimming,
//! and fences are stripped before table repair so the first table row is
//! seen as a row.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules.
///
/// 1. Strip an outer ```` ```markdown ```` fence
/// 2. CRLF / CR → LF
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ blank lines down to 2
/// 5. Remove invisible Unicode (zero-width spaces, BOM, soft hyphen)
/// 6. Insert missing GFM table separator rows (only when `repair_tables`)
/// 7. End with exactly one newline
pub fn clean_markdown(input: &str, repair_tables: bool) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = remove_invisible_chars(&s);
    let s = if repair_tables { fix_broken_tables(&s) } else { s };
    ensure_final_newline(&s)
}

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?\n(.*)\n```\s*$").unwrap());

fn strip_outer_fence(input: &str) -> String {
    match RE_OUTER_FENCE.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_RUN.replace_all(input, "\n\n\n").into_owned()
}

fn remove_invisible_chars(input: &str) -> String {
    input.replace(['\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}'], "")
}

/// Insert a `| --- |` separator after a header row that lacks one.
fn fix_broken_tables(input: &str) -> String {
    let lines: Vec<&str> = input.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len() + 4);
    let mut in_table = false;

    for (i, line) in lines.iter().enumerate() {
        out.push((*line).to_string());
        if !is_table_row(line) {
            in_table = false;
            continue;
        }
        if in_table {
            continue;
        }
        in_table = true;
        if is_separator_row(line) {
            continue;
        }
        let next = lines.get(i + 1).copied().unwrap_or("");
        if is_table_row(next) && !is_separator_row(next) {
            let cols = line.trim().matches('|').count().saturating_sub(1).max(1);
            let sep: String = std::iter::once("|")
                .chain(std::iter::repeat_n(" --- |", cols))
                .collect();
            out.push(sep);
        }
    }
    out.join("\n")
}

fn is_table_row(line: &str) -> bool {
    let t = line.trim();
    t.len() > 2 && t.starts_with('|') && t.ends_with('|')
}

fn is_separator_row(line: &str) -> bool {
    let t = line.trim();
    t.starts_with('|') && t.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}
