//! Response parser
//!
//! Extracts structured envelopes from free-form model output. The model is not a
//! reliable serializer: it may wrap JSON in prose or code fences, or leave a
//! trailing comma or closing bracket out. Candidates are located by a
//! string-aware balanced-bracket scan, parsed leniently, and only then
//! validated strictly.

use crate::models::{ParsedSummary, ParsedTranslation, ResponseMetadata};
use crate::utils::error::{helpers, AppError, AppResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").expect("valid regex"));

static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("valid regex"));

/// Field paths holding a translation, most specific first
const TARGET_PATHS: &[&[&str]] = &[
    &["content", "target"],
    &["content", "translation"],
    &["target"],
    &["translation"],
];

const SOURCE_PATHS: &[&[&str]] = &[&["content", "source"], &["source"]];

const SUMMARY_PATHS: &[&[&str]] = &[&["content", "summary"], &["summary"]];

/// Keys under which a batch array may be wrapped
const BATCH_WRAPPERS: &[&str] = &["translations", "results", "items", "data"];

/// Per-item text fields inside a batch array
const ITEM_TEXT_PATHS: &[&[&str]] = &[&["target"], &["translation"], &["text"], &["summary"]];

/// Lenient parses tried per scanned text before giving up
const MAX_PARSE_ATTEMPTS: usize = 64;

/// Outcome of scanning from one opening bracket
enum Scan {
    /// Balanced substring ending at this byte offset (exclusive)
    Closed(usize),
    /// Input ended first; these closers would balance it
    Unclosed(String),
    /// A closer did not match its opener
    Mismatch,
}

/// Defensive extraction of translation, summary and batch payloads
pub struct ResponseParser;

impl ResponseParser {
    /// Parse a `{content: {source, target}, metadata}` envelope
    pub fn parse_translation_response(raw: &str) -> AppResult<ParsedTranslation> {
        let objects = Self::object_candidates(raw);
        if objects.is_empty() {
            return Err(helpers::invalid_response("no JSON object found in response", raw));
        }

        for value in &objects {
            if let Some(target) = first_text(value, TARGET_PATHS) {
                return Ok(ParsedTranslation {
                    source: first_text(value, SOURCE_PATHS),
                    target,
                    metadata: metadata_of(value),
                });
            }
        }

        debug!("Translation envelope parsed but target is missing or empty");
        Err(AppError::EmptyTranslation { raw: raw.to_string() })
    }

    /// Parse a `{content: {source, summary}, metadata}` envelope
    pub fn parse_summary_response(raw: &str) -> AppResult<ParsedSummary> {
        let objects = Self::object_candidates(raw);
        if objects.is_empty() {
            return Err(helpers::invalid_response("no JSON object found in response", raw));
        }

        for value in &objects {
            if let Some(summary) = first_text(value, SUMMARY_PATHS) {
                return Ok(ParsedSummary {
                    source: first_text(value, SOURCE_PATHS),
                    summary,
                    metadata: metadata_of(value),
                });
            }
        }

        debug!("Summary envelope parsed but summary is missing or empty");
        Err(AppError::EmptySummary { raw: raw.to_string() })
    }

    /// Parse per-item results of a combined prompt
    ///
    /// Succeeds only when exactly the indices `0..expected` are recovered with
    /// non-empty text. Anything else is [`AppError::BatchMismatch`], which callers
    /// treat as a signal to fall back to per-item requests.
    pub fn parse_batch_response(raw: &str, expected: usize) -> AppResult<BTreeMap<usize, String>> {
        let candidates = Self::extract_json(raw);
        if candidates.is_empty() {
            return Err(helpers::invalid_response("no JSON payload found in batch response", raw));
        }

        let mut best = 0;
        for value in &candidates {
            let Some(items) = batch_items(value) else {
                continue;
            };
            let items = rebase_one_based(items, expected);
            if items.len() == expected && items.keys().copied().eq(0..expected) {
                return Ok(items);
            }
            best = best.max(items.len());
        }

        Err(AppError::BatchMismatch {
            expected,
            actual: best,
        })
    }

    /// Every JSON value recoverable from `raw`, fenced blocks first
    pub fn extract_json(raw: &str) -> Vec<Value> {
        let mut found = Vec::new();

        for fence in CODE_FENCE.captures_iter(raw) {
            if let Some(body) = fence.get(1) {
                found.extend(scan_candidates(body.as_str()));
            }
        }

        // An unterminated fence leaves its opening marker in the text; the scan
        // below still finds the payload after it.
        found.extend(scan_candidates(raw));

        if found.is_empty() {
            if let Some(value) = parse_lenient(raw.trim()) {
                found.push(value);
            }
        }
        found
    }

    fn object_candidates(raw: &str) -> Vec<Value> {
        Self::extract_json(raw)
            .into_iter()
            .filter(Value::is_object)
            .collect()
    }
}

/// Scan `text` for top-level JSON objects and arrays
///
/// Runs in linear time on adversarial input: nested openers reuse the outcome
/// recorded by the enclosing scan, only the first unclosed run is repaired, and
/// parse attempts are capped.
fn scan_candidates(text: &str) -> Vec<Value> {
    let mut found = Vec::new();
    let mut nested: HashMap<usize, Option<usize>> = HashMap::new();
    let mut repair_tried = false;
    let mut attempts = 0;
    let mut start = 0;

    while let Some(offset) = text[start..].find(|c: char| c == '{' || c == '[') {
        let open = start + offset;
        start = open + 1;

        let scan = match nested.get(&open) {
            Some(Some(end)) => Scan::Closed(*end),
            // Enclosed in a run already reported as mismatched or unclosed
            Some(None) => continue,
            None => balanced_end(text, open, &mut nested),
        };

        match scan {
            Scan::Closed(end) => {
                attempts += 1;
                if let Some(value) = parse_lenient(&text[open..end]) {
                    found.push(value);
                    start = end;
                }
            }
            Scan::Unclosed(closers) if !repair_tried => {
                repair_tried = true;
                attempts += 1;
                let mut repaired = text[open..].trim_end().to_string();
                repaired.push_str(&closers);
                if let Some(value) = parse_lenient(&repaired) {
                    found.push(value);
                    break;
                }
            }
            Scan::Unclosed(_) | Scan::Mismatch => {}
        }

        if attempts >= MAX_PARSE_ATTEMPTS {
            debug!("Giving up JSON scan after {} parse attempts", attempts);
            break;
        }
    }

    found
}

/// Find where the bracket opened at `open` is closed, ignoring brackets in strings
///
/// Every opener met on the way is recorded in `nested`: `Some(end)` when it
/// closed cleanly, `None` when it was still open at a mismatch or at the end of
/// the input. A fresh scan from that opener would reach the same verdict.
fn balanced_end(text: &str, open: usize, nested: &mut HashMap<usize, Option<usize>>) -> Scan {
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[open..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => stack.push(('}', open + offset)),
            '[' => stack.push((']', open + offset)),
            '}' | ']' => match stack.pop() {
                Some((closer, at)) if closer == ch => {
                    let end = open + offset + ch.len_utf8();
                    if stack.is_empty() {
                        return Scan::Closed(end);
                    }
                    nested.insert(at, Some(end));
                }
                popped => {
                    stack.extend(popped);
                    mark_unclosed(&stack, open, nested);
                    return Scan::Mismatch;
                }
            },
            _ => {}
        }
    }

    mark_unclosed(&stack, open, nested);
    let mut tail = String::new();
    if in_string {
        tail.push('"');
    }
    tail.extend(stack.iter().rev().map(|(closer, _)| closer));
    Scan::Unclosed(tail)
}

fn mark_unclosed(stack: &[(char, usize)], open: usize, nested: &mut HashMap<usize, Option<usize>>) {
    for &(_, at) in stack.iter().filter(|(_, at)| *at != open) {
        nested.insert(at, None);
    }
}

/// Strict parse, then a retry with trailing commas removed
fn parse_lenient(candidate: &str) -> Option<Value> {
    serde_json::from_str(candidate).ok().or_else(|| {
        let cleaned = TRAILING_COMMA.replace_all(candidate, "$1");
        serde_json::from_str(&cleaned).ok()
    })
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

/// First string at one of `paths` with visible content, kept verbatim
fn first_text(value: &Value, paths: &[&[&str]]) -> Option<String> {
    paths
        .iter()
        .filter_map(|path| lookup(value, path))
        .filter_map(Value::as_str)
        .find(|text| !text.trim().is_empty())
        .map(str::to_string)
}

fn metadata_of(value: &Value) -> ResponseMetadata {
    value
        .get("metadata")
        .filter(|metadata| metadata.is_object())
        .and_then(|metadata| serde_json::from_value(metadata.clone()).ok())
        .unwrap_or_default()
}

/// Index → text pairs from any supported batch shape
fn batch_items(value: &Value) -> Option<BTreeMap<usize, String>> {
    match value {
        Value::Array(items) => Some(array_items(items)),
        Value::Object(map) => {
            if let Some(items) = BATCH_WRAPPERS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_array))
            {
                return Some(array_items(items));
            }

            // Keyed object: {"0": "...", "1": "..."}
            let mut keyed = BTreeMap::new();
            for (key, item) in map {
                let index = key.trim().parse::<usize>().ok()?;
                if let Some(text) = item_text(item) {
                    keyed.insert(index, text);
                }
            }
            if keyed.is_empty() {
                None
            } else {
                Some(keyed)
            }
        }
        _ => None,
    }
}

fn array_items(items: &[Value]) -> BTreeMap<usize, String> {
    let mut out = BTreeMap::new();
    for (position, item) in items.iter().enumerate() {
        let index = item
            .get("index")
            .or_else(|| item.get("id"))
            .and_then(|index| match index {
                Value::Number(n) => n.as_u64().map(|n| n as usize),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .unwrap_or(position);

        if let Some(text) = item_text(item) {
            out.insert(index, text);
        }
    }
    out
}

fn item_text(item: &Value) -> Option<String> {
    match item {
        Value::String(text) => Some(text.clone()).filter(|text| !text.trim().is_empty()),
        Value::Object(_) => {
            first_text(item, ITEM_TEXT_PATHS).or_else(|| first_text(item, TARGET_PATHS))
        }
        _ => None,
    }
}

/// Models sometimes number items from 1; shift when that is unambiguous
fn rebase_one_based(items: BTreeMap<usize, String>, expected: usize) -> BTreeMap<usize, String> {
    if expected > 0 && items.len() == expected && items.keys().copied().eq(1..=expected) {
        items.into_iter().map(|(index, text)| (index - 1, text)).collect()
    } else {
        items
    }
}
