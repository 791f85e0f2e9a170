use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::tools::{require_str, ParamKind, ParamSpec, Tool, ToolError, ToolSpec};

const DEFAULT_MAX_RESULTS: u32 = 50;
const MANY_MAX_RESULTS: u32 = 100;
const FEW_MAX_RESULTS: u32 = 25;
const MAX_FILENAME_LEN: usize = 60;

/// Structured form of a natural-language literature query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParsedPubmedQuery {
    pub authors: Vec<String>,
    pub topics: Vec<String>,
    pub start_date: String,
    pub end_date: String,
    pub max_results: u32,
    pub filename: String,
}

/// Deterministic PubMed-style query parser: extracts authors, the topic
/// phrase, an absolute date window, and a result cap from plain English.
/// The reference year is fixed at construction so parses are repeatable.
#[derive(Clone, Copy, Debug)]
pub struct ParsePubmedQuery {
    current_year: i32,
}

impl ParsePubmedQuery {
    pub fn new(current_year: i32) -> Self {
        Self { current_year }
    }

    pub fn parse(&self, query: &str) -> ParsedPubmedQuery {
        let tokens: Vec<String> =
            query.split_whitespace().map(|token| trim_punctuation(token).to_string()).collect();
        let lower: Vec<String> = tokens.iter().map(|token| token.to_ascii_lowercase()).collect();

        let window = extract_date_window(&lower, self.current_year);
        let authors = extract_authors(&tokens, &lower);
        let topics = extract_topics(&tokens, &lower);
        let max_results = extract_max_results(&lower);

        let (start_date, end_date) = match window {
            Some((start, end)) => (format!("{start}/01/01"), format!("{end}/12/31")),
            None => (String::new(), String::new()),
        };

        let filename = build_filename(topics.first().map(String::as_str), &authors, window);

        ParsedPubmedQuery { authors, topics, start_date, end_date, max_results, filename }
    }
}

#[async_trait]
impl Tool for ParsePubmedQuery {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "parse_pubmed_query".to_string(),
            description:
                "Parses a natural-language literature query into authors, topics, a date window, and a result cap."
                    .to_string(),
            params: vec![ParamSpec::required("query", ParamKind::String)],
        }
    }

    async fn execute(&self, args: &serde_json::Map<String, Value>) -> Result<Value, ToolError> {
        let query = require_str(args, "query", "parse_pubmed_query")?;
        if query.trim().is_empty() {
            return Err(ToolError::Domain {
                tool: "parse_pubmed_query".to_string(),
                reason: "query must not be empty".to_string(),
            });
        }

        let parsed = self.parse(query);
        serde_json::to_value(&parsed).map_err(|error| ToolError::Execution {
            tool: "parse_pubmed_query".to_string(),
            reason: error.to_string(),
        })
    }
}

fn trim_punctuation(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '-')
}

fn is_year(token: &str) -> Option<i32> {
    if token.len() == 4 && token.chars().all(|c| c.is_ascii_digit()) {
        token.parse().ok().filter(|year| (1800..=2200).contains(year))
    } else {
        None
    }
}

fn extract_date_window(lower: &[String], current_year: i32) -> Option<(i32, i32)> {
    // Explicit "2015 to 2020" range.
    for window in lower.windows(3) {
        if let [start, middle, end] = window {
            if middle == "to" {
                if let (Some(start), Some(end)) = (is_year(start), is_year(end)) {
                    return Some((start, end));
                }
            }
        }
    }

    // "between 2015 and 2020".
    for window in lower.windows(4) {
        if let [between, start, and, end] = window {
            if between == "between" && and == "and" {
                if let (Some(start), Some(end)) = (is_year(start), is_year(end)) {
                    return Some((start, end));
                }
            }
        }
    }

    // "since 2020".
    for window in lower.windows(2) {
        if let [since, year] = window {
            if since == "since" {
                if let Some(start) = is_year(year) {
                    return Some((start, current_year));
                }
            }
        }
    }

    // "last 5 years" / "past 5 years".
    for window in lower.windows(3) {
        if let [qualifier, count, unit] = window {
            if (qualifier == "last" || qualifier == "past")
                && (unit == "years" || unit == "year")
            {
                if let Ok(count) = count.parse::<i32>() {
                    return Some((current_year - count, current_year));
                }
            }
        }
    }

    // "past decade".
    for window in lower.windows(2) {
        if let [past, decade] = window {
            if past == "past" && decade == "decade" {
                return Some((current_year - 10, current_year));
            }
        }
    }

    if lower.iter().any(|token| token == "recent") {
        return Some((current_year - 3, current_year));
    }

    None
}

fn extract_authors(tokens: &[String], lower: &[String]) -> Vec<String> {
    let mut authors = Vec::new();

    let Some(by_index) = lower.iter().position(|token| token == "by") else {
        return authors;
    };

    let mut index = by_index + 1;
    while index < tokens.len() {
        let token = &tokens[index];
        if lower[index] == "and" {
            index += 1;
            continue;
        }
        if token.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            authors.push(token.clone());
            index += 1;
        } else {
            break;
        }
    }

    authors
}

const TOPIC_STOP_WORDS: &[&str] = &["from", "since", "between", "during", "over", "in"];

fn extract_topics(tokens: &[String], lower: &[String]) -> Vec<String> {
    let phrase = if let Some(marker) =
        lower.iter().position(|token| token == "on" || token == "about")
    {
        collect_phrase(&tokens[marker + 1..], &lower[marker + 1..])
    } else {
        fallback_phrase(tokens, lower)
    };

    if phrase.is_empty() {
        return Vec::new();
    }

    let mut topics = vec![phrase.clone()];
    let lowered = phrase.to_ascii_lowercase();
    if lowered.split_whitespace().any(|word| word == "covid") {
        topics.push(replace_word(&phrase, "COVID", "COVID-19"));
    }
    topics
}

fn collect_phrase(tokens: &[String], lower: &[String]) -> String {
    let mut words = Vec::new();
    for (token, low) in tokens.iter().zip(lower.iter()) {
        if TOPIC_STOP_WORDS.contains(&low.as_str()) || is_year(low).is_some() {
            break;
        }
        words.push(token.clone());
    }
    words.join(" ")
}

const FILLER_WORDS: &[&str] = &[
    "papers", "paper", "articles", "article", "many", "few", "the", "a", "last", "past", "years",
    "year", "decade", "recent", "from", "since", "to", "between", "and", "during", "over", "in",
];

fn fallback_phrase(tokens: &[String], lower: &[String]) -> String {
    let by_index = lower.iter().position(|token| token == "by");

    let mut words = Vec::new();
    let mut index = 0;
    while index < tokens.len() {
        // Skip the "by <Name> and <Name>" author clause entirely.
        if Some(index) == by_index {
            index += 1;
            while index < tokens.len()
                && (lower[index] == "and"
                    || tokens[index].chars().next().is_some_and(|c| c.is_ascii_uppercase()))
            {
                index += 1;
            }
            continue;
        }

        let low = &lower[index];
        if FILLER_WORDS.contains(&low.as_str())
            || is_year(low).is_some()
            || low.chars().all(|c| c.is_ascii_digit())
        {
            index += 1;
            continue;
        }

        words.push(tokens[index].clone());
        index += 1;
    }

    words.join(" ")
}

fn replace_word(phrase: &str, word: &str, replacement: &str) -> String {
    phrase
        .split_whitespace()
        .map(|token| if token.eq_ignore_ascii_case(word) { replacement } else { token })
        .collect::<Vec<_>>()
        .join(" ")
}

const RESULT_UNITS: &[&str] = &["papers", "studies", "articles", "results", "records"];

fn extract_max_results(lower: &[String]) -> u32 {
    for window in lower.windows(2) {
        if let [count, unit] = window {
            if RESULT_UNITS.contains(&unit.as_str()) {
                if let Ok(count) = count.parse::<u32>() {
                    return count;
                }
            }
        }
    }

    if lower.iter().any(|token| token == "many") {
        return MANY_MAX_RESULTS;
    }
    if lower.iter().any(|token| token == "few") {
        return FEW_MAX_RESULTS;
    }

    DEFAULT_MAX_RESULTS
}

fn build_filename(topic: Option<&str>, authors: &[String], window: Option<(i32, i32)>) -> String {
    let mut parts = Vec::new();

    if let Some(topic) = topic {
        let slug = sanitize(topic);
        if !slug.is_empty() {
            parts.push(slug);
        }
    }
    for author in authors {
        let slug = sanitize(author);
        if !slug.is_empty() {
            parts.push(slug);
        }
    }
    if let Some((start, end)) = window {
        parts.push(format!("{start}-{end}"));
    }

    if parts.is_empty() {
        parts.push("pubmed_query".to_string());
    }

    let mut stem = parts.join("_");
    let budget = MAX_FILENAME_LEN.saturating_sub("data/".len() + ".csv".len());
    if stem.len() > budget {
        stem.truncate(budget);
        while stem.ends_with('_') || stem.ends_with('-') {
            stem.pop();
        }
    }

    format!("data/{stem}.csv")
}

fn sanitize(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '_' {
            if !slug.ends_with('_') {
                slug.push('_');
            }
        }
    }
    slug.trim_matches('_').to_string()
}
