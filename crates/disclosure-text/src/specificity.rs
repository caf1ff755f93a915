//! Specificity prompt and response handling.
//!
//! The completion model judges six specificity markers plus a boilerplate
//! count. This module builds the prompt, parses the model's JSON answer and
//! computes the specificity score. Talking to the model is left to callers.

use disclosure_core::{
    CategoryJudgment, DisclosureError, Result, SpecificityAssessment, SpecificityCategory, Ticker,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Texts shorter than this (after trimming) are not sent for scoring.
pub const MIN_SCORABLE_CHARS: usize = 100;

/// Filing text beyond this many characters is cut from the prompt.
pub const MAX_PROMPT_TEXT_CHARS: usize = 60_000;

/// Scoring instructions; the filing text is appended after the final line.
pub const SPECIFICITY_PROMPT: &str = r#"You are a senior cybersecurity disclosure analyst specialized in financial regulatory filings (SEC 10-K reports). Analyze the report below and score six categories of technical disclosure.

Scoring:
- For each category assign 1 if present and 0 if absent.
- Keywords in the definitions are examples only. Use expert judgment to decide whether other terms, processes or disclosures fit a category.
- The content score is the sum of points divided by 6.

Categories:
Frameworks: specific industry-standard cybersecurity frameworks used by the firm (e.g. NIST CSF, ISO/IEC 27001, TISAX, SOC 2, PCI DSS).
Specific Controls: specific security tools, defensive layers or rigorous processes (e.g. MFA, EDR, SIEM, zero trust architecture, regular penetration testing, encryption protocols).
Named Individuals / Committees: specific roles with named expertise, specific individuals or dedicated oversight bodies (e.g. naming the CISO, a board member with cyber credentials, a cybersecurity governance council).
Quantitative Data: cyber-related numbers or metrics (e.g. daily threat signal counts, number of threat actors tracked, dollar amounts for cyber litigation or insurance, training completion rates).
Product Names: internal or third-party security products or proprietary platforms (e.g. Microsoft Copilot for Security, Palo Alto Prisma, Cortex XSIAM).
Technical Details: granular descriptions of vulnerabilities, incident remediation or architecture (e.g. a command injection vulnerability, a nation-state password spray attack, IT/OT segmentation).

Validation: a category only scores 1 if the disclosure is firm-specific and active. Award no point when the mention is negated ("we do not currently use MFA"), conditional or hypothetical ("if we were to adopt NIST"), or generic ("we follow industry-standard practices" without naming them).

Also judge boilerplate as a seventh category:
LLM_BOILERPLATE: count the generic phrases that could apply to any company regardless of its security posture, for Item 1A and, if present, Item 1C. Score 0 if the disclosure has enough specific, operational content to set it apart from a template.

Respond ONLY with a JSON object in exactly this format, with nothing before or after it:
{
  "frameworks":        {"score": 0, "rationale": "exact quote or specific evidence from text"},
  "specific_controls": {"score": 0, "rationale": "exact quote or specific evidence from text"},
  "named_individuals": {"score": 0, "rationale": "exact quote or specific evidence from text"},
  "quantitative_data": {"score": 0, "rationale": "exact quote or specific evidence from text"},
  "product_names":     {"score": 0, "rationale": "exact quote or specific evidence from text"},
  "technical_details": {"score": 0, "rationale": "exact quote or specific evidence from text"},
  "llm_boilerplate":   {"score": 0, "rationale": "boilerplate phrases in Item 1A and Item 1C"}
}

FILING TEXT:
"#;

/// Builds the full prompt for a filing text.
///
/// Returns `None` when the text is too short to score. Long texts are cut at
/// [`MAX_PROMPT_TEXT_CHARS`] characters.
#[must_use]
pub fn build_prompt(text: &str) -> Option<String> {
    if text.trim().chars().count() < MIN_SCORABLE_CHARS {
        return None;
    }
    let cut = text
        .char_indices()
        .nth(MAX_PROMPT_TEXT_CHARS)
        .map_or(text.len(), |(idx, _)| idx);
    Some(format!("{SPECIFICITY_PROMPT}{}", &text[..cut]))
}

/// Removes surrounding whitespace and a Markdown code fence.
fn strip_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = rest.split("```").next().unwrap_or(rest);
    inner.strip_prefix("json").unwrap_or(inner).trim()
}

fn parse_score(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// Parses a model response into category judgments.
///
/// Categories missing from the response are absent from the map; unknown
/// keys are ignored.
pub fn parse_response(raw: &str) -> Result<BTreeMap<SpecificityCategory, CategoryJudgment>> {
    let object: serde_json::Map<String, Value> = serde_json::from_str(strip_fence(raw))
        .map_err(|e| DisclosureError::Parse(format!("Invalid specificity response: {e}")))?;

    Ok(SpecificityCategory::ALL
        .iter()
        .filter_map(|&category| {
            let entry = object.get(category.key())?;
            Some((
                category,
                CategoryJudgment {
                    score: entry.get("score").and_then(parse_score),
                    rationale: entry
                        .get("rationale")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                },
            ))
        })
        .collect())
}

/// Sum of the six marker scores divided by six; missing scores count as 0.
#[must_use]
pub fn specificity_score(judgments: &BTreeMap<SpecificityCategory, CategoryJudgment>) -> f64 {
    let total: i64 = SpecificityCategory::MARKERS
        .iter()
        .filter_map(|c| judgments.get(c).and_then(|j| j.score))
        .sum();
    total as f64 / SpecificityCategory::MARKERS.len() as f64
}

/// Builds an assessment from parsed judgments.
#[must_use]
pub fn assessment(
    ticker: Ticker,
    year: i32,
    judgments: BTreeMap<SpecificityCategory, CategoryJudgment>,
) -> SpecificityAssessment {
    let specificity_score = specificity_score(&judgments);
    SpecificityAssessment {
        ticker,
        year,
        judgments,
        specificity_score,
    }
}

/// Assessment recorded when the model never produced a usable answer.
#[must_use]
pub fn failed_assessment(ticker: Ticker, year: i32) -> SpecificityAssessment {
    let judgments = SpecificityCategory::ALL
        .iter()
        .map(|&c| (c, CategoryJudgment::default()))
        .collect();
    assessment(ticker, year, judgments)
}
