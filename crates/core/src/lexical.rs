//! Deterministic extractors for the dimensions where exact wording matters.

use crate::filters::AdministrationType;
use crate::taxonomy::{ADMINISTRATION_KEYWORDS, RECOVERY_FUND_KEYWORDS, REGIONS, STOP_WORDS};
use chrono::NaiveDate;
use regex::{Captures, Regex};
use std::collections::{BTreeSet, HashSet};

pub const MAX_DESCRIPTION_TOKENS: usize = 15;
const MIN_KEYWORD_CHARS: usize = 3;
const PLAUSIBLE_YEARS: std::ops::RangeInclusive<i32> = 1900..=2100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateRule {
    From,
    To,
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

pub struct LexicalExtractor {
    word: Regex,
    grant_number: Regex,
    date_rules: Vec<(DateRule, Regex)>,
    full_date: Regex,
    bare_year: Regex,
    stop_words: HashSet<&'static str>,
}

impl LexicalExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        const DMY: &str = r"(\d{1,2})[/-](\d{1,2})[/-](\d{4})";

        // Applied in this order; a later match overwrites what an earlier one set.
        let date_rules = vec![
            (DateRule::From, Regex::new(&format!(r"desde\s+{DMY}"))?),
            (DateRule::From, Regex::new(&format!(r"a partir del?\s+{DMY}"))?),
            (DateRule::To, Regex::new(&format!(r"hasta\s+{DMY}"))?),
            (DateRule::To, Regex::new(&format!(r"antes del?\s+{DMY}"))?),
            (DateRule::Range, Regex::new(&format!(r"{DMY}\s+hasta\s+{DMY}"))?),
        ];

        Ok(Self {
            word: Regex::new(r"\b\w+\b")?,
            grant_number: Regex::new(r"\b[0-9]{6}\b")?,
            date_rules,
            full_date: Regex::new(DMY)?,
            bare_year: Regex::new(r"\b([0-9]{4})\b")?,
            stop_words: STOP_WORDS.iter().copied().collect(),
        })
    }

    /// Keyword description: the first 15 non-stop-word tokens longer than two characters.
    pub fn description(&self, normalized: &str) -> Option<String> {
        let trimmed = normalized.trim();
        if !trimmed.is_empty() && trimmed.chars().all(char::is_numeric) {
            return None;
        }

        let keywords: Vec<&str> = self
            .word
            .find_iter(normalized)
            .map(|token| token.as_str())
            .filter(|token| !self.stop_words.contains(token))
            .filter(|token| token.chars().count() >= MIN_KEYWORD_CHARS)
            .take(MAX_DESCRIPTION_TOKENS)
            .collect();

        if keywords.is_empty() {
            None
        } else {
            Some(keywords.join(" "))
        }
    }

    pub fn regions(&self, normalized: &str) -> Option<BTreeSet<u32>> {
        let ids: BTreeSet<u32> = REGIONS
            .iter()
            .filter(|(name, _)| normalized.contains(name))
            .map(|(_, id)| *id)
            .collect();

        if ids.is_empty() {
            None
        } else {
            Some(ids)
        }
    }

    /// First keyword of the table found anywhere in the text; table order, not text order.
    pub fn administration_type(&self, normalized: &str) -> Option<AdministrationType> {
        ADMINISTRATION_KEYWORDS
            .iter()
            .find(|(keyword, _)| normalized.contains(keyword))
            .map(|(_, kind)| *kind)
    }

    pub fn grant_call_number(&self, original: &str) -> Option<String> {
        self.grant_number
            .find(original)
            .map(|found| found.as_str().to_string())
    }

    pub fn recovery_fund(&self, normalized: &str) -> Option<bool> {
        RECOVERY_FUND_KEYWORDS
            .iter()
            .any(|keyword| normalized.contains(keyword))
            .then_some(true)
    }

    pub fn dates(&self, normalized: &str) -> DateRange {
        let mut range = DateRange::default();

        for (rule, pattern) in &self.date_rules {
            for captures in pattern.captures_iter(normalized) {
                match rule {
                    DateRule::From => {
                        if let Some(date) = date_from_captures(&captures, 1) {
                            range.from = Some(date);
                        }
                    }
                    DateRule::To => {
                        if let Some(date) = date_from_captures(&captures, 1) {
                            range.to = Some(date);
                        }
                    }
                    DateRule::Range => {
                        let from = date_from_captures(&captures, 1);
                        let to = date_from_captures(&captures, 4);
                        if let (Some(from), Some(to)) = (from, to) {
                            range.from = Some(from);
                            range.to = Some(to);
                        }
                    }
                }
            }
        }

        // A written day/month/year, valid or not, rules out the bare-year reading.
        if range.is_empty() && !self.full_date.is_match(normalized) {
            for captures in self.bare_year.captures_iter(normalized) {
                let Some(year) = captures
                    .get(1)
                    .and_then(|m| m.as_str().parse::<i32>().ok())
                    .filter(|year| PLAUSIBLE_YEARS.contains(year))
                else {
                    continue;
                };
                if let (Some(from), Some(to)) = (
                    NaiveDate::from_ymd_opt(year, 1, 1),
                    NaiveDate::from_ymd_opt(year, 12, 31),
                ) {
                    range.from = Some(from);
                    range.to = Some(to);
                }
            }
        }

        range
    }
}

/// Day, month and year taken from three consecutive groups starting at `first`.
fn date_from_captures(captures: &Captures<'_>, first: usize) -> Option<NaiveDate> {
    let number = |offset: usize| -> Option<u32> {
        captures
            .get(first + offset)
            .and_then(|m| m.as_str().parse::<u32>().ok())
    };
    let day = number(0)?;
    let month = number(1)?;
    let year = i32::try_from(number(2)?).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
