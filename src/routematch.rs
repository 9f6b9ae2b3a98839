//! Route-to-stop membership for NYCT station codes.
//!
//! The free-text `routes` column on the stop table is incomplete for some
//! stations, so membership is decided by an ordered list of matchers over
//! `(stop, normalized route)`: an exact token match against the free text,
//! then prefix/numeric-range rules against the station base code, then a
//! code-token fallback for routes without any rules.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::providers::nyct::static_data::StopRecord;

/// Express and shuttle codes that fold into a trunk line for matching.
const ROUTE_EQUIV: &[(&str, &str)] = &[
    ("5X", "5"),
    ("6X", "6"),
    ("7X", "7"),
    ("GS", "S"),
    ("FS", "S"),
];

/// One station-code rule: an optional letter prefix plus an optional
/// inclusive numeric range. An unspecified side is unconstrained.
#[derive(Debug, Clone, Copy)]
struct CodeRule {
    prefix: Option<&'static str>,
    min: Option<u32>,
    max: Option<u32>,
}

const fn rule(prefix: Option<&'static str>, min: Option<u32>, max: Option<u32>) -> CodeRule {
    CodeRule { prefix, min, max }
}

/// Station-code ranges per route line. The numbered IRT lines use bare
/// numeric codes (101-799, 901-999 for the shuttles); the lettered BMT/IND
/// trunks share letter prefixes and split them by numeric range.
const ROUTE_RULES: &[(&str, &[CodeRule])] = &[
    ("1", &[rule(None, Some(101), Some(199))]),
    ("2", &[rule(None, Some(201), Some(299))]),
    ("3", &[rule(None, Some(301), Some(399))]),
    ("4", &[rule(None, Some(401), Some(499))]),
    (
        "5",
        &[
            rule(None, Some(201), Some(299)),
            rule(None, Some(401), Some(499)),
            rule(None, Some(501), Some(599)),
        ],
    ),
    ("6", &[rule(None, Some(601), Some(699))]),
    ("7", &[rule(None, Some(701), Some(799))]),
    ("S", &[rule(None, Some(901), Some(999))]),
    (
        "N",
        &[rule(Some("N"), None, None), rule(Some("R"), Some(1), Some(21))],
    ),
    (
        "Q",
        &[
            rule(Some("Q"), None, None),
            rule(Some("R"), Some(13), Some(21)),
            rule(Some("D"), Some(24), Some(43)),
        ],
    ),
    ("R", &[rule(Some("R"), Some(13), Some(45))]),
    ("W", &[rule(Some("R"), Some(1), Some(27))]),
];

impl CodeRule {
    fn matches(&self, base: &BaseCode) -> bool {
        if let Some(prefix) = self.prefix {
            if prefix != base.prefix {
                return false;
            }
        }
        if let Some(min) = self.min {
            match base.number {
                Some(n) if n >= min => {}
                _ => return false,
            }
        }
        if let Some(max) = self.max {
            match base.number {
                Some(n) if n <= max => {}
                _ => return false,
            }
        }
        true
    }
}

fn rules_for(route: &str) -> Option<&'static [CodeRule]> {
    ROUTE_RULES
        .iter()
        .find(|(line, _)| *line == route)
        .map(|(_, rules)| *rules)
}

/// The alphanumeric station identifier the numeric rules run against:
/// leading letters, then a digit run. Derived from the parent station id
/// when one exists, since child platform ids do not reliably carry the code.
#[derive(Debug)]
struct BaseCode {
    code: String,
    prefix: String,
    number: Option<u32>,
}

fn extract_base_code(stop: &StopRecord) -> BaseCode {
    let raw = stop.parent.as_deref().unwrap_or(&stop.id);
    let code = raw.to_uppercase();
    let prefix: String = code
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    let digits: String = code[prefix.len()..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let number = if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    };
    BaseCode {
        code,
        prefix,
        number,
    }
}

/// Alternating letter/digit runs of a code, e.g. "R15N" -> ["R","15","N"].
fn code_tokens(code: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;
    for c in code.chars() {
        if c.is_ascii_alphabetic() || c.is_ascii_digit() {
            let is_digit = c.is_ascii_digit();
            if !current.is_empty() && is_digit != current_is_digit {
                tokens.push(std::mem::take(&mut current));
            }
            current_is_digit = is_digit;
            current.push(c);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Display order for stop lists: name (case-insensitive), then id.
pub fn stop_display_order(a: &StopRecord, b: &StopRecord) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.id.cmp(&b.id))
}

pub struct RouteMatcher {
    /// Memoized tokenization of the free-text routes field. Identical
    /// strings recur across thousands of stops.
    token_cache: RwLock<HashMap<String, Arc<Vec<String>>>>,
}

impl Default for RouteMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteMatcher {
    pub fn new() -> Self {
        Self {
            token_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Canonical form of a requested route line: uppercased, with express
    /// variants and shuttle aliases folded into their trunk code. Empty
    /// input normalizes to nothing. Normalization is a fixed point.
    pub fn normalize(&self, route: &str) -> Option<String> {
        if route.is_empty() {
            return None;
        }
        let upper = route.to_uppercase();
        for (alias, canonical) in ROUTE_EQUIV {
            if *alias == upper {
                return Some((*canonical).to_string());
            }
        }
        Some(upper)
    }

    /// Does `stop` serve `route`? An empty route never matches.
    pub fn stop_serves_route(&self, stop: &StopRecord, route: &str) -> bool {
        match self.normalize(route) {
            Some(normalized) => self.matches_normalized(stop, &normalized),
            None => false,
        }
    }

    /// Every stop matching `route`, sorted by name then id. An empty or
    /// unnormalizable route yields an empty list, not an error.
    pub fn filter_stops_by_route<'a, I>(&self, stops: I, route: &str) -> Vec<&'a StopRecord>
    where
        I: IntoIterator<Item = &'a StopRecord>,
    {
        let Some(normalized) = self.normalize(route) else {
            return Vec::new();
        };
        let mut matched: Vec<&StopRecord> = stops
            .into_iter()
            .filter(|stop| self.matches_normalized(stop, &normalized))
            .collect();
        matched.sort_by(|a, b| stop_display_order(a, b));
        matched
    }

    /// Ordered matchers, first hit wins. The free-text field is
    /// authoritative when it lists the route; the code-token fallback only
    /// applies to routes with no rule-table entry.
    fn matches_normalized(&self, stop: &StopRecord, normalized: &str) -> bool {
        if self.listed_in_routes_field(stop, normalized) {
            return true;
        }
        let base = extract_base_code(stop);
        match rules_for(normalized) {
            Some(rules) => rules.iter().any(|r| r.matches(&base)),
            None => code_tokens(&base.code).iter().any(|t| t == normalized),
        }
    }

    fn listed_in_routes_field(&self, stop: &StopRecord, normalized: &str) -> bool {
        let Some(field) = stop.routes.as_deref() else {
            return false;
        };
        self.tokenize(field).iter().any(|t| t == normalized)
    }

    fn tokenize(&self, field: &str) -> Arc<Vec<String>> {
        if field.is_empty() {
            return Arc::new(Vec::new());
        }
        let key = field.to_uppercase();
        {
            let cache = self.token_cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(hit) = cache.get(&key) {
                return hit.clone();
            }
        }
        let tokens: Vec<String> = key
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        let tokens = Arc::new(tokens);
        let mut cache = self.token_cache.write().unwrap_or_else(|e| e.into_inner());
        cache.insert(key, tokens.clone());
        tokens
    }

    #[cfg(test)]
    fn token_cache_len(&self) -> usize {
        self.token_cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}
