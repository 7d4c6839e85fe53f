//! Realized-volatility estimate fed by venue news announcements.
//!
//! The venue publishes realized volatility periodically as free text. The
//! tracker owns the parsing: a data-driven list of recognized phrasings,
//! percent-vs-decimal normalization, and period ordering so duplicate or
//! out-of-order announcements never move the estimate backwards. Anything
//! it cannot read is a logged parse miss, never an error.

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, info};
use vol_arb_core::NewsItem;

/// Recognized announcement phrasings. Each must capture the numeric value
/// in group 1 and an optional percent sign in group 2, close enough to the
/// phrase that unrelated numbers in the same text are not picked up.
const DEFAULT_PHRASINGS: &[&str] = &[
    r"(?i)realized\s+volatility\D{0,48}?(\d+(?:\.\d+)?)\s*(%)?",
    r"(?i)annualized\s+volatility\D{0,48}?(\d+(?:\.\d+)?)\s*(%)?",
    r"(?i)volatility\s+(?:for|of)\s+th(?:is|e\s+\w+)\s+week\D{0,32}?(\d+(?:\.\d+)?)\s*(%)?",
];

/// Announcements carry a week ordinal; it orders them when present.
const PERIOD_PHRASING: &str = r"(?i)week\s*#?\s*(\d+)";

/// Current realized-volatility estimate (annualized, decimal).
///
/// `current()` is `None` until the first announcement parses; the decision
/// engine skips option evaluation in that window. Once set, the estimate
/// is always positive: a non-positive parse is discarded and the last
/// valid value retained.
pub struct RealizedVolTracker {
    estimate: Option<f64>,
    last_period: Option<u64>,
    value_patterns: Vec<Regex>,
    period_pattern: Regex,
}

impl RealizedVolTracker {
    /// Builds a tracker with the default phrasing list.
    #[must_use]
    pub fn new() -> Self {
        // The built-in phrasings are compile-checked by tests.
        Self::with_phrasings(DEFAULT_PHRASINGS).unwrap_or_else(|_| unreachable!())
    }

    /// Builds a tracker with a custom phrasing list. Each phrasing must be
    /// a valid regex capturing the value in group 1 and an optional `%` in
    /// group 2.
    ///
    /// # Errors
    ///
    /// Returns an error if any phrasing fails to compile.
    pub fn with_phrasings(phrasings: &[&str]) -> Result<Self> {
        let value_patterns = phrasings
            .iter()
            .map(|p| Regex::new(p).with_context(|| format!("invalid phrasing `{p}`")))
            .collect::<Result<Vec<_>>>()?;
        let period_pattern = Regex::new(PERIOD_PHRASING).context("invalid period phrasing")?;
        Ok(Self {
            estimate: None,
            last_period: None,
            value_patterns,
            period_pattern,
        })
    }

    /// Applies one announcement. Returns whether the estimate changed.
    ///
    /// Stale periods, parse misses, and non-positive values all leave the
    /// estimate untouched and return `false`.
    pub fn update(&mut self, item: &NewsItem) -> bool {
        let text = format!("{} {}", item.headline, item.body);
        let period = self.parse_period(&text).unwrap_or(u64::from(item.tick));

        if let Some(last) = self.last_period {
            if period <= last {
                debug!(period, last, "stale volatility announcement ignored");
                return false;
            }
        }

        let Some(sigma) = self.parse_value(&text) else {
            debug!(tick = item.tick, "no volatility figure in announcement");
            return false;
        };
        if sigma <= 0.0 {
            debug!(sigma, "non-positive volatility discarded, keeping last");
            return false;
        }

        self.last_period = Some(period);
        let changed = self.estimate != Some(sigma);
        if changed {
            info!(sigma, period, "realized volatility updated");
        }
        self.estimate = Some(sigma);
        changed
    }

    /// Current annualized estimate as a decimal, once one has been seen.
    #[must_use]
    pub fn current(&self) -> Option<f64> {
        self.estimate
    }

    fn parse_period(&self, text: &str) -> Option<u64> {
        self.period_pattern
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    fn parse_value(&self, text: &str) -> Option<f64> {
        for pattern in &self.value_patterns {
            if let Some(caps) = pattern.captures(text) {
                let raw: f64 = caps.get(1)?.as_str().parse().ok()?;
                let is_percent = caps.get(2).is_some();
                // Values above 1.5 can only be percentages on this venue;
                // published decimals like 0.24 pass through unchanged.
                let sigma = if is_percent || raw > 1.5 {
                    raw / 100.0
                } else {
                    raw
                };
                return Some(sigma);
            }
        }
        None
    }
}

impl Default for RealizedVolTracker {
    fn default() -> Self {
        Self::new()
    }
}
