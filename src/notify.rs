//! Notification payloads. The core only assembles what changed in a run and
//! renders a plain-text summary; actual delivery (Telegram bot, email) is an
//! external concern fed from this payload.

use crate::models::{Outcome, RunResult};
use chrono::{DateTime, Utc};

/// What a notifier needs to report one run: the new listings and the price
/// changes, each outcome carrying its portal id (and prices, for changes).
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationSummary<'a> {
    pub new_listings: &'a [Outcome],
    pub price_changes: &'a [Outcome],
    pub executed_at: DateTime<Utc>,
}

impl<'a> NotificationSummary<'a> {
    pub fn from_run(result: &'a RunResult) -> Self {
        Self {
            new_listings: &result.new_listings,
            price_changes: &result.price_changes,
            executed_at: result.executed_at,
        }
    }

    /// False when the run found nothing worth notifying about.
    pub fn has_updates(&self) -> bool {
        !self.new_listings.is_empty() || !self.price_changes.is_empty()
    }

    /// Plain-text summary of the run, one line per listing.
    pub fn to_message(&self) -> String {
        let mut lines = vec!["🏠 piso-scout — resumen".to_string(), String::new()];

        if !self.new_listings.is_empty() {
            lines.push(format!("✨ {} pisos nuevos:", self.new_listings.len()));
            for outcome in self.new_listings {
                lines.push(format!("  • {}", outcome.portal_id()));
            }
            lines.push(String::new());
        }

        if !self.price_changes.is_empty() {
            lines.push(format!("📉 {} cambios de precio:", self.price_changes.len()));
            for outcome in self.price_changes {
                if let Outcome::PriceChanged {
                    portal_id,
                    previous_price,
                    new_price,
                } = outcome
                {
                    lines.push(format!("  • {portal_id}: {previous_price}€ → {new_price}€"));
                }
            }
            lines.push(String::new());
        }

        if !self.has_updates() {
            lines.push("😴 Sin novedades en esta ejecución.".to_string());
        }

        lines.push(format!("🕐 {}", self.executed_at.to_rfc3339()));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunResult;

    fn result_with_updates() -> RunResult {
        let mut result = RunResult::empty();
        result.new_listings.push(Outcome::New {
            portal_id: "idealista-1".to_string(),
        });
        result.price_changes.push(Outcome::PriceChanged {
            portal_id: "idealista-2".to_string(),
            previous_price: 150_000,
            new_price: 140_000,
        });
        result.total_processed = 2;
        result
    }

    #[test]
    fn summary_lists_new_listings_and_price_changes() {
        let result = result_with_updates();
        let message = NotificationSummary::from_run(&result).to_message();

        assert!(message.contains("1 pisos nuevos"));
        assert!(message.contains("idealista-1"));
        assert!(message.contains("1 cambios de precio"));
        assert!(message.contains("idealista-2: 150000€ → 140000€"));
    }

    #[test]
    fn empty_run_has_no_updates() {
        let result = RunResult::empty();
        let summary = NotificationSummary::from_run(&result);

        assert!(!summary.has_updates());
        assert!(summary.to_message().contains("Sin novedades"));
    }
}
