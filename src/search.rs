//! Search URL construction and the human-like delay policy used between
//! portal interactions.

use crate::models::SearchConfig;
use rand::Rng;
use std::time::Duration;

/// Portal root, used to resolve relative ad links.
pub const PORTAL_BASE_URL: &str = "https://www.idealista.com";

/// Canonical sale search for the target locality (Burgos capital).
pub const SEARCH_BASE_URL: &str = "https://www.idealista.com/venta-viviendas/burgos-burgos/";

/// Builds the search URL for a config. Only non-zero thresholds become query
/// parameters, always in the order rooms, bathrooms, area. The garage and
/// storage flags are deliberately not translated into parameters; matching on
/// those happens via keyword detection after parsing.
pub fn build_search_url(config: &SearchConfig) -> String {
    let mut params = Vec::new();

    if config.min_rooms > 0 {
        params.push(format!("minRooms={}", config.min_rooms));
    }
    if config.min_bathrooms > 0 {
        params.push(format!("minBathrooms={}", config.min_bathrooms));
    }
    if config.min_area_sqm > 0 {
        params.push(format!("minSize={}", config.min_area_sqm));
    }

    if params.is_empty() {
        SEARCH_BASE_URL.to_string()
    } else {
        format!("{SEARCH_BASE_URL}?{}", params.join("&"))
    }
}

/// Bounded random delay, used after navigation and between reconciliations to
/// look less like a bot. Tests inject `JitterPolicy::none()`.
#[derive(Debug, Clone, Copy)]
pub struct JitterPolicy {
    min: Duration,
    max: Duration,
}

impl JitterPolicy {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    /// Zero-width policy: every pause returns immediately.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }

    pub async fn pause(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Blocking variant for code driving the (synchronous) browser session.
    pub fn pause_blocking(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

impl Default for JitterPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(5))
    }
}
