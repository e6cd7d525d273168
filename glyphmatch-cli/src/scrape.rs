//! Extraction of challenge data from the server's HTML pages.

use crate::config::MarkerConfig;
use regex::Regex;

/// Compiled page markers.
pub struct Scraper {
    image: Regex,
    success: String,
    score: Regex,
    token: Regex,
}

impl Scraper {
    pub fn new(markers: &MarkerConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            image: Regex::new(&markers.image_pattern)?,
            success: markers.success_marker.clone(),
            score: Regex::new(&markers.score_pattern)?,
            token: Regex::new(&markers.token_pattern)?,
        })
    }

    /// Base64 payload of the embedded challenge image.
    pub fn image_payload<'h>(&self, html: &'h str) -> Option<&'h str> {
        self.image
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Whether the page reports the previous answer as accepted.
    pub fn is_success(&self, html: &str) -> bool {
        !self.success.is_empty() && html.contains(&self.success)
    }

    /// Score shown on the page.
    pub fn score(&self, html: &str) -> Option<u32> {
        self.score
            .captures(html)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Completion token, once revealed.
    pub fn token(&self, html: &str) -> Option<String> {
        self.token.find(html).map(|m| m.as_str().to_string())
    }
}
