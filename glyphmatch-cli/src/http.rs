//! HTTP challenge source with cookie-based session continuation.

use crate::scrape::Scraper;
use glyphmatch::{ChallengeSource, GlyphMatchError, GlyphMatchResult, Verdict};
use reqwest::blocking::{Client, Response};
use std::time::Duration;

fn transport(err: reqwest::Error) -> GlyphMatchError {
    GlyphMatchError::Transport {
        reason: err.to_string(),
    }
}

/// Fetches challenges with GET and submits answers as a form POST.
pub struct HttpChallengeSource {
    client: Client,
    page_url: String,
    submit_url: String,
    answer_field: String,
    scraper: Scraper,
}

impl HttpChallengeSource {
    pub fn new(
        page_url: String,
        submit_url: String,
        answer_field: String,
        timeout: Duration,
        scraper: Scraper,
    ) -> GlyphMatchResult<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .user_agent(concat!("glyphmatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport)?;
        Ok(Self {
            client,
            page_url,
            submit_url,
            answer_field,
            scraper,
        })
    }

    fn read_page(response: Response) -> GlyphMatchResult<String> {
        response
            .error_for_status()
            .map_err(transport)?
            .text()
            .map_err(transport)
    }
}

impl ChallengeSource for HttpChallengeSource {
    fn fetch(&mut self) -> GlyphMatchResult<Vec<u8>> {
        let response = self.client.get(&self.page_url).send().map_err(transport)?;
        let html = Self::read_page(response)?;
        self.scraper
            .image_payload(&html)
            .map(|payload| payload.as_bytes().to_vec())
            .ok_or_else(|| GlyphMatchError::Transport {
                reason: format!("no challenge image found at {}", self.page_url),
            })
    }

    fn submit(&mut self, answer: &str) -> GlyphMatchResult<Verdict> {
        let response = self
            .client
            .post(&self.submit_url)
            .form(&[(self.answer_field.as_str(), answer)])
            .send()
            .map_err(transport)?;
        let html = Self::read_page(response)?;
        Ok(Verdict {
            accepted: self.scraper.is_success(&html),
            score: self.scraper.score(&html),
            token: self.scraper.token(&html),
            next: self
                .scraper
                .image_payload(&html)
                .map(|payload| payload.as_bytes().to_vec()),
        })
    }
}
