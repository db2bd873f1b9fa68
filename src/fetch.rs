use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde_json::Value;
use thiserror::Error;

const USER_AGENT_VALUE: &str = "pims-season-stats/0.1";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timeout for {url}")]
    Timeout { url: String },
    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("failed to parse JSON from {url}: {message}")]
    Parse { url: String, message: String },
}

/// Anything that can answer a GET with a parsed JSON body.
pub trait JsonSource {
    fn get_json(&self, url: &str) -> Result<Value, FetchError>;
}

impl<T: JsonSource + ?Sized> JsonSource for &T {
    fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        (**self).get_json(url)
    }
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self { client })
    }
}

impl JsonSource for HttpFetcher {
    fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let resp = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, USER_AGENT_VALUE)
            .send()
            .map_err(|err| classify(url, err))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().map_err(|err| classify(url, err))?;
        parse_body(url, &body)
    }
}

fn classify(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

pub fn parse_body(url: &str, body: &str) -> Result<Value, FetchError> {
    serde_json::from_str(body.trim()).map_err(|err| FetchError::Parse {
        url: url.to_string(),
        message: err.to_string(),
    })
}

/// URL builders for the upstream stats API.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn roster(&self, team_id: u32) -> String {
        format!("{}/teams/{team_id}/roster", self.base)
    }

    pub fn player_stats(&self, player_id: u64) -> String {
        format!("{}/stats/players/pims_player/{player_id}", self.base)
    }

    pub fn team_stats(&self, team_id: u32) -> String {
        format!("{}/stats/teams/pims/{team_id}", self.base)
    }
}
