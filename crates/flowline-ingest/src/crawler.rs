//! Catalog crawler control
//!
//! Two thin handlers over the catalog service: one fires a crawler run,
//! the other reports a single status snapshot. The workflow engine owns
//! the poll cadence; the attempt counter travels in the payload, so the
//! poller itself never sleeps or loops.

use anyhow::{Context, Result};
use aws_sdk_glue::Client;
use flowline_common::types::{CrawlerRequest, CrawlerStarted, CrawlerStatus, Validation};
use tracing::{info, instrument, warn};

use crate::config::PipelineConfig;

/// Crawler state reported when the attempt ceiling is exceeded
pub const STATUS_RETRY_LIMIT: &str = "RETRYLIMITREACH";

/// Last-crawl state assumed before the first run completes
const LAST_CRAWL_INITIAL: &str = "INITIAL";

/// Polls and starts the pipeline's catalog crawler
pub struct CrawlerControl {
    glue: Client,
    retry_limit: u32,
    stage_location: String,
}

impl CrawlerControl {
    pub fn new(glue: Client, config: &PipelineConfig) -> Self {
        Self {
            glue,
            retry_limit: config.retry_limit,
            stage_location: config.locations.stage.clone(),
        }
    }

    /// Fire one crawler run
    #[instrument(skip(self))]
    pub async fn start(&self, crawler_name: &str) -> Result<CrawlerStarted> {
        info!(crawler = %crawler_name, "Starting crawler");

        self.glue
            .start_crawler()
            .name(crawler_name)
            .send()
            .await
            .context("Failed to start crawler")?;

        Ok(CrawlerStarted {
            crawler_name: crawler_name.to_string(),
        })
    }

    /// Report one status snapshot, incrementing the attempt counter
    ///
    /// `Validation` stays `RUNNING` until the crawler is ready; the engine
    /// keeps re-invoking with the returned counter until it leaves that
    /// state or the ceiling trips.
    #[instrument(skip(self), fields(crawler = %request.crawler_name))]
    pub async fn poll(&self, request: &CrawlerRequest) -> Result<CrawlerStatus> {
        let cnt = request.cnt + 1;

        let response = self
            .glue
            .get_crawler()
            .name(&request.crawler_name)
            .send()
            .await
            .context("Failed to get crawler status")?;

        let crawler = response
            .crawler()
            .context("Crawler missing from status response")?;

        let state = crawler
            .state()
            .map(|s| s.as_str().to_string())
            .unwrap_or_default();
        let last_crawl_status = crawler
            .last_crawl()
            .and_then(|c| c.status())
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| LAST_CRAWL_INITIAL.to_string());
        let running_time = crawler.crawl_elapsed_time();

        info!(state = %state, last = %last_crawl_status, cnt, "Crawler status");

        let mut status = CrawlerStatus {
            status: state.clone(),
            validation: Validation::Running,
            crawler_name: request.crawler_name.clone(),
            running_time,
            cnt,
            last_crawl_status: last_crawl_status.clone(),
            location: self.stage_location.clone(),
            error: None,
        };

        if state == "READY" {
            status.validation = Validation::Success;
            if last_crawl_status == "FAILED" {
                status.status = "FAILED".to_string();
                status.validation = Validation::Failure;
                status.error = Some("Crawler Failed".to_string());
            }
        }

        if cnt > self.retry_limit {
            warn!(cnt, limit = self.retry_limit, "Crawler poll retry limit reached");
            status.status = STATUS_RETRY_LIMIT.to_string();
            status.validation = Validation::Failure;
            status.error = Some("Retry limit reach".to_string());
        }

        Ok(status)
    }
}
