use std::cmp;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlerConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_page_buffer")]
    pub page_buffer: usize,

    #[serde(default = "default_concurrent_downloads")]
    pub concurrent_downloads: usize,

    #[serde(default = "default_num_workers")]
    pub num_workers: usize,

    #[serde(default = "default_on_dl_error")]
    pub on_dl_error: OnError,

    #[serde(default = "default_on_scrap_error")]
    pub on_scrap_error: OnError,

    #[serde(default = "default_handle_sigint")]
    pub handle_sigint: bool,

    /// Upper bound on the number of pages scheduled during a crawl, seeds included
    #[serde(default)]
    pub max_requests: Option<usize>,

    /// Whether an already scheduled URL is silently dropped when sent again
    #[serde(default = "default_dedup")]
    pub dedup: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            page_buffer: default_page_buffer(),
            concurrent_downloads: default_concurrent_downloads(),
            num_workers: default_num_workers(),
            on_dl_error: default_on_dl_error(),
            on_scrap_error: default_on_scrap_error(),
            handle_sigint: default_handle_sigint(),
            max_requests: None,
            dedup: default_dedup(),
        }
    }
}

fn default_user_agent() -> String {
    String::from("CastwebBot")
}

fn default_page_buffer() -> usize {
    10_000
}

fn default_concurrent_downloads() -> usize {
    16
}

fn default_num_workers() -> usize {
    cmp::max(1, num_cpus::get().saturating_sub(2))
}

fn default_on_dl_error() -> OnError {
    OnError::SkipAndLog
}

fn default_on_scrap_error() -> OnError {
    OnError::SkipAndLog
}

fn default_handle_sigint() -> bool {
    true
}

fn default_dedup() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OnError {
    Fail,
    SkipAndLog,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_skip_errors() {
        let conf = CrawlerConfig::default();
        assert_eq!(OnError::SkipAndLog, conf.on_dl_error);
        assert_eq!(OnError::SkipAndLog, conf.on_scrap_error);
        assert!(conf.num_workers >= 1);
        assert!(conf.dedup);
        assert!(conf.handle_sigint);
        assert_eq!(None, conf.max_requests);
    }
}
