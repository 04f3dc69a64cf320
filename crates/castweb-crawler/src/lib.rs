mod config;
mod crawler;
mod frontier;
mod scrapable;

pub use config::{CrawlerConfig, OnError};
pub use crawler::crawl_site;
pub use scrapable::{FetchRequest, PageLocation, Scrapable, ScrapingContext};

pub use anyhow;
