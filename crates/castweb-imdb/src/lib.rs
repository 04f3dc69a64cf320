pub mod css;
mod error;
mod record;
mod scraper;
pub mod steps;
pub mod writer;

pub use crate::error::StepError;
pub use crate::record::Credit;
pub use crate::scraper::{scrap_page, ImdbScraper, ImdbScraperConfig, DEFAULT_ORIGIN};
pub use crate::steps::{Step, StepOutput};

pub use anyhow;
