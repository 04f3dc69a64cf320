use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;

use anyhow::{anyhow, Context};
use castweb_crawler::{FetchRequest, PageLocation, Scrapable, ScrapingContext};
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use once_cell::sync::Lazy;
use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::record::Credit;
use crate::steps::{Step, StepOutput};
use crate::writer::{CsvWriter, CsvWriterConfig, FileMode};

pub const DEFAULT_ORIGIN: &str = "https://www.imdb.com";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImdbScraperConfig {
    /// The title page the crawl starts from
    pub seed_url: String,
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default)]
    pub csv_file: Option<PathBuf>,
    #[serde(default)]
    pub file_mode: FileMode,
    #[serde(default)]
    pub csv_config: CsvWriterConfig,
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}

impl ImdbScraperConfig {
    pub fn new(seed_url: impl Into<String>) -> Self {
        Self {
            seed_url: seed_url.into(),
            origin: default_origin(),
            csv_file: None,
            file_mode: FileMode::default(),
            csv_config: CsvWriterConfig::default(),
        }
    }
}

/// Background csv writer of one output, records are written in arrival order
struct RecordWriter {
    tx_record: Sender<Credit>,
    tx_stop: Sender<()>,
    rx_done: Receiver<()>,
}

impl RecordWriter {
    fn spawn(config: &ImdbScraperConfig) -> anyhow::Result<Self> {
        let (tx_record, rx_record) = unbounded::<Credit>();
        let (tx_stop, rx_stop) = bounded::<()>(1);
        let (tx_done, rx_done) = bounded::<()>(1);

        let mut wtr = CsvWriter::open(
            config.csv_file.as_deref(),
            config.file_mode,
            &config.csv_config,
        )
        .with_context(|| format!("Couldn't open output {:?}", config.csv_file))?;

        thread::spawn(move || loop {
            select! {
                recv(rx_stop) -> _ => {
                    // Drain what workers sent before the stop signal
                    for credit in rx_record.try_iter() {
                        if let Err(e) = wtr.serialize(credit) {
                            log::error!("Couldn't write record: {e}");
                        }
                    }
                    wtr.flush().ok();
                    tx_done.send(()).ok();
                    break;
                },
                recv(rx_record) -> msg => {
                    msg.map(|credit| wtr.serialize(credit))
                        .map(|res| if let Err(e) = res {
                            log::error!("Couldn't write record: {e}");
                        })
                        .ok();
                }
            }
        });

        Ok(Self {
            tx_record,
            tx_stop,
            rx_done,
        })
    }

    fn stop(self) {
        self.tx_stop.send(()).ok();
        self.rx_done.recv().ok();
    }
}

/// Writers of the runs in progress, keyed by output file (`None` is stdout)
static RECORD_WRITERS: Lazy<Mutex<HashMap<Option<PathBuf>, RecordWriter>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

pub struct ImdbScraper {
    origin: String,
    seed: Vec<FetchRequest<Step>>,
    csv_file: Option<PathBuf>,
    tx_record: Sender<Credit>,
}

impl ImdbScraper {
    fn is_onsite(&self, url: &str) -> bool {
        url.strip_prefix(self.origin.as_str())
            .map_or(false, |path| path.is_empty() || path.starts_with('/'))
    }
}

impl Scrapable for ImdbScraper {
    type Config = ImdbScraperConfig;
    type Step = Step;

    fn new(config: &ImdbScraperConfig) -> anyhow::Result<Self> {
        let seed = if config.seed_url.trim().is_empty() {
            vec![]
        } else {
            vec![FetchRequest::new(config.seed_url.trim(), Step::TitlePage)]
        };

        let tx_record = {
            let mut writers = RECORD_WRITERS
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match writers.get(&config.csv_file) {
                Some(writer) => writer.tx_record.clone(),
                None => {
                    let writer = RecordWriter::spawn(config)?;
                    let tx_record = writer.tx_record.clone();
                    writers.insert(config.csv_file.clone(), writer);
                    tx_record
                }
            }
        };

        Ok(Self {
            origin: config.origin.trim_end_matches('/').to_string(),
            seed,
            csv_file: config.csv_file.clone(),
            tx_record,
        })
    }

    fn finalizer(&mut self) {
        let writer = RECORD_WRITERS
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.csv_file);
        if let Some(writer) = writer {
            writer.stop();
        }
    }

    fn seed(&self) -> Vec<FetchRequest<Step>> {
        self.seed.clone()
    }

    fn accept(&self, url: &str, step: Step) -> bool {
        let onsite = self.is_onsite(url);
        if !onsite {
            log::warn!("Not following offsite URL {url} ({step:?})");
        }
        onsite
    }

    fn scrap(&mut self, page: String, ctx: &ScrapingContext<Step>) -> anyhow::Result<()> {
        let document = Html::parse_document(&page);

        match ctx.step().run(&document, &self.origin)? {
            StepOutput::Follow(requests) => {
                log::debug!("{} follow-ups from {}", requests.len(), ctx.location());
                requests
                    .into_iter()
                    .for_each(|request| ctx.send_request(request));
            }
            StepOutput::Emit(credits) => {
                log::debug!("{} credits from {}", credits.len(), ctx.location());
                for credit in credits {
                    self.tx_record
                        .send(credit)
                        .map_err(|_| anyhow!("Record writer for {:?} is stopped", self.csv_file))?;
                }
            }
        }

        Ok(())
    }
}

/// Runs a single step on a single page.
///
/// Follow-up requests are printed to stdout as `step<TAB>url`, credits go to
/// the configured output.
pub fn scrap_page(
    config: &ImdbScraperConfig,
    step: Step,
    page: String,
    location: PageLocation,
) -> anyhow::Result<()> {
    let mut scraper = ImdbScraper::new(config)?;
    let ctx = ScrapingContext::new(location, step);
    let res = scraper.scrap(page, &ctx);
    scraper.finalizer();
    res.with_context(|| format!("Couldn't scrap {} ({step})", ctx.location()))?;

    for request in ctx.into_requests() {
        println!("{}\t{}", request.step, request.url);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_imdb() {
        let config = ImdbScraperConfig::new("https://www.imdb.com/title/tt0108778/");

        assert_eq!(DEFAULT_ORIGIN, config.origin);
        assert_eq!(FileMode::Create, config.file_mode);
        assert_eq!(None, config.csv_file);
    }
}
