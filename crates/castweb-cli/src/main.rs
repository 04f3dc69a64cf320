use std::path::PathBuf;
use std::{env, io};

use castweb_crawler::{crawl_site, CrawlerConfig, OnError, PageLocation};
use castweb_imdb::writer::{CsvWriterConfig, FileMode};
use castweb_imdb::{scrap_page, ImdbScraper, ImdbScraperConfig, Step, DEFAULT_ORIGIN};
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use tokio::runtime;

/// Cast filmography crawler
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum SubCommand {
    #[command(name = "crawl")]
    Crawl(CrawlArgs),
    #[command(name = "scrap")]
    Scrap(ScrapArgs),
    #[command(hide = true)]
    Completion,
}

/// Crawl from a title page to the acting credits of its whole cast
#[derive(Debug, clap::Args)]
pub struct CrawlArgs {
    /// URL of the title page to start from
    #[arg(long)]
    pub seed_url: String,
    /// Site origin prepended to relative links, links outside of it are not followed
    #[arg(long, default_value = DEFAULT_ORIGIN)]
    pub origin: String,
    /// Path to the output csv file, written to stdout when missing
    #[arg(long, short)]
    pub output_file: Option<PathBuf>,
    /// How the output file is opened
    #[arg(value_enum, long, default_value_t = FileMode::Create)]
    pub file_mode: FileMode,
    /// Optional csv writer yaml configuration file
    #[arg(long)]
    pub csv_config: Option<PathBuf>,
    /// Optional default crawler yaml configuration file
    #[arg(env = "CASTWEB_CRAWLER_CONFIG", long)]
    pub crawler_config: Option<PathBuf>,
    /// Override crawler's user agent
    #[arg(long)]
    pub user_agent: Option<String>,
    /// Override crawler's page buffer size
    #[arg(long)]
    pub page_buffer: Option<usize>,
    /// Override crawler's maximum concurrent page downloads
    #[arg(long)]
    pub concurrent_downloads: Option<usize>,
    /// Override crawler's number of CPU workers used to parse pages
    #[arg(long)]
    pub num_workers: Option<usize>,
    /// Override crawler's maximum number of scheduled pages
    #[arg(long)]
    pub max_requests: Option<usize>,
    /// Download a page again each time it is linked to
    #[arg(long)]
    pub no_dedup: bool,
    /// No SIGINT handling, scraper finalizer won't be called
    #[arg(long)]
    pub no_sigint: bool,
    /// Override crawler's download error handling strategy
    #[arg(value_enum, long)]
    pub on_dl_error: Option<OnError>,
    /// Override crawler's scrap error handling strategy
    #[arg(value_enum, long)]
    pub on_scrap_error: Option<OnError>,
    /// When quiet no logs are outputted
    #[arg(long, short)]
    pub quiet: bool,
}

impl TryFrom<&CrawlArgs> for CrawlerConfig {
    type Error = anyhow::Error;

    fn try_from(args: &CrawlArgs) -> Result<Self, Self::Error> {
        let mut conf = if let Some(path) = &args.crawler_config {
            serde_yaml::from_reader(fs_err::File::open(path)?)?
        } else {
            CrawlerConfig::default()
        };
        if let Some(user_agent) = &args.user_agent {
            conf.user_agent = user_agent.to_string();
        }
        if let Some(page_buffer) = args.page_buffer {
            conf.page_buffer = page_buffer;
        }
        if let Some(concurrent_downloads) = args.concurrent_downloads {
            conf.concurrent_downloads = concurrent_downloads;
        }
        if let Some(num_workers) = args.num_workers {
            conf.num_workers = num_workers;
        }
        if let Some(max_requests) = args.max_requests {
            conf.max_requests = Some(max_requests);
        }
        if let Some(on_dl_error) = args.on_dl_error {
            conf.on_dl_error = on_dl_error;
        }
        if let Some(on_scrap_error) = args.on_scrap_error {
            conf.on_scrap_error = on_scrap_error;
        }
        if args.no_dedup {
            conf.dedup = false;
        }
        if args.no_sigint {
            conf.handle_sigint = false;
        }
        Ok(conf)
    }
}

fn read_csv_config(path: Option<&PathBuf>) -> anyhow::Result<CsvWriterConfig> {
    match path {
        Some(path) => Ok(serde_yaml::from_reader(fs_err::File::open(path)?)?),
        None => Ok(CsvWriterConfig::default()),
    }
}

pub fn crawl(args: CrawlArgs) -> anyhow::Result<()> {
    let crawler_conf = (&args).try_into()?;
    let scraper_conf = ImdbScraperConfig {
        origin: args.origin,
        csv_file: args.output_file,
        file_mode: args.file_mode,
        csv_config: read_csv_config(args.csv_config.as_ref())?,
        ..ImdbScraperConfig::new(args.seed_url)
    };
    let rt = runtime::Builder::new_multi_thread().enable_all().build()?;
    rt.block_on(crawl_site::<ImdbScraper>(&crawler_conf, &scraper_conf))
}

/// Scrap a single page with a single step and print the result to stdout
#[derive(Debug, clap::Args)]
#[command(group = clap::ArgGroup::new("page").required(true))]
pub struct ScrapArgs {
    /// The step the page goes through
    #[arg(value_enum, long, short)]
    pub step: Step,
    /// A local html page to scrap
    #[arg(group = "page", long)]
    pub file: Option<PathBuf>,
    /// A distant html page to scrap
    #[arg(group = "page", long)]
    pub url: Option<String>,
    /// Custom user agent to download the page
    #[arg(long, conflicts_with = "file")]
    pub ua: Option<String>,
    /// Site origin prepended to relative links
    #[arg(long, default_value = DEFAULT_ORIGIN)]
    pub origin: String,
}

pub fn scrap(args: ScrapArgs) -> anyhow::Result<()> {
    let (page, location) = if let Some(url) = args.url {
        let mut builder = reqwest::blocking::ClientBuilder::new();
        if let Some(ua) = args.ua {
            builder = builder.user_agent(ua);
        }
        let client = builder.build()?;
        let page = client.get(&url).send()?.error_for_status()?.text()?;
        (page, PageLocation::Url(url))
    } else if let Some(path) = args.file {
        let page = fs_err::read_to_string(&path)?;
        (page, PageLocation::Path(path))
    } else {
        anyhow::bail!("Missing `url` or `file`");
    };
    let config = ImdbScraperConfig {
        origin: args.origin,
        ..ImdbScraperConfig::new("")
    };
    scrap_page(&config, args.step, page, location)
}

fn init_logger(filters: &str) {
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", filters);
    }
    env_logger::init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.cmd {
        SubCommand::Crawl(args) => {
            if !args.quiet {
                init_logger("castweb_imdb=warn,castweb_crawler=warn");
            }
            crawl(args)
        }
        SubCommand::Scrap(args) => {
            init_logger("castweb_imdb=warn");
            scrap(args)
        }
        SubCommand::Completion => {
            generate(Shell::Bash, &mut Args::command(), "castweb", &mut io::stdout());
            Ok(())
        }
    }
}
