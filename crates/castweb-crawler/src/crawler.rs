use std::future::Future;
use std::io::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Error, Result};
use flate2::read::GzDecoder;
use futures::{future, stream, try_join, StreamExt};
use lazy_static::lazy_static;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::config::{CrawlerConfig, OnError};
use crate::frontier::CountedTx;
use crate::scrapable::{FetchRequest, PageLocation, Scrapable, ScrapingContext};

lazy_static! {
    static ref HTTP_CLI: reqwest::Client = reqwest::ClientBuilder::new()
        .gzip(true)
        .deflate(true)
        .build()
        .unwrap();
}

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
struct Page<S> {
    page: String,
    location: PageLocation,
    step: S,
}

async fn download<S>(config: &CrawlerConfig, request: FetchRequest<S>) -> Result<Page<S>> {
    let FetchRequest { url, step } = request;

    let resp = HTTP_CLI
        .get(&url)
        .header(USER_AGENT, &config.user_agent)
        .send()
        .await
        .and_then(|resp| resp.error_for_status())
        .with_context(|| format!("Couldn't download {url}"))?;

    let page = match resp.headers().get(CONTENT_TYPE) {
        Some(c) if c == "application/x-gzip" || c == "application/gzip" => {
            let compressed = resp.bytes().await?;
            let mut gz = GzDecoder::new(&compressed[..]);
            let mut page = String::new();
            gz.read_to_string(&mut page)?;
            page
        }
        _ => resp.text().await?,
    };

    Ok(Page {
        page,
        location: PageLocation::Url(url),
        step,
    })
}

fn until_err<T, E>(
    err: &mut &mut Result<(), E>,
    item: Result<T, E>,
) -> impl Future<Output = Option<T>> {
    match item {
        Ok(item) => future::ready(Some(item)),
        Err(e) => {
            **err = Err(e);
            future::ready(None)
        }
    }
}

pub async fn crawl_site<T>(
    crawler_conf: &CrawlerConfig,
    scraper_conf: &T::Config,
) -> anyhow::Result<()>
where
    T: Scrapable,
{
    let mut scraper = <T as Scrapable>::new(scraper_conf)?;
    let seed = scraper.seed();
    if seed.is_empty() {
        anyhow::bail!("Invalid seed config, requires at least one page");
    }

    let pages_in = Arc::new(AtomicUsize::new(0));
    let pages_out = Arc::new(AtomicUsize::new(0));

    let (tx_stop, rx_stop) = crossbeam_channel::unbounded::<()>();
    let (tx_url, rx_url) = mpsc::unbounded_channel::<FetchRequest<T::Step>>();
    let (tx_page, rx_page) =
        crossbeam_channel::bounded::<Page<T::Step>>(crawler_conf.page_buffer);

    let tx_url = CountedTx::new(tx_url, pages_in.clone(), crawler_conf);

    // Workers

    let stop = Arc::new(AtomicBool::new(false));
    let mut workers = vec![];
    for id in 0..crawler_conf.num_workers {
        let rx_stop = rx_stop.clone();
        let rx_page = rx_page.clone();
        let tx_url = tx_url.clone();
        let pages_out = pages_out.clone();
        let scraper_conf = scraper_conf.clone();
        let on_scrap_error = crawler_conf.on_scrap_error;
        let stop = stop.clone();
        let worker = thread::Builder::new()
            .name(format!("{id}"))
            .spawn(move || {
                let mut scraper = <T as Scrapable>::new(&scraper_conf)?;
                loop {
                    crossbeam_channel::select! {
                        recv(rx_page) -> page => {
                            let Ok(Page { page, location, step }) = page else {
                                break
                            };
                            let ctx = ScrapingContext::new(location, step);
                            match scraper.scrap(page, &ctx) {
                                Ok(()) => {
                                    for request in ctx.into_requests() {
                                        if scraper.accept(&request.url, request.step) {
                                            tx_url.send(request);
                                        } else {
                                            log::debug!("Rejected {request:?}");
                                        }
                                    }
                                }
                                Err(e) => match on_scrap_error {
                                    OnError::SkipAndLog => {
                                        log::error!(
                                            "Skipping scrap for page {} ({step:?}) got: {e}",
                                            ctx.location()
                                        );
                                    }
                                    OnError::Fail => {
                                        stop.store(true, Ordering::SeqCst);
                                        return Err(e.context(format!(
                                            "Couldn't scrap page {} ({step:?})",
                                            ctx.location()
                                        )));
                                    }
                                },
                            }
                            pages_out.fetch_add(1, Ordering::SeqCst);
                        },
                        recv(rx_stop) -> _ => break
                    }
                }
                Ok::<(), Error>(())
            })?;
        workers.push(worker);
    }
    drop(rx_page);

    let workers = async move {
        tokio::task::spawn_blocking(|| {
            for w in workers {
                w.join().map_err(|_| anyhow!("Worker thread panicked"))??;
            }
            Ok::<(), Error>(())
        })
        .await?
    };

    // Downloader

    let pages_in_c = pages_in.clone();
    let downloader = async move {
        let stream = UnboundedReceiverStream::new(rx_url)
            .zip(stream::repeat_with(move || pages_in_c.clone()))
            .map(|(request, pages_in)| async move {
                download(crawler_conf, request).await.map_err(|e| {
                    pages_in.fetch_sub(1, Ordering::SeqCst);
                    e
                })
            })
            .buffer_unordered(crawler_conf.concurrent_downloads);

        match crawler_conf.on_dl_error {
            OnError::Fail => {
                let mut err = Ok::<(), Error>(());
                stream
                    .scan(&mut err, until_err)
                    .map(|page| tx_page.send(page).ok())
                    .collect::<Vec<_>>()
                    .await;
                err
            }
            OnError::SkipAndLog => {
                stream
                    .filter_map(|dl| async move {
                        dl.map_err(|e| log::warn!("Skipping URL: {e:#}")).ok()
                    })
                    .map(|page| tx_page.send(page).ok())
                    .collect::<Vec<_>>()
                    .await;

                Ok(())
            }
        }
    };

    // Seed

    for request in seed {
        tx_url.send(request);
    }
    drop(tx_url);

    // Run all tasks

    let stop_workers = move || {
        for _ in 0..crawler_conf.num_workers {
            tx_stop.send(()).ok();
        }
    };

    let done = async move {
        loop {
            if crawler_conf.handle_sigint {
                if timeout(POLL_INTERVAL, tokio::signal::ctrl_c()).await.is_ok() {
                    stop_workers();
                    return Err::<(), _>(anyhow!("Interrupted"));
                }
            } else {
                sleep(POLL_INTERVAL).await;
            }

            if stop.load(Ordering::SeqCst)
                || pages_out.load(Ordering::SeqCst) == pages_in.load(Ordering::SeqCst)
            {
                stop_workers();
                return Ok::<_, Error>(());
            }
        }
    };

    let res = try_join!(workers, downloader, done);
    scraper.finalizer();
    res?;

    Ok(())
}
