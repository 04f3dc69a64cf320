use castweb_crawler::{CrawlerConfig, OnError};

#[test]
fn yaml_overrides_defaults() {
    let yaml = r#"
userAgent: test-agent
concurrentDownloads: 2
numWorkers: 3
onScrapError: Fail
maxRequests: 50
dedup: false
"#;
    let conf: CrawlerConfig = serde_yaml::from_str(yaml).unwrap();

    assert_eq!("test-agent", conf.user_agent);
    assert_eq!(2, conf.concurrent_downloads);
    assert_eq!(3, conf.num_workers);
    assert_eq!(OnError::Fail, conf.on_scrap_error);
    assert_eq!(OnError::SkipAndLog, conf.on_dl_error);
    assert_eq!(Some(50), conf.max_requests);
    assert!(!conf.dedup);
    assert_eq!(CrawlerConfig::default().page_buffer, conf.page_buffer);
}

#[test]
fn empty_yaml_is_default() {
    let conf: CrawlerConfig = serde_yaml::from_str("{}").unwrap();
    let default = CrawlerConfig::default();

    assert_eq!(default.user_agent, conf.user_agent);
    assert_eq!(default.num_workers, conf.num_workers);
    assert!(conf.handle_sigint);
}
