use std::path::Path;

use castweb_crawler::PageLocation;
use castweb_imdb::{scrap_page, ImdbScraperConfig, Step};

fn scrap_person_into(csv_file: &Path) {
    let config = ImdbScraperConfig {
        csv_file: Some(csv_file.to_path_buf()),
        ..ImdbScraperConfig::new("")
    };

    scrap_page(
        &config,
        Step::PersonPage,
        include_str!("fixtures/person.html").to_string(),
        PageLocation::Path("tests/fixtures/person.html".into()),
    )
    .unwrap();
}

#[test]
fn consecutive_runs_each_write_their_output() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");

    scrap_person_into(&first);
    scrap_person_into(&second);

    let expected = "actor/actress,movie_or_TV_name\nJane Doe,Show A\nJane Doe,Show B\n";
    assert_eq!(expected, std::fs::read_to_string(&first).unwrap());
    assert_eq!(expected, std::fs::read_to_string(&second).unwrap());
}

#[test]
fn rerun_on_same_output_writes_again() {
    let dir = tempfile::tempdir().unwrap();
    let csv_file = dir.path().join("credits.csv");

    scrap_person_into(&csv_file);
    std::fs::remove_file(&csv_file).unwrap();
    scrap_person_into(&csv_file);

    assert_eq!(
        "actor/actress,movie_or_TV_name\nJane Doe,Show A\nJane Doe,Show B\n",
        std::fs::read_to_string(&csv_file).unwrap()
    );
}
