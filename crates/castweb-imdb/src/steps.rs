//! The three page steps chained from a title page to its cast filmographies.
//!
//! Every step is a pure function of one parsed page: it never keeps the
//! document around and holds no state between calls.

use std::fmt;

use castweb_crawler::FetchRequest;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

use crate::css;
use crate::error::StepError;
use crate::record::Credit;

lazy_static! {
    static ref CAST_CREW_LINK: Selector =
        Selector::parse(css::title_page::CAST_CREW_LINK).unwrap();
    static ref PRIMARY_PHOTO: Selector =
        Selector::parse(css::crew_listing::PRIMARY_PHOTO).unwrap();
    static ref NAME: Selector =
        Selector::parse(css::person_page::NAME).unwrap();
    static ref ACTING_HEAD: Selector =
        Selector::parse(css::person_page::ACTING_HEAD).unwrap();
    static ref ROW: Selector =
        Selector::parse(css::person_page::ROW).unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Step {
    #[cfg_attr(feature = "clap", value(name = "title"))]
    TitlePage,
    #[cfg_attr(feature = "clap", value(name = "crew"))]
    CrewListing,
    #[cfg_attr(feature = "clap", value(name = "person"))]
    PersonPage,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TitlePage => write!(f, "title"),
            Self::CrewListing => write!(f, "crew"),
            Self::PersonPage => write!(f, "person"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutput {
    Follow(Vec<FetchRequest<Step>>),
    Emit(Vec<Credit>),
}

impl Step {
    pub fn run(self, document: &Html, origin: &str) -> Result<StepOutput, StepError> {
        match self {
            Self::TitlePage => title_page(document, origin).map(StepOutput::Follow),
            Self::CrewListing => crew_listing(document, origin).map(StepOutput::Follow),
            Self::PersonPage => person_page(document).map(StepOutput::Emit),
        }
    }

    /// The step handling the pages this one links to
    pub fn next(self) -> Option<Self> {
        match self {
            Self::TitlePage => Some(Self::CrewListing),
            Self::CrewListing => Some(Self::PersonPage),
            Self::PersonPage => None,
        }
    }
}

/// Follows the "Cast & Crew" link of a title page.
pub fn title_page(document: &Html, origin: &str) -> Result<Vec<FetchRequest<Step>>, StepError> {
    let href = document
        .select(&CAST_CREW_LINK)
        .next()
        .and_then(|link| link.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .ok_or_else(|| StepError::miss(Step::TitlePage, css::title_page::CAST_CREW_LINK))?;

    Ok(vec![FetchRequest::new(
        absolute_url(origin, href),
        Step::CrewListing,
    )])
}

/// Follows the profile link of every billed cast member.
///
/// Crew rows carry no primary photo cell and are never followed. A page
/// without any cast is valid and yields no request.
pub fn crew_listing(document: &Html, origin: &str) -> Result<Vec<FetchRequest<Step>>, StepError> {
    let requests = document
        .select(&PRIMARY_PHOTO)
        .filter_map(|cell| {
            let href = child_elements(cell)
                .find(|child| child.value().name() == "a")
                .and_then(|link| link.value().attr("href"))
                .map(str::trim)
                .filter(|href| !href.is_empty());
            if href.is_none() {
                log::debug!("Skipping primary photo cell without link");
            }
            href
        })
        .map(|href| FetchRequest::new(absolute_url(origin, href), Step::PersonPage))
        .collect();

    Ok(requests)
}

/// Pairs the person's name with every title of their acting filmography.
///
/// The acting section is the one headed by exactly `filmo-head-actor` or
/// `filmo-head-actress`. A page without one yields no credits, a page with
/// several is a miss.
pub fn person_page(document: &Html) -> Result<Vec<Credit>, StepError> {
    let name = document
        .select(&NAME)
        .next()
        .map(collapsed_text)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| StepError::miss(Step::PersonPage, css::person_page::NAME))?;

    let mut heads = document.select(&ACTING_HEAD);
    let head = match (heads.next(), heads.next()) {
        (Some(head), None) => head,
        (None, _) => {
            log::debug!("No acting section for {name}");
            return Ok(vec![]);
        }
        _ => return Err(StepError::miss(Step::PersonPage, css::person_page::ACTING_HEAD)),
    };

    let section = head
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .next()
        .filter(|section| {
            section
                .value()
                .classes()
                .any(|class| class == css::person_page::SECTION_CLASS)
        })
        .ok_or_else(|| StepError::miss(Step::PersonPage, css::person_page::SECTION_CLASS))?;

    let credits = section
        .select(&ROW)
        .filter_map(row_title)
        .map(|title| Credit::new(name.as_str(), title))
        .collect();

    Ok(credits)
}

fn child_elements<'a>(elem: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    elem.children().filter_map(ElementRef::wrap)
}

/// Text of the first `<a>` or `<b><a>` child of a filmography row
fn row_title(row: ElementRef) -> Option<String> {
    child_elements(row)
        .find_map(|child| match child.value().name() {
            "a" => Some(child),
            "b" => child_elements(child).find(|elem| elem.value().name() == "a"),
            _ => None,
        })
        .map(collapsed_text)
        .filter(|title| !title.is_empty())
}

fn collapsed_text(elem: ElementRef) -> String {
    elem.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn absolute_url(origin: &str, href: &str) -> String {
    if href.starts_with("https://") || href.starts_with("http://") {
        href.to_string()
    } else {
        format!(
            "{}/{}",
            origin.trim_end_matches('/'),
            href.trim_start_matches('/')
        )
    }
}
