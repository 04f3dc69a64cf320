use std::cell::RefCell;
use std::fmt;
use std::path::PathBuf;

pub trait Scrapable {
    type Config: Clone + Send + 'static;

    /// Identifies which scraping logic a fetched page must go through
    type Step: Copy + fmt::Debug + Send + 'static;

    fn new(config: &Self::Config) -> anyhow::Result<Self>
    where
        Self: Sized;

    fn seed(&self) -> Vec<FetchRequest<Self::Step>>;

    /// Called on every follow-up request before it is scheduled
    fn accept(&self, _url: &str, _step: Self::Step) -> bool {
        true
    }

    fn scrap(&mut self, page: String, ctx: &ScrapingContext<Self::Step>) -> anyhow::Result<()>;

    fn finalizer(&mut self) {}
}

/// A page to download along with the step that will scrap it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest<S> {
    pub url: String,
    pub step: S,
}

impl<S> FetchRequest<S> {
    pub fn new(url: impl Into<String>, step: S) -> Self {
        Self {
            url: url.into(),
            step,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLocation {
    Url(String),
    Path(PathBuf),
}

impl fmt::Display for PageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug)]
pub struct ScrapingContext<S> {
    location: PageLocation,
    step: S,
    requests: RefCell<Vec<FetchRequest<S>>>,
}

impl<S: Copy> ScrapingContext<S> {
    pub fn new(location: PageLocation, step: S) -> Self {
        Self {
            location,
            step,
            requests: RefCell::new(vec![]),
        }
    }

    pub fn location(&self) -> &PageLocation {
        &self.location
    }

    pub fn step(&self) -> S {
        self.step
    }

    /// Queues a follow-up request, scheduled once the current scrap succeeds
    pub fn send_request(&self, request: FetchRequest<S>) {
        self.requests.borrow_mut().push(request);
    }

    pub fn into_requests(self) -> Vec<FetchRequest<S>> {
        self.requests.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_keeps_requests_in_order() {
        let ctx = ScrapingContext::new(PageLocation::Url("https://a.com/".into()), 0u8);
        ctx.send_request(FetchRequest::new("https://a.com/1", 1));
        ctx.send_request(FetchRequest::new("https://a.com/2", 1));

        assert_eq!(0, ctx.step());
        assert_eq!(
            vec![
                FetchRequest::new("https://a.com/1", 1),
                FetchRequest::new("https://a.com/2", 1)
            ],
            ctx.into_requests()
        );
    }

    #[test]
    fn location_display() {
        assert_eq!(
            "https://a.com/x",
            PageLocation::Url("https://a.com/x".into()).to_string()
        );
        assert_eq!(
            "pages/x.html",
            PageLocation::Path("pages/x.html".into()).to_string()
        );
    }
}
