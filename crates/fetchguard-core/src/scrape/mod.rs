//! Paginated page fetching through the URL gate, plus article, link and
//! image extraction from the fetched HTML.

mod extract;

pub use extract::{extract_images, extract_links, Article, ArticleLayout, ArticleParser, Image};

use std::time::Duration;

use crate::fetch::{FetchError, GuardedFetcher};

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u32 },
    #[error("invalid CSS selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },
}

/// One successfully fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub url: String,
    /// URL after redirects.
    pub final_url: String,
    pub html: String,
}

pub struct Scraper {
    fetcher: GuardedFetcher,
    base_url: String,
    parser: ArticleParser,
}

impl Scraper {
    /// Scraper for listings in the default [`ArticleLayout`].
    pub fn new(fetcher: GuardedFetcher, base_url: &str) -> Result<Self, ScrapeError> {
        Self::with_layout(fetcher, base_url, &ArticleLayout::default())
    }

    pub fn with_layout(
        fetcher: GuardedFetcher,
        base_url: &str,
        layout: &ArticleLayout,
    ) -> Result<Self, ScrapeError> {
        Ok(Self {
            fetcher,
            base_url: base_url.to_string(),
            parser: ArticleParser::new(layout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of page `n`: `page=n` appended to the base URL's query.
    pub fn page_url(&self, n: u32) -> String {
        match url::Url::parse(&self.base_url) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair("page", &n.to_string());
                url.to_string()
            }
            // Left as text; the gate reports it as INVALID_URL.
            Err(_) => format!("{}?page={}", self.base_url, n),
        }
    }

    /// Fetches `url` (gate-checked, redirects re-checked); returns `(final_url, body_text)`.
    pub fn fetch_page(&self, url: &str) -> Result<(String, String), ScrapeError> {
        let fetched = self.fetcher.get(url)?;
        if fetched.redirected() {
            tracing::info!("redirected: {} -> {}", url, fetched.final_url());
        }
        let resp = fetched.response;
        if !resp.is_success() {
            return Err(ScrapeError::Status {
                url: resp.url,
                status: resp.status,
            });
        }
        let text = resp.text();
        Ok((resp.url, text))
    }

    pub fn parse_articles(&self, html: &str) -> Vec<Article> {
        self.parser.parse(html)
    }

    /// Fetches pages `1..=page_count`, sleeping `delay` between pages.
    ///
    /// A failing page is logged and skipped; the rest are still attempted.
    pub fn scrape_pages(&self, page_count: u32, delay: Duration) -> Vec<Page> {
        let mut pages = Vec::new();
        self.each_page(page_count, delay, |page| pages.push(page));
        tracing::info!("scraped {} of {} pages", pages.len(), page_count);
        pages
    }

    /// Articles from pages `1..=page_count`, in page order.
    pub fn scrape(&self, page_count: u32, delay: Duration) -> Vec<Article> {
        let mut articles = Vec::new();
        self.each_page(page_count, delay, |page| {
            articles.extend(self.parser.parse(&page.html));
        });
        tracing::info!("collected {} articles from {} pages", articles.len(), page_count);
        articles
    }

    fn each_page(&self, page_count: u32, delay: Duration, mut on_page: impl FnMut(Page)) {
        for n in 1..=page_count {
            let url = self.page_url(n);
            match self.fetch_page(&url) {
                Ok((final_url, html)) => on_page(Page {
                    number: n,
                    url,
                    final_url,
                    html,
                }),
                Err(e) => tracing::error!("failed to scrape page {}: {}", n, e),
            }
            if n < page_count && !delay.is_zero() {
                tracing::debug!("rate limiting: sleeping {:?}", delay);
                std::thread::sleep(delay);
            }
        }
    }
}
