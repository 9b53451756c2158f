//! Article, link and image extraction from fetched HTML.

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use super::ScrapeError;

/// One entry of an article listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub title: String,
    /// `href` of the entry's link, as written in the page.
    pub link: String,
    pub summary: Option<String>,
    /// `datetime` attribute of the entry's date element.
    pub published_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    pub src: String,
    pub alt: String,
}

/// CSS selectors describing an article listing. The defaults match
/// `<article class="post">` entries holding an `h2.title`, a link, a
/// `p.summary` and a `<time datetime="...">`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleLayout {
    pub article: String,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub date: String,
}

impl Default for ArticleLayout {
    fn default() -> Self {
        Self {
            article: "article.post".to_string(),
            title: "h2.title".to_string(),
            link: "a".to_string(),
            summary: "p.summary".to_string(),
            date: "time".to_string(),
        }
    }
}

/// Compiled [`ArticleLayout`].
#[derive(Debug, Clone)]
pub struct ArticleParser {
    article: Selector,
    title: Selector,
    link: Selector,
    summary: Selector,
    date: Selector,
}

fn compile(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

impl ArticleParser {
    pub fn new(layout: &ArticleLayout) -> Result<Self, ScrapeError> {
        Ok(Self {
            article: compile(&layout.article)?,
            title: compile(&layout.title)?,
            link: compile(&layout.link)?,
            summary: compile(&layout.summary)?,
            date: compile(&layout.date)?,
        })
    }

    /// Articles in document order. Entries without a title or a link element
    /// are skipped; a link element without `href` gives an empty link.
    pub fn parse(&self, html: &str) -> Vec<Article> {
        let doc = Html::parse_document(html);
        let mut articles = Vec::new();

        for entry in doc.select(&self.article) {
            let (title, link) = match (
                entry.select(&self.title).next(),
                entry.select(&self.link).next(),
            ) {
                (Some(t), Some(l)) => (t, l),
                _ => {
                    tracing::warn!("skipping article without title or link");
                    continue;
                }
            };
            articles.push(Article {
                title: text_of(title),
                link: link.value().attr("href").unwrap_or_default().to_string(),
                summary: entry.select(&self.summary).next().map(text_of),
                published_date: entry
                    .select(&self.date)
                    .next()
                    .and_then(|d| d.value().attr("datetime"))
                    .map(str::to_string),
            });
        }

        tracing::info!("parsed {} articles", articles.len());
        articles
    }
}

/// Text content with each text node trimmed and blank nodes dropped.
fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn elements<'a>(doc: &'a Html, name: &'a str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    doc.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(move |e| e.value().name() == name)
}

/// Prefixes root-relative paths (`/x`, not `//host/x`) with `base_url`.
fn absolutize(href: &str, base_url: &str) -> String {
    if href.starts_with('/') && !href.starts_with("//") && !base_url.is_empty() {
        format!("{}{}", base_url.trim_end_matches('/'), href)
    } else {
        href.to_string()
    }
}

/// `href` of every `<a>` that has one, in document order.
pub fn extract_links(html: &str, base_url: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    elements(&doc, "a")
        .filter_map(|a| a.value().attr("href"))
        .map(|href| absolutize(href, base_url))
        .collect()
}

/// `src` and `alt` of every `<img>` that has a `src`.
pub fn extract_images(html: &str, base_url: &str) -> Vec<Image> {
    let doc = Html::parse_document(html);
    elements(&doc, "img")
        .filter_map(|img| {
            let src = img.value().attr("src")?;
            Some(Image {
                src: absolutize(src, base_url),
                alt: img.value().attr("alt").unwrap_or_default().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
<html>
  <body>
    <article class="post">
      <h2 class="title">First article</h2>
      <a href="/article/1">Read more</a>
      <p class="summary">Summary of the first article.</p>
      <time datetime="2024-01-01">January 1, 2024</time>
    </article>
    <article class="post">
      <h2 class="title">Second article</h2>
      <a href="/article/2">Read more</a>
      <p class="summary">Summary of the second article.</p>
      <time datetime="2024-01-02">January 2, 2024</time>
    </article>
    <article class="post">
      <h2 class="title">Third article</h2>
      <a href="/article/3">Read more</a>
      <p class="summary">Summary of the third article.</p>
      <time datetime="2024-01-03">January 3, 2024</time>
    </article>
  </body>
</html>
"#;

    fn parser() -> ArticleParser {
        ArticleParser::new(&ArticleLayout::default()).unwrap()
    }

    #[test]
    fn parses_listing() {
        let articles = parser().parse(LISTING);
        assert_eq!(articles.len(), 3);
        assert_eq!(
            articles[0],
            Article {
                title: "First article".to_string(),
                link: "/article/1".to_string(),
                summary: Some("Summary of the first article.".to_string()),
                published_date: Some("2024-01-01".to_string()),
            }
        );
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["First article", "Second article", "Third article"]);
        assert_eq!(articles[2].published_date.as_deref(), Some("2024-01-03"));
    }

    #[test]
    fn optional_parts_and_incomplete_entries() {
        let html = r#"
            <article class="post"><h2 class="title">No link</h2></article>
            <article class="post"><a href="/x">orphan link</a></article>
            <article class="post">
              <h2 class="title">  Bare <em>entry</em> </h2><a>no href</a>
              <time>undated</time>
            </article>
            <article class="draft"><h2 class="title">Other class</h2><a href="/d"></a></article>
        "#;
        let articles = parser().parse(html);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Bare entry");
        assert_eq!(articles[0].link, "");
        assert_eq!(articles[0].summary, None);
        assert_eq!(articles[0].published_date, None);
    }

    #[test]
    fn custom_layout() {
        let layout = ArticleLayout {
            article: "li.item".to_string(),
            title: "span.name".to_string(),
            link: "a.more".to_string(),
            ..ArticleLayout::default()
        };
        let html = r#"<ul><li class="item"><span class="name">Item</span>
            <a href="/skip">x</a><a class="more" href="/item/9">more</a></li></ul>"#;
        let articles = ArticleParser::new(&layout).unwrap().parse(html);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].link, "/item/9");
    }

    #[test]
    fn bad_selector_is_error() {
        let layout = ArticleLayout {
            article: "article[".to_string(),
            ..ArticleLayout::default()
        };
        let err = ArticleParser::new(&layout).unwrap_err();
        assert!(matches!(err, ScrapeError::Selector { selector, .. } if selector == "article["));
    }

    #[test]
    fn links_are_made_absolute() {
        let links = extract_links(LISTING, "https://example.com/news/");
        assert_eq!(
            links,
            vec![
                "https://example.com/news/article/1",
                "https://example.com/news/article/2",
                "https://example.com/news/article/3",
            ]
        );

        let html = r#"<a href="https://other.test/">a</a><a href="//cdn.test/x">b</a>
            <a href="rel/page">c</a><a name="anchor">d</a>"#;
        assert_eq!(
            extract_links(html, "https://example.com"),
            vec!["https://other.test/", "//cdn.test/x", "rel/page"]
        );
        assert_eq!(extract_links(r#"<a href="/x">x</a>"#, ""), vec!["/x"]);
    }

    #[test]
    fn images_with_alt_text() {
        let html = r#"<img src="/img/a.png" alt="A"><img src="b.jpg"><img alt="no src">"#;
        assert_eq!(
            extract_images(html, "https://example.com"),
            vec![
                Image {
                    src: "https://example.com/img/a.png".to_string(),
                    alt: "A".to_string(),
                },
                Image {
                    src: "b.jpg".to_string(),
                    alt: String::new(),
                },
            ]
        );
    }
}
