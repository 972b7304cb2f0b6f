//! Scan command: find broken links on one page

use crate::browser::BrowserSession;
use crate::checker::LinkChecker;
use crate::links::{collect_page_links, AnchorSource};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::fmt;
use std::process::ExitCode;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Args)]
pub struct ScanArgs {
    /// Page to scan for broken links
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// Timeout per request and page load in milliseconds
    #[arg(long, env = "LINK_SCAN_TIMEOUT", default_value = "30000", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// User agent for HTTP checks and the browser
    #[arg(long, env = "LINK_SCAN_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

/// Configuration for a scan
pub struct ScanConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Links found on a page and the ones that failed validation
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub links: Vec<String>,
    pub bad_links: Vec<String>,
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for link in &self.links {
            writeln!(f, "{}", link)?;
        }
        writeln!(f)?;
        if !self.bad_links.is_empty() {
            writeln!(f, "Bad Links:")?;
            for link in &self.bad_links {
                writeln!(f, "{}", link)?;
            }
        }
        Ok(())
    }
}

/// Run the scan command
pub async fn run_scan(args: ScanArgs) -> Result<ExitCode> {
    let [url] = args.urls.as_slice() else {
        println!("Usage: link-scan <url_to_scan>");
        return Ok(ExitCode::FAILURE);
    };

    let config = ScanConfig {
        timeout: Duration::from_millis(args.timeout),
        user_agent: args.user_agent,
    };
    let checker = LinkChecker::new(&config.user_agent, config.timeout)?;

    if !checker.is_html_page(url).await {
        println!("{} is not a valid HTML page.", url);
        return Ok(ExitCode::FAILURE);
    }

    let report = scan_page(&checker, url, &config).await?;

    if args.json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        print!("{}", report);
    }

    tracing::info!(
        "Done: {}/{} OK",
        report.links.len() - report.bad_links.len(),
        report.links.len()
    );

    Ok(ExitCode::SUCCESS)
}

/// Collect the links on an HTML page in headless Chrome and validate each one.
///
/// The browser session is closed before returning, whether or not
/// collection succeeded.
pub async fn scan_page(checker: &LinkChecker, url: &str, config: &ScanConfig) -> Result<ScanReport> {
    let session = BrowserSession::launch(&config.user_agent, config.timeout).await?;
    let collected = collect_page_links(&session, url).await;
    let closed = session.close().await;
    let links = settle(collected, closed)?;

    Ok(validate(checker, links).await)
}

/// Like [`scan_page`], with the page rendered by any [`AnchorSource`]
pub async fn scan_links<S: AnchorSource>(
    source: &S,
    checker: &LinkChecker,
    url: &str,
) -> Result<ScanReport> {
    let links = collect_page_links(source, url).await?;
    Ok(validate(checker, links).await)
}

async fn validate(checker: &LinkChecker, links: Vec<String>) -> ScanReport {
    tracing::info!("Checking {} links...", links.len());
    let bad_links = checker.invalid_links(&links).await;
    ScanReport { links, bad_links }
}

// A collection error outranks a failure to close the browser afterwards.
fn settle<T>(collected: Result<T>, closed: Result<()>) -> Result<T> {
    match (collected, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            tracing::warn!("{:#}", close_err);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::PageAnchors;
    use anyhow::anyhow;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct StaticPage(Vec<String>);

    impl AnchorSource for StaticPage {
        async fn anchor_hrefs(&self, _url: &str) -> Result<PageAnchors> {
            Ok(PageAnchors {
                hrefs: self.0.iter().cloned().map(Some).collect(),
                base: None,
            })
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_report_with_bad_links() {
        let report = ScanReport {
            links: strings(&["https://a.test/", "https://b.test/x"]),
            bad_links: strings(&["https://b.test/x"]),
        };
        assert_eq!(
            report.to_string(),
            "https://a.test/\nhttps://b.test/x\n\nBad Links:\nhttps://b.test/x\n"
        );
    }

    #[test]
    fn test_report_without_bad_links() {
        let report = ScanReport {
            links: strings(&["https://a.test/"]),
            bad_links: vec![],
        };
        assert_eq!(report.to_string(), "https://a.test/\n\n");
    }

    #[test]
    fn test_report_json() {
        let report = ScanReport {
            links: strings(&["https://a.test/"]),
            bad_links: vec![],
        };
        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            r#"{"links":["https://a.test/"],"bad_links":[]}"#
        );
    }

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_settle_prefers_collection_error() {
        let err = settle::<()>(Err(anyhow!("Failed to load page")), Err(anyhow!("close failed")))
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to load page");
    }

    #[test]
    fn test_settle_reports_close_error() {
        let err = settle(Ok(1), Err(anyhow!("close failed"))).unwrap_err();
        assert_eq!(err.to_string(), "close failed");
        assert_eq!(settle(Ok(1), Ok(())).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_scan_reports_one_broken_link() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let uri = server.uri();
        let page = StaticPage(vec![
            format!("{}/ok#section", uri),
            format!("{}/ok?ref=nav", uri),
            format!("{}/gone", uri),
        ]);
        let checker = LinkChecker::new("link-scan-test", Duration::from_secs(5)).unwrap();

        let report = scan_links(&page, &checker, &uri).await.unwrap();
        assert_eq!(report.links, vec![format!("{}/gone", uri), format!("{}/ok", uri)]);
        assert_eq!(report.bad_links, vec![format!("{}/gone", uri)]);
        assert_eq!(
            report.to_string(),
            format!("{0}/gone\n{0}/ok\n\nBad Links:\n{0}/gone\n", uri)
        );
    }
}
