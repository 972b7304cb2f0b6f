//! link-scan: find broken links on a web page
//!
//! The page is rendered in headless Chrome, its anchors are normalized
//! and deduplicated, and each link is validated with an HTTP HEAD request.

pub mod browser;
pub mod checker;
pub mod links;
pub mod logging;
pub mod scan;

pub use browser::BrowserSession;
pub use checker::{is_valid_outcome, CheckError, LinkChecker};
pub use links::{collect_links, collect_page_links, normalize, AnchorSource, PageAnchors};
pub use scan::{scan_links, scan_page, ScanConfig, ScanReport};
