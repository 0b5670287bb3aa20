pub mod browser;
pub mod demo;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod urls;

pub use browser::{BrowserOptions, ChromeRenderer, PageRenderer};
pub use error::ScraperError;
pub use fetcher::Fetcher;
pub use urls::is_listing_url;
