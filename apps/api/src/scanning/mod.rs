// Form scraping: page session → scanner → classifier → SelectorMap.
// Scanning works on a DOM snapshot; scraper::Html is !Send, so parse and
// classify synchronously and never hold a parsed document across an await.

pub mod classifier;
pub mod handlers;
pub mod scanner;
pub mod scrape;
pub mod session;

pub use classifier::{FieldClassifier, KeywordTable};
pub use scrape::{scrape_form_fields, ScrapeOptions};
pub use session::{HttpSessionFactory, PageError, SessionFactory};
