//! Site crawling building blocks used by link discovery.
//!
//! - `RobotsTxt` - robots.txt parsing and `Sitemap:` directives
//! - `parse_sitemap` - urlset and sitemap index parsing
//! - `links` - URL normalization, same-site checks and anchor extraction

pub mod links;
pub mod robots;
pub mod sitemap;

pub use links::{extract_links, normalize_url, parse_website};
pub use robots::{fetch_robots_txt, RobotsTxt};
pub use sitemap::{parse_sitemap, SitemapDocument};
