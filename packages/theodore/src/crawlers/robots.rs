//! Robots.txt parser and checker.

use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::error::FetchResult;
use crate::traits::http::HttpClient;

/// Parsed robots.txt rules.
#[derive(Debug, Clone, Default)]
pub struct RobotsTxt {
    /// Rules per user-agent token (lowercase)
    groups: HashMap<String, AgentRules>,

    /// Rules for `*`
    default_rules: AgentRules,

    /// `Sitemap:` directives, in file order
    sitemaps: Vec<String>,
}

/// Allow/disallow prefixes for one user-agent group.
#[derive(Debug, Clone, Default)]
struct AgentRules {
    disallow: Vec<String>,
    allow: Vec<String>,
}

impl AgentRules {
    /// Longest matching prefix wins; ties go to allow.
    fn is_allowed(&self, path: &str) -> bool {
        let longest = |rules: &[String]| {
            rules
                .iter()
                .filter(|prefix| path.starts_with(prefix.as_str()))
                .map(String::len)
                .max()
        };

        match (longest(&self.allow), longest(&self.disallow)) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(allow), Some(disallow)) => allow >= disallow,
        }
    }
}

impl RobotsTxt {
    /// Parse robots.txt content. Malformed lines are ignored.
    pub fn parse(content: &str) -> Self {
        let mut robots = Self::default();
        let mut current_agents: Vec<String> = Vec::new();
        let mut current_rules = AgentRules::default();
        // Consecutive User-agent lines share one group.
        let mut in_rules = false;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let directive = directive.trim().to_lowercase();
            let value = value.trim();

            match directive.as_str() {
                "user-agent" => {
                    if in_rules {
                        robots.store_group(&current_agents, &current_rules);
                        current_agents.clear();
                        current_rules = AgentRules::default();
                        in_rules = false;
                    }
                    current_agents.push(value.to_lowercase());
                }
                "disallow" => {
                    in_rules = true;
                    if !value.is_empty() {
                        current_rules.disallow.push(value.to_string());
                    }
                }
                "allow" => {
                    in_rules = true;
                    if !value.is_empty() {
                        current_rules.allow.push(value.to_string());
                    }
                }
                "sitemap" => {
                    if !value.is_empty() {
                        robots.sitemaps.push(value.to_string());
                    }
                }
                _ => {}
            }
        }

        robots.store_group(&current_agents, &current_rules);
        robots
    }

    fn store_group(&mut self, agents: &[String], rules: &AgentRules) {
        for agent in agents {
            if agent == "*" {
                self.default_rules = rules.clone();
            } else {
                self.groups.insert(agent.clone(), rules.clone());
            }
        }
    }

    /// Check if a path is allowed for a user-agent.
    ///
    /// A group applies when its token equals the agent name or is contained
    /// in it; otherwise the `*` group applies.
    pub fn is_allowed(&self, user_agent: &str, path: &str) -> bool {
        let agent = user_agent.to_lowercase();

        let rules = self
            .groups
            .get(&agent)
            .or_else(|| {
                self.groups
                    .iter()
                    .filter(|(token, _)| agent.contains(token.as_str()))
                    .max_by_key(|(token, _)| token.len())
                    .map(|(_, rules)| rules)
            })
            .unwrap_or(&self.default_rules);

        rules.is_allowed(path)
    }

    /// Check a full URL, using its path.
    pub fn is_url_allowed(&self, user_agent: &str, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => self.is_allowed(user_agent, parsed.path()),
            Err(_) => true,
        }
    }

    /// Get listed sitemaps.
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }
}

/// Fetch and parse robots.txt for a site.
///
/// A non-2xx response means "no robots.txt" and yields `Ok(None)`.
pub async fn fetch_robots_txt<H: HttpClient + ?Sized>(
    http: &H,
    base_url: &Url,
    timeout: Duration,
) -> FetchResult<Option<RobotsTxt>> {
    let robots_url = base_url
        .join("/robots.txt")
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{}/robots.txt", base_url.as_str().trim_end_matches('/')));

    let response = http.get(&robots_url, timeout).await?;
    if !response.is_success() {
        return Ok(None);
    }
    Ok(Some(RobotsTxt::parse(&response.body)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockHttpClient;

    #[test]
    fn test_parse_basic() {
        let content = r#"
User-agent: *
Disallow: /private/
Disallow: /admin/
Allow: /public/

Sitemap: https://example.com/sitemap.xml
        "#;

        let robots = RobotsTxt::parse(content);

        assert!(robots.is_allowed("TheodoreBot", "/public/page"));
        assert!(!robots.is_allowed("TheodoreBot", "/private/page"));
        assert!(!robots.is_allowed("TheodoreBot", "/admin/"));
        assert!(robots.is_allowed("TheodoreBot", "/about"));
        assert_eq!(robots.sitemaps(), &["https://example.com/sitemap.xml".to_string()]);
    }

    #[test]
    fn test_specific_group_overrides_default() {
        let content = r#"
User-agent: *
Disallow: /

User-agent: theodorebot
Disallow: /drafts
        "#;

        let robots = RobotsTxt::parse(content);

        assert!(!robots.is_allowed("OtherBot", "/about"));
        assert!(robots.is_allowed("TheodoreBot", "/about"));
        assert!(!robots.is_allowed("TheodoreBot/1.0", "/drafts/x"));
    }

    #[test]
    fn test_grouped_user_agents() {
        let content = "User-agent: a\nUser-agent: b\nDisallow: /x\n";
        let robots = RobotsTxt::parse(content);

        assert!(!robots.is_allowed("a", "/x"));
        assert!(!robots.is_allowed("b", "/x"));
    }

    #[test]
    fn test_longest_match_wins() {
        let content = r#"
User-agent: *
Disallow: /company/
Allow: /company/about
        "#;

        let robots = RobotsTxt::parse(content);

        assert!(!robots.is_allowed("Bot", "/company/internal"));
        assert!(robots.is_allowed("Bot", "/company/about-us"));
    }

    #[test]
    fn test_comments_and_empty() {
        let robots = RobotsTxt::parse("# nothing here\n\n");
        assert!(robots.is_allowed("AnyBot", "/any/path"));
        assert!(robots.sitemaps().is_empty());

        let robots = RobotsTxt::parse("User-agent: * # everyone\nDisallow: /tmp # scratch\n");
        assert!(!robots.is_allowed("AnyBot", "/tmp/file"));
    }

    #[tokio::test]
    async fn test_fetch_missing_robots_is_none() {
        let http = MockHttpClient::new();
        let base = Url::parse("https://example.com").unwrap();

        let robots = fetch_robots_txt(&http, &base, Duration::from_secs(1)).await.unwrap();
        assert!(robots.is_none());
        assert_eq!(http.calls(), vec!["https://example.com/robots.txt"]);
    }
}
