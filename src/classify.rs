//! Rule-based classification of new URLs.
//!
//! [`RULES`] is evaluated top to bottom and the first match wins, so the
//! table order is part of the behaviour: a path-qualified rule for a
//! domain must sit above the catch-all rule for the same domain.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::models::ResourceType::{Blog, Book, Community, Repository, Website};
use crate::models::{Classification, ResourceType};

/// Maximum length of an inferred title, in characters.
pub const MAX_TITLE_CHARS: usize = 120;

/// One row of the classification table.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Substring of the lowercased, `www.`-stripped host.
    pub domain: &'static str,
    /// Substring of the lowercased path; empty matches any path.
    pub path: &'static str,
    pub resource_type: ResourceType,
    pub language: &'static str,
    pub category: &'static str,
}

const fn rule(
    domain: &'static str,
    path: &'static str,
    resource_type: ResourceType,
    language: &'static str,
    category: &'static str,
) -> Rule {
    Rule {
        domain,
        path,
        resource_type,
        language,
        category,
    }
}

pub static RULES: &[Rule] = &[
    // Code hosts
    rule("gist.github.com", "", Repository, "Other", "General"),
    rule("github.com", "", Repository, "Other", "General"),
    rule("gitlab.com", "", Repository, "Other", "General"),
    // Hugging Face
    rule("huggingface.co", "/spaces/", Website, "Python", "Machine Learning"),
    rule("huggingface.co", "/blog/", Blog, "Python", "Machine Learning"),
    rule("huggingface.co", "/docs/", Website, "Python", "Machine Learning"),
    rule("huggingface.co", "", Website, "Python", "Machine Learning"),
    // App stores and marketplaces
    rule("apps.apple.com", "", Website, "Other", "General"),
    rule("play.google.com", "", Website, "Other", "General"),
    rule("marketplace.visualstudio.com", "", Website, "Other", "Development"),
    // R blogs and documentation
    rule("r-bloggers.com", "", Blog, "R", "General"),
    rule("rviews.rstudio.com", "", Blog, "R", "General"),
    rule("posit.co", "/blog/", Blog, "R", "General"),
    rule("posit.co", "", Website, "R", "General"),
    rule("tidyverse.org", "", Website, "R", "General"),
    rule("rstudio.com", "", Website, "R", "General"),
    rule("rfortherestofus.com", "", Blog, "R", "General"),
    rule("r-project.org", "", Website, "R", "General"),
    rule("thinkr.fr", "", Blog, "R", "General"),
    rule("r-lib.org", "", Website, "R", "General"),
    rule("emilyriederer.com", "", Blog, "R", "General"),
    rule("dominicroye.github.io", "", Website, "R", "Visualization"),
    rule("walker-data.com", "", Website, "R", "GIS"),
    rule("productive-r-workflow.com", "", Website, "R", "Tutorial"),
    rule("lindeloev.github.io", "", Website, "R", "Statistics"),
    rule("cynkra.github.io", "", Website, "R", "General"),
    rule("futurize.futureverse.org", "", Website, "R", "General"),
    rule("ragnar.tidyverse.org", "", Website, "R", "General"),
    rule("indrajeetpatil.github.io", "", Website, "R", "Packages"),
    rule("rwarehouse.netlify.app", "", Website, "R", "General"),
    rule("ggsql.org", "", Website, "R", "General"),
    // Python
    rule("py-pkgs.org", "", Book, "Python", "Packages"),
    rule("docs.langchain.com", "", Website, "Python", "Machine Learning"),
    rule("probabl.ai", "", Blog, "Python", "Machine Learning"),
    // Posit / Quarto tooling
    rule("posit-dev.github.io", "", Website, "R", "General"),
    rule("quarto.org", "", Website, "Other", "General"),
    rule("opencode.ai", "", Website, "Other", "Development"),
    // Shiny
    rule("shinyapps.io", "", Website, "R", "Shiny"),
    rule("shinylive.io", "", Website, "R", "Shiny"),
    rule("connect.posit.cloud", "", Website, "R", "Shiny"),
    rule("pub.current.posit.team", "", Website, "R", "Shiny"),
    rule("blockr.cloud", "", Website, "R", "Shiny"),
    rule("bristolmyerssquibb.github.io", "", Website, "R", "Shiny"),
    // Data science and ML
    rule("developer.nvidia.com", "", Website, "Other", "Machine Learning"),
    rule("databrickslabs.github.io", "", Website, "Python", "Machine Learning"),
    rule("agents.md", "", Website, "Other", "Machine Learning"),
    rule("modelcontextprotocol.io", "", Website, "Other", "Machine Learning"),
    rule("bmad-method.org", "", Website, "Other", "Machine Learning"),
    // French tech blogs
    rule("korben.info", "", Blog, "Other", "General"),
    rule("mathieugrenier.fr", "", Blog, "Other", "General"),
    rule("sspcloud.fr", "", Website, "R", "General"),
    rule("ssm-agriculture.github.io", "", Website, "R", "General"),
    // Communities
    rule("lobste.rs", "", Community, "Other", "Development"),
    rule("news.ycombinator.com", "", Community, "Other", "General"),
    rule("reddit.com", "", Community, "Other", "General"),
    // Personal sites
    rule("henry.codes", "", Blog, "Other", "General"),
    rule("mbuffett.com", "", Blog, "Other", "General"),
    rule("bioinfo.kaibitz.com", "", Website, "Other", "Bioinformatics"),
    rule("gexijin.github.io", "", Website, "R", "Bioinformatics"),
    // Data, art
    rule("data-to-art.com", "", Website, "Other", "Visualization"),
    rule("datanovia.com", "", Website, "R", "Statistics"),
    // Tools and apps
    rule("vert.sh", "", Website, "Other", "Development"),
    rule("openapps.sh", "", Website, "Other", "Development"),
    rule("wizwand.com", "", Website, "Other", "Machine Learning"),
    rule("zeroclawlabs.ai", "", Website, "Other", "Machine Learning"),
    rule("zensical.org", "", Website, "Other", "Development"),
    rule("smallweb.cc", "", Website, "Other", "Development"),
    rule("chat.z.ai", "", Website, "Other", "Machine Learning"),
    // Documentation
    rule("loreabad6.github.io", "", Website, "R", "GIS"),
    rule("ivelasq-r-pharma", "", Website, "R", "General"),
    rule("m.canouil.dev", "", Website, "R", "General"),
    // Any other GitHub Pages site; keep below the specific *.github.io rows.
    rule(".github.io", "", Website, "Other", "General"),
    // Enterprise and generic blogs
    rule("codecentric.de", "", Blog, "Other", "General"),
    rule("blog.", "", Blog, "Other", "General"),
    rule("davisvaughan.com", "", Blog, "R", "General"),
];

static BLOG_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(posts?|blog|articles?|writing)/").unwrap());

/// Classification for URLs no rule matches.
pub const DEFAULT_CLASSIFICATION: Classification = Classification {
    resource_type: Website,
    language: "Other",
    category: "General",
};

const BLOG_FALLBACK: Classification = Classification {
    resource_type: Blog,
    language: "Other",
    category: "General",
};

/// Lowercased host without a leading `www.`, and lowercased path.
/// Unparseable URLs yield empty strings.
fn host_and_path(url: &str) -> (String, String) {
    match Url::parse(url.trim()) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or("").to_lowercase();
            let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
            (host, parsed.path().to_lowercase())
        }
        Err(_) => (String::new(), String::new()),
    }
}

/// Infer (type, language, category) for a URL. Never fails.
pub fn classify(url: &str) -> Classification {
    classify_with(RULES, url)
}

/// Classify against an explicit rule table.
pub fn classify_with(rules: &[Rule], url: &str) -> Classification {
    let (host, path) = host_and_path(url);

    if !host.is_empty() {
        let hit = rules
            .iter()
            .find(|r| host.contains(r.domain) && (r.path.is_empty() || path.contains(r.path)));
        if let Some(r) = hit {
            return Classification {
                resource_type: r.resource_type,
                language: r.language,
                category: r.category,
            };
        }
    }

    if BLOG_PATH.is_match(&path) {
        return BLOG_FALLBACK;
    }

    DEFAULT_CLASSIFICATION
}

/// Pick a title for a new entry.
///
/// Uses the fetched page title when there is one. Otherwise builds
/// `"host — Last Segment"` from the URL, and finally the bare host.
pub fn infer_title(url: &str, fetched: Option<&str>, max_chars: usize) -> String {
    if let Some(title) = fetched.map(str::trim).filter(|t| !t.is_empty()) {
        return truncate_chars(title, max_chars);
    }

    let (host, _) = host_and_path(url);
    let original_path = Url::parse(url.trim())
        .map(|u| u.path().to_string())
        .unwrap_or_default();
    let slug = original_path
        .split('/')
        .filter(|s| !s.is_empty())
        .last()
        .map(|s| title_case(&s.replace(['-', '_'], " ")));

    match slug {
        Some(slug) if !slug.trim().is_empty() => {
            truncate_chars(&format!("{} — {}", host, slug), max_chars)
        }
        _ => truncate_chars(&host, max_chars),
    }
}

/// Uppercase the first letter of every word, lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(url: &str) -> (String, &'static str, &'static str) {
        let c = classify(url);
        (c.resource_type.to_string(), c.language, c.category)
    }

    #[test]
    fn test_github_repository() {
        assert_eq!(
            triple("https://github.com/user/repo"),
            ("Repository".to_string(), "Other", "General")
        );
    }

    #[test]
    fn test_huggingface_blog_before_catch_all() {
        assert_eq!(
            triple("https://huggingface.co/blog/x"),
            ("Blog".to_string(), "Python", "Machine Learning")
        );
        assert_eq!(
            triple("https://huggingface.co/models"),
            ("Website".to_string(), "Python", "Machine Learning")
        );
    }

    #[test]
    fn test_www_prefix_and_case_ignored() {
        assert_eq!(
            triple("https://WWW.R-Bloggers.com/2024/01/post/"),
            ("Blog".to_string(), "R", "General")
        );
    }

    #[test]
    fn test_path_fallback_blog() {
        assert_eq!(
            triple("https://unknown-site.example/blog/post-1"),
            ("Blog".to_string(), "Other", "General")
        );
        assert_eq!(
            triple("https://unknown-site.example/Articles/x"),
            ("Blog".to_string(), "Other", "General")
        );
    }

    #[test]
    fn test_default_triple() {
        assert_eq!(
            triple("https://unknown-site.example/about"),
            ("Website".to_string(), "Other", "General")
        );
        assert_eq!(triple("not a url"), ("Website".to_string(), "Other", "General"));
    }

    #[test]
    fn test_specific_github_io_rule_wins() {
        assert_eq!(
            triple("https://lindeloev.github.io/tests-as-linear/"),
            ("Website".to_string(), "R", "Statistics")
        );
        assert_eq!(
            triple("https://someone.github.io/"),
            ("Website".to_string(), "Other", "General")
        );
    }

    #[test]
    fn test_rule_order_is_load_bearing() {
        let reversed = [
            rule("example.org", "", ResourceType::Website, "Other", "General"),
            rule("example.org", "/blog/", ResourceType::Blog, "R", "General"),
        ];
        let c = classify_with(&reversed, "https://example.org/blog/x");
        assert_eq!(c.resource_type, ResourceType::Website);
    }

    #[test]
    fn test_specific_rules_precede_their_catch_all() {
        for (i, specific) in RULES.iter().enumerate() {
            if specific.path.is_empty() {
                continue;
            }
            let catch_all = RULES
                .iter()
                .position(|r| r.domain == specific.domain && r.path.is_empty());
            if let Some(pos) = catch_all {
                assert!(i < pos, "rule for {}{} is shadowed", specific.domain, specific.path);
            }
        }
    }

    #[test]
    fn test_infer_title_prefers_fetched() {
        assert_eq!(
            infer_title("https://a.com/x", Some("  Real Title  "), 120),
            "Real Title"
        );
    }

    #[test]
    fn test_infer_title_from_slug() {
        assert_eq!(
            infer_title("https://www.example.com/posts/my-first_post/", None, 120),
            "example.com — My First Post"
        );
    }

    #[test]
    fn test_infer_title_bare_host() {
        assert_eq!(infer_title("https://www.example.com/", Some(""), 120), "example.com");
    }

    #[test]
    fn test_infer_title_truncated() {
        let long = "x".repeat(300);
        assert_eq!(infer_title("https://a.com", Some(&long), 120).chars().count(), 120);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("hello WORLD 2go"), "Hello World 2Go");
    }
}
