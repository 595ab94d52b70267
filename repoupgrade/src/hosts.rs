//! Source-control host URL rule tables.
//!
//! The classifier never branches on URL text directly. Each recognized URL
//! shape is one row in an ordered table of `(host, shape, pattern)`, tried in
//! sequence; the first row whose pattern matches decides the shape. Every
//! pattern captures the `owner/repo` path as group 1 and, where the shape has
//! one, the tag or branch reference as group 2.
//!
//! Two tables exist:
//!
//! - [`DOWNLOAD_RULES`] - zip download URLs found in legacy repositories
//! - [`BROWSE_RULES`] - browsable repository URLs found in schema 2.0

use std::sync::OnceLock;

use regex::Regex;

/// Deprecated GitHub download host, replaced by [`CODELOAD_HOST`].
const NODELOAD_HOST: &str = "://nodeload.github.com/";
const CODELOAD_HOST: &str = "://codeload.github.com/";

/// A source-control host with known URL conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Host {
    GitHub,
    Bitbucket,
}

impl Host {
    pub fn name(&self) -> &'static str {
        match self {
            Host::GitHub => "GitHub",
            Host::Bitbucket => "BitBucket",
        }
    }

    /// Canonical repository URL for an `owner/repo` path.
    pub fn base_url(&self, repo: &str) -> String {
        match self {
            Host::GitHub => format!("https://github.com/{}", repo),
            Host::Bitbucket => format!("https://bitbucket.org/{}", repo),
        }
    }

    /// Browsable tag listing, as used by schema 2.0 release `details`.
    pub fn tags_url(&self, base: &str) -> String {
        match self {
            Host::GitHub => format!("{}/tags", base),
            Host::Bitbucket => format!("{}#tags", base),
        }
    }

    /// Browsable branch URL, as used by schema 2.0 release `details`.
    pub fn branch_url(&self, base: &str, branch: &str) -> String {
        match self {
            Host::GitHub => format!("{}/tree/{}", base, branch),
            Host::Bitbucket => format!("{}/src/{}", base, branch),
        }
    }

    /// Maintainer instruction for creating a missing tag.
    pub fn create_tag_instruction(&self, repo: &str, version: &str) -> String {
        match self {
            Host::GitHub => format!(
                "Create tag {} at https://github.com/{}/releases/new",
                version, repo
            ),
            Host::Bitbucket => format!("Create tag {} and push to BitBucket", version),
        }
    }

    /// Identify the host of a canonical repository URL.
    pub fn of_base(base: &str) -> Option<Host> {
        if base.starts_with("https://github.com/") {
            Some(Host::GitHub)
        } else if base.starts_with("https://bitbucket.org/") {
            Some(Host::Bitbucket)
        } else {
            None
        }
    }
}

/// What a download URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadShape {
    /// Archive of a tag; group 2 is the tag name.
    TagArchive {
        /// Whether a numeric tag that differs from the release version is
        /// still accepted as a tag download.
        allows_mismatch: bool,
    },
    /// Archive of a branch head; group 2 is the branch.
    BranchArchive,
}

/// One row of the download URL table.
#[derive(Debug)]
pub struct DownloadRule {
    pub host: Host,
    pub shape: DownloadShape,
    pattern: &'static str,
}

/// Legacy download URL shapes, in priority order.
pub static DOWNLOAD_RULES: &[DownloadRule] = &[
    DownloadRule {
        host: Host::GitHub,
        shape: DownloadShape::TagArchive {
            allows_mismatch: true,
        },
        pattern: r"^https://codeload\.github\.com/([^/]+/[^/]+)/zip/([^/]+)$",
    },
    // Seen in the wild with a stray /tree segment
    DownloadRule {
        host: Host::GitHub,
        shape: DownloadShape::TagArchive {
            allows_mismatch: false,
        },
        pattern: r"^https://codeload\.github\.com/([^/]+/[^/]+)/tree/zip/([^/]+)$",
    },
    DownloadRule {
        host: Host::GitHub,
        shape: DownloadShape::TagArchive {
            allows_mismatch: true,
        },
        pattern: r"^https://github\.com/([^/]+/[^/]+)/archive/([^/]+)\.zip$",
    },
    DownloadRule {
        host: Host::GitHub,
        shape: DownloadShape::TagArchive {
            allows_mismatch: true,
        },
        pattern: r"^https://github\.com/([^/]+/[^/]+)/zipball/([^/]+)$",
    },
    DownloadRule {
        host: Host::Bitbucket,
        shape: DownloadShape::TagArchive {
            allows_mismatch: false,
        },
        pattern: r"^https://bitbucket\.org/([^/]+/[^/]+)/get/([^/]+)\.zip$",
    },
    DownloadRule {
        host: Host::GitHub,
        shape: DownloadShape::BranchArchive,
        pattern: r"^https://codeload\.github\.com/([^/]+/[^/]+)/zip/(master)$",
    },
    DownloadRule {
        host: Host::Bitbucket,
        shape: DownloadShape::BranchArchive,
        pattern: r"^https://bitbucket\.org/([^/]+/[^/]+)/get/(master|default)\.zip$",
    },
];

/// What a schema 2.0 release `details` URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseShape {
    /// Bare repository; releases track the given default branch.
    Repository { default_branch: &'static str },
    /// A branch; group 2 is the branch.
    Tree,
    /// The tag listing.
    Tags,
}

/// One row of the browse URL table.
#[derive(Debug)]
pub struct BrowseRule {
    pub host: Host,
    pub shape: BrowseShape,
    pattern: &'static str,
}

/// Schema 2.0 release `details` URL shapes, in priority order.
pub static BROWSE_RULES: &[BrowseRule] = &[
    BrowseRule {
        host: Host::GitHub,
        shape: BrowseShape::Repository {
            default_branch: "master",
        },
        pattern: r"^https://github\.com/([^/]+/[^/]+)$",
    },
    // BitBucket's default branch is a guess; hg repositories used "default"
    BrowseRule {
        host: Host::Bitbucket,
        shape: BrowseShape::Repository {
            default_branch: "default",
        },
        pattern: r"^https://bitbucket\.org/([^/]+/[^/#]+)$",
    },
    BrowseRule {
        host: Host::GitHub,
        shape: BrowseShape::Tree,
        pattern: r"^https://github\.com/([^/]+/[^/]+)/tree/(.+)$",
    },
    BrowseRule {
        host: Host::Bitbucket,
        shape: BrowseShape::Tree,
        pattern: r"^https://bitbucket\.org/([^/]+/[^/]+)/src/(.+)$",
    },
    BrowseRule {
        host: Host::GitHub,
        shape: BrowseShape::Tags,
        pattern: r"^https://github\.com/([^/]+/[^/]+)/tags$",
    },
    BrowseRule {
        host: Host::Bitbucket,
        shape: BrowseShape::Tags,
        pattern: r"^https://bitbucket\.org/([^/]+/[^/#]+)#tags$",
    },
];

/// A matched row together with its captures.
#[derive(Debug, Clone)]
pub struct RuleMatch<R: 'static> {
    pub rule: &'static R,
    /// `owner/repo`
    pub repo: String,
    /// Tag or branch, when the shape captures one.
    pub reference: Option<String>,
}

fn download_table() -> &'static [(&'static DownloadRule, Regex)] {
    static TABLE: OnceLock<Vec<(&'static DownloadRule, Regex)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        DOWNLOAD_RULES
            .iter()
            .map(|rule| (rule, Regex::new(rule.pattern).unwrap()))
            .collect()
    })
}

fn browse_table() -> &'static [(&'static BrowseRule, Regex)] {
    static TABLE: OnceLock<Vec<(&'static BrowseRule, Regex)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        BROWSE_RULES
            .iter()
            .map(|rule| (rule, Regex::new(rule.pattern).unwrap()))
            .collect()
    })
}

fn capture<R: 'static>(rule: &'static R, pattern: &Regex, url: &str) -> Option<RuleMatch<R>> {
    let captures = pattern.captures(url)?;
    Some(RuleMatch {
        rule,
        repo: captures.get(1)?.as_str().to_string(),
        reference: captures.get(2).map(|m| m.as_str().to_string()),
    })
}

/// All download rows matching a URL, in table order.
pub fn download_matches(url: &str) -> Vec<RuleMatch<DownloadRule>> {
    download_table()
        .iter()
        .filter_map(|(rule, pattern)| capture(*rule, pattern, url))
        .collect()
}

/// The first browse row matching a URL.
pub fn browse_match(url: &str) -> Option<RuleMatch<BrowseRule>> {
    browse_table()
        .iter()
        .find_map(|(rule, pattern)| capture(*rule, pattern, url))
}

/// Rewrite deprecated GitHub download URLs to their current form.
///
/// `nodeload.github.com` became `codeload.github.com`, and codeload serves
/// `/zip/` where nodeload served `/zipball/`.
pub fn normalize_download_url(url: &str) -> String {
    static ZIPBALL: OnceLock<Regex> = OnceLock::new();
    let url = url.replace(NODELOAD_HOST, CODELOAD_HOST);
    let zipball = ZIPBALL.get_or_init(|| {
        Regex::new(r"^(https://codeload\.github\.com/[^/]+/[^/]+/)zipball(/.*)$").unwrap()
    });
    zipball.replace(&url, "${1}zip${2}").into_owned()
}

/// A bare `https://github.com/<owner>/<repo>` style homepage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHomepage {
    pub host: Host,
    pub owner: String,
    pub repo: String,
}

/// Match a package homepage against the bare repository URL shape.
pub fn match_repository_homepage(url: &str) -> Option<RepositoryHomepage> {
    static GITHUB: OnceLock<Regex> = OnceLock::new();
    static BITBUCKET: OnceLock<Regex> = OnceLock::new();
    let github =
        GITHUB.get_or_init(|| Regex::new(r"(?i)^https?://github\.com/([^/]+)/([^/]+)$").unwrap());
    let bitbucket = BITBUCKET
        .get_or_init(|| Regex::new(r"(?i)^https?://bitbucket\.org/([^/]+)/([^/]+)$").unwrap());

    [(Host::GitHub, github), (Host::Bitbucket, bitbucket)]
        .into_iter()
        .find_map(|(host, pattern)| {
            let captures = pattern.captures(url)?;
            Some(RepositoryHomepage {
                host,
                owner: captures[1].to_string(),
                repo: captures[2].to_string(),
            })
        })
}

/// True for `readme` with an optional recognized markup extension.
pub fn is_readme_filename(name: &str) -> bool {
    static README: OnceLock<Regex> = OnceLock::new();
    README
        .get_or_init(|| {
            Regex::new(r"(?i)^readme(\.(md|mkd|mdown|markdown|textile|creole|rst))?$").unwrap()
        })
        .is_match(name)
}

/// True for tag names made only of digits, dots and underscores.
pub fn is_numeric_tag(tag: &str) -> bool {
    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    NUMERIC
        .get_or_init(|| Regex::new(r"^v?[\d._]+$").unwrap())
        .is_match(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_nodeload_zipball() {
        assert_eq!(
            normalize_download_url("https://nodeload.github.com/bar/foo/zipball/v1.0"),
            "https://codeload.github.com/bar/foo/zip/v1.0"
        );
    }

    #[test]
    fn test_normalize_leaves_other_urls() {
        let url = "https://example.com/foo/zipball/1.0";
        assert_eq!(normalize_download_url(url), url);
    }

    #[test]
    fn test_download_codeload_tag() {
        let matches = download_matches("https://codeload.github.com/bar/foo/zip/v1.2.3");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].rule.host, Host::GitHub);
        assert_eq!(matches[0].repo, "bar/foo");
        assert_eq!(matches[0].reference.as_deref(), Some("v1.2.3"));
    }

    #[test]
    fn test_download_master_matches_tag_and_branch_rows() {
        let matches = download_matches("https://codeload.github.com/bar/foo/zip/master");
        let shapes: Vec<_> = matches.iter().map(|m| m.rule.shape).collect();
        assert_eq!(
            shapes,
            vec![
                DownloadShape::TagArchive {
                    allows_mismatch: true
                },
                DownloadShape::BranchArchive
            ]
        );
    }

    #[test]
    fn test_download_bitbucket_default_branch() {
        let matches = download_matches("https://bitbucket.org/bar/foo/get/default.zip");
        let branch = matches
            .iter()
            .find(|m| m.rule.shape == DownloadShape::BranchArchive)
            .unwrap();
        assert_eq!(branch.rule.host, Host::Bitbucket);
        assert_eq!(branch.reference.as_deref(), Some("default"));
    }

    #[test]
    fn test_download_unknown_url() {
        assert!(download_matches("https://cdn.example.com/foo-1.0.zip").is_empty());
    }

    #[test]
    fn test_browse_rows() {
        let m = browse_match("https://github.com/bar/foo").unwrap();
        assert_eq!(
            m.rule.shape,
            BrowseShape::Repository {
                default_branch: "master"
            }
        );

        let m = browse_match("https://github.com/bar/foo/tree/st3").unwrap();
        assert_eq!(m.rule.shape, BrowseShape::Tree);
        assert_eq!(m.reference.as_deref(), Some("st3"));

        let m = browse_match("https://bitbucket.org/bar/foo#tags").unwrap();
        assert_eq!(m.rule.host, Host::Bitbucket);
        assert_eq!(m.rule.shape, BrowseShape::Tags);
        assert_eq!(m.repo, "bar/foo");

        assert!(browse_match("https://gitlab.com/bar/foo").is_none());
    }

    #[test]
    fn test_repository_homepage_is_case_insensitive() {
        let homepage = match_repository_homepage("HTTP://GitHub.com/Bar/foo").unwrap();
        assert_eq!(homepage.host, Host::GitHub);
        assert_eq!(homepage.owner, "Bar");
        assert!(match_repository_homepage("https://github.com/bar/foo/wiki").is_none());
    }

    #[test]
    fn test_readme_filenames() {
        assert!(is_readme_filename("README.md"));
        assert!(is_readme_filename("readme"));
        assert!(is_readme_filename("Readme.RST"));
        assert!(!is_readme_filename("readme.txt"));
        assert!(!is_readme_filename("docs/readme.md"));
    }

    #[test]
    fn test_numeric_tag() {
        assert!(is_numeric_tag("v1.2.3"));
        assert!(is_numeric_tag("1_2"));
        assert!(!is_numeric_tag("master"));
    }

    #[test]
    fn test_instructions() {
        assert_eq!(
            Host::GitHub.create_tag_instruction("bar/foo", "1.0.0"),
            "Create tag 1.0.0 at https://github.com/bar/foo/releases/new"
        );
        assert_eq!(
            Host::Bitbucket.create_tag_instruction("bar/foo", "1.0.0"),
            "Create tag 1.0.0 and push to BitBucket"
        );
    }
}
