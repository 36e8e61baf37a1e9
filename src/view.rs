//! Section selection for the portfolio page
//!
//! Whether the page shows the GitHub profile card or the plain contact block,
//! and whether the projects section appears, is decided here from the fetch
//! outcomes and configuration. Nothing is decided by mutating shared flags.

use crate::analytics::ClickTarget;
use crate::cache::FetchOutcome;
use crate::config::PortfolioConfig;
use crate::github::{GithubProfile, PinnedRepo};

/// Where a section's data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFreshness {
    /// Cached and within its TTL
    Cached,
    /// Fetched during this run
    Live,
    /// Refresh failed; showing an expired copy
    Stale,
    /// No data at all
    Missing,
}

impl DataFreshness {
    pub fn of<T>(outcome: &FetchOutcome<T>) -> Self {
        match outcome {
            FetchOutcome::Fresh(_) => Self::Cached,
            FetchOutcome::Refreshed(_) => Self::Live,
            FetchOutcome::StaleFallback(_) => Self::Stale,
            FetchOutcome::Unavailable => Self::Missing,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cached => "cached",
            Self::Live => "live",
            Self::Stale => "stale",
            Self::Missing => "unavailable",
        }
    }
}

/// What the "reach out" part of the page shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSection {
    GithubCard(GithubProfile),
    Contact,
}

/// What the open-source projects part of the page shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectsSection {
    Repos(Vec<PinnedRepo>),
    /// The user has no pinned repositories
    NoPinned,
    /// Data could not be loaded; the section is left out
    Hidden,
}

/// Everything the page needs to render its data-driven sections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    pub profile: ProfileSection,
    pub profile_freshness: DataFreshness,
    pub projects: ProjectsSection,
    pub projects_freshness: DataFreshness,
}

impl PageState {
    /// Page shown before any data has loaded
    pub fn empty() -> Self {
        Self {
            profile: ProfileSection::Contact,
            profile_freshness: DataFreshness::Missing,
            projects: ProjectsSection::Hidden,
            projects_freshness: DataFreshness::Missing,
        }
    }

    pub fn select(
        show_github_profile: bool,
        profile: FetchOutcome<GithubProfile>,
        pinned: FetchOutcome<Vec<PinnedRepo>>,
    ) -> Self {
        Self {
            profile_freshness: DataFreshness::of(&profile),
            profile: select_profile(show_github_profile, profile),
            projects_freshness: DataFreshness::of(&pinned),
            projects: select_projects(pinned),
        }
    }
}

/// Profile card when enabled and any payload is available, else the contact block
pub fn select_profile(show_github_profile: bool, outcome: FetchOutcome<GithubProfile>) -> ProfileSection {
    match outcome.into_payload() {
        Some(profile) if show_github_profile => ProfileSection::GithubCard(profile),
        _ => ProfileSection::Contact,
    }
}

/// Repository cards for a non-empty list; an empty list is not the same as no data
pub fn select_projects(outcome: FetchOutcome<Vec<PinnedRepo>>) -> ProjectsSection {
    match outcome.into_payload() {
        Some(repos) if repos.is_empty() => ProjectsSection::NoPinned,
        Some(repos) => ProjectsSection::Repos(repos),
        None => ProjectsSection::Hidden,
    }
}

/// Part of the page a link belongs to, in top-to-bottom order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LinkSection {
    Header,
    Contact,
    Projects,
    Social,
}

/// A focusable link on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub section: LinkSection,
    pub label: String,
    pub href: String,
    /// Explicit analytics id
    pub ph_id: Option<String>,
}

impl PageLink {
    fn new(section: LinkSection, label: impl Into<String>, href: impl Into<String>, ph_id: Option<&str>) -> Self {
        Self {
            section,
            label: label.into(),
            href: href.into(),
            ph_id: ph_id.map(str::to_string),
        }
    }

    /// Click target reported when this link is activated
    pub fn target(&self) -> ClickTarget {
        let target = ClickTarget::link(self.label.as_str(), self.href.as_str());
        match &self.ph_id {
            Some(id) => target.with_ph_id(id.as_str()),
            None => target,
        }
    }
}

/// Focusable links in the order they appear on the page
pub fn page_links(config: &PortfolioConfig, page: &PageState) -> Vec<PageLink> {
    let mut links = Vec::new();

    if let Some(resume) = config.owner.resume_url.as_deref() {
        links.push(PageLink::new(LinkSection::Header, "Resume", resume, Some("cta-resume")));
    }

    if let Some(email) = config.contact.email.as_deref() {
        links.push(PageLink::new(
            LinkSection::Contact,
            email,
            format!("mailto:{}", email),
            Some("contact-email"),
        ));
    }

    match &page.projects {
        ProjectsSection::Repos(repos) => {
            for repo in repos {
                links.push(PageLink::new(LinkSection::Projects, repo.name.as_str(), repo.url.as_str(), None));
            }
            links.push(more_projects(config));
        }
        ProjectsSection::NoPinned => links.push(more_projects(config)),
        ProjectsSection::Hidden => {}
    }

    for link in &config.links {
        links.push(PageLink::new(
            LinkSection::Social,
            link.label.as_str(),
            link.href.as_str(),
            link.id.as_deref(),
        ));
    }

    links
}

fn more_projects(config: &PortfolioConfig) -> PageLink {
    PageLink::new(
        LinkSection::Projects,
        "More Projects",
        config.github.profile_url(),
        Some("more-projects"),
    )
}
