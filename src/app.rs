//! Application state management for ghfolio
//!
//! This module contains the main application state: loading the GitHub data
//! once, keyboard handling, scrolling and link focus, and the analytics that
//! go with them.

use crossterm::event::{KeyCode, KeyEvent};
use tracing::debug;

use crate::analytics::{scroll_percent, Analytics, UiClick};
use crate::cache::{Clock, FetchOutcome, KeyValueStore};
use crate::config::PortfolioConfig;
use crate::github::{GithubProfile, PinnedRepo, PortfolioSource};
use crate::view::{page_links, PageLink, PageState};

/// Page name reported with the page view
const PAGE_NAME: &str = "home";

/// Application state enum representing the current view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Initial loading state while fetching data
    Loading,
    /// The portfolio page
    Page,
}

/// Main application struct managing state and data
#[derive(Debug)]
pub struct App {
    /// Current application state/view
    pub state: AppState,
    /// Page content settings
    pub config: PortfolioConfig,
    /// Sections selected from the last load
    pub page: PageState,
    /// Focusable links, in page order
    pub links: Vec<PageLink>,
    /// Index into `links` of the focused link
    pub focused_link: Option<usize>,
    /// Href of the most recently activated link
    pub last_activated: Option<String>,
    /// First visible content line
    pub scroll_offset: u16,
    /// Total content lines at the current width
    pub content_height: u16,
    /// Visible content lines
    pub viewport_height: u16,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    loaded: bool,
    analytics: Analytics,
}

impl App {
    pub fn new(config: PortfolioConfig, analytics: Analytics) -> Self {
        Self {
            state: AppState::Loading,
            config,
            page: PageState::empty(),
            links: Vec::new(),
            focused_link: None,
            last_activated: None,
            scroll_offset: 0,
            content_height: 0,
            viewport_height: 0,
            should_quit: false,
            show_help: false,
            loaded: false,
            analytics,
        }
    }

    /// Loads profile and pinned repositories concurrently
    ///
    /// Only the first call does anything; later calls return immediately.
    pub async fn load<S: KeyValueStore, C: Clock>(&mut self, source: &PortfolioSource<S, C>) {
        if self.loaded {
            debug!("page already loaded, skipping");
            return;
        }
        self.loaded = true;

        let (profile, pinned) = futures::join!(source.profile(), source.pinned_repos());
        self.apply_outcomes(profile, pinned);
    }

    /// Selects the page sections from fetch outcomes and shows the page
    pub fn apply_outcomes(
        &mut self,
        profile: FetchOutcome<GithubProfile>,
        pinned: FetchOutcome<Vec<PinnedRepo>>,
    ) {
        self.page = PageState::select(self.config.github.show_profile, profile, pinned);
        self.links = page_links(&self.config, &self.page);
        self.focused_link = None;
        self.scroll_offset = 0;
        self.state = AppState::Page;
        self.analytics.track_pageview(PAGE_NAME);
    }

    /// Waits for pending analytics deliveries; call before exiting
    pub async fn flush_analytics(&self) {
        self.analytics.flush().await;
    }

    /// Whether `load` has already run
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Records the rendered content and viewport heights
    ///
    /// Clamps the scroll offset and reports the scroll position, so a page
    /// that fits on screen reaches its milestones on the first layout.
    pub fn set_layout(&mut self, content_height: u16, viewport_height: u16) {
        if self.content_height == content_height && self.viewport_height == viewport_height {
            return;
        }
        self.content_height = content_height;
        self.viewport_height = viewport_height;
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());
        self.report_scroll();
    }

    /// Largest useful scroll offset
    pub fn max_scroll(&self) -> u16 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    /// Current scroll position as a percentage of the scrollable range
    pub fn scroll_percent(&self) -> u8 {
        scroll_percent(
            u32::from(self.scroll_offset),
            u32::from(self.content_height),
            u32::from(self.viewport_height),
        )
    }

    /// The focused link, if any
    pub fn focused(&self) -> Option<&PageLink> {
        self.focused_link.and_then(|i| self.links.get(i))
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `q` or `Esc`: Quit the application
    /// - `Up`/`k`, `Down`/`j`: Scroll one line
    /// - `PageUp`/`PageDown`: Scroll one screen
    /// - `g`/`G`: Jump to top/bottom
    /// - `Tab`/`BackTab`: Move focus between links
    /// - `Enter`: Open the focused link
    /// - `?`: Toggle help
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Help overlay intercepts all keys when shown
        if self.show_help {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                }
                _ => {}
            }
            return;
        }

        match self.state {
            AppState::Loading => {
                if key_event.code == KeyCode::Char('q') {
                    self.should_quit = true;
                }
            }
            AppState::Page => match key_event.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.should_quit = true;
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.scroll_to(self.scroll_offset.saturating_sub(1));
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.scroll_to(self.scroll_offset.saturating_add(1));
                }
                KeyCode::PageUp => {
                    self.scroll_to(self.scroll_offset.saturating_sub(self.page_step()));
                }
                KeyCode::PageDown => {
                    self.scroll_to(self.scroll_offset.saturating_add(self.page_step()));
                }
                KeyCode::Char('g') | KeyCode::Home => {
                    self.scroll_to(0);
                }
                KeyCode::Char('G') | KeyCode::End => {
                    self.scroll_to(self.max_scroll());
                }
                KeyCode::Tab => {
                    self.focus_next();
                }
                KeyCode::BackTab => {
                    self.focus_previous();
                }
                KeyCode::Enter => {
                    self.activate_focused();
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
        }
    }

    /// Reports the focused link as clicked and returns the event payload
    pub fn activate_focused(&mut self) -> Option<UiClick> {
        let link = self.focused()?.clone();
        let click = self.analytics.track_click(&link.target());
        debug!(href = %link.href, action_id = %click.action_id, "link activated");
        self.last_activated = Some(link.href);
        Some(click)
    }

    fn focus_next(&mut self) {
        let count = self.links.len();
        if count == 0 {
            return;
        }
        self.focused_link = Some(match self.focused_link {
            Some(i) => (i + 1) % count,
            None => 0,
        });
    }

    fn focus_previous(&mut self) {
        let count = self.links.len();
        if count == 0 {
            return;
        }
        self.focused_link = Some(match self.focused_link {
            Some(0) | None => count - 1,
            Some(i) => i - 1,
        });
    }

    fn page_step(&self) -> u16 {
        self.viewport_height.saturating_sub(1).max(1)
    }

    fn scroll_to(&mut self, offset: u16) {
        let offset = offset.min(self.max_scroll());
        if offset == self.scroll_offset {
            return;
        }
        self.scroll_offset = offset;
        self.report_scroll();
    }

    fn report_scroll(&mut self) {
        if self.state != AppState::Page || self.viewport_height == 0 {
            return;
        }
        let percent = self.scroll_percent();
        self.analytics.track_scroll(percent);
    }
}
