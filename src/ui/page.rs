//! Portfolio page rendering
//!
//! Builds the page as a list of lines (header, profile card or contact block,
//! projects, links) that is shown in a scrolling paragraph, or printed as
//! plain text with `--plain`.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::github::{ContributionDay, GithubProfile, PinnedRepo};
use crate::view::{LinkSection, ProfileSection, ProjectsSection};

/// Most recent weeks shown in the contribution heatmap
const HEATMAP_WEEKS: usize = 26;

/// Heights measured while rendering, fed back into the app for scrolling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    pub content_height: u16,
    pub viewport_height: u16,
}

/// Renders the page and status line
pub fn render(frame: &mut Frame, app: &App) -> PageLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    let layout = render_content(frame, app, chunks[0]);
    render_status(frame, app, chunks[1]);
    layout
}

fn render_content(frame: &mut Frame, app: &App, area: Rect) -> PageLayout {
    let block = Block::default()
        .title(format!(" {} ", app.config.owner.name))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);

    let lines = page_lines(app);
    let layout = PageLayout {
        content_height: content_height(&lines, inner.width),
        viewport_height: inner.height,
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset, 0));
    frame.render_widget(paragraph, area);

    layout
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(format!(" {}", freshness_summary(app)), Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" links  "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" open  "),
        Span::styled("?", Style::default().fg(Color::Yellow)),
        Span::raw(" help  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ];
    if let Some(href) = &app.last_activated {
        spans.push(Span::styled(format!("  opened {}", href), Style::default().fg(Color::Green)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Data source summary, e.g. `profile: cached | projects: stale`
pub fn freshness_summary(app: &App) -> String {
    format!(
        "profile: {} | projects: {}",
        app.page.profile_freshness.label(),
        app.page.projects_freshness.label()
    )
}

/// Number of screen rows `lines` take when wrapped to `width` columns
pub fn content_height(lines: &[Line], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

/// The page as plain text, one line per row, without styling
pub fn plain_text(app: &App) -> String {
    let mut out = String::new();
    for line in page_lines(app) {
        for span in &line.spans {
            out.push_str(&span.content);
        }
        out.push('\n');
    }
    out.push_str(&freshness_summary(app));
    out.push('\n');
    out
}

/// Builds every line of the page
pub fn page_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    header_lines(app, &mut lines);
    lines.push(Line::from(""));

    match &app.page.profile {
        ProfileSection::GithubCard(profile) => profile_lines(app, profile, &mut lines),
        ProfileSection::Contact => contact_lines(app, &mut lines),
    }

    match &app.page.projects {
        ProjectsSection::Repos(repos) => {
            lines.push(Line::from(""));
            lines.push(section_title("Open Source Projects"));
            repo_lines(app, repos, &mut lines);
            link_lines(app, LinkSection::Projects, &mut lines);
        }
        ProjectsSection::NoPinned => {
            lines.push(Line::from(""));
            lines.push(section_title("Open Source Projects"));
            lines.push(Line::from(Span::styled(
                "No pinned repositories yet.",
                Style::default().fg(Color::DarkGray),
            )));
            link_lines(app, LinkSection::Projects, &mut lines);
        }
        ProjectsSection::Hidden => {}
    }

    if app.links.iter().any(|l| l.section == LinkSection::Social) {
        lines.push(Line::from(""));
        lines.push(section_title("Links"));
        link_lines(app, LinkSection::Social, &mut lines);
    }

    lines
}

fn header_lines(app: &App, lines: &mut Vec<Line<'static>>) {
    let owner = &app.config.owner;
    lines.push(Line::from(Span::styled(
        owner.title.clone(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(owner.subtitle.clone()));
    link_lines(app, LinkSection::Header, lines);
}

fn contact_lines(app: &App, lines: &mut Vec<Line<'static>>) {
    let contact = &app.config.contact;
    lines.push(section_title(&contact.title));
    lines.push(Line::from(Span::styled(
        contact.subtitle.clone(),
        Style::default().fg(Color::Gray),
    )));
    link_lines(app, LinkSection::Contact, lines);
}

fn profile_lines(app: &App, profile: &GithubProfile, lines: &mut Vec<Line<'static>>) {
    lines.push(section_title("Reach Out to me!"));
    lines.push(Line::from(Span::styled(
        app.config.contact.subtitle.clone(),
        Style::default().fg(Color::Gray),
    )));
    link_lines(app, LinkSection::Contact, lines);
    lines.push(Line::from(""));

    lines.push(Line::from(vec![
        Span::styled(
            profile.display_name().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" @{}", profile.login), Style::default().fg(Color::DarkGray)),
    ]));
    if let Some(bio) = profile.bio.as_deref().filter(|b| !b.trim().is_empty()) {
        lines.push(Line::from(bio.to_string()));
    }
    if let Some(location) = profile.location.as_deref().filter(|l| !l.trim().is_empty()) {
        lines.push(label_line("Location", location.to_string()));
    }
    lines.push(label_line("Open for opportunities", profile.hireable_label().to_string()));
    lines.push(label_line(
        "Followers",
        format!("{}  Following: {}", profile.followers, profile.following),
    ));
    lines.push(label_line(
        "Repositories",
        format!(
            "{}  Pull requests: {}  Issues: {}",
            profile.repositories, profile.pull_requests, profile.issues
        ),
    ));
    lines.push(label_line("Commits this year", profile.total_commits.to_string()));

    let weeks = &profile.contribution_weeks;
    if !weeks.is_empty() {
        lines.push(Line::from(""));
        let recent = &weeks[weeks.len().saturating_sub(HEATMAP_WEEKS)..];
        for weekday in 0..7 {
            let spans: Vec<Span<'static>> = recent
                .iter()
                .map(|week| match week.days.get(weekday) {
                    Some(day) => Span::styled("■", Style::default().fg(day_color(day))),
                    None => Span::raw(" "),
                })
                .collect();
            lines.push(Line::from(spans));
        }
    }
}

fn repo_lines(app: &App, repos: &[PinnedRepo], lines: &mut Vec<Line<'static>>) {
    let mut links = app
        .links
        .iter()
        .enumerate()
        .filter(|(_, l)| l.section == LinkSection::Projects);

    for repo in repos {
        let focused = links
            .next()
            .is_some_and(|(i, _)| app.focused_link == Some(i));
        lines.push(Line::from(vec![
            Span::raw(if focused { "▸ " } else { "  " }),
            Span::styled(repo.name.clone(), link_style(focused).add_modifier(Modifier::BOLD)),
        ]));
        if let Some(description) = repo.description.as_deref().filter(|d| !d.trim().is_empty()) {
            lines.push(Line::from(format!("    {}", description)));
        }

        let mut meta = vec![Span::raw(format!(
            "    ★ {}  ⑂ {}",
            repo.stars, repo.fork_count
        ))];
        if let Some(language) = &repo.primary_language {
            let color = language
                .color
                .as_deref()
                .and_then(hex_color)
                .unwrap_or(Color::White);
            meta.push(Span::raw("  "));
            meta.push(Span::styled("●", Style::default().fg(color)));
            meta.push(Span::raw(format!(" {}", language.name)));
        }
        if let Some(kb) = repo.disk_usage {
            meta.push(Span::styled(
                format!("  {}", format_size(kb)),
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::from(meta));
    }
}

/// Renders the links of one section, skipping repo cards drawn by `repo_lines`
fn link_lines(app: &App, section: LinkSection, lines: &mut Vec<Line<'static>>) {
    let is_repo = |href: &str| match &app.page.projects {
        ProjectsSection::Repos(repos) => repos.iter().any(|r| r.url == href),
        _ => false,
    };

    for (i, link) in app.links.iter().enumerate() {
        if link.section != section || (section == LinkSection::Projects && is_repo(&link.href)) {
            continue;
        }
        let focused = app.focused_link == Some(i);
        lines.push(Line::from(vec![
            Span::raw(if focused { "▸ " } else { "  " }),
            Span::styled(format!("[{}]", link.label), link_style(focused)),
            Span::styled(format!(" {}", link.href), Style::default().fg(Color::DarkGray)),
        ]));
    }
}

fn section_title(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    ))
}

fn label_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), Style::default().fg(Color::DarkGray)),
        Span::raw(value),
    ])
}

fn link_style(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::UNDERLINED)
    }
}

fn day_color(day: &ContributionDay) -> Color {
    if day.count == 0 {
        return Color::DarkGray;
    }
    hex_color(&day.color).unwrap_or(Color::Green)
}

/// Parses `#rrggbb`
fn hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Formats a size in kilobytes
fn format_size(kb: u64) -> String {
    if kb >= 1024 * 1024 {
        format!("{:.1} GB", kb as f64 / (1024.0 * 1024.0))
    } else if kb >= 1024 {
        format!("{:.1} MB", kb as f64 / 1024.0)
    } else {
        format!("{} KB", kb)
    }
}
