//! UI rendering module for ghfolio
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod help_overlay;
pub mod page;

pub use help_overlay::render as render_help_overlay;
pub use page::{plain_text, PageLayout};

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, AppState};

/// Renders the current view, returning the page layout once the page is shown
pub fn render(frame: &mut Frame, app: &App) -> Option<PageLayout> {
    let layout = match app.state {
        AppState::Loading => {
            render_loading(frame);
            None
        }
        AppState::Page => Some(page::render(frame, app)),
    };

    if app.show_help {
        render_help_overlay(frame);
    }
    layout
}

/// Renders a loading message while data is being fetched
fn render_loading(frame: &mut Frame) {
    let area = frame.area();

    // Center the loading message vertically
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(3),
            Constraint::Percentage(45),
        ])
        .split(area);

    let loading_text = Paragraph::new("Loading GitHub data...")
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);

    frame.render_widget(loading_text, chunks[1]);
}
