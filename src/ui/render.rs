//! Frame rendering for the shell.
//!
//! Drawing returns the [`FrameHits`] for the frame it just produced, so
//! pointer events are always tested against the positions actually on
//! screen. Overlay bounds include their anchor controls.

use crate::core::app::{App, FrameHits};
use crate::core::identity::UserIdentity;
use crate::core::presence::PresenceStatus;
use crate::ui::overlay::{OverlayId, ViewportClass};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 30;
const DROPDOWN_HEIGHT: u16 = 5;

pub fn draw(frame: &mut Frame, app: &App) -> FrameHits {
    let mut hits = FrameHits::default();
    let area = frame.area();

    if app.loading {
        draw_loading(frame, area);
        return hits;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);
    draw_status_bar(frame, rows[0], app);
    let body = rows[1];

    match app.overlays.viewport() {
        ViewportClass::Wide => {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
                .split(body);
            draw_sidebar(frame, columns[0], app, OverlayId::WideDropdown, &mut hits);
            draw_conversation(frame, columns[1], app);
        }
        ViewportClass::Narrow => {
            draw_conversation(frame, body, app);
            if app.overlays.is_open(OverlayId::Menu) {
                let menu = Rect {
                    width: SIDEBAR_WIDTH.min(body.width),
                    ..body
                };
                frame.render_widget(Clear, menu);
                draw_sidebar(frame, menu, app, OverlayId::NarrowDropdown, &mut hits);
                hits.overlays.menu = Some(menu);
            } else {
                let toggle = Rect {
                    height: 1.min(body.height),
                    width: 3.min(body.width),
                    ..body
                };
                frame.render_widget(
                    Paragraph::new(" ≡ ").style(Style::default().add_modifier(Modifier::BOLD)),
                    toggle,
                );
                hits.menu_toggle = Some(toggle);
            }
        }
    }

    if app.logout_confirm_open {
        draw_logout_confirm(frame, area);
    }

    hits
}

fn draw_loading(frame: &mut Frame, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);
    frame.render_widget(
        Paragraph::new("Loading session…")
            .style(Style::default().fg(Color::Cyan))
            .centered(),
        rows[1],
    );
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let username = app
        .identity
        .as_ref()
        .map(|identity| identity.username.as_str())
        .unwrap_or("");
    let line = Line::from(vec![
        Span::styled(
            " textwo ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(username),
        Span::raw("  •  "),
        Span::styled(
            app.presence.label(),
            Style::default().fg(match app.presence {
                PresenceStatus::Connected => Color::Green,
                PresenceStatus::Connecting => Color::Yellow,
                PresenceStatus::Disconnected => Color::DarkGray,
            }),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn contact_line(contact: &UserIdentity, selected: bool) -> Line<'_> {
    let avatar = if contact.has_avatar() { "◉ " } else { "○ " };
    let style = if selected {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::raw(avatar),
        Span::styled(contact.username.as_str(), style),
    ])
}

fn draw_sidebar(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    dropdown: OverlayId,
    hits: &mut FrameHits,
) {
    let block = Block::default().borders(Borders::ALL).title("Your chats");
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height < 2 {
        return;
    }

    // Contact rows fill the top; the account row sits at the bottom.
    let list_area = Rect {
        height: inner.height - 1,
        ..inner
    };
    let active_id = app.selector.current().map(|contact| contact.id.as_str());
    for (index, contact) in app.contacts.iter().enumerate() {
        if index as u16 >= list_area.height {
            break;
        }
        let row = Rect {
            y: list_area.y + index as u16,
            height: 1,
            ..list_area
        };
        let selected = active_id == Some(contact.id.as_str());
        frame.render_widget(Paragraph::new(contact_line(contact, selected)), row);
        hits.contact_rows.push((row, index));
    }

    let account_row = Rect {
        y: inner.y + inner.height - 1,
        height: 1,
        ..inner
    };
    if let Some(identity) = &app.identity {
        frame.render_widget(
            Paragraph::new(contact_line(identity, false))
                .style(Style::default().add_modifier(Modifier::REVERSED)),
            account_row,
        );
    }
    hits.account_row = Some(account_row);

    if app.overlays.is_open(dropdown) {
        let height = DROPDOWN_HEIGHT.min(account_row.y.saturating_sub(inner.y));
        let panel = Rect {
            x: inner.x,
            y: account_row.y.saturating_sub(height),
            width: inner.width,
            height,
        };
        let logout_row = draw_account_dropdown(frame, panel, app);
        hits.logout_entry = logout_row;
        // The anchor row is part of the dropdown's bounding element.
        let bounds = panel.union(account_row);
        match dropdown {
            OverlayId::NarrowDropdown => hits.overlays.narrow_dropdown = Some(bounds),
            OverlayId::WideDropdown => hits.overlays.wide_dropdown = Some(bounds),
            OverlayId::Menu => {}
        }
    }
}

fn draw_account_dropdown(frame: &mut Frame, panel: Rect, app: &App) -> Option<Rect> {
    frame.render_widget(Clear, panel);
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(panel);
    frame.render_widget(block, panel);

    let email = app
        .identity
        .as_ref()
        .map(|identity| identity.email.as_str())
        .unwrap_or("");
    let mut logout_row = None;
    let entries = [email, "Settings", "Logout"];
    for (index, entry) in entries.iter().enumerate() {
        if index as u16 >= inner.height {
            break;
        }
        let row = Rect {
            y: inner.y + index as u16,
            height: 1,
            ..inner
        };
        frame.render_widget(Paragraph::new(*entry), row);
        if *entry == "Logout" {
            logout_row = Some(row);
        }
    }
    logout_row
}

fn draw_conversation(frame: &mut Frame, area: Rect, app: &App) {
    match app.selector.current() {
        None => {
            let welcome = match &app.identity {
                Some(identity) => format!("Welcome, {}!", identity.username),
                None => "Welcome!".to_string(),
            };
            let lines = vec![
                Line::from(Span::styled(
                    welcome,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from("Select a chat to start messaging."),
            ];
            frame.render_widget(
                Paragraph::new(lines)
                    .centered()
                    .block(Block::default().borders(Borders::ALL)),
                area,
            );
        }
        Some(contact) => {
            let title = format!(" {} ", contact.username);
            frame.render_widget(
                Paragraph::new(format!("No messages yet. Say hi to {}!", contact.username))
                    .block(Block::default().borders(Borders::ALL).title(title)),
                area,
            );
        }
    }
}

fn draw_logout_confirm(frame: &mut Frame, area: Rect) {
    let width = 44.min(area.width);
    let height = 5.min(area.height);
    let modal = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };
    frame.render_widget(Clear, modal);
    let lines = vec![
        Line::from("Are you sure you want to logout?"),
        Line::from(""),
        Line::from(Span::styled(
            "[Enter] Confirm   [Esc] Cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .centered()
            .block(Block::default().borders(Borders::ALL).title(" Logout ")),
        modal,
    );
}
