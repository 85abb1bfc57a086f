//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear, List, ListItem, Padding, Paragraph, Wrap},
};
use std::time::Duration;

use crate::app::{App, RowStatus};
use crate::catalog::display_from_fields;
use crate::config::{PlaybackSettings, TimeField, UiSettings};
use crate::player::{PlaybackStatus, PlayerState};

const CONTROLS: &[(&str, &str)] = &[
    ("j/k", "up/down"),
    ("gg/G", "top/bottom"),
    ("enter", "play/pause row"),
    ("space/p", "play/pause"),
    ("m", "mute"),
    ("r", "rate"),
    ("K", "metadata"),
    ("/", "filter"),
    ("q", "quit"),
];

/// Render the controls help text, incorporating the seek step.
fn controls_text(seek_step_secs: f64) -> String {
    let mut parts: Vec<String> = CONTROLS
        .iter()
        .map(|(k, v)| format!("[{k}] {v}"))
        .collect();
    parts.insert(2, format!("[H/L] seek -/+{seek_step_secs}s"));
    parts.join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn secs(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or_default()
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(
    elapsed: Duration,
    total: Option<Duration>,
    ui: &UiSettings,
) -> Option<String> {
    if ui.now_playing_time_fields.is_empty() {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    for f in &ui.now_playing_time_fields {
        match f {
            TimeField::Elapsed => parts.push(format_mmss(elapsed)),
            TimeField::Total => {
                if let Some(t) = total {
                    parts.push(format_mmss(t));
                }
            }
            TimeField::Remaining => {
                if let Some(t) = total {
                    let rem = t.saturating_sub(elapsed);
                    parts.push(format!("-{}", format_mmss(rem)));
                }
            }
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

/// Transport line: status, track, time, rate and mute.
fn transport_text(player: &PlayerState, ui: &UiSettings) -> String {
    let Some(track) = &player.current_track else {
        return "Nothing selected".to_string();
    };

    let status = match (player.status(), &player.fault) {
        (PlaybackStatus::Playing, _) => "Playing".to_string(),
        (_, Some(fault)) => format!("Failed ({fault})"),
        (PlaybackStatus::Loading, _) => "Loading".to_string(),
        (PlaybackStatus::Paused | PlaybackStatus::Idle, _) => "Paused".to_string(),
    };

    let song = display_from_fields(
        track,
        &ui.now_playing_track_fields,
        &ui.now_playing_track_separator,
    );
    let total = if player.duration > 0.0 {
        Some(secs(player.duration))
    } else {
        track.duration_hint
    };

    let mut parts = vec![status];
    match now_playing_time_text(secs(player.position), total, ui) {
        Some(time) => parts.push(format!("Now: {song} [{time}]")),
        None => parts.push(format!("Now: {song}")),
    }
    parts.push(format!("Rate: {}x", player.playback_rate));
    if player.muted {
        parts.push("Muted".to_string());
    }
    parts.join(" • ")
}

fn row_marker(status: RowStatus) -> &'static str {
    match status {
        RowStatus::Idle => "   ",
        RowStatus::Loading => " … ",
        RowStatus::Playing => " ▶ ",
        RowStatus::Paused => " ‖ ",
        RowStatus::Failed => " ✗ ",
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Format an optional duration, rounding up partial seconds, showing total seconds.
fn format_duration_mmss_ceil(d: Option<Duration>) -> String {
    let Some(d) = d else {
        return "-".to_string();
    };

    let mut total_secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        total_secs = total_secs.saturating_add(1);
    }

    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{}:{:02} ({}s)", minutes, seconds, total_secs)
}

fn padded_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding {
            left: 1,
            right: 0,
            top: 0,
            bottom: 0,
        })
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    display: &[usize],
    ui_settings: &UiSettings,
    playback_settings: &PlaybackSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" segue ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Transport / status box
    let status = {
        let mut parts: Vec<String> = vec![transport_text(&app.player, ui_settings)];

        let cursor = if app.follow_playback {
            "CURSOR: Follow"
        } else {
            "CURSOR: Free-roam"
        };
        parts.push(cursor.to_string());

        let q = app.filter_query.trim();
        if app.filter_mode || !q.is_empty() {
            parts.push(format!("FILTER: {q}").trim_end().to_string());
        }
        if let Some(name) = &app.catalog_name {
            parts.push(format!("Catalog: {name}"));
        }
        parts.join(" • ")
    };
    let status_par = Paragraph::new(status)
        .block(padded_block(" player "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    // Main list
    {
        let q = app.filter_query.trim();
        let query_lower = if !q.is_empty() && app.uses_lower_titles() {
            Some(q.to_ascii_lowercase())
        } else {
            None
        };

        // Only build ListItems for the visible window, centered on the selection.
        let total = display.len();
        let list_height = chunks[2].height.saturating_sub(2) as usize;
        let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let visible_items: Vec<ListItem> = display[start..end]
            .iter()
            .map(|&i| {
                let title = app.tracks[i].display();
                let marker = row_marker(app.row_status(i));
                let suffix = if app.tracks[i].has_preview() {
                    ""
                } else {
                    "  (no preview)"
                };

                let positions = if q.is_empty() {
                    None
                } else {
                    match query_lower.as_deref() {
                        Some(ql) => app.fuzzy_match_positions_for_track_lower(i, ql),
                        None => App::fuzzy_match_positions(&title, q),
                    }
                };
                let rendered = match positions {
                    Some(positions) => {
                        let mut rendered = String::new();
                        let mut pos_iter = positions.into_iter();
                        let mut next_pos = pos_iter.next();
                        for (ci, ch) in title.chars().enumerate() {
                            if next_pos == Some(ci) {
                                rendered.extend(ch.to_uppercase());
                                next_pos = pos_iter.next();
                            } else {
                                rendered.push(ch);
                            }
                        }
                        rendered
                    }
                    None => title,
                };
                ListItem::new(format!("{marker}{rendered}{suffix}"))
            })
            .collect();

        let list = List::new(visible_items)
            .block(Block::default().borders(Borders::ALL).title(" tracks "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    // Overlay metadata popup (keeps list visible under it)
    if app.metadata_window {
        let popup_area = centered_rect_sized(72, 9, chunks[2]);
        frame.render_widget(Clear, popup_area);

        let meta = match app.selected_track() {
            Some(track) => format!(
                "Title: {}\nArtists: {}\nAlbum: {}\nDuration: {}\nPreview: {}",
                track.title,
                if track.artists.is_empty() {
                    "-".to_string()
                } else {
                    track.artists.join(", ")
                },
                track.album.as_deref().unwrap_or("-"),
                format_duration_mmss_ceil(track.duration_hint),
                track.source_url.as_deref().unwrap_or("-"),
            ),
            None => "No track selected".to_string(),
        };
        let meta_paragraph = Paragraph::new(meta)
            .block(padded_block(" metadata (K closes) "))
            .wrap(Wrap { trim: true });
        frame.render_widget(meta_paragraph, popup_area);
    }

    let footer = Paragraph::new(controls_text(playback_settings.seek_step_secs))
        .block(padded_block(" controls "))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);
}
