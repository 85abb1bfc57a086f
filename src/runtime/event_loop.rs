use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::config;
use crate::coordinator::{Coordinator, Subscription};
use crate::mpris::ControlCmd;
use crate::ui;

/// State tracked by the runtime event loop across iterations.
#[derive(Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    pending_zz: bool,
}

/// Main terminal event loop: handles input, drawing and snapshots from the
/// coordinator. Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    coordinator: &Coordinator,
    updates: &Subscription,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    let fade_out = Duration::from_millis(settings.audio.quit_fade_out_ms);

    loop {
        if let Some(player) = updates.try_latest() {
            app.set_player(player);
        }

        let display = app.display_indices();
        terminal.draw(|f| ui::draw(f, app, &display, &settings.ui, &settings.playback))?;

        if let Ok(ControlCmd::Quit) = control_rx.try_recv() {
            coordinator.shutdown(fade_out);
            return Ok(());
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, coordinator, state)? {
                    coordinator.shutdown(fade_out);
                    return Ok(());
                }
            }
        }
    }
}

/// Toggle the selected row: pauses it when it is the live track, otherwise
/// selects and starts it.
fn toggle_selected(app: &mut App, coordinator: &Coordinator) -> crate::error::Result<()> {
    let Some(track) = app.selected_track().cloned() else {
        return Ok(());
    };
    app.follow_playback_on();
    coordinator.bind(track).toggle()
}

/// Space/`p`: toggle whatever is current, or start the cursor row when nothing is.
fn toggle_current(app: &mut App, coordinator: &Coordinator) -> crate::error::Result<()> {
    if app.player.current_track.is_some() {
        return coordinator.toggle(None);
    }
    toggle_selected(app, coordinator)
}

fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    coordinator: &Coordinator,
    state: &mut EventLoopState,
) -> Result<bool, Box<dyn std::error::Error>> {
    if app.filter_mode {
        state.pending_gg = false;
        match key.code {
            KeyCode::Esc => app.clear_filter(),
            KeyCode::Backspace => app.pop_filter_char(),
            KeyCode::Char('j' | 'n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                app.next();
            }
            KeyCode::Char('k' | 'p') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                app.prev();
            }
            KeyCode::Char(c) => {
                if !c.is_control() {
                    app.push_filter_char(c);
                }
            }
            KeyCode::Enter => {
                if app.display_indices().is_empty() {
                    return Ok(false);
                }
                app.exit_filter_mode();
                toggle_selected(app, coordinator)?;
            }
            _ => {}
        }

        return Ok(false);
    }

    if key.code != KeyCode::Char('z') {
        state.pending_zz = false;
    }
    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }

    match key.code {
        KeyCode::Char('q') => return Ok(true),
        KeyCode::Char('/') => app.enter_filter_mode(),
        KeyCode::Char('z') => {
            if state.pending_zz {
                state.pending_zz = false;
                if let Some(idx) = app.current_index() {
                    app.set_selected(idx);
                }
            } else {
                state.pending_zz = true;
            }
        }
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.follow_playback_off();
                if let Some(&first) = app.display_indices().first() {
                    app.set_selected(first);
                }
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            app.follow_playback_off();
            if let Some(&last) = app.display_indices().last() {
                app.set_selected(last);
            }
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Enter => toggle_selected(app, coordinator)?,
        KeyCode::Char('p') | KeyCode::Char(' ') => toggle_current(app, coordinator)?,
        KeyCode::Char('L') => coordinator.seek_by(settings.playback.seek_step_secs)?,
        KeyCode::Char('H') => coordinator.seek_by(-settings.playback.seek_step_secs)?,
        KeyCode::Char('m') => coordinator.toggle_mute()?,
        KeyCode::Char('r') => coordinator.set_playback_rate(app.next_rate())?,
        KeyCode::Char('K') => app.toggle_metadata_window(),
        _ => {}
    }

    Ok(false)
}
