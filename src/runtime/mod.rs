use std::env;
use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::catalog;
use crate::coordinator::Coordinator;
use crate::logging;
use crate::media::RodioHandle;
use crate::mpris::ControlCmd;
use crate::player::PlayerState;

mod event_loop;
mod settings;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();

    if let Err(e) = logging::init(&settings.logging) {
        eprintln!("segue: logging disabled: {e}");
    }

    let path = catalog::resolve_path(env::args().nth(1), &settings.catalog);
    let tracks = catalog::load(&path, &settings.catalog)?;
    log::info!("loaded {} tracks from {}", tracks.len(), path.display());

    let initial = PlayerState::with_preferences(
        settings.playback.default_rate,
        settings.playback.start_muted,
    );
    let audio = settings.audio.clone();
    let coordinator = Coordinator::spawn(initial, move |events| RodioHandle::spawn(&audio, events))?;
    let updates = coordinator.subscribe()?;

    let mut app = App::new(tracks);
    app.follow_playback = settings.ui.follow_playback;
    app.rate_presets = settings.playback.rate_presets.clone();
    app.set_catalog_name(
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
    );

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    crate::mpris::spawn_mpris(coordinator.clone(), control_tx);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = event_loop::EventLoopState::default();
    let run_result = event_loop::run(
        &mut terminal,
        &settings,
        &mut app,
        &coordinator,
        &updates,
        &control_rx,
        &mut state,
    );
    if run_result.is_err() {
        coordinator.shutdown(std::time::Duration::ZERO);
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    log::info!("segue exiting");
    run_result
}
