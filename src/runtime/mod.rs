//! Process wiring: settings, library scan, persisted state, the audio
//! thread, analytics and the terminal.

use std::env;
use std::path::PathBuf;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::analytics::Forwarder;
use crate::app::App;
use crate::audio::AudioPlayer;
use crate::config;
use crate::control::PlayerControl;
use crate::events::EventBus;
use crate::i18n::I18n;
use crate::library::scan;
use crate::user_data::UserData;

mod event_loop;
mod logging;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let settings = settings::load_settings();

    let dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| settings.library.root.clone())
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let tracks = scan(&dir, &settings.library);
    info!(root = %dir.display(), tracks = tracks.len(), "library scanned");

    let mut user_data = match settings
        .user_data
        .path
        .clone()
        .or_else(config::default_user_data_path)
    {
        Some(path) => UserData::open(path, &settings.user_data),
        None => {
            warn!("no user data location; favorites will not persist");
            UserData::in_memory(&settings.user_data)
        }
    };

    let preferred = user_data.language().map(str::to_owned);
    let i18n = I18n::from_settings(&settings.i18n, preferred.as_deref())?;

    let bus = EventBus::new();
    let audio_player = AudioPlayer::new(tracks.clone(), settings.audio.clone(), bus.sender());
    let forwarder = if settings.analytics.enabled {
        Forwarder::from_settings(&settings.analytics, user_data.client_id())
    } else {
        Forwarder::disabled()
    };
    info!(analytics = forwarder.is_enabled(), locale = i18n.locale(), "services ready");

    let player = PlayerControl::new(audio_player, tracks, settings.audio.initial_volume);
    let mut app = App::new(player, i18n, user_data, bus.sender(), &settings);
    app.library_root = dir.display().to_string();
    startup::apply_playback_defaults(&mut app, &settings);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = event_loop::EventLoopState::default();
    let run_result =
        event_loop::run(&mut terminal, &settings, &mut app, &bus, &forwarder, &mut state);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    forwarder.shutdown();
    if let Err(e) = app.user_data.save() {
        warn!(error = %e, "could not save user data on exit");
    }
    info!("bye");
    run_result
}
