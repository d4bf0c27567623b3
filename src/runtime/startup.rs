use crate::app::App;
use crate::audio::{AudioBackend, LoopMode};
use crate::config;

/// Push the configured loop mode, volume and the initial queue to the
/// audio thread.
pub fn apply_playback_defaults<B: AudioBackend>(app: &mut App<B>, settings: &config::Settings) {
    app.loop_mode = match settings.playback.loop_mode {
        config::LoopModeSetting::NoLoop => LoopMode::NoLoop,
        config::LoopModeSetting::LoopAll => LoopMode::LoopAll,
        config::LoopModeSetting::LoopOne => LoopMode::LoopOne,
    };

    app.player.set_loop_mode(app.loop_mode);
    app.player.set_volume(i32::from(settings.audio.initial_volume));
    app.mark_queue_dirty();
    app.sync_queue();
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::audio::AudioCmd;
    use crate::audio::testing::RecordingBackend;
    use crate::control::PlayerControl;
    use crate::events::EventBus;
    use crate::i18n::{I18n, I18nLoader};
    use crate::library::Track;
    use crate::user_data::UserData;

    #[test]
    fn defaults_reach_the_audio_thread() {
        let mut settings = config::Settings::default();
        settings.playback.loop_mode = config::LoopModeSetting::LoopOne;
        settings.audio.initial_volume = 40;

        let tracks = vec![
            Track::from_path("rain", &PathBuf::from("/s/rain/a.mp3"), None).unwrap(),
            Track::from_path("rain", &PathBuf::from("/s/rain/b.mp3"), None).unwrap(),
        ];
        let bus = EventBus::new();
        let mut app = App::new(
            PlayerControl::new(RecordingBackend::default(), tracks, 70),
            I18n::new(I18nLoader::new(None), "en-US", "en-US").unwrap(),
            UserData::in_memory(&settings.user_data),
            bus.sender(),
            &settings,
        );

        apply_playback_defaults(&mut app, &settings);
        assert_eq!(app.loop_mode, LoopMode::LoopOne);
        assert_eq!(
            app.player.backend().take_sent(),
            vec![
                AudioCmd::SetLoopMode(LoopMode::LoopOne),
                AudioCmd::SetVolume(40),
                AudioCmd::SetQueue(vec![0, 1]),
            ]
        );
        assert!(!app.queue_dirty);
    }
}
