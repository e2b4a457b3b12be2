//! Sound cues
//!
//! Every cue is fire-and-forget: rewind, play, and log if the browser refuses
//! (autoplay policy). A single mute flag covers the music and every cue.

use crate::settings::Settings;

/// Sound cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Flipper pressed or released
    Flipper,
    /// Ball touched anything
    Impact,
    Bumper,
    LifeLost,
    GameOver,
}

impl SoundCue {
    pub const ALL: [SoundCue; 5] = [
        SoundCue::Flipper,
        SoundCue::Impact,
        SoundCue::Bumper,
        SoundCue::LifeLost,
        SoundCue::GameOver,
    ];

    /// Asset path served next to the page
    pub fn src(self) -> &'static str {
        match self {
            SoundCue::Flipper => "audio/flipper.mp3",
            SoundCue::Impact => "audio/ball_hit.wav",
            SoundCue::Bumper => "audio/bumper.mp3",
            SoundCue::LifeLost => "audio/lifedown.mp3",
            SoundCue::GameOver => "audio/gameover.mp3",
        }
    }

    pub fn volume(self, settings: &Settings) -> f32 {
        match self {
            SoundCue::Flipper => settings.flipper_volume,
            SoundCue::Impact => settings.impact_volume,
            SoundCue::Bumper => settings.bumper_volume,
            SoundCue::LifeLost => settings.life_lost_volume,
            SoundCue::GameOver => settings.game_over_volume,
        }
    }
}

/// Looping background track
pub const MUSIC_SRC: &str = "audio/back_bgm.mp3";

/// Something that can play cues
pub trait AudioSink {
    fn play(&mut self, cue: SoundCue);
    /// Begin the background track (after the start gesture)
    fn start_music(&mut self);
    /// Stop everything, for teardown
    fn stop_all(&mut self);
    fn set_muted(&mut self, muted: bool);
    fn is_muted(&self) -> bool;
}

/// Sink that plays nothing (native builds, headless runs)
#[derive(Debug, Default)]
pub struct NullAudio {
    muted: bool,
}

impl NullAudio {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioSink for NullAudio {
    fn play(&mut self, cue: SoundCue) {
        if !self.muted {
            log::trace!("Cue {cue:?}");
        }
    }

    fn start_music(&mut self) {}

    fn stop_all(&mut self) {}

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn is_muted(&self) -> bool {
        self.muted
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen_futures::JsFuture;
    use web_sys::HtmlAudioElement;

    use super::{AudioSink, MUSIC_SRC, SoundCue};
    use crate::settings::Settings;

    /// Audio elements, one per cue plus the music track
    pub struct WebAudio {
        music: Option<HtmlAudioElement>,
        cues: Vec<(SoundCue, HtmlAudioElement)>,
        muted: bool,
    }

    fn element(src: &str, volume: f32) -> Option<HtmlAudioElement> {
        match HtmlAudioElement::new_with_src(src) {
            Ok(el) => {
                el.set_volume(f64::from(volume.clamp(0.0, 1.0)));
                Some(el)
            }
            Err(e) => {
                log::warn!("Failed to create audio element for {src}: {e:?}");
                None
            }
        }
    }

    /// Start playback and log a rejected play promise
    fn start(el: &HtmlAudioElement, what: &'static str) {
        match el.play() {
            Ok(promise) => wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = JsFuture::from(promise).await {
                    log::debug!("{what} playback rejected: {e:?}");
                }
            }),
            Err(e) => log::debug!("{what} playback failed: {e:?}"),
        }
    }

    impl WebAudio {
        pub fn new(settings: &Settings) -> Self {
            let music = element(MUSIC_SRC, settings.music_volume);
            if let Some(music) = &music {
                music.set_loop(true);
            }
            let cues = SoundCue::ALL
                .iter()
                .filter_map(|cue| element(cue.src(), cue.volume(settings)).map(|el| (*cue, el)))
                .collect();

            let mut audio = Self {
                music,
                cues,
                muted: false,
            };
            audio.set_muted(settings.muted);
            audio
        }

        fn elements(&self) -> impl Iterator<Item = &HtmlAudioElement> {
            self.music.iter().chain(self.cues.iter().map(|(_, el)| el))
        }
    }

    impl AudioSink for WebAudio {
        fn play(&mut self, cue: SoundCue) {
            if self.muted {
                return;
            }
            if let Some((_, el)) = self.cues.iter().find(|(c, _)| *c == cue) {
                // Rewind so overlapping hits still sound
                el.set_current_time(0.0);
                start(el, "Cue");
            }
        }

        fn start_music(&mut self) {
            if let Some(music) = &self.music {
                start(music, "Music");
            }
        }

        fn stop_all(&mut self) {
            for el in self.elements() {
                let _ = el.pause();
            }
        }

        fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
            for el in self.elements() {
                el.set_muted(muted);
            }
        }

        fn is_muted(&self) -> bool {
            self.muted
        }
    }
}
