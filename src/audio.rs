//! Feedback sounds
//!
//! Short procedurally generated tones, no external files. Playback is best
//! effort: a missing or suspended audio context just means silence.

#[cfg(target_arch = "wasm32")]
use web_sys::{AudioContext, OscillatorType};

use crate::settings::Settings;
use crate::sim::{ChainTier, GameEvent};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Perfect pass below the MEGA tier
    Perfect,
    /// Perfect pass at the MEGA tier
    Mega,
    Achievement,
    /// Lost a life
    Hit,
    /// Collectible or resource picked up
    Pickup,
    GameOver,
    /// New best score
    HighScore,
}

/// A single triangle-wave blip with a short pitch drop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub freq: f32,
    /// Seconds
    pub duration: f32,
    /// Peak gain before volume scaling
    pub gain: f32,
}

impl SoundEffect {
    pub fn tone(&self) -> Tone {
        let (freq, duration, gain) = match self {
            SoundEffect::Perfect => (620.0, 0.07, 0.04),
            SoundEffect::Achievement => (880.0, 0.12, 0.06),
            SoundEffect::Mega => (1040.0, 0.14, 0.08),
            SoundEffect::Hit => (180.0, 0.18, 0.08),
            SoundEffect::Pickup => (740.0, 0.06, 0.05),
            SoundEffect::GameOver => (220.0, 0.4, 0.08),
            SoundEffect::HighScore => (1320.0, 0.3, 0.07),
        };
        Tone { freq, duration, gain }
    }

    /// The sound a game event should make, if any
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Perfect { tier, .. } if *tier == ChainTier::Mega => Some(SoundEffect::Mega),
            GameEvent::Perfect { .. } => Some(SoundEffect::Perfect),
            GameEvent::AchievementUnlocked(_) => Some(SoundEffect::Achievement),
            GameEvent::Hit { .. } => Some(SoundEffect::Hit),
            GameEvent::Collected { .. } | GameEvent::ResourcePicked { .. } => Some(SoundEffect::Pickup),
            GameEvent::Terminal(outcome) if !outcome.success => Some(SoundEffect::GameOver),
            _ => None,
        }
    }
}

/// Somewhere sounds can be sent
pub trait SoundSink {
    fn play(&mut self, effect: SoundEffect);
}

/// Drops every sound
#[derive(Debug, Default)]
pub struct Silent;

impl SoundSink for Silent {
    fn play(&mut self, _effect: SoundEffect) {}
}

/// Audio manager for the game
pub struct AudioManager {
    #[cfg(target_arch = "wasm32")]
    ctx: Option<AudioContext>,
    volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    #[cfg(target_arch = "wasm32")]
    pub fn new() -> Self {
        // Try to create audio context (may fail if not in secure context)
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            volume: 0.8,
            muted: false,
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn new() -> Self {
        Self {
            volume: 0.8,
            muted: false,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut audio = Self::new();
        audio.apply_settings(settings);
        audio
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.set_volume(settings.volume);
        self.set_muted(settings.muted);
    }

    /// Set volume (0.0 - 1.0)
    pub fn set_volume(&mut self, vol: f32) {
        self.volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Get effective volume
    pub fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    #[cfg(target_arch = "wasm32")]
    fn play_tone(&self, tone: Tone, vol: f32) {
        let Some(ctx) = &self.ctx else { return };

        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        let Ok(osc) = ctx.create_oscillator() else { return };
        let Ok(gain) = ctx.create_gain() else { return };
        osc.set_type(OscillatorType::Triangle);
        if osc.connect_with_audio_node(&gain).is_err() || gain.connect_with_audio_node(&ctx.destination()).is_err() {
            return;
        }

        let t = ctx.current_time();
        let dur = tone.duration as f64;
        osc.frequency().set_value_at_time(tone.freq, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(tone.freq * 0.84, t + dur)
            .ok();

        gain.gain().set_value_at_time(0.0001, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time((tone.gain * vol).max(0.0001), t + 0.01)
            .ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.0001, t + dur)
            .ok();

        osc.start_with_when(t).ok();
        osc.stop_with_when(t + dur + 0.02).ok();
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn play_tone(&self, tone: Tone, vol: f32) {
        log::trace!("tone {:.0}Hz for {:.2}s at {:.3}", tone.freq, tone.duration, tone.gain * vol);
    }
}

impl SoundSink for AudioManager {
    fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        self.play_tone(effect.tone(), vol);
    }
}
