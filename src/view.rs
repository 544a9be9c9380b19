//! Plain-data view of a running session
//!
//! Rendering is a pure function of simulation state: games produce a
//! [`Playfield`], the session controller wraps it into a [`Frame`] with HUD
//! values and toasts, and a [`RenderTarget`] presents it. Nothing in here
//! touches the simulation.

use glam::Vec2;
use serde::Serialize;

use crate::sim::AchievementRecord;

/// Coarse danger indicator shown on the HUD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Flow,
    Risk,
    Dead,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Flow => "FLOW",
            Status::Risk => "RISK",
            Status::Dead => "DEAD",
        }
    }
}

/// What a sprite depicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpriteKind {
    Ship,
    WallTop,
    WallBottom,
    Asteroid,
    FuelCell,
    Shield,
    Resource(&'static str),
}

/// Axis-aligned sprite in percent space (`pos` is the top-left corner)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sprite {
    pub kind: SpriteKind,
    pub pos: Vec2,
    pub size: Vec2,
    /// Degrees
    pub rotation: f32,
}

impl Sprite {
    pub fn new(kind: SpriteKind, pos: Vec2, size: Vec2) -> Self {
        Self {
            kind,
            pos,
            size,
            rotation: 0.0,
        }
    }

    pub fn rotated(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }
}

/// A labelled HUD value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meter {
    pub label: &'static str,
    pub value: String,
}

impl Meter {
    pub fn new(label: &'static str, value: impl ToString) -> Self {
        Self {
            label,
            value: value.to_string(),
        }
    }
}

/// Game-specific part of a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Playfield {
    pub sprites: Vec<Sprite>,
    pub meters: Vec<Meter>,
    pub combo_label: String,
    pub status: Status,
    /// Screen shake amplitude (0 when still)
    pub shake: f32,
}

/// Transient feedback category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ToastKind {
    Perfect,
    Achievement,
    Hit,
    Info,
}

/// Short-lived message, dropped once the frame clock passes `expires_at_ms`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub text: String,
    pub expires_at_ms: f64,
}

/// Everything a render target needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub game_id: &'static str,
    pub score: u64,
    pub best_score: u64,
    pub credits: u64,
    pub playfield: Playfield,
    pub achievements: Vec<AchievementRecord>,
    pub toasts: Vec<Toast>,
    /// Set once the session has ended
    pub result: Option<crate::session::FinalReport>,
}

impl Frame {
    /// One-line HUD summary, used by text targets and logs
    pub fn summary(&self) -> String {
        let unlocked = self.achievements.iter().filter(|a| a.unlocked).count();
        let mut line = format!(
            "[{}] score {} best {} combo {} {} ach {}/{}",
            self.game_id,
            self.score,
            self.best_score,
            self.playfield.combo_label,
            self.playfield.status.as_str(),
            unlocked,
            self.achievements.len()
        );
        for meter in &self.playfield.meters {
            line.push_str(&format!(" {} {}", meter.label, meter.value));
        }
        line
    }
}

/// Mounting point a session renders into
pub trait RenderTarget {
    /// False when the host could not provide a place to draw
    fn is_mounted(&self) -> bool;
    fn present(&mut self, frame: &Frame);
}

/// Headless target that keeps the most recent frame
#[derive(Debug, Default)]
pub struct HeadlessTarget {
    pub frames_presented: u64,
    pub last: Option<Frame>,
}

impl RenderTarget for HeadlessTarget {
    fn is_mounted(&self) -> bool {
        true
    }

    fn present(&mut self, frame: &Frame) {
        self.frames_presented += 1;
        log::trace!("{}", frame.summary());
        self.last = Some(frame.clone());
    }
}

/// A target whose mount point does not exist
#[derive(Debug, Default)]
pub struct Unmounted;

impl RenderTarget for Unmounted {
    fn is_mounted(&self) -> bool {
        false
    }

    fn present(&mut self, _frame: &Frame) {}
}

/// DOM text target (WASM only): writes the HUD summary into an element
#[cfg(target_arch = "wasm32")]
pub struct DomTarget {
    element: Option<web_sys::Element>,
}

#[cfg(target_arch = "wasm32")]
impl DomTarget {
    /// Look up the mount point by id; a missing element leaves it unmounted
    pub fn by_id(id: &str) -> Self {
        let element = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id));
        if element.is_none() {
            log::warn!("Mount point #{} not found", id);
        }
        Self { element }
    }
}

#[cfg(target_arch = "wasm32")]
impl RenderTarget for DomTarget {
    fn is_mounted(&self) -> bool {
        self.element.is_some()
    }

    fn present(&mut self, frame: &Frame) {
        let Some(el) = &self.element else { return };
        let mut text = frame.summary();
        for toast in &frame.toasts {
            text.push_str(" | ");
            text.push_str(&toast.text);
        }
        el.set_text_content(Some(&text));
    }
}
