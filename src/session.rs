//! Session lifecycle
//!
//! A [`SessionController`] owns one minigame and drives it from host frame
//! timestamps. It turns game events into sounds and toasts, renders a
//! [`Frame`] after every host frame, and finalizes the session exactly once:
//! persisting the best score and credits, then reporting upward through the
//! completion callback.
//!
//! ```text
//! Idle --init--> Running --terminal--> Terminal --restart--> Running
//!   \______________ destroy (from any phase) ______________> Destroyed
//! ```

use std::cell::Cell;
use std::rc::Rc;

use serde::Serialize;

use crate::audio::{SoundEffect, SoundSink};
use crate::consts::{PERFECT_TOAST_MS, TOAST_MS};
use crate::error::SessionError;
use crate::highscores::PersistedBest;
use crate::persistence::KeyValueStore;
use crate::platform::FrameScheduler;
use crate::settings::Settings;
use crate::sim::rng::next_seed;
use crate::sim::{GameEvent, Grade, Minigame, Outcome, SessionConfig, SimClock, TerminalCause};
use crate::view::{Frame, RenderTarget, Toast, ToastKind};

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    /// Built, not started
    Idle,
    Running,
    Terminal { success: bool },
    /// Torn down; nothing runs again
    Destroyed,
}

/// Host services injected into a session
pub struct Services {
    pub target: Box<dyn RenderTarget>,
    pub scheduler: Box<dyn FrameScheduler>,
    pub store: Box<dyn KeyValueStore>,
    pub sound: Box<dyn SoundSink>,
}

/// `(success, final_score)`, invoked once per finished session
pub type CompletionCallback = Box<dyn FnMut(bool, u64)>;

/// Shared flag that asks a session to tear itself down
///
/// Safe to trip from inside the completion callback or any other code
/// running during a frame; the controller checks it between steps and
/// before scheduling the next frame.
#[derive(Debug, Clone, Default)]
pub struct TeardownHandle(Rc<Cell<bool>>);

impl TeardownHandle {
    pub fn request(&self) {
        self.0.set(true);
    }

    pub fn is_requested(&self) -> bool {
        self.0.get()
    }
}

/// Summary of a finished session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalReport {
    pub game_id: &'static str,
    pub success: bool,
    pub cause: TerminalCause,
    pub score: u64,
    pub grade: Grade,
    pub credits_earned: u64,
    pub new_record: bool,
    pub best_score: u64,
    pub total_credits: u64,
}

impl FinalReport {
    pub fn summary(&self) -> String {
        format!(
            "{}: {} ({}) score {} [{:?}] +{} credits{}",
            self.game_id,
            if self.success { "complete" } else { "failed" },
            self.cause.describe(),
            self.score,
            self.grade,
            self.credits_earned,
            if self.new_record { ", new record!" } else { "" }
        )
    }
}

/// Runs one minigame against the host services
pub struct SessionController<G: Minigame> {
    game: G,
    config: SessionConfig,
    services: Services,
    clock: SimClock,
    input: G::Input,
    phase: SessionPhase,
    best: PersistedBest,
    settings: Settings,
    toasts: Vec<Toast>,
    events: Vec<GameEvent>,
    report: Option<FinalReport>,
    on_complete: Option<CompletionCallback>,
    teardown: TeardownHandle,
}

impl<G: Minigame> SessionController<G> {
    pub fn new(
        game: G,
        config: SessionConfig,
        services: Services,
        on_complete: impl FnMut(bool, u64) + 'static,
    ) -> Self {
        let game_id = game.kind().id();
        let best = PersistedBest::load(services.store.as_ref(), game_id);
        let settings = Settings::load(services.store.as_ref());
        Self {
            game,
            config,
            services,
            clock: SimClock::default(),
            input: G::Input::default(),
            phase: SessionPhase::Idle,
            best,
            settings,
            toasts: Vec::new(),
            events: Vec::new(),
            report: None,
            on_complete: Some(Box::new(on_complete)),
            teardown: TeardownHandle::default(),
        }
    }

    /// Replace the clock (fixed stepping, a different cap)
    pub fn with_clock(mut self, clock: SimClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn best(&self) -> PersistedBest {
        self.best
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Update and persist player preferences
    pub fn set_settings(&mut self, settings: Settings) {
        settings.save(self.services.store.as_mut());
        self.settings = settings;
    }

    pub fn report(&self) -> Option<&FinalReport> {
        self.report.as_ref()
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    /// Input buffer read by the next step
    pub fn input_mut(&mut self) -> &mut G::Input {
        &mut self.input
    }

    pub fn teardown_handle(&self) -> TeardownHandle {
        self.teardown.clone()
    }

    /// Start the session. Calling it again while running does nothing.
    pub fn init(&mut self) -> Result<(), SessionError> {
        if self.teardown.is_requested() {
            self.destroy();
        }
        match self.phase {
            SessionPhase::Destroyed => return Err(SessionError::Destroyed),
            SessionPhase::Running | SessionPhase::Terminal { .. } => return Ok(()),
            SessionPhase::Idle => {}
        }
        if !self.services.target.is_mounted() {
            log::warn!("{}: render target missing, not starting", self.game.kind().id());
            return Err(SessionError::MissingRenderTarget);
        }
        self.start_run();
        log::info!(
            "{} started (seed {}, difficulty {:.2})",
            self.game.kind().title(),
            self.config.seed,
            self.config.difficulty()
        );
        Ok(())
    }

    /// Play again with a fresh seed; only valid once the last run ended
    pub fn restart(&mut self) -> Result<(), SessionError> {
        if self.teardown.is_requested() {
            self.destroy();
        }
        match self.phase {
            SessionPhase::Destroyed => return Err(SessionError::Destroyed),
            SessionPhase::Terminal { .. } => {}
            phase => return Err(SessionError::NotTerminal(phase)),
        }
        self.config.seed = next_seed(self.config.seed);
        self.start_run();
        log::info!("{} restarted (seed {})", self.game.kind().title(), self.config.seed);
        Ok(())
    }

    /// Tear down: cancel the pending frame and every toast. Idempotent.
    pub fn destroy(&mut self) {
        if self.phase == SessionPhase::Destroyed {
            return;
        }
        self.teardown.request();
        self.services.scheduler.cancel();
        self.toasts.clear();
        self.phase = SessionPhase::Destroyed;
        log::info!("{} destroyed", self.game.kind().id());
    }

    fn start_run(&mut self) {
        self.game.reset(&self.config);
        self.clock.reset();
        self.input = G::Input::default();
        self.toasts.clear();
        self.events.clear();
        self.report = None;
        self.phase = SessionPhase::Running;
        self.render(None);
        self.services.scheduler.request_frame();
    }

    /// Host frame callback. `now_ms` is the host's monotonic timestamp.
    pub fn on_frame(&mut self, now_ms: f64) {
        if self.teardown.is_requested() {
            self.destroy();
            return;
        }
        if self.phase != SessionPhase::Running {
            return;
        }

        let steps = self.clock.frame(now_ms);
        for (i, dt) in steps.enumerate() {
            if self.teardown.is_requested() {
                break;
            }
            let outcome = self.game.step(&self.input, dt, &mut self.events);
            if i == 0 {
                G::clear_one_shot(&mut self.input);
            }
            self.dispatch_events(now_ms);
            if let Some(outcome) = outcome {
                self.finish(outcome);
                break;
            }
        }
        G::clear_one_shot(&mut self.input);

        if self.teardown.is_requested() {
            self.destroy();
            return;
        }
        self.render(Some(now_ms));
        if self.phase == SessionPhase::Running {
            self.services.scheduler.request_frame();
        }
    }

    fn dispatch_events(&mut self, now_ms: f64) {
        for event in std::mem::take(&mut self.events) {
            if let Some(effect) = SoundEffect::for_event(&event) {
                self.services.sound.play(effect);
            }
            match event {
                GameEvent::Perfect { tier, bonus } => {
                    // Only one PERFECT popup at a time
                    self.toasts.retain(|t| t.kind != ToastKind::Perfect);
                    self.push_toast(
                        ToastKind::Perfect,
                        format!("PERFECT {} +{}", tier.label(), bonus),
                        now_ms,
                        PERFECT_TOAST_MS,
                    );
                }
                GameEvent::AchievementUnlocked(unlock) => {
                    self.push_toast(
                        ToastKind::Achievement,
                        format!("ACHIEVEMENT: {}  +{}", unlock.title, unlock.bonus),
                        now_ms,
                        TOAST_MS,
                    );
                }
                GameEvent::Hit { lives_left } => {
                    self.push_toast(ToastKind::Hit, format!("HIT! {} left", lives_left), now_ms, TOAST_MS);
                }
                _ => {}
            }
        }
    }

    fn push_toast(&mut self, kind: ToastKind, text: String, now_ms: f64, ttl_ms: f64) {
        self.toasts.push(Toast {
            kind,
            text,
            expires_at_ms: now_ms + ttl_ms,
        });
    }

    /// Terminal entry. Runs once per run: the phase leaves `Running` here.
    fn finish(&mut self, outcome: Outcome) {
        if self.phase != SessionPhase::Running {
            return;
        }
        let game_id = self.game.kind().id();
        let score = self.game.final_score();
        let credits = self.game.reward().credits_for(score);
        let grade = self.game.grade(score);

        let recorded = self.best.record(score, credits);
        self.best.save(self.services.store.as_mut(), game_id, recorded);
        if recorded.new_record {
            log::info!("{}: new best score {}", game_id, score);
            self.services.sound.play(SoundEffect::HighScore);
        }

        let report = FinalReport {
            game_id,
            success: outcome.success,
            cause: outcome.cause,
            score,
            grade,
            credits_earned: credits,
            new_record: recorded.new_record,
            best_score: self.best.best_score,
            total_credits: self.best.credits,
        };
        log::info!("{}", report.summary());
        self.report = Some(report);
        self.phase = SessionPhase::Terminal {
            success: outcome.success,
        };
        self.services.scheduler.cancel();

        if let Some(callback) = self.on_complete.as_mut() {
            callback(outcome.success, score);
        }
    }

    /// Snapshot of what the player should see right now
    pub fn frame(&self) -> Frame {
        let mut playfield = self.game.playfield();
        if !self.settings.effective_screen_shake() {
            playfield.shake = 0.0;
        }
        Frame {
            game_id: self.game.kind().id(),
            score: self.report.as_ref().map_or_else(|| self.game.score(), |r| r.score),
            best_score: self.best.best_score,
            credits: self.best.credits,
            playfield,
            achievements: self.game.achievements(),
            toasts: self.toasts.clone(),
            result: self.report.clone(),
        }
    }

    fn render(&mut self, now_ms: Option<f64>) {
        if let Some(now) = now_ms {
            self.toasts.retain(|t| t.expires_at_ms > now);
        }
        let frame = self.frame();
        self.services.target.present(&frame);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::audio::Silent;
    use crate::persistence::MemoryStore;
    use crate::platform::ManualScheduler;
    use crate::sim::{DodgeGame, DodgeInput, RunGame, RunInput};
    use crate::tuning::{DodgeTuning, RunTuning};
    use crate::view::{HeadlessTarget, Unmounted};

    type Calls = Rc<RefCell<Vec<(bool, u64)>>>;

    fn services(scheduler: &ManualScheduler) -> Services {
        Services {
            target: Box::new(HeadlessTarget::default()),
            scheduler: Box::new(scheduler.clone()),
            store: Box::new(MemoryStore::new()),
            sound: Box::new(Silent),
        }
    }

    fn run_session(seed: u64) -> (SessionController<RunGame>, ManualScheduler, Calls) {
        let scheduler = ManualScheduler::new();
        let calls: Calls = Rc::default();
        let sink = calls.clone();
        let session = SessionController::new(
            RunGame::new(RunTuning::default(), SessionConfig::with_seed(seed)),
            SessionConfig::with_seed(seed),
            services(&scheduler),
            move |ok, score| sink.borrow_mut().push((ok, score)),
        );
        (session, scheduler, calls)
    }

    /// Pump frames at 60 Hz until the scheduler goes quiet
    fn pump<G: Minigame>(session: &mut SessionController<G>, scheduler: &ManualScheduler, max_frames: u32) -> f64 {
        let mut now = 0.0;
        for _ in 0..max_frames {
            if !scheduler.take() {
                break;
            }
            now += 16.0;
            session.on_frame(now);
        }
        now
    }

    #[test]
    fn init_requires_a_mounted_target() {
        let scheduler = ManualScheduler::new();
        let mut services = services(&scheduler);
        services.target = Box::new(Unmounted);
        let mut session = SessionController::new(
            RunGame::new(RunTuning::default(), SessionConfig::default()),
            SessionConfig::default(),
            services,
            |_, _| {},
        );
        assert_eq!(session.init(), Err(SessionError::MissingRenderTarget));
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(!scheduler.is_pending());
    }

    #[test]
    fn init_is_idempotent() {
        let (mut session, scheduler, _) = run_session(1);
        session.init().unwrap();
        session.init().unwrap();
        assert_eq!(session.phase(), SessionPhase::Running);
        assert_eq!(scheduler.requests(), 1);
    }

    #[test]
    fn crash_finalizes_exactly_once() {
        let (mut session, scheduler, calls) = run_session(4);
        session.init().unwrap();
        pump(&mut session, &scheduler, 10_000);

        assert_eq!(session.phase(), SessionPhase::Terminal { success: false });
        assert_eq!(calls.borrow().len(), 1);
        assert!(!scheduler.is_pending());

        // Late frames do nothing
        session.on_frame(1.0e7);
        assert_eq!(calls.borrow().len(), 1);

        let report = session.report().unwrap();
        assert_eq!(report.credits_earned, RunTuning::default().reward.credits_for(report.score));
        assert_eq!(session.best().credits, report.credits_earned);
    }

    #[test]
    fn restart_only_from_terminal() {
        let (mut session, scheduler, calls) = run_session(4);
        assert_eq!(session.restart(), Err(SessionError::NotTerminal(SessionPhase::Idle)));
        session.init().unwrap();
        assert_eq!(session.restart(), Err(SessionError::NotTerminal(SessionPhase::Running)));

        pump(&mut session, &scheduler, 10_000);
        let first_seed = session.config().seed;
        session.restart().unwrap();
        assert_eq!(session.phase(), SessionPhase::Running);
        assert_ne!(session.config().seed, first_seed);
        assert!(session.report().is_none());

        pump(&mut session, &scheduler, 10_000);
        assert_eq!(calls.borrow().len(), 2);
        // Credits accumulate across runs
        let credits: u64 = calls
            .borrow()
            .iter()
            .map(|(_, score)| RunTuning::default().reward.credits_for(*score))
            .sum();
        assert_eq!(session.best().credits, credits);
    }

    #[test]
    fn destroy_is_idempotent_and_final() {
        let (mut session, scheduler, calls) = run_session(2);
        session.init().unwrap();
        assert!(scheduler.is_pending());
        session.destroy();
        session.destroy();
        assert_eq!(session.phase(), SessionPhase::Destroyed);
        assert!(!scheduler.is_pending());
        assert_eq!(session.init(), Err(SessionError::Destroyed));
        assert_eq!(session.restart(), Err(SessionError::Destroyed));
        session.on_frame(16.0);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn destroy_before_init() {
        let (mut session, scheduler, calls) = run_session(2);
        session.destroy();
        session.destroy();
        assert_eq!(session.phase(), SessionPhase::Destroyed);
        assert!(!scheduler.is_pending());
        assert_eq!(session.init(), Err(SessionError::Destroyed));
        assert!(!scheduler.is_pending());
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn restart_honours_pending_teardown() {
        let (mut session, scheduler, calls) = run_session(4);
        session.init().unwrap();
        pump(&mut session, &scheduler, 10_000);
        assert!(matches!(session.phase(), SessionPhase::Terminal { .. }));
        session.teardown_handle().request();
        assert_eq!(session.restart(), Err(SessionError::Destroyed));
        assert_eq!(session.phase(), SessionPhase::Destroyed);
        assert!(!scheduler.is_pending());
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn teardown_from_callback_stops_rescheduling() {
        let scheduler = ManualScheduler::new();
        let handle: Rc<RefCell<Option<TeardownHandle>>> = Rc::default();
        let in_callback = handle.clone();
        let mut session = SessionController::new(
            RunGame::new(RunTuning::default(), SessionConfig::with_seed(3)),
            SessionConfig::with_seed(3),
            services(&scheduler),
            move |_, _| {
                if let Some(h) = in_callback.borrow().as_ref() {
                    h.request();
                }
            },
        );
        *handle.borrow_mut() = Some(session.teardown_handle());
        session.init().unwrap();
        pump(&mut session, &scheduler, 10_000);
        assert_eq!(session.phase(), SessionPhase::Destroyed);
        assert!(!scheduler.is_pending());
        assert!(session.toasts().is_empty());
    }

    #[test]
    fn storage_failure_still_completes_once() {
        let scheduler = ManualScheduler::new();
        let mut services = services(&scheduler);
        services.store = Box::new(MemoryStore::unavailable());
        let calls: Calls = Rc::default();
        let sink = calls.clone();
        let mut session = SessionController::new(
            RunGame::new(RunTuning::default(), SessionConfig::with_seed(5)),
            SessionConfig::with_seed(5),
            services,
            move |ok, score| sink.borrow_mut().push((ok, score)),
        );
        session.init().unwrap();
        pump(&mut session, &scheduler, 10_000);
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn best_score_only_on_strictly_greater() {
        let mut store = MemoryStore::new();
        store.write("marsRun_bestScore", "1000000").unwrap();
        let scheduler = ManualScheduler::new();
        let mut services = services(&scheduler);
        services.store = Box::new(store);
        let mut session = SessionController::new(
            RunGame::new(RunTuning::default(), SessionConfig::with_seed(6)),
            SessionConfig::with_seed(6),
            services,
            |_, _| {},
        );
        session.init().unwrap();
        pump(&mut session, &scheduler, 10_000);
        let report = session.report().unwrap();
        assert!(!report.new_record);
        assert_eq!(session.best().best_score, 1_000_000);
    }

    #[test]
    fn one_shot_input_applies_once_per_frame() {
        let scheduler = ManualScheduler::new();
        let mut session = SessionController::new(
            DodgeGame::new(DodgeTuning::default(), SessionConfig::with_seed(1)),
            SessionConfig::with_seed(1),
            services(&scheduler),
            |_, _| {},
        )
        .with_clock(SimClock::fixed(1.0 / 120.0, 0.05));
        session.init().unwrap();
        session.on_frame(0.0);
        session.input_mut().right();
        // 50ms at 120Hz is several substeps
        session.on_frame(50.0);
        assert_eq!(session.game().state().lane.x, 65.0);
        assert_eq!(*session.input_mut(), DodgeInput::default());
    }

    #[test]
    fn thrust_input_is_held_between_frames() {
        let (mut session, _scheduler, _) = run_session(8);
        session.init().unwrap();
        session.input_mut().thrust = true;
        session.on_frame(0.0);
        session.on_frame(16.0);
        assert_eq!(*session.input_mut(), RunInput { thrust: true });
    }
}
