//! Resource collector
//!
//! Resources pop up across the field and fade after a few seconds. Picking
//! them quickly builds a combo that multiplies their value; the session
//! ends when the countdown runs out and passes above a score threshold.

use glam::Vec2;

use super::achievements::{AchievementDef, AchievementRecord, AchievementTracker, SessionStats, Threshold};
use super::game::{GameEvent, GameKind, Minigame, Outcome, SessionConfig, TerminalCause};
use super::rng::GameRng;
use crate::tuning::{CollectorTuning, RewardTuning};
use crate::view::{Meter, Playfield, Sprite, SpriteKind, Status};

pub static COLLECTOR_ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: "combo_5",
        title: "Combo x5",
        bonus: 40,
        threshold: Threshold::ComboAtLeast(5),
    },
    AchievementDef {
        id: "collect_15",
        title: "15 resources collected",
        bonus: 30,
        threshold: Threshold::CollectedAtLeast(15),
    },
];

/// A kind of surface resource and its base value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceKind {
    pub name: &'static str,
    pub label: &'static str,
    pub value: u64,
}

pub static RESOURCE_KINDS: &[ResourceKind] = &[
    ResourceKind {
        name: "H₂O",
        label: "Water ice",
        value: 10,
    },
    ResourceKind {
        name: "Fe₂O₃",
        label: "Iron oxide",
        value: 15,
    },
    ResourceKind {
        name: "CO₂",
        label: "Carbon dioxide",
        value: 8,
    },
    ResourceKind {
        name: "SiO₂",
        label: "Silica",
        value: 12,
    },
    ResourceKind {
        name: "CH₄",
        label: "Methane",
        value: 20,
    },
];

/// Marker size in percent of the field
const RESOURCE_SIZE: f32 = 8.0;
/// Seconds left at which the HUD turns to RISK
const URGENT_SECS: f32 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: u32,
    pub kind: ResourceKind,
    pub pos: Vec2,
    /// Seconds on the field
    pub life: f32,
}

/// Resource ids picked since the last step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectorInput {
    pub picks: Vec<u32>,
}

impl CollectorInput {
    pub fn pick(&mut self, id: u32) {
        self.picks.push(id);
    }
}

#[derive(Debug, Clone)]
pub struct CollectorState {
    pub resources: Vec<Resource>,
    pub score: u64,
    /// Always within `1..=max_combo`
    pub combo: u32,
    pub max_combo: u32,
    pub collected: u32,
    pub duration: f32,
    pub time_left: f32,
    pub since_pick: f32,
    /// No refills until this runs out
    pub respawn_cooldown: f32,
    pub next_id: u32,
    pub terminal: Option<Outcome>,
}

impl CollectorState {
    fn new(duration: f32) -> Self {
        Self {
            resources: Vec::new(),
            score: 0,
            combo: 1,
            max_combo: 1,
            collected: 0,
            duration,
            time_left: duration,
            since_pick: 0.0,
            respawn_cooldown: 0.0,
            next_id: 0,
            terminal: None,
        }
    }
}

/// The resource collector minigame
pub struct CollectorGame {
    tuning: CollectorTuning,
    rng: GameRng,
    state: CollectorState,
    achievements: AchievementTracker,
}

impl CollectorGame {
    pub fn new(tuning: CollectorTuning, config: SessionConfig) -> Self {
        let mut game = Self {
            rng: GameRng::new(config.seed),
            state: CollectorState::new(tuning.duration),
            tuning,
            achievements: AchievementTracker::new(),
        };
        game.reset(&config);
        game
    }

    pub fn state(&self) -> &CollectorState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut CollectorState {
        &mut self.state
    }

    fn spawn(&mut self) {
        let t = &self.tuning;
        let kind = RESOURCE_KINDS[self.rng.index(RESOURCE_KINDS.len())];
        let pos = Vec2::new(
            self.rng.range(t.spawn_x_min, t.spawn_x_max),
            self.rng.range(t.spawn_y_min, t.spawn_y_max),
        );
        let id = self.state.next_id;
        self.state.next_id = self.state.next_id.wrapping_add(1);
        self.state.resources.push(Resource {
            id,
            kind,
            pos,
            life: 0.0,
        });
    }

    /// Collect resource `id` if it is still on the field
    fn pick(&mut self, id: u32, events: &mut Vec<GameEvent>) {
        let Some(index) = self.state.resources.iter().position(|r| r.id == id) else {
            log::trace!("Pick on missing resource {}", id);
            return;
        };
        let resource = self.state.resources.remove(index);
        let st = &mut self.state;
        let points = resource.kind.value * st.combo as u64;
        st.score += points;
        events.push(GameEvent::ResourcePicked {
            points,
            combo: st.combo,
        });
        st.combo = (st.combo + 1).min(self.tuning.max_combo);
        st.max_combo = st.max_combo.max(st.combo);
        st.collected += 1;
        st.since_pick = 0.0;
        st.respawn_cooldown = self.tuning.respawn_delay;
    }

    fn evaluate_achievements(&mut self, events: &mut Vec<GameEvent>) {
        let stats = SessionStats {
            collected: self.state.collected,
            max_combo: self.state.max_combo,
            survival_secs: self.state.duration - self.state.time_left.max(0.0),
            ..Default::default()
        };
        for unlock in self.achievements.evaluate(COLLECTOR_ACHIEVEMENTS, &stats) {
            self.state.score += unlock.bonus;
            events.push(GameEvent::AchievementUnlocked(unlock));
        }
    }

    fn finish(&mut self, events: &mut Vec<GameEvent>) -> Option<Outcome> {
        let outcome = Outcome {
            success: self.state.score >= self.tuning.pass_threshold,
            cause: TerminalCause::TimeUp,
        };
        log::info!(
            "Collector over: score {} ({})",
            self.state.score,
            if outcome.success { "passed" } else { "below threshold" }
        );
        self.state.time_left = 0.0;
        self.state.terminal = Some(outcome);
        events.push(GameEvent::Terminal(outcome));
        Some(outcome)
    }
}

impl Minigame for CollectorGame {
    type Input = CollectorInput;

    fn kind(&self) -> GameKind {
        GameKind::ResourceCollector
    }

    fn reset(&mut self, config: &SessionConfig) {
        self.rng = GameRng::new(config.seed);
        let duration = config.time_limit.filter(|d| *d > 0.0).unwrap_or(self.tuning.duration);
        self.state = CollectorState::new(duration);
        self.achievements.clear();
        self.spawn();
        log::debug!("Collector reset with seed {}, {}s on the clock", config.seed, duration);
    }

    fn step(&mut self, input: &CollectorInput, dt: f32, events: &mut Vec<GameEvent>) -> Option<Outcome> {
        if self.state.terminal.is_some() {
            return None;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        for &id in &input.picks {
            self.pick(id, events);
        }

        self.state.time_left -= dt;
        // A pick on the final step still counts toward achievements
        self.evaluate_achievements(events);
        if self.state.time_left <= 0.0 {
            return self.finish(events);
        }

        self.state.since_pick += dt;
        if self.state.since_pick > self.tuning.combo_reset_sec && self.state.combo > 1 {
            log::trace!("Combo lapsed at x{}", self.state.combo);
            self.state.combo = 1;
        }

        let life = self.tuning.resource_life;
        for resource in &mut self.state.resources {
            resource.life += dt;
        }
        self.state.resources.retain(|r| r.life <= life);

        self.state.respawn_cooldown = (self.state.respawn_cooldown - dt).max(0.0);
        if self.state.respawn_cooldown == 0.0 && self.state.resources.len() < self.tuning.max_on_field {
            self.spawn();
        }

        None
    }

    fn is_terminal(&self) -> bool {
        self.state.terminal.is_some()
    }

    fn score(&self) -> u64 {
        self.state.score
    }

    fn reward(&self) -> &RewardTuning {
        &self.tuning.reward
    }

    fn achievements(&self) -> Vec<AchievementRecord> {
        self.achievements.records(COLLECTOR_ACHIEVEMENTS)
    }

    fn clear_one_shot(input: &mut CollectorInput) {
        input.picks.clear();
    }

    fn playfield(&self) -> Playfield {
        let life = self.tuning.resource_life;
        let sprites = self
            .state
            .resources
            .iter()
            .map(|r| {
                // Markers shrink as they age
                let fade = 1.0 - (r.life / life).min(1.0) * 0.5;
                let size = Vec2::splat(RESOURCE_SIZE * fade);
                Sprite::new(SpriteKind::Resource(r.kind.name), r.pos - size / 2.0, size)
            })
            .collect();

        let status = if self.state.terminal.is_some_and(|o| !o.success) {
            Status::Dead
        } else if self.state.time_left < URGENT_SECS {
            Status::Risk
        } else {
            Status::Flow
        };

        Playfield {
            sprites,
            meters: vec![
                Meter::new("time", format!("{}s", self.state.time_left.max(0.0).ceil())),
                Meter::new("collected", self.state.collected),
            ],
            combo_label: format!("x{}", self.state.combo),
            status,
            shake: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> CollectorGame {
        CollectorGame::new(CollectorTuning::default(), SessionConfig::with_seed(8))
    }

    fn pick_first(game: &mut CollectorGame, events: &mut Vec<GameEvent>) -> u64 {
        let id = game.state().resources[0].id;
        let value = game.state().resources[0].kind.value;
        let mut input = CollectorInput::default();
        input.pick(id);
        game.step(&input, 0.01, events);
        value
    }

    #[test]
    fn starts_with_one_resource_and_fills_up() {
        let mut g = game();
        assert_eq!(g.state().resources.len(), 1);
        let mut events = Vec::new();
        for _ in 0..5 {
            g.step(&CollectorInput::default(), 0.01, &mut events);
        }
        assert_eq!(g.state().resources.len(), 3);
    }

    #[test]
    fn picks_multiply_by_combo() {
        let mut g = game();
        let mut events = Vec::new();
        let first = pick_first(&mut g, &mut events);
        assert_eq!(g.score(), first);
        assert_eq!(g.state().combo, 2);
        // Let the refill cooldown pass
        for _ in 0..40 {
            g.step(&CollectorInput::default(), 0.01, &mut events);
        }
        let second = pick_first(&mut g, &mut events);
        assert_eq!(g.score(), first + second * 2);
    }

    #[test]
    fn combo_caps_and_lapses() {
        let mut g = game();
        let mut events = Vec::new();
        for _ in 0..8 {
            for _ in 0..40 {
                g.step(&CollectorInput::default(), 0.01, &mut events);
            }
            pick_first(&mut g, &mut events);
        }
        assert_eq!(g.state().combo, 5);
        assert!(g.achievements().iter().any(|a| a.id == "combo_5" && a.unlocked));

        for _ in 0..25 {
            g.step(&CollectorInput::default(), 0.1, &mut events);
        }
        assert_eq!(g.state().combo, 1);
    }

    #[test]
    fn resources_expire() {
        let mut g = game();
        let first_id = g.state().resources[0].id;
        let mut events = Vec::new();
        for _ in 0..51 {
            g.step(&CollectorInput::default(), 0.1, &mut events);
        }
        assert!(g.state().resources.iter().all(|r| r.id != first_id));
        assert!(g.state().resources.len() <= 3);
    }

    #[test]
    fn stale_pick_is_ignored() {
        let mut g = game();
        let mut input = CollectorInput::default();
        input.pick(9_999);
        let mut events = Vec::new();
        g.step(&input, 0.01, &mut events);
        assert_eq!(g.score(), 0);
        assert_eq!(g.state().combo, 1);
    }

    #[test]
    fn countdown_decides_success() {
        let mut g = game();
        let mut events = Vec::new();
        let mut outcome = None;
        for _ in 0..400 {
            outcome = g.step(&CollectorInput::default(), 0.1, &mut events);
            if outcome.is_some() {
                break;
            }
        }
        assert_eq!(
            outcome,
            Some(Outcome {
                success: false,
                cause: TerminalCause::TimeUp
            })
        );

        let mut g = game();
        g.state_mut().score = 150;
        g.state_mut().time_left = 0.05;
        let outcome = g.step(&CollectorInput::default(), 0.1, &mut events).unwrap();
        assert!(outcome.success);
    }

    #[test]
    fn final_step_pick_unlocks_achievement() {
        let mut g = game();
        g.state_mut().collected = 14;
        g.state_mut().time_left = 0.05;
        let mut input = CollectorInput::default();
        input.pick(g.state().resources[0].id);
        let mut events = Vec::new();
        let outcome = g.step(&input, 0.1, &mut events);
        assert_eq!(outcome.map(|o| o.cause), Some(TerminalCause::TimeUp));
        assert!(g.achievements().iter().any(|a| a.id == "collect_15" && a.unlocked));
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::AchievementUnlocked(u) if u.id == "collect_15"))
        );
    }
}
