//! Asteroid navigator
//!
//! The ship slides between lanes along the bottom of the field while
//! asteroids and collectibles fall from the top. Three hits and the run
//! is over; surviving longer raises the difficulty.

use glam::Vec2;

use super::achievements::{AchievementDef, AchievementRecord, AchievementTracker, SessionStats, Threshold};
use super::game::{GameEvent, GameKind, Minigame, Outcome, SessionConfig, TerminalCause};
use super::physics::Lane;
use super::rng::GameRng;
use super::scoring::{PickupKind, apply_pickup, swept_band_hit};
use super::track::SpawnTimer;
use crate::tuning::{DodgeTuning, RewardTuning};
use crate::view::{Meter, Playfield, Sprite, SpriteKind, Status};

pub static DODGE_ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: "survive_30",
        title: "30s in the belt",
        bonus: 25,
        threshold: Threshold::SurvivedFor(30.0),
    },
    AchievementDef {
        id: "dodge_20",
        title: "20 asteroids dodged",
        bonus: 30,
        threshold: Threshold::DodgedAtLeast(20),
    },
];

/// Vertical position the ship is drawn at
const PLAYER_Y: f32 = 90.0;

/// What a falling object is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallingKind {
    Asteroid,
    Collectible(PickupKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FallingObject {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub kind: FallingKind,
    /// Degrees, cosmetic
    pub rotation: f32,
}

/// Lateral steps requested since the last step; negative is left
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DodgeInput {
    pub steps: i32,
}

impl DodgeInput {
    pub fn left(&mut self) {
        self.steps -= 1;
    }

    pub fn right(&mut self) {
        self.steps += 1;
    }
}

#[derive(Debug, Clone)]
pub struct DodgeState {
    pub lane: Lane,
    pub objects: Vec<FallingObject>,
    pub score: u64,
    pub lives: u8,
    pub elapsed: f32,
    pub difficulty: f32,
    pub dodged: u32,
    pub collected: u32,
    pub asteroid_timer: SpawnTimer,
    pub collectible_timer: SpawnTimer,
    pub terminal: Option<Outcome>,
}

impl DodgeState {
    fn new(tuning: &DodgeTuning, base_difficulty: f32) -> Self {
        Self {
            lane: Lane::new(tuning.start_x, tuning.player_width),
            objects: Vec::new(),
            score: 0,
            lives: tuning.start_lives.min(tuning.max_lives),
            elapsed: 0.0,
            difficulty: base_difficulty,
            dodged: 0,
            collected: 0,
            asteroid_timer: SpawnTimer::new(tuning.asteroid_spawn_rate),
            collectible_timer: SpawnTimer::new(tuning.collectible_spawn_rate),
            terminal: None,
        }
    }
}

/// The asteroid navigator minigame
pub struct DodgeGame {
    tuning: DodgeTuning,
    config: SessionConfig,
    rng: GameRng,
    state: DodgeState,
    achievements: AchievementTracker,
}

impl DodgeGame {
    pub fn new(tuning: DodgeTuning, config: SessionConfig) -> Self {
        let state = DodgeState::new(&tuning, config.difficulty());
        Self {
            rng: GameRng::new(config.seed),
            tuning,
            config,
            state,
            achievements: AchievementTracker::new(),
        }
    }

    pub fn state(&self) -> &DodgeState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut DodgeState {
        &mut self.state
    }

    /// `base + floor(elapsed / interval) * step`
    pub fn difficulty_at(&self, elapsed: f32) -> f32 {
        let t = &self.tuning;
        self.config.difficulty() + (elapsed / t.difficulty_interval).floor() * t.difficulty_step
    }

    fn spawn(&mut self, kind: FallingKind) {
        let t = &self.tuning;
        let size = match kind {
            FallingKind::Asteroid => self.rng.range(t.asteroid_min_size, t.asteroid_max_size),
            FallingKind::Collectible(_) => t.collectible_size,
        };
        let object = FallingObject {
            x: self.rng.range(t.spawn_x_min, t.spawn_x_max),
            y: t.spawn_y,
            size,
            kind,
            rotation: self.rng.range(0.0, 360.0),
        };
        log::trace!("Spawned {:?} at x={:.1}", object.kind, object.x);
        self.state.objects.push(object);
    }

    fn finish(&mut self, outcome: Outcome, events: &mut Vec<GameEvent>) -> Option<Outcome> {
        log::info!(
            "Dodge over: {} after {:.1}s, score {}",
            outcome.cause.describe(),
            self.state.elapsed,
            self.state.score
        );
        self.state.terminal = Some(outcome);
        events.push(GameEvent::Terminal(outcome));
        Some(outcome)
    }

    fn stats(&self) -> SessionStats {
        SessionStats {
            survival_secs: self.state.elapsed,
            dodged: self.state.dodged,
            collected: self.state.collected,
            ..Default::default()
        }
    }
}

impl Minigame for DodgeGame {
    type Input = DodgeInput;

    fn kind(&self) -> GameKind {
        GameKind::AsteroidNavigator
    }

    fn reset(&mut self, config: &SessionConfig) {
        self.config = config.clone();
        self.rng = GameRng::new(config.seed);
        self.state = DodgeState::new(&self.tuning, config.difficulty());
        self.achievements.clear();
        log::debug!("Dodge reset with seed {}", config.seed);
    }

    fn step(&mut self, input: &DodgeInput, dt: f32, events: &mut Vec<GameEvent>) -> Option<Outcome> {
        if self.state.terminal.is_some() {
            return None;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if input.steps != 0 {
            self.state.lane.shift(input.steps as f32 * self.tuning.move_step);
        }

        self.state.elapsed += dt;
        self.state.difficulty = self.difficulty_at(self.state.elapsed);

        let difficulty = self.state.difficulty;
        if self.state.asteroid_timer.tick(dt, difficulty) {
            self.spawn(FallingKind::Asteroid);
        }
        // Collectibles keep their own pace regardless of difficulty
        if self.state.collectible_timer.tick(dt, 1.0) {
            let kind = if self.rng.coin() {
                PickupKind::Fuel
            } else {
                PickupKind::Shield
            };
            self.spawn(FallingKind::Collectible(kind));
        }

        let t = &self.tuning;
        let fall = t.fall_speed * difficulty * dt;
        let player_x = self.state.lane.x;
        let mut lost_all = false;
        let mut objects = std::mem::take(&mut self.state.objects);
        objects.retain_mut(|object| {
            if lost_all {
                return true;
            }
            let prev_y = object.y;
            object.y += fall;
            let touching = swept_band_hit(prev_y, object.y, t.hit_band_top, t.hit_band_bottom)
                && (object.x - player_x).abs() < t.player_width;
            if touching {
                match object.kind {
                    FallingKind::Asteroid => {
                        self.state.lives = self.state.lives.saturating_sub(1);
                        log::debug!("Asteroid hit, {} lives left", self.state.lives);
                        if self.state.lives == 0 {
                            lost_all = true;
                        } else {
                            events.push(GameEvent::Hit {
                                lives_left: self.state.lives,
                            });
                        }
                    }
                    FallingKind::Collectible(kind) => {
                        let points =
                            apply_pickup(kind, &mut self.state.score, &mut self.state.lives, t.fuel_bonus, t.max_lives);
                        self.state.collected += 1;
                        events.push(GameEvent::Collected { kind, points });
                    }
                }
                return false;
            }
            if object.y >= t.despawn_y {
                if object.kind == FallingKind::Asteroid {
                    self.state.dodged += 1;
                }
                return false;
            }
            true
        });
        self.state.objects = objects;

        if lost_all {
            return self.finish(Outcome::failure(TerminalCause::LivesExhausted), events);
        }

        let stats = self.stats();
        for unlock in self.achievements.evaluate(DODGE_ACHIEVEMENTS, &stats) {
            self.state.score += unlock.bonus;
            events.push(GameEvent::AchievementUnlocked(unlock));
        }

        if let Some(limit) = self.config.time_limit
            && self.state.elapsed >= limit
        {
            return self.finish(
                Outcome {
                    success: true,
                    cause: TerminalCause::TimeUp,
                },
                events,
            );
        }
        None
    }

    fn is_terminal(&self) -> bool {
        self.state.terminal.is_some()
    }

    fn score(&self) -> u64 {
        self.state.score
    }

    /// Live score plus one point per whole second survived
    fn final_score(&self) -> u64 {
        self.state.score + self.state.elapsed.floor() as u64
    }

    fn reward(&self) -> &RewardTuning {
        &self.tuning.reward
    }

    fn achievements(&self) -> Vec<AchievementRecord> {
        self.achievements.records(DODGE_ACHIEVEMENTS)
    }

    fn clear_one_shot(input: &mut DodgeInput) {
        input.steps = 0;
    }

    fn playfield(&self) -> Playfield {
        let t = &self.tuning;
        let mut sprites: Vec<Sprite> = self
            .state
            .objects
            .iter()
            .map(|o| {
                let kind = match o.kind {
                    FallingKind::Asteroid => SpriteKind::Asteroid,
                    FallingKind::Collectible(PickupKind::Fuel) => SpriteKind::FuelCell,
                    FallingKind::Collectible(PickupKind::Shield) => SpriteKind::Shield,
                };
                // Object sizes are pixels on a 1000px reference field
                let size = Vec2::splat(o.size / 10.0);
                Sprite::new(kind, Vec2::new(o.x, o.y) - size / 2.0, size).rotated(o.rotation)
            })
            .collect();
        let w = t.player_width;
        sprites.push(Sprite::new(
            SpriteKind::Ship,
            Vec2::new(self.state.lane.x - w / 2.0, PLAYER_Y - w / 2.0),
            Vec2::splat(w),
        ));

        let status = if self.state.terminal.is_some_and(|o| !o.success) {
            Status::Dead
        } else if self.state.lives <= 1 {
            Status::Risk
        } else {
            Status::Flow
        };

        Playfield {
            sprites,
            meters: vec![
                Meter::new("lives", self.state.lives),
                Meter::new("time", format!("{}s", self.state.elapsed.floor())),
                Meter::new("difficulty", format!("{:.1}", self.state.difficulty)),
            ],
            combo_label: "x1".to_string(),
            status,
            shake: 0.0,
        }
    }
}
