//! Mars canyon run
//!
//! Hold thrust to climb, release to fall. The canyon scrolls left at a
//! speed that ramps with distance; each tunnel segment cleared scores, and
//! threading it through the middle chains perfect bonuses.

use glam::Vec2;

use super::achievements::{AchievementDef, AchievementRecord, AchievementTracker, SessionStats, Threshold};
use super::game::{GameEvent, GameKind, Minigame, Outcome, SessionConfig, TerminalCause};
use super::physics::ShipBody;
use super::rng::GameRng;
use super::scoring::{BandCheck, ComboTracker, PerfectChain, check_segment, score_pass};
use super::track::{TrackGenerator, speed_scale};
use crate::tuning::{RewardTuning, RunTuning};
use crate::view::{Meter, Playfield, Sprite, SpriteKind, Status};

pub static RUN_ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: "distance_300",
        title: "300m without a crash",
        bonus: 30,
        threshold: Threshold::DistanceAtLeast(300.0),
    },
    AchievementDef {
        id: "no_thrust_8",
        title: "8s without thrust",
        bonus: 35,
        threshold: Threshold::NoThrustFor(8.0),
    },
    AchievementDef {
        id: "perfect_chain_3",
        title: "Perfect Chain x3",
        bonus: 45,
        threshold: Threshold::PerfectChainAtLeast(3),
    },
];

// Cosmetic shake: builds while thrusting, bleeds off over time
const SHAKE_PER_THRUST_STEP: f32 = 0.5;
const SHAKE_MAX: f32 = 6.0;
const SHAKE_DECAY_PER_SEC: f32 = 14.0;
const SHAKE_PERFECT_RELIEF: f32 = 1.5;

/// Distance from the ceiling or floor at which the HUD shows RISK
const DANGER_MARGIN: f32 = 14.0;

/// Input for the run game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunInput {
    /// Held, not one-shot
    pub thrust: bool,
}

/// Per-session state of a canyon run
#[derive(Debug, Clone)]
pub struct RunState {
    pub ship: ShipBody,
    pub track: TrackGenerator,
    pub score: u64,
    pub combo: ComboTracker,
    pub chain: PerfectChain,
    pub distance: f32,
    pub survival_secs: f32,
    pub no_thrust_secs: f32,
    pub achievement_bonus: u64,
    pub shake: f32,
    pub terminal: Option<Outcome>,
}

/// The canyon run minigame
pub struct RunGame {
    tuning: RunTuning,
    config: SessionConfig,
    rng: GameRng,
    state: RunState,
    achievements: AchievementTracker,
}

impl RunGame {
    pub fn new(tuning: RunTuning, config: SessionConfig) -> Self {
        let rng = GameRng::new(config.seed);
        let state = RunState {
            ship: ShipBody::new(&tuning.ship),
            track: TrackGenerator::new(tuning.track.clone()),
            score: 0,
            combo: ComboTracker::default(),
            chain: PerfectChain::default(),
            distance: 0.0,
            survival_secs: 0.0,
            no_thrust_secs: 0.0,
            achievement_bonus: 0,
            shake: 0.0,
            terminal: None,
        };
        let mut game = Self {
            tuning,
            config: config.clone(),
            rng,
            state,
            achievements: AchievementTracker::new(),
        };
        game.reset(&config);
        game
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut RunState {
        &mut self.state
    }

    pub fn tuning(&self) -> &RunTuning {
        &self.tuning
    }

    /// Current world scroll speed, percent/s
    pub fn world_speed(&self) -> f32 {
        self.tuning.track.horizontal_speed
            * speed_scale(self.state.distance, &self.tuning.track)
            * self.config.difficulty()
    }

    fn stats(&self) -> SessionStats {
        SessionStats {
            distance: self.state.distance,
            no_thrust_secs: self.state.no_thrust_secs,
            perfect_chain: self.state.chain.chain,
            survival_secs: self.state.survival_secs,
            max_combo: self.state.combo.max_combo,
            ..Default::default()
        }
    }

    fn finish(&mut self, outcome: Outcome, events: &mut Vec<GameEvent>) -> Option<Outcome> {
        log::info!(
            "Run over: {} at {:.0}m, score {}",
            outcome.cause.describe(),
            self.state.distance,
            self.state.score
        );
        self.state.terminal = Some(outcome);
        events.push(GameEvent::Terminal(outcome));
        Some(outcome)
    }

    /// Collision and pass scoring. Returns true on a crash.
    fn resolve_segments(&mut self, events: &mut Vec<GameEvent>) -> bool {
        let ship = &self.tuning.ship;
        let width = self.tuning.track.segment_width;
        let ship_y = self.state.ship.pos.y;

        if self.state.distance < self.tuning.track.grace_distance {
            for segment in self.state.track.segments_mut() {
                if !segment.passed && segment.right_edge(width) < ship.ship_x {
                    segment.passed = true;
                }
            }
            return false;
        }

        let hit = self.state.track.segments().iter().any(|segment| {
            check_segment(ship.ship_x, ship.ship_radius, ship_y, segment, width, self.tuning.combo.gap_margin)
                == BandCheck::Hit
        });
        if hit {
            return true;
        }

        let RunState {
            track,
            combo,
            chain,
            score,
            shake,
            ..
        } = &mut self.state;
        for segment in track.segments_mut() {
            if segment.passed || segment.right_edge(width) >= ship.ship_x {
                continue;
            }
            segment.passed = true;
            let award = score_pass(combo, chain, segment, ship_y, &self.tuning.combo);
            *score += award.total();
            events.push(GameEvent::SegmentPassed {
                index: award.segment_index,
                points: award.base,
            });
            if let Some((tier, bonus)) = award.perfect {
                *shake = (*shake - SHAKE_PERFECT_RELIEF).max(0.0);
                events.push(GameEvent::Perfect { tier, bonus });
            }
        }
        false
    }
}

impl Minigame for RunGame {
    type Input = RunInput;

    fn kind(&self) -> GameKind {
        GameKind::MarsRun
    }

    fn reset(&mut self, config: &SessionConfig) {
        self.config = config.clone();
        self.rng = GameRng::new(config.seed);
        self.state.ship = ShipBody::new(&self.tuning.ship);
        self.state.track = TrackGenerator::new(self.tuning.track.clone());
        self.state.track.build_initial(&mut self.rng);
        self.state.score = 0;
        self.state.combo = ComboTracker::default();
        self.state.chain = PerfectChain::default();
        self.state.distance = 0.0;
        self.state.survival_secs = 0.0;
        self.state.no_thrust_secs = 0.0;
        self.state.achievement_bonus = 0;
        self.state.shake = 0.0;
        self.state.terminal = None;
        self.achievements.clear();
        log::debug!("Run reset with seed {}", config.seed);
    }

    fn step(&mut self, input: &RunInput, dt: f32, events: &mut Vec<GameEvent>) -> Option<Outcome> {
        if self.state.terminal.is_some() {
            return None;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let world_speed = self.world_speed();

        let result = self.state.ship.integrate(input.thrust, dt, &self.tuning.ship);
        if result.thrusted {
            self.state.shake = (self.state.shake + SHAKE_PER_THRUST_STEP).min(SHAKE_MAX);
        }

        self.state.distance += world_speed * dt;
        self.state.survival_secs += dt;
        self.state.combo.decay(dt);
        self.state.shake = (self.state.shake - SHAKE_DECAY_PER_SEC * dt).max(0.0);
        if result.thrusted {
            self.state.no_thrust_secs = 0.0;
        } else {
            self.state.no_thrust_secs += dt;
        }

        if result.out_of_bounds {
            return self.finish(Outcome::failure(TerminalCause::OutOfBounds), events);
        }

        let distance = self.state.distance;
        self.state.track.advance(world_speed, dt, distance, &mut self.rng);

        if self.resolve_segments(events) {
            return self.finish(Outcome::failure(TerminalCause::Obstacle), events);
        }

        let stats = self.stats();
        for unlock in self.achievements.evaluate(RUN_ACHIEVEMENTS, &stats) {
            self.state.score += unlock.bonus;
            self.state.achievement_bonus += unlock.bonus;
            events.push(GameEvent::AchievementUnlocked(unlock));
        }

        if let Some(limit) = self.config.time_limit
            && self.state.survival_secs >= limit
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

    fn reward(&self) -> &RewardTuning {
        &self.tuning.reward
    }

    fn achievements(&self) -> Vec<AchievementRecord> {
        self.achievements.records(RUN_ACHIEVEMENTS)
    }

    fn playfield(&self) -> Playfield {
        let ship = &self.tuning.ship;
        let width = self.tuning.track.segment_width;
        let mut sprites = Vec::with_capacity(self.state.track.segments().len() * 2 + 1);
        for segment in self.state.track.segments() {
            let top = segment.gap_top().max(0.0);
            let bottom = segment.gap_bottom().min(100.0);
            sprites.push(Sprite::new(SpriteKind::WallTop, Vec2::new(segment.x, 0.0), Vec2::new(width, top)));
            sprites.push(Sprite::new(
                SpriteKind::WallBottom,
                Vec2::new(segment.x, bottom),
                Vec2::new(width, 100.0 - bottom),
            ));
        }
        let r = ship.ship_radius;
        // Nose tilts with vertical speed
        let tilt = (self.state.ship.vel.y * 1.2).clamp(-22.0, 22.0);
        sprites.push(
            Sprite::new(SpriteKind::Ship, self.state.ship.pos - Vec2::splat(r), Vec2::splat(r * 2.0)).rotated(tilt),
        );

        let y = self.state.ship.pos.y;
        let status = if self.state.terminal.is_some_and(|o| !o.success) {
            Status::Dead
        } else if y < DANGER_MARGIN || y > 100.0 - DANGER_MARGIN {
            Status::Risk
        } else {
            Status::Flow
        };

        Playfield {
            sprites,
            meters: vec![
                Meter::new("distance", self.state.distance.round()),
                Meter::new("speed", format!("{:.0}", self.world_speed())),
                Meter::new("fuel", format!("{}%", self.state.ship.fuel.round())),
            ],
            combo_label: format!("x{}", self.state.combo.combo.max(1)),
            status,
            shake: self.state.shake,
        }
    }
}
