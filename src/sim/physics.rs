//! Physics integration for the controlled entity
//!
//! Positions live in percent space `[0, 100]`, with y growing downward.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{FIELD_MAX, FIELD_MIN};
use crate::tuning::ShipTuning;

/// What a single integration step observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrateResult {
    /// Thrust was actually applied (pressed and fuel available)
    pub thrusted: bool,
    /// Ship crossed the ceiling or floor on this step
    pub out_of_bounds: bool,
}

/// Continuous-control ship: gravity, thrust, fuel and clamped velocity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipBody {
    pub pos: Vec2,
    pub vel: Vec2,
    /// 0..=100
    pub fuel: f32,
}

impl ShipBody {
    pub fn new(tuning: &ShipTuning) -> Self {
        Self {
            pos: Vec2::new(tuning.ship_x, tuning.start_y),
            vel: Vec2::ZERO,
            fuel: tuning.start_fuel.clamp(0.0, 100.0),
        }
    }

    /// Advance one step
    ///
    /// Order matters: thrust and fuel, then gravity, then the velocity clamp
    /// (after accumulation), then position. Horizontal motion is the world
    /// scrolling, not the ship, so `vel.x` stays zero.
    pub fn integrate(&mut self, thrust_pressed: bool, dt: f32, tuning: &ShipTuning) -> IntegrateResult {
        let thrusted = thrust_pressed && self.fuel > 0.0;
        if thrusted {
            self.vel.y -= tuning.thrust * dt;
            self.fuel = (self.fuel - tuning.fuel_burn_per_sec * dt).max(0.0);
        } else {
            self.fuel = (self.fuel + tuning.fuel_recover_per_sec * dt).min(100.0);
        }

        self.vel.y += tuning.gravity * dt;
        self.vel.y = self.vel.y.clamp(tuning.max_rise_speed, tuning.max_fall_speed);
        self.pos.y += self.vel.y * dt;

        let out_of_bounds = self.pos.y < tuning.ceiling || self.pos.y > tuning.floor;
        // Keep the reported position inside the field even on the crash step
        self.pos.y = self.pos.y.clamp(FIELD_MIN, FIELD_MAX);

        IntegrateResult {
            thrusted,
            out_of_bounds,
        }
    }
}

/// Discrete-lane player: input maps straight to a position delta
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub x: f32,
    pub width: f32,
}

impl Lane {
    pub fn new(x: f32, width: f32) -> Self {
        let mut lane = Self { x, width };
        lane.x = lane.clamp(x);
        lane
    }

    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }

    /// Move by `delta` percent, clamped to `[half_width, 100 - half_width]`
    pub fn shift(&mut self, delta: f32) {
        self.x = self.clamp(self.x + delta);
    }

    fn clamp(&self, x: f32) -> f32 {
        x.clamp(self.half_width(), FIELD_MAX - self.half_width())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gravity_pulls_down_without_thrust() {
        let t = ShipTuning::default();
        let mut ship = ShipBody::new(&t);
        let r = ship.integrate(false, 0.05, &t);
        assert!(!r.thrusted);
        assert!(ship.vel.y > 0.0);
        assert!(ship.pos.y > t.start_y);
    }

    #[test]
    fn thrust_burns_fuel_and_rises() {
        let t = ShipTuning::default();
        let mut ship = ShipBody::new(&t);
        for _ in 0..10 {
            ship.integrate(true, 0.05, &t);
        }
        assert!(ship.vel.y < 0.0);
        assert!(ship.fuel < 100.0);
    }

    #[test]
    fn empty_tank_means_no_thrust() {
        let t = ShipTuning::default();
        let mut ship = ShipBody::new(&t);
        ship.fuel = 0.0;
        let r = ship.integrate(true, 0.05, &t);
        assert!(!r.thrusted);
        assert!(ship.fuel > 0.0, "refills while not thrusting");
    }

    #[test]
    fn velocity_is_clamped_after_accumulation() {
        let t = ShipTuning::default();
        let mut ship = ShipBody::new(&t);
        ship.vel.y = 1_000.0;
        ship.integrate(false, 0.01, &t);
        assert_eq!(ship.vel.y, t.max_fall_speed);
        ship.vel.y = -1_000.0;
        ship.integrate(true, 0.01, &t);
        assert_eq!(ship.vel.y, t.max_rise_speed);
    }

    #[test]
    fn crossing_floor_is_reported_same_step() {
        let t = ShipTuning::default();
        let mut ship = ShipBody::new(&t);
        ship.pos.y = 97.9;
        ship.vel.y = t.max_fall_speed;
        let r = ship.integrate(false, 0.05, &t);
        assert!(r.out_of_bounds);
        assert!(ship.pos.y <= 100.0);
    }

    #[test]
    fn lane_clamps_to_half_width() {
        let mut lane = Lane::new(50.0, 8.0);
        for _ in 0..10 {
            lane.shift(-15.0);
        }
        assert_eq!(lane.x, 4.0);
        for _ in 0..10 {
            lane.shift(15.0);
        }
        assert_eq!(lane.x, 96.0);
    }
}
