//! Cosmic Arcade entry point
//!
//! On the web this mounts the canyon run on `#game-root` and drives it from
//! `requestAnimationFrame`. Natively it plays a headless session with a
//! simple autopilot and logs the outcome.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{KeyboardEvent, MouseEvent, TouchEvent};

    use cosmic_arcade::audio::AudioManager;
    use cosmic_arcade::persistence::LocalStorageStore;
    use cosmic_arcade::platform::RafScheduler;
    use cosmic_arcade::sim::{RunGame, SessionConfig};
    use cosmic_arcade::tuning::RunTuning;
    use cosmic_arcade::view::DomTarget;
    use cosmic_arcade::{Services, SessionController, SessionPhase, Settings};

    type Slot = Rc<RefCell<Option<SessionController<RunGame>>>>;

    const MOUNT_ID: &str = "game-root";

    fn set_thrust(slot: &Slot, on: bool) {
        if let Some(session) = slot.borrow_mut().as_mut() {
            session.input_mut().thrust = on;
        }
    }

    fn listen<E>(target: &web_sys::EventTarget, name: &str, mut handler: impl FnMut(E) + 'static)
    where
        E: wasm_bindgen::convert::FromWasmAbi + 'static,
    {
        let closure = Closure::<dyn FnMut(E)>::new(move |event: E| handler(event));
        if target
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
            .is_err()
        {
            log::warn!("Could not listen for {}", name);
        }
        closure.forget();
    }

    fn setup_input_handlers(slot: Slot) {
        let Some(window) = web_sys::window() else { return };
        let target: &web_sys::EventTarget = window.as_ref();

        {
            let slot = slot.clone();
            listen(target, "keydown", move |e: KeyboardEvent| match e.code().as_str() {
                "Space" | "ArrowUp" | "KeyW" => {
                    e.prevent_default();
                    set_thrust(&slot, true);
                }
                "KeyR" => {
                    if let Some(session) = slot.borrow_mut().as_mut()
                        && matches!(session.phase(), SessionPhase::Terminal { .. })
                        && let Err(err) = session.restart()
                    {
                        log::warn!("Restart failed: {}", err);
                    }
                }
                _ => {}
            });
        }
        {
            let slot = slot.clone();
            listen(target, "keyup", move |e: KeyboardEvent| {
                if matches!(e.code().as_str(), "Space" | "ArrowUp" | "KeyW") {
                    set_thrust(&slot, false);
                }
            });
        }
        {
            let slot = slot.clone();
            listen(target, "mousedown", move |_: MouseEvent| set_thrust(&slot, true));
        }
        {
            let slot = slot.clone();
            listen(target, "mouseup", move |_: MouseEvent| set_thrust(&slot, false));
        }
        {
            let slot = slot.clone();
            listen(target, "touchstart", move |_: TouchEvent| set_thrust(&slot, true));
        }
        listen(target, "touchend", move |_: TouchEvent| set_thrust(&slot, false));
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Cosmic Arcade starting...");

        let slot: Slot = Rc::new(RefCell::new(None));
        let frame_slot = slot.clone();
        let scheduler = RafScheduler::new(move |ts| {
            if let Some(session) = frame_slot.borrow_mut().as_mut() {
                session.on_frame(ts);
            }
        });

        let store = LocalStorageStore::new();
        let settings = Settings::load(&store);
        let services = Services {
            target: Box::new(DomTarget::by_id(MOUNT_ID)),
            scheduler: Box::new(scheduler),
            store: Box::new(store),
            sound: Box::new(AudioManager::from_settings(&settings)),
        };

        let seed = js_sys::Date::now() as u64;
        let config = SessionConfig::with_seed(seed);
        let mut session = SessionController::new(
            RunGame::new(RunTuning::default(), config.clone()),
            config,
            services,
            |success, score| log::info!("Session complete: success={} score={}", success, score),
        );
        if let Err(err) = session.init() {
            log::error!("Could not start: {}", err);
            return;
        }
        *slot.borrow_mut() = Some(session);

        setup_input_handlers(slot);
        log::info!("Cosmic Arcade running!");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use cosmic_arcade::audio::Silent;
    use cosmic_arcade::persistence::MemoryStore;
    use cosmic_arcade::platform::ManualScheduler;
    use cosmic_arcade::consts::{DEFAULT_DT_CAP, SIM_DT};
    use cosmic_arcade::sim::{CollectorGame, DodgeGame, Minigame, RunGame, SessionConfig, SimClock};
    use cosmic_arcade::tuning::{CollectorTuning, DodgeTuning, RunTuning};
    use cosmic_arcade::view::HeadlessTarget;
    use cosmic_arcade::{GameKind, Services, SessionController};

    /// Simulated frame interval, milliseconds
    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Stop after ten simulated minutes
    const MAX_FRAMES: u32 = 36_000;

    fn services(scheduler: &ManualScheduler) -> Services {
        Services {
            target: Box::new(HeadlessTarget::default()),
            scheduler: Box::new(scheduler.clone()),
            store: Box::new(MemoryStore::new()),
            sound: Box::new(Silent),
        }
    }

    /// Pump frames until the session stops asking for them
    fn play<G: Minigame>(
        game: G,
        config: SessionConfig,
        mut autopilot: impl FnMut(&mut SessionController<G>, u32),
    ) -> Option<cosmic_arcade::FinalReport> {
        let scheduler = ManualScheduler::new();
        let mut session = SessionController::new(game, config.clone(), services(&scheduler), |success, score| {
            log::info!("Completion callback: success={} score={}", success, score)
        })
        .with_clock(SimClock::fixed(SIM_DT, DEFAULT_DT_CAP));
        if let Err(err) = session.init() {
            log::error!("Could not start: {}", err);
            return None;
        }
        let mut now = 0.0;
        let mut frame = 0;
        while scheduler.take() && frame < MAX_FRAMES {
            autopilot(&mut session, frame);
            now += FRAME_MS;
            session.on_frame(now);
            frame += 1;
        }
        session.report().cloned()
    }

    fn fly_canyon(session: &mut SessionController<RunGame>, _frame: u32) {
        let state = session.game().state();
        let ship_x = session.game().tuning().ship.ship_x;
        let width = session.game().tuning().track.segment_width;
        let target = state
            .track
            .segments()
            .iter()
            .find(|s| s.right_edge(width) >= ship_x)
            .map_or(50.0, |s| s.center);
        let thrust = state.ship.pos.y > target - 2.0 && state.ship.vel.y > -10.0;
        session.input_mut().thrust = thrust;
    }

    fn dodge_belt(session: &mut SessionController<DodgeGame>, _frame: u32) {
        let state = session.game().state();
        let x = state.lane.x;
        let threat = state
            .objects
            .iter()
            .filter(|o| o.kind == cosmic_arcade::sim::FallingKind::Asteroid && o.y < 85.0 && o.y > 40.0)
            .find(|o| (o.x - x).abs() < 12.0)
            .map(|o| o.x);
        if let Some(ax) = threat {
            if (ax >= x && x > 20.0) || x > 80.0 {
                session.input_mut().left();
            } else {
                session.input_mut().right();
            }
        }
    }

    fn collect(session: &mut SessionController<CollectorGame>, frame: u32) {
        // Roughly one pick every half second
        if frame % 30 != 0 {
            return;
        }
        let best = session
            .game()
            .state()
            .resources
            .iter()
            .max_by_key(|r| r.kind.value)
            .map(|r| r.id);
        if let Some(id) = best {
            session.input_mut().pick(id);
        }
    }

    pub fn run(kind: GameKind, seed: u64) {
        log::info!("Headless {} with seed {}", kind.title(), seed);
        let config = SessionConfig::with_seed(seed);
        let report = match kind {
            GameKind::MarsRun => play(RunGame::new(RunTuning::default(), config.clone()), config, fly_canyon),
            GameKind::AsteroidNavigator => {
                let config = SessionConfig {
                    time_limit: Some(60.0),
                    ..config
                };
                play(DodgeGame::new(DodgeTuning::default(), config.clone()), config, dodge_belt)
            }
            GameKind::ResourceCollector => {
                play(CollectorGame::new(CollectorTuning::default(), config.clone()), config, collect)
            }
        };
        match report {
            Some(report) => {
                log::info!("{}", report.summary());
                println!("{}", report.summary());
            }
            None => log::warn!("Session did not finish"),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use cosmic_arcade::GameKind;

    env_logger::init();
    log::info!("Cosmic Arcade (native) starting...");

    let mut args = std::env::args().skip(1);
    let kind = match args.next().as_deref() {
        None | Some("marsRun") => GameKind::MarsRun,
        Some("asteroidNavigator") => GameKind::AsteroidNavigator,
        Some("resourceCollector") => GameKind::ResourceCollector,
        Some(other) => {
            eprintln!("Unknown game `{}`; expected marsRun, asteroidNavigator or resourceCollector", other);
            std::process::exit(2);
        }
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(2024);
    headless::run(kind, seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
