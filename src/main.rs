//! Lane Rush entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, HtmlInputElement, KeyboardEvent};

    use lane_rush::audio::{AudioSink, WebAudioEngine};
    use lane_rush::driver::{Hud, RunConfig, Session};
    use lane_rush::error::SetupError;
    use lane_rush::input::Control;
    use lane_rush::renderer::RenderState;
    use lane_rush::sim::{GameEvent, RunPhase};
    use lane_rush::{HighScores, Settings, Tuning, Viewport};

    type Listener = Closure<dyn FnMut(web_sys::Event)>;

    thread_local! {
        /// GPU state outlives individual runs
        static RENDERER: RefCell<Option<RenderState>> = const { RefCell::new(None) };
        /// The run currently on screen
        static ACTIVE: RefCell<Option<Rc<RefCell<Game>>>> = const { RefCell::new(None) };
    }

    /// A DOM listener detached on teardown
    struct Attached {
        target: web_sys::EventTarget,
        kind: &'static str,
        closure: Listener,
    }

    /// One-second countdown interval
    struct Timer {
        handle: i32,
        closure: Closure<dyn FnMut()>,
    }

    /// One run plus every platform resource it holds
    struct Game {
        session: Session,
        canvas: HtmlCanvasElement,
        viewport: Viewport,
        raf_handle: Option<i32>,
        frame_cb: Option<Closure<dyn FnMut(f64)>>,
        countdown: Option<Timer>,
        resize: Option<(web_sys::ResizeObserver, Closure<dyn FnMut()>)>,
        listeners: Vec<Attached>,
        alive: bool,
    }

    impl Game {
        fn new(session: Session, canvas: HtmlCanvasElement) -> Self {
            let viewport = measure(&canvas);
            Self {
                session,
                canvas,
                viewport,
                raf_handle: None,
                frame_cb: None,
                countdown: None,
                resize: None,
                listeners: Vec::new(),
                alive: true,
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let hud: Hud = self.session.hud();

            set_text(&document, "hud-speed", &hud.speed.to_string());
            set_text(&document, "hud-nitro", &hud.nitro.to_string());
            set_text(&document, "hud-mode", hud.mode.as_str());
            set_text(&document, "hud-score", &hud.score.to_string());
            set_text(&document, "hud-best", &hud.best.to_string());
            set_text(&document, "hud-camera", hud.camera);
            match hud.time_remaining {
                Some(t) => {
                    set_text(&document, "hud-time", &format!("{}s", t));
                    set_hidden(&document, "hud-time-item", false);
                }
                None => set_hidden(&document, "hud-time-item", true),
            }

            set_hidden(&document, "pause-menu", hud.phase != RunPhase::Paused);
            set_hidden(&document, "game-over", hud.phase != RunPhase::Ended);
            if hud.phase == RunPhase::Ended {
                set_text(&document, "final-score", &hud.score.to_string());
            }
        }
    }

    fn set_text(document: &web_sys::Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_hidden(document: &web_sys::Document, id: &str, hidden: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", hidden);
        }
    }

    /// CSS size of the canvas
    fn measure(canvas: &HtmlCanvasElement) -> Viewport {
        Viewport::new(canvas.client_width() as f32, canvas.client_height() as f32)
    }

    /// Free a closure after the current JS task; it may be the one running
    fn defer_drop<T: 'static>(value: T) {
        wasm_bindgen_futures::spawn_local(async move {
            drop(value);
        });
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Lane Rush starting...");

        if let Err(e) = init().await {
            log::error!("Startup failed: {}", e);
            return;
        }

        // Resume the last selection; the menu can call start_run again
        let settings = Settings::load();
        if let Err(e) = launch(settings) {
            log::error!("Could not start run: {}", e);
        }
    }

    async fn init() -> Result<(), SetupError> {
        let window = web_sys::window().ok_or(SetupError::NoWindow)?;
        let document = window.document().ok_or(SetupError::NoDocument)?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.class_list().add_1("hidden");
        }

        let canvas = find_canvas()?;
        let (width, height) = fit_canvas(&canvas);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = RenderState::new(surface, &adapter, width, height).await?;
        RENDERER.with(|r| *r.borrow_mut() = Some(render_state));
        Ok(())
    }

    fn find_canvas() -> Result<HtmlCanvasElement, SetupError> {
        let document = web_sys::window()
            .ok_or(SetupError::NoWindow)?
            .document()
            .ok_or(SetupError::NoDocument)?;
        document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
            .ok_or_else(|| SetupError::NoCanvas("canvas".to_string()))
    }

    /// Match the backing store to the CSS size; returns device pixels
    fn fit_canvas(canvas: &HtmlCanvasElement) -> (u32, u32) {
        let dpr = web_sys::window()
            .map(|w| w.device_pixel_ratio())
            .unwrap_or(1.0);
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        if width > 0 && height > 0 {
            canvas.set_width(width);
            canvas.set_height(height);
        }
        (width, height)
    }

    /// Start a run from menu selections, replacing any current one
    #[wasm_bindgen]
    pub fn start_run(mode: &str, car: &str, environment: &str) {
        let mut settings = Settings::load();
        settings.select(mode, car, environment);
        settings.save();
        if let Err(e) = launch(settings) {
            log::error!("Could not start run: {}", e);
        }
    }

    /// Leave the run and release everything it holds
    #[wasm_bindgen]
    pub fn exit_run() {
        if let Some(game) = ACTIVE.with(|a| a.borrow_mut().take()) {
            teardown(&game);
        }
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            set_hidden(&document, "hud", true);
            set_hidden(&document, "game-over", true);
            set_hidden(&document, "pause-menu", true);
            set_hidden(&document, "menu", false);
        }
        log::info!("Exited to menu");
    }

    fn launch(settings: Settings) -> Result<(), SetupError> {
        exit_run();

        let canvas = find_canvas()?;
        let seed = js_sys::Date::now() as u64;
        // Menu click is the user gesture that unlocks audio
        let mut audio = WebAudioEngine::new();
        audio.resume();
        let session = Session::new(
            RunConfig::from_settings(&settings, seed),
            Tuning::default(),
            Box::new(audio),
            Box::new(HighScores::load()),
        );

        let game = Rc::new(RefCell::new(Game::new(session, canvas)));
        attach_input(&game);
        attach_buttons(&game);
        attach_auto_pause(&game);
        observe_resize(&game);
        start_loop(&game);
        ACTIVE.with(|a| *a.borrow_mut() = Some(game));

        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            set_hidden(&document, "menu", true);
            set_hidden(&document, "hud", false);
        }
        Ok(())
    }

    /// Cancel the frame callback and countdown, detach the observer and
    /// listeners, and release audio. Every exit path goes through here.
    fn teardown(game: &Rc<RefCell<Game>>) {
        let mut guard = game.borrow_mut();
        let g = &mut *guard;
        if !g.alive {
            return;
        }
        g.alive = false;

        let window = web_sys::window();
        if let (Some(window), Some(handle)) = (&window, g.raf_handle.take()) {
            let _ = window.cancel_animation_frame(handle);
        }
        if let Some(cb) = g.frame_cb.take() {
            defer_drop(cb);
        }
        if let Some(timer) = g.countdown.take() {
            if let Some(window) = &window {
                window.clear_interval_with_handle(timer.handle);
            }
            defer_drop(timer.closure);
        }
        if let Some((observer, cb)) = g.resize.take() {
            observer.disconnect();
            defer_drop(cb);
        }
        for l in g.listeners.drain(..) {
            let _ = l
                .target
                .remove_event_listener_with_callback(l.kind, l.closure.as_ref().unchecked_ref());
            defer_drop(l.closure);
        }
        g.session.shutdown();
    }

    fn listen(
        game: &Rc<RefCell<Game>>,
        target: &web_sys::EventTarget,
        kind: &'static str,
        handler: impl FnMut(&Rc<RefCell<Game>>, web_sys::Event) + 'static,
    ) {
        let weak: Weak<RefCell<Game>> = Rc::downgrade(game);
        let mut handler = handler;
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
            if let Some(game) = weak.upgrade() {
                handler(&game, event);
            }
        });
        let _ = target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
        game.borrow_mut().listeners.push(Attached {
            target: target.clone(),
            kind,
            closure,
        });
    }

    fn attach_input(game: &Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        listen(game, &window, "keydown", |game, event| {
            let Some(key) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let code = key.code();
            if matches!(code.as_str(), "Space" | "ArrowLeft" | "ArrowRight") {
                event.prevent_default();
            }
            let mut g = game.borrow_mut();
            g.session.resume_audio();
            g.session.input_mut().key_down(&code, key.repeat());
        });

        listen(game, &window, "keyup", |game, event| {
            if let Some(key) = event.dyn_ref::<KeyboardEvent>() {
                game.borrow_mut().session.input_mut().key_up(&key.code());
            }
        });

        // Held keys would stick while focus is elsewhere
        listen(game, &window, "blur", |game, _event| {
            game.borrow_mut().session.input_mut().release_all();
        });
    }

    fn attach_buttons(game: &Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        // Touch/mouse hold on the on-screen controls
        for control in Control::ALL {
            let Some(btn) = document.get_element_by_id(control.button_id()) else {
                continue;
            };
            for kind in ["touchstart", "mousedown"] {
                listen(game, &btn, kind, move |game, event| {
                    event.prevent_default();
                    let mut g = game.borrow_mut();
                    g.session.resume_audio();
                    g.session.input_mut().press(control);
                });
            }
            for kind in ["touchend", "touchcancel", "mouseup", "mouseleave"] {
                listen(game, &btn, kind, move |game, event| {
                    event.prevent_default();
                    game.borrow_mut().session.input_mut().release(control);
                });
            }
        }

        if let Some(btn) = document.get_element_by_id("btn-pause") {
            listen(game, &btn, "click", |game, _event| {
                game.borrow_mut().session.toggle_pause();
            });
        }
        if let Some(btn) = document.get_element_by_id("btn-camera") {
            listen(game, &btn, "click", |game, _event| {
                game.borrow_mut().session.input_mut().request_camera_toggle();
            });
        }
        if let Some(btn) = document.get_element_by_id("btn-restart") {
            listen(game, &btn, "click", |game, _event| {
                let seed = js_sys::Date::now() as u64;
                game.borrow_mut().session.restart(seed);
                sync_countdown(game);
            });
        }
        if let Some(btn) = document.get_element_by_id("btn-menu") {
            listen(game, &btn, "click", |_game, _event| {
                exit_run();
            });
        }
        if let Some(slider) = document.get_element_by_id("speed-slider") {
            listen(game, &slider, "input", |game, event| {
                let value = event
                    .target()
                    .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                    .and_then(|input| input.value().parse::<f32>().ok());
                if let Some(kmh) = value {
                    game.borrow_mut().session.input_mut().set_speed_slider(kmh);
                }
            });
        }
    }

    fn attach_auto_pause(game: &Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        let doc = document.clone();
        listen(game, &document, "visibilitychange", move |game, _event| {
            if doc.visibility_state() != web_sys::VisibilityState::Hidden {
                return;
            }
            // No frames arrive while hidden; pause now and stop the countdown
            let paused = game.borrow_mut().session.pause().is_some();
            if paused {
                log::info!("Auto-paused (tab hidden)");
                sync_countdown(game);
            }
        });
    }

    fn observe_resize(game: &Rc<RefCell<Game>>) {
        let weak = Rc::downgrade(game);
        let closure = Closure::<dyn FnMut()>::new(move || {
            let Some(game) = weak.upgrade() else {
                return;
            };
            let mut g = game.borrow_mut();
            let (width, height) = fit_canvas(&g.canvas);
            let viewport = measure(&g.canvas);
            g.viewport = viewport;
            RENDERER.with(|r| {
                if let Some(rs) = r.borrow_mut().as_mut() {
                    rs.resize(width, height);
                }
            });
        });

        match web_sys::ResizeObserver::new(closure.as_ref().unchecked_ref()) {
            Ok(observer) => {
                let mut g = game.borrow_mut();
                observer.observe(&g.canvas);
                g.resize = Some((observer, closure));
            }
            Err(e) => log::warn!("ResizeObserver unavailable: {:?}", e),
        }
    }

    fn start_loop(game: &Rc<RefCell<Game>>) {
        let weak = Rc::downgrade(game);
        let closure = Closure::<dyn FnMut(f64)>::new(move |now: f64| {
            if let Some(game) = weak.upgrade() {
                game_loop(&game, now);
            }
        });
        game.borrow_mut().frame_cb = Some(closure);
        request_animation_frame(game);
    }

    fn request_animation_frame(game: &Rc<RefCell<Game>>) {
        let mut guard = game.borrow_mut();
        let g = &mut *guard;
        if !g.alive {
            return;
        }
        let (Some(window), Some(cb)) = (web_sys::window(), &g.frame_cb) else {
            return;
        };
        g.raf_handle = window
            .request_animation_frame(cb.as_ref().unchecked_ref())
            .ok();
    }

    fn game_loop(game: &Rc<RefCell<Game>>, now: f64) {
        {
            let mut g = game.borrow_mut();
            if !g.alive {
                return;
            }
            g.raf_handle = None;
            let viewport = g.viewport;
            let frame = g.session.frame(now, viewport);

            if let Some(scene) = &frame.scene {
                render(scene, viewport);
            }
            for event in &frame.events {
                if let GameEvent::RunEnded { score, .. } = event {
                    log::info!("Game over - final score {}", score);
                }
            }
            g.update_hud();
        }

        sync_countdown(game);
        request_animation_frame(game);
    }

    fn render(scene: &[lane_rush::renderer::Vertex], viewport: Viewport) {
        RENDERER.with(|r| {
            let mut r = r.borrow_mut();
            let Some(render_state) = r.as_mut() else {
                return;
            };
            match render_state.render(scene, viewport) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    render_state.reconfigure();
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        });
    }

    /// Arm or cancel the one-second interval to match the session
    fn sync_countdown(game: &Rc<RefCell<Game>>) {
        let mut guard = game.borrow_mut();
        let g = &mut *guard;
        let armed = g.alive && g.session.countdown_armed();
        let Some(window) = web_sys::window() else {
            return;
        };

        match (armed, g.countdown.is_some()) {
            (true, false) => {
                let weak = Rc::downgrade(game);
                let closure = Closure::<dyn FnMut()>::new(move || {
                    let Some(game) = weak.upgrade() else {
                        return;
                    };
                    {
                        let mut g = game.borrow_mut();
                        if g.session.countdown_tick().is_some() {
                            g.update_hud();
                        }
                    }
                    sync_countdown(&game);
                });
                match window.set_interval_with_callback_and_timeout_and_arguments_0(
                    closure.as_ref().unchecked_ref(),
                    1000,
                ) {
                    Ok(handle) => g.countdown = Some(Timer { handle, closure }),
                    Err(e) => log::warn!("Countdown timer failed: {:?}", e),
                }
            }
            (false, true) => {
                if let Some(timer) = g.countdown.take() {
                    window.clear_interval_with_handle(timer.handle);
                    defer_drop(timer.closure);
                }
            }
            _ => {}
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

/// Headless autopilot run
#[cfg(not(target_arch = "wasm32"))]
#[derive(clap::Parser)]
#[command(name = "lane-rush")]
#[command(author, version, about = "Lane Rush - headless autopilot run")]
struct Args {
    /// Play the 60 second Timed mode instead of Endless
    #[arg(long)]
    timed: bool,

    /// JSON file overriding balance values (missing fields keep defaults)
    #[arg(long)]
    tuning: Option<std::path::PathBuf>,
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use clap::Parser;

    env_logger::init();
    let args = Args::parse();
    log::info!("Lane Rush (native) starting...");
    log::info!("Native mode runs a headless autopilot - use `trunk serve` for the web version");

    let mode = if args.timed {
        lane_rush::sim::GameMode::Timed
    } else {
        lane_rush::sim::GameMode::Endless
    };
    let tuning = match &args.tuning {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read tuning file {}", path.display()))?;
            lane_rush::Tuning::from_json(&json)
                .with_context(|| format!("Invalid tuning file {}", path.display()))?
        }
        None => lane_rush::Tuning::default(),
    };

    let score = autopilot::run(mode, tuning);
    println!("Final score: {}", score);
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Drives a session without a window, steering around traffic
#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use lane_rush::audio::ToneModel;
    use lane_rush::driver::{RunConfig, Session};
    use lane_rush::highscores::MemoryHighScores;
    use lane_rush::sim::{GameMode, RunPhase, SimContext};
    use lane_rush::{Tuning, Viewport};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Two minutes of simulated play
    const MAX_FRAMES: u32 = 60 * 120;
    /// How far ahead of the car traffic counts as a threat
    const LOOKAHEAD: f32 = 360.0;

    pub fn run(mode: GameMode, tuning: Tuning) -> u64 {
        let viewport = Viewport::new(800.0, 600.0);
        let config = RunConfig {
            mode,
            seed: 0x1a4e,
            ..Default::default()
        };
        let mut session = Session::new(
            config,
            tuning,
            Box::new(ToneModel::new()),
            Box::new(MemoryHighScores::default()),
        );

        let mut frames = 0;
        while frames < MAX_FRAMES && session.phase() != RunPhase::Ended {
            steer(&mut session);
            session.frame(frames as f64 * FRAME_MS, viewport);
            frames += 1;
            if frames % 60 == 0 && session.countdown_armed() {
                session.countdown_tick();
            }
            if frames % 600 == 0 {
                let hud = session.hud();
                log::info!("t={}s speed={} score={}", frames / 60, hud.speed, hud.score);
            }
        }

        let hud = session.hud();
        log::info!(
            "Run finished after {:.1}s: score {}",
            frames as f64 / 60.0,
            hud.score
        );
        session.shutdown();
        hud.score
    }

    /// Lane nobody is about to hit, preferring the current one
    fn pick_lane(ctx: &SimContext) -> f32 {
        let player = &ctx.world.player;
        let current = player.lane.round();
        let blocked = |lane: f32| {
            ctx.world.obstacles.iter().any(|o| {
                o.lane as f32 == lane
                    && o.pos.y < player.pos.y + player.height
                    && player.pos.y - o.pos.y < LOOKAHEAD
            })
        };
        if !blocked(current) {
            return current;
        }
        [current - 1.0, current + 1.0]
            .into_iter()
            .filter(|&l| l >= 0.0 && l <= ctx.world.max_lane())
            .find(|&l| !blocked(l))
            .unwrap_or(current)
    }

    fn steer(session: &mut Session) {
        let target = pick_lane(session.context());
        let lane = session.context().world.player.lane;
        let input = session.input_mut();
        input.key_down("KeyW", false);
        input.key_up("ArrowLeft");
        input.key_up("ArrowRight");
        if lane < target - 0.05 {
            input.key_down("ArrowRight", false);
        } else if lane > target + 0.05 {
            input.key_down("ArrowLeft", false);
        }
    }
}
