//! Balloon Pop entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        Document, HtmlCanvasElement, HtmlInputElement, HtmlSelectElement, HtmlVideoElement,
        MouseEvent, TouchEvent,
    };

    use balloon_pop::audio::AudioManager;
    use balloon_pop::consts::HISTORY_DISPLAY;
    use balloon_pop::history::format_date;
    use balloon_pop::platform::camera::{Camera, request_stream};
    use balloon_pop::platform::now_ms;
    use balloon_pop::renderer::{CanvasPainter, build_scene};
    use balloon_pop::settings::FacingMode;
    use serde_json::{Map, Value, json};
    use balloon_pop::sim::{Game, GameEvent, GamePhase, TickInput, tick};
    use balloon_pop::{CanvasSize, GameRecord, Settings, SpeedTier};

    /// Everything the browser callbacks share
    struct App {
        game: Game,
        camera: Camera,
        painter: CanvasPainter,
        audio: AudioManager,
        /// Clicks/touches since the last frame, in canvas pixels
        taps: Vec<Vec2>,
    }

    impl App {
        fn frame(&mut self) {
            let now = now_ms();
            let camera_ready = self.camera.ready();

            let frame = if camera_ready && self.game.wants_motion_sample(now) {
                self.camera.capture()
            } else {
                None
            };
            let input = TickInput {
                taps: std::mem::take(&mut self.taps),
                frame,
            };
            let events = tick(&mut self.game, input, now);
            for event in &events {
                self.handle_event(event);
            }

            let cmds = build_scene(&self.game, now, camera_ready, &self.painter);
            if let Err(err) = self.painter.paint(&cmds, self.camera.video()) {
                log::warn!("Render error: {:?}", err);
            }

            if !events.is_empty() {
                self.update_hud();
            }
        }

        fn handle_event(&self, event: &GameEvent) {
            if let Some(cue) = event.sound_cue() {
                self.audio.play(cue);
            }
            let Some(document) = current_document() else { return };
            match event {
                GameEvent::AchievementUnlocked(achievement) => {
                    if let Some(el) = document.get_element_by_id(achievement.element_id()) {
                        let _ = el.class_list().add_1("unlocked");
                    }
                }
                GameEvent::SessionEnded(record) => {
                    let history = self.game.history();
                    show_game_over(&document, record, history.best_score().unwrap_or(0));
                    self.update_history(&document);
                    log::debug!("History: {}", history.to_json());
                }
                GameEvent::SessionStarted => set_visible(&document, "game-over-overlay", false),
                _ => {}
            }
        }

        /// Refresh the DOM scoreboard and button labels
        fn update_hud(&self) {
            let Some(document) = current_document() else { return };
            let board = self.game.board();

            set_text(&document, "score", &board.score.to_string());
            set_text(&document, "hits", &board.hits.to_string());
            set_text(&document, "time", &board.time_remaining.to_string());
            set_text(&document, "accuracy", &format!("{}%", board.accuracy_percent()));

            let (start_label, pause_label) = match self.game.phase() {
                GamePhase::Active => ("End Game", "Pause"),
                GamePhase::Paused => ("End Game", "Resume"),
                GamePhase::Idle | GamePhase::Ended => ("Start Game", "Pause"),
            };
            set_text(&document, "start-btn", start_label);
            set_text(&document, "pause-btn", pause_label);
        }

        fn update_history(&self, document: &Document) {
            let Some(el) = document.get_element_by_id("game-history") else {
                return;
            };
            let history = self.game.history();
            if history.is_empty() {
                el.set_inner_html("<p>No games yet</p>");
                return;
            }

            let html: String = history
                .recent(HISTORY_DISPLAY)
                .map(|(number, record)| {
                    format!(
                        "<div class=\"history-item\"><strong>Game {}</strong><br>\
                         Score: {} | Hits: {} | Accuracy: {}%<br><small>{}</small></div>",
                        number,
                        record.score,
                        record.hits,
                        record.accuracy,
                        format_date(record.timestamp)
                    )
                })
                .collect();
            el.set_inner_html(&html);
        }

        /// Start or end, warning when the camera is missing
        fn toggle_session(&mut self) {
            self.audio.resume();
            let now = now_ms();
            if let Err(err) = self.game.toggle(self.camera.granted(), now) {
                log::warn!("Cannot start: {}", err);
                if let Some(document) = current_document() {
                    set_text(&document, "overlay-text", "Camera access is required to play");
                }
            }
            self.flush_events();
        }

        /// Handle events raised outside the frame loop (button presses)
        fn flush_events(&mut self) {
            for event in self.game.take_events() {
                self.handle_event(&event);
            }
            self.update_hud();
        }
    }

    fn current_document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let style = if visible { "display: flex" } else { "display: none" };
            let _ = el.set_attribute("style", style);
        }
    }

    fn show_game_over(document: &Document, record: &GameRecord, best: u64) {
        set_text(document, "final-score-overlay", &record.score.to_string());
        set_text(document, "best-score-overlay", &best.to_string());
        set_text(document, "final-hits-overlay", &record.hits.to_string());
        set_text(document, "final-accuracy-overlay", &format!("{}%", record.accuracy));
        set_visible(document, "game-over-overlay", true);
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if let Err(err) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Logger init failed: {err}").into());
        }

        log::info!("Balloon Pop starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("game-canvas")
            .ok_or("no #game-canvas")?
            .dyn_into()?;
        let video: HtmlVideoElement = document
            .get_element_by_id("camera-video")
            .ok_or("no #camera-video")?
            .dyn_into()?;

        let size = fit_canvas(&canvas);
        let seed = js_sys::Date::now() as u64;
        let settings = read_settings(&document);
        log::info!("Settings: {}", settings.to_json());
        let facing = settings.facing_mode;

        let app = Rc::new(RefCell::new(App {
            game: Game::new(settings, size, seed),
            camera: Camera::new(&document, video)?,
            painter: CanvasPainter::new(canvas.clone())?,
            audio: AudioManager::new(),
            taps: Vec::new(),
        }));
        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(&canvas, app.clone());
        setup_buttons(&document, app.clone());
        setup_settings_controls(&document, app.clone());
        setup_auto_pause(app.clone());
        setup_resize(app.clone());

        app.borrow().update_hud();
        app.borrow().update_history(&document);

        open_camera(app.clone(), facing);
        request_animation_frame(app);

        log::info!("Balloon Pop running!");
        Ok(())
    }

    /// Match the drawing buffer to the element's layout size
    fn fit_canvas(canvas: &HtmlCanvasElement) -> CanvasSize {
        let (w, h) = (canvas.client_width().max(1), canvas.client_height().max(1));
        canvas.set_width(w as u32);
        canvas.set_height(h as u32);
        CanvasSize::new(w as f32, h as f32)
    }

    /// Initial slider/select values from the page, validated like any
    /// other settings JSON
    fn read_settings(document: &Document) -> Settings {
        let input_value = |id: &str| -> Option<u32> {
            document
                .get_element_by_id(id)?
                .dyn_into::<HtmlInputElement>()
                .ok()?
                .value()
                .parse()
                .ok()
        };

        let mut fields = Map::new();
        if let Some(secs) = input_value("game-time") {
            fields.insert("session_duration_secs".into(), json!(secs));
        }
        if let Some(tier) = input_value("balloon-speed") {
            let tier = SpeedTier::new(tier.min(u8::MAX as u32) as u8);
            fields.insert("balloon_speed".into(), json!(tier.get()));
        }
        if let Some(count) = input_value("balloon-count") {
            fields.insert("max_balloons".into(), json!(count));
        }
        if let Some(facing) = document
            .get_element_by_id("camera-mode")
            .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
            .and_then(|select| select.value().parse::<FacingMode>().ok())
        {
            fields.insert("facing_mode".into(), json!(facing.as_str()));
        }

        Settings::from_json(&Value::Object(fields).to_string()).unwrap_or_else(|err| {
            log::warn!("Ignoring page settings: {}", err);
            Settings::default()
        })
    }

    /// Request the camera without holding the app borrow across the await
    fn open_camera(app: Rc<RefCell<App>>, facing: FacingMode) {
        wasm_bindgen_futures::spawn_local(async move {
            match request_stream(facing).await {
                Ok(stream) => {
                    app.borrow_mut().camera.attach(&stream);
                    if let Some(document) = current_document() {
                        set_visible(&document, "camera-overlay", false);
                    }
                }
                Err(err) => {
                    if app.borrow_mut().camera.request_failed() {
                        log::error!("Camera switch failed, keeping current stream: {:?}", err);
                        return;
                    }
                    log::error!("Camera access failed: {:?}", err);
                    if let Some(document) = current_document() {
                        set_text(
                            &document,
                            "overlay-text",
                            "Camera access failed, check permissions",
                        );
                        set_text(
                            &document,
                            "overlay-hint",
                            "You can still click balloons to pop them",
                        );
                    }
                }
            }
        });
    }

    /// Client coordinates to canvas pixels
    fn canvas_point(canvas: &HtmlCanvasElement, client_x: i32, client_y: i32) -> Vec2 {
        let rect = canvas.get_bounding_client_rect();
        let sx = if rect.width() > 0.0 { canvas.width() as f64 / rect.width() } else { 1.0 };
        let sy = if rect.height() > 0.0 { canvas.height() as f64 / rect.height() } else { 1.0 };
        Vec2::new(
            ((client_x as f64 - rect.left()) * sx) as f32,
            ((client_y as f64 - rect.top()) * sy) as f32,
        )
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        // Mouse click
        {
            let app = app.clone();
            let target = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let point = canvas_point(&target, event.client_x(), event.client_y());
                app.borrow_mut().taps.push(point);
            });
            let _ = canvas
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch: every new finger is a tap
        {
            let target = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let touches = event.changed_touches();
                let mut app = app.borrow_mut();
                for i in 0..touches.length() {
                    if let Some(touch) = touches.get(i) {
                        app.taps.push(canvas_point(&target, touch.client_x(), touch.client_y()));
                    }
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn on_click(document: &Document, id: &str, handler: impl FnMut(MouseEvent) + 'static) {
        let Some(el) = document.get_element_by_id(id) else {
            log::warn!("Missing button #{}", id);
            return;
        };
        let closure = Closure::<dyn FnMut(MouseEvent)>::new(handler);
        let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(document: &Document, app: Rc<RefCell<App>>) {
        {
            let app = app.clone();
            on_click(document, "start-btn", move |_| app.borrow_mut().toggle_session());
        }
        {
            let app = app.clone();
            on_click(document, "pause-btn", move |_| {
                let mut app = app.borrow_mut();
                app.game.toggle_pause(now_ms());
                app.flush_events();
            });
        }
        {
            let app = app.clone();
            on_click(document, "reset-btn", move |_| {
                let mut app = app.borrow_mut();
                app.game.reset();
                app.flush_events();
            });
        }
        {
            let app = app.clone();
            on_click(document, "play-again-btn-overlay", move |_| {
                let mut app = app.borrow_mut();
                if let Some(document) = current_document() {
                    set_visible(&document, "game-over-overlay", false);
                }
                app.toggle_session();
            });
        }
        {
            let app = app.clone();
            on_click(document, "mute-btn", move |_| {
                let muted = app.borrow_mut().audio.volume.toggle_mute();
                if let Some(document) = current_document() {
                    set_text(&document, "mute-btn", if muted { "Unmute" } else { "Mute" });
                }
            });
        }
        on_click(document, "close-game-over-btn-overlay", move |_| {
            if let Some(document) = current_document() {
                set_visible(&document, "game-over-overlay", false);
            }
        });
    }

    /// Sliders and the camera selector write straight into the live settings
    fn setup_settings_controls(document: &Document, app: Rc<RefCell<App>>) {
        let slider = |id: &'static str, apply: fn(&mut App, u32) -> String| {
            let Some(input) = document
                .get_element_by_id(id)
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            else {
                return;
            };
            let app = app.clone();
            let source = input.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let Ok(value) = source.value().parse::<u32>() else {
                    return;
                };
                let label = apply(&mut app.borrow_mut(), value);
                if let Some(document) = current_document() {
                    set_text(&document, &format!("{id}-value"), &label);
                }
                app.borrow().update_hud();
            });
            let _ = input
                .add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
            closure.forget();
        };

        slider("game-time", |app, secs| {
            app.game.set_session_duration(secs);
            format!("{}s", app.game.settings.session_duration_secs)
        });
        slider("balloon-speed", |app, tier| {
            app.game.settings.set_balloon_speed(tier.min(u8::MAX as u32) as u8);
            app.game.settings.balloon_speed.label().to_string()
        });
        slider("balloon-count", |app, count| {
            app.game.settings.set_max_balloons(count as usize);
            app.game.settings.max_balloons.to_string()
        });
        slider("volume", |app, percent| {
            app.audio.volume.set_percent(percent);
            format!("{}%", (app.audio.volume.level() * 100.0).round())
        });

        if let Some(select) = document
            .get_element_by_id("camera-mode")
            .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
        {
            let source = select.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let facing = match source.value().parse::<FacingMode>() {
                    Ok(facing) => facing,
                    Err(err) => {
                        log::warn!("{}", err);
                        return;
                    }
                };
                app.borrow_mut().game.settings.facing_mode = facing;
                open_camera(app.clone(), facing);
            });
            let _ = select
                .add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Pause when the tab is hidden
    fn setup_auto_pause(app: Rc<RefCell<App>>) {
        let Some(document) = current_document() else { return };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let hidden = current_document()
                .map(|d| d.visibility_state() == web_sys::VisibilityState::Hidden)
                .unwrap_or(false);
            if hidden {
                let mut app = app.borrow_mut();
                if app.game.pause(now_ms()) {
                    log::info!("Auto-paused: tab hidden");
                    app.flush_events();
                }
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut app = app.borrow_mut();
            let size = fit_canvas(app.painter.canvas());
            app.game.set_canvas(size);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |_time: f64| {
            game_loop(app);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>) {
        app.borrow_mut().frame();
        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(err) = wasm_game::run().await {
        log::error!("Startup failed: {:?}", err);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Balloon Pop (native) starting...");
    log::info!("The camera needs a browser - run with `trunk serve` for the web version");

    println!("\nRunning headless demo session...");
    headless_demo();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Play one short session with a synthetic camera: a bright patch flashes
/// over the oldest live balloon every other sample.
#[cfg(not(target_arch = "wasm32"))]
fn headless_demo() {
    use balloon_pop::sim::{Game, GameEvent, MotionFrame, TickInput, tick};
    use balloon_pop::{CanvasSize, Settings};

    const CAMERA_W: u32 = 320;
    const CAMERA_H: u32 = 240;
    const FRAME_MS: f64 = 1000.0 / 60.0;

    let mut settings = Settings::default();
    settings.set_session_duration(20);
    let canvas = CanvasSize::new(1280.0, 720.0);
    let mut game = Game::new(settings, canvas, 0xBA11_0025);

    if let Err(err) = game.start(true, 0.0) {
        log::error!("Demo could not start: {}", err);
        return;
    }

    let mut now = 0.0;
    let mut lit = false;
    let mut popped = 0;
    while game.is_active() {
        now += FRAME_MS;

        let frame = if game.wants_motion_sample(now) {
            lit = !lit;
            let target = game
                .balloons()
                .iter()
                .find(|b| b.is_live())
                .map(|b| (b.pos, b.radius));
            let mut pixels = vec![0u8; (CAMERA_W * CAMERA_H * 4) as usize];
            if let (true, Some((pos, radius))) = (lit, target) {
                // The detector mirrors the camera, so paint at the mirrored x
                let cx = (canvas.width - pos.x) / canvas.width * CAMERA_W as f32;
                let cy = pos.y / canvas.height * CAMERA_H as f32;
                let r = radius / canvas.width * CAMERA_W as f32;
                for y in 0..CAMERA_H {
                    for x in 0..CAMERA_W {
                        if (x as f32 - cx).hypot(y as f32 - cy) <= r {
                            let i = ((y * CAMERA_W + x) * 4) as usize;
                            pixels[i..i + 4].copy_from_slice(&[255, 255, 255, 255]);
                        }
                    }
                }
            }
            match MotionFrame::downsample(&pixels, CAMERA_W, CAMERA_H, 80, 60, true) {
                Ok(frame) => Some(frame),
                Err(err) => {
                    log::warn!("Bad synthetic frame: {}", err);
                    None
                }
            }
        } else {
            None
        };

        for event in tick(&mut game, TickInput { taps: Vec::new(), frame }, now) {
            match event {
                GameEvent::BalloonPopped { id, points, combo } => {
                    popped += 1;
                    log::debug!("Balloon {} popped: +{} (combo {})", id, points, combo);
                }
                GameEvent::AchievementUnlocked(a) => println!("  achievement: {:?}", a),
                GameEvent::SessionEnded(record) => {
                    println!(
                        "  session over at {:.1}s: score {}, hits {}, misses {}, \
                         accuracy {}%, best combo {}",
                        now / 1000.0,
                        record.score,
                        record.hits,
                        record.misses,
                        record.accuracy,
                        record.max_combo
                    );
                }
                _ => {}
            }
        }
    }

    println!("✓ Demo finished: {} balloons popped by motion", popped);
}
