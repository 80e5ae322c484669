//! Kendama entry point
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
    use web_sys::{HtmlCanvasElement, MouseEvent, TouchEvent};

    use kendama::Tuning;
    use kendama::settings::{Settings, Toggle};
    use kendama::consts::*;
    use kendama::platform::web::{MotionListener, WebHaptics, request_permission};
    use kendama::platform::dispatch_haptics;
    use kendama::renderer::{RenderState, build_frame};
    use kendama::sim::{
        GameEvent, GameMode, GamePhase, GameState, PointerEvent, TickInput, Viewport, tick,
    };

    /// Game instance holding all state
    struct Game {
        state: GameState,
        render_state: Option<RenderState>,
        settings: Settings,
        haptics: WebHaptics,
        /// Present once sensing was granted; at most one per game
        motion_listener: Option<MotionListener>,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        /// Start overlay hidden (play pressed, whatever the permission outcome)
        overlay_dismissed: bool,
    }

    impl Game {
        fn new(state: GameState, settings: Settings) -> Self {
            Self {
                state,
                render_state: None,
                settings,
                haptics: WebHaptics,
                motion_listener: None,
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
                overlay_dismissed: false,
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32) {
            let dt = dt.min(MAX_FRAME_DT);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                // One-shot inputs are consumed by the first substep
                let input = std::mem::take(&mut self.input);
                tick(&mut self.state, &input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;
            }

            let events = self.state.drain_events();
            dispatch_haptics(&self.haptics, &events, self.settings.haptics);
            for event in &events {
                if let GameEvent::ModeChanged { mode } = event {
                    self.settings.mode = *mode;
                    self.settings.save();
                }
            }
        }

        /// Render the current frame
        fn render(&mut self) {
            if let Some(ref mut render_state) = self.render_state {
                let vertices = build_frame(&self.state);
                match render_state.render(&vertices) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            if let Some(el) = document.query_selector("#hud-score .hud-value").ok().flatten() {
                el.set_text_content(Some(&self.state.score().to_string()));
            }

            // Success banner
            if let Some(el) = document.get_element_by_id("success-banner") {
                if self.state.phase() == GamePhase::Success {
                    el.set_text_content(Some(self.state.mode().success_banner()));
                    let class = if self.settings.reduced_motion {
                        "banner"
                    } else {
                        "banner bounce"
                    };
                    let _ = el.set_attribute("class", class);
                } else {
                    let _ = el.set_attribute("class", "banner hidden");
                }
            }

            // Start overlay
            if let Some(el) = document.get_element_by_id("start-overlay") {
                if self.state.phase() == GamePhase::Start && !self.overlay_dismissed {
                    let _ = el.set_attribute("class", "");
                } else {
                    let _ = el.set_attribute("class", "hidden");
                }
            }

            // Mode buttons
            for (id, mode) in [("mode-cup", GameMode::Cup), ("mode-spike", GameMode::Spike)] {
                if let Some(el) = document.get_element_by_id(id) {
                    let class = if self.state.mode() == mode {
                        "mode-btn active"
                    } else {
                        "mode-btn"
                    };
                    let _ = el.set_attribute("class", class);
                }
            }

            // Settings bar
            for toggle in Toggle::ALL {
                if let Some(el) = document.get_element_by_id(toggle.element_id()) {
                    let class = if self.settings.is_on(toggle) {
                        "toggle-btn on"
                    } else {
                        "toggle-btn"
                    };
                    let _ = el.set_attribute("class", class);
                }
            }

            // Raw sensor readout
            if let Some(el) = document.get_element_by_id("debug-line") {
                if self.settings.show_debug {
                    el.set_text_content(Some(self.state.debug_info()));
                    let _ = el.set_attribute("class", "");
                } else {
                    let _ = el.set_attribute("class", "hidden");
                }
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Kendama starting...");

        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Without a canvas there is nothing to build into
        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No #canvas element; not starting");
            return;
        };

        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width();
        let client_h = canvas.client_height();
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let settings = Settings::load();
        let viewport = Viewport::new(client_w as f32, client_h as f32);
        let state = match GameState::new(viewport, settings.mode, Tuning::default()) {
            Ok(state) => state,
            Err(e) => {
                log::error!("Could not build scene: {}", e);
                return;
            }
        };
        let game = Rc::new(RefCell::new(Game::new(state, settings)));

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => surface,
            Err(e) => {
                log::error!("Failed to create surface: {}", e);
                return;
            }
        };

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(e) => {
                log::error!("Failed to get adapter: {}", e);
                return;
            }
        };

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        match RenderState::new(surface, &adapter, width, height, (viewport.width, viewport.height))
            .await
        {
            Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
            Err(e) => {
                log::error!("Failed to create device: {}", e);
                return;
            }
        }

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        setup_pointer_handlers(&canvas, game.clone());
        setup_mode_buttons(game.clone());
        setup_play_button(game.clone());
        setup_toggle_buttons(game.clone());

        request_animation_frame(game);

        log::info!("Kendama running!");
    }

    /// Pointer position relative to the canvas, in CSS pixels
    fn canvas_point(canvas: &HtmlCanvasElement, client_x: i32, client_y: i32) -> Vec2 {
        let rect = canvas.get_bounding_client_rect();
        Vec2::new(
            client_x as f32 - rect.left() as f32,
            client_y as f32 - rect.top() as f32,
        )
    }

    fn setup_pointer_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Mouse down / move / up
        for (name, kind) in [("mousedown", 0), ("mousemove", 1), ("mouseup", 2)] {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let p = canvas_point(&canvas_clone, event.client_x(), event.client_y());
                let pointer = match kind {
                    0 => PointerEvent::Down(p),
                    1 => PointerEvent::Move(p),
                    _ => PointerEvent::Up,
                };
                game.borrow_mut().input.pointer.push(pointer);
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start / move
        for (name, is_start) in [("touchstart", true), ("touchmove", false)] {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let p = canvas_point(&canvas_clone, touch.client_x(), touch.client_y());
                    let pointer = if is_start {
                        PointerEvent::Down(p)
                    } else {
                        PointerEvent::Move(p)
                    };
                    game.borrow_mut().input.pointer.push(pointer);
                }
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                game.borrow_mut().input.pointer.push(PointerEvent::Up);
            });
            let _ = canvas
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_mode_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        for (id, mode) in [("mode-cup", GameMode::Cup), ("mode-spike", GameMode::Spike)] {
            let Some(btn) = document.get_element_by_id(id) else {
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().input.set_mode = Some(mode);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_toggle_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        for toggle in Toggle::ALL {
            let Some(btn) = document.get_element_by_id(toggle.element_id()) else {
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                let on = g.settings.toggle(toggle);
                g.settings.save();
                log::info!("{:?} {}", toggle, if on { "on" } else { "off" });
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_play_button(game: Rc<RefCell<Game>>) {
        let Some(btn) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("play-btn"))
        else {
            return;
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
            let game = game.clone();
            game.borrow_mut().overlay_dismissed = true;
            wasm_bindgen_futures::spawn_local(async move {
                let permission = request_permission().await;
                if permission.is_granted() {
                    start_sensing(&game);
                } else {
                    log::warn!(
                        "Motion sensing unavailable ({:?}); drag the ball instead",
                        permission
                    );
                }
            });
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn start_sensing(game: &Rc<RefCell<Game>>) {
        let mut g = game.borrow_mut();
        if g.motion_listener.is_none() {
            let sink = game.clone();
            g.motion_listener = MotionListener::attach(move |sample| {
                sink.borrow_mut().input.motion.push(sample);
            });
        }
        g.input.start_sensing = true;
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt);
            g.render();
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Kendama (native) starting...");
    log::info!("Rendering needs a browser - run with `trunk serve` for the web version");

    let tuning = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(json) => kendama::Tuning::from_json_or_default(&json),
            Err(e) => {
                log::warn!("Could not read {}: {} - using default tuning", path, e);
                kendama::Tuning::default()
            }
        },
        None => kendama::Tuning::default(),
    };

    if let Err(e) = headless_session(tuning) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Drop the ball into the cup, flick it out, then switch to the spike
#[cfg(not(target_arch = "wasm32"))]
fn headless_session(tuning: kendama::Tuning) -> Result<(), kendama::sim::SceneError> {
    use kendama::consts::SIM_DT;
    use kendama::platform::{NullHaptics, dispatch_haptics};
    use kendama::sim::{GameMode, GameState, MotionSample, TickInput, Viewport, tick};

    let mut state = GameState::new(Viewport::new(400.0, 800.0), GameMode::Cup, tuning)?;
    let haptics = NullHaptics;

    let mut script: Vec<TickInput> = Vec::new();
    script.push(TickInput {
        start_sensing: true,
        ..Default::default()
    });
    script.extend((0..180).map(|_| TickInput::default()));
    script.push(TickInput {
        motion: vec![MotionSample::linear(0.0, 6.0, 0.0)],
        ..Default::default()
    });
    script.extend((0..60).map(|_| TickInput::default()));
    script.push(TickInput {
        set_mode: Some(GameMode::Spike),
        ..Default::default()
    });
    script.extend((0..180).map(|_| TickInput {
        motion: vec![MotionSample::tilt(0.5, 9.8, 0.0)],
        ..Default::default()
    }));

    for input in &script {
        tick(&mut state, input, SIM_DT);
        let events = state.drain_events();
        dispatch_haptics(&haptics, &events, true);
        for event in events {
            log::info!("tick {:>4}: {:?}", state.time_ticks(), event);
        }
    }

    println!(
        "\nSession over after {} ticks: {} mode, {:?}, score {}",
        state.time_ticks(),
        state.mode().as_str(),
        state.phase(),
        state.score()
    );
    Ok(())
}
