//! Neon Pinball entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, Event, EventTarget, KeyboardEvent, TouchEvent};

    use neon_pinball::audio::WebAudio;
    use neon_pinball::input::{Button, ControlScheme, Key};
    use neon_pinball::scores::{HttpScores, parse_user_id};
    use neon_pinball::sim::Overlay;
    use neon_pinball::viewport::{css_transform, display_scale};
    use neon_pinball::{HighScores, Session, Settings};

    type Listener = Closure<dyn FnMut(Event)>;

    /// Everything that must be torn down together
    struct Shell {
        session: Rc<RefCell<Session>>,
        settings: Rc<RefCell<Settings>>,
        listeners: Vec<(EventTarget, &'static str, Listener)>,
        running: Rc<Cell<bool>>,
        frame_id: Rc<Cell<Option<i32>>>,
    }

    thread_local! {
        static SHELL: RefCell<Option<Shell>> = const { RefCell::new(None) };
    }

    impl Shell {
        fn listen(
            &mut self,
            target: &EventTarget,
            event: &'static str,
            handler: impl FnMut(Event) + 'static,
        ) {
            let closure = Listener::new(handler);
            if target
                .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
                .is_err()
            {
                log::warn!("Could not attach {event} listener");
                return;
            }
            self.listeners.push((target.clone(), event, closure));
        }

        /// Loop first, then listeners, then audio
        fn teardown(self) {
            self.running.set(false);
            if let (Some(id), Some(window)) = (self.frame_id.take(), web_sys::window()) {
                let _ = window.cancel_animation_frame(id);
            }
            for (target, event, closure) in &self.listeners {
                let _ = target
                    .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
            }
            log::info!("Detached {} listeners", self.listeners.len());
            self.session.borrow_mut().dispose();
        }
    }

    fn by_id(document: &Document, id: &str) -> Option<Element> {
        document.get_element_by_id(id)
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = by_id(document, id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_hidden(document: &Document, id: &str, hidden: bool) {
        if let Some(el) = by_id(document, id) {
            let classes = el.class_list();
            let _ = if hidden {
                classes.add_1("hidden")
            } else {
                classes.remove_1("hidden")
            };
        }
    }

    fn update_hud(document: &Document, session: &Session) {
        let snap = session.snapshot();
        set_text(document, "score", &snap.score.to_string());
        set_text(document, "lives", &snap.lives.to_string());
        set_text(document, "stage", &snap.stage.to_string());
        set_text(document, "score-pops", &snap.score_pops.to_string());
        let best = session
            .best_score()
            .or_else(|| session.high_scores().top_score())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        set_text(document, "best", &best);
        set_hidden(document, "game-over", snap.overlay != Overlay::GameOver);
        if snap.overlay == Overlay::GameOver {
            set_text(document, "final-score", &snap.score.to_string());
        }
    }

    fn apply_scale(document: &Document) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let scale = display_scale(width as f32, height as f32);
        if let Some(el) = by_id(document, "game") {
            let style = format!("transform: {}; transform-origin: top center;", css_transform(scale));
            let _ = el.set_attribute("style", &style);
        }
    }

    fn request_animation_frame(
        session: Rc<RefCell<Session>>,
        running: Rc<Cell<bool>>,
        frame_id: Rc<Cell<Option<i32>>>,
    ) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let next_id = frame_id.clone();
        let closure = Closure::once(move |time: f64| {
            game_loop(session, running, frame_id, time);
        });
        if let Ok(id) = window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            next_id.set(Some(id));
        }
        closure.forget();
    }

    fn game_loop(
        session: Rc<RefCell<Session>>,
        running: Rc<Cell<bool>>,
        frame_id: Rc<Cell<Option<i32>>>,
        time: f64,
    ) {
        if !running.get() {
            return;
        }
        {
            let mut s = session.borrow_mut();
            s.frame(time);
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                update_hud(&document, &s);
            }
        }
        request_animation_frame(session, running, frame_id);
    }

    fn setup_keyboard(shell: &mut Shell, window: &EventTarget) {
        let session = shell.session.clone();
        shell.listen(window, "keydown", move |event| {
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let Some(key) = Key::from_dom(&event.key(), &event.code()) else {
                return;
            };
            if key == Key::Plunger {
                event.prevent_default();
            }
            session.borrow_mut().key_down(key, event.time_stamp());
        });

        let session = shell.session.clone();
        shell.listen(window, "keyup", move |event| {
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            if let Some(key) = Key::from_dom(&event.key(), &event.code()) {
                session.borrow_mut().key_up(key, event.time_stamp());
            }
        });
    }

    fn setup_half_screen(shell: &mut Shell, field: &Element) {
        let session = shell.session.clone();
        let field_clone = field.clone();
        shell.listen(field, "touchstart", move |event| {
            let Some(event) = event.dyn_ref::<TouchEvent>() else {
                return;
            };
            if let Some(touch) = event.touches().get(0) {
                let rect = field_clone.get_bounding_client_rect();
                let x = touch.client_x() as f32 - rect.left() as f32;
                session.borrow_mut().touch_start(x, rect.width() as f32);
            }
        });

        let session = shell.session.clone();
        shell.listen(field, "touchend", move |_event| {
            session.borrow_mut().touch_end();
        });
    }

    fn setup_buttons(shell: &mut Shell, document: &Document) {
        set_hidden(document, "touch-buttons", false);
        let buttons = [
            ("btn-left", Button::LeftFlipper),
            ("btn-plunger", Button::Plunger),
            ("btn-right", Button::RightFlipper),
        ];
        for (id, button) in buttons {
            let Some(el) = by_id(document, id) else {
                log::warn!("Missing #{id}");
                continue;
            };
            let session = shell.session.clone();
            shell.listen(&el, "pointerdown", move |event| {
                session.borrow_mut().button_down(button, event.time_stamp());
            });
            // Sliding off the button counts as letting go
            for release in ["pointerup", "pointerleave"] {
                let session = shell.session.clone();
                shell.listen(&el, release, move |event| {
                    session.borrow_mut().button_up(button, event.time_stamp());
                });
            }
        }
    }

    fn setup_overlays(shell: &mut Shell, document: &Document) {
        if let Some(start) = by_id(document, "start-overlay") {
            let session = shell.session.clone();
            let doc = document.clone();
            shell.listen(&start, "click", move |_event| {
                session.borrow_mut().click_start();
                set_hidden(&doc, "start-overlay", true);
            });
        }

        // First Space also dismisses the start screen
        {
            let session = shell.session.clone();
            let doc = document.clone();
            shell.listen(document, "keydown", move |_event| {
                if session.borrow().input().started() {
                    set_hidden(&doc, "start-overlay", true);
                }
            });
        }

        if let Some(restart) = by_id(document, "restart") {
            let session = shell.session.clone();
            shell.listen(&restart, "click", move |_event| {
                session.borrow_mut().restart();
            });
        }

        if let Some(mute) = by_id(document, "mute") {
            let session = shell.session.clone();
            let settings = shell.settings.clone();
            let mute_clone = mute.clone();
            shell.listen(&mute, "click", move |_event| {
                let muted = settings.borrow_mut().toggle_mute();
                settings.borrow().save();
                session.borrow_mut().set_muted(muted);
                mute_clone.set_text_content(Some(if muted { "Unmute" } else { "Mute" }));
            });
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Neon Pinball starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let field = by_id(&document, "field").ok_or("no #field element")?;

        // Host page provides the signed-in player, if any
        let user_id = by_id(&document, "pinball")
            .and_then(|el| el.get_attribute("data-user-id"))
            .and_then(|raw| parse_user_id(Some(raw.as_str())));

        let settings = Settings::load();
        let scheme = settings
            .touch_controls
            .resolve(window.navigator().max_touch_points());
        let audio = WebAudio::new(&settings);
        let scores = HttpScores::new(settings.score_api.clone(), user_id);
        let session = Session::create(scheme, Box::new(audio), Box::new(scores), HighScores::load());

        let mut shell = Shell {
            session: Rc::new(RefCell::new(session)),
            settings: Rc::new(RefCell::new(settings)),
            listeners: Vec::new(),
            running: Rc::new(Cell::new(true)),
            frame_id: Rc::new(Cell::new(None)),
        };

        setup_keyboard(&mut shell, &window);
        match scheme {
            ControlScheme::HalfScreen => setup_half_screen(&mut shell, &field),
            ControlScheme::Buttons => setup_buttons(&mut shell, &document),
        }
        setup_overlays(&mut shell, &document);

        {
            let doc = document.clone();
            shell.listen(&window, "resize", move |_event| apply_scale(&doc));
        }
        apply_scale(&document);

        if let Some(loading) = by_id(&document, "loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        request_animation_frame(
            shell.session.clone(),
            shell.running.clone(),
            shell.frame_id.clone(),
        );

        SHELL.with(|slot| {
            if let Some(previous) = slot.borrow_mut().replace(shell) {
                previous.teardown();
            }
        });

        log::info!("Neon Pinball running!");
        Ok(())
    }

    /// Tear the game down (host page navigates away)
    pub fn stop() {
        SHELL.with(|slot| {
            if let Some(shell) = slot.borrow_mut().take() {
                shell.teardown();
            }
        });
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn stop_pinball() {
    wasm_game::stop();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Neon Pinball (native) starting...");
    log::info!("No display on native - running a scripted headless game");

    headless_demo();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Launch at full charge, flap both flippers for a while, report the result
#[cfg(not(target_arch = "wasm32"))]
fn headless_demo() {
    use neon_pinball::audio::NullAudio;
    use neon_pinball::consts::SIM_DT;
    use neon_pinball::input::{ControlScheme, Key};
    use neon_pinball::scores::NoScores;
    use neon_pinball::{HighScores, Session};

    let mut session = Session::create(
        ControlScheme::HalfScreen,
        Box::new(NullAudio::new()),
        Box::new(NoScores),
        HighScores::load(),
    );

    let frame_ms = f64::from(SIM_DT) * 1000.0;
    let mut now = 0.0;
    session.key_down(Key::Plunger, now);
    session.frame(now);

    session.key_down(Key::Plunger, now);
    for _ in 0..90 {
        now += frame_ms;
        session.frame(now);
    }
    session.key_up(Key::Plunger, now);

    for i in 0..(60 * 60) {
        now += frame_ms;
        // Flap every half second
        let key = if i % 60 < 30 { Key::LeftFlipper } else { Key::RightFlipper };
        if i % 30 == 0 {
            session.key_down(key, now);
        } else if i % 30 == 10 {
            session.key_up(key, now);
        }
        session.frame(now);
        if session.snapshot().overlay == neon_pinball::sim::Overlay::GameOver {
            break;
        }
    }

    let snap = session.snapshot();
    println!(
        "score {} | lives {} | stage {} | overlay {:?}",
        snap.score, snap.lives, snap.stage, snap.overlay
    );
    session.dispose();
}
