//! Browser binding
//!
//! `WebGame` owns a `Driver` and an animation-frame loop. The page draws
//! from `snapshot()` JSON and feeds input through `set_input()`.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, Headers, Request, RequestInit, RequestMode, Response};

use super::Driver;
use crate::catalog::{LineData, RecordCatalog, StaticCatalog, load_with_fallback};
use crate::error::{EngineError, Result};
use crate::games::{GameKind, TickInput};
use crate::progress::LocalProgress;
use crate::router::Router;
use crate::settings::{FetchPolicy, Settings};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialised".into());
    }
    log::info!("TrolleyGames starting...");
}

fn js_error(err: EngineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn unavailable(line: &str, reason: impl Into<String>) -> EngineError {
    EngineError::CatalogUnavailable {
        line: line.to_string(),
        reason: reason.into(),
    }
}

/// Resolve after `ms` milliseconds
async fn sleep(ms: u32) {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(window) = web_sys::window() {
            let _ = window
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms as i32);
        }
    });
    let _ = JsFuture::from(promise).await;
}

/// One request with a timeout enforced through an `AbortController`
///
/// Returns the response body, or why the request failed.
async fn send(
    method: &str,
    url: &str,
    body: Option<&str>,
    timeout_ms: u32,
) -> std::result::Result<String, String> {
    let reason = |e: JsValue| format!("{:?}", e);
    let window = web_sys::window().ok_or("no window")?;
    let controller = AbortController::new().map_err(reason)?;

    let abort = {
        let controller = controller.clone();
        Closure::once(move || controller.abort())
    };
    let timer = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            abort.as_ref().unchecked_ref(),
            timeout_ms as i32,
        )
        .map_err(reason)?;

    let init = RequestInit::new();
    init.set_method(method);
    init.set_mode(RequestMode::Cors);
    init.set_signal(Some(&controller.signal()));
    if let Some(body) = body {
        let headers = Headers::new().map_err(reason)?;
        headers
            .set("Content-Type", "application/json")
            .map_err(reason)?;
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(body));
    }

    let result = async {
        let request = Request::new_with_str_and_init(url, &init).map_err(reason)?;
        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(reason)?
            .dyn_into()
            .map_err(reason)?;
        if !response.ok() {
            return Err(format!("HTTP {}", response.status()));
        }
        let text = response.text().map_err(reason)?;
        JsFuture::from(text)
            .await
            .map_err(reason)?
            .as_string()
            .ok_or_else(|| "body is not text".to_string())
    }
    .await;

    window.clear_timeout_with_handle(timer);
    drop(abort);
    result
}

fn api_url(base_url: &str, path: &str) -> String {
    format!("{}/api/{}", base_url.trim_end_matches('/'), path)
}

fn encode(value: &str) -> String {
    String::from(js_sys::encode_uri_component(value))
}

/// GET `/api/signals?line=...`, retrying per `policy`
pub async fn fetch_signals(base_url: &str, line: &str, policy: &FetchPolicy) -> Result<RecordCatalog> {
    let url = api_url(base_url, &format!("signals?line={}", encode(line)));
    let attempts = policy.retries + 1;
    let mut last_error = None;
    for attempt in 1..=attempts {
        match send("GET", &url, None, policy.timeout_ms).await {
            Ok(body) => return RecordCatalog::from_json(&body),
            Err(reason) => {
                let err = unavailable(line, reason);
                log::warn!(
                    "signals request for '{}' failed (attempt {}/{}): {}",
                    line,
                    attempt,
                    attempts,
                    err
                );
                last_error = Some(err);
                if attempt < attempts {
                    sleep(policy.retry_delay_ms).await;
                }
            }
        }
    }
    Err(last_error.unwrap_or_else(|| unavailable(line, "no attempts")))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressBody<'a> {
    username: &'a str,
    line: &'a str,
    level_idx: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressReply {
    #[serde(default)]
    level_idx: u32,
}

/// POST `/api/set-progress` with `{username, line, levelIdx}`
pub async fn post_progress(base_url: &str, user: &str, line: &str, level: u32, timeout_ms: u32) -> Result<()> {
    let body = serde_json::to_string(&ProgressBody {
        username: user,
        line,
        level_idx: level,
    })?;
    send("POST", &api_url(base_url, "set-progress"), Some(&body), timeout_ms)
        .await
        .map_err(|reason| EngineError::ProgressWriteFailed {
            user: user.to_string(),
            line: line.to_string(),
            reason,
        })?;
    log::info!("progress for '{}' on '{}' posted: {}", user, line, level);
    Ok(())
}

/// GET `/api/get-progress?username=...&line=...`; the backend answers `{levelIdx}`
pub async fn fetch_progress(base_url: &str, user: &str, line: &str, timeout_ms: u32) -> Result<u32> {
    let url = api_url(
        base_url,
        &format!("get-progress?username={}&line={}", encode(user), encode(line)),
    );
    let body = send("GET", &url, None, timeout_ms)
        .await
        .map_err(|reason| unavailable(line, reason))?;
    let reply: ProgressReply = serde_json::from_str(&body)?;
    Ok(reply.level_idx)
}

/// Line data from the backend, or builtin data when it cannot be reached
async fn load_line(settings: &Settings, line: &str) -> Result<(LineData, bool)> {
    let fallback = StaticCatalog::new(settings.signal_set);
    let primary = if settings.online() {
        match fetch_signals(&settings.api_base_url, line, &settings.fetch).await {
            Ok(records) => records,
            Err(err) => {
                log::warn!("no backend signals for '{}', using builtin data: {}", line, err);
                RecordCatalog::default()
            }
        }
    } else {
        RecordCatalog::default()
    };
    // Retries already happened over the network
    let policy = FetchPolicy {
        retries: 0,
        ..settings.fetch
    };
    let loaded = load_with_fallback(&primary, &fallback, line, &policy)?;
    Ok((loaded.data, loaded.degraded))
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// A game running in the page
#[wasm_bindgen]
pub struct WebGame {
    driver: Rc<RefCell<Driver<LocalProgress>>>,
    callback: FrameCallback,
    frame_id: Rc<RefCell<Option<i32>>>,
}

#[wasm_bindgen]
impl WebGame {
    /// `game` is one of HoppyTrain, RememberBee, SchemaPro, SignalSlayer
    #[wasm_bindgen(constructor)]
    pub fn new(game: &str, line: &str, user: &str) -> std::result::Result<WebGame, JsValue> {
        let kind = GameKind::from_name(game)
            .ok_or_else(|| JsValue::from_str(&format!("unknown game '{}'", game)))?;
        let settings = Settings::load();
        let router = Router::new(user, LocalProgress::load());
        let seed = js_sys::Date::now() as u64;
        let driver = Driver::new(kind, line, settings, router, seed);
        Ok(Self {
            driver: Rc::new(RefCell::new(driver)),
            callback: Rc::new(RefCell::new(None)),
            frame_id: Rc::new(RefCell::new(None)),
        })
    }

    /// Fetch the line (or fall back to builtin data) and start playing
    ///
    /// Resolves to true when builtin data had to be used.
    pub fn fetch_catalog(&self) -> js_sys::Promise {
        let driver = self.driver.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            let (settings, line) = {
                let d = driver.borrow();
                (d.settings().clone(), d.game().session().line().to_string())
            };
            let (data, degraded) = load_line(&settings, &line).await.map_err(js_error)?;
            driver.borrow_mut().provide(data).map_err(js_error)?;
            Ok(JsValue::from_bool(degraded))
        })
    }

    /// Play on builtin data without touching the network
    pub fn use_builtin(&self) -> std::result::Result<(), JsValue> {
        let mut driver = self.driver.borrow_mut();
        let catalog = StaticCatalog::new(driver.settings().signal_set);
        let line = driver.game().session().line().to_string();
        let data = LineData::load(&catalog, &line).map_err(js_error)?;
        driver.provide(data).map_err(js_error)
    }

    /// Provide a `{"signals": [...]}` payload fetched by the page itself
    pub fn provide_catalog(&self, json: &str) -> std::result::Result<(), JsValue> {
        let mut driver = self.driver.borrow_mut();
        let records = RecordCatalog::from_json(json).map_err(js_error)?;
        let fallback = StaticCatalog::new(driver.settings().signal_set);
        let line = driver.game().session().line().to_string();
        let loaded = load_with_fallback(&records, &fallback, &line, &FetchPolicy {
            retries: 0,
            ..driver.settings().fetch
        })
        .map_err(js_error)?;
        driver.provide(loaded.data).map_err(js_error)
    }

    /// Input for the next frame, as `TickInput` JSON
    pub fn set_input(&self, json: &str) -> std::result::Result<(), JsValue> {
        let input: TickInput =
            serde_json::from_str(json).map_err(|e| js_error(EngineError::from(e)))?;
        self.driver.borrow_mut().set_input(input);
        Ok(())
    }

    /// Advance one frame by hand; returns the frame's events as JSON
    pub fn tick(&self) -> String {
        let mut driver = self.driver.borrow_mut();
        driver.step();
        serde_json::to_string(&driver.drain_events()).unwrap_or_default()
    }

    pub fn snapshot(&self) -> String {
        serde_json::to_string(&self.driver.borrow().snapshot()).unwrap_or_default()
    }

    /// Route chosen after the session ended, as JSON (null while playing)
    pub fn route(&self) -> String {
        serde_json::to_string(&self.driver.borrow().route()).unwrap_or_default()
    }

    /// Switch to another game on the same line
    pub fn switch_to(&self, game: &str, line: &str) -> std::result::Result<(), JsValue> {
        let kind = GameKind::from_name(game)
            .ok_or_else(|| JsValue::from_str(&format!("unknown game '{}'", game)))?;
        self.driver.borrow_mut().start(kind, line);
        Ok(())
    }

    /// Run `step` on every animation frame until `stop`
    pub fn start(&self) {
        if self.frame_id.borrow().is_some() {
            return;
        }
        let driver = self.driver.clone();
        let callback = self.callback.clone();
        let frame_id = self.frame_id.clone();
        *self.callback.borrow_mut() = Some(Closure::new(move |_time: f64| {
            let finished = driver.borrow_mut().step().is_some();
            if finished {
                *frame_id.borrow_mut() = None;
                return;
            }
            if let Some(cb) = callback.borrow().as_ref() {
                *frame_id.borrow_mut() = request_animation_frame(cb);
            }
        }));
        if let Some(cb) = self.callback.borrow().as_ref() {
            *self.frame_id.borrow_mut() = request_animation_frame(cb);
        }
    }

    /// Cancel the pending animation frame
    pub fn stop(&self) {
        if let Some(id) = self.frame_id.borrow_mut().take() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
    }

    /// Retry progress writes that failed earlier; returns how many remain
    pub fn flush_progress(&self) -> u32 {
        self.driver.borrow_mut().router_mut().flush() as u32
    }

    /// Post the current line's level to the backend
    ///
    /// Resolves to false when offline or when the write failed; local
    /// progress is kept either way.
    pub fn sync_progress(&self) -> js_sys::Promise {
        let driver = self.driver.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            let (settings, user, line, level) = {
                let d = driver.borrow();
                let line = d.game().session().line().to_string();
                let level = d.router().level(&line);
                (d.settings().clone(), d.router().user().to_string(), line, level)
            };
            if !settings.online() {
                return Ok(JsValue::FALSE);
            }
            let timeout = settings.fetch.timeout_ms;
            match post_progress(&settings.api_base_url, &user, &line, level, timeout).await {
                Ok(()) => Ok(JsValue::TRUE),
                Err(err) => {
                    log::warn!("{}", err);
                    Ok(JsValue::FALSE)
                }
            }
        })
    }

    /// Merge the backend's level for the current line; resolves to the level in use
    pub fn refresh_progress(&self) -> js_sys::Promise {
        let driver = self.driver.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            let (settings, user, line) = {
                let d = driver.borrow();
                let line = d.game().session().line().to_string();
                (d.settings().clone(), d.router().user().to_string(), line)
            };
            let mut level = driver.borrow().router().level(&line);
            if settings.online() {
                let timeout = settings.fetch.timeout_ms;
                match fetch_progress(&settings.api_base_url, &user, &line, timeout).await {
                    Ok(remote) => level = driver.borrow_mut().router_mut().note_level(&line, remote),
                    Err(err) => log::warn!("cannot read backend progress: {}", err),
                }
            }
            Ok(JsValue::from(level))
        })
    }

    /// Current settings as JSON
    pub fn settings(&self) -> String {
        self.driver.borrow().settings().to_json().unwrap_or_default()
    }

    /// Replace the settings from JSON and store them; the next game uses them
    pub fn save_settings(&self, json: &str) -> std::result::Result<(), JsValue> {
        let settings = Settings::from_json(json).map_err(js_error)?;
        settings.save().map_err(js_error)?;
        self.driver.borrow_mut().set_settings(settings);
        Ok(())
    }
}

impl Drop for WebGame {
    fn drop(&mut self) {
        self.stop();
        // Break the closure's reference to itself
        self.callback.borrow_mut().take();
    }
}

fn request_animation_frame(callback: &Closure<dyn FnMut(f64)>) -> Option<i32> {
    web_sys::window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .ok()
}
