use anyhow::{anyhow, Result};
use futures::channel::oneshot;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use wasm_bindgen::closure::{Closure, WasmClosure, WasmClosureFnOnce};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

#[rustfmt::skip]
use web_sys::{
    CanvasRenderingContext2d,
    Document,
    Event,
    HtmlCanvasElement,
    HtmlElement,
    HtmlImageElement,
    HtmlInputElement,
    Request,
    RequestInit,
    Response,
    Window,
};

macro_rules! log {
    ($($t:tt)*) => {
        web_sys::console::log_1(&format!($($t)*).into())
    }
}

macro_rules! error {
    ($($t:tt)*) => {
        web_sys::console::error_1(&format!($($t)*).into())
    }
}

// ==================== Constants ====================
// Constants related to HTML elements
mod html {
    pub const CANVAS_ID: &str = "canvas";
    pub const CONTEXT_2D: &str = "2d";
    pub const JSON_CONTENT: &str = "application/json";
}

pub type LoopClosure = Closure<dyn FnMut(f64)>;

pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("Window not found"))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| anyhow!("No Document Found"))
}

pub fn canvas() -> Result<HtmlCanvasElement> {
    document()?
        .get_element_by_id(html::CANVAS_ID)
        .ok_or_else(|| anyhow!("No Canvas Element found with ID : '{:#?}'", html::CANVAS_ID))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlCanvasElement", element))
}

pub fn context() -> Result<CanvasRenderingContext2d> {
    canvas()?
        .get_context(html::CONTEXT_2D)
        // Result<Option<Object>, JsValue>: map the JsValue error, then the None case
        .map_err(|js_value| anyhow!("Error getting context : {:#?}", js_value))?
        .ok_or_else(|| anyhow!("No 2d context found"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|element| {
            anyhow!(
                "Error converting {:#?} to CanvasRenderingContext2d",
                element
            )
        })
}

pub fn resize_canvas(width: u32, height: u32) -> Result<()> {
    let canvas = canvas()?;
    canvas.set_width(width);
    canvas.set_height(height);
    Ok(())
}

/// Value of an `<input>` element, `None` when absent or blank
pub fn input_value(id: &str) -> Option<String> {
    let value = document()
        .ok()?
        .get_element_by_id(id)?
        .dyn_into::<HtmlInputElement>()
        .ok()?
        .value();
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Resolves once the form `id` is submitted, right away when the page has no
/// such form. Submitting hides the form instead of navigating.
pub async fn form_submitted(id: &str) -> Result<()> {
    let Some(form) = document()?.get_element_by_id(id) else {
        return Ok(());
    };
    let form = form
        .dyn_into::<HtmlElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlElement", element))?;
    let (tx, rx) = oneshot::channel::<()>();
    let mut tx = Some(tx);
    let hidden = form.clone();
    let on_submit = closure_wrap(Box::new(move |event: Event| {
        event.prevent_default();
        if let Some(tx) = tx.take() {
            if let Err(err) = hidden.style().set_property("visibility", "hidden") {
                error!("Could not hide the form : {:#?}", err);
            }
            let _ = tx.send(());
        }
    }) as Box<dyn FnMut(Event)>);
    form.set_onsubmit(Some(on_submit.as_ref().unchecked_ref()));
    on_submit.forget();
    rx.await
        .map_err(|err| anyhow!("Form {} was never submitted : {:#?}", id, err))
}

pub fn new_image() -> Result<HtmlImageElement> {
    HtmlImageElement::new().map_err(|err| anyhow!("Could not create image element : {:#?}", err))
}

pub fn now() -> Result<f64> {
    Ok(window()?
        .performance()
        .ok_or_else(|| anyhow!("Performance object not found"))?
        .now())
}

pub fn closure_once<F, A, R>(f: F) -> Closure<F::FnMut>
where
    F: 'static + WasmClosureFnOnce<A, R>,
{
    Closure::once(f)
}

pub fn closure_wrap<T: WasmClosure + ?Sized>(data: Box<T>) -> Closure<T> {
    Closure::wrap(data)
}

pub fn create_raf_closure(f: impl FnMut(f64) + 'static) -> LoopClosure {
    closure_wrap(Box::new(f))
}

pub fn request_animation_frame(callback: &LoopClosure) -> Result<i32> {
    window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Cannot request animation frame {:#?}", err))
}

/// Runs `f` when the page is about to unload. The listener stays installed for
/// the lifetime of the page.
pub fn on_before_unload(f: impl FnMut() + 'static) -> Result<()> {
    let callback = closure_wrap(Box::new(f) as Box<dyn FnMut()>);
    window()?.set_onbeforeunload(Some(callback.as_ref().unchecked_ref()));
    callback.forget();
    Ok(())
}

pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

pub async fn fetch_json<T>(json_path: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let resp_value = fetch_with_str(json_path).await?;
    read_json(resp_value).await
}

/// POSTs `body` as JSON and decodes the JSON answer.
/// A non 2xx status is an error even if the body would decode.
pub async fn post_json<B, T>(url: &str, body: &B) -> Result<T>
where
    B: Serialize,
    T: DeserializeOwned,
{
    let value = body
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| anyhow!("error serializing request body : {:#?}", err))?;
    let text = js_sys::JSON::stringify(&value)
        .map_err(|err| anyhow!("error stringifying request body : {:#?}", err))?;

    let init = RequestInit::new();
    init.set_method("POST");
    init.set_body(&JsValue::from(text));
    let request = Request::new_with_str_and_init(url, &init)
        .map_err(|err| anyhow!("error creating request for {} : {:#?}", url, err))?;
    request
        .headers()
        .set("Content-Type", html::JSON_CONTENT)
        .map_err(|err| anyhow!("error setting headers : {:#?}", err))?;

    let resp_value = JsFuture::from(window()?.fetch_with_request(&request))
        .await
        .map_err(|err| anyhow!("error posting to {} : {:#?}", url, err))?;
    read_json(resp_value).await
}

async fn read_json<T>(resp_value: JsValue) -> Result<T>
where
    T: DeserializeOwned,
{
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|element| anyhow!("error converting [{:#?}] to Response", element))?;
    if !resp.ok() {
        return Err(anyhow!("{} answered with status {}", resp.url(), resp.status()));
    }
    let json = resp
        .json()
        .map_err(|err| anyhow!("Could not get JSON from response [{:#?}]", err))?;

    let json_value = JsFuture::from(json)
        .await
        .map_err(|err| anyhow!("error fetching [{:#?}]", err))?;

    serde_wasm_bindgen::from_value(json_value)
        .map_err(|err| anyhow!("error converting response : {:#?}", err))
}

async fn fetch_with_str(resource: &str) -> Result<JsValue> {
    let resp = window()?.fetch_with_str(resource);

    JsFuture::from(resp)
        .await
        .map_err(|err| anyhow!("error fetching : {:#?}", err))
}
