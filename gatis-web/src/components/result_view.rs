use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlAnchorElement;

/// Save `url` through a temporary download link.
fn download(url: &str) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let Ok(element) = document.create_element("a") else {
        return;
    };
    let a: HtmlAnchorElement = element.unchecked_into();
    a.set_href(url);
    a.set_download(&format!("gatis-{}.png", js_sys::Date::now() as u64));
    a.click();
}

#[component]
pub fn ResultView(image_url: Signal<Option<String>>) -> impl IntoView {
    let on_download = move |_| {
        if let Some(url) = image_url.get_untracked() {
            download(&url);
        }
    };

    view! {
        <Show when=move || image_url.get().is_some()>
            <div class="panel result-section">
                <h2>"Generated Image"</h2>
                <img
                    class="result-image"
                    alt="Generated"
                    src=move || image_url.get().unwrap_or_default()
                />
                <button class="download-button" on:click=on_download>
                    "Download Image"
                </button>
            </div>
        </Show>
    }
}
