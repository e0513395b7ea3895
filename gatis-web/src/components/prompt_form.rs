use leptos::ev::SubmitEvent;
use leptos::prelude::*;

#[component]
pub fn PromptForm(
    prompt: RwSignal<String>,
    is_loading: Signal<bool>,
    #[prop(into)] on_generate: Callback<()>,
) -> impl IntoView {
    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        on_generate.run(());
    };

    let button_text = move || {
        if is_loading.get() {
            "Generating..."
        } else {
            "Generate Image"
        }
    };

    view! {
        <form class="panel prompt-form" on:submit=on_submit>
            <label for="prompt-text">"Enter text description"</label>
            <input
                id="prompt-text"
                type="text"
                required=true
                placeholder="Describe a bird you want to generate..."
                prop:value=move || prompt.get()
                on:input=move |ev| prompt.set(event_target_value(&ev))
                disabled=move || is_loading.get()
            />
            <button type="submit" class="primary-button" disabled=move || is_loading.get()>
                {button_text}
            </button>
        </form>
    }
}
