use leptos::prelude::*;
use leptos::task::spawn_local;

use gatis::{HistoryEntry, Page};

use crate::components::auth_form::{AuthForm, AuthFormKind};
use crate::components::history_grid::HistoryGrid;
use crate::components::prompt_form::PromptForm;
use crate::components::result_view::ResultView;
use crate::components::toast::{show_toast, ToastContainer, ToastMessage, ToastType};
use crate::services::Services;

const EXAMPLE_PROMPTS: &[&str] = &[
    "A red bird with a black head",
    "A small blue bird in a forest setting",
    "A yellow bird with spotted wings",
];

fn requested_page() -> Page {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .map(|path| Page::from_path(&path))
        .unwrap_or_default()
}

#[component]
pub fn App() -> impl IntoView {
    let services = StoredValue::new(Services::from_env());

    // Gate the page the browser was opened on before anything renders.
    let page = RwSignal::new(services.with_value(|s| s.gate.guard(requested_page())));
    let signed_in = RwSignal::new(services.with_value(|s| s.gate.is_authenticated()));
    let username = RwSignal::new(services.with_value(|s| s.gate.username()));
    let toasts = RwSignal::new(Vec::<ToastMessage>::new());

    let navigate = Callback::new(move |requested: Page| {
        let target = services.with_value(|s| s.gate.guard(requested));
        if target != requested {
            show_toast(toasts, "Please log in to generate images", ToastType::Info);
        }
        page.set(target);
    });

    let on_signed_in = Callback::new(move |_: ()| {
        signed_in.set(true);
        username.set(services.with_value(|s| s.gate.username()));
        page.set(Page::Generate);
    });

    let on_sign_out = move |_| {
        services.with_value(|s| s.gate.sign_out());
        signed_in.set(false);
        username.set(None);
        page.set(Page::Home);
        show_toast(toasts, "Signed out", ToastType::Info);
    };

    view! {
        <div class="app-container">
            <header class="app-header">
                <button class="app-title" on:click=move |_| navigate.run(Page::Home)>"GATIS"</button>
                <nav class="app-nav">
                    <button on:click=move |_| navigate.run(Page::Generate)>"Generate"</button>
                    <Show
                        when=move || signed_in.get()
                        fallback=move || view! {
                            <button on:click=move |_| navigate.run(Page::Login)>"Login"</button>
                            <button on:click=move |_| navigate.run(Page::Signup)>"Sign Up"</button>
                        }
                    >
                        <span class="nav-user">{move || username.get().unwrap_or_default()}</span>
                        <button on:click=on_sign_out>"Logout"</button>
                    </Show>
                </nav>
            </header>

            <main class="main-content">
                {move || match page.get() {
                    Page::Home => view! { <HomePage on_navigate=navigate /> }.into_any(),
                    Page::Login => view! {
                        <AuthForm
                            kind=AuthFormKind::Login
                            services=services
                            on_success=on_signed_in
                            on_navigate=navigate
                        />
                    }.into_any(),
                    Page::Signup => view! {
                        <AuthForm
                            kind=AuthFormKind::Signup
                            services=services
                            on_success=on_signed_in
                            on_navigate=navigate
                        />
                    }.into_any(),
                    Page::Generate => view! {
                        <GeneratePage services=services toasts=toasts />
                    }.into_any(),
                    Page::NotFound => view! { <NotFoundPage on_navigate=navigate /> }.into_any(),
                }}
            </main>

            <ToastContainer
                toasts=toasts.into()
                on_dismiss=Callback::new(move |id: usize| {
                    toasts.update(|t| t.retain(|m| m.id != id));
                })
            />

            <footer class="app-footer">
                <p>"GATIS · Generative Adversarial Text to Image Synthesis"</p>
            </footer>
        </div>
    }
}

#[component]
fn HomePage(#[prop(into)] on_navigate: Callback<Page>) -> impl IntoView {
    view! {
        <section class="home-page">
            <h1>"Text to Image Synthesis"</h1>
            <p>"Describe a bird in words and a GAN draws it for you."</p>
            <button class="primary-button" on:click=move |_| on_navigate.run(Page::Generate)>
                "Start generating"
            </button>
        </section>
    }
}

#[component]
fn NotFoundPage(#[prop(into)] on_navigate: Callback<Page>) -> impl IntoView {
    view! {
        <section class="not-found-page">
            <h1 class="not-found-code">"404"</h1>
            <h2>"Page Not Found"</h2>
            <p>"The page you're looking for doesn't exist or has been moved."</p>
            <button class="primary-button" on:click=move |_| on_navigate.run(Page::Home)>
                "Go Home"
            </button>
        </section>
    }
}

#[component]
fn GeneratePage(
    services: StoredValue<Services>,
    toasts: RwSignal<Vec<ToastMessage>>,
) -> impl IntoView {
    let prompt = RwSignal::new(String::new());
    let is_loading = RwSignal::new(false);
    let current_image = RwSignal::new(None::<String>);
    let history = RwSignal::new(services.with_value(|s| s.generator.load_history()));

    let on_generate = Callback::new(move |_: ()| {
        // The button is disabled while pending; this covers Enter in the field.
        if is_loading.get_untracked() {
            return;
        }
        let text = prompt.get_untracked();
        if text.trim().is_empty() {
            show_toast(toasts, "Please enter a text description", ToastType::Error);
            return;
        }

        is_loading.set(true);
        let services = services.get_value();
        spawn_local(async move {
            let token = services.gate.token();
            match services.generator.generate(&text, token.as_deref()).await {
                Ok(outcome) => {
                    current_image.set(Some(outcome.result.result_location));
                    history.set(outcome.history);
                    if !outcome.persisted {
                        show_toast(
                            toasts,
                            "Image generated, but history could not be saved",
                            ToastType::Info,
                        );
                    }
                }
                Err(e) => {
                    log::warn!("Generation failed: {}", e);
                    show_toast(toasts, &format!("Failed to generate image: {}", e), ToastType::Error);
                }
            }
            is_loading.set(false);
        });
    });

    view! {
        <section class="generate-page">
            <h1>"Text to Image Synthesis"</h1>

            <div class="panel about-panel">
                <h2>"About this Model"</h2>
                <p>
                    "This model generates bird images based on text descriptions. Try describing a bird with details about its colors, features, or habitat."
                </p>
                <div class="example-prompts">
                    {EXAMPLE_PROMPTS.iter().map(|example| {
                        let example = example.to_string();
                        let label = example.clone();
                        view! {
                            <button
                                class="example-prompt"
                                on:click=move |_| prompt.set(example.clone())
                            >
                                {label}
                            </button>
                        }
                    }).collect_view()}
                </div>
            </div>

            <PromptForm prompt=prompt is_loading=is_loading.into() on_generate=on_generate />

            <ResultView image_url=current_image.into() />

            <HistoryGrid
                history=history.into()
                on_reuse=Callback::new(move |entry: HistoryEntry| prompt.set(entry.prompt_text))
            />
        </section>
    }
}
