//! Login and signup forms.

use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;

use gatis::Page;

use crate::services::Services;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFormKind {
    Login,
    Signup,
}

impl AuthFormKind {
    fn title(&self) -> &'static str {
        match self {
            AuthFormKind::Login => "Login",
            AuthFormKind::Signup => "Create an Account",
        }
    }

    fn submit_label(&self, pending: bool) -> &'static str {
        match (self, pending) {
            (AuthFormKind::Login, false) => "Login",
            (AuthFormKind::Login, true) => "Logging in...",
            (AuthFormKind::Signup, false) => "Sign Up",
            (AuthFormKind::Signup, true) => "Creating account...",
        }
    }
}

#[component]
fn Field(
    id: &'static str,
    label: &'static str,
    input_type: &'static str,
    value: RwSignal<String>,
) -> impl IntoView {
    view! {
        <div class="form-field">
            <label for=id>{label}</label>
            <input
                id=id
                type=input_type
                required=true
                prop:value=move || value.get()
                on:input=move |ev| value.set(event_target_value(&ev))
            />
        </div>
    }
}

#[component]
pub fn AuthForm(
    kind: AuthFormKind,
    services: StoredValue<Services>,
    #[prop(into)] on_success: Callback<()>,
    #[prop(into)] on_navigate: Callback<Page>,
) -> impl IntoView {
    let username = RwSignal::new(String::new());
    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let error = RwSignal::new(None::<String>);
    let pending = RwSignal::new(false);

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        if pending.get_untracked() {
            return;
        }
        pending.set(true);
        error.set(None);

        let services = services.get_value();
        let user = username.get_untracked();
        let mail = email.get_untracked();
        let pass = password.get_untracked();
        spawn_local(async move {
            let result = match kind {
                AuthFormKind::Login => services.gate.sign_in(&services.auth, &user, &pass).await,
                AuthFormKind::Signup => {
                    services
                        .gate
                        .sign_up(&services.auth, &user, &mail, &pass)
                        .await
                }
            };
            pending.set(false);
            match result {
                Ok(_) => on_success.run(()),
                Err(e) => {
                    log::warn!("{} failed: {}", kind.title(), e);
                    error.set(Some(e.message()));
                }
            }
        });
    };

    let (switch_prompt, switch_label, switch_page) = match kind {
        AuthFormKind::Login => ("No account yet? ", "Sign up", Page::Signup),
        AuthFormKind::Signup => ("Already registered? ", "Log in", Page::Login),
    };

    view! {
        <section class="auth-page">
            <h1>{kind.title()}</h1>
            <form class="panel auth-form" on:submit=on_submit>
                <Field id="username" label="Username" input_type="text" value=username />
                {(kind == AuthFormKind::Signup).then(|| view! {
                    <Field id="email" label="Email" input_type="email" value=email />
                })}
                <Field id="password" label="Password" input_type="password" value=password />

                {move || error.get().map(|msg| view! { <p class="form-error">{msg}</p> })}

                <button type="submit" class="primary-button" disabled=move || pending.get()>
                    {move || kind.submit_label(pending.get())}
                </button>
            </form>
            <p class="auth-switch">
                {switch_prompt}
                <button class="link-button" on:click=move |_| on_navigate.run(switch_page)>
                    {switch_label}
                </button>
            </p>
        </section>
    }
}
