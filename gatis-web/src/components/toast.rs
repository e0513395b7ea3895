//! Toast notifications.

use leptos::prelude::*;
use leptos::task::spawn_local;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastType {
    Error,
    Info,
}

impl ToastType {
    fn class(&self) -> &'static str {
        match self {
            ToastType::Error => "toast toast-error",
            ToastType::Info => "toast toast-info",
        }
    }

    /// Errors stay up longer so the server's message can be read.
    fn lifetime_ms(&self) -> u32 {
        match self {
            ToastType::Error => 8000,
            ToastType::Info => 4000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToastMessage {
    pub id: usize,
    pub message: String,
    pub toast_type: ToastType,
}

static TOAST_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Push a toast that dismisses itself after its type's lifetime.
pub fn show_toast(toasts: RwSignal<Vec<ToastMessage>>, message: &str, toast_type: ToastType) {
    let id = TOAST_COUNTER.fetch_add(1, Ordering::Relaxed);
    toasts.update(|t| {
        t.push(ToastMessage {
            id,
            message: message.to_string(),
            toast_type,
        })
    });

    spawn_local(async move {
        gloo_timers::future::TimeoutFuture::new(toast_type.lifetime_ms()).await;
        toasts.update(|t| t.retain(|m| m.id != id));
    });
}

#[component]
pub fn ToastContainer(
    toasts: Signal<Vec<ToastMessage>>,
    #[prop(into)] on_dismiss: Callback<usize>,
) -> impl IntoView {
    view! {
        <div class="toast-container" role="status">
            {move || toasts.get().into_iter().map(|toast| {
                let id = toast.id;
                view! {
                    <div class=toast.toast_type.class()>
                        <span class="toast-message">{toast.message}</span>
                        <button class="toast-dismiss" on:click=move |_| on_dismiss.run(id)>
                            "Dismiss"
                        </button>
                    </div>
                }
            }).collect_view()}
        </div>
    }
}
