//! Grid of past generations, newest first.

use leptos::prelude::*;

use gatis::HistoryEntry;

const PREVIEW_CHARS: usize = 60;

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let cut: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

#[component]
pub fn HistoryGrid(
    history: Signal<Vec<HistoryEntry>>,
    #[prop(into)] on_reuse: Callback<HistoryEntry>,
) -> impl IntoView {
    view! {
        <div class="history-section">
            <h2 class="section-title">"History"</h2>
            {move || {
                let entries = history.get();
                if entries.is_empty() {
                    view! {
                        <p class="history-empty">"No generated images yet. Try creating one!"</p>
                    }.into_any()
                } else {
                    view! {
                        <div class="history-grid">
                            {entries.into_iter().map(|entry| {
                                view! { <HistoryCard entry=entry on_reuse=on_reuse /> }
                            }).collect_view()}
                        </div>
                    }.into_any()
                }
            }}
        </div>
    }
}

#[component]
fn HistoryCard(entry: HistoryEntry, #[prop(into)] on_reuse: Callback<HistoryEntry>) -> impl IntoView {
    let created = entry.created_at.format("%Y-%m-%d %H:%M").to_string();
    let full_text = entry.prompt_text.clone();
    let display_text = preview(&entry.prompt_text);
    let src = entry.result_location.clone();

    view! {
        <div class="history-card">
            <img class="history-image" alt="Generated" src=src />
            <p class="history-prompt" title=full_text>{display_text}</p>
            <div class="history-meta">
                <span class="history-time">{created}</span>
                <button
                    class="history-btn reuse-btn"
                    title="Use this prompt again"
                    on:click=move |_| on_reuse.run(entry.clone())
                >
                    "Reuse"
                </button>
            </div>
        </div>
    }
}
