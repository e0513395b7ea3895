mod app;
mod components;
mod services;

fn main() {
    // Library tracing events are forwarded to `log`, which prints to the console.
    if console_log::init_with_level(log::Level::Debug).is_err() {
        web_sys::console::warn_1(&"Console logger already initialized".into());
    }
    leptos::mount::mount_to_body(app::App);
}
