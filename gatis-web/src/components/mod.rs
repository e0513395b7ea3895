pub mod auth_form;
pub mod history_grid;
pub mod prompt_form;
pub mod result_view;
pub mod toast;
