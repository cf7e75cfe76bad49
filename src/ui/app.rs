use dioxus::prelude::*;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::io::import;
use crate::state::table_state::TableState;
use crate::ui::preview::Preview;
use crate::ui::table::Table;
use crate::ui::toolbar::Toolbar;

const STYLES: Asset = asset!("/assets/styles.css");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Editor,
    Preview,
}

#[component]
pub fn App() -> Element {
    let config = try_use_context::<AppConfig>().unwrap_or_else(AppConfig::from_env);
    let data = use_signal(TableState::new);
    let file_path = use_signal::<Option<PathBuf>>(|| None);
    let error_message = use_signal::<Option<String>>(|| None);
    let save_success = use_signal(|| false);
    let page = use_signal(|| Page::Editor);
    let preview_buffer = use_signal(|| config.preview_buffer.clone());

    use_effect({
        let mut data = data;
        let mut file_path = file_path;
        let mut error_message = error_message;
        let open_path = config.open_path.clone();
        move || {
            let Some(path) = open_path.clone() else {
                return;
            };
            match import::load_table(&path) {
                Ok(state) => {
                    data.set(state);
                    file_path.set(Some(path));
                    error_message.set(None);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "startup table failed to load");
                    error_message.set(Some(e.to_string()));
                }
            }
        }
    });

    let full_screen = data.read().is_full_screen();
    let app_class = if full_screen { "app full-screen" } else { "app" };

    rsx! {
        document::Stylesheet { href: STYLES }
        match *page.read() {
            Page::Editor => rsx! {
                div { class: "{app_class}",
                    Toolbar { data, file_path, error_message, save_success, page, preview_buffer }
                    Table { data, error_message }
                }
            },
            Page::Preview => rsx! {
                Preview { page, preview_buffer }
            },
        }
    }
}
