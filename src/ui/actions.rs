use dioxus::prelude::*;
use std::path::{Path, PathBuf};

use crate::io::{import, preview, records};
use crate::state::table_state::TableState;
use crate::ui::app::Page;

pub async fn open_file(
    mut data: Signal<TableState>,
    mut file_path: Signal<Option<PathBuf>>,
    mut error_message: Signal<Option<String>>,
) {
    let task = rfd::AsyncFileDialog::new()
        .add_filter("JSON", &["json"])
        .pick_file()
        .await;

    if let Some(handle) = task {
        let path = handle.path().to_path_buf();
        match import::load_table(&path) {
            Ok(state) => {
                data.set(state);
                file_path.set(Some(path));
                error_message.set(None);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "open failed");
                error_message.set(Some(e.to_string()));
            }
        }
    }
}

/// Writes the row records to the current file, asking for one first when the
/// table was never opened from or saved to disk. Returns whether it saved.
pub async fn save_file(
    data: Signal<TableState>,
    mut file_path: Signal<Option<PathBuf>>,
    mut error_message: Signal<Option<String>>,
) -> bool {
    let current = file_path.read().clone();
    let path = match current {
        Some(path) => path,
        None => {
            let Some(handle) = rfd::AsyncFileDialog::new()
                .add_filter("JSON", &["json"])
                .set_file_name("policy-table.json")
                .save_file()
                .await
            else {
                return false;
            };
            handle.path().to_path_buf()
        }
    };

    let export = {
        let state = data.read();
        records::export_records(&state)
    };
    if let Err(err) = records::save_records(&path, &export) {
        tracing::warn!(path = %path.display(), error = %err, "save failed");
        error_message.set(Some(err.to_string()));
        return false;
    }

    file_path.set(Some(path));
    error_message.set(None);
    true
}

pub fn open_preview(
    data: Signal<TableState>,
    mut page: Signal<Page>,
    preview_buffer: Signal<PathBuf>,
    mut error_message: Signal<Option<String>>,
) {
    let path = preview_buffer.read().clone();
    if let Err(err) = write_preview(&data.read(), &path) {
        error_message.set(Some(err));
        return;
    }
    error_message.set(None);
    page.set(Page::Preview);
}

fn write_preview(state: &TableState, path: &Path) -> Result<(), String> {
    preview::write_transfer(path, state).map_err(|err| {
        tracing::warn!(path = %path.display(), error = %err, "preview buffer write failed");
        err.to_string()
    })
}
