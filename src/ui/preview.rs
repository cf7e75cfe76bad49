use dioxus::prelude::*;
use std::path::PathBuf;

use crate::io::preview;
use crate::state::table_state::TableState;
use crate::ui::app::Page;

/// Print view of the table handed over through the preview buffer.
#[component]
pub fn Preview(page: Signal<Page>, preview_buffer: Signal<PathBuf>) -> Element {
    let loaded = use_hook(|| {
        let path = preview_buffer.read().clone();
        match preview::take_transfer(&path) {
            Ok(snapshot) => Ok(snapshot.map(|snapshot| snapshot.into_state())),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "preview buffer unreadable");
                Err(err.to_string())
            }
        }
    });

    let body = match &loaded {
        Err(err) => rsx! { p { class: "error-message", "Error parsing table data: {err}" } },
        Ok(None) => rsx! { p { class: "empty-message", "No table data provided." } },
        Ok(Some(state)) => rsx! { PreviewTable { state: state.clone() } },
    };

    rsx! {
        div { class: "preview-page",
            div { class: "preview-actions",
                button {
                    class: "toolbar-btn",
                    id: "btn-back",
                    onclick: move |_| page.set(Page::Editor),
                    "\u{2190} Back to editor"
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-print",
                    onclick: move |_| {
                        let _ = document::eval("window.print();");
                    },
                    "\u{1F5A8} Print"
                }
            }
            h1 { "Table Preview" }
            {body}
        }
    }
}

#[component]
fn PreviewTable(state: TableState) -> Element {
    let table = state.table();
    let columns: Vec<String> = table
        .columns()
        .iter()
        .map(|column| table.column_label(*column).unwrap_or_default().to_string())
        .collect();
    let rows = state.project();

    rsx! {
        table { class: "preview-table",
            thead {
                tr {
                    for label in columns {
                        th { "{label}" }
                    }
                }
            }
            tbody {
                for row in rows {
                    tr {
                        for cell in row.cells.into_iter().filter(|cell| cell.visible) {
                            td {
                                rowspan: "{cell.row_span}",
                                colspan: "{cell.col_span}",
                                "{cell.content}"
                            }
                        }
                    }
                }
            }
        }
    }
}
