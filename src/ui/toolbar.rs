use dioxus::prelude::*;
use std::path::PathBuf;

use crate::state::merge::{MergeOutcome, MergeRejection};
use crate::state::table_state::TableState;
use crate::ui::actions;
use crate::ui::app::Page;

#[component]
pub fn Toolbar(
    data: Signal<TableState>,
    file_path: Signal<Option<PathBuf>>,
    error_message: Signal<Option<String>>,
    save_success: Signal<bool>,
    page: Signal<Page>,
    preview_buffer: Signal<PathBuf>,
) -> Element {
    let snapshot = data.read().clone();
    let can_undo = snapshot.can_undo();
    let can_redo = snapshot.can_redo();
    let can_merge = snapshot.can_merge();
    let selection = snapshot.selection().clone();
    let single_anchor = selection.len() == 1
        && selection
            .iter()
            .next()
            .is_some_and(|key| snapshot.merges().get(*key).is_some());
    let selected_row = selection.iter().next().map(|key| key.row);
    let selected_column = selection.iter().next().map(|key| key.column);
    let has_sort = snapshot.sort_spec().is_some();
    let has_filters = !snapshot.filters().is_empty();
    let search_query_value = snapshot.search_query().to_string();
    let full_screen = snapshot.is_full_screen();

    rsx! {
        div { class: "toolbar",
            // File group
            div { class: "toolbar-group",
                button {
                    class: "toolbar-btn",
                    id: "btn-open",
                    onclick: move |_| {
                        spawn(async move {
                            actions::open_file(data, file_path, error_message).await;
                        });
                    },
                    "\u{1F4C2} Open"
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-save",
                    onclick: move |_| {
                        data.with_mut(|state| {
                            state.commit_edit();
                        });
                        spawn(async move {
                            if actions::save_file(data, file_path, error_message).await {
                                save_success.set(true);
                                tokio::time::sleep(std::time::Duration::from_secs(2)).await;
                                save_success.set(false);
                            }
                        });
                    },
                    "\u{1F4BE} Save"
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-preview",
                    onclick: move |_| {
                        data.with_mut(|state| {
                            state.commit_edit();
                        });
                        actions::open_preview(data, page, preview_buffer, error_message);
                    },
                    "\u{1F5B6} Preview"
                }
                if *save_success.read() {
                    span { class: "save-success", "\u{2714} Saved" }
                }
            }
            div { class: "toolbar-separator" }

            // Edit group
            div { class: "toolbar-group",
                button {
                    class: "toolbar-btn",
                    id: "btn-undo",
                    disabled: !can_undo,
                    onclick: move |_| {
                        if data.with_mut(|state| state.undo()) {
                            error_message.set(None);
                        }
                    },
                    "\u{21A9} Undo"
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-redo",
                    disabled: !can_redo,
                    onclick: move |_| {
                        if data.with_mut(|state| state.redo()) {
                            error_message.set(None);
                        }
                    },
                    "\u{21AA} Redo"
                }
            }
            div { class: "toolbar-separator" }

            // Row/Column group
            div { class: "toolbar-group",
                button {
                    class: "toolbar-btn",
                    id: "btn-add-row",
                    onclick: move |_| {
                        data.with_mut(|state| {
                            state.add_row(None);
                        });
                        error_message.set(None);
                    },
                    "\u{2795} Add Row"
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-add-column",
                    onclick: move |_| {
                        data.with_mut(|state| {
                            state.add_column(None);
                        });
                        error_message.set(None);
                    },
                    "\u{2795} Add Column"
                }
                button {
                    class: "toolbar-btn toolbar-btn-danger",
                    id: "btn-delete-row",
                    disabled: selected_row.is_none(),
                    onclick: move |_| {
                        if let Some(row) = selected_row {
                            data.with_mut(|state| state.remove_row(row));
                        }
                    },
                    "\u{1F5D1} Delete Row"
                }
                button {
                    class: "toolbar-btn toolbar-btn-danger",
                    id: "btn-delete-column",
                    disabled: selected_column.is_none(),
                    onclick: move |_| {
                        if let Some(column) = selected_column {
                            data.with_mut(|state| state.remove_column(column));
                        }
                    },
                    "\u{1F5D1} Delete Column"
                }
            }
            div { class: "toolbar-separator" }

            // Merge group
            div { class: "toolbar-group",
                button {
                    class: "toolbar-btn",
                    id: "btn-merge",
                    disabled: !can_merge,
                    onclick: move |_| {
                        let outcome = data.with_mut(|state| state.merge_selection());
                        error_message.set(merge_feedback(outcome));
                    },
                    "\u{25A3} Merge"
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-unmerge",
                    disabled: !single_anchor,
                    onclick: move |_| {
                        let outcome = data.with_mut(|state| state.unmerge_selection());
                        error_message.set(merge_feedback(outcome));
                    },
                    "\u{25A2} Unmerge"
                }
            }
            div { class: "toolbar-separator" }

            // View group
            div { class: "toolbar-group",
                input {
                    class: "toolbar-input",
                    id: "input-search-query",
                    placeholder: "Search all cells",
                    value: "{search_query_value}",
                    oninput: move |evt| {
                        let query = evt.value();
                        data.with_mut(|state| {
                            state.set_search(query);
                        });
                    }
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-clear-filters",
                    disabled: !has_filters,
                    onclick: move |_| {
                        data.with_mut(|state| state.clear_filters());
                    },
                    "\u{2715} Clear Filters"
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-clear-sort",
                    disabled: !has_sort,
                    onclick: move |_| {
                        data.with_mut(|state| state.clear_sort());
                    },
                    "\u{2195} Clear Sort"
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-full-screen",
                    onclick: move |_| {
                        data.with_mut(|state| {
                            state.toggle_full_screen();
                        });
                    },
                    if full_screen { "\u{2199} Exit Full Screen" } else { "\u{2197} Full Screen" }
                }
            }

            // Info area (right-aligned)
            div { class: "toolbar-info",
                if !selection.is_empty() {
                    span { class: "toolbar-label", id: "label-selection", "{selection.len()} selected" }
                }
                if let Some(path) = file_path.read().as_ref() {
                    span { class: "file-path", "{path.display()}" }
                }
                if let Some(err) = error_message.read().as_ref() {
                    span { class: "error-message", "{err}" }
                }
            }
        }
    }
}

fn merge_feedback(outcome: MergeOutcome) -> Option<String> {
    let MergeOutcome::Rejected(reason) = outcome else {
        return None;
    };
    let message = match reason {
        MergeRejection::TooFewCells => "Select at least two cells to merge",
        MergeRejection::UnknownCell => "Selection refers to a removed cell",
        MergeRejection::NotRectangle => "Selected cells must form a full rectangle",
        MergeRejection::OverlapsRegion => "Selection overlaps an existing merged cell",
        MergeRejection::SelectionSize => "Select exactly one merged cell to unmerge",
        MergeRejection::NotAnAnchor => "The selected cell is not merged",
        MergeRejection::SortedView => "Clear the sort before merging cells",
    };
    Some(message.to_string())
}
