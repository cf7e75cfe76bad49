use dioxus::prelude::{Key, *};

use crate::state::data_model::{CellKey, ColumnId, RowId};
use crate::state::projection::{ProjectedCell, ProjectedRow, SortOrder};
use crate::state::table_state::{Interaction, SortOutcome, SortRejection, TableState};

#[derive(Clone, PartialEq)]
struct HeaderColumn {
    index: usize,
    id: ColumnId,
    label: String,
    width: f64,
    sort: Option<SortOrder>,
    sort_blocked: bool,
    filter: String,
}

#[component]
pub fn Table(data: Signal<TableState>, error_message: Signal<Option<String>>) -> Element {
    let snapshot = data.read().clone();
    let table = snapshot.table();
    let rows = snapshot.project();

    if table.columns().is_empty() && table.rows().is_empty() {
        return rsx! {
            p { class: "empty-message", id: "empty-message",
                "The table is empty. Use \"Add Row\" and \"Add Column\" or open a file."
            }
        };
    }

    let headers: Vec<HeaderColumn> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(index, id)| HeaderColumn {
            index,
            id: *id,
            label: table.column_label(*id).unwrap_or_default().to_string(),
            width: snapshot.column_width(*id),
            sort: snapshot
                .sort_spec()
                .filter(|spec| spec.column == *id)
                .map(|spec| spec.order),
            sort_blocked: snapshot.merges().blocks_sort(*id),
            filter: snapshot.filter_for(*id).to_string(),
        })
        .collect();
    let resizing = matches!(snapshot.interaction(), Interaction::ResizingColumn { .. });
    let container_class = if resizing {
        "table-container resizing"
    } else {
        "table-container"
    };

    rsx! {
        div {
            class: "{container_class}",
            id: "table-container",
            onmousemove: move |evt| {
                if resizing {
                    let x = evt.client_coordinates().x;
                    data.with_mut(|state| {
                        state.resize_to(x);
                    });
                }
            },
            onmouseup: move |_| {
                if resizing {
                    data.with_mut(|state| state.end_resize());
                }
            },
            table {
                thead {
                    tr {
                        th { class: "row-number", "#" }
                        for header in headers.iter().cloned() {
                            HeaderCell { header, data, error_message }
                        }
                    }
                    tr { class: "filter-row",
                        th { class: "row-number" }
                        for header in headers.iter().cloned() {
                            th { key: "filter-{header.index}",
                                input {
                                    class: "filter-input",
                                    id: "filter-{header.index}",
                                    placeholder: "Filter",
                                    value: "{header.filter}",
                                    oninput: move |evt| {
                                        let needle = evt.value();
                                        data.with_mut(|state| state.set_filter(header.id, needle));
                                    }
                                }
                            }
                        }
                    }
                }
                tbody {
                    for (display_index, row) in rows.into_iter().enumerate() {
                        TableRow { display_index, row, data, error_message }
                    }
                }
            }
        }
    }
}

#[component]
fn HeaderCell(
    header: HeaderColumn,
    data: Signal<TableState>,
    error_message: Signal<Option<String>>,
) -> Element {
    let index = header.index;
    let column = header.id;
    let sort_class = match header.sort {
        Some(SortOrder::Asc) => "sorted-asc",
        Some(SortOrder::Desc) => "sorted-desc",
        None => "",
    };
    let sort_glyph = match header.sort {
        Some(SortOrder::Asc) => "\u{25B2}",
        Some(SortOrder::Desc) => "\u{25BC}",
        None => "\u{21C5}",
    };
    let sort_title = if header.sort_blocked {
        "Sorting is disabled while this column has merged cells"
    } else {
        "Sort"
    };

    rsx! {
        th {
            class: "column-header {sort_class}",
            id: "col-{index}",
            style: "width: {header.width}px; min-width: {header.width}px;",
            draggable: "true",
            ondragstart: move |_| {
                data.with_mut(|state| state.begin_column_drag(index));
            },
            ondragover: move |evt| {
                evt.prevent_default();
            },
            ondrop: move |evt| {
                evt.prevent_default();
                data.with_mut(|state| state.drop_column(index));
            },
            ondragend: move |_| {
                data.with_mut(|state| state.cancel_column_drag());
            },
            div { class: "header-content",
                input {
                    class: "header-input",
                    id: "col-label-{index}",
                    value: "{header.label}",
                    onchange: move |evt| {
                        let label = evt.value();
                        let renamed = data.with_mut(|state| state.rename_column(column, &label));
                        if renamed {
                            error_message.set(None);
                        } else {
                            error_message.set(Some(format!("Column label \"{}\" is not available", label.trim())));
                        }
                    }
                }
                button {
                    class: "header-btn",
                    id: "col-sort-{index}",
                    disabled: header.sort_blocked,
                    title: "{sort_title}",
                    onclick: move |_| {
                        let outcome = data.with_mut(|state| state.cycle_sort(column));
                        if let SortOutcome::Rejected(reason) = outcome {
                            error_message.set(Some(sort_feedback(reason).to_string()));
                        }
                    },
                    "{sort_glyph}"
                }
                button {
                    class: "header-btn header-btn-danger",
                    id: "col-delete-{index}",
                    onclick: move |_| {
                        data.with_mut(|state| state.remove_column(column));
                    },
                    "\u{2715}"
                }
            }
            div {
                class: "resize-handle",
                onmousedown: move |evt| {
                    evt.stop_propagation();
                    let x = evt.client_coordinates().x;
                    data.with_mut(|state| state.begin_resize(column, x));
                },
            }
        }
    }
}

#[component]
fn TableRow(
    display_index: usize,
    row: ProjectedRow,
    data: Signal<TableState>,
    error_message: Signal<Option<String>>,
) -> Element {
    let row_id = row.row;
    let row_class = if display_index % 2 == 0 { "even" } else { "odd" };

    rsx! {
        tr { class: "{row_class}", id: "row-{display_index}",
            td { class: "row-number",
                div { class: "row-header",
                    input {
                        class: "row-input",
                        id: "row-label-{display_index}",
                        value: "{row.label}",
                        onchange: move |evt| {
                            let label = evt.value();
                            let renamed = data.with_mut(|state| state.rename_row(row_id, &label));
                            if renamed {
                                error_message.set(None);
                            } else {
                                error_message.set(Some(format!("Row label \"{}\" is not available", label.trim())));
                            }
                        }
                    }
                    button {
                        class: "header-btn header-btn-danger",
                        id: "row-delete-{display_index}",
                        onclick: move |_| {
                            data.with_mut(|state| state.remove_row(row_id));
                        },
                        "\u{2715}"
                    }
                }
            }
            for cell in row.cells.into_iter().filter(|cell| cell.visible) {
                GridCell { cell, data }
            }
        }
    }
}

#[component]
fn GridCell(cell: ProjectedCell, data: Signal<TableState>) -> Element {
    let key = cell.key();
    let snapshot = data.read();
    let draft = snapshot
        .editing()
        .filter(|edit| edit.cell == key)
        .map(|edit| edit.draft.clone());
    let selected = snapshot.selection().contains(&key);
    drop(snapshot);
    let cell_id = cell_dom_id("cell", cell.row, cell.column);
    let input_id = cell_dom_id("cell-input", cell.row, cell.column);

    if let Some(draft) = draft {
        return rsx! {
            td {
                class: "editing-cell",
                rowspan: "{cell.row_span}",
                colspan: "{cell.col_span}",
                input {
                    class: "cell-input",
                    id: "{input_id}",
                    value: "{draft}",
                    autofocus: true,
                    oninput: move |evt| {
                        let value = evt.value();
                        data.with_mut(|state| state.update_draft(value));
                    },
                    onblur: move |_| {
                        data.with_mut(|state| state.commit_edit());
                    },
                    onkeydown: move |evt| {
                        match evt.key() {
                            Key::Enter => {
                                data.with_mut(|state| state.commit_edit());
                            }
                            Key::Escape => {
                                data.with_mut(|state| state.cancel_edit());
                            }
                            _ => {}
                        }
                    }
                }
            }
        };
    }

    rsx! {
        td {
            class: cell_class(&cell, selected),
            id: "{cell_id}",
            rowspan: "{cell.row_span}",
            colspan: "{cell.col_span}",
            onclick: move |evt| {
                let modifiers = evt.modifiers();
                data.with_mut(|state| {
                    if modifiers.contains(Modifiers::SHIFT) {
                        state.select_range(key);
                    } else {
                        let additive = modifiers.intersects(Modifiers::CONTROL | Modifiers::META);
                        state.select_cell(key, additive);
                    }
                });
            },
            ondoubleclick: move |_| {
                data.with_mut(|state| state.begin_edit(key));
            },
            "{cell.content}"
        }
    }
}

fn cell_class(cell: &ProjectedCell, selected: bool) -> String {
    let mut class = String::from("cell");
    if cell.row_span > 1 || cell.col_span > 1 {
        class.push_str(" merged-cell");
    }
    if cell.search_match {
        class.push_str(" search-match");
    }
    if selected {
        class.push_str(" selected-cell");
    }
    class
}

fn sort_feedback(reason: SortRejection) -> &'static str {
    match reason {
        SortRejection::UnknownColumn => "That column no longer exists",
        SortRejection::MergedColumn => "Unmerge the cells in this column before sorting it",
    }
}

fn cell_dom_id(prefix: &str, row: RowId, column: ColumnId) -> String {
    let key = CellKey::new(row, column);
    format!("{prefix}-{:?}-{:?}", key.row, key.column)
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' { ch } else { '_' })
        .collect()
}
