use eframe::egui::{self, Context, Pos2};

use crate::editor::{FieldId, SettingsEditor};
use crate::gui::theme::*;
use crate::gui::widgets;
use crate::settings::{Settings, Slot};

pub const EDITOR_TITLE: &str = "Volume Changer Settings";

/// What the user did in the editor this frame
#[derive(Debug)]
pub enum EditorAction {
    None,
    Saved(Settings),
    Close,
}

/// Where to put the editor so it is centered on a monitor of this size
pub fn centered_position(monitor: Option<egui::Vec2>) -> Option<Pos2> {
    let monitor = monitor?;
    let min = (monitor - EDITOR_SIZE) / 2.0;
    Some(egui::pos2(min.x.max(0.0), min.y.max(0.0)))
}

/// Draw the settings editor viewport
pub fn show_settings(
    ctx: &Context,
    editor: &mut SettingsEditor,
    position: Option<Pos2>,
) -> EditorAction {
    let mut builder = egui::ViewportBuilder::default()
        .with_title(EDITOR_TITLE)
        .with_inner_size(EDITOR_SIZE)
        .with_decorations(false)
        .with_resizable(false)
        .with_maximize_button(false)
        .with_always_on_top();
    if let Some(pos) = position {
        builder = builder.with_position(pos);
    }

    ctx.show_viewport_immediate(
        egui::ViewportId::from_hash_of("settings_viewport"),
        builder,
        |ctx, _class| {
            // OS close (Alt+F4) behaves like Cancel
            if ctx.input(|i| i.viewport().close_requested()) {
                return EditorAction::Close;
            }

            let frame = egui::Frame::central_panel(&ctx.style()).inner_margin(0.0);
            let action = egui::CentralPanel::default()
                .frame(frame)
                .show(ctx, |ui| {
                    if widgets::title_bar(ui, ctx, EDITOR_TITLE) {
                        return EditorAction::Close;
                    }

                    let mut action = EditorAction::None;
                    let enabled = editor.error.is_none();
                    egui::Frame::none()
                        .inner_margin(egui::Margin::same(16.0))
                        .show(ui, |ui| {
                            ui.add_enabled_ui(enabled, |ui| {
                                action = editor_body(ui, editor);
                            });
                        });
                    action
                })
                .inner;

            // Save failures stay on top of the editor until dismissed
            if let Some(message) = editor.error.clone() {
                if widgets::error_dialog(ctx, "Error", &message) {
                    editor.error = None;
                }
            }
            action
        },
    )
}

fn editor_body(ui: &mut egui::Ui, editor: &mut SettingsEditor) -> EditorAction {
    let mut clicked_field = None;
    let mut over_field = false;

    egui::Grid::new("hotkey_grid")
        .num_columns(4)
        .spacing([12.0, 10.0])
        .striped(true)
        .show(ui, |ui| {
            ui.strong("Application");
            for slot in Slot::ALL {
                ui.strong(slot.title());
            }
            ui.end_row();

            for row in 0..editor.rows.len() {
                if editor.rows[row].is_focused() {
                    ui.label(&editor.rows[row].app_name);
                } else {
                    ui.add(
                        egui::TextEdit::singleline(&mut editor.rows[row].app_name)
                            .desired_width(140.0),
                    );
                }

                for slot in Slot::ALL {
                    let field = FieldId { row, slot };
                    let capturing = editor.capturing() == Some(field);
                    let text = editor.field_text(field).to_string();
                    let response = widgets::hotkey_field(ui, &text, capturing);
                    over_field |= response.hovered();
                    if response.clicked() {
                        clicked_field = Some(field);
                    }
                }
                ui.end_row();
            }
        });

    if let Some(field) = clicked_field {
        editor.begin_capture(field);
    } else if editor.capturing().is_some()
        && !over_field
        && ui.input(|i| i.pointer.any_pressed())
    {
        editor.click_away();
    }

    ui.add_space(16.0);
    ui.checkbox(&mut editor.overlay_enabled, "Show Volume Overlay");
    ui.add_space(16.0);

    let mut action = EditorAction::None;
    ui.horizontal(|ui| {
        if ui.button("Save").clicked() {
            if let Ok(saved) = editor.save() {
                action = EditorAction::Saved(saved);
            }
        }
        if ui.button("Reset to Defaults").clicked() {
            editor.reset_to_defaults();
        }
        if ui.button("Cancel").clicked() {
            action = EditorAction::Close;
        }
    });
    action
}
