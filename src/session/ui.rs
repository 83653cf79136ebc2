use bevy::{prelude::*, window::PrimaryWindow};
use bevy_egui::{
    EguiContexts,
    egui::{self, Align2, Color32, CornerRadius, RichText},
};

use crate::{
    pipeline::Severity,
    types::{CategorySelection, FEATURE_CATEGORIES},
};

use super::{ExplorerWorker, Session, SessionCommand};

const TOP_BAR_HEIGHT: f32 = 36.0;
const SIDEBAR_WIDTH: f32 = 190.0;

fn panel_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(Color32::from_rgba_premultiplied(30, 30, 30, 255))
        .inner_margin(8.0)
        .shadow(egui::epaint::Shadow {
            color: Color32::from_black_alpha(60),
            offset: [5, 5],
            blur: 10,
            spread: 5,
        })
}

/// Search field, search button and the three display toggles.
pub fn search_bar_ui(
    mut contexts: EguiContexts,
    mut session: ResMut<Session>,
    mut commands: EventWriter<SessionCommand>,
) {
    let ctx = contexts.ctx_mut();
    let width = ctx.screen_rect().width();

    egui::Area::new("search_bar".into())
        .anchor(Align2::CENTER_TOP, [0.0, 0.0])
        .show(ctx, |ui| {
            panel_frame()
                .corner_radius(CornerRadius {
                    nw: 0,
                    ne: 0,
                    sw: 10,
                    se: 10,
                })
                .show(ui, |ui| {
                    ui.set_width(width - 16.0);
                    ui.set_height(TOP_BAR_HEIGHT - 16.0);
                    ui.horizontal_centered(|ui| {
                        ui.label("Search Location:");
                        let field = ui.add(
                            egui::TextEdit::singleline(&mut session.state.search_text)
                                .hint_text("City, county or country")
                                .desired_width(260.0),
                        );
                        let submitted =
                            field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                        if ui.button("Search").clicked() || submitted {
                            commands.write(SessionCommand::Search);
                        }

                        ui.separator();
                        let toggles = &mut session.state.toggles;
                        let mut changed = false;
                        changed |= ui.checkbox(&mut toggles.polygons, "Polygons").changed();
                        changed |= ui.checkbox(&mut toggles.lines, "Lines").changed();
                        changed |= ui.checkbox(&mut toggles.points, "Points").changed();
                        if changed {
                            commands.write(SessionCommand::Redraw);
                        }
                    });
                });
        });
}

/// Category list, custom tag entry and the update button.
pub fn features_sidebar_ui(
    mut contexts: EguiContexts,
    mut session: ResMut<Session>,
    mut commands: EventWriter<SessionCommand>,
    worker: Res<ExplorerWorker>,
) {
    let busy = worker.is_busy();
    let ctx = contexts.ctx_mut();
    let height = ctx.screen_rect().height() - TOP_BAR_HEIGHT - 20.0;

    egui::Area::new("features".into())
        .fixed_pos(egui::pos2(10.0, TOP_BAR_HEIGHT + 10.0))
        .show(ctx, |ui| {
            panel_frame().corner_radius(10.0).show(ui, |ui| {
                ui.set_width(SIDEBAR_WIDTH);
                ui.set_max_height(height);
                ui.heading(RichText::new("Features").color(Color32::WHITE));
                ui.separator();

                let state = &mut session.state;
                let mut selected = state.category().clone();
                egui::ScrollArea::vertical()
                    .max_height(height - 140.0)
                    .show(ui, |ui| {
                        ui.radio_value(&mut selected, CategorySelection::Boundary, "Boundary");
                        for (label, key) in FEATURE_CATEGORIES {
                            ui.radio_value(&mut selected, CategorySelection::tag(key), label);
                        }
                        ui.radio_value(&mut selected, CategorySelection::Custom, "Custom Tag");
                    });
                if &selected != state.category() {
                    state.select_category(selected);
                }

                ui.add_enabled(
                    state.category().is_custom(),
                    egui::TextEdit::singleline(&mut state.custom_tag).hint_text("tag key"),
                );

                ui.separator();
                let phase = state.phase();
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(!busy, egui::Button::new("Update View"))
                        .clicked()
                    {
                        commands.write(SessionCommand::Update);
                    }
                    if busy {
                        ui.spinner();
                    }
                });
                ui.label(RichText::new(phase.label()).small().color(Color32::GRAY));
            });
        });
}

/// Blocking notice. Nothing else can be clicked until it is dismissed.
pub fn notice_ui(mut contexts: EguiContexts, mut session: ResMut<Session>) {
    let Some(notice) = session.notice.clone() else {
        return;
    };
    let ctx = contexts.ctx_mut();

    egui::Area::new("notice_backdrop".into())
        .anchor(Align2::LEFT_TOP, [0.0, 0.0])
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            let rect = ui.ctx().screen_rect();
            ui.allocate_rect(rect, egui::Sense::click());
            ui.painter()
                .rect_filled(rect, 0.0, Color32::from_black_alpha(120));
        });

    let color = match notice.severity {
        Severity::Info => Color32::LIGHT_BLUE,
        Severity::Error => Color32::LIGHT_RED,
    };
    egui::Window::new(RichText::new(&notice.title).color(color))
        .id("notice".into())
        .collapsible(false)
        .resizable(false)
        .order(egui::Order::Tooltip)
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(&notice.body);
            ui.vertical_centered(|ui| {
                if ui.button("OK").clicked() {
                    session.dismiss_notice();
                }
            });
        });
}

pub fn sync_window_title(
    session: Res<Session>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    if !session.is_changed() {
        return;
    }
    if let Ok(mut window) = windows.single_mut() {
        if window.title != session.state.title() {
            window.title = session.state.title().to_string();
        }
    }
}
