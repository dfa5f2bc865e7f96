use eframe::egui::{self, Align, Layout, Ui};

use crate::util::truncate_label;

use super::super::ViewModel;

const REPULSION_RANGE: std::ops::RangeInclusive<f32> = -5_000.0..=5_000.0;

fn tuning_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: std::ops::RangeInclusive<f32>,
    text: &str,
    hover: &str,
) -> bool {
    ui.add(
        egui::Slider::new(value, range)
            .text(text)
            .clamping(egui::SliderClamping::Always),
    )
    .on_hover_text(hover)
    .changed()
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        self.draw_search(ui);
        ui.separator();
        self.draw_simulation_controls(ui);
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label("Search (title, channel or id)")
            .on_hover_text("Fuzzy-highlight matching nodes on the canvas.");
        ui.text_edit_singleline(&mut self.search)
            .on_hover_text("Type to highlight matching nodes, then click a result to select it.");

        let results = self.ranked_search_results(Self::SEARCH_RESULT_ROWS);
        if self.search.trim().is_empty() {
            return;
        }
        if results.is_empty() {
            ui.small("No matching nodes.");
            return;
        }

        let selected_index = self.interaction.selection().node_index();
        let mut activated = None;

        egui::ScrollArea::vertical()
            .id_salt("search_results_scroll")
            .max_height(220.0)
            .auto_shrink([false, true])
            .show_rows(ui, 22.0, results.len(), |ui, row_range| {
                for row in row_range {
                    let Some(&index) = results.get(row) else {
                        continue;
                    };
                    let Some(node) = self.payload.nodes.get(index) else {
                        continue;
                    };

                    let clicked = ui
                        .horizontal(|ui| {
                            let clicked = ui
                                .selectable_label(
                                    selected_index == Some(index),
                                    truncate_label(node.label(), 36),
                                )
                                .on_hover_text(node.id.as_str())
                                .clicked();
                            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                ui.small(node.node_type().label());
                            });
                            clicked
                        })
                        .inner;

                    if clicked {
                        activated = Some(index);
                    }
                }
            });

        if let Some(index) = activated {
            self.activate_node(index);
        }
    }

    fn draw_simulation_controls(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label(format!("Simulation: {}", self.simulation.phase().label()));
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.small(format!("alpha {:.3}", self.simulation.alpha()));
            });
        });

        ui.horizontal(|ui| {
            let mut paused = self.simulation.is_user_paused();
            if ui
                .checkbox(&mut paused, "Pause")
                .on_hover_text("Freeze the layout without losing its energy.")
                .changed()
            {
                self.set_paused(paused);
            }

            if ui
                .button("Reheat")
                .on_hover_text("Restart the layout from its current positions.")
                .clicked()
            {
                self.simulation.reheat();
            }
        });

        ui.add_space(4.0);
        let mut changed = false;
        changed |= tuning_slider(
            ui,
            &mut self.config.video_repulsion,
            REPULSION_RANGE,
            "Video strength",
            "Many-body strength of video nodes. Negative values push neighbours away.",
        );
        changed |= tuning_slider(
            ui,
            &mut self.config.user_repulsion,
            REPULSION_RANGE,
            "User strength",
            "Many-body strength of user nodes. Negative values push neighbours away.",
        );

        ui.collapsing("Physics tuning", |ui| {
            changed |= tuning_slider(
                ui,
                &mut self.config.link_base_distance,
                20.0..=600.0,
                "Link distance",
                "Rest length of an edge with no likes.",
            );
            changed |= tuning_slider(
                ui,
                &mut self.config.link_strength,
                0.0..=1.0,
                "Link strength",
                "How strongly an edge pulls toward its rest length.",
            );
            changed |= tuning_slider(
                ui,
                &mut self.config.center_strength,
                0.0..=0.5,
                "Centering",
                "How strongly the whole layout is pulled back to the origin.",
            );
            changed |= tuning_slider(
                ui,
                &mut self.config.collision_strength,
                0.0..=1.0,
                "Collision",
                "How hard overlapping nodes are pushed apart.",
            );
            changed |= tuning_slider(
                ui,
                &mut self.config.video_collision_radius,
                0.0..=200.0,
                "Video radius",
                "Collision radius of video nodes.",
            );
            changed |= tuning_slider(
                ui,
                &mut self.config.user_collision_radius,
                0.0..=200.0,
                "User radius",
                "Collision radius of user nodes.",
            );

            if ui.button("Reset to defaults").clicked() {
                self.reset_config();
            }
        });

        if changed {
            self.apply_config();
        }
    }
}
