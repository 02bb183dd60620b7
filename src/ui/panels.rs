use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::class_color;
use crate::data::features::Feature;
use crate::state::{AppState, Tab};
use crate::ui::plot;

const OK_GREEN: Color32 = Color32::from_rgb(39, 174, 96);
const ERR_RED: Color32 = Color32::from_rgb(192, 57, 43);

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the title, tab selector and status line.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    ui.heading("🌍 Air Quality – Smart Prediction");
    egui::menu::bar(ui, |ui: &mut Ui| {
        for tab in Tab::ALL {
            ui.selectable_value(&mut state.tab, tab, tab.title());
        }

        ui.separator();
        ui.label(format!("{} model(s) registered", state.registry.len()));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(msg);
        }
    });
}

/// Render the body of the selected tab.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match state.tab {
            Tab::Prediction => prediction_tab(ui, state),
            Tab::Pollutants => pollutants_tab(ui),
            Tab::Protection => protection_tab(ui),
            Tab::Results => results_tab(ui, state),
            Tab::About => about_tab(ui),
        });
}

// ---------------------------------------------------------------------------
// Prediction tab – input form
// ---------------------------------------------------------------------------

fn prediction_tab(ui: &mut Ui, state: &mut AppState) {
    ui.strong("📊 Enter the environmental readings:");
    ui.add_space(6.0);

    egui::Grid::new("feature_inputs")
        .num_columns(6)
        .spacing([12.0, 8.0])
        .show(ui, |ui: &mut Ui| {
            for (i, feature) in Feature::ALL.into_iter().enumerate() {
                ui.label(feature.label());
                let (min, max) = feature.range();
                let mut value = state.inputs[feature as usize];
                let drag = egui::DragValue::new(&mut value)
                    .range(min..=max)
                    .speed(feature.step())
                    .suffix(format!(" {}", feature.unit()));
                if ui.add(drag).changed() {
                    state.set_input(feature, value);
                }
                if i % 3 == 2 {
                    ui.end_row();
                }
            }
        });

    ui.add_space(10.0);
    if ui.button("🚀 Predict air quality").clicked() {
        state.predict();
    }

    let Some(report) = &state.report else {
        return;
    };
    ui.add_space(8.0);
    for (model, label) in report.successes() {
        ui.label(RichText::new(format!("✔ {model} predicts: {label}")).color(OK_GREEN));
    }
    for (model, failure) in report.failures() {
        ui.label(RichText::new(format!("✖ {model}: {failure}")).color(ERR_RED));
    }
}

// ---------------------------------------------------------------------------
// Static information tabs
// ---------------------------------------------------------------------------

fn pollutants_tab(ui: &mut Ui) {
    ui.heading("🌫 Main air pollutants");
    ui.add_space(4.0);
    ui.label("• PM2.5 / PM10: fine particles. May cause lung and cardiovascular problems.");
    ui.label("• NO₂: irritates the airways and aggravates asthma.");
    ui.label("• SO₂: causes respiratory inflammation and acid rain.");
    ui.label("• CO: colourless toxic gas that blocks oxygen transport in the blood.");
}

fn protection_tab(ui: &mut Ui) {
    ui.heading("🛡 Protecting yourself from air pollution");
    ui.add_space(4.0);
    ui.label("• Avoid outdoor activity on polluted days");
    ui.label("• Wear a well-filtering mask");
    ui.label("• Keep indoor spaces ventilated and clean");
    ui.label("• Plant more trees in your community");
    ui.label("• Track air quality with a trusted app");
}

fn about_tab(ui: &mut Ui) {
    ui.heading("ℹ About this application");
    ui.add_space(4.0);
    ui.label(
        "This dashboard uses machine learning models to predict air quality \
         from a set of environmental factors.",
    );
    ui.add_space(4.0);
    ui.strong("Models:");
    ui.label("• Logistic regression");
    ui.label("• Gradient-boosted trees (XGBoost)");
}

// ---------------------------------------------------------------------------
// Results tab – table, chart and export
// ---------------------------------------------------------------------------

fn results_tab(ui: &mut Ui, state: &mut AppState) {
    ui.heading("📈 Results and export");

    if !state.has_results() {
        ui.add_space(8.0);
        ui.label("⚠ No predictions yet. Run a prediction from the first tab.");
        return;
    }

    results_table(ui, state);
    ui.add_space(8.0);
    plot::prediction_chart(ui, state);
    ui.add_space(8.0);

    if ui.button("⬇ Export CSV…").clicked() {
        save_file_dialog(state);
    }
}

fn results_table(ui: &mut Ui, state: &AppState) {
    let Some(report) = &state.report else {
        return;
    };

    ui.push_id("results_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(160.0))
            .column(Column::auto().at_least(120.0))
            .column(Column::remainder())
            .header(22.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Model");
                });
                header.col(|ui| {
                    ui.strong("Prediction");
                });
                header.col(|ui| {
                    ui.strong("Confidence");
                });
            })
            .body(|mut body| {
                for (model, label) in report.successes() {
                    body.row(20.0, |mut row| {
                        row.col(|ui| {
                            ui.label(model);
                        });
                        row.col(|ui| {
                            ui.label(RichText::new(&label.class).color(class_color(&label.class)));
                        });
                        row.col(|ui| {
                            ui.label(format!("{:.1}%", label.confidence * 100.0));
                        });
                    });
                }
            });
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn save_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export predictions")
        .set_file_name(&state.export_file_name)
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        state.export_to(&path);
    }
}
