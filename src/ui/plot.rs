use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoint, Text};

use crate::color::class_color;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Prediction comparison chart (results tab)
// ---------------------------------------------------------------------------

/// One bar per model that produced a label; height is the label's confidence.
pub fn prediction_chart(ui: &mut Ui, state: &AppState) {
    let Some(report) = &state.report else {
        return;
    };

    let successes: Vec<_> = report.successes().collect();

    Plot::new("prediction_chart")
        .legend(Legend::default())
        .height(400.0)
        .y_axis_label("Confidence")
        .include_y(0.0)
        .include_y(1.1)
        .show_x(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            for (i, (model, label)) in successes.iter().enumerate() {
                let x = i as f64;
                let bar = Bar::new(x, label.confidence)
                    .name(format!("{model}: {label}"))
                    .fill(class_color(&label.class))
                    .width(0.6);
                plot_ui.bar_chart(BarChart::new(vec![bar]).name(*model));
                plot_ui.text(Text::new(
                    PlotPoint::new(x, label.confidence + 0.05),
                    label.class.as_str(),
                ));
            }
        });
}
