//! Figures and tables summarising a run.
//!
//! Figures are rendered with the plotters SVG backend into strings, so the
//! caller decides where (or whether) they are written.

use crate::errors::{Error, Result};
use canopy_core::timeseries::FloatValue;
use canopy_core::trajectory::Trajectory;
use canopy_sobol::{DesignOutputs, IndexEstimate, SobolIndices, SobolReport};
use plotters::prelude::*;
use std::fmt;

fn plot_error(e: impl fmt::Display) -> Error {
    Error::Plot(e.to_string())
}

/// Plot carbon stock against time, marking the canopy threshold
pub fn trajectory_svg(trajectory: &Trajectory, canopy_threshold: FloatValue) -> Result<String> {
    let (t_start, _) = trajectory.first();
    let (t_end, _) = trajectory.last();
    let x_range = if t_end > t_start {
        t_start..t_end
    } else {
        t_start..t_start + 1.0
    };
    let max_stock = trajectory
        .values()
        .iter()
        .copied()
        .fold(canopy_threshold, FloatValue::max);
    let y_max = if max_stock > 0.0 { max_stock * 1.1 } else { 1.0 };

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (800, 500)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Forest carbon stock", ("sans-serif", 20))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range.clone(), 0.0..y_max)
            .map_err(plot_error)?;

        chart
            .configure_mesh()
            .x_desc("Time (years)")
            .y_desc("Carbon stock (kg C)")
            .draw()
            .map_err(plot_error)?;

        chart
            .draw_series(LineSeries::new(trajectory.iter(), &BLUE))
            .map_err(plot_error)?
            .label("stock")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

        chart
            .draw_series(LineSeries::new(
                vec![
                    (x_range.start, canopy_threshold),
                    (x_range.end, canopy_threshold),
                ],
                RED.stroke_width(1),
            ))
            .map_err(plot_error)?
            .label("canopy threshold")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(plot_error)?;

        root.present().map_err(plot_error)?;
    }
    Ok(svg)
}

/// Boxplot of every model output across the design, one panel per output
pub fn metrics_boxplot_svg(outputs: &DesignOutputs) -> Result<String> {
    let names = outputs.output_names();
    if names.is_empty() {
        return Err(Error::Plot("No model outputs to plot".to_string()));
    }

    let mut svg = String::new();
    {
        let root =
            SVGBackend::with_string(&mut svg, (400 * names.len() as u32, 500)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;
        let panels = root.split_evenly((1, names.len()));

        for (panel, name) in panels.iter().zip(names) {
            let values = outputs.column(name)?.to_vec();
            let quartiles = Quartiles::new(values.as_slice());

            let (lo, hi) = values
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(*v), hi.max(*v))
                });
            let pad = if hi > lo { 0.05 * (hi - lo) } else { 1.0 };
            let y_range = (lo - pad) as f32..(hi + pad) as f32;

            let labels = [name.as_str()];
            let mut chart = ChartBuilder::on(panel)
                .caption(name, ("sans-serif", 18))
                .margin(20)
                .x_label_area_size(30)
                .y_label_area_size(60)
                .build_cartesian_2d(labels[..].into_segmented(), y_range)
                .map_err(plot_error)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_label_formatter(&|value| match value {
                    SegmentValue::CenterOf(label) => label.to_string(),
                    _ => String::new(),
                })
                .draw()
                .map_err(plot_error)?;

            chart
                .draw_series(std::iter::once(
                    Boxplot::new_vertical(SegmentValue::CenterOf(&labels[0]), &quartiles)
                        .width(40)
                        .style(&BLUE),
                ))
                .map_err(plot_error)?;
        }

        root.present().map_err(plot_error)?;
    }
    Ok(svg)
}

/// Table of the indices of one model output
pub struct IndexTable<'a> {
    pub output: &'a str,
    pub indices: &'a SobolIndices,
}

fn format_bounds(estimate: &IndexEstimate) -> (String, String) {
    match &estimate.bootstrap {
        Some(summary) => (
            format!("{:.4}", summary.min_ci),
            format!("{:.4}", summary.max_ci),
        ),
        None => ("-".to_string(), "-".to_string()),
    }
}

impl fmt::Display for IndexTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.indices {
            SobolIndices::NoVariance { value } => writeln!(
                f,
                "{}: no variance (every sample gave {}), indices are undefined",
                self.output, value
            ),
            SobolIndices::Estimated { variance, indices } => {
                writeln!(f, "{} (variance {:.4})", self.output, variance)?;
                writeln!(
                    f,
                    "{:<20} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}",
                    "parameter", "S", "S low", "S high", "T", "T low", "T high"
                )?;
                for (name, p) in indices {
                    let (s_low, s_high) = format_bounds(&p.first_order);
                    let (t_low, t_high) = format_bounds(&p.total);
                    writeln!(
                        f,
                        "{:<20} {:>9.4} {:>9} {:>9} {:>9.4} {:>9} {:>9}",
                        name,
                        p.first_order.original,
                        s_low,
                        s_high,
                        p.total.original,
                        t_low,
                        t_high
                    )?;
                }
                Ok(())
            }
        }
    }
}

/// Index tables of every output in a report
pub fn index_tables(report: &SobolReport) -> Vec<IndexTable<'_>> {
    report
        .indices
        .iter()
        .map(|(output, indices)| IndexTable { output, indices })
        .collect()
}
