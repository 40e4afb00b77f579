use plotters::prelude::*;
use std::error::Error;
use std::path::Path;
use tracing::debug;

use crate::normalize::Waveform;

const PLOT_SIZE: (u32, u32) = (1500, 700);
const MAX_POINTS: usize = 20_000;

/// `n` evenly spaced instants from 0 to `duration`, both ends included.
pub fn time_axis(n: usize, duration: f64) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let step = duration / (n - 1) as f64;
            (0..n).map(|i| i as f64 * step).collect()
        }
    }
}

/// Keep every k-th sample so that at most `max_points` remain.
/// Returns `(index, value)` pairs.
pub fn decimate(samples: &[f32], max_points: usize) -> Vec<(usize, f32)> {
    if max_points == 0 {
        return Vec::new();
    }
    let step = samples.len().div_ceil(max_points).max(1);
    samples
        .iter()
        .copied()
        .enumerate()
        .step_by(step)
        .collect()
}

pub fn info_lines(wave: &Waveform) -> Vec<String> {
    vec![
        format!("Sample Rate: {} Hz", wave.sample_rate()),
        format!("Duration: {:.2}s", wave.duration_seconds()),
        format!("Channels: {}", wave.source_channels()),
        format!("Samples: {}", wave.sample_count()),
        "Press space or Enter to play".to_string(),
    ]
}

/// Draw the waveform against time with the file summary in the top-left corner.
pub fn render_waveform(
    wave: &Waveform,
    title: &str,
    out_path: &Path,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    debug!("Rendering {} samples to {}", wave.sample_count(), out_path.display());

    let root = BitMapBackend::new(out_path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let duration = wave.duration_seconds();
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Audio Waveform: {}", title), ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..duration.max(f64::EPSILON), -1.1f64..1.1f64)?;

    chart
        .configure_mesh()
        .light_line_style(BLACK.mix(0.05))
        .bold_line_style(BLACK.mix(0.3))
        .x_desc("Time (seconds)")
        .y_desc("Voltage (normalized)")
        .draw()?;

    let times = time_axis(wave.sample_count(), duration);
    let points = decimate(wave.samples(), MAX_POINTS)
        .into_iter()
        .map(|(i, v)| (times[i], v as f64));
    chart.draw_series(LineSeries::new(points, BLUE.mix(0.7).stroke_width(1)))?;

    let lines = info_lines(wave);
    let (left, top) = (100, 70);
    let line_height = 20;
    root.draw(&Rectangle::new(
        [(left, top), (left + 290, top + 12 + line_height * lines.len() as i32)],
        WHITE.mix(0.8).filled(),
    ))?;
    root.draw(&Rectangle::new(
        [(left, top), (left + 290, top + 12 + line_height * lines.len() as i32)],
        BLACK.stroke_width(1),
    ))?;
    for (row, line) in lines.iter().enumerate() {
        root.draw(&Text::new(
            line.as_str(),
            (left + 8, top + 6 + line_height * row as i32),
            ("sans-serif", 16).into_font(),
        ))?;
    }

    root.present()?;
    Ok(())
}
