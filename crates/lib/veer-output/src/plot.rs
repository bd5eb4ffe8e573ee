use std::path::{Path, PathBuf};

use log::debug;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use serde::Deserialize;
use thiserror::Error;

use veer_core::episode::TravelTimes;

const LABEL_AREA: u32 = 40;
const MARKER_SIZE: u32 = 2;

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create result directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to draw plot: {0}")]
    Draw(String),
    #[error("Episode and travel time series differ in length ({episodes} vs {steps})")]
    Mismatch { episodes: usize, steps: usize },
}

fn drawing_error<E: std::error::Error + Send + Sync>(error: DrawingAreaErrorKind<E>) -> PlotError {
    PlotError::Draw(error.to_string())
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct PlotSettings {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            margin: 20,
        }
    }
}

/// `<prefix><episodes>_<seed>.png`, the prefix being a path plus a file name stem.
pub fn plot_path(result_prefix: &str, episode_count: u32, seed: u64) -> PathBuf {
    PathBuf::from(format!("{}{}_{}.png", result_prefix, episode_count, seed))
}

/// Line chart of travel time (y) over episode index (x).
pub struct TravelTimePlot {
    settings: PlotSettings,
}

impl TravelTimePlot {
    pub fn new(settings: PlotSettings) -> Self {
        Self { settings }
    }

    pub fn save(&self, travel_times: &TravelTimes, output: &Path) -> Result<(), PlotError> {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let root = BitMapBackend::new(output, self.size()).into_drawing_area();
        self.draw(root, &travel_times.episodes(), &travel_times.steps())?;
        debug!("Saved travel time plot with {} points to {}", travel_times.len(), output.display());
        Ok(())
    }

    /// Draws into memory and returns the RGB pixel rows.
    pub fn render(&self, episodes: &[u32], steps: &[u64]) -> Result<Vec<u8>, PlotError> {
        let (width, height) = self.size();
        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            self.draw(root, episodes, steps)?;
        }
        Ok(buffer)
    }

    fn size(&self) -> (u32, u32) {
        (self.settings.width, self.settings.height)
    }

    fn draw<DB: DrawingBackend>(
        &self,
        root: DrawingArea<DB, Shift>,
        episodes: &[u32],
        steps: &[u64],
    ) -> Result<(), PlotError> {
        if episodes.len() != steps.len() {
            return Err(PlotError::Mismatch {
                episodes: episodes.len(),
                steps: steps.len(),
            });
        }
        root.fill(&WHITE).map_err(drawing_error)?;

        let x_max = episodes.iter().copied().max().unwrap_or(0).max(1);
        let y_max = steps.iter().copied().max().unwrap_or(0).max(1);
        let mut chart = ChartBuilder::on(&root)
            .margin(self.settings.margin)
            .x_label_area_size(LABEL_AREA)
            .y_label_area_size(LABEL_AREA)
            .build_cartesian_2d(0u32..x_max, 0u64..(y_max + y_max / 10 + 1))
            .map_err(drawing_error)?;
        chart
            .configure_mesh()
            .x_desc("episode")
            .y_desc("Travel Time")
            .draw()
            .map_err(drawing_error)?;

        let points: Vec<(u32, u64)> = episodes.iter().copied().zip(steps.iter().copied()).collect();
        chart
            .draw_series(LineSeries::new(points.iter().copied(), &BLUE))
            .map_err(drawing_error)?;
        chart
            .draw_series(
                points
                    .iter()
                    .map(|point| Circle::new(*point, MARKER_SIZE, BLUE.filled())),
            )
            .map_err(drawing_error)?;
        root.present().map_err(drawing_error)?;
        Ok(())
    }
}
