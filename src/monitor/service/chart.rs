use std::{io::Cursor, panic::AssertUnwindSafe, time::Duration};

use chrono::{DateTime, Duration as ChronoDuration, Local, Utc};
use image::{DynamicImage, ImageFormat, RgbImage};
use plotters::prelude::*;
use thiserror::Error;
use tokio::{task::JoinError, time::timeout};

const CHART_WIDTH_PX: u32 = 1200;
const CHART_HEIGHT_PX: u32 = 520;

#[derive(Debug, Error)]
pub enum ChartRenderError {
    #[error("not enough points to render")]
    NotEnoughPoints,
    #[error("render backend failure: {0}")]
    Backend(String),
    #[error("png encoding failure: {0}")]
    PngEncoding(String),
    #[error("render task join failure: {0}")]
    Join(String),
    #[error("render task panic: {0}")]
    Panic(String),
    #[error("render execution timeout after {0}s")]
    Timeout(u64),
}

impl ChartRenderError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotEnoughPoints => "CHART_NOT_ENOUGH_POINTS",
            Self::Backend(_) => "CHART_BACKEND_ERROR",
            Self::PngEncoding(_) => "CHART_PNG_ENCODING_ERROR",
            Self::Join(_) => "CHART_TASK_JOIN_ERROR",
            Self::Panic(_) => "CHART_TASK_PANIC",
            Self::Timeout(_) => "CHART_RENDER_TIMEOUT",
        }
    }
}

/// One line on the recovery chart.
#[derive(Debug, Clone)]
pub(crate) struct ChartSeries {
    pub(crate) label: String,
    pub(crate) points: Vec<(DateTime<Utc>, f64)>,
}

struct ChartStyle;

impl ChartStyle {
    const MARGIN: i32 = 16;
    const CAPTION: &'static str = "Ping errors per minute";
    const FONT_FAMILY: &'static str = "sans-serif";
    const CAPTION_FONT_SIZE: i32 = 28;
    const X_LABEL_AREA_SIZE: u32 = 40;
    const Y_LABEL_AREA_SIZE: u32 = 56;
    const X_LABEL_COUNT: usize = 8;
    const Y_LABEL_COUNT: usize = 6;
    const LINE_WIDTH: u32 = 2;
    const BACKGROUND: RGBColor = WHITE;
}

pub(crate) fn render_outage_chart(series: &[ChartSeries]) -> Result<Vec<u8>, ChartRenderError> {
    let all_points = || series.iter().flat_map(|line| line.points.iter());
    if all_points().count() < 2 {
        return Err(ChartRenderError::NotEnoughPoints);
    }

    let mut x_start = all_points()
        .map(|(timestamp, _)| *timestamp)
        .min()
        .ok_or(ChartRenderError::NotEnoughPoints)?;
    let mut x_end = all_points()
        .map(|(timestamp, _)| *timestamp)
        .max()
        .ok_or(ChartRenderError::NotEnoughPoints)?;
    if x_start == x_end {
        x_start -= ChronoDuration::minutes(1);
        x_end += ChronoDuration::minutes(1);
    }
    let y_max = all_points()
        .map(|(_, value)| *value)
        .fold(0.0f64, f64::max)
        .max(1.0)
        * 1.1;

    let width = CHART_WIDTH_PX;
    let height = CHART_HEIGHT_PX;
    let mut rgb_buffer = vec![255u8; width as usize * height as usize * 3];

    {
        let drawing_area =
            BitMapBackend::with_buffer(&mut rgb_buffer, (width, height)).into_drawing_area();
        drawing_area
            .fill(&ChartStyle::BACKGROUND)
            .map_err(|error| ChartRenderError::Backend(format!("background fill: {error:?}")))?;

        let mut chart = ChartBuilder::on(&drawing_area)
            .margin(ChartStyle::MARGIN)
            .caption(
                ChartStyle::CAPTION,
                (ChartStyle::FONT_FAMILY, ChartStyle::CAPTION_FONT_SIZE),
            )
            .x_label_area_size(ChartStyle::X_LABEL_AREA_SIZE)
            .y_label_area_size(ChartStyle::Y_LABEL_AREA_SIZE)
            .build_cartesian_2d(x_start..x_end, 0f64..y_max)
            .map_err(|error| ChartRenderError::Backend(format!("chart build: {error:?}")))?;

        chart
            .configure_mesh()
            .x_labels(ChartStyle::X_LABEL_COUNT)
            .y_labels(ChartStyle::Y_LABEL_COUNT)
            .x_label_formatter(&|timestamp: &DateTime<Utc>| {
                timestamp.with_timezone(&Local).format("%H:%M").to_string()
            })
            .y_desc("Errors / min")
            .x_desc(local_axis_label(x_end))
            .draw()
            .map_err(|error| ChartRenderError::Backend(format!("mesh draw: {error:?}")))?;

        for (index, line) in series.iter().enumerate() {
            let color = Palette99::pick(index).to_rgba();
            chart
                .draw_series(LineSeries::new(
                    line.points.iter().copied(),
                    color.stroke_width(ChartStyle::LINE_WIDTH),
                ))
                .map_err(|error| ChartRenderError::Backend(format!("series draw: {error:?}")))?
                .label(line.label.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .draw()
            .map_err(|error| ChartRenderError::Backend(format!("legend draw: {error:?}")))?;

        drawing_area
            .present()
            .map_err(|error| ChartRenderError::Backend(format!("present: {error:?}")))?;
    }

    let rgb_image = RgbImage::from_raw(width, height, rgb_buffer).ok_or_else(|| {
        ChartRenderError::PngEncoding("image buffer conversion failed".to_string())
    })?;
    let mut output = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(rgb_image)
        .write_to(&mut output, ImageFormat::Png)
        .map_err(|error| ChartRenderError::PngEncoding(error.to_string()))?;

    Ok(output.into_inner())
}

fn local_axis_label(at: DateTime<Utc>) -> String {
    format!("Time (UTC{})", at.with_timezone(&Local).format("%:z"))
}

/// Renders on the blocking pool, bounded by `render_timeout_secs`.
pub(crate) async fn run_render_task(
    series: Vec<ChartSeries>,
    render_timeout_secs: u64,
) -> Result<Vec<u8>, ChartRenderError> {
    let render_handle = tokio::task::spawn_blocking(move || {
        std::panic::catch_unwind(AssertUnwindSafe(|| render_outage_chart(&series)))
            .map_err(|payload| ChartRenderError::Panic(describe_panic_payload(payload)))?
    });

    match timeout(Duration::from_secs(render_timeout_secs), render_handle).await {
        Ok(Ok(inner_result)) => inner_result,
        Ok(Err(join_error)) => Err(join_error_to_error(join_error)),
        Err(_) => Err(ChartRenderError::Timeout(render_timeout_secs)),
    }
}

fn join_error_to_error(join_error: JoinError) -> ChartRenderError {
    ChartRenderError::Join(join_error.to_string())
}

fn describe_panic_payload(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }

    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }

    "unknown panic payload".to_string()
}
