//! Chart artifact export: one PNG bar chart per product.
//!
//! Everything here is best-effort. Callers log failures and move on; a
//! broken chart never fails the analysis or deletion that triggered it.

use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::debug;

use crate::error::RenderError;
use crate::types::SentimentCounts;

const CHART_SIZE: (u32, u32) = (600, 400);
const CATEGORIES: [&str; 3] = ["positive", "neutral", "negative"];

/// Renders per-product sentiment bar charts into a dedicated directory,
/// named `{id}.png`, overwritten on re-analysis.
#[derive(Debug, Clone)]
pub struct ChartExporter {
    dir: PathBuf,
}

impl ChartExporter {
    /// Create the exporter, ensuring the artifact directory exists.
    pub fn new(dir: &Path) -> crate::error::Result<Self> {
        std::fs::create_dir_all(dir).map_err(RenderError::Io)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Path of the artifact for `id`, or `None` when the id cannot name a
    /// file inside the artifact directory (path separators, `..`).
    pub fn artifact_path(&self, id: &str) -> Option<PathBuf> {
        if is_safe_artifact_id(id) {
            Some(self.dir.join(format!("{id}.png")))
        } else {
            None
        }
    }

    /// Draw the bar chart for one product, overwriting any existing
    /// artifact. Category order is fixed: positive, neutral, negative.
    pub fn render(
        &self,
        id: &str,
        product_name: &str,
        counts: &SentimentCounts,
    ) -> crate::error::Result<PathBuf> {
        let path = self
            .artifact_path(id)
            .ok_or_else(|| RenderError::Chart(format!("id '{id}' cannot name an artifact")))?;

        let values = [counts.positive, counts.neutral, counts.negative];
        let y_max = values.iter().copied().max().unwrap_or(0).max(1);

        let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(to_chart_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("Sentiment for {product_name}"), ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(45)
            .y_label_area_size(45)
            .build_cartesian_2d((0usize..CATEGORIES.len()).into_segmented(), 0..y_max + 1)
            .map_err(to_chart_error)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Sentiment")
            .y_desc("Count")
            .x_labels(CATEGORIES.len())
            .x_label_formatter(&|segment| {
                let index = match segment {
                    SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => *i,
                    SegmentValue::Last => CATEGORIES.len(),
                };
                CATEGORIES.get(index).copied().unwrap_or("").to_string()
            })
            .draw()
            .map_err(to_chart_error)?;

        chart
            .draw_series(
                Histogram::vertical(&chart)
                    .style(BLUE.filled())
                    .margin(20)
                    .data(values.iter().copied().enumerate()),
            )
            .map_err(to_chart_error)?;

        root.present().map_err(to_chart_error)?;

        debug!(product = id, path = %path.display(), "Rendered sentiment chart");
        Ok(path.clone())
    }

    /// Delete the artifact for `id` if present. Returns whether a file was
    /// removed.
    pub fn remove(&self, id: &str) -> crate::error::Result<bool> {
        let Some(path) = self.artifact_path(id) else {
            return Ok(false);
        };
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(RenderError::Io(e).into()),
        }
    }
}

/// An id may only name a file directly inside the artifact directory.
fn is_safe_artifact_id(id: &str) -> bool {
    !id.is_empty() && !id.contains(['/', '\\']) && !id.contains("..")
}

fn to_chart_error<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Chart(e.to_string())
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RevlensError;

    fn counts() -> SentimentCounts {
        SentimentCounts {
            positive: 3,
            neutral: 1,
            negative: 2,
        }
    }

    #[test]
    fn artifact_paths_are_confined_to_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = ChartExporter::new(dir.path()).unwrap();

        let path = exporter.artifact_path("42").unwrap();
        assert_eq!(path, dir.path().join("42.png"));

        assert!(exporter.artifact_path("../evil").is_none());
        assert!(exporter.artifact_path("a/b").is_none());
        assert!(exporter.artifact_path("a\\b").is_none());
        assert!(exporter.artifact_path("").is_none());
    }

    #[test]
    fn render_writes_png_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = ChartExporter::new(dir.path()).unwrap();

        match exporter.render("42", "Widget", &counts()) {
            Ok(path) => {
                let bytes = std::fs::read(path).unwrap();
                assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n", "artifact should be a PNG");
            }
            // hosts without system fonts cannot rasterize the caption;
            // rendering is best-effort in production for the same reason
            Err(RevlensError::Render(RenderError::Chart(msg))) => {
                assert!(
                    msg.to_lowercase().contains("font"),
                    "unexpected chart error: {msg}"
                );
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn remove_reports_presence() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = ChartExporter::new(dir.path()).unwrap();

        // nothing there yet
        assert!(!exporter.remove("42").unwrap());

        std::fs::write(exporter.artifact_path("42").unwrap(), b"stub").unwrap();
        assert!(exporter.remove("42").unwrap());
        assert!(!exporter.remove("42").unwrap());
    }

    #[test]
    fn remove_of_unsafe_id_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = ChartExporter::new(dir.path()).unwrap();
        assert!(!exporter.remove("../evil").unwrap());
    }

    #[test]
    fn zero_counts_still_render_or_skip() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = ChartExporter::new(dir.path()).unwrap();
        // y range falls back to 0..=1 so an all-zero chart stays valid
        let result = exporter.render("0", "Nothing", &SentimentCounts::default());
        if let Err(RevlensError::Render(RenderError::Chart(msg))) = &result {
            assert!(msg.to_lowercase().contains("font"), "unexpected chart error: {msg}");
        }
    }
}
