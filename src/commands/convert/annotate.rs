use serde::Serialize;

use super::layout::{Fragment, PageSize};

/// What a highlighted region means to whoever reviews the heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationTag {
    Structural,
    Context,
    HeaderCell,
    SubCourt,
    Record,
}

impl AnnotationTag {
    /// Stroke color, RGB in `0.0..=1.0`.
    pub fn color(self) -> [f32; 3] {
        match self {
            Self::Structural => [0.5, 0.5, 0.5],
            Self::Context => [0.0, 0.6, 0.0],
            Self::HeaderCell | Self::Record => [0.0, 0.0, 1.0],
            Self::SubCourt => [0.5, 0.0, 0.5],
        }
    }
}

const COLUMN_LINE_COLOR: [f32; 3] = [1.0, 0.0, 0.0];

/// Write-only side channel for visual QA of the row classifier. Nothing it
/// does may influence parsing.
pub trait Annotator {
    fn annotate_group(&mut self, fragments: &[Fragment], tag: AnnotationTag);

    fn annotate_text(&mut self, fragment: &Fragment, tag: AnnotationTag);

    fn annotate_columns(&mut self, x_coordinates: &[f64], page: usize);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Annotation {
    Square {
        page: usize,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        tag: AnnotationTag,
        stroke_color: [f32; 3],
    },
    Line {
        page: usize,
        x: f64,
        y1: f64,
        y2: f64,
        stroke_color: [f32; 3],
    },
}

/// Keeps every annotation in memory so it can be dumped next to the run
/// output. Coordinates are flipped to a bottom-left origin like PDF user
/// space.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordingAnnotator {
    pub pages: Vec<PageSize>,
    pub annotations: Vec<Annotation>,
}

impl RecordingAnnotator {
    pub fn new(pages: Vec<PageSize>) -> Self {
        Self {
            pages,
            annotations: Vec::new(),
        }
    }

    fn page_height(&self, page: usize) -> f64 {
        self.pages
            .get(page)
            .or_else(|| self.pages.first())
            .map(|size| size.height)
            .unwrap_or_default()
    }
}

impl Annotator for RecordingAnnotator {
    fn annotate_group(&mut self, fragments: &[Fragment], tag: AnnotationTag) {
        for fragment in fragments {
            self.annotate_text(fragment, tag);
        }
    }

    fn annotate_text(&mut self, fragment: &Fragment, tag: AnnotationTag) {
        let height = self.page_height(fragment.page);
        self.annotations.push(Annotation::Square {
            page: fragment.page,
            x1: fragment.x_min,
            y1: height - fragment.y_max,
            x2: fragment.x_max,
            y2: height - fragment.y_min,
            tag,
            stroke_color: tag.color(),
        });
    }

    fn annotate_columns(&mut self, x_coordinates: &[f64], page: usize) {
        let height = self.page_height(page);
        for &x in x_coordinates {
            self.annotations.push(Annotation::Line {
                page,
                x,
                y1: 0.0,
                y2: height,
                stroke_color: COLUMN_LINE_COLOR,
            });
        }
    }
}
