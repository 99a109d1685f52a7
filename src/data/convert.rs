use crate::layout::{Box_, BoxGeometry, Layout, MarkerGeometry};
use crate::utils::Point_;

use super::structs::{Anchor, BoxRecord, Geometry, Marker, Snapshot};

/// Raster size any scan of the sheet is normalized to (A4 at 300 dpi).
const CANONICAL_W_PX: usize = 2480;
const CANONICAL_H_PX: usize = 3508;

impl From<&MarkerGeometry> for Marker {
    fn from(value: &MarkerGeometry) -> Self {
        Marker {
            margin_pt: value.margin,
            size_pt: value.size,
        }
    }
}

impl From<&BoxGeometry> for Geometry {
    fn from(value: &BoxGeometry) -> Self {
        Geometry {
            box_size_pt: value.box_size,
            box_gap_y_pt: value.box_gap_y,
            opt_label_gap_pt: value.label_gap,
        }
    }
}

impl From<&Box_> for BoxRecord {
    fn from(value: &Box_) -> Self {
        BoxRecord {
            q: value.q,
            opt: value.opt,
            x_pt: value.rect.x,
            y_pt: value.rect.y,
            w_pt: value.rect.width,
            h_pt: value.rect.height,
        }
    }
}

impl From<Point_<f64>> for Anchor {
    fn from(value: Point_<f64>) -> Self {
        Anchor {
            x_pt: value.x,
            y_pt: value.y,
        }
    }
}

impl From<&Layout> for Snapshot {
    fn from(value: &Layout) -> Self {
        Snapshot {
            paper: value.paper.name().to_string(),
            title: value.title.clone(),
            question_prefix: value.prefix.clone(),
            page_width_pt: value.page.width,
            page_height_pt: value.page.height,
            canonical_w_px: CANONICAL_W_PX,
            canonical_h_px: CANONICAL_H_PX,
            num_questions: value.num_questions,
            per_question_option_counts: value.counts.clone(),
            options_list: value.counts.clone(),
            marker: (&value.marker).into(),
            geometry: (&value.geometry).into(),
            boxes: value.boxes.iter().map(BoxRecord::from).collect(),
            student_id_print: value.id_stamp.into(),
            answer_key: value.key.clone(),
        }
    }
}
