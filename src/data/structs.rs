use serde::Serialize;

type Float = f64;
type Int = usize;
type Text = String;

/// On-disk snapshot of a computed page template. Field names and units
/// (points) are the contract any scan-side reader keys on, so they stay
/// put even where the in-memory names differ.
#[derive(Serialize)]
pub struct Snapshot {
    pub paper: Text,
    pub title: Text,
    pub question_prefix: Text,
    pub page_width_pt: Float,
    pub page_height_pt: Float,
    pub canonical_w_px: Int,
    pub canonical_h_px: Int,
    pub num_questions: Int,
    pub per_question_option_counts: Vec<Int>,
    /// Same data again under the name older readers look for.
    pub options_list: Vec<Int>,
    pub marker: Marker,
    pub geometry: Geometry,
    pub boxes: Vec<BoxRecord>,
    pub student_id_print: Anchor,
    pub answer_key: Vec<Int>,
}

/// Corner marker geometry.
#[derive(Serialize)]
pub struct Marker {
    pub margin_pt: Float,
    pub size_pt: Float,
}

/// Box geometry shared by the whole grid.
#[derive(Serialize)]
pub struct Geometry {
    pub box_size_pt: Float,
    pub box_gap_y_pt: Float,
    pub opt_label_gap_pt: Float,
}

/// A single option box.
#[derive(Serialize)]
pub struct BoxRecord {
    pub q: Int,
    pub opt: Int,
    pub x_pt: Float,
    pub y_pt: Float,
    pub w_pt: Float,
    pub h_pt: Float,
}

/// A fixed text anchor on the page.
#[derive(Serialize)]
pub struct Anchor {
    pub x_pt: Float,
    pub y_pt: Float,
}
