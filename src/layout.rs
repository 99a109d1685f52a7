//! The page template. Everything here is pure arithmetic: the same inputs
//! always produce the same boxes, down to the last bit, which is what the
//! downstream scan alignment relies on.

use log::debug;

use crate::status::{SheetError, SheetResult};
use crate::utils::{Point_, Rect_, Size_, PT_PER_MM};

/// Supported paper presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paper {
    A4,
    Letter,
}

impl Paper {
    /// Physical page size in points.
    pub fn size(&self) -> Size_<f64> {
        match self {
            Paper::A4 => Size_ {
                width: 210.0 * PT_PER_MM,
                height: 297.0 * PT_PER_MM,
            },
            Paper::Letter => Size_ {
                width: 612.0,
                height: 792.0,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Paper::A4 => "A4",
            Paper::Letter => "LETTER",
        }
    }
}

/// How the engine picks the number of columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnPolicy {
    /// At most this many columns, fewer when the questions already fit.
    Auto(usize),
    /// Exactly this many columns, whatever the vertical fit says.
    Forced(usize),
}

/// User-adjustable spacing knobs, in millimeters.
#[derive(Debug, Clone, Copy)]
pub struct Spacing {
    pub row_gap_mm: f64,
    pub col_gap_mm: f64,
    pub box_size_mm: f64,
}

/// The four corner squares scans are registered against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerGeometry {
    /// Distance from the page edge, also the page margin.
    pub margin: f64,
    /// Side length of one marker square.
    pub size: f64,
}

/// Geometry shared by every answer box on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxGeometry {
    pub box_size: f64,
    /// Vertical gap between stacked boxes of one question.
    pub box_gap_y: f64,
    /// Horizontal gap between a box and its letter label.
    pub label_gap: f64,
}

/// One answer option's rectangle. `q` is 1-based, `opt` is 0-based.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Box_ {
    pub q: usize,
    pub opt: usize,
    pub rect: Rect_<f64>,
}

/// The immutable page template one run renders all its sheets from.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub paper: Paper,
    /// Page size in points.
    pub page: Size_<f64>,
    /// Printable title, already carrying the prefix suffix when one is set.
    pub title: String,
    /// Question number prefix, empty when unset.
    pub prefix: String,
    pub num_questions: usize,
    /// Option count per question, index 0 is question 1.
    pub counts: Vec<usize>,
    pub marker: MarkerGeometry,
    pub geometry: BoxGeometry,
    pub boxes: Vec<Box_>,
    /// Anchor of the student identifier stamp.
    pub id_stamp: Point_<f64>,
    /// Resolved answer key, one option index per question. Empty until
    /// [`Layout::assign_key`] ran.
    pub key: Vec<usize>,
}

impl Layout {
    /// Computes the page template for the given exam parameters.
    ///
    /// The row height is driven by the question with the most options, so
    /// every row is the same height even when counts differ per question.
    /// That wastes a little paper but keeps the grid regular.
    ///
    /// Fails with [`SheetError::LayoutTooTight`] when not a single row fits
    /// between the reserved top bands and the bottom margin.
    pub fn compute(
        paper: Paper,
        title: &str,
        prefix: Option<&str>,
        num_questions: usize,
        counts: &[usize],
        policy: ColumnPolicy,
        spacing: Spacing,
    ) -> SheetResult<Layout> {
        assert!(num_questions >= 1);
        assert_eq!(counts.len(), num_questions);

        let page = paper.size();

        let margin = 12.0 * PT_PER_MM;
        let marker_size = 9.0 * PT_PER_MM;

        let box_size = spacing.box_size_mm * PT_PER_MM;
        let box_gap_y = 4.0 * PT_PER_MM;
        let label_gap = 2.5 * PT_PER_MM;

        let question_gap_y = (6.0 + spacing.row_gap_mm) * PT_PER_MM;
        let col_gap_x = (10.0 + spacing.col_gap_mm) * PT_PER_MM;

        let top_title_gap = 14.0 * PT_PER_MM;

        let max_k = counts.iter().copied().max().unwrap_or(1);

        let usable_bottom = margin;
        let usable_left = margin;
        let usable_right = page.width - margin;

        // Markers, header line, title and the id stamp all come off the top.
        let top_reserved = marker_size + (6.0 + 10.0 + 6.0 + 10.0 + 4.0 + 2.0) * PT_PER_MM;
        let content_top = (page.height - margin) - top_reserved;
        let available_h = content_top - usable_bottom;

        let q_block_h =
            max_k as f64 * box_size + (max_k - 1) as f64 * box_gap_y + question_gap_y;
        let rows_fit = (available_h / q_block_h).floor();
        if rows_fit < 1.0 {
            return Err(SheetError::LayoutTooTight);
        }
        let rows_fit = rows_fit as usize;

        let cols_used = match policy {
            ColumnPolicy::Forced(n) => n,
            ColumnPolicy::Auto(max) => max.min(num_questions.div_ceil(rows_fit)),
        };
        let rows = num_questions.div_ceil(cols_used);
        debug!(
            "packing {} questions into {} rows x {} columns ({} rows fit)",
            num_questions, rows, cols_used, rows_fit
        );

        let col_width =
            (usable_right - usable_left - (cols_used - 1) as f64 * col_gap_x) / cols_used as f64;

        let mut boxes = Vec::new();
        for r in 0..rows {
            let y_row_top = content_top - r as f64 * q_block_h;
            for c in 0..cols_used {
                let q = r * cols_used + c + 1;
                if q > num_questions {
                    break;
                }
                let k = counts[q - 1];
                let box_y_top = y_row_top - 8.0 * PT_PER_MM;
                let col_x = usable_left + c as f64 * (col_width + col_gap_x);
                for opt in 0..k {
                    let y = box_y_top - opt as f64 * (box_size + box_gap_y);
                    boxes.push(Box_ {
                        q,
                        opt,
                        rect: Rect_ {
                            x: col_x,
                            y,
                            width: box_size,
                            height: box_size,
                        },
                    });
                }
            }
        }

        let prefix = normalize_prefix(prefix);
        let title = if prefix.is_empty() {
            title.to_string()
        } else {
            format!("{} - {}", title, prefix)
        };

        Ok(Layout {
            paper,
            page,
            title,
            prefix,
            num_questions,
            counts: counts.to_vec(),
            marker: MarkerGeometry {
                margin,
                size: marker_size,
            },
            geometry: BoxGeometry {
                box_size,
                box_gap_y,
                label_gap,
            },
            boxes,
            id_stamp: Point_ {
                x: usable_left,
                y: (page.height - margin) - top_title_gap - 2.0 * PT_PER_MM,
            },
            key: Vec::new(),
        })
    }

    /// Installs the resolved answer key after checking every entry against
    /// its question's option count. Nothing may be rendered before this
    /// succeeds.
    pub fn assign_key(&mut self, key: Vec<usize>) -> SheetResult<()> {
        assert_eq!(key.len(), self.num_questions);
        for (i, (&index, &count)) in key.iter().zip(&self.counts).enumerate() {
            if index >= count {
                return Err(SheetError::KeyOutOfRange {
                    question: i + 1,
                    index,
                    count,
                });
            }
        }
        self.key = key;
        Ok(())
    }

    /// The boxes of one question, in option order.
    pub fn boxes_of(&self, q: usize) -> impl Iterator<Item = &Box_> {
        self.boxes.iter().filter(move |b| b.q == q)
    }
}

/// Strips whitespace and a trailing dot, so 'A' and 'A.' both print as 'A.3'.
fn normalize_prefix(prefix: Option<&str>) -> String {
    let p = prefix.unwrap_or("").trim();
    p.strip_suffix('.').unwrap_or(p).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spacing() -> Spacing {
        Spacing {
            row_gap_mm: 0.0,
            col_gap_mm: 0.0,
            box_size_mm: 3.5,
        }
    }

    fn small_layout() -> Layout {
        Layout::compute(
            Paper::A4,
            "Antworten",
            None,
            3,
            &[2, 4, 3],
            ColumnPolicy::Auto(5),
            spacing(),
        )
        .unwrap()
    }

    #[test]
    fn deterministic() {
        assert_eq!(small_layout(), small_layout());
    }

    #[test]
    fn one_box_per_question_and_option() {
        let layout = small_layout();
        assert_eq!(layout.boxes.len(), 2 + 4 + 3);
        for (q, &k) in layout.counts.iter().enumerate() {
            for opt in 0..k {
                let hits = layout
                    .boxes
                    .iter()
                    .filter(|b| b.q == q + 1 && b.opt == opt)
                    .count();
                assert_eq!(hits, 1, "question {} option {}", q + 1, opt);
            }
        }
    }

    #[test]
    fn boxes_stay_inside_the_margins() {
        let layout = Layout::compute(
            Paper::A4,
            "T",
            None,
            40,
            &vec![5; 40],
            ColumnPolicy::Auto(8),
            spacing(),
        )
        .unwrap();
        let printable = Rect_ {
            x: layout.marker.margin,
            y: layout.marker.margin,
            width: layout.page.width - 2.0 * layout.marker.margin,
            height: layout.page.height - 2.0 * layout.marker.margin,
        };
        for b in &layout.boxes {
            assert!(b.rect.within(&printable), "{:?} escapes the page", b);
        }
    }

    #[test]
    fn no_two_questions_overlap() {
        let layout = Layout::compute(
            Paper::A4,
            "T",
            None,
            30,
            &[2, 4, 3, 2, 4, 3, 2, 4, 3, 2, 4, 3, 2, 4, 3, 2, 4, 3, 2, 4, 3, 2, 4, 3, 2, 4, 3, 2, 4, 3],
            ColumnPolicy::Auto(5),
            spacing(),
        )
        .unwrap();
        for a in &layout.boxes {
            for b in &layout.boxes {
                if a.q != b.q {
                    assert!(
                        !a.rect.intersects(&b.rect),
                        "q{} and q{} overlap",
                        a.q,
                        b.q
                    );
                }
            }
        }
    }

    #[test]
    fn too_tight_is_fatal() {
        let err = Layout::compute(
            Paper::A4,
            "T",
            None,
            1,
            &[4],
            ColumnPolicy::Auto(5),
            Spacing {
                row_gap_mm: 0.0,
                col_gap_mm: 0.0,
                // Four boxes of this size can never fit a page vertically.
                box_size_mm: 100.0,
            },
        )
        .unwrap_err();
        assert!(matches!(err, SheetError::LayoutTooTight));
    }

    #[test]
    fn forced_columns_win_over_fit() {
        let layout = Layout::compute(
            Paper::A4,
            "T",
            None,
            30,
            &vec![2; 30],
            ColumnPolicy::Forced(3),
            spacing(),
        )
        .unwrap();
        let cols: Vec<f64> = {
            let mut xs: Vec<f64> = layout.boxes.iter().map(|b| b.rect.x).collect();
            xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
            xs.dedup();
            xs
        };
        assert_eq!(cols.len(), 3);
    }

    #[test]
    fn auto_columns_pack_everything() {
        let layout = Layout::compute(
            Paper::A4,
            "T",
            None,
            30,
            &vec![2; 30],
            ColumnPolicy::Auto(5),
            spacing(),
        )
        .unwrap();
        assert_eq!(layout.boxes.len(), 60);
        // Every question got placed exactly once.
        let mut seen: Vec<usize> = layout.boxes.iter().map(|b| b.q).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen, (1..=30).collect::<Vec<_>>());
    }

    #[test]
    fn key_validation_rejects_out_of_range() {
        let mut layout = small_layout();
        let err = layout.assign_key(vec![0, 2, 3]).unwrap_err();
        match err {
            SheetError::KeyOutOfRange {
                question,
                index,
                count,
            } => {
                assert_eq!((question, index, count), (3, 3, 3));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(layout.key.is_empty());

        layout.assign_key(vec![0, 2, 1]).unwrap();
        assert_eq!(layout.key, vec![0, 2, 1]);
    }

    #[test]
    fn prefix_lands_in_the_title() {
        let layout = Layout::compute(
            Paper::A4,
            "Antworten",
            Some("A."),
            1,
            &[2],
            ColumnPolicy::Auto(5),
            spacing(),
        )
        .unwrap();
        assert_eq!(layout.prefix, "A");
        assert_eq!(layout.title, "Antworten - A");
    }

    #[test]
    fn option_order_within_a_question_is_top_down() {
        let layout = small_layout();
        let boxes: Vec<_> = layout.boxes_of(2).collect();
        assert_eq!(boxes.len(), 4);
        for pair in boxes.windows(2) {
            assert_eq!(pair[0].opt + 1, pair[1].opt);
            assert!(pair[0].rect.y > pair[1].rect.y);
        }
    }
}
