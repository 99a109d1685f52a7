use std::path::PathBuf;

use clap::Parser;

use crate::layout::{ColumnPolicy, Paper, Spacing};
use crate::render::HeaderMeta;
use crate::status::{SheetError, SheetResult};
use crate::utils::labels;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Paper preset to lay the sheets out on (A4 or LETTER).
    #[arg(long, default_value = "A4")]
    pub paper: String,

    /// Title printed on every answer sheet.
    #[arg(long, default_value = "Antworten")]
    pub title: String,

    /// Course name printed in the header.
    #[arg(long, default_value = "")]
    pub course_name: String,

    /// Professor name printed in the header.
    #[arg(long, default_value = "")]
    pub professor: String,

    /// Exam date printed in the header, defaults to today.
    #[arg(long)]
    pub exam_date: Option<String>,

    /// How many questions the exam has.
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub num_questions: usize,

    /// Comma-separated option counts, repeated over the questions.
    #[arg(long, default_value = "2")]
    pub options_per_question: String,

    /// Explicit option count per question (length must equal
    /// --num-questions), e.g. 2,2,5,5,3. Overrides --options-per-question.
    #[arg(long)]
    pub options_list: Option<String>,

    /// Column count, an upper bound unless --force-columns is set.
    #[arg(long, default_value_t = 5, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub columns: usize,

    /// Use exactly --columns columns instead of shrinking to fit.
    #[arg(long)]
    pub force_columns: bool,

    /// Extra vertical gap between question rows, in millimeters.
    #[arg(long, default_value_t = 0.0)]
    pub row_gap_mm: f64,

    /// Extra horizontal gap between columns, in millimeters.
    #[arg(long, default_value_t = 0.0)]
    pub col_gap_mm: f64,

    /// Checkbox side length, in millimeters.
    #[arg(long, default_value_t = 3.5)]
    pub box_size_mm: f64,

    /// First identifier of the contiguous student range.
    #[arg(long, default_value_t = 1)]
    pub student_id_start: usize,

    /// How many student identifiers to generate sheets for.
    #[arg(long, default_value_t = 1)]
    pub student_id_count: usize,

    /// Comma-separated answer key, option indices or letter labels.
    #[arg(long)]
    pub answer_key: String,

    /// Directory every artifact is written to.
    #[arg(long, default_value = "out")]
    pub outdir: PathBuf,

    /// Prefix prepended to question numbers (e.g. 'A' gives 'A.3').
    #[arg(long)]
    pub answer_sheet_prefix: Option<String>,

    /// LaTeX body file (no documentclass, no document environment) embedded
    /// on the cover sheet.
    #[arg(long)]
    pub cover_tex: Option<PathBuf>,

    /// Label printed next to the student id on the cover sheet.
    #[arg(long, default_value = "Exam paper")]
    pub cover_title: String,

    /// Skip cover sheets even when --cover-tex is given.
    #[arg(long)]
    pub no_cover: bool,

    /// Also keep individual per-student PDFs in the output directory.
    #[arg(long)]
    pub per_student: bool,

    /// Keep the intermediate working directory around for debugging.
    #[arg(long)]
    pub keep_temp: bool,
}

impl Cli {
    pub fn paper(&self) -> SheetResult<Paper> {
        match self.paper.to_ascii_uppercase().as_str() {
            "A4" => Ok(Paper::A4),
            "LETTER" => Ok(Paper::Letter),
            _ => Err(SheetError::UnknownPaper {
                token: self.paper.clone(),
            }),
        }
    }

    /// One option count per question, from the explicit list or by cycling
    /// the short pattern over the question range.
    pub fn counts(&self) -> SheetResult<Vec<usize>> {
        if let Some(list) = &self.options_list {
            let counts = parse_counts(list)?;
            if counts.len() != self.num_questions {
                return Err(SheetError::CountsLength {
                    expected: self.num_questions,
                    got: counts.len(),
                });
            }
            Ok(counts)
        } else {
            let pattern = parse_counts(&self.options_per_question)?;
            Ok((0..self.num_questions)
                .map(|i| pattern[i % pattern.len()])
                .collect())
        }
    }

    /// One raw key token per question; short keys cycle like option counts.
    pub fn key_tokens(&self) -> SheetResult<Vec<String>> {
        let raw = parse_csv(&self.answer_key);
        if raw.is_empty() {
            return Err(SheetError::EmptyKey);
        }
        Ok((0..self.num_questions)
            .map(|i| raw[i % raw.len()].clone())
            .collect())
    }

    pub fn policy(&self) -> ColumnPolicy {
        if self.force_columns {
            ColumnPolicy::Forced(self.columns)
        } else {
            ColumnPolicy::Auto(self.columns)
        }
    }

    pub fn spacing(&self) -> Spacing {
        Spacing {
            row_gap_mm: self.row_gap_mm,
            col_gap_mm: self.col_gap_mm,
            box_size_mm: self.box_size_mm,
        }
    }

    /// The header line, with the exam date pinned down right here so the
    /// renderer never has to ask for the current day itself.
    pub fn header(&self) -> HeaderMeta {
        HeaderMeta {
            course: self.course_name.clone(),
            professor: self.professor.clone(),
            date: self
                .exam_date
                .clone()
                .unwrap_or_else(|| chrono::Local::now().format("%d. %B %Y").to_string()),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.answer_sheet_prefix.as_deref()
    }

    /// The zero-padded identifiers of the requested range, in order.
    pub fn student_ids(&self) -> Vec<String> {
        (self.student_id_start..self.student_id_start + self.student_id_count)
            .map(|n| format!("{:03}", n))
            .collect()
    }
}

/// Splits on commas, trims, drops empty fields.
fn parse_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_counts(s: &str) -> SheetResult<Vec<usize>> {
    let raw = parse_csv(s);
    if raw.is_empty() {
        return Err(SheetError::BadCount {
            token: s.to_string(),
        });
    }
    raw.into_iter()
        .map(|t| match t.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n),
            _ => Err(SheetError::BadCount { token: t }),
        })
        .collect()
}

/// Turns answer key tokens into option indices. All-digit tokens are taken
/// as zero-based indices, anything else goes through the same letter scheme
/// the renderer prints next to the boxes.
pub fn resolve_key(tokens: &[String]) -> SheetResult<Vec<usize>> {
    tokens
        .iter()
        .enumerate()
        .map(|(i, tok)| {
            let parsed = if tok.chars().all(|c| c.is_ascii_digit()) {
                tok.parse::<usize>().ok()
            } else {
                labels::resolve(tok)
            };
            parsed.ok_or_else(|| SheetError::BadKeyToken {
                question: i + 1,
                token: tok.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["sheetgen"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn pattern_counts_cycle_over_the_questions() {
        let cli = parse(&[
            "--num-questions",
            "5",
            "--options-per-question",
            "2,4",
            "--answer-key",
            "A",
        ]);
        assert_eq!(cli.counts().unwrap(), vec![2, 4, 2, 4, 2]);
    }

    #[test]
    fn explicit_list_must_match_the_question_count() {
        let cli = parse(&[
            "--num-questions",
            "3",
            "--options-list",
            "2,4",
            "--answer-key",
            "A",
        ]);
        match cli.counts().unwrap_err() {
            SheetError::CountsLength { expected, got } => {
                assert_eq!((expected, got), (3, 2));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn counts_must_be_positive_integers() {
        let cli = parse(&[
            "--num-questions",
            "2",
            "--options-per-question",
            "2,0",
            "--answer-key",
            "A",
        ]);
        assert!(matches!(
            cli.counts().unwrap_err(),
            SheetError::BadCount { .. }
        ));
    }

    #[test]
    fn key_tokens_cycle_and_letters_resolve() {
        let cli = parse(&["--num-questions", "3", "--answer-key", "A,C,B"]);
        let tokens = cli.key_tokens().unwrap();
        assert_eq!(tokens, vec!["A", "C", "B"]);
        assert_eq!(resolve_key(&tokens).unwrap(), vec![0, 2, 1]);

        let cli = parse(&["--num-questions", "4", "--answer-key", "A,B"]);
        let tokens = cli.key_tokens().unwrap();
        assert_eq!(resolve_key(&tokens).unwrap(), vec![0, 1, 0, 1]);
    }

    #[test]
    fn numeric_and_letter_tokens_mix() {
        let tokens: Vec<String> = ["0", "c", "1", "AA"].iter().map(|s| s.to_string()).collect();
        assert_eq!(resolve_key(&tokens).unwrap(), vec![0, 2, 1, 26]);
    }

    #[test]
    fn unresolvable_key_tokens_are_fatal() {
        let tokens: Vec<String> = ["A", "?!"].iter().map(|s| s.to_string()).collect();
        match resolve_key(&tokens).unwrap_err() {
            SheetError::BadKeyToken { question, token } => {
                assert_eq!(question, 2);
                assert_eq!(token, "?!");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn empty_key_is_fatal() {
        let cli = parse(&["--num-questions", "2", "--answer-key", " , "]);
        assert!(matches!(cli.key_tokens().unwrap_err(), SheetError::EmptyKey));
    }

    #[test]
    fn student_ids_are_zero_padded_and_ordered() {
        let cli = parse(&[
            "--num-questions",
            "1",
            "--answer-key",
            "A",
            "--student-id-start",
            "1",
            "--student-id-count",
            "3",
        ]);
        assert_eq!(cli.student_ids(), vec!["001", "002", "003"]);
    }

    #[test]
    fn paper_names_are_case_insensitive() {
        let cli = parse(&["--num-questions", "1", "--answer-key", "A", "--paper", "letter"]);
        assert_eq!(cli.paper().unwrap(), Paper::Letter);

        let cli = parse(&["--num-questions", "1", "--answer-key", "A", "--paper", "B5"]);
        assert!(matches!(
            cli.paper().unwrap_err(),
            SheetError::UnknownPaper { .. }
        ));
    }

    #[test]
    fn exam_date_defaults_to_something_printable() {
        let cli = parse(&["--num-questions", "1", "--answer-key", "A"]);
        assert!(!cli.header().date.is_empty());

        let cli = parse(&[
            "--num-questions",
            "1",
            "--answer-key",
            "A",
            "--exam-date",
            "01. April 2026",
        ]);
        assert_eq!(cli.header().date, "01. April 2026");
    }
}
