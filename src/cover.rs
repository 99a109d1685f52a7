//! Cover sheet typesetting.
//!
//! Covers are not drawn by the sheet renderer; they are compiled by an
//! external TeX toolchain from a fixed wrapper that pulls in a
//! user-maintained body file. The toolchain sits behind [`Typesetter`] so
//! nothing else in the crate knows which binary does the work.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use log::debug;
use tempfile::Builder;

use crate::render::HeaderMeta;
use crate::status::{SheetError, SheetResult};

/// Everything one cover page interpolates besides the user fragment.
#[derive(Debug, Clone, Copy)]
pub struct CoverRequest<'a> {
    pub header: &'a HeaderMeta,
    pub student_id: &'a str,
    pub cover_title: &'a str,
}

/// Capability to put one cover page on disk.
pub trait Typesetter {
    /// Typesets `fragment` with the request's metadata spliced in and
    /// writes a single-page document to `out`.
    fn typeset(&self, out: &Path, fragment: &Path, req: &CoverRequest) -> SheetResult<()>;
}

/// Name the wrapper `\input`s the user fragment under.
const FRAGMENT_NAME: &str = "cover_content.tex";
const WRAPPER_NAME: &str = "cover_wrapper.tex";
const WRAPPER_PDF: &str = "cover_wrapper.pdf";
/// Optional asset a fragment may `\includegraphics`; copied along when it
/// sits next to the fragment.
const GUIDELINES_NAME: &str = "single_choice_selection_guidelines.pdf";

const WRAPPER: &str = r"\documentclass[a4paper,11pt]{article}

\usepackage[ngerman]{babel}
\usepackage[T1]{fontenc}
\usepackage[utf8]{inputenc}
\usepackage{xcolor}
\usepackage{graphicx}
\usepackage{amsmath,amssymb}
\usepackage{setspace}
\usepackage[margin=18mm]{geometry}

\pagestyle{empty}

\newcommand{\CourseName}{@course@}
\newcommand{\Professor}{@prof@}
\newcommand{\ExamDate}{@date@}
\newcommand{\StudentID}{@sid@}
\newcommand{\CoverTitle}{@cover_title@}

\begin{document}

\begin{center}
{\Large \textbf{\CourseName}}\\
\vspace{0.2cm}
{\ \Professor \hfill \ExamDate}
\end{center}

\vspace{0.5cm}

\noindent
\Large \textbf{\CoverTitle} \hfill \Large \textbf{Student-ID:} \Large \StudentID
\normalsize

\vspace{0.8cm}

% Embedded content (user-maintained)
\input{cover_content.tex}

\end{document}
";

/// `pdflatex`-backed [`Typesetter`].
pub struct Pdflatex;

impl Typesetter for Pdflatex {
    fn typeset(&self, out: &Path, fragment: &Path, req: &CoverRequest) -> SheetResult<()> {
        let build = Builder::new().prefix("covertex_").tempdir()?;
        fs::copy(fragment, build.path().join(FRAGMENT_NAME))?;

        // A fragment may pull in the guidelines asset kept next to it.
        if let Some(parent) = fragment.parent() {
            let guidelines = parent.join(GUIDELINES_NAME);
            if guidelines.exists() {
                fs::copy(&guidelines, build.path().join(GUIDELINES_NAME))?;
            }
        }

        fs::write(build.path().join(WRAPPER_NAME), wrapper_source(req))?;

        // Two passes so cross-references inside the fragment settle.
        for pass in 1..=2u8 {
            let output = Command::new("pdflatex")
                .args(["-interaction=nonstopmode", "-halt-on-error", WRAPPER_NAME])
                .current_dir(build.path())
                .output()
                .map_err(|e| {
                    if e.kind() == ErrorKind::NotFound {
                        SheetError::Toolchain {
                            reason: "pdflatex not found on PATH; install a TeX distribution"
                                .to_string(),
                            log: String::new(),
                        }
                    } else {
                        SheetError::Io(e)
                    }
                })?;
            debug!("pdflatex pass {} finished with {}", pass, output.status);
            if !output.status.success() {
                return Err(SheetError::Toolchain {
                    reason: format!("pdflatex exited with {}", output.status),
                    log: String::from_utf8_lossy(&output.stdout).into_owned(),
                });
            }
        }

        let produced = build.path().join(WRAPPER_PDF);
        if !produced.exists() {
            return Err(SheetError::Toolchain {
                reason: format!("pdflatex produced no {}", WRAPPER_PDF),
                log: String::new(),
            });
        }
        fs::copy(&produced, out)?;
        Ok(())
    }
}

/// Escapes TeX's reserved characters so metadata can be spliced into macro
/// definitions verbatim.
pub fn tex_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str(r"\textbackslash{}"),
            '&' => out.push_str(r"\&"),
            '%' => out.push_str(r"\%"),
            '$' => out.push_str(r"\$"),
            '#' => out.push_str(r"\#"),
            '_' => out.push_str(r"\_"),
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            _ => out.push(ch),
        }
    }
    out
}

fn wrapper_source(req: &CoverRequest) -> String {
    WRAPPER
        .replace("@course@", &tex_escape(&req.header.course))
        .replace("@prof@", &tex_escape(&req.header.professor))
        .replace("@date@", &tex_escape(&req.header.date))
        .replace("@sid@", &tex_escape(req.student_id))
        .replace("@cover_title@", &tex_escape(req.cover_title))
}
