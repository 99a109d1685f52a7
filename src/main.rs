use std::fs;

use anyhow::Result;
use clap::Parser;
use log::info;

mod cli;
mod cover;
mod data;
mod layout;
mod merge;
mod render;
mod status;
mod utils;

use cli::Cli;
use cover::{CoverRequest, Pdflatex, Typesetter};
use layout::Layout;
use status::{SheetError, SheetResult};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    run(&cli)?;
    Ok(())
}

/// The whole pipeline: one layout, one solution sheet, one sheet (and
/// optionally one cover) per student, two combined documents at the end.
/// Strictly sequential, and any error aborts the run.
fn run(cli: &Cli) -> SheetResult<()> {
    fs::create_dir_all(&cli.outdir)?;

    let paper = cli.paper()?;
    let counts = cli.counts()?;
    let header = cli.header();
    let key = cli::resolve_key(&cli.key_tokens()?)?;

    let mut layout = Layout::compute(
        paper,
        &cli.title,
        cli.prefix(),
        cli.num_questions,
        &counts,
        cli.policy(),
        cli.spacing(),
    )?;
    layout.assign_key(key)?;
    info!(
        "layout ready: {} questions, {} boxes on {}",
        layout.num_questions,
        layout.boxes.len(),
        layout.paper.name()
    );

    data::write(&cli.outdir.join("layout.json"), &layout)?;

    render::render_sheet(
        &cli.outdir.join("answer_sheet_solution.pdf"),
        &layout,
        None,
        true,
        &header,
    )?;

    let fragment = cli.cover_tex.as_deref();
    let do_cover = fragment.is_some() && !cli.no_cover;
    if let Some(fragment) = fragment {
        if !fragment.exists() {
            return Err(SheetError::MissingFragment {
                path: fragment.display().to_string(),
            });
        }
    }

    // Per-student intermediates live in a scratch directory that removes
    // itself on every exit path, early errors included.
    let scratch = tempfile::Builder::new()
        .prefix("sheets_")
        .tempdir_in(&cli.outdir)?;

    let typesetter = Pdflatex;
    let mut sheet_paths = Vec::new();
    let mut cover_paths = Vec::new();

    for sid in cli.student_ids() {
        let sheet = scratch.path().join(format!("answer_sheet_{}.pdf", sid));
        render::render_sheet(&sheet, &layout, Some(&sid), false, &header)?;

        if do_cover {
            if let Some(fragment) = fragment {
                let cover = scratch.path().join(format!("cover_sheet_{}.pdf", sid));
                typesetter.typeset(
                    &cover,
                    fragment,
                    &CoverRequest {
                        header: &header,
                        student_id: &sid,
                        cover_title: &cli.cover_title,
                    },
                )?;
                cover_paths.push(cover);
            }
        }

        if cli.per_student {
            fs::copy(&sheet, cli.outdir.join(format!("answer_sheet_{}.pdf", sid)))?;
            if let Some(cover) = cover_paths.last() {
                fs::copy(cover, cli.outdir.join(format!("cover_sheet_{}.pdf", sid)))?;
            }
        }

        info!("sheet {} done", sid);
        sheet_paths.push(sheet);
    }

    if !sheet_paths.is_empty() {
        merge::merge(&cli.outdir.join("answer_sheets_all.pdf"), &sheet_paths)?;
    }
    if !cover_paths.is_empty() {
        merge::merge(&cli.outdir.join("cover_sheets_all.pdf"), &cover_paths)?;
    }

    if cli.keep_temp {
        let kept = scratch.keep();
        info!("keeping intermediate sheets in {}", kept.display());
    }

    info!("done");
    Ok(())
}
