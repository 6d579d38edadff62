use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{error, info};
use rayon::prelude::*;
use refasm::{generator::Generated, pruning::PruneStats, Error, GeneratorConfig, ImageCodec, ReferenceAssemblyGenerator};

use crate::commands::common::{collect_images, default_output_path, file_display_name};

pub struct GenerateOptions<'a> {
    pub output: Option<&'a Path>,
    pub force: bool,
    pub config: GeneratorConfig,
}

/// What happened to one input file.
#[derive(Debug)]
pub enum FileOutcome {
    Written(Generated),
    Skipped,
}

pub fn run(path: &Path, opts: &GenerateOptions) -> anyhow::Result<()> {
    if !path.exists() {
        return Err(Error::InputNotFound(path.to_path_buf()).into());
    }

    let generator = ReferenceAssemblyGenerator::new(ImageCodec::new(), opts.config.clone());
    if path.is_dir() {
        run_directory(path, opts, &generator)
    } else {
        run_single(path, opts, &generator)
    }
}

fn run_single(
    path: &Path,
    opts: &GenerateOptions,
    generator: &ReferenceAssemblyGenerator<ImageCodec>,
) -> anyhow::Result<()> {
    let output_path = opts
        .output
        .map_or_else(|| default_output_path(path), Path::to_path_buf);
    process_file(path, &output_path, opts.force, generator)?;
    Ok(())
}

fn run_directory(
    dir: &Path,
    opts: &GenerateOptions,
    generator: &ReferenceAssemblyGenerator<ImageCodec>,
) -> anyhow::Result<()> {
    let output_root = opts
        .output
        .map_or_else(|| default_output_path(dir), Path::to_path_buf);
    let files = collect_images(dir)?;

    let outcomes: Vec<anyhow::Result<FileOutcome>> = files
        .par_iter()
        .map(|file| process_file(file, &batch_output_path(dir, file, &output_root), opts.force, generator))
        .collect();

    let mut totals = PruneStats::new();
    let mut written = 0;
    let mut escalated = 0;
    let mut skipped = 0;
    let mut failed = 0;
    for (file, outcome) in files.iter().zip(outcomes) {
        match outcome {
            Ok(FileOutcome::Written(generated)) => {
                written += 1;
                totals.merge(&generated.stats);
                if generated.attempts > 1 {
                    escalated += 1;
                }
            }
            Ok(FileOutcome::Skipped) => skipped += 1,
            Err(e) => {
                error!("{}: {e:#}", file.display());
                failed += 1;
            }
        }
    }

    info!(
        "Processed {} files: {written} written ({escalated} escalated), {skipped} skipped, {failed} failed",
        files.len()
    );
    if written > 0 {
        info!("Total: {totals}");
    }
    Ok(())
}

/// Generates the reference form of `input` into `output`.
///
/// Inputs that are not managed modules are skipped; every other failure is an error.
pub fn process_file(
    input: &Path,
    output: &Path,
    force: bool,
    generator: &ReferenceAssemblyGenerator<ImageCodec>,
) -> anyhow::Result<FileOutcome> {
    if output.exists() && !force {
        return Err(Error::OutputAlreadyExists(output.to_path_buf()).into());
    }

    let bytes = std::fs::read(input).with_context(|| format!("failed to read input: {}", input.display()))?;
    let generated = match generator.generate(&bytes) {
        Ok(generated) => generated,
        Err(e) if e.is_skippable() => {
            info!("Skipping {}: {e}", file_display_name(input));
            return Ok(FileOutcome::Skipped);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to generate reference assembly for {}", input.display()))
        }
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory: {}", parent.display()))?;
    }
    std::fs::write(output, &generated.bytes)
        .with_context(|| format!("failed to write output: {}", output.display()))?;

    info!(
        "{} -> {} ({} attempt(s), {}): {}",
        file_display_name(input),
        file_display_name(output),
        generated.attempts,
        generated.policy,
        generated.stats
    );
    Ok(FileOutcome::Written(generated))
}

/// Output location of `file` when a directory batch rooted at `dir` writes to `root`.
pub fn batch_output_path(dir: &Path, file: &Path, root: &Path) -> PathBuf {
    root.join(file.strip_prefix(dir).unwrap_or(file))
}
