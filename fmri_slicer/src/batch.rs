// THEORY:
// The batch layer is the thin file-system shell around the pure pipeline. It
// knows where sheets live, how outputs are laid out on disk, and nothing about
// slicing or clustering.
//
// On-disk layout for an input `<input_dir>/<stem>.png`:
//
//   <slices_dir>/<stem>/1.png, 2.png, ...        cropped slices
//   <clusters_dir>/<stem>/1.png, 2.png, ...      cluster visualizations
//   <clusters_dir>/<stem>/<stem>.csv             SliceNumber,ClusterCount

use crate::error::{Error, Result};
use crate::pipeline::{ReportRow, Sheet, SheetReport};
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};

pub const REPORT_HEADER: [&str; 2] = ["SliceNumber", "ClusterCount"];

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Empties `dir` if it exists, then (re)creates it.
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        if let Err(err) = fs::remove_dir_all(dir) {
            log::warn!("could not fully clear '{}': {}", dir.display(), err);
        }
    }
    fs::create_dir_all(dir).map_err(io_error(dir))
}

/// Regular files in `input_dir` whose name ends in `suffix`, sorted by name.
pub fn discover_sheets(input_dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(input_dir).map_err(io_error(input_dir))?;
    let mut sheets = Vec::new();
    for entry in entries {
        let entry = entry.map_err(io_error(input_dir))?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(suffix));
        if matches && path.is_file() {
            sheets.push(path);
        }
    }
    sheets.sort();
    Ok(sheets)
}

/// File name without its extension; names sheet output directories.
pub fn sheet_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn load_sheet(path: &Path) -> Result<Sheet> {
    let image = image::open(path)
        .map_err(|source| Error::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgb8();
    Ok(Sheet {
        name: sheet_name(path),
        image,
    })
}

fn save_image(image: &RgbImage, path: &Path) -> Result<()> {
    image.save(path).map_err(|source| Error::Image {
        path: path.to_path_buf(),
        source,
    })
}

fn numbered_path(dir: &Path, number: usize, extension: &str) -> PathBuf {
    dir.join(format!("{number}.{extension}"))
}

/// Writes every slice of the report as `<dir>/<n>.<extension>`.
pub fn write_slices(dir: &Path, report: &SheetReport, extension: &str) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(io_error(dir))?;
    report
        .slices
        .iter()
        .map(|analysis| {
            let path = numbered_path(dir, analysis.slice_number, extension);
            save_image(&analysis.slice.image, &path)?;
            Ok(path)
        })
        .collect()
}

fn report_error(path: &Path) -> impl FnOnce(csv::Error) -> Error + '_ {
    move |source| Error::Report {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes a `SliceNumber,ClusterCount` CSV.
pub fn write_report(path: &Path, rows: &[ReportRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(report_error(path))?;
    writer.write_record(REPORT_HEADER).map_err(report_error(path))?;
    for row in rows {
        writer
            .write_record([row.slice_number.to_string(), row.cluster_count.to_string()])
            .map_err(report_error(path))?;
    }
    writer.flush().map_err(io_error(path))
}

/// Writes the cluster visualizations and the CSV report of one sheet under `dir`.
pub fn write_cluster_outputs(dir: &Path, report: &SheetReport, extension: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(io_error(dir))?;
    for analysis in &report.slices {
        save_image(&analysis.visualization, &numbered_path(dir, analysis.slice_number, extension))?;
    }
    let report_path = dir.join(format!("{}.csv", report.sheet_name));
    write_report(&report_path, &report.rows())?;
    Ok(report_path)
}

/// Writes everything a batch run produces for one sheet.
pub fn write_sheet_outputs(
    slices_dir: &Path,
    clusters_dir: &Path,
    report: &SheetReport,
    extension: &str,
) -> Result<PathBuf> {
    write_slices(&slices_dir.join(&report.sheet_name), report, extension)?;
    write_cluster_outputs(&clusters_dir.join(&report.sheet_name), report, extension)
}
