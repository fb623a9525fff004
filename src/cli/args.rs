use clap::Parser;
use std::path::{Path, PathBuf};

use crate::config::defaults::DEFAULT_TARGET_SIZE_MB;

#[derive(Parser, Debug)]
#[command(name = "pdf-compress")]
#[command(
    author,
    version,
    about = "Compress a PDF to a target size by re-encoding images and re-rendering pages"
)]
pub struct Args {
    /// Input PDF file path
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output PDF file path (defaults to <input>_compressed.pdf beside the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Target size in MB
    #[arg(short = 's', long, default_value_t = DEFAULT_TARGET_SIZE_MB)]
    pub size: f64,

    /// Print a content analysis and suggested strategy before compressing
    #[arg(long)]
    pub analyze: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Get the output path, defaulting to `<stem>_compressed<ext>` beside the input
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.input))
    }
}

/// Build `<stem>_compressed<ext>` in the input's directory
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match input.extension() {
        Some(ext) => format!("{}_compressed.{}", stem, ext.to_string_lossy()),
        None => format!("{}_compressed", stem),
    };
    input.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        let path = default_output_path(Path::new("/tmp/docs/report.pdf"));
        assert_eq!(path, PathBuf::from("/tmp/docs/report_compressed.pdf"));
    }

    #[test]
    fn test_default_output_path_without_extension() {
        let path = default_output_path(Path::new("scan"));
        assert_eq!(path, PathBuf::from("scan_compressed"));
    }

    #[test]
    fn test_parse_args() {
        let args = Args::parse_from(["pdf-compress", "in.pdf", "-s", "2.5", "-vv"]);
        assert_eq!(args.input, PathBuf::from("in.pdf"));
        assert!((args.size - 2.5).abs() < f64::EPSILON);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.output_path(), PathBuf::from("in_compressed.pdf"));
    }

    #[test]
    fn test_explicit_output() {
        let args = Args::parse_from(["pdf-compress", "in.pdf", "-o", "out.pdf"]);
        assert_eq!(args.output_path(), PathBuf::from("out.pdf"));
        assert!((args.size - 1.0).abs() < f64::EPSILON);
    }
}
