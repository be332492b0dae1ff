use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

pub fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);

    match ProgressStyle::with_template(PROGRESS_TEMPLATE) {
        Ok(style) => pb.set_style(style.progress_chars("=> ")),
        Err(e) => warn!("Invalid progress template: {e}"),
    }

    pb
}
