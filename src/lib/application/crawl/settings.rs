//! Points the spider's date window at a single day.

use super::error::CrawlError;
use chrono::{Local, NaiveDate};
use regex::{Captures, Regex};
use std::fs;
use std::path::Path;
use tracing::info;

const DATE_KEYS: [&str; 2] = ["START_DATE", "END_DATE"];

pub fn yesterday() -> NaiveDate {
    let today = Local::now().date_naive();
    today.pred_opt().unwrap_or(today)
}

/// Rewrite every `START_DATE = ...` and `END_DATE = ...` line to `'<date>'`,
/// keeping indentation and anything after the value.
pub fn patch_dates(content: &str, date: NaiveDate) -> Result<String, CrawlError> {
    let quoted = format!("'{}'", date.format("%Y-%m-%d"));
    let mut patched = content.to_string();
    for key in DATE_KEYS {
        let pattern = Regex::new(&format!(r"(?m)^([ \t]*{key}[ \t]*=[ \t]*)\S+(.*)$"))?;
        if !pattern.is_match(&patched) {
            return Err(CrawlError::MissingAssignment(key));
        }
        patched = pattern
            .replace_all(&patched, |caps: &Captures| {
                format!("{}{}{}", &caps[1], quoted, &caps[2])
            })
            .into_owned();
    }
    Ok(patched)
}

pub fn update_settings(path: &Path, date: NaiveDate) -> Result<(), CrawlError> {
    if !path.exists() {
        return Err(CrawlError::SettingsNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path).map_err(|e| CrawlError::io(path, e))?;
    let patched = patch_dates(&content, date)?;
    fs::write(path, patched).map_err(|e| CrawlError::io(path, e))?;
    info!(path = %path.display(), %date, "updated crawl date window");
    Ok(())
}
