use super::error::AnalysisError;
use std::path::{Path, PathBuf};

/// `posts.csv` -> `posts_output.csv`, next to the input.
pub fn output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}_output.csv"))
}

/// Flatten a CSV file to text: one line per record (header included), fields
/// joined with commas.
pub fn render_report(path: &Path) -> Result<String, AnalysisError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| AnalysisError::csv(path, e))?;

    let mut lines = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AnalysisError::csv(path, e))?;
        let fields: Vec<&str> = record.iter().collect();
        lines.push(fields.join(","));
    }
    Ok(lines.join("\n").trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn output_sits_next_to_input() {
        assert_eq!(
            output_path(Path::new("/data/结果文件/东方精工.csv")),
            PathBuf::from("/data/结果文件/东方精工_output.csv")
        );
    }

    #[test]
    fn records_are_joined_with_commas() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.csv");
        fs::write(
            &path,
            "微博正文,思考过程,模型回复\n\"订单增长, 利好\",想想,1.否\n第二条,,2.是\n",
        )
        .expect("write");

        let text = render_report(&path).expect("render");
        assert_eq!(
            text,
            "微博正文,思考过程,模型回复\n订单增长, 利好,想想,1.否\n第二条,,2.是"
        );
    }
}
