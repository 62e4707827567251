//! Page access through poppler-utils (`pdfinfo`, `pdftotext`).

use std::path::{Path, PathBuf};
use std::process::Command;

use super::{ExtractionError, PageSource};

const POPPLER_HINT: &str = "install poppler-utils";

/// Handle command output, extracting stdout on success or returning appropriate error.
fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionError::ExtractionFailed(format!(
                    "{}: {}",
                    error_prefix,
                    stderr.trim()
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ExtractionError::ToolNotFound(
            format!("{} ({})", tool_name, POPPLER_HINT),
        )),
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// Parse the `Pages:` line of `pdfinfo` output.
fn parse_page_count(pdfinfo_output: &str) -> Option<u32> {
    pdfinfo_output
        .lines()
        .find(|line| line.starts_with("Pages:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
}

/// Pages of one PDF file, read on demand with poppler-utils.
pub struct PopplerPages {
    path: PathBuf,
    layout: bool,
}

impl PopplerPages {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            layout: true,
        }
    }

    /// Toggle `pdftotext -layout`.
    pub fn with_layout(mut self, layout: bool) -> Self {
        self.layout = layout;
        self
    }
}

impl PageSource for PopplerPages {
    fn page_count(&self) -> Result<u32, ExtractionError> {
        let output = Command::new("pdfinfo").arg(&self.path).output();
        let stdout = handle_cmd_output(output, "pdfinfo", "pdfinfo failed")?;

        parse_page_count(&stdout).ok_or_else(|| {
            ExtractionError::ExtractionFailed(format!(
                "pdfinfo reported no page count for {}",
                self.path.display()
            ))
        })
    }

    fn page_text(&self, page: u32) -> Result<String, ExtractionError> {
        let page_str = page.to_string();
        let mut cmd = Command::new("pdftotext");
        if self.layout {
            cmd.arg("-layout");
        }
        let output = cmd
            .args(["-enc", "UTF-8", "-f", &page_str, "-l", &page_str])
            .arg(&self.path)
            .arg("-") // Output to stdout
            .output();

        let text = handle_cmd_output(
            output,
            "pdftotext",
            &format!("pdftotext failed on page {}", page),
        )?;

        // pdftotext terminates every page with a form feed
        Ok(text.trim_end_matches('\u{c}').to_string())
    }
}

/// Check if required tools are available.
pub fn check_tools() -> Vec<(String, bool)> {
    ["pdftotext", "pdfinfo"]
        .iter()
        .map(|tool| (tool.to_string(), which::which(tool).is_ok()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_count() {
        let info = "Title:          memo\nProducer:       x\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_page_count(info), Some(12));
        assert_eq!(parse_page_count("Title: nothing"), None);
    }

    #[test]
    fn test_missing_tool_is_tool_not_found() {
        let result = Command::new("definitely-not-a-poppler-binary").output();
        let err = handle_cmd_output(result, "definitely-not-a-poppler-binary", "failed").unwrap_err();
        assert!(matches!(err, ExtractionError::ToolNotFound(_)));
    }

    #[test]
    fn test_check_tools() {
        let tools = check_tools();
        assert_eq!(tools.len(), 2);
        for (tool, available) in tools {
            println!("{}: {}", tool, if available { "found" } else { "missing" });
        }
    }
}
