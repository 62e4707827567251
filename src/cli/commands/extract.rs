//! Single document extraction command.

use std::path::Path;
use std::sync::Arc;

use console::style;

use pdfharvest::extract::extract_in_worker;
use pdfharvest::TextExtractor;

/// Print the text of one PDF.
pub async fn cmd_extract(file: &Path, layout: bool) -> anyhow::Result<()> {
    let extractor = Arc::new(TextExtractor::new().with_layout(layout));
    let extracted = extract_in_worker(extractor, file.to_path_buf()).await?;

    println!("{}", extracted.text);
    eprintln!(
        "{} {} ({} pages, {} chars)",
        style("✓").green(),
        file.display(),
        extracted.page_count,
        extracted.text.chars().count()
    );
    Ok(())
}
