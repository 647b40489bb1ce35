use anyhow::{Context, Result};
use tokio::fs;
use tokio::io::{self, AsyncReadExt};

/// Read the whole source text from `file`, or from stdin if `file` is `None`.
///
/// # Errors
///
/// When failed to io on the file or stdin, or the content is not valid utf-8.
pub async fn read_source(file: Option<&str>) -> Result<String> {
    match file {
        Some(v) => fs::read_to_string(v)
            .await
            .with_context(|| format!("when reading source file {v}")),
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .await
                .context("when reading source from stdin")?;
            Ok(source)
        }
    }
}
