// src/packer/mod.rs
// =============================================================================
// The full pipeline: crawl -> (clutter-free) -> encode -> write.
//
// Both output formats share the same crawl and assembly; they only differ in
// the final encode step, which is picked through PackFormat.
//
// Output is written to a temporary file next to the destination and renamed
// into place only after encoding succeeded. A failed or cancelled pack never
// leaves a partial archive behind.
// =============================================================================

mod clutter;
mod html;
mod webarchive;

use crate::archive::ArchiveDocument;
use crate::config::PackOptions;
use crate::crawl;
use crate::error::PackError;
use clap::ValueEnum;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub use clutter::make_clutter_free;

/// Which archive format to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PackFormat {
    /// Safari .webarchive (binary property list)
    #[value(name = "webarchive")]
    WebArchive,
    /// One self-contained HTML file with sub-resources inlined as data: URIs
    Html,
}

impl PackFormat {
    pub fn encode(&self, document: &ArchiveDocument) -> Result<Vec<u8>, PackError> {
        match self {
            PackFormat::WebArchive => webarchive::encode(document),
            PackFormat::Html => html::encode(document),
        }
    }
}

/// Crawls, encodes and writes one archive; returns the document that was written
pub async fn pack(
    options: &PackOptions,
    format: PackFormat,
    cancel: CancellationToken,
) -> Result<ArchiveDocument, PackError> {
    let config = Arc::new(options.crawl.clone());
    let mut document = crawl::crawl(config, cancel).await?;

    if options.clutter_free {
        document = make_clutter_free(document)?;
    }

    let bytes = format.encode(&document)?;
    write_atomically(&options.output, &bytes)?;
    info!(
        "wrote {} bytes ({:?}) to {}",
        bytes.len(),
        format,
        options.output.display()
    );

    Ok(document)
}

fn write_atomically(output: &Path, bytes: &[u8]) -> Result<(), PackError> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)
        .map_err(|e| PackError::Encoding(format!("cannot create file in {}: {}", dir.display(), e)))?;
    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|e| PackError::Encoding(format!("write failed: {}", e)))?;
    file.persist(output)
        .map_err(|e| PackError::Encoding(format!("cannot write {}: {}", output.display(), e)))?;

    Ok(())
}
