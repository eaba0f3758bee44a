use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::manifest::MANIFEST_FILE;
use crate::Result;

/// Packs the manifest and the written containers from `mod_dir` into a
/// deflated zip at `zip_path`. Entry names are the relative asset names.
pub fn write_mod_zip(mod_dir: &Path, written: &[String], zip_path: &Path) -> Result<()> {
    if let Some(parent) = zip_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut zip = ZipWriter::new(File::create(zip_path)?);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let names = std::iter::once(MANIFEST_FILE).chain(written.iter().map(String::as_str));
    for name in names {
        let mut path = mod_dir.to_path_buf();
        path.extend(name.split('/'));
        let bytes = fs::read(&path)?;
        zip.start_file(name, options)?;
        zip.write_all(&bytes)?;
    }

    zip.finish()?;
    Ok(())
}
