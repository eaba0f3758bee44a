use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::scd::SCD_MAGIC;
use crate::Result;

/// How a pass decides whether a file is a container.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FileFilter {
    /// `.scd` extension only; a wrong signature surfaces later as a parse error.
    Extension,
    /// Any file whose first bytes are the SCD signature; others are skipped.
    Signature,
}

/// One container picked up by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundFile {
    pub path: PathBuf,
    /// Path relative to the game root with `/` separators.
    pub name: String,
}

pub fn relative_name(game_dir: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(game_dir).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn primary_battle_dir(game_dir: &Path, language: &str) -> PathBuf {
    game_dir.join("voice").join(language).join("battle")
}

fn is_scd_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("scd"))
        .unwrap_or(false)
}

fn starts_with_magic(path: &Path) -> Result<bool> {
    let mut buf = [0u8; 8];
    let mut file = File::open(path)?;
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            return Ok(false);
        }
        filled += n;
    }
    Ok(&buf == SCD_MAGIC)
}

/// Regular files directly inside `dir` that pass `filter`, sorted by path.
/// A missing directory yields nothing.
fn files_in(dir: &Path, filter: FileFilter) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let keep = match filter {
            FileFilter::Extension => is_scd_extension(path),
            FileFilter::Signature => starts_with_magic(path)?,
        };
        if keep {
            out.push(path.to_path_buf());
        } else {
            log::debug!("skipping {}", path.display());
        }
    }
    out.sort();
    Ok(out)
}

fn found(game_dir: &Path, paths: Vec<PathBuf>) -> Vec<FoundFile> {
    paths
        .into_iter()
        .map(|path| FoundFile {
            name: relative_name(game_dir, &path),
            path,
        })
        .collect()
}

/// `voice/<language>/battle/*.scd`.
pub fn find_primary_voices(game_dir: &Path, language: &str) -> Result<Vec<FoundFile>> {
    let dir = primary_battle_dir(game_dir, language);
    Ok(found(game_dir, files_in(&dir, FileFilter::Extension)?))
}

/// `remastered/obj/*.a.<language>/voice/battle/<language>/*`, keeping only
/// files that carry the SCD signature.
pub fn find_remastered_voices(game_dir: &Path, language: &str) -> Result<Vec<FoundFile>> {
    let obj = game_dir.join("remastered").join("obj");
    if !obj.is_dir() {
        return Ok(Vec::new());
    }

    let suffix = format!(".a.{language}");
    let mut dirs = Vec::new();
    for entry in WalkDir::new(&obj).min_depth(1).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_dir() && entry.file_name().to_string_lossy().ends_with(&suffix) {
            dirs.push(entry.into_path());
        }
    }
    dirs.sort();

    let mut paths = Vec::new();
    for dir in dirs {
        let voice_dir = dir.join("voice").join("battle").join(language);
        paths.extend(files_in(&voice_dir, FileFilter::Signature)?);
    }
    Ok(found(game_dir, paths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path, contents: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn primary_pass_filters_by_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let battle = tmp.path().join("voice").join("us").join("battle");
        touch(&battle.join("b.scd"), b"SEDBSSCF");
        touch(&battle.join("a.SCD"), b"whatever");
        touch(&battle.join("readme.txt"), b"SEDBSSCF");
        touch(&battle.join("nested").join("c.scd"), b"SEDBSSCF");

        let files = find_primary_voices(tmp.path(), "us").unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["voice/us/battle/a.SCD", "voice/us/battle/b.scd"]);
    }

    #[test]
    fn remastered_pass_filters_by_signature() {
        let tmp = tempfile::tempdir().unwrap();
        let obj = tmp.path().join("remastered").join("obj");
        touch(&obj.join("P_EX100.a.us/voice/battle/us/v001"), b"SEDBSSCF\x02\0\0\0");
        touch(&obj.join("P_EX100.a.us/voice/battle/us/v002"), b"not an scd file");
        touch(&obj.join("P_EX100.a.us/voice/battle/us/short"), b"SEDB");
        touch(&obj.join("P_EX100.a.fr/voice/battle/fr/v001"), b"SEDBSSCF");
        touch(&obj.join("P_AL000.a.us/voice/battle/us/v009.scd"), b"SEDBSSCF");

        let files = find_remastered_voices(tmp.path(), "us").unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "remastered/obj/P_AL000.a.us/voice/battle/us/v009.scd",
                "remastered/obj/P_EX100.a.us/voice/battle/us/v001",
            ]
        );
    }

    #[test]
    fn missing_directories_yield_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(find_primary_voices(tmp.path(), "us").unwrap().is_empty());
        assert!(find_remastered_voices(tmp.path(), "us").unwrap().is_empty());
    }
}
