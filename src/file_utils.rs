use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Directory that receives the clips: `<media dir>/<media stem>_segments`
    pub fn segment_output_dir<P: AsRef<Path>>(media_file: P) -> PathBuf {
        let media_file = media_file.as_ref();
        let stem = media_file.file_stem().unwrap_or_default().to_string_lossy();
        let parent = media_file.parent().unwrap_or_else(|| Path::new(""));

        parent.join(format!("{}_segments", stem))
    }

    // @generates: Output path for one clip
    // @params: media_file, output_dir, 1-based segment index
    pub fn segment_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        media_file: P1,
        output_dir: P2,
        index: usize,
    ) -> PathBuf {
        let media_file = media_file.as_ref();
        let stem = media_file.file_stem().unwrap_or_default().to_string_lossy();

        let mut output_filename = format!("{}_segment_{:03}", stem, index);
        if let Some(ext) = media_file.extension() {
            output_filename.push('.');
            output_filename.push_str(&ext.to_string_lossy());
        }

        output_dir.as_ref().join(output_filename)
    }
}
