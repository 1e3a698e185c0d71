use crate::error::{HarvestError, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Buffered NDJSON writer over a private temp file.
///
/// Nothing is visible under the final name until [`NdjsonWriter::publish`],
/// which links the finished file into place with exclusive-create semantics.
pub struct NdjsonWriter {
    tmp: PathBuf,
    w: Option<BufWriter<File>>,
}

impl NdjsonWriter {
    /// Open a temp file next to `final_path` (same directory, so the later link
    /// stays on one filesystem).
    pub fn create_for(final_path: &Path) -> Result<Self> {
        let tmp = tmp_path_for(final_path);
        let f = File::create(&tmp).map_err(|e| HarvestError::fs(&tmp, e))?;
        Ok(Self { tmp, w: Some(BufWriter::new(f)) })
    }

    #[inline]
    pub fn write_line(&mut self, s: &str) -> Result<()> {
        if let Some(w) = &mut self.w {
            w.write_all(s.as_bytes())
                .and_then(|_| w.write_all(b"\n"))
                .map_err(|e| HarvestError::fs(&self.tmp, e))?;
        }
        Ok(())
    }

    /// Flush, sync and publish under `final_path`.
    ///
    /// Returns [`HarvestError::AlreadyExists`] if the name is taken. The temp
    /// file is removed either way.
    pub fn publish(mut self, final_path: &Path) -> Result<()> {
        let res = self.finish_tmp().and_then(|_| {
            fs::hard_link(&self.tmp, final_path).map_err(|e| HarvestError::fs(final_path, e))
        });
        let _ = fs::remove_file(&self.tmp);
        res
    }

    fn finish_tmp(&mut self) -> Result<()> {
        if let Some(w) = self.w.take() {
            let f = w.into_inner().map_err(|e| HarvestError::fs(&self.tmp, e.into_error()))?;
            f.sync_all().map_err(|e| HarvestError::fs(&self.tmp, e))?;
        }
        Ok(())
    }
}

impl Drop for NdjsonWriter {
    fn drop(&mut self) {
        // Abandoned before publish: do not leave the temp behind.
        if self.w.take().is_some() {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

/// `.{name}.{pid}.inprogress` in the same directory. The leading dot and the
/// extension keep it out of every snapshot scan.
fn tmp_path_for(final_path: &Path) -> PathBuf {
    let name = final_path.file_name().and_then(|n| n.to_str()).unwrap_or("snapshot");
    let tmp_name = format!(".{}.{}.inprogress", name, std::process::id());
    match final_path.parent() {
        Some(dir) => dir.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}

/// First line of a file with the trailing newline stripped. Empty file gives `""`.
pub fn read_first_line(path: &Path) -> Result<String> {
    let f = File::open(path).map_err(|e| HarvestError::fs(path, e))?;
    let mut rdr = BufReader::new(f);
    let mut buf = String::new();
    rdr.read_line(&mut buf).map_err(|e| HarvestError::fs(path, e))?;
    if buf.ends_with('\n') {
        buf.pop();
        if buf.ends_with('\r') {
            buf.pop();
        }
    }
    Ok(buf)
}

/// All non-empty lines of a file.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let f = File::open(path).map_err(|e| HarvestError::fs(path, e))?;
    let mut out = Vec::new();
    for line in BufReader::new(f).lines() {
        let line = line.map_err(|e| HarvestError::fs(path, e))?;
        if !line.is_empty() {
            out.push(line);
        }
    }
    Ok(out)
}
