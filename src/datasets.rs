//! Manifest reading, image loading and fixed-shape padding.
use crate::tasks::Task;
use anyhow::{anyhow, ensure, Context, Result};
use csv::{ReaderBuilder, StringRecordsIntoIter};
use image::{imageops, RgbImage};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Ground-truth label strings of one sample. `"0"` means negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub road_type: String,
    pub crossing: String,
}

impl Labels {
    pub fn get(&self, task: Task) -> &str {
        match task {
            Task::Road => &self.road_type,
            Task::Cross => &self.crossing,
        }
    }
}

/// One manifest line with its image path already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub image_path: PathBuf,
    pub labels: Labels,
}

impl ManifestEntry {
    /// File name of the image, used to name annotated copies.
    pub fn basename(&self) -> String {
        self.image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Streaming reader over a `<image> <road_type> <crossing>` manifest.
///
/// Image paths are resolved against the manifest's own directory. Trailing
/// whitespace on a line is ignored. Empty lines are skipped by the reader, so
/// they never count as malformed; a line of only spaces is rejected.
pub struct Manifest {
    path: PathBuf,
    image_dir: PathBuf,
    records: StringRecordsIntoIter<File>,
}

impl Manifest {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .map_err(|e| anyhow!("Failed to open {}: {}", path.display(), e))?;
        let records = ReaderBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(file)
            .into_records();
        let image_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self {
            path,
            image_dir,
            records,
        })
    }
}

impl Iterator for Manifest {
    type Item = Result<ManifestEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(record.map_err(|e| anyhow!("{}: {}", self.path.display(), e)).and_then(|record| {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let fields = trim_trailing(record.iter().collect());
            ensure!(
                fields.len() == 3,
                "{}:{}: expected 3 fields, found {}",
                self.path.display(),
                line,
                fields.len()
            );
            Ok(ManifestEntry {
                image_path: self.image_dir.join(fields[0]),
                labels: Labels {
                    road_type: fields[1].to_string(),
                    crossing: fields[2].to_string(),
                },
            })
        }))
    }
}

/// Strip trailing whitespace from a split line: blank trailing fields are
/// dropped and the last remaining one is right-trimmed.
fn trim_trailing(mut fields: Vec<&str>) -> Vec<&str> {
    while fields.last().is_some_and(|f| f.trim_end().is_empty()) {
        fields.pop();
    }
    if let Some(last) = fields.last_mut() {
        *last = last.trim_end();
    }
    fields
}

/// Decode an image file to 8-bit RGB.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let image = image::open(path).with_context(|| format!("Failed to read image {}", path.display()))?;
    Ok(image.to_rgb8())
}

/// Center `image` on a zero-filled `height x width` canvas.
///
/// Offsets use integer division, so odd slack leaves the extra row/column
/// at the bottom/right. The canvas must be at least as large as the image.
pub fn center_pad(image: &RgbImage, height: u32, width: u32) -> Result<RgbImage> {
    let (w, h) = image.dimensions();
    ensure!(
        height >= h && width >= w,
        "padding target {}x{} is smaller than image {}x{}",
        height,
        width,
        h,
        w
    );
    let mut canvas = RgbImage::new(width, height);
    let top = (height - h) / 2;
    let left = (width - w) / 2;
    imageops::replace(&mut canvas, image, i64::from(left), i64::from(top));
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::io::Write;

    #[test]
    fn pad_centers_source() {
        let src = RgbImage::from_pixel(10, 10, Rgb([200, 100, 50]));
        let padded = center_pad(&src, 20, 20).unwrap();
        assert_eq!(padded.dimensions(), (20, 20));
        for (x, y, px) in padded.enumerate_pixels() {
            let inside = (5..15).contains(&x) && (5..15).contains(&y);
            if inside {
                assert_eq!(*px, Rgb([200, 100, 50]), "at ({x}, {y})");
            } else {
                assert_eq!(*px, Rgb([0, 0, 0]), "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn pad_uses_rows_for_height() {
        let src = RgbImage::from_pixel(4, 2, Rgb([9, 9, 9]));
        let padded = center_pad(&src, 6, 10).unwrap();
        assert_eq!(padded.dimensions(), (10, 6));
        assert_eq!(*padded.get_pixel(3, 2), Rgb([9, 9, 9]));
        assert_eq!(*padded.get_pixel(6, 3), Rgb([9, 9, 9]));
        assert_eq!(*padded.get_pixel(2, 2), Rgb([0, 0, 0]));
        assert_eq!(*padded.get_pixel(3, 4), Rgb([0, 0, 0]));
    }

    #[test]
    fn pad_rejects_small_canvas() {
        let src = RgbImage::new(10, 10);
        assert!(center_pad(&src, 9, 20).is_err());
        assert!(center_pad(&src, 20, 9).is_err());
        assert!(center_pad(&src, 10, 10).is_ok());
    }

    #[test]
    fn manifest_resolves_paths_and_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("val.txt");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "images/a.png 1 0").unwrap();
        writeln!(f, "images/b.png 0 1").unwrap();
        drop(f);

        let entries: Vec<_> = Manifest::open(&path).unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].image_path, dir.path().join("images/a.png"));
        assert_eq!(entries[0].labels.get(Task::Road), "1");
        assert_eq!(entries[1].labels.get(Task::Cross), "1");
        assert_eq!(entries[1].basename(), "b.png");
    }

    #[test]
    fn manifest_rejects_wrong_field_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.txt");
        std::fs::write(&path, "a.png 1 0\nb.png 1\n").unwrap();
        let results: Vec<_> = Manifest::open(&path).unwrap().collect();
        assert!(results[0].is_ok());
        let err = results[1].as_ref().unwrap_err().to_string();
        assert!(err.contains("expected 3 fields"), "{err}");
    }

    #[test]
    fn manifest_ignores_trailing_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("val.txt");
        std::fs::write(&path, "a.png 1 0 \nb.png 0 1\t\nc.png 0 0  \n").unwrap();
        let entries: Vec<_> = Manifest::open(&path).unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].labels.crossing, "0");
        assert_eq!(entries[1].labels.crossing, "1");
        assert_eq!(entries[2].labels.road_type, "0");
    }

    #[test]
    fn manifest_skips_empty_lines_but_rejects_space_only_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("val.txt");
        std::fs::write(&path, "a.png 1 0\n\nb.png 0 0\n").unwrap();
        let entries: Vec<_> = Manifest::open(&path).unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(entries.len(), 2);

        std::fs::write(&path, "a.png 1 0\n   \nb.png 0 0\n").unwrap();
        let results: Vec<_> = Manifest::open(&path).unwrap().collect();
        let err = results[1].as_ref().unwrap_err().to_string();
        assert!(err.contains("expected 3 fields, found 0"), "{err}");
    }

    #[test]
    fn missing_manifest_is_an_error() {
        assert!(Manifest::open("/nonexistent/val.txt").is_err());
    }
}
