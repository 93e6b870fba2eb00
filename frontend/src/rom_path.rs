//! ROM path resolution: a cartridge image file, or a ZIP archive holding
//! one.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use vcs_machines::rom_loader::{RomImage, RomLoadError};

/// File extensions recognized as cartridge images inside an archive.
const IMAGE_EXTENSIONS: &[&str] = &["a26", "bin"];

/// Load a cartridge image.
///
/// A path ending in `.zip` is opened as an archive and its first
/// `.a26`/`.bin` entry is used; anything else is read as a raw image.
pub fn load_rom(path: &Path) -> Result<RomImage, RomLoadError> {
    if has_extension(path, "zip") {
        return load_from_zip(path);
    }
    RomImage::from_file(path)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn zip_error(e: zip::result::ZipError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, format!("invalid ZIP: {e}"))
}

fn load_from_zip(path: &Path) -> Result<RomImage, RomLoadError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut archive = zip::ZipArchive::new(reader).map_err(zip_error)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(zip_error)?;

        // Skip directories
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        let entry_path = Path::new(&name);
        if !IMAGE_EXTENSIONS
            .iter()
            .any(|ext| has_extension(entry_path, ext))
        {
            continue;
        }

        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        let file_name = entry_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or(name);
        return RomImage::from_bytes(&file_name, data);
    }

    Err(RomLoadError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("no .a26 or .bin image in {}", path.display()),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn create_test_zip(dir: &Path, name: &str, files: &[(&str, &[u8])]) -> std::path::PathBuf {
        let zip_path = dir.join(name);
        let file = File::create(&zip_path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (fname, data) in files {
            zip.start_file(*fname, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
        zip_path
    }

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn resolve_plain_image() {
        let dir = scratch_dir("vcs_rompath_test_plain");
        std::fs::write(dir.join("combat.a26"), [0xCC; 4]).unwrap();

        let rom = load_rom(&dir.join("combat.a26")).unwrap();
        assert_eq!(rom.name(), "combat.a26");
        assert_eq!(rom.data(), &[0xCC; 4]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn resolve_first_image_in_zip() {
        let dir = scratch_dir("vcs_rompath_test_zip");
        let zip_path = create_test_zip(
            &dir,
            "pitfall.zip",
            &[
                ("readme.txt", b"not a rom"),
                ("roms/Pitfall.A26", &[0xAA; 16]),
                ("alt.bin", &[0xBB; 16]),
            ],
        );

        let rom = load_rom(&zip_path).unwrap();
        assert_eq!(rom.name(), "Pitfall.A26");
        assert_eq!(rom.data(), &[0xAA; 16]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn zip_without_image_is_error() {
        let dir = scratch_dir("vcs_rompath_test_empty_zip");
        let zip_path = create_test_zip(&dir, "docs.zip", &[("manual.pdf", b"%PDF")]);

        assert!(matches!(load_rom(&zip_path), Err(RomLoadError::Io(_))));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn corrupt_zip_is_error() {
        let dir = scratch_dir("vcs_rompath_test_corrupt");
        std::fs::write(dir.join("bad.zip"), b"PK but not really").unwrap();

        assert!(matches!(
            load_rom(&dir.join("bad.zip")),
            Err(RomLoadError::Io(_))
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
