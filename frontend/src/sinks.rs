//! Headless output sinks: PNG frame dumps and a WAV recording.
//!
//! Both report the first I/O failure and then drop further output, so a
//! full disk never stops emulation.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::{error, info};

use vcs_core::core::{AudioSink, PixelSink};

/// Writes every presented frame as `frame_NNNNNN.png` under a directory.
pub struct PngFrames {
    dir: PathBuf,
    next: u64,
    failed: bool,
}

impl PngFrames {
    pub fn create(dir: &Path) -> std::io::Result<Self> {
        fs::create_dir_all(dir)?;
        info!("writing frames to {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            next: 0,
            failed: false,
        })
    }

    fn write_png(path: &Path, width: u32, height: u32, rgb: &[u8]) -> Result<(), png::EncodingError> {
        let file = File::create(path)?;
        let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(rgb)?;
        Ok(())
    }
}

impl PixelSink for PngFrames {
    fn present_frame(&mut self, width: u32, height: u32, rgb: &[u8]) {
        if self.failed {
            return;
        }
        let path = self.dir.join(format!("frame_{:06}.png", self.next));
        self.next += 1;
        if let Err(e) = Self::write_png(&path, width, height, rgb) {
            error!("{}: {e}; frame output disabled", path.display());
            self.failed = true;
        }
    }
}

/// Records all audio to a 16-bit mono WAV file. The header is finalized
/// when the sink is dropped.
pub struct WavFile {
    path: PathBuf,
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    sample_rate: u32,
}

impl WavFile {
    pub fn create(path: &Path, sample_rate: u32) -> Result<Self, hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = hound::WavWriter::create(path, spec)?;
        info!("recording audio to {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(writer),
            sample_rate,
        })
    }
}

impl AudioSink for WavFile {
    fn push_samples(&mut self, sample_rate: u32, samples: &[i16]) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        if sample_rate != self.sample_rate {
            error!(
                "{}: sample rate changed from {} to {sample_rate}; audio output disabled",
                self.path.display(),
                self.sample_rate
            );
            self.writer = None;
            return;
        }
        for &sample in samples {
            if let Err(e) = writer.write_sample(sample) {
                error!("{}: {e}; audio output disabled", self.path.display());
                self.writer = None;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn png_frames_are_numbered() {
        let dir = scratch_dir("vcs_sink_test_png");
        let mut sink = PngFrames::create(&dir).unwrap();
        let rgb = vec![0x80; 4 * 2 * 3];
        sink.present_frame(4, 2, &rgb);
        sink.present_frame(4, 2, &rgb);

        let decoder = png::Decoder::new(File::open(dir.join("frame_000001.png")).unwrap());
        let reader = decoder.read_info().unwrap();
        assert_eq!(reader.info().width, 4);
        assert_eq!(reader.info().height, 2);
        assert!(!dir.join("frame_000002.png").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn wav_holds_pushed_samples() {
        let dir = scratch_dir("vcs_sink_test_wav");
        let path = dir.join("out.wav");
        {
            let mut sink = WavFile::create(&path, 31_400).unwrap();
            sink.push_samples(31_400, &[0, 1000, -1000]);
            sink.push_samples(31_400, &[5]);
        }

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 31_400);
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 1000, -1000, 5]);

        fs::remove_dir_all(&dir).unwrap();
    }
}
