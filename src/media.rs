use std::process::{Command, Stdio};

use image::RgbaImage;

use crate::{
    error::{ReelError, ReelResult},
    music::synth::{MIX_CHANNELS, MIX_SAMPLE_RATE},
};

pub fn decode_image(bytes: &[u8]) -> ReelResult<RgbaImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ReelError::media(format!("failed to decode image: {e}")))?;
    Ok(img.to_rgba8())
}

#[derive(Clone, Debug)]
pub struct AudioPcm {
    pub sample_rate: u32,
    pub channels: u16,
    pub interleaved: Vec<f32>,
}

impl AudioPcm {
    pub fn frames(&self) -> usize {
        self.interleaved.len() / usize::from(self.channels)
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

/// Decode arbitrary encoded audio bytes to interleaved stereo f32 at the mix
/// rate by piping through the system `ffmpeg` binary.
pub fn decode_audio_to_pcm(bytes: &[u8]) -> ReelResult<AudioPcm> {
    if !crate::encode::is_ffmpeg_on_path() {
        return Err(ReelError::media(
            "ffmpeg is required to decode audio, but was not found on PATH",
        ));
    }

    let tmp = std::env::temp_dir().join(format!(
        "promoreel_audio_in_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    ));
    std::fs::write(&tmp, bytes)
        .map_err(|e| ReelError::media(format!("failed to stage audio bytes: {e}")))?;
    let guard = TempFileGuard(Some(tmp.clone()));

    let output = Command::new("ffmpeg")
        .args(["-loglevel", "error", "-i"])
        .arg(&tmp)
        .args([
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            &MIX_CHANNELS.to_string(),
            "-ar",
            &MIX_SAMPLE_RATE.to_string(),
            "pipe:1",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| ReelError::media(format!("failed to spawn ffmpeg for audio decode: {e}")))?;
    drop(guard);

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ReelError::media(format!(
            "ffmpeg audio decode failed: {}",
            stderr.trim()
        )));
    }

    let mut interleaved = Vec::with_capacity(output.stdout.len() / 4);
    for chunk in output.stdout.chunks_exact(4) {
        interleaved.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    if interleaved.is_empty() {
        return Err(ReelError::media("ffmpeg produced no audio samples"));
    }

    Ok(AudioPcm {
        sample_rate: MIX_SAMPLE_RATE,
        channels: MIX_CHANNELS,
        interleaved,
    })
}

pub(crate) struct TempFileGuard(pub Option<std::path::PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_image_accepts_png_bytes() {
        let img = RgbaImage::from_pixel(3, 2, image::Rgba([9, 8, 7, 255]));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(0, 0).0, [9, 8, 7, 255]);
    }

    #[test]
    fn decode_image_rejects_garbage() {
        assert!(decode_image(&[0, 1, 2, 3]).is_err());
    }

    #[test]
    fn audio_pcm_duration_math() {
        let pcm = AudioPcm {
            sample_rate: 44_100,
            channels: 2,
            interleaved: vec![0.0; 44_100 * 2],
        };
        assert_eq!(pcm.frames(), 44_100);
        assert!((pcm.duration_secs() - 1.0).abs() < 1e-9);
    }
}
