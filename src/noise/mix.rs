//! Mixing generated noise tracks into one soundtrack.

use std::path::{Path, PathBuf};

use crate::config::{EncoderSettings, NoiseSettings};
use crate::encoder::Invocation;
use crate::models::NoiseTrack;

use super::synth::{NoiseError, NoiseResult, NoiseSynthesizer};

/// Mixes noise tracks via duration-matched averaging.
///
/// `amix` with `duration=longest` lets the longest input win; shorter
/// inputs simply stop contributing after their end. A post-mix gain
/// compensates for the averaging attenuation.
pub struct NoiseMixer<'a> {
    noise: &'a NoiseSettings,
    encoder: &'a EncoderSettings,
}

impl<'a> NoiseMixer<'a> {
    pub fn new(noise: &'a NoiseSettings, encoder: &'a EncoderSettings) -> Self {
        Self { noise, encoder }
    }

    /// Build the mix argument vector.
    pub fn build_args(&self, tracks: &[NoiseTrack], output: &Path) -> NoiseResult<Invocation> {
        if tracks.len() < 2 {
            return Err(NoiseError::TooFewTracks(tracks.len()));
        }

        let inputs: String = (0..tracks.len()).map(|i| format!("[{}:a]", i)).collect();
        let filter = format!(
            "{}amix=inputs={}:duration=longest,volume={}[a]",
            inputs,
            tracks.len(),
            self.noise.mix_gain
        );

        let mut inv = Invocation::new(&self.encoder.ffmpeg_path).arg("-y");
        for track in tracks {
            inv = inv.arg("-i").path_arg(&track.path);
        }

        Ok(inv
            .args(["-filter_complex", &filter])
            .args(["-map", "[a]"])
            .args(["-c:a", "libmp3lame"])
            .args(["-q:a", "2"])
            .args(["-ar", &self.noise.sample_rate.to_string()])
            .path_arg(output))
    }

    /// Mix the tracks into one soundtrack file.
    ///
    /// Track files are deleted after mixing, whether the mix succeeded
    /// or not - they never outlive this call.
    pub fn mix(&self, tracks: &[NoiseTrack], output: &Path) -> NoiseResult<PathBuf> {
        let result = self.run_mix(tracks, output);

        for track in tracks {
            NoiseSynthesizer::discard(track);
        }

        result
    }

    fn run_mix(&self, tracks: &[NoiseTrack], output: &Path) -> NoiseResult<PathBuf> {
        for track in tracks {
            if !track.path.exists() {
                return Err(NoiseError::MissingTrack(track.path.clone()));
            }
        }

        let inv = self.build_args(tracks, output)?;

        tracing::info!(tracks = tracks.len(), output = %output.display(), "mixing soundtrack");

        let result = inv
            .run()
            .map_err(|e| NoiseError::LaunchFailed(e.to_string()))?;

        if !result.success {
            return Err(NoiseError::MixFailed {
                exit_code: result.exit_code,
                stderr: result.stderr_tail(20),
            });
        }

        Ok(output.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoiseColor;

    fn track(color: NoiseColor, path: &str) -> NoiseTrack {
        NoiseTrack {
            color,
            duration_seconds: 600,
            seed: 1,
            volume: 0.5,
            bass_gain_db: 0,
            mid_gain_db: 0,
            treble_gain_db: 0,
            amplitude_variation: 1.0,
            path: PathBuf::from(path),
        }
    }

    #[test]
    fn mix_args_use_longest_duration_policy() {
        let noise = NoiseSettings::default();
        let encoder = EncoderSettings::default();
        let mixer = NoiseMixer::new(&noise, &encoder);

        let tracks = vec![
            track(NoiseColor::Pink, "/work/pink.mp3"),
            track(NoiseColor::Brown, "/work/brown.mp3"),
        ];
        let inv = mixer
            .build_args(&tracks, Path::new("/work/mixed.mp3"))
            .unwrap();

        let filter = inv
            .arg_slice()
            .iter()
            .find(|a| a.contains("amix"))
            .unwrap();
        assert_eq!(filter, "[0:a][1:a]amix=inputs=2:duration=longest,volume=1.2[a]");
    }

    #[test]
    fn single_track_cannot_be_mixed() {
        let noise = NoiseSettings::default();
        let encoder = EncoderSettings::default();
        let mixer = NoiseMixer::new(&noise, &encoder);

        let tracks = vec![track(NoiseColor::Pink, "/work/pink.mp3")];
        assert!(matches!(
            mixer.build_args(&tracks, Path::new("/work/mixed.mp3")),
            Err(NoiseError::TooFewTracks(1))
        ));
    }

    #[test]
    fn missing_track_fails_before_mixing() {
        let noise = NoiseSettings::default();
        let encoder = EncoderSettings::default();
        let mixer = NoiseMixer::new(&noise, &encoder);

        let tracks = vec![
            track(NoiseColor::Pink, "/nonexistent/pink.mp3"),
            track(NoiseColor::Brown, "/nonexistent/brown.mp3"),
        ];
        assert!(matches!(
            mixer.mix(&tracks, Path::new("/nonexistent/mixed.mp3")),
            Err(NoiseError::MissingTrack(_))
        ));
    }
}
