//! Sound engine: procedural cue sounds via rodio.
//!
//! Every cue is synthesised into an in-memory WAV buffer at start-up and
//! played fire-and-forget on a detached `Sink`, so playback never holds
//! up the tick loop.
//!
//! Build without the "sound" feature to drop audio entirely; the stub
//! `SoundEngine` then accepts cues and does nothing.

use crate::sim::event::Cue;

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

    use super::Cue;

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        cues: HashMap<Cue, Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        /// `None` when no output device is available.
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            let cues = [Cue::Jump, Cue::Shoot, Cue::Coin, Cue::BulletHit, Cue::Death]
                .into_iter()
                .map(|cue| (cue, Arc::new(encode_wav(&synth(cue)))))
                .collect();
            Some(SoundEngine { _stream: stream, handle, cues })
        }

        pub fn play(&self, cue: Cue) {
            let Some(buf) = self.cues.get(&cue) else { return };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                if let Ok(src) = Decoder::new(Cursor::new(buf.as_ref().clone())) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Synthesis: mono f32 samples in [-1, 1]
    // ════════════════════════════════════════════════════════════

    pub(super) fn synth(cue: Cue) -> Vec<f32> {
        match cue {
            Cue::Jump => sweep(220.0, 660.0, 0.12, 0.25),
            Cue::Shoot => zap(),
            Cue::Coin => notes(&[(988.0, 0.05), (1319.0, 0.18)], 0.25),
            Cue::BulletHit => thud(),
            Cue::Death => notes(&[(392.0, 0.12), (330.0, 0.12), (262.0, 0.3)], 0.3),
        }
    }

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Sine glide from `from` Hz to `to` Hz with a linear fade.
    fn sweep(from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = samples_for(duration);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase += (from + (to - from) * t) / SAMPLE_RATE as f32;
                (phase * TAU).sin() * (1.0 - t) * volume
            })
            .collect()
    }

    /// Square-ish tones played back to back.
    fn notes(seq: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut out = Vec::new();
        for &(freq, duration) in seq {
            let n = samples_for(duration);
            out.extend((0..n).map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).sqrt() * 0.8;
                let wave = (t * freq * TAU).sin() * 0.75 + (t * freq * 3.0 * TAU).sin() * 0.25;
                wave * env * volume
            }));
        }
        out
    }

    /// Falling tone with a noisy edge.
    fn zap() -> Vec<f32> {
        let mut rng = fastrand::Rng::with_seed(0x5EED);
        let tone = sweep(1400.0, 300.0, 0.09, 1.0);
        tone.iter()
            .map(|s| (s * 0.7 + (rng.f32() * 2.0 - 1.0) * 0.3) * 0.2)
            .collect()
    }

    /// Short low noise burst.
    fn thud() -> Vec<f32> {
        let mut rng = fastrand::Rng::with_seed(0xB0B);
        let n = samples_for(0.08);
        let mut last = 0.0_f32;
        (0..n)
            .map(|i| {
                // one-pole low-pass keeps the burst dull
                last += ((rng.f32() * 2.0 - 1.0) - last) * 0.15;
                let env = (1.0 - i as f32 / n as f32).powi(2);
                last * env * 0.5
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV container: 16-bit PCM mono
    // ════════════════════════════════════════════════════════════

    pub(super) fn encode_wav(samples: &[f32]) -> Vec<u8> {
        const CHANNELS: u16 = 1;
        const BITS: u16 = 16;
        let block_align = CHANNELS * BITS / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_len = samples.len() as u32 * block_align as u32;

        let mut buf = Vec::with_capacity(44 + data_len as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_len).to_le_bytes());
        buf.extend_from_slice(b"WAVEfmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&CHANNELS.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&BITS.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_len.to_le_bytes());
        for &s in samples {
            let pcm = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            buf.extend_from_slice(&pcm.to_le_bytes());
        }
        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> {
        Some(SoundEngine)
    }

    pub fn play(&self, _cue: Cue) {}
}

#[cfg(all(test, feature = "sound"))]
mod tests {
    use super::inner::{encode_wav, synth};
    use super::Cue;

    #[test]
    fn every_cue_has_audible_samples() {
        for cue in [Cue::Jump, Cue::Shoot, Cue::Coin, Cue::BulletHit, Cue::Death] {
            let samples = synth(cue);
            assert!(!samples.is_empty(), "{:?}", cue);
            assert!(samples.iter().all(|s| s.abs() <= 1.0), "{:?} clips", cue);
            assert!(samples.iter().any(|s| s.abs() > 0.01), "{:?} is silent", cue);
        }
    }

    #[test]
    fn wav_header_matches_payload() {
        let wav = encode_wav(&[0.0, 0.5, -0.5, 1.0]);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..16], b"WAVEfmt ");
        assert_eq!(wav.len(), 44 + 8);
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 8);
        assert_eq!(i16::from_le_bytes([wav[50], wav[51]]), i16::MAX);
    }
}
