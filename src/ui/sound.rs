/// Sound engine: procedural sound effects and a looping background track via rodio.
///
/// All buffers are generated in memory at init time. Effects are
/// fire-and-forget (detached sinks); the music track owns one sink that is
/// replaced each time a level starts.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

/// Every effect the game can trigger.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Sfx {
    FakeTileFall,
    FakeTileFallThump,
    LevelComplete,
    MaskActivate,
    MaskReady,
    MaskRecharging,
    ReachTheExit,
}

impl Sfx {
    pub const ALL: [Sfx; 7] = [
        Sfx::FakeTileFall,
        Sfx::FakeTileFallThump,
        Sfx::LevelComplete,
        Sfx::MaskActivate,
        Sfx::MaskReady,
        Sfx::MaskRecharging,
        Sfx::ReachTheExit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Sfx::FakeTileFall => "fake_tile_fall",
            Sfx::FakeTileFallThump => "fake_tile_fall_thump",
            Sfx::LevelComplete => "level_complete",
            Sfx::MaskActivate => "mask_activate",
            Sfx::MaskReady => "mask_ready",
            Sfx::MaskRecharging => "mask_recharging",
            Sfx::ReachTheExit => "reach_the_exit",
        }
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use log::{debug, info, warn};
    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

    use super::Sfx;

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        effects: HashMap<Sfx, Arc<Vec<u8>>>,
        sfx_muted: bool,

        music_track: Arc<Vec<f32>>,
        music: Option<Sink>,
        music_volume: f32,
        music_muted: bool,
        music_paused: bool,
    }

    impl SoundEngine {
        pub fn new(music_volume: f32) -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("no audio device, sound disabled: {e}");
                    return None;
                }
            };

            let effects = Sfx::ALL.iter()
                .map(|&s| (s, Arc::new(make_wav(&generate(s)))))
                .collect();
            info!("sound ready: {} effects", Sfx::ALL.len());

            Some(SoundEngine {
                _stream: stream,
                handle,
                effects,
                sfx_muted: false,
                music_track: Arc::new(gen_music_loop()),
                music: None,
                music_volume: music_volume.clamp(0.0, 1.0),
                music_muted: false,
                music_paused: false,
            })
        }

        pub fn play(&self, sfx: Sfx) {
            if self.sfx_muted { return; }
            let Some(buf) = self.effects.get(&sfx) else { return };
            debug!("sfx {}", sfx.name());
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn toggle_sfx_mute(&mut self) -> bool {
            self.sfx_muted = !self.sfx_muted;
            info!("sound effects {}", if self.sfx_muted { "muted" } else { "unmuted" });
            self.sfx_muted
        }

        /// (Re)start the background loop from the top.
        pub fn start_music(&mut self) {
            let sink = match Sink::try_new(&self.handle) {
                Ok(s) => s,
                Err(e) => {
                    warn!("music sink unavailable: {e}");
                    return;
                }
            };
            let src = SamplesBuffer::new(1, SAMPLE_RATE, self.music_track.as_ref().clone());
            sink.append(src.repeat_infinite());
            sink.set_volume(self.effective_volume());
            if self.music_paused {
                sink.pause();
            }
            // dropping the previous sink stops it
            self.music = Some(sink);
            info!("background music started");
        }

        pub fn stop_music(&mut self) {
            self.music = None;
        }

        pub fn toggle_music_pause(&mut self) -> bool {
            self.music_paused = !self.music_paused;
            if let Some(sink) = &self.music {
                if self.music_paused { sink.pause() } else { sink.play() }
            }
            info!("music {}", if self.music_paused { "paused" } else { "resumed" });
            self.music_paused
        }

        pub fn toggle_music_mute(&mut self) -> bool {
            self.music_muted = !self.music_muted;
            self.apply_volume();
            info!("music {}", if self.music_muted { "muted" } else { "unmuted" });
            self.music_muted
        }

        pub fn set_music_volume(&mut self, volume: f32) {
            self.music_volume = volume.clamp(0.0, 1.0);
            self.apply_volume();
        }

        fn effective_volume(&self) -> f32 {
            if self.music_muted { 0.0 } else { self.music_volume }
        }

        fn apply_volume(&self) {
            if let Some(sink) = &self.music {
                sink.set_volume(self.effective_volume());
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn generate(sfx: Sfx) -> Vec<f32> {
        match sfx {
            Sfx::FakeTileFall => gen_fall(),
            Sfx::FakeTileFallThump => gen_thump(),
            Sfx::LevelComplete => gen_fanfare(),
            Sfx::MaskActivate => gen_shimmer(true),
            Sfx::MaskRecharging => gen_shimmer(false),
            Sfx::MaskReady => gen_chime(),
            Sfx::ReachTheExit => gen_intro(),
        }
    }

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Append one note: sine plus a little 2nd harmonic, linear decay to `floor`.
    fn push_note(out: &mut Vec<f32>, freq: f32, duration: f32, volume: f32, floor: f32) {
        let n = samples_for(duration);
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32) * (1.0 - floor);
            let wave = (t * freq * TAU).sin() * 0.75 + (t * freq * 2.0 * TAU).sin() * 0.25;
            out.push(wave * env * volume);
        }
    }

    /// Long descending whistle: the floor giving way.
    fn gen_fall() -> Vec<f32> {
        let n = samples_for(0.6);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 900.0 * (1.0 - t * 0.8);
                phase += freq / SAMPLE_RATE as f32;
                (phase * TAU).sin() * (1.0 - t).powf(0.7) * 0.25
            })
            .collect()
    }

    /// Low noisy impact.
    fn gen_thump() -> Vec<f32> {
        let n = samples_for(0.25);
        let mut rng: u32 = 0x2545_f491;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * (90.0 - t * 40.0) * TAU).sin();
                rng = rng.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                (tone * 0.7 + noise * 0.3) * (1.0 - t).powf(2.0) * 0.5
            })
            .collect()
    }

    /// Rising (activate) or falling (recharging) sweep with tremolo.
    fn gen_shimmer(rising: bool) -> Vec<f32> {
        let n = samples_for(0.3);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let sweep = if rising { t } else { 1.0 - t };
                let freq = 400.0 + sweep * 800.0;
                phase += freq / SAMPLE_RATE as f32;
                let tremolo = 0.7 + 0.3 * (t * 40.0 * TAU).sin();
                (phase * TAU).sin() * tremolo * (1.0 - t) * 0.22
            })
            .collect()
    }

    fn gen_chime() -> Vec<f32> {
        let mut out = Vec::new();
        push_note(&mut out, 1047.0, 0.08, 0.25, 0.6); // C6
        push_note(&mut out, 1568.0, 0.18, 0.25, 0.0); // G6
        out
    }

    fn gen_fanfare() -> Vec<f32> {
        let mut out = Vec::new();
        for freq in [523.0_f32, 659.0, 784.0] { // C5 E5 G5
            push_note(&mut out, freq, 0.1, 0.3, 0.7);
        }
        push_note(&mut out, 1047.0, 0.4, 0.3, 0.0);
        out
    }

    /// Level intro: a short motif played before the music comes in.
    fn gen_intro() -> Vec<f32> {
        let motif = [
            (392.0_f32, 0.15), (523.0, 0.15), (659.0, 0.15), (784.0, 0.3),
            (659.0, 0.15), (784.0, 0.6),
        ];
        let mut out = Vec::new();
        for (freq, dur) in motif {
            push_note(&mut out, freq, dur, 0.25, 0.4);
        }
        out
    }

    /// Eight-bar minor arpeggio over a bass line, ~7.7s per loop.
    fn gen_music_loop() -> Vec<f32> {
        const BEAT: f32 = 0.24;
        let bars: [(f32, [f32; 4]); 4] = [
            (110.0, [220.0, 262.0, 330.0, 262.0]),  // Am
            (87.3, [175.0, 220.0, 262.0, 220.0]),   // F
            (131.0, [262.0, 330.0, 392.0, 330.0]),  // C
            (98.0, [196.0, 247.0, 294.0, 247.0]),   // G
        ];
        let mut out = Vec::new();
        for _ in 0..2 {
            for (bass, arp) in bars {
                for (k, &note) in arp.iter().enumerate() {
                    let start = out.len();
                    push_note(&mut out, note, BEAT, 0.12, 0.3);
                    // Bass on beats 1 and 3
                    if k % 2 == 0 {
                        let n = out.len() - start;
                        for i in 0..n {
                            let t = i as f32 / SAMPLE_RATE as f32;
                            out[start + i] += (t * bass * TAU).sin() * 0.1 * (1.0 - i as f32 / n as f32);
                        }
                    }
                }
            }
        }
        out
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a 16-bit PCM WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let channels: u16 = 1;
        let bits: u16 = 16;
        let block_align = channels * bits / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_size = samples.len() as u32 * block_align as u32;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            buf.extend_from_slice(&((s.clamp(-1.0, 1.0) * 32767.0) as i16).to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn every_effect_has_audible_samples() {
            for sfx in Sfx::ALL {
                let s = generate(sfx);
                assert!(!s.is_empty(), "{}", sfx.name());
                assert!(s.iter().all(|v| v.abs() <= 1.0), "{} clips", sfx.name());
                assert!(s.iter().any(|v| v.abs() > 0.01), "{} is silent", sfx.name());
            }
        }

        #[test]
        fn wav_header_matches_payload() {
            let wav = make_wav(&[0.0, 0.5, -0.5]);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + 6);
            assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 6);
        }

        #[test]
        fn music_loop_stays_in_range() {
            let m = gen_music_loop();
            assert!(m.len() > SAMPLE_RATE as usize * 5);
            assert!(m.iter().all(|v| v.abs() <= 1.0));
        }
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
    pub fn new(_music_volume: f32) -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
    pub fn toggle_sfx_mute(&mut self) -> bool { false }
    pub fn start_music(&mut self) {}
    pub fn stop_music(&mut self) {}
    pub fn toggle_music_pause(&mut self) -> bool { false }
    pub fn toggle_music_mute(&mut self) -> bool { false }
    pub fn set_music_volume(&mut self, _volume: f32) {}
}
