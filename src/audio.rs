//! Audible recording cues.
//!
//! A short ascending chime marks recording start, a descending tone marks
//! stop. Cues are synthesized at runtime (no audio assets) and played on a
//! throwaway thread; playback failure is never fatal to a recording.

use rodio::buffer::SamplesBuffer;
use rodio::OutputStreamBuilder;
use std::thread;
use std::time::Duration;

/// Types of sounds that can be played.
#[derive(Debug, Clone, Copy)]
pub enum SoundType {
    RecordingStart,
    RecordingStop,
}

/// Play a cue without blocking the caller.
pub fn play_sound(sound_type: SoundType) {
    thread::spawn(move || {
        if let Err(e) = play_sound_blocking(sound_type) {
            log::warn!("Failed to play sound: {}", e);
        }
    });
}

fn play_sound_blocking(
    sound_type: SoundType,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let stream = OutputStreamBuilder::open_default_stream()?;

    // Dropping `stream` stops playback, so keep tail padding; some devices
    // take a moment to wake after being idle and would clip the cue.
    const TAIL_PAD: Duration = Duration::from_millis(250);

    let (source, duration) = build_cue_source(sound_type);
    stream.mixer().add(source);
    thread::sleep(duration + TAIL_PAD);

    Ok(())
}

fn build_cue_source(sound_type: SoundType) -> (SamplesBuffer, Duration) {
    const SAMPLE_RATE: u32 = 44_100;
    const CHANNELS: u16 = 1;

    fn frames_for(d: Duration) -> usize {
        (d.as_secs_f32() * SAMPLE_RATE as f32).round() as usize
    }

    fn push_silence(samples: &mut Vec<f32>, d: Duration) {
        samples.extend(std::iter::repeat(0.0).take(frames_for(d)));
    }

    fn soft_clip(x: f32) -> f32 {
        x.tanh()
    }

    /// A single decaying chime note. `freq_end_hz` lets the stop cue glide
    /// downward.
    fn push_chime(samples: &mut Vec<f32>, freq_hz: f32, freq_end_hz: f32, d: Duration, amp: f32) {
        use std::f32::consts::PI;

        let n = frames_for(d);
        if n == 0 {
            return;
        }

        let attack = ((SAMPLE_RATE as f32) * 0.004).round() as usize;
        let attack = attack.min(n).max(1);
        let decay_k = 6.0_f32;

        let mut phase = 0.0_f32;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let progress = i as f32 / n as f32;
            let freq = freq_hz + (freq_end_hz - freq_hz) * progress;
            phase += 2.0 * PI * freq / SAMPLE_RATE as f32;

            let env = (-decay_k * t / d.as_secs_f32().max(0.001)).exp();
            let atk = if i < attack {
                i as f32 / attack as f32
            } else {
                1.0
            };

            let base = phase.sin();
            let h2 = (phase * 2.0).sin() * 0.25;

            samples.push(soft_clip((base + h2) * amp * env * atk));
        }
    }

    let mut samples: Vec<f32> = Vec::new();
    let duration;

    match sound_type {
        SoundType::RecordingStart => {
            // Ascending two-note chime: E5 then A5.
            let d1 = Duration::from_millis(120);
            let gap = Duration::from_millis(20);
            let d2 = Duration::from_millis(140);

            push_chime(&mut samples, 660.0, 660.0, d1, 0.22);
            push_silence(&mut samples, gap);
            push_chime(&mut samples, 880.0, 880.0, d2, 0.20);

            duration = d1 + gap + d2;
        }
        SoundType::RecordingStop => {
            // Single descending tone: E5 gliding down to A4.
            let d = Duration::from_millis(160);
            push_chime(&mut samples, 660.0, 440.0, d, 0.20);
            duration = d;
        }
    }

    (SamplesBuffer::new(CHANNELS, SAMPLE_RATE, samples), duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_cue_is_longer_than_stop_cue() {
        let (_, start) = build_cue_source(SoundType::RecordingStart);
        let (_, stop) = build_cue_source(SoundType::RecordingStop);
        assert!(start > stop);
    }

    #[test]
    fn cue_durations_are_short() {
        for sound in [SoundType::RecordingStart, SoundType::RecordingStop] {
            let (_, duration) = build_cue_source(sound);
            assert!(duration <= Duration::from_millis(500));
        }
    }
}
