//! The symphonia binding against WAV files synthesised on the fly.

use std::f32::consts::PI;
use std::fs;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use wavedeck::decode::{DecodeSource, Decoded, Decoders, SymphoniaDecoders, SymphoniaSource};
use wavedeck::PlaybackError;

const RATE: u32 = 8000;

fn write_sine(path: &Path, channels: u16, secs: u32) {
    let spec = WavSpec {
        channels,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for i in 0..RATE * secs {
        let v = ((2.0 * PI * 440.0 * i as f32 / RATE as f32).sin() * 0.5 * i16::MAX as f32) as i16;
        for _ in 0..channels {
            writer.write_sample(v).unwrap();
        }
    }
    writer.finalize().unwrap();
}

fn read_to_end(source: &mut dyn DecodeSource) -> usize {
    let mut samples = 0;
    loop {
        match source.read_next().unwrap() {
            Decoded::Pcm(pcm) => samples += pcm.len(),
            Decoded::EndOfStream => return samples,
        }
    }
}

#[test]
fn reports_stream_info() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tone.wav");
    write_sine(&path, 2, 3);

    let source = SymphoniaSource::open(&path).unwrap();
    let info = source.info();
    assert_eq!(info.sample_rate, RATE);
    assert_eq!(info.channels, 2);
    assert_eq!(info.total_frames, Some(3 * RATE as u64));
    assert!((info.duration_secs() - 3.0).abs() < 1e-9);
    assert_eq!(source.position(), 0);
}

#[test]
fn decodes_every_frame_then_ends() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tone.wav");
    write_sine(&path, 2, 2);

    let mut source = SymphoniaDecoders.open(&path).unwrap();
    assert_eq!(read_to_end(source.as_mut()), 2 * 2 * RATE as usize);
    assert_eq!(source.position(), 2 * RATE as u64);
    // Stays at the end.
    assert_eq!(source.read_next().unwrap(), Decoded::EndOfStream);
}

#[test]
fn seeks_to_an_absolute_frame() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tone.wav");
    write_sine(&path, 1, 4);

    let mut source = SymphoniaSource::open(&path).unwrap();
    for _ in 0..3 {
        source.read_next().unwrap();
    }
    let target = 2 * RATE as u64;
    source.seek(target).unwrap();
    let pos = source.position();
    assert!(pos <= target && target - pos < RATE as u64, "landed at {pos}");

    let rest = read_to_end(&mut source);
    assert!(rest as u64 >= 4 * RATE as u64 - target);
    assert!((rest as u64) <= 4 * RATE as u64 - pos);
}

#[test]
fn seeking_past_the_end_ends_the_stream() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tone.wav");
    write_sine(&path, 1, 1);

    let mut source = SymphoniaSource::open(&path).unwrap();
    source.seek(10 * RATE as u64).unwrap();
    assert_eq!(source.position(), RATE as u64);
    assert_eq!(source.read_next().unwrap(), Decoded::EndOfStream);

    // Seeking back revives it.
    source.seek(0).unwrap();
    assert!(matches!(source.read_next().unwrap(), Decoded::Pcm(pcm) if !pcm.is_empty()));
}

#[test]
fn missing_and_garbage_files_fail_to_open() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("missing.wav");
    assert!(matches!(
        SymphoniaSource::open(&missing),
        Err(PlaybackError::Open { .. })
    ));

    let garbage = tmp.path().join("noise.mp3");
    fs::write(&garbage, b"definitely not audio").unwrap();
    let err = SymphoniaDecoders.open(&garbage).err().unwrap();
    assert!(matches!(err, PlaybackError::Open { .. }));
    assert!(err.to_string().contains("noise.mp3"));
}
