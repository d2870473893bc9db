//! End-to-end mixing through real WAV files

use std::path::{Path, PathBuf};

use ringmix::{render_to_wav, DrainStatus, Mixer, MixerConfig, MixerError, SoundHandle};

fn write_wav(dir: &Path, name: &str, channels: u16, bits: u16, rate: u32, samples: &[i16]) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels,
        sample_rate: rate,
        bits_per_sample: bits,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for &s in samples {
        if bits == 8 {
            writer.write_sample(s as i8).unwrap();
        } else {
            writer.write_sample(s).unwrap();
        }
    }
    writer.finalize().unwrap();
    path
}

fn small_mixer(capacity: usize) -> Mixer {
    Mixer::new(MixerConfig {
        capacity,
        mix_chunk_samples: 2,
        ..MixerConfig::default()
    })
    .unwrap()
}

#[test]
fn overlapping_wav_plays_sum_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_wav(dir.path(), "a.wav", 2, 16, 44100, &[100, 100, 100, 100]);
    let b = write_wav(dir.path(), "b.wav", 2, 16, 44100, &[50, 50]);

    let mixer = small_mixer(10);
    let a = mixer.load(&a).unwrap();
    let b = mixer.load(&b).unwrap();
    assert_eq!((a.index(), b.index()), (0, 1));

    mixer.play(a).unwrap();
    mixer.play(b).unwrap();

    let drain = mixer.drain();
    let mut out = [0i16; 3];
    assert_eq!(drain.fill(&mut out), DrainStatus::Continue);
    assert_eq!(out, [150, 150, 100]);

    let mut rest = [0i16; 7];
    drain.fill(&mut rest);
    assert_eq!(rest, [100, 0, 0, 0, 0, 0, 0]);

    // A full lap later the same cells are still silent
    let mut lap = [1i16; 10];
    drain.fill(&mut lap);
    assert_eq!(lap, [0; 10]);
}

#[test]
fn saturation_is_asymmetric_to_i16_range() {
    let dir = tempfile::tempdir().unwrap();
    let loud = write_wav(dir.path(), "loud.wav", 2, 16, 44100, &[32767, -32767, 32767, -32768]);

    let mixer = small_mixer(16);
    let loud = mixer.load(&loud).unwrap();
    mixer.play(loud).unwrap();
    mixer.play(loud).unwrap();

    let mut out = [0i16; 4];
    mixer.drain().fill(&mut out);
    assert_eq!(out, [32767, -32767, 32767, -32767]);
}

#[test]
fn wraparound_play_matches_unbounded_mix() {
    let dir = tempfile::tempdir().unwrap();
    let ramp: Vec<i16> = (1..=12).map(|i| i * 10).collect();
    let path = write_wav(dir.path(), "ramp.wav", 2, 16, 44100, &ramp);

    let capacity = 16;
    let mixer = small_mixer(capacity);
    let ramp_handle = mixer.load(&path).unwrap();
    let drain = mixer.drain();

    // Unbounded reference: play at t=0 and again at t=6, read 20 samples from t=10
    let mut reference = vec![0i32; 40];
    for start in [10usize, 16] {
        for (i, &s) in ramp.iter().enumerate() {
            reference[start + i] += i32::from(s);
        }
    }

    let mut skip = [0i16; 10];
    drain.fill(&mut skip);
    mixer.play(ramp_handle).unwrap();
    let mut first = [0i16; 6];
    drain.fill(&mut first);
    mixer.play(ramp_handle).unwrap();
    let mut second = [0i16; 14];
    drain.fill(&mut second);

    let got: Vec<i32> = first.iter().chain(second.iter()).map(|&s| i32::from(s)).collect();
    assert_eq!(got, reference[10..30].to_vec());
}

#[test]
fn mono_and_8bit_files_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mono = write_wav(dir.path(), "mono.wav", 1, 16, 44100, &[1, 2, 3]);
    let eight = write_wav(dir.path(), "eight.wav", 2, 8, 44100, &[1, 2]);
    let rate = write_wav(dir.path(), "rate.wav", 2, 16, 22050, &[1, 2]);

    let mixer = small_mixer(16);
    for path in [&mono, &eight, &rate] {
        let err = mixer.load(path).unwrap_err();
        assert!(matches!(err, MixerError::FormatMismatch { .. }), "{err}");
    }
    assert_eq!(mixer.sound_count(), 0);
    assert_eq!(mixer.stats().drain.periods, 0);
}

#[test]
fn missing_file_is_recoverable() {
    let mixer = small_mixer(16);
    let err = mixer.load("/no/such/file.wav").unwrap_err();
    assert!(matches!(err, MixerError::Io(_)));

    // The mixer keeps working afterwards
    let dir = tempfile::tempdir().unwrap();
    let ok = write_wav(dir.path(), "ok.wav", 2, 16, 44100, &[1, 1]);
    assert!(mixer.load(&ok).is_ok());
}

#[test]
fn unknown_handle_is_rejected() {
    let mixer = small_mixer(8);
    let err = mixer.play(SoundHandle::from_raw(0)).unwrap_err();
    assert!(matches!(err, MixerError::InvalidHandle(_)));

    let mut out = [7i16; 8];
    mixer.drain().fill(&mut out);
    assert_eq!(out, [0; 8]);
}

#[test]
fn sound_longer_than_buffer_is_rejected_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let long = write_wav(dir.path(), "long.wav", 2, 16, 44100, &[1; 20]);

    let mixer = small_mixer(16);
    let err = mixer.load(&long).unwrap_err();
    assert!(matches!(
        err,
        MixerError::CapacityExceeded {
            length: 20,
            capacity: 16
        }
    ));
}

#[test]
fn registry_full_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "a.wav", 2, 16, 44100, &[1, 1]);

    let mixer = Mixer::new(MixerConfig {
        max_sounds: 1,
        ..MixerConfig::default()
    })
    .unwrap();
    mixer.load(&path).unwrap();
    let err = mixer.load(&path).unwrap_err();
    assert!(matches!(err, MixerError::RegistryFull { max: 1 }));
}

#[test]
fn offline_render_contains_scheduled_plays() {
    let dir = tempfile::tempdir().unwrap();
    let click = write_wav(dir.path(), "click.wav", 2, 16, 44100, &[1000, -1000, 500, -500]);
    let out = dir.path().join("render.wav");

    let mixer = small_mixer(1024);
    let click = mixer.load(&click).unwrap();
    mixer.play(click).unwrap();
    mixer.play(click).unwrap();

    let stream = mixer.config().stream;
    let frames = render_to_wav(mixer.drain(), &out, 4, &stream).unwrap();
    assert_eq!(frames, 4);

    let mut reader = hound::WavReader::open(&out).unwrap();
    assert_eq!(reader.spec().sample_rate, 44100);
    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples, vec![2000, -2000, 1000, -1000, 0, 0, 0, 0]);
}

#[test]
fn handle_works_from_another_thread() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "a.wav", 2, 16, 44100, &[3, 3, 3, 3]);

    let mixer = small_mixer(64);
    let handle = mixer.handle();
    let loaded = std::thread::spawn(move || {
        let sound = handle.load(&path)?;
        handle.play(sound)?;
        Ok::<_, MixerError>(sound)
    })
    .join()
    .unwrap()
    .unwrap();

    assert_eq!(loaded.index(), 0);
    let mut out = [0i16; 4];
    mixer.drain().fill(&mut out);
    assert_eq!(out, [3; 4]);
}
