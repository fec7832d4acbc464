//! WAVE and raw encoding for rendered stereo audio.

use ks_ir::SAMPLE_RATE;
use std::io::Write;

const NUM_CHANNELS: u16 = 2;

/// Sample encoding of the written audio.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WavFormat {
    /// 16-bit signed integer PCM
    #[default]
    Pcm16,
    /// 32-bit IEEE float
    Float32,
}

impl WavFormat {
    const fn bytes_per_sample(self) -> u16 {
        match self {
            WavFormat::Pcm16 => 2,
            WavFormat::Float32 => 4,
        }
    }

    const fn format_tag(self) -> u16 {
        match self {
            WavFormat::Pcm16 => 1,
            WavFormat::Float32 => 3,
        }
    }
}

/// Write interleaved stereo audio at 44.1 kHz as a WAVE file.
pub fn write_wav(w: &mut impl Write, audio: &[f32], format: WavFormat) -> std::io::Result<()> {
    let data_size = audio.len() as u32 * format.bytes_per_sample() as u32;
    write_riff_header(w, format, data_size)?;
    write_fmt_chunk(w, format)?;
    if format == WavFormat::Float32 {
        write_fact_chunk(w, audio.len() as u32)?;
    }
    w.write_all(b"data")?;
    w.write_all(&data_size.to_le_bytes())?;
    write_raw(w, audio, format)
}

/// Write the samples alone, without any header.
pub fn write_raw(w: &mut impl Write, audio: &[f32], format: WavFormat) -> std::io::Result<()> {
    match format {
        WavFormat::Pcm16 => {
            for &v in audio {
                w.write_all(&to_pcm16(v).to_le_bytes())?;
            }
        }
        WavFormat::Float32 => {
            for &v in audio {
                w.write_all(&v.to_le_bytes())?;
            }
        }
    }
    Ok(())
}

pub fn wav_bytes(audio: &[f32], format: WavFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    write_wav(&mut buf, audio, format).expect("Vec<u8> write cannot fail");
    buf
}

pub fn raw_bytes(audio: &[f32], format: WavFormat) -> Vec<u8> {
    let mut buf = Vec::with_capacity(audio.len() * format.bytes_per_sample() as usize);
    write_raw(&mut buf, audio, format).expect("Vec<u8> write cannot fail");
    buf
}

fn to_pcm16(v: f32) -> i16 {
    ((v * 32767.0) as i32).clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

fn write_riff_header(w: &mut impl Write, format: WavFormat, data_size: u32) -> std::io::Result<()> {
    // fmt chunk grows by 2 and a 12-byte fact chunk is added for float
    let header_size = match format {
        WavFormat::Pcm16 => 36,
        WavFormat::Float32 => 50,
    };
    w.write_all(b"RIFF")?;
    w.write_all(&(header_size + data_size).to_le_bytes())?;
    w.write_all(b"WAVE")
}

fn write_fmt_chunk(w: &mut impl Write, format: WavFormat) -> std::io::Result<()> {
    let block_align = NUM_CHANNELS * format.bytes_per_sample();
    let bits_per_sample = 8 * format.bytes_per_sample();
    let chunk_size: u32 = match format {
        WavFormat::Pcm16 => 16,
        WavFormat::Float32 => 18,
    };
    w.write_all(b"fmt ")?;
    w.write_all(&chunk_size.to_le_bytes())?;
    w.write_all(&format.format_tag().to_le_bytes())?;
    w.write_all(&NUM_CHANNELS.to_le_bytes())?;
    w.write_all(&SAMPLE_RATE.to_le_bytes())?;
    w.write_all(&(SAMPLE_RATE * block_align as u32).to_le_bytes())?;
    w.write_all(&block_align.to_le_bytes())?;
    w.write_all(&bits_per_sample.to_le_bytes())?;
    if format == WavFormat::Float32 {
        w.write_all(&0u16.to_le_bytes())?;
    }
    Ok(())
}

/// `sample_count` counts individual floats, not frames.
fn write_fact_chunk(w: &mut impl Write, sample_count: u32) -> std::io::Result<()> {
    w.write_all(b"fact")?;
    w.write_all(&4u32.to_le_bytes())?;
    w.write_all(&sample_count.to_le_bytes())
}
