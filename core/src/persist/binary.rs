use crate::prelude::{PipelineError, PipelineResult};
use crate::processing::framer::AudioBuffer;
use crate::processing::srp_map::TauTable;
use ndarray::{Array2, Array3};
use num_complex::Complex32;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

pub const AUDIO_MAGIC: [u8; 4] = *b"AUD\0";
pub const FFT_MAGIC: [u8; 4] = *b"FFT\0";
pub const GCC_MAGIC: [u8; 4] = *b"GCC\0";
pub const SRP_MAGIC: [u8; 4] = *b"SRP\0";
pub const TAU_MAGIC: [u8; 4] = *b"TAU\0";

/// All binary files share a 16-byte little-endian header: a 4-byte magic
/// followed by three i32 fields. There is no version field.
struct Header {
    fields: [i32; 3],
}

fn open_reader(path: &Path) -> PipelineResult<BufReader<File>> {
    match File::open(path) {
        Ok(file) => Ok(BufReader::new(file)),
        Err(err) if err.kind() == ErrorKind::NotFound => Err(PipelineError::FileNotFound(
            path.display().to_string(),
        )),
        Err(err) => Err(err.into()),
    }
}

fn write_header<W: Write>(writer: &mut W, magic: [u8; 4], fields: [i32; 3]) -> PipelineResult<()> {
    writer.write_all(&magic)?;
    for field in fields {
        writer.write_all(&field.to_le_bytes())?;
    }
    Ok(())
}

fn read_header<R: Read>(reader: &mut R, expected_magic: [u8; 4]) -> PipelineResult<Header> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != expected_magic {
        return Err(PipelineError::InvalidFormat(format!(
            "bad magic {:?}, expected {:?}",
            magic, expected_magic
        )));
    }
    let mut fields = [0i32; 3];
    for field in fields.iter_mut() {
        *field = read_i32(reader)?;
    }
    Ok(Header { fields })
}

fn read_i32<R: Read>(reader: &mut R) -> PipelineResult<i32> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    Ok(i32::from_le_bytes(bytes))
}

fn read_f32<R: Read>(reader: &mut R) -> PipelineResult<f32> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    Ok(f32::from_le_bytes(bytes))
}

fn positive_dim(value: i32, what: &str) -> PipelineResult<usize> {
    if value <= 0 {
        return Err(PipelineError::InvalidFormat(format!(
            "declared {} {} is not positive",
            what, value
        )));
    }
    Ok(value as usize)
}

/// Audio: channels, samples, sample_rate; payload channel-major f32.
pub fn save_audio<P: AsRef<Path>>(path: P, buffer: &AudioBuffer) -> PipelineResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_header(
        &mut writer,
        AUDIO_MAGIC,
        [
            buffer.channels() as i32,
            buffer.samples() as i32,
            buffer.sample_rate() as i32,
        ],
    )?;
    for &value in buffer.data().iter() {
        writer.write_all(&value.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Loads audio, requiring the channel count to match `expected_channels`
/// exactly; there is no auto-adaptation.
pub fn load_audio<P: AsRef<Path>>(
    path: P,
    expected_channels: usize,
) -> PipelineResult<AudioBuffer> {
    let mut reader = open_reader(path.as_ref())?;
    let header = read_header(&mut reader, AUDIO_MAGIC)?;
    let channels = positive_dim(header.fields[0], "channel count")?;
    let samples = positive_dim(header.fields[1], "sample count")?;
    let sample_rate = positive_dim(header.fields[2], "sample rate")? as u32;

    if channels != expected_channels {
        return Err(PipelineError::InvalidParameter(format!(
            "channel count mismatch: expected {}, file has {}",
            expected_channels, channels
        )));
    }

    let mut data = Array2::zeros((channels, samples));
    for value in data.iter_mut() {
        *value = read_f32(&mut reader)?;
    }
    Ok(AudioBuffer::new(data, sample_rate))
}

/// Spectra: channels, bins, reserved; payload (re, im) f32 pairs.
pub fn save_spectra<P: AsRef<Path>>(path: P, spectra: &Array2<Complex32>) -> PipelineResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_header(
        &mut writer,
        FFT_MAGIC,
        [spectra.nrows() as i32, spectra.ncols() as i32, 0],
    )?;
    for value in spectra.iter() {
        writer.write_all(&value.re.to_le_bytes())?;
        writer.write_all(&value.im.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_spectra<P: AsRef<Path>>(path: P) -> PipelineResult<Array2<Complex32>> {
    let mut reader = open_reader(path.as_ref())?;
    let header = read_header(&mut reader, FFT_MAGIC)?;
    let channels = positive_dim(header.fields[0], "channel count")?;
    let bins = positive_dim(header.fields[1], "bin count")?;

    let mut spectra = Array2::from_elem((channels, bins), Complex32::new(0.0, 0.0));
    for value in spectra.iter_mut() {
        let re = read_f32(&mut reader)?;
        let im = read_f32(&mut reader)?;
        *value = Complex32::new(re, im);
    }
    Ok(spectra)
}

/// GCC: pairs, length, reserved; payload pairs x length f32.
pub fn save_gcc<P: AsRef<Path>>(path: P, gcc: &Array2<f32>) -> PipelineResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_header(
        &mut writer,
        GCC_MAGIC,
        [gcc.nrows() as i32, gcc.ncols() as i32, 0],
    )?;
    for &value in gcc.iter() {
        writer.write_all(&value.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_gcc<P: AsRef<Path>>(path: P) -> PipelineResult<Array2<f32>> {
    let mut reader = open_reader(path.as_ref())?;
    let header = read_header(&mut reader, GCC_MAGIC)?;
    let pairs = positive_dim(header.fields[0], "pair count")?;
    let length = positive_dim(header.fields[1], "curve length")?;

    let mut gcc = Array2::zeros((pairs, length));
    for value in gcc.iter_mut() {
        *value = read_f32(&mut reader)?;
    }
    Ok(gcc)
}

/// SRP: elevation, azimuth, range bins; payload f32, elevation-major.
pub fn save_srp<P: AsRef<Path>>(path: P, srp: &Array3<f32>) -> PipelineResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    let (elev, azim, range) = srp.dim();
    write_header(
        &mut writer,
        SRP_MAGIC,
        [elev as i32, azim as i32, range as i32],
    )?;
    for &value in srp.iter() {
        writer.write_all(&value.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_srp<P: AsRef<Path>>(path: P) -> PipelineResult<Array3<f32>> {
    let mut reader = open_reader(path.as_ref())?;
    let header = read_header(&mut reader, SRP_MAGIC)?;
    let elev = positive_dim(header.fields[0], "elevation bins")?;
    let azim = positive_dim(header.fields[1], "azimuth bins")?;
    let range = positive_dim(header.fields[2], "range bins")?;

    let mut srp = Array3::zeros((elev, azim, range));
    for value in srp.iter_mut() {
        *value = read_f32(&mut reader)?;
    }
    Ok(srp)
}

/// Tau: pairs, table_size, reserved; payload i32 indices.
pub fn save_tau_table<P: AsRef<Path>>(path: P, table: &TauTable) -> PipelineResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_header(
        &mut writer,
        TAU_MAGIC,
        [table.pairs() as i32, table.cells() as i32, 0],
    )?;
    for &index in table.indices().iter() {
        writer.write_all(&index.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// The table file does not carry the correlation length, so the caller
/// supplies the `gcc_length` the table was built against.
pub fn load_tau_table<P: AsRef<Path>>(path: P, gcc_length: usize) -> PipelineResult<TauTable> {
    let mut reader = open_reader(path.as_ref())?;
    let header = read_header(&mut reader, TAU_MAGIC)?;
    let pairs = positive_dim(header.fields[0], "pair count")?;
    let cells = positive_dim(header.fields[1], "table size")?;

    let mut indices = Array2::zeros((pairs, cells));
    for value in indices.iter_mut() {
        let index = read_i32(&mut reader)?;
        if index < 0 || index as usize >= gcc_length {
            return Err(PipelineError::InvalidFormat(format!(
                "tau index {} outside correlation length {}",
                index, gcc_length
            )));
        }
        *value = index;
    }
    Ok(TauTable::from_parts(indices, gcc_length))
}
