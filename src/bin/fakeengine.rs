use clap::Parser;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::f32::consts::PI;
use std::io::Read;
use std::path::PathBuf;

/// Stand-in for the piper CLI: reads text on stdin and writes a sine-tone
/// WAV whose duration scales with the input length. Lets the server be
/// exercised without any voice models installed:
///
///   rustvox --conf conf.toml   # with synthesis.command = "fakeengine"
#[derive(Parser, Debug)]
#[command(about = "stub synthesis engine speaking the piper CLI contract")]
struct Args {
    #[arg(long)]
    model: PathBuf,

    #[arg(long)]
    output_file: PathBuf,

    #[arg(long, default_value_t = 0)]
    speaker: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text)?;
    let text = text.trim();
    if text.is_empty() {
        eprintln!("no text on stdin");
        std::process::exit(1);
    }
    if !args.model.exists() {
        eprintln!("model not found: {}", args.model.display());
        std::process::exit(1);
    }

    let sample_rate = 22050u32;
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&args.output_file, spec)?;

    // ~60ms of tone per character, pitch varied by speaker index
    let frequency = 220.0 + 20.0 * args.speaker as f32;
    let num_samples = sample_rate as usize * 60 * text.chars().count() / 1000;
    for t in 0..num_samples {
        let sample = (t as f32 / sample_rate as f32 * frequency * 2.0 * PI).sin();
        writer.write_sample((sample * 0.5 * 32767.0) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}
