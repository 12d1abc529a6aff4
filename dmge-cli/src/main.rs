use clap::Parser;
use dmge_core::{EmulationConfig, GameBoy};
use std::error::Error;
use std::time::Instant;

#[derive(Parser)]
struct Cli {
    /// Path to the ROM image to run
    #[arg(short = 'f', long = "rom-file-path")]
    rom_file_path: String,
    /// Number of frames to emulate before exiting
    #[arg(short = 'n', long = "frames", default_value_t = 600)]
    frames: u32,
    /// Render with the classic DMG green palette instead of grayscale
    #[arg(long = "classic-green", default_value_t = false)]
    classic_green: bool,
    /// Generate audio samples (they are drained and discarded in headless mode)
    #[arg(short = 'a', long = "audio-enabled", default_value_t = false)]
    audio_enabled: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args = Cli::parse();

    let config = EmulationConfig {
        audio_enabled: args.audio_enabled,
        classic_green: args.classic_green,
    };

    let mut game_boy = GameBoy::new(config);
    game_boy.load_cartridge_file(&args.rom_file_path)?;

    println!("Loaded cartridge: {}", game_boy.cartridge_info());

    let mut audio_buffer = [0.0_f32; 2048];
    let start = Instant::now();

    for frame in 0..args.frames {
        if !game_boy.run_frame() {
            return Err(format!("emulation aborted during frame {frame}").into());
        }

        // Keep the sample queue from saturating when nothing is playing it
        while game_boy.read_audio_samples(&mut audio_buffer) == audio_buffer.len() {}
    }

    let elapsed = start.elapsed();
    let emulated_seconds = f64::from(args.frames) * 70224.0 / 4_194_304.0;
    log::info!(
        "Emulated {} frames ({emulated_seconds:.2}s) in {:.2}s",
        args.frames,
        elapsed.as_secs_f64()
    );

    println!(
        "{} frames in {:.2}s ({:.1}x realtime)",
        args.frames,
        elapsed.as_secs_f64(),
        emulated_seconds / elapsed.as_secs_f64()
    );

    Ok(())
}
