//! A Game Boy (DMG) emulator core.
//!
//! The [`GameBoy`] type owns every subsystem (CPU, MMU, PPU, APU, timer, joypad) and drives them
//! in lockstep, one frame at a time. Hosts feed in button events, pull out finished frames and
//! audio samples, and decide pacing between frames.

mod apu;
mod config;
mod cpu;
mod joypad;
mod memory;
mod ppu;
mod timer;

pub use config::EmulationConfig;
pub use joypad::JoypadButton;
pub use memory::{Cartridge, CartridgeLoadError};
pub use ppu::{FrameBuffer, ScreenPalette, SCREEN_HEIGHT, SCREEN_WIDTH};

use crate::apu::ApuState;
use crate::cpu::{CpuRegisters, InterruptType};
use crate::joypad::JoypadState;
use crate::memory::AddressSpace;
use crate::ppu::PpuState;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// The length of one frame in 4.194304 MHz clock cycles: 154 scanlines of 456 cycles each.
pub const CYCLES_PER_FRAME: u64 = 70224;

// Far above the most instructions that can fit in one frame; only reachable if the CPU step
// stops consuming cycles
const FRAME_INSTRUCTION_LIMIT: u32 = 100_000;

pub struct GameBoy {
    address_space: AddressSpace,
    cpu_registers: CpuRegisters,
    ppu_state: PpuState,
    apu_state: ApuState,
    joypad_state: JoypadState,
}

impl GameBoy {
    /// Power on a console with no cartridge inserted. All cartridge reads return open bus (0xFF)
    /// until one is loaded.
    pub fn new(config: EmulationConfig) -> Self {
        let mut apu_state = ApuState::new();
        apu_state.set_sample_generation_enabled(config.audio_enabled);

        Self {
            address_space: AddressSpace::new(Cartridge::unloaded()),
            cpu_registers: CpuRegisters::new(),
            ppu_state: PpuState::new(screen_palette(config.classic_green)),
            apu_state,
            joypad_state: JoypadState::new(),
        }
    }

    /// Insert a cartridge from a ROM image, replacing any current one, and reset the console.
    pub fn load_cartridge(&mut self, rom: Vec<u8>) -> Result<(), CartridgeLoadError> {
        let cartridge = Cartridge::new(rom)?;
        self.address_space = AddressSpace::new(cartridge);
        self.reset_components();

        Ok(())
    }

    /// Insert a cartridge from a ROM file, replacing any current one, and reset the console.
    pub fn load_cartridge_file(&mut self, file_path: &str) -> Result<(), CartridgeLoadError> {
        let cartridge = Cartridge::from_file(file_path)?;
        self.address_space = AddressSpace::new(cartridge);
        self.reset_components();

        Ok(())
    }

    /// Restore the post-boot power-on state of every subsystem, keeping the loaded cartridge.
    pub fn reset(&mut self) {
        let mut cartridge = self.address_space.take_cartridge();
        cartridge.reset();
        self.address_space = AddressSpace::new(cartridge);
        self.reset_components();
    }

    fn reset_components(&mut self) {
        self.cpu_registers = CpuRegisters::new();
        self.ppu_state.reset();
        self.apu_state.reset();
        self.joypad_state = JoypadState::new();
    }

    /// Run the emulator for one full frame (70224 clock cycles).
    ///
    /// Returns false if the frame had to be aborted because the CPU stopped making progress;
    /// the error is logged and the console is left in a consistent state.
    pub fn run_frame(&mut self) -> bool {
        let mut frame_cycles = 0_u64;
        let mut instructions = 0_u32;

        while frame_cycles < CYCLES_PER_FRAME {
            if instructions >= FRAME_INSTRUCTION_LIMIT {
                log::error!(
                    "aborting frame: {instructions} CPU steps executed without completing a frame"
                );
                return false;
            }
            instructions += 1;

            joypad::update_joyp_register(
                &self.joypad_state,
                self.address_space.get_io_registers_mut(),
            );

            // Read TMA before executing anything in case the instruction updates the register
            let timer_modulo = timer::read_timer_modulo(self.address_space.get_io_registers());

            let cycles = cpu::tick(&mut self.address_space, &mut self.cpu_registers);

            timer::update_timer_registers(
                self.address_space.get_io_registers_mut(),
                timer_modulo,
                cycles,
            );

            for _ in (0..cycles).step_by(4) {
                ppu::tick_m_cycle(&mut self.ppu_state, &mut self.address_space);
                apu::tick_m_cycle(&mut self.apu_state, self.address_space.get_io_registers_mut());
            }

            frame_cycles += u64::from(cycles);
        }

        true
    }

    /// The most recently completed frame as ARGB8888 pixels, row-major. Valid after `run_frame`.
    pub fn frame_buffer(&self) -> &FrameBuffer {
        self.ppu_state.frame_buffer()
    }

    /// Press or release one of the eight buttons. Presses request a joypad interrupt.
    pub fn set_button(&mut self, button: JoypadButton, pressed: bool) {
        self.joypad_state.set_button(button, pressed);

        if pressed {
            self.address_space
                .get_io_registers_mut()
                .interrupt_flags()
                .set(InterruptType::Joypad);
        }

        joypad::update_joyp_register(
            &self.joypad_state,
            self.address_space.get_io_registers_mut(),
        );
    }

    /// Toggle audio sample generation.
    pub fn set_audio_enabled(&mut self, audio_enabled: bool) {
        self.apu_state.set_sample_generation_enabled(audio_enabled);
    }

    /// Switch between the grayscale and classic DMG green screen palettes.
    pub fn set_classic_green(&mut self, classic_green: bool) {
        self.ppu_state.set_screen_palette(screen_palette(classic_green));
    }

    /// Pull up to `out.len()` interleaved stereo f32 samples at 44100 Hz. Returns the number of
    /// samples written.
    pub fn read_audio_samples(&mut self, out: &mut [f32]) -> usize {
        self.apu_state.read_samples(out)
    }

    /// A handle to the audio sample queue for hosts that consume samples from a separate audio
    /// thread.
    pub fn audio_sample_queue(&self) -> Arc<Mutex<VecDeque<f32>>> {
        self.apu_state.get_sample_queue()
    }

    /// A short description of the loaded cartridge: title plus the mapper type byte.
    pub fn cartridge_info(&self) -> String {
        let cartridge = self.address_space.get_cartridge();
        if !cartridge.is_loaded() {
            return "<no cartridge>".into();
        }

        format!("{} (type 0x{:02X})", cartridge.title(), cartridge.mapper_byte())
    }
}

fn screen_palette(classic_green: bool) -> ScreenPalette {
    if classic_green {
        ScreenPalette::ClassicGreen
    } else {
        ScreenPalette::Grayscale
    }
}
