pub mod address;
pub mod ioregisters;
mod mapper;

use crate::memory::ioregisters::IoRegisters;
use crate::memory::mapper::{Mapper, MapperType, MBC2_RAM_LEN};
use std::path::Path;
use std::{fs, io};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CartridgeLoadError {
    #[error("header should be at least 336 bytes, was {header_len} bytes")]
    HeaderTooShort { header_len: usize },
    #[error("invalid RAM size code, expected 0-5: {ram_size_code}")]
    InvalidRamSize { ram_size_code: u8 },
    #[error("error reading data from {file_path}: {source}")]
    FileReadError {
        file_path: String,
        #[source]
        source: io::Error,
    },
}

pub struct Cartridge {
    rom: Vec<u8>,
    ram: Vec<u8>,
    mapper: Mapper,
    title: String,
    mapper_byte: u8,
}

impl Cartridge {
    /// Build a cartridge from a raw ROM image, parsing the header for the title, mapper type,
    /// and external RAM size.
    ///
    /// Fails if the image is shorter than the 0x150-byte header area or carries an invalid RAM
    /// size code. An unsupported mapper byte is not a failure: the cartridge degrades to
    /// un-banked reads with bank switch writes ignored.
    pub fn new(rom: Vec<u8>) -> Result<Self, CartridgeLoadError> {
        log::info!("Initializing cartridge using {} bytes of data", rom.len());

        if rom.len() < 0x0150 {
            return Err(CartridgeLoadError::HeaderTooShort { header_len: rom.len() });
        }

        let title_bytes =
            &rom[address::TITLE_START as usize..=address::TITLE_END as usize];
        let title: String = title_bytes
            .iter()
            .copied()
            .take_while(|&b| b != 0x00)
            .map(|b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
            .collect();

        let mapper_byte = rom[address::MAPPER as usize];
        let (mapper_type, mapper_features) = match mapper::parse_byte(mapper_byte) {
            Some((mapper_type, mapper_features)) => (mapper_type, mapper_features),
            None => {
                log::warn!(
                    "unsupported mapper byte in cartridge header: {mapper_byte:02X}; \
                     treating ROM as un-banked"
                );
                (MapperType::None, mapper::MapperFeatures { has_ram: false })
            }
        };

        log::info!("Detected mapper type {mapper_type:?} (byte: {mapper_byte:02X})");
        log::info!("Mapper features: {mapper_features}");

        let ram = if mapper_type == MapperType::Mbc2 {
            vec![0; MBC2_RAM_LEN]
        } else if mapper_features.has_ram {
            let ram_size_code = rom[address::RAM_SIZE as usize];
            let ram_size: usize = match ram_size_code {
                0x00 => 0,
                0x01 => 2048,
                0x02 => 8192,   // 8 KB
                0x03 => 32768,  // 32 KB
                0x04 => 131072, // 128 KB
                0x05 => 65536,  // 64 KB
                _ => return Err(CartridgeLoadError::InvalidRamSize { ram_size_code }),
            };
            vec![0; ram_size]
        } else {
            Vec::new()
        };

        let mapper = Mapper::new(mapper_type, rom.len() as u32, ram.len() as u32);

        log::info!("Cartridge title: '{title}'");
        log::info!("Cartridge has {} bytes of external RAM", ram.len());

        Ok(Self { rom, ram, mapper, title, mapper_byte })
    }

    pub fn from_file(file_path: &str) -> Result<Self, CartridgeLoadError> {
        log::info!("Loading cartridge from '{file_path}'");

        let rom =
            fs::read(Path::new(file_path)).map_err(|err| CartridgeLoadError::FileReadError {
                file_path: file_path.into(),
                source: err,
            })?;

        Self::new(rom)
    }

    /// Create a Cartridge value representing an empty cartridge slot. All ROM and RAM reads
    /// return 0xFF and all writes are ignored.
    pub fn unloaded() -> Self {
        Self {
            rom: Vec::new(),
            ram: Vec::new(),
            mapper: Mapper::None,
            title: String::new(),
            mapper_byte: 0x00,
        }
    }

    pub fn is_loaded(&self) -> bool {
        !self.rom.is_empty()
    }

    /// Restore the power-on state of the cartridge registers.
    pub fn reset(&mut self) {
        self.mapper.reset();
    }

    /// The game title from the cartridge header, with trailing NUL bytes trimmed.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn mapper_byte(&self) -> u8 {
        self.mapper_byte
    }

    /// A banked ROM read; anything mapped past the end of the image reads as open bus (0xFF).
    pub fn read_rom_address(&self, address: u16) -> u8 {
        let mapped_address = self.mapper.map_rom_address(address);
        self.rom.get(mapped_address as usize).copied().unwrap_or(0xFF)
    }

    /// Forward a ROM-range write to the bank controller registers.
    pub fn write_rom_address(&mut self, address: u16, value: u8) {
        self.mapper.write_rom_address(address, value);
    }

    /// A banked external RAM read; disabled RAM and out-of-range banks read as open bus (0xFF).
    pub fn read_ram_address(&self, address: u16) -> u8 {
        match self.mapper.map_ram_address(address) {
            Some(mapped_address) => {
                let value = self.ram.get(mapped_address as usize).copied().unwrap_or(0xFF);
                if self.mapper.is_mbc2() {
                    // MBC2 RAM is 4 bits wide; the upper nibble reads back as open bus
                    0xF0 | (value & 0x0F)
                } else {
                    value
                }
            }
            None => 0xFF,
        }
    }

    /// A banked external RAM write; silently dropped while RAM is disabled or the selected bank
    /// is out of range.
    pub fn write_ram_address(&mut self, address: u16, value: u8) {
        if let Some(mapped_address) = self.mapper.map_ram_address(address) {
            if let Some(ram_value) = self.ram.get_mut(mapped_address as usize) {
                *ram_value = value;
            }
        }
    }
}

pub struct AddressSpace {
    cartridge: Cartridge,
    vram: [u8; 8192],
    working_ram: [u8; 8192],
    oam: [u8; 160],
    io_registers: IoRegisters,
    hram: [u8; 127],
    ie_register: u8,
}

impl AddressSpace {
    pub fn new(cartridge: Cartridge) -> Self {
        Self {
            cartridge,
            vram: [0; 8192],
            working_ram: [0; 8192],
            oam: [0; 160],
            io_registers: IoRegisters::new(),
            hram: [0; 127],
            ie_register: 0x00,
        }
    }

    /// A CPU bus read, dispatched by address region.
    pub fn read_address_u8(&self, address: u16) -> u8 {
        match address {
            address @ address::ROM_START..=address::ROM_END => {
                self.cartridge.read_rom_address(address)
            }
            address @ address::VRAM_START..=address::VRAM_END => {
                self.vram[(address - address::VRAM_START) as usize]
            }
            address @ address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.cartridge.read_ram_address(address)
            }
            address @ address::WORKING_RAM_START..=address::WORKING_RAM_END => {
                self.working_ram[(address - address::WORKING_RAM_START) as usize]
            }
            address @ address::ECHO_RAM_START..=address::ECHO_RAM_END => {
                self.working_ram[(address - address::ECHO_RAM_START) as usize]
            }
            address @ address::OAM_START..=address::OAM_END => {
                self.oam[(address - address::OAM_START) as usize]
            }
            _address @ address::UNUSABLE_START..=address::UNUSABLE_END => 0xFF,
            address @ address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                self.io_registers.read_address(address)
            }
            address @ address::HRAM_START..=address::HRAM_END => {
                self.hram[(address - address::HRAM_START) as usize]
            }
            address::IE_REGISTER => self.ie_register,
        }
    }

    /// A 16-bit CPU bus read: low byte at `address`, high byte at the next address (wrapping
    /// past 0xFFFF).
    pub fn read_address_u16(&self, address: u16) -> u16 {
        let lsb = self.read_address_u8(address);
        let msb = self.read_address_u8(address.wrapping_add(1));
        u16::from_le_bytes([lsb, msb])
    }

    /// A CPU bus write, dispatched by address region. Writing to FF46 kicks off an OAM DMA
    /// transfer.
    pub fn write_address_u8(&mut self, address: u16, value: u8) {
        match address {
            address @ address::ROM_START..=address::ROM_END => {
                self.cartridge.write_rom_address(address, value);
            }
            address @ address::VRAM_START..=address::VRAM_END => {
                self.vram[(address - address::VRAM_START) as usize] = value;
            }
            address @ address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.cartridge.write_ram_address(address, value);
            }
            address @ address::WORKING_RAM_START..=address::WORKING_RAM_END => {
                self.working_ram[(address - address::WORKING_RAM_START) as usize] = value;
            }
            address @ address::ECHO_RAM_START..=address::ECHO_RAM_END => {
                self.working_ram[(address - address::ECHO_RAM_START) as usize] = value;
            }
            address @ address::OAM_START..=address::OAM_END => {
                self.oam[(address - address::OAM_START) as usize] = value;
            }
            _address @ address::UNUSABLE_START..=address::UNUSABLE_END => {}
            address @ address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                self.io_registers.write_address(address, value);
                if address == address::DMA_REGISTER {
                    self.run_oam_dma_transfer(value);
                }
            }
            address @ address::HRAM_START..=address::HRAM_END => {
                self.hram[(address - address::HRAM_START) as usize] = value;
            }
            address::IE_REGISTER => {
                self.ie_register = value;
            }
        }
    }

    /// A 16-bit CPU bus write: low byte at `address`, high byte at the next address (wrapping
    /// past 0xFFFF).
    pub fn write_address_u16(&mut self, address: u16, value: u16) {
        let [lsb, msb] = value.to_le_bytes();
        self.write_address_u8(address, lsb);
        self.write_address_u8(address.wrapping_add(1), msb);
    }

    // OAM DMA copies 160 bytes from (value << 8) into OAM through the normal read path. The
    // hardware spreads the copy over 160 M-cycles; it is performed here as a single burst.
    fn run_oam_dma_transfer(&mut self, value: u8) {
        log::trace!("OAM DMA transfer from {:02X}00", value);

        let source = u16::from(value) << 8;
        for i in 0..self.oam.len() as u16 {
            let byte = self.read_address_u8(source.wrapping_add(i));
            self.oam[i as usize] = byte;
        }
    }

    /// The renderer's view into OAM and VRAM.
    ///
    /// # Panics
    ///
    /// Panics when given an address outside the OAM and VRAM regions; the PPU has no bus access
    /// to anything else.
    pub fn ppu_read_address_u8(&self, address: u16) -> u8 {
        match address {
            address @ address::VRAM_START..=address::VRAM_END => {
                self.vram[(address - address::VRAM_START) as usize]
            }
            address @ address::OAM_START..=address::OAM_END => {
                self.oam[(address - address::OAM_START) as usize]
            }
            _ => panic!("PPU bus read outside OAM/VRAM: {address:04X}"),
        }
    }

    pub fn get_io_registers(&self) -> &IoRegisters {
        &self.io_registers
    }

    pub fn get_io_registers_mut(&mut self) -> &mut IoRegisters {
        &mut self.io_registers
    }

    /// The interrupt-enable mask at 0xFFFF.
    pub fn get_ie_register(&self) -> u8 {
        self.ie_register
    }

    pub fn get_cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    pub(crate) fn take_cartridge(&mut self) -> Cartridge {
        std::mem::replace(&mut self.cartridge, Cartridge::unloaded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_test_address_space() -> AddressSpace {
        let mut rom = vec![0; 0x8000];
        rom[address::MAPPER as usize] = 0x00;
        AddressSpace::new(Cartridge::new(rom).expect("synthesized test ROM should be valid"))
    }

    #[test]
    fn ram_write_then_read_round_trips() {
        let mut address_space = new_test_address_space();

        for address in [0x8000, 0x9FFF, 0xC000, 0xDFFF, 0xFE00, 0xFE9F, 0xFF80, 0xFFFE] {
            address_space.write_address_u8(address, 0x5A);
            assert_eq!(0x5A, address_space.read_address_u8(address), "address {address:04X}");
        }
    }

    #[test]
    fn echo_ram_mirrors_working_ram() {
        let mut address_space = new_test_address_space();

        address_space.write_address_u8(0xC123, 0x77);
        assert_eq!(0x77, address_space.read_address_u8(0xE123));

        address_space.write_address_u8(0xF456, 0x88);
        assert_eq!(0x88, address_space.read_address_u8(0xD456));
    }

    #[test]
    fn unusable_region() {
        let mut address_space = new_test_address_space();

        assert_eq!(0xFF, address_space.read_address_u8(0xFEA0));
        address_space.write_address_u8(0xFEA0, 0x12);
        assert_eq!(0xFF, address_space.read_address_u8(0xFEA0));
        assert_eq!(0xFF, address_space.read_address_u8(0xFEFF));
    }

    #[test]
    fn u16_access_is_little_endian() {
        let mut address_space = new_test_address_space();

        address_space.write_address_u16(0xC000, 0xBEEF);
        assert_eq!(0xEF, address_space.read_address_u8(0xC000));
        assert_eq!(0xBE, address_space.read_address_u8(0xC001));
        assert_eq!(0xBEEF, address_space.read_address_u16(0xC000));
    }

    #[test]
    fn oam_dma_copies_from_working_ram() {
        let mut address_space = new_test_address_space();

        for i in 0..160_u16 {
            address_space.write_address_u8(0xC200 + i, i as u8);
        }

        address_space.write_address_u8(0xFF46, 0xC2);

        for i in 0..160_u16 {
            assert_eq!(i as u8, address_space.read_address_u8(0xFE00 + i));
        }
    }

    #[test]
    fn ie_register() {
        let mut address_space = new_test_address_space();

        address_space.write_address_u8(0xFFFF, 0x1F);
        assert_eq!(0x1F, address_space.read_address_u8(0xFFFF));
        assert_eq!(0x1F, address_space.get_ie_register());
    }

    #[test]
    fn unloaded_cartridge_reads_open_bus() {
        let mut address_space = AddressSpace::new(Cartridge::unloaded());

        assert_eq!(0xFF, address_space.read_address_u8(0x0100));
        assert_eq!(0xFF, address_space.read_address_u8(0x4000));
        assert_eq!(0xFF, address_space.read_address_u8(0xA000));
        address_space.write_address_u8(0x2000, 0x05);
        assert_eq!(0xFF, address_space.read_address_u8(0x4000));
    }

    #[test]
    fn cartridge_header_parsing() {
        let mut rom = vec![0; 0x8000];
        rom[address::TITLE_START as usize..address::TITLE_START as usize + 5]
            .copy_from_slice(b"HELLO");
        rom[address::MAPPER as usize] = 0x03;
        rom[address::RAM_SIZE as usize] = 0x02;

        let cartridge = Cartridge::new(rom).unwrap();
        assert_eq!("HELLO", cartridge.title());
        assert_eq!(0x03, cartridge.mapper_byte());
        assert_eq!(8192, cartridge.ram.len());
    }

    #[test]
    fn cartridge_rejects_short_rom() {
        assert!(matches!(
            Cartridge::new(vec![0; 0x100]),
            Err(CartridgeLoadError::HeaderTooShort { header_len: 0x100 })
        ));
    }
}
