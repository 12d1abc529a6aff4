use std::fmt::Formatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MapperType {
    None,
    Mbc1,
    Mbc2,
    Mbc3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MapperFeatures {
    pub(crate) has_ram: bool,
}

impl std::fmt::Display for MapperFeatures {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "external RAM: {}", self.has_ram)
    }
}

/// Parse the mapper byte at cartridge header offset 0x0147.
///
/// Returns None for mapper types that are not supported; callers are expected to fall back to
/// un-banked behavior in that case.
pub(crate) fn parse_byte(mapper_byte: u8) -> Option<(MapperType, MapperFeatures)> {
    let (mapper_type, has_ram) = match mapper_byte {
        0x00 => (MapperType::None, false),
        0x01 => (MapperType::Mbc1, false),
        0x02 | 0x03 => (MapperType::Mbc1, true),
        // MBC2 carries its own 512x4-bit internal RAM regardless of the header RAM size code
        0x05 | 0x06 => (MapperType::Mbc2, true),
        0x0F | 0x11 => (MapperType::Mbc3, false),
        0x10 | 0x12 | 0x13 => (MapperType::Mbc3, true),
        _ => return None,
    };

    Some((mapper_type, MapperFeatures { has_ram }))
}

pub(crate) const MBC2_RAM_LEN: usize = 512;

#[derive(Debug, Clone)]
pub(crate) enum Mapper {
    None,
    Mbc1 {
        rom_bank_bit_mask: u8,
        ram_bank_bit_mask: u8,
        ram_enabled: bool,
        rom_bank_number: u8,
        ram_bank_number: u8,
        banking_mode_select: u8,
    },
    Mbc2 {
        rom_bank_bit_mask: u8,
        ram_enabled: bool,
        rom_bank_number: u8,
    },
    Mbc3 {
        rom_bank_bit_mask: u8,
        ram_enabled: bool,
        rom_bank_number: u8,
        ram_bank_number: u8,
    },
}

impl Mapper {
    pub(crate) fn new(mapper_type: MapperType, rom_size: u32, ram_size: u32) -> Self {
        let rom_bank_bit_mask = if rom_size >= 1 << 14 { ((rom_size >> 14) - 1) as u8 } else { 0 };
        let ram_bank_bit_mask = if ram_size >= 1 << 13 { ((ram_size >> 13) - 1) as u8 } else { 0 };

        log::debug!("setting ROM bank bit mask to {rom_bank_bit_mask:02X} for size {rom_size}");
        log::debug!("setting RAM bank bit mask to {ram_bank_bit_mask:02X} for size {ram_size}");

        match mapper_type {
            MapperType::None => Self::None,
            MapperType::Mbc1 => Self::Mbc1 {
                rom_bank_bit_mask,
                ram_bank_bit_mask,
                ram_enabled: false,
                rom_bank_number: 0x00,
                ram_bank_number: 0x00,
                banking_mode_select: 0x00,
            },
            MapperType::Mbc2 => {
                Self::Mbc2 { rom_bank_bit_mask, ram_enabled: false, rom_bank_number: 0x00 }
            }
            MapperType::Mbc3 => Self::Mbc3 {
                rom_bank_bit_mask,
                ram_enabled: false,
                rom_bank_number: 0x00,
                ram_bank_number: 0x00,
            },
        }
    }

    /// Restore the power-on state of every cartridge register while keeping the bank bit masks.
    pub(crate) fn reset(&mut self) {
        match self {
            Self::None => {}
            Self::Mbc1 {
                ram_enabled,
                rom_bank_number,
                ram_bank_number,
                banking_mode_select,
                ..
            } => {
                *ram_enabled = false;
                *rom_bank_number = 0x00;
                *ram_bank_number = 0x00;
                *banking_mode_select = 0x00;
            }
            Self::Mbc2 { ram_enabled, rom_bank_number, .. } => {
                *ram_enabled = false;
                *rom_bank_number = 0x00;
            }
            Self::Mbc3 { ram_enabled, rom_bank_number, ram_bank_number, .. } => {
                *ram_enabled = false;
                *rom_bank_number = 0x00;
                *ram_bank_number = 0x00;
            }
        }
    }

    /// Map a CPU address in \[0x0000, 0x7FFF\] to an offset into the full ROM image.
    ///
    /// # Panics
    ///
    /// Panics when given an address outside the cartridge ROM range.
    pub(crate) fn map_rom_address(&self, address: u16) -> u32 {
        match *self {
            Self::None => u32::from(address),
            Self::Mbc1 {
                rom_bank_bit_mask,
                rom_bank_number,
                ram_bank_number,
                banking_mode_select,
                ..
            } => {
                // Bank 0 cannot be mapped into the switchable region
                let rom_bank_number =
                    if rom_bank_number == 0x00 { 0x01 } else { rom_bank_number };

                match address {
                    address @ 0x0000..=0x3FFF => u32::from(address),
                    address @ 0x4000..=0x7FFF => {
                        // The 2-bit secondary register extends the ROM bank number in banking
                        // mode 0 and selects the RAM bank in banking mode 1
                        let bank_number = if banking_mode_select == 0x00 {
                            (rom_bank_number | (ram_bank_number << 5)) & rom_bank_bit_mask
                        } else {
                            rom_bank_number & rom_bank_bit_mask
                        };
                        u32::from(address - 0x4000) + (u32::from(bank_number) << 14)
                    }
                    _ => panic!(
                        "cartridge ROM mapping requested for non-ROM address {address:04X}"
                    ),
                }
            }
            Self::Mbc2 { rom_bank_bit_mask, rom_bank_number, .. }
            | Self::Mbc3 { rom_bank_bit_mask, rom_bank_number, .. } => {
                let rom_bank_number =
                    if rom_bank_number == 0x00 { 0x01 } else { rom_bank_number };

                match address {
                    address @ 0x0000..=0x3FFF => u32::from(address),
                    address @ 0x4000..=0x7FFF => {
                        let bank_number = rom_bank_number & rom_bank_bit_mask;
                        u32::from(address - 0x4000) + (u32::from(bank_number) << 14)
                    }
                    _ => panic!(
                        "cartridge ROM mapping requested for non-ROM address {address:04X}"
                    ),
                }
            }
        }
    }

    /// Handle a CPU write into the 0x0000-0x7FFF range. The ROM bytes stay untouched; these
    /// writes only ever land in the controller's bank/enable registers.
    pub(crate) fn write_rom_address(&mut self, address: u16, value: u8) {
        match self {
            Self::None => {}
            Self::Mbc1 {
                ram_enabled,
                rom_bank_number,
                ram_bank_number,
                banking_mode_select,
                ..
            } => match address {
                _address @ 0x0000..=0x1FFF => {
                    log::trace!("MBC1 ram_enabled changed to {value:02X}");
                    *ram_enabled = value & 0x0F == 0x0A;
                }
                _address @ 0x2000..=0x3FFF => {
                    log::trace!("MBC1 rom_bank_number changed to {value:02X}");
                    *rom_bank_number = value & 0x1F;
                }
                _address @ 0x4000..=0x5FFF => {
                    log::trace!("MBC1 ram_bank_number changed to {value:02X}");
                    *ram_bank_number = value & 0x03;
                }
                _address @ 0x6000..=0x7FFF => {
                    log::trace!("MBC1 banking_mode_select changed to {value:02X}");
                    *banking_mode_select = value & 0x01;
                }
                _ => panic!("MBC1 register write outside the ROM range: {address:04X}"),
            },
            Self::Mbc2 { ram_enabled, rom_bank_number, .. } => match address {
                // Address bit 8 selects between the RAM enable latch and the ROM bank register
                address @ 0x0000..=0x3FFF => {
                    if address & 0x0100 != 0 {
                        *rom_bank_number = value & 0x0F;
                    } else {
                        *ram_enabled = value & 0x0F == 0x0A;
                    }
                }
                _address @ 0x4000..=0x7FFF => {}
                _ => panic!("MBC2 register write outside the ROM range: {address:04X}"),
            },
            Self::Mbc3 { ram_enabled, rom_bank_number, ram_bank_number, .. } => match address {
                _address @ 0x0000..=0x1FFF => {
                    *ram_enabled = value & 0x0F == 0x0A;
                }
                _address @ 0x2000..=0x3FFF => {
                    *rom_bank_number = value & 0x7F;
                }
                _address @ 0x4000..=0x5FFF => {
                    *ram_bank_number = value;
                }
                // RTC latching is not implemented
                _address @ 0x6000..=0x7FFF => {}
                _ => panic!("MBC3 register write outside the ROM range: {address:04X}"),
            },
        }
    }

    /// Map a CPU address in \[0xA000, 0xBFFF\] to an offset into the cartridge RAM array, or None
    /// if RAM is disabled or the selected bank is invalid.
    pub(crate) fn map_ram_address(&self, address: u16) -> Option<u32> {
        let relative_address = address - 0xA000;

        match *self {
            Self::None => Some(u32::from(relative_address)),
            Self::Mbc1 {
                ram_bank_bit_mask,
                ram_enabled,
                ram_bank_number,
                banking_mode_select,
                ..
            } => {
                if !ram_enabled {
                    return None;
                }

                if banking_mode_select == 0x00 {
                    Some(u32::from(relative_address))
                } else {
                    let bank_number = ram_bank_number & ram_bank_bit_mask;
                    Some(u32::from(relative_address) + (u32::from(bank_number) << 13))
                }
            }
            Self::Mbc2 { ram_enabled, .. } => {
                // 512 half-byte entries, echoed across the whole external RAM range
                ram_enabled.then(|| u32::from(relative_address) % MBC2_RAM_LEN as u32)
            }
            Self::Mbc3 { ram_enabled, ram_bank_number, .. } => {
                if !ram_enabled {
                    return None;
                }

                match ram_bank_number {
                    ram_bank_number @ 0x00..=0x03 => {
                        Some(u32::from(relative_address) + (u32::from(ram_bank_number) << 13))
                    }
                    _ => None,
                }
            }
        }
    }

    pub(crate) fn is_mbc2(&self) -> bool {
        matches!(self, Self::Mbc2 { .. })
    }
}
