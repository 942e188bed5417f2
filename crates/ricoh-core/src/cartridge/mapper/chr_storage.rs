//! PPU-side pattern memory.
//!
//! A board carries either CHR ROM from the image or CHR RAM the game fills
//! itself. Mappers address it in fixed-size banks; bank numbers past the end
//! wrap modulo the bank count, like the unconnected high address lines on
//! real boards.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChrStorage {
    Rom(Box<[u8]>),
    Ram(Box<[u8]>),
}

impl ChrStorage {
    /// CHR ROM when the image carries any, otherwise zeroed RAM of
    /// `ram_size` bytes.
    pub fn new(chr_rom: Box<[u8]>, ram_size: usize) -> Self {
        if chr_rom.is_empty() {
            ChrStorage::Ram(vec![0; ram_size.max(1)].into_boxed_slice())
        } else {
            ChrStorage::Rom(chr_rom)
        }
    }

    fn bytes(&self) -> &[u8] {
        match self {
            ChrStorage::Rom(data) | ChrStorage::Ram(data) => data,
        }
    }

    pub fn is_ram(&self) -> bool {
        matches!(self, ChrStorage::Ram(_))
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }

    fn index(&self, bank: usize, bank_size: usize, addr: u16) -> usize {
        let banks = (self.len() / bank_size).max(1);
        ((bank % banks) * bank_size + (addr as usize % bank_size)) % self.len()
    }

    /// Byte at `addr` inside `bank` of `bank_size` bytes.
    pub fn read(&self, bank: usize, bank_size: usize, addr: u16) -> u8 {
        self.bytes()[self.index(bank, bank_size, addr)]
    }

    /// Writes only land when the board has CHR RAM.
    pub fn write(&mut self, bank: usize, bank_size: usize, addr: u16, value: u8) {
        let idx = self.index(bank, bank_size, addr);
        if let ChrStorage::Ram(ram) = self {
            ram[idx] = value;
        }
    }
}
