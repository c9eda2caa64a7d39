//! Lecture des quelques champs du secteur de boot utilisés par les outils.

extern crate alloc;

use alloc::string::String;
use byteorder::{ByteOrder, LittleEndian};

use crate::FatError;

/// Taille minimale d’un secteur de boot.
pub const BOOT_SECTOR_SIZE: usize = 512;

/// Champs du secteur 0 utiles pour `volume_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootSector {
    /// Nom OEM / système (octets 3..11), espaces de fin supprimés.
    pub os_name: String,
    /// Nombre de copies de la FAT (octet 16).
    pub fat_copies: u8,
    /// Nombre total de secteurs (octets 19..21).
    pub total_sectors: u16,
    /// Secteurs par FAT (octets 22..24).
    pub sectors_per_fat: u16,
    /// Étiquette brute (octets 43..54), 11 octets complétés par des espaces.
    pub raw_label: [u8; 11],
}

impl BootSector {
    /// Parse les champs du secteur 0.
    pub fn parse(disk: &[u8]) -> Result<Self, FatError> {
        if disk.len() < BOOT_SECTOR_SIZE {
            return Err(FatError::BufferTooSmall {
                len: disk.len(),
                needed: BOOT_SECTOR_SIZE,
            });
        }
        let b = &disk[..BOOT_SECTOR_SIZE];

        let mut raw_label = [0u8; 11];
        raw_label.copy_from_slice(&b[43..54]);

        Ok(Self {
            os_name: decode_ascii_trim(&b[3..11]),
            fat_copies: b[16],
            total_sectors: LittleEndian::read_u16(&b[19..21]),
            sectors_per_fat: LittleEndian::read_u16(&b[22..24]),
            raw_label,
        })
    }

    /// Étiquette du secteur de boot, si elle est renseignée.
    ///
    /// Un champ qui commence par un espace (ou 0x00), ou qui vaut `NO NAME`,
    /// est considéré comme vide.
    pub fn label(&self) -> Option<String> {
        if matches!(self.raw_label[0], b' ' | 0x00) || &self.raw_label == b"NO NAME    " {
            return None;
        }
        Some(decode_ascii_trim(&self.raw_label))
    }
}

/// Décodage ASCII simple en supprimant les espaces et NUL de fin.
pub(crate) fn decode_ascii_trim(bytes: &[u8]) -> String {
    let mut end = bytes.len();
    while end > 0 && matches!(bytes[end - 1], b' ' | 0x00) {
        end -= 1;
    }

    let mut s = String::with_capacity(end);
    for &b in &bytes[..end] {
        s.push(b as char);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sector() -> [u8; 512] {
        let mut b = [0u8; 512];
        b[3..11].copy_from_slice(b"MSDOS5.0");
        b[16] = 2;
        LittleEndian::write_u16(&mut b[19..21], 2880);
        LittleEndian::write_u16(&mut b[22..24], 9);
        b[43..54].copy_from_slice(b"FLOPPY     ");
        b
    }

    #[test]
    fn parses_fixed_fields() {
        let bs = BootSector::parse(&sector()).unwrap();
        assert_eq!(bs.os_name, "MSDOS5.0");
        assert_eq!(bs.fat_copies, 2);
        assert_eq!(bs.total_sectors, 2880);
        assert_eq!(bs.sectors_per_fat, 9);
        assert_eq!(bs.label().as_deref(), Some("FLOPPY"));
    }

    #[test]
    fn blank_or_no_name_label_is_none() {
        let mut b = sector();
        b[43..54].copy_from_slice(b"           ");
        assert_eq!(BootSector::parse(&b).unwrap().label(), None);

        b[43..54].copy_from_slice(b"NO NAME    ");
        assert_eq!(BootSector::parse(&b).unwrap().label(), None);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let err = BootSector::parse(&[0u8; 100]).unwrap_err();
        assert_eq!(err, FatError::BufferTooSmall { len: 100, needed: 512 });
    }
}
