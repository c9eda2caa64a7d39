//! Codec des entrées FAT12 (12 bits, deux entrées partagent trois octets).
//!
//! Entrée paire `i` : octet `b0` + nibble bas de `b1` (poids fort).
//! Entrée impaire `i` : nibble haut de `b0` (poids faible) + `b1`.
//! Seule la première copie de la FAT est lue et écrite.

use crate::{FatError, Geometry};

/// Offset absolu des deux octets qui portent l’entrée `cluster`.
fn entry_offset(geometry: &Geometry, cluster: u16) -> Result<usize, FatError> {
    if cluster > geometry.max_cluster {
        return Err(FatError::OutOfRange {
            cluster: cluster as u32,
            max: geometry.max_cluster,
        });
    }
    Ok(geometry.fat_offset + 3 * cluster as usize / 2)
}

/// Lit l’entrée FAT du cluster `cluster` (valeur dans 0..=0xFFF).
pub fn decode(disk: &[u8], geometry: &Geometry, cluster: u16) -> Result<u16, FatError> {
    let off = entry_offset(geometry, cluster)?;
    if off + 1 >= disk.len() {
        return Err(FatError::OutOfBounds { offset: off + 1 });
    }

    let b0 = disk[off] as u16;
    let b1 = disk[off + 1] as u16;

    let value = if cluster % 2 == 0 {
        ((b1 & 0x0F) << 8) | b0
    } else {
        (b0 >> 4) | (b1 << 4)
    };
    Ok(value)
}

/// Écrit `value` (modulo 4096) dans l’entrée FAT du cluster `cluster`.
///
/// Le nibble qui appartient à l’entrée voisine n’est pas modifié.
pub fn encode(
    disk: &mut [u8],
    geometry: &Geometry,
    cluster: u16,
    value: u16,
) -> Result<(), FatError> {
    let off = entry_offset(geometry, cluster)?;
    if off + 1 >= disk.len() {
        return Err(FatError::OutOfBounds { offset: off + 1 });
    }

    let value = value & 0x0FFF;
    if cluster % 2 == 0 {
        disk[off] = (value & 0xFF) as u8;
        disk[off + 1] = (disk[off + 1] & 0xF0) | ((value >> 8) as u8 & 0x0F);
    } else {
        disk[off] = (disk[off] & 0x0F) | (((value & 0x0F) as u8) << 4);
        disk[off + 1] = (value >> 4) as u8;
    }

    log::trace!("FAT[{cluster}] <- {value:#05x}");
    Ok(())
}
