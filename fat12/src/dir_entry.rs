//! Entrées de répertoire FAT12 (format court 8.3).
//!
//! Les Long File Names (LFN) ne sont pas gérés : on les reconnaît
//! uniquement pour les sauter.

extern crate alloc;

use alloc::string::String;
use byteorder::{ByteOrder, LittleEndian};

use crate::boot_sector::decode_ascii_trim;
use crate::geometry::DIR_ENTRY_SIZE;
use crate::FatError;

/// Premier octet d’un slot jamais utilisé (fin des entrées du répertoire).
pub const SLOT_END: u8 = 0x00;
/// Premier octet d’une entrée supprimée.
pub const SLOT_DELETED: u8 = 0xE5;

pub const ATTR_VOLUME_ID: u8 = 0x08;
pub const ATTR_DIRECTORY: u8 = 0x10;
/// Valeur complète de l’attribut d’une entrée LFN.
pub const ATTR_LONG_NAME: u8 = 0x0F;

const TIME_OFFSET: usize = 14;
const DATE_OFFSET: usize = 16;
const CLUSTER_OFFSET: usize = 26;
const SIZE_OFFSET: usize = 28;

/// Attributs FAT d’une entrée de répertoire.
///
/// Les bits viennent directement du champ `ATTR` (offset 11).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attributes {
    /// Octet brut.
    pub raw: u8,
    /// Volume ID (étiquette de volume).
    pub volume_id: bool,
    /// Répertoire.
    pub directory: bool,
}

impl Attributes {
    /// Construit les attributs à partir de l'octet brut.
    pub fn from_byte(b: u8) -> Self {
        Self {
            raw: b,
            volume_id: b & ATTR_VOLUME_ID != 0,
            directory: b & ATTR_DIRECTORY != 0,
        }
    }

    /// Entrée de continuation LFN.
    pub fn is_long_name(&self) -> bool {
        self.raw == ATTR_LONG_NAME
    }
}

/// État d’un slot de 32 octets, déterminé par son premier octet et ses attributs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// `0x00` : plus aucune entrée après ce slot.
    End,
    /// `0xE5` : entrée supprimée, slot réutilisable.
    Deleted,
    /// Continuation LFN.
    LongName,
    /// Étiquette de volume.
    VolumeLabel,
    /// Fichier ou répertoire.
    Active,
}

impl SlotState {
    pub fn of(slot: &[u8]) -> Self {
        match slot[0] {
            SLOT_END => SlotState::End,
            SLOT_DELETED => SlotState::Deleted,
            _ => {
                let attrs = Attributes::from_byte(slot[11]);
                if attrs.is_long_name() {
                    SlotState::LongName
                } else if attrs.volume_id {
                    SlotState::VolumeLabel
                } else {
                    SlotState::Active
                }
            }
        }
    }

    /// Le slot peut recevoir une nouvelle entrée.
    pub fn is_free(&self) -> bool {
        matches!(self, SlotState::End | SlotState::Deleted)
    }
}

/// Date et heure de création, à la minute près.
///
/// Le format FAT ne garde pas les secondes dans ces champs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl Timestamp {
    /// Décode les champs bruts `(time, date)`.
    pub fn from_raw(time: u16, date: u16) -> Self {
        Self {
            year: ((date & 0xFE00) >> 9) + 1980,
            month: ((date & 0x01E0) >> 5) as u8,
            day: (date & 0x001F) as u8,
            hour: ((time & 0xF800) >> 11) as u8,
            minute: ((time & 0x07E0) >> 5) as u8,
        }
    }

    /// Encode en `(time, date)`.
    pub fn to_raw(&self) -> Result<(u16, u16), FatError> {
        if !(1980..=2107).contains(&self.year) {
            return Err(FatError::MalformedEntry("année hors de 1980..=2107"));
        }
        if !(1..=12).contains(&self.month) || !(1..=31).contains(&self.day) {
            return Err(FatError::MalformedEntry("date invalide"));
        }
        if self.hour > 23 || self.minute > 59 {
            return Err(FatError::MalformedEntry("heure invalide"));
        }

        let date = ((self.year - 1980) << 9) | ((self.month as u16) << 5) | self.day as u16;
        let time = ((self.hour as u16) << 11) | ((self.minute as u16) << 5);
        Ok((time, date))
    }
}

/// Entrée de répertoire FAT12 (nom court 8.3).
///
/// Exemple: `HELLO.TXT`, `DIR`, `A.BIN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Nom court reconstitué (ex: `HELLO.TXT`).
    pub name: String,
    /// Octets bruts nom + extension, tels que sur le disque.
    pub raw_name: [u8; 11],
    /// Attributs FAT.
    pub attrs: Attributes,
    /// Heure de création brute (offset 14).
    pub raw_time: u16,
    /// Date de création brute (offset 16).
    pub raw_date: u16,
    /// Premier cluster de la chaîne (0 pour un fichier vide).
    pub first_cluster: u16,
    /// Taille du fichier en octets (0 pour un répertoire).
    pub size: u32,
}

impl DirEntry {
    /// Parse une entrée de 32 octets, sans filtrer sur son état.
    ///
    /// Le tri libre/supprimé/LFN/étiquette se fait avec [`SlotState::of`].
    pub fn parse(entry: &[u8]) -> Option<Self> {
        if entry.len() < DIR_ENTRY_SIZE {
            return None;
        }

        let mut raw_name = [0u8; 11];
        raw_name.copy_from_slice(&entry[0..11]);

        let attrs = Attributes::from_byte(entry[11]);
        let name = decode_ascii_trim(&entry[0..8]);
        let ext = decode_ascii_trim(&entry[8..11]);

        let full_name = if !ext.is_empty() && !attrs.volume_id {
            let mut s = String::with_capacity(name.len() + 1 + ext.len());
            s.push_str(&name);
            s.push('.');
            s.push_str(&ext);
            s
        } else if attrs.volume_id {
            // une étiquette s’étale sur les 11 octets
            decode_ascii_trim(&entry[0..11])
        } else {
            name
        };

        Some(Self {
            name: full_name,
            raw_name,
            attrs,
            raw_time: LittleEndian::read_u16(&entry[TIME_OFFSET..TIME_OFFSET + 2]),
            raw_date: LittleEndian::read_u16(&entry[DATE_OFFSET..DATE_OFFSET + 2]),
            first_cluster: LittleEndian::read_u16(&entry[CLUSTER_OFFSET..CLUSTER_OFFSET + 2]),
            size: LittleEndian::read_u32(&entry[SIZE_OFFSET..SIZE_OFFSET + 4]),
        })
    }

    /// Indique si l’entrée est un répertoire.
    pub fn is_dir(&self) -> bool {
        self.attrs.directory
    }

    /// Indique si l’entrée est un fichier.
    pub fn is_file(&self) -> bool {
        !self.attrs.directory && !self.attrs.volume_id
    }

    /// `.` ou `..`
    pub fn is_dot(&self) -> bool {
        self.raw_name[0] == b'.'
    }

    /// Date/heure de création décodée.
    pub fn created(&self) -> Timestamp {
        Timestamp::from_raw(self.raw_time, self.raw_date)
    }
}

/// Encode un nom en format court 8.3.
///
/// Exemples :
/// - `"hello.txt"` -> name=`"HELLO   "`, ext=`"TXT"`
/// - `"DIR"`       -> name=`"DIR     "`, ext=`"   "`
///
/// Le découpage se fait sur le dernier `.`.
pub fn encode_short_name(name: &str) -> Result<[u8; 11], FatError> {
    let (base, ext) = match name.rfind('.') {
        Some(dot) => (&name[..dot], &name[dot + 1..]),
        None => (name, ""),
    };

    if base.is_empty() {
        return Err(FatError::MalformedEntry("nom vide"));
    }
    if base.len() > 8 {
        return Err(FatError::MalformedEntry("nom de plus de 8 caractères"));
    }
    if ext.len() > 3 {
        return Err(FatError::MalformedEntry("extension de plus de 3 caractères"));
    }

    let mut raw = [b' '; 11];
    for (i, ch) in base.bytes().enumerate() {
        if !ch.is_ascii() || ch == b'/' || ch == b'.' {
            return Err(FatError::MalformedEntry("caractère non supporté"));
        }
        raw[i] = ch.to_ascii_uppercase();
    }
    for (i, ch) in ext.bytes().enumerate() {
        if !ch.is_ascii() || ch == b'/' {
            return Err(FatError::MalformedEntry("caractère non supporté"));
        }
        raw[8 + i] = ch.to_ascii_uppercase();
    }

    Ok(raw)
}

/// Écrit une entrée de fichier dans un slot de 32 octets.
///
/// Le slot est remis à zéro avant l’écriture (attribut 0x00).
pub fn write_entry(
    slot: &mut [u8],
    raw_name: &[u8; 11],
    first_cluster: u16,
    size: u32,
    created: Timestamp,
) -> Result<(), FatError> {
    if slot.len() < DIR_ENTRY_SIZE {
        return Err(FatError::MalformedEntry("slot de moins de 32 octets"));
    }
    let (time, date) = created.to_raw()?;

    let e = &mut slot[..DIR_ENTRY_SIZE];
    e.fill(0);
    e[0..11].copy_from_slice(raw_name);
    LittleEndian::write_u16(&mut e[TIME_OFFSET..TIME_OFFSET + 2], time);
    LittleEndian::write_u16(&mut e[DATE_OFFSET..DATE_OFFSET + 2], date);
    LittleEndian::write_u16(&mut e[CLUSTER_OFFSET..CLUSTER_OFFSET + 2], first_cluster);
    LittleEndian::write_u32(&mut e[SIZE_OFFSET..SIZE_OFFSET + 4], size);

    Ok(())
}
