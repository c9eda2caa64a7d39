//! Parseur FAT12 (lecture + écriture simple) pour images de disquette 1.44 Mo.
//!
//! Ce crate manipule un volume FAT12 directement depuis un buffer mémoire.
//! Il permet :
//! - de lister l’arborescence et de lire des fichiers (lecture),
//! - d’ajouter un fichier 8.3 à la racine ou dans un sous-répertoire
//!   (écriture simple), en modifiant réellement le buffer du “disque”,
//! - de calculer les informations du volume (nom OS, étiquette, espace libre…).
//!
//! Notes importantes :
//! - Le cœur est en `no_std` (hors tests) et n’utilise que `core` et `alloc`.
//! - La géométrie est celle d’une disquette 1.44 Mo (voir [`Geometry`]).
//! - Pas de LFN, pas de suppression ni de renommage.
//! - Seule la première copie de la FAT est lue et écrite.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

use alloc::{string::String, vec::Vec};

pub mod boot_sector;
pub mod chain;
pub mod dir_entry;
mod error;
pub mod fat;
pub mod free_space;
pub mod geometry;
pub mod path;
pub mod walker;

pub use boot_sector::BootSector;
pub use dir_entry::{Attributes, DirEntry, Timestamp};
pub use error::FatError;
pub use geometry::Geometry;
pub use walker::{DirEntries, DirRegion, Walk};

use dir_entry::{encode_short_name, SlotState};
use geometry::DIR_ENTRY_SIZE;

/// Informations générales du volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeInfo {
    pub os_name: String,
    /// Étiquette du secteur de boot, sinon celle de la racine.
    pub label: Option<String>,
    /// Taille de l’image en octets.
    pub total_bytes: u64,
    pub free_bytes: u64,
    /// Nombre de fichiers dans toute l’arborescence.
    pub file_count: usize,
    pub fat_copies: u8,
    pub sectors_per_fat: u16,
}

/// Vue en lecture seule d’un volume FAT12 stocké dans un buffer mémoire.
#[derive(Debug, Clone)]
pub struct Fat12<'a> {
    disk: &'a [u8],
    geometry: Geometry,
    boot: BootSector,
}

/// Vue en lecture/écriture d’un volume FAT12 stocké dans un buffer mémoire.
///
/// Les opérations modifient directement `disk`.
/// Si tu sauvegardes ce buffer dans un fichier (`disk.img`), la modification est persistante.
#[derive(Debug)]
pub struct Fat12Mut<'a> {
    disk: &'a mut [u8],
    geometry: Geometry,
    boot: BootSector,
}

/// Vérifie que le buffer contient au moins le secteur de boot, la FAT et la racine.
fn open(disk: &[u8], geometry: &Geometry) -> Result<BootSector, FatError> {
    let boot = BootSector::parse(disk)?;

    let needed = geometry.root_dir_end();
    if disk.len() < needed {
        return Err(FatError::BufferTooSmall {
            len: disk.len(),
            needed,
        });
    }

    log::debug!(
        "image FAT12 ouverte: {} octets, OS {:?}, {} secteurs",
        disk.len(),
        boot.os_name,
        boot.total_sectors
    );
    Ok(boot)
}

impl<'a> Fat12<'a> {
    /// Construit une vue FAT12 (géométrie disquette 1.44 Mo).
    pub fn new(disk: &'a [u8]) -> Result<Self, FatError> {
        Self::with_geometry(disk, Geometry::FLOPPY_144)
    }

    /// Construit une vue FAT12 avec une géométrie explicite.
    pub fn with_geometry(disk: &'a [u8], geometry: Geometry) -> Result<Self, FatError> {
        let boot = open(disk, &geometry)?;
        Ok(Self {
            disk,
            geometry,
            boot,
        })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn boot_sector(&self) -> &BootSector {
        &self.boot
    }

    /// Zone du répertoire racine.
    pub fn root(&self) -> DirRegion {
        DirRegion::root(&self.geometry)
    }

    /// Entrées d’une zone de répertoire (sans supprimées, LFN, étiquettes).
    pub fn list_entries(&self, region: DirRegion) -> DirEntries<'a> {
        walker::list_entries(self.disk, region)
    }

    /// Parcours complet de l’arborescence : `("/SUB/FILE.TXT", entrée)`.
    pub fn list_tree(&self) -> Walk<'a> {
        walker::walk(self.disk, self.geometry, self.root())
    }

    /// Résout un chemin de répertoire à partir de la racine.
    pub fn resolve_dir(&self, path: &str) -> Result<DirRegion, FatError> {
        path::resolve(self.disk, &self.geometry, path, self.root())
    }

    /// Cherche une entrée (fichier ou répertoire) par son chemin.
    ///
    /// - `"A.TXT"` et `"/A.TXT"` désignent la racine
    /// - la recherche est case-insensitive sur les noms courts (8.3)
    /// - un répertoire parent manquant donne `PathNotFound`,
    ///   un nom absent donne `EntryNotFound`
    pub fn lookup(&self, path: &str) -> Result<DirEntry, FatError> {
        let (parent, name) = split_parent(path).ok_or(FatError::EntryNotFound)?;
        let region = self.resolve_dir(parent)?;
        let raw = encode_short_name(name).map_err(|_| FatError::EntryNotFound)?;

        walker::find_entry(self.disk, region, &raw)
            .map(|(_, e)| e)
            .ok_or(FatError::EntryNotFound)
    }

    /// Envoie le contenu d’un fichier à `sink`, morceau par morceau.
    ///
    /// Retourne le nombre d’octets produits.
    pub fn extract_file<F>(&self, entry: &DirEntry, sink: F) -> Result<usize, FatError>
    where
        F: FnMut(&[u8]),
    {
        if !entry.is_file() {
            return Err(FatError::NotAFile);
        }
        chain::read_into(self.disk, self.geometry, entry.first_cluster, entry.size, sink)
    }

    /// Lit un fichier entier en mémoire.
    pub fn read_file(&self, entry: &DirEntry) -> Result<Vec<u8>, FatError> {
        let mut out = Vec::with_capacity(entry.size as usize);
        self.extract_file(entry, |chunk| out.extend_from_slice(chunk))?;
        Ok(out)
    }

    /// Lit un fichier à partir de son chemin.
    pub fn read_file_by_path(&self, path: &str) -> Result<Vec<u8>, FatError> {
        let entry = self.lookup(path)?;
        self.read_file(&entry)
    }

    /// Étiquette du volume : secteur de boot, sinon entrée « étiquette »
    /// de la racine.
    pub fn volume_label(&self) -> Result<String, FatError> {
        if let Some(label) = self.boot.label() {
            return Ok(label);
        }

        self.list_entries(self.root())
            .with_volume_labels()
            .find(|(_, e)| e.attrs.volume_id)
            .map(|(_, e)| e.name)
            .ok_or(FatError::EntryNotFound)
    }

    pub fn find_free_cluster(&self) -> Result<Option<u16>, FatError> {
        free_space::find_free_cluster(self.disk, self.geometry)
    }

    pub fn has_capacity(&self, byte_size: usize) -> Result<bool, FatError> {
        free_space::has_capacity(self.disk, self.geometry, byte_size)
    }

    /// Espace libre en octets (borné par le nombre de secteurs du BPB).
    pub fn free_bytes(&self) -> Result<u64, FatError> {
        free_space::free_byte_count(self.disk, self.geometry, self.boot.total_sectors as u32)
    }

    /// Nombre de fichiers (hors répertoires) dans toute l’arborescence.
    pub fn file_count(&self) -> usize {
        self.list_tree().filter(|(_, e)| e.is_file()).count()
    }

    pub fn volume_info(&self) -> Result<VolumeInfo, FatError> {
        let label = match self.volume_label() {
            Ok(l) => Some(l),
            Err(FatError::EntryNotFound) => None,
            Err(e) => return Err(e),
        };

        Ok(VolumeInfo {
            os_name: self.boot.os_name.clone(),
            label,
            total_bytes: self.disk.len() as u64,
            free_bytes: self.free_bytes()?,
            file_count: self.file_count(),
            fat_copies: self.boot.fat_copies,
            sectors_per_fat: self.boot.sectors_per_fat,
        })
    }
}

impl<'a> Fat12Mut<'a> {
    /// Construit une vue FAT12 en lecture/écriture (géométrie disquette 1.44 Mo).
    pub fn new(disk: &'a mut [u8]) -> Result<Self, FatError> {
        Self::with_geometry(disk, Geometry::FLOPPY_144)
    }

    pub fn with_geometry(disk: &'a mut [u8], geometry: Geometry) -> Result<Self, FatError> {
        let boot = open(disk, &geometry)?;
        Ok(Self {
            disk,
            geometry,
            boot,
        })
    }

    /// Donne une vue lecture seule sur le même buffer.
    ///
    /// Ça permet de réutiliser `lookup` / `list_tree` sans dupliquer la logique.
    pub fn as_read(&self) -> Fat12<'_> {
        Fat12 {
            disk: &*self.disk,
            geometry: self.geometry,
            boot: self.boot.clone(),
        }
    }

    /// Ajoute un fichier dans le répertoire `dest_dir` (`"/"` ou `""` = racine).
    ///
    /// Règles simples (volontaires) :
    /// - nom court 8.3 uniquement (ex: `HELLO.TXT`, `A.TXT`, `FILE`)
    /// - le répertoire de destination doit exister
    /// - pas d’écrasement : un nom déjà présent donne `AlreadyExists`
    ///
    /// Toutes les vérifications (nom, date, chemin, place, slot libre) sont
    /// faites avant la première écriture dans le buffer.
    pub fn insert_file(
        &mut self,
        name: &str,
        content: &[u8],
        created: Timestamp,
        dest_dir: &str,
    ) -> Result<DirEntry, FatError> {
        let raw_name = encode_short_name(name)?;
        created.to_raw()?;

        let ro = self.as_read();
        let region = ro.resolve_dir(dest_dir)?;
        if walker::find_entry(ro.disk, region, &raw_name).is_some() {
            return Err(FatError::AlreadyExists);
        }

        if !ro.has_capacity(content.len())? {
            let available = free_space::free_clusters(ro.disk, ro.geometry)
                .filter(Result::is_ok)
                .count();
            return Err(FatError::DiskFull {
                needed: self.geometry.clusters_for(content.len()),
                available,
            });
        }

        let (slot_off, was_end, region_end) = self.find_free_slot(region)?;

        let first_cluster = chain::allocate_and_write(self.disk, self.geometry, content)?;
        dir_entry::write_entry(
            &mut self.disk[slot_off..slot_off + DIR_ENTRY_SIZE],
            &raw_name,
            first_cluster,
            content.len() as u32,
            created,
        )?;

        // Si on a remplacé un 0x00 (fin de répertoire), on remet un 0x00 juste après
        // (si ça rentre dans le répertoire). Ça garde un répertoire “propre”.
        if was_end {
            let next = slot_off + DIR_ENTRY_SIZE;
            if next + DIR_ENTRY_SIZE <= region_end {
                self.disk[next] = dir_entry::SLOT_END;
            }
        }

        log::debug!(
            "{name}: {} octets, cluster {first_cluster}, slot {slot_off:#x}",
            content.len()
        );

        DirEntry::parse(&self.disk[slot_off..slot_off + DIR_ENTRY_SIZE])
            .ok_or(FatError::MalformedEntry("slot de moins de 32 octets"))
    }

    /// Trouve un slot libre (`0x00` ou `0xE5`) dans un répertoire.
    ///
    /// Retourne:
    /// - l’offset dans `disk`
    /// - `was_end`: vrai si c’était un `0x00` (fin de répertoire)
    /// - la fin (exclue) de la zone utilisable
    ///
    /// Un sous-répertoire est limité à son premier cluster, et son dernier
    /// slot n’est utilisable que s’il est supprimé (`0xE5`).
    fn find_free_slot(&self, region: DirRegion) -> Result<(usize, bool, usize), FatError> {
        let slots = region
            .max_entries
            .unwrap_or_else(|| self.geometry.entries_per_cluster());
        let region_end = core::cmp::min(region.offset + slots * DIR_ENTRY_SIZE, self.disk.len());

        let mut off = region.offset;
        while off + DIR_ENTRY_SIZE <= region_end {
            match SlotState::of(&self.disk[off..off + DIR_ENTRY_SIZE]) {
                // sous-répertoire : un 0x00 en dernière position ne peut pas
                // être suivi d’un terminateur, la lecture déborderait
                SlotState::End
                    if region.max_entries.is_none() && off + 2 * DIR_ENTRY_SIZE > region_end =>
                {
                    break;
                }
                SlotState::End => return Ok((off, true, region_end)),
                SlotState::Deleted => return Ok((off, false, region_end)),
                _ => off += DIR_ENTRY_SIZE,
            }
        }

        Err(FatError::DirectoryFull)
    }
}

// ---------- helpers chemin ----------

/// Découpe `"/A/B/C.TXT"` en (`"/A/B"`, `"C.TXT"`) et `"C.TXT"` en (`""`, `"C.TXT"`).
fn split_parent(path: &str) -> Option<(&str, &str)> {
    let path = path.trim_end_matches('/');
    let (parent, name) = match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    };

    if name.is_empty() {
        return None;
    }
    Some((parent, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dir_entry::{ATTR_DIRECTORY, ATTR_VOLUME_ID};
    use crate::geometry::END_OF_CHAIN;
    use byteorder::{ByteOrder, LittleEndian};

    const SECTOR_SIZE: usize = 512;
    const G: Geometry = Geometry::FLOPPY_144;

    fn stamp() -> Timestamp {
        Timestamp {
            year: 2023,
            month: 11,
            day: 2,
            hour: 9,
            minute: 30,
        }
    }

    fn put(disk: &mut [u8], off: usize, name: &[u8; 11], attr: u8, cluster: u16, size: u32) {
        let e = &mut disk[off..off + 32];
        e[0..11].copy_from_slice(name);
        e[11] = attr;
        e[26..28].copy_from_slice(&cluster.to_le_bytes());
        e[28..32].copy_from_slice(&size.to_le_bytes());
    }

    /// Disquette 1.44 Mo vierge (2880 secteurs, 2 FAT de 9 secteurs).
    fn blank_floppy() -> Vec<u8> {
        let mut disk = vec![0u8; 2880 * SECTOR_SIZE];
        let b = &mut disk[0..SECTOR_SIZE];
        b[3..11].copy_from_slice(b"MSWIN4.1");
        LittleEndian::write_u16(&mut b[11..13], 512);
        b[13] = 1;
        LittleEndian::write_u16(&mut b[14..16], 1);
        b[16] = 2;
        LittleEndian::write_u16(&mut b[17..19], 224);
        LittleEndian::write_u16(&mut b[19..21], 2880);
        LittleEndian::write_u16(&mut b[22..24], 9);
        b[43..54].copy_from_slice(b"NO NAME    ");
        // media descriptor + entrée 1 réservée
        disk[0x200] = 0xF0;
        disk[0x201] = 0xFF;
        disk[0x202] = 0xFF;
        disk
    }

    /// Mini volume :
    /// - racine : étiquette TESTDISK, HELLO.TXT (cluster 2), SUB/ (cluster 3)
    /// - SUB : ., .., DEEP/ (cluster 4), NOTE.TXT (clusters 5 -> 6, 530 octets)
    /// - DEEP : ., ..
    fn build_test_image() -> Vec<u8> {
        let mut disk = blank_floppy();

        let root = G.root_dir_offset;
        put(&mut disk, root, b"TESTDISK   ", ATTR_VOLUME_ID, 0, 0);
        put(&mut disk, root + 32, b"HELLO   TXT", 0x20, 2, 5);
        put(&mut disk, root + 64, b"SUB        ", ATTR_DIRECTORY, 3, 0);

        let sub = G.cluster_offset(3).unwrap();
        put(&mut disk, sub, b".          ", ATTR_DIRECTORY, 3, 0);
        put(&mut disk, sub + 32, b"..         ", ATTR_DIRECTORY, 0, 0);
        put(&mut disk, sub + 64, b"DEEP       ", ATTR_DIRECTORY, 4, 0);
        put(&mut disk, sub + 96, b"NOTE    TXT", 0x20, 5, 530);

        let deep = G.cluster_offset(4).unwrap();
        put(&mut disk, deep, b".          ", ATTR_DIRECTORY, 4, 0);
        put(&mut disk, deep + 32, b"..         ", ATTR_DIRECTORY, 3, 0);

        let c2 = G.cluster_offset(2).unwrap();
        disk[c2..c2 + 5].copy_from_slice(b"HELLO");
        let c5 = G.cluster_offset(5).unwrap();
        disk[c5..c5 + 512].fill(b'n');
        let c6 = G.cluster_offset(6).unwrap();
        disk[c6..c6 + 18].fill(b'e');

        for (cl, next) in [(2, END_OF_CHAIN), (3, END_OF_CHAIN), (4, END_OF_CHAIN), (5, 6), (6, END_OF_CHAIN)] {
            fat::encode(&mut disk, &G, cl, next).unwrap();
        }
        disk
    }

    #[test]
    fn new_on_too_small_buffer_fails() {
        let tiny = [0u8; 128];
        let err = Fat12::new(&tiny).unwrap_err();
        assert_eq!(err, FatError::BufferTooSmall { len: 128, needed: 512 });

        // secteur de boot présent mais racine tronquée
        let short = vec![0u8; 0x3000];
        let err = Fat12::new(&short).unwrap_err();
        assert_eq!(err, FatError::BufferTooSmall { len: 0x3000, needed: 0x4200 });
    }

    #[test]
    fn lookup_and_read_root_file() {
        let disk = build_test_image();
        let fs = Fat12::new(&disk).unwrap();

        let hello = fs.lookup("hello.txt").unwrap();
        assert_eq!(hello.name, "HELLO.TXT");
        assert_eq!(hello.size, 5);
        assert_eq!(fs.read_file(&hello).unwrap(), b"HELLO");
        assert_eq!(fs.read_file_by_path("/HELLO.TXT").unwrap(), b"HELLO");
    }

    #[test]
    fn lookup_nested_file_reads_both_clusters() {
        let disk = build_test_image();
        let fs = Fat12::new(&disk).unwrap();

        let content = fs.read_file_by_path("/SUB/NOTE.TXT").unwrap();
        assert_eq!(content.len(), 530);
        assert!(content[..512].iter().all(|&b| b == b'n'));
        assert!(content[512..].iter().all(|&b| b == b'e'));
    }

    #[test]
    fn lookup_missing_entry_and_missing_dir_are_distinct() {
        let disk = build_test_image();
        let fs = Fat12::new(&disk).unwrap();

        assert_eq!(fs.lookup("NOPE.TXT").unwrap_err(), FatError::EntryNotFound);
        assert_eq!(fs.lookup("/NODIR/A.TXT").unwrap_err(), FatError::PathNotFound);
        // l’étiquette de volume n’est pas une entrée « fichier »
        assert_eq!(fs.lookup("TESTDISK").unwrap_err(), FatError::EntryNotFound);
    }

    #[test]
    fn extract_directory_is_not_a_file() {
        let disk = build_test_image();
        let fs = Fat12::new(&disk).unwrap();

        let sub = fs.lookup("SUB").unwrap();
        assert!(sub.is_dir());
        assert_eq!(fs.read_file(&sub).unwrap_err(), FatError::NotAFile);
    }

    #[test]
    fn list_tree_gives_full_paths() {
        let disk = build_test_image();
        let fs = Fat12::new(&disk).unwrap();

        let paths: Vec<_> = fs.list_tree().map(|(p, _)| p).collect();
        assert_eq!(paths, ["/HELLO.TXT", "/SUB", "/SUB/DEEP", "/SUB/NOTE.TXT"]);
        assert_eq!(fs.file_count(), 2);
    }

    #[test]
    fn resolve_dir_finds_deep_and_rejects_missing() {
        let disk = build_test_image();
        let fs = Fat12::new(&disk).unwrap();

        let deep = fs.resolve_dir("SUB/DEEP").unwrap();
        assert_eq!(deep.offset, G.cluster_offset(4).unwrap());
        assert_eq!(fs.resolve_dir("SUB/MISSING").unwrap_err(), FatError::PathNotFound);
    }

    #[test]
    fn volume_info_uses_root_label_when_boot_label_is_blank() {
        let disk = build_test_image();
        let fs = Fat12::new(&disk).unwrap();

        let info = fs.volume_info().unwrap();
        assert_eq!(info.os_name, "MSWIN4.1");
        assert_eq!(info.label.as_deref(), Some("TESTDISK"));
        assert_eq!(info.total_bytes, 1_474_560);
        assert_eq!(info.file_count, 2);
        assert_eq!(info.fat_copies, 2);
        assert_eq!(info.sectors_per_fat, 9);
        // 5 clusters occupés (2..=6)
        assert_eq!(info.free_bytes, (2847 - 5) * 512);
    }

    #[test]
    fn volume_label_missing_everywhere() {
        let disk = blank_floppy();
        let fs = Fat12::new(&disk).unwrap();
        assert_eq!(fs.volume_label().unwrap_err(), FatError::EntryNotFound);
        assert_eq!(fs.volume_info().unwrap().label, None);
    }

    #[test]
    fn blank_floppy_is_all_free() {
        let disk = blank_floppy();
        let fs = Fat12::new(&disk).unwrap();
        assert_eq!(fs.free_bytes().unwrap(), (G.max_cluster as u64 - 1) * 512);
        assert_eq!(fs.find_free_cluster().unwrap(), Some(2));
    }

    #[test]
    fn insert_small_file_then_lookup() {
        let mut disk = blank_floppy();

        {
            let mut rw = Fat12Mut::new(&mut disk).unwrap();
            let e = rw.insert_file("a.txt", b"0123456789", stamp(), "/").unwrap();
            assert_eq!(e.name, "A.TXT");
        }

        let ro = Fat12::new(&disk).unwrap();
        let e = ro.lookup("A.TXT").unwrap();
        assert_eq!(e.size, 10);
        assert_eq!(e.first_cluster, 2);
        assert_eq!(e.created(), stamp());
        assert_eq!(ro.read_file(&e).unwrap(), b"0123456789");
        assert_eq!(fat::decode(&disk, &G, 2).unwrap(), END_OF_CHAIN);
    }

    #[test]
    fn insert_multi_cluster_file_is_chained() {
        let mut disk = build_test_image();
        let data: Vec<u8> = (0..1500u32).map(|i| (i * 7 % 256) as u8).collect();

        {
            let mut rw = Fat12Mut::new(&mut disk).unwrap();
            rw.insert_file("BIG.BIN", &data, stamp(), "SUB/DEEP").unwrap();
        }

        let ro = Fat12::new(&disk).unwrap();
        let e = ro.lookup("/SUB/DEEP/BIG.BIN").unwrap();
        let chain: Vec<u16> = chain::clusters_of(&disk, G, e.first_cluster)
            .map(Result::unwrap)
            .collect();
        assert_eq!(chain, [7, 8, 9]);
        assert_eq!(ro.read_file(&e).unwrap(), data);
    }

    #[test]
    fn insert_keeps_directory_terminated() {
        let mut disk = build_test_image();
        let deep = G.cluster_offset(4).unwrap();
        // déchet après le terminateur
        disk[deep + 96] = b'Z';

        {
            let mut rw = Fat12Mut::new(&mut disk).unwrap();
            rw.insert_file("X", b"x", stamp(), "SUB/DEEP").unwrap();
        }

        assert_eq!(&disk[deep + 64..deep + 75], b"X          ");
        assert_eq!(disk[deep + 96], 0x00);
    }

    #[test]
    fn insert_reuses_deleted_slot() {
        let mut disk = build_test_image();
        let root = G.root_dir_offset;
        disk[root + 32] = dir_entry::SLOT_DELETED; // HELLO.TXT supprimé

        {
            let mut rw = Fat12Mut::new(&mut disk).unwrap();
            rw.insert_file("NEW.TXT", b"abc", stamp(), "").unwrap();
        }

        assert_eq!(&disk[root + 32..root + 43], b"NEW     TXT");
    }

    #[test]
    fn insert_into_missing_directory_fails_without_writing() {
        let mut disk = build_test_image();
        let before = disk.clone();

        let res = {
            let mut rw = Fat12Mut::new(&mut disk).unwrap();
            rw.insert_file("A.TXT", b"x", stamp(), "/NOPE")
        };

        assert_eq!(res.unwrap_err(), FatError::PathNotFound);
        assert_eq!(disk, before);
    }

    #[test]
    fn insert_rejects_invalid_8_3_name() {
        let mut disk = blank_floppy();
        let mut rw = Fat12Mut::new(&mut disk).unwrap();
        let err = rw
            .insert_file("TOO_LONG_NAME.TXT", b"x", stamp(), "/")
            .unwrap_err();
        assert!(matches!(err, FatError::MalformedEntry(_)));
    }

    #[test]
    fn insert_rejects_duplicate_name() {
        let mut disk = build_test_image();
        let mut rw = Fat12Mut::new(&mut disk).unwrap();
        let err = rw.insert_file("hello.txt", b"x", stamp(), "/").unwrap_err();
        assert_eq!(err, FatError::AlreadyExists);
    }

    #[test]
    fn insert_fails_when_disk_full() {
        let mut disk = blank_floppy();
        for cl in 2..G.max_cluster {
            fat::encode(&mut disk, &G, cl, END_OF_CHAIN).unwrap();
        }
        let before = disk.clone();

        let res = {
            let mut rw = Fat12Mut::new(&mut disk).unwrap();
            assert!(rw.as_read().has_capacity(512).unwrap());
            assert!(!rw.as_read().has_capacity(1024).unwrap());
            rw.insert_file("TWO.BIN", &[0u8; 600], stamp(), "/")
        };

        assert_eq!(res.unwrap_err(), FatError::DiskFull { needed: 2, available: 1 });
        assert_eq!(disk, before);
    }

    #[test]
    fn insert_fails_when_subdirectory_cluster_full() {
        let mut disk = build_test_image();
        let deep = G.cluster_offset(4).unwrap();
        for i in 2..16 {
            let mut name = *b"F          ";
            name[1] = b'A' + i as u8;
            put(&mut disk, deep + i * 32, &name, 0x20, 0, 0);
        }

        let mut rw = Fat12Mut::new(&mut disk).unwrap();
        let err = rw.insert_file("LAST", b"", stamp(), "SUB/DEEP").unwrap_err();
        assert_eq!(err, FatError::DirectoryFull);
    }

    #[test]
    fn insert_refuses_last_end_slot_of_subdirectory() {
        let mut disk = build_test_image();
        let deep = G.cluster_offset(4).unwrap();
        // ., .., puis 13 fichiers : seul le slot 15 (0x00) reste libre
        for i in 2..15 {
            let mut name = *b"F          ";
            name[1] = b'A' + i as u8;
            put(&mut disk, deep + i * 32, &name, 0x20, 0, 0);
        }
        let region = DirRegion::subdirectory(&G, 4).unwrap();
        assert_eq!(walker::list_entries(&disk, region).count(), 15);
        let before = disk.clone();

        let res = {
            let mut rw = Fat12Mut::new(&mut disk).unwrap();
            rw.insert_file("X.TXT", &[b'A'; 512], stamp(), "SUB/DEEP")
        };

        assert_eq!(res.unwrap_err(), FatError::DirectoryFull);
        assert_eq!(disk, before);
        assert_eq!(walker::list_entries(&disk, region).count(), 15);
    }

    #[test]
    fn insert_reuses_deleted_last_slot_of_subdirectory() {
        let mut disk = build_test_image();
        let deep = G.cluster_offset(4).unwrap();
        for i in 2..16 {
            let mut name = *b"F          ";
            name[1] = b'A' + i as u8;
            put(&mut disk, deep + i * 32, &name, 0x20, 0, 0);
        }
        disk[deep + 15 * 32] = dir_entry::SLOT_DELETED;

        {
            let mut rw = Fat12Mut::new(&mut disk).unwrap();
            rw.insert_file("X.TXT", b"x", stamp(), "SUB/DEEP").unwrap();
        }

        assert_eq!(&disk[deep + 15 * 32..deep + 15 * 32 + 11], b"X       TXT");
    }

    #[test]
    fn insert_empty_file_uses_cluster_zero() {
        let mut disk = blank_floppy();
        {
            let mut rw = Fat12Mut::new(&mut disk).unwrap();
            rw.insert_file("EMPTY", b"", stamp(), "/").unwrap();
        }

        let ro = Fat12::new(&disk).unwrap();
        let e = ro.lookup("EMPTY").unwrap();
        assert_eq!(e.first_cluster, 0);
        assert_eq!(e.size, 0);
        assert!(ro.read_file(&e).unwrap().is_empty());
        assert_eq!(ro.free_bytes().unwrap(), (G.max_cluster as u64 - 1) * 512);
    }

    #[test]
    fn split_parent_handles_relative_and_absolute() {
        assert_eq!(split_parent("/A/B/C.TXT"), Some(("/A/B", "C.TXT")));
        assert_eq!(split_parent("C.TXT"), Some(("", "C.TXT")));
        assert_eq!(split_parent("/C.TXT"), Some(("", "C.TXT")));
        assert_eq!(split_parent("/"), None);
    }
}
