//! Parcours des répertoires.
//!
//! Un répertoire est une suite de slots de 32 octets à partir d’un offset.
//! La racine a une capacité fixe, un sous-répertoire est lu de façon
//! contiguë depuis son premier cluster jusqu’au slot `0x00`.

extern crate alloc;

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

use crate::dir_entry::{DirEntry, SlotState};
use crate::geometry::DIR_ENTRY_SIZE;
use crate::{FatError, Geometry};

/// Zone de répertoire dans l’image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirRegion {
    /// Offset absolu du premier slot.
    pub offset: usize,
    /// Nombre maximal de slots, `None` pour un sous-répertoire.
    pub max_entries: Option<usize>,
    /// Premier cluster du répertoire (`None` pour la racine).
    pub first_cluster: Option<u16>,
}

impl DirRegion {
    /// Répertoire racine.
    pub fn root(geometry: &Geometry) -> Self {
        Self {
            offset: geometry.root_dir_offset,
            max_entries: Some(geometry.root_dir_entries),
            first_cluster: None,
        }
    }

    /// Sous-répertoire qui commence au cluster `cluster`.
    pub fn subdirectory(geometry: &Geometry, cluster: u16) -> Result<Self, FatError> {
        let offset = geometry
            .cluster_offset(cluster)
            .ok_or(FatError::InvalidCluster(cluster))?;
        Ok(Self {
            offset,
            max_entries: None,
            first_cluster: Some(cluster),
        })
    }

    pub fn is_root(&self) -> bool {
        self.first_cluster.is_none()
    }
}

/// Itérateur paresseux sur les entrées d’un répertoire : `(offset, entrée)`.
///
/// Les entrées supprimées, LFN et étiquettes sont sautées (les étiquettes
/// peuvent être demandées avec [`DirEntries::with_volume_labels`]).
#[derive(Debug, Clone)]
pub struct DirEntries<'a> {
    disk: &'a [u8],
    region: DirRegion,
    index: usize,
    include_labels: bool,
    done: bool,
}

impl<'a> DirEntries<'a> {
    pub fn new(disk: &'a [u8], region: DirRegion) -> Self {
        Self {
            disk,
            region,
            index: 0,
            include_labels: false,
            done: false,
        }
    }

    /// Inclut aussi les entrées « étiquette de volume ».
    pub fn with_volume_labels(mut self) -> Self {
        self.include_labels = true;
        self
    }
}

impl Iterator for DirEntries<'_> {
    type Item = (usize, DirEntry);

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if self.region.max_entries.is_some_and(|max| self.index >= max) {
                self.done = true;
                break;
            }

            let off = self.region.offset + self.index * DIR_ENTRY_SIZE;
            if off + DIR_ENTRY_SIZE > self.disk.len() {
                log::warn!("répertoire à {:#x}: fin du buffer sans slot 0x00", self.region.offset);
                self.done = true;
                break;
            }
            self.index += 1;

            let slot = &self.disk[off..off + DIR_ENTRY_SIZE];
            match SlotState::of(slot) {
                SlotState::End => self.done = true,
                SlotState::Deleted | SlotState::LongName => {}
                SlotState::VolumeLabel if !self.include_labels => {}
                SlotState::VolumeLabel | SlotState::Active => {
                    if let Some(entry) = DirEntry::parse(slot) {
                        return Some((off, entry));
                    }
                }
            }
        }
        None
    }
}

/// Liste paresseusement les entrées d’une zone de répertoire.
pub fn list_entries(disk: &[u8], region: DirRegion) -> DirEntries<'_> {
    DirEntries::new(disk, region)
}

struct Frame<'a> {
    entries: DirEntries<'a>,
    prefix: String,
}

/// Parcours en profondeur de l’arborescence : `(chemin complet, entrée)`.
///
/// Un répertoire est produit avant son contenu. `.` et `..` ne sont jamais
/// produits, et on ne descend pas dans un répertoire dont le premier cluster
/// vaut 0 ou 1.
pub struct Walk<'a> {
    disk: &'a [u8],
    geometry: Geometry,
    stack: Vec<Frame<'a>>,
    visited: BTreeSet<usize>,
}

impl<'a> Walk<'a> {
    pub fn new(disk: &'a [u8], geometry: Geometry, start: DirRegion) -> Self {
        let mut visited = BTreeSet::new();
        visited.insert(start.offset);
        Self {
            disk,
            geometry,
            stack: alloc::vec![Frame {
                entries: DirEntries::new(disk, start),
                prefix: String::new(),
            }],
            visited,
        }
    }
}

impl Iterator for Walk<'_> {
    type Item = (String, DirEntry);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let Some((_, entry)) = frame.entries.next() else {
                self.stack.pop();
                continue;
            };
            if entry.is_dot() {
                continue;
            }

            let mut path = frame.prefix.clone();
            path.push('/');
            path.push_str(&entry.name);

            if entry.is_dir() && entry.first_cluster >= 2 {
                if let Ok(region) = DirRegion::subdirectory(&self.geometry, entry.first_cluster) {
                    if self.visited.insert(region.offset) {
                        self.stack.push(Frame {
                            entries: DirEntries::new(self.disk, region),
                            prefix: path.clone(),
                        });
                    } else {
                        log::warn!("{path}: répertoire déjà parcouru, ignoré");
                    }
                }
            }

            return Some((path, entry));
        }
    }
}

/// Parcourt récursivement l’arborescence à partir de `start`.
pub fn walk(disk: &[u8], geometry: Geometry, start: DirRegion) -> Walk<'_> {
    Walk::new(disk, geometry, start)
}

/// Cherche une entrée par son nom 8.3 brut dans une zone.
pub fn find_entry(disk: &[u8], region: DirRegion, raw_name: &[u8; 11]) -> Option<(usize, DirEntry)> {
    list_entries(disk, region).find(|(_, e)| &e.raw_name == raw_name)
}
