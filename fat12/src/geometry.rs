//! Géométrie fixe d’une disquette FAT12 1.44 Mo.
//!
//! Les offsets ne sont pas relus dans le BPB : le format visé est toujours
//! la même disquette (512 octets/secteur, 1 secteur/cluster, racine et zone
//! de données à des offsets absolus). On garde quand même une valeur
//! `Geometry` explicite pour pouvoir tester d’autres layouts FAT12.

/// Taille d’une entrée de répertoire.
pub const DIR_ENTRY_SIZE: usize = 32;

/// Valeur FAT « fin de chaîne ». Seule valeur reconnue comme terminateur.
pub const END_OF_CHAIN: u16 = 0xFFF;

/// Description immuable du layout d’un volume FAT12.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Taille d’un secteur (= taille d’un cluster ici).
    pub bytes_per_sector: usize,
    /// Début de la première copie de la FAT.
    pub fat_offset: usize,
    /// Début du répertoire racine.
    pub root_dir_offset: usize,
    /// Nombre de slots de 32 octets dans la racine.
    pub root_dir_entries: usize,
    /// Début de la zone de données (cluster 2).
    pub data_offset: usize,
    /// Plus grand numéro de cluster adressable.
    pub max_cluster: u16,
}

impl Geometry {
    /// Disquette 1.44 Mo : 2880 secteurs, FAT à 0x200, racine à 0x2600,
    /// données à 0x4200, clusters 2..=2848.
    pub const FLOPPY_144: Geometry = Geometry {
        bytes_per_sector: 512,
        fat_offset: 0x200,
        root_dir_offset: 0x2600,
        root_dir_entries: 224,
        data_offset: 0x4200,
        max_cluster: 2848,
    };

    /// Taille d’un cluster en octets.
    pub fn cluster_size(&self) -> usize {
        self.bytes_per_sector
    }

    /// Fin (exclue) du répertoire racine.
    pub fn root_dir_end(&self) -> usize {
        self.root_dir_offset + self.root_dir_entries * DIR_ENTRY_SIZE
    }

    /// Nombre de slots de répertoire dans un cluster.
    pub fn entries_per_cluster(&self) -> usize {
        self.cluster_size() / DIR_ENTRY_SIZE
    }

    /// Offset absolu du premier octet d’un cluster de données.
    ///
    /// `None` pour les clusters réservés 0 et 1.
    pub fn cluster_offset(&self, cluster: u16) -> Option<usize> {
        if cluster < 2 {
            return None;
        }
        Some(self.data_offset + (cluster as usize - 2) * self.cluster_size())
    }

    /// Dernier cluster valide compte tenu du nombre total de secteurs
    /// annoncé par le secteur de boot, borné par `max_cluster`.
    pub fn last_cluster_for(&self, total_sectors: u32) -> u16 {
        let data_start_sector = self.data_offset / self.bytes_per_sector;
        let total = total_sectors as usize;
        if total <= data_start_sector {
            return 1;
        }
        let last = total - data_start_sector + 1;
        core::cmp::min(last, self.max_cluster as usize) as u16
    }

    /// Nombre de clusters nécessaires pour `byte_size` octets.
    pub fn clusters_for(&self, byte_size: usize) -> usize {
        byte_size.div_ceil(self.cluster_size())
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::FLOPPY_144
    }
}
