//! Erreurs du moteur FAT12.

use thiserror::Error;

/// Erreurs possibles lors de l’accès à une image FAT12.
///
/// Aucune opération ne renvoie `0` pour dire « pas trouvé » : chaque cas
/// a sa variante.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FatError {
    /// Le buffer est trop court pour contenir le secteur de boot et la racine.
    #[error("image trop petite: {len} octets, au moins {needed} attendus")]
    BufferTooSmall { len: usize, needed: usize },

    /// Lecture/écriture au-delà de la fin du buffer.
    #[error("accès hors du buffer à l'offset {offset:#x}")]
    OutOfBounds { offset: usize },

    /// Index de cluster en dehors de la table FAT.
    #[error("cluster {cluster} hors de la table (max {max})")]
    OutOfRange { cluster: u32, max: u16 },

    /// Cluster réservé (0 ou 1) là où un cluster de données est attendu.
    #[error("cluster {0} invalide pour des données")]
    InvalidCluster(u16),

    /// Nom, extension ou horodatage impossible à encoder en entrée 8.3.
    #[error("entrée de répertoire invalide: {0}")]
    MalformedEntry(&'static str),

    /// La chaîne de clusters ne se termine pas dans la limite de la table.
    #[error("chaîne de clusters cyclique à partir du cluster {start}")]
    CyclicChain { start: u16 },

    /// Un composant du chemin ne correspond à aucun sous-répertoire.
    #[error("répertoire introuvable")]
    PathNotFound,

    /// Aucune entrée (fichier ou étiquette) ne correspond.
    #[error("entrée introuvable")]
    EntryNotFound,

    /// L’entrée visée est un répertoire.
    #[error("l'entrée est un répertoire")]
    NotAFile,

    /// Pas assez de clusters libres.
    #[error("disque plein: {needed} clusters nécessaires, {available} libres")]
    DiskFull { needed: usize, available: usize },

    /// Plus de slot libre dans le répertoire de destination.
    #[error("plus de place dans le répertoire")]
    DirectoryFull,

    /// Un fichier du même nom existe déjà dans le répertoire.
    #[error("un fichier du même nom existe déjà")]
    AlreadyExists,
}
