//! Recherche de clusters libres (entrée FAT == 0).

use crate::{fat, FatError, Geometry};

/// Clusters libres de `2..=max_cluster`, dans l’ordre.
pub fn free_clusters(disk: &[u8], geometry: Geometry) -> impl Iterator<Item = Result<u16, FatError>> + '_ {
    free_clusters_upto(disk, geometry, geometry.max_cluster)
}

fn free_clusters_upto(
    disk: &[u8],
    geometry: Geometry,
    last: u16,
) -> impl Iterator<Item = Result<u16, FatError>> + '_ {
    (2..=last).filter_map(move |cl| match fat::decode(disk, &geometry, cl) {
        Ok(0) => Some(Ok(cl)),
        Ok(_) => None,
        Err(e) => Some(Err(e)),
    })
}

/// Premier cluster libre, s’il y en a un.
pub fn find_free_cluster(disk: &[u8], geometry: Geometry) -> Result<Option<u16>, FatError> {
    free_clusters(disk, geometry).next().transpose()
}

/// Vrai si au moins `ceil(byte_size / 512)` clusters sont libres.
///
/// Le scan s’arrête dès que le seuil est atteint.
pub fn has_capacity(disk: &[u8], geometry: Geometry, byte_size: usize) -> Result<bool, FatError> {
    let needed = geometry.clusters_for(byte_size);
    if needed == 0 {
        return Ok(true);
    }

    let mut free = 0usize;
    for cl in free_clusters(disk, geometry) {
        cl?;
        free += 1;
        if free >= needed {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Espace libre en octets, sur les clusters couverts par `total_sectors`
/// (champ du secteur de boot).
pub fn free_byte_count(disk: &[u8], geometry: Geometry, total_sectors: u32) -> Result<u64, FatError> {
    let last = geometry.last_cluster_for(total_sectors);
    let mut count = 0u64;
    for cl in free_clusters_upto(disk, geometry, last) {
        cl?;
        count += 1;
    }
    Ok(count * geometry.cluster_size() as u64)
}
