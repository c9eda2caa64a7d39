//! Chaînes de clusters : parcours, lecture et allocation.

extern crate alloc;

use alloc::vec::Vec;

use crate::geometry::END_OF_CHAIN;
use crate::{fat, free_space, FatError, Geometry};

/// Itérateur paresseux sur les clusters d’une chaîne.
///
/// Produit `start`, puis chaque successeur lu dans la FAT, et s’arrête
/// après le cluster dont le successeur vaut `0xFFF`.
pub struct Clusters<'a> {
    disk: &'a [u8],
    geometry: Geometry,
    start: u16,
    next: Option<u16>,
    steps: usize,
}

impl Iterator for Clusters<'_> {
    type Item = Result<u16, FatError>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;

        if current < 2 {
            return Some(Err(FatError::InvalidCluster(current)));
        }
        self.steps += 1;
        if self.steps > self.geometry.max_cluster as usize {
            log::warn!("chaîne à partir de {}: pas de fin après {} clusters", self.start, self.steps - 1);
            return Some(Err(FatError::CyclicChain { start: self.start }));
        }

        match fat::decode(self.disk, &self.geometry, current) {
            Ok(END_OF_CHAIN) => {}
            Ok(successor) => {
                log::trace!("cluster {current} -> {successor}");
                self.next = Some(successor);
            }
            Err(e) => return Some(Err(e)),
        }
        Some(Ok(current))
    }
}

/// Parcourt la chaîne qui commence à `start`.
pub fn clusters_of(disk: &[u8], geometry: Geometry, start: u16) -> Clusters<'_> {
    Clusters {
        disk,
        geometry,
        start,
        next: Some(start),
        steps: 0,
    }
}

/// Octets d’un cluster de données.
pub fn cluster_bytes<'a>(disk: &'a [u8], geometry: &Geometry, cluster: u16) -> Result<&'a [u8], FatError> {
    let off = geometry
        .cluster_offset(cluster)
        .ok_or(FatError::InvalidCluster(cluster))?;
    let end = off + geometry.cluster_size();
    if end > disk.len() {
        return Err(FatError::OutOfBounds { offset: off });
    }
    Ok(&disk[off..end])
}

/// Copie le contenu d’un fichier dans `sink`, cluster par cluster.
///
/// Chaque cluster sauf le dernier est copié en entier ; le dernier donne
/// `total_size % 512` octets, ou 512 si ce reste est nul. La chaîne entière
/// est validée avant le premier appel à `sink`.
///
/// Retourne le nombre d’octets passés à `sink`.
pub fn read_into<F>(
    disk: &[u8],
    geometry: Geometry,
    start: u16,
    total_size: u32,
    mut sink: F,
) -> Result<usize, FatError>
where
    F: FnMut(&[u8]),
{
    if total_size == 0 {
        return Ok(0);
    }

    let chain = clusters_of(disk, geometry, start).collect::<Result<Vec<_>, _>>()?;
    let expected = geometry.clusters_for(total_size as usize);
    if chain.len() != expected {
        log::warn!(
            "chaîne de {start}: {} clusters pour {total_size} octets ({expected} attendus)",
            chain.len()
        );
    }
    let cs = geometry.cluster_size();
    let tail = match total_size as usize % cs {
        0 => cs,
        rest => rest,
    };

    let mut written = 0usize;
    for (i, &cl) in chain.iter().enumerate() {
        let data = cluster_bytes(disk, &geometry, cl)?;
        let take = if i + 1 == chain.len() { tail } else { cs };
        sink(&data[..take]);
        written += take;
    }
    Ok(written)
}

/// Alloue une chaîne d’un cluster par segment de 512 octets de `source`,
/// la chaîne dans la FAT et y copie les données.
///
/// Retourne le premier cluster, ou `0` si `source` est vide (rien n’est alloué).
/// En cas d’erreur de place, le buffer n’est pas modifié.
pub fn allocate_and_write(disk: &mut [u8], geometry: Geometry, source: &[u8]) -> Result<u16, FatError> {
    let needed = geometry.clusters_for(source.len());
    if needed == 0 {
        return Ok(0);
    }

    let found = free_space::free_clusters(disk, geometry)
        .take(needed)
        .collect::<Result<Vec<_>, _>>()?;
    if found.len() < needed {
        return Err(FatError::DiskFull {
            needed,
            available: found.len(),
        });
    }

    let cs = geometry.cluster_size();
    for &cl in &found {
        cluster_bytes(disk, &geometry, cl)?;
    }

    // Chaînage : cl[i] -> cl[i+1], dernier -> EOC
    for (i, &cl) in found.iter().enumerate() {
        let v = found.get(i + 1).copied().unwrap_or(END_OF_CHAIN);
        fat::encode(disk, &geometry, cl, v)?;
    }

    for (&cl, chunk) in found.iter().zip(source.chunks(cs)) {
        let off = geometry
            .cluster_offset(cl)
            .ok_or(FatError::InvalidCluster(cl))?;
        disk[off..off + chunk.len()].copy_from_slice(chunk);
        // Nettoyage du reste du cluster
        disk[off + chunk.len()..off + cs].fill(0);
    }

    log::debug!(
        "{} octets écrits sur {} clusters à partir de {}",
        source.len(),
        found.len(),
        found[0]
    );
    Ok(found[0])
}
