//! Résolution de chemins `A/B/C` vers une zone de répertoire.

use crate::walker::{list_entries, DirRegion};
use crate::{FatError, Geometry};

/// Résout `path` (séparateur `/`) en partant de `start`.
///
/// - les composants vides et `.` sont ignorés (`"/"`, `"A//B"`, `"/A/"`)
/// - la comparaison porte sur les 8 octets du nom (majuscules, espaces),
///   l’extension n’est pas comparée
/// - seuls les sous-répertoires sont candidats
/// - un `..` de cluster 0 ramène à la racine
pub fn resolve(
    disk: &[u8],
    geometry: &Geometry,
    path: &str,
    start: DirRegion,
) -> Result<DirRegion, FatError> {
    let mut current = start;

    for part in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
        let target = base_name(part).ok_or(FatError::PathNotFound)?;

        let (_, entry) = list_entries(disk, current)
            .find(|(_, e)| e.is_dir() && e.raw_name[..8] == target[..])
            .ok_or(FatError::PathNotFound)?;

        current = match entry.first_cluster {
            0 => DirRegion::root(geometry),
            cl => DirRegion::subdirectory(geometry, cl)?,
        };
    }

    Ok(current)
}

/// Composant en majuscules complété par des espaces sur 8 octets.
///
/// `None` au-delà de 8 octets : rien ne peut correspondre.
fn base_name(part: &str) -> Option<[u8; 8]> {
    let bytes = part.as_bytes();
    if bytes.len() > 8 {
        return None;
    }
    let mut out = [b' '; 8];
    for (dst, b) in out.iter_mut().zip(bytes) {
        *dst = b.to_ascii_uppercase();
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dir_entry::ATTR_DIRECTORY;

    const G: Geometry = Geometry::FLOPPY_144;

    fn put(disk: &mut [u8], off: usize, name: &[u8; 11], attr: u8, cluster: u16) {
        disk[off..off + 11].copy_from_slice(name);
        disk[off + 11] = attr;
        disk[off + 26..off + 28].copy_from_slice(&cluster.to_le_bytes());
    }

    /// Racine : SUB/ (cluster 2), FILE (fichier), FOO.BAR/ (cluster 4)
    /// SUB : ., .., DEEP/ (cluster 3)
    fn image() -> Vec<u8> {
        let mut disk = vec![0u8; 0x4200 + 4 * 512];
        put(&mut disk, G.root_dir_offset, b"SUB        ", ATTR_DIRECTORY, 2);
        put(&mut disk, G.root_dir_offset + 32, b"FILE       ", 0x20, 5);
        put(&mut disk, G.root_dir_offset + 64, b"FOO     BAR", ATTR_DIRECTORY, 4);

        let sub = G.cluster_offset(2).unwrap();
        put(&mut disk, sub, b".          ", ATTR_DIRECTORY, 2);
        put(&mut disk, sub + 32, b"..         ", ATTR_DIRECTORY, 0);
        put(&mut disk, sub + 64, b"DEEP       ", ATTR_DIRECTORY, 3);
        disk
    }

    #[test]
    fn resolves_nested_directories() {
        let disk = image();
        let region = resolve(&disk, &G, "SUB/DEEP", DirRegion::root(&G)).unwrap();
        assert_eq!(region.offset, G.cluster_offset(3).unwrap());
        assert_eq!(region.first_cluster, Some(3));
    }

    #[test]
    fn resolution_is_case_insensitive_and_ignores_extra_slashes() {
        let disk = image();
        let region = resolve(&disk, &G, "/sub//deep/", DirRegion::root(&G)).unwrap();
        assert_eq!(region.offset, 0x4400);
    }

    #[test]
    fn empty_path_is_start_region() {
        let disk = image();
        let root = DirRegion::root(&G);
        assert_eq!(resolve(&disk, &G, "/", root).unwrap(), root);
        assert_eq!(resolve(&disk, &G, "", root).unwrap(), root);
    }

    #[test]
    fn missing_component_is_path_not_found() {
        let disk = image();
        let root = DirRegion::root(&G);
        assert_eq!(resolve(&disk, &G, "SUB/MISSING", root).unwrap_err(), FatError::PathNotFound);
        assert_eq!(resolve(&disk, &G, "WAY_TOO_LONG", root).unwrap_err(), FatError::PathNotFound);
    }

    #[test]
    fn files_are_not_directories() {
        let disk = image();
        let err = resolve(&disk, &G, "FILE", DirRegion::root(&G)).unwrap_err();
        assert_eq!(err, FatError::PathNotFound);
    }

    #[test]
    fn dot_dot_with_cluster_zero_goes_back_to_root() {
        let disk = image();
        let region = resolve(&disk, &G, "SUB/..", DirRegion::root(&G)).unwrap();
        assert!(region.is_root());
        assert_eq!(region.offset, G.root_dir_offset);
    }

    #[test]
    fn directory_extension_is_not_compared() {
        let disk = image();
        let region = resolve(&disk, &G, "foo", DirRegion::root(&G)).unwrap();
        assert_eq!(region.offset, G.cluster_offset(4).unwrap());

        let err = resolve(&disk, &G, "FOO.BAR", DirRegion::root(&G)).unwrap_err();
        assert_eq!(err, FatError::PathNotFound);
    }
}
