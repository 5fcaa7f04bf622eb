// ---------------------------------------------------------------------------
// material_archive – material names referenced by the world records
// ---------------------------------------------------------------------------
//
// Surfaces are written as indices into this table, so it must be fully
// populated (see `MaterialArchive::prepare`) before any world record is
// written. Wire layout: count short, then per entry an 8-byte name and a
// group byte. Version 0 archives hold two tables, flats then textures,
// without group bytes.

use bevy::prelude::*;

use simulation::config::MATERIAL_NAME_LEN;
use simulation::map::Map;
use simulation::materials::{MaterialGroup, MaterialId, MaterialRegistry};

use crate::save_codec::{SaveReader, SaveWriter};
use crate::save_error::SaveError;

/// Name written for surfaces without a material.
pub const BAD_TEXTURE_NAME: &str = "DD_BADTX";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialArchiveEntry {
    pub name: String,
    pub group: MaterialGroup,
}

#[derive(Debug, Clone, Default)]
pub struct MaterialArchive {
    entries: Vec<MaterialArchiveEntry>,
    version: u8,
    /// Size of the flats table in a version 0 archive.
    num_flats: usize,
}

impl MaterialArchive {
    pub fn new() -> Self {
        Self {
            version: 1,
            ..Default::default()
        }
    }

    /// Builds the table from every surface of the map: floors and ceilings
    /// first, then the middle, top and bottom of each side.
    pub fn prepare(map: &Map, registry: &MaterialRegistry) -> Self {
        let mut archive = Self::new();
        for sector in &map.sectors {
            archive.register(registry, sector.floor.material, MaterialGroup::Flats);
            archive.register(registry, sector.ceiling.material, MaterialGroup::Flats);
        }
        for side in &map.sides {
            for surface in [&side.middle, &side.top, &side.bottom] {
                archive.register(registry, surface.material, MaterialGroup::Textures);
            }
        }
        archive
    }

    fn entry_for(
        registry: &MaterialRegistry,
        material: Option<MaterialId>,
        fallback_group: MaterialGroup,
    ) -> MaterialArchiveEntry {
        match material.and_then(|id| registry.get(id)) {
            Some(def) => MaterialArchiveEntry {
                name: def.name.chars().take(MATERIAL_NAME_LEN).collect(),
                group: def.group,
            },
            None => MaterialArchiveEntry {
                name: BAD_TEXTURE_NAME.to_string(),
                group: fallback_group,
            },
        }
    }

    fn position(&self, entry: &MaterialArchiveEntry) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.group == entry.group && e.name.eq_ignore_ascii_case(&entry.name))
    }

    /// Adds the material if its (name, group) pair is new; returns its index.
    pub fn register(
        &mut self,
        registry: &MaterialRegistry,
        material: Option<MaterialId>,
        fallback_group: MaterialGroup,
    ) -> u16 {
        let entry = Self::entry_for(registry, material, fallback_group);
        let index = match self.position(&entry) {
            Some(i) => i,
            None => {
                self.entries.push(entry);
                self.entries.len() - 1
            }
        };
        index as u16
    }

    /// Index of an already registered material. Unregistered materials map
    /// to index 0, which only happens when the pre-scan missed a surface.
    pub fn index_of(
        &self,
        registry: &MaterialRegistry,
        material: Option<MaterialId>,
        fallback_group: MaterialGroup,
    ) -> u16 {
        let entry = Self::entry_for(registry, material, fallback_group);
        match self.position(&entry) {
            Some(i) => i as u16,
            None => {
                warn!(
                    "Material {} was not in the archive pre-scan; writing index 0",
                    entry.name
                );
                0
            }
        }
    }

    pub fn write(&self, w: &mut SaveWriter) -> Result<(), SaveError> {
        let count = i16::try_from(self.entries.len()).map_err(|_| {
            SaveError::Unsupported(format!(
                "{} materials exceed the {} one save can hold",
                self.entries.len(),
                i16::MAX
            ))
        })?;
        w.write_i16(count);
        for entry in &self.entries {
            w.write_name(&entry.name, MATERIAL_NAME_LEN);
            w.write_u8(entry.group as u8);
        }
        Ok(())
    }

    pub fn read(r: &mut SaveReader<'_>, version: u8) -> Self {
        let mut archive = Self {
            version,
            ..Default::default()
        };
        archive.read_table(r, MaterialGroup::Flats);
        if version == 0 {
            archive.num_flats = archive.entries.len();
            archive.read_table(r, MaterialGroup::Textures);
        }
        archive
    }

    fn read_table(&mut self, r: &mut SaveReader<'_>, default_group: MaterialGroup) {
        let count = r.read_i16().max(0);
        for _ in 0..count {
            let name = r.read_name(MATERIAL_NAME_LEN);
            let group = if self.version >= 1 {
                let raw = r.read_u8();
                MaterialGroup::from_u8(raw).unwrap_or_else(|| {
                    warn!("Material {name} has unknown group {raw}; assuming flats");
                    MaterialGroup::Flats
                })
            } else {
                default_group
            };
            self.entries.push(MaterialArchiveEntry { name, group });
        }
    }

    /// Turns a stored index back into a live material. Missing materials
    /// resolve to `None` and the load carries on.
    pub fn resolve(
        &self,
        registry: &MaterialRegistry,
        index: i16,
        group: MaterialGroup,
    ) -> Option<MaterialId> {
        let mut index = usize::try_from(index).ok()?;
        if self.version < 1 && group == MaterialGroup::Textures {
            index += self.num_flats;
        }
        let Some(entry) = self.entries.get(index) else {
            warn!(
                "Material archive index {index} out of range ({} entries)",
                self.entries.len()
            );
            return None;
        };
        if entry.name.eq_ignore_ascii_case(BAD_TEXTURE_NAME) {
            return None;
        }
        let found = registry.find(&entry.name, entry.group);
        if found.is_none() {
            warn!(
                "Material {} ({:?}) is not available; surface left blank",
                entry.name, entry.group
            );
        }
        found
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MaterialArchiveEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simulation::map::{Bounds, Plane, Sector, Side, Surface};

    fn registry() -> (MaterialRegistry, MaterialId, MaterialId, MaterialId) {
        let mut reg = MaterialRegistry::default();
        let floor = reg.register("FLOOR4_8", MaterialGroup::Flats);
        let ceil = reg.register("CEIL3_5", MaterialGroup::Flats);
        let wall = reg.register("STARTAN3", MaterialGroup::Textures);
        (reg, floor, ceil, wall)
    }

    fn map(floor: MaterialId, ceil: MaterialId, wall: MaterialId) -> Map {
        let bounds = Bounds::new([0.0, 0.0], [64.0, 64.0]);
        Map {
            sectors: vec![
                Sector::new(Plane::new(0.0, Some(floor)), Plane::new(128.0, Some(ceil)), bounds),
                Sector::new(Plane::new(0.0, Some(floor)), Plane::new(128.0, Some(ceil)), bounds),
            ],
            sides: vec![Side::new(
                Surface::new(None),
                Surface::new(Some(wall)),
                Surface::new(None),
            )],
            ..Default::default()
        }
    }

    #[test]
    fn test_prepare_dedups_in_first_seen_order() {
        let (reg, floor, ceil, wall) = registry();
        let archive = MaterialArchive::prepare(&map(floor, ceil, wall), &reg);
        let names: Vec<_> = archive.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["FLOOR4_8", "CEIL3_5", "STARTAN3", BAD_TEXTURE_NAME]);
        assert_eq!(archive.index_of(&reg, Some(wall), MaterialGroup::Textures), 2);
        assert_eq!(archive.index_of(&reg, None, MaterialGroup::Textures), 3);
    }

    #[test]
    fn test_same_name_different_group_kept_apart() {
        let mut reg = MaterialRegistry::default();
        let flat = reg.register("SHARED", MaterialGroup::Flats);
        let tex = reg.register("SHARED", MaterialGroup::Textures);
        let mut archive = MaterialArchive::new();
        assert_eq!(archive.register(&reg, Some(flat), MaterialGroup::Flats), 0);
        assert_eq!(archive.register(&reg, Some(tex), MaterialGroup::Textures), 1);
        assert_eq!(archive.register(&reg, Some(flat), MaterialGroup::Flats), 0);
    }

    #[test]
    fn test_write_read_and_resolve() {
        let (reg, floor, ceil, wall) = registry();
        let archive = MaterialArchive::prepare(&map(floor, ceil, wall), &reg);
        let mut w = SaveWriter::new();
        archive.write(&mut w).expect("write");
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 2 + 4 * 9);

        let read = MaterialArchive::read(&mut SaveReader::new(&bytes), 1);
        assert_eq!(read.entries(), archive.entries());
        assert_eq!(read.resolve(&reg, 2, MaterialGroup::Textures), Some(wall));
        assert_eq!(read.resolve(&reg, 3, MaterialGroup::Textures), None);
    }

    #[test]
    fn test_missing_material_resolves_to_none() {
        let (reg, ..) = registry();
        let mut other = MaterialRegistry::default();
        let gone = other.register("GONE", MaterialGroup::Flats);
        let mut archive = MaterialArchive::new();
        archive.register(&other, Some(gone), MaterialGroup::Flats);
        assert_eq!(archive.resolve(&reg, 0, MaterialGroup::Flats), None);
        assert_eq!(archive.resolve(&reg, 7, MaterialGroup::Flats), None);
        assert_eq!(archive.resolve(&reg, -1, MaterialGroup::Flats), None);
    }

    #[test]
    fn test_legacy_split_tables() {
        let (reg, floor, _, wall) = registry();
        let mut w = SaveWriter::new();
        w.write_i16(1);
        w.write_name("FLOOR4_8", 8);
        w.write_i16(1);
        w.write_name("STARTAN3", 8);
        let bytes = w.into_bytes();

        let archive = MaterialArchive::read(&mut SaveReader::new(&bytes), 0);
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.resolve(&reg, 0, MaterialGroup::Flats), Some(floor));
        // Texture indices count from the start of the texture table.
        assert_eq!(archive.resolve(&reg, 0, MaterialGroup::Textures), Some(wall));
    }

    #[test]
    fn test_material_count_capped_at_short() {
        let entry = MaterialArchiveEntry {
            name: "FLAT1".to_string(),
            group: MaterialGroup::Flats,
        };
        let mut archive = MaterialArchive {
            entries: vec![entry; i16::MAX as usize],
            ..MaterialArchive::new()
        };
        archive.write(&mut SaveWriter::new()).expect("write");

        archive.entries.push(archive.entries[0].clone());
        let err = archive.write(&mut SaveWriter::new()).unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("32768 materials exceed the 32767"), "got: {msg}");
    }
}
