//! Material (texture/flat) registry.
//!
//! Materials are addressed at runtime by [`MaterialId`], an index into the
//! registry that is only stable for the lifetime of one asset load. Saves
//! therefore refer to materials by their 8-character lump name and group.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::MATERIAL_NAME_LEN;

/// Namespace a material name lives in. Flats and wall textures may share names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MaterialGroup {
    Flats = 0,
    Textures = 1,
}

impl MaterialGroup {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(MaterialGroup::Flats),
            1 => Some(MaterialGroup::Textures),
            _ => None,
        }
    }
}

/// Runtime handle of a registered material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialDef {
    pub name: String,
    pub group: MaterialGroup,
}

/// All materials known to the currently loaded asset set.
#[derive(Resource, Debug, Clone, Default)]
pub struct MaterialRegistry {
    defs: Vec<MaterialDef>,
}

impl MaterialRegistry {
    /// Registers a material, returning the existing id if `(name, group)` is
    /// already known. Names longer than eight characters are truncated.
    pub fn register(&mut self, name: &str, group: MaterialGroup) -> MaterialId {
        let name = truncate_name(name);
        if let Some(id) = self.find(&name, group) {
            return id;
        }
        self.defs.push(MaterialDef { name, group });
        MaterialId(self.defs.len() as u32 - 1)
    }

    /// Case-insensitive lookup within one group.
    pub fn find(&self, name: &str, group: MaterialGroup) -> Option<MaterialId> {
        self.defs
            .iter()
            .position(|d| d.group == group && d.name.eq_ignore_ascii_case(name))
            .map(|i| MaterialId(i as u32))
    }

    pub fn get(&self, id: MaterialId) -> Option<&MaterialDef> {
        self.defs.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

fn truncate_name(name: &str) -> String {
    name.chars().take(MATERIAL_NAME_LEN).collect()
}
