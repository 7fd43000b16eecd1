//! Pure decisions about the shape of the folder tree.

use std::collections::{HashMap, HashSet};

/// Parent for a new folder.
///
/// An explicit request wins. Without one, a user who owns exactly one folder
/// gets it as the implied parent; everyone else gets a root folder.
pub fn resolve_parent(requested: Option<i32>, owned_folder_ids: &[i32]) -> Option<i32> {
    match (requested, owned_folder_ids) {
        (Some(id), _) => Some(id),
        (None, [only]) => Some(*only),
        (None, _) => None,
    }
}

/// Whether re-parenting `folder_id` under `new_parent` would make the folder
/// its own ancestor. `parents` maps folder id to parent id.
pub fn creates_cycle(
    parents: &HashMap<i32, Option<i32>>,
    folder_id: i32,
    new_parent: Option<i32>,
) -> bool {
    let mut visited = HashSet::new();
    let mut cursor = new_parent;

    while let Some(id) = cursor {
        if id == folder_id {
            return true;
        }
        if !visited.insert(id) {
            // Existing data already loops; never extend it.
            return true;
        }
        cursor = parents.get(&id).copied().flatten();
    }

    false
}

/// Ancestor chain of `folder_id`, nearest parent first, excluding the folder.
pub fn ancestors(parents: &HashMap<i32, Option<i32>>, folder_id: i32) -> Vec<i32> {
    let mut chain = Vec::new();
    let mut visited = HashSet::from([folder_id]);
    let mut cursor = parents.get(&folder_id).copied().flatten();

    while let Some(id) = cursor {
        if !visited.insert(id) {
            tracing::error!("Folder {} has a cyclic ancestor chain", folder_id);
            break;
        }
        chain.push(id);
        cursor = parents.get(&id).copied().flatten();
    }

    chain
}
