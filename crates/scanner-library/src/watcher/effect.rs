use notify::event::{ModifyKind, RemoveKind};
use notify::EventKind;

/// Mirrors the effect-type integers carried by the native watcher
/// protocol this design is modeled on. `OwnerChanged` is not reachable
/// through `notify` on Linux; it is mapped from `Other` defensively but
/// behaves identically to it (no-op) either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectType {
    Rename = 0,
    Modify = 1,
    Create = 2,
    Delete = 3,
    OwnerChanged = 4,
    Other = 5,
    /// Synthesized once per watcher after its first successful `watch()`
    /// call; not part of the native numbering.
    Startup,
}

pub fn from_notify_kind(kind: &EventKind) -> EffectType {
    match kind {
        EventKind::Create(_) => EffectType::Create,
        EventKind::Remove(RemoveKind::Any | RemoveKind::File | RemoveKind::Folder) => EffectType::Delete,
        EventKind::Remove(_) => EffectType::Delete,
        EventKind::Modify(ModifyKind::Name(_)) => EffectType::Rename,
        EventKind::Modify(_) => EffectType::Modify,
        _ => EffectType::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, RenameMode};

    #[test]
    fn create_maps_to_create() {
        assert_eq!(from_notify_kind(&EventKind::Create(CreateKind::File)), EffectType::Create);
    }

    #[test]
    fn rename_maps_to_rename() {
        assert_eq!(from_notify_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::Both))), EffectType::Rename);
    }

    #[test]
    fn remove_maps_to_delete() {
        assert_eq!(from_notify_kind(&EventKind::Remove(RemoveKind::File)), EffectType::Delete);
    }

    #[test]
    fn other_kinds_map_to_other() {
        assert_eq!(from_notify_kind(&EventKind::Any), EffectType::Other);
    }
}
