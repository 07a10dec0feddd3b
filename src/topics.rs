//! Topics the mower map is recorded on.

use crate::zone::ZoneKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topic {
    pub name: &'static str,
    pub message_type: &'static str,
}

/// The docking pose. The only source of [`ZoneKind::DockingPoint`].
pub const DOCKING_POINT: Topic = Topic {
    name: "/docking_point",
    message_type: "geometry_msgs/Pose",
};

/// All area polygons, one list entry per area.
pub const MOWING_AREAS: Topic = Topic {
    name: "/mowing_areas",
    message_type: "openmower_msgs/MowingAreaList",
};

pub const ALL: [Topic; 2] = [DOCKING_POINT, MOWING_AREAS];

/// Topic a feature of `kind` is published on.
pub fn for_kind(kind: ZoneKind) -> Topic {
    match kind {
        ZoneKind::DockingPoint => DOCKING_POINT,
        _ => MOWING_AREAS,
    }
}

/// Known topic mentioned on `line`, if any.
pub fn find_in(line: &str) -> Option<Topic> {
    ALL.into_iter().find(|topic| {
        line.match_indices(topic.name).any(|(at, _)| {
            let end = at + topic.name.len();
            line[end..]
                .chars()
                .next()
                .map_or(true, |c| !(c.is_alphanumeric() || c == '_' || c == '/'))
        })
    })
}

/// Kind of a block that was named after `topic`.
pub fn kind_of(topic: Topic) -> ZoneKind {
    if topic == DOCKING_POINT {
        ZoneKind::DockingPoint
    } else {
        ZoneKind::classify(topic.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_in() {
        assert_eq!(find_in("/docking_point"), Some(DOCKING_POINT));
        assert_eq!(
            find_in("topics:      /mowing_areas   1 msg    : openmower_msgs/MowingAreaList"),
            Some(MOWING_AREAS)
        );
        assert_eq!(find_in("frame_id: \"map\""), None);
        assert_eq!(find_in("/docking_point_backup"), None);
    }

    #[test]
    fn test_kind_of() {
        assert_eq!(kind_of(DOCKING_POINT), ZoneKind::DockingPoint);
        assert_eq!(kind_of(MOWING_AREAS), ZoneKind::WorkingArea);
        assert_eq!(for_kind(ZoneKind::ExclusionZone), MOWING_AREAS);
        assert_eq!(for_kind(ZoneKind::DockingPoint), DOCKING_POINT);
    }
}
