//! Notifications queued by a session for its host.

use migrate_model::Link;
use serde::Serialize;

/// Something the presentation layer should react to.
///
/// Sessions queue events as operations run; hosts drain them with
/// [`MigrationSession::take_events`](crate::MigrationSession::take_events).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SessionEvent {
    /// A link now exists (manual link, undo of a removal, redo of an add).
    LinkCreated { link: Link },
    /// A link no longer exists.
    LinkRemoved { link: Link },
    /// An auto-match run finished; holds the links it applied.
    AutoMatchCompleted { links: Vec<Link> },
    /// Every old record is now linked.
    MigrationCompleted { links: Vec<Link> },
    /// The host asked for the current mapping.
    ExportRequested { links: Vec<Link> },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LinkCreated { .. } => "link-created",
            Self::LinkRemoved { .. } => "link-removed",
            Self::AutoMatchCompleted { .. } => "auto-match-completed",
            Self::MigrationCompleted { .. } => "migration-completed",
            Self::ExportRequested { .. } => "export-requested",
        }
    }

    /// Links carried by the event.
    pub fn links(&self) -> &[Link] {
        match self {
            Self::LinkCreated { link } | Self::LinkRemoved { link } => std::slice::from_ref(link),
            Self::AutoMatchCompleted { links }
            | Self::MigrationCompleted { links }
            | Self::ExportRequested { links } => links,
        }
    }
}
