pub mod controller;
pub mod notify;
pub mod persistence;
pub mod store;
pub mod surface;
pub mod sync;

pub use controller::{EditorError, ExportFile, WorkspaceController};
pub use notify::{Notification, NotificationLog, Notifier, Severity};
pub use persistence::{ActiveWorkspace, WorkspacePersistence};
pub use store::{KeyValueStore, MemoryStore, StoreError};
pub use surface::{RenderSurface, SurfaceGate};
pub use sync::{RenderView, StateSync};
