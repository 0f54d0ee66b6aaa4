pub mod action;
pub mod cache;
pub mod compiler;
pub mod config;
pub mod content;
pub mod dependency;
pub mod di;
pub mod errors;
pub mod executor;
pub mod item;
pub mod notifications;
pub mod snapshot_repo;

pub use action::{ActionProvider, Params, ProcessingAction, StaticActionProvider};
pub use cache::{CacheError, CacheManager, CompiledContentCache};
pub use compiler::phases::{CachePhase, Phase, RecalculatePhase};
pub use compiler::{
    AlwaysOutdated, CompilationContext, CompileReport, Compiler, OutdatednessChecker, RepFailure,
};
pub use config::{CompilerOptions, TesseraConfig};
pub use content::Content;
pub use dependency::{
    DependencyProps, DependencyScope, DependencyStore, DependencyTarget, DependencyTracker,
};
pub use di::{BuildInputs, Container};
pub use errors::CompileError;
pub use executor::{
    Executor, Filter, FilterContext, FilterRegistry, LayoutRenderer, PlaceholderLayoutRenderer,
};
pub use item::{Attributes, Identifier, Item, ItemRep, Layout, RepIdentity, Site, SnapshotName};
pub use notifications::{
    CollectingNotificationSink, Notification, NotificationSink, TracingNotificationSink,
};
pub use snapshot_repo::{SnapshotRepo, Snapshots};
