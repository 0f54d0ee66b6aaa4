//! Mock collaborators for exercising the compiler in tests

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tessera_core::{
    CompileError, Content, Filter, FilterContext, Identifier, ItemRep, Params, Phase,
    SnapshotName, SnapshotRepo,
};

/// Uppercases textual content
#[derive(Debug, Default)]
pub struct UpcaseFilter;

impl Filter for UpcaseFilter {
    fn apply(
        &self,
        content: &Content,
        _params: &Params,
        _context: &FilterContext<'_>,
    ) -> anyhow::Result<Content> {
        let text = content
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("upcase needs textual content"))?;
        Ok(Content::text(text.to_uppercase()))
    }
}

/// Appends the `suffix` parameter to textual content
#[derive(Debug, Default)]
pub struct AppendFilter;

impl Filter for AppendFilter {
    fn apply(
        &self,
        content: &Content,
        params: &Params,
        _context: &FilterContext<'_>,
    ) -> anyhow::Result<Content> {
        let suffix = params
            .get("suffix")
            .and_then(|value| value.as_str())
            .unwrap_or_default();
        Ok(Content::text(format!("{}{}", content, suffix)))
    }
}

/// Appends the raw content of the item named by the `item` parameter
#[derive(Debug, Default)]
pub struct IncludeFilter;

impl Filter for IncludeFilter {
    fn apply(
        &self,
        content: &Content,
        params: &Params,
        context: &FilterContext<'_>,
    ) -> anyhow::Result<Content> {
        let identifier = params
            .get("item")
            .and_then(|value| value.as_str())
            .ok_or_else(|| anyhow::anyhow!("include needs an `item` parameter"))?;
        if context.item().identifier().as_str() == identifier {
            anyhow::bail!("{} cannot include itself", identifier);
        }
        let included = context
            .read_item(&Identifier::from(identifier))
            .ok_or_else(|| anyhow::anyhow!("no item {}", identifier))?;
        Ok(Content::text(format!("{}{}", content, included.content())))
    }
}

/// Always fails with the given message
#[derive(Debug)]
pub struct FailingFilter {
    message: String,
}

impl FailingFilter {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Filter for FailingFilter {
    fn apply(
        &self,
        _content: &Content,
        _params: &Params,
        _context: &FilterContext<'_>,
    ) -> anyhow::Result<Content> {
        anyhow::bail!("{}", self.message)
    }
}

/// Stand-in for a wrapped phase: records its calls and writes fixed content
pub struct RecordingPhase {
    snapshot_repo: Arc<SnapshotRepo>,
    content: Content,
    calls: Mutex<Vec<(String, bool)>>,
    count: AtomicUsize,
}

impl RecordingPhase {
    pub fn new(snapshot_repo: Arc<SnapshotRepo>) -> Self {
        Self::with_content(snapshot_repo, Content::text("wrapped content"))
    }

    pub fn with_content(snapshot_repo: Arc<SnapshotRepo>, content: Content) -> Self {
        Self {
            snapshot_repo,
            content,
            calls: Mutex::new(Vec::new()),
            count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// `(rep identity, is_outdated)` of every call, in order
    pub fn calls(&self) -> Vec<(String, bool)> {
        self.calls.lock().clone()
    }
}

impl Phase for RecordingPhase {
    fn run(&self, rep: &ItemRep, is_outdated: bool) -> Result<(), CompileError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push((rep.identity().to_string(), is_outdated));
        self.snapshot_repo.set(rep.identity(), SnapshotName::last(), self.content.clone());
        Ok(())
    }
}
