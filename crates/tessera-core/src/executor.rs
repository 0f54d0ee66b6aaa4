use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

use crate::action::Params;
use crate::compiler::CompilationContext;
use crate::content::Content;
use crate::dependency::{DependencyProps, DependencyTarget, DependencyTracker};
use crate::errors::CompileError;
use crate::item::{Identifier, Item, ItemRep, Layout, SnapshotName};

/// A named content transform
pub trait Filter: Send + Sync {
    fn apply(
        &self,
        content: &Content,
        params: &Params,
        context: &FilterContext<'_>,
    ) -> anyhow::Result<Content>;
}

/// Renders a layout around the content of a representation
pub trait LayoutRenderer: Send + Sync {
    fn render(
        &self,
        layout: &Layout,
        content: &Content,
        params: &Params,
    ) -> anyhow::Result<Content>;
}

/// Layout renderer that substitutes `{{ content }}` in the layout text
#[derive(Debug, Default)]
pub struct PlaceholderLayoutRenderer;

impl PlaceholderLayoutRenderer {
    pub const PLACEHOLDER: &'static str = "{{ content }}";
}

impl LayoutRenderer for PlaceholderLayoutRenderer {
    fn render(
        &self,
        layout: &Layout,
        content: &Content,
        _params: &Params,
    ) -> anyhow::Result<Content> {
        let template = layout
            .content()
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("layout {} is binary", layout.identifier()))?;
        let body = content
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("cannot render binary content"))?;
        Ok(Content::text(template.replace(Self::PLACEHOLDER, body)))
    }
}

/// Filters available to a build, by name
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: FxHashMap<String, Arc<dyn Filter>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, filter: Arc<dyn Filter>) {
        self.filters.insert(name.into(), filter);
    }

    pub fn with(mut self, name: impl Into<String>, filter: Arc<dyn Filter>) -> Self {
        self.register(name, filter);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Filter>> {
        self.filters.get(name)
    }
}

/// What a filter can see while it runs
pub struct FilterContext<'a> {
    rep: &'a ItemRep,
    context: &'a CompilationContext,
    tracker: &'a DependencyTracker,
}

impl<'a> FilterContext<'a> {
    pub fn item(&self) -> &Item {
        self.rep.item()
    }

    /// Look up another item, recording a dependency on its content and attributes
    pub fn read_item(&self, identifier: &Identifier) -> Option<&'a Arc<Item>> {
        let item = self.context.site.item(identifier)?;
        self.tracker.record_dependency(
            DependencyTarget::Item(identifier.clone()),
            DependencyProps::raw_content().merge(DependencyProps::attributes()),
        );
        Some(item)
    }
}

/// Applies processing actions to the in-flight content of one representation
///
/// The working content lives in the snapshot repo under `last`; every filter
/// and layout reads it and writes its result back.
pub struct Executor<'a> {
    rep: &'a ItemRep,
    context: &'a CompilationContext,
    tracker: &'a DependencyTracker,
}

impl<'a> Executor<'a> {
    pub fn new(
        rep: &'a ItemRep,
        context: &'a CompilationContext,
        tracker: &'a DependencyTracker,
    ) -> Self {
        Self {
            rep,
            context,
            tracker,
        }
    }

    fn current_content(&self) -> Content {
        self.context
            .snapshot_repo
            .get(self.rep.identity(), &SnapshotName::last())
            .unwrap_or_else(|| self.rep.item().content().clone())
    }

    fn replace_content(&self, content: Content) {
        self.context
            .snapshot_repo
            .set(self.rep.identity(), SnapshotName::last(), content);
    }

    pub fn filter(&mut self, name: &str, params: &Params) -> Result<(), CompileError> {
        let filter = self
            .context
            .filters
            .get(name)
            .ok_or_else(|| CompileError::UnknownFilter {
                item: self.rep.item().identifier().clone(),
                rep: self.rep.name().to_string(),
                filter: name.to_string(),
            })?;

        debug!("Applying filter {} to {}", name, self.rep.identity());
        let filter_context = FilterContext {
            rep: self.rep,
            context: self.context,
            tracker: self.tracker,
        };
        let result = filter
            .apply(&self.current_content(), params, &filter_context)
            .map_err(|e| CompileError::FilterFailed {
                item: self.rep.item().identifier().clone(),
                rep: self.rep.name().to_string(),
                filter: name.to_string(),
                source: e.into(),
            })?;

        self.replace_content(result);
        Ok(())
    }

    pub fn layout(
        &mut self,
        identifier: &Identifier,
        params: &Params,
    ) -> Result<(), CompileError> {
        let layout = self
            .context
            .site
            .layout(identifier)
            .ok_or_else(|| CompileError::UnknownLayout {
                item: self.rep.item().identifier().clone(),
                rep: self.rep.name().to_string(),
                layout: identifier.clone(),
            })?;

        let content = self.current_content();
        if content.is_binary() {
            return Err(CompileError::CannotLayoutBinary {
                item: self.rep.item().identifier().clone(),
                rep: self.rep.name().to_string(),
                layout: identifier.clone(),
            });
        }

        self.tracker.record_dependency(
            DependencyTarget::Layout(identifier.clone()),
            DependencyProps::all(),
        );

        debug!("Laying out {} with {}", self.rep.identity(), identifier);
        let result = self
            .context
            .layout_renderer
            .render(layout, &content, params)
            .map_err(|e| CompileError::LayoutFailed {
                item: self.rep.item().identifier().clone(),
                rep: self.rep.name().to_string(),
                layout: identifier.clone(),
                source: e.into(),
            })?;

        self.replace_content(result);
        Ok(())
    }

    pub fn snapshot(&mut self, name: &SnapshotName) {
        let content = self.current_content();
        self.context
            .snapshot_repo
            .set(self.rep.identity(), name.clone(), content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::DependencyStore;
    use crate::item::{Attributes, Site};
    use crate::snapshot_repo::SnapshotRepo;

    struct Upcase;

    impl Filter for Upcase {
        fn apply(
            &self,
            content: &Content,
            _: &Params,
            _: &FilterContext<'_>,
        ) -> anyhow::Result<Content> {
            let text = content.as_str().ok_or_else(|| anyhow::anyhow!("binary"))?;
            Ok(Content::text(text.to_uppercase()))
        }
    }

    struct Include;

    impl Filter for Include {
        fn apply(
            &self,
            content: &Content,
            params: &Params,
            context: &FilterContext<'_>,
        ) -> anyhow::Result<Content> {
            let target = params["item"].as_str().unwrap_or_default();
            let included = context
                .read_item(&Identifier::from(target))
                .ok_or_else(|| anyhow::anyhow!("no item {}", target))?;
            Ok(Content::text(format!("{}{}", content, included.content())))
        }
    }

    fn context(site: Site) -> CompilationContext {
        CompilationContext::new(
            Arc::new(site),
            Arc::new(SnapshotRepo::new()),
            FilterRegistry::new()
                .with("upcase", Arc::new(Upcase))
                .with("include", Arc::new(Include)),
            Arc::new(PlaceholderLayoutRenderer),
        )
    }

    fn site() -> Site {
        Site::new()
            .with_item(Item::new("abc", Attributes::new(), "/a.md"))
            .with_item(Item::new("!", Attributes::new(), "/footer.md"))
            .with_layout(Layout::new(
                "<p>{{ content }}</p>",
                Attributes::new(),
                "/default.html",
            ))
    }

    fn rep_for(context: &CompilationContext, identifier: &str) -> ItemRep {
        let item = context
            .site
            .item(&Identifier::from(identifier))
            .unwrap()
            .clone();
        ItemRep::new(item, "default")
    }

    fn last(context: &CompilationContext, rep: &ItemRep) -> Option<Content> {
        context.snapshot_repo.get(rep.identity(), &SnapshotName::last())
    }

    #[test]
    fn test_filter_starts_from_raw_content() {
        let context = context(site());
        let rep = rep_for(&context, "/a.md");
        let tracker = DependencyTracker::new(Arc::new(DependencyStore::new()));

        Executor::new(&rep, &context, &tracker)
            .filter("upcase", &Params::new())
            .unwrap();

        assert_eq!(last(&context, &rep), Some(Content::text("ABC")));
    }

    #[test]
    fn test_unknown_filter() {
        let context = context(site());
        let rep = rep_for(&context, "/a.md");
        let tracker = DependencyTracker::new(Arc::new(DependencyStore::new()));

        let result = Executor::new(&rep, &context, &tracker).filter("nope", &Params::new());

        assert!(matches!(
            result,
            Err(CompileError::UnknownFilter { ref filter, .. }) if filter == "nope"
        ));
        assert_eq!(last(&context, &rep), None);
    }

    #[test]
    fn test_filter_reading_item_records_dependency() {
        let context = context(site());
        let rep = rep_for(&context, "/a.md");
        let store = Arc::new(DependencyStore::new());
        let mut tracker = DependencyTracker::new(store.clone());
        tracker.enter(Identifier::from("/a.md"));
        let mut params = Params::new();
        params.insert("item".into(), "/footer.md".into());

        Executor::new(&rep, &context, &tracker)
            .filter("include", &params)
            .unwrap();

        assert_eq!(last(&context, &rep), Some(Content::text("abc!")));
        let deps = store.dependencies_of(&Identifier::from("/a.md"));
        assert_eq!(deps.len(), 1);
        assert_eq!(
            deps[0].0,
            DependencyTarget::Item(Identifier::from("/footer.md"))
        );
    }

    #[test]
    fn test_layout_renders_and_records_dependency() {
        let context = context(site());
        let rep = rep_for(&context, "/a.md");
        let store = Arc::new(DependencyStore::new());
        let mut tracker = DependencyTracker::new(store.clone());
        tracker.enter(Identifier::from("/a.md"));

        Executor::new(&rep, &context, &tracker)
            .layout(&Identifier::from("/default.html"), &Params::new())
            .unwrap();

        assert_eq!(last(&context, &rep), Some(Content::text("<p>abc</p>")));
        assert_eq!(
            store.dependencies_of(&Identifier::from("/a.md"))[0].0,
            DependencyTarget::Layout(Identifier::from("/default.html"))
        );
    }

    #[test]
    fn test_unknown_layout() {
        let context = context(site());
        let rep = rep_for(&context, "/a.md");
        let tracker = DependencyTracker::new(Arc::new(DependencyStore::new()));

        let result = Executor::new(&rep, &context, &tracker)
            .layout(&Identifier::from("/missing.html"), &Params::new());

        assert!(matches!(result, Err(CompileError::UnknownLayout { .. })));
    }

    #[test]
    fn test_binary_content_cannot_be_laid_out() {
        let context = context(site().with_item(Item::new(
            Content::binary(vec![1, 2, 3]),
            Attributes::new(),
            "/logo.png",
        )));
        let rep = rep_for(&context, "/logo.png");
        let tracker = DependencyTracker::new(Arc::new(DependencyStore::new()));

        let result = Executor::new(&rep, &context, &tracker)
            .layout(&Identifier::from("/default.html"), &Params::new());

        assert!(matches!(result, Err(CompileError::CannotLayoutBinary { .. })));
    }

    #[test]
    fn test_snapshot_copies_current_content() {
        let context = context(site());
        let rep = rep_for(&context, "/a.md");
        let tracker = DependencyTracker::new(Arc::new(DependencyStore::new()));
        let mut executor = Executor::new(&rep, &context, &tracker);

        executor.snapshot(&SnapshotName::new("pre"));
        executor.filter("upcase", &Params::new()).unwrap();

        assert_eq!(
            context.snapshot_repo.get(rep.identity(), &SnapshotName::new("pre")),
            Some(Content::text("abc"))
        );
        assert_eq!(last(&context, &rep), Some(Content::text("ABC")));
    }
}
