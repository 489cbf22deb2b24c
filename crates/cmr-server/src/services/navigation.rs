use std::sync::Arc;

use tracing::debug;

use cmr_store::{ObjectStore, StoreError, StoreManager, StoredObject};
use cmr_types::{CallContext, Depth, Identity, ObjectId};

use crate::data_objects::{listed_object_data, object_data, Include, ObjectData};
use crate::error::{ServerError, ServerResult};
use crate::services::{NavigationService, ObjectContainer, ObjectList, Page, Paging};

/// Folder navigation over a [`StoreManager`].
pub struct InMemoryNavigationService {
    registry: Arc<dyn StoreManager>,
}

struct TreeWalk<'a> {
    store: &'a dyn ObjectStore,
    caller: Option<&'a str>,
    include: &'a Include,
    depth: Depth,
    folders_only: bool,
}

impl TreeWalk<'_> {
    fn collect(&self, folder_id: &ObjectId, level: u32) -> ServerResult<Vec<ObjectContainer>> {
        if !self.depth.includes(level) {
            return Ok(Vec::new());
        }
        let mut containers = Vec::new();
        for child in self.store.children(folder_id)? {
            if self.folders_only && !child.is_folder() {
                continue;
            }
            match self.container(&child, level) {
                Ok(container) => containers.push(container),
                Err(e) if is_vanished(&e) => debug!(id = %child.id, "object removed during walk"),
                Err(e) => return Err(e),
            }
        }
        Ok(containers)
    }

    fn container(&self, child: &StoredObject, level: u32) -> ServerResult<ObjectContainer> {
        let children = if child.is_folder() {
            self.collect(&child.id, level + 1)?
        } else {
            Vec::new()
        };
        Ok(ObjectContainer {
            object: object_data(self.store, child, self.caller, self.include)?,
            children,
        })
    }
}

impl InMemoryNavigationService {
    pub fn new(registry: Arc<dyn StoreManager>) -> Self {
        Self { registry }
    }

    fn store(&self, repository_id: &str) -> ServerResult<Arc<dyn ObjectStore>> {
        Ok(self.registry.object_store(repository_id)?)
    }

    /// Every object below `folder_id`, at any depth, without conversion.
    pub fn descendant_objects(
        &self,
        repository_id: &str,
        folder_id: &ObjectId,
    ) -> ServerResult<Vec<StoredObject>> {
        let store = self.store(repository_id)?;
        let mut out = Vec::new();
        let mut pending = vec![folder_id.clone()];
        while let Some(current) = pending.pop() {
            for child in store.children(&current)? {
                if child.is_folder() {
                    pending.push(child.id.clone());
                }
                out.push(child);
            }
        }
        Ok(out)
    }

    fn tree(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: &ObjectId,
        depth: Option<Depth>,
        include: &Include,
        folders_only: bool,
    ) -> ServerResult<Vec<ObjectContainer>> {
        let depth = depth.unwrap_or(Depth::All).validate()?;
        debug!(repository = repository_id, folder = %folder_id, %depth, folders_only, "walking folder tree");
        let store = self.store(repository_id)?;
        TreeWalk {
            store: store.as_ref(),
            caller: ctx.username(),
            include,
            depth,
            folders_only,
        }
        .collect(folder_id, 1)
    }
}

/// Whether `e` reports an object that a concurrent delete or cancel removed.
fn is_vanished(e: &ServerError) -> bool {
    matches!(e, ServerError::Store(StoreError::ObjectNotFound(_)))
}

/// The filed object standing for `obj`: versions are represented by their
/// series head.
fn filed(store: &dyn ObjectStore, obj: StoredObject) -> ServerResult<StoredObject> {
    match obj.series_id() {
        Some(series_id) if obj.parent_id.is_none() => Ok(store.get(series_id)?),
        _ => Ok(obj),
    }
}

impl NavigationService for InMemoryNavigationService {
    fn children(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: &ObjectId,
        include: &Include,
        paging: Paging,
    ) -> ServerResult<ObjectList> {
        let store = self.store(repository_id)?;
        let page = Page::of(store.children(folder_id)?, paging);
        let items = listed_object_data(store.as_ref(), &page.items, ctx.username(), include)?;
        Ok(Page {
            num_items: page.num_items - (page.items.len() - items.len()),
            items,
            has_more_items: page.has_more_items,
        })
    }

    fn descendants(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: &ObjectId,
        depth: Option<Depth>,
        include: &Include,
    ) -> ServerResult<Vec<ObjectContainer>> {
        self.tree(ctx, repository_id, folder_id, depth, include, false)
    }

    fn folder_tree(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: &ObjectId,
        depth: Option<Depth>,
        include: &Include,
    ) -> ServerResult<Vec<ObjectContainer>> {
        self.tree(ctx, repository_id, folder_id, depth, include, true)
    }

    fn object_parents(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        object_id: &ObjectId,
        include: &Include,
    ) -> ServerResult<Vec<ObjectData>> {
        let store = self.store(repository_id)?;
        let obj = filed(store.as_ref(), store.get(object_id)?)?;
        match &obj.parent_id {
            Some(parent_id) => {
                let parent = store.get(parent_id)?;
                Ok(vec![object_data(store.as_ref(), &parent, ctx.username(), include)?])
            }
            None => Ok(Vec::new()),
        }
    }

    fn folder_parent(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: &ObjectId,
    ) -> ServerResult<ObjectData> {
        let store = self.store(repository_id)?;
        let folder = store.get(folder_id)?;
        if !folder.is_folder() {
            return Err(ServerError::InvalidArgument(format!("{folder_id} is not a folder")));
        }
        let parent_id = folder.parent_id.ok_or_else(|| {
            ServerError::InvalidArgument("the root folder has no parent".into())
        })?;
        let parent = store.get(&parent_id)?;
        Ok(object_data(store.as_ref(), &parent, ctx.username(), &Include::default())?)
    }

    fn checked_out_docs(
        &self,
        ctx: &CallContext,
        repository_id: &str,
        folder_id: Option<&ObjectId>,
        include: &Include,
        paging: Paging,
    ) -> ServerResult<ObjectList> {
        let store = self.store(repository_id)?;
        let mut pwcs = Vec::new();
        for pwc in store.checked_out()? {
            if let Some(folder_id) = folder_id {
                let head = match filed(store.as_ref(), pwc.clone()) {
                    Ok(head) => head,
                    Err(e) if is_vanished(&e) => continue,
                    Err(e) => return Err(e),
                };
                if head.parent_id.as_ref() != Some(folder_id) {
                    continue;
                }
            }
            pwcs.push(pwc);
        }
        let items = listed_object_data(store.as_ref(), &pwcs, ctx.username(), include)?;
        Ok(Page::of(items, paging))
    }
}
