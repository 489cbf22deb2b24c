use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use cmr_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{ContentStream, ObjectBody, Properties, StoredObject, PWC_LABEL};
use crate::traits::{CheckInUpdate, NewObject, ObjectStore, VersioningMode};
use crate::version::{LifecycleState, VersionIncrement, VersionSeries};

/// First id handed out by a fresh store; the root folder receives it.
const FIRST_OBJECT_ID: u64 = 100;

pub const ROOT_FOLDER_NAME: &str = "RootFolder";

/// In-memory object tree for one repository.
///
/// The tree lives behind one `RwLock`; every version series lives behind
/// its own `Mutex` so check-out transitions contend only per document.
/// Lock order is series mutex, then tree lock, then series map. Objects are
/// cloned on read.
pub struct InMemoryObjectStore {
    repository_id: String,
    root_id: ObjectId,
    next_id: AtomicU64,
    tree: RwLock<TreeState>,
    series: RwLock<HashMap<ObjectId, Arc<Mutex<VersionSeries>>>>,
}

#[derive(Default)]
struct TreeState {
    objects: HashMap<ObjectId, StoredObject>,
    children: HashMap<ObjectId, BTreeSet<ObjectId>>,
}

impl TreeState {
    fn folder(&self, id: &ObjectId) -> StoreResult<&StoredObject> {
        let obj = self
            .objects
            .get(id)
            .ok_or_else(|| StoreError::ObjectNotFound(id.clone()))?;
        if !obj.is_folder() {
            return Err(StoreError::InvalidArgument(format!("{id} is not a folder")));
        }
        Ok(obj)
    }

    fn name_taken(&self, parent: &ObjectId, name: &str, except: Option<&ObjectId>) -> bool {
        self.children.get(parent).is_some_and(|ids| {
            ids.iter()
                .filter(|id| Some(*id) != except)
                .filter_map(|id| self.objects.get(id))
                .any(|obj| obj.name == name)
        })
    }

    fn check_filing(&self, parent: &ObjectId, name: &str) -> StoreResult<()> {
        self.folder(parent)?;
        if name.trim().is_empty() {
            return Err(StoreError::InvalidArgument("object name must not be empty".into()));
        }
        if self.name_taken(parent, name, None) {
            return Err(StoreError::NameConflict {
                parent: parent.clone(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn insert(&mut self, obj: StoredObject) {
        if let Some(parent) = &obj.parent_id {
            self.children
                .entry(parent.clone())
                .or_default()
                .insert(obj.id.clone());
        }
        if obj.is_folder() {
            self.children.entry(obj.id.clone()).or_default();
        }
        self.objects.insert(obj.id.clone(), obj);
    }

    fn remove(&mut self, id: &ObjectId) -> Option<StoredObject> {
        let obj = self.objects.remove(id)?;
        if let Some(parent) = &obj.parent_id {
            if let Some(siblings) = self.children.get_mut(parent) {
                siblings.remove(id);
            }
        }
        self.children.remove(id);
        Some(obj)
    }

    /// Whether `ancestor` lies on the parent chain of `node`.
    fn is_ancestor(&self, ancestor: &ObjectId, node: &ObjectId) -> bool {
        let mut current = self.objects.get(node).and_then(|o| o.parent_id.clone());
        while let Some(id) = current {
            if &id == ancestor {
                return true;
            }
            current = self.objects.get(&id).and_then(|o| o.parent_id.clone());
        }
        false
    }

    /// Descendants of `folder`, children before their parents.
    fn descendants_post_order(&self, folder: &ObjectId, out: &mut Vec<ObjectId>) {
        if let Some(children) = self.children.get(folder) {
            for child in children {
                self.descendants_post_order(child, out);
                out.push(child.clone());
            }
        }
    }
}

impl InMemoryObjectStore {
    /// Create a store holding only the root folder.
    pub fn new(repository_id: impl Into<String>) -> Self {
        let root_id = ObjectId::new(FIRST_OBJECT_ID.to_string());
        let mut tree = TreeState::default();
        tree.insert(StoredObject {
            id: root_id.clone(),
            name: ROOT_FOLDER_NAME.to_string(),
            type_id: cmr_types::BaseKind::Folder.value().to_string(),
            parent_id: None,
            created_by: None,
            properties: Properties::new(),
            body: ObjectBody::Folder,
        });
        Self {
            repository_id: repository_id.into(),
            root_id,
            next_id: AtomicU64::new(FIRST_OBJECT_ID + 1),
            tree: RwLock::new(tree),
            series: RwLock::new(HashMap::new()),
        }
    }

    fn allocate_id(&self) -> ObjectId {
        ObjectId::new(self.next_id.fetch_add(1, Ordering::Relaxed).to_string())
    }

    fn tree(&self) -> StoreResult<RwLockReadGuard<'_, TreeState>> {
        self.tree.read().map_err(StoreError::poisoned)
    }

    fn tree_mut(&self) -> StoreResult<RwLockWriteGuard<'_, TreeState>> {
        self.tree.write().map_err(StoreError::poisoned)
    }

    fn series_handle(&self, series_id: &ObjectId) -> StoreResult<Arc<Mutex<VersionSeries>>> {
        let map = self.series.read().map_err(StoreError::poisoned)?;
        map.get(series_id)
            .cloned()
            .ok_or_else(|| StoreError::ObjectNotFound(series_id.clone()))
    }

    fn lock(handle: &Mutex<VersionSeries>) -> StoreResult<MutexGuard<'_, VersionSeries>> {
        handle.lock().map_err(StoreError::poisoned)
    }

    fn insert_series(&self, series: VersionSeries) -> StoreResult<()> {
        let mut map = self.series.write().map_err(StoreError::poisoned)?;
        map.insert(series.id().clone(), Arc::new(Mutex::new(series)));
        Ok(())
    }

    fn remove_series(&self, series_id: &ObjectId) -> StoreResult<()> {
        let mut map = self.series.write().map_err(StoreError::poisoned)?;
        map.remove(series_id);
        Ok(())
    }

    /// Series id of a versioned object, or a constraint error.
    fn series_of(&self, id: &ObjectId) -> StoreResult<ObjectId> {
        let obj = self.get(id)?;
        obj.series_id()
            .cloned()
            .ok_or_else(|| StoreError::Constraint(format!("object {id} is not versionable")))
    }

    fn read_all(&self, ids: &[ObjectId]) -> StoreResult<Vec<StoredObject>> {
        let tree = self.tree()?;
        Ok(ids
            .iter()
            .filter_map(|id| tree.objects.get(id).cloned())
            .collect())
    }

    fn delete_series(&self, head: &StoredObject) -> StoreResult<()> {
        let handle = self.series_handle(&head.id)?;
        let series = Self::lock(&handle)?;
        let mut tree = self.tree_mut()?;
        for version in series.versions() {
            tree.remove(&version.id);
        }
        if let Some(pwc) = series.state().pwc_id() {
            tree.remove(pwc);
        }
        tree.remove(&head.id);
        drop(tree);
        self.remove_series(&head.id)?;
        debug!(series = %head.id, "version series deleted");
        Ok(())
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn repository_id(&self) -> &str {
        &self.repository_id
    }

    fn root_folder_id(&self) -> &ObjectId {
        &self.root_id
    }

    fn object_count(&self) -> StoreResult<usize> {
        Ok(self.tree()?.objects.len())
    }

    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        Ok(self.tree()?.objects.get(id).cloned())
    }

    fn children(&self, folder_id: &ObjectId) -> StoreResult<Vec<StoredObject>> {
        let tree = self.tree()?;
        tree.folder(folder_id)?;
        let mut children: Vec<StoredObject> = tree
            .children
            .get(folder_id)
            .into_iter()
            .flatten()
            .filter_map(|id| tree.objects.get(id).cloned())
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }

    fn create_folder(
        &self,
        parent_id: &ObjectId,
        spec: NewObject,
        creator: Option<&str>,
    ) -> StoreResult<StoredObject> {
        let mut tree = self.tree_mut()?;
        tree.check_filing(parent_id, &spec.name)?;
        let folder = StoredObject {
            id: self.allocate_id(),
            name: spec.name,
            type_id: spec.type_id,
            parent_id: Some(parent_id.clone()),
            created_by: creator.map(str::to_string),
            properties: spec.properties,
            body: ObjectBody::Folder,
        };
        tree.insert(folder.clone());
        debug!(repository = %self.repository_id, id = %folder.id, parent = %parent_id, "folder created");
        Ok(folder)
    }

    fn create_document(
        &self,
        parent_id: &ObjectId,
        spec: NewObject,
        content: Option<ContentStream>,
        mode: VersioningMode,
        creator: Option<&str>,
    ) -> StoreResult<StoredObject> {
        self.tree()?.check_filing(parent_id, &spec.name)?;

        let id = self.allocate_id();
        let mut head = StoredObject {
            id: id.clone(),
            name: spec.name,
            type_id: spec.type_id,
            parent_id: Some(parent_id.clone()),
            created_by: creator.map(str::to_string),
            properties: spec.properties,
            body: ObjectBody::Document { content: None },
        };

        let (series, version) = match mode {
            VersioningMode::Unversioned => {
                head.body = ObjectBody::Document { content };
                (None, None)
            }
            VersioningMode::Versioned(increment) => {
                let version_id = self.allocate_id();
                let series = VersionSeries::with_initial(id.clone(), version_id.clone(), increment);
                let committed = series
                    .latest()
                    .map(|v| v.label.clone())
                    .unwrap_or_default();
                let version = version_of(&head, version_id, committed, content);
                (Some(series), Some(version))
            }
            VersioningMode::CheckedOut { owner } => {
                let pwc_id = self.allocate_id();
                let series = VersionSeries::checked_out_initially(id.clone(), &owner, pwc_id.clone());
                let version = version_of(&head, pwc_id, PWC_LABEL.to_string(), content);
                (Some(series), Some(version))
            }
        };

        if let Some(series) = series {
            head.body = ObjectBody::VersionedDocument;
            self.insert_series(series)?;
        }

        let mut tree = self.tree_mut()?;
        if let Err(e) = tree.check_filing(parent_id, &head.name) {
            drop(tree);
            if head.is_versioned() {
                self.remove_series(&head.id)?;
            }
            return Err(e);
        }
        if let Some(version) = version {
            tree.insert(version);
        }
        tree.insert(head.clone());
        debug!(repository = %self.repository_id, id = %head.id, parent = %parent_id, versioned = head.is_versioned(), "document created");
        Ok(head)
    }

    fn update_properties(
        &self,
        id: &ObjectId,
        name: Option<String>,
        properties: Properties,
    ) -> StoreResult<StoredObject> {
        let mut tree = self.tree_mut()?;
        let obj = tree
            .objects
            .get(id)
            .ok_or_else(|| StoreError::ObjectNotFound(id.clone()))?;
        if obj.version_label().is_some() && !obj.is_pwc() {
            return Err(StoreError::Constraint(format!(
                "committed version {id} cannot be modified"
            )));
        }
        if let Some(new_name) = &name {
            if new_name.trim().is_empty() {
                return Err(StoreError::InvalidArgument("object name must not be empty".into()));
            }
            if id == &self.root_id && new_name != &obj.name {
                return Err(StoreError::Constraint("the root folder cannot be renamed".into()));
            }
            if let Some(parent) = &obj.parent_id {
                if tree.name_taken(parent, new_name, Some(id)) {
                    return Err(StoreError::NameConflict {
                        parent: parent.clone(),
                        name: new_name.clone(),
                    });
                }
            }
        }
        let obj = tree
            .objects
            .get_mut(id)
            .ok_or_else(|| StoreError::ObjectNotFound(id.clone()))?;
        if let Some(new_name) = name {
            obj.name = new_name;
        }
        obj.properties.extend(properties);
        Ok(obj.clone())
    }

    fn move_object(&self, id: &ObjectId, target_folder_id: &ObjectId) -> StoreResult<StoredObject> {
        let mut tree = self.tree_mut()?;
        if id == &self.root_id {
            return Err(StoreError::Constraint("the root folder cannot be moved".into()));
        }
        let obj = tree
            .objects
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::ObjectNotFound(id.clone()))?;
        if obj.parent_id.is_none() {
            return Err(StoreError::Constraint(format!("object {id} is not filed")));
        }
        tree.folder(target_folder_id)?;
        if obj.is_folder() && (target_folder_id == id || tree.is_ancestor(id, target_folder_id)) {
            return Err(StoreError::Constraint(format!(
                "folder {id} cannot be moved below itself"
            )));
        }
        if tree.name_taken(target_folder_id, &obj.name, Some(id)) {
            return Err(StoreError::NameConflict {
                parent: target_folder_id.clone(),
                name: obj.name,
            });
        }
        if let Some(source) = &obj.parent_id {
            if let Some(siblings) = tree.children.get_mut(source) {
                siblings.remove(id);
            }
        }
        tree.children
            .entry(target_folder_id.clone())
            .or_default()
            .insert(id.clone());
        let moved = tree
            .objects
            .get_mut(id)
            .ok_or_else(|| StoreError::ObjectNotFound(id.clone()))?;
        moved.parent_id = Some(target_folder_id.clone());
        debug!(repository = %self.repository_id, id = %id, target = %target_folder_id, "object moved");
        Ok(moved.clone())
    }

    fn delete(&self, id: &ObjectId) -> StoreResult<()> {
        if id == &self.root_id {
            return Err(StoreError::Constraint("the root folder cannot be deleted".into()));
        }
        let obj = self.get(id)?;
        match &obj.body {
            ObjectBody::VersionedDocument => self.delete_series(&obj),
            ObjectBody::Version { .. } => Err(StoreError::Constraint(format!(
                "version {id} can only be removed with its document"
            ))),
            ObjectBody::Folder => {
                let mut tree = self.tree_mut()?;
                if tree.children.get(id).is_some_and(|c| !c.is_empty()) {
                    return Err(StoreError::Constraint(format!("folder {id} is not empty")));
                }
                tree.remove(id);
                Ok(())
            }
            ObjectBody::Document { .. } => {
                self.tree_mut()?.remove(id);
                Ok(())
            }
        }
    }

    fn delete_tree(&self, folder_id: &ObjectId) -> StoreResult<usize> {
        let mut ids = Vec::new();
        {
            let tree = self.tree()?;
            tree.folder(folder_id)?;
            tree.descendants_post_order(folder_id, &mut ids);
        }
        if folder_id != &self.root_id {
            ids.push(folder_id.clone());
        }
        let mut removed = 0;
        for id in &ids {
            match self.delete(id) {
                Ok(()) => removed += 1,
                Err(StoreError::ObjectNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        debug!(repository = %self.repository_id, folder = %folder_id, removed, "tree deleted");
        Ok(removed)
    }

    fn set_content(&self, id: &ObjectId, content: Option<ContentStream>) -> StoreResult<StoredObject> {
        let obj = self.get(id)?;
        match &obj.body {
            ObjectBody::Document { .. } => {
                let mut tree = self.tree_mut()?;
                let doc = tree
                    .objects
                    .get_mut(id)
                    .ok_or_else(|| StoreError::ObjectNotFound(id.clone()))?;
                doc.body = ObjectBody::Document { content };
                Ok(doc.clone())
            }
            ObjectBody::Version { series_id, .. } => {
                let handle = self.series_handle(series_id)?;
                let series = Self::lock(&handle)?;
                if series.state().pwc_id() != Some(id) {
                    return Err(StoreError::Constraint(format!(
                        "committed version {id} cannot be modified"
                    )));
                }
                let mut tree = self.tree_mut()?;
                let pwc = tree
                    .objects
                    .get_mut(id)
                    .ok_or_else(|| StoreError::ObjectNotFound(id.clone()))?;
                if let ObjectBody::Version { content: slot, .. } = &mut pwc.body {
                    *slot = content;
                }
                Ok(pwc.clone())
            }
            ObjectBody::VersionedDocument => Err(StoreError::Constraint(format!(
                "content of versioned document {id} changes only through its working copy"
            ))),
            ObjectBody::Folder => Err(StoreError::Constraint(format!(
                "folder {id} cannot hold content"
            ))),
        }
    }

    fn lifecycle(&self, series_id: &ObjectId) -> StoreResult<LifecycleState> {
        let handle = self.series_handle(series_id)?;
        let series = Self::lock(&handle)?;
        Ok(series.state().clone())
    }

    fn latest_version(&self, series_id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let handle = self.series_handle(series_id)?;
        let latest = {
            let series = Self::lock(&handle)?;
            series
                .latest()
                .map(|v| v.id.clone())
                .or_else(|| series.state().pwc_id().cloned())
        };
        match latest {
            Some(id) => self.read(&id),
            None => Ok(None),
        }
    }

    fn versions(&self, series_id: &ObjectId) -> StoreResult<Vec<StoredObject>> {
        let handle = self.series_handle(series_id)?;
        let ids: Vec<ObjectId> = {
            let series = Self::lock(&handle)?;
            series
                .state()
                .pwc_id()
                .cloned()
                .into_iter()
                .chain(series.versions().iter().rev().map(|v| v.id.clone()))
                .collect()
        };
        self.read_all(&ids)
    }

    fn check_out(&self, id: &ObjectId, owner: &str) -> StoreResult<StoredObject> {
        let series_id = self.series_of(id)?;
        let head = self.get(&series_id)?;
        let handle = self.series_handle(&series_id)?;
        let mut series = Self::lock(&handle)?;
        let mut tree = self.tree_mut()?;

        let pwc_id = self.allocate_id();
        series.check_out(owner, pwc_id.clone())?;

        let source = series.latest().and_then(|v| tree.objects.get(&v.id));
        let properties = source
            .map(|s| s.properties.clone())
            .unwrap_or_else(|| head.properties.clone());
        let content = source.and_then(|s| s.content().cloned());
        let mut pwc = version_of(&head, pwc_id, PWC_LABEL.to_string(), content);
        pwc.properties = properties;
        pwc.created_by = Some(owner.to_string());
        tree.insert(pwc.clone());
        Ok(pwc)
    }

    fn check_in(
        &self,
        id: &ObjectId,
        caller: Option<&str>,
        increment: VersionIncrement,
        update: CheckInUpdate,
    ) -> StoreResult<StoredObject> {
        let series_id = self.series_of(id)?;
        let handle = self.series_handle(&series_id)?;
        let mut series = Self::lock(&handle)?;
        let mut tree = self.tree_mut()?;

        let pwc_id = series
            .state()
            .pwc_id()
            .cloned()
            .ok_or_else(|| StoreError::NotCheckedOut(series_id.clone()))?;
        if !tree.objects.contains_key(&pwc_id) {
            return Err(StoreError::ObjectNotFound(pwc_id));
        }
        let entry = series.check_in(caller, increment)?;

        let committed = tree
            .objects
            .get_mut(&entry.id)
            .ok_or_else(|| StoreError::ObjectNotFound(entry.id.clone()))?;
        committed.properties.extend(update.properties);
        if let ObjectBody::Version {
            label,
            content,
            comment,
            ..
        } = &mut committed.body
        {
            *label = entry.label.clone();
            if update.content.is_some() {
                *content = update.content;
            }
            *comment = update.comment;
        }
        Ok(committed.clone())
    }

    fn cancel_check_out(&self, id: &ObjectId, caller: Option<&str>) -> StoreResult<()> {
        let series_id = self.series_of(id)?;
        let handle = self.series_handle(&series_id)?;
        let mut series = Self::lock(&handle)?;
        let mut tree = self.tree_mut()?;

        let pwc_id = series.cancel_check_out(caller)?;
        tree.remove(&pwc_id);
        if series.versions().is_empty() {
            // Created checked out and never committed: nothing remains.
            tree.remove(&series_id);
            drop(tree);
            self.remove_series(&series_id)?;
            debug!(series = %series_id, "uncommitted document discarded");
        }
        Ok(())
    }

    fn checked_out(&self) -> StoreResult<Vec<StoredObject>> {
        let handles: Vec<Arc<Mutex<VersionSeries>>> = self
            .series
            .read()
            .map_err(StoreError::poisoned)?
            .values()
            .cloned()
            .collect();
        let mut pwc_ids = Vec::new();
        for handle in handles {
            if let Some(pwc) = Self::lock(&handle)?.state().pwc_id() {
                pwc_ids.push(pwc.clone());
            }
        }
        pwc_ids.sort();
        self.read_all(&pwc_ids)
    }
}

/// A version object of the series headed by `head`.
fn version_of(
    head: &StoredObject,
    id: ObjectId,
    label: String,
    content: Option<ContentStream>,
) -> StoredObject {
    StoredObject {
        id,
        name: head.name.clone(),
        type_id: head.type_id.clone(),
        parent_id: None,
        created_by: head.created_by.clone(),
        properties: head.properties.clone(),
        body: ObjectBody::Version {
            series_id: head.id.clone(),
            label,
            content,
            comment: None,
        },
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.object_count().unwrap_or_default();
        f.debug_struct("InMemoryObjectStore")
            .field("repository_id", &self.repository_id)
            .field("object_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use super::*;
    use crate::object::PropertyValue;

    fn store() -> InMemoryObjectStore {
        InMemoryObjectStore::new("A1")
    }

    fn versioned(store: &InMemoryObjectStore, name: &str) -> StoredObject {
        let root = store.root_folder_id().clone();
        store
            .create_document(
                &root,
                NewObject::new(name, "VersionedType"),
                Some(ContentStream::new("v.txt", "text/plain", b"v1".to_vec())),
                VersioningMode::Versioned(VersionIncrement::Major),
                Some("alice"),
            )
            .unwrap()
    }

    // ----------------------------------------------------------------
    // Tree
    // ----------------------------------------------------------------

    #[test]
    fn new_store_has_root_only() {
        let s = store();
        assert_eq!(s.root_folder_id(), &ObjectId::new("100"));
        assert_eq!(s.object_count().unwrap(), 1);
        let root = s.get(s.root_folder_id()).unwrap();
        assert!(root.is_folder());
        assert_eq!(root.name, ROOT_FOLDER_NAME);
        assert!(root.parent_id.is_none());
    }

    #[test]
    fn create_and_list_children() {
        let s = store();
        let root = s.root_folder_id().clone();
        s.create_folder(&root, NewObject::new("b", "folder"), None).unwrap();
        s.create_document(
            &root,
            NewObject::new("a", "document"),
            None,
            VersioningMode::Unversioned,
            Some("bob"),
        )
        .unwrap();
        let names: Vec<_> = s.children(&root).unwrap().into_iter().map(|o| o.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn duplicate_name_in_folder_rejected() {
        let s = store();
        let root = s.root_folder_id().clone();
        s.create_folder(&root, NewObject::new("x", "folder"), None).unwrap();
        let err = s
            .create_folder(&root, NewObject::new("x", "folder"), None)
            .unwrap_err();
        assert!(matches!(err, StoreError::NameConflict { .. }));
    }

    #[test]
    fn create_under_document_rejected() {
        let s = store();
        let root = s.root_folder_id().clone();
        let doc = s
            .create_document(&root, NewObject::new("d", "document"), None, VersioningMode::Unversioned, None)
            .unwrap();
        let err = s.create_folder(&doc.id, NewObject::new("f", "folder"), None).unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[test]
    fn root_is_protected() {
        let s = store();
        let root = s.root_folder_id().clone();
        assert!(matches!(s.delete(&root), Err(StoreError::Constraint(_))));
        let f = s.create_folder(&root, NewObject::new("f", "folder"), None).unwrap();
        assert!(matches!(s.move_object(&root, &f.id), Err(StoreError::Constraint(_))));
    }

    #[test]
    fn delete_non_empty_folder_rejected() {
        let s = store();
        let root = s.root_folder_id().clone();
        let f = s.create_folder(&root, NewObject::new("f", "folder"), None).unwrap();
        s.create_folder(&f.id, NewObject::new("g", "folder"), None).unwrap();
        assert!(matches!(s.delete(&f.id), Err(StoreError::Constraint(_))));
    }

    #[test]
    fn delete_tree_removes_descendants() {
        let s = store();
        let root = s.root_folder_id().clone();
        let f = s.create_folder(&root, NewObject::new("f", "folder"), None).unwrap();
        let g = s.create_folder(&f.id, NewObject::new("g", "folder"), None).unwrap();
        s.create_document(&g.id, NewObject::new("d", "document"), None, VersioningMode::Unversioned, None)
            .unwrap();
        assert_eq!(s.delete_tree(&f.id).unwrap(), 3);
        assert_eq!(s.object_count().unwrap(), 1);
    }

    #[test]
    fn delete_tree_on_root_keeps_root() {
        let s = store();
        let root = s.root_folder_id().clone();
        s.create_folder(&root, NewObject::new("f", "folder"), None).unwrap();
        versioned(&s, "v");
        s.delete_tree(&root).unwrap();
        assert_eq!(s.object_count().unwrap(), 1);
        assert!(s.children(&root).unwrap().is_empty());
    }

    #[test]
    fn move_between_folders() {
        let s = store();
        let root = s.root_folder_id().clone();
        let a = s.create_folder(&root, NewObject::new("a", "folder"), None).unwrap();
        let b = s.create_folder(&root, NewObject::new("b", "folder"), None).unwrap();
        let moved = s.move_object(&a.id, &b.id).unwrap();
        assert_eq!(moved.parent_id.as_ref(), Some(&b.id));
        assert_eq!(s.children(&b.id).unwrap().len(), 1);
        assert_eq!(s.children(&root).unwrap().len(), 1);
    }

    #[test]
    fn move_into_own_subtree_rejected() {
        let s = store();
        let root = s.root_folder_id().clone();
        let a = s.create_folder(&root, NewObject::new("a", "folder"), None).unwrap();
        let b = s.create_folder(&a.id, NewObject::new("b", "folder"), None).unwrap();
        assert!(matches!(s.move_object(&a.id, &b.id), Err(StoreError::Constraint(_))));
        assert!(matches!(s.move_object(&a.id, &a.id), Err(StoreError::Constraint(_))));
    }

    #[test]
    fn rename_checks_siblings() {
        let s = store();
        let root = s.root_folder_id().clone();
        s.create_folder(&root, NewObject::new("a", "folder"), None).unwrap();
        let b = s.create_folder(&root, NewObject::new("b", "folder"), None).unwrap();
        let err = s
            .update_properties(&b.id, Some("a".into()), Properties::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::NameConflict { .. }));

        let mut props = Properties::new();
        props.insert("StringFolderProp".into(), PropertyValue::String("x".into()));
        let renamed = s.update_properties(&b.id, Some("c".into()), props).unwrap();
        assert_eq!(renamed.name, "c");
        assert_eq!(renamed.properties.len(), 1);
    }

    #[test]
    fn plain_document_content_replaced() {
        let s = store();
        let root = s.root_folder_id().clone();
        let doc = s
            .create_document(&root, NewObject::new("d", "document"), None, VersioningMode::Unversioned, None)
            .unwrap();
        let updated = s
            .set_content(&doc.id, Some(ContentStream::new("d.txt", "text/plain", b"hi".to_vec())))
            .unwrap();
        assert_eq!(updated.content().map(ContentStream::len), Some(2));
        let cleared = s.set_content(&doc.id, None).unwrap();
        assert!(cleared.content().is_none());
    }

    // ----------------------------------------------------------------
    // Versioning
    // ----------------------------------------------------------------

    #[test]
    fn versioned_create_builds_series() {
        let s = store();
        let head = versioned(&s, "v");
        assert!(matches!(head.body, ObjectBody::VersionedDocument));
        assert_eq!(s.lifecycle(&head.id).unwrap(), LifecycleState::Released);
        let latest = s.latest_version(&head.id).unwrap().unwrap();
        assert_eq!(latest.version_label(), Some("1.0"));
        assert_eq!(latest.content().map(ContentStream::len), Some(2));
        assert!(latest.parent_id.is_none());
    }

    #[test]
    fn check_out_creates_pwc_copy() {
        let s = store();
        let head = versioned(&s, "v");
        let pwc = s.check_out(&head.id, "alice").unwrap();
        assert!(pwc.is_pwc());
        assert_eq!(pwc.created_by.as_deref(), Some("alice"));
        assert_eq!(pwc.content().map(ContentStream::len), Some(2));
        assert!(s.lifecycle(&head.id).unwrap().is_held_by(Some("alice")));
        assert_eq!(s.checked_out().unwrap().len(), 1);
        let versions = s.versions(&head.id).unwrap();
        assert!(versions[0].is_pwc());
        assert_eq!(versions.len(), 2);
    }

    #[test]
    fn second_check_out_conflicts() {
        let s = store();
        let head = versioned(&s, "v");
        s.check_out(&head.id, "alice").unwrap();
        let err = s.check_out(&head.id, "bob").unwrap_err();
        assert!(matches!(err, StoreError::CheckedOut { .. }));
        assert_eq!(s.checked_out().unwrap().len(), 1);
    }

    #[test]
    fn check_in_commits_with_update() {
        let s = store();
        let head = versioned(&s, "v");
        let pwc = s.check_out(&head.id, "alice").unwrap();
        s.set_content(&pwc.id, Some(ContentStream::new("v.txt", "text/plain", b"v2-draft".to_vec())))
            .unwrap();
        let update = CheckInUpdate {
            comment: Some("second".into()),
            ..CheckInUpdate::default()
        };
        let committed = s
            .check_in(&pwc.id, Some("alice"), VersionIncrement::Minor, update)
            .unwrap();
        assert_eq!(committed.id, pwc.id);
        assert_eq!(committed.version_label(), Some("1.1"));
        assert_eq!(committed.content().map(ContentStream::len), Some(8));
        assert_eq!(s.lifecycle(&head.id).unwrap(), LifecycleState::Released);
        assert!(s.checked_out().unwrap().is_empty());

        let labels: Vec<_> = s
            .versions(&head.id)
            .unwrap()
            .iter()
            .filter_map(|v| v.version_label().map(str::to_string))
            .collect();
        assert_eq!(labels, vec!["1.1", "1.0"]);
    }

    #[test]
    fn check_in_by_other_user_rejected() {
        let s = store();
        let head = versioned(&s, "v");
        s.check_out(&head.id, "alice").unwrap();
        let err = s
            .check_in(&head.id, Some("bob"), VersionIncrement::Major, CheckInUpdate::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotCheckoutOwner { .. }));
    }

    #[test]
    fn cancel_removes_pwc() {
        let s = store();
        let head = versioned(&s, "v");
        let before = s.object_count().unwrap();
        let pwc = s.check_out(&head.id, "alice").unwrap();
        s.cancel_check_out(&head.id, Some("alice")).unwrap();
        assert!(s.read(&pwc.id).unwrap().is_none());
        assert_eq!(s.object_count().unwrap(), before);
        assert_eq!(s.versions(&head.id).unwrap().len(), 1);
    }

    #[test]
    fn cancel_of_uncommitted_document_discards_it() {
        let s = store();
        let root = s.root_folder_id().clone();
        let head = s
            .create_document(
                &root,
                NewObject::new("draft", "VersionedType"),
                None,
                VersioningMode::CheckedOut { owner: "alice".into() },
                Some("alice"),
            )
            .unwrap();
        assert!(s.latest_version(&head.id).unwrap().unwrap().is_pwc());
        s.cancel_check_out(&head.id, Some("alice")).unwrap();
        assert!(s.read(&head.id).unwrap().is_none());
        assert_eq!(s.object_count().unwrap(), 1);
    }

    #[test]
    fn committed_versions_are_immutable() {
        let s = store();
        let head = versioned(&s, "v");
        let v1 = s.latest_version(&head.id).unwrap().unwrap();
        assert!(matches!(s.set_content(&v1.id, None), Err(StoreError::Constraint(_))));
        assert!(matches!(s.set_content(&head.id, None), Err(StoreError::Constraint(_))));
        assert!(matches!(
            s.update_properties(&v1.id, None, Properties::new()),
            Err(StoreError::Constraint(_))
        ));
        assert!(matches!(s.delete(&v1.id), Err(StoreError::Constraint(_))));
    }

    #[test]
    fn delete_series_removes_versions() {
        let s = store();
        let head = versioned(&s, "v");
        s.check_out(&head.id, "alice").unwrap();
        s.delete(&head.id).unwrap();
        assert_eq!(s.object_count().unwrap(), 1);
        assert!(matches!(s.lifecycle(&head.id), Err(StoreError::ObjectNotFound(_))));
    }

    #[test]
    fn check_out_of_plain_document_rejected() {
        let s = store();
        let root = s.root_folder_id().clone();
        let doc = s
            .create_document(&root, NewObject::new("d", "document"), None, VersioningMode::Unversioned, None)
            .unwrap();
        assert!(matches!(s.check_out(&doc.id, "alice"), Err(StoreError::Constraint(_))));
    }

    #[test]
    fn concurrent_check_out_has_one_winner() {
        let s = Arc::new(store());
        let head = versioned(&s, "v");
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let s = Arc::clone(&s);
                let barrier = Arc::clone(&barrier);
                let id = head.id.clone();
                thread::spawn(move || {
                    let user = format!("user{i}");
                    barrier.wait();
                    let result = s.check_out(&id, &user);
                    (user, result)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners: Vec<_> = results
            .iter()
            .filter_map(|(user, r)| r.as_ref().ok().map(|pwc| (user, pwc)))
            .collect();
        assert_eq!(winners.len(), 1);
        let (winner, pwc) = winners[0];
        assert!(results
            .iter()
            .filter_map(|(_, r)| r.as_ref().err())
            .all(|e| matches!(e, StoreError::CheckedOut { .. })));

        let state = s.lifecycle(&head.id).unwrap();
        assert_eq!(state.owner(), Some(winner.as_str()));
        assert_eq!(state.pwc_id(), Some(&pwc.id));
        assert_eq!(s.checked_out().unwrap().len(), 1);
    }

    #[test]
    fn cancel_by_non_owner_rejected() {
        let s = store();
        let head = versioned(&s, "v");
        let pwc = s.check_out(&head.id, "alice").unwrap();
        for caller in [Some("bob"), None] {
            assert!(matches!(
                s.cancel_check_out(&pwc.id, caller),
                Err(StoreError::NotCheckoutOwner { .. })
            ));
        }
        assert!(s.read(&pwc.id).unwrap().is_some());
        assert_eq!(s.lifecycle(&head.id).unwrap().owner(), Some("alice"));
    }
}
