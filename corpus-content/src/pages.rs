//! Page tree
//!
//! Pages are documents participating in a tree, carrying `path`, `level`
//! and `rank`. Tree assembly, child insertion and move/reparent are a
//! collaborator of the core engine; `SimplePageTree` is the in-process
//! implementation the routes call into.

use corpus_core::{document, CorpusResult, Document, Error};
use corpus_store::{DocumentFilter, DocumentStore};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

pub const PATH: &str = "path";
pub const LEVEL: &str = "level";
pub const RANK: &str = "rank";
pub const CHILDREN: &str = "_children";

/// Where a moved page lands relative to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePosition {
    Before,
    After,
    Inside,
}

impl FromStr for MovePosition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" => Ok(MovePosition::Before),
            "after" => Ok(MovePosition::After),
            "inside" => Ok(MovePosition::Inside),
            _ => Err(Error::invalid()),
        }
    }
}

pub struct SimplePageTree {
    store: Arc<dyn DocumentStore>,
    type_name: String,
}

fn level_of(doc: &Document) -> i64 {
    doc.get(LEVEL).and_then(Value::as_i64).unwrap_or(0)
}

fn rank_of(doc: &Document) -> i64 {
    doc.get(RANK).and_then(Value::as_i64).unwrap_or(0)
}

fn path_of(doc: &Document) -> &str {
    doc.get(PATH).and_then(Value::as_str).unwrap_or("")
}

/// Parent path of a tree path: `/a/b` -> `/a`, `/a` -> `/`, `/` -> none.
fn parent_path(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

impl SimplePageTree {
    pub fn new(store: Arc<dyn DocumentStore>, type_name: impl Into<String>) -> Self {
        Self {
            store,
            type_name: type_name.into(),
        }
    }

    async fn all_pages(&self, published_only: bool) -> CorpusResult<Vec<Document>> {
        let mut filter = DocumentFilter::for_type(&self.type_name);
        if published_only {
            filter = filter.published_only();
        }
        let mut pages = self.store.find(&filter).await?;
        pages.sort_by_key(|p| (level_of(p), rank_of(p)));
        Ok(pages)
    }

    pub async fn home(&self) -> CorpusResult<Document> {
        let pages = self.all_pages(false).await?;
        pages
            .into_iter()
            .find(|p| level_of(p) == 0)
            .ok_or(Error::NotFound)
    }

    /// The home page with descendants attached as `_children`, to the
    /// given depth. Depth 1 yields the home page's immediate children
    /// without grandchildren.
    pub async fn tree(&self, depth: usize, published_only: bool) -> CorpusResult<Document> {
        let pages = self.all_pages(published_only).await?;
        let home = pages
            .iter()
            .find(|p| level_of(p) == 0)
            .cloned()
            .ok_or(Error::NotFound)?;
        Ok(attach_children(home, &pages, depth))
    }

    /// One page with its immediate children attached.
    pub async fn with_children(&self, id: &str, published_only: bool) -> CorpusResult<Document> {
        let pages = self.all_pages(published_only).await?;
        let page = pages
            .iter()
            .find(|p| document::id(p) == Some(id))
            .cloned()
            .ok_or(Error::NotFound)?;
        Ok(attach_children(page, &pages, 1))
    }

    /// Insert a new page under `parent_id`, defaulting to the home page.
    /// Derives slug, path, level and rank from the parent.
    pub async fn insert_child(
        &self,
        parent_id: Option<&str>,
        mut doc: Document,
    ) -> CorpusResult<Document> {
        let parent = match parent_id {
            Some(id) => self
                .store
                .get(id)
                .await?
                .filter(|p| document::type_name(p) == Some(self.type_name.as_str()))
                .ok_or(Error::NotFound)?,
            None => self.home().await?,
        };
        let parent_path = path_of(&parent).to_string();
        let parent_level = level_of(&parent);

        let title = doc
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let tail = match doc.get(document::SLUG).and_then(Value::as_str) {
            Some(slug) if !slug.is_empty() => slug.trim_matches('/').to_string(),
            _ => crate::convert::slugify(title),
        };
        if tail.is_empty() {
            return Err(Error::invalid());
        }

        let path = join_path(&parent_path, &tail);
        let siblings = self.children_of(&parent_path, parent_level).await?;

        doc.insert(document::SLUG.to_string(), Value::String(path.clone()));
        doc.insert(PATH.to_string(), Value::String(path));
        doc.insert(LEVEL.to_string(), Value::from(parent_level + 1));
        doc.insert(RANK.to_string(), Value::from(siblings.len() as i64));

        self.store.insert(doc.clone()).await?;
        Ok(doc)
    }

    async fn children_of(&self, path: &str, level: i64) -> CorpusResult<Vec<Document>> {
        let pages = self.all_pages(false).await?;
        Ok(pages
            .into_iter()
            .filter(|p| parent_path(path_of(p)) == Some(path) && level_of(p) == level + 1)
            .collect())
    }

    /// Move a page (and its whole subtree) relative to a target page.
    pub async fn move_page(
        &self,
        id: &str,
        target_id: &str,
        position: MovePosition,
    ) -> CorpusResult<()> {
        if id == target_id {
            return Err(Error::invalid());
        }
        let page = self.store.get(id).await?.ok_or(Error::NotFound)?;
        let target = self.store.get(target_id).await?.ok_or(Error::NotFound)?;
        if level_of(&page) == 0 {
            // The home page does not move.
            return Err(Error::invalid());
        }

        let old_path = path_of(&page).to_string();
        let target_path = path_of(&target).to_string();
        if target_path == old_path || target_path.starts_with(&format!("{old_path}/")) {
            // Cannot move a page inside its own subtree.
            return Err(Error::invalid());
        }

        let (new_parent_path, new_parent_level) = match position {
            MovePosition::Inside => (target_path.clone(), level_of(&target)),
            MovePosition::Before | MovePosition::After => {
                let parent = parent_path(&target_path).ok_or_else(Error::invalid)?;
                (parent.to_string(), level_of(&target) - 1)
            }
        };

        let tail = old_path.rsplit('/').next().unwrap_or_default().to_string();
        let new_path = join_path(&new_parent_path, &tail);
        let level_delta = (new_parent_level + 1) - level_of(&page);

        // Rewrite the moved subtree: path prefix and level shift.
        let subtree: Vec<Document> = self
            .all_pages(false)
            .await?
            .into_iter()
            .filter(|p| {
                let path = path_of(p);
                path == old_path || path.starts_with(&format!("{old_path}/"))
            })
            .collect();
        for mut node in subtree {
            let node_id = document::id(&node).ok_or(Error::NotFound)?.to_string();
            let rewritten = format!("{new_path}{}", &path_of(&node)[old_path.len()..]);
            node.insert(PATH.to_string(), Value::String(rewritten.clone()));
            node.insert(document::SLUG.to_string(), Value::String(rewritten));
            node.insert(LEVEL.to_string(), Value::from(level_of(&node) + level_delta));
            self.store.update(&node_id, node).await?;
        }

        // Renumber the new sibling list with the moved page in position.
        let mut siblings: Vec<Document> = self
            .children_of(&new_parent_path, new_parent_level)
            .await?
            .into_iter()
            .filter(|p| document::id(p) != Some(id))
            .collect();
        siblings.sort_by_key(rank_of);
        let moved = self.store.get(id).await?.ok_or(Error::NotFound)?;
        let at = match position {
            MovePosition::Inside => siblings.len(),
            MovePosition::Before | MovePosition::After => {
                let target_at = siblings
                    .iter()
                    .position(|p| document::id(p) == Some(target_id))
                    .unwrap_or(siblings.len());
                if position == MovePosition::After {
                    target_at + 1
                } else {
                    target_at
                }
            }
        };
        siblings.insert(at.min(siblings.len()), moved);
        for (rank, mut sibling) in siblings.into_iter().enumerate() {
            let sibling_id = document::id(&sibling).ok_or(Error::NotFound)?.to_string();
            sibling.insert(RANK.to_string(), Value::from(rank as i64));
            self.store.update(&sibling_id, sibling).await?;
        }

        debug!(id, target_id, "moved page");
        Ok(())
    }
}

fn join_path(parent: &str, tail: &str) -> String {
    if parent == "/" {
        format!("/{tail}")
    } else {
        format!("{parent}/{tail}")
    }
}

/// Attach `_children` arrays to `node` from the flat page list, to the
/// given remaining depth. Nodes at the depth boundary carry no
/// `_children` key at all.
fn attach_children(mut node: Document, pages: &[Document], depth: usize) -> Document {
    if depth == 0 {
        return node;
    }
    let node_path = path_of(&node).to_string();
    let node_level = level_of(&node);
    let mut children: Vec<Document> = pages
        .iter()
        .filter(|p| parent_path(path_of(p)) == Some(node_path.as_str()) && level_of(p) == node_level + 1)
        .cloned()
        .collect();
    children.sort_by_key(rank_of);
    let children: Vec<Value> = children
        .into_iter()
        .map(|child| Value::Object(attach_children(child, pages, depth - 1)))
        .collect();
    node.insert(CHILDREN.to_string(), Value::Array(children));
    node
}

/// Flatten a tree into a depth-first list where each node's `_children`
/// holds child ids instead of full documents.
pub fn flatten(node: &Document) -> Vec<Document> {
    let mut out = Vec::new();
    walk(node, &mut out);
    out
}

fn walk(node: &Document, out: &mut Vec<Document>) {
    let children: Vec<&Document> = node
        .get(CHILDREN)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default();

    let mut flat = node.clone();
    let ids: Vec<Value> = children
        .iter()
        .filter_map(|child| document::id(child))
        .map(|id| Value::String(id.to_string()))
        .collect();
    flat.insert(CHILDREN.to_string(), Value::Array(ids));
    out.push(flat);

    for child in children {
        walk(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus_store::MemoryDocumentStore;
    use serde_json::json;

    fn page(id: &str, title: &str, path: &str, level: i64, rank: i64) -> Document {
        json!({
            "_id": id,
            "type": "pages",
            "title": title,
            "slug": path,
            "path": path,
            "level": level,
            "rank": rank,
            "published": true,
        })
        .as_object()
        .unwrap()
        .clone()
    }

    async fn seeded_tree() -> (Arc<MemoryDocumentStore>, SimplePageTree) {
        let store = Arc::new(MemoryDocumentStore::new());
        for doc in [
            page("home", "Home", "/", 0, 0),
            page("t1", "Tab One", "/tab-one", 1, 0),
            page("t2", "Tab Two", "/tab-two", 1, 1),
            page("t1c1", "Tab One Child One", "/tab-one/child-one", 2, 0),
            page("t1c2", "Tab One Child Two", "/tab-one/child-two", 2, 1),
        ] {
            store.insert(doc).await.unwrap();
        }
        let tree = SimplePageTree::new(store.clone(), "pages");
        (store, tree)
    }

    #[tokio::test]
    async fn depth_one_stops_at_children() {
        let (_store, tree) = seeded_tree().await;
        let home = tree.tree(1, false).await.unwrap();
        let children = home.get(CHILDREN).unwrap().as_array().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].get("title").unwrap(), "Tab One");
        assert!(children[0].get(CHILDREN).is_none());
    }

    #[tokio::test]
    async fn full_depth_reaches_grandchildren() {
        let (_store, tree) = seeded_tree().await;
        let home = tree.tree(1000, false).await.unwrap();
        let children = home.get(CHILDREN).unwrap().as_array().unwrap();
        let grandchildren = children[0].get(CHILDREN).unwrap().as_array().unwrap();
        assert_eq!(grandchildren.len(), 2);
    }

    #[tokio::test]
    async fn flatten_replaces_children_with_ids() {
        let (_store, tree) = seeded_tree().await;
        let home = tree.tree(1000, false).await.unwrap();
        let flat = flatten(&home);
        assert_eq!(flat.len(), 5);
        assert_eq!(
            flat[0].get(CHILDREN).unwrap(),
            &json!(["t1", "t2"])
        );
    }

    #[tokio::test]
    async fn insert_child_derives_tree_fields() {
        let (_store, tree) = seeded_tree().await;
        let mut doc = Document::new();
        doc.insert("_id".to_string(), json!("t1c3"));
        doc.insert("type".to_string(), json!("pages"));
        doc.insert("title".to_string(), json!("Tab One Child Three"));

        let inserted = tree.insert_child(Some("t1"), doc).await.unwrap();
        assert_eq!(inserted.get(LEVEL).unwrap(), &json!(2));
        assert_eq!(
            inserted.get(PATH).unwrap(),
            &json!("/tab-one/tab-one-child-three")
        );
        assert_eq!(inserted.get(RANK).unwrap(), &json!(2));
    }

    #[tokio::test]
    async fn insert_without_parent_lands_under_home() {
        let (_store, tree) = seeded_tree().await;
        let mut doc = Document::new();
        doc.insert("_id".to_string(), json!("t3"));
        doc.insert("type".to_string(), json!("pages"));
        doc.insert("title".to_string(), json!("Tab Three"));

        let inserted = tree.insert_child(None, doc).await.unwrap();
        assert_eq!(inserted.get(LEVEL).unwrap(), &json!(1));
        assert_eq!(inserted.get(PATH).unwrap(), &json!("/tab-three"));
    }

    #[tokio::test]
    async fn move_inside_turns_child_into_grandchild() {
        let (_store, tree) = seeded_tree().await;
        tree.move_page("t1", "t2", MovePosition::Inside).await.unwrap();

        let home = tree.tree(1000, false).await.unwrap();
        let children = home.get(CHILDREN).unwrap().as_array().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].get("title").unwrap(), "Tab Two");
        let moved = children[0].get(CHILDREN).unwrap().as_array().unwrap();
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].get("title").unwrap(), "Tab One");
        assert_eq!(moved[0].get(PATH).unwrap(), &json!("/tab-two/tab-one"));
        // The subtree moved along and its levels shifted.
        let grandchildren = moved[0].get(CHILDREN).unwrap().as_array().unwrap();
        assert_eq!(grandchildren.len(), 2);
        assert_eq!(
            grandchildren[0].get(PATH).unwrap(),
            &json!("/tab-two/tab-one/child-one")
        );
        assert_eq!(grandchildren[0].get(LEVEL).unwrap(), &json!(3));
    }

    #[tokio::test]
    async fn move_before_reorders_siblings() {
        let (_store, tree) = seeded_tree().await;
        tree.move_page("t2", "t1", MovePosition::Before).await.unwrap();

        let home = tree.tree(1, false).await.unwrap();
        let children = home.get(CHILDREN).unwrap().as_array().unwrap();
        assert_eq!(children[0].get("title").unwrap(), "Tab Two");
        assert_eq!(children[1].get("title").unwrap(), "Tab One");
    }

    #[tokio::test]
    async fn moving_into_own_subtree_is_rejected() {
        let (_store, tree) = seeded_tree().await;
        let result = tree.move_page("t1", "t1c1", MovePosition::Inside).await;
        assert!(matches!(result, Err(Error::BadRequest(_))));
    }
}
