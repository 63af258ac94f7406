//! Identity-scoped document queries
//!
//! The Document Accessor boundary: every read goes through a query scoped
//! by the requesting identity's visibility tier and clamped to the content
//! type's maximum page size.

use corpus_core::{ContentType, CorpusResult, Document, Error, Identity};
use corpus_store::{DocumentFilter, DocumentStore};
use serde::Serialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Default)]
pub struct ListParams {
    /// `published=any`: include unpublished documents. Honored only on
    /// the manage tier.
    pub published_any: bool,
    pub per_page: Option<usize>,
    /// 1-based page number; zero is treated as one.
    pub page: usize,
    /// Fields to aggregate distinct values for.
    pub distinct: Vec<String>,
    /// Distinct fields that should also carry occurrence counts.
    pub distinct_counts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResult {
    pub total: usize,
    pub pages: usize,
    #[serde(rename = "perPage")]
    pub per_page: usize,
    #[serde(rename = "currentPage")]
    pub current_page: usize,
    pub results: Vec<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distinct: Option<Map<String, Value>>,
}

pub struct DocumentQuery<'a> {
    store: &'a dyn DocumentStore,
    ty: &'a ContentType,
    manage: bool,
}

impl<'a> DocumentQuery<'a> {
    /// Build a query scoped to what `identity` may see: the manage tier
    /// for identities with edit permission, the public tier otherwise.
    pub fn scoped(
        store: &'a dyn DocumentStore,
        ty: &'a ContentType,
        identity: &Identity,
    ) -> CorpusResult<Self> {
        let manage = identity.can_edit(ty);
        if ty.get_requires_edit && !manage {
            return Err(Error::forbidden());
        }
        Ok(Self { store, ty, manage })
    }

    pub fn is_manage(&self) -> bool {
        self.manage
    }

    fn filter(&self, published_any: bool) -> DocumentFilter {
        let filter = DocumentFilter::for_type(&self.ty.name);
        if self.manage && published_any {
            filter
        } else {
            filter.published_only()
        }
    }

    /// One page of results plus counts and optional distinct aggregation.
    pub async fn list(&self, params: &ListParams) -> CorpusResult<ListResult> {
        let matching = self.store.find(&self.filter(params.published_any)).await?;
        let total = matching.len();

        let per_page = match params.per_page {
            Some(requested) if requested > 0 && requested <= self.ty.max_per_page => requested,
            _ => self.ty.max_per_page,
        };
        let pages = total.div_ceil(per_page);
        let current_page = params.page.max(1);

        let distinct = self.aggregate_distinct(&matching, params);

        let start = (current_page - 1).saturating_mul(per_page).min(total);
        let end = start.saturating_add(per_page).min(total);
        let results = matching[start..end].to_vec();

        Ok(ListResult {
            total,
            pages,
            per_page,
            current_page,
            results,
            distinct,
        })
    }

    /// Fetch one document by id through the same visibility scoping used
    /// for lists: documents outside the tier simply do not exist.
    pub async fn one(&self, id: &str) -> CorpusResult<Option<Document>> {
        let filter = self.filter(true).with_id(id);
        let mut matching = self.store.find(&filter).await?;
        Ok(matching.pop())
    }

    /// Distinct values across the full matching set (not just the current
    /// page), restricted to the type's allow-list; fields outside it are
    /// skipped silently.
    fn aggregate_distinct(
        &self,
        matching: &[Document],
        params: &ListParams,
    ) -> Option<Map<String, Value>> {
        let mut requested: Vec<&String> = params.distinct.iter().collect();
        for field in &params.distinct_counts {
            if !requested.contains(&field) {
                requested.push(field);
            }
        }
        requested.retain(|field| self.ty.safe_distinct.contains(*field));
        if requested.is_empty() {
            return None;
        }

        let mut out = Map::new();
        for field in requested {
            let counted = params.distinct_counts.contains(field);
            let mut values: Vec<Value> = Vec::new();
            let mut counts: Vec<usize> = Vec::new();
            for doc in matching {
                let Some(value) = doc.get(field.as_str()) else {
                    continue;
                };
                if value.is_null() {
                    continue;
                }
                match values.iter().position(|v| v == value) {
                    Some(i) => counts[i] += 1,
                    None => {
                        values.push(value.clone());
                        counts.push(1);
                    }
                }
            }
            let choices: Vec<Value> = values
                .into_iter()
                .zip(counts)
                .map(|(value, count)| {
                    if counted {
                        json!({ "value": value, "count": count })
                    } else {
                        json!({ "value": value })
                    }
                })
                .collect();
            out.insert(field.clone(), Value::Array(choices));
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus_core::document;
    use corpus_store::MemoryDocumentStore;
    use serde_json::json;

    fn product(id: &str, published: bool, color: &str) -> Document {
        json!({
            "_id": id,
            "type": "products",
            "published": published,
            "color": color,
        })
        .as_object()
        .unwrap()
        .clone()
    }

    async fn seeded() -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        for i in 1..=10 {
            let published = i % 2 == 1;
            let color = if i <= 6 { "red" } else { "blue" };
            store
                .insert(product(&format!("p{i}"), published, color))
                .await
                .unwrap();
        }
        store
    }

    fn ty() -> ContentType {
        ContentType::piece("products")
            .with_max_per_page(5)
            .with_safe_distinct("color")
    }

    fn editor() -> Identity {
        Identity::System {
            scope: corpus_core::KeyScope::Module("products".to_string()),
        }
    }

    #[tokio::test]
    async fn public_tier_sees_published_only() {
        let store = seeded().await;
        let ty = ty();
        let query = DocumentQuery::scoped(&store, &ty, &Identity::Anonymous).unwrap();
        let result = query.list(&ListParams::default()).await.unwrap();
        assert_eq!(result.total, 5);
        // published=any is ignored outside the manage tier
        let result = query
            .list(&ListParams {
                published_any: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(result.total, 5);
    }

    #[tokio::test]
    async fn manage_tier_with_published_any_sees_everything() {
        let store = seeded().await;
        let ty = ty();
        let query = DocumentQuery::scoped(&store, &ty, &editor()).unwrap();
        let result = query
            .list(&ListParams {
                published_any: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(result.total, 10);
        assert_eq!(result.pages, 2);
        assert_eq!(result.per_page, 5);
    }

    #[tokio::test]
    async fn second_page_returns_the_rest() {
        let store = seeded().await;
        let ty = ty();
        let query = DocumentQuery::scoped(&store, &ty, &editor()).unwrap();
        let params = |page| ListParams {
            published_any: true,
            per_page: Some(5),
            page,
            ..Default::default()
        };
        let first = query.list(&params(1)).await.unwrap();
        let second = query.list(&params(2)).await.unwrap();
        assert_eq!(first.results.len(), 5);
        assert_eq!(second.results.len(), 5);
        assert_ne!(
            document::id(&first.results[0]),
            document::id(&second.results[0])
        );
        assert_eq!(second.pages, 2);
        assert_eq!(second.current_page, 2);
    }

    #[tokio::test]
    async fn per_page_above_the_clamp_is_reset() {
        let store = seeded().await;
        let ty = ty();
        let query = DocumentQuery::scoped(&store, &ty, &editor()).unwrap();
        let result = query
            .list(&ListParams {
                published_any: true,
                per_page: Some(500),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(result.per_page, 5);
        assert_eq!(result.results.len(), 5);
    }

    #[tokio::test]
    async fn distinct_respects_the_allow_list() {
        let store = seeded().await;
        let ty = ty();
        let query = DocumentQuery::scoped(&store, &ty, &editor()).unwrap();
        let result = query
            .list(&ListParams {
                published_any: true,
                distinct: vec!["color".to_string(), "published".to_string()],
                distinct_counts: vec!["color".to_string()],
                ..Default::default()
            })
            .await
            .unwrap();
        let distinct = result.distinct.unwrap();
        assert!(distinct.contains_key("color"));
        // `published` is not allow-listed
        assert!(!distinct.contains_key("published"));
        let colors = distinct.get("color").unwrap().as_array().unwrap();
        assert_eq!(colors.len(), 2);
        assert!(colors[0].get("count").is_some());
    }

    #[tokio::test]
    async fn one_hides_unpublished_from_the_public_tier() {
        let store = seeded().await;
        let ty = ty();
        let public = DocumentQuery::scoped(&store, &ty, &Identity::Anonymous).unwrap();
        assert!(public.one("p2").await.unwrap().is_none());
        assert!(public.one("p1").await.unwrap().is_some());

        let manage = DocumentQuery::scoped(&store, &ty, &editor()).unwrap();
        assert!(manage.one("p2").await.unwrap().is_some());
    }
}
