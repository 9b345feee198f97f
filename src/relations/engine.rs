// SPDX-License-Identifier: Apache-2.0

//! Relationship Inference Engine
//!
//! Serves a dataset's relationship graph from the cache store when warm,
//! otherwise re-infers it from a fresh schema snapshot and merges the stored
//! manual edges back in.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use lakegate_core::{DatasetKey, EdgeOrigin, RelationshipCacheEntry, RelationshipEdge};

use super::inference::{infer_relationships, snapshot_fingerprint};
use super::store::RelationshipCacheStore;
use crate::gateway::{AuthorityGateway, GatewayResult};
use crate::metrics;

/// Where a relationship read was served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipSource {
    Cache,
    Inferred,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRelationships {
    pub edges: Vec<RelationshipEdge>,
    pub source: RelationshipSource,
}

pub struct RelationshipService {
    gateway: Arc<AuthorityGateway>,
    store: Arc<dyn RelationshipCacheStore>,
    /// Held across every load-modify-save of a stored entry
    write_lock: Mutex<()>,
}

impl RelationshipService {
    pub fn new(gateway: Arc<AuthorityGateway>, store: Arc<dyn RelationshipCacheStore>) -> Self {
        Self {
            gateway,
            store,
            write_lock: Mutex::new(()),
        }
    }

    fn stored_entry(&self, dataset: &DatasetKey) -> Option<RelationshipCacheEntry> {
        match self.store.load(dataset) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Relationship cache unreadable for {}: {}", dataset, e);
                None
            }
        }
    }

    /// Returns the dataset's edges, recomputing when cold or when forced.
    #[instrument(skip(self), fields(dataset = %dataset))]
    pub async fn get_relationships(
        &self,
        dataset: &DatasetKey,
        force_refresh: bool,
    ) -> DatasetRelationships {
        if !force_refresh {
            if let Some(entry) = self.stored_entry(dataset).filter(|e| e.is_warm()) {
                metrics::record_relationship_cache(true);
                return DatasetRelationships {
                    edges: entry.edges,
                    source: RelationshipSource::Cache,
                };
            }
        }
        metrics::record_relationship_cache(false);

        let tables = self.gateway.fetch_schema(dataset).await;
        let mut edges = infer_relationships(&tables);
        let inferred_count = edges.len();

        {
            let _guard = self.write_lock.lock();
            // manual edges added while the schema was being fetched count too
            if let Some(entry) = self.stored_entry(dataset) {
                for manual in entry.manual_edges() {
                    if !edges.iter().any(|e| e.same_link(manual)) {
                        edges.push(manual.clone());
                    }
                }
            }

            let entry = RelationshipCacheEntry {
                dataset_key: dataset.to_string(),
                edges: edges.clone(),
                table_snapshot_fingerprint: snapshot_fingerprint(&tables),
                computed_at: Some(Utc::now()),
            };
            if let Err(e) = self.store.save(dataset, &entry) {
                warn!("Failed to persist relationships for {}: {}", dataset, e);
            }
        }

        info!(
            "Inferred {} relationships across {} tables ({} manual kept)",
            inferred_count,
            tables.len(),
            edges.len() - inferred_count
        );

        DatasetRelationships {
            edges,
            source: RelationshipSource::Inferred,
        }
    }

    /// Appends a manual edge to the stored entry and returns all stored edges.
    ///
    /// Nothing is added when any stored edge, inferred or manual, already
    /// links the same two tables under the same label.
    #[instrument(skip(self, edge), fields(dataset = %dataset))]
    pub fn add_manual_relationship(
        &self,
        dataset: &DatasetKey,
        edge: RelationshipEdge,
    ) -> GatewayResult<Vec<RelationshipEdge>> {
        edge.validate()?;
        let edge = RelationshipEdge {
            origin: EdgeOrigin::Manual,
            ..edge
        };

        let _guard = self.write_lock.lock();
        let mut entry = self
            .store
            .load(dataset)?
            .unwrap_or_else(|| RelationshipCacheEntry::empty(dataset.to_string()));

        let duplicate = entry.edges.iter().any(|existing| existing.same_link(&edge));
        if !duplicate {
            entry.edges.push(edge);
            self.store.save(dataset, &entry)?;
        }
        Ok(entry.edges)
    }

    /// Drops the dataset's entry, manual edges included.
    #[instrument(skip(self), fields(dataset = %dataset))]
    pub fn invalidate(&self, dataset: &DatasetKey) -> GatewayResult<()> {
        let _guard = self.write_lock.lock();
        self.store.delete(dataset)?;
        info!("Relationship cache invalidated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{
        AgentClient, AuthorityClient, CatalogClient, CatalogEntry, GatewayError, IamBinding,
        SearchScope,
    };
    use crate::relations::store::InMemoryRelationshipStore;
    use async_trait::async_trait;
    use lakegate_core::{Column, TableReference};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    struct NoAuthority;

    #[async_trait]
    impl AuthorityClient for NoAuthority {
        async fn get_project_iam_policy(&self, _p: &str) -> GatewayResult<Vec<IamBinding>> {
            Ok(Vec::new())
        }

        async fn get_resource_iam_policy(&self, _r: &DatasetKey) -> GatewayResult<Vec<IamBinding>> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct SalesCatalog {
        schema_calls: AtomicUsize,
    }

    #[async_trait]
    impl CatalogClient for SalesCatalog {
        async fn search_entries(
            &self,
            _query: &str,
            _scope: &SearchScope,
        ) -> GatewayResult<Vec<CatalogEntry>> {
            Ok(Vec::new())
        }

        async fn list_tables(&self, _dataset: &DatasetKey) -> GatewayResult<Vec<String>> {
            self.schema_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["orders".into(), "customers".into()])
        }

        async fn get_table_schema(&self, table: &TableReference) -> GatewayResult<Vec<Column>> {
            self.schema_calls.fetch_add(1, Ordering::SeqCst);
            Ok(match table.table_id.as_str() {
                "orders" => vec![
                    Column::new("order_id", "INT64"),
                    Column::new("customer_id", "INT64"),
                ],
                _ => vec![
                    Column::new("customer_id", "INT64"),
                    Column::new("name", "STRING"),
                ],
            })
        }
    }

    struct NoAgents;

    #[async_trait]
    impl AgentClient for NoAgents {
        async fn create_agent(
            &self,
            _id: &str,
            _refs: &[TableReference],
            _instruction: &str,
        ) -> GatewayResult<String> {
            Err(GatewayError::transport("unused"))
        }

        async fn get_agent(&self, _id: &str) -> GatewayResult<String> {
            Err(GatewayError::transport("unused"))
        }
    }

    /// Holds `list_tables` open until released
    #[derive(Default)]
    struct GatedCatalog {
        sales: SalesCatalog,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl CatalogClient for GatedCatalog {
        async fn search_entries(
            &self,
            query: &str,
            scope: &SearchScope,
        ) -> GatewayResult<Vec<CatalogEntry>> {
            self.sales.search_entries(query, scope).await
        }

        async fn list_tables(&self, dataset: &DatasetKey) -> GatewayResult<Vec<String>> {
            self.entered.notify_one();
            self.release.notified().await;
            self.sales.list_tables(dataset).await
        }

        async fn get_table_schema(&self, table: &TableReference) -> GatewayResult<Vec<Column>> {
            self.sales.get_table_schema(table).await
        }
    }

    fn service_over<C: CatalogClient + 'static>(catalog: Arc<C>) -> RelationshipService {
        let gateway = Arc::new(AuthorityGateway::new(
            Arc::new(NoAuthority),
            catalog,
            Arc::new(NoAgents),
        ));
        RelationshipService::new(gateway, Arc::new(InMemoryRelationshipStore::new()))
    }

    fn service() -> (RelationshipService, Arc<SalesCatalog>) {
        let catalog = Arc::new(SalesCatalog::default());
        (service_over(catalog.clone()), catalog)
    }

    fn sales() -> DatasetKey {
        DatasetKey::new("p", "sales")
    }

    #[tokio::test]
    async fn warm_cache_skips_schema_fetch() {
        let (service, catalog) = service();
        let first = service.get_relationships(&sales(), false).await;
        assert_eq!(first.source, RelationshipSource::Inferred);
        let calls = catalog.schema_calls.load(Ordering::SeqCst);
        assert_eq!(calls, 3);

        let second = service.get_relationships(&sales(), false).await;
        assert_eq!(second.source, RelationshipSource::Cache);
        assert_eq!(second.edges, first.edges);
        assert_eq!(catalog.schema_calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test]
    async fn force_refresh_recomputes_and_keeps_manual_edges() {
        let (service, catalog) = service();
        service.get_relationships(&sales(), false).await;
        service
            .add_manual_relationship(
                &sales(),
                RelationshipEdge::manual("orders", "products", "related to"),
            )
            .unwrap();

        let refreshed = service.get_relationships(&sales(), true).await;
        assert_eq!(refreshed.source, RelationshipSource::Inferred);
        assert_eq!(refreshed.edges.len(), 2);
        assert_eq!(catalog.schema_calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn manual_edges_are_idempotent_and_validated() {
        let (service, _) = service();
        let edge = RelationshipEdge::manual("orders", "products", "related to");
        assert_eq!(service.add_manual_relationship(&sales(), edge.clone()).unwrap().len(), 1);
        assert_eq!(service.add_manual_relationship(&sales(), edge).unwrap().len(), 1);

        let reversed = RelationshipEdge::manual("products", "orders", "related to");
        assert_eq!(service.add_manual_relationship(&sales(), reversed).unwrap().len(), 1);

        let blank = RelationshipEdge::manual("orders", "", "related to");
        assert!(service.add_manual_relationship(&sales(), blank).is_err());
    }

    #[tokio::test]
    async fn manual_only_entry_is_not_served_as_warm() {
        let (service, _) = service();
        service
            .add_manual_relationship(
                &sales(),
                RelationshipEdge::manual("orders", "products", "related to"),
            )
            .unwrap();
        let read = service.get_relationships(&sales(), false).await;
        assert_eq!(read.source, RelationshipSource::Inferred);
        assert_eq!(read.edges.len(), 2);
    }

    #[tokio::test]
    async fn submitted_origin_is_forced_to_manual() {
        let (service, _) = service();
        let mut edge = RelationshipEdge::manual("orders", "products", "related to");
        edge.origin = EdgeOrigin::Inferred;
        let edges = service.add_manual_relationship(&sales(), edge).unwrap();
        assert_eq!(edges[0].origin, EdgeOrigin::Manual);
    }

    #[tokio::test]
    async fn manual_edge_added_during_refresh_survives() {
        let catalog = Arc::new(GatedCatalog::default());
        let service = service_over(catalog.clone());
        let manual = RelationshipEdge::manual("orders", "products", "related to");

        let scope = sales();
        let refresh = service.get_relationships(&scope, true);
        let add = async {
            catalog.entered.notified().await;
            service
                .add_manual_relationship(&sales(), manual.clone())
                .unwrap();
            catalog.release.notify_one();
        };
        let (refreshed, ()) = tokio::join!(refresh, add);

        assert!(refreshed.edges.iter().any(|e| e.same_link(&manual)));
        let stored = service.store.load(&sales()).unwrap().unwrap();
        assert_eq!(stored.manual_edges().count(), 1);
        assert_eq!(stored.edges.len(), 2);
    }

    #[tokio::test]
    async fn manual_edge_matching_an_inferred_one_is_not_duplicated() {
        let (service, _) = service();
        service.get_relationships(&sales(), false).await;

        let same = RelationshipEdge::manual("customers", "orders", "References");
        let edges = service.add_manual_relationship(&sales(), same).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].origin, EdgeOrigin::Inferred);

        let refreshed = service.get_relationships(&sales(), true).await;
        assert_eq!(refreshed.edges.len(), 1);
    }

    #[tokio::test]
    async fn manual_edge_added_cold_is_folded_into_inference() {
        let (service, _) = service();
        let same = RelationshipEdge::manual("orders", "customers", "references");
        service.add_manual_relationship(&sales(), same).unwrap();

        let read = service.get_relationships(&sales(), false).await;
        assert_eq!(read.edges.len(), 1);
        assert_eq!(read.edges[0].origin, EdgeOrigin::Inferred);
    }
}
