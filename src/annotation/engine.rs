// SPDX-License-Identifier: Apache-2.0

//! Access Annotation Engine
//!
//! Resolves access in tiers and stops at the first tier that grants everything:
//! 1. Admin: application role store, then elevated project roles
//! 2. Project: one bulk check against the reader-or-above roles
//! 3. Dataset: one concurrent membership check per distinct dataset
//!
//! Every failure denies only what it touches. The call itself never fails.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use lakegate_core::{AccessTier, DatasetKey, PermissionDecision, Principal, TableReference};

use super::roles::RoleStore;
use super::types::{AccessibleTables, Annotated, Annotation, ResourceItem};
use crate::config::AuthorityConfig;
use crate::gateway::{AuthorityGateway, SearchScope};
use crate::metrics;

const DEFAULT_TABLE_QUERY: &str = "type=table";

pub struct AccessAnnotator {
    gateway: Arc<AuthorityGateway>,
    roles: Arc<dyn RoleStore>,
    config: AuthorityConfig,
}

impl AccessAnnotator {
    pub fn new(
        gateway: Arc<AuthorityGateway>,
        roles: Arc<dyn RoleStore>,
        config: AuthorityConfig,
    ) -> Self {
        Self {
            gateway,
            roles,
            config,
        }
    }

    /// Tags every item with `user_has_access`.
    #[instrument(skip(self, items, principal), fields(items = items.len(), principal_kind = ?principal.kind))]
    pub async fn annotate<T: ResourceItem>(
        &self,
        items: Vec<T>,
        principal: &Principal,
    ) -> Annotation<T> {
        if let Some(tier) = self.broad_access(principal).await {
            debug!("Granting all {} items at {:?} tier", items.len(), tier);
            metrics::record_annotation(tier);
            let decision =
                PermissionDecision::new(principal, self.config.admin_project.clone(), true, tier);
            return Annotation {
                items: items
                    .into_iter()
                    .map(|item| Annotated {
                        item,
                        user_has_access: true,
                    })
                    .collect(),
                tier,
                decisions: vec![decision],
            };
        }

        metrics::record_annotation(AccessTier::Dataset);
        self.annotate_by_dataset(items, principal).await
    }

    async fn annotate_by_dataset<T: ResourceItem>(
        &self,
        items: Vec<T>,
        principal: &Principal,
    ) -> Annotation<T> {
        let keys: Vec<Option<DatasetKey>> = items
            .iter()
            .map(|item| {
                TableReference::parse(item.resource_name())
                    .map(|r| r.dataset_key())
                    .map_err(|e| debug!("Denying unparseable item: {}", e))
                    .ok()
            })
            .collect();

        let unique: Vec<DatasetKey> = keys
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let verdicts = if unique.is_empty() {
            HashMap::new()
        } else {
            self.gateway
                .check_resource_memberships(principal, &unique)
                .await
        };

        let mut decisions: Vec<PermissionDecision> = unique
            .iter()
            .map(|key| {
                let granted = verdicts.get(key).copied().unwrap_or(false);
                PermissionDecision::new(principal, key.to_string(), granted, AccessTier::Dataset)
            })
            .collect();

        let annotated = items
            .into_iter()
            .zip(keys)
            .map(|(item, key)| {
                let user_has_access = match key {
                    Some(ref key) => verdicts.get(key).copied().unwrap_or(false),
                    None => {
                        decisions.push(PermissionDecision::new(
                            principal,
                            item.resource_name(),
                            false,
                            AccessTier::Dataset,
                        ));
                        false
                    }
                };
                Annotated {
                    item,
                    user_has_access,
                }
            })
            .collect();

        Annotation {
            items: annotated,
            tier: AccessTier::Dataset,
            decisions,
        }
    }

    /// Admin then project tier. `None` means the dataset tier must decide.
    ///
    /// The admin project's policy is fetched once and checked against both
    /// role sets.
    pub async fn broad_access(&self, principal: &Principal) -> Option<AccessTier> {
        if self.has_elevated_app_role(principal) {
            return Some(AccessTier::Admin);
        }
        if self.config.admin_project.is_empty() {
            return None;
        }
        let held = self
            .gateway
            .project_roles(principal, &self.config.admin_project)
            .await;
        let holds_any = |roles: &[String]| roles.iter().any(|r| held.contains(r));

        if holds_any(&self.config.admin_roles) {
            Some(AccessTier::Admin)
        } else if holds_any(&self.config.reader_roles) {
            Some(AccessTier::Project)
        } else {
            None
        }
    }

    /// Role store first; otherwise elevated roles on the admin project.
    pub async fn is_elevated(&self, principal: &Principal) -> bool {
        if self.has_elevated_app_role(principal) {
            return true;
        }
        if self.config.admin_project.is_empty() {
            return false;
        }
        self.gateway
            .check_project_membership(
                principal,
                &self.config.admin_project,
                &self.config.admin_roles,
            )
            .await
    }

    fn has_elevated_app_role(&self, principal: &Principal) -> bool {
        match self.roles.role_for(principal) {
            Ok(Some(role)) => role.is_elevated(),
            Ok(None) => false,
            Err(e) => {
                warn!("Role store lookup failed, falling back to IAM: {}", e);
                false
            }
        }
    }

    /// Catalog tables in the admin project that the principal may use.
    #[instrument(skip(self, principal), fields(principal_kind = ?principal.kind))]
    pub async fn list_accessible_tables(
        &self,
        principal: &Principal,
        query: Option<&str>,
    ) -> AccessibleTables {
        let scope = SearchScope::project(&self.config.admin_project);
        let entries = self
            .gateway
            .search_entries(query.unwrap_or(DEFAULT_TABLE_QUERY), &scope)
            .await;

        let annotation = self.annotate(entries, principal).await;
        let tables = annotation
            .items
            .into_iter()
            .filter(|a| a.user_has_access)
            .filter_map(|a| a.item.table_reference())
            .collect();
        AccessibleTables::from_tables(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::roles::{AppRole, InMemoryRoleStore};
    use crate::gateway::{
        AgentClient, AuthorityClient, CatalogClient, CatalogEntry, GatewayError, GatewayResult,
        IamBinding,
    };
    use async_trait::async_trait;
    use lakegate_core::Column;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Project policy plus per-dataset readers; `None` datasets are unreachable.
    struct FakeAuthority {
        project: Vec<IamBinding>,
        datasets: HashMap<String, Option<Vec<String>>>,
        project_down: bool,
        dataset_calls: AtomicUsize,
    }

    impl FakeAuthority {
        fn new() -> Self {
            Self {
                project: Vec::new(),
                datasets: HashMap::new(),
                project_down: false,
                dataset_calls: AtomicUsize::new(0),
            }
        }

        fn dataset(mut self, name: &str, readers: Option<&[&str]>) -> Self {
            self.datasets.insert(
                name.to_string(),
                readers.map(|r| r.iter().map(|m| m.to_string()).collect()),
            );
            self
        }
    }

    #[async_trait]
    impl AuthorityClient for FakeAuthority {
        async fn get_project_iam_policy(&self, _project_id: &str) -> GatewayResult<Vec<IamBinding>> {
            if self.project_down {
                return Err(GatewayError::transport("down"));
            }
            Ok(self.project.clone())
        }

        async fn get_resource_iam_policy(
            &self,
            resource: &DatasetKey,
        ) -> GatewayResult<Vec<IamBinding>> {
            self.dataset_calls.fetch_add(1, Ordering::SeqCst);
            match self.datasets.get(&resource.dataset_id) {
                Some(Some(readers)) => Ok(vec![IamBinding::new("READER", readers.clone())]),
                Some(None) => Err(GatewayError::transport("unreachable")),
                None => Ok(Vec::new()),
            }
        }
    }

    struct FakeCatalog {
        entries: Vec<CatalogEntry>,
    }

    #[async_trait]
    impl CatalogClient for FakeCatalog {
        async fn search_entries(
            &self,
            _query: &str,
            _scope: &SearchScope,
        ) -> GatewayResult<Vec<CatalogEntry>> {
            Ok(self.entries.clone())
        }

        async fn list_tables(&self, _dataset: &DatasetKey) -> GatewayResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn get_table_schema(&self, _table: &TableReference) -> GatewayResult<Vec<Column>> {
            Ok(Vec::new())
        }
    }

    struct NoAgents;

    #[async_trait]
    impl AgentClient for NoAgents {
        async fn create_agent(
            &self,
            _agent_id: &str,
            _table_refs: &[TableReference],
            _system_instruction: &str,
        ) -> GatewayResult<String> {
            Err(GatewayError::transport("unused"))
        }

        async fn get_agent(&self, _agent_id: &str) -> GatewayResult<String> {
            Err(GatewayError::transport("unused"))
        }
    }

    fn config() -> AuthorityConfig {
        AuthorityConfig {
            admin_project: "home".to_string(),
            ..AuthorityConfig::default()
        }
    }

    fn annotator(
        authority: Arc<FakeAuthority>,
        roles: Arc<InMemoryRoleStore>,
        entries: Vec<CatalogEntry>,
    ) -> AccessAnnotator {
        let gateway = Arc::new(AuthorityGateway::new(
            authority,
            Arc::new(FakeCatalog { entries }),
            Arc::new(NoAgents),
        ));
        AccessAnnotator::new(gateway, roles, config())
    }

    fn results() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry::table("home.sales.orders"),
            CatalogEntry::table("home.sales.customers"),
            CatalogEntry::table("home.hr.people"),
            CatalogEntry::table("home.ops.incidents"),
            CatalogEntry::table("not a table"),
        ]
    }

    fn flags(annotation: &Annotation<CatalogEntry>) -> Vec<bool> {
        annotation.items.iter().map(|a| a.user_has_access).collect()
    }

    #[tokio::test]
    async fn admin_role_grants_everything_without_iam_calls() {
        let authority = Arc::new(FakeAuthority::new());
        let roles = Arc::new(InMemoryRoleStore::new());
        let alice = Principal::user("alice@x.com");
        roles.set_role(&alice, AppRole::Admin).unwrap();

        let annotation = annotator(authority.clone(), roles, vec![])
            .annotate(results(), &alice)
            .await;
        assert_eq!(annotation.tier, AccessTier::Admin);
        assert!(flags(&annotation).iter().all(|f| *f));
        assert_eq!(authority.dataset_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn elevated_iam_role_counts_as_admin() {
        let mut authority = FakeAuthority::new();
        authority.project = vec![IamBinding::new(
            "roles/bigquery.admin",
            vec!["user:alice@x.com".into()],
        )];
        let annotation = annotator(Arc::new(authority), Arc::new(InMemoryRoleStore::new()), vec![])
            .annotate(results(), &Principal::user("alice@x.com"))
            .await;
        assert_eq!(annotation.tier, AccessTier::Admin);
    }

    #[tokio::test]
    async fn project_reader_grants_everything() {
        let mut authority = FakeAuthority::new();
        authority.project = vec![IamBinding::new(
            "roles/viewer",
            vec!["domain:x.com".into()],
        )];
        let authority = Arc::new(authority);
        let annotation = annotator(authority.clone(), Arc::new(InMemoryRoleStore::new()), vec![])
            .annotate(results(), &Principal::user("bob@x.com"))
            .await;
        assert_eq!(annotation.tier, AccessTier::Project);
        assert_eq!(annotation.granted_count(), 5);
        assert_eq!(authority.dataset_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dataset_tier_only_grants_explicit_members() {
        let authority = Arc::new(
            FakeAuthority::new()
                .dataset("sales", Some(&["user:bob@x.com"]))
                .dataset("hr", Some(&["user:carol@x.com"]))
                .dataset("ops", None),
        );
        let annotation = annotator(authority.clone(), Arc::new(InMemoryRoleStore::new()), vec![])
            .annotate(results(), &Principal::user("bob@x.com"))
            .await;

        assert_eq!(annotation.tier, AccessTier::Dataset);
        assert_eq!(flags(&annotation), vec![true, true, false, false, false]);
        // one call per distinct dataset, unparseable item never checked
        assert_eq!(authority.dataset_calls.load(Ordering::SeqCst), 3);

        let denied_raw = annotation
            .decisions
            .iter()
            .find(|d| d.resource_key == "not a table")
            .unwrap();
        assert!(!denied_raw.granted);
        let sales = annotation
            .decisions
            .iter()
            .find(|d| d.resource_key == "home.sales")
            .unwrap();
        assert!(sales.granted);
    }

    #[tokio::test]
    async fn total_outage_denies_everything() {
        let mut authority = FakeAuthority::new()
            .dataset("sales", None)
            .dataset("hr", None)
            .dataset("ops", None);
        authority.project_down = true;
        let annotation = annotator(Arc::new(authority), Arc::new(InMemoryRoleStore::new()), vec![])
            .annotate(results(), &Principal::user("bob@x.com"))
            .await;
        assert_eq!(annotation.granted_count(), 0);
        assert_eq!(annotation.items.len(), 5);
    }

    #[tokio::test]
    async fn accessible_tables_are_grouped() {
        let authority =
            Arc::new(FakeAuthority::new().dataset("sales", Some(&["user:bob@x.com"])));
        let accessible = annotator(authority, Arc::new(InMemoryRoleStore::new()), results())
            .list_accessible_tables(&Principal::user("bob@x.com"), None)
            .await;
        assert_eq!(accessible.tables.len(), 2);
        assert_eq!(
            accessible.grouped_by_dataset["home.sales"],
            vec!["customers".to_string(), "orders".to_string()]
        );
    }
}
