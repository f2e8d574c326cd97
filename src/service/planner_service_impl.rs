use crate::common::*;

use crate::enums::MigrationStep;
use crate::errors::{GatewayError, MigrationError};
use crate::models::{AliasLookup, MappingDocument, MigrationPlan};
use crate::repository::es_repository::*;
use crate::service_trait::planner_service::*;

#[derive(Debug, Getters, Clone, new)]
pub struct PlannerServiceImpl<R: EsRepository> {
    es_repo: Arc<R>,
}

impl<R: EsRepository> PlannerServiceImpl<R> {
    /// A 4xx answer (or an unacknowledged write) means the cluster refused the
    /// mapping. Anything transient means we never learned the answer.
    fn in_place_result(
        target: &str,
        result: std::result::Result<(), GatewayError>,
    ) -> Result<std::result::Result<(), String>, MigrationError> {
        match result {
            Ok(()) => Ok(Ok(())),
            Err(err) if err.is_transient() => Err(MigrationError::cluster(
                MigrationStep::InPlaceUpdate,
                target,
                err,
            )),
            Err(err) => Ok(Err(err.to_string())),
        }
    }
}

#[async_trait]
impl<R> PlannerService for PlannerServiceImpl<R>
where
    R: EsRepository + Sync + Send,
{
    async fn plan(
        &self,
        target: &str,
        mapping: &MappingDocument,
        force_alias: bool,
        zero_downtime_allowed: bool,
        write_index_only: bool,
    ) -> Result<MigrationPlan, MigrationError> {
        info!(
            "[PlannerServiceImpl::plan] Trying in-place mapping update on '{}' (fields: {:?})",
            target,
            mapping.field_names()
        );

        let in_place: std::result::Result<(), String> = Self::in_place_result(
            target,
            self.es_repo
                .put_mapping(target, mapping.as_value(), write_index_only)
                .await,
        )?;

        match &in_place {
            Ok(()) => info!("[PlannerServiceImpl::plan] In-place update of '{}' accepted", target),
            Err(cause) => warn!(
                "[PlannerServiceImpl::plan] In-place update of '{}' rejected: {}",
                target, cause
            ),
        }

        let target_is_alias: bool = if force_alias {
            match self.es_repo.get_alias(target).await {
                Ok(lookup) => lookup.is_alias(),
                Err(err) => {
                    error!(
                        "[PlannerServiceImpl::plan] Could not tell whether '{}' is an alias: {}",
                        target, err
                    );
                    return Err(MigrationError::cluster(
                        MigrationStep::AliasLookup,
                        target,
                        err,
                    ));
                }
            }
        } else {
            false
        };

        let plan: MigrationPlan =
            MigrationPlan::decide(in_place, force_alias, zero_downtime_allowed, target_is_alias);

        info!("[PlannerServiceImpl::plan] Plan for '{}': {}", target, plan);

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::repository::mock_es_repository::*;

    fn products_cluster() -> MockEsRepository {
        MockEsRepository::new().with_index(
            "products",
            json!({ "properties": { "price": { "type": "long" } } }),
        )
    }

    fn mapping(price_type: &str) -> MappingDocument {
        MappingDocument::normalize(&json!({
            "mappings": { "properties": { "price": { "type": price_type } } }
        }))
        .expect("valid mapping")
    }

    #[tokio::test]
    async fn compatible_mapping_is_applied_in_place() {
        let cluster: Arc<MockEsRepository> = Arc::new(products_cluster());
        let planner = PlannerServiceImpl::new(cluster.clone());

        let plan: MigrationPlan = planner
            .plan("products", &mapping("long"), false, false, false)
            .await
            .expect("plan");

        assert_eq!(plan, MigrationPlan::InPlaceSucceeded);
        assert_eq!(cluster.calls(GatewayOp::GetAlias), 0);
    }

    #[tokio::test]
    async fn force_alias_on_concrete_index_forces_reindex() {
        let cluster: Arc<MockEsRepository> = Arc::new(products_cluster());
        let planner = PlannerServiceImpl::new(cluster.clone());

        let plan: MigrationPlan = planner
            .plan("products", &mapping("long"), true, false, false)
            .await
            .expect("plan");

        assert_eq!(plan, MigrationPlan::ReindexForcedByAliasRequirement);
        assert_eq!(cluster.calls(GatewayOp::GetAlias), 1);
    }

    #[tokio::test]
    async fn incompatible_mapping_without_zero_downtime_is_refused() {
        let cluster: Arc<MockEsRepository> = Arc::new(products_cluster());
        let planner = PlannerServiceImpl::new(cluster.clone());

        let plan: MigrationPlan = planner
            .plan("products", &mapping("keyword"), false, false, false)
            .await
            .expect("plan");

        assert!(matches!(
            plan,
            MigrationPlan::ReindexDisallowedAndInPlaceFailed(ref cause) if cause.contains("price")
        ));
    }

    #[tokio::test]
    async fn alias_probe_error_is_not_treated_as_not_an_alias() {
        let cluster: Arc<MockEsRepository> = Arc::new(products_cluster());
        cluster.fail_call(
            GatewayOp::GetAlias,
            None,
            GatewayError::rejected(403, "security_exception"),
        );
        let planner = PlannerServiceImpl::new(cluster.clone());

        let err: MigrationError = planner
            .plan("products", &mapping("long"), true, false, false)
            .await
            .expect_err("probe failure must surface");

        assert!(matches!(
            err,
            MigrationError::ClusterFatal { step: MigrationStep::AliasLookup, .. }
        ));
    }

    #[tokio::test]
    async fn transport_failure_on_in_place_write_is_fatal() {
        let cluster: Arc<MockEsRepository> = Arc::new(products_cluster());
        cluster.fail_call(
            GatewayOp::PutMapping,
            None,
            GatewayError::Transport("connection refused".into()),
        );
        let planner = PlannerServiceImpl::new(cluster.clone());

        let err: MigrationError = planner
            .plan("products", &mapping("long"), false, true, false)
            .await
            .expect_err("transport failure must surface");

        assert!(matches!(
            err,
            MigrationError::ClusterFatal { step: MigrationStep::InPlaceUpdate, .. }
        ));
    }
}
