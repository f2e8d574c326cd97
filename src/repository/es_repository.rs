//! Elasticsearch repository implementation.
//!
//! This module is the cluster gateway of the migration engine: every call the
//! engine makes against the search cluster goes through [`EsRepository`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      EsRepositoryImpl                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │              Elasticsearch Client                       │    │
//! │  │         (Multi-node Connection Pool)                    │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │                            │                                    │
//! │     ┌──────────────┬───────┴───────┬──────────────┐             │
//! │     ▼              ▼               ▼              ▼             │
//! │ ┌────────┐   ┌──────────┐   ┌────────────┐  ┌──────────┐        │
//! │ │ Index  │   │ Mapping  │   │  Aliases   │  │ Reindex  │        │
//! │ │ admin  │   │  write   │   │ (batched)  │  │ + _tasks │        │
//! │ └────────┘   └──────────┘   └────────────┘  └──────────┘        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Error model
//!
//! Every method returns [`GatewayError`]: `Transport` when no HTTP answer came
//! back, `Rejected` when the cluster answered with a non-success status. The
//! gateway never guesses what a rejection means; the alias lookup is the only
//! call with a dedicated not-found answer ([`AliasLookup::NotFound`]).
//!
//! # Environment Variables
//!
//! | Variable   | Description                              | Example                          |
//! |------------|------------------------------------------|----------------------------------|
//! | `ES_DB_URL`| Comma-separated list of ES hosts         | `host1:9200,host2:9200`          |
//! | `ES_ID`    | Elasticsearch username (optional)        | `elastic`                        |
//! | `ES_PW`    | Elasticsearch password (optional)        | `password`                       |

use crate::{app_config::AppConfig, common::*};

use crate::enums::AliasAction;
use crate::errors::GatewayError;
use crate::models::{AliasBinding, AliasLookup, ReindexSpec, ReindexSubmission, TaskHandle};

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Cluster operations the migration engine depends on.
///
/// # Implementors
///
/// - [`EsRepositoryImpl`] - Production implementation with real ES client
/// - `MockEsRepository` - In-memory cluster with fault injection (tests only)
#[async_trait]
pub trait EsRepository: Send + Sync {
    /// `true` if `name` is a concrete index or an alias.
    async fn index_exists(&self, name: &str) -> GatewayResult<bool>;

    /// Looks `name` up as an alias.
    ///
    /// A 404 from the cluster is [`AliasLookup::NotFound`]; every other
    /// non-success answer is an error.
    async fn get_alias(&self, name: &str) -> GatewayResult<AliasLookup>;

    /// Writes `mapping` onto `index` (an index or an alias) in place.
    async fn put_mapping(
        &self,
        index: &str,
        mapping: &Value,
        write_index_only: bool,
    ) -> GatewayResult<()>;

    async fn create_index(&self, name: &str, mapping: &Value) -> GatewayResult<()>;

    async fn delete_index(&self, name: &str) -> GatewayResult<()>;

    /// Submits all `actions` in one `_aliases` call; the cluster applies all or none.
    async fn update_aliases_atomic(&self, actions: &[AliasAction]) -> GatewayResult<()>;

    async fn submit_reindex(&self, spec: &ReindexSpec) -> GatewayResult<ReindexSubmission>;

    /// Raw `GET _tasks/<id>` body.
    async fn get_task_status(&self, handle: &TaskHandle) -> GatewayResult<Value>;
}

/// Concrete implementation of the Elasticsearch repository.
///
/// # Connection Pool
///
/// Uses a round-robin multi-node connection pool:
/// - Distributes requests across all configured nodes
/// - Per-request timeout taken from [`AppConfig::request_timeout`]
///
/// # Authentication
///
/// Basic authentication is used when both the username and the password are non-empty.
#[derive(Debug, Getters, Clone)]
pub struct EsRepositoryImpl {
    /// The Elasticsearch client instance.
    es_client: Elasticsearch,
}

impl EsRepositoryImpl {
    /// Creates a new `EsRepositoryImpl` from the global [`AppConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No host is configured
    /// - Host URLs cannot be parsed
    /// - Transport cannot be built
    pub fn new() -> anyhow::Result<Self> {
        let app_config: &AppConfig = AppConfig::global()?;

        let es_host: Vec<String> = app_config
            .es_db_url()
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();

        if es_host.is_empty() {
            return Err(anyhow!("[EsRepositoryImpl::new] no Elasticsearch host configured"));
        }

        let es_id: String = app_config.es_id().to_string();
        let es_pw: String = app_config.es_pw().to_string();

        // Hosts may be given with or without a scheme
        let cluster_urls: Vec<Url> = es_host
            .iter()
            .map(|host| {
                if host.starts_with("http://") || host.starts_with("https://") {
                    Url::parse(host)
                } else {
                    Url::parse(&format!("http://{}", host))
                }
            })
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| anyhow!("[EsRepositoryImpl::new] {:?}", e))?;

        let conn_pool: MultiNodeConnectionPool =
            MultiNodeConnectionPool::round_robin(cluster_urls, None);

        let mut builder: TransportBuilder = TransportBuilder::new(conn_pool)
            .timeout(Duration::from_secs(*app_config.request_timeout_secs()));

        if !es_id.is_empty() && !es_pw.is_empty() {
            builder = builder.auth(EsCredentials::Basic(es_id, es_pw));
        }

        let transport: Transport = builder
            .build()
            .map_err(|e| anyhow!("[EsRepositoryImpl::new] {:?}", e))?;

        let es_client: Elasticsearch = Elasticsearch::new(transport);

        Ok(EsRepositoryImpl { es_client })
    }

    /// Turns a non-success response into [`GatewayError::Rejected`].
    async fn ensure_success(response: Response, context: &str) -> GatewayResult<Response> {
        let status: u16 = response.status_code().as_u16();

        if response.status_code().is_success() {
            return Ok(response);
        }

        let error_body: String = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {}>", e));

        error!("[EsRepositoryImpl::{}] status: {}, body: {}", context, status, error_body);

        Err(GatewayError::rejected(status, error_body))
    }

    async fn read_json(response: Response, context: &str) -> GatewayResult<Value> {
        response.json::<Value>().await.map_err(|e| {
            GatewayError::Malformed(format!("[EsRepositoryImpl::{}] {}", context, e))
        })
    }

    fn transport_error(context: &str, err: elasticsearch::Error) -> GatewayError {
        GatewayError::Transport(format!("[EsRepositoryImpl::{}] {}", context, err))
    }

    /// `acknowledged: false` means the cluster did not apply the change in time.
    async fn ensure_acknowledged(response: Response, context: &str) -> GatewayResult<()> {
        let body: Value = Self::read_json(response, context).await?;

        if body["acknowledged"] == true {
            Ok(())
        } else {
            Err(GatewayError::Malformed(format!(
                "[EsRepositoryImpl::{}] request not acknowledged: {}",
                context, body
            )))
        }
    }
}

#[async_trait]
impl EsRepository for EsRepositoryImpl {
    async fn index_exists(&self, name: &str) -> GatewayResult<bool> {
        let response: Response = self
            .es_client
            .indices()
            .exists(IndicesExistsParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| Self::transport_error("index_exists", e))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            _ => Self::ensure_success(response, "index_exists")
                .await
                .map(|_| true),
        }
    }

    async fn get_alias(&self, name: &str) -> GatewayResult<AliasLookup> {
        let response: Response = self
            .es_client
            .indices()
            .get_alias(IndicesGetAliasParts::Name(&[name]))
            .send()
            .await
            .map_err(|e| Self::transport_error("get_alias", e))?;

        if response.status_code().as_u16() == 404 {
            return Ok(AliasLookup::NotFound);
        }

        let response: Response = Self::ensure_success(response, "get_alias").await?;
        let body: Value = Self::read_json(response, "get_alias").await?;

        Ok(AliasLookup::Found(AliasBinding::from_get_alias_response(
            name, &body,
        )))
    }

    async fn put_mapping(
        &self,
        index: &str,
        mapping: &Value,
        write_index_only: bool,
    ) -> GatewayResult<()> {
        let response: Response = self
            .es_client
            .indices()
            .put_mapping(IndicesPutMappingParts::Index(&[index]))
            .write_index_only(write_index_only)
            .body(mapping)
            .send()
            .await
            .map_err(|e| Self::transport_error("put_mapping", e))?;

        let response: Response = Self::ensure_success(response, "put_mapping").await?;
        Self::ensure_acknowledged(response, "put_mapping").await?;

        info!(
            "[EsRepositoryImpl::put_mapping] Mapping updated in place: {}",
            index
        );

        Ok(())
    }

    async fn create_index(&self, name: &str, mapping: &Value) -> GatewayResult<()> {
        let body: Value = json!({ "mappings": mapping });

        let response: Response = self
            .es_client
            .indices()
            .create(IndicesCreateParts::Index(name))
            .body(body)
            .send()
            .await
            .map_err(|e| Self::transport_error("create_index", e))?;

        let response: Response = Self::ensure_success(response, "create_index").await?;
        Self::ensure_acknowledged(response, "create_index").await?;

        info!(
            "[EsRepositoryImpl::create_index] Successfully created index: {}",
            name
        );

        Ok(())
    }

    async fn delete_index(&self, name: &str) -> GatewayResult<()> {
        let response: Response = self
            .es_client
            .indices()
            .delete(IndicesDeleteParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| Self::transport_error("delete_index", e))?;

        let response: Response = Self::ensure_success(response, "delete_index").await?;
        Self::ensure_acknowledged(response, "delete_index").await?;

        info!(
            "[EsRepositoryImpl::delete_index] Successfully deleted index: {}",
            name
        );

        Ok(())
    }

    async fn update_aliases_atomic(&self, actions: &[AliasAction]) -> GatewayResult<()> {
        let body: Value = json!({
            "actions": actions.iter().map(AliasAction::to_request_json).collect::<Vec<Value>>()
        });

        let response: Response = self
            .es_client
            .indices()
            .update_aliases()
            .body(body)
            .send()
            .await
            .map_err(|e| Self::transport_error("update_aliases_atomic", e))?;

        let response: Response = Self::ensure_success(response, "update_aliases_atomic").await?;
        Self::ensure_acknowledged(response, "update_aliases_atomic").await?;

        for action in actions {
            info!("[EsRepositoryImpl::update_aliases_atomic] {}", action);
        }

        Ok(())
    }

    async fn submit_reindex(&self, spec: &ReindexSpec) -> GatewayResult<ReindexSubmission> {
        let query_params: Vec<(&'static str, String)> = spec.to_query_params();

        let response: Response = self
            .es_client
            .send(
                Method::Post,
                "/_reindex",
                HeaderMap::new(),
                Some(&query_params),
                Some(JsonBody::new(spec.to_request_body())),
                None,
            )
            .await
            .map_err(|e| Self::transport_error("submit_reindex", e))?;

        let response: Response = Self::ensure_success(response, "submit_reindex").await?;
        let body: Value = Self::read_json(response, "submit_reindex").await?;

        if *spec.wait_for_completion() {
            return Ok(ReindexSubmission::Completed(body));
        }

        let task_id: &str = body["task"].as_str().ok_or_else(|| {
            GatewayError::Malformed(format!(
                "[EsRepositoryImpl::submit_reindex] response has no task id: {}",
                body
            ))
        })?;

        info!(
            "[EsRepositoryImpl::submit_reindex] {} -> {} started as task {}",
            spec.source_index(),
            spec.destination_index(),
            task_id
        );

        Ok(ReindexSubmission::Task(TaskHandle::new(task_id)))
    }

    async fn get_task_status(&self, handle: &TaskHandle) -> GatewayResult<Value> {
        let path: String = format!("/_tasks/{}", handle.id());

        let response: Response = self
            .es_client
            .send(
                Method::Get,
                &path,
                HeaderMap::new(),
                None::<&()>,
                None::<JsonBody<Value>>,
                None,
            )
            .await
            .map_err(|e| Self::transport_error("get_task_status", e))?;

        let response: Response = Self::ensure_success(response, "get_task_status").await?;
        Self::read_json(response, "get_task_status").await
    }
}
