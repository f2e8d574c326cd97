//! In-memory cluster used by the engine tests.
//!
//! Models just enough of the cluster to exercise the migration engine:
//! concrete indices with their mappings, aliases, field-type conflicts on
//! in-place mapping writes, all-or-nothing alias batches, reindex submission
//! and scripted task-status answers. Any call can be made to fail, either
//! always or only on its N-th invocation.

use crate::common::*;

use crate::enums::AliasAction;
use crate::errors::GatewayError;
use crate::models::{AliasBinding, AliasLookup, ReindexSpec, ReindexSubmission, TaskHandle};
use crate::repository::es_repository::{EsRepository, GatewayResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    IndexExists,
    GetAlias,
    PutMapping,
    CreateIndex,
    DeleteIndex,
    UpdateAliases,
    SubmitReindex,
    GetTaskStatus,
}

#[derive(Debug, Clone)]
struct Fault {
    op: GatewayOp,
    /// 1-based call number to fail; `None` fails every call.
    nth: Option<usize>,
    error: GatewayError,
}

#[derive(Debug, Clone, Default)]
struct ClusterState {
    indices: BTreeMap<String, Value>,
    aliases: BTreeMap<String, BTreeSet<String>>,
}

impl ClusterState {
    fn resolve(&self, name: &str) -> Vec<String> {
        if self.indices.contains_key(name) {
            vec![name.to_string()]
        } else {
            self.aliases
                .get(name)
                .map(|targets| targets.iter().cloned().collect())
                .unwrap_or_default()
        }
    }

    fn apply(&mut self, action: &AliasAction) -> GatewayResult<()> {
        match action {
            AliasAction::Add { index, alias } => {
                if !self.indices.contains_key(index) {
                    return Err(GatewayError::rejected(
                        404,
                        format!("index_not_found_exception: no such index [{}]", index),
                    ));
                }
                if self.indices.contains_key(alias) {
                    return Err(GatewayError::rejected(
                        400,
                        format!(
                            "invalid_alias_name_exception: an index exists with the same name as the alias [{}]",
                            alias
                        ),
                    ));
                }
                self.aliases
                    .entry(alias.clone())
                    .or_default()
                    .insert(index.clone());
            }
            AliasAction::Remove { index, alias } => {
                let removed: bool = self
                    .aliases
                    .get_mut(alias)
                    .map(|targets| targets.remove(index))
                    .unwrap_or(false);

                if !removed {
                    return Err(GatewayError::rejected(
                        404,
                        format!("aliases_not_found_exception: aliases [{}] missing", alias),
                    ));
                }
                if self.aliases.get(alias).map_or(false, BTreeSet::is_empty) {
                    self.aliases.remove(alias);
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MockInner {
    state: ClusterState,
    faults: Vec<Fault>,
    calls: HashMap<GatewayOp, usize>,
    call_log: Vec<String>,
    task_script: VecDeque<GatewayResult<Value>>,
    sync_response: Option<Value>,
    submitted: Vec<ReindexSpec>,
    next_task: u64,
}

#[derive(Debug, Default)]
pub struct MockEsRepository {
    inner: Mutex<MockInner>,
}

impl MockEsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(self, name: &str, mapping: Value) -> Self {
        self.lock().state.indices.insert(name.to_string(), mapping);
        self
    }

    pub fn with_alias(self, alias: &str, indices: &[&str]) -> Self {
        {
            let mut inner = self.lock();
            let targets: &mut BTreeSet<String> =
                inner.state.aliases.entry(alias.to_string()).or_default();
            for index in indices {
                targets.insert(index.to_string());
            }
        }
        self
    }

    /// Makes the `nth` call (1-based) of `op` fail, or every call when `nth` is `None`.
    pub fn fail_call(&self, op: GatewayOp, nth: Option<usize>, error: GatewayError) {
        self.lock().faults.push(Fault { op, nth, error });
    }

    /// Answers for successive `get_task_status` calls. Once exhausted the
    /// task reports as completed without failures.
    pub fn script_task_statuses(&self, answers: Vec<GatewayResult<Value>>) {
        self.lock().task_script = answers.into_iter().collect();
    }

    pub fn set_sync_response(&self, response: Value) {
        self.lock().sync_response = Some(response);
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.lock().state.indices.contains_key(name)
    }

    pub fn index_names(&self) -> Vec<String> {
        self.lock().state.indices.keys().cloned().collect()
    }

    pub fn mapping_of(&self, name: &str) -> Option<Value> {
        self.lock().state.indices.get(name).cloned()
    }

    pub fn alias_targets(&self, alias: &str) -> Option<BTreeSet<String>> {
        self.lock().state.aliases.get(alias).cloned()
    }

    pub fn calls(&self, op: GatewayOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn call_log(&self) -> Vec<String> {
        self.lock().call_log.clone()
    }

    pub fn submitted(&self) -> Vec<ReindexSpec> {
        self.lock().submitted.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Counts the call and returns the injected fault for it, if any.
    fn enter(inner: &mut MockInner, op: GatewayOp, detail: &str) -> GatewayResult<()> {
        let count: usize = {
            let counter: &mut usize = inner.calls.entry(op).or_insert(0);
            *counter += 1;
            *counter
        };

        inner.call_log.push(format!("{:?}({})", op, detail));

        match inner
            .faults
            .iter()
            .find(|fault| fault.op == op && fault.nth.map_or(true, |nth| nth == count))
        {
            Some(fault) => Err(fault.error.clone()),
            None => Ok(()),
        }
    }

    fn field_conflict(existing: &Value, incoming: &Value) -> Option<String> {
        let old_props: &Map<String, Value> = existing.get("properties")?.as_object()?;
        let new_props: &Map<String, Value> = incoming.get("properties")?.as_object()?;

        new_props.iter().find_map(|(field, definition)| {
            let old_type: &str = old_props.get(field)?.get("type")?.as_str()?;
            let new_type: &str = definition.get("type")?.as_str()?;
            (old_type != new_type).then(|| {
                format!(
                    "illegal_argument_exception: mapper [{}] cannot be changed from type [{}] to [{}]",
                    field, old_type, new_type
                )
            })
        })
    }

    fn merge_properties(existing: &mut Value, incoming: &Value) {
        if let Some(new_props) = incoming.get("properties").and_then(Value::as_object) {
            if !existing["properties"].is_object() {
                existing["properties"] = json!({});
            }
            if let Some(props) = existing["properties"].as_object_mut() {
                for (field, definition) in new_props {
                    props.insert(field.clone(), definition.clone());
                }
            }
        }
        if let Some(obj) = incoming.as_object() {
            for (key, value) in obj.iter().filter(|(key, _)| *key != "properties") {
                existing[key.as_str()] = value.clone();
            }
        }
    }
}

#[async_trait]
impl EsRepository for MockEsRepository {
    async fn index_exists(&self, name: &str) -> GatewayResult<bool> {
        let mut inner = self.lock();
        Self::enter(&mut inner, GatewayOp::IndexExists, name)?;
        Ok(inner.state.indices.contains_key(name) || inner.state.aliases.contains_key(name))
    }

    async fn get_alias(&self, name: &str) -> GatewayResult<AliasLookup> {
        let mut inner = self.lock();
        Self::enter(&mut inner, GatewayOp::GetAlias, name)?;

        match inner.state.aliases.get(name) {
            Some(targets) => Ok(AliasLookup::Found(AliasBinding::new(
                name.to_string(),
                targets.clone(),
            ))),
            None => Ok(AliasLookup::NotFound),
        }
    }

    async fn put_mapping(
        &self,
        index: &str,
        mapping: &Value,
        write_index_only: bool,
    ) -> GatewayResult<()> {
        let mut inner = self.lock();
        Self::enter(&mut inner, GatewayOp::PutMapping, index)?;

        let mut targets: Vec<String> = inner.state.resolve(index);
        if targets.is_empty() {
            return Err(GatewayError::rejected(
                404,
                format!("index_not_found_exception: no such index [{}]", index),
            ));
        }
        if write_index_only {
            targets.truncate(1);
        }

        for target in &targets {
            if let Some(conflict) = inner
                .state
                .indices
                .get(target)
                .and_then(|existing| Self::field_conflict(existing, mapping))
            {
                return Err(GatewayError::rejected(400, conflict));
            }
        }

        for target in &targets {
            if let Some(existing) = inner.state.indices.get_mut(target) {
                Self::merge_properties(existing, mapping);
            }
        }

        Ok(())
    }

    async fn create_index(&self, name: &str, mapping: &Value) -> GatewayResult<()> {
        let mut inner = self.lock();
        Self::enter(&mut inner, GatewayOp::CreateIndex, name)?;

        if inner.state.indices.contains_key(name) || inner.state.aliases.contains_key(name) {
            return Err(GatewayError::rejected(
                400,
                format!("resource_already_exists_exception: index [{}] already exists", name),
            ));
        }

        inner.state.indices.insert(name.to_string(), mapping.clone());
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> GatewayResult<()> {
        let mut inner = self.lock();
        Self::enter(&mut inner, GatewayOp::DeleteIndex, name)?;

        if inner.state.indices.remove(name).is_none() {
            return Err(GatewayError::rejected(
                404,
                format!("index_not_found_exception: no such index [{}]", name),
            ));
        }

        // Aliases pointing at a deleted index disappear with it.
        for targets in inner.state.aliases.values_mut() {
            targets.remove(name);
        }
        inner.state.aliases.retain(|_, targets| !targets.is_empty());

        Ok(())
    }

    async fn update_aliases_atomic(&self, actions: &[AliasAction]) -> GatewayResult<()> {
        let mut inner = self.lock();
        let detail: String = actions
            .iter()
            .map(|action| action.to_string())
            .collect::<Vec<String>>()
            .join(", ");
        Self::enter(&mut inner, GatewayOp::UpdateAliases, &detail)?;

        // Apply to a scratch copy; commit only if every action succeeded.
        let mut scratch: ClusterState = inner.state.clone();
        for action in actions {
            scratch.apply(action)?;
        }
        inner.state = scratch;

        Ok(())
    }

    async fn submit_reindex(&self, spec: &ReindexSpec) -> GatewayResult<ReindexSubmission> {
        let mut inner = self.lock();
        let detail: String = format!("{} -> {}", spec.source_index(), spec.destination_index());
        Self::enter(&mut inner, GatewayOp::SubmitReindex, &detail)?;

        if !inner.state.indices.contains_key(spec.source_index()) {
            return Err(GatewayError::rejected(
                404,
                format!("index_not_found_exception: no such index [{}]", spec.source_index()),
            ));
        }

        inner.submitted.push(spec.clone());

        if *spec.wait_for_completion() {
            let response: Value = inner
                .sync_response
                .clone()
                .unwrap_or_else(|| json!({ "took": 1, "total": 0, "created": 0, "failures": [] }));
            return Ok(ReindexSubmission::Completed(response));
        }

        inner.next_task += 1;
        Ok(ReindexSubmission::Task(TaskHandle::new(format!(
            "mock-node:{}",
            inner.next_task
        ))))
    }

    async fn get_task_status(&self, handle: &TaskHandle) -> GatewayResult<Value> {
        let mut inner = self.lock();
        Self::enter(&mut inner, GatewayOp::GetTaskStatus, handle.id())?;

        match inner.task_script.pop_front() {
            Some(answer) => answer,
            None => Ok(json!({
                "completed": true,
                "task": { "status": { "total": 0, "created": 0 } },
                "response": { "total": 0, "created": 0, "failures": [] }
            })),
        }
    }
}
