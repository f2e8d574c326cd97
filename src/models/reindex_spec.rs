use crate::common::*;

/// Parameters of one reindex submission. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Getters, Serialize)]
#[getset(get = "pub")]
pub struct ReindexSpec {
    source_index: String,
    destination_index: String,
    /// Optional document filter (query DSL, without the `query` wrapper).
    query: Option<Value>,
    /// Optional painless script source.
    script: Option<String>,
    /// Optional ingest pipeline applied on the destination.
    pipeline: Option<String>,
    batch_size: usize,
    slices: u32,
    requests_per_second: Option<f32>,
    wait_for_completion: bool,
}

impl ReindexSpec {
    pub fn builder(source_index: &str, destination_index: &str) -> ReindexSpecBuilder {
        ReindexSpecBuilder {
            spec: ReindexSpec {
                source_index: source_index.to_string(),
                destination_index: destination_index.to_string(),
                query: None,
                script: None,
                pipeline: None,
                batch_size: 1000,
                slices: 1,
                requests_per_second: None,
                wait_for_completion: false,
            },
        }
    }

    /// Request body for `POST _reindex`.
    pub fn to_request_body(&self) -> Value {
        let mut source: Value = json!({
            "index": self.source_index,
            "size": self.batch_size,
        });

        if let Some(query) = &self.query {
            source["query"] = query.clone();
        }

        let mut dest: Value = json!({ "index": self.destination_index });

        if let Some(pipeline) = &self.pipeline {
            dest["pipeline"] = json!(pipeline);
        }

        let mut body: Value = json!({ "source": source, "dest": dest });

        if let Some(script) = &self.script {
            body["script"] = json!({ "source": script, "lang": "painless" });
        }

        body
    }

    /// URL parameters for `POST _reindex`.
    pub fn to_query_params(&self) -> Vec<(&'static str, String)> {
        let mut params: Vec<(&'static str, String)> = vec![
            ("wait_for_completion", self.wait_for_completion.to_string()),
            ("slices", self.slices.to_string()),
        ];

        if let Some(rps) = self.requests_per_second {
            params.push(("requests_per_second", rps.to_string()));
        }

        params
    }
}

pub struct ReindexSpecBuilder {
    spec: ReindexSpec,
}

impl ReindexSpecBuilder {
    pub fn query(mut self, query: Option<Value>) -> Self {
        self.spec.query = query;
        self
    }

    pub fn script(mut self, script: Option<String>) -> Self {
        self.spec.script = script;
        self
    }

    pub fn pipeline(mut self, pipeline: Option<String>) -> Self {
        self.spec.pipeline = pipeline;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.spec.batch_size = batch_size.max(1);
        self
    }

    pub fn slices(mut self, slices: u32) -> Self {
        self.spec.slices = slices.max(1);
        self
    }

    pub fn requests_per_second(mut self, rps: Option<f32>) -> Self {
        self.spec.requests_per_second = rps;
        self
    }

    pub fn wait_for_completion(mut self, wait: bool) -> Self {
        self.spec.wait_for_completion = wait;
        self
    }

    pub fn build(self) -> ReindexSpec {
        self.spec
    }
}

/// Opaque id of an asynchronous cluster task (`"<node>:<number>"`).
///
/// Created at submission, polled until terminal, then dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle(String);

impl TaskHandle {
    pub fn new(id: impl Into<String>) -> Self {
        TaskHandle(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What `POST _reindex` answered.
#[derive(Debug, Clone, PartialEq)]
pub enum ReindexSubmission {
    /// `wait_for_completion=false`: the cluster started a task.
    Task(TaskHandle),
    /// `wait_for_completion=true`: the full reindex response.
    Completed(Value),
}
