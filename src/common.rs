pub use std::{
    collections::{BTreeMap, BTreeSet, HashMap, VecDeque},
    env,
    fmt,
    fs::File,
    io::{BufReader, Write},
    sync::{Arc, Mutex},
    time::Duration,
};

pub use tokio::time::Instant;

pub use tokio_util::sync::CancellationToken;

pub use log::{error, info, warn};

pub use flexi_logger::{
    Age, Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming, Record,
};

pub use chrono::{DateTime, Utc};

pub use serde::{Deserialize, Serialize};

pub use serde_json::{json, Map, Value};

pub use dotenv::dotenv;

pub use elasticsearch::{
    auth::Credentials as EsCredentials,
    http::headers::HeaderMap,
    http::request::JsonBody,
    http::response::Response,
    http::transport::{MultiNodeConnectionPool, Transport, TransportBuilder},
    http::{Method, Url},
    indices::{
        IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesGetAliasParts,
        IndicesPutMappingParts,
    },
    Elasticsearch,
};

pub use anyhow::{anyhow, Context, Result};

pub use async_trait::async_trait;

pub use derive_new::new;
pub use getset::Getters;

pub use once_cell::sync::OnceCell as normalOnceCell;

/* Suffix appended to the final alias name while a concrete index is being replaced */
pub static TEMP_ALIAS_SUFFIX: &str = "_temp";

/* Timestamp layout used for generated destination index names */
pub static INDEX_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
