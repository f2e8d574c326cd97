use crate::common::*;

/// `{base}_{YYYYMMDDHHMMSS}` in UTC.
///
/// The base is the target name as given, with no version segment: alias
/// `products_alias` yields `products_alias_20240309070501`.
///
/// Two runs on the same base within one second produce the same name; the
/// second `create_index` is then rejected by the cluster.
pub fn timestamped_index_name(base: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}", base, now.format(INDEX_TIMESTAMP_FORMAT))
}
