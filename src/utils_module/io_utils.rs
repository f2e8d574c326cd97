use crate::common::*;

#[doc = "Functions that read the json file and return it in json value format"]
/// # Arguments
/// * file_path - Path the json file
///
/// # Returns
/// * Result<Value, anyhow::Error>
pub fn read_json_from_file(file_path: &str) -> Result<Value, anyhow::Error> {
    let file: File = File::open(file_path)
        .with_context(|| format!("[read_json_from_file] Cannot open '{}'", file_path))?;
    let reader: BufReader<File> = BufReader::new(file);
    let json_body: Value = serde_json::from_reader(reader)
        .with_context(|| format!("[read_json_from_file] '{}' is not valid JSON", file_path))?;

    Ok(json_body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str, contents: &str) -> String {
        let path = std::env::temp_dir().join(format!(
            "index_migrator_{}_{}",
            std::process::id(),
            name
        ));
        std::fs::write(&path, contents).expect("write scratch file");
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn reads_json_file() {
        let path: String = scratch_file("ok.json", r#"{"mappings":{"properties":{}}}"#);
        let value: Value = read_json_from_file(&path).expect("valid json");
        assert!(value["mappings"].is_object());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn reports_missing_and_broken_files() {
        assert!(read_json_from_file("/definitely/not/here.json").is_err());

        let path: String = scratch_file("broken.json", "{ not json");
        let err = read_json_from_file(&path).expect_err("broken json");
        assert!(err.to_string().contains("not valid JSON"));
        let _ = std::fs::remove_file(path);
    }
}
