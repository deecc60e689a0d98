use std::path::Path;

use serde_json::{json, Value};

/// PDAL pipeline that reads `input` and writes its positions as headerless `X,Y,Z` CSV to `output`
pub fn xyz_export_pipeline(input: &Path, output: &Path) -> Value {
    json!({
        "pipeline": [
            {
                "type": "readers.las",
                "filename": input.to_string_lossy(),
            },
            {
                "type": "writers.text",
                "filename": output.to_string_lossy(),
                "format": "csv",
                "order": "X,Y,Z",
                "keep_unspecified": false,
                "write_header": false,
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_stages() {
        let pipeline = xyz_export_pipeline(Path::new("/data/6_Buildings.laz"), Path::new("/tmp/out.csv"));
        let stages = pipeline["pipeline"].as_array().unwrap();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0]["type"], "readers.las");
        assert_eq!(stages[0]["filename"], "/data/6_Buildings.laz");
        assert_eq!(stages[1]["type"], "writers.text");
        assert_eq!(stages[1]["order"], "X,Y,Z");
        assert_eq!(stages[1]["write_header"], false);
    }
}
