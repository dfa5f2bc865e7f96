use std::path::Path;

use anyhow::{Context, Result, anyhow};

use super::model::GraphPayload;
use super::normalize::normalize;
use super::parse::parse_payload;

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn read_source(source: &str) -> Result<String> {
    if is_remote(source) {
        let response = reqwest::blocking::get(source)
            .with_context(|| format!("failed to request graph from {source}"))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("graph request to {source} returned HTTP {status}"));
        }
        return response
            .text()
            .with_context(|| format!("graph response from {source} was not valid text"));
    }

    let path = source.strip_prefix("file://").unwrap_or(source);
    std::fs::read_to_string(Path::new(path))
        .with_context(|| format!("failed to read graph file {path}"))
}

/// Reads, parses and normalizes the graph behind `source` (a path or URL).
pub fn load_payload(source: &str) -> Result<GraphPayload> {
    log::info!("loading graph payload from {source}");

    let raw = read_source(source)?;
    let (nodes, edges) =
        parse_payload(&raw).with_context(|| format!("failed to parse graph from {source}"))?;
    let (nodes, edges) = normalize(nodes, edges);

    log::info!(
        "graph payload ready: {} nodes, {} edges",
        nodes.len(),
        edges.len()
    );
    Ok(GraphPayload { nodes, edges })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_and_normalizes_a_local_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"nodes": [
                {{"id": "v1", "type": "video", "title": "clip"}},
                {{"id": "u1", "type": "user", "subscriber_count": "9"}},
                {{"id": "v1", "type": "video", "title": "clip (edited)"}}
            ],
            "edges": [{{"source": "u1", "target": "v1", "like_count": 2, "comment": "nice"}}]}}"#
        )
        .expect("write payload");

        let payload = load_payload(file.path().to_str().expect("utf-8 path")).expect("loads");

        assert_eq!(payload.nodes.len(), 2);
        assert_eq!(payload.nodes[0].id, "u1");
        assert_eq!(payload.nodes[1].label(), "clip (edited)");
        assert_eq!(payload.edges.len(), 1);
    }

    #[test]
    fn bundled_sample_graph_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/sample_graph.json");
        let payload = load_payload(path).expect("sample graph loads");

        assert_eq!(payload.nodes.len(), 14);
        assert!(payload.nodes[..10].iter().all(|node| !node.is_video()));
        assert_eq!(payload.edges.len(), 16);
    }

    #[test]
    fn missing_file_reports_the_path() {
        let error = load_payload("/definitely/not/here.json").expect_err("missing file");
        assert!(format!("{error:#}").contains("/definitely/not/here.json"));
    }
}
