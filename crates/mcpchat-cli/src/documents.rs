//! `@name` document mentions.
//!
//! Mentionable names come from the resources advertised by connected MCP
//! servers. A JSON resource holding an array of ids (such as the document
//! server's `docs://documents`) also makes each `{uri}/{id}` mentionable.

use mcpchat_mcp::{McpManager, McpResourceInfo};
use std::collections::BTreeMap;

/// Where a mentionable document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub server: String,
    pub uri: String,
}

/// Mentionable documents keyed by name. The first server to claim a name keeps it.
#[derive(Debug, Default)]
pub struct DocumentIndex {
    docs: BTreeMap<String, DocumentRef>,
}

impl DocumentIndex {
    /// Collect document names from every connected server.
    pub async fn build(manager: &McpManager) -> Self {
        let mut index = Self::default();
        for (client, resource) in manager.resources() {
            index.insert_resource(client.server_name(), &resource);
            if resource.mime_type.as_deref() != Some("application/json") {
                continue;
            }
            match client.read_resource_text(&resource.uri).await {
                Ok(text) => index.insert_listing(client.server_name(), &resource.uri, &text),
                Err(e) => tracing::warn!("Failed to read document listing {}: {e}", resource.uri),
            }
        }
        tracing::debug!("Indexed {} mentionable documents", index.len());
        index
    }

    fn insert_resource(&mut self, server: &str, resource: &McpResourceInfo) {
        self.insert(&resource.name, server, &resource.uri);
        if let Some(suffix) = uri_suffix(&resource.uri) {
            self.insert(suffix, server, &resource.uri);
        }
    }

    fn insert_listing(&mut self, server: &str, base_uri: &str, text: &str) {
        let ids: Vec<String> = match serde_json::from_str(text) {
            Ok(ids) => ids,
            Err(e) => {
                tracing::debug!("{base_uri} is not a document listing: {e}");
                return;
            }
        };
        let base = base_uri.trim_end_matches('/');
        for id in ids {
            self.insert(&id, server, &format!("{base}/{id}"));
        }
    }

    fn insert(&mut self, name: &str, server: &str, uri: &str) {
        if name.is_empty() {
            return;
        }
        self.docs
            .entry(name.to_string())
            .or_insert_with(|| DocumentRef {
                server: server.to_string(),
                uri: uri.to_string(),
            });
    }

    pub fn get(&self, name: &str) -> Option<&DocumentRef> {
        self.docs.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DocumentRef)> {
        self.docs.iter().map(|(name, doc)| (name.as_str(), doc))
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

fn uri_suffix(uri: &str) -> Option<&str> {
    uri.rsplit('/').next().filter(|s| !s.is_empty() && *s != uri)
}

/// Names mentioned as `@name`, in order of first appearance.
pub fn extract_mentions(input: &str) -> Vec<String> {
    let mut mentions: Vec<String> = Vec::new();
    for word in input.split_whitespace() {
        let Some(name) = word.strip_prefix('@') else {
            continue;
        };
        let name = name.trim_end_matches([',', '.', '?', '!', ';', ':', ')', '"', '\'']);
        if !name.is_empty() && !mentions.iter().any(|m| m == name) {
            mentions.push(name.to_string());
        }
    }
    mentions
}

/// Prepend each document to the query as a `<document id="...">` block.
pub fn build_prompt(query: &str, docs: &[(String, String)]) -> String {
    if docs.is_empty() {
        return query.to_string();
    }
    let mut prompt = String::new();
    for (id, content) in docs {
        prompt.push_str(&format!("<document id=\"{id}\">\n{content}\n</document>\n"));
    }
    prompt.push('\n');
    prompt.push_str(query);
    prompt
}

/// Read every known `@mention` in `input` and build the user turn text.
///
/// Unknown names stay in the query untouched; unreadable documents are
/// reported and skipped.
pub async fn resolve_mentions(manager: &McpManager, index: &DocumentIndex, input: &str) -> String {
    let mut docs = Vec::new();
    for name in extract_mentions(input) {
        let Some(doc) = index.get(&name) else {
            tracing::debug!("No document named '{name}'");
            continue;
        };
        let Some(client) = manager.client(&doc.server) else {
            continue;
        };
        match client.read_resource_text(&doc.uri).await {
            Ok(text) => docs.push((name, text)),
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}", doc.uri);
                eprintln!("Warning: could not read @{name}: {e}");
            }
        }
    }
    build_prompt(input, &docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpchat_mcp::{McpClient, McpError, McpServerConfig};

    fn resource(uri: &str, name: &str, mime: Option<&str>) -> McpResourceInfo {
        McpResourceInfo {
            uri: uri.to_string(),
            name: name.to_string(),
            description: None,
            mime_type: mime.map(str::to_string),
        }
    }

    #[test]
    fn mentions_in_order_without_duplicates() {
        let mentions = extract_mentions("Compare @plan.md and @report.pdf, then @plan.md again?");
        assert_eq!(mentions, vec!["plan.md", "report.pdf"]);
    }

    #[test]
    fn mentions_strip_trailing_punctuation() {
        assert_eq!(extract_mentions("What is in @deposition.md?"), vec!["deposition.md"]);
        assert_eq!(extract_mentions("(see @notes)"), vec!["notes"]);
    }

    #[test]
    fn bare_at_and_emails_are_ignored() {
        assert!(extract_mentions("send @ noon to bob@example.com").is_empty());
    }

    #[test]
    fn prompt_without_documents_is_the_query() {
        assert_eq!(build_prompt("hello", &[]), "hello");
    }

    #[test]
    fn prompt_prepends_documents() {
        let docs = vec![
            ("plan.md".to_string(), "Step one.".to_string()),
            ("notes".to_string(), "A note.".to_string()),
        ];
        let prompt = build_prompt("Summarize @plan.md with @notes", &docs);
        assert_eq!(
            prompt,
            "<document id=\"plan.md\">\nStep one.\n</document>\n\
             <document id=\"notes\">\nA note.\n</document>\n\
             \nSummarize @plan.md with @notes"
        );
    }

    #[test]
    fn resources_are_indexed_by_name_and_uri_suffix() {
        let mut index = DocumentIndex::default();
        index.insert_resource("files", &resource("file:///tmp/notes.md", "Meeting notes", None));

        let by_suffix = index.get("notes.md").unwrap();
        assert_eq!(by_suffix.server, "files");
        assert_eq!(by_suffix.uri, "file:///tmp/notes.md");
        assert_eq!(index.get("Meeting notes"), Some(by_suffix));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn first_server_keeps_a_name() {
        let mut index = DocumentIndex::default();
        index.insert_resource("a", &resource("a://x/readme", "readme", None));
        index.insert_resource("b", &resource("b://y/readme", "readme", None));
        assert_eq!(index.get("readme").unwrap().server, "a");
    }

    #[test]
    fn listing_adds_child_documents() {
        let mut index = DocumentIndex::default();
        index.insert_listing("doc_client", "docs://documents", r#"["plan.md", "notes.txt"]"#);
        assert_eq!(
            index.get("plan.md").unwrap().uri,
            "docs://documents/plan.md"
        );
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn non_listing_json_is_ignored() {
        let mut index = DocumentIndex::default();
        index.insert_listing("doc_client", "docs://config", r#"{"theme": "dark"}"#);
        assert!(index.is_empty());
    }

    const DOC_SERVER: &str = r#"
import json, sys
DOCS = {"plan.md": "The plan outlines the steps.", "report.pdf": "Condenser tower report."}
for line in sys.stdin:
    req = json.loads(line)
    id = req.get("id")
    if id is None:
        continue
    method = req["method"]
    if method == "initialize":
        result = {"protocolVersion": "2024-11-05", "capabilities": {}}
    elif method == "tools/list":
        result = {"tools": []}
    elif method == "resources/list":
        result = {"resources": [{"uri": "docs://documents", "name": "list_docs", "mimeType": "application/json"}]}
    elif method == "resources/read":
        uri = req["params"]["uri"]
        if uri == "docs://documents":
            result = {"contents": [{"uri": uri, "text": json.dumps(sorted(DOCS))}]}
        else:
            result = {"contents": [{"uri": uri, "text": DOCS.get(uri.rsplit("/", 1)[-1], "")}]}
    else:
        result = {}
    sys.stdout.write(json.dumps({"jsonrpc": "2.0", "id": id, "result": result}) + "\n")
    sys.stdout.flush()
"#;

    #[tokio::test]
    async fn mentions_resolve_through_document_server() {
        let config = McpServerConfig {
            timeout_ms: 5000,
            ..McpServerConfig::new("python3", vec!["-c".to_string(), DOC_SERVER.to_string()])
        };
        let client = match McpClient::connect("doc_client", &config).await {
            Ok(client) => client,
            // python3 not installed
            Err(McpError::SpawnFailed { .. }) => return,
            Err(e) => panic!("connect failed: {e}"),
        };
        let mut manager = McpManager::default();
        manager.add(client);

        let index = DocumentIndex::build(&manager).await;
        assert_eq!(
            index.get("report.pdf").unwrap().uri,
            "docs://documents/report.pdf"
        );

        let query = "What does @report.pdf say about @nothing?";
        let prompt = resolve_mentions(&manager, &index, query).await;
        assert!(prompt.starts_with(
            "<document id=\"report.pdf\">\nCondenser tower report.\n</document>\n"
        ));
        assert!(prompt.ends_with("What does @report.pdf say about @nothing?"));
        assert!(!prompt.contains("id=\"nothing\""));

        manager.shutdown().await;
    }
}
