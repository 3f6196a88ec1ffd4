use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

use ragbot::config::GenerationParams;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("engines.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Catalog with one engine of each kind, both served from `base`
#[allow(dead_code)]
pub fn mock_catalog(base: &str) -> String {
    format!(
        r#"
default: openai
request_timeout_seconds: 5
engines:
  - name: openai
    kind: chat
    api_key_name: RAGBOT_TEST_OPENAI_KEY
    api_base: {base}/v1
    default_model: gpt-4o
    models:
      - name: gpt-4o
        temperature: 0.75
        max_tokens: 256
  - name: anthropic
    kind: prompt
    api_key_name: RAGBOT_TEST_ANTHROPIC_KEY
    api_base: {base}
    default_model: claude-2.1
    models:
      - name: claude-2.1
        temperature: 0.5
        max_tokens: 300
"#,
        base = base
    )
}

#[allow(dead_code)]
pub fn params(stream: bool) -> GenerationParams {
    GenerationParams {
        model: "gpt-4o".to_string(),
        max_tokens: 64,
        temperature: 0.2,
        stream,
        request_timeout: Duration::from_secs(5),
    }
}

/// Build an SSE body from chat chunk fragments, ending with `[DONE]`
#[allow(dead_code)]
pub fn sse_body(fragments: &[&str]) -> String {
    let mut body = String::new();
    body.push_str("data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n");
    for fragment in fragments {
        let chunk = serde_json::json!({ "choices": [{ "delta": { "content": fragment } }] });
        body.push_str(&format!("data: {}\n\n", chunk));
    }
    body.push_str("data: [DONE]\n\n");
    body
}
