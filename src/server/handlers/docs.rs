//! Static API documentation page.

use axum::extract::State;
use axum::response::Html;

use crate::server::state::AppState;

pub async fn handle_docs(State(state): State<AppState>) -> Html<String> {
    Html(render_docs(
        &state.http.text2sql_endpoint,
        &state.http.summary_endpoint,
    ))
}

fn render_docs(text2sql_endpoint: &str, summary_endpoint: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>FLAN-T5 Task API</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 20px; }}
        h1 {{ color: #333; }}
        p, li {{ color: #555; }}
    </style>
</head>
<body>
    <h1>FLAN-T5 Task API</h1>
    <p>All task endpoints take a JSON object via POST.</p>

    <h2>Endpoints</h2>
    <ul>
        <li><strong>{text2sql_endpoint}</strong>: generate a SQL query from table definitions
        (<code>sql_table</code>) and a natural-language <code>question</code>.</li>
        <li><strong>{summary_endpoint}</strong>: summarize the given <code>text</code>.</li>
    </ul>

    <h2>Generation parameters</h2>
    <ul>
        <li><code>num_return_sequences</code> (integer, default 1; values above 1 need <code>do_sample</code>)</li>
        <li><code>temperature</code> (float, default 1.0)</li>
        <li><code>top_k</code> (integer, default 50)</li>
        <li><code>do_sample</code> (boolean, default false)</li>
        <li><code>max_new_tokens</code> (integer, default 200 for SQL and 512 for summaries)</li>
    </ul>

    <h2>Response Format</h2>
    <pre>
{{
    "status_code": 200,
    "generated_sequence": ["String"],
    "tokenizer_warning": "String or null"
}}
    </pre>

    <h2>Errors</h2>
    <p>Invalid requests return HTTP 400 with a <code>message</code> field. Validation
    failures map each offending parameter to its error.</p>
</body>
</html>
"#
    )
}
