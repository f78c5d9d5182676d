//! Informational index page.

use axum::{extract::State, response::Html};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::state::AppState;

/// `/`, any method.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(state.name(), Utc::now()))
}

/// Render the index page for `name` at `now`.
pub fn render_index(name: &str, now: DateTime<Utc>) -> String {
    let title = escape_html(name);
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
 <meta charset="utf-8">
 <title>{title}</title>
</head>
<body>
 <h1>{title}</h1>
 <p>This is an oauth proxy.</p>
 <p>Current server time is {time}</p>
</body>
</html>
"#,
        title = title,
        time = now.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
