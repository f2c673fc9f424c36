//! HTML templates for the dashboard.
//!
//! Charts are drawn client-side with Chart.js from the `/data` endpoint.

use crate::models::RecordView;

/// Base HTML template.
pub fn base_template(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - pagepulse</title>
    <link rel="stylesheet" href="/static/style.css">
    <script src="https://cdn.jsdelivr.net/npm/chart.js@4"></script>
</head>
<body>
    <header id="main-header">
        <nav>
            <a href="/" class="logo">pagepulse</a>
        </nav>
    </header>
    <main>
        <h1>{title}</h1>
        {content}
    </main>
</body>
</html>"#,
        title = html_escape(title),
        content = content
    )
}

/// Landing page: URL picker plus a chart for the selected URL.
pub fn index_page(urls: &[String]) -> String {
    if urls.is_empty() {
        return base_template(
            "Performance history",
            r#"<p class="empty">No insights recorded yet.</p>"#,
        );
    }

    let mut options = String::new();
    let mut rows = String::new();
    for url in urls {
        let escaped = html_escape(url);
        options.push_str(&format!(r#"<option value="{0}">{0}</option>"#, escaped));
        rows.push_str(&format!(
            r#"
        <li><a href="/url?url={}">{}</a></li>"#,
            html_escape(&urlencoding::encode(url)),
            escaped
        ));
    }

    let content = format!(
        r#"
    <section id="chart-section">
        <label for="url-select">URL</label>
        <select id="url-select">{options}</select>
        <canvas id="score-chart" height="120"></canvas>
    </section>
    <section>
        <h2>Tracked URLs</h2>
        <ul class="url-list">{rows}
        </ul>
    </section>
    <script>
        const select = document.getElementById('url-select');
        {chart}
        select.addEventListener('change', () => drawChart(select.value));
        drawChart(select.value);
    </script>
    "#,
        options = options,
        rows = rows,
        chart = CHART_JS
    );

    base_template("Performance history", &content)
}

/// Detail page: record table, newest first, with the chart above it.
pub fn url_detail_page(url: &str, records: &[RecordView]) -> String {
    let mut rows = String::new();
    for view in records {
        let record = &view.record;
        let score = view
            .mobile_score
            .map(|s| format!("{:.2}", s))
            .unwrap_or_else(|| "-".to_string());
        let error = record.error().map(html_escape).unwrap_or_default();
        rows.push_str(&format!(
            r#"
        <tr class="status-{status}">
            <td>{timestamp}</td>
            <td>{status}</td>
            <td>{score}</td>
            <td>{error}</td>
        </tr>"#,
            status = record.status(),
            timestamp = html_escape(&record.timestamp),
            score = score,
            error = error
        ));
    }

    let table = if records.is_empty() {
        r#"<p class="empty">No records for this URL.</p>"#.to_string()
    } else {
        format!(
            r#"
    <table class="records">
        <thead>
            <tr>
                <th>Timestamp</th>
                <th>Status</th>
                <th>Mobile score</th>
                <th>Error</th>
            </tr>
        </thead>
        <tbody>{}
        </tbody>
    </table>"#,
            rows
        )
    };

    let content = format!(
        r#"
    <p>{link}</p>
    <canvas id="score-chart" height="120"></canvas>
    {table}
    <script>
        {chart}
        drawChart({url_js});
    </script>
    "#,
        link = external_link(url),
        table = table,
        chart = CHART_JS,
        url_js = js_string(url)
    );

    base_template("URL details", &content)
}

/// Chart drawing shared by both pages. Expects a `#score-chart` canvas.
const CHART_JS: &str = r#"
        let chart = null;
        async function drawChart(url) {
            const resp = await fetch('/data?url=' + encodeURIComponent(url));
            if (!resp.ok) return;
            const data = await resp.json();
            const toPoints = (series) => series.map(p => ({ x: p.t, y: p.y }));
            if (chart) chart.destroy();
            chart = new Chart(document.getElementById('score-chart'), {
                type: 'line',
                data: {
                    datasets: [
                        { label: 'Mobile', data: toPoints(data.mobile) },
                        { label: 'Desktop', data: toPoints(data.desktop) }
                    ]
                },
                options: {
                    scales: {
                        x: { type: 'category', labels: [...new Set([...data.mobile, ...data.desktop].map(p => p.t))].sort() },
                        y: { min: 0, max: 100 }
                    }
                }
            });
        }
"#;

/// Anchor for http(s) URLs; any other scheme is shown as plain text.
fn external_link(url: &str) -> String {
    let escaped = html_escape(url);
    let lower = url.trim_start().to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        format!(r#"<a href="{0}" rel="nofollow">{0}</a>"#, escaped)
    } else {
        escaped
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Encode `s` as a JavaScript string literal safe inside a `<script>` block.
fn js_string(s: &str) -> String {
    serde_json::to_string(s)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace('<', "\\u003c")
}

/// Stylesheet served at `/static/style.css`.
pub const CSS: &str = r#"
:root {
    --bg: #fff;
    --text: #222;
    --text-muted: #666;
    --link: #0066cc;
    --link-hover: #004499;
    --border: #ccc;
    --error: #b00020;
}

body {
    font-family: ui-monospace, SFMono-Regular, Menlo, Consolas, monospace;
    background: var(--bg);
    color: var(--text);
    margin: 0;
    line-height: 1.5;
}

#main-header {
    border-bottom: 1px solid var(--border);
    padding: 0.5rem 1rem;
}

main {
    max-width: 960px;
    margin: 0 auto;
    padding: 1rem;
}

a { color: var(--link); text-decoration: none; }
a:hover { color: var(--link-hover); text-decoration: underline; }

.logo { font-weight: bold; }

.empty { color: var(--text-muted); }

.url-list { padding-left: 1.2rem; }

.records {
    width: 100%;
    border-collapse: collapse;
    margin-top: 1rem;
}

.records th,
.records td {
    text-align: left;
    padding: 0.25rem 0.5rem;
    border-bottom: 1px solid var(--border);
}

.status-error td { color: var(--error); }
"#;
