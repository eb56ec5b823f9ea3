//! Static HTML gallery with a parallel-coordinates overview

use crate::dataset::{DatasetMeta, Item};
use crate::report::Summary;
use std::io::{self, Write};

pub fn write<W: Write>(
    writer: &mut W,
    items: &[Item],
    meta: &DatasetMeta,
    captions: &[String],
) -> io::Result<()> {
    let summary = Summary::from_items(items, meta);
    let dims = build_dimensions(items, meta);
    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M");

    write!(writer, r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Morpho Design Report</title>
    <script src="https://cdn.plot.ly/plotly-2.27.0.min.js"></script>
    <style>
        :root {{
            --bg: #0d1117;
            --card: #161b22;
            --border: #30363d;
            --text: #e6edf3;
            --dim: #7d8590;
            --accent: #58a6ff;
            --missing: #6e7681;
        }}
        * {{ box-sizing: border-box; margin: 0; padding: 0; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans', Helvetica, Arial, sans-serif;
            background: var(--bg);
            color: var(--text);
            line-height: 1.5;
        }}
        .container {{ max-width: 1600px; margin: 0 auto; padding: 2rem; }}
        .header {{
            display: flex;
            align-items: baseline;
            gap: 1rem;
            margin-bottom: 2rem;
            padding-bottom: 1rem;
            border-bottom: 1px solid var(--border);
        }}
        .logo {{ font-size: 2.5rem; font-weight: 800; color: var(--accent); }}
        .subtitle {{ color: var(--dim); }}
        .stats {{
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
            gap: 1rem;
            margin-bottom: 2rem;
        }}
        .stat {{
            background: var(--card);
            border: 1px solid var(--border);
            border-radius: 12px;
            padding: 1.25rem;
            text-align: center;
        }}
        .stat-value {{ font-size: 2.25rem; font-weight: 700; line-height: 1; }}
        .stat-label {{ color: var(--dim); font-size: 0.8rem; text-transform: uppercase; letter-spacing: 0.05em; margin-top: 0.5rem; }}
        #parallel {{ background: var(--card); border: 1px solid var(--border); border-radius: 12px; margin-bottom: 2rem; min-height: 360px; }}
        .gallery {{ display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 1rem; }}
        .card {{ background: var(--card); border: 1px solid var(--border); border-radius: 12px; overflow: hidden; }}
        .card img {{ width: 100%; aspect-ratio: 4 / 3; object-fit: contain; background: #fff; display: block; }}
        .card .no-image {{ aspect-ratio: 4 / 3; display: flex; align-items: center; justify-content: center; color: var(--missing); }}
        .card .body {{ padding: 0.75rem; font-size: 0.85rem; }}
        .card .title {{ font-weight: 600; }}
        .card .caption {{ color: var(--dim); }}
    </style>
</head>
<body>
<div class="container">
    <div class="header">
        <div class="logo">Morpho</div>
        <div class="subtitle">{shown} design(s) &middot; generated {generated}</div>
    </div>
    <div class="stats">
        <div class="stat"><div class="stat-value">{total}</div><div class="stat-label">Designs</div></div>
        <div class="stat"><div class="stat-value">{complete}</div><div class="stat-label">All views</div></div>
        <div class="stat"><div class="stat-value">{no_image}</div><div class="stat-label">No image</div></div>
"#,
        shown = items.len(),
        generated = generated,
        total = summary.total,
        complete = summary.complete,
        no_image = summary.no_image,
    )?;

    for view in &meta.views {
        let count = summary.per_view.get(&view.key).copied().unwrap_or(0);
        writeln!(
            writer,
            r#"        <div class="stat"><div class="stat-value">{}</div><div class="stat-label">{}</div></div>"#,
            count,
            html_escape(&view.label)
        )?;
    }
    writeln!(writer, "    </div>")?;

    if dims.is_some() {
        writeln!(writer, r#"    <div id="parallel"></div>"#)?;
    }

    writeln!(writer, r#"    <div class="gallery">"#)?;
    let first_view = meta.views.first().map(|v| v.key.as_str()).unwrap_or("");
    for item in items {
        write_card(writer, item, first_view, captions)?;
    }
    writeln!(writer, "    </div>\n</div>")?;

    if let Some(dims) = dims {
        write!(writer, r#"<script>
const dimensions = {dims};
Plotly.newPlot('parallel', [{{
    type: 'parcoords',
    line: {{ color: '#58a6ff' }},
    dimensions: dimensions
}}], {{
    paper_bgcolor: '#161b22',
    plot_bgcolor: '#161b22',
    font: {{ color: '#e6edf3' }}
}}, {{ responsive: true }});
</script>
"#,
            dims = dims,
        )?;
    }

    writeln!(writer, "</body>\n</html>")
}

fn write_card<W: Write>(writer: &mut W, item: &Item, view: &str, captions: &[String]) -> io::Result<()> {
    let file = item.file_for(view);

    writeln!(writer, r#"        <div class="card">"#)?;
    match file {
        Some(file) => writeln!(
            writer,
            r#"            <img src="{}" alt="{}" loading="lazy">"#,
            html_escape(file),
            html_escape(&item.label())
        )?,
        None => writeln!(writer, r#"            <div class="no-image">no image</div>"#)?,
    }
    writeln!(writer, r#"            <div class="body">"#)?;
    writeln!(writer, r#"                <div class="title">{}</div>"#, html_escape(&item.label()))?;
    for line in item.caption(captions) {
        writeln!(writer, r#"                <div class="caption">{}</div>"#, html_escape(&line))?;
    }
    writeln!(writer, "            </div>\n        </div>")
}

/// Plotly `parcoords` dimensions as an inline script literal, when at
/// least two parameters have values.
fn build_dimensions(items: &[Item], meta: &DatasetMeta) -> Option<String> {
    let dims: Vec<serde_json::Value> = crate::plot::parallel(items, &meta.parameters)
        .into_iter()
        .filter(|d| d.range.is_some())
        .map(|d| {
            serde_json::json!({
                "label": d.label,
                "values": d.values,
                "range": d.range,
            })
        })
        .collect();

    if dims.len() < 2 {
        return None;
    }
    serde_json::to_string(&dims)
        .ok()
        .map(|json| json.replace("</", "<\\/"))
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
