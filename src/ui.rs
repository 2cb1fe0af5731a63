use crate::format::escape_html;
use crate::models::{DashboardResponse, NoticeLevel, Period};

pub fn render_index(dashboard: &DashboardResponse) -> String {
    fill_template(INDEX_HTML, |key| match key {
        "NOTICES" => Some(render_notices(dashboard)),
        "PERIOD_OPTIONS" => Some(render_period_options(dashboard.period)),
        "CHANNEL_OPTIONS" => Some(render_channel_options(dashboard)),
        "REVENUE" => Some(escape_html(&dashboard.metrics.revenue_label)),
        "ORDERS" => Some(escape_html(&dashboard.metrics.orders_label)),
        "MARGIN" => Some(escape_html(&dashboard.metrics.margin_label)),
        "CAPTION" => Some(escape_html(&dashboard.caption)),
        "DATA" => Some(embed_json(dashboard)),
        _ => None,
    })
}

/// Replaces `{{KEY}}` markers in a single scan of the template. Substituted
/// text is never scanned again; unknown markers are left as they are.
fn fill_template(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len() + 4096);
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => match lookup(&after[..end]) {
                Some(value) => {
                    out.push_str(&value);
                    rest = &after[end + 2..];
                }
                None => {
                    out.push_str("{{");
                    rest = after;
                }
            },
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn render_notices(dashboard: &DashboardResponse) -> String {
    dashboard
        .notices
        .iter()
        .map(|notice| {
            let class = match notice.level {
                NoticeLevel::Error => "notice error",
                NoticeLevel::Warning => "notice warning",
            };
            format!(
                r#"<div class="{class}" role="alert">{}</div>"#,
                escape_html(&notice.message)
            )
        })
        .collect()
}

fn render_period_options(selected: Period) -> String {
    Period::ALL
        .iter()
        .map(|period| {
            let marker = if *period == selected { " selected" } else { "" };
            format!(
                r#"<option value="{label}"{marker}>{label}</option>"#,
                label = period.label()
            )
        })
        .collect()
}

fn render_channel_options(dashboard: &DashboardResponse) -> String {
    dashboard
        .available_channels
        .iter()
        .map(|channel| {
            let checked = if dashboard.channels.contains(channel) {
                " checked"
            } else {
                ""
            };
            let label = escape_html(channel);
            format!(
                r#"<label class="chip"><input type="checkbox" name="channel" value="{label}"{checked} /> {label}</label>"#
            )
        })
        .collect()
}

/// JSON for the inline data block. Markup characters only occur inside JSON
/// strings, so unicode escapes keep the document structure intact.
fn embed_json(dashboard: &DashboardResponse) -> String {
    serde_json::to_string(dashboard)
        .unwrap_or_else(|_| "null".to_string())
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Shark HQ</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #eef4f7;
      --bg-2: #bfd9e6;
      --ink: #1f2a30;
      --accent: #1b7f9e;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.88);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #e3eef3 60%, #f4f8fa 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      padding: 32px 18px 48px;
    }

    .layout {
      width: min(1180px, 100%);
      margin: 0 auto;
      display: grid;
      grid-template-columns: 240px 1fr;
      gap: 24px;
    }

    aside, .app {
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 28px;
    }

    aside {
      display: grid;
      gap: 18px;
      align-content: start;
    }

    aside h2 {
      margin: 0;
      font-size: 1.2rem;
    }

    .control {
      display: grid;
      gap: 8px;
    }

    .control .label {
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #6d7a80;
    }

    select {
      border-radius: 12px;
      border: 1px solid rgba(47, 72, 88, 0.2);
      padding: 10px 12px;
      font: inherit;
      background: white;
    }

    .chip {
      display: flex;
      align-items: center;
      gap: 8px;
      padding: 6px 10px;
      border-radius: 999px;
      background: rgba(47, 72, 88, 0.06);
      font-size: 0.95rem;
    }

    .app {
      display: grid;
      gap: 28px;
      animation: rise 600ms ease;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(2rem, 4vw, 2.8rem);
      margin: 0;
    }

    .notice {
      border-radius: 14px;
      padding: 12px 16px;
      font-size: 0.95rem;
    }

    .notice.error {
      background: #fbe3df;
      color: #a3301f;
    }

    .notice.warning {
      background: #fff3d6;
      color: #8a5a00;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
      gap: 16px;
    }

    .stat {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      display: grid;
      gap: 8px;
    }

    .stat .label {
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #7d878b;
    }

    .stat .value {
      font-size: 1.7rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    .chart-card {
      background: white;
      border-radius: 20px;
      padding: 16px;
      border: 1px solid rgba(47, 72, 88, 0.08);
    }

    h3 {
      margin: 0 0 12px;
      font-size: 1.2rem;
    }

    svg.chart {
      width: 100%;
      height: 260px;
      display: block;
    }

    svg.chart text {
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
    }

    .chart-line {
      fill: none;
      stroke: var(--accent);
      stroke-width: 3;
    }

    .chart-bar {
      fill: var(--accent);
    }

    .chart-grid {
      stroke: rgba(47, 72, 88, 0.12);
    }

    .chart-label {
      fill: #6f7a7f;
      font-size: 11px;
    }

    .caption {
      margin: 0;
      color: #6f7a7f;
      font-size: 0.9rem;
    }

    @keyframes rise {
      from {
        opacity: 0;
        transform: translateY(18px);
      }
      to {
        opacity: 1;
        transform: translateY(0);
      }
    }

    @media (max-width: 760px) {
      .layout {
        grid-template-columns: 1fr;
      }
    }
  </style>
</head>
<body>
  <div class="layout">
    <aside>
      <h2>Filters</h2>
      <form id="filters" method="get" action="/">
        <div class="control">
          <span class="label">Period</span>
          <select id="period" name="period">{{PERIOD_OPTIONS}}</select>
        </div>
        <div class="control">
          <span class="label">Channel</span>
          <div id="channels">{{CHANNEL_OPTIONS}}</div>
        </div>
      </form>
    </aside>

    <main class="app">
      <h1>Shark HQ</h1>
      <div id="notices">{{NOTICES}}</div>

      <section class="panel">
        <div class="stat">
          <span class="label">Revenue</span>
          <span id="revenue" class="value">{{REVENUE}}</span>
        </div>
        <div class="stat">
          <span class="label">Orders</span>
          <span id="orders" class="value">{{ORDERS}}</span>
        </div>
        <div class="stat">
          <span class="label">Gross Margin %</span>
          <span id="margin" class="value">{{MARGIN}}</span>
        </div>
      </section>

      <section class="chart-card">
        <h3>Revenue trend</h3>
        <svg id="trend-chart" class="chart" viewBox="0 0 720 260" aria-label="Revenue trend" role="img"></svg>
      </section>

      <section class="chart-card">
        <h3>Channel split (last 30 days)</h3>
        <svg id="channel-chart" class="chart" viewBox="0 0 720 260" aria-label="Channel split" role="img"></svg>
      </section>

      <p class="caption" id="caption">{{CAPTION}}</p>
    </main>
  </div>

  <script id="dashboard-data" type="application/json">{{DATA}}</script>
  <script>
    const trendEl = document.getElementById('trend-chart');
    const channelEl = document.getElementById('channel-chart');
    const periodEl = document.getElementById('period');
    const channelsEl = document.getElementById('channels');
    const width = 720;
    const height = 260;
    const paddingX = 64;
    const paddingY = 34;
    const top = 20;

    const escapeText = (value) => String(value)
      .replace(/&/g, '&amp;')
      .replace(/</g, '&lt;')
      .replace(/>/g, '&gt;');

    const formatAxisValue = (value) => {
      if (Math.abs(value) >= 1000000) {
        return `${(value / 1000000).toFixed(1)}M`;
      }
      if (Math.abs(value) >= 1000) {
        return `${(value / 1000).toFixed(0)}k`;
      }
      return Math.round(value).toString();
    };

    const yScale = (values) => {
      let max = Math.max(0, ...values);
      if (max === 0) {
        max = 1;
      }
      const scale = (height - top - paddingY) / max;
      return { max, y: (value) => height - paddingY - value * scale };
    };

    const gridLines = (max, y) => {
      const ticks = 4;
      let grid = '';
      for (let i = 0; i <= ticks; i += 1) {
        const value = (max * i) / ticks;
        const yPos = y(value);
        grid += `<line class="chart-grid" x1="${paddingX}" y1="${yPos}" x2="${width - paddingX}" y2="${yPos}" />`;
        grid += `<text class="chart-label" x="${paddingX - 10}" y="${yPos + 4}" text-anchor="end">${formatAxisValue(value)}</text>`;
      }
      return grid;
    };

    const emptyChart = (el) => {
      el.innerHTML = '<text class="chart-label" x="50%" y="50%" text-anchor="middle">No data for this selection</text>';
    };

    const renderLineChart = (el, points) => {
      if (!points.length) {
        emptyChart(el);
        return;
      }
      const { max, y } = yScale(points.map((point) => point.value));
      const xStep = points.length > 1 ? (width - paddingX * 2) / (points.length - 1) : 0;
      const x = (index) => paddingX + index * xStep;
      const path = points
        .map((point, index) => `${index === 0 ? 'M' : 'L'} ${x(index).toFixed(2)} ${y(point.value).toFixed(2)}`)
        .join(' ');
      const labelEvery = Math.max(1, Math.ceil(points.length / 8));
      const xLabels = points
        .map((point, index) => index % labelEvery !== 0 ? '' :
          `<text class="chart-label" x="${x(index)}" y="${height - paddingY + 18}" text-anchor="middle">${escapeText(point.label)}</text>`)
        .join('');
      el.innerHTML = `${gridLines(max, y)}<path class="chart-line" d="${path}" />${xLabels}`;
    };

    const renderBarChart = (el, points) => {
      if (!points.length) {
        emptyChart(el);
        return;
      }
      const { max, y } = yScale(points.map((point) => point.value));
      const slot = (width - paddingX * 2) / points.length;
      const barWidth = Math.min(80, slot * 0.6);
      const bars = points
        .map((point, index) => {
          const x = paddingX + slot * index + (slot - barWidth) / 2;
          const yPos = y(point.value);
          return `<rect class="chart-bar" x="${x}" y="${yPos}" width="${barWidth}" height="${height - paddingY - yPos}" rx="6" />` +
            `<text class="chart-label" x="${x + barWidth / 2}" y="${height - paddingY + 18}" text-anchor="middle">${escapeText(point.label)}</text>`;
        })
        .join('');
      el.innerHTML = `${gridLines(max, y)}${bars}`;
    };

    const renderNotices = (notices) => {
      document.getElementById('notices').innerHTML = notices
        .map((notice) => `<div class="notice ${notice.level}" role="alert">${escapeText(notice.message)}</div>`)
        .join('');
    };

    const syncChannels = (selected) => {
      channelsEl.querySelectorAll('input').forEach((input) => {
        input.checked = selected.includes(input.value);
      });
    };

    const render = (data) => {
      syncChannels(data.channels);
      document.getElementById('revenue').textContent = data.metrics.revenue_label;
      document.getElementById('orders').textContent = data.metrics.orders_label;
      document.getElementById('margin').textContent = data.metrics.margin_label;
      document.getElementById('caption').textContent = data.caption;
      renderNotices(data.notices);
      renderLineChart(trendEl, data.trend.map((point) => ({ label: point.date.slice(5), value: point.revenue })));
      renderBarChart(channelEl, data.channel_split.map((point) => ({ label: point.channel, value: point.revenue })));
    };

    const currentQuery = () => {
      const channels = Array.from(channelsEl.querySelectorAll('input:checked')).map((input) => input.value);
      const params = new URLSearchParams({ period: periodEl.value, channels: channels.join(',') });
      return params.toString();
    };

    const refresh = async () => {
      const query = currentQuery();
      const res = await fetch(`/api/dashboard?${query}`);
      if (!res.ok) {
        throw new Error(await res.text());
      }
      render(await res.json());
      history.replaceState(null, '', `/?${query}`);
    };

    document.getElementById('filters').addEventListener('change', () => {
      refresh().catch((err) => renderNotices([{ level: 'error', message: err.message }]));
    });

    const initial = JSON.parse(document.getElementById('dashboard-data').textContent);
    if (initial) {
      render(initial);
    }
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MetricsResponse, Notice, SourceKind};

    fn sample() -> DashboardResponse {
        DashboardResponse {
            as_of: "2026-10-19".into(),
            caption: "Data as of 19 Oct 2026".into(),
            period: Period::Days90,
            channels: vec!["Store".into()],
            available_channels: vec!["E-Com".into(), "Store".into()],
            source: SourceKind::Demo,
            notices: vec![Notice::error("Database error: <refused>")],
            row_count: 0,
            metrics: MetricsResponse {
                total_revenue: 600_000.0,
                total_orders: 4_500,
                gross_margin_pct: 40.0,
                revenue_label: "AED 600,000".into(),
                orders_label: "4500".into(),
                margin_label: "40.0%".into(),
            },
            trend: Vec::new(),
            channel_split: Vec::new(),
        }
    }

    #[test]
    fn renders_metrics_controls_and_notices() {
        let html = render_index(&sample());
        assert!(html.contains("AED 600,000"));
        assert!(html.contains("40.0%"));
        assert!(html.contains("Data as of 19 Oct 2026"));
        assert!(html.contains(r#"<option value="90 D" selected>90 D</option>"#));
        assert!(html.contains(r#"value="Store" checked"#));
        assert!(html.contains(r#"value="E-Com" />"#));
        assert!(html.contains("Database error: &lt;refused&gt;"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn embedded_json_cannot_close_script_tag() {
        let mut dashboard = sample();
        dashboard.notices = vec![Notice::warning("</script><b>")];
        let json = embed_json(&dashboard);
        assert!(!json.contains("</script>"));
    }

    #[test]
    fn placeholder_text_in_data_is_not_expanded() {
        let hostile = vec!["{{DATA}}".to_string(), "<img src=x onerror=alert(1)>".to_string()];
        let mut dashboard = sample();
        dashboard.available_channels = hostile.clone();
        dashboard.channels = hostile;
        dashboard.notices = vec![Notice::error("CSV read error: {{REVENUE}}")];

        let html = render_index(&dashboard);
        assert!(!html.contains("<img src=x"));
        assert!(html.contains(r#"value="{{DATA}}" checked"#));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
        assert!(html.contains("CSV read error: {{REVENUE}}"));
        assert_eq!(html.matches("\"as_of\":").count(), 1);
    }

    #[test]
    fn embedded_json_round_trips_markup() {
        let mut dashboard = sample();
        dashboard.channels = vec!["A&B <b>".into()];
        let json = embed_json(&dashboard);
        assert!(!json.contains('<') && !json.contains('&'));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["channels"][0], "A&B <b>");
    }

    #[test]
    fn fill_template_keeps_unknown_markers() {
        let out = fill_template("a {{X}} b {{Y}} c {{open", |key| {
            (key == "X").then(|| "{{Y}}".to_string())
        });
        assert_eq!(out, "a {{Y}} b {{Y}} c {{open");
    }

    #[test]
    fn script_resyncs_checkboxes_with_applied_channels() {
        let html = render_index(&sample());
        assert!(html.contains("syncChannels(data.channels);"));
    }
}
