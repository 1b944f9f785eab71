use crate::app::{App, DebugView, Tab};
use crate::models::{ApiCallRecord, Body};
use crate::{secrets, summary};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
};

pub fn render(f: &mut Frame, app: &App) {
    // 1. Layout
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Tabs
            Constraint::Min(0),    // Body
            Constraint::Length(3), // Footer
        ])
        .split(f.area());

    // 2. Header
    let debug_on = app.store.debug_mode();
    let debug_badge = if debug_on {
        Span::styled(" DEBUG ON ", Style::default().fg(Color::Black).bg(Color::Magenta).add_modifier(Modifier::BOLD))
    } else {
        Span::styled(" DEBUG OFF ", Style::default().fg(Color::DarkGray))
    };
    let star = match app.namespace.as_query() {
        Some(ns) if app.favorites.contains(ns) => " ★",
        _ => "",
    };
    let header = Paragraph::new(Line::from(vec![
        Span::raw(format!(" Context: {} | Namespace: {}{} | ", app.context, app.namespace, star)),
        debug_badge,
    ]))
    .block(Block::default().borders(Borders::ALL).title(" kdash "));
    f.render_widget(header, chunks[0]);

    // 3. Tabs
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .map(|t| match t {
            Tab::Debug => Line::from(format!("{} ({})", t.title(), app.store.len())),
            _ => Line::from(t.title()),
        })
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, chunks[1]);

    // 4. Body
    match app.tab {
        Tab::Overview => render_overview(f, app, chunks[2]),
        Tab::Debug => render_debug(f, app, chunks[2]),
        Tab::Secrets => render_secrets(f, app, chunks[2]),
        _ => render_table(f, app, chunks[2]),
    }

    // 5. Footer
    render_footer(f, app, chunks[3]);

    if let Some(target) = &app.confirm_restart {
        let area = centered(f.area(), 50, 5);
        f.render_widget(Clear, area);
        let prompt = Paragraph::new(format!("Restart {target}?\n\n[y] confirm   [any key] cancel"))
            .block(Block::default().borders(Borders::ALL).title(" Confirm restart "))
            .style(Style::default().fg(Color::Yellow));
        f.render_widget(prompt, area);
    }
}

fn header_row(cols: &[&'static str]) -> Row<'static> {
    let cells = cols
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    Row::new(cells).height(1).bottom_margin(1)
}

fn ok_style(ok: bool) -> Style {
    if ok { Style::default().fg(Color::Green) } else { Style::default().fg(Color::Red) }
}

fn render_overview(f: &mut Frame, app: &App, area: Rect) {
    let text = match &app.overview {
        Some(o) => format!(
            "Nodes:        {}\nNamespaces:   {}\nPods:         {}\nDeployments:  {}\nSecrets:      {}",
            o.nodes, o.namespaces, o.pods, o.deployments, o.secrets
        ),
        None if app.loading > 0 => "Loading...".to_string(),
        None => "No data. Press r to retry.".to_string(),
    };
    let p = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(" Overview "));
    f.render_widget(p, area);
}

fn render_table(f: &mut Frame, app: &App, area: Rect) {
    let (header, rows, widths): (_, Vec<Row>, Vec<Constraint>) = match app.tab {
        Tab::Nodes => (
            header_row(&["Name", "Status", "Roles", "Version"]),
            app.nodes
                .iter()
                .map(|n| {
                    let ready = summary::node_ready(n);
                    Row::new(vec![
                        Cell::from(summary::name_of(&n.metadata)),
                        Cell::from(if ready { "Ready" } else { "NotReady" }).style(ok_style(ready)),
                        Cell::from(summary::node_roles(n)),
                        Cell::from(summary::node_version(n)),
                    ])
                })
                .collect(),
            vec![Constraint::Percentage(40), Constraint::Percentage(15), Constraint::Percentage(25), Constraint::Percentage(20)],
        ),
        Tab::Pods => (
            header_row(&["Name", "Namespace", "Status", "Restarts"]),
            app.pods
                .iter()
                .map(|pod| {
                    let status = summary::pod_phase(pod);
                    let style = ok_style(status == "Running" || status == "Succeeded");
                    Row::new(vec![
                        Cell::from(summary::name_of(&pod.metadata)),
                        Cell::from(summary::namespace_of(&pod.metadata)),
                        Cell::from(status).style(style),
                        Cell::from(summary::pod_restarts(pod).to_string()),
                    ])
                })
                .collect(),
            vec![Constraint::Percentage(40), Constraint::Percentage(30), Constraint::Percentage(15), Constraint::Percentage(15)],
        ),
        Tab::Deployments => (
            header_row(&["Name", "Namespace", "Ready", "Available"]),
            app.deployments
                .iter()
                .map(|d| {
                    Row::new(vec![
                        Cell::from(summary::name_of(&d.metadata)),
                        Cell::from(summary::namespace_of(&d.metadata)),
                        Cell::from(summary::deployment_ready(d)).style(ok_style(summary::deployment_healthy(d))),
                        Cell::from(summary::deployment_available(d).to_string()),
                    ])
                })
                .collect(),
            vec![Constraint::Percentage(40), Constraint::Percentage(30), Constraint::Percentage(15), Constraint::Percentage(15)],
        ),
        _ => (
            header_row(&["Name", "Status", "Favorite"]),
            app.namespaces
                .iter()
                .map(|ns| {
                    let name = summary::name_of(&ns.metadata);
                    let star = if app.favorites.contains(&name) { "★" } else { "" };
                    Row::new(vec![Cell::from(name), Cell::from(summary::namespace_phase(ns)), Cell::from(star)])
                })
                .collect(),
            vec![Constraint::Percentage(60), Constraint::Percentage(25), Constraint::Percentage(15)],
        ),
    };

    let title = format!(" {} ({}) ", app.tab.title(), rows.len());
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = TableState::default().with_selected(Some(app.selected));
    f.render_stateful_widget(table, area, &mut state);
}

fn render_secrets(f: &mut Frame, app: &App, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let rows: Vec<Row> = app
        .secrets
        .iter()
        .map(|s| {
            Row::new(vec![
                Cell::from(summary::name_of(&s.metadata)),
                Cell::from(summary::namespace_of(&s.metadata)),
                Cell::from(summary::secret_type(s)),
            ])
        })
        .collect();
    let table = Table::new(rows, [Constraint::Percentage(45), Constraint::Percentage(25), Constraint::Percentage(30)])
        .header(header_row(&["Name", "Namespace", "Type"]))
        .block(Block::default().borders(Borders::ALL).title(format!(" Secrets ({}) ", app.secrets.len())))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = TableState::default().with_selected(Some(app.selected));
    f.render_stateful_widget(table, halves[0], &mut state);

    let lines: Vec<Line> = match app.secrets.get(app.selected) {
        Some(secret) => secrets::entries(secret, app.reveal_secret)
            .into_iter()
            .map(|e| Line::from(vec![Span::styled(format!("{}: ", e.key), Style::default().fg(Color::Cyan)), Span::raw(e.value)]))
            .collect(),
        None => vec![Line::from("(no secret selected)")],
    };
    let title = if app.reveal_secret { " Data (revealed, s to mask) " } else { " Data (masked, s to reveal) " };
    let detail = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(detail, halves[1]);
}

fn render_debug(f: &mut Frame, app: &App, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let log = app.store.log();
    let rows: Vec<Row> = log
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.method.clone()),
                Cell::from(r.url.clone()),
                Cell::from(r.status_label()).style(ok_style(r.is_success())),
                Cell::from(format!("{}ms", r.duration_ms)),
            ])
        })
        .collect();
    let title = if app.store.debug_mode() {
        format!(" API calls ({}/{}) ", log.len(), app.store.capacity())
    } else {
        " API calls (debug off, press d) ".to_string()
    };
    let table = Table::new(
        rows,
        [Constraint::Length(6), Constraint::Min(10), Constraint::Length(5), Constraint::Length(8)],
    )
    .header(header_row(&["Method", "URL", "Status", "Time"]))
    .block(Block::default().borders(Borders::ALL).title(title))
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let position = app.debug_position(&log);
    let mut state = TableState::default().with_selected(position);
    f.render_stateful_widget(table, halves[0], &mut state);

    let view_title = match app.debug_view {
        DebugView::Response => " [1] Response  2 Request  3 Metadata ",
        DebugView::Request => " 1 Response  [2] Request  3 Metadata ",
        DebugView::Metadata => " 1 Response  2 Request  [3] Metadata ",
    };
    let text = match position.map(|i| &log[i]) {
        Some(record) => detail_text(record, app.debug_view),
        None if log.is_empty() => "No API calls captured.".to_string(),
        None => "Select a call with j/k or Enter.".to_string(),
    };
    let detail = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(view_title));
    f.render_widget(detail, halves[1]);
}

fn body_text(body: Option<&Body>) -> String {
    body.map_or_else(|| "(empty)".to_string(), |b| b.to_string())
}

pub fn detail_text(record: &ApiCallRecord, view: DebugView) -> String {
    match view {
        DebugView::Response => match (&record.response_body, &record.error) {
            (None, Some(err)) => format!("Error: {err}"),
            (body, _) => body_text(body.as_ref()),
        },
        DebugView::Request => format!(
            "{} {}\n\n{}",
            record.method,
            record.url,
            body_text(record.request_body.as_ref())
        ),
        DebugView::Metadata => {
            let mut lines = vec![
                format!("Timestamp:    {}", record.timestamp.to_rfc3339()),
                format!("Duration:     {}ms", record.duration_ms),
                format!("Status:       {}", record.status_label()),
            ];
            if let Some(ct) = &record.content_type {
                lines.push(format!("Content-Type: {ct}"));
            }
            if let Some(size) = record.response_size {
                lines.push(format!("Size:         {size} bytes"));
            }
            lines.join("\n")
        }
    }
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if let Some(err) = &app.error {
        (format!(" Error: {err}  (r to retry)"), Style::default().fg(Color::Red))
    } else if app.loading > 0 {
        (" Loading...".to_string(), Style::default().fg(Color::Cyan))
    } else if let Some(status) = &app.status {
        (format!(" {status}"), Style::default().fg(Color::Green))
    } else {
        let help = match app.tab {
            Tab::Debug => " d debug  ↑↓ select  enter open  1/2/3 view  y copy  c clear  q quit",
            Tab::Deployments => " tab switch  n namespace  f favourite  R restart  r refresh  d debug  q quit",
            Tab::Secrets => " tab switch  n namespace  s reveal  r refresh  d debug  q quit",
            _ => " tab switch  n namespace  f favourite  r refresh  d debug  q quit",
        };
        (help.to_string(), Style::default().fg(Color::DarkGray))
    };
    let footer = Paragraph::new(text).style(style).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
