use ratatui::{
    prelude::*,
    widgets::{
        Block, Borders, BorderType, Paragraph, Tabs, Gauge,
        Sparkline, Wrap, ListItem, List,
        canvas::{Canvas, Circle, Rectangle},
    },
    style::{Color, Style, Modifier},
    text::{Line, Span},
};
use crate::analysis::render::{periodic_images, DiskImage};
use crate::core::configuration::DiskSnapshot;
use crate::core::domain::DiskKind;
use crate::interface::state::{AppState, AppMode, WorkerStatus};

// --- Color Palette ---
const COL_BG: Color = Color::Reset;
const COL_FG: Color = Color::White;
const COL_HIGHLIGHT: Color = Color::Yellow;
const COL_ACCENT: Color = Color::Cyan;
const COL_LARGE: Color = Color::LightRed;
const COL_SMALL: Color = Color::LightBlue;
const COL_IMAGE: Color = Color::DarkGray;
const COL_BOX: Color = Color::Gray;
const COL_SUCCESS: Color = Color::Green;
const COL_FAIL: Color = Color::Red;
const COL_CLUSTER: Color = Color::LightGreen;

pub fn draw(f: &mut Frame, app: &mut AppState) {
    if f.area().width < 40 || f.area().height < 10 {
        let p = Paragraph::new("Terminal too small.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(p, f.area());
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);

    match app.mode {
        AppMode::Dashboard => draw_dashboard(f, app, chunks[1]),
        AppMode::Parameters => draw_config(f, app, chunks[1]),
        AppMode::Viewer => draw_fullscreen_viewer(f, app, chunks[1]),
    }

    draw_footer(f, app, chunks[2]);
}

fn draw_header(f: &mut Frame, app: &AppState, area: Rect) {
    let titles = vec![" 1:Dash ", " 2:Params ", " 3:Viewer "];
    let idx = match app.mode {
        AppMode::Dashboard => 0,
        AppMode::Parameters => 1,
        AppMode::Viewer => 2,
    };

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::BOTTOM))
        .select(idx)
        .highlight_style(Style::default().fg(COL_HIGHLIGHT).add_modifier(Modifier::BOLD));

    f.render_widget(tabs, area);
}

fn draw_footer(f: &mut Frame, app: &AppState, area: Rect) {
    let status_str = match app.worker_status {
        WorkerStatus::Running => "RUNNING",
        WorkerStatus::Paused => "PAUSED",
        WorkerStatus::Idle => "IDLE",
        WorkerStatus::Starting => "STARTING",
        WorkerStatus::Finished => "DONE",
        WorkerStatus::Error => "ERROR",
    };

    let color = match app.worker_status {
        WorkerStatus::Running => COL_SUCCESS,
        WorkerStatus::Error => COL_FAIL,
        WorkerStatus::Paused => COL_HIGHLIGHT,
        _ => COL_FG,
    };

    let d_avg = app.last_measurement.as_ref().and_then(|m| m.d_avg);
    let d_str = d_avg.map(|d| format!("{:.4}", d)).unwrap_or_else(|| "-".to_string());

    let text = Line::from(vec![
        Span::styled(format!(" STATUS: {:<8}", status_str), Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::raw(" | "),
        Span::raw(format!("Moves/s: {:<8.0}", app.moves_per_second)),
        Span::raw(" | "),
        Span::styled(format!("D_avg: {}", d_str), Style::default().fg(COL_ACCENT)),
        Span::raw(" | [Q]uit [Space]Pause [+/-]Zoom [I]mages [R]eset-View"),
    ]);

    let p = Paragraph::new(text)
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(p, area);
}

fn draw_dashboard(f: &mut Frame, app: &AppState, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let left_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(cols[0]);

    if let Some(snapshot) = &app.snapshot {
        draw_packing(f, app, left_rows[0], snapshot, " Live Packing ");
    } else {
        f.render_widget(Block::default().title(" Waiting for Data... ").borders(Borders::ALL), left_rows[0]);
    }

    draw_sampling_charts(f, app, left_rows[1]);

    let right_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(20), Constraint::Percentage(30)])
        .split(cols[1]);

    draw_logs(f, app, right_rows[0]);
    draw_gauges(f, app, right_rows[1]);
    draw_stats(f, app, right_rows[2]);
}

fn draw_packing(f: &mut Frame, app: &AppState, area: Rect, snapshot: &DiskSnapshot, title: &str) {
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);

    let inner_area = block.inner(area);
    f.render_widget(block, area);

    if inner_area.width < 1 || inner_area.height < 1 { return; }
    if snapshot.positions.is_empty() { return; }

    let l = snapshot.domain_size;
    let images: Vec<DiskImage> = if app.viewport.show_images {
        periodic_images(snapshot)
    } else {
        snapshot.positions.iter().zip(&snapshot.radii).enumerate()
            .map(|(index, (p, &radius))| DiskImage { index, x: p.x, y: p.y, radius, kind: snapshot.kind(index) })
            .collect()
    };

    // Zoom about the box centre; terminal cells are roughly twice as tall as wide
    let half = 0.5 * l / app.viewport.zoom;
    let aspect = (inner_area.width as f64 / (2.0 * inner_area.height as f64)).max(1e-3);
    let (half_x, half_y) = if aspect >= 1.0 { (half * aspect, half) } else { (half, half / aspect) };
    let c = 0.5 * l;

    let canvas = Canvas::default()
        .background_color(COL_BG)
        .x_bounds([c - half_x, c + half_x])
        .y_bounds([c - half_y, c + half_y])
        .paint(|ctx| {
            ctx.draw(&Rectangle { x: 0.0, y: 0.0, width: l, height: l, color: COL_BOX });
            ctx.layer();
            for img in &images {
                let primary = img.x >= 0.0 && img.x < l && img.y >= 0.0 && img.y < l;
                let color = match (primary, img.kind) {
                    (false, _) => COL_IMAGE,
                    (true, DiskKind::Large) => COL_LARGE,
                    (true, DiskKind::Small) => COL_SMALL,
                };
                ctx.draw(&Circle { x: img.x, y: img.y, radius: img.radius, color });
            }
        });

    f.render_widget(canvas, inner_area);

    let zoom_status = format!("x{:.2}", app.viewport.zoom);
    let overlay = Paragraph::new(zoom_status).style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC));
    let overlay_area = Rect { x: inner_area.x + inner_area.width.saturating_sub(8), y: inner_area.y, width: 8.min(inner_area.width), height: 1 };
    f.render_widget(overlay, overlay_area);
}

fn draw_sampling_charts(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default().title(" Sampling ").borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);

    if !app.telemetry.d_avg_history.is_empty() {
        let min = app.telemetry.min_d_avg;
        let max = app.telemetry.max_d_avg;
        let range = (max - min).max(1e-6);

        let width = inner.width as usize;
        let data: Vec<u64> = app.telemetry.d_avg_history.iter()
            .rev()
            .take(width)
            .map(|(_, d)| {
                let norm = (d - min) / range;
                // Keep the minimum visible as a one-pixel bar
                1 + (norm * 10.0) as u64
            })
            .collect();

        let data_rev: Vec<u64> = data.into_iter().rev().collect();

        let spark = Sparkline::default()
            .block(Block::default().title(format!("D_avg [{:.3}, {:.3}]", min, max)).borders(Borders::NONE))
            .style(Style::default().fg(COL_ACCENT))
            .data(&data_rev);
        f.render_widget(spark, chunks[0]);
    }

    if !app.telemetry.cluster_size_history.is_empty() {
        let width = inner.width as usize;
        let data: Vec<u64> = app.telemetry.cluster_size_history.iter()
            .rev()
            .take(width)
            .map(|(_, s)| (s * 10.0) as u64)
            .collect();
        let data_rev: Vec<u64> = data.into_iter().rev().collect();

        let spark_cluster = Sparkline::default()
            .block(Block::default().title("Mean Cluster Size").borders(Borders::NONE))
            .style(Style::default().fg(COL_CLUSTER))
            .data(&data_rev);
        f.render_widget(spark_cluster, chunks[1]);
    }
}

fn draw_logs(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default().title(" System Log ").borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let items: Vec<ListItem> = app.logs.iter().rev().map(|line| {
        let style = if line.to_lowercase().contains("error") || line.contains("Failed") {
            Style::default().fg(COL_FAIL)
        } else if line.contains(">>>") {
            Style::default().fg(COL_SUCCESS)
        } else {
            Style::default().fg(Color::Gray)
        };

        ListItem::new(Line::from(vec![
            Span::styled(">", Style::default().fg(Color::DarkGray)),
            Span::raw(" "),
            Span::raw(line.as_str()),
        ])).style(style)
    }).collect();

    let list = List::new(items);
    f.render_widget(list, inner);
}

fn draw_gauges(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default().title(" Progress ").borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1); 2])
        .split(inner);

    let p = &app.params;
    let done = app.last_measurement.as_ref().map(|m| m.measurement + 1).unwrap_or(0);
    let ratio = if p.measurements > 0 { done as f64 / p.measurements as f64 } else { 1.0 };

    let g_progress = Gauge::default()
        .gauge_style(Style::default().fg(COL_ACCENT).bg(Color::DarkGray))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(format!("Measurements: {}/{}", done, p.measurements));
    f.render_widget(g_progress, layout[0]);

    // Largest cluster as a share of all disks
    let total = p.total_disks().max(1);
    let largest = app.last_measurement.as_ref().map(|m| m.largest_cluster).unwrap_or(0);
    let share = largest as f64 / total as f64;
    let color = if share < 0.5 { COL_CLUSTER } else { COL_FAIL };

    let g_cluster = Gauge::default()
        .gauge_style(Style::default().fg(color).bg(Color::DarkGray))
        .ratio(share.clamp(0.0, 1.0))
        .label(format!("Largest cluster: {} ({:.0}%)", largest, share * 100.0));
    f.render_widget(g_cluster, layout[1]);
}

fn draw_stats(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default().title(" Statistics ").borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let kv = |k: &str, v: String, col: Color| -> Line {
        Line::from(vec![
            Span::styled(format!("{} ", k), Style::default().fg(Color::Gray)),
            Span::styled(v, Style::default().fg(col)),
        ])
    };

    let moves = app.last_measurement.as_ref().map(|m| m.total_moves).unwrap_or(0);
    let mean_cluster = app.last_measurement.as_ref().map(|m| m.mean_cluster_size).unwrap_or(0.0);

    let mut text = vec![
        kv("Policy:", format!("{:?}", app.params.policy), COL_HIGHLIGHT),
        kv("Moves:", moves.to_string(), COL_HIGHLIGHT),
        kv("Mean cluster:", format!("{:.2}", mean_cluster), COL_HIGHLIGHT),
        kv("Elapsed:", format!("{:.1}s", app.start_time.elapsed().as_secs_f64()), COL_HIGHLIGHT),
    ];
    if let Some(s) = &app.summary {
        text.push(Line::from(vec![
            Span::styled("D_avg: ", Style::default().fg(Color::Gray)),
            Span::styled(format!("{:.5} ± {:.5}", s.mean, s.std_dev), Style::default().fg(COL_SUCCESS).add_modifier(Modifier::BOLD)),
        ]));
    }

    f.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), inner);
}

fn draw_config(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Simulation Parameters ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let p = &app.params;

    let kv = |k: &str, v: String| -> ListItem {
        ListItem::new(Line::from(vec![
            Span::styled(format!("{:<22}", k), Style::default().fg(COL_ACCENT)),
            Span::raw(v)
        ]))
    };

    let (box_str, density_str) = match &app.snapshot {
        Some(s) => {
            let box_area = s.domain_size * s.domain_size;
            let covered: f64 = s.radii.iter().map(|r| std::f64::consts::PI * r * r).sum();
            (format!("{:.3}", s.domain_size), format!("{:.4}", covered / box_area))
        }
        None => (
            p.domain_size.map(|l| format!("{:.3}", l)).unwrap_or_else(|| "from density".to_string()),
            format!("{:.4} (target)", p.density),
        ),
    };

    let items = vec![
        kv("Large disks (R = 1):", p.large_count.to_string()),
        kv("Small disks:", p.small_count.to_string()),
        kv("Small radius:", format!("{:.3}", p.small_radius)),
        kv("Box side L:", box_str),
        kv("Packing fraction:", density_str),
        ListItem::new(Line::from(" ")),
        kv("Move policy:", format!("{:?}", p.policy)),
        kv("Seed:", p.seed.to_string()),
        kv("Warm-up moves:", p.warmup_moves.to_string()),
        kv("Moves / measurement:", p.moves_per_measurement.to_string()),
        kv("Measurements:", p.measurements.to_string()),
        kv("Ring margin:", p.ring_margin.to_string()),
        ListItem::new(Line::from(" ")),
        kv("Output dir:", p.output_dir.as_ref().map(|d| d.display().to_string()).unwrap_or_else(|| "-".to_string())),
        kv("Snapshot every:", p.snapshot_every.to_string()),
    ];

    let list = List::new(items).block(Block::default().borders(Borders::NONE));
    f.render_widget(list, inner);
}

fn draw_fullscreen_viewer(f: &mut Frame, app: &AppState, area: Rect) {
    if let Some(snapshot) = &app.snapshot {
        draw_packing(f, app, area, snapshot, " Packing Viewer (Fullscreen) ");
    } else {
        let p = Paragraph::new("No snapshot received yet.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(p, area);
    }
}
