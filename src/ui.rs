//! UI rendering for the terminal user interface.
//!
//! Everything user-visible goes through `App::i18n`, so switching the
//! locale re-renders the whole screen in the new language.

use std::time::{Duration, Instant};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::App;
use crate::audio::{AudioBackend, LoopMode};
use crate::config::{ControlsSettings, Theme, UiSettings};
use crate::i18n::I18n;
use crate::timer::format_remaining;

/// Key bindings in footer order, with the dictionary key of each label.
const CONTROLS: &[(&str, &str)] = &[
    ("j/k", "controls.move"),
    ("gg/G", "controls.top_bottom"),
    ("enter", "controls.play_selected"),
    ("space/p", "controls.play_pause"),
    ("h/l", "controls.prev_next"),
    ("H/L", "controls.scrub"),
    ("0-9", "controls.seek"),
    ("+/-", "controls.volume"),
    ("[/]", "controls.category"),
    ("/", "controls.filter"),
    ("r", "controls.loop"),
    ("f", "controls.favorite"),
    ("t/T", "controls.timer"),
    ("b", "controls.resume"),
    ("m", "controls.overlay"),
    ("i", "controls.language"),
    ("I", "controls.reload"),
    ("c", "controls.theme"),
    ("*1-5", "controls.rate"),
    ("s", "controls.stop"),
    ("q", "controls.quit"),
];

fn controls_text(i18n: &I18n, scrub_seconds: u64) -> String {
    let secs = scrub_seconds.to_string();
    CONTROLS
        .iter()
        .map(|(keys, label)| {
            let label = i18n.t_with(label, &[("secs", &secs)]);
            format!("[{keys}] {label}")
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Border and highlight color for each theme.
fn accent(theme: Theme) -> Color {
    match theme {
        Theme::Dusk => Color::Magenta,
        Theme::Forest => Color::Green,
        Theme::Ocean => Color::Cyan,
        Theme::Ember => Color::LightRed,
    }
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn loop_label(i18n: &I18n, mode: LoopMode) -> String {
    let key = match mode {
        LoopMode::NoLoop => "loop.no_loop",
        LoopMode::LoopAll => "loop.loop_all",
        LoopMode::LoopOne => "loop.loop_one",
    };
    format!("{}: {}", i18n.t("loop.label"), i18n.t(key))
}

fn timer_label<B: AudioBackend>(app: &App<B>, now: Instant) -> String {
    let i18n = &app.i18n;
    let value = match app.timer.display(now) {
        Some(time) => i18n.t_with("timer.remaining", &[("time", &time)]),
        None => i18n.t("timer.off"),
    };
    format!("{}: {}", i18n.t("timer.label"), value)
}

fn playback_label<B: AudioBackend>(app: &App<B>) -> String {
    let i18n = &app.i18n;
    let state = app.player.state();
    let Some(track) = app.player.current_track() else {
        return i18n.t("player.stopped");
    };
    let time = match track.duration {
        Some(total) => format!("{}/{}", format_mmss(app.player.elapsed()), format_mmss(total)),
        None => format_mmss(app.player.elapsed()),
    };
    let state_key = if state.is_playing {
        "player.playing"
    } else {
        "player.paused"
    };
    format!(
        "{}: {} [{}] • {}",
        i18n.t("player.now_playing"),
        track.display_name,
        time,
        i18n.t(state_key)
    )
}

fn status_lines<B: AudioBackend>(app: &App<B>, now: Instant) -> Vec<Line<'static>> {
    let i18n = &app.i18n;
    let mut parts: Vec<String> = Vec::new();

    if let Some(category) = app.current_category() {
        parts.push(format!(
            "{}: {} ({}/{})",
            i18n.t("player.category"),
            category,
            app.category_pos() + 1,
            app.categories().len()
        ));
    }
    parts.push(loop_label(i18n, app.loop_mode));

    let q = app.filter_query.trim();
    if app.filter_mode || !q.is_empty() {
        let mut filter_part = format!("{}:", i18n.t("filter.label"));
        if !q.is_empty() {
            filter_part.push(' ');
            filter_part.push_str(q);
        }
        parts.push(filter_part);
    }

    parts.push(playback_label(app));
    parts.push(format!(
        "{}: {}%",
        i18n.t("player.volume"),
        app.player.state().volume
    ));
    parts.push(timer_label(app, now));
    parts.push(format!("{}: {}", i18n.t("status.language"), i18n.locale()));

    let mut lines = vec![Line::from(parts.join(" • "))];
    if let Some(toast) = app.notifier.current(now) {
        lines.push(Line::from(Span::styled(
            toast.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
    }
    lines
}

/// Display name with filter matches upper-cased.
fn highlighted_title<B: AudioBackend>(app: &App<B>, index: usize) -> String {
    let title = &app.tracks()[index].display_name;
    let Some(positions) = app.match_positions(index).filter(|p| !p.is_empty()) else {
        return title.clone();
    };

    let mut rendered = String::new();
    let mut pos_iter = positions.into_iter();
    let mut next_pos = pos_iter.next();
    for (ci, ch) in title.chars().enumerate() {
        if next_pos == Some(ci) {
            rendered.extend(ch.to_uppercase());
            next_pos = pos_iter.next();
        } else {
            rendered.push(ch);
        }
    }
    rendered
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn overlay_text<B: AudioBackend>(app: &App<B>, now: Instant) -> String {
    let i18n = &app.i18n;
    let Some(track) = app.player.current_track() else {
        return i18n.t("modal.nothing");
    };

    let mut lines = vec![
        format!("♪ {}", track.display_name),
        format!("{}: {}", i18n.t("player.category"), track.category),
    ];
    let elapsed = app.player.elapsed();
    match track.duration {
        Some(total) if !total.is_zero() => {
            let fraction = (elapsed.as_secs_f64() / total.as_secs_f64()).min(1.0);
            let filled = (fraction * 20.0).round() as usize;
            lines.push(format!(
                "{} [{}{}] {}",
                format_mmss(elapsed),
                "█".repeat(filled),
                "·".repeat(20 - filled),
                format_mmss(total)
            ));
        }
        _ => lines.push(format!("{}: {}", i18n.t("player.elapsed"), format_mmss(elapsed))),
    }
    if app.user_data.is_favorite(&track.id()) {
        lines.push(format!("★ {}", i18n.t("status.favorite")));
    }
    if let Some(remaining) = app.timer.remaining(now) {
        lines.push(format!(
            "{}: {}",
            i18n.t("timer.label"),
            i18n.t_with("timer.remaining", &[("time", &format_remaining(remaining))])
        ));
    }
    lines.join("\n")
}

/// Render the entire UI into `frame`.
pub fn draw<B: AudioBackend>(
    frame: &mut Frame,
    app: &App<B>,
    display: &[usize],
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
    now: Instant,
) {
    let i18n = &app.i18n;
    let border = Style::default().fg(accent(app.theme));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(vec![
        Line::from(ui_settings.header_text.as_str()),
        Line::from(i18n.t("player.helper")).italic(),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(format!(" {} ", i18n.t("app.title")))
            .title_alignment(Alignment::Center),
    );
    frame.render_widget(header, chunks[0]);

    let status_par = Paragraph::new(status_lines(app, now))
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    // Main list
    {
        let filtering = !app.filter_query.trim().is_empty();

        // Only build ListItems for the visible window, centered on the selection.
        let total = display.len();
        let list_height = chunks[2].height.saturating_sub(2) as usize;
        let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let visible_items: Vec<ListItem> = display[start..end]
            .iter()
            .map(|&i| {
                let marker = if app.is_favorite(i) { "★ " } else { "  " };
                let mut text = format!("{marker}{}", highlighted_title(app, i));
                if filtering {
                    text.push_str(&format!("  · {}", app.tracks()[i].category));
                }
                ListItem::new(text)
            })
            .collect();

        let title = if total == 0 {
            format!(
                " {} ",
                i18n.t_with("player.no_tracks", &[("dir", &app.library_root)])
            )
        } else {
            format!(" {} ({total}) ", i18n.t("player.tracks"))
        };
        let list = List::new(visible_items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title(title),
            )
            .highlight_style(border.add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    // Now-playing overlay, kept inside the list area.
    if !app.modal.aria_hidden() {
        let popup_area = centered_rect_sized(60, 9, chunks[2]);
        frame.render_widget(Clear, popup_area);
        let overlay = Paragraph::new(overlay_text(app, now))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .padding(Padding {
                        left: 1,
                        right: 1,
                        top: 1,
                        bottom: 0,
                    })
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title(format!(
                        " {} ({}) ",
                        i18n.t("modal.title"),
                        i18n.t("modal.close_hint")
                    )),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(overlay, popup_area);
    }

    let footer = Paragraph::new(controls_text(i18n, controls_settings.scrub_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", i18n.t("controls.title")))
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, chunks[3]);
}
