//! Main player screen

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::model::{ConnectionState, PlaybackState, ScanState};

const SPOTIFY_GREEN: Color = Color::Rgb(0x00, 0xBF, 0x63);

const PLAY_ICON: [&str; 5] = [
    "  ██▄▄      ",
    "  ██████▄▄  ",
    "  ██████████",
    "  ██████▀▀  ",
    "  ██▀▀      ",
];

const PAUSE_ICON: [&str; 5] = [
    " ███   ███ ",
    " ███   ███ ",
    " ███   ███ ",
    " ███   ███ ",
    " ███   ███ ",
];

pub fn render_header(frame: &mut Frame, area: Rect, connection: &ConnectionState, scan: &ScanState, busy: bool) {
    let status_color = match connection {
        ConnectionState::Connected => SPOTIFY_GREEN,
        ConnectionState::Connecting => Color::Yellow,
        ConnectionState::Disconnected => Color::Gray,
        ConnectionState::Failed(_) => Color::Red,
    };

    let mut status = connection.label();
    if busy {
        status.push_str(" ⟳");
    }

    let mut spans = vec![
        Span::styled("spotify-qr", Style::default().fg(SPOTIFY_GREEN).add_modifier(Modifier::BOLD)),
        Span::raw("  │  "),
        Span::styled(status, Style::default().fg(status_color)),
    ];
    let scan_status = match scan {
        ScanState::AwaitingPermission => Some("waiting for permission"),
        ScanState::Scanning => Some("scanning"),
        _ => None,
    };
    if let Some(scan_status) = scan_status {
        spans.push(Span::raw("  │  "));
        spans.push(Span::styled(scan_status, Style::default().fg(Color::Cyan)));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));

    frame.render_widget(header, area);
}

pub fn render_play_pause(frame: &mut Frame, area: Rect, playback: &PlaybackState, last_scan: Option<&ScanState>) {
    let icon = if playback.is_playing() { PAUSE_ICON } else { PLAY_ICON };

    let mut lines: Vec<Line> = vec![Line::raw("")];
    lines.extend(
        icon.iter()
            .map(|row| Line::styled(*row, Style::default().fg(SPOTIFY_GREEN))),
    );
    lines.push(Line::raw(""));

    let track_line = match playback {
        PlaybackState::Idle => "Nothing queued".to_string(),
        PlaybackState::PendingTrack(uri) => format!("Queued: {}", uri),
        PlaybackState::Playing(uri) => format!("Playing: {}", uri),
        PlaybackState::Paused(uri) => format!("Paused: {}", uri),
    };
    lines.push(Line::styled(track_line, Style::default().fg(Color::White)));

    if let Some(scan) = last_scan {
        let (text, color) = match scan {
            ScanState::Decoded(_) => ("Last scan: track found", SPOTIFY_GREEN),
            ScanState::ScanFailed => ("Last scan: not a track link", Color::Red),
            ScanState::Cancelled => ("Last scan: cancelled", Color::Gray),
            _ => ("", Color::Gray),
        };
        lines.push(Line::styled(text, Style::default().fg(color)));
    }

    let widget = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(widget, area);
}

pub fn render_scan_button(frame: &mut Frame, area: Rect) {
    let [_, button_area, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(24),
        Constraint::Fill(1),
    ])
    .areas(area);

    let button = Paragraph::new(vec![
        Line::raw(""),
        Line::styled("SCAN A QR CODE", Style::default().add_modifier(Modifier::BOLD)),
    ])
    .alignment(Alignment::Center)
    .style(Style::default().fg(Color::Black).bg(SPOTIFY_GREEN))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Black).bg(SPOTIFY_GREEN)),
    );

    frame.render_widget(button, button_area);
}

pub fn render_key_hints(frame: &mut Frame, area: Rect) {
    let hints = Paragraph::new("s scan · space play/pause · c reconnect · q quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(hints, area);
}
