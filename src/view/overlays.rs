//! Overlay rendering (notice, permission prompt, scanner)

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::model::{BarcodeFormat, Permission, ScanOptions};

fn centered_popup(frame: &Frame, width: u16, height: u16) -> Rect {
    let area = frame.area();
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));

    Rect {
        x: area.width.saturating_sub(width) / 2,
        y: area.height.saturating_sub(height) / 2,
        width,
        height,
    }
}

fn popup_block(title: &str, color: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title)
        .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(Color::Black))
}

pub fn render_notice(frame: &mut Frame, notice: &str) {
    let popup_width = 52u16;
    let inner_width = popup_width.saturating_sub(4).max(1) as usize;

    // Height: borders + wrapped message lines
    let line_count = notice.chars().count().div_ceil(inner_width).max(1) as u16;
    let popup_area = centered_popup(frame, popup_width, line_count + 2);

    frame.render_widget(Clear, popup_area);

    let widget = Paragraph::new(notice.to_string())
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: false })
        .block(popup_block(" Notice (Esc to dismiss) ", Color::Red));

    frame.render_widget(widget, popup_area);
}

pub fn render_permission_prompt(frame: &mut Frame, permission: Permission) {
    let what = match permission {
        Permission::Camera => "the QR scanner",
    };

    let popup_area = centered_popup(frame, 50, 6);
    frame.render_widget(Clear, popup_area);

    let widget = Paragraph::new(vec![
        Line::raw(format!("Allow spotify-qr to use {}?", what)),
        Line::raw(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" allow   "),
            Span::styled("n", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::raw(" deny"),
        ]),
    ])
    .wrap(Wrap { trim: true })
    .block(popup_block(" Permission ", Color::Cyan));

    frame.render_widget(widget, popup_area);
}

pub fn render_scanner(frame: &mut Frame, options: &ScanOptions, buffer: &str) {
    let formats: Vec<&str> = options
        .formats
        .iter()
        .map(|format| match format {
            BarcodeFormat::QrCode => "QR",
        })
        .collect();

    let popup_area = centered_popup(frame, 70, 7);
    frame.render_widget(Clear, popup_area);

    let widget = Paragraph::new(vec![
        Line::raw(options.prompt.clone()),
        Line::styled(
            format!("Reader {} · formats: {}", options.camera_id, formats.join(", ")),
            Style::default().fg(Color::DarkGray),
        ),
        Line::raw(""),
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Green)),
            Span::raw(buffer.to_string()),
            Span::styled("█", Style::default().fg(Color::Green)),
        ]),
    ])
    .wrap(Wrap { trim: false })
    .block(popup_block(" Scanner (Enter to submit, Esc to cancel) ", Color::Green));

    frame.render_widget(widget, popup_area);
}
