use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::feed::FeedStats;
use crate::ui::theme;

/// Render the attribution line and the aggregate feed statistics.
pub fn render(frame: &mut Frame, stats: Option<&FeedStats>, area: Rect) {
    let mut lines = vec![Line::from(Span::styled(
        " circlet \u{00B7} a friend-circle feed browser",
        theme::META_STYLE,
    ))];

    if let Some(stats) = stats {
        lines.push(Line::from(Span::styled(
            format!(
                " subscriptions: {}   active: {}   articles: {}",
                stats.friends_num, stats.active_num, stats.article_num
            ),
            theme::STATS_STYLE,
        )));
        lines.push(Line::from(Span::styled(
            format!(" updated: {}", stats.last_updated_time),
            theme::STATS_STYLE,
        )));
    }

    frame.render_widget(Paragraph::new(lines), area);
}
