use engine::PopupContent;
use iced::widget::{Column, button, container, row, text};
use iced::{Background, Color, Element, Length, Theme};

const PANEL_MAX_WIDTH: f32 = 640.0;

/// Parses `#rgb` or `#rrggbb`.
pub fn hex_color(value: &str) -> Option<Color> {
    let digits = value.strip_prefix('#')?;
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(digits.get(range)?, 16).ok();
    match digits.len() {
        3 => {
            let expand = |index: usize| channel(index..index + 1).map(|value| value * 17);
            Some(Color::from_rgb8(expand(0)?, expand(1)?, expand(2)?))
        }
        6 => Some(Color::from_rgb8(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        _ => None,
    }
}

/// Modal panel for one scene's popup content.
pub fn view<'a, Message>(content: &'a PopupContent, close: Message) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    let (background, accent, tagline, description, items) = match content {
        PopupContent::Product {
            tagline,
            description,
            features,
            background_color,
            accent_color,
            ..
        } => (background_color, accent_color, tagline, description, features),
        PopupContent::Newsletter {
            tagline,
            description,
            perks,
            background_color,
            accent_color,
            ..
        } => (background_color, accent_color, tagline, description, perks),
    };
    let background = hex_color(background).unwrap_or(Color::BLACK);
    let accent = hex_color(accent).unwrap_or(Color::WHITE);

    let mut panel = Column::new()
        .push(row![button(text("Close")).on_press(close)])
        .push(text(content.title()).size(36).color(accent))
        .push(text(tagline.as_str()).size(18))
        .push(text(description.as_str()).size(15))
        .spacing(12);
    for item in items {
        panel = panel.push(text(format!("- {item}")).size(15));
    }
    let call_to_action = match content {
        PopupContent::Product { link, .. } => format!("{}: {link}", content.call_to_action()),
        PopupContent::Newsletter { .. } => content.call_to_action().to_owned(),
    };
    panel = panel.push(text(call_to_action).size(16).color(accent));

    let card = container(panel)
        .padding(32)
        .max_width(PANEL_MAX_WIDTH)
        .style(move |_theme: &Theme| container::Style {
            background: Some(Background::Color(background)),
            text_color: Some(Color::WHITE),
            ..container::Style::default()
        });

    container(card)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .style(|_theme: &Theme| container::Style {
            background: Some(Background::Color(Color::from_rgba(0.0, 0.0, 0.0, 0.6))),
            ..container::Style::default()
        })
        .into()
}
