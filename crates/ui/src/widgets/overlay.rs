use engine::{OverlayAnchor, StageView};
use iced::alignment::{Horizontal, Vertical};
use iced::widget::{Column, button, column, container, stack, text};
use iced::{Element, Length};

/// Where a caption sits inside the stage.
pub fn anchor_alignment(anchor: OverlayAnchor) -> (Horizontal, Vertical) {
    match anchor {
        OverlayAnchor::TopLeft => (Horizontal::Left, Vertical::Top),
        OverlayAnchor::TopRight => (Horizontal::Right, Vertical::Top),
        OverlayAnchor::BottomLeft => (Horizontal::Left, Vertical::Bottom),
        OverlayAnchor::BottomRight => (Horizontal::Right, Vertical::Bottom),
        OverlayAnchor::Center => (Horizontal::Center, Vertical::Center),
    }
}

/// Loading or failure notice; `None` once the media is ready.
pub fn status_line(stage: &StageView) -> Option<String> {
    if let Some(reason) = &stage.load_failure {
        return Some(format!("Failed to load media: {reason}"));
    }
    if stage.is_ready {
        return None;
    }
    Some(match stage.load_progress {
        Some((done, total)) => format!("Loading {done} / {total}"),
        None => "Loading".to_owned(),
    })
}

/// Caption, labels and the scene button drawn above the media.
pub fn view<'a, Message>(stage: &'a StageView, open_popup: Message) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    let hud = container(
        Column::new()
            .push(text(stage.scene_label.as_str()).size(14))
            .push(text(stage.position_label.as_str()).size(14))
            .push_maybe(status_line(stage).map(|line| text(line).size(14)))
            .spacing(4),
    )
    .padding(16)
    .width(Length::Fill)
    .height(Length::Fill)
    .align_x(Horizontal::Right)
    .align_y(Vertical::Top);

    let mut layers = stack![hud];

    if let Some(overlay) = &stage.overlay {
        let (horizontal, vertical) = anchor_alignment(overlay.anchor);
        let caption = Column::new()
            .push(text(overlay.title.as_str()).size(44))
            .push_maybe(
                overlay
                    .subtitle
                    .as_deref()
                    .map(|subtitle| text(subtitle).size(20)),
            )
            .spacing(8);
        layers = layers.push(
            container(caption)
                .padding(48)
                .width(Length::Fill)
                .height(Length::Fill)
                .align_x(horizontal)
                .align_y(vertical),
        );
    }

    if let Some(label) = &stage.scene_button {
        layers = layers.push(
            container(column![button(text(label.as_str())).on_press(open_popup)])
                .padding(32)
                .width(Length::Fill)
                .height(Length::Fill)
                .align_x(Horizontal::Center)
                .align_y(Vertical::Bottom),
        );
    }

    layers.into()
}
