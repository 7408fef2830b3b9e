use engine::Frame;
use iced::widget::{container, image, text};
use iced::{ContentFit, Element, Length};

/// UI-ready image converted from a stage frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameImage {
    pub handle: image::Handle,
    pub width: u32,
    pub height: u32,
}

impl FrameImage {
    /// Converts an RGBA frame into an iced image handle.
    pub fn from_frame(frame: &Frame) -> Option<Self> {
        let expected_bytes = frame.width.checked_mul(frame.height)?.checked_mul(4)? as usize;
        if expected_bytes == 0 || frame.bytes.len() != expected_bytes {
            return None;
        }

        Some(Self {
            handle: image::Handle::from_rgba(frame.width, frame.height, frame.bytes.to_vec()),
            width: frame.width,
            height: frame.height,
        })
    }
}

/// Renders the media layer, or `placeholder` until a frame arrives.
pub fn view<'a, Message>(latest: Option<&FrameImage>, placeholder: String) -> Element<'a, Message>
where
    Message: 'a,
{
    match latest {
        Some(image_data) => image(image_data.handle.clone())
            .content_fit(ContentFit::Cover)
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
        None => container(text(placeholder))
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engine::Frame;
    use iced::widget::image;

    use super::FrameImage;

    #[test]
    fn converts_rgba_frame_into_image_handle() {
        let frame = Frame {
            width: 2,
            height: 1,
            bytes: Arc::from(vec![0_u8, 1, 2, 3, 4, 5, 6, 7]),
        };

        let Some(image) = FrameImage::from_frame(&frame) else {
            panic!("expected frame image");
        };

        let image::Handle::Rgba {
            width,
            height,
            pixels,
            ..
        } = image.handle
        else {
            panic!("expected rgba handle");
        };
        assert_eq!(width, 2);
        assert_eq!(height, 1);
        assert_eq!(pixels.len(), 8);
    }

    #[test]
    fn rejects_frame_with_invalid_rgba_byte_length() {
        let frame = Frame {
            width: 2,
            height: 2,
            bytes: Arc::from(vec![0_u8; 3]),
        };

        assert!(FrameImage::from_frame(&frame).is_none());
    }

    #[test]
    fn rejects_empty_frame() {
        let frame = Frame {
            width: 0,
            height: 0,
            bytes: Arc::from(Vec::<u8>::new()),
        };

        assert!(FrameImage::from_frame(&frame).is_none());
    }
}
