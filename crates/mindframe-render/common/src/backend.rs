//! Contract between the renderer adapter and a concrete drawing backend.

use std::fmt;

use mindframe_core::{Fingerprint, Props, Value};
use mindframe_ui_graphics::{Color, Point, Rect, Size};

/// Everything a backend needs to rasterize one renderable leaf.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceRequest {
    pub fingerprint: Fingerprint,
    pub tag: String,
    pub props: Props,
    pub size: Size,
}

impl SurfaceRequest {
    pub fn content(&self) -> SurfaceContent {
        let color = |name: &str, fallback: Color| {
            self.props
                .get(name)
                .and_then(Value::as_color)
                .unwrap_or(fallback)
        };
        match self.tag.as_str() {
            "text" => SurfaceContent::Text {
                text: self
                    .props
                    .get("text")
                    .map(|value| match value {
                        Value::Text(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .unwrap_or_default(),
                color: color("color", Color::WHITE),
                font_size: self
                    .props
                    .get("font_size")
                    .and_then(Value::as_f32)
                    .unwrap_or(DEFAULT_FONT_SIZE),
            },
            "image" => SurfaceContent::Image {
                src: self
                    .props
                    .get("src")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
            },
            _ => SurfaceContent::Solid {
                color: color("color", color("background", Color::WHITE)),
            },
        }
    }
}

pub const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Decoded leaf content.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceContent {
    Text {
        text: String,
        color: Color,
        font_size: f32,
    },
    Image {
        src: String,
    },
    Solid {
        color: Color,
    },
}

/// Outcome of [`DrawBackend::render_surface`].
#[derive(Clone, Debug, PartialEq)]
pub enum Rendered<S> {
    Ready(S),
    /// Work continues in the background; the result arrives through
    /// [`DrawBackend::poll_completed`].
    Deferred,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp<S> {
    FillRect {
        rect: Rect,
        color: Color,
    },
    BlitSurface {
        rect: Rect,
        surface: S,
    },
    DrawText {
        origin: Point,
        text: String,
        color: Color,
        size: f32,
    },
}

/// Ops for one damaged region. Backends clip every op to `region`.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawBatch<S> {
    pub region: Rect,
    pub ops: Vec<DrawOp<S>>,
}

impl<S> DrawBatch<S> {
    pub fn new(region: Rect) -> Self {
        Self {
            region,
            ops: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

pub trait DrawBackend {
    /// Opaque handle to a rasterized surface. Clones share the same surface.
    type Surface: Clone;
    type Error: fmt::Display;

    fn render_surface(
        &mut self,
        request: &SurfaceRequest,
    ) -> Result<Rendered<Self::Surface>, Self::Error>;

    /// Results of deferred renders finished since the last call.
    fn poll_completed(&mut self) -> Vec<(Fingerprint, Result<Self::Surface, Self::Error>)> {
        Vec::new()
    }

    fn release_surface(&mut self, surface: Self::Surface);

    /// Executes one draw call.
    fn submit(&mut self, batch: &DrawBatch<Self::Surface>) -> Result<(), Self::Error>;

    fn supports_batching(&self) -> bool {
        true
    }
}
