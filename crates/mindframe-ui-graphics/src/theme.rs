use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::color::Color;

const FALLBACK_FONT_SIZE: f32 = 16.0;

/// Named colours, font sizes, spacings and corner radii a module draws with.
///
/// Lookups never fail. A colour the theme leaves out falls back to its
/// `text` colour, a font size to its `medium` size, and spacings and radii
/// to zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    id: String,
    name: String,
    colors: BTreeMap<String, Color>,
    font_sizes: BTreeMap<String, f32>,
    spacings: BTreeMap<String, f32>,
    radii: BTreeMap<String, f32>,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// An empty theme; fill it with the `with_*` builders.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            colors: BTreeMap::new(),
            font_sizes: BTreeMap::new(),
            spacings: BTreeMap::new(),
            radii: BTreeMap::new(),
        }
    }

    pub fn dark() -> Self {
        Self::new("dark", "Dark Theme")
            .with_colors([
                ("background", Color::rgb(15, 18, 28)),
                ("card", Color::rgb(25, 30, 45)),
                ("surface", Color::rgb(35, 40, 55)),
                ("border", Color::rgb(60, 70, 90)),
                ("text", Color::rgb(230, 235, 245)),
                ("text_secondary", Color::rgb(180, 185, 200)),
                ("text_disabled", Color::rgb(120, 125, 140)),
                ("primary", Color::rgb(75, 120, 210)),
                ("primary_hover", Color::rgb(90, 140, 230)),
                ("primary_active", Color::rgb(60, 100, 190)),
                ("secondary", Color::rgb(70, 80, 100)),
                ("accent", Color::rgb(255, 140, 0)),
                ("success", Color::rgb(70, 200, 120)),
                ("error", Color::rgb(240, 80, 80)),
                ("warning", Color::rgb(255, 190, 50)),
                ("info", Color::rgb(70, 145, 240)),
            ])
            .with_standard_metrics()
    }

    pub fn light() -> Self {
        Self::new("light", "Light Theme")
            .with_colors([
                ("background", Color::rgb(245, 248, 250)),
                ("card", Color::rgb(255, 255, 255)),
                ("surface", Color::rgb(240, 242, 245)),
                ("border", Color::rgb(200, 210, 220)),
                ("text", Color::rgb(30, 40, 50)),
                ("text_secondary", Color::rgb(80, 90, 100)),
                ("text_disabled", Color::rgb(150, 160, 170)),
                ("primary", Color::rgb(60, 120, 210)),
                ("primary_hover", Color::rgb(80, 140, 230)),
                ("primary_active", Color::rgb(40, 100, 190)),
                ("secondary", Color::rgb(100, 110, 130)),
                ("accent", Color::rgb(245, 130, 0)),
                ("success", Color::rgb(50, 180, 100)),
                ("error", Color::rgb(220, 60, 60)),
                ("warning", Color::rgb(245, 180, 40)),
                ("info", Color::rgb(60, 130, 220)),
            ])
            .with_standard_metrics()
    }

    /// Looks up a built-in theme by id.
    pub fn preset(id: &str) -> Option<Self> {
        match id {
            "dark" => Some(Self::dark()),
            "light" => Some(Self::light()),
            _ => None,
        }
    }

    fn with_standard_metrics(mut self) -> Self {
        for (name, size) in [("small", 14.0), ("medium", 18.0), ("large", 24.0), ("xlarge", 32.0)] {
            self = self.with_font_size(name, size);
        }
        for (name, spacing) in [("small", 8.0), ("medium", 16.0), ("large", 24.0), ("xlarge", 32.0)] {
            self = self.with_spacing(name, spacing);
        }
        for (name, radius) in [("small", 4.0), ("medium", 8.0), ("large", 12.0)] {
            self = self.with_radius(name, radius);
        }
        self
    }

    fn with_colors<'a>(mut self, colors: impl IntoIterator<Item = (&'a str, Color)>) -> Self {
        self.colors
            .extend(colors.into_iter().map(|(name, color)| (name.to_owned(), color)));
        self
    }

    pub fn with_color(mut self, name: impl Into<String>, color: Color) -> Self {
        self.colors.insert(name.into(), color);
        self
    }

    pub fn with_font_size(mut self, name: impl Into<String>, size: f32) -> Self {
        self.font_sizes.insert(name.into(), size);
        self
    }

    pub fn with_spacing(mut self, name: impl Into<String>, spacing: f32) -> Self {
        self.spacings.insert(name.into(), spacing);
        self
    }

    pub fn with_radius(mut self, name: impl Into<String>, radius: f32) -> Self {
        self.radii.insert(name.into(), radius);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self, name: &str) -> Color {
        self.colors
            .get(name)
            .or_else(|| self.colors.get("text"))
            .copied()
            .unwrap_or(Color::WHITE)
    }

    pub fn font_size(&self, name: &str) -> f32 {
        self.font_sizes
            .get(name)
            .or_else(|| self.font_sizes.get("medium"))
            .copied()
            .unwrap_or(FALLBACK_FONT_SIZE)
    }

    pub fn spacing(&self, name: &str) -> f32 {
        self.spacings.get(name).copied().unwrap_or(0.0)
    }

    pub fn radius(&self, name: &str) -> f32 {
        self.radii.get(name).copied().unwrap_or(0.0)
    }

    /// True when the background is darker than mid grey.
    pub fn is_dark(&self) -> bool {
        self.color("background").luma() < 128
    }
}
