//! Styling of figures.
//!
//! A [`Style`] is a flat map of Matplotlib `rcParams` keys to values.
//! Styles are not installed globally: each figure carries the style
//! it was created with and Matplotlib only sees it, through
//! `rc_context`, while that figure is being built or saved.

use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
    path::Path,
};
use crate::stylesheet::{self, SheetError};

/// Value of an `rcParams` entry.  Values read from style sheets are
/// kept as [`Param::Text`] and validated by Matplotlib.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Display for Param {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Param::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Param::Int(i) => write!(f, "{}", i),
            Param::Float(x) => write!(f, "{}", x),
            Param::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Param {
    fn from(b: bool) -> Self { Param::Bool(b) }
}

impl From<i64> for Param {
    fn from(i: i64) -> Self { Param::Int(i) }
}

impl From<i32> for Param {
    fn from(i: i32) -> Self { Param::Int(i.into()) }
}

impl From<f64> for Param {
    fn from(x: f64) -> Self { Param::Float(x) }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self { Param::Text(s.to_string()) }
}

impl From<String> for Param {
    fn from(s: String) -> Self { Param::Text(s) }
}

/// Style sheets shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Fonts, sizes and ticks for publication figures.
    Base,
    /// Dark text on a white background.
    Light,
    /// Light text on a dark background.
    Dark,
    /// No figure or axes background.
    Transparent,
}

impl Preset {
    /// Content of the style sheet, without comments.
    pub fn sheet(self) -> &'static str {
        match self {
            Preset::Base => include_str!("../styles/base.mplstyle"),
            Preset::Light => include_str!("../styles/light.mplstyle"),
            Preset::Dark => include_str!("../styles/dark.mplstyle"),
            Preset::Transparent =>
                include_str!("../styles/transparent.mplstyle"),
        }
    }
}

pub const FONT_FAMILY: &str = "sans-serif";
pub const FONT_SANS_SERIF: &str = "Arial";

pub const SMALL_FONT_SIZE: f64 = 6.0;
pub const MEDIUM_FONT_SIZE: f64 = 8.0;
pub const LARGE_FONT_SIZE: f64 = 10.0;

pub const LINE_WIDTH: f64 = 2.0;
pub const TICK_DIRECTION: &str = "in";
pub const TICK_MAJOR_SIZE: f64 = 4.0;
pub const SAVEFIG_DPI: f64 = 600.0;
/// TrueType fonts in PDF output.
pub const PDF_FONTTYPE: i64 = 42;

/// A set of `rcParams`.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    params: BTreeMap<String, Param>,
}

impl Default for Style {
    fn default() -> Self {
        Style::sizes(SMALL_FONT_SIZE, MEDIUM_FONT_SIZE, LARGE_FONT_SIZE)
    }
}

impl Style {
    /// A style setting nothing.
    pub fn empty() -> Self {
        Style { params: BTreeMap::new() }
    }

    /// The publication style with the given `small` (legend),
    /// `medium` (labels, ticks) and `large` (text, titles) font sizes.
    pub fn sizes(small: f64, medium: f64, large: f64) -> Self {
        Style::empty()
            .set("font.sans-serif", FONT_SANS_SERIF)
            .set("font.family", FONT_FAMILY)
            .set("lines.linewidth", LINE_WIDTH)
            .set("savefig.dpi", SAVEFIG_DPI)
            .set("font.size", large)
            .set("axes.titlesize", large)
            .set("axes.labelsize", medium)
            .set("xtick.labelsize", medium)
            .set("ytick.labelsize", medium)
            .set("xtick.direction", TICK_DIRECTION)
            .set("ytick.direction", TICK_DIRECTION)
            .set("xtick.major.size", TICK_MAJOR_SIZE)
            .set("ytick.major.size", TICK_MAJOR_SIZE)
            .set("legend.fontsize", small)
            .set("legend.frameon", false)
            .set("figure.titlesize", large)
            .set("pdf.fonttype", PDF_FONTTYPE)
    }

    /// One of the shipped style sheets.
    pub fn preset(p: Preset) -> Self { Style::from_sheet(p.sheet()) }

    /// Parse a Matplotlib style sheet.  Each line is `key: value`
    /// (`key = value` is accepted too); comments and blank lines are
    /// ignored and malformed lines are skipped with a warning.
    pub fn from_sheet(text: &str) -> Self {
        let mut style = Style::empty();
        for (n, line) in text.lines().enumerate() {
            let line = stylesheet::strip_line(line);
            if line.trim().is_empty() { continue }
            let Some(sep) = line.find(|c: char| c == ':' || c == '=') else {
                tracing::warn!("style sheet line {}: missing ':' in {:?}",
                               n + 1, line);
                continue
            };
            let key = line[.. sep].trim();
            let mut value = line[sep + 1 ..].trim();
            if value.len() >= 2 && value.starts_with('"')
                && value.ends_with('"') {
                value = &value[1 .. value.len() - 1];
            }
            if key.is_empty() {
                tracing::warn!("style sheet line {}: empty key", n + 1);
                continue
            }
            if style.params.contains_key(key) {
                tracing::warn!("style sheet line {}: duplicate key {:?}",
                               n + 1, key);
            }
            style.params.insert(key.to_string(), Param::Text(value.into()));
        }
        style
    }

    /// Read and parse the style sheet at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SheetError> {
        let text = stylesheet::read_sheet(path.as_ref())?;
        Ok(Style::from_sheet(&text))
    }

    /// Set `key` to `value`, replacing a previous value.
    #[must_use]
    pub fn set(mut self, key: &str, value: impl Into<Param>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Param> {
        self.params.get(key)
    }

    /// Apply `other` on top of `self`: keys set in both take the
    /// value of `other`.
    #[must_use]
    pub fn layer(mut self, other: &Style) -> Self {
        for (k, v) in &other.params {
            self.params.insert(k.clone(), v.clone());
        }
        self
    }

    /// Iterate over the parameters, sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize { self.params.len() }

    pub fn is_empty(&self) -> bool { self.params.is_empty() }
}
