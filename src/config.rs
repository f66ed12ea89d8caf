//! Construction-time configuration and color palettes.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.termscreen/config.toml`
//! - Built-in palettes mapping the eight symbolic colors to device colors
//! - Font candidate resolution
//!
//! # Configuration File
//!
//! ```toml
//! title = "my app"
//! cols = 100
//! rows = 30
//! charset = "utf-8"          # or "ascii"
//! font = ["Iosevka Term", "JetBrains Mono"]
//! font_size = 14
//! palette = "nord"
//! backend = "console"        # or "headless"
//! mouse = false
//! ```
//!
//! # Available Palettes
//!
//! - `default` - The host terminal's own ANSI colors
//! - `solarized-dark` - Ethan Schoonover's Solarized
//! - `monokai` - Sublime Text inspired
//! - `nord` - Arctic, bluish color palette
//! - `dracula` - Dark theme with vibrant colors
//! - `gruvbox-dark` - Retro groove colors
//! - `tokyo-night` - VS Code Tokyo Night theme

use std::fs;
use std::path::{Path, PathBuf};

use crossterm::style::Color as DeviceColor;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::style::normalize_name;
use crate::core::Color;
use crate::error::{Error, Result};
use crate::ui::resize::ResizeListener;

/// Monospace fonts tried when no configured candidate is available
pub const BUILTIN_FONTS: [&str; 6] = [
    "DejaVu Sans Mono",
    "Menlo",
    "Consolas",
    "Liberation Mono",
    "Courier New",
    "Monospace",
];

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Display name (window title)
    pub title: String,
    /// Initial columns
    pub cols: u16,
    /// Initial rows
    pub rows: u16,
    /// I/O encoding
    pub charset: Charset,
    /// Font candidates, first available wins
    pub font: Vec<String>,
    pub font_size: u16,
    /// Palette name
    pub palette: String,
    pub backend: BackendKind,
    /// Report mouse events as keystrokes
    pub mouse: bool,
    /// Subscribed to resize notifications at construction
    #[serde(skip)]
    pub resize_listener: Option<ResizeListener>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "terminal".to_string(),
            cols: 80,
            rows: 24,
            charset: Charset::default(),
            font: Vec::new(),
            font_size: 14,
            palette: "default".to_string(),
            backend: BackendKind::default(),
            mouse: false,
            resize_listener: None,
        }
    }
}

/// Character encoding used for device output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Charset {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8", alias = "UTF-8")]
    Utf8,
    #[serde(rename = "ascii", alias = "us-ascii", alias = "ASCII")]
    Ascii,
}

impl Charset {
    /// Character the device should receive for `ch`
    pub fn encode(self, ch: char) -> char {
        match self {
            Charset::Utf8 => ch,
            Charset::Ascii if ch.is_ascii() => ch,
            Charset::Ascii => '?',
        }
    }
}

/// Which device a `Terminal` is built on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The process's controlling terminal
    #[default]
    Console,
    /// In-memory terminal, no real output
    Headless,
}

impl Config {
    /// Load configuration from the default file, falling back to defaults
    pub fn load() -> Self {
        if let Some(path) = Self::get_config_path() {
            if path.exists() {
                match Self::load_from(&path) {
                    Ok(config) => return config,
                    Err(e) => warn!("Ignoring {}: {}", path.display(), e),
                }
            }
        }
        Self::default()
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Get config file path
    pub fn get_config_path() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".termscreen").join("config.toml"))
    }

    pub fn with_resize_listener<F>(mut self, callback: F) -> Self
    where
        F: Fn(u16, u16) + Send + Sync + 'static,
    {
        self.resize_listener = Some(ResizeListener::new(callback));
        self
    }

    /// Get the palette (unknown names fall back to `default`)
    pub fn get_palette(&self) -> Palette {
        Palette::by_name(&self.palette)
    }

    /// First available font among the candidates, then the built-in list
    pub fn resolve_font(&self, available: impl Fn(&str) -> bool) -> String {
        self.font
            .iter()
            .map(String::as_str)
            .find(|name| available(name))
            .or_else(|| BUILTIN_FONTS.iter().copied().find(|name| available(name)))
            .unwrap_or(BUILTIN_FONTS[0])
            .to_string()
    }
}

/// Mapping from the symbolic colors to device colors
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub name: &'static str,
    /// Indexed like `Color::ansi_index`
    pub colors: [DeviceColor; 8],
}

impl Default for Palette {
    fn default() -> Self {
        Self::default_palette()
    }
}

const fn rgb(r: u8, g: u8, b: u8) -> DeviceColor {
    DeviceColor::Rgb { r, g, b }
}

impl Palette {
    /// Host terminal ANSI colors
    pub fn default_palette() -> Self {
        Self {
            name: "default",
            colors: [
                DeviceColor::Black,
                DeviceColor::DarkRed,
                DeviceColor::DarkGreen,
                DeviceColor::DarkYellow,
                DeviceColor::DarkBlue,
                DeviceColor::DarkMagenta,
                DeviceColor::DarkCyan,
                DeviceColor::Grey,
            ],
        }
    }

    /// Solarized Dark palette
    pub fn solarized_dark() -> Self {
        Self {
            name: "solarized-dark",
            colors: [
                rgb(7, 54, 66),
                rgb(220, 50, 47),
                rgb(133, 153, 0),
                rgb(181, 137, 0),
                rgb(38, 139, 210),
                rgb(211, 54, 130),
                rgb(42, 161, 152),
                rgb(238, 232, 213),
            ],
        }
    }

    /// Monokai palette
    pub fn monokai() -> Self {
        Self {
            name: "monokai",
            colors: [
                rgb(39, 40, 34),
                rgb(249, 38, 114),
                rgb(166, 226, 46),
                rgb(230, 219, 116),
                rgb(102, 217, 239),
                rgb(174, 129, 255),
                rgb(161, 239, 228),
                rgb(248, 248, 242),
            ],
        }
    }

    /// Nord palette
    pub fn nord() -> Self {
        Self {
            name: "nord",
            colors: [
                rgb(59, 66, 82),
                rgb(191, 97, 106),
                rgb(163, 190, 140),
                rgb(235, 203, 139),
                rgb(129, 161, 193),
                rgb(180, 142, 173),
                rgb(136, 192, 208),
                rgb(229, 233, 240),
            ],
        }
    }

    /// Dracula palette
    pub fn dracula() -> Self {
        Self {
            name: "dracula",
            colors: [
                rgb(33, 34, 44),
                rgb(255, 85, 85),
                rgb(80, 250, 123),
                rgb(241, 250, 140),
                rgb(189, 147, 249),
                rgb(255, 121, 198),
                rgb(139, 233, 253),
                rgb(248, 248, 242),
            ],
        }
    }

    /// Gruvbox Dark palette
    pub fn gruvbox_dark() -> Self {
        Self {
            name: "gruvbox-dark",
            colors: [
                rgb(40, 40, 40),
                rgb(204, 36, 29),
                rgb(152, 151, 26),
                rgb(215, 153, 33),
                rgb(69, 133, 136),
                rgb(177, 98, 134),
                rgb(104, 157, 106),
                rgb(168, 153, 132),
            ],
        }
    }

    /// Tokyo Night palette
    pub fn tokyo_night() -> Self {
        Self {
            name: "tokyo-night",
            colors: [
                rgb(21, 22, 30),
                rgb(247, 118, 142),
                rgb(158, 206, 106),
                rgb(224, 175, 104),
                rgb(122, 162, 247),
                rgb(187, 154, 247),
                rgb(125, 207, 255),
                rgb(169, 177, 214),
            ],
        }
    }

    /// Look up a palette by name
    pub fn parse(name: &str) -> Result<Self> {
        match normalize_name(name).as_str() {
            "default" => Ok(Self::default_palette()),
            "solarized-dark" => Ok(Self::solarized_dark()),
            "monokai" => Ok(Self::monokai()),
            "nord" => Ok(Self::nord()),
            "dracula" => Ok(Self::dracula()),
            "gruvbox-dark" | "gruvbox" => Ok(Self::gruvbox_dark()),
            "tokyo-night" | "tokyonight" => Ok(Self::tokyo_night()),
            _ => Err(Error::invalid_attribute("palette", name)),
        }
    }

    /// Get palette by name, falling back to `default`
    pub fn by_name(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|e| {
            warn!("{}, using default palette", e);
            Self::default_palette()
        })
    }

    /// List available palettes
    pub fn list() -> Vec<&'static str> {
        vec![
            "default",
            "solarized-dark",
            "monokai",
            "nord",
            "dracula",
            "gruvbox-dark",
            "tokyo-night",
        ]
    }

    /// Device color for a symbolic color
    pub fn resolve(&self, color: Color) -> DeviceColor {
        match color.ansi_index() {
            Some(i) => self.colors[i as usize],
            None => DeviceColor::Reset,
        }
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
