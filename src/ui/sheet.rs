//! Sheets: ragged grids of drawable items
//!
//! A [`Sheet`] is only a convenience for drawing; `put_sheet` expands it into
//! ordinary writes, row by row.

use std::borrow::Cow;

use super::output::{check_text, DrawOptions};
use crate::error::Result;

/// A character or a string
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Text {
    Char(char),
    Str(String),
}

impl Text {
    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            Text::Char(ch) => Cow::Owned(ch.to_string()),
            Text::Str(s) => Cow::Borrowed(s),
        }
    }
}

impl From<char> for Text {
    fn from(ch: char) -> Self {
        Text::Char(ch)
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Text::Str(s.to_string())
    }
}

impl From<String> for Text {
    fn from(s: String) -> Self {
        Text::Str(s)
    }
}

/// One entry of a sheet row
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SheetItem {
    Str(String),
    Char(char),
    /// Text drawn with its own options
    Styled(Text, DrawOptions),
}

impl SheetItem {
    pub fn styled(text: impl Into<Text>, opts: DrawOptions) -> Self {
        SheetItem::Styled(text.into(), opts)
    }

    /// Options to draw with; bare items inherit everything
    pub fn options(&self) -> DrawOptions {
        match self {
            SheetItem::Styled(_, opts) => *opts,
            _ => DrawOptions::default(),
        }
    }

    pub fn text(&self) -> Cow<'_, str> {
        match self {
            SheetItem::Str(s) => Cow::Borrowed(s),
            SheetItem::Char(ch) => Cow::Owned(ch.to_string()),
            SheetItem::Styled(text, _) => text.as_str(),
        }
    }

    /// Columns this item covers
    pub fn len(&self) -> usize {
        match self {
            SheetItem::Char(_) | SheetItem::Styled(Text::Char(_), _) => 1,
            SheetItem::Str(s) | SheetItem::Styled(Text::Str(s), _) => s.chars().count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<char> for SheetItem {
    fn from(ch: char) -> Self {
        SheetItem::Char(ch)
    }
}

impl From<&str> for SheetItem {
    fn from(s: &str) -> Self {
        SheetItem::Str(s.to_string())
    }
}

impl From<String> for SheetItem {
    fn from(s: String) -> Self {
        SheetItem::Str(s)
    }
}

impl<T: Into<Text>> From<(T, DrawOptions)> for SheetItem {
    fn from((text, opts): (T, DrawOptions)) -> Self {
        SheetItem::Styled(text.into(), opts)
    }
}

/// Rows of items; rows may differ in length
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sheet {
    rows: Vec<Vec<SheetItem>>,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row
    pub fn row<I>(mut self, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SheetItem>,
    {
        self.push_row(items);
        self
    }

    pub fn push_row<I>(&mut self, items: I)
    where
        I: IntoIterator,
        I::Item: Into<SheetItem>,
    {
        self.rows.push(items.into_iter().map(Into::into).collect());
    }

    pub fn rows(&self) -> &[Vec<SheetItem>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().map(SheetItem::len).sum::<usize>())
            .max()
            .unwrap_or(0)
    }

    /// Check every item can be drawn
    pub fn validate(&self) -> Result<()> {
        self.rows
            .iter()
            .flatten()
            .try_for_each(|item| check_text(&item.text()))
    }
}

impl<R> FromIterator<R> for Sheet
where
    R: IntoIterator,
    R::Item: Into<SheetItem>,
{
    fn from_iter<T: IntoIterator<Item = R>>(iter: T) -> Self {
        let mut sheet = Sheet::new();
        for row in iter {
            sheet.push_row(row);
        }
        sheet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Color;
    use crate::error::Error;

    #[test]
    fn test_items_and_options() {
        let red = DrawOptions::new().fg(Color::Red);
        let sheet = Sheet::new()
            .row(["ab", "c"])
            .row(vec![SheetItem::Char('x'), SheetItem::styled('y', red)]);

        assert_eq!(sheet.height(), 2);
        assert_eq!(sheet.width(), 3);
        let second = &sheet.rows()[1];
        assert_eq!(second[0].options(), DrawOptions::default());
        assert_eq!(second[1].options(), red);
        assert_eq!(second[1].text(), "y");
    }

    #[test]
    fn test_ragged_rows_from_iterator() {
        let sheet: Sheet = vec![vec!["one"], vec![], vec!["two", "three"]]
            .into_iter()
            .collect();
        let widths: Vec<usize> = sheet
            .rows()
            .iter()
            .map(|r| r.iter().map(SheetItem::len).sum())
            .collect();
        assert_eq!(widths, vec![3, 0, 8]);
    }

    #[test]
    fn test_validate_rejects_control_characters() {
        let sheet = Sheet::new().row(["fine"]).row([("bad\tcell", DrawOptions::new())]);
        assert!(matches!(sheet.validate(), Err(Error::InvalidCharacter('\t'))));
    }
}
